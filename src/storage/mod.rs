mod definition_storage;
mod event_log;
mod model;
mod store;

pub use definition_storage::{DefinitionStorage, InMemoryDefinitionStorage, JsonFileStorage};
pub use event_log::EventLog;
pub use model::DefinitionDraft;
pub use store::DefinitionStore;
