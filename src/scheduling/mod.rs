mod common;
mod delay;
mod manager;
mod scheduler;
mod worker;

pub use common::{AlarmManagerMessage, AlarmManagerSender};
pub use delay::{MIN_DELAY_MINUTES, randomized_delay_minutes};
pub use manager::AlarmManager;
pub use worker::{AlarmWorker, WorkerFactory};
