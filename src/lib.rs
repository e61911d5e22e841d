pub mod appsettings;
pub mod definition;
pub mod notifier;
pub mod scheduling;
pub mod storage;
