pub mod calendar;
pub mod commands;
pub mod config;
pub mod env_manager;
pub mod event_search;
pub mod state;
pub mod store;

/// Debug-level logger for tests; later calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .format_timestamp(None)
        .format_target(false)
        .is_test(true)
        .try_init();
}

// Re-export commonly used types
pub use calendar::{
    CalendarError, CalendarResult, EventColor, EventInstance, EventPatch, EventTemplate,
    RecurrenceKind, RecurrenceRule, TimeSlot,
};
pub use config::Config;
pub use state::{EventStorage, JsonFileStorage, MemoryStorage, StorageError};
pub use store::{Conflict, EventStore, MutationOutcome};
