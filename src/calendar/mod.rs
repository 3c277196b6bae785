mod calendar_types;
mod calendar_validation;
pub mod conflict;
pub mod recurrence;

pub use calendar_types::*;
pub use calendar_validation::*;
pub use conflict::{conflicts_for, has_conflict};
pub use recurrence::{expand, expand_with_id};

/// Custom error type for calendar operations
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Invalid event: {0}")]
    Validation(String),
    #[error("Event '{0}' not found")]
    NotFound(String),
}

pub type CalendarResult<T> = Result<T, CalendarError>;
