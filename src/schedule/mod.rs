//! Date arithmetic for recurring todos and reminder eligibility.
//!
//! Everything here is pure: callers pass in the current time and timezone
//! through [`AppTime`] and persist the results themselves.

pub mod clock;
pub mod recurrence;
pub mod reminder;

use thiserror::Error;

pub use clock::{AppTime, Clock, SystemClock};
pub use recurrence::{next_due_date, RecurrencePattern};
pub use reminder::{notify_at, ReminderState, NOTIFICATION_COOLDOWN_MINUTES};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid recurrence pattern: {0}")]
    InvalidRecurrencePattern(String),

    #[error("Due date required for recurring todos")]
    MissingDueDate,

    #[error("Next due date is out of range")]
    OutOfRange,
}
