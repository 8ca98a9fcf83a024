use chrono::{DateTime, Duration, Utc};

/// Minimum gap between two notifications for the same todo.
pub const NOTIFICATION_COOLDOWN_MINUTES: i64 = 60;

/// When a reminder becomes eligible: `lead_minutes` before the due date.
pub fn notify_at(due: DateTime<Utc>, lead_minutes: i64) -> DateTime<Utc> {
    due - Duration::minutes(lead_minutes)
}

/// The slice of a todo the reminder rule looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderState {
    pub due_date: Option<DateTime<Utc>>,
    pub reminder_minutes: Option<i64>,
    pub last_notification_sent: Option<DateTime<Utc>>,
    pub completed: bool,
}

impl ReminderState {
    /// Whether a notification should fire at `now`.
    ///
    /// Reminders keep firing after the due time has passed, once per
    /// cooldown window, until the todo is completed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }

        let (Some(due), Some(lead)) = (self.due_date, self.reminder_minutes) else {
            return false;
        };

        if now < notify_at(due, lead) {
            return false;
        }

        match self.last_notification_sent {
            Some(last) => now - last >= Duration::minutes(NOTIFICATION_COOLDOWN_MINUTES),
            None => true,
        }
    }
}
