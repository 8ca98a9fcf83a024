use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::todo::Todo;

/// A todo whose reminder fired on this poll.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DueReminder {
    #[serde(flatten)]
    pub todo: Todo,
    /// Due date in the app timezone, e.g. `Mar 10, 2025, 9:00 AM +08`
    pub due_display: String,
    pub notify_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationCheckResponse {
    pub todos: Vec<DueReminder>,
    pub count: usize,
}
