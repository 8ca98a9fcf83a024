use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subtask {
    pub id: Uuid,
    pub todo_id: Uuid,
    pub title: String,
    pub completed: bool,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubtaskProgress {
    pub total: u32,
    pub completed: u32,
    /// Rounded to the nearest whole percent, 0 without subtasks.
    pub percentage: u32,
}

impl SubtaskProgress {
    pub fn of(subtasks: &[Subtask]) -> Self {
        let total = subtasks.len() as u32;
        let completed = subtasks.iter().filter(|s| s.completed).count() as u32;
        let percentage = if total == 0 {
            0
        } else {
            (f64::from(completed) * 100.0 / f64::from(total)).round() as u32
        };

        Self {
            total,
            completed,
            percentage,
        }
    }
}
