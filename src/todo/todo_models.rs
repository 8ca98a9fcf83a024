use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    schedule::{RecurrencePattern, ReminderState},
    subtask::{Subtask, SubtaskProgress},
    tag::Tag,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(AppError::Validation(
                "Priority must be one of: high, medium, low".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub reminder_minutes: Option<i64>,
    pub last_notification_sent: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn reminder_state(&self) -> ReminderState {
        ReminderState {
            due_date: self.due_date,
            reminder_minutes: self.reminder_minutes,
            last_notification_sent: self.last_notification_sent,
            completed: self.is_completed(),
        }
    }
}

/// Insert payload for a todo row.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub user_id: Uuid,
    pub title: String,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub reminder_minutes: Option<i64>,
}

/// Recurrence and reminders only make sense relative to a due date.
pub fn check_schedule_fields(
    due_date: Option<DateTime<Utc>>,
    recurrence_pattern: Option<RecurrencePattern>,
    reminder_minutes: Option<i64>,
) -> Result<()> {
    if due_date.is_some() {
        return Ok(());
    }
    if recurrence_pattern.is_some() {
        return Err(AppError::Validation(
            "Recurring todos require a due date".to_string(),
        ));
    }
    if reminder_minutes.is_some() {
        return Err(AppError::Validation(
            "Reminders require a due date".to_string(),
        ));
    }
    Ok(())
}

/// A todo with its subtasks, progress and tags.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TodoDetails {
    #[serde(flatten)]
    pub todo: Todo,
    pub subtasks: Vec<Subtask>,
    pub progress: SubtaskProgress,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct PriorityCounts {
    pub high: i64,
    pub medium: i64,
    pub low: i64,
    pub none: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_display_and_parse() {
        for priority in [Priority::High, Priority::Medium, Priority::Low] {
            assert_eq!(priority.to_string().parse::<Priority>().unwrap(), priority);
        }
        assert!(matches!("urgent".parse::<Priority>(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_schedule_fields_need_due_date() {
        let due = Some(Utc::now());
        assert!(check_schedule_fields(due, Some(RecurrencePattern::Daily), Some(30)).is_ok());
        assert!(check_schedule_fields(None, None, None).is_ok());
        assert!(matches!(
            check_schedule_fields(None, Some(RecurrencePattern::Weekly), None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            check_schedule_fields(None, None, Some(15)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_reminder_state_reflects_completion() {
        let now = Utc::now();
        let todo = Todo {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Pay rent".into(),
            priority: None,
            due_date: Some(now),
            recurrence_pattern: None,
            reminder_minutes: Some(10),
            last_notification_sent: None,
            completed_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        let state = todo.reminder_state();
        assert!(state.completed);
        assert!(!state.is_due(now));
    }
}
