use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::todo_models::{Priority, Todo, TodoDetails};
use crate::{
    error::{AppError, Result},
    schedule::{AppTime, RecurrencePattern},
    validation::{require_text, TODO_TITLE_MAX},
};

pub const REMINDER_MINUTES_MAX: i64 = 43_200;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTodoRequest {
    pub title: String,
    pub priority: Option<Priority>,
    /// RFC 3339, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DD` in the app timezone.
    pub due_date: Option<String>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[validate(range(min = 1, max = 43200))]
    pub reminder_minutes: Option<i64>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Body of `PUT /api/todos/:id`. Absent keys leave a column alone, `null`
/// clears it.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<Priority>)]
    pub priority: Option<Option<Priority>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<RecurrencePattern>)]
    pub recurrence_pattern: Option<Option<RecurrencePattern>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<i64>)]
    pub reminder_minutes: Option<Option<i64>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub completed_at: Option<Option<String>>,
}

/// A validated set of column changes for one todo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub priority: Option<Option<Priority>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub recurrence_pattern: Option<Option<RecurrencePattern>>,
    pub reminder_minutes: Option<Option<i64>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub last_notification_sent: Option<Option<DateTime<Utc>>>,
}

impl TodoPatch {
    pub fn from_request(req: UpdateTodoRequest, time: &AppTime) -> Result<Self> {
        let title = req
            .title
            .map(|title| require_text("Title", &title, TODO_TITLE_MAX))
            .transpose()?;

        let due_date = req
            .due_date
            .map(|due| due.map(|raw| parse_due_date(time, &raw)).transpose())
            .transpose()?;

        if let Some(Some(minutes)) = req.reminder_minutes {
            check_reminder_minutes(minutes)?;
        }

        let completed_at = req
            .completed_at
            .map(|at| {
                at.map(|raw| {
                    time.parse(&raw).ok_or_else(|| {
                        AppError::Validation("Invalid completed_at format".to_string())
                    })
                })
                .transpose()
            })
            .transpose()?;

        let mut patch = Self {
            title,
            priority: req.priority,
            due_date,
            recurrence_pattern: req.recurrence_pattern,
            reminder_minutes: req.reminder_minutes,
            completed_at,
            last_notification_sent: None,
        };

        // A new due date or lead time starts the reminder cycle over.
        if patch.due_date.is_some() || patch.reminder_minutes.is_some() {
            patch.last_notification_sent = Some(None);
        }

        Ok(patch)
    }

    pub fn completion(completed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            completed_at: Some(completed_at),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// The row as it would look after this patch.
    pub fn apply_to(&self, todo: &Todo) -> Todo {
        let mut merged = todo.clone();
        if let Some(title) = &self.title {
            merged.title = title.clone();
        }
        if let Some(priority) = self.priority {
            merged.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            merged.due_date = due_date;
        }
        if let Some(pattern) = self.recurrence_pattern {
            merged.recurrence_pattern = pattern;
        }
        if let Some(minutes) = self.reminder_minutes {
            merged.reminder_minutes = minutes;
        }
        if let Some(completed_at) = self.completed_at {
            merged.completed_at = completed_at;
        }
        if let Some(sent) = self.last_notification_sent {
            merged.last_notification_sent = sent;
        }
        merged
    }
}

pub fn parse_due_date(time: &AppTime, raw: &str) -> Result<DateTime<Utc>> {
    time.parse(raw)
        .ok_or_else(|| AppError::Validation("Invalid due date format".to_string()))
}

pub fn check_reminder_minutes(minutes: i64) -> Result<()> {
    if (1..=REMINDER_MINUTES_MAX).contains(&minutes) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "reminder_minutes must be between 1 and {}",
            REMINDER_MINUTES_MAX
        )))
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TodoListQuery {
    /// `all`, `incomplete` or `completed`
    pub status: Option<String>,
    /// Comma separated priorities, e.g. `high,low`
    pub priority: Option<String>,
    /// Comma separated tag ids; matches todos carrying any of them
    pub tag_ids: Option<String>,
    pub search: Option<String>,
    /// `all`, `overdue`, `today`, `this-week`, `this-month` or `no-due-date`
    pub due: Option<String>,
    /// `created_at`, `due_date`, `priority` or `title`
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    pub sort_order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(PaginatedTodos = PaginatedResponse<TodoDetails>)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateTodoResponse {
    #[serde(flatten)]
    pub todo: TodoDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_todo: Option<TodoDetails>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleTodoResponse {
    pub todo: TodoDetails,
    pub next_todo: Option<TodoDetails>,
}
