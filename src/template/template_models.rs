use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{schedule::RecurrencePattern, tag::Tag, todo::Priority};

/// A subtask blueprint stored in the template's `subtasks_json` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TemplateSubtask {
    pub title: String,
    pub position: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TemplateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub reminder_minutes: Option<i64>,
    pub due_date_offset_days: Option<i64>,
    pub subtasks_json: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateRow {
    /// Unreadable JSON yields no subtasks rather than failing the request.
    pub fn subtasks(&self) -> Vec<TemplateSubtask> {
        let Some(json) = self.subtasks_json.as_deref() else {
            return Vec::new();
        };
        serde_json::from_str(json).unwrap_or_else(|err| {
            tracing::warn!(template_id = %self.id, error = %err, "ignoring malformed subtasks_json");
            Vec::new()
        })
    }

    pub fn into_template(self, tags: Vec<Tag>) -> Template {
        let subtasks = self.subtasks();
        Template {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            category: self.category,
            priority: self.priority,
            recurrence_pattern: self.recurrence_pattern,
            reminder_minutes: self.reminder_minutes,
            due_date_offset_days: self.due_date_offset_days,
            subtasks,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Template {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub reminder_minutes: Option<i64>,
    pub due_date_offset_days: Option<i64>,
    pub subtasks: Vec<TemplateSubtask>,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a template row.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub reminder_minutes: Option<i64>,
    pub due_date_offset_days: Option<i64>,
    pub subtasks_json: Option<String>,
}
