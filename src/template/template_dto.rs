use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::template_models::Template;
use crate::{schedule::RecurrencePattern, todo::Priority, todo::TodoDetails};

pub const TEMPLATE_SUBTASKS_MAX: usize = 50;
pub const TEMPLATE_SUBTASK_TITLE_MAX: usize = 200;
pub const CATEGORY_MAX: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TemplateSubtaskInput {
    pub title: String,
    /// Defaults to the entry's index in the list.
    #[validate(range(min = 0))]
    pub position: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    /// Defaults to `medium`.
    pub priority: Option<Priority>,
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[validate(range(min = 1, max = 43200))]
    pub reminder_minutes: Option<i64>,
    #[validate(range(min = 0))]
    pub due_date_offset_days: Option<i64>,
    #[validate(length(max = 50), nested)]
    pub subtasks: Option<Vec<TemplateSubtaskInput>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Body of `PUT /api/templates/:id`. Absent keys leave a field alone,
/// `null` clears it; `subtasks` and `tag_ids` replace the whole list.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<Priority>)]
    pub priority: Option<Option<Priority>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<RecurrencePattern>)]
    pub recurrence_pattern: Option<Option<RecurrencePattern>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<i64>)]
    pub reminder_minutes: Option<Option<i64>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<i64>)]
    pub due_date_offset_days: Option<Option<i64>>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    #[schema(value_type = Option<Vec<TemplateSubtaskInput>>)]
    pub subtasks: Option<Option<Vec<TemplateSubtaskInput>>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SaveAsTemplateRequest {
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub due_date_offset_days: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UseTemplateRequest {
    /// Overrides the template's due date offset.
    pub custom_due_date: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TemplateListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateListResponse {
    pub templates: Vec<Template>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateResponse {
    pub template: Template,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UseTemplateResponse {
    pub todo: TodoDetails,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_limits() {
        let subtasks: Vec<_> = (0..51)
            .map(|i| serde_json::json!({"title": format!("step {i}")}))
            .collect();
        let req: CreateTemplateRequest = serde_json::from_value(serde_json::json!({
            "name": "Too big",
            "subtasks": subtasks,
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: CreateTemplateRequest = serde_json::from_value(serde_json::json!({
            "name": "Negative",
            "due_date_offset_days": -1,
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: CreateTemplateRequest = serde_json::from_value(serde_json::json!({
            "name": "Fine",
            "category": "work",
            "due_date_offset_days": 0,
            "subtasks": [{"title": "one", "position": 3}],
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_distinguishes_null_subtasks() {
        let cleared: UpdateTemplateRequest =
            serde_json::from_str(r#"{"subtasks": null}"#).unwrap();
        assert!(matches!(cleared.subtasks, Some(None)));

        let untouched: UpdateTemplateRequest = serde_json::from_str("{}").unwrap();
        assert!(untouched.subtasks.is_none());
    }
}
