use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::subtask_models::{Subtask, SubtaskProgress};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubtaskRequest {
    pub title: String,
    /// Defaults to one past the current last position.
    #[validate(range(min = 0))]
    pub position: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSubtaskRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
    #[validate(range(min = 0))]
    pub position: Option<i64>,
}

impl UpdateSubtaskRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none() && self.position.is_none()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubtaskListResponse {
    pub subtasks: Vec<Subtask>,
    pub progress: SubtaskProgress,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubtaskResponse {
    pub subtask: Subtask,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteSubtaskResponse {
    pub success: bool,
    pub deleted_id: Uuid,
}
