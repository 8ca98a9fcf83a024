use uuid::Uuid;
use validator::Validate;

use super::subtask_dto::{CreateSubtaskRequest, UpdateSubtaskRequest};
use super::subtask_models::{Subtask, SubtaskProgress};
use super::subtask_repository::{SubtaskChanges, SubtaskRepository};
use crate::{
    error::{AppError, Result},
    schedule::AppTime,
    todo::TodoRepository,
    validation::{require_text, TODO_TITLE_MAX},
};

/// Subtask operations, always reached through a todo the caller owns.
#[derive(Clone)]
pub struct SubtaskService {
    repo: SubtaskRepository,
    todo_repo: TodoRepository,
    time: AppTime,
}

impl SubtaskService {
    pub fn new(repo: SubtaskRepository, todo_repo: TodoRepository, time: AppTime) -> Self {
        Self {
            repo,
            todo_repo,
            time,
        }
    }

    pub async fn list(&self, user_id: Uuid, todo_id: Uuid) -> Result<(Vec<Subtask>, SubtaskProgress)> {
        self.ensure_todo(user_id, todo_id).await?;
        let subtasks = self.repo.find_by_todo(todo_id).await?;
        let progress = SubtaskProgress::of(&subtasks);
        Ok((subtasks, progress))
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
        payload: CreateSubtaskRequest,
    ) -> Result<Subtask> {
        payload.validate()?;
        self.ensure_todo(user_id, todo_id).await?;
        let title = require_text("Title", &payload.title, TODO_TITLE_MAX)?;

        self.repo
            .create(todo_id, &title, payload.position, self.time.now_utc())
            .await
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
        subtask_id: Uuid,
        payload: UpdateSubtaskRequest,
    ) -> Result<Subtask> {
        payload.validate()?;
        self.ensure_todo(user_id, todo_id).await?;

        if payload.is_empty() {
            return self
                .repo
                .find_by_id(subtask_id, todo_id)
                .await?
                .ok_or_else(subtask_not_found);
        }

        let changes = SubtaskChanges {
            title: payload
                .title
                .map(|title| require_text("Title", &title, TODO_TITLE_MAX))
                .transpose()?,
            completed: payload.completed,
            position: payload.position,
        };

        self.repo
            .update(subtask_id, todo_id, &changes, self.time.now_utc())
            .await?
            .ok_or_else(subtask_not_found)
    }

    pub async fn delete(&self, user_id: Uuid, todo_id: Uuid, subtask_id: Uuid) -> Result<()> {
        self.ensure_todo(user_id, todo_id).await?;

        if self.repo.delete(subtask_id, todo_id).await? == 0 {
            return Err(subtask_not_found());
        }
        Ok(())
    }

    async fn ensure_todo(&self, user_id: Uuid, todo_id: Uuid) -> Result<()> {
        self.todo_repo
            .find_by_id(todo_id, user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Todo not found".into()))
    }
}

fn subtask_not_found() -> AppError {
    AppError::NotFound("Subtask not found".into())
}
