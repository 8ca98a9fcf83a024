use uuid::Uuid;
use validator::Validate;

use super::tag_dto::{CreateTagRequest, UpdateTagRequest};
use super::tag_models::{Tag, DEFAULT_TAG_COLOR};
use super::tag_repository::TagRepository;
use crate::{
    error::{AppError, Result},
    schedule::AppTime,
    validation::{require_text, TAG_NAME_MAX},
};

#[derive(Clone)]
pub struct TagService {
    repo: TagRepository,
    time: AppTime,
}

impl TagService {
    pub fn new(repo: TagRepository, time: AppTime) -> Self {
        Self { repo, time }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>> {
        self.repo.find_all(user_id).await
    }

    pub async fn create(&self, user_id: Uuid, payload: CreateTagRequest) -> Result<Tag> {
        payload.validate()?;
        let name = require_text("Tag name", &payload.name, TAG_NAME_MAX)?;
        let color = payload.color.as_deref().unwrap_or(DEFAULT_TAG_COLOR);

        let tag = self
            .repo
            .create(user_id, &name, color, self.time.now_utc())
            .await?;
        tracing::debug!(tag_id = %tag.id, "tag created");
        Ok(tag)
    }

    pub async fn update(&self, user_id: Uuid, tag_id: Uuid, payload: UpdateTagRequest) -> Result<Tag> {
        payload.validate()?;
        let name = payload
            .name
            .map(|name| require_text("Tag name", &name, TAG_NAME_MAX))
            .transpose()?;

        self.repo
            .update(tag_id, user_id, name.as_deref(), payload.color.as_deref())
            .await?
            .ok_or_else(tag_not_found)
    }

    pub async fn delete(&self, user_id: Uuid, tag_id: Uuid) -> Result<()> {
        if self.repo.delete(tag_id, user_id).await? == 0 {
            return Err(tag_not_found());
        }
        Ok(())
    }
}

fn tag_not_found() -> AppError {
    AppError::NotFound("Tag not found".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schedule::clock::testing::ManualClock, test_support::TestApp};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn test_bad_color_is_rejected() {
        let app = TestApp::with_clock(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 1, 0, 0).unwrap(),
        ))
        .await;
        let user = app.user("jules").await;
        let service = &app.state.tag_service;

        let err = service
            .create(user, serde_json::from_value(json!({"name": "home", "color": "blue"})).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let tag = service
            .create(user, serde_json::from_value(json!({"name": "home"})).unwrap())
            .await
            .unwrap();
        assert_eq!(tag.color, DEFAULT_TAG_COLOR);

        let err = service
            .update(user, tag.id, serde_json::from_value(json!({"color": "#12345"})).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(service.list(user).await.unwrap()[0].color, DEFAULT_TAG_COLOR);
    }
}
