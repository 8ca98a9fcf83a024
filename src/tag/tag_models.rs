use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// A tag joined with the todo or template it is attached to.
#[derive(Debug, Clone, FromRow)]
pub struct TagLink {
    pub owner_id: Uuid,
    #[sqlx(flatten)]
    pub tag: Tag,
}
