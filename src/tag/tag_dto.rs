use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::tag_models::Tag;
use crate::validation::validate_hex_color;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
    /// `#RRGGBB`, defaults to `#3B82F6`
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetTagsRequest {
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TagListResponse {
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TagResponse {
    pub tag: Tag,
}
