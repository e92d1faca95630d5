//! Bodies accepted by `/api/admin/*`.

use crate::db::models::{CommentStatus, LeadStatus, PublishStatus, ResourceKind, Role};
use crate::types::forms::{trimmed, trimmed_opt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct PostInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(max = 500))]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub status: PublishStatus,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

/// Category or tag. `description` is ignored for tags.
#[derive(Debug, Deserialize, Validate)]
pub struct TermInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentStatusInput {
    pub status: CommentStatus,
}

#[derive(Debug, Deserialize)]
pub struct LeadStatusInput {
    pub status: LeadStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ServiceInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 500))]
    pub summary: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(max = 100))]
    pub icon: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub status: PublishStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResourceInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    pub kind: ResourceKind,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 1000))]
    pub file_url: String,
    #[serde(default)]
    pub gated: bool,
    #[serde(default)]
    pub status: PublishStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CaseStudyInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200))]
    pub client: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub industry: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 1000))]
    pub summary: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1))]
    pub challenge: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1))]
    pub solution: String,
    #[serde(default)]
    pub results: Vec<String>,
    #[validate(length(max = 500))]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub status: PublishStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TestimonialInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200))]
    pub author_name: String,
    #[validate(length(max = 200))]
    pub author_title: Option<String>,
    #[validate(length(max = 200))]
    pub company: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 2000))]
    pub quote: String,
    #[validate(range(min = 1, max = 5))]
    #[serde(default = "default_rating")]
    pub rating: i64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub sort_order: i64,
}

fn default_rating() -> i64 {
    5
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SettingInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SettingsBatch {
    #[validate(length(min = 1), nested)]
    pub settings: Vec<SettingInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewUserInput {
    #[validate(email)]
    pub email: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 8, max = 200))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdateInput {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub role: Option<Role>,
    #[validate(length(min = 8, max = 200))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatReplyInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 4000))]
    pub body: String,
}
