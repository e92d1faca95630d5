//! Bodies accepted by the public, unauthenticated endpoints.
//!
//! Free-text fields are trimmed while deserializing, so the length rules
//! judge the value that is stored.

use crate::db::models::LeadSource;
use serde::{Deserialize, Deserializer};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LeadInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email)]
    pub email: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200))]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 5000))]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200))]
    pub service_interest: Option<String>,
    pub source: Option<LeadSource>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContactInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email)]
    pub email: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200))]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200))]
    pub service_interest: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 10, max = 5000))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email)]
    pub email: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email)]
    pub email: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 2000))]
    pub content: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct StartChatInput {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 2000))]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatMessageInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

/// Gated resources require `name` and `email`; open ones accept an empty body.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct DownloadInput {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(max = 200))]
    pub company: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub password: String,
}

/// Lowercased, trimmed email used as the lookup key for accounts and
/// subscribers.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trim an optional free-text field, dropping it when blank.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `deserialize_with` for required text.
pub fn trimmed<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(de).map(|s| s.trim().to_string())
}

/// `deserialize_with` for optional text; blank becomes `None`.
pub fn trimmed_opt<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(clean)
}
