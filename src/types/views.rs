//! Response shapes that combine several rows.

use crate::db::models::{
    Category, ChatMessage, Comment, Conversation, Post, PublishStatus, Tag, User,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct Notice {
    pub message: &'static str,
}

impl Notice {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub view: PostView,
    pub author_name: Option<String>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct ChatStarted {
    pub conversation_id: i64,
    pub visitor_token: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ConversationView {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct DownloadView {
    pub file_url: String,
}

#[derive(Debug, Serialize)]
pub struct LikeView {
    pub id: i64,
    pub likes: i64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub posts: BTreeMap<&'static str, i64>,
    pub new_leads: i64,
    pub active_subscribers: i64,
    pub pending_comments: i64,
    pub open_conversations: i64,
}

impl Dashboard {
    pub fn status_key(status: PublishStatus) -> &'static str {
        match status {
            PublishStatus::Draft => "draft",
            PublishStatus::Published => "published",
            PublishStatus::Archived => "archived",
        }
    }
}
