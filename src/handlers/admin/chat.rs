use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::db::models::{ChatMessage, Conversation, ConversationStatus, MessageSender};
use crate::error::CmsError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::service::rbac::Permission;
use crate::types::admin::ChatReplyInput;
use crate::types::pagination::Paged;
use crate::types::query::ChatQuery;
use crate::types::views::ConversationView;

/// GET /api/admin/chat
pub async fn list_conversations(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ChatQuery>,
) -> Result<Json<Paged<Conversation>>, CmsError> {
    current.require(Permission::ChatManage)?;
    Ok(Json(state.chat().list(query.status, query.window()).await?))
}

/// GET /api/admin/chat/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ConversationView>, CmsError> {
    current.require(Permission::ChatManage)?;
    let chat = state.chat();
    let conversation = chat.get(id).await?.ok_or(CmsError::NotFound("conversation"))?;
    let messages = chat.messages(id).await?;
    Ok(Json(ConversationView {
        conversation,
        messages,
    }))
}

/// POST /api/admin/chat/{id}/reply
pub async fn reply(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<ChatReplyInput>,
) -> Result<(StatusCode, Json<ChatMessage>), CmsError> {
    current.require(Permission::ChatManage)?;
    let chat = state.chat();
    let conversation = chat.get(id).await?.ok_or(CmsError::NotFound("conversation"))?;
    if conversation.status == ConversationStatus::Closed {
        return Err(CmsError::BadRequest("conversation is closed".to_string()));
    }
    let message = chat
        .post(
            id,
            MessageSender::Agent,
            Some(current.user.id),
            input.body.trim(),
        )
        .await?;
    info!(conversation_id = id, user_id = current.user.id, "agent replied");
    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/admin/chat/{id}/close
pub async fn close(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Conversation>, CmsError> {
    current.require(Permission::ChatManage)?;
    let conversation = state
        .chat()
        .set_status(id, ConversationStatus::Closed)
        .await?
        .ok_or(CmsError::NotFound("conversation"))?;
    info!(conversation_id = id, user_id = current.user.id, "conversation closed");
    Ok(Json(conversation))
}
