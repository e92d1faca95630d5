use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use tracing::info;

use crate::db::chat::{ChatOpening, StartedChat};
use crate::db::leads::NewLead;
use crate::db::models::{ChatMessage, Conversation, ConversationStatus, LeadSource, MessageSender};
use crate::error::CmsError;
use crate::middleware::rate_limit::{Bucket, ClientIp};
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::service::mailer::deliver;
use crate::service::notifications::lead_notification;
use crate::service::tokens::{constant_time_eq, random_token};
use crate::types::forms::{ChatMessageInput, StartChatInput, clean, normalize_email};
use crate::types::views::ChatStarted;

pub const CHAT_TOKEN_HEADER: &str = "x-chat-token";
pub const GREETING_SETTING: &str = "chat_greeting";
const DEFAULT_GREETING: &str =
    "Hi! Thanks for reaching out. A security specialist will reply here shortly.";

/// Load a conversation the caller holds the visitor token for.
async fn visitor_conversation(
    state: &AppState,
    id: i64,
    headers: &HeaderMap,
) -> Result<Conversation, CmsError> {
    let conversation = state
        .chat()
        .get(id)
        .await?
        .ok_or(CmsError::NotFound("conversation"))?;
    let presented = headers
        .get(CHAT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(CmsError::Unauthorized)?;
    if !constant_time_eq(presented, &conversation.visitor_token) {
        return Err(CmsError::Unauthorized);
    }
    Ok(conversation)
}

/// POST /api/chat/conversations
pub async fn start_conversation(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(input): ValidatedJson<StartChatInput>,
) -> Result<(StatusCode, Json<ChatStarted>), CmsError> {
    state.limits.check(Bucket::Chat, ip)?;

    let name = clean(input.name);
    let email = input.email.as_deref().map(normalize_email);
    let first_message = clean(input.message);
    let token = random_token();

    let greeting = state
        .settings()
        .get_value(GREETING_SETTING)
        .await?
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_GREETING.to_string());
    let lead = email.as_ref().map(|email| {
        let lead_name = name.clone().unwrap_or_else(|| email.clone());
        NewLead::new(lead_name, email.clone(), LeadSource::Chat)
    });

    let StartedChat {
        conversation,
        messages,
        lead,
    } = state
        .chat()
        .start(ChatOpening {
            visitor_name: name.as_deref(),
            visitor_email: email.as_deref(),
            visitor_token: &token,
            greeting: &greeting,
            first_message: first_message.as_deref(),
            lead,
        })
        .await?;

    if let Some(lead) = lead {
        deliver(
            state.mailer.as_ref(),
            lead_notification(&state.config, &lead),
            "lead notification",
        )
        .await;
    }

    info!(conversation_id = conversation.id, "chat conversation opened");
    Ok((
        StatusCode::CREATED,
        Json(ChatStarted {
            conversation_id: conversation.id,
            visitor_token: token,
            messages,
        }),
    ))
}

/// GET /api/chat/conversations/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Vec<ChatMessage>>, CmsError> {
    let conversation = visitor_conversation(&state, id, &headers).await?;
    Ok(Json(state.chat().messages(conversation.id).await?))
}

/// POST /api/chat/conversations/{id}/messages
pub async fn post_message(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ChatMessageInput>,
) -> Result<(StatusCode, Json<ChatMessage>), CmsError> {
    state.limits.check(Bucket::Chat, ip)?;
    let conversation = visitor_conversation(&state, id, &headers).await?;
    if conversation.status == ConversationStatus::Closed {
        return Err(CmsError::BadRequest("conversation is closed".to_string()));
    }
    let message = state
        .chat()
        .post(
            conversation.id,
            MessageSender::Visitor,
            None,
            input.body.trim(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
