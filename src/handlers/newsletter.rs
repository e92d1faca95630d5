use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::db::leads::NewLead;
use crate::db::models::{LeadSource, Subscriber, SubscriberStatus};
use crate::db::subscribers::SubscriptionTokens;
use crate::error::CmsError;
use crate::middleware::rate_limit::{Bucket, ClientIp};
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::service::mailer::deliver;
use crate::service::notifications::newsletter_confirmation;
use crate::service::tokens::random_token;
use crate::types::forms::{SubscribeInput, clean, normalize_email};
use crate::types::views::Notice;

fn fresh_tokens() -> SubscriptionTokens {
    SubscriptionTokens {
        confirm: random_token(),
        unsubscribe: random_token(),
    }
}

async fn send_confirmation(state: &AppState, subscriber: &Subscriber) {
    deliver(
        state.mailer.as_ref(),
        newsletter_confirmation(&state.config, subscriber),
        "newsletter confirmation",
    )
    .await;
}

/// POST /api/newsletter/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(input): ValidatedJson<SubscribeInput>,
) -> Result<(StatusCode, Json<Notice>), CmsError> {
    state.limits.check(Bucket::Forms, ip)?;

    let email = normalize_email(&input.email);
    let name = clean(input.name);
    let subscribers = state.subscribers();

    let Some(existing) = subscribers.find_by_email(&email).await? else {
        let subscriber = subscribers
            .create(&email, name.as_deref(), &fresh_tokens())
            .await?;
        let lead_name = name.clone().unwrap_or_else(|| email.clone());
        state
            .leads()
            .create(NewLead::new(lead_name, email.clone(), LeadSource::Newsletter))
            .await?;
        info!(subscriber_id = subscriber.id, "newsletter subscription pending");
        send_confirmation(&state, &subscriber).await;
        return Ok((
            StatusCode::CREATED,
            Json(Notice::new("check your inbox to confirm the subscription")),
        ));
    };

    match existing.status {
        SubscriberStatus::Active => Ok((StatusCode::OK, Json(Notice::new("already subscribed")))),
        SubscriberStatus::Pending => {
            send_confirmation(&state, &existing).await;
            Ok((
                StatusCode::OK,
                Json(Notice::new("confirmation email sent again")),
            ))
        }
        SubscriberStatus::Unsubscribed => {
            let subscriber = subscribers
                .resubscribe(existing.id, name.as_deref(), &fresh_tokens())
                .await?;
            info!(subscriber_id = subscriber.id, "newsletter resubscription pending");
            send_confirmation(&state, &subscriber).await;
            Ok((
                StatusCode::OK,
                Json(Notice::new("check your inbox to confirm the subscription")),
            ))
        }
    }
}

/// GET /api/newsletter/confirm/{token}
pub async fn confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Notice>, CmsError> {
    let subscriber = state
        .subscribers()
        .confirm(&token)
        .await?
        .ok_or(CmsError::NotFound("subscription"))?;
    info!(subscriber_id = subscriber.id, "newsletter subscription confirmed");
    Ok(Json(Notice::new("subscription confirmed")))
}

/// GET /api/newsletter/unsubscribe/{token}
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Notice>, CmsError> {
    let subscriber = state
        .subscribers()
        .unsubscribe(&token)
        .await?
        .ok_or(CmsError::NotFound("subscription"))?;
    info!(subscriber_id = subscriber.id, "newsletter unsubscribed");
    Ok(Json(Notice::new("unsubscribed")))
}
