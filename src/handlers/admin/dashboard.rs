use axum::{Json, extract::State};
use std::collections::BTreeMap;

use crate::db::models::{
    CommentStatus, ConversationStatus, LeadStatus, PublishStatus, SubscriberStatus,
};
use crate::error::CmsError;
use crate::middleware::auth::CurrentUser;
use crate::router::AppState;
use crate::service::rbac::Permission;
use crate::types::views::Dashboard;

/// GET /api/admin/dashboard
pub async fn overview(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Dashboard>, CmsError> {
    current.require(Permission::DashboardRead)?;

    let mut posts: BTreeMap<&'static str, i64> = [
        PublishStatus::Draft,
        PublishStatus::Published,
        PublishStatus::Archived,
    ]
    .into_iter()
    .map(|s| (Dashboard::status_key(s), 0))
    .collect();
    for (status, count) in state.posts().count_by_status().await? {
        posts.insert(Dashboard::status_key(status), count);
    }

    Ok(Json(Dashboard {
        posts,
        new_leads: state.leads().count_by_status(LeadStatus::New).await?,
        active_subscribers: state
            .subscribers()
            .count_by_status(SubscriberStatus::Active)
            .await?,
        pending_comments: state
            .comments()
            .count_by_status(CommentStatus::Pending)
            .await?,
        open_conversations: state
            .chat()
            .count_by_status(ConversationStatus::Open)
            .await?,
    }))
}
