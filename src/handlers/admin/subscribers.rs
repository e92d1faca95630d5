use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::db::models::Subscriber;
use crate::error::CmsError;
use crate::middleware::auth::CurrentUser;
use crate::router::AppState;
use crate::service::rbac::Permission;
use crate::types::pagination::Paged;
use crate::types::query::SubscriberQuery;

/// GET /api/admin/subscribers
pub async fn list_subscribers(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<SubscriberQuery>,
) -> Result<Json<Paged<Subscriber>>, CmsError> {
    current.require(Permission::SubscriberRead)?;
    Ok(Json(
        state
            .subscribers()
            .list(query.status, query.window())
            .await?,
    ))
}

/// DELETE /api/admin/subscribers/{id}
pub async fn delete_subscriber(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::SubscriberDelete)?;
    if !state.subscribers().delete(id).await? {
        return Err(CmsError::NotFound("subscriber"));
    }
    Ok(StatusCode::NO_CONTENT)
}
