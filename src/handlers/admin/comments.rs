use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::db::models::{Comment, ModerationComment};
use crate::error::CmsError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::validated::JsonBody;
use crate::router::AppState;
use crate::service::rbac::Permission;
use crate::types::admin::CommentStatusInput;
use crate::types::pagination::Paged;
use crate::types::query::CommentQuery;

/// GET /api/admin/comments
pub async fn list_comments(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<CommentQuery>,
) -> Result<Json<Paged<ModerationComment>>, CmsError> {
    current.require(Permission::CommentModerate)?;
    let page = state
        .comments()
        .list(query.status, query.post_id, query.window())
        .await?;
    Ok(Json(page))
}

/// PATCH /api/admin/comments/{id}
pub async fn moderate_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<CommentStatusInput>,
) -> Result<Json<Comment>, CmsError> {
    current.require(Permission::CommentModerate)?;
    let comment = state
        .comments()
        .set_status(id, input.status)
        .await?
        .ok_or(CmsError::NotFound("comment"))?;
    info!(comment_id = id, status = ?comment.status, user_id = current.user.id, "comment moderated");
    Ok(Json(comment))
}

/// DELETE /api/admin/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::CommentModerate)?;
    if !state.comments().delete(id).await? {
        return Err(CmsError::NotFound("comment"));
    }
    Ok(StatusCode::NO_CONTENT)
}
