use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use super::derive_slug;
use crate::db::posts::{PostFilter, PostWrite};
use crate::error::CmsError;
use crate::handlers::blog::{hydrate_page, hydrate_post};
use crate::middleware::auth::CurrentUser;
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::service::rbac::Permission;
use crate::service::slug::reading_minutes;
use crate::types::admin::PostInput;
use crate::types::forms::clean;
use crate::types::pagination::Paged;
use crate::types::query::AdminPostQuery;
use crate::types::views::PostView;

/// Resolve slug uniqueness and derived columns for a create or update.
async fn post_write(
    state: &AppState,
    input: PostInput,
    except_id: Option<i64>,
) -> Result<PostWrite, CmsError> {
    let slug = derive_slug(input.slug.as_deref(), &input.title)?;
    if state.posts().slug_taken(&slug, except_id).await? {
        return Err(CmsError::Conflict(format!("slug '{slug}' is already in use")));
    }
    let mut tag_ids = input.tag_ids;
    tag_ids.sort_unstable();
    tag_ids.dedup();
    Ok(PostWrite {
        title: input.title.trim().to_string(),
        slug,
        excerpt: clean(input.excerpt),
        reading_minutes: reading_minutes(&input.content),
        content: input.content,
        cover_image: clean(input.cover_image),
        status: input.status,
        category_id: input.category_id,
        featured: input.featured,
        tag_ids,
    })
}

/// GET /api/admin/posts
pub async fn list_posts(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<AdminPostQuery>,
) -> Result<Json<Paged<PostView>>, CmsError> {
    current.require(Permission::ContentRead)?;
    let window = query.window();
    let filter = PostFilter {
        status: query.status,
        search: query.search,
        ..PostFilter::default()
    };
    let page = state.posts().list(&filter, window).await?;
    Ok(Json(hydrate_page(&state, page).await?))
}

/// GET /api/admin/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<PostView>, CmsError> {
    current.require(Permission::ContentRead)?;
    let post = state
        .posts()
        .get(id)
        .await?
        .ok_or(CmsError::NotFound("post"))?;
    Ok(Json(hydrate_post(&state, post).await?))
}

/// POST /api/admin/posts
pub async fn create_post(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(input): ValidatedJson<PostInput>,
) -> Result<(StatusCode, Json<PostView>), CmsError> {
    current.require(Permission::ContentWrite)?;
    let write = post_write(&state, input, None).await?;
    let post = state.posts().create(write, current.user.id).await?;
    info!(post_id = post.id, slug = %post.slug, user_id = current.user.id, "post created");
    Ok((StatusCode::CREATED, Json(hydrate_post(&state, post).await?)))
}

/// PUT /api/admin/posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<PostInput>,
) -> Result<Json<PostView>, CmsError> {
    current.require(Permission::ContentWrite)?;
    let write = post_write(&state, input, Some(id)).await?;
    let post = state
        .posts()
        .update(id, write)
        .await?
        .ok_or(CmsError::NotFound("post"))?;
    info!(post_id = post.id, status = ?post.status, user_id = current.user.id, "post updated");
    Ok(Json(hydrate_post(&state, post).await?))
}

/// DELETE /api/admin/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::ContentWrite)?;
    if !state.posts().delete(id).await? {
        return Err(CmsError::NotFound("post"));
    }
    info!(post_id = id, user_id = current.user.id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}
