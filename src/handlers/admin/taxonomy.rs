use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::derive_slug;
use crate::db::models::{Category, Tag};
use crate::error::CmsError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::service::rbac::Permission;
use crate::types::admin::TermInput;
use crate::types::forms::clean;

pub async fn list_categories(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Category>>, CmsError> {
    current.require(Permission::ContentRead)?;
    Ok(Json(state.categories().list().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(input): ValidatedJson<TermInput>,
) -> Result<(StatusCode, Json<Category>), CmsError> {
    current.require(Permission::ContentWrite)?;
    let slug = derive_slug(input.slug.as_deref(), &input.name)?;
    let description = clean(input.description);
    let category = state
        .categories()
        .create(input.name.trim(), &slug, description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<TermInput>,
) -> Result<Json<Category>, CmsError> {
    current.require(Permission::ContentWrite)?;
    let slug = derive_slug(input.slug.as_deref(), &input.name)?;
    let description = clean(input.description);
    state
        .categories()
        .update(id, input.name.trim(), &slug, description.as_deref())
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("category"))
}

pub async fn delete_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::ContentWrite)?;
    if !state.categories().delete(id).await? {
        return Err(CmsError::NotFound("category"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_tags(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Tag>>, CmsError> {
    current.require(Permission::ContentRead)?;
    Ok(Json(state.tags().list().await?))
}

pub async fn create_tag(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(input): ValidatedJson<TermInput>,
) -> Result<(StatusCode, Json<Tag>), CmsError> {
    current.require(Permission::ContentWrite)?;
    let slug = derive_slug(input.slug.as_deref(), &input.name)?;
    let tag = state.tags().create(input.name.trim(), &slug).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn update_tag(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<TermInput>,
) -> Result<Json<Tag>, CmsError> {
    current.require(Permission::ContentWrite)?;
    let slug = derive_slug(input.slug.as_deref(), &input.name)?;
    state
        .tags()
        .update(id, input.name.trim(), &slug)
        .await?
        .map(Json)
        .ok_or(CmsError::NotFound("tag"))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::ContentWrite)?;
    if !state.tags().delete(id).await? {
        return Err(CmsError::NotFound("tag"));
    }
    Ok(StatusCode::NO_CONTENT)
}
