use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::db::models::{Role, User};
use crate::db::users::UserChanges;
use crate::error::CmsError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::service::passwords::hash_password;
use crate::service::rbac::Permission;
use crate::types::admin::{NewUserInput, UserUpdateInput};
use crate::types::forms::normalize_email;
use crate::types::pagination::Paged;
use crate::types::query::PageQuery;

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paged<User>>, CmsError> {
    current.require(Permission::UserManage)?;
    Ok(Json(state.users().list(query.window()).await?))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(input): ValidatedJson<NewUserInput>,
) -> Result<(StatusCode, Json<User>), CmsError> {
    current.require(Permission::UserManage)?;
    let email = normalize_email(&input.email);
    let hash = hash_password(input.password, state.config.basic.password_cost).await?;
    let user = state
        .users()
        .create(&email, input.name.trim(), &hash, input.role)
        .await
        .map_err(|e| match e {
            CmsError::Conflict(_) => CmsError::Conflict(format!("{email} already has an account")),
            other => other,
        })?;
    info!(user_id = user.id, role = ?user.role, created_by = current.user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH /api/admin/users/{id}
///
/// Password changes end every session of the account.
pub async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<UserUpdateInput>,
) -> Result<Json<User>, CmsError> {
    current.require(Permission::UserManage)?;
    if id == current.user.id
        && let Some(role) = input.role
        && role != Role::Admin
    {
        return Err(CmsError::BadRequest("you cannot demote yourself".to_string()));
    }

    let password_hash = match input.password {
        Some(password) => Some(hash_password(password, state.config.basic.password_cost).await?),
        None => None,
    };
    let password_changed = password_hash.is_some();
    let user = state
        .users()
        .update(
            id,
            UserChanges {
                name: input.name.map(|n| n.trim().to_string()),
                role: input.role,
                password_hash,
            },
        )
        .await?
        .ok_or(CmsError::NotFound("user"))?;

    if password_changed {
        let ended = state.sessions().delete_for_user(user.id).await?;
        info!(user_id = user.id, sessions = ended, "password changed; sessions revoked");
    }
    Ok(Json(user))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::UserManage)?;
    if id == current.user.id {
        return Err(CmsError::BadRequest(
            "you cannot delete your own account".to_string(),
        ));
    }
    if !state.users().delete(id).await? {
        return Err(CmsError::NotFound("user"));
    }
    info!(user_id = id, deleted_by = current.user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
