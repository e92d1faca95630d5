use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::db::models::Setting;
use crate::db::settings::SettingWrite;
use crate::error::CmsError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::service::rbac::Permission;
use crate::types::admin::SettingsBatch;

/// GET /api/admin/settings
pub async fn list_settings(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Setting>>, CmsError> {
    current.require(Permission::SettingsManage)?;
    Ok(Json(state.settings().list().await?))
}

/// PUT /api/admin/settings
///
/// Upserts the whole batch in one transaction and returns every setting.
pub async fn upsert_settings(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(batch): ValidatedJson<SettingsBatch>,
) -> Result<Json<Vec<Setting>>, CmsError> {
    current.require(Permission::SettingsManage)?;
    let items: Vec<SettingWrite> = batch
        .settings
        .into_iter()
        .map(|s| SettingWrite {
            key: s.key.trim().to_string(),
            value: s.value,
            is_public: s.is_public,
        })
        .collect();
    let count = items.len();
    let settings = state.settings();
    settings.upsert_many(items).await?;
    info!(count, user_id = current.user.id, "settings updated");
    Ok(Json(settings.list().await?))
}

/// DELETE /api/admin/settings/{key}
pub async fn delete_setting(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(key): Path<String>,
) -> Result<StatusCode, CmsError> {
    current.require(Permission::SettingsManage)?;
    if !state.settings().delete(&key).await? {
        return Err(CmsError::NotFound("setting"));
    }
    Ok(StatusCode::NO_CONTENT)
}
