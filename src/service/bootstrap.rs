use crate::config::Config;
use crate::db::models::Role;
use crate::db::users::UserStore;
use crate::error::CmsError;
use crate::service::passwords::hash_password;
use tracing::{info, warn};

/// Create the configured admin account when no user exists yet.
/// Returns whether an account was created.
pub async fn ensure_admin(users: &UserStore, cfg: &Config) -> Result<bool, CmsError> {
    if users.count().await? > 0 {
        return Ok(false);
    }
    let (Some(email), Some(password)) = (cfg.admin.email.as_deref(), cfg.admin.password.as_deref())
    else {
        warn!("no users exist and no bootstrap admin is configured; admin API is unreachable");
        return Ok(false);
    };
    let email = email.trim().to_lowercase();
    let name = cfg.admin.name.clone().unwrap_or_else(|| "Administrator".to_string());
    let hash = hash_password(password.to_string(), cfg.basic.password_cost).await?;
    users.create(&email, &name, &hash, Role::Admin).await?;
    info!(email = %email, "bootstrap admin created");
    Ok(true)
}
