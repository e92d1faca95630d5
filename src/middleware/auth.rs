use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::PrivateCookieJar;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::Utc;
use tracing::{debug, warn};

use crate::db::models::User;
use crate::error::CmsError;
use crate::router::AppState;
use crate::service::rbac::Permission;
use crate::service::tokens::digest;

pub const SESSION_COOKIE: &str = "shieldline_session";

/// Signed-in staff member, resolved from a bearer token or the private
/// session cookie. Rejects with 401 when neither yields a live session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_id: i64,
}

impl CurrentUser {
    /// 403 unless the user's role grants `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), CmsError> {
        self.user.role.require(permission).inspect_err(|_| {
            warn!(
                user_id = self.user.id,
                role = ?self.user.role,
                permission = ?permission,
                "permission denied"
            );
        })
    }
}

/// Raw session token carried by the request, if any.
pub fn session_token(parts: &Parts, state: &AppState) -> Option<String> {
    if let Some(Authorization(bearer)) = parts.headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_owned());
    }
    PrivateCookieJar::from_headers(&parts.headers, state.cookie_key())
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = CmsError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, state).ok_or(CmsError::Unauthorized)?;

        let sessions = state.sessions();
        let session = sessions
            .find_by_hash(&digest(&token))
            .await?
            .ok_or(CmsError::Unauthorized)?;

        if session.expires_at <= Utc::now() {
            debug!(session_id = session.id, "session expired; removing");
            sessions.delete(session.id).await?;
            return Err(CmsError::Unauthorized);
        }

        let user = state
            .users()
            .get(session.user_id)
            .await?
            .ok_or(CmsError::Unauthorized)?;

        Ok(Self {
            user,
            session_id: session.id,
        })
    }
}
