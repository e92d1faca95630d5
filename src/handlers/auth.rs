use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::{Duration, Utc};
use tracing::info;

use crate::db::models::User;
use crate::error::CmsError;
use crate::middleware::auth::{CurrentUser, SESSION_COOKIE};
use crate::middleware::rate_limit::{Bucket, ClientIp};
use crate::middleware::validated::ValidatedJson;
use crate::router::AppState;
use crate::service::tokens::{digest, random_token};
use crate::types::forms::{LoginInput, normalize_email};
use crate::types::views::LoginView;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    jar: PrivateCookieJar,
    ValidatedJson(input): ValidatedJson<LoginInput>,
) -> Result<(PrivateCookieJar, Json<LoginView>), CmsError> {
    state.limits.check(Bucket::Login, ip)?;

    let email = normalize_email(&input.email);
    let account = state.users().find_by_email(&email).await?;
    let stored = account.as_ref().map(|u| u.password_hash.clone());
    let verified = state.login.verify(input.password, stored).await?;
    let Some(user) = account.filter(|_| verified) else {
        info!(ip = %ip, "login rejected");
        return Err(CmsError::InvalidCredentials);
    };

    let ttl_hours = state.config.basic.session_ttl_hours;
    let token = random_token();
    let expires_at = Utc::now() + Duration::hours(ttl_hours);
    state
        .sessions()
        .create(user.id, &digest(&token), expires_at)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!state.config.basic.insecure_cookie)
        .max_age(time::Duration::hours(ttl_hours))
        .build();

    info!(user_id = user.id, role = ?user.role, "staff login");
    Ok((
        jar.add(cookie),
        Json(LoginView {
            token,
            expires_at,
            user,
        }),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, StatusCode), CmsError> {
    state.sessions().delete(current.session_id).await?;
    info!(user_id = current.user.id, "staff logout");
    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    ))
}

/// GET /api/auth/session
pub async fn session(current: CurrentUser) -> Json<User> {
    Json(current.user)
}
