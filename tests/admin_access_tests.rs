mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use common::{PASSWORD, authed, get, json_request, spawn_app, spawn_app_with, test_config};
use serde_json::json;
use shieldline::db::models::Role;
use shieldline::service::passwords::hash_password;
use shieldline::service::tokens::{digest, random_token};

#[tokio::test]
async fn admin_routes_require_a_session() {
    let t = spawn_app().await;
    for uri in [
        "/api/admin/dashboard",
        "/api/admin/posts",
        "/api/admin/leads",
        "/api/admin/settings",
        "/api/leads",
    ] {
        let (status, body) = t.send(get(uri)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    let (status, _) = t
        .send(authed(get("/api/admin/dashboard"), "not-a-real-token"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_role_is_forbidden() {
    let t = spawn_app().await;
    let token = t.staff_token("viewer@example.com", Role::User).await;

    let (status, body) = t.send(authed(get("/api/admin/dashboard"), &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = t.send(authed(get("/api/leads"), &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t.send(authed(get("/api/auth/session"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "viewer@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn editor_manages_content_but_not_settings_or_users() {
    let t = spawn_app().await;
    let token = t.staff_token("editor@example.com", Role::Editor).await;

    let (status, _) = t
        .send(authed(
            json_request(
                "POST",
                "/api/admin/categories",
                &json!({"name": "Threat Intel"}),
            ),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = t.send(authed(get("/api/admin/settings"), &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.send(authed(get("/api/admin/users"), &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.send(authed(get("/api/admin/leads"), &token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_gives_no_hint() {
    let t = spawn_app().await;
    t.staff_token("admin@example.com", Role::Admin).await;

    let (status, known) = t
        .send(json_request(
            "POST",
            "/api/auth/login",
            &json!({"email": "admin@example.com", "password": "wrong-password"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = t
        .send(json_request(
            "POST",
            "/api/auth/login",
            &json!({"email": "ghost@example.com", "password": PASSWORD}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(known, unknown);
}

#[tokio::test]
async fn login_sets_cookie_and_logout_ends_session() {
    let t = spawn_app().await;
    let token = t.staff_token("admin@example.com", Role::Admin).await;

    let resp_cookie = {
        use tower::ServiceExt;
        let resp = t
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                &json!({"email": "admin@example.com", "password": PASSWORD}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    };
    assert!(resp_cookie.starts_with("shieldline_session="));

    let cookie_req = Request::builder()
        .uri("/api/admin/dashboard")
        .header(header::COOKIE, &resp_cookie)
        .body(Body::empty())
        .unwrap();
    let (status, body) = t.send(cookie_req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"]["draft"], 0);

    let (status, _) = t
        .send(authed(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t.send(authed(get("/api/auth/session"), &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_cannot_delete_or_demote_themselves() {
    let t = spawn_app().await;
    let token = t.staff_token("admin@example.com", Role::Admin).await;
    let me = t
        .state
        .users()
        .find_by_email("admin@example.com")
        .await
        .unwrap()
        .unwrap();

    let (status, _) = t
        .send(authed(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/admin/users/{}", me.id))
                .body(Body::empty())
                .unwrap(),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .send(authed(
            json_request(
                "PATCH",
                &format!("/api/admin/users/{}", me.id),
                &json!({"role": "editor"}),
            ),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = t
        .send(authed(
            json_request(
                "POST",
                "/api/admin/users",
                &json!({
                    "email": "new.editor@example.com",
                    "name": "New Editor",
                    "password": "long-enough-pass",
                    "role": "editor"
                }),
            ),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let editor_id = body["id"].as_i64().unwrap();

    let (status, _) = t
        .send(authed(
            json_request(
                "POST",
                "/api/admin/users",
                &json!({
                    "email": "NEW.editor@example.com",
                    "name": "Dup",
                    "password": "long-enough-pass",
                    "role": "user"
                }),
            ),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = t
        .send(authed(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/admin/users/{editor_id}"))
                .body(Body::empty())
                .unwrap(),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn settings_batch_upsert_exposes_only_public_keys() {
    let t = spawn_app().await;
    let token = t.staff_token("admin@example.com", Role::Admin).await;

    let (status, body) = t
        .send(authed(
            json_request(
                "PUT",
                "/api/admin/settings",
                &json!({"settings": [
                    {"key": "hotline", "value": "+1 555 0100", "is_public": true},
                    {"key": "crm_webhook", "value": {"url": "https://crm.internal"}}
                ]}),
            ),
            &token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, public) = t.send(get("/api/settings")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public, json!({"hotline": "+1 555 0100"}));
}

#[tokio::test]
async fn expired_session_is_rejected_and_removed() {
    let t = spawn_app().await;
    let hash = hash_password(PASSWORD.to_string(), 4).await.unwrap();
    let user = t
        .state
        .users()
        .create("stale@example.com", "Stale", &hash, Role::Admin)
        .await
        .unwrap();
    let token = random_token();
    t.state
        .sessions()
        .create(user.id, &digest(&token), Utc::now() - Duration::minutes(5))
        .await
        .unwrap();

    let (status, body) = t.send(authed(get("/api/auth/session"), &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert!(
        t.state
            .sessions()
            .find_by_hash(&digest(&token))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn login_quota_returns_429() {
    let mut cfg = test_config();
    cfg.rate_limit.login_per_minute = 2;
    let t = spawn_app_with(cfg, None).await;
    let attempt = json!({"email": "nobody@example.com", "password": "guess-123"});

    for _ in 0..2 {
        let (status, _) = t
            .send(json_request("POST", "/api/auth/login", &attempt))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = t
        .send(json_request("POST", "/api/auth/login", &attempt))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn empty_or_blank_settings_are_rejected() {
    let t = spawn_app().await;
    let token = t.staff_token("admin@example.com", Role::Admin).await;

    for batch in [
        json!({"settings": []}),
        json!({"settings": [{"key": "   ", "value": "x"}]}),
    ] {
        let (status, body) = t
            .send(authed(
                json_request("PUT", "/api/admin/settings", &batch),
                &token,
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{batch}");
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
    assert!(t.state.settings().list().await.unwrap().is_empty());
}
