#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::Value;
use shieldline::config::Config;
use shieldline::db::models::Role;
use shieldline::error::CmsError;
use shieldline::service::mailer::{Mailer, OutgoingEmail};
use shieldline::service::passwords::hash_password;
use shieldline::{AppState, cms_router};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse battery";

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), CmsError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Transport that is always down.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), CmsError> {
        Err(CmsError::Mail("smtp relay unreachable".to_string()))
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub mails: Arc<RecordingMailer>,
}

static SEQ: AtomicU64 = AtomicU64::new(0);

fn temp_database_url() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "shieldline-it-{}-{}-{}.sqlite",
        std::process::id(),
        nanos,
        SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    format!("sqlite:{}", temp_path.display())
}

/// Config independent of any `config.toml` or env in the working directory.
pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.basic.password_cost = 4;
    cfg.basic.insecure_cookie = true;
    cfg.basic.cookie_secret = "k".repeat(64);
    cfg.rate_limit.forms_per_minute = 1000;
    cfg.rate_limit.likes_per_minute = 1000;
    cfg.rate_limit.chat_per_minute = 1000;
    cfg.rate_limit.login_per_minute = 1000;
    cfg
}

pub async fn spawn_app_with(cfg: Config, mailer: Option<Arc<dyn Mailer>>) -> TestApp {
    let pool = shieldline::db::connect(&temp_database_url())
        .await
        .expect("open test database");
    let mails = Arc::new(RecordingMailer::default());
    let mailer: Arc<dyn Mailer> = match mailer {
        Some(m) => m,
        None => mails.clone(),
    };
    let state = AppState::new(pool, cfg, mailer);
    TestApp {
        app: cms_router(state.clone()),
        state,
        mails,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), None).await
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed(mut req: Request<Body>, token: &str) -> Request<Body> {
    req.headers_mut().insert(
        "authorization",
        format!("Bearer {token}").parse().unwrap(),
    );
    req
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

impl TestApp {
    /// Send one request; non-JSON bodies come back as `Value::Null`.
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// Create an account directly in the store and log in through the API.
    pub async fn staff_token(&self, email: &str, role: Role) -> String {
        let hash = hash_password(PASSWORD.to_string(), 4).await.unwrap();
        self.state
            .users()
            .create(email, "Staff Member", &hash, role)
            .await
            .unwrap();
        let (status, body) = self
            .send(json_request(
                "POST",
                "/api/auth/login",
                &serde_json::json!({"email": email, "password": PASSWORD}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }
}
