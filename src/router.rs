use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, patch, post, put},
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::db::SqlitePool;
use crate::db::catalog::{CaseStudyStore, ResourceStore, ServiceStore, TestimonialStore};
use crate::db::chat::ChatStore;
use crate::db::comments::CommentStore;
use crate::db::leads::LeadStore;
use crate::db::posts::PostStore;
use crate::db::settings::SettingsStore;
use crate::db::subscribers::SubscriberStore;
use crate::db::taxonomy::{CategoryStore, TagStore};
use crate::db::users::{SessionStore, UserStore};
use crate::handlers::{self, admin};
use crate::middleware::rate_limit::RateLimits;
use crate::service::mailer::Mailer;
use crate::service::passwords::LoginVerifier;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
    pub limits: Arc<RateLimits>,
    pub login: Arc<LoginVerifier>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let cookie_key = cookie_key(&config.basic.cookie_secret);
        let limits = Arc::new(RateLimits::new(&config.rate_limit));
        let login = Arc::new(LoginVerifier::new(config.basic.password_cost));
        Self {
            pool,
            config: Arc::new(config),
            mailer,
            limits,
            login,
            cookie_key,
        }
    }

    pub fn cookie_key(&self) -> Key {
        self.cookie_key.clone()
    }

    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(self.pool.clone())
    }

    pub fn posts(&self) -> PostStore {
        PostStore::new(self.pool.clone())
    }

    pub fn categories(&self) -> CategoryStore {
        CategoryStore::new(self.pool.clone())
    }

    pub fn tags(&self) -> TagStore {
        TagStore::new(self.pool.clone())
    }

    pub fn comments(&self) -> CommentStore {
        CommentStore::new(self.pool.clone())
    }

    pub fn leads(&self) -> LeadStore {
        LeadStore::new(self.pool.clone())
    }

    pub fn subscribers(&self) -> SubscriberStore {
        SubscriberStore::new(self.pool.clone())
    }

    pub fn services(&self) -> ServiceStore {
        ServiceStore::new(self.pool.clone())
    }

    pub fn resources(&self) -> ResourceStore {
        ResourceStore::new(self.pool.clone())
    }

    pub fn case_studies(&self) -> CaseStudyStore {
        CaseStudyStore::new(self.pool.clone())
    }

    pub fn testimonials(&self) -> TestimonialStore {
        TestimonialStore::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingsStore {
        SettingsStore::new(self.pool.clone())
    }

    pub fn chat(&self) -> ChatStore {
        ChatStore::new(self.pool.clone())
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

fn cookie_key(secret: &str) -> Key {
    match Key::try_from(secret.as_bytes()) {
        Ok(key) => key,
        Err(_) => {
            warn!("basic.cookie_secret shorter than 64 bytes; sessions will not survive a restart");
            Key::generate()
        }
    }
}

pub fn cms_router(state: AppState) -> Router {
    let body_limit = state.config.basic.body_limit_bytes;

    let admin_routes = Router::new()
        .route("/dashboard", get(admin::dashboard::overview))
        .route(
            "/posts",
            get(admin::posts::list_posts).post(admin::posts::create_post),
        )
        .route(
            "/posts/{id}",
            get(admin::posts::get_post)
                .put(admin::posts::update_post)
                .delete(admin::posts::delete_post),
        )
        .route(
            "/categories",
            get(admin::taxonomy::list_categories).post(admin::taxonomy::create_category),
        )
        .route(
            "/categories/{id}",
            put(admin::taxonomy::update_category).delete(admin::taxonomy::delete_category),
        )
        .route(
            "/tags",
            get(admin::taxonomy::list_tags).post(admin::taxonomy::create_tag),
        )
        .route(
            "/tags/{id}",
            put(admin::taxonomy::update_tag).delete(admin::taxonomy::delete_tag),
        )
        .route("/comments", get(admin::comments::list_comments))
        .route(
            "/comments/{id}",
            patch(admin::comments::moderate_comment).delete(admin::comments::delete_comment),
        )
        .route("/leads", get(admin::leads::list_leads))
        .route("/leads/export", get(admin::leads::export_leads))
        .route(
            "/leads/{id}",
            get(admin::leads::get_lead)
                .patch(admin::leads::update_lead_status)
                .delete(admin::leads::delete_lead),
        )
        .route("/subscribers", get(admin::subscribers::list_subscribers))
        .route(
            "/subscribers/{id}",
            axum::routing::delete(admin::subscribers::delete_subscriber),
        )
        .route(
            "/services",
            get(admin::catalog::list_services).post(admin::catalog::create_service),
        )
        .route(
            "/services/{id}",
            get(admin::catalog::get_service)
                .put(admin::catalog::update_service)
                .delete(admin::catalog::delete_service),
        )
        .route(
            "/resources",
            get(admin::catalog::list_resources).post(admin::catalog::create_resource),
        )
        .route(
            "/resources/{id}",
            get(admin::catalog::get_resource)
                .put(admin::catalog::update_resource)
                .delete(admin::catalog::delete_resource),
        )
        .route(
            "/case-studies",
            get(admin::catalog::list_case_studies).post(admin::catalog::create_case_study),
        )
        .route(
            "/case-studies/{id}",
            get(admin::catalog::get_case_study)
                .put(admin::catalog::update_case_study)
                .delete(admin::catalog::delete_case_study),
        )
        .route(
            "/testimonials",
            get(admin::catalog::list_testimonials).post(admin::catalog::create_testimonial),
        )
        .route(
            "/testimonials/{id}",
            get(admin::catalog::get_testimonial)
                .put(admin::catalog::update_testimonial)
                .delete(admin::catalog::delete_testimonial),
        )
        .route(
            "/settings",
            get(admin::settings::list_settings).put(admin::settings::upsert_settings),
        )
        .route(
            "/settings/{key}",
            axum::routing::delete(admin::settings::delete_setting),
        )
        .route(
            "/users",
            get(admin::users::list_users).post(admin::users::create_user),
        )
        .route(
            "/users/{id}",
            patch(admin::users::update_user).delete(admin::users::delete_user),
        )
        .route("/chat", get(admin::chat::list_conversations))
        .route("/chat/{id}", get(admin::chat::get_conversation))
        .route("/chat/{id}/reply", post(admin::chat::reply))
        .route("/chat/{id}/close", post(admin::chat::close));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/session", get(handlers::auth::session))
        .route(
            "/api/leads",
            post(handlers::leads::create_lead).get(handlers::leads::list_leads),
        )
        .route("/api/contact", post(handlers::leads::contact))
        .route(
            "/api/newsletter/subscribe",
            post(handlers::newsletter::subscribe),
        )
        .route(
            "/api/newsletter/confirm/{token}",
            get(handlers::newsletter::confirm),
        )
        .route(
            "/api/newsletter/unsubscribe/{token}",
            get(handlers::newsletter::unsubscribe),
        )
        .route("/api/public/posts", get(handlers::blog::list_posts))
        .route("/api/public/posts/{slug}", get(handlers::blog::get_post))
        .route(
            "/api/public/posts/{slug}/comments",
            post(handlers::blog::create_comment),
        )
        .route("/api/public/categories", get(handlers::blog::list_categories))
        .route("/api/public/tags", get(handlers::blog::list_tags))
        .route("/api/comments/{id}/like", post(handlers::blog::like_comment))
        .route("/api/services", get(handlers::catalog::list_services))
        .route("/api/services/{slug}", get(handlers::catalog::get_service))
        .route("/api/case-studies", get(handlers::catalog::list_case_studies))
        .route(
            "/api/case-studies/{slug}",
            get(handlers::catalog::get_case_study),
        )
        .route("/api/testimonials", get(handlers::catalog::list_testimonials))
        .route("/api/resources", get(handlers::catalog::list_resources))
        .route("/api/resources/{slug}", get(handlers::catalog::get_resource))
        .route(
            "/api/resources/{slug}/download",
            post(handlers::catalog::download_resource),
        )
        .route("/api/settings", get(handlers::catalog::public_settings))
        .route(
            "/api/chat/conversations",
            post(handlers::chat::start_conversation),
        )
        .route(
            "/api/chat/conversations/{id}/messages",
            get(handlers::chat::list_messages).post(handlers::chat::post_message),
        )
        .nest("/api/admin", admin_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
