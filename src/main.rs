use chrono::Utc;
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use shieldline::config::Config;
use shieldline::db::users::{SessionStore, UserStore};
use shieldline::middleware::rate_limit::RateLimits;
use shieldline::service::{bootstrap, mailer};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let mail_transport = if cfg.mail.resend_api_key.is_some() {
        "resend"
    } else {
        "log"
    };
    info!(
        database_url = %cfg.basic.database_url,
        listen_addr = %cfg.basic.listen_addr,
        site_url = %cfg.basic.site_url,
        loglevel = %cfg.basic.loglevel,
        mail = mail_transport
    );

    let pool = shieldline::db::connect(&cfg.basic.database_url).await?;
    bootstrap::ensure_admin(&UserStore::new(pool.clone()), &cfg).await?;

    let purged = SessionStore::new(pool.clone()).purge_expired(Utc::now()).await?;
    if purged > 0 {
        info!(purged, "expired sessions removed");
    }

    let mailer = mailer::from_config(&cfg.mail)?;
    let addr = cfg.basic.listen_addr.clone();
    let state = shieldline::AppState::new(pool, cfg, mailer);
    state.login.prime().await?;
    spawn_limiter_sweeper(state.limits.clone());
    let app = shieldline::cms_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

fn spawn_limiter_sweeper(limits: Arc<RateLimits>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            limits.retain_recent();
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
