use crate::config::RateLimitConfig;
use crate::error::CmsError;
use crate::router::AppState;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, request::Parts};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use tracing::warn;

/// Independent quotas so a burst of likes cannot lock a visitor out of the
/// contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Forms,
    Likes,
    Chat,
    Login,
}

pub struct RateLimits {
    forms: DefaultKeyedRateLimiter<IpAddr>,
    likes: DefaultKeyedRateLimiter<IpAddr>,
    chat: DefaultKeyedRateLimiter<IpAddr>,
    login: DefaultKeyedRateLimiter<IpAddr>,
}

fn per_minute(n: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))
}

impl RateLimits {
    pub fn new(cfg: &RateLimitConfig) -> Self {
        Self {
            forms: RateLimiter::keyed(per_minute(cfg.forms_per_minute)),
            likes: RateLimiter::keyed(per_minute(cfg.likes_per_minute)),
            chat: RateLimiter::keyed(per_minute(cfg.chat_per_minute)),
            login: RateLimiter::keyed(per_minute(cfg.login_per_minute)),
        }
    }

    fn limiter(&self, bucket: Bucket) -> &DefaultKeyedRateLimiter<IpAddr> {
        match bucket {
            Bucket::Forms => &self.forms,
            Bucket::Likes => &self.likes,
            Bucket::Chat => &self.chat,
            Bucket::Login => &self.login,
        }
    }

    pub fn check(&self, bucket: Bucket, ip: IpAddr) -> Result<(), CmsError> {
        self.limiter(bucket).check_key(&ip).map_err(|_| {
            warn!(ip = %ip, bucket = ?bucket, "rate limit exceeded");
            CmsError::RateLimited
        })
    }

    /// Drop state for clients whose quota has fully replenished.
    pub fn retain_recent(&self) {
        for bucket in [Bucket::Forms, Bucket::Likes, Bucket::Chat, Bucket::Login] {
            let limiter = self.limiter(bucket);
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }
}

/// Best-effort client address: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer. Unspecified when none is known.
/// Proxy headers are skipped unless `basic.trust_proxy_headers` is set.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

pub fn ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    header("x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| header("x-real-ip").and_then(|v| v.trim().parse().ok()))
}

fn client_ip(parts: &Parts, trust_proxy_headers: bool) -> IpAddr {
    trust_proxy_headers
        .then(|| ip_from_headers(&parts.headers))
        .flatten()
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(parts, state.config.basic.trust_proxy_headers)))
    }
}
