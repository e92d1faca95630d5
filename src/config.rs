use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Runtime configuration.
///
/// Layers, later wins: built-in defaults, `config.toml` in the working
/// directory, then `SHIELDLINE_*` environment variables (`__` separates
/// nested keys, e.g. `SHIELDLINE_MAIL__RESEND_API_KEY`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub admin: AdminBootstrap,
    pub mail: MailConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// Public origin of the marketing site, used to build links in emails.
    pub site_url: Url,
    /// Secret for the private session cookie. At least 64 bytes; a random key
    /// is generated per process otherwise.
    pub cookie_secret: String,
    pub insecure_cookie: bool,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`. Turn off
    /// when the service is reachable without a reverse proxy in front.
    pub trust_proxy_headers: bool,
    pub session_ttl_hours: i64,
    pub body_limit_bytes: usize,
    /// bcrypt work factor for staff passwords.
    pub password_cost: u32,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:shieldline.sqlite".to_string(),
            loglevel: "info".to_string(),
            site_url: Url::parse("http://localhost:3000").expect("static url is valid"),
            cookie_secret: String::new(),
            insecure_cookie: false,
            trust_proxy_headers: true,
            session_ttl_hours: 24 * 7,
            body_limit_bytes: 2 * 1024 * 1024,
            password_cost: 12,
        }
    }
}

/// Admin account created on first start when the users table is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminBootstrap {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Without a key, outgoing mail is only logged.
    pub resend_api_key: Option<String>,
    pub api_url: Url,
    pub from: String,
    /// Staff inbox for lead notifications.
    pub notify_to: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            api_url: Url::parse("https://api.resend.com/emails").expect("static url is valid"),
            from: "Shieldline <noreply@shieldline.example>".to_string(),
            notify_to: "sales@shieldline.example".to_string(),
        }
    }
}

/// Per-client quotas, in requests per minute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub forms_per_minute: u32,
    pub likes_per_minute: u32,
    pub chat_per_minute: u32,
    pub login_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            forms_per_minute: 5,
            likes_per_minute: 30,
            chat_per_minute: 20,
            login_per_minute: 10,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("SHIELDLINE_").split("__"))
    }

    /// Join a path onto the public site URL.
    pub fn site_link(&self, path: &str) -> String {
        self.basic
            .site_url
            .join(path)
            .map(String::from)
            .unwrap_or_else(|_| format!("{}{}", self.basic.site_url, path.trim_start_matches('/')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("SHIELDLINE_BASIC__LOGLEVEL", "debug");
            jail.set_env("SHIELDLINE_RATE_LIMIT__FORMS_PER_MINUTE", "42");
            jail.set_env("SHIELDLINE_BASIC__TRUST_PROXY_HEADERS", "false");
            let cfg = Config::load()?;
            assert!(!cfg.basic.trust_proxy_headers);
            assert_eq!(cfg.basic.loglevel, "debug");
            assert_eq!(cfg.rate_limit.forms_per_minute, 42);
            assert_eq!(cfg.rate_limit.login_per_minute, 10);
            Ok(())
        });
    }

    #[test]
    fn toml_file_is_merged() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [mail]
                notify_to = "soc@example.com"
                [admin]
                email = "root@example.com"
                "#,
            )?;
            let cfg = Config::load()?;
            assert_eq!(cfg.mail.notify_to, "soc@example.com");
            assert_eq!(cfg.admin.email.as_deref(), Some("root@example.com"));
            Ok(())
        });
    }

    #[test]
    fn site_link_joins_paths() {
        let cfg = Config::default();
        assert_eq!(
            cfg.site_link("/newsletter/confirm/abc"),
            "http://localhost:3000/newsletter/confirm/abc"
        );
    }
}
