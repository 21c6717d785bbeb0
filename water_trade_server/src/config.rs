use std::env;

use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use wtg_common::Secret;

use crate::errors::ServerError;

const DEFAULT_WTG_HOST: &str = "127.0.0.1";
const DEFAULT_WTG_PORT: u16 = 8360;
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8360";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The externally visible base URL. Magic links in notification emails are built against this, not against
    /// `host:port`, since the server usually sits behind a proxy.
    pub public_base_url: String,
    pub auth: AuthConfig,
    pub mailer: MailerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_WTG_HOST.to_string(),
            port: DEFAULT_WTG_PORT,
            database_url: String::default(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            auth: AuthConfig::default(),
            mailer: MailerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("WTG_HOST").ok().unwrap_or_else(|| DEFAULT_WTG_HOST.into());
        let port = env::var("WTG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for WTG_PORT. {e} Using the default, {DEFAULT_WTG_PORT}, instead."
                    );
                    DEFAULT_WTG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_WTG_PORT);
        let database_url = env::var("WTG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ WTG_DATABASE_URL is not set. Please set it to the URL for the trade database.");
            String::default()
        });
        let public_base_url = env::var("WTG_PUBLIC_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .ok()
            .unwrap_or_else(|| {
                warn!(
                    "🪛️ WTG_PUBLIC_BASE_URL is not set. Magic links in emails will point at \
                     {DEFAULT_PUBLIC_BASE_URL}."
                );
                DEFAULT_PUBLIC_BASE_URL.to_string()
            });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let mailer = MailerConfig::from_env_or_default();
        Self { host, port, database_url, public_base_url, auth, mailer }
    }
}

//-------------------------------------------------  AuthConfig  -----------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The key used to sign and verify session tokens.
    pub session_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The session signing secret has not been set. I'm using a random value for this session. All \
             issued session tokens become invalid when the server restarts. Set WTG_SESSION_SECRET on production \
             instances. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { session_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("WTG_SESSION_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [WTG_SESSION_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "WTG_SESSION_SECRET must be at least 32 characters long.".to_string(),
            ));
        }
        Ok(Self { session_secret: Secret::new(secret) })
    }
}

//-------------------------------------------------  MailerConfig  ---------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct MailerConfig {
    /// When false, notification emails are written to the log instead of being sent.
    pub enabled: bool,
    /// The transactional email provider's send endpoint.
    pub api_url: String,
    pub api_key: Secret<String>,
    /// The From address on notification emails.
    pub sender: String,
}

impl MailerConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("WTG_MAILER_API_URL").ok().unwrap_or_default();
        let api_key = Secret::new(env::var("WTG_MAILER_API_KEY").ok().unwrap_or_default());
        let sender = env::var("WTG_MAILER_SENDER").ok().unwrap_or_else(|| "trades@example.com".to_string());
        let enabled = wtg_common::parse_boolean_flag(env::var("WTG_MAILER_ENABLED").ok(), !api_url.is_empty());
        if enabled && api_url.is_empty() {
            warn!("🪛️ WTG_MAILER_ENABLED is set but WTG_MAILER_API_URL is not. Emails will be logged instead.");
        }
        if !enabled {
            info!("🪛️ The mailer is disabled. Notification emails will be written to the log.");
        }
        Self { enabled: enabled && !api_url.is_empty(), api_url, api_key, sender }
    }
}
