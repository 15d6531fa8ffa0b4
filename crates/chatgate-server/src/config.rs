use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::warn;

use chatgate_auth::TokenConfig;
use chatgate_coze::CozeConfig;
use chatgate_coze::client::DEFAULT_API_BASE;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "dev-secret-change-me", "secret"];

const DEFAULT_BOT_ID: &str = "7563218003241058343";

/// Upper bound for `CHATGATE_TOKEN_TTL_HOURS`: one year.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Everything the server needs, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_ttl_hours: i64,
    pub coze_api_base: String,
    pub coze_token_file: PathBuf,
    pub coze_bot_id: String,
    pub coze_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = get("CHATGATE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CHATGATE_JWT_SECRET is unset or still a placeholder; set it in .env and restart");
        }

        let token_ttl_hours: i64 = var("CHATGATE_TOKEN_TTL_HOURS", "72")
            .parse()
            .context("CHATGATE_TOKEN_TTL_HOURS must be an integer")?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            bail!(
                "CHATGATE_TOKEN_TTL_HOURS must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS,
                token_ttl_hours
            );
        }

        Ok(Self {
            host: var("CHATGATE_HOST", "0.0.0.0"),
            port: var("CHATGATE_PORT", "8080")
                .parse()
                .context("CHATGATE_PORT must be a port number")?,
            db_path: var("CHATGATE_DB_PATH", "chatgate.db").into(),
            jwt_secret,
            jwt_issuer: var("CHATGATE_JWT_ISSUER", "hdu-se-server"),
            token_ttl_hours,
            coze_api_base: var("COZE_API_BASE", DEFAULT_API_BASE),
            coze_token_file: var("COZE_TOKEN_FILE", "coze_token").into(),
            coze_bot_id: var("COZE_BOT_ID", DEFAULT_BOT_ID),
            coze_timeout_secs: var("COZE_TIMEOUT_SECS", "30")
                .parse()
                .context("COZE_TIMEOUT_SECS must be an integer")?,
        })
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt_secret.clone(),
            issuer: self.jwt_issuer.clone(),
            ttl: chrono::Duration::hours(self.token_ttl_hours),
        }
    }

    /// Reads the provider credential from `coze_token_file`. A missing file is
    /// not fatal: requests go out with an empty credential and fail upstream.
    pub fn coze_config(&self) -> CozeConfig {
        CozeConfig {
            api_base: self.coze_api_base.clone(),
            token: read_token(&self.coze_token_file),
            bot_id: self.coze_bot_id.clone(),
            timeout: Duration::from_secs(self.coze_timeout_secs),
        }
    }
}

fn read_token(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(token) => token.trim().to_string(),
        Err(e) => {
            warn!("Coze token file {} unreadable ({}); using empty credential", path.display(), e);
            String::new()
        }
    }
}
