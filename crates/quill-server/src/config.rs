use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

use quill_ai::GeminiConfig;
use quill_ai::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_days: i64,
    /// `None` disables the AI routes.
    pub gemini: Option<GeminiConfig>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = get("QUILL_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("QUILL_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let host = get("QUILL_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("QUILL_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("QUILL_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("QUILL_HOST must be an IP address")?;

        let db_path = get("QUILL_DB_PATH").unwrap_or_else(|| "quill.db".into()).into();
        let token_days = get("QUILL_TOKEN_DAYS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);

        let gemini = get("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| GeminiConfig {
                api_key,
                model: get("QUILL_GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
                base_url: get("QUILL_GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
                timeout: Duration::from_secs(
                    get("QUILL_AI_TIMEOUT_SECS")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(30),
                ),
            });

        Ok(Self {
            addr,
            db_path,
            jwt_secret,
            token_days,
            gemini,
        })
    }
}
