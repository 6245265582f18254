use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use mystery_api::suggest::SuggestConfig;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub session_ttl: chrono::Duration,
    pub static_dir: Option<PathBuf>,
    pub suggest: SuggestConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = var("MYSTERY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("MYSTERY_JWT_SECRET is unset or still a placeholder");
        }

        let session_days: i64 = parse_or(&var, "MYSTERY_SESSION_DAYS", 30)?;
        let timeout_secs: u64 = parse_or(&var, "MYSTERY_SUGGEST_TIMEOUT_SECS", 30)?;

        Ok(Self {
            host: var("MYSTERY_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&var, "MYSTERY_PORT", 3000)?,
            db_path: var("MYSTERY_DB_PATH")
                .unwrap_or_else(|| "mystery.db".into())
                .into(),
            jwt_secret,
            session_ttl: chrono::Duration::days(session_days),
            static_dir: var("MYSTERY_STATIC_DIR").map(PathBuf::from),
            suggest: SuggestConfig {
                api_key: var("GOOGLE_GENERATIVE_AI_API_KEY"),
                model: var("MYSTERY_SUGGEST_MODEL").unwrap_or_else(|| "gemini-2.5-flash".into()),
                base_url: var("MYSTERY_SUGGEST_URL")
                    .unwrap_or_else(|| "https://generativelanguage.googleapis.com".into()),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        None => Ok(default),
    }
}
