//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. A `.env` file is honored for local
//! development.

use std::env;
use std::time::Duration;

const DEFAULT_APP_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Use the in-memory identity provider instead of Supabase (`TESTING=1`)
    pub test_mode: bool,
    /// Supabase project URL, e.g. `https://xyz.supabase.co` (empty in test mode)
    pub supabase_url: String,
    /// Supabase API key sent as the `apikey` header
    pub supabase_key: String,
    /// Public (anon) key handed to the browser on the reset page
    pub supabase_anon_key: Option<String>,
    /// OpenAI API key; summaries are unavailable without it
    pub openai_api_key: Option<String>,
    /// Public base URL of this app, used for reset-link redirects and CORS
    pub app_base_url: String,
    /// Server port
    pub port: u16,
    /// Timeout for identity provider and data store calls
    pub http_timeout: Duration,
}

impl Config {
    /// Config for tests: in-memory providers, no external credentials.
    pub fn test_default() -> Self {
        Self {
            test_mode: true,
            supabase_url: String::new(),
            supabase_key: String::new(),
            supabase_anon_key: None,
            openai_api_key: None,
            app_base_url: DEFAULT_APP_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let test_mode = env::var("TESTING").map(|v| v.trim() == "1").unwrap_or(false);

        let supabase_url = non_empty_var("SUPABASE_URL")
            .map(|v| v.trim_end_matches('/').to_string());
        let supabase_key = non_empty_var("SUPABASE_KEY");

        let (supabase_url, supabase_key) = if test_mode {
            (supabase_url.unwrap_or_default(), supabase_key.unwrap_or_default())
        } else {
            (
                supabase_url.ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                supabase_key.ok_or(ConfigError::Missing("SUPABASE_KEY"))?,
            )
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let timeout_secs = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECS", raw))?,
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            test_mode,
            supabase_url,
            supabase_key,
            supabase_anon_key: non_empty_var("SUPABASE_ANON_KEY"),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            app_base_url: non_empty_var("APP_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_APP_BASE_URL.to_string()),
            port,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Whether a Supabase project is configured (always true outside test mode).
    pub fn has_supabase(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_key.is_empty()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases live in one test since they share process-wide env vars.
    #[test]
    fn test_config_from_env() {
        env::set_var("TESTING", "0");
        env::remove_var("SUPABASE_URL");
        env::set_var("SUPABASE_KEY", "anon-key");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("SUPABASE_URL"))
        ));

        env::set_var("SUPABASE_URL", "https://project.supabase.co/");
        env::set_var("PORT", "9001");
        let config = Config::from_env().expect("Config should load");

        assert!(!config.test_mode);
        assert_eq!(config.supabase_url, "https://project.supabase.co");
        assert_eq!(config.supabase_key, "anon-key");
        assert_eq!(config.port, 9001);
        assert!(config.has_supabase());

        env::set_var("PORT", "not-a-port");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("PORT", _))
        ));

        env::set_var("TESTING", "1");
        env::remove_var("PORT");
        env::remove_var("SUPABASE_URL");
        env::remove_var("SUPABASE_KEY");
        let config = Config::from_env().expect("Test mode needs no Supabase");
        assert!(config.test_mode);
        assert!(!config.has_supabase());
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
