use serde::{Deserialize, Serialize};

const DEFAULT_BACKEND_URL_DEVELOPMENT: &str = "http://localhost:5000/api";
const DEFAULT_BACKEND_URL_PRODUCTION: &str = "https://api.bartermarket.in/api";
const DEFAULT_SEARCH_DEBOUNCE_MS: u32 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend_url_development: String,
    pub backend_url_production: String,
    pub environment: String,
    pub enable_logging: bool,
    pub search_debounce_ms: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url_development: DEFAULT_BACKEND_URL_DEVELOPMENT.to_string(),
            backend_url_production: DEFAULT_BACKEND_URL_PRODUCTION.to_string(),
            environment: "development".to_string(),
            enable_logging: true,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
        }
    }
}

impl AppConfig {
    /// Loads the configuration from compile-time environment variables
    /// (`build.rs` forwards the entries of `.env`).
    pub fn from_env() -> Self {
        Self::from_values(
            option_env!("BACKEND_URL_DEVELOPMENT"),
            option_env!("BACKEND_URL_PRODUCTION"),
            option_env!("ENVIRONMENT"),
            option_env!("ENABLE_LOGGING"),
            option_env!("SEARCH_DEBOUNCE_MS"),
        )
    }

    fn from_values(
        backend_url_development: Option<&str>,
        backend_url_production: Option<&str>,
        environment: Option<&str>,
        enable_logging: Option<&str>,
        search_debounce_ms: Option<&str>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            backend_url_development: backend_url_development
                .map(str::to_string)
                .unwrap_or(defaults.backend_url_development),
            backend_url_production: backend_url_production
                .map(str::to_string)
                .unwrap_or(defaults.backend_url_production),
            environment: environment
                .map(|env| env.trim().to_lowercase())
                .unwrap_or(defaults.environment),
            enable_logging: enable_logging
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.enable_logging),
            search_debounce_ms: search_debounce_ms
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.search_debounce_ms),
        }
    }

    /// Backend base URL for the current environment
    pub fn backend_url(&self) -> &str {
        match self.environment.as_str() {
            "production" => &self.backend_url_production,
            _ => &self.backend_url_development,
        }
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }
}

lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}
