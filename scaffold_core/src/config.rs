//! # Configuration
//!
//! Where the calculator talks to. Resolution order, later wins:
//!
//! 1. Built-in defaults (`http://localhost:3001`, or `SCAFFOLD_API_URL` baked
//!    in at compile time for browser builds)
//! 2. `config.json` in the platform config directory (native only)
//! 3. `SCAFFOLD_API_URL` environment variable at runtime (native only)
//! 4. Explicit overrides from the front end (e.g. `--api-url`)

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "SCAFFOLD_API_URL";

/// Base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// File name of the optional config file in the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub calculate_path: String,
    pub payment_path: String,
    /// Request timeout in seconds; 0 disables it. Ignored in the browser.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: option_env!("SCAFFOLD_API_URL")
                .unwrap_or(DEFAULT_API_URL)
                .to_string(),
            calculate_path: "/api/calculate/scaffolding".to_string(),
            payment_path: "/api/payment/success".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Parse a config file body. Missing keys take their defaults.
    pub fn from_json(json: &str) -> CalcResult<Self> {
        serde_json::from_str(json).map_err(|e| CalcError::Config {
            reason: format!("invalid {}: {}", CONFIG_FILE_NAME, e),
        })
    }

    /// Load the effective configuration for this platform.
    ///
    /// A broken config file is logged and skipped rather than fatal.
    pub fn load() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut config = match crate::paths::config_file() {
                Some(path) if path.exists() => match crate::file_io::read_to_string(&path)
                    .and_then(|json| Config::from_json(&json))
                {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        tracing::warn!("Ignoring config file: {}", e);
                        Config::default()
                    }
                },
                _ => Config::default(),
            };
            config.apply_env(std::env::var(API_URL_ENV).ok());
            config
        }

        #[cfg(target_arch = "wasm32")]
        {
            Config::default()
        }
    }

    /// Apply the value of `SCAFFOLD_API_URL`, if set and non-empty.
    pub fn apply_env(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Join the base URL and an endpoint path with exactly one slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn calculate_url(&self) -> String {
        self.endpoint(&self.calculate_path)
    }

    pub fn payment_url(&self) -> String {
        self.endpoint(&self.payment_path)
    }

    /// Check that the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> CalcResult<()> {
        let url = reqwest::Url::parse(&self.api_base_url).map_err(|e| CalcError::Config {
            reason: format!("invalid API URL '{}': {}", self.api_base_url, e),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(CalcError::Config {
                reason: format!("unsupported URL scheme '{}'", other),
            }),
        }
    }
}
