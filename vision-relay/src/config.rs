//! Configuration for the relay.
//!
//! Operational settings (listen address, upstream timeout, CORS) are loaded
//! once at startup. Credentials and endpoint URLs are read from the
//! environment on every invocation through [`UpstreamConfig`].

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use vision_relay_common::ModelKey;

/// Bounds for the upstream timeout, in seconds.
pub const MIN_UPSTREAM_TIMEOUT_SECS: u64 = 120;
pub const MAX_UPSTREAM_TIMEOUT_SECS: u64 = 180;

pub const TOKEN_ENV_VAR: &str = "HF_TOKEN";

/// Main configuration structure for the relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    /// Upstream request timeout in seconds (default: 120, clamped to 120..=180).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl UpstreamSettings {
    /// The effective timeout, clamped to the supported range.
    pub fn timeout(&self) -> Duration {
        let secs = self
            .timeout_secs
            .clamp(MIN_UPSTREAM_TIMEOUT_SECS, MAX_UPSTREAM_TIMEOUT_SECS);
        if secs != self.timeout_secs {
            tracing::warn!(
                "upstream.timeout_secs={} is out of range, using {}",
                self.timeout_secs,
                secs
            );
        }
        Duration::from_secs(secs)
    }
}

/// CORS policy applied to every handler response.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Value of `Access-Control-Allow-Origin`. Empty disables the header.
    #[serde(default = "default_allow_origin")]
    pub allow_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: default_allow_origin(),
        }
    }
}

impl CorsConfig {
    pub fn disabled() -> Self {
        Self {
            allow_origin: String::new(),
        }
    }

    pub fn allow_origin(&self) -> Option<&str> {
        let origin = self.allow_origin.trim();
        (!origin.is_empty()).then_some(origin)
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout_secs() -> u64 {
    MIN_UPSTREAM_TIMEOUT_SECS
}
fn default_allow_origin() -> String {
    "*".to_string()
}

impl Settings {
    /// Load settings from `config.toml` (if present) and environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name("config").required(false))
    }

    /// Load settings from an explicit file, still honouring environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::build(File::from(path).required(true))
    }

    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (VISION_RELAY__SECTION__KEY format)
    /// 2. The given file
    /// 3. Built-in defaults
    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = ConfigLoader::builder()
            .set_default("api.host", default_host())?
            .set_default("api.port", default_port() as i64)?
            .set_default("upstream.timeout_secs", default_timeout_secs() as i64)?
            .set_default("cors.allow_origin", default_allow_origin())?
            .add_source(file)
            .add_source(
                Environment::with_prefix("VISION_RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Source of environment values.
///
/// Lets tests inject a fixed environment instead of mutating the process one.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Missing or invalid upstream configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Chave de modelo inválida.")]
    InvalidModelKey(String),
    #[error("Variáveis de ambiente não configuradas no Netlify.")]
    MissingEnvironment(&'static str),
}

/// Credentials and endpoints, resolved once per invocation.
#[derive(Clone, Default)]
pub struct UpstreamConfig {
    token: Option<String>,
    endpoint_4b: Option<String>,
    endpoint_27b: Option<String>,
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("endpoint_4b", &self.endpoint_4b)
            .field("endpoint_27b", &self.endpoint_27b)
            .finish()
    }
}

/// A resolved upstream call target.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub model: ModelKey,
    pub url: String,
    pub token: String,
}

impl std::fmt::Debug for UpstreamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamTarget")
            .field("model", &self.model)
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl UpstreamConfig {
    /// Read the current values from an environment source.
    ///
    /// Unset and empty variables are both treated as absent.
    pub fn from_source<E: EnvSource + ?Sized>(env: &E) -> Self {
        let read = |key: &str| env.var(key).filter(|v| !v.is_empty());
        Self {
            token: read(TOKEN_ENV_VAR),
            endpoint_4b: read(ModelKey::FourB.endpoint_env_var()),
            endpoint_27b: read(ModelKey::TwentySevenB.endpoint_env_var()),
        }
    }

    pub fn endpoint(&self, model: ModelKey) -> Option<&str> {
        match model {
            ModelKey::FourB => self.endpoint_4b.as_deref(),
            ModelKey::TwentySevenB => self.endpoint_27b.as_deref(),
        }
    }

    /// Resolve the call target for a caller-supplied model key.
    ///
    /// An unknown key is reported before missing variables.
    pub fn resolve(&self, model_key: &str) -> Result<UpstreamTarget, ConfigurationError> {
        let model: ModelKey = model_key
            .parse()
            .map_err(|_| ConfigurationError::InvalidModelKey(model_key.to_string()))?;

        let url = self
            .endpoint(model)
            .ok_or(ConfigurationError::MissingEnvironment(model.endpoint_env_var()))?;
        let token = self
            .token
            .as_deref()
            .ok_or(ConfigurationError::MissingEnvironment(TOKEN_ENV_VAR))?;

        Ok(UpstreamTarget {
            model,
            url: url.to_string(),
            token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.api.host, "0.0.0.0");
        assert_eq!(settings.api.port, 8080);
        assert_eq!(settings.upstream.timeout(), Duration::from_secs(120));
        assert_eq!(settings.cors.allow_origin(), Some("*"));
    }

    #[test]
    fn test_timeout_is_clamped() {
        let low = UpstreamSettings { timeout_secs: 5 };
        let high = UpstreamSettings { timeout_secs: 600 };
        let mid = UpstreamSettings { timeout_secs: 150 };
        assert_eq!(low.timeout(), Duration::from_secs(120));
        assert_eq!(high.timeout(), Duration::from_secs(180));
        assert_eq!(mid.timeout(), Duration::from_secs(150));
    }

    #[test]
    fn test_empty_allow_origin_disables_cors() {
        assert_eq!(CorsConfig::disabled().allow_origin(), None);
        let blank = CorsConfig {
            allow_origin: "  ".to_string(),
        };
        assert_eq!(blank.allow_origin(), None);
    }

    #[test]
    fn test_resolve_each_model() {
        let config = UpstreamConfig::from_source(&env(&[
            ("HF_TOKEN", "secret"),
            ("ENDPOINT_URL_4B", "https://small.example"),
            ("ENDPOINT_URL_27B", "https://large.example"),
        ]));

        let small = config.resolve("4b").unwrap();
        assert_eq!(small.model, ModelKey::FourB);
        assert_eq!(small.url, "https://small.example");
        assert_eq!(small.token, "secret");

        let large = config.resolve("27b").unwrap();
        assert_eq!(large.url, "https://large.example");
    }

    #[test]
    fn test_invalid_model_key_reported_first() {
        let config = UpstreamConfig::from_source(&env(&[]));
        let err = config.resolve("70b").unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidModelKey("70b".to_string()));
        assert_eq!(err.to_string(), "Chave de modelo inválida.");
    }

    #[test]
    fn test_missing_token() {
        let config =
            UpstreamConfig::from_source(&env(&[("ENDPOINT_URL_4B", "https://small.example")]));
        assert_eq!(
            config.resolve("4b").unwrap_err(),
            ConfigurationError::MissingEnvironment("HF_TOKEN")
        );
    }

    #[test]
    fn test_missing_endpoint_for_selected_model() {
        let config = UpstreamConfig::from_source(&env(&[
            ("HF_TOKEN", "secret"),
            ("ENDPOINT_URL_4B", "https://small.example"),
        ]));
        let err = config.resolve("27b").unwrap_err();
        assert_eq!(err, ConfigurationError::MissingEnvironment("ENDPOINT_URL_27B"));
        assert_eq!(
            err.to_string(),
            "Variáveis de ambiente não configuradas no Netlify."
        );
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let config = UpstreamConfig::from_source(&env(&[
            ("HF_TOKEN", ""),
            ("ENDPOINT_URL_4B", "https://small.example"),
        ]));
        assert!(matches!(
            config.resolve("4b"),
            Err(ConfigurationError::MissingEnvironment("HF_TOKEN"))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = UpstreamConfig::from_source(&env(&[("HF_TOKEN", "hf_supersecret")]));
        assert!(!format!("{:?}", config).contains("hf_supersecret"));
    }
}
