use serde::Deserialize;
use std::path::PathBuf;
use validator::{Validate, ValidationError};

use crate::models::internal::SearchMode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Source(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Main configuration for the paperchat client
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct Config {
    /// Base URL of the RAG backend (without the `/api/v1` prefix)
    #[validate(custom(function = "validate_http_url"))]
    pub api_base_url: String,

    /// Papers retrieved per chat turn
    #[validate(range(min = 1, max = 50))]
    pub n_results: u32,

    /// Retrieval engine requested from the backend
    pub search_mode: SearchMode,

    /// Previous messages the backend may use as context
    #[validate(range(max = 50))]
    pub max_context_messages: u32,

    /// Directory downloaded exports are written to
    pub export_dir: PathBuf,

    /// Log level (e.g., info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            n_results: 5,
            search_mode: SearchMode::Faiss,
            max_context_messages: 5,
            export_dir: PathBuf::from("exports"),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigLoadError> {
        let path = format!(
            "{}/.paperchat/config",
            dirs::home_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ".".to_string())
        );
        Self::load_from(&path)
    }

    /// Loads defaults, then the optional config file at `path` (any format the
    /// `config` crate detects from the extension), then `PAPERCHAT__*` env vars.
    pub fn load_from(path: &str) -> Result<Self, ConfigLoadError> {
        let defaults = Config::default();
        let settings = config::Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("n_results", defaults.n_results)?
            .set_default("search_mode", defaults.search_mode.as_str())?
            .set_default("max_context_messages", defaults.max_context_messages)?
            .set_default("export_dir", defaults.export_dir.display().to_string())?
            .set_default("log_level", defaults.log_level)?
            .add_source(config::File::with_name(path).required(false))
            // Environment overrides: PAPERCHAT__API_BASE_URL, PAPERCHAT__N_RESULTS, etc.
            .add_source(config::Environment::with_prefix("PAPERCHAT").separator("__"))
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|_| ValidationError::new("api_base_url must be a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::new("api_base_url must use http or https"));
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ValidationError::new("api_base_url must name a host")),
    }
}
