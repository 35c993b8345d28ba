use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::document::DEFAULT_WORK_LABEL;
use crate::error::{DiplomError, Result};
use crate::pipeline::Pacing;

pub const DEFAULT_FILENAME: &str = "diplom-structure.docx";
const MAX_DELAY_MS: u64 = 60_000;

/// Main configuration structure loaded from diplom.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind: std::net::SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: std::net::SocketAddr::from(([127, 0, 0, 1], 8000)),
        }
    }
}

/// Pauses between streamed outline items
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub goal_delay_ms: u64,
    pub task_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            goal_delay_ms: 400,
            task_delay_ms: 350,
        }
    }
}

impl PipelineConfig {
    pub fn pacing(&self) -> Pacing {
        Pacing {
            after_goal: Duration::from_millis(self.goal_delay_ms),
            after_task: Duration::from_millis(self.task_delay_ms),
        }
    }
}

/// Rendered document settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentConfig {
    /// Attachment filename offered to clients
    pub filename: String,
    /// Work category printed on the title page
    pub work_label: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            work_label: DEFAULT_WORK_LABEL.to_string(),
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "diplom_ai=info,tower_http=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "diplom_ai=info,tower_http=info".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            pipeline: PipelineConfig::default(),
            document: DocumentConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses DIPLOM_CONFIG environment variable or defaults to "diplom.toml"
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(env_path) = std::env::var("DIPLOM_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }

        let config_path =
            std::env::var("DIPLOM_CONFIG").unwrap_or_else(|_| "diplom.toml".to_string());

        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(_) => {
                tracing::debug!("Config file {} not found, using defaults", config_path);
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DiplomError::Config {
            message: format!("invalid TOML: {}", e),
        })
    }

    /// Env-first overrides for the settings operators change most
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DIPLOM_HTTP_BIND") {
            match v.parse::<std::net::SocketAddr>() {
                Ok(bind) => self.server.bind = bind,
                Err(_) => tracing::warn!("Ignoring invalid DIPLOM_HTTP_BIND '{}'", v),
            }
        }
        if let Some(ms) = std::env::var("DIPLOM_GOAL_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.pipeline.goal_delay_ms = ms;
        }
        if let Some(ms) = std::env::var("DIPLOM_TASK_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.pipeline.task_delay_ms = ms;
        }
        if let Ok(name) = std::env::var("DIPLOM_DOCUMENT_FILENAME") {
            self.document.filename = name;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.goal_delay_ms > MAX_DELAY_MS || self.pipeline.task_delay_ms > MAX_DELAY_MS
        {
            return Err(invalid_config(format!(
                "pipeline delays must not exceed {}ms",
                MAX_DELAY_MS
            )));
        }
        let name = self.document.filename.trim();
        if name.is_empty() || !name.ends_with(".docx") {
            return Err(invalid_config(
                "document.filename must be a non-empty name ending in .docx",
            ));
        }
        if name.contains(['"', '/', '\\', '\r', '\n']) {
            return Err(invalid_config(
                "document.filename must not contain quotes, slashes or newlines",
            ));
        }
        if self.document.work_label.trim().is_empty() {
            return Err(invalid_config("document.work_label must not be empty"));
        }
        Ok(())
    }
}

fn invalid_config(message: impl Into<String>) -> DiplomError {
    DiplomError::Config {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_contract() {
        let config = Config::default();
        assert_eq!(config.pipeline.pacing(), Pacing::default());
        assert_eq!(config.document.filename, "diplom-structure.docx");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [pipeline]
            goal_delay_ms = 0
            task_delay_ms = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.goal_delay_ms, 0);
        assert_eq!(config.pipeline.task_delay_ms, 10);
        assert_eq!(config.server.bind.port(), 8000);
        assert_eq!(config.document.work_label, DEFAULT_WORK_LABEL);
    }

    #[test]
    fn test_validate_rejects_bad_filename() {
        let mut config = Config::default();
        config.document.filename = "structure.pdf".into();
        assert!(config.validate().is_err());

        config.document.filename = "a\"b.docx".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_failures_use_config_variant() {
        let mut config = Config::default();
        config.document.work_label = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DiplomError::Config { .. }));
        assert!(err.to_string().contains("work_label"));

        let err = Config::from_toml("[pipeline]\ngoal_delay_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, DiplomError::Config { .. }));
    }

    #[test]
    fn test_validate_rejects_huge_delay() {
        let mut config = Config::default();
        config.pipeline.task_delay_ms = 120_000;
        assert!(config.validate().is_err());
    }
}
