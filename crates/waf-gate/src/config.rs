use anyhow::{Context, Result};
use request_inspector::InspectionLimits;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// `null` disables the audit trail.
    #[serde(default = "default_audit_path")]
    pub audit_log_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            audit_log_path: default_audit_path(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RulesConfig {
    /// Optional YAML rule file; the built-in signatures are used alone when
    /// unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_value_len")]
    pub max_value_len: usize,
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_value_len: default_max_value_len(),
            max_fields: default_max_fields(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl LimitsConfig {
    pub fn inspection_limits(&self) -> InspectionLimits {
        InspectionLimits {
            max_value_len: self.max_value_len,
            max_fields: self.max_fields,
        }
    }
}

// ---------------------------------------------------------------------------
// Default-value functions used by serde
// ---------------------------------------------------------------------------

fn default_listen() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_audit_path() -> Option<PathBuf> {
    Some(PathBuf::from("waf-audit.jsonl"))
}

fn default_max_value_len() -> usize {
    InspectionLimits::default().max_value_len
}

fn default_max_fields() -> usize {
    InspectionLimits::default().max_fields
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Load configuration from a YAML file.
///
/// A missing file yields the default configuration and a warning, so the
/// gateway can start without any config written.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "configuration file not found; using defaults"
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    serde_yml::from_str(&contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}
