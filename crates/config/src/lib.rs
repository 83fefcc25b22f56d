//! Configuration loading, validation, and management for Conclave.
//!
//! Loads configuration from `~/.conclave/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use conclave_core::Mode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.conclave/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Number of agents in each pool
    #[serde(default = "default_agent_count")]
    pub agent_count: usize,

    /// Spread agents across all declared capabilities (round-robin)
    #[serde(default = "default_true")]
    pub multi_capability: bool,

    /// Orchestration mode used by `conclave run` when none is given
    #[serde(default)]
    pub mode: Mode,

    /// Name of the capability used for the synthesis pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_capability: Option<String>,

    /// Fan-out deadlines
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Declared capabilities, in pool assignment order
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<CapabilityConfig>,
}

fn default_agent_count() -> usize {
    4
}
fn default_true() -> bool {
    true
}
fn default_capabilities() -> Vec<CapabilityConfig> {
    vec![CapabilityConfig {
        name: "openai".into(),
        kind: CapabilityKind::OpenAiCompat,
        base_url: Some("https://api.openai.com/v1".into()),
        model: Some("gpt-4o-mini".into()),
        ..CapabilityConfig::default()
    }]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Deadline for the standard fan-out, in seconds
    #[serde(default = "default_dispatch_secs")]
    pub dispatch_secs: u64,

    /// Deadline for the collaborative exploration fan-out, in seconds
    #[serde(default = "default_exploration_secs")]
    pub exploration_secs: u64,
}

fn default_dispatch_secs() -> u64 {
    30
}
fn default_exploration_secs() -> u64 {
    60
}

impl TimeoutConfig {
    pub fn dispatch(&self) -> Duration {
        Duration::from_secs(self.dispatch_secs)
    }

    pub fn exploration(&self) -> Duration {
        Duration::from_secs(self.exploration_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            dispatch_secs: default_dispatch_secs(),
            exploration_secs: default_exploration_secs(),
        }
    }
}

/// Which implementation backs a declared capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Any OpenAI-compatible `/chat/completions` endpoint
    #[default]
    #[serde(rename = "openai_compat")]
    OpenAiCompat,
    /// Returns `"<name>:<prompt>"`
    Echo,
    /// Canned responses after a random delay
    Scripted,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CapabilityConfig {
    pub name: String,

    #[serde(default)]
    pub kind: CapabilityKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Scripted only: pool of canned responses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<String>,

    /// Scripted only: RNG seed (derived from the name when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default)]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    2000
}
fn default_max_delay_ms() -> u64 {
    500
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: CapabilityKind::default(),
            base_url: None,
            model: None,
            api_key: None,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            responses: Vec::new(),
            seed: None,
            min_delay_ms: 0,
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for CapabilityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityConfig")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("max_retries", &self.max_retries)
            .field("responses", &self.responses.len())
            .field("seed", &self.seed)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.conclave/config.toml).
    ///
    /// Environment variables applied on top:
    /// - `CONCLAVE_API_KEY`, then `OPENAI_API_KEY` — fill capabilities without a key
    /// - `CONCLAVE_AGENT_COUNT`
    /// - `CONCLAVE_MODE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("CONCLAVE_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        if let Some(key) = api_key {
            for cap in &mut self.capabilities {
                if cap.kind == CapabilityKind::OpenAiCompat && cap.api_key.is_none() {
                    cap.api_key = Some(key.clone());
                }
            }
        }

        if let Some(count) = lookup("CONCLAVE_AGENT_COUNT") {
            self.agent_count = count.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "CONCLAVE_AGENT_COUNT must be a positive integer, got '{count}'"
                ))
            })?;
        }

        if let Some(mode) = lookup("CONCLAVE_MODE") {
            self.mode = mode.parse().map_err(ConfigError::ValidationError)?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".conclave")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent_count == 0 {
            return Err(ConfigError::ValidationError(
                "agent_count must be greater than 0".into(),
            ));
        }

        if self.timeouts.dispatch_secs == 0 || self.timeouts.exploration_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than 0 seconds".into(),
            ));
        }

        let mut seen = HashSet::new();
        for cap in &self.capabilities {
            if cap.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "every capability needs a name".into(),
                ));
            }
            if !seen.insert(cap.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate capability name '{}'",
                    cap.name
                )));
            }
            if cap.min_delay_ms > cap.max_delay_ms {
                return Err(ConfigError::ValidationError(format!(
                    "capability '{}': min_delay_ms exceeds max_delay_ms",
                    cap.name
                )));
            }
        }

        if let Some(synth) = &self.synthesis_capability {
            if !seen.contains(synth.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "synthesis_capability '{synth}' is not a declared capability"
                )));
            }
        }

        Ok(())
    }

    /// Look up a declared capability by name.
    pub fn capability(&self, name: &str) -> Option<&CapabilityConfig> {
        self.capabilities.iter().find(|c| c.name == name)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent_count: default_agent_count(),
            multi_capability: true,
            mode: Mode::default(),
            timeouts: TimeoutConfig::default(),
            synthesis_capability: None,
            capabilities: default_capabilities(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
