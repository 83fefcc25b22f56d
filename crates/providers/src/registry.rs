//! Capability registry — builds the configured capabilities.
//!
//! Keeps declaration order, since the engine assigns capabilities to agents
//! round-robin in that order.

use std::sync::Arc;
use std::time::Duration;

use conclave_config::{AppConfig, CapabilityConfig, CapabilityKind};
use conclave_core::Capability;
use tracing::debug;

use crate::echo::EchoCapability;
use crate::openai_compat::OpenAiCompatCapability;
use crate::scripted::ScriptedCapability;

/// Named capabilities in declaration order.
#[derive(Default)]
pub struct CapabilityRegistry {
    entries: Vec<(String, Arc<dyn Capability>)>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability. A capability with the same name is replaced in place.
    pub fn register(&mut self, name: impl Into<String>, capability: Arc<dyn Capability>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = capability,
            None => self.entries.push((name, capability)),
        }
    }

    /// Get a specific capability by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.clone())
    }

    /// All capabilities, in declaration order.
    pub fn all(&self) -> Vec<Arc<dyn Capability>> {
        self.entries.iter().map(|(_, c)| c.clone()).collect()
    }

    /// All capabilities except `excluded` (the synthesis capability is
    /// usually kept out of the agent pool).
    pub fn all_except(&self, excluded: Option<&str>) -> Vec<Arc<dyn Capability>> {
        self.entries
            .iter()
            .filter(|(n, _)| Some(n.as_str()) != excluded)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// List all registered capability names.
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build capabilities from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new();
        for cap_config in &config.capabilities {
            debug!(name = %cap_config.name, kind = ?cap_config.kind, "Building capability");
            registry.register(cap_config.name.clone(), build(cap_config));
        }
        registry
    }
}

/// Build one capability from its declaration.
pub fn build(config: &CapabilityConfig) -> Arc<dyn Capability> {
    match config.kind {
        CapabilityKind::OpenAiCompat => {
            let model = config.model.clone().unwrap_or_else(|| "gpt-4o-mini".into());
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".into());
            Arc::new(
                OpenAiCompatCapability::new(
                    &config.name,
                    base_url,
                    config.api_key.clone().unwrap_or_default(),
                    model,
                )
                .with_retries(
                    config.max_retries,
                    Duration::from_millis(config.retry_delay_ms),
                ),
            )
        }
        CapabilityKind::Echo => Arc::new(EchoCapability::new(&config.name)),
        CapabilityKind::Scripted => {
            let mut cap = ScriptedCapability::new(&config.name, config.responses.clone())
                .with_delay(
                    Duration::from_millis(config.min_delay_ms),
                    Duration::from_millis(config.max_delay_ms),
                );
            if let Some(seed) = config.seed {
                cap = cap.with_seed(seed);
            }
            Arc::new(cap)
        }
    }
}
