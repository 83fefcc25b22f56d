//! Error types for the Conclave domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Orchestration failures
//! live in [`Error`]; failures reported by a capability itself live in
//! [`CapabilityError`] and are wrapped with the agent and phase they came from.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::agent::AgentId;

/// The top-level error type for all Conclave operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Validation (raised before any worker starts) ---
    #[error("Agent count must be positive")]
    InvalidAgentCount,

    #[error("At least one capability must be provided")]
    NoCapabilitiesProvided,

    #[error("Synthesis mode requires a synthesis capability")]
    MissingSynthesisCapability,

    // --- Collaborative pipeline ---
    #[error("No agent available for the {phase} phase")]
    NoAgentsAvailable { phase: Phase },

    #[error("No exploration insights to integrate")]
    NothingToIntegrate,

    // --- Execution ---
    #[error("Agent {agent} ({capability}) failed during {phase}: {source}")]
    CapabilityFailure {
        agent: AgentId,
        capability: String,
        phase: Phase,
        #[source]
        source: CapabilityError,
    },

    #[error("Deadline of {}s exceeded during {phase}", .timeout.as_secs())]
    DeadlineExceeded { phase: Phase, timeout: Duration },

    #[error("Run cancelled during {phase}")]
    Cancelled { phase: Phase },

    // --- Configuration ---
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure reported by a capability's `process` call.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("Processing failed: {0}")]
    Failed(String),

    #[error("Cancelled before completion")]
    Cancelled,

    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Capability not configured: {0}")]
    NotConfigured(String),

    #[error("Worker panicked: {0}")]
    Panicked(String),
}

impl CapabilityError {
    /// Whether a capability with its own retry policy may try again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited { .. } | Self::Api { status_code: 500.., .. }
        )
    }
}

/// The orchestration step an error or log line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Standard fan-out of framed prompts.
    Dispatch,
    InitialAnalysis,
    Exploration,
    Integration,
    FinalResponse,
    Synthesis,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::InitialAnalysis => "initial analysis",
            Self::Exploration => "dimension exploration",
            Self::Integration => "integration",
            Self::FinalResponse => "final response",
            Self::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_failure_displays_context() {
        let err = Error::CapabilityFailure {
            agent: 2,
            capability: "gpt-4o".into(),
            phase: Phase::Exploration,
            source: CapabilityError::Api {
                status_code: 502,
                message: "bad gateway".into(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("Agent 2"));
        assert!(text.contains("gpt-4o"));
        assert!(text.contains("dimension exploration"));
        assert!(text.contains("502"));
    }

    #[test]
    fn deadline_displays_seconds() {
        let err = Error::DeadlineExceeded {
            phase: Phase::Dispatch,
            timeout: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30s"));
        assert!(err.to_string().contains("dispatch"));
    }

    #[test]
    fn transient_classification() {
        assert!(CapabilityError::Network("reset".into()).is_transient());
        assert!(CapabilityError::RateLimited { retry_after_secs: 1 }.is_transient());
        assert!(
            CapabilityError::Api {
                status_code: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !CapabilityError::Api {
                status_code: 400,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!CapabilityError::Cancelled.is_transient());
        assert!(!CapabilityError::AuthenticationFailed("key".into()).is_transient());
    }
}
