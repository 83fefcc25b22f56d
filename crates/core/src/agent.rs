//! Agent and orchestration mode types.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// Ordinal identity of an agent within its pool (0-based, stable).
pub type AgentId = usize;

/// How a pool collaborates on a prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Each agent answers a differently framed prompt; answers are listed.
    #[default]
    Standard,
    /// Standard, followed by a dedicated synthesis pass over the answers.
    Synthesis,
    /// Four-phase pipeline sharing an evolving analysis across agents.
    Collaborative,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Synthesis => "synthesis",
            Self::Collaborative => "collaborative",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "basic" => Ok(Self::Standard),
            "synthesis" | "with_synthesis" => Ok(Self::Synthesis),
            "collaborative" => Ok(Self::Collaborative),
            other => Err(format!(
                "unknown mode '{other}' (expected standard, synthesis or collaborative)"
            )),
        }
    }
}

/// One worker in a pool: a capability binding plus per-run mutable state.
///
/// The capability is shared, not owned — the same instance may back several
/// agents and outlives the pool. Everything else belongs to this agent and is
/// only mutated by the engine between phases.
#[derive(Clone)]
pub struct Agent {
    /// Position in the pool.
    pub id: AgentId,
    /// The bound capability.
    pub capability: Arc<dyn Capability>,
    /// Prompt assigned at pool construction.
    pub prompt: String,
    /// Collaborative phase counter (0 until the first phase commits, then 1..=3).
    pub phase: u8,
    /// Latest analysis broadcast to every agent in collaborative mode.
    pub shared_analysis: String,
    /// Dimension this agent explores in collaborative mode.
    pub dimension: Option<String>,
}

impl Agent {
    pub fn new(id: AgentId, capability: Arc<dyn Capability>, prompt: impl Into<String>) -> Self {
        Self {
            id,
            capability,
            prompt: prompt.into(),
            phase: 0,
            shared_analysis: String::new(),
            dimension: None,
        }
    }

    /// Assign an exploration dimension (builder style, used at construction).
    pub fn with_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.dimension = Some(dimension.into());
        self
    }

    /// Name of the bound capability.
    pub fn capability_name(&self) -> &str {
        self.capability.name()
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("capability", &self.capability.name())
            .field("prompt", &self.prompt)
            .field("phase", &self.phase)
            .field("dimension", &self.dimension)
            .finish()
    }
}
