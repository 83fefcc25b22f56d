//! Agent pool construction.
//!
//! A pool is built once per run and never resized. Capability assignment and
//! prompt diversification happen here; nothing downstream re-binds an agent.

use std::sync::Arc;

use conclave_core::{Agent, Capability, Error, Mode, Result};
use tracing::debug;

use crate::prompts::{self, DIMENSIONS};

/// A fixed-size, ordered set of agents for one run.
#[derive(Debug)]
pub struct Pool {
    agents: Vec<Agent>,
}

impl Pool {
    /// Wrap pre-built agents. Agent ids must match their positions.
    pub fn from_agents(agents: Vec<Agent>) -> Self {
        debug_assert!(agents.iter().enumerate().all(|(i, a)| a.id == i));
        Self { agents }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// The agent that runs the single-agent collaborative phases.
    pub fn primary(&self) -> Option<&Agent> {
        self.agents.first()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Builds a [`Pool`] from an agent count and the available capabilities.
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    agent_count: usize,
    multi_capability: bool,
    mode: Mode,
}

impl PoolBuilder {
    pub fn new(agent_count: usize) -> Self {
        Self {
            agent_count,
            multi_capability: true,
            mode: Mode::Standard,
        }
    }

    /// Spread agents across capabilities round-robin (default: on).
    pub fn multi_capability(mut self, enabled: bool) -> Self {
        self.multi_capability = enabled;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the pool for `prompt`.
    ///
    /// Standard and synthesis pools get one framing prefix per agent, rotated.
    /// Collaborative pools keep the prompt as-is and assign each agent a
    /// dimension instead.
    pub fn build(&self, prompt: &str, capabilities: &[Arc<dyn Capability>]) -> Result<Pool> {
        if self.agent_count == 0 {
            return Err(Error::InvalidAgentCount);
        }
        if capabilities.is_empty() {
            return Err(Error::NoCapabilitiesProvided);
        }

        let dimensions = dimensions_for(self.agent_count);

        let agents: Vec<Agent> = (0..self.agent_count)
            .map(|i| {
                let capability = self.capability_for(i, capabilities);
                match self.mode {
                    Mode::Collaborative => Agent::new(i, capability, prompt)
                        .with_dimension(dimensions[i % dimensions.len()]),
                    Mode::Standard | Mode::Synthesis => {
                        Agent::new(i, capability, prompts::framed(prompt, i))
                    }
                }
            })
            .collect();

        debug!(
            agents = agents.len(),
            capabilities = capabilities.len(),
            multi_capability = self.multi_capability,
            mode = %self.mode,
            "Pool built"
        );

        Ok(Pool { agents })
    }

    fn capability_for(
        &self,
        index: usize,
        capabilities: &[Arc<dyn Capability>],
    ) -> Arc<dyn Capability> {
        if self.multi_capability && capabilities.len() > 1 {
            capabilities[index % capabilities.len()].clone()
        } else {
            capabilities[0].clone()
        }
    }
}

/// The dimension list for a pool of `agent_count` agents: truncated when the
/// pool is smaller than the list, cycled by the caller when it is larger.
pub fn dimensions_for(agent_count: usize) -> Vec<&'static str> {
    DIMENSIONS
        .iter()
        .take(agent_count.clamp(1, DIMENSIONS.len()))
        .copied()
        .collect()
}
