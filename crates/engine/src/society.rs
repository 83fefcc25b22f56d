//! The society of agents: one configurable engine behind the three modes.
//!
//! ```text
//!             ┌──────────── standard ────────────┐
//! prompt ──► Pool ──► FanOut(dispatch) ──► render_report ──► String
//!             │                           └─ synthesis ─► + conclusion
//!             └── collaborative ──► CollaborativePipeline ──► String
//! ```
//!
//! Every run validates its inputs before any agent starts, builds a fresh
//! pool, and executes inside a `society` tracing span tagged with a random
//! run id.

use std::sync::Arc;
use std::time::Duration;

use conclave_config::TimeoutConfig;
use conclave_core::{CancellationToken, Capability, Error, Mode, Phase, Result};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::aggregate;
use crate::collaborative::CollaborativePipeline;
use crate::fanout::FanOut;
use crate::pool::{Pool, PoolBuilder};

/// Fan-out deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTimeouts {
    /// Standard and synthesis dispatch; also bounds the synthesis call.
    pub dispatch: Duration,
    /// Collaborative dimension exploration.
    pub exploration: Duration,
}

impl Default for EngineTimeouts {
    fn default() -> Self {
        Self {
            dispatch: Duration::from_secs(30),
            exploration: Duration::from_secs(60),
        }
    }
}

impl From<&TimeoutConfig> for EngineTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            dispatch: config.dispatch(),
            exploration: config.exploration(),
        }
    }
}

/// Per-run parameters.
#[derive(Debug, Clone)]
pub struct SocietyConfig {
    pub prompt: String,
    pub agent_count: usize,
    pub multi_capability: bool,
    pub mode: Mode,
}

impl SocietyConfig {
    pub fn new(prompt: impl Into<String>, agent_count: usize) -> Self {
        Self {
            prompt: prompt.into(),
            agent_count,
            multi_capability: true,
            mode: Mode::Standard,
        }
    }

    pub fn multi_capability(mut self, enabled: bool) -> Self {
        self.multi_capability = enabled;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// A set of capabilities plus the policy used to orchestrate them.
pub struct Society {
    capabilities: Vec<Arc<dyn Capability>>,
    synthesis: Option<Arc<dyn Capability>>,
    timeouts: EngineTimeouts,
    cancel: CancellationToken,
}

impl Society {
    pub fn new(capabilities: Vec<Arc<dyn Capability>>) -> Self {
        Self {
            capabilities,
            synthesis: None,
            timeouts: EngineTimeouts::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Capability used to merge results in synthesis mode.
    pub fn with_synthesis(mut self, capability: Option<Arc<dyn Capability>>) -> Self {
        self.synthesis = capability;
        self
    }

    pub fn with_timeouts(mut self, timeouts: EngineTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Bind runs to a caller-owned token; cancelling it ends any run in
    /// progress with [`Error::Cancelled`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn timeouts(&self) -> EngineTimeouts {
        self.timeouts
    }

    /// Dispatch on `config.mode`.
    pub async fn run(&self, config: &SocietyConfig) -> Result<String> {
        match config.mode {
            Mode::Standard => {
                self.run_standard(&config.prompt, config.agent_count, config.multi_capability)
                    .await
            }
            Mode::Synthesis => {
                self.run_with_synthesis(&config.prompt, config.agent_count, config.multi_capability)
                    .await
            }
            Mode::Collaborative => {
                self.run_collaborative(&config.prompt, config.agent_count, config.multi_capability)
                    .await
            }
        }
    }

    /// Every agent answers its framed prompt in parallel; the results are
    /// rendered as one labelled report.
    pub async fn run_standard(
        &self,
        prompt: &str,
        agent_count: usize,
        multi_capability: bool,
    ) -> Result<String> {
        let pool = self.pool(prompt, agent_count, multi_capability, Mode::Standard)?;
        async {
            let results = self.dispatch(&pool).await?;
            Ok(aggregate::render_report(&results))
        }
        .instrument(run_span(Mode::Standard, agent_count))
        .await
    }

    /// As [`Society::run_standard`], followed by a synthesis pass.
    pub async fn run_with_synthesis(
        &self,
        prompt: &str,
        agent_count: usize,
        multi_capability: bool,
    ) -> Result<String> {
        let pool = self.pool(prompt, agent_count, multi_capability, Mode::Synthesis)?;
        let synthesis = self.synthesis.clone().ok_or(Error::MissingSynthesisCapability)?;

        async {
            let results = self.dispatch(&pool).await?;
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    phase: Phase::Synthesis,
                });
            }
            aggregate::report_with_synthesis(
                synthesis.as_ref(),
                &results,
                self.timeouts.dispatch,
                &self.cancel,
            )
            .await
        }
        .instrument(run_span(Mode::Synthesis, agent_count))
        .await
    }

    /// Four sequential phases around one shared analysis.
    pub async fn run_collaborative(
        &self,
        prompt: &str,
        agent_count: usize,
        multi_capability: bool,
    ) -> Result<String> {
        let mut pool = self.pool(prompt, agent_count, multi_capability, Mode::Collaborative)?;
        CollaborativePipeline::new(&mut pool, self.timeouts.exploration, &self.cancel)
            .run()
            .instrument(run_span(Mode::Collaborative, agent_count))
            .await
    }

    fn pool(
        &self,
        prompt: &str,
        agent_count: usize,
        multi_capability: bool,
        mode: Mode,
    ) -> Result<Pool> {
        PoolBuilder::new(agent_count)
            .multi_capability(multi_capability)
            .mode(mode)
            .build(prompt, &self.capabilities)
    }

    async fn dispatch(&self, pool: &Pool) -> Result<Vec<String>> {
        FanOut::new(Phase::Dispatch, self.timeouts.dispatch, &self.cancel)
            .run(pool.agents(), |agent| agent.prompt.clone())
            .await
    }
}

fn run_span(mode: Mode, agents: usize) -> tracing::Span {
    let run_id = Uuid::new_v4();
    let span = info_span!("society", %run_id, %mode, agents);
    span.in_scope(|| info!("Run started"));
    span
}

/// Standard mode with default timeouts.
pub async fn run_standard(
    prompt: &str,
    agent_count: usize,
    capabilities: Vec<Arc<dyn Capability>>,
    multi_capability: bool,
) -> Result<String> {
    Society::new(capabilities)
        .run_standard(prompt, agent_count, multi_capability)
        .await
}

/// Synthesis mode with default timeouts.
pub async fn run_with_synthesis(
    prompt: &str,
    agent_count: usize,
    capabilities: Vec<Arc<dyn Capability>>,
    multi_capability: bool,
    synthesis: Option<Arc<dyn Capability>>,
) -> Result<String> {
    Society::new(capabilities)
        .with_synthesis(synthesis)
        .run_with_synthesis(prompt, agent_count, multi_capability)
        .await
}

/// Collaborative mode with default timeouts.
pub async fn run_collaborative(
    prompt: &str,
    agent_count: usize,
    capabilities: Vec<Arc<dyn Capability>>,
    multi_capability: bool,
) -> Result<String> {
    Society::new(capabilities)
        .run_collaborative(prompt, agent_count, multi_capability)
        .await
}
