//! Collaborative mode — a four-phase pipeline sharing one evolving analysis.
//!
//! ```text
//! InitialAnalysis ──► Exploration ──► Integration ──► FinalResponse
//!   (agent 0)        (all agents,       (agent 0)        (agent 0)
//!                     fan-out)
//! ```
//!
//! Phases run strictly in order and each commits its context update before
//! the next starts. Any failure aborts the pipeline; no partial answer is
//! returned.

use std::time::Duration;

use conclave_core::{Agent, CancellationToken, Error, Phase, Result};
use tracing::info;

use crate::fanout::FanOut;
use crate::pool::{Pool, dimensions_for};
use crate::prompts;

/// State threaded through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct CollaborativeContext {
    /// Written once, by the initial analysis.
    pub initial_analysis: String,
    /// Dimensions in assignment order (never longer than the pool).
    pub dimensions: Vec<String>,
    /// Exploration results, index-aligned with the pool's agents.
    pub insights: Vec<String>,
}

/// Drives a collaborative run over a pool built in [`conclave_core::Mode::Collaborative`].
pub struct CollaborativePipeline<'a> {
    pool: &'a mut Pool,
    context: CollaborativeContext,
    exploration_timeout: Duration,
    cancel: &'a CancellationToken,
}

impl<'a> CollaborativePipeline<'a> {
    pub fn new(
        pool: &'a mut Pool,
        exploration_timeout: Duration,
        cancel: &'a CancellationToken,
    ) -> Self {
        let dimensions = if pool.is_empty() {
            Vec::new()
        } else {
            dimensions_for(pool.len()).into_iter().map(String::from).collect()
        };

        Self {
            pool,
            context: CollaborativeContext {
                dimensions,
                ..CollaborativeContext::default()
            },
            exploration_timeout,
            cancel,
        }
    }

    pub fn context(&self) -> &CollaborativeContext {
        &self.context
    }

    /// Run all four phases and return the final answer.
    pub async fn run(mut self) -> Result<String> {
        self.initial_analysis().await?;
        self.explore_dimensions().await?;
        self.integrate().await?;
        self.final_response().await
    }

    /// Phase 1: the primary agent analyses the request; the analysis is
    /// broadcast to every agent.
    pub async fn initial_analysis(&mut self) -> Result<()> {
        let phase = Phase::InitialAnalysis;
        let primary = self.pool.primary().ok_or(Error::NoAgentsAvailable { phase })?;

        let prompt = prompts::initial_analysis(&primary.prompt);
        let analysis = call_single(primary, phase, &prompt, self.cancel).await?;

        self.context.initial_analysis = analysis.clone();
        self.broadcast(&analysis, 1);

        info!(phase = %phase, chars = analysis.len(), "Initial analysis shared");
        Ok(())
    }

    /// Phase 2: every agent explores its own dimension in parallel.
    pub async fn explore_dimensions(&mut self) -> Result<()> {
        let fan_out = FanOut::new(Phase::Exploration, self.exploration_timeout, self.cancel);
        let insights = fan_out
            .run(self.pool.agents(), |agent| {
                prompts::exploration(
                    &agent.shared_analysis,
                    agent.dimension.as_deref().unwrap_or_default(),
                    &agent.prompt,
                )
            })
            .await?;

        self.context.insights = insights;
        for agent in self.pool.agents_mut() {
            agent.phase = 2;
        }

        info!(insights = self.context.insights.len(), "Dimensions explored");
        Ok(())
    }

    /// Phase 3: the primary agent merges the initial analysis and every
    /// insight; the result replaces every agent's shared analysis.
    pub async fn integrate(&mut self) -> Result<()> {
        let phase = Phase::Integration;
        if self.context.insights.is_empty() {
            return Err(Error::NothingToIntegrate);
        }
        let primary = self.pool.primary().ok_or(Error::NoAgentsAvailable { phase })?;

        let pairs = self
            .pool
            .agents()
            .iter()
            .zip(&self.context.insights)
            .map(|(agent, insight)| {
                (agent.dimension.as_deref().unwrap_or_default(), insight.as_str())
            });
        let prompt = prompts::integration(&self.context.initial_analysis, pairs);

        let integrated = call_single(primary, phase, &prompt, self.cancel).await?;
        self.broadcast(&integrated, 3);

        info!(phase = %phase, chars = integrated.len(), "Integrated analysis shared");
        Ok(())
    }

    /// Phase 4: the primary agent answers the original request from the
    /// integrated analysis.
    pub async fn final_response(&mut self) -> Result<String> {
        let phase = Phase::FinalResponse;
        let primary = self.pool.primary().ok_or(Error::NoAgentsAvailable { phase })?;

        let prompt = prompts::final_response(&primary.shared_analysis, &primary.prompt);
        let answer = call_single(primary, phase, &prompt, self.cancel).await?;

        info!(phase = %phase, chars = answer.len(), "Final response ready");
        Ok(answer)
    }

    fn broadcast(&mut self, analysis: &str, phase: u8) {
        for agent in self.pool.agents_mut() {
            agent.shared_analysis = analysis.to_string();
            agent.phase = phase;
        }
    }
}

/// One capability call outside a fan-out, bound to the run's cancellation.
pub(crate) async fn call_single(
    agent: &Agent,
    phase: Phase,
    prompt: &str,
    cancel: &CancellationToken,
) -> Result<String> {
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled { phase }),
        outcome = agent.capability.process(cancel, prompt) => outcome,
    };

    outcome.map_err(|source| Error::CapabilityFailure {
        agent: agent.id,
        capability: agent.capability_name().to_string(),
        phase,
        source,
    })
}
