//! Fan-out/fan-in over a pool.
//!
//! ```text
//!            ┌── worker 0 ──┐
//! prompts ───┼── worker 1 ──┼──► mpsc (cap = N) ──► slot[agent] ──► Vec<String>
//!            └── worker N ──┘
//!                  ▲
//!        child CancellationToken (deadline / first failure)
//! ```
//!
//! Every agent runs on its own task. Results travel through a bounded
//! channel sized to the pool and are written into a slot indexed by agent,
//! so the output order is the pool order whatever the completion order.
//!
//! ## Failure policy
//!
//! The first failure wins. A failed agent, an elapsed deadline or a cancelled
//! parent token ends the batch: the shared token is cancelled, workers get a
//! short grace period to observe it and wind down, stragglers are aborted,
//! and results already collected are discarded.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use conclave_core::{Agent, CancellationToken, CapabilityError, Error, Phase, Result};
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long cancelled workers get to return before being aborted.
pub(crate) const CANCEL_GRACE: Duration = Duration::from_millis(250);

type Outcome = (usize, std::result::Result<String, CapabilityError>);

/// Runs every agent's capability concurrently under one deadline.
pub struct FanOut<'a> {
    phase: Phase,
    timeout: Duration,
    parent: &'a CancellationToken,
}

impl<'a> FanOut<'a> {
    pub fn new(phase: Phase, timeout: Duration, parent: &'a CancellationToken) -> Self {
        Self {
            phase,
            timeout,
            parent,
        }
    }

    /// Run `prompt_for(agent)` through each agent's capability.
    ///
    /// Returns one response per agent, in agent order, or the first failure.
    pub async fn run<F>(&self, agents: &[Agent], prompt_for: F) -> Result<Vec<String>>
    where
        F: Fn(&Agent) -> String,
    {
        if agents.is_empty() {
            return Ok(Vec::new());
        }

        let count = agents.len();
        let token = self.parent.child_token();
        let (tx, mut rx) = mpsc::channel::<Outcome>(count);
        let mut workers = JoinSet::new();

        info!(
            phase = %self.phase,
            agents = count,
            timeout_secs = self.timeout.as_secs(),
            "Fan-out started"
        );

        for (slot, agent) in agents.iter().enumerate() {
            let capability = agent.capability.clone();
            let prompt = prompt_for(agent);
            let token = token.clone();
            let tx = tx.clone();

            debug!(agent = agent.id, capability = %capability.name(), "Dispatching");

            workers.spawn(async move {
                let outcome = AssertUnwindSafe(capability.process(&token, &prompt))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(CapabilityError::Panicked(panic_message(&payload)))
                    });
                // The receiver is gone once the batch has already failed.
                let _ = tx.send((slot, outcome)).await;
            });
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        let mut slots: Vec<Option<String>> = vec![None; count];
        let mut received = 0;

        let failure = loop {
            if received == count {
                break None;
            }

            let next = tokio::select! {
                biased;
                _ = self.parent.cancelled() => break Some(Error::Cancelled { phase: self.phase }),
                next = tokio::time::timeout_at(deadline, rx.recv()) => next,
            };

            match next {
                Err(_) => {
                    break Some(Error::DeadlineExceeded {
                        phase: self.phase,
                        timeout: self.timeout,
                    });
                }
                Ok(Some((slot, Ok(text)))) => {
                    debug!(agent = agents[slot].id, chars = text.len(), "Agent completed");
                    slots[slot] = Some(text);
                    received += 1;
                }
                Ok(Some((slot, Err(source)))) => {
                    break Some(self.failure(&agents[slot], source));
                }
                Ok(None) => {
                    // Every sender dropped without reporting; only possible if a
                    // worker task was aborted from outside.
                    let slot = slots.iter().position(Option::is_none).unwrap_or(0);
                    break Some(self.failure(
                        &agents[slot],
                        CapabilityError::Panicked("worker exited without a result".into()),
                    ));
                }
            }
        };

        if let Some(err) = failure {
            warn!(phase = %self.phase, error = %err, completed = received, "Fan-out aborted");
            token.cancel();
            wind_down(&mut workers).await;
            return Err(err);
        }

        info!(phase = %self.phase, agents = count, "Fan-out complete");
        Ok(slots.into_iter().flatten().collect())
    }

    fn failure(&self, agent: &Agent, source: CapabilityError) -> Error {
        Error::CapabilityFailure {
            agent: agent.id,
            capability: agent.capability_name().to_string(),
            phase: self.phase,
            source,
        }
    }
}

/// Give cancelled workers a moment to return, then abort the rest.
async fn wind_down(workers: &mut JoinSet<()>) {
    let drained = tokio::time::timeout(CANCEL_GRACE, async {
        while workers.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(remaining = workers.len(), "Workers ignored cancellation; aborting");
        workers.abort_all();
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use conclave_core::Capability;
    use std::sync::Arc;

    fn agents(caps: Vec<Arc<dyn Capability>>) -> Vec<Agent> {
        caps.into_iter()
            .enumerate()
            .map(|(i, c)| Agent::new(i, c, format!("prompt {i}")))
            .collect()
    }

    #[tokio::test]
    async fn results_follow_agent_order() {
        let delayed = |name: &str, answer: &str, ms: u64| {
            Arc::new(DelayedCapability::new(name, answer, Duration::from_millis(ms)))
                as Arc<dyn Capability>
        };
        let pool = agents(vec![
            delayed("slow", "first", 40),
            delayed("mid", "second", 20),
            delayed("fast", "third", 1),
        ]);
        let token = CancellationToken::new();
        let results = FanOut::new(Phase::Dispatch, Duration::from_secs(5), &token)
            .run(&pool, |a| a.prompt.clone())
            .await
            .unwrap();
        assert_eq!(results, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn prompt_function_is_applied_per_agent() {
        let cap = Arc::new(RecordingCapability::new("rec"));
        let shared = cap.clone() as Arc<dyn Capability>;
        let pool = agents(vec![shared.clone(), shared]);
        let token = CancellationToken::new();
        let results = FanOut::new(Phase::Exploration, Duration::from_secs(5), &token)
            .run(&pool, |a| format!("custom-{}", a.id))
            .await
            .unwrap();
        assert_eq!(results, vec!["rec:custom-0", "rec:custom-1"]);
        assert_eq!(cap.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_cancels_siblings() {
        let hanging = Arc::new(HangingCapability::new("hang"));
        let pool = agents(vec![
            hanging.clone() as Arc<dyn Capability>,
            Arc::new(FailingCapability::new("broken")) as Arc<dyn Capability>,
            hanging.clone() as Arc<dyn Capability>,
        ]);
        let token = CancellationToken::new();
        let err = FanOut::new(Phase::Dispatch, Duration::from_secs(30), &token)
            .run(&pool, |a| a.prompt.clone())
            .await
            .unwrap_err();

        match err {
            Error::CapabilityFailure {
                agent,
                capability,
                phase,
                ..
            } => {
                assert_eq!(agent, 1);
                assert_eq!(capability, "broken");
                assert_eq!(phase, Phase::Dispatch);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hanging.cancellations(), 2);
        assert!(!token.is_cancelled(), "parent token must stay usable");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_exceeded_cancels_workers() {
        let hanging = Arc::new(HangingCapability::new("hang"));
        let pool = agents(vec![
            Arc::new(RecordingCapability::new("quick")) as Arc<dyn Capability>,
            hanging.clone() as Arc<dyn Capability>,
        ]);
        let token = CancellationToken::new();
        let err = FanOut::new(Phase::Exploration, Duration::from_secs(60), &token)
            .run(&pool, |a| a.prompt.clone())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::DeadlineExceeded {
                phase: Phase::Exploration,
                ..
            }
        ));
        assert_eq!(hanging.cancellations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_ends_batch() {
        let hanging = Arc::new(HangingCapability::new("hang"));
        let pool = agents(vec![hanging.clone() as Arc<dyn Capability>]);
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = FanOut::new(Phase::Dispatch, Duration::from_secs(30), &token)
            .run(&pool, |a| a.prompt.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
        assert_eq!(hanging.cancellations(), 1);
    }

    #[tokio::test]
    async fn panicking_capability_reported_as_failure() {
        let pool = agents(vec![
            Arc::new(RecordingCapability::new("ok")) as Arc<dyn Capability>,
            Arc::new(PanickingCapability) as Arc<dyn Capability>,
        ]);
        let token = CancellationToken::new();
        let err = FanOut::new(Phase::Dispatch, Duration::from_secs(5), &token)
            .run(&pool, |a| a.prompt.clone())
            .await
            .unwrap_err();
        match err {
            Error::CapabilityFailure { agent, source, .. } => {
                assert_eq!(agent, 1);
                assert!(matches!(source, CapabilityError::Panicked(ref m) if m.contains("boom")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_agent_list_is_a_no_op() {
        let token = CancellationToken::new();
        let results = FanOut::new(Phase::Dispatch, Duration::from_secs(1), &token)
            .run(&[], |a| a.prompt.clone())
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
