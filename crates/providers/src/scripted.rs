//! Scripted capability — canned responses after a simulated delay.
//!
//! Stands in for a real model when exploring the orchestration modes offline.
//! Each instance owns its RNG, seeded explicitly or from its name, so runs
//! are reproducible and two instances never share random state.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use conclave_core::{CancellationToken, Capability, CapabilityError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_RESPONSES: &[&str] = &[
    "The request is best answered by separating the essentials from the details.",
    "Several trade-offs apply; the right choice depends on the constraints.",
    "A small, concrete example clarifies the general principle.",
];

pub struct ScriptedCapability {
    name: String,
    responses: Vec<String>,
    min_delay: Duration,
    max_delay: Duration,
    rng: Mutex<StdRng>,
}

impl ScriptedCapability {
    /// Create a scripted capability with no delay, seeded from its name.
    pub fn new(name: impl Into<String>, responses: Vec<String>) -> Self {
        let name = name.into();
        let seed = seed_from_name(&name);
        let responses = if responses.is_empty() {
            DEFAULT_RESPONSES.iter().map(|r| r.to_string()).collect()
        } else {
            responses
        };

        Self {
            name,
            responses,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Simulate latency uniformly drawn from `[min, max]`.
    pub fn with_delay(mut self, min: Duration, max: Duration) -> Self {
        self.min_delay = min.min(max);
        self.max_delay = max.max(min);
        self
    }

    /// Draw the delay and response index for one call.
    fn draw(&self) -> (Duration, usize) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        let delay = Duration::from_millis(rng.random_range(min..=max));
        let index = rng.random_range(0..self.responses.len());
        (delay, index)
    }
}

fn seed_from_name(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}

#[async_trait]
impl Capability for ScriptedCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
    ) -> Result<String, CapabilityError> {
        let (delay, index) = self.draw();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CapabilityError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(format!(
                "[{}] {}\nPrompt: {}",
                self.name, self.responses[index], prompt
            )),
        }
    }
}
