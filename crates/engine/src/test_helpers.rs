//! Shared fake capabilities for engine tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use conclave_core::{CancellationToken, Capability, CapabilityError};

/// Answers `"<name>:<prompt>"` and records every prompt it saw.
pub struct RecordingCapability {
    name: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingCapability {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Capability for RecordingCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        _cancel: &CancellationToken,
        prompt: &str,
    ) -> Result<String, CapabilityError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("{}:{}", self.name, prompt))
    }
}

/// Returns a fixed response after a fixed delay.
pub struct DelayedCapability {
    name: String,
    response: String,
    delay: Duration,
}

impl DelayedCapability {
    pub fn new(name: &str, response: &str, delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            response: response.to_string(),
            delay,
        }
    }
}

#[async_trait]
impl Capability for DelayedCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        cancel: &CancellationToken,
        _prompt: &str,
    ) -> Result<String, CapabilityError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(CapabilityError::Cancelled),
            _ = tokio::time::sleep(self.delay) => Ok(self.response.clone()),
        }
    }
}

/// Always fails.
pub struct FailingCapability {
    name: String,
}

impl FailingCapability {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Capability for FailingCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        _cancel: &CancellationToken,
        _prompt: &str,
    ) -> Result<String, CapabilityError> {
        Err(CapabilityError::Failed(format!("{} is out of service", self.name)))
    }
}

/// Never answers; returns only once cancelled, counting each cancellation.
pub struct HangingCapability {
    name: String,
    cancellations: AtomicUsize,
}

impl HangingCapability {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cancellations: AtomicUsize::new(0),
        }
    }

    pub fn cancellations(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Capability for HangingCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        cancel: &CancellationToken,
        _prompt: &str,
    ) -> Result<String, CapabilityError> {
        cancel.cancelled().await;
        self.cancellations.fetch_add(1, Ordering::SeqCst);
        Err(CapabilityError::Cancelled)
    }
}

/// Panics inside `process`.
pub struct PanickingCapability;

#[async_trait]
impl Capability for PanickingCapability {
    fn name(&self) -> &str {
        "panicky"
    }

    async fn process(
        &self,
        _cancel: &CancellationToken,
        _prompt: &str,
    ) -> Result<String, CapabilityError> {
        panic!("boom");
    }
}

/// Answers `"<name> reply #<n>"`, failing on the call numbers listed in `fail_on`.
pub struct CountingCapability {
    name: String,
    calls: AtomicUsize,
    fail_on: Vec<usize>,
}

impl CountingCapability {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
            fail_on: Vec::new(),
        }
    }

    /// Fail the `n`-th call (1-based).
    pub fn failing_on(mut self, n: usize) -> Self {
        self.fail_on.push(n);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Capability for CountingCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        _cancel: &CancellationToken,
        _prompt: &str,
    ) -> Result<String, CapabilityError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&n) {
            return Err(CapabilityError::Failed(format!("{} call #{n} failed", self.name)));
        }
        Ok(format!("{} reply #{n}", self.name))
    }
}
