//! Echo capability — returns its own name followed by the prompt.
//!
//! Useful for wiring checks (`conclave run` without network access) and for
//! tests that need to see exactly which prompt reached which capability.

use async_trait::async_trait;
use conclave_core::{CancellationToken, Capability, CapabilityError};

pub struct EchoCapability {
    name: String,
}

impl EchoCapability {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Capability for EchoCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
    ) -> Result<String, CapabilityError> {
        if cancel.is_cancelled() {
            return Err(CapabilityError::Cancelled);
        }
        Ok(format!("{}:{}", self.name, prompt))
    }
}
