//! Capability trait — the abstraction over text-transformation backends.
//!
//! A capability takes a prompt and produces a response, or fails. The engine
//! never looks inside: an HTTP-backed LLM, a scripted fake, and a local echo
//! are all the same thing from the orchestrator's point of view.
//!
//! Implementations: OpenAI-compatible endpoints, echo, scripted responses.

use async_trait::async_trait;

use crate::error::CapabilityError;

pub use tokio_util::sync::CancellationToken;

/// The core Capability trait.
///
/// Every agent in a pool is bound to one capability. Capabilities are shared
/// (`Arc<dyn Capability>`) between agents and outlive the pool, so `process`
/// takes `&self`; any per-call state is the implementation's concern.
///
/// `cancel` is the shared cancellation signal of the current fan-out. It is
/// triggered when the batch deadline elapses or a sibling agent fails.
/// Implementations doing I/O should race their work against
/// [`CancellationToken::cancelled`] and return [`CapabilityError::Cancelled`]
/// rather than waiting to be aborted.
#[async_trait]
pub trait Capability: Send + Sync {
    /// A human-readable name for this capability (e.g., "gpt-4o", "echo").
    fn name(&self) -> &str;

    /// Transform `prompt` into a response.
    async fn process(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
    ) -> std::result::Result<String, CapabilityError>;
}
