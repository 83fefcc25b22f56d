//! The Conclave orchestration engine.
//!
//! A fixed pool of agents, each bound to a [`conclave_core::Capability`],
//! answers one prompt together in one of three modes:
//!
//! - **standard**: every agent answers a differently framed version of the
//!   prompt in parallel; the answers are rendered as one labelled report
//! - **synthesis**: standard, then a dedicated capability merges the answers
//!   into a consolidated conclusion
//! - **collaborative**: initial analysis, parallel dimension exploration,
//!   integration and a final answer, all sharing one evolving analysis
//!
//! The engine never retries a failed capability call and keeps no state
//! between runs.

pub mod aggregate;
pub mod collaborative;
pub mod fanout;
pub mod pool;
pub mod prompts;
pub mod society;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use aggregate::{naive_concatenation, render_report, synthesize_with};
pub use collaborative::{CollaborativeContext, CollaborativePipeline};
pub use fanout::FanOut;
pub use pool::{Pool, PoolBuilder};
pub use society::{
    EngineTimeouts, Society, SocietyConfig, run_collaborative, run_standard, run_with_synthesis,
};
