//! # Conclave Core
//!
//! Domain types, traits, and error definitions for the Conclave
//! orchestration engine. This crate has **no runtime dependencies** beyond
//! the cancellation primitive — it defines the contract that capability
//! implementations and the engine both build against.
//!
//! ## Design Philosophy
//!
//! A capability is the only thing the engine calls out to. It is defined as
//! a trait here; implementations live in `conclave-providers` or in the
//! caller's own code. This enables:
//! - Swapping real LLM backends for scripted fakes in tests
//! - Mixing several backends in one pool
//! - A clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod capability;
pub mod error;

// Re-export key types at crate root for ergonomics
pub use agent::{Agent, AgentId, Mode};
pub use capability::{Capability, CancellationToken};
pub use error::{CapabilityError, Error, Phase, Result};
