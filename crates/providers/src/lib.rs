//! Capability implementations for Conclave.
//!
//! All capabilities implement the `conclave_core::Capability` trait.
//! The registry builds the configured set from `AppConfig`.

pub mod echo;
pub mod openai_compat;
pub mod registry;
pub mod scripted;

pub use echo::EchoCapability;
pub use openai_compat::OpenAiCompatCapability;
pub use registry::CapabilityRegistry;
pub use scripted::ScriptedCapability;
