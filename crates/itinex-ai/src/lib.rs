//! AI completion boundary for the itinex extraction engine.
//!
//! This crate defines the contract the engine uses to talk to a text
//! completion service:
//! - [`CompletionBackend`] - the trait the orchestrator calls
//! - [`HttpCompletionBackend`] - an OpenAI-compatible chat completions client
//! - [`ScriptedBackend`] - a deterministic backend for tests
//!
//! The completion call is the only external I/O in the pipeline. Every error
//! it can produce is recoverable: the engine falls back to its deterministic
//! regex tier.

pub mod backend;
pub mod error;
pub mod scripted;

pub use backend::{CompletionBackend, CompletionConfig, HttpCompletionBackend};
pub use error::CompletionError;
pub use scripted::ScriptedBackend;
