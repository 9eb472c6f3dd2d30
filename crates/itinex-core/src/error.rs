//! Error types for the itinex-core library.

use thiserror::Error;

/// Main error type for the extraction engine.
///
/// These are the only failures that cross the engine boundary. Field-level
/// and block-level misses never surface here; they degrade to sentinel
/// values inside the ticket.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The input document was empty or whitespace-only.
    #[error("no content")]
    NoContent,

    /// No registered parser recognized the document format.
    #[error("no parser matched the document")]
    NoParserMatched,

    /// The AI tier failed and no regex tier was able to run.
    #[error("completion error: {0}")]
    Completion(#[from] itinex_ai::CompletionError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for the itinex-core library.
pub type Result<T> = std::result::Result<T, EngineError>;
