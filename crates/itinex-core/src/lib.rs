//! Core library for multi-format airline e-ticket extraction.
//!
//! This crate provides:
//! - Format detection over raw e-ticket text (Sabre, Amadeus, KIU, Galileo,
//!   Worldspan, Sirena receipt families)
//! - Per-format heuristic field extraction into one normalized contract
//! - Date, currency, and carrier-name normalization
//! - A two-tier orchestrator: AI completion first, deterministic regex
//!   fallback on any AI failure

pub mod error;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod parsers;
pub mod registry;

pub use error::{EngineError, Result};
pub use models::config::{AiTierConfig, EngineConfig, ExtractionConfig, FormatOverride};
pub use models::ticket::{
    Agency, Fares, FlightSegment, Location, NormalizedTicket, Passenger, NOT_FOUND,
};
pub use normalize::{
    infer_arrival_date, normalize_carrier, normalize_date, split_currency_amount, CarrierCatalog,
};
pub use orchestrator::{Extraction, ExtractionEngine, Tier};
pub use parsers::TicketParser;
pub use registry::ParserRegistry;

/// Re-export completion boundary types.
pub use itinex_ai::{CompletionBackend, CompletionConfig, CompletionError, HttpCompletionBackend};
