//! Extraction orchestrator: AI tier first, regex registry tier on failure.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use itinex_ai::{CompletionBackend, CompletionConfig, HttpCompletionBackend};

use crate::error::{EngineError, Result};
use crate::models::config::EngineConfig;
use crate::models::ticket::{is_valid_pnr, NormalizedTicket, NOT_FOUND};
use crate::normalize::normalize_date;
use crate::parsers::document_text;
use crate::registry::ParserRegistry;

/// Which tier produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// AI completion tier.
    Ai,
    /// Deterministic regex tier.
    Registry,
}

/// Result of a successful extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Extracted ticket data.
    pub ticket: NormalizedTicket,
    /// Tier that produced the ticket.
    pub tier: Tier,
    /// Soft issues encountered during extraction.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Two-tier extraction engine.
///
/// Stateless across calls: the registry is read-only after construction and
/// all per-parse data is local, so one engine can serve documents from any
/// number of workers.
pub struct ExtractionEngine {
    registry: ParserRegistry,
    ai: Option<Box<dyn CompletionBackend>>,
    config: EngineConfig,
}

impl ExtractionEngine {
    /// Engine with the built-in registry and, when configured and
    /// constructible, the HTTP completion backend.
    pub fn new(config: EngineConfig) -> Self {
        let registry = ParserRegistry::new(&config.extraction);
        let ai: Option<Box<dyn CompletionBackend>> = if config.ai.enabled {
            let completion = CompletionConfig::default()
                .with_endpoint(config.ai.endpoint.clone())
                .with_timeout(Duration::from_secs(config.ai.timeout_secs))
                .with_max_tokens(config.ai.max_tokens);
            let completion = CompletionConfig {
                model: config.ai.model.clone(),
                ..completion
            };
            match HttpCompletionBackend::new(completion) {
                Ok(backend) => Some(Box::new(backend)),
                Err(err) => {
                    warn!(%err, "AI tier unavailable; running regex tier only");
                    None
                }
            }
        } else {
            None
        };
        Self { registry, ai, config }
    }

    /// Engine using an explicit completion backend.
    pub fn with_backend(config: EngineConfig, backend: Box<dyn CompletionBackend>) -> Self {
        let registry = ParserRegistry::new(&config.extraction);
        Self {
            registry,
            ai: Some(backend),
            config,
        }
    }

    /// Engine without an AI tier.
    pub fn regex_only(config: EngineConfig) -> Self {
        let registry = ParserRegistry::new(&config.extraction);
        Self {
            registry,
            ai: None,
            config,
        }
    }

    /// Extract a document. First success wins: the AI tier when available
    /// and valid, else the registry tier. All failure modes come back as
    /// [`EngineError`] values; this never panics across the boundary.
    pub fn extract(&self, text: &str, html_text: &str) -> Result<Extraction> {
        let start = Instant::now();
        let content = document_text(text, html_text);
        if content.trim().is_empty() {
            return Err(EngineError::NoContent);
        }

        if let Some(backend) = &self.ai {
            match self.try_ai(backend.as_ref(), &content) {
                Ok(ticket) => {
                    info!(backend = backend.name(), "AI tier produced a ticket");
                    return Ok(self.finish(ticket, Tier::Ai, start));
                }
                Err(reason) => {
                    warn!(%reason, "AI tier failed; falling back to regex tier");
                }
            }
        }

        let ticket = self.try_registry(&content)?;
        Ok(self.finish(ticket, Tier::Registry, start))
    }

    fn finish(&self, ticket: NormalizedTicket, tier: Tier, start: Instant) -> Extraction {
        let warnings = ticket.validate();
        Extraction {
            ticket,
            tier,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn try_ai(&self, backend: &dyn CompletionBackend, content: &str) -> std::result::Result<NormalizedTicket, String> {
        let prompt = build_extraction_prompt(content);
        let response = backend
            .complete(&prompt)
            .map_err(|e| format!("completion call failed: {e}"))?;

        if response.trim().is_empty() {
            return Err("empty completion response".to_string());
        }

        let payload = extract_json(&response)
            .ok_or_else(|| "no JSON object in completion response".to_string())?;
        let ai_ticket: AiTicket = serde_json::from_str(payload)
            .map_err(|e| format!("completion payload did not match the schema: {e}"))?;

        let ticket = ai_ticket.into_ticket(&self.registry.sources());
        if !ticket.has_data() {
            return Err("completion payload carried no reservation data".to_string());
        }

        Ok(ticket)
    }

    fn try_registry(&self, content: &str) -> Result<NormalizedTicket> {
        let parser = self
            .registry
            .find_parser(content)
            .ok_or(EngineError::NoParserMatched)?;
        debug!(source = parser.source_system(), "dispatching to parser");
        Ok(parser.parse(content, ""))
    }

    /// Engine configuration (read-only).
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Prompt for the AI tier: the raw document plus a strict schema
/// description, demanding bare JSON back.
pub fn build_extraction_prompt(content: &str) -> String {
    format!(
        "You extract structured data from airline e-ticket receipts.\n\
         Return ONLY a JSON object, no prose and no code fences, with exactly\n\
         these fields:\n\
         {{\n\
           \"source_system\": \"issuing system tag or null\",\n\
           \"pnr\": \"reservation code, 5-7 uppercase alphanumerics, or null\",\n\
           \"ticket_number\": \"document number or null\",\n\
           \"passenger\": {{\"name\": \"SURNAME/FIRSTNAME or null\"}},\n\
           \"issue_date\": \"YYYY-MM-DD or null\",\n\
           \"flights\": [{{\"carrier\": \"\", \"flight_number\": \"\",\n\
             \"departure_date\": \"\", \"departure_time\": \"\",\n\
             \"arrival_date\": \"\", \"arrival_time\": \"\",\n\
             \"origin\": {{\"city\": \"\", \"country\": null}},\n\
             \"destination\": {{\"city\": \"\", \"country\": null}},\n\
             \"cabin\": null, \"baggage\": null, \"airline_pnr\": null,\n\
             \"terminal\": null}}],\n\
           \"fares\": {{\"currency\": null, \"base_fare\": null, \"total\": null}},\n\
           \"agency\": {{\"name\": null, \"iata\": null, \"phone\": null}},\n\
           \"raw_data\": {{}}\n\
         }}\n\
         Use null for anything the document does not state. Never invent\n\
         values.\n\n\
         Document:\n\
         ---\n\
         {content}\n\
         ---"
    )
}

/// Slice out the JSON object of a completion response, tolerating code
/// fences and surrounding prose.
fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end >= start).then(|| &response[start..=end])
}

// Lenient mirror of the output contract: every field optional, amounts
// accepted as numbers or strings.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AiTicket {
    source_system: Option<String>,
    pnr: Option<String>,
    ticket_number: Option<String>,
    passenger: AiPassenger,
    issue_date: Option<String>,
    flights: Vec<AiFlight>,
    fares: AiFares,
    agency: AiAgency,
    raw_data: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AiPassenger {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AiFlight {
    carrier: Option<String>,
    flight_number: Option<String>,
    departure_date: Option<String>,
    departure_time: Option<String>,
    arrival_date: Option<String>,
    arrival_time: Option<String>,
    origin: Option<AiLocation>,
    destination: Option<AiLocation>,
    cabin: Option<String>,
    baggage: Option<String>,
    airline_pnr: Option<String>,
    terminal: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AiLocation {
    city: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AiFares {
    currency: Option<String>,
    base_fare: Option<serde_json::Value>,
    total: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AiAgency {
    name: Option<String>,
    iata: Option<String>,
    phone: Option<String>,
}

impl AiTicket {
    fn into_ticket(self, known_sources: &[&'static str]) -> NormalizedTicket {
        let source_system = self
            .source_system
            .map(|s| s.trim().to_lowercase())
            .filter(|s| known_sources.iter().any(|k| *k == s.as_str()))
            .unwrap_or_else(|| "ai".to_string());

        let mut ticket = NormalizedTicket::empty(source_system);

        if let Some(pnr) = self.pnr {
            let candidate = pnr.trim().to_uppercase();
            if is_valid_pnr(&candidate) {
                ticket.pnr = candidate;
            }
        }
        ticket.ticket_number = self.ticket_number.filter(|t| !t.trim().is_empty());
        if let Some(name) = self.passenger.name.filter(|n| !n.trim().is_empty()) {
            ticket.passenger.name = name.trim().to_string();
        }
        if let Some(date) = self.issue_date.filter(|d| !d.trim().is_empty()) {
            ticket.issue_date = normalize_date(&date);
        }

        for flight in self.flights {
            let Some(flight_number) = flight
                .flight_number
                .map(|f| f.replace(' ', "").to_uppercase())
                .filter(|f| !f.is_empty())
            else {
                debug!("AI flight without designator dropped");
                continue;
            };
            let Some(departure_date) = flight
                .departure_date
                .filter(|d| !d.trim().is_empty())
                .map(|d| normalize_date(&d))
            else {
                debug!("AI flight without departure date dropped");
                continue;
            };

            ticket.flights.push(crate::models::ticket::FlightSegment {
                carrier: flight
                    .carrier
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| NOT_FOUND.to_string()),
                flight_number,
                departure_date: Some(departure_date),
                departure_time: flight.departure_time,
                arrival_date: flight.arrival_date.map(|d| normalize_date(&d)),
                arrival_time: flight.arrival_time,
                origin: flight.origin.and_then(AiLocation::into_location),
                destination: flight.destination.and_then(AiLocation::into_location),
                cabin: flight.cabin,
                baggage: flight.baggage,
                airline_pnr: flight.airline_pnr,
                terminal: flight.terminal,
            });
        }

        ticket.fares.currency = self.fares.currency.filter(|c| !c.trim().is_empty());
        ticket.fares.base_fare = self.fares.base_fare.as_ref().and_then(decimal_from_value);
        ticket.fares.total = self.fares.total.as_ref().and_then(decimal_from_value);
        ticket.agency.name = self.agency.name.filter(|v| !v.trim().is_empty());
        ticket.agency.iata = self.agency.iata.filter(|v| !v.trim().is_empty());
        ticket.agency.phone = self.agency.phone.filter(|v| !v.trim().is_empty());

        for (key, value) in self.raw_data {
            let rendered = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            ticket.raw_data.insert(key, rendered);
        }

        ticket
    }
}

impl AiLocation {
    fn into_location(self) -> Option<crate::models::ticket::Location> {
        let city = self.city.filter(|c| !c.trim().is_empty())?;
        Some(crate::models::ticket::Location {
            city: city.trim().to_string(),
            country: self.country.filter(|c| !c.trim().is_empty()),
        })
    }
}

fn decimal_from_value(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(&s.replace(',', "")).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itinex_ai::ScriptedBackend;
    use pretty_assertions::assert_eq;

    const SABRE_DOC: &str = "\
ELECTRONIC TICKET RECEIPT

PREPARED FOR
DOE/JOHN MR
RESERVATION CODE          ABC123
TICKET NUMBER             0452345678901
ISSUE DATE                08 May 25

DEPARTURE: THURSDAY 08 MAY
BOLIVIANA DE AVIACION
OB 560
LA PAZ, BOLIVIA           SANTA CRUZ, BOLIVIA
08 MAY 25  07:30          08 MAY 25  08:25
";

    const AI_RESPONSE: &str = r#"{
        "source_system": "sabre",
        "pnr": "ABC123",
        "ticket_number": "0452345678901",
        "passenger": {"name": "DOE/JOHN"},
        "issue_date": "2025-05-08",
        "flights": [{
            "carrier": "Boliviana de Aviacion",
            "flight_number": "OB 560",
            "departure_date": "08 may 25",
            "departure_time": "07:30",
            "arrival_date": "2025-05-08",
            "arrival_time": "08:25",
            "origin": {"city": "LA PAZ", "country": "BOLIVIA"},
            "destination": {"city": "SANTA CRUZ", "country": "BOLIVIA"}
        }],
        "fares": {"currency": "USD", "base_fare": "180.00", "total": 235.40},
        "agency": {"name": null, "iata": null, "phone": null},
        "raw_data": {"note": "test"}
    }"#;

    fn engine_with(backend: ScriptedBackend) -> ExtractionEngine {
        ExtractionEngine::with_backend(EngineConfig::default(), Box::new(backend))
    }

    #[test]
    fn test_empty_input_is_no_content() {
        let engine = ExtractionEngine::regex_only(EngineConfig::default());
        let err = engine.extract("", "").unwrap_err();
        assert!(matches!(err, EngineError::NoContent));
        assert_eq!(err.to_string(), "no content");

        let err = engine.extract("   \n  ", "").unwrap_err();
        assert!(matches!(err, EngineError::NoContent));
    }

    #[test]
    fn test_unknown_format_is_no_parser_matched() {
        let engine = ExtractionEngine::regex_only(EngineConfig::default());
        let err = engine.extract("grocery list: eggs, milk", "").unwrap_err();
        assert!(matches!(err, EngineError::NoParserMatched));
    }

    #[test]
    fn test_regex_tier_alone() {
        let engine = ExtractionEngine::regex_only(EngineConfig::default());
        let extraction = engine.extract(SABRE_DOC, "").unwrap();
        assert_eq!(extraction.tier, Tier::Registry);
        assert_eq!(extraction.ticket.source_system, "sabre");
        assert_eq!(extraction.ticket.pnr, "ABC123");
    }

    #[test]
    fn test_ai_failure_falls_back_to_registry() {
        let engine = engine_with(ScriptedBackend::failing());
        let extraction = engine.extract(SABRE_DOC, "").unwrap();
        assert_eq!(extraction.tier, Tier::Registry);
        assert_eq!(extraction.ticket.pnr, "ABC123");
        assert_eq!(extraction.ticket.passenger.name, "DOE/JOHN");
    }

    #[test]
    fn test_ai_success_short_circuits_registry() {
        let engine = engine_with(ScriptedBackend::replying(AI_RESPONSE));
        let extraction = engine.extract(SABRE_DOC, "").unwrap();
        assert_eq!(extraction.tier, Tier::Ai);
        assert_eq!(extraction.ticket.source_system, "sabre");
        assert_eq!(extraction.ticket.pnr, "ABC123");
        assert_eq!(extraction.ticket.flights.len(), 1);

        let flight = &extraction.ticket.flights[0];
        assert_eq!(flight.flight_number, "OB560");
        assert_eq!(flight.departure_date.as_deref(), Some("2025-05-08"));
        assert_eq!(
            extraction.ticket.fares.base_fare.map(|d| d.to_string()).as_deref(),
            Some("180.00")
        );
        // JSON numbers round-trip without their trailing zero.
        assert_eq!(
            extraction.ticket.fares.total.map(|d| d.to_string()).as_deref(),
            Some("235.4")
        );
        assert_eq!(extraction.ticket.raw_data["note"], "test");
    }

    #[test]
    fn test_ai_code_fences_tolerated() {
        let fenced = format!("```json\n{AI_RESPONSE}\n```");
        let engine = engine_with(ScriptedBackend::replying(fenced));
        let extraction = engine.extract(SABRE_DOC, "").unwrap();
        assert_eq!(extraction.tier, Tier::Ai);
    }

    #[test]
    fn test_ai_invalid_json_falls_back() {
        let engine = engine_with(ScriptedBackend::replying("not json at all"));
        let extraction = engine.extract(SABRE_DOC, "").unwrap();
        assert_eq!(extraction.tier, Tier::Registry);
    }

    #[test]
    fn test_ai_empty_payload_falls_back() {
        // Valid JSON, but no reservation data worth keeping.
        let engine = engine_with(ScriptedBackend::replying("{}"));
        let extraction = engine.extract(SABRE_DOC, "").unwrap();
        assert_eq!(extraction.tier, Tier::Registry);
    }

    #[test]
    fn test_ai_unknown_source_tag_becomes_ai() {
        let response = r#"{"source_system": "mystery", "pnr": "ZZZ999"}"#;
        let engine = engine_with(ScriptedBackend::replying(response));
        let extraction = engine.extract(SABRE_DOC, "").unwrap();
        assert_eq!(extraction.tier, Tier::Ai);
        assert_eq!(extraction.ticket.source_system, "ai");
        assert_eq!(extraction.ticket.pnr, "ZZZ999");
    }

    #[test]
    fn test_warnings_on_empty_flights() {
        let response = r#"{"pnr": "ZZZ999"}"#;
        let engine = engine_with(ScriptedBackend::replying(response));
        let extraction = engine.extract(SABRE_DOC, "").unwrap();
        assert!(extraction
            .warnings
            .iter()
            .any(|w| w.contains("no flight segments")));
    }

    #[test]
    fn test_ai_disabled_runs_regex_tier() {
        let mut config = EngineConfig::default();
        config.ai.enabled = false;
        let engine = ExtractionEngine::new(config);
        let extraction = engine.extract(SABRE_DOC, "").unwrap();
        assert_eq!(extraction.tier, Tier::Registry);
    }

    #[test]
    fn test_prompt_embeds_document_and_schema() {
        let prompt = build_extraction_prompt("RESERVATION CODE XY12AB");
        assert!(prompt.contains("RESERVATION CODE XY12AB"));
        assert!(prompt.contains("\"pnr\""));
        assert!(prompt.contains("\"flights\""));
        assert!(prompt.contains("\"raw_data\""));
    }

    #[test]
    fn test_extract_json() {
        assert_eq!(extract_json("{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(extract_json("noise {\"a\":1} noise"), Some("{\"a\":1}"));
        assert_eq!(extract_json("no braces"), None);
    }

    #[test]
    fn test_idempotent_end_to_end() {
        let engine = ExtractionEngine::regex_only(EngineConfig::default());
        let first = serde_json::to_string(&engine.extract(SABRE_DOC, "").unwrap().ticket).unwrap();
        let second = serde_json::to_string(&engine.extract(SABRE_DOC, "").unwrap().ticket).unwrap();
        assert_eq!(first, second);
    }
}
