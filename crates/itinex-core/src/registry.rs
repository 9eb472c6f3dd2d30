//! Capability-based parser dispatch.

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::normalize::CarrierCatalog;
use crate::parsers::{
    AmadeusParser, GalileoParser, KiuParser, SabreParser, SirenaParser, TicketParser,
    WorldspanParser,
};

/// Ordered collection of format parsers.
///
/// Built once at startup and read-only afterwards; the same registry serves
/// any number of documents, concurrently if the caller wants to. Formats
/// can share surface markers, so registration order is priority order and
/// dispatch is deterministic.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn TicketParser>>,
}

impl ParserRegistry {
    /// Registry with the built-in parsers in their priority order.
    pub fn new(config: &ExtractionConfig) -> Self {
        let catalog = CarrierCatalog::default();
        Self::with_parsers(vec![
            Box::new(SabreParser::new(config, catalog.clone())),
            Box::new(AmadeusParser::new(config, catalog.clone())),
            Box::new(KiuParser::new(config, catalog.clone())),
            Box::new(GalileoParser::new(config, catalog.clone())),
            Box::new(WorldspanParser::new(config, catalog.clone())),
            Box::new(SirenaParser::new(config, catalog)),
        ])
    }

    /// Registry over a custom parser list; order is priority order.
    pub fn with_parsers(parsers: Vec<Box<dyn TicketParser>>) -> Self {
        Self { parsers }
    }

    /// Number of registered parsers.
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Source-system tags of the registered parsers, in priority order.
    pub fn sources(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.source_system()).collect()
    }

    /// Find the first parser whose `can_parse` accepts the text.
    ///
    /// Each parser is probed exactly once, in registration order; `None`
    /// means no registered format recognized the document.
    pub fn find_parser(&self, text: &str) -> Option<&dyn TicketParser> {
        for parser in &self.parsers {
            let accepted = parser.can_parse(text);
            debug!(source = parser.source_system(), accepted, "probed parser");
            if accepted {
                return Some(parser.as_ref());
            }
        }
        None
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatches_by_marker() {
        let registry = ParserRegistry::default();

        let sabre = "ELECTRONIC TICKET RECEIPT\nRESERVATION CODE ABC123";
        assert_eq!(registry.find_parser(sabre).unwrap().source_system(), "sabre");

        let kiu = "BOLETO ELECTRONICO\nSISTEMA KIU";
        assert_eq!(registry.find_parser(kiu).unwrap().source_system(), "kiu");

        let sirena = "SIRENA-TRAVEL E-TICKET";
        assert_eq!(registry.find_parser(sirena).unwrap().source_system(), "sirena");
    }

    #[test]
    fn test_no_match_is_none() {
        let registry = ParserRegistry::default();
        assert!(registry.find_parser("completely unrelated text").is_none());
        assert!(registry.find_parser("").is_none());
    }

    #[test]
    fn test_overlapping_markers_resolve_by_registration_order() {
        let registry = ParserRegistry::default();

        // Carries both the Sabre and the Amadeus surface markers; Sabre is
        // registered first and must win on every run.
        let ambiguous = "\
ELECTRONIC TICKET RECEIPT
ITINERARY RECEIPT
RESERVATION CODE ABC123
BOOKING REF: XYZ789
";
        for _ in 0..5 {
            let parser = registry.find_parser(ambiguous).unwrap();
            assert_eq!(parser.source_system(), "sabre");
        }
    }

    #[test]
    fn test_registered_parser_count() {
        assert_eq!(ParserRegistry::default().len(), 6);
    }
}
