//! Carrier name resolution against a known-carrier catalog.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::ticket::NOT_FOUND;

/// Two-letter tokens that are common words or corporate suffixes, never
/// carrier codes. Checked at every resolution step.
const EXCLUDED_TOKENS: &[&str] = &[
    "DE", "EL", "EN", "UN", "NO", "DO", "DA", "AL", "LO", "SE", "SA", "CO", "BY", "OF", "TO",
    "IN", "ON", "AT",
];

/// IATA code to full carrier name, for the carriers the supported formats
/// actually emit.
const KNOWN_CARRIERS: &[(&str, &str)] = &[
    ("OB", "Boliviana de Aviacion"),
    ("Z8", "Amaszonas"),
    ("LA", "LATAM Airlines"),
    ("AA", "American Airlines"),
    ("AV", "Avianca"),
    ("CM", "Copa Airlines"),
    ("AR", "Aerolineas Argentinas"),
    ("G3", "Gol Linhas Aereas"),
    ("AD", "Azul Linhas Aereas"),
    ("H2", "Sky Airline"),
    ("JA", "JetSMART"),
    ("UX", "Air Europa"),
    ("IB", "Iberia"),
    ("AF", "Air France"),
    ("KL", "KLM Royal Dutch Airlines"),
    ("BA", "British Airways"),
    ("LH", "Lufthansa"),
    ("DL", "Delta Air Lines"),
    ("UA", "United Airlines"),
    ("AM", "Aeromexico"),
    ("B6", "JetBlue Airways"),
    ("AC", "Air Canada"),
    ("EK", "Emirates"),
    ("QR", "Qatar Airways"),
    ("TK", "Turkish Airlines"),
    ("AZ", "ITA Airways"),
    ("LX", "Swiss International Air Lines"),
    ("PZ", "Paranair"),
    ("SU", "Aeroflot"),
    ("S7", "S7 Airlines"),
];

/// Read-only lookup of carrier codes and names.
///
/// Loaded once at startup and injected into whatever needs it; nothing
/// mutates it afterwards.
#[derive(Debug, Clone)]
pub struct CarrierCatalog {
    names: HashMap<String, String>,
    excluded: HashSet<String>,
}

impl Default for CarrierCatalog {
    fn default() -> Self {
        Self::new(
            KNOWN_CARRIERS
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string()))
                .collect(),
            EXCLUDED_TOKENS.iter().map(|t| t.to_string()).collect(),
        )
    }
}

impl CarrierCatalog {
    /// Build a catalog from explicit tables.
    pub fn new(names: HashMap<String, String>, excluded: HashSet<String>) -> Self {
        Self { names, excluded }
    }

    /// Full carrier name for a code, if known.
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    /// Whether a token is denylisted as a non-carrier word.
    pub fn is_excluded(&self, token: &str) -> bool {
        self.excluded.contains(token)
    }

    fn resolve(&self, candidate: &str) -> Option<&str> {
        if self.is_excluded(candidate) {
            return None;
        }
        self.lookup(candidate)
    }
}

/// Resolve a raw extracted carrier string to a catalog name.
///
/// Resolution priority: the 2-letter code of the adjacent flight number, a
/// 2-letter code at the start of the raw name, then any 2-letter token in
/// the raw name. Denylisted tokens never resolve. When nothing matches the
/// cleaned raw string is returned verbatim; the result is never blank.
pub fn normalize_carrier(raw: &str, flight_number: Option<&str>, catalog: &CarrierCatalog) -> String {
    if let Some(code) = flight_number.and_then(code_from_flight_number) {
        if let Some(name) = catalog.resolve(&code) {
            return name.to_string();
        }
    }

    let cleaned = clean_raw(raw);
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    if let Some(first) = tokens.first().filter(|t| is_code_candidate(t)) {
        if let Some(name) = catalog.resolve(first) {
            return name.to_string();
        }
    }

    for token in tokens.iter().skip(1).filter(|t| is_code_candidate(t)) {
        if let Some(name) = catalog.resolve(token) {
            return name.to_string();
        }
    }

    if cleaned.is_empty() {
        debug!("carrier name empty after cleanup");
        return NOT_FOUND.to_string();
    }

    cleaned
}

fn code_from_flight_number(flight_number: &str) -> Option<String> {
    let code: String = flight_number.trim().chars().take(2).collect::<String>().to_uppercase();
    (code.len() == 2
        && code.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()))
    .then_some(code)
}

fn is_code_candidate(token: &str) -> bool {
    token.len() == 2
        && token.chars().any(|c| c.is_ascii_uppercase())
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

fn clean_raw(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_number_code_wins() {
        let catalog = CarrierCatalog::default();
        assert_eq!(
            normalize_carrier("SOME UNRELATED NAME", Some("AA123"), &catalog),
            "American Airlines"
        );
    }

    #[test]
    fn test_code_at_start_of_raw() {
        let catalog = CarrierCatalog::default();
        assert_eq!(
            normalize_carrier("OB BOLIVIANA", None, &catalog),
            "Boliviana de Aviacion"
        );
    }

    #[test]
    fn test_code_anywhere_in_raw() {
        let catalog = CarrierCatalog::default();
        assert_eq!(
            normalize_carrier("OPERATED BY Z8 GROUP", None, &catalog),
            "Amaszonas"
        );
    }

    #[test]
    fn test_excluded_token_never_resolves() {
        let mut names = HashMap::new();
        // Even if someone loads "DE" as a code, the denylist wins.
        names.insert("DE".to_string(), "Phantom Air".to_string());
        let excluded = EXCLUDED_TOKENS.iter().map(|t| t.to_string()).collect();
        let catalog = CarrierCatalog::new(names, excluded);

        assert_eq!(
            normalize_carrier("LINEAS DE TRANSPORTE", Some("DE999"), &catalog),
            "LINEAS DE TRANSPORTE"
        );
    }

    #[test]
    fn test_unmatched_returns_cleaned_raw() {
        let catalog = CarrierCatalog::default();
        assert_eq!(
            normalize_carrier("  REGIONAL   EXPRESS  ", None, &catalog),
            "REGIONAL EXPRESS"
        );
    }

    #[test]
    fn test_empty_raw_never_blank() {
        let catalog = CarrierCatalog::default();
        assert_eq!(normalize_carrier("   ", None, &catalog), NOT_FOUND);
    }

    #[test]
    fn test_denylist_and_catalog_disjoint() {
        for (code, _) in KNOWN_CARRIERS {
            assert!(
                !EXCLUDED_TOKENS.contains(code),
                "carrier code {code} collides with the denylist"
            );
        }
    }

    #[test]
    fn test_digit_bearing_codes() {
        let catalog = CarrierCatalog::default();
        assert_eq!(
            normalize_carrier("whatever", Some("G3 1480"), &catalog),
            "Gol Linhas Aereas"
        );
    }
}
