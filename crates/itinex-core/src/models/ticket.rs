//! Normalized ticket data models.
//!
//! [`NormalizedTicket`] is the engine's sole output contract: every parser
//! and the AI tier produce this shape regardless of source format. Field
//! names and nesting are a compatibility surface consumed downstream; fields
//! are always serialized, absent values appear as `null` or the
//! [`NOT_FOUND`] sentinel, never silently omitted.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sentinel for a field the source document did not contain.
pub const NOT_FOUND: &str = "not found";

/// A fully extracted and normalized travel document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTicket {
    /// Tag of the issuing system that produced the document.
    pub source_system: String,

    /// Reservation code; uppercase alphanumeric, 5-7 characters,
    /// or [`NOT_FOUND`].
    pub pnr: String,

    /// Numeric document identifier.
    pub ticket_number: Option<String>,

    /// Passenger information.
    pub passenger: Passenger,

    /// Issue date, ISO `YYYY-MM-DD` when resolvable, else the original token.
    pub issue_date: String,

    /// Flight segments in extraction order. The entity never sorts; order
    /// is not guaranteed chronological.
    pub flights: Vec<FlightSegment>,

    /// Fare amounts, when found.
    pub fares: Fares,

    /// Issuing agency details.
    pub agency: Agency,

    /// Source-specific fields not covered by the common shape, preserved
    /// for lossless downstream use. Ordered map so serialized output is
    /// deterministic.
    #[serde(default)]
    pub raw_data: BTreeMap<String, String>,
}

/// Passenger block of the output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    /// Best-effort full name, usually `SURNAME/FIRSTNAME`.
    pub name: String,
}

impl Default for Passenger {
    fn default() -> Self {
        Self {
            name: NOT_FOUND.to_string(),
        }
    }
}

/// Base fare and total, with their currency code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fares {
    /// 3-letter currency code.
    pub currency: Option<String>,
    /// Base fare amount.
    pub base_fare: Option<Decimal>,
    /// Total amount including taxes and fees.
    pub total: Option<Decimal>,
}

/// Issuing agency details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    /// Issuing agent or agency name.
    pub name: Option<String>,
    /// IATA number of the issuing office.
    pub iata: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
}

/// A city with its optional country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// City or airport name as printed on the document.
    pub city: String,
    /// Country, when the document carries one.
    pub country: Option<String>,
}

impl Location {
    /// Build a location from a raw `CITY, COUNTRY` token.
    pub fn from_city_country(city: &str, country: Option<&str>) -> Self {
        Self {
            city: city.trim().to_string(),
            country: country
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        }
    }
}

/// One flight leg of the itinerary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightSegment {
    /// Normalized full carrier name.
    pub carrier: String,

    /// Flight designator: 2-letter carrier code plus digits, e.g. `OB560`.
    pub flight_number: String,

    /// Departure date, ISO when resolvable.
    pub departure_date: Option<String>,

    /// Departure time, `HH:MM`.
    pub departure_time: Option<String>,

    /// Arrival date; inferred from departure date and times when the
    /// document omits it.
    pub arrival_date: Option<String>,

    /// Arrival time, `HH:MM`.
    pub arrival_time: Option<String>,

    /// Origin city.
    pub origin: Option<Location>,

    /// Destination city.
    pub destination: Option<Location>,

    /// Cabin class as printed.
    pub cabin: Option<String>,

    /// Baggage allowance as printed, e.g. `23K` or `2PC`.
    pub baggage: Option<String>,

    /// Carrier-local reservation code, when it differs from the PNR.
    pub airline_pnr: Option<String>,

    /// Terminal information.
    pub terminal: Option<String>,
}

impl NormalizedTicket {
    /// Create a ticket with every field at its sentinel/null value.
    pub fn empty(source_system: impl Into<String>) -> Self {
        Self {
            source_system: source_system.into(),
            pnr: NOT_FOUND.to_string(),
            ticket_number: None,
            passenger: Passenger::default(),
            issue_date: NOT_FOUND.to_string(),
            flights: Vec::new(),
            fares: Fares::default(),
            agency: Agency::default(),
            raw_data: BTreeMap::new(),
        }
    }

    /// Whether the extraction produced anything beyond sentinels.
    ///
    /// Used by the orchestrator to decide if an AI-tier payload is worth
    /// accepting.
    pub fn has_data(&self) -> bool {
        self.pnr != NOT_FOUND || !self.flights.is_empty()
    }

    /// Soft issues a caller may want to log or display.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.pnr == NOT_FOUND {
            warnings.push("reservation code not found".to_string());
        }
        if self.passenger.name == NOT_FOUND {
            warnings.push("passenger name not found".to_string());
        }
        if self.flights.is_empty() {
            warnings.push("no flight segments extracted".to_string());
        }

        warnings
    }
}

/// Check a candidate reservation code: uppercase alphanumeric, 5-7 chars.
pub fn is_valid_pnr(candidate: &str) -> bool {
    let len = candidate.len();
    (5..=7).contains(&len)
        && candidate
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
