//! Parser for Galileo-style e-ticket receipts.
//!
//! Galileo receipts pack several header scalars onto shared lines
//! (`REF: ... NAME: ...`), describe the route as `CITY CC  TO  CITY CC`,
//! and frequently print the arrival as a bare time, leaving the arrival
//! date to be inferred from the departure.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::ticket::{FlightSegment, Location, NormalizedTicket, NOT_FOUND};
use crate::normalize::{infer_arrival_date, normalize_carrier, normalize_date, normalize_time, split_currency_amount, CarrierCatalog};

use super::{
    document_text, find_flight_anchor, split_blocks, strip_passenger_title, try_patterns,
    try_patterns_or, FormatProfile, TicketParser,
};

const SOURCE: &str = "galileo";

lazy_static! {
    static ref PNR: Regex = Regex::new(
        r"(?m)^REF:\s*([A-Z0-9]{5,7})\b"
    ).unwrap();

    static ref TICKET_NUMBER: Regex = Regex::new(
        r"\bTKT:\s*([0-9][0-9-]{9,14})\b"
    ).unwrap();

    static ref PASSENGER: Regex = Regex::new(
        r"\bNAME:\s*([A-Z][A-Z/.'-]*(?: [A-Z/.'-]+)*)"
    ).unwrap();

    static ref ISSUE_DATE: Regex = Regex::new(
        r"\bISSUED:\s*(\S+)"
    ).unwrap();

    static ref AGENT: Regex = Regex::new(
        r"(?m)^AGT:\s*([^/\n]+)"
    ).unwrap();

    static ref IATA: Regex = Regex::new(
        r"\bIATA\s*([0-9]{7,8})\b"
    ).unwrap();

    static ref PHONE: Regex = Regex::new(
        r"\bPH\s*([+0-9][0-9 ()./-]{5,})"
    ).unwrap();

    static ref FARE: Regex = Regex::new(
        r"(?m)^FARE\s+([A-Z]{3}\s?[0-9][0-9.,]*)"
    ).unwrap();

    static ref TOTAL: Regex = Regex::new(
        r"(?m)^TOTAL\s+([A-Z]{3}\s?[0-9][0-9.,]*)"
    ).unwrap();

    // `LONDON HEATHROW GB  TO  NEW YORK JFK US`
    static ref ROUTE: Regex = Regex::new(
        r"(?m)^([A-Z][A-Z .'-]*[A-Z])\s+([A-Z]{2})\s+TO\s+([A-Z][A-Z .'-]*[A-Z])\s+([A-Z]{2})\s*$"
    ).unwrap();

    static ref DEPARTURE: Regex = Regex::new(
        r"\bDEP\s+(\d{1,2} [A-Z]{3} \d{2,4})\s+(\d{1,2}:\d{2})(?:\s+TERMINAL\s+([A-Z0-9]+))?"
    ).unwrap();

    // Arrival date is optional; overnight legs print the time alone.
    static ref ARRIVAL: Regex = Regex::new(
        r"\bARR\s+(?:(\d{1,2} [A-Z]{3} \d{2,4})\s+)?(\d{1,2}:\d{2})(?:\s+TERMINAL\s+([A-Z0-9]+))?"
    ).unwrap();

    static ref CLASS: Regex = Regex::new(
        r"\bCLASS\s+([A-Z])\s+([A-Z]+)\b"
    ).unwrap();

    static ref BAGGAGE: Regex = Regex::new(
        r"\bBAG\s+([0-9]{1,2}\s?(?:KG|K|PC|P)\b)"
    ).unwrap();

    static ref AIRLINE_PNR: Regex = Regex::new(
        r"\bAIRLINE REF\s+([A-Z0-9]{5,7})\b"
    ).unwrap();
}

/// Parser for the Galileo receipt family.
pub struct GalileoParser {
    profile: FormatProfile,
    catalog: CarrierCatalog,
}

impl GalileoParser {
    pub fn new(config: &ExtractionConfig, catalog: CarrierCatalog) -> Self {
        let mut profile = FormatProfile::new(
            &["E-TICKET RECEIPT", "GALILEO"],
            &["FLT "],
        );
        if let Some(over) = config.format_overrides.get(SOURCE) {
            profile.apply_override(over);
        }
        Self { profile, catalog }
    }

    fn parse_segment(&self, block: &str) -> Option<FlightSegment> {
        let Some((_, flight_number)) = find_flight_anchor(block, &self.catalog) else {
            debug!(source = SOURCE, "segment block without flight designator dropped");
            return None;
        };

        let carrier = normalize_carrier("", Some(&flight_number), &self.catalog);

        let mut segment = FlightSegment {
            carrier,
            flight_number,
            ..FlightSegment::default()
        };

        if let Some(caps) = ROUTE.captures(block) {
            segment.origin = Some(Location::from_city_country(&caps[1], Some(&caps[2])));
            segment.destination = Some(Location::from_city_country(&caps[3], Some(&caps[4])));
        }

        if let Some(caps) = DEPARTURE.captures(block) {
            segment.departure_date = Some(normalize_date(&caps[1]));
            segment.departure_time = normalize_time(&caps[2]);
            segment.terminal = caps.get(3).map(|m| m.as_str().to_string());
        }

        if let Some(caps) = ARRIVAL.captures(block) {
            segment.arrival_date = caps.get(1).map(|m| normalize_date(m.as_str()));
            segment.arrival_time = normalize_time(&caps[2]);
        }

        if segment.arrival_date.is_none() {
            if let (Some(date), Some(dep), Some(arr)) = (
                segment.departure_date.as_deref(),
                segment.departure_time.as_deref(),
                segment.arrival_time.as_deref(),
            ) {
                segment.arrival_date = infer_arrival_date(date, dep, arr);
            }
        }

        if let Some(caps) = CLASS.captures(block) {
            segment.cabin = Some(caps[2].to_string());
        }
        segment.baggage = try_patterns(block, &[&BAGGAGE]);
        segment.airline_pnr = try_patterns(block, &[&AIRLINE_PNR]);

        if segment.departure_date.is_none() {
            debug!(source = SOURCE, "segment block without departure date dropped");
            return None;
        }

        Some(segment)
    }
}

impl TicketParser for GalileoParser {
    fn source_system(&self) -> &'static str {
        SOURCE
    }

    fn can_parse(&self, text: &str) -> bool {
        self.profile.matches(text)
    }

    fn parse(&self, text: &str, html_text: &str) -> NormalizedTicket {
        let text = document_text(text, html_text);
        let mut ticket = NormalizedTicket::empty(SOURCE);

        ticket.pnr = try_patterns_or(&text, &[&PNR], NOT_FOUND);
        ticket.ticket_number = try_patterns(&text, &[&TICKET_NUMBER]);
        ticket.issue_date = try_patterns(&text, &[&ISSUE_DATE])
            .map(|raw| normalize_date(&raw))
            .unwrap_or_else(|| NOT_FOUND.to_string());
        if let Some(name) = try_patterns(&text, &[&PASSENGER]) {
            ticket.passenger.name = strip_passenger_title(&name);
        }

        ticket.agency.name = try_patterns(&text, &[&AGENT]);
        ticket.agency.iata = try_patterns(&text, &[&IATA]);
        ticket.agency.phone = try_patterns(&text, &[&PHONE]);

        if let Some(token) = try_patterns(&text, &[&FARE]) {
            let (currency, amount) = split_currency_amount(&token);
            ticket.fares.currency = currency;
            ticket.fares.base_fare = amount;
        }
        if let Some(token) = try_patterns(&text, &[&TOTAL]) {
            let (currency, amount) = split_currency_amount(&token);
            if ticket.fares.currency.is_none() {
                ticket.fares.currency = currency;
            }
            ticket.fares.total = amount;
        }

        for block in split_blocks(&text, &self.profile.segment_delimiters) {
            if let Some(segment) = self.parse_segment(block) {
                ticket.flights.push(segment);
            }
        }

        debug!(
            source = SOURCE,
            pnr = %ticket.pnr,
            segments = ticket.flights.len(),
            "parsed document"
        );
        ticket
    }
}
