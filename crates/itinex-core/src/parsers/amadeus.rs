//! Parser for Amadeus-style itinerary receipts.
//!
//! Amadeus receipts carry `label: value` header lines and one `FLIGHT`
//! block per leg with the carrier name inline after the designator and
//! explicit `DEPARTURE:`/`ARRIVAL:` lines holding city, date, time, and
//! terminal.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::ticket::{FlightSegment, Location, NormalizedTicket, NOT_FOUND};
use crate::normalize::{normalize_carrier, normalize_date, normalize_time, split_currency_amount, CarrierCatalog};

use super::{
    document_text, find_flight_anchor, split_blocks, strip_passenger_title, try_patterns,
    try_patterns_or, FormatProfile, TicketParser,
};

const SOURCE: &str = "amadeus";

lazy_static! {
    static ref PNR: Regex = Regex::new(
        r"(?m)^BOOKING REF:\s*([A-Z0-9]{5,7})\b"
    ).unwrap();

    static ref TICKET_NUMBER: Regex = Regex::new(
        r"(?m)^TICKET NUMBER:\s*([0-9][0-9-]{9,14})\b"
    ).unwrap();

    static ref PASSENGER: Regex = Regex::new(
        r"(?m)^PASSENGER:\s*([A-Z][A-Z /.'-]+)$"
    ).unwrap();

    static ref ISSUE_DATE: Regex = Regex::new(
        r"(?m)^ISSUE DATE:\s*(.+)$"
    ).unwrap();

    static ref AGENCY: Regex = Regex::new(
        r"(?m)^AGENCY:\s*(.+)$"
    ).unwrap();

    static ref IATA: Regex = Regex::new(
        r"(?m)^IATA:\s*([0-9]{7,8})\b"
    ).unwrap();

    static ref PHONE: Regex = Regex::new(
        r"(?m)^TELEPHONE:\s*([+0-9][0-9 ()./-]{5,})"
    ).unwrap();

    static ref FARE: Regex = Regex::new(
        r"(?m)^FARE:\s*([A-Z]{3}\s?[0-9][0-9.,]*)"
    ).unwrap();

    static ref TOTAL: Regex = Regex::new(
        r"(?m)^TOTAL:\s*([A-Z]{3}\s?[0-9][0-9.,]*)"
    ).unwrap();

    // Carrier name printed inline after the designator. Single-space word
    // runs only, so trailing column gaps do not bleed into the name.
    static ref INLINE_CARRIER: Regex = Regex::new(
        r"FLIGHT\s+[A-Z][A-Z0-9]\s?\d{1,4}\s*-\s*((?:[A-Z]+ )*[A-Z]+)"
    ).unwrap();

    static ref OPERATED_BY: Regex = Regex::new(
        r"OPERATED BY:\s*((?:[A-Z]+ )*[A-Z]+)"
    ).unwrap();

    static ref DEPARTURE_LINE: Regex = Regex::new(
        r"(?m)^DEPARTURE:\s*([A-Z][A-Z .'-]*?)(?:,\s*([A-Z][A-Z .'-]*?))?\s+-\s+(\d{1,2} [A-Z]{3} \d{4})\s+(\d{1,2}:\d{2})(?:\s+-\s+TERMINAL\s+([A-Z0-9]+))?\s*$"
    ).unwrap();

    static ref ARRIVAL_LINE: Regex = Regex::new(
        r"(?m)^ARRIVAL:\s*([A-Z][A-Z .'-]*?)(?:,\s*([A-Z][A-Z .'-]*?))?\s+-\s+(\d{1,2} [A-Z]{3} \d{4})\s+(\d{1,2}:\d{2})(?:\s+-\s+TERMINAL\s+([A-Z0-9]+))?\s*$"
    ).unwrap();

    static ref CABIN: Regex = Regex::new(
        r"CLASS:\s*([A-Z][A-Za-z ]*[A-Za-z])"
    ).unwrap();

    static ref BAGGAGE: Regex = Regex::new(
        r"BAGGAGE:\s*([0-9]{1,2}\s?(?:KG|K|PC|P)\b)"
    ).unwrap();

    static ref AIRLINE_PNR: Regex = Regex::new(
        r"AIRLINE BOOKING REF:\s*([A-Z0-9]{5,7})\b"
    ).unwrap();
}

/// Parser for the Amadeus receipt family.
pub struct AmadeusParser {
    profile: FormatProfile,
    catalog: CarrierCatalog,
}

impl AmadeusParser {
    pub fn new(config: &ExtractionConfig, catalog: CarrierCatalog) -> Self {
        let mut profile = FormatProfile::new(
            &["ITINERARY RECEIPT", "BOOKING REF"],
            &["FLIGHT "],
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

        let raw_carrier = try_patterns(block, &[&INLINE_CARRIER]).unwrap_or_default();
        let carrier = normalize_carrier(&raw_carrier, Some(&flight_number), &self.catalog);

        let mut segment = FlightSegment {
            carrier,
            flight_number,
            ..FlightSegment::default()
        };

        if let Some(caps) = DEPARTURE_LINE.captures(block) {
            segment.origin = Some(Location::from_city_country(
                &caps[1],
                caps.get(2).map(|m| m.as_str()),
            ));
            segment.departure_date = Some(normalize_date(&caps[3]));
            segment.departure_time = normalize_time(&caps[4]);
            segment.terminal = caps.get(5).map(|m| m.as_str().to_string());
        }

        if let Some(caps) = ARRIVAL_LINE.captures(block) {
            segment.destination = Some(Location::from_city_country(
                &caps[1],
                caps.get(2).map(|m| m.as_str()),
            ));
            segment.arrival_date = Some(normalize_date(&caps[3]));
            segment.arrival_time = normalize_time(&caps[4]);
        }

        segment.cabin = try_patterns(block, &[&CABIN]);
        segment.baggage = try_patterns(block, &[&BAGGAGE]);
        segment.airline_pnr = try_patterns(block, &[&AIRLINE_PNR]);

        if segment.departure_date.is_none() {
            debug!(source = SOURCE, "segment block without departure date dropped");
            return None;
        }

        Some(segment)
    }
}

impl TicketParser for AmadeusParser {
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

        ticket.agency.name = try_patterns(&text, &[&AGENCY]);
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

        if let Some(operated_by) = try_patterns(&text, &[&OPERATED_BY]) {
            ticket.raw_data.insert("operated_by".to_string(), operated_by);
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
