//! Parser for Worldspan-style ticket receipts.
//!
//! Worldspan receipts delimit legs with a repeated `*** FLIGHT COUPON ***`
//! banner, print the carrier name on its own line above the designator, and
//! state arrivals as a bare time (`ARRIVES: 03:40`), leaving the date to
//! the overnight inference.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::ticket::{FlightSegment, Location, NormalizedTicket, NOT_FOUND};
use crate::normalize::{infer_arrival_date, normalize_carrier, normalize_date, normalize_time, split_currency_amount, CarrierCatalog};

use super::{
    carrier_name_above, document_text, find_flight_anchor, split_blocks, strip_passenger_title,
    try_patterns, try_patterns_or, FormatProfile, TicketParser,
};

const SOURCE: &str = "worldspan";

lazy_static! {
    static ref PNR: Regex = Regex::new(
        r"(?m)^PNR:\s*([A-Z0-9]{5,7})\b"
    ).unwrap();

    static ref TICKET_NUMBER: Regex = Regex::new(
        r"(?m)^TICKET:\s*([0-9]{10,14})\b"
    ).unwrap();

    static ref PASSENGER: Regex = Regex::new(
        r"(?m)^PASSENGER NAME:\s*([A-Z][A-Z /.'-]+)$"
    ).unwrap();

    static ref ISSUE_DATE: Regex = Regex::new(
        r"(?m)^DATE OF ISSUE:\s*(.+)$"
    ).unwrap();

    static ref AGENCY: Regex = Regex::new(
        r"(?m)^ISSUED BY:\s*(.+)$"
    ).unwrap();

    static ref IATA: Regex = Regex::new(
        r"(?m)^ARC/IATA:\s*([0-9]{7,8})\b"
    ).unwrap();

    static ref PHONE: Regex = Regex::new(
        r"(?m)^CONTACT:\s*([+0-9][0-9 ()./-]{5,})"
    ).unwrap();

    static ref FARE: Regex = Regex::new(
        r"(?m)^FARE AMOUNT:\s*([A-Z]{3}\s?[0-9][0-9.,]*)"
    ).unwrap();

    static ref TOTAL: Regex = Regex::new(
        r"(?m)^TOTAL AMOUNT:\s*([A-Z]{3}\s?[0-9][0-9.,]*)"
    ).unwrap();

    static ref FROM: Regex = Regex::new(
        r"(?m)^FROM:\s*([A-Z][A-Z .'-]*?)(?:,\s*([A-Z][A-Z .'-]+?))?\s*$"
    ).unwrap();

    static ref TO: Regex = Regex::new(
        r"(?m)^TO:\s*([A-Z][A-Z .'-]*?)(?:,\s*([A-Z][A-Z .'-]+?))?\s*$"
    ).unwrap();

    static ref DEPARTS: Regex = Regex::new(
        r"(?m)^DEPARTS:\s*(\d{1,2} [A-Z]{3} \d{2,4})\s+(\d{1,2}:\d{2})"
    ).unwrap();

    static ref ARRIVES: Regex = Regex::new(
        r"(?m)^ARRIVES:\s*(?:(\d{1,2} [A-Z]{3} \d{2,4})\s+)?(\d{1,2}:\d{2})"
    ).unwrap();

    static ref CABIN: Regex = Regex::new(
        r"(?m)^CLASS:\s*([A-Z][A-Za-z ]*[A-Za-z])"
    ).unwrap();

    static ref BAGGAGE: Regex = Regex::new(
        r"(?m)^BAGGAGE:\s*([0-9]{1,2}\s?(?:KG|K|PC|P)\b)"
    ).unwrap();
}

/// Parser for the Worldspan receipt family.
pub struct WorldspanParser {
    profile: FormatProfile,
    catalog: CarrierCatalog,
    max_carrier_lookback: usize,
}

impl WorldspanParser {
    pub fn new(config: &ExtractionConfig, catalog: CarrierCatalog) -> Self {
        let mut profile = FormatProfile::new(
            &["WORLDSPAN"],
            &["*** FLIGHT COUPON ***"],
        );
        if let Some(over) = config.format_overrides.get(SOURCE) {
            profile.apply_override(over);
        }
        Self {
            profile,
            catalog,
            max_carrier_lookback: config.max_carrier_lookback,
        }
    }

    fn parse_segment(&self, block: &str) -> Option<FlightSegment> {
        let Some((_, flight_number)) = find_flight_anchor(block, &self.catalog) else {
            debug!(source = SOURCE, "segment block without flight designator dropped");
            return None;
        };

        let lines: Vec<&str> = block.lines().collect();
        let anchor_idx = lines
            .iter()
            .position(|l| l.replace(' ', "").contains(&flight_number))
            .unwrap_or(0);
        let raw_carrier = carrier_name_above(
            &lines,
            anchor_idx,
            self.max_carrier_lookback,
            &self.profile.segment_delimiters,
        )
        .unwrap_or_default();
        let carrier = normalize_carrier(&raw_carrier, Some(&flight_number), &self.catalog);

        let mut segment = FlightSegment {
            carrier,
            flight_number,
            ..FlightSegment::default()
        };

        if let Some(caps) = FROM.captures(block) {
            segment.origin = Some(Location::from_city_country(
                &caps[1],
                caps.get(2).map(|m| m.as_str()),
            ));
        }
        if let Some(caps) = TO.captures(block) {
            segment.destination = Some(Location::from_city_country(
                &caps[1],
                caps.get(2).map(|m| m.as_str()),
            ));
        }

        if let Some(caps) = DEPARTS.captures(block) {
            segment.departure_date = Some(normalize_date(&caps[1]));
            segment.departure_time = normalize_time(&caps[2]);
        }
        if let Some(caps) = ARRIVES.captures(block) {
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

        segment.cabin = try_patterns(block, &[&CABIN]);
        segment.baggage = try_patterns(block, &[&BAGGAGE]);

        if segment.departure_date.is_none() {
            debug!(source = SOURCE, "segment block without departure date dropped");
            return None;
        }

        Some(segment)
    }
}

impl TicketParser for WorldspanParser {
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
