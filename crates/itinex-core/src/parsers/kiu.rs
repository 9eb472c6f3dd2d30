//! Parser for KIU-style electronic tickets.
//!
//! KIU documents come out of Latin-American carriers with Spanish labels
//! (`CODIGO DE RESERVA`, `FECHA DE EMISION`, `SALIDA`/`LLEGADA`) and one
//! `VUELO:` block per leg, with the operating carrier on the line after the
//! designator.

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

const SOURCE: &str = "kiu";

lazy_static! {
    static ref PNR: Regex = Regex::new(
        r"(?m)^CODIGO DE RESERVA:\s*([A-Z0-9]{5,7})\b"
    ).unwrap();

    static ref TICKET_NUMBER: Regex = Regex::new(
        r"(?m)^BOLETO NRO:\s*([0-9]{10,14})\b"
    ).unwrap();

    static ref PASSENGER: Regex = Regex::new(
        r"(?m)^PASAJERO:\s*([A-Z][A-Z /.'-]+)$"
    ).unwrap();

    static ref ISSUE_DATE: Regex = Regex::new(
        r"(?m)^FECHA DE EMISION:\s*(.+)$"
    ).unwrap();

    static ref AGENCY: Regex = Regex::new(
        r"(?m)^AGENCIA:\s*(.+)$"
    ).unwrap();

    static ref IATA: Regex = Regex::new(
        r"(?m)^IATA:\s*([0-9]{7,8})\b"
    ).unwrap();

    static ref PHONE: Regex = Regex::new(
        r"(?m)^TELEFONO:\s*([+0-9][0-9 ()./-]{5,})"
    ).unwrap();

    static ref FARE: Regex = Regex::new(
        r"(?m)^TARIFA:\s*([A-Z]{3}\s?[0-9][0-9.,]*)"
    ).unwrap();

    static ref TOTAL: Regex = Regex::new(
        r"(?m)^TOTAL:\s*([A-Z]{3}\s?[0-9][0-9.,]*)"
    ).unwrap();

    static ref ORIGIN: Regex = Regex::new(
        r"(?m)^ORIGEN:\s*([A-Z][A-Z .'-]*?)(?:,\s*([A-Z][A-Z .'-]+?))?\s*$"
    ).unwrap();

    static ref DESTINATION: Regex = Regex::new(
        r"(?m)^DESTINO:\s*([A-Z][A-Z .'-]*?)(?:,\s*([A-Z][A-Z .'-]+?))?\s*$"
    ).unwrap();

    static ref DEPARTURE: Regex = Regex::new(
        r"(?m)^SALIDA:\s*(\d{1,2} [a-zA-Z]{3,4} \d{2,4})\s+(\d{1,2}:\d{2})"
    ).unwrap();

    static ref ARRIVAL: Regex = Regex::new(
        r"(?m)^LLEGADA:\s*(\d{1,2} [a-zA-Z]{3,4} \d{2,4})\s+(\d{1,2}:\d{2})"
    ).unwrap();

    static ref CABIN: Regex = Regex::new(
        r"(?m)^CLASE:\s*([A-Z][A-Za-z ]*[A-Za-z])"
    ).unwrap();

    static ref BAGGAGE: Regex = Regex::new(
        r"(?m)^EQUIPAJE:\s*([0-9]{1,2}\s?(?:KG|K|PC|P)\b)"
    ).unwrap();

    static ref AIRLINE_PNR: Regex = Regex::new(
        r"(?m)^CODIGO AEROLINEA:\s*([A-Z0-9]{5,7})\b"
    ).unwrap();
}

/// Parser for the KIU ticket family.
pub struct KiuParser {
    profile: FormatProfile,
    catalog: CarrierCatalog,
}

impl KiuParser {
    pub fn new(config: &ExtractionConfig, catalog: CarrierCatalog) -> Self {
        let mut profile = FormatProfile::new(
            &["BOLETO ELECTRONICO", "KIU"],
            &["VUELO:"],
        );
        if let Some(over) = config.format_overrides.get(SOURCE) {
            profile.apply_override(over);
        }
        Self { profile, catalog }
    }

    /// KIU prints the carrier on the first unlabeled line after the
    /// designator, not above it.
    fn carrier_below(&self, block: &str) -> Option<String> {
        block
            .lines()
            .skip(1)
            .map(str::trim)
            .find(|line| {
                !line.is_empty()
                    && !line.contains(':')
                    && line.chars().any(|c| c.is_alphabetic())
            })
            .map(|line| line.to_string())
    }

    fn parse_segment(&self, block: &str) -> Option<FlightSegment> {
        let Some((_, flight_number)) = find_flight_anchor(block, &self.catalog) else {
            debug!(source = SOURCE, "segment block without flight designator dropped");
            return None;
        };

        let raw_carrier = self.carrier_below(block).unwrap_or_default();
        let carrier = normalize_carrier(&raw_carrier, Some(&flight_number), &self.catalog);

        let mut segment = FlightSegment {
            carrier,
            flight_number,
            ..FlightSegment::default()
        };

        if let Some(caps) = ORIGIN.captures(block) {
            segment.origin = Some(Location::from_city_country(
                &caps[1],
                caps.get(2).map(|m| m.as_str()),
            ));
        }
        if let Some(caps) = DESTINATION.captures(block) {
            segment.destination = Some(Location::from_city_country(
                &caps[1],
                caps.get(2).map(|m| m.as_str()),
            ));
        }

        if let Some(caps) = DEPARTURE.captures(block) {
            segment.departure_date = Some(normalize_date(&caps[1]));
            segment.departure_time = normalize_time(&caps[2]);
        }
        if let Some(caps) = ARRIVAL.captures(block) {
            segment.arrival_date = Some(normalize_date(&caps[1]));
            segment.arrival_time = normalize_time(&caps[2]);
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

impl TicketParser for KiuParser {
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
