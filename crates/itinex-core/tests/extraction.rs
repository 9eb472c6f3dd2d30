//! End-to-end extraction over representative documents of every supported
//! issuing system.

use itinex_ai::ScriptedBackend;
use itinex_core::{EngineConfig, EngineError, ExtractionEngine, Tier, NOT_FOUND};

const SABRE: &str = "\
ELECTRONIC TICKET RECEIPT

PREPARED FOR
DOE/JOHN MR
RESERVATION CODE          ABC123
TICKET NUMBER             0452345678901
ISSUE DATE                08 May 25
ISSUING AGENT             SKYWAYS TRAVEL
IATA NUMBER               12345675

DEPARTURE: THURSDAY 08 MAY
BOLIVIANA
DE AVIACION
OB 560                    CABIN: ECONOMY
LA PAZ, BOLIVIA           SANTA CRUZ, BOLIVIA
08 MAY 25  07:30          08 MAY 25  08:25
BAGGAGE ALLOWANCE: 23K

DEPARTURE: SUNDAY 18 MAY
BOLIVIANA
DE AVIACION
OB 561                    CABIN: ECONOMY
SANTA CRUZ, BOLIVIA       LA PAZ, BOLIVIA
18 MAY 25  19:40          18 MAY 25  20:35
BAGGAGE ALLOWANCE: 23K

FARE             USD 180.00
TOTAL            USD 235.40
";

const AMADEUS: &str = "\
ELECTRONIC TICKET ITINERARY RECEIPT
BOOKING REF: XYZ789
TICKET NUMBER: 074-2345678901
PASSENGER: DOE/JANE MRS
ISSUE DATE: 12 Jun 2025

FLIGHT AF 447 - AIR FRANCE
DEPARTURE: SAO PAULO GUARULHOS, BRAZIL - 12 JUN 2025 18:05 - TERMINAL 3
ARRIVAL: PARIS CHARLES DE GAULLE, FRANCE - 13 JUN 2025 10:35 - TERMINAL 2E
CLASS: BUSINESS

FARE: EUR 1,250.00
TOTAL: EUR 1,498.35
";

const KIU: &str = "\
BOLETO ELECTRONICO / ELECTRONIC TICKET
SISTEMA KIU
CODIGO DE RESERVA: MNPQ23
PASAJERO: PEREZ/MARIA
FECHA DE EMISION: 05 ago 25

VUELO: Z8 300
AMASZONAS
ORIGEN: LA PAZ, BOLIVIA
SALIDA: 05 ago 25 09:15
DESTINO: UYUNI, BOLIVIA
LLEGADA: 05 ago 25 10:20

TARIFA: BOB 850.00
TOTAL: BOB 1,020.50
";

const GALILEO: &str = "\
E-TICKET RECEIPT                             GALILEO
REF: QWERT5
NAME: SMITH/ROBERT MR
TKT: 1572345678904   ISSUED: 2025-07-02

FLT UA 901
CLASS Y ECONOMY
LONDON HEATHROW GB  TO  NEW YORK JFK US
DEP 02 JUL 25 22:50 TERMINAL 2
ARR 05:40 TERMINAL 7
";

const WORLDSPAN: &str = "\
WORLDSPAN E-TICKET RECEIPT
PNR: WSP12Q
PASSENGER NAME: BROWN/ALICE MS
DATE OF ISSUE: 20 Sep 25

*** FLIGHT COUPON ***
DELTA AIR LINES
DL 104
FROM: ATLANTA, UNITED STATES
TO: LIMA, PERU
DEPARTS: 20 SEP 25 21:55
ARRIVES: 03:40
";

const SIRENA: &str = "\
SIRENA-TRAVEL E-TICKET
RECORD LOCATOR: SRN9KL
PASSENGER: IVANOV/PETR
ISSUED: 14.03.2025

FLIGHT SEGMENT
AEROFLOT
SU 1480
MOSCOW SVO, RUSSIA        SOCHI, RUSSIA
DEP 14.03.2025 08:30  ARR 14.03.2025 12:05
";

fn engine() -> ExtractionEngine {
    ExtractionEngine::regex_only(EngineConfig::default())
}

#[test]
fn sabre_fixture_yields_expected_literals() {
    let extraction = engine().extract(SABRE, "").unwrap();
    assert_eq!(extraction.tier, Tier::Registry);

    let ticket = &extraction.ticket;
    assert_eq!(ticket.source_system, "sabre");
    assert_eq!(ticket.pnr, "ABC123");
    assert_eq!(ticket.passenger.name, "DOE/JOHN");
    assert_eq!(ticket.flights.len(), 2);
    assert_eq!(ticket.flights[0].flight_number, "OB560");
    assert_eq!(ticket.flights[1].flight_number, "OB561");
    assert_eq!(ticket.issue_date, "2025-05-08");
}

#[test]
fn each_format_dispatches_to_its_parser() {
    let cases = [
        (SABRE, "sabre", "ABC123"),
        (AMADEUS, "amadeus", "XYZ789"),
        (KIU, "kiu", "MNPQ23"),
        (GALILEO, "galileo", "QWERT5"),
        (WORLDSPAN, "worldspan", "WSP12Q"),
        (SIRENA, "sirena", "SRN9KL"),
    ];

    let engine = engine();
    for (doc, source, pnr) in cases {
        let extraction = engine.extract(doc, "").unwrap();
        assert_eq!(extraction.ticket.source_system, source);
        assert_eq!(extraction.ticket.pnr, pnr);
        assert!(
            !extraction.ticket.flights.is_empty(),
            "{source} fixture produced no segments"
        );
    }
}

#[test]
fn overnight_legs_get_inferred_arrival_dates() {
    let engine = engine();

    let galileo = engine.extract(GALILEO, "").unwrap().ticket;
    assert_eq!(galileo.flights[0].departure_date.as_deref(), Some("2025-07-02"));
    assert_eq!(galileo.flights[0].arrival_date.as_deref(), Some("2025-07-03"));

    let worldspan = engine.extract(WORLDSPAN, "").unwrap().ticket;
    assert_eq!(worldspan.flights[0].arrival_date.as_deref(), Some("2025-09-21"));
}

#[test]
fn empty_input_fails_with_no_content() {
    let err = engine().extract("", "").unwrap_err();
    assert_eq!(err.to_string(), "no content");
}

#[test]
fn unknown_format_fails_with_no_parser_matched() {
    let err = engine().extract("Dear customer, thanks for your order.", "").unwrap_err();
    assert!(matches!(err, EngineError::NoParserMatched));
}

#[test]
fn failing_ai_tier_falls_back_and_tags_registry() {
    let engine =
        ExtractionEngine::with_backend(EngineConfig::default(), Box::new(ScriptedBackend::failing()));
    let extraction = engine.extract(SABRE, "").unwrap();
    assert_eq!(extraction.tier, Tier::Registry);
    assert_eq!(extraction.ticket.pnr, "ABC123");
}

#[test]
fn ai_tier_success_is_tagged_ai() {
    let response = r#"{"pnr": "ABC123", "passenger": {"name": "DOE/JOHN"}}"#;
    let engine = ExtractionEngine::with_backend(
        EngineConfig::default(),
        Box::new(ScriptedBackend::replying(response)),
    );
    let extraction = engine.extract(SABRE, "").unwrap();
    assert_eq!(extraction.tier, Tier::Ai);
    assert_eq!(extraction.ticket.source_system, "ai");
}

#[test]
fn parsing_is_idempotent_across_formats() {
    let engine = engine();
    for doc in [SABRE, AMADEUS, KIU, GALILEO, WORLDSPAN, SIRENA] {
        let first = serde_json::to_string(&engine.extract(doc, "").unwrap().ticket).unwrap();
        let second = serde_json::to_string(&engine.extract(doc, "").unwrap().ticket).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn absent_fields_serialize_as_sentinels_not_omissions() {
    let extraction = engine().extract(GALILEO, "").unwrap();
    let json = serde_json::to_value(&extraction.ticket).unwrap();

    // Galileo fixture carries no fares or agency details.
    assert!(json["fares"]["currency"].is_null());
    assert!(json["agency"]["name"].is_null());
    assert_eq!(json["flights"][0]["baggage"], serde_json::Value::Null);
    assert_ne!(json["pnr"], NOT_FOUND);
}
