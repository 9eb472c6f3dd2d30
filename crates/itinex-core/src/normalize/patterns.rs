//! Common regex patterns shared by the normalizers and parsers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Currency token: 3-letter code followed by an amount, with or without
    // whitespace, commas as thousands separators.
    pub static ref CURRENCY_AMOUNT: Regex = Regex::new(
        r"^\s*([A-Z]{3})\s*([0-9][0-9.,]*)\s*$"
    ).unwrap();

    // Flight designator anchor: 2-letter carrier code plus 1-4 digits.
    pub static ref FLIGHT_ANCHOR: Regex = Regex::new(
        r"\b([A-Z][A-Z0-9])\s?(\d{1,4})\b"
    ).unwrap();

    // Time of day, 24h clock.
    pub static ref TIME_HM: Regex = Regex::new(
        r"\b([01]?\d|2[0-3]):([0-5]\d)\b"
    ).unwrap();

    // A line that looks like it carries a date, in any of the layouts the
    // supported formats print. Used to stop the carrier-name backward walk.
    pub static ref DATE_LIKE: Regex = Regex::new(
        r"(?i)\b\d{1,2}\s?[a-z]{3,4}\.?\s?\d{2,4}\b|\b\d{4}-\d{2}-\d{2}\b|\b\d{1,2}[./]\d{1,2}[./]\d{2,4}\b"
    ).unwrap();

    // Two-column city pair: `CITY[, COUNTRY]   CITY[, COUNTRY]` separated by
    // at least two spaces.
    pub static ref CITY_PAIR: Regex = Regex::new(
        r"(?m)^\s*([A-Z][A-Z .'-]*[A-Z])(?:,\s*([A-Z][A-Z .'-]*[A-Z]))?\s{2,}([A-Z][A-Z .'-]*[A-Z])(?:,\s*([A-Z][A-Z .'-]*[A-Z]))?\s*$"
    ).unwrap();

    // Reservation code candidate.
    pub static ref PNR_TOKEN: Regex = Regex::new(
        r"\b([A-Z0-9]{5,7})\b"
    ).unwrap();

    // Markup stripping for the HTML variant of a document.
    pub static ref HTML_TAG: Regex = Regex::new(
        r"(?s)<[^>]*>"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_anchor() {
        let caps = FLIGHT_ANCHOR.captures("OB 560").unwrap();
        assert_eq!(&caps[1], "OB");
        assert_eq!(&caps[2], "560");

        let caps = FLIGHT_ANCHOR.captures("FLIGHT Z8300 CONFIRMED").unwrap();
        assert_eq!(&caps[1], "Z8");
        assert_eq!(&caps[2], "300");

        assert!(FLIGHT_ANCHOR.captures("no designator here").is_none());
    }

    #[test]
    fn test_date_like_probe() {
        assert!(DATE_LIKE.is_match("08 MAY 25  07:30"));
        assert!(DATE_LIKE.is_match("2025-05-08"));
        assert!(DATE_LIKE.is_match("15.01.2024"));
        assert!(DATE_LIKE.is_match("08MAY25"));
        assert!(!DATE_LIKE.is_match("BOLIVIANA DE AVIACION"));
    }

    #[test]
    fn test_city_pair() {
        let caps = CITY_PAIR
            .captures("  LA PAZ, BOLIVIA      SANTA CRUZ, BOLIVIA")
            .unwrap();
        assert_eq!(&caps[1], "LA PAZ");
        assert_eq!(&caps[2], "BOLIVIA");
        assert_eq!(&caps[3], "SANTA CRUZ");
        assert_eq!(&caps[4], "BOLIVIA");

        let caps = CITY_PAIR.captures("MIAMI      NEW YORK").unwrap();
        assert_eq!(&caps[1], "MIAMI");
        assert!(caps.get(2).is_none());
        assert_eq!(&caps[3], "NEW YORK");
    }
}
