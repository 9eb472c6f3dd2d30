//! Date and time normalization.

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;

/// Localized three-letter month abbreviations mapped to the canonical
/// English set chrono understands. Spanish and Portuguese forms, which the
/// supported reservation systems emit, plus the long English September.
const MONTH_TRANSLATIONS: &[(&str, &str)] = &[
    ("ene", "jan"),
    ("abr", "apr"),
    ("ago", "aug"),
    ("dic", "dec"),
    ("fev", "feb"),
    ("mai", "may"),
    ("set", "sep"),
    ("out", "oct"),
    ("dez", "dec"),
    ("sept", "sep"),
];

/// Date layouts attempted in order; first successful parse wins.
///
/// Two-digit-year layouts come first: `%y` rejects four-digit years as
/// trailing input, while `%Y` happily reads "25" as the year 25.
const DATE_FORMATS: &[&str] = &[
    "%d %b %y",
    "%d %b %Y",
    "%d%b%y",
    "%d%b%Y",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
];

/// Time layouts attempted in order.
const TIME_FORMATS: &[&str] = &["%H:%M", "%H%M", "%I:%M %p"];

/// Normalize a raw date token to ISO `YYYY-MM-DD`.
///
/// Accepts tokens like `"08 may 25"`, `"08 May 2025"`, `"08MAY25"`, and
/// `"2025-05-08"`, including Spanish/Portuguese month abbreviations. On
/// total failure the original token is returned unchanged; this never
/// fails.
pub fn normalize_date(raw: &str) -> String {
    let cleaned = translate_months(&collapse_spaces(raw.trim()));

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    debug!(token = raw, "date token did not match any known layout");
    raw.to_string()
}

/// Parse a raw time token to `HH:MM`, or `None` if it is not a time.
pub fn normalize_time(raw: &str) -> Option<String> {
    let cleaned = raw.trim().to_uppercase();

    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(&cleaned, format) {
            return Some(time.format("%H:%M").to_string());
        }
    }

    None
}

/// Infer the arrival date of a segment that only states times.
///
/// If the arrival time-of-day is strictly earlier than the departure
/// time-of-day the flight lands the next day; otherwise it lands on the
/// departure date. Returns `None` when the date or either time cannot be
/// parsed.
pub fn infer_arrival_date(
    departure_date: &str,
    departure_time: &str,
    arrival_time: &str,
) -> Option<String> {
    let date = NaiveDate::parse_from_str(&normalize_date(departure_date), "%Y-%m-%d").ok()?;
    let dep = parse_time(departure_time)?;
    let arr = parse_time(arrival_time)?;

    let arrival = if arr < dep {
        date + Duration::days(1)
    } else {
        date
    };

    Some(arrival.format("%Y-%m-%d").to_string())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let cleaned = raw.trim().to_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&cleaned, format).ok())
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn translate_months(s: &str) -> String {
    let mut lowered = s.to_lowercase();
    for (foreign, english) in MONTH_TRANSLATIONS {
        if let Some(pos) = lowered.find(foreign) {
            // Replace only when the abbreviation is not embedded in a longer
            // alphabetic run ("mai" inside "maintains" must not translate).
            let before_ok = pos == 0
                || !lowered[..pos]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_alphabetic());
            let after = &lowered[pos + foreign.len()..];
            let after_ok = !after.chars().next().is_some_and(|c| c.is_alphabetic());
            if before_ok && after_ok {
                lowered.replace_range(pos..pos + foreign.len(), english);
            }
        }
    }
    lowered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_common_layouts() {
        assert_eq!(normalize_date("08 may 25"), "2025-05-08");
        assert_eq!(normalize_date("08 May 2025"), "2025-05-08");
        assert_eq!(normalize_date("2025-05-08"), "2025-05-08");
        assert_eq!(normalize_date("08MAY25"), "2025-05-08");
        assert_eq!(normalize_date("15/01/2024"), "2024-01-15");
        assert_eq!(normalize_date("15.01.2024"), "2024-01-15");
    }

    #[test]
    fn test_normalize_localized_months() {
        assert_eq!(normalize_date("05 ago 25"), "2025-08-05");
        assert_eq!(normalize_date("12 dic 2024"), "2024-12-12");
        assert_eq!(normalize_date("03 fev 25"), "2025-02-03");
        assert_eq!(normalize_date("20 out 2025"), "2025-10-20");
        assert_eq!(normalize_date("01 ene 26"), "2026-01-01");
    }

    #[test]
    fn test_unparseable_returned_unchanged() {
        assert_eq!(normalize_date("XX-YY-ZZ"), "XX-YY-ZZ");
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("not a date"), "not a date");
    }

    #[test]
    fn test_normalize_time() {
        assert_eq!(normalize_time("07:30").as_deref(), Some("07:30"));
        assert_eq!(normalize_time("0730").as_deref(), Some("07:30"));
        assert_eq!(normalize_time("11:45 PM").as_deref(), Some("23:45"));
        assert_eq!(normalize_time("garbage"), None);
    }

    #[test]
    fn test_overnight_arrival_inference() {
        assert_eq!(
            infer_arrival_date("01 Jan 25", "23:30", "06:15").as_deref(),
            Some("2025-01-02")
        );
    }

    #[test]
    fn test_same_day_arrival_inference() {
        assert_eq!(
            infer_arrival_date("01 Jan 25", "07:30", "08:25").as_deref(),
            Some("2025-01-01")
        );
        // Equal times stay on the departure date.
        assert_eq!(
            infer_arrival_date("01 Jan 25", "10:00", "10:00").as_deref(),
            Some("2025-01-01")
        );
    }

    #[test]
    fn test_inference_fails_gracefully() {
        assert_eq!(infer_arrival_date("not a date", "23:30", "06:15"), None);
        assert_eq!(infer_arrival_date("01 Jan 25", "bogus", "06:15"), None);
    }
}
