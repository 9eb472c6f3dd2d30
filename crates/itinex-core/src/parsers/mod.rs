//! Base parser contract and shared extraction helpers.
//!
//! Every issuing-system parser implements [`TicketParser`]; the helpers in
//! this module (multi-pattern search, block splitting, carrier-line walks)
//! are shared by all of them and are not overridable.

pub mod amadeus;
pub mod galileo;
pub mod kiu;
pub mod sabre;
pub mod sirena;
pub mod worldspan;

use regex::Regex;
use tracing::debug;

use crate::models::config::FormatOverride;
use crate::models::ticket::NormalizedTicket;
use crate::normalize::patterns::{CITY_PAIR, DATE_LIKE, FLIGHT_ANCHOR, HTML_TAG};
use crate::normalize::CarrierCatalog;

pub use amadeus::AmadeusParser;
pub use galileo::GalileoParser;
pub use kiu::KiuParser;
pub use sabre::SabreParser;
pub use sirena::SirenaParser;
pub use worldspan::WorldspanParser;

/// A parser for one issuing system's document family.
pub trait TicketParser: Send + Sync {
    /// Tag written into [`NormalizedTicket::source_system`].
    fn source_system(&self) -> &'static str;

    /// Cheap, side-effect-free probe for the format's marker phrases.
    /// False positives are tolerated; `parse` degrades gracefully.
    fn can_parse(&self, text: &str) -> bool;

    /// Full extraction. Never fails: any field that cannot be resolved is
    /// left at its sentinel/null value and extraction continues.
    fn parse(&self, text: &str, html_text: &str) -> NormalizedTicket;
}

/// The phrases that identify a format and delimit its segment blocks.
///
/// Defaults live in each parser's constructor; deployments override them
/// through `ExtractionConfig::format_overrides` without code changes.
#[derive(Debug, Clone)]
pub struct FormatProfile {
    /// Phrases that must all be present for `can_parse` to accept.
    pub markers: Vec<String>,
    /// Phrases that open a new segment block.
    pub segment_delimiters: Vec<String>,
}

impl FormatProfile {
    pub fn new(markers: &[&str], segment_delimiters: &[&str]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_string()).collect(),
            segment_delimiters: segment_delimiters.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Substring probe: all marker phrases present.
    pub fn matches(&self, text: &str) -> bool {
        !self.markers.is_empty() && self.markers.iter().all(|m| text.contains(m.as_str()))
    }

    /// Replace defaults with non-empty override lists.
    pub fn apply_override(&mut self, over: &FormatOverride) {
        if !over.markers.is_empty() {
            self.markers = over.markers.clone();
        }
        if !over.segment_delimiters.is_empty() {
            self.segment_delimiters = over.segment_delimiters.clone();
        }
    }
}

/// Try an ordered list of patterns; the first capture group of the first
/// match wins (whole match when the pattern has no group).
pub fn try_patterns(text: &str, patterns: &[&Regex]) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            let matched = caps
                .get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().trim().to_string());
            if let Some(value) = matched.filter(|v| !v.is_empty()) {
                return Some(value);
            }
        }
    }
    None
}

/// [`try_patterns`] with a default for the miss case.
pub fn try_patterns_or(text: &str, patterns: &[&Regex], default: &str) -> String {
    try_patterns(text, patterns).unwrap_or_else(|| default.to_string())
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn clean_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a document into segment blocks on the given delimiter phrases.
///
/// Each block runs from one delimiter occurrence to the next. Text before
/// the first delimiter is header material and is not returned. No
/// delimiter in the text means no blocks.
pub fn split_blocks<'a>(text: &'a str, delimiters: &[String]) -> Vec<&'a str> {
    let mut starts: Vec<usize> = Vec::new();
    for delimiter in delimiters {
        if delimiter.is_empty() {
            continue;
        }
        let mut from = 0;
        while let Some(pos) = text[from..].find(delimiter.as_str()) {
            starts.push(from + pos);
            from += pos + delimiter.len();
        }
    }
    starts.sort_unstable();
    starts.dedup();

    let mut blocks = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        blocks.push(&text[start..end]);
    }
    blocks
}

/// Find the flight-number anchor of a block: 2-letter code plus 1-4 digits,
/// skipping denylisted two-letter words.
pub fn find_flight_anchor(block: &str, catalog: &CarrierCatalog) -> Option<(String, String)> {
    for caps in FLIGHT_ANCHOR.captures_iter(block) {
        let code = caps[1].to_string();
        if catalog.is_excluded(&code) {
            continue;
        }
        return Some((code.clone(), format!("{}{}", code, &caps[2])));
    }
    None
}

/// Reconstruct a possibly multi-line carrier name from the lines above an
/// anchor.
///
/// Walks backward at most `max_back` lines, stopping at lines that look
/// like dates, city pairs, labeled fields, or block delimiters, and returns
/// the collected lines in reading order.
pub fn carrier_name_above(
    lines: &[&str],
    anchor_idx: usize,
    max_back: usize,
    stop_phrases: &[String],
) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();

    for line in lines[..anchor_idx].iter().rev().take(max_back) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if collected.is_empty() {
                continue;
            }
            break;
        }
        if DATE_LIKE.is_match(trimmed) || CITY_PAIR.is_match(trimmed) || trimmed.contains(':') {
            break;
        }
        if stop_phrases.iter().any(|p| !p.is_empty() && trimmed.contains(p.as_str())) {
            break;
        }
        if !trimmed.chars().any(|c| c.is_alphabetic()) {
            break;
        }
        collected.push(trimmed);
    }

    if collected.is_empty() {
        debug!("no carrier name lines above anchor");
        return None;
    }

    collected.reverse();
    Some(collected.join(" "))
}

/// Drop a trailing courtesy title from a passenger name token.
pub fn strip_passenger_title(name: &str) -> String {
    const TITLES: &[&str] = &["MR", "MRS", "MS", "MSTR", "MISS", "CHD", "INF"];
    let trimmed = name.trim();
    for title in TITLES {
        if let Some(stripped) = trimmed.strip_suffix(title) {
            if stripped.ends_with(char::is_whitespace) {
                return stripped.trim_end().to_string();
            }
        }
    }
    trimmed.to_string()
}

/// Plain text to run extraction over: the text variant when present, else
/// the tag-stripped HTML variant.
pub fn document_text(text: &str, html_text: &str) -> String {
    if !text.trim().is_empty() {
        return text.to_string();
    }
    strip_html_tags(html_text)
}

/// Strip markup from an HTML document variant, keeping line structure for
/// the block-oriented extractors.
pub fn strip_html_tags(html: &str) -> String {
    let with_breaks = html
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p>", "\n")
        .replace("</div>", "\n")
        .replace("</tr>", "\n");
    let stripped = HTML_TAG.replace_all(&with_breaks, " ");
    stripped
        .replace("&amp;", "&")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref LABELED: Regex = Regex::new(r"CODE\s*:\s*([A-Z0-9]+)").unwrap();
        static ref BARE: Regex = Regex::new(r"\b([A-Z]{3}\d{3})\b").unwrap();
    }

    #[test]
    fn test_try_patterns_first_win() {
        let text = "CODE: ABC123 and also XYZ789";
        let result = try_patterns(text, &[&LABELED, &BARE]);
        assert_eq!(result.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_try_patterns_falls_through() {
        let text = "only a bare XYZ789 token";
        let result = try_patterns(text, &[&LABELED, &BARE]);
        assert_eq!(result.as_deref(), Some("XYZ789"));
    }

    #[test]
    fn test_try_patterns_default() {
        assert_eq!(try_patterns_or("nothing here", &[&LABELED], "not found"), "not found");
    }

    #[test]
    fn test_clean_whitespace() {
        assert_eq!(clean_whitespace("  a \n  b\t c  "), "a b c");
    }

    #[test]
    fn test_split_blocks() {
        let text = "HEADER\nDEPARTURE: one\nbody1\nDEPARTURE: two\nbody2\n";
        let delimiters = vec!["DEPARTURE:".to_string()];
        let blocks = split_blocks(text, &delimiters);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("body1"));
        assert!(blocks[1].contains("body2"));
        assert!(!blocks[0].contains("HEADER"));
    }

    #[test]
    fn test_split_blocks_no_delimiter() {
        let blocks = split_blocks("no markers here", &[String::from("DEPARTURE:")]);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_find_flight_anchor_skips_denylist() {
        let catalog = CarrierCatalog::default();
        // "TO 123" is a preposition, not a carrier; "OB 560" is real.
        let (code, number) = find_flight_anchor("GO TO 123 THEN OB 560", &catalog).unwrap();
        assert_eq!(code, "OB");
        assert_eq!(number, "OB560");
    }

    #[test]
    fn test_carrier_name_above_multi_line() {
        let lines = vec!["08 MAY 25  07:30", "", "BOLIVIANA", "DE AVIACION", "OB 560"];
        let name = carrier_name_above(&lines, 4, 3, &[]).unwrap();
        assert_eq!(name, "BOLIVIANA DE AVIACION");
    }

    #[test]
    fn test_carrier_name_walk_stops_at_dates() {
        let lines = vec!["08 MAY 25  07:30", "AMASZONAS", "Z8 300"];
        let name = carrier_name_above(&lines, 2, 3, &[]).unwrap();
        assert_eq!(name, "AMASZONAS");
    }

    #[test]
    fn test_carrier_name_walk_stops_at_delimiter() {
        let lines = vec!["*** FLIGHT COUPON ***", "DELTA AIR LINES", "DL 104"];
        let stop = vec!["*** FLIGHT COUPON ***".to_string()];
        let name = carrier_name_above(&lines, 2, 3, &stop).unwrap();
        assert_eq!(name, "DELTA AIR LINES");
    }

    #[test]
    fn test_format_profile_matching() {
        let profile = FormatProfile::new(&["ALPHA", "BETA"], &[]);
        assert!(profile.matches("has ALPHA and BETA both"));
        assert!(!profile.matches("has only ALPHA"));
    }

    #[test]
    fn test_format_profile_override() {
        let mut profile = FormatProfile::new(&["OLD"], &["OLD DELIM"]);
        profile.apply_override(&FormatOverride {
            markers: vec!["NEW".to_string()],
            segment_delimiters: vec![],
        });
        assert_eq!(profile.markers, vec!["NEW"]);
        assert_eq!(profile.segment_delimiters, vec!["OLD DELIM"]);
    }

    #[test]
    fn test_strip_passenger_title() {
        assert_eq!(strip_passenger_title("DOE/JOHN MR"), "DOE/JOHN");
        assert_eq!(strip_passenger_title("DOE/JANE MRS"), "DOE/JANE");
        assert_eq!(strip_passenger_title("PEREZ/MARIA"), "PEREZ/MARIA");
        // No stripping when the title is part of the name itself.
        assert_eq!(strip_passenger_title("AMR/SAMIR"), "AMR/SAMIR");
    }

    #[test]
    fn test_strip_html_tags() {
        let html = "<html><body><p>BOOKING REF: XYZ789</p><br>TOTAL: EUR 100</body></html>";
        let text = strip_html_tags(html);
        assert!(text.contains("BOOKING REF: XYZ789"));
        assert!(text.contains("TOTAL: EUR 100"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_document_text_prefers_plain() {
        assert_eq!(document_text("plain", "<p>html</p>"), "plain");
        assert_eq!(document_text("  ", "<p>html</p>").trim(), "html");
    }
}
