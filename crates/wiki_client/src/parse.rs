//! Free-text population parsing.
//!
//! Both lookup strategies funnel their candidate strings through
//! [`parse_population_text`]; the summary strategy first narrows the page
//! extract down to the phrase after "population of".

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading number with optional decimal part and million/billion suffix.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([0-9]+(?:\.[0-9]+)?)\s*(million|billion)?").expect("valid number regex")
});

/// "population of", optional qualifier word, then the figure.
static POPULATION_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)population of(?:\s+(?:over|approximately|about|around))?\s+([0-9][0-9,.]*(?:\s*(?:million|billion))?)",
    )
    .expect("valid population phrase regex")
});

/// Parse a free-text population figure.
///
/// Thousands separators are stripped, a `million`/`billion` suffix scales
/// the number, otherwise the leading numeric run is taken as an integer.
/// Returns `None` (never zero, never an error) when nothing parses.
pub fn parse_population_text(raw: &str) -> Option<u64> {
    let cleaned = raw.trim().replace(',', "");
    let caps = NUMBER_RE.captures(&cleaned)?;

    let number: f64 = caps[1].parse().ok()?;
    let value = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(unit) if unit == "million" => number * 1_000_000.0,
        Some(unit) if unit == "billion" => number * 1_000_000_000.0,
        _ => number.trunc(),
    };

    if value >= 1.0 {
        Some(value as u64)
    } else {
        None
    }
}

/// Find the first parsable "population of …" figure in a page extract.
pub fn population_from_extract(extract: &str) -> Option<u64> {
    POPULATION_PHRASE_RE
        .captures_iter(extract)
        .find_map(|caps| parse_population_text(caps.get(1)?.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_million_suffix() {
        assert_eq!(parse_population_text("1.6 million"), Some(1_600_000));
    }

    #[test]
    fn parses_billion_suffix() {
        assert_eq!(parse_population_text("2.3 billion"), Some(2_300_000_000));
    }

    #[test]
    fn parses_thousands_separators() {
        assert_eq!(parse_population_text("1,234,567"), Some(1_234_567));
    }

    #[test]
    fn parses_plain_integer_with_trailing_text() {
        assert_eq!(parse_population_text("644431 (2023 census)"), Some(644_431));
    }

    #[test]
    fn unparsable_text_is_none() {
        assert_eq!(parse_population_text("unknown"), None);
        assert_eq!(parse_population_text(""), None);
        assert_eq!(parse_population_text("approximately"), None);
    }

    #[test]
    fn extract_phrase_with_qualifier() {
        let text = "Helsinki is the capital of Finland. It has a population of over 1.6 million \
                    in the metropolitan area.";
        assert_eq!(population_from_extract(text), Some(1_600_000));
    }

    #[test]
    fn extract_phrase_plain_number() {
        let text = "The city proper has a population of 674,963 and covers a wide area.";
        assert_eq!(population_from_extract(text), Some(674_963));
    }

    #[test]
    fn extract_without_phrase_is_none() {
        assert_eq!(population_from_extract("A city by the sea."), None);
    }

    #[test]
    fn first_parsable_candidate_wins() {
        let text = "It grew to a population of about 1.2 million, up from a population of 900,000.";
        assert_eq!(population_from_extract(text), Some(1_200_000));
    }
}
