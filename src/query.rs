//! Inbound query classification
//!
//! Users can send a place name, a `lat,lon` pair, an MGRS grid reference or
//! `help`. Only place names need the geocoder.

use crate::mgrs;

/// Reply for the `help` command
pub const HELP_TEXT: &str = "Send a location in one of these formats:\n\
- City name (e.g., London)\n\
- Latitude,Longitude (e.g., 40.71,-74.01)\n\
- MGRS coordinates (e.g., 18TWL123456)\n\
I'll respond with current weather conditions (metric and imperial units).\n\
If the location is in the US, I'll also send the latest GOES satellite image.";

/// Reply for input the bot cannot work with
pub const UNRECOGNIZED_TEXT: &str =
    "I couldn't understand that location. Type 'help' for format examples.";

/// Types of location query
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// The `help` command
    Help,
    /// Blank input
    Empty,
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// MGRS grid reference, normalized to upper case without spaces
    Mgrs(String),
    /// Free-text place name for the geocoder
    PlaceName(String),
}

/// Location parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Classify raw message text
    #[must_use]
    pub fn parse(input: &str) -> LocationQuery {
        let input = input.trim();

        if input.is_empty() {
            return LocationQuery::Empty;
        }

        if input.eq_ignore_ascii_case("help") {
            return LocationQuery::Help;
        }

        if let Some((lat, lon)) = Self::parse_coordinates(input) {
            return LocationQuery::Coordinates(lat, lon);
        }

        let compact: String = input.split_whitespace().collect();
        if mgrs::looks_like_mgrs(&compact) {
            return LocationQuery::Mgrs(compact.to_ascii_uppercase());
        }

        LocationQuery::PlaceName(input.to_string())
    }

    /// Parse coordinates from string like "46.8182,8.2275" or "46.8182 8.2275"
    fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 || !parts.iter().all(|part| Self::is_decimal(part)) {
            return None;
        }

        let lat = parts[0].parse::<f64>().ok()?;
        let lon = parts[1].parse::<f64>().ok()?;

        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
            Some((lat, lon))
        } else {
            None
        }
    }

    /// Plain decimal notation only; rejects `inf`, `NaN` and exponents
    fn is_decimal(part: &str) -> bool {
        let digits = part.strip_prefix('-').unwrap_or(part);
        !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
            && digits.chars().filter(|&c| c == '.').count() <= 1
            && digits.chars().any(|c| c.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("46.8182,8.2275", 46.8182, 8.2275)]
    #[case("46.8182 8.2275", 46.8182, 8.2275)]
    #[case("-46.8182, -8.2275", -46.8182, -8.2275)]
    #[case("  40.71,-74.01  ", 40.71, -74.01)]
    #[case("90,180", 90.0, 180.0)]
    fn test_parse_coordinates(#[case] input: &str, #[case] lat: f64, #[case] lon: f64) {
        assert_eq!(
            LocationParser::parse(input),
            LocationQuery::Coordinates(lat, lon)
        );
    }

    #[rstest]
    #[case("91.0,8.0")]
    #[case("-91.0,8.0")]
    #[case("46.0,181.0")]
    #[case("46.0,-181.0")]
    #[case("46.0")]
    #[case("46.0,8.0,0.0")]
    #[case("inf,0")]
    fn test_invalid_coordinates_become_place_names(#[case] input: &str) {
        assert!(matches!(
            LocationParser::parse(input),
            LocationQuery::PlaceName(_)
        ));
    }

    #[rstest]
    #[case("18TWL123456", "18TWL123456")]
    #[case("18twl 12345 67890", "18TWL1234567890")]
    #[case("4QFJ12345678", "4QFJ12345678")]
    fn test_parse_mgrs(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            LocationParser::parse(input),
            LocationQuery::Mgrs(expected.to_string())
        );
    }

    #[rstest]
    #[case("Paris")]
    #[case("New York City")]
    #[case("Chamonix-Mont-Blanc")]
    #[case("Zzzzqqqq")]
    fn test_parse_names(#[case] input: &str) {
        assert_eq!(
            LocationParser::parse(input),
            LocationQuery::PlaceName(input.to_string())
        );
    }

    #[rstest]
    #[case("help")]
    #[case("HELP")]
    #[case("  Help ")]
    fn test_parse_help(#[case] input: &str) {
        assert_eq!(LocationParser::parse(input), LocationQuery::Help);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(LocationParser::parse("   "), LocationQuery::Empty);
        assert_eq!(LocationParser::parse(""), LocationQuery::Empty);
    }
}
