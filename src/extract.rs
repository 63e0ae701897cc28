//! Free-text location extraction.
//!
//! Users paste whatever they have at hand — a map-service share URL, a raw
//! `lat,lon` pair — and this module turns it into a [`Coordinate`]. Matchers
//! run in a fixed priority order and the first hit wins. Malformed input is
//! never an error, it is simply `None`.

use crate::geo::Coordinate;

/// Parse a free-text location input into a coordinate.
///
/// Matcher priority:
/// 1. Pin marker `!3d<lat>!4d<lng>` — an explicitly pinned point, more
///    precise than any viewport-derived value.
/// 2. Bare pair — the entire trimmed input is `<lat>,<lng>` (optional space
///    after the comma), anchored at both ends.
/// 3. Map center `@<lat>,<lng>` anywhere in the input. `place/<name>/@...`
///    URLs carry the same fragment and resolve through this matcher.
///
/// Returns `None` for empty, unmatched, or malformed input.
pub fn extract_coordinates(text: &str) -> Option<Coordinate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match_pin(text)
        .or_else(|| match_bare_pair(text))
        .or_else(|| match_map_center(text))
}

// ─── Matchers ───────────────────────────────────────────────────

/// `!3d<lat>!4d<lng>` — the pin-marker encoding embedded in map share URLs.
fn match_pin(text: &str) -> Option<Coordinate> {
    let mut search = 0;
    while let Some(off) = text[search..].find("!3d") {
        let at = search + off + 3;
        if let Some((lat, end)) = scan_decimal(text, at) {
            if text[end..].starts_with("!4d") {
                if let Some((lon, _)) = scan_decimal(text, end + 3) {
                    return Some(Coordinate::new(lat, lon));
                }
            }
        }
        // Incomplete marker; keep scanning past it.
        search = at;
    }
    None
}

/// The whole input is a `<lat>,<lng>` pair. Exactly one comma, each side a
/// signed decimal with nothing else around it.
fn match_bare_pair(text: &str) -> Option<Coordinate> {
    let (lat_part, lon_part) = text.split_once(',')?;
    let lat = parse_decimal_token(lat_part.trim())?;
    let lon = parse_decimal_token(lon_part.trim())?;
    Some(Coordinate::new(lat, lon))
}

/// `@<lat>,<lng>` — the viewport-center fragment of map URLs.
fn match_map_center(text: &str) -> Option<Coordinate> {
    let mut search = 0;
    while let Some(off) = text[search..].find('@') {
        let at = search + off + 1;
        if let Some((lat, end)) = scan_decimal(text, at) {
            if text[end..].starts_with(',') {
                if let Some((lon, _)) = scan_decimal(text, end + 1) {
                    return Some(Coordinate::new(lat, lon));
                }
            }
        }
        search = at;
    }
    None
}

// ─── Decimal scanning ───────────────────────────────────────────

/// Read a signed decimal (`-?digits(.digits)?`) starting at byte `start`.
/// Returns the value and the byte index one past it.
fn scan_decimal(text: &str, start: usize) -> Option<(f64, usize)> {
    let bytes = text.as_bytes();
    let mut i = start;

    if i < bytes.len() && bytes[i] == b'-' {
        i += 1;
    }

    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return None;
    }

    // Fractional part only counts when a digit follows the dot; a trailing
    // dot belongs to the surrounding text.
    if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }

    let value: f64 = text[start..i].parse().ok()?;
    Some((value, i))
}

/// Strict whole-token variant of [`scan_decimal`]: the entire slice must be
/// the number. Rejects exponents, `inf`, and anything `f64::from_str` would
/// otherwise accept beyond plain decimals.
fn parse_decimal_token(s: &str) -> Option<f64> {
    let (value, end) = scan_decimal(s, 0)?;
    if end == s.len() {
        Some(value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_marker() {
        let url = "https://maps.example.com/maps/place/data=!4m5!3m4!3d35.7019!4d139.9031!8m2";
        let c = extract_coordinates(url).unwrap();
        assert_eq!(c.lat, 35.7019);
        assert_eq!(c.lon, 139.9031);
    }

    #[test]
    fn test_pin_negative_coordinates() {
        let c = extract_coordinates("x!3d-33.8688!4d-70.6693y").unwrap();
        assert_eq!(c.lat, -33.8688);
        assert_eq!(c.lon, -70.6693);
    }

    #[test]
    fn test_pin_wins_over_map_center() {
        // Both encodings present — the pinned point is the one the user chose.
        let url = "https://maps.example.com/maps/@35.0,138.0,15z/data=!3d35.7019!4d139.9031";
        let c = extract_coordinates(url).unwrap();
        assert_eq!(c.lat, 35.7019);
        assert_eq!(c.lon, 139.9031);
    }

    #[test]
    fn test_incomplete_pin_falls_through_to_center() {
        let c = extract_coordinates("!3d35.7!4dxx @36.5,137.25,12z").unwrap();
        assert_eq!(c.lat, 36.5);
        assert_eq!(c.lon, 137.25);
    }

    #[test]
    fn test_bare_pair() {
        let c = extract_coordinates("35.123,139.456").unwrap();
        assert_eq!(c.lat, 35.123);
        assert_eq!(c.lon, 139.456);
    }

    #[test]
    fn test_bare_pair_with_space() {
        let c = extract_coordinates("35.123, 139.456").unwrap();
        assert_eq!(c.lat, 35.123);
        assert_eq!(c.lon, 139.456);
    }

    #[test]
    fn test_bare_pair_trimmed_and_negative() {
        let c = extract_coordinates("  -35.1, -139.2  ").unwrap();
        assert_eq!(c.lat, -35.1);
        assert_eq!(c.lon, -139.2);
    }

    #[test]
    fn test_bare_pair_rejects_surrounding_text() {
        assert!(extract_coordinates("foo 35.123,139.456 bar").is_none());
    }

    #[test]
    fn test_bare_pair_rejects_exponent_and_inf() {
        assert!(extract_coordinates("3e1,139.0").is_none());
        assert!(extract_coordinates("inf,139.0").is_none());
    }

    #[test]
    fn test_bare_pair_rejects_three_fields() {
        assert!(extract_coordinates("35.1,139.2,500").is_none());
    }

    #[test]
    fn test_map_center() {
        let c = extract_coordinates("https://maps.example.com/maps/@35.0,138.0,15z").unwrap();
        assert_eq!(c.lat, 35.0);
        assert_eq!(c.lon, 138.0);
    }

    #[test]
    fn test_place_url_resolves_via_center_matcher() {
        // place/<name>/@lat,lon is the same fragment; one matcher covers both.
        let url = "https://maps.example.com/maps/place/Shinozaki+Station/@35.7019,139.9031,17z";
        let c = extract_coordinates(url).unwrap();
        assert_eq!(c.lat, 35.7019);
        assert_eq!(c.lon, 139.9031);
    }

    #[test]
    fn test_map_center_skips_bad_at_signs() {
        let c = extract_coordinates("mail@example.com then @35.5,139.5").unwrap();
        assert_eq!(c.lat, 35.5);
        assert_eq!(c.lon, 139.5);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(extract_coordinates("").is_none());
        assert!(extract_coordinates("   ").is_none());
    }

    #[test]
    fn test_unrelated_text() {
        assert!(extract_coordinates("Shinozaki Sta. south exit, 5 min walk").is_none());
    }

    #[test]
    fn test_multibyte_text_is_safe() {
        assert!(extract_coordinates("江戸川区篠崎町の駅前").is_none());
        let c = extract_coordinates("駅 @35.70,139.90 付近").unwrap();
        assert_eq!(c.lat, 35.70);
        assert_eq!(c.lon, 139.90);
    }
}
