//! Shared coordinate type and small geographic helpers.

use serde::{Deserialize, Serialize};

/// A WGS84 point in decimal degrees.
///
/// No range validation happens here — the estimation core treats whatever it
/// is handed as plausible. Callers that accept raw user input validate at the
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Format coordinates for display: `35.6762°N, 139.8547°E`.
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lon.abs(), ew)
}

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points, in meters.
///
/// Used only for display (claimed radius vs. actual distance in the estimate
/// report) — the estimator itself works in locally-linear lat/lon space.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_format_coords_quadrants() {
        assert_eq!(format_coords(35.6762, 139.8547), "35.6762\u{00B0}N, 139.8547\u{00B0}E");
        assert_eq!(format_coords(-33.8688, -70.6693), "33.8688\u{00B0}S, 70.6693\u{00B0}W");
    }

    #[test]
    fn test_haversine_zero() {
        let p = Coordinate::new(35.0, 139.0);
        assert_relative_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_lat() {
        // One degree of latitude is ~111.2 km everywhere.
        let a = Coordinate::new(35.0, 139.0);
        let b = Coordinate::new(36.0, 139.0);
        let d = haversine_m(a, b);
        assert!((d - 111_200.0).abs() < 1_000.0, "got {}", d);
    }
}
