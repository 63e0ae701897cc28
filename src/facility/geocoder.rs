//! Nominatim geocoding for facility names.
//!
//! One request per lookup, serialized: the public endpoint allows roughly one
//! request per second, so consecutive calls sleep out the remainder of a
//! fixed minimum interval. Transport and response parsing are split so the
//! parsing is testable without the network.

use serde::Deserialize;
use std::time::{Duration, Instant};

use super::types::FacilityError;
use crate::geo::Coordinate;

/// Nominatim's usage policy caps bulk users at ~1 request/second.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1100);

const USER_AGENT: &str = "DomusLocator/0.3 (property-position-estimator)";

#[derive(Deserialize, Debug, Clone)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: String,
}

/// A successful geocoding hit.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub coordinate: Coordinate,
    pub display_name: String,
}

/// The geocoding client. Holds the query hints and the pacing clock.
pub struct Geocoder {
    area_hint: Option<String>,
    country_codes: Option<String>,
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl Geocoder {
    pub fn new() -> Self {
        Self::with_hints(None, None)
    }

    /// `area_hint` is appended to every query ("Edogawa, Tokyo");
    /// `country_codes` feeds Nominatim's countrycodes filter ("jp").
    pub fn with_hints(area_hint: Option<String>, country_codes: Option<String>) -> Self {
        Self {
            area_hint,
            country_codes,
            min_interval: MIN_REQUEST_INTERVAL,
            last_request: None,
        }
    }

    /// Look up a facility by name. Returns the top hit or an error; an empty
    /// result set is [`FacilityError::NotFound`].
    pub fn search(&mut self, name: &str) -> Result<GeocodedPlace, FacilityError> {
        self.throttle();

        let country_param = match &self.country_codes {
            Some(cc) => format!("&countrycodes={}", urlencode(cc)),
            None => String::new(),
        };
        let url = format!(
            "https://nominatim.openstreetmap.org/search?q={}&format=json&limit=1{}",
            urlencode(&self.effective_query(name)),
            country_param,
        );

        let response = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| FacilityError::Network(e.to_string()))?;

        let results: Vec<NominatimResult> = response
            .into_json()
            .map_err(|e| FacilityError::InvalidResponse(e.to_string()))?;

        first_hit(name, &results)
    }

    fn effective_query(&self, name: &str) -> String {
        match &self.area_hint {
            Some(hint) => format!("{} {}", name, hint),
            None => name.to_string(),
        }
    }

    /// Sleep out whatever remains of the minimum interval since the last
    /// request, then claim the slot.
    fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }

    #[cfg(test)]
    fn without_pacing(mut self) -> Self {
        self.min_interval = Duration::from_millis(0);
        self
    }
}

/// Pick the first result and parse its string-typed coordinates.
fn first_hit(query: &str, results: &[NominatimResult]) -> Result<GeocodedPlace, FacilityError> {
    let top = results
        .first()
        .ok_or_else(|| FacilityError::NotFound(query.to_string()))?;

    let lat: f64 = top
        .lat
        .parse()
        .map_err(|_| FacilityError::InvalidResponse(format!("bad latitude '{}'", top.lat)))?;
    let lon: f64 = top
        .lon
        .parse()
        .map_err(|_| FacilityError::InvalidResponse(format!("bad longitude '{}'", top.lon)))?;

    Ok(GeocodedPlace {
        coordinate: Coordinate::new(lat, lon),
        display_name: top.display_name.clone(),
    })
}

// ─── URL encoding (minimal, no extra dep) ───────────────────────

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => "%20".to_string(),
            '&' => "%26".to_string(),
            '=' => "%3D".to_string(),
            '+' => "%2B".to_string(),
            ',' => "%2C".to_string(),
            _ if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '~' => {
                c.to_string()
            }
            _ => c
                .to_string()
                .bytes()
                .map(|b| format!("%{:02X}", b))
                .collect(),
        })
        .collect()
}
