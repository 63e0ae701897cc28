//! Core types for the facility subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::Coordinate;

/// How a facility's coordinate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceSource {
    Nominatim,
    Manual,
}

impl fmt::Display for PlaceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nominatim => write!(f, "Nominatim"),
            Self::Manual => write!(f, "Manual"),
        }
    }
}

/// A reference facility: a point of interest near the unknown property, with
/// the user-reported walking distance to it.
///
/// `coordinate` is `None` until the facility is geocoded or the user supplies
/// a location by hand. Only enabled, located facilities participate in
/// estimation. `source` is provenance for display; the estimator never reads
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    pub walking_distance_m: f64,
    pub enabled: bool,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    #[serde(default)]
    pub source: Option<PlaceSource>,
    /// Full display string from the geocoder, when resolved that way.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Facility {
    pub fn new(name: impl Into<String>, walking_distance_m: f64) -> Self {
        Self {
            name: name.into(),
            walking_distance_m,
            enabled: true,
            coordinate: None,
            source: None,
            display_name: None,
        }
    }

    pub fn is_located(&self) -> bool {
        self.coordinate.is_some()
    }
}

/// Facility subsystem errors.
///
/// Absence of a result (extractor miss on empty input, too few observations)
/// is not an error — these cover the operations that can actually fail.
#[derive(Debug)]
pub enum FacilityError {
    Network(String),
    NotFound(String),
    InvalidResponse(String),
    /// Manual location text matched no known coordinate format.
    Unparsable(String),
    /// Roster index out of range.
    BadIndex(usize),
}

impl fmt::Display for FacilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::NotFound(q) => write!(f, "No geocoding result for '{}'", q),
            Self::InvalidResponse(msg) => write!(f, "Invalid API response: {}", msg),
            Self::Unparsable(text) => write!(
                f,
                "Could not read a coordinate from '{}'. Paste a map URL or 'lat,lon'.",
                text
            ),
            Self::BadIndex(i) => write!(f, "No facility at index {}", i),
        }
    }
}

impl std::error::Error for FacilityError {}
