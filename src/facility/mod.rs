//! Facility roster subsystem.
//!
//! Owns the mutable state the estimation core deliberately does not: the
//! persisted facility list, Nominatim geocoding with rate limiting, and the
//! controller that attaches coordinates to roster entries.

pub mod geocoder;
pub mod resolver;
pub mod store;
pub mod types;

pub use geocoder::{Geocoder, GeocodedPlace};
pub use resolver::{FacilityResolver, LocateOutcome};
pub use store::FacilityStore;
pub use types::{Facility, FacilityError, PlaceSource};
