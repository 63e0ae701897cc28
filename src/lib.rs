//! Domus Locator — estimates an unknown property's coordinates from the
//! walking distances to nearby reference facilities.
//!
//! The algorithmic core is two pure functions: [`extract::extract_coordinates`]
//! parses free-text location inputs (map-service URLs, raw pairs), and
//! [`estimate::estimate_position`] combines located facilities into one
//! weighted-centroid estimate. Everything else — roster persistence,
//! Nominatim geocoding, CLI, JSON API — feeds those two.

pub mod estimate;
pub mod extract;
pub mod facility;
pub mod geo;
pub mod server;
