//! Roster controller — attaches coordinates to facilities.
//!
//! Manual flow:  free text → extractor → store (source: Manual)
//! Geocode flow: name (+hints) → Nominatim → store (source: Nominatim)
//!
//! A manually pinned location always outranks a provider result: the geocode
//! pass never touches `Manual` entries, mirroring the extractor's
//! pin-over-center priority.

use super::geocoder::Geocoder;
use super::store::FacilityStore;
use super::types::{Facility, FacilityError, PlaceSource};
use crate::extract::extract_coordinates;
use crate::geo::Coordinate;

/// Per-facility result of a geocoding pass.
#[derive(Debug)]
pub enum LocateOutcome {
    Located { coordinate: Coordinate, display_name: String },
    NotFound,
    Failed(FacilityError),
    SkippedOffline,
}

/// The controller owning the geocoder and the offline switch.
pub struct FacilityResolver {
    geocoder: Geocoder,
    offline: bool,
}

impl FacilityResolver {
    pub fn new(geocoder: Geocoder) -> Self {
        Self { geocoder, offline: false }
    }

    /// Build a resolver whose geocoder uses the store's persisted hints.
    pub fn from_store(store: &FacilityStore) -> Self {
        let geocoder = Geocoder::with_hints(
            store.area_hint().map(str::to_string),
            store.country_codes().map(str::to_string),
        );
        Self::new(geocoder)
    }

    /// Offline mode: the geocode pass reports every target as skipped.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Attach a user-supplied location to a facility. The text goes through
    /// the extractor; anything it cannot read is [`FacilityError::Unparsable`].
    pub fn set_manual_location(
        &self,
        store: &mut FacilityStore,
        index: usize,
        text: &str,
    ) -> Result<Coordinate, FacilityError> {
        store.get(index)?;
        let coordinate = extract_coordinates(text)
            .ok_or_else(|| FacilityError::Unparsable(text.trim().to_string()))?;
        store.set_location(index, coordinate, PlaceSource::Manual, None)?;
        Ok(coordinate)
    }

    /// Geocode every enabled facility that still needs a coordinate.
    /// With `refresh`, provider-sourced coordinates are redone as well;
    /// manually pinned ones never are.
    pub fn locate(
        &mut self,
        store: &mut FacilityStore,
        refresh: bool,
    ) -> Vec<(usize, LocateOutcome)> {
        let targets: Vec<(usize, String)> = locate_targets(store.facilities(), refresh)
            .into_iter()
            .map(|i| (i, store.facilities()[i].name.clone()))
            .collect();

        let mut outcomes = Vec::with_capacity(targets.len());
        for (index, name) in targets {
            if self.offline {
                outcomes.push((index, LocateOutcome::SkippedOffline));
                continue;
            }

            let outcome = match self.geocoder.search(&name) {
                Ok(place) => {
                    match store.set_location(
                        index,
                        place.coordinate,
                        PlaceSource::Nominatim,
                        Some(place.display_name.clone()),
                    ) {
                        Ok(()) => LocateOutcome::Located {
                            coordinate: place.coordinate,
                            display_name: place.display_name,
                        },
                        Err(e) => LocateOutcome::Failed(e),
                    }
                }
                Err(FacilityError::NotFound(_)) => LocateOutcome::NotFound,
                Err(e) => LocateOutcome::Failed(e),
            };
            outcomes.push((index, outcome));
        }
        outcomes
    }
}

/// Indices the geocode pass will touch: enabled facilities without a
/// coordinate, plus (with `refresh`) provider-sourced ones.
fn locate_targets(facilities: &[Facility], refresh: bool) -> Vec<usize> {
    facilities
        .iter()
        .enumerate()
        .filter(|(_, f)| {
            f.enabled
                && (f.coordinate.is_none()
                    || (refresh && f.source == Some(PlaceSource::Nominatim)))
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn offline_setup() -> (FacilityResolver, FacilityStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("facilities.json");
        let store = FacilityStore::load_from(path);
        let mut resolver = FacilityResolver::new(Geocoder::new());
        resolver.set_offline(true);
        (resolver, store, dir)
    }

    #[test]
    fn test_manual_location_from_pair() {
        let (resolver, mut store, _dir) = offline_setup();
        store.add(Facility::new("Post Office", 190.0));

        let c = resolver
            .set_manual_location(&mut store, 0, "35.7012, 139.9001")
            .unwrap();
        assert_eq!(c, Coordinate::new(35.7012, 139.9001));

        let f = store.get(0).unwrap();
        assert_eq!(f.coordinate, Some(c));
        assert_eq!(f.source, Some(PlaceSource::Manual));
    }

    #[test]
    fn test_manual_location_from_url() {
        let (resolver, mut store, _dir) = offline_setup();
        store.add(Facility::new("Station", 380.0));

        let c = resolver
            .set_manual_location(&mut store, 0, "https://maps.example.com/maps/@35.70,139.90,17z")
            .unwrap();
        assert_eq!(c, Coordinate::new(35.70, 139.90));
    }

    #[test]
    fn test_manual_location_unparsable() {
        let (resolver, mut store, _dir) = offline_setup();
        store.add(Facility::new("Station", 380.0));

        let err = resolver
            .set_manual_location(&mut store, 0, "behind the bakery")
            .unwrap_err();
        assert!(matches!(err, FacilityError::Unparsable(_)));
        assert!(store.get(0).unwrap().coordinate.is_none());
    }

    #[test]
    fn test_manual_location_bad_index() {
        let (resolver, mut store, _dir) = offline_setup();
        let err = resolver
            .set_manual_location(&mut store, 5, "35.0,139.0")
            .unwrap_err();
        assert!(matches!(err, FacilityError::BadIndex(5)));
    }

    #[test]
    fn test_locate_offline_skips_without_mutation() {
        let (mut resolver, mut store, _dir) = offline_setup();
        store.add(Facility::new("School", 660.0));
        store.add(Facility::new("Hospital", 270.0));

        let outcomes = resolver.locate(&mut store, false);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|(_, o)| matches!(o, LocateOutcome::SkippedOffline)));
        assert!(store.facilities().iter().all(|f| f.coordinate.is_none()));
    }

    #[test]
    fn test_locate_targets_selection() {
        let mut unresolved = Facility::new("unresolved", 100.0);
        let mut disabled = Facility::new("disabled", 100.0);
        disabled.enabled = false;

        let mut manual = Facility::new("manual", 100.0);
        manual.coordinate = Some(Coordinate::new(1.0, 2.0));
        manual.source = Some(PlaceSource::Manual);

        let mut geocoded = Facility::new("geocoded", 100.0);
        geocoded.coordinate = Some(Coordinate::new(3.0, 4.0));
        geocoded.source = Some(PlaceSource::Nominatim);

        unresolved.enabled = true;
        let roster = [unresolved, disabled, manual, geocoded];

        assert_eq!(locate_targets(&roster, false), vec![0]);
        // refresh adds provider-sourced entries but never manual pins
        assert_eq!(locate_targets(&roster, true), vec![0, 3]);
    }
}
