//! File-based roster persistence at ~/.domus/facilities.json.
//!
//! Holds the facility list plus the run defaults the UI layer owns (the
//! straight-line ratio and the geocoder hints). Every mutation persists.
//! Missing fields default gracefully so older files keep loading.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::types::{Facility, FacilityError, PlaceSource};
use crate::geo::Coordinate;

/// Default walking-to-straight-line discount when none was configured.
pub const DEFAULT_RATIO: f64 = 0.75;

#[derive(Serialize, Deserialize, Clone)]
struct StoreFile {
    #[serde(default)]
    facilities: Vec<Facility>,
    #[serde(default = "default_ratio")]
    ratio: f64,
    /// Free text appended to every geocoding query ("Edogawa, Tokyo").
    #[serde(default)]
    area_hint: Option<String>,
    /// Comma-separated ISO codes for Nominatim's countrycodes filter.
    #[serde(default)]
    country_codes: Option<String>,
    #[serde(default)]
    updated_ms: i64,
}

fn default_ratio() -> f64 {
    DEFAULT_RATIO
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            facilities: Vec::new(),
            ratio: DEFAULT_RATIO,
            area_hint: None,
            country_codes: None,
            updated_ms: 0,
        }
    }
}

/// The persisted facility roster.
pub struct FacilityStore {
    path: PathBuf,
    state: StoreFile,
}

impl FacilityStore {
    /// Load from the default location (~/.domus/facilities.json).
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load from a specific path (for testing).
    pub fn load_from(path: PathBuf) -> Self {
        let state = Self::read_file(&path).unwrap_or_default();
        Self { path, state }
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".domus")
            .join("facilities.json")
    }

    fn read_file(path: &PathBuf) -> Option<StoreFile> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    // ─── Read access ────────────────────────────────────────────

    pub fn facilities(&self) -> &[Facility] {
        &self.state.facilities
    }

    pub fn get(&self, index: usize) -> Result<&Facility, FacilityError> {
        self.state.facilities.get(index).ok_or(FacilityError::BadIndex(index))
    }

    pub fn ratio(&self) -> f64 {
        self.state.ratio
    }

    pub fn area_hint(&self) -> Option<&str> {
        self.state.area_hint.as_deref()
    }

    pub fn country_codes(&self) -> Option<&str> {
        self.state.country_codes.as_deref()
    }

    pub fn len(&self) -> usize {
        self.state.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.facilities.is_empty()
    }

    // ─── Mutations (each one persists) ──────────────────────────

    pub fn add(&mut self, facility: Facility) -> usize {
        self.state.facilities.push(facility);
        self.persist();
        self.state.facilities.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Result<Facility, FacilityError> {
        if index >= self.state.facilities.len() {
            return Err(FacilityError::BadIndex(index));
        }
        let removed = self.state.facilities.remove(index);
        self.persist();
        Ok(removed)
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> Result<(), FacilityError> {
        self.entry_mut(index)?.enabled = enabled;
        self.persist();
        Ok(())
    }

    pub fn rename(&mut self, index: usize, name: &str) -> Result<(), FacilityError> {
        self.entry_mut(index)?.name = name.to_string();
        self.persist();
        Ok(())
    }

    pub fn set_distance(&mut self, index: usize, meters: f64) -> Result<(), FacilityError> {
        self.entry_mut(index)?.walking_distance_m = meters;
        self.persist();
        Ok(())
    }

    pub fn set_location(
        &mut self,
        index: usize,
        coordinate: Coordinate,
        source: PlaceSource,
        display_name: Option<String>,
    ) -> Result<(), FacilityError> {
        let entry = self.entry_mut(index)?;
        entry.coordinate = Some(coordinate);
        entry.source = Some(source);
        entry.display_name = display_name;
        self.persist();
        Ok(())
    }

    pub fn clear_location(&mut self, index: usize) -> Result<(), FacilityError> {
        let entry = self.entry_mut(index)?;
        entry.coordinate = None;
        entry.source = None;
        entry.display_name = None;
        self.persist();
        Ok(())
    }

    pub fn set_ratio(&mut self, ratio: f64) {
        self.state.ratio = ratio;
        self.persist();
    }

    pub fn set_area_hint(&mut self, hint: Option<String>) {
        self.state.area_hint = hint;
        self.persist();
    }

    pub fn set_country_codes(&mut self, codes: Option<String>) {
        self.state.country_codes = codes;
        self.persist();
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut Facility, FacilityError> {
        self.state
            .facilities
            .get_mut(index)
            .ok_or(FacilityError::BadIndex(index))
    }

    fn persist(&mut self) {
        self.state.updated_ms = chrono::Utc::now().timestamp_millis();
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(&self.state) {
            let _ = fs::write(&self.path, json);
        }
    }
}
