use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::estimate::{build_report, EstimateReport};
use crate::facility::{Facility, FacilityError, LocateOutcome};
use crate::geo::{format_coords, Coordinate};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn facility_error(e: FacilityError) -> ApiError {
    let status = match &e {
        FacilityError::BadIndex(_) => StatusCode::NOT_FOUND,
        FacilityError::Unparsable(_) => StatusCode::BAD_REQUEST,
        FacilityError::NotFound(_) => StatusCode::NOT_FOUND,
        FacilityError::Network(_) => StatusCode::BAD_GATEWAY,
        FacilityError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
    };
    api_error(status, format!("{}", e))
}

fn log_request(method: &str, path: &str, note: &str, start: Instant) {
    eprintln!(
        "[{}] {} {} -> {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        method,
        path,
        note,
        start.elapsed().as_secs_f64() * 1000.0,
    );
}

// ─── Facility views ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct FacilityView {
    pub index: usize,
    #[serde(flatten)]
    pub facility: Facility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_coords: Option<String>,
}

fn view(index: usize, facility: &Facility) -> FacilityView {
    FacilityView {
        index,
        facility: facility.clone(),
        formatted_coords: facility.coordinate.map(|c| format_coords(c.lat, c.lon)),
    }
}

// ─── GET /api/facilities ─────────────────────────────────────────

pub async fn list_facilities(State(state): State<Arc<AppState>>) -> Json<Vec<FacilityView>> {
    let store = state.store.lock().unwrap();
    Json(
        store
            .facilities()
            .iter()
            .enumerate()
            .map(|(i, f)| view(i, f))
            .collect(),
    )
}

// ─── POST /api/facilities ────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddFacilityBody {
    pub name: String,
    #[serde(default = "default_distance")]
    pub walking_distance_m: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Optional manual location (map URL or "lat,lon"), parsed on the spot.
    pub location_text: Option<String>,
}

fn default_distance() -> f64 {
    500.0
}

fn default_enabled() -> bool {
    true
}

pub async fn add_facility(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddFacilityBody>,
) -> Result<Json<FacilityView>, ApiError> {
    let start = Instant::now();

    if body.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Facility name is empty"));
    }
    if !body.walking_distance_m.is_finite() || body.walking_distance_m < 0.0 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "walking_distance_m must be a non-negative number",
        ));
    }

    // Parse the manual location up front so a bad request leaves no
    // half-added facility behind.
    let manual = match &body.location_text {
        Some(text) => Some(
            crate::extract::extract_coordinates(text)
                .ok_or_else(|| facility_error(FacilityError::Unparsable(text.trim().to_string())))?,
        ),
        None => None,
    };

    let mut store = state.store.lock().unwrap();
    let mut facility = Facility::new(body.name.trim(), body.walking_distance_m);
    facility.enabled = body.enabled;
    let index = store.add(facility);

    if let Some(coordinate) = manual {
        store
            .set_location(index, coordinate, crate::facility::PlaceSource::Manual, None)
            .map_err(facility_error)?;
    }

    let facility = store.get(index).map_err(facility_error)?.clone();
    log_request("POST", "/api/facilities", &facility.name, start);
    Ok(Json(view(index, &facility)))
}

// ─── PATCH /api/facilities/{index} ───────────────────────────────

#[derive(Deserialize)]
pub struct UpdateFacilityBody {
    pub name: Option<String>,
    pub walking_distance_m: Option<f64>,
    pub enabled: Option<bool>,
    /// Manual location text; parsed through the extractor.
    pub location_text: Option<String>,
    /// Drop the stored coordinate so the next locate pass redoes it.
    #[serde(default)]
    pub clear_location: bool,
}

pub async fn update_facility(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(body): Json<UpdateFacilityBody>,
) -> Result<Json<FacilityView>, ApiError> {
    let start = Instant::now();
    let mut store = state.store.lock().unwrap();

    if let Some(name) = &body.name {
        if name.trim().is_empty() {
            return Err(api_error(StatusCode::BAD_REQUEST, "Facility name is empty"));
        }
        store.rename(index, name.trim()).map_err(facility_error)?;
    }
    if let Some(meters) = body.walking_distance_m {
        if !meters.is_finite() || meters < 0.0 {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "walking_distance_m must be a non-negative number",
            ));
        }
        store.set_distance(index, meters).map_err(facility_error)?;
    }
    if let Some(enabled) = body.enabled {
        store.set_enabled(index, enabled).map_err(facility_error)?;
    }
    if body.clear_location {
        store.clear_location(index).map_err(facility_error)?;
    }
    if let Some(text) = &body.location_text {
        let resolver = state.resolver.lock().unwrap();
        resolver
            .set_manual_location(&mut store, index, text)
            .map_err(facility_error)?;
    }

    let facility = store.get(index).map_err(facility_error)?.clone();
    log_request("PATCH", "/api/facilities", &facility.name, start);
    Ok(Json(view(index, &facility)))
}

// ─── DELETE /api/facilities/{index} ──────────────────────────────

pub async fn remove_facility(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<Facility>, ApiError> {
    let start = Instant::now();
    let mut store = state.store.lock().unwrap();
    let removed = store.remove(index).map_err(facility_error)?;
    log_request("DELETE", "/api/facilities", &removed.name, start);
    Ok(Json(removed))
}

// ─── POST /api/locate ────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct LocateBody {
    /// Also re-geocode provider-sourced coordinates.
    #[serde(default)]
    pub refresh: bool,
    /// Skip the network; report targets as skipped.
    #[serde(default)]
    pub offline: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocateStatus {
    Located,
    NotFound,
    Failed,
    SkippedOffline,
}

#[derive(Serialize)]
pub struct LocateResult {
    pub index: usize,
    pub name: String,
    pub status: LocateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn locate(
    State(state): State<Arc<AppState>>,
    body: Option<Json<LocateBody>>,
) -> Json<Vec<LocateResult>> {
    let start = Instant::now();
    let Json(body) = body.unwrap_or_default();

    let mut store = state.store.lock().unwrap();
    let mut resolver = state.resolver.lock().unwrap();

    resolver.set_offline(body.offline);
    let outcomes = resolver.locate(&mut store, body.refresh);
    resolver.set_offline(false);

    let results: Vec<LocateResult> = outcomes
        .into_iter()
        .map(|(index, outcome)| {
            let name = store
                .get(index)
                .map(|f| f.name.clone())
                .unwrap_or_default();
            match outcome {
                LocateOutcome::Located { coordinate, display_name } => LocateResult {
                    index,
                    name,
                    status: LocateStatus::Located,
                    coordinate: Some(coordinate),
                    display_name: Some(display_name),
                    error: None,
                },
                LocateOutcome::NotFound => LocateResult {
                    index,
                    name,
                    status: LocateStatus::NotFound,
                    coordinate: None,
                    display_name: None,
                    error: None,
                },
                LocateOutcome::Failed(e) => LocateResult {
                    index,
                    name,
                    status: LocateStatus::Failed,
                    coordinate: None,
                    display_name: None,
                    error: Some(format!("{}", e)),
                },
                LocateOutcome::SkippedOffline => LocateResult {
                    index,
                    name,
                    status: LocateStatus::SkippedOffline,
                    coordinate: None,
                    display_name: None,
                    error: None,
                },
            }
        })
        .collect();

    log_request("POST", "/api/locate", &format!("{} targets", results.len()), start);
    Json(results)
}

// ─── GET /api/estimate ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct EstimateQuery {
    /// Walking-to-straight-line discount; defaults to the stored ratio.
    pub ratio: Option<f64>,
}

pub async fn estimate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EstimateQuery>,
) -> Result<Json<EstimateReport>, ApiError> {
    let start = Instant::now();
    let store = state.store.lock().unwrap();

    let ratio = params.ratio.unwrap_or_else(|| store.ratio());
    if !ratio.is_finite() {
        return Err(api_error(StatusCode::BAD_REQUEST, "ratio must be a finite number"));
    }

    let report = build_report(store.facilities(), ratio);
    let note = match &report.formatted_estimate {
        Some(coords) => coords.clone(),
        None => "no estimate".to_string(),
    };
    log_request("GET", "/api/estimate", &note, start);
    Ok(Json(report))
}
