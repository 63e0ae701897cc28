//! Weighted-centroid position estimation.
//!
//! Closer facilities constrain the property's location more tightly, so each
//! observation is weighted by the inverse square of its assumed straight-line
//! radius. This is a heuristic centroid, not multilateration: when the
//! facilities are not spread around the true point the estimate is biased
//! toward the cluster, and nothing here corrects for that.

use serde::Serialize;

use crate::facility::Facility;
use crate::geo::{format_coords, haversine_m, Coordinate};

/// One facility's contribution to an estimation run.
#[derive(Debug, Clone)]
pub struct Weighted<'a> {
    pub facility: &'a Facility,
    pub coordinate: Coordinate,
    pub radius_m: f64,
    pub weight: f64,
}

/// Compute each qualifying facility's assumed radius and weight.
///
/// Qualifying means `enabled` with a resolved coordinate. The radius is
/// `walking_distance_m * ratio`; the weight is `1 / radius²`.
///
/// A radius of zero (or below, reachable through a negative ratio) gets
/// weight 0 instead of the non-finite value the division would produce: a
/// zero radius carries no geometry to weight. When every qualifying facility
/// is zero-radius the total weight is zero and no estimate exists.
pub fn weighted_breakdown(facilities: &[Facility], ratio: f64) -> Vec<Weighted<'_>> {
    facilities
        .iter()
        .filter(|f| f.enabled)
        .filter_map(|f| {
            let coordinate = f.coordinate?;
            let radius_m = f.walking_distance_m * ratio;
            let weight = if radius_m > 0.0 { 1.0 / (radius_m * radius_m) } else { 0.0 };
            Some(Weighted { facility: f, coordinate, radius_m, weight })
        })
        .collect()
}

/// Estimate the property position from the facility roster.
///
/// Pure function of its inputs: filters to enabled facilities with a
/// coordinate, requires at least two of them, and returns the inverse-square
/// weighted centroid — or `None` when the data is insufficient or every
/// weight is degenerate.
pub fn estimate_position(facilities: &[Facility], ratio: f64) -> Option<Coordinate> {
    let weighted = weighted_breakdown(facilities, ratio);
    if weighted.len() < 2 {
        return None;
    }
    centroid(&weighted)
}

fn centroid(weighted: &[Weighted]) -> Option<Coordinate> {
    let mut total_weight = 0.0;
    let mut lat_sum = 0.0;
    let mut lon_sum = 0.0;

    for w in weighted {
        total_weight += w.weight;
        lat_sum += w.coordinate.lat * w.weight;
        lon_sum += w.coordinate.lon * w.weight;
    }

    if total_weight > 0.0 {
        Some(Coordinate::new(lat_sum / total_weight, lon_sum / total_weight))
    } else {
        None
    }
}

// ─── Estimate report ────────────────────────────────────────────

/// One participating facility in the report.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantReport {
    pub name: String,
    pub coordinate: Coordinate,
    pub walking_distance_m: f64,
    pub radius_m: f64,
    /// Share of the total weight, 0..1. Zero for zero-radius facilities.
    pub weight_share: f64,
    /// Great-circle distance from the estimate to this facility, when an
    /// estimate exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_estimate_m: Option<f64>,
}

/// Full output of one estimation run. Serialized to stdout / the API;
/// `estimate` is an explicit null when no position could be computed.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    pub ratio: f64,
    pub participants: Vec<ParticipantReport>,
    pub skipped_disabled: usize,
    pub skipped_unlocated: usize,
    pub estimate: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_estimate: Option<String>,
}

/// Build the report for one run. Agrees with [`estimate_position`] by
/// construction — both go through [`weighted_breakdown`].
pub fn build_report(facilities: &[Facility], ratio: f64) -> EstimateReport {
    let skipped_disabled = facilities.iter().filter(|f| !f.enabled).count();
    let skipped_unlocated = facilities
        .iter()
        .filter(|f| f.enabled && f.coordinate.is_none())
        .count();

    let weighted = weighted_breakdown(facilities, ratio);
    let estimate = if weighted.len() < 2 { None } else { centroid(&weighted) };

    let total_weight: f64 = weighted.iter().map(|w| w.weight).sum();
    let participants = weighted
        .iter()
        .map(|w| ParticipantReport {
            name: w.facility.name.clone(),
            coordinate: w.coordinate,
            walking_distance_m: w.facility.walking_distance_m,
            radius_m: w.radius_m,
            weight_share: if total_weight > 0.0 { w.weight / total_weight } else { 0.0 },
            distance_from_estimate_m: estimate.map(|e| haversine_m(e, w.coordinate)),
        })
        .collect();

    EstimateReport {
        ratio,
        participants,
        skipped_disabled,
        skipped_unlocated,
        estimate,
        formatted_estimate: estimate.map(|e| format_coords(e.lat, e.lon)),
    }
}

/// Human-readable summary of a report, printed to stderr by the CLI.
pub fn render_report(report: &EstimateReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "  Straight-line ratio: {:.2}", report.ratio);

    for p in &report.participants {
        let residual = match p.distance_from_estimate_m {
            Some(d) => format!("   {:>5.0} m out", d),
            None => String::new(),
        };
        let _ = writeln!(
            out,
            "  \u{25CF} {:<28} walk {:>5.0} m \u{2192} radius {:>5.0} m   weight {:>5.1}%{}",
            p.name,
            p.walking_distance_m,
            p.radius_m,
            p.weight_share * 100.0,
            residual,
        );
    }

    if report.skipped_disabled + report.skipped_unlocated > 0 {
        let _ = writeln!(
            out,
            "  ({} disabled, {} without a location)",
            report.skipped_disabled, report.skipped_unlocated,
        );
    }

    match &report.formatted_estimate {
        Some(coords) => {
            let _ = writeln!(out, "  \u{1F4CD} Estimated position: {}", coords);
        }
        None => {
            let _ = writeln!(out, "  No estimate \u{2014} need at least two enabled, located facilities.");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn located(name: &str, distance: f64, lat: f64, lon: f64) -> Facility {
        Facility {
            coordinate: Some(Coordinate::new(lat, lon)),
            ..Facility::new(name, distance)
        }
    }

    #[test]
    fn test_no_estimate_below_two_observations() {
        assert!(estimate_position(&[], 0.75).is_none());
        assert!(estimate_position(&[located("a", 500.0, 35.0, 139.0)], 0.75).is_none());
    }

    #[test]
    fn test_equal_radii_give_midpoint() {
        let fs = [
            located("a", 400.0, 35.0, 139.0),
            located("b", 400.0, 36.0, 140.0),
        ];
        let e = estimate_position(&fs, 0.75).unwrap();
        assert_relative_eq!(e.lat, 35.5);
        assert_relative_eq!(e.lon, 139.5);
    }

    #[test]
    fn test_smaller_radius_dominates() {
        let fs = [
            located("near", 100.0, 35.0, 139.0),
            located("far", 1000.0, 36.0, 140.0),
        ];
        let e = estimate_position(&fs, 0.75).unwrap();
        // Weight ratio is 100:1, so the estimate sits within ~1% of "near".
        assert!((e.lat - 35.0).abs() < 0.02, "lat {}", e.lat);
        assert!((e.lon - 139.0).abs() < 0.02, "lon {}", e.lon);
    }

    #[test]
    fn test_estimate_converges_to_smallest_radius() {
        let near = located("near", 1.0, 35.0, 139.0);
        let far = located("far", 1000.0, 36.0, 140.0);
        let e = estimate_position(&[near, far], 0.75).unwrap();
        assert!((e.lat - 35.0).abs() < 1e-4);
        assert!((e.lon - 139.0).abs() < 1e-4);
    }

    #[test]
    fn test_idempotent() {
        let fs = [
            located("a", 300.0, 35.1, 139.1),
            located("b", 700.0, 35.2, 139.3),
            located("c", 500.0, 35.0, 139.2),
        ];
        let first = estimate_position(&fs, 0.75).unwrap();
        let second = estimate_position(&fs, 0.75).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_disabled_and_unlocated_do_not_affect_result() {
        let base = [
            located("a", 400.0, 35.0, 139.0),
            located("b", 600.0, 35.4, 139.4),
        ];
        let baseline = estimate_position(&base, 0.75).unwrap();

        let mut noisy = base.to_vec();
        noisy.push(Facility {
            enabled: false,
            ..located("disabled", 100.0, 40.0, 140.0)
        });
        noisy.push(Facility::new("unlocated", 50.0));

        let with_noise = estimate_position(&noisy, 0.75).unwrap();
        assert_eq!(baseline, with_noise);
    }

    #[test]
    fn test_zero_radius_is_excluded() {
        let fs = [
            located("pin", 0.0, 40.0, 141.0),
            located("a", 400.0, 35.0, 139.0),
            located("b", 400.0, 36.0, 140.0),
        ];
        // The zero-radius facility contributes nothing; the others average.
        let e = estimate_position(&fs, 0.75).unwrap();
        assert_relative_eq!(e.lat, 35.5);
        assert_relative_eq!(e.lon, 139.5);
    }

    #[test]
    fn test_all_zero_radii_give_no_estimate() {
        let fs = [
            located("a", 0.0, 35.0, 139.0),
            located("b", 0.0, 36.0, 140.0),
        ];
        assert!(estimate_position(&fs, 0.75).is_none());
        // Same through a zero ratio.
        let fs = [
            located("a", 400.0, 35.0, 139.0),
            located("b", 600.0, 36.0, 140.0),
        ];
        assert!(estimate_position(&fs, 0.0).is_none());
    }

    #[test]
    fn test_report_weight_shares_sum_to_one() {
        let fs = [
            located("a", 300.0, 35.1, 139.1),
            located("b", 700.0, 35.2, 139.3),
            located("c", 500.0, 35.0, 139.2),
        ];
        let report = build_report(&fs, 0.75);
        let total: f64 = report.participants.iter().map(|p| p.weight_share).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert!(report.estimate.is_some());
        assert_eq!(report.skipped_disabled, 0);
        assert_eq!(report.skipped_unlocated, 0);
    }

    #[test]
    fn test_report_counts_skipped() {
        let fs = [
            located("a", 400.0, 35.0, 139.0),
            Facility {
                enabled: false,
                ..located("off", 200.0, 35.5, 139.5)
            },
            Facility::new("pending", 300.0),
        ];
        let report = build_report(&fs, 0.75);
        assert_eq!(report.participants.len(), 1);
        assert_eq!(report.skipped_disabled, 1);
        assert_eq!(report.skipped_unlocated, 1);
        assert!(report.estimate.is_none());
        assert!(report.formatted_estimate.is_none());
    }

    #[test]
    fn test_render_no_estimate_mentions_nothing_positional() {
        let report = build_report(&[], 0.75);
        let text = render_report(&report);
        assert!(text.contains("No estimate"));
        assert!(!text.contains("Estimated position"));
    }
}
