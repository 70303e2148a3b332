//! Closest approach estimation between a reference trajectory and a target.
//!
//! Three mutually exclusive strategies, selected by data availability:
//!
//! 1. **Direct periapsis scan** — a maneuver-predicted periapsis over a
//!    celestial target (see [`crate::patches::lowest_periapsis_altitude`])
//!    is cheaper and more precise than any geometric approximation, so it
//!    wins outright.
//! 2. **Rendered markers** — while the map view is up, the renderer has
//!    already computed intersection/closest-approach geometry; read it.
//! 3. **Analytic root-finding** — no renderer data: minimize separation
//!    between the two conics directly.
//!
//! The tie-break everywhere: smaller distance wins, and a candidate outside
//! its patch window is disqualified outright rather than clamped.

use std::f64::consts::TAU;

use crate::markers::{closest_approach_marker, closest_intersect_marker, Marker};
use crate::orbit::{OrbitPatch, HYPERBOLIC_DOMAIN_FRACTION};

/// Margin for the periapsis/apoapsis band overlap pre-filter, meters.
const PE_AP_MARGIN: f64 = 20_000.0;

/// Bracket width below which candidate refinement stops, radians.
const REFINE_TOLERANCE: f64 = 0.001;

/// Iteration cap for candidate refinement. Hitting the cap is not an error;
/// the bracket midpoint is simply used as-is.
const REFINE_MAX_ITERATIONS: usize = 10;

/// Coarse samples across the reference orbit when bracketing minima.
const COARSE_SAMPLES: usize = 64;

/// Result of one closest-approach estimation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ApproachEstimate {
    /// Whether a usable encounter was found this tick.
    pub intersects: bool,
    /// Separation at the encounter, meters (periapsis altitude for the
    /// direct scan strategy).
    pub distance: f64,
    /// UT of the encounter.
    pub time: f64,
    /// Relative speed at the encounter, m/s. Zero for celestial strategies,
    /// which do not report it.
    pub relative_speed: f64,
}

/// The strategy chosen for this tick's estimation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProximityStrategy<'a> {
    /// A qualifying maneuver-predicted periapsis short-circuits everything.
    DirectPeriapsis { altitude: f64, time: f64 },
    /// Read the renderer's marker list.
    RenderedMarkers(&'a [Marker]),
    /// Minimize conic separation numerically.
    AnalyticRootFind,
}

/// Pure strategy selection over the inputs available this tick.
///
/// `periapsis` is the direct-scan result (celestial targets only; callers
/// pass `None` for vessels). Markers are only usable when present, non-empty
/// and no maneuver nodes are pending — a pending node invalidates the
/// renderer's current-trajectory markers, forcing the analytic path.
pub fn select_strategy<'a>(
    periapsis: Option<(f64, f64)>,
    markers: Option<&'a [Marker]>,
    maneuver_nodes_pending: bool,
) -> ProximityStrategy<'a> {
    if let Some((altitude, time)) = periapsis {
        return ProximityStrategy::DirectPeriapsis { altitude, time };
    }
    match markers {
        Some(list) if !list.is_empty() && !maneuver_nodes_pending => {
            ProximityStrategy::RenderedMarkers(list)
        }
        _ => ProximityStrategy::AnalyticRootFind,
    }
}

/// Run the selected strategy.
///
/// `ref_patch`/`target_patch` feed the analytic strategy; `now_ut` anchors
/// marker delta-time offsets. Expected absences (no markers, mismatched
/// frames, non-convergence, past hyperbolic periapsis) all come back as
/// `intersects == false`, never as errors.
pub fn estimate(
    strategy: ProximityStrategy<'_>,
    ref_patch: Option<&OrbitPatch>,
    target_patch: Option<&OrbitPatch>,
    is_vessel: bool,
    now_ut: f64,
) -> ApproachEstimate {
    match strategy {
        ProximityStrategy::DirectPeriapsis { altitude, time } => ApproachEstimate {
            intersects: true,
            distance: altitude,
            time,
            relative_speed: 0.0,
        },
        ProximityStrategy::RenderedMarkers(markers) => {
            if is_vessel {
                match closest_intersect_marker(markers) {
                    Some((distance, relative_speed, time)) => ApproachEstimate {
                        intersects: true,
                        distance,
                        time,
                        relative_speed,
                    },
                    None => ApproachEstimate::default(),
                }
            } else {
                match closest_approach_marker(markers, now_ut) {
                    Some((distance, time)) => ApproachEstimate {
                        intersects: true,
                        distance,
                        time,
                        relative_speed: 0.0,
                    },
                    None => ApproachEstimate::default(),
                }
            }
        }
        ProximityStrategy::AnalyticRootFind => {
            let (Some(reference), Some(target)) = (ref_patch, target_patch) else {
                return ApproachEstimate::default();
            };
            if is_vessel {
                // A hyperbolic target past periapsis is on its way out of
                // the system; there is no future encounter to report
                if target.eccentricity >= 1.0
                    && target.time_to_periapsis(reference.start_ut) < 0.0
                {
                    return ApproachEstimate::default();
                }
                match closest_vessel_approach(reference, target) {
                    Some((distance, time, relative_speed)) => ApproachEstimate {
                        intersects: true,
                        distance,
                        time,
                        relative_speed,
                    },
                    None => ApproachEstimate::default(),
                }
            } else {
                match closest_celestial_approach(reference, target) {
                    Some((distance, time)) => ApproachEstimate {
                        intersects: true,
                        distance,
                        time,
                        relative_speed: 0.0,
                    },
                    None => ApproachEstimate::default(),
                }
            }
        }
    }
}

/// Celestial analytic strategy: the host solver already computed the
/// closest-approach time on the reference patch; evaluate both trajectories
/// there. Non-positive times mean "not computed" and yield `None`.
pub fn closest_celestial_approach(
    reference: &OrbitPatch,
    target: &OrbitPatch,
) -> Option<(f64, f64)> {
    let ut = reference.closest_target_approach_ut;
    if ut <= 0.0 {
        return None;
    }
    let separation = (reference.position_at_ut(ut) - target.position_at_ut(ut)).length();
    Some((separation, ut))
}

/// Vessel analytic strategy: bounded minimization of conic separation.
///
/// Requires both patches to share a reference body. Up to two candidate
/// true anomalies on the reference orbit are bracketed by a coarse scan of
/// the curve-to-curve distance and refined by golden-section search
/// (tolerance [`REFINE_TOLERANCE`] rad, at most [`REFINE_MAX_ITERATIONS`]
/// steps). Each candidate converts to the first passage UT at or after the
/// patch start; candidates outside the patch window are disqualified.
/// Survivors are ranked by the actual 3-D separation at their UT.
///
/// Returns `(distance, ut, relative_speed)`.
pub fn closest_vessel_approach(
    reference: &OrbitPatch,
    target: &OrbitPatch,
) -> Option<(f64, f64, f64)> {
    if reference.body != target.body {
        return None;
    }
    if !apsis_bands_overlap(reference, target, PE_AP_MARGIN) {
        return None;
    }

    let mut best: Option<(f64, f64)> = None;
    for anomaly in closest_curve_anomalies(reference, target) {
        let Some(ut) = reference.ut_for_true_anomaly(anomaly, reference.start_ut) else {
            continue;
        };
        if !reference.contains_ut(ut) {
            continue;
        }
        let separation = (reference.position_at_ut(ut) - target.position_at_ut(ut)).length();
        if best.is_none_or(|(dist, _)| separation < dist) {
            best = Some((separation, ut));
        }
    }

    let (distance, ut) = best?;
    let relative_speed = (reference.velocity_at_ut(ut) - target.velocity_at_ut(ut)).length();
    Some((distance, ut, relative_speed))
}

/// Quick rejection: two orbits whose radial bands don't overlap (within a
/// margin) can never come close; skip the minimizer entirely.
fn apsis_bands_overlap(a: &OrbitPatch, b: &OrbitPatch, margin: f64) -> bool {
    let a_apoapsis = a.apoapsis_radius().unwrap_or(f64::INFINITY);
    let b_apoapsis = b.apoapsis_radius().unwrap_or(f64::INFINITY);
    a.periapsis_radius() <= b_apoapsis + margin && b.periapsis_radius() <= a_apoapsis + margin
}

/// Distance from the reference-orbit point at `anomaly` to the target curve,
/// taking the target point in the same direction (projected into the
/// target's orbital plane).
fn curve_distance(reference: &OrbitPatch, target: &OrbitPatch, anomaly: f64) -> f64 {
    let point = reference.position_at_true_anomaly(anomaly);
    let target_anomaly = target.true_anomaly_toward(point);
    (point - target.position_at_true_anomaly(target_anomaly)).length()
}

/// Usable true-anomaly domain of the reference orbit: the full turn for
/// elliptic patches (wrapping), a symmetric interval inside the asymptotes
/// for hyperbolic ones.
fn anomaly_domain(patch: &OrbitPatch) -> (f64, f64, bool) {
    if patch.eccentricity < 1.0 {
        (0.0, TAU, true)
    } else {
        let max = patch.max_true_anomaly() * HYPERBOLIC_DOMAIN_FRACTION;
        (-max, max, false)
    }
}

/// Bracket up to two local minima of the curve distance over the reference
/// orbit's anomaly domain and refine each.
fn closest_curve_anomalies(reference: &OrbitPatch, target: &OrbitPatch) -> Vec<f64> {
    let (lo, hi, wraps) = anomaly_domain(reference);
    let step = (hi - lo) / COARSE_SAMPLES as f64;

    let sample_count = if wraps {
        COARSE_SAMPLES
    } else {
        COARSE_SAMPLES + 1
    };
    let samples: Vec<f64> = (0..sample_count)
        .map(|k| curve_distance(reference, target, lo + k as f64 * step))
        .collect();

    // Indices of local minima (non-strict, so flat valleys still register)
    let mut minima: Vec<usize> = Vec::new();
    if wraps {
        for k in 0..sample_count {
            let prev = samples[(k + sample_count - 1) % sample_count];
            let next = samples[(k + 1) % sample_count];
            if samples[k] <= prev && samples[k] <= next {
                minima.push(k);
            }
        }
    } else {
        if samples[0] <= samples[1] {
            minima.push(0);
        }
        for k in 1..sample_count - 1 {
            if samples[k] <= samples[k - 1] && samples[k] <= samples[k + 1] {
                minima.push(k);
            }
        }
        if samples[sample_count - 1] <= samples[sample_count - 2] {
            minima.push(sample_count - 1);
        }
    }

    minima.sort_by(|&a, &b| samples[a].total_cmp(&samples[b]));

    // Keep the two best minima that are angularly distinct
    let mut chosen: Vec<usize> = Vec::with_capacity(2);
    for &index in &minima {
        if chosen.len() == 2 {
            break;
        }
        let distinct = chosen.iter().all(|&other| {
            let gap = (index as isize - other as isize).unsigned_abs();
            let gap = if wraps {
                gap.min(sample_count - gap)
            } else {
                gap
            };
            gap > 3
        });
        if distinct {
            chosen.push(index);
        }
    }

    chosen
        .into_iter()
        .map(|index| {
            let center = lo + index as f64 * step;
            let bracket_lo = (center - step).max(if wraps { f64::NEG_INFINITY } else { lo });
            let bracket_hi = (center + step).min(if wraps { f64::INFINITY } else { hi });
            refine_minimum(
                |anomaly| curve_distance(reference, target, anomaly),
                bracket_lo,
                bracket_hi,
            )
        })
        .collect()
}

/// Golden-section search for the minimum of `f` over `[lo, hi]`, bounded by
/// the refinement tolerance and iteration cap.
fn refine_minimum(f: impl Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> f64 {
    const INV_PHI: f64 = 0.618_033_988_749_894_9;

    let mut left = hi - (hi - lo) * INV_PHI;
    let mut right = lo + (hi - lo) * INV_PHI;
    let mut f_left = f(left);
    let mut f_right = f(right);

    for _ in 0..REFINE_MAX_ITERATIONS {
        if hi - lo < REFINE_TOLERANCE {
            break;
        }
        if f_left < f_right {
            hi = right;
            right = left;
            f_right = f_left;
            left = hi - (hi - lo) * INV_PHI;
            f_left = f(left);
        } else {
            lo = left;
            left = right;
            f_left = f_right;
            right = lo + (hi - lo) * INV_PHI;
            f_right = f(right);
        }
    }

    0.5 * (lo + hi)
}
