//! Maneuver patch chains from the host's patched-conic solver.
//!
//! The solver hands over an ordered list of conic segments: index 0 is the
//! currently-flown patch, higher indices are future segments created by
//! maneuver nodes or sphere-of-influence transitions. Scans are bounded by
//! the configurable patch limit.

use crate::bodies::{BodyId, CelestialBody};
use crate::orbit::OrbitPatch;

/// Ordered conic segments plus the number of pending maneuver nodes.
#[derive(Clone, Debug, Default)]
pub struct PatchChain {
    /// Index 0 = current patch, ascending into the future.
    pub patches: Vec<OrbitPatch>,
    /// Maneuver nodes still scheduled on this chain.
    pub maneuver_node_count: usize,
}

impl PatchChain {
    pub fn new(patches: Vec<OrbitPatch>) -> Self {
        Self {
            patches,
            maneuver_node_count: 0,
        }
    }

    /// The currently-flown patch.
    pub fn current(&self) -> Option<&OrbitPatch> {
        self.patches.first()
    }

    pub fn has_maneuver_nodes(&self) -> bool {
        self.maneuver_node_count > 0
    }
}

/// Scan the chain for the lowest maneuver-predicted periapsis over the
/// target body.
///
/// A patch qualifies when it is active, orbits the target body, its
/// time-to-periapsis (from the patch start) is positive, the periapsis
/// occurs before the patch's end, and the periapsis radius lies strictly
/// between the body's surface and its sphere of influence. Returns the
/// minimum periapsis altitude and its UT, or `None` when nothing qualifies.
pub fn lowest_periapsis_altitude(
    chain: &PatchChain,
    target: &CelestialBody,
    patch_limit: usize,
) -> Option<(f64, f64)> {
    let limit = patch_limit.max(1).min(chain.patches.len());
    let mut best: Option<(f64, f64)> = None;

    for patch in &chain.patches[..limit] {
        if !patch.active || patch.body != target.id {
            continue;
        }
        let time_to_pe = patch.time_to_periapsis(patch.start_ut);
        if time_to_pe <= 0.0 {
            continue;
        }
        let pe_ut = patch.start_ut + time_to_pe;
        if pe_ut >= patch.end_ut {
            continue;
        }
        let pe_radius = patch.periapsis_radius();
        if pe_radius <= target.radius || pe_radius >= target.soi_radius {
            continue;
        }
        let altitude = pe_radius - target.radius;
        if best.is_none_or(|(alt, _)| altitude < alt) {
            best = Some((altitude, pe_ut));
        }
    }

    best
}

/// Select the patch the estimator should measure approaches from, walking
/// the chain from the farthest future patch backwards.
///
/// For vessel targets (`celestial_parent` is `None`) the reference patch is
/// the farthest active segment sharing the target orbit's reference body.
/// For celestial targets, a patch already inside the target body's sphere of
/// influence yields its *predecessor* (the approach segment); otherwise the
/// farthest active patch around the target's own reference body is used.
pub fn select_reference_patch<'a>(
    chain: &'a PatchChain,
    target_body: BodyId,
    celestial_parent: Option<BodyId>,
) -> Option<&'a OrbitPatch> {
    match celestial_parent {
        None => chain
            .patches
            .iter()
            .rev()
            .find(|patch| patch.active && patch.body == target_body),
        Some(parent) => {
            for (index, patch) in chain.patches.iter().enumerate().rev() {
                if !patch.active {
                    continue;
                }
                if patch.body == target_body && index > 0 {
                    return Some(&chain.patches[index - 1]);
                }
                if patch.body == parent {
                    return Some(patch);
                }
            }
            None
        }
    }
}
