//! Reference frame resolution for trajectories around different bodies.
//!
//! Comparing a ship with a target only makes sense once both trajectories
//! are expressed around a common reference body. When they already share
//! one, nothing happens. Otherwise each side's parent chain is walked and
//! both trajectories are projected down to the shallowest common orbital
//! level: two craft around moons of the same planet compare one level up,
//! anything further apart compares at the star-relative level.

use crate::bodies::{BodyId, BodyRegistry};
use crate::orbit::OrbitPatch;

/// A pair of orbits reduced to a common reference frame.
///
/// A successfully resolved pair shares a reference body except in the
/// cross-system shallow cases where only the star-relative projection of
/// one side exists; estimation re-checks frame equality at its boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct PhasingPair {
    pub ship: OrbitPatch,
    pub target: OrbitPatch,
}

impl PhasingPair {
    /// Whether both phasing orbits share a reference body.
    pub fn shares_reference_frame(&self) -> bool {
        self.ship.body == self.target.body
    }
}

/// Reduce `ship` and `target` to a common reference frame.
///
/// Returns `None` when a parent walk runs off the registry (a body missing
/// or a malformed chain) — the explicit-failure case. Pure and idempotent:
/// resolving the same inputs twice yields identical pairs.
pub fn resolve(
    registry: &BodyRegistry,
    ship: &OrbitPatch,
    target: &OrbitPatch,
) -> Option<PhasingPair> {
    // Shared frame: nothing to reduce
    if ship.body == target.body {
        return Some(PhasingPair {
            ship: ship.clone(),
            target: target.clone(),
        });
    }

    if registry.is_root(target.body) {
        // Target orbits the star directly: lift the ship to the
        // star-relative level
        let ship_phasing = lift_to_root(registry, ship)?;
        return Some(PhasingPair {
            ship: ship_phasing,
            target: target.clone(),
        });
    }

    // Target is a moon (or deeper): find its topmost planet-like ancestor
    let target_parent = registry.ancestor_orbiting_root(target.body)?;

    if ship_in_planet_frame(registry, ship.body) {
        let target_phasing = if ship.body == target_parent {
            target.clone()
        } else {
            registry.orbit_of(target_parent)?.clone()
        };
        return Some(PhasingPair {
            ship: ship.clone(),
            target: target_phasing,
        });
    }

    // Ship is itself around a deep moon
    let ship_parent = registry.ancestor_orbiting_root(ship.body)?;

    if ship_parent == target_parent {
        // Siblings in the same planetary system: compare one level up
        Some(PhasingPair {
            ship: registry.orbit_of(ship.body)?.clone(),
            target: target.clone(),
        })
    } else {
        // Unrelated systems: compare at the star-relative level
        Some(PhasingPair {
            ship: registry.orbit_of(ship_parent)?.clone(),
            target: registry.orbit_of(target_parent)?.clone(),
        })
    }
}

/// Walk an orbit's reference chain up until it is around the root star.
fn lift_to_root(registry: &BodyRegistry, orbit: &OrbitPatch) -> Option<OrbitPatch> {
    let mut current = orbit.clone();
    for _ in 0..=registry.len() {
        if registry.is_root(current.body) {
            return Some(current);
        }
        current = registry.orbit_of(current.body)?.clone();
    }
    None
}

/// Whether an orbit's reference body is the root star or a direct satellite
/// of it (the frames that need no lifting on the ship side).
fn ship_in_planet_frame(registry: &BodyRegistry, body: BodyId) -> bool {
    registry.is_root(body) || registry.is_planet_like(body)
}
