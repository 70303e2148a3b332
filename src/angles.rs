//! Angular readout geometry derived from a resolved phasing pair.
//!
//! The display layer polls these values and owns all formatting and
//! visibility policy; only the math lives here. All results are degrees.

use bevy::math::DVec3;

use crate::orbit::OrbitPatch;
use crate::types::RAD_TO_DEG;

/// Phase angle from the ship-phasing position to the target-phasing
/// position, measured about the ship-phasing orbit normal.
///
/// Degrees in `[0, 360)`: positive values mean the target leads the ship in
/// its direction of motion. Returns 0 for degenerate (zero-length) inputs.
pub fn phase_angle(ship: &OrbitPatch, target: &OrbitPatch, ut: f64) -> f64 {
    let normal = ship.normal();
    let ship_pos = ship.position_at_ut(ut);
    let target_pos = target.position_at_ut(ut);
    // Compare in the ship's orbital plane
    let target_in_plane = target_pos - normal * target_pos.dot(normal);

    signed_angle_about(ship_pos, target_in_plane, normal)
}

/// Angle between two orbital planes, degrees in `[0, 180]`.
pub fn relative_inclination(a: &OrbitPatch, b: &OrbitPatch) -> f64 {
    a.normal().angle_between(b.normal()) * RAD_TO_DEG
}

/// Angle from the ship's body-centered position to its reference body's
/// prograde direction, measured about the body's orbit normal.
///
/// Meaningful when the ship orbits a body that itself orbits something
/// else (ejection-angle planning). Degrees in `[0, 360)`.
pub fn angle_to_prograde(ship_orbit: &OrbitPatch, body_orbit: &OrbitPatch, ut: f64) -> f64 {
    let normal = body_orbit.normal();
    let prograde = body_orbit.velocity_at_ut(ut);
    let ship_pos = ship_orbit.position_at_ut(ut);
    let ship_in_plane = ship_pos - normal * ship_pos.dot(normal);

    signed_angle_about(prograde, ship_in_plane, normal)
}

/// Signed angle from `from` to `to` about `axis`, degrees in `[0, 360)`.
fn signed_angle_about(from: DVec3, to: DVec3, axis: DVec3) -> f64 {
    if from.length_squared() < f64::EPSILON || to.length_squared() < f64::EPSILON {
        return 0.0;
    }
    let angle = from.angle_between(to);
    let angle = if from.cross(to).dot(axis) < 0.0 {
        std::f64::consts::TAU - angle
    } else {
        angle
    };
    (angle * RAD_TO_DEG).rem_euclid(360.0)
}
