//! Geometric markers published by the host's 2-D map renderer.
//!
//! While the map visualization is active, the renderer maintains up to two
//! orbit-intersection markers (for vessel targets) and a closest-approach
//! marker (for celestial targets). This module is the typed query surface
//! for that data; the tracker prefers it over analytic root-finding because
//! the renderer has already paid for the geometry.
//!
//! Marker separations arrive in kilometers, matching the renderer's display
//! units, and are scaled to meters here.

use bevy::prelude::*;

/// Scale factor from marker separation units (km) to meters.
pub const MARKER_SEPARATION_SCALE: f64 = 1000.0;

/// One marker from the map renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Marker {
    /// Orbit-intersection marker for a vessel target. The renderer tags the
    /// two it can display with slot numbers 1 and 2.
    Intersect {
        slot: u8,
        /// Separation at the intersection, kilometers.
        separation: f64,
        /// Relative speed at the intersection, m/s.
        relative_speed: f64,
        /// Absolute UT of the intersection.
        ut: f64,
    },
    /// Closest-approach marker for a celestial target.
    ClosestApproach {
        /// Separation at closest approach, kilometers.
        separation: f64,
        /// Signed delta-time offset; absolute time = now - offset.
        time_offset: f64,
    },
}

/// Resource owned by the host renderer exposing the current marker list.
/// The list is only meaningful while `map_view_active` is set.
#[derive(Resource, Default)]
pub struct RenderedMarkers {
    pub map_view_active: bool,
    pub markers: Vec<Marker>,
}

/// Pick the closer of the slot-1 and slot-2 intersection markers.
///
/// Returns `(separation_m, relative_speed, ut)`. The first marker found per
/// slot wins; a slot with no marker simply drops out of the comparison.
pub fn closest_intersect_marker(markers: &[Marker]) -> Option<(f64, f64, f64)> {
    let mut slot_one = None;
    let mut slot_two = None;

    for marker in markers {
        if let Marker::Intersect {
            slot,
            separation,
            relative_speed,
            ut,
        } = *marker
        {
            let entry = (separation, relative_speed, ut);
            match slot {
                1 if slot_one.is_none() => slot_one = Some(entry),
                2 if slot_two.is_none() => slot_two = Some(entry),
                _ => {}
            }
        }
    }

    let closest = match (slot_one, slot_two) {
        (Some(one), Some(two)) => {
            if one.0 > two.0 {
                Some(two)
            } else {
                Some(one)
            }
        }
        (Some(one), None) => Some(one),
        (None, Some(two)) => Some(two),
        (None, None) => None,
    };

    closest.map(|(separation, relative_speed, ut)| {
        (separation * MARKER_SEPARATION_SCALE, relative_speed, ut)
    })
}

/// Read the first closest-approach marker, converting its signed delta-time
/// offset to an absolute UT. Returns `(separation_m, ut)`.
pub fn closest_approach_marker(markers: &[Marker], now_ut: f64) -> Option<(f64, f64)> {
    markers.iter().find_map(|marker| match *marker {
        Marker::ClosestApproach {
            separation,
            time_offset,
        } => Some((separation * MARKER_SEPARATION_SCALE, now_ut - time_offset)),
        _ => None,
    })
}
