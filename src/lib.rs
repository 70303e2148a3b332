//! Encounter - Target Proximity Tracking
//!
//! A library crate providing the target-proximity and reference-frame
//! resolution engine for patched-conic orbital simulations: every tick it
//! determines whether the active vessel's trajectory comes close to the
//! chosen target, by how much, when, and at what relative speed, and
//! publishes one immutable snapshot for display consumers.

pub mod angles;
pub mod approach;
pub mod bodies;
pub mod markers;
pub mod orbit;
pub mod patches;
pub mod phasing;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod proptest_geometry;
#[cfg(test)]
pub mod test_utils;
