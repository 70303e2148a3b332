//! Celestial body hierarchy supplied by the host simulation.
//!
//! The registry is the read-only map this crate walks when reducing two
//! trajectories to a common reference frame: every body knows its parent,
//! its physical radius, its sphere-of-influence radius, and (except for the
//! root star) its own orbit around that parent.

use bevy::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

use crate::orbit::OrbitPatch;

/// Opaque identifier of a celestial body, assigned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// One celestial body in the hierarchy.
#[derive(Clone, Debug)]
pub struct CelestialBody {
    pub id: BodyId,
    pub name: String,
    /// Parent body. `None` only for the root star.
    pub parent: Option<BodyId>,
    /// Physical radius in meters.
    pub radius: f64,
    /// Sphere-of-influence radius in meters (`f64::INFINITY` for the root).
    pub soi_radius: f64,
    /// The body's own orbit around its parent. `None` only for the root.
    pub orbit: Option<OrbitPatch>,
}

/// Errors raised while assembling the body hierarchy from host data.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("body {0:?} registered twice")]
    DuplicateBody(BodyId),
    #[error("body {body:?} references unknown parent {parent:?}")]
    UnknownParent { body: BodyId, parent: BodyId },
    #[error("body {body:?} declared as root but {existing:?} already is")]
    SecondRoot { body: BodyId, existing: BodyId },
    #[error("non-root body {0:?} has no orbit")]
    MissingOrbit(BodyId),
    #[error("orbit of body {body:?} references {orbit_body:?} instead of its parent {parent:?}")]
    OrbitBodyMismatch {
        body: BodyId,
        parent: BodyId,
        orbit_body: BodyId,
    },
}

/// Resource mapping body ids to their data, with the hierarchy validated on
/// insertion. Owned and populated by the host; read-only for this crate.
#[derive(Resource, Default)]
pub struct BodyRegistry {
    bodies: HashMap<BodyId, CelestialBody>,
    root: Option<BodyId>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body. Parents must be registered before their children.
    pub fn insert(&mut self, body: CelestialBody) -> Result<(), RegistryError> {
        if self.bodies.contains_key(&body.id) {
            return Err(RegistryError::DuplicateBody(body.id));
        }
        match body.parent {
            None => {
                if let Some(existing) = self.root {
                    return Err(RegistryError::SecondRoot {
                        body: body.id,
                        existing,
                    });
                }
                self.root = Some(body.id);
            }
            Some(parent) => {
                if !self.bodies.contains_key(&parent) {
                    return Err(RegistryError::UnknownParent {
                        body: body.id,
                        parent,
                    });
                }
                let orbit = body
                    .orbit
                    .as_ref()
                    .ok_or(RegistryError::MissingOrbit(body.id))?;
                if orbit.body != parent {
                    return Err(RegistryError::OrbitBodyMismatch {
                        body: body.id,
                        parent,
                        orbit_body: orbit.body,
                    });
                }
            }
        }
        debug!("registered body {} ({:?})", body.name, body.id);
        self.bodies.insert(body.id, body);
        Ok(())
    }

    pub fn get(&self, id: BodyId) -> Option<&CelestialBody> {
        self.bodies.get(&id)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// The root star, once registered.
    pub fn root(&self) -> Option<BodyId> {
        self.root
    }

    /// Whether `id` is the root star.
    pub fn is_root(&self, id: BodyId) -> bool {
        self.root == Some(id)
    }

    pub fn parent_of(&self, id: BodyId) -> Option<BodyId> {
        self.bodies.get(&id).and_then(|b| b.parent)
    }

    /// A body's own orbit around its parent (`None` for the root or for
    /// unknown ids).
    pub fn orbit_of(&self, id: BodyId) -> Option<&OrbitPatch> {
        self.bodies.get(&id).and_then(|b| b.orbit.as_ref())
    }

    /// Whether the body orbits the root star directly (a "planet-like"
    /// body in frame-resolution terms).
    pub fn is_planet_like(&self, id: BodyId) -> bool {
        match self.parent_of(id) {
            Some(parent) => self.is_root(parent),
            None => false,
        }
    }

    /// Walk the parent chain of `id` up to its topmost ancestor that orbits
    /// the root star directly. Returns `id` itself when it already does.
    /// `None` for the root, for unknown ids, or if the chain is broken.
    pub fn ancestor_orbiting_root(&self, id: BodyId) -> Option<BodyId> {
        let mut current = id;
        // Bounded by the registry size so a malformed chain cannot loop
        for _ in 0..=self.bodies.len() {
            if self.is_root(current) {
                return None;
            }
            if self.is_planet_like(current) {
                return Some(current);
            }
            current = self.parent_of(current)?;
        }
        None
    }
}
