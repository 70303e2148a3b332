//! Per-tick target state tracking.
//!
//! The tracker is the orchestrator: it validates the current target,
//! classifies it, resolves the reference frames, picks an approach
//! estimation strategy, and publishes one immutable [`ProximitySnapshot`]
//! per tick. The snapshot is entirely replaced each tick, never mutated in
//! place, so display consumers can read it without coordination.
//!
//! The tracker keeps exactly two pieces of cross-tick state: the last
//! published snapshot (held by the plugin as a resource) and the cached
//! marker list, which is cleared whenever validation fails.

use bevy::prelude::*;

use crate::approach::{self, ApproachEstimate};
use crate::bodies::{BodyId, BodyRegistry};
use crate::markers::{Marker, RenderedMarkers};
use crate::orbit::OrbitPatch;
use crate::patches::{lowest_periapsis_altitude, select_reference_patch, PatchChain};
use crate::phasing::{resolve, PhasingPair};
use crate::types::VesselSituation;

/// Classification of the current target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TargetKind {
    /// No usable target (or a target that is neither vessel nor body).
    #[default]
    None,
    /// Another vessel.
    Vessel,
    /// A celestial body.
    Celestial,
}

/// The host simulation's handle on whatever is currently targeted.
///
/// A target with an associated vessel classifies as [`TargetKind::Vessel`];
/// one with no vessel but a celestial body attached to its orbit driver as
/// [`TargetKind::Celestial`]; anything else as [`TargetKind::None`].
#[derive(Clone, Debug, Default)]
pub struct TargetHandle {
    /// Situation of the associated vessel, when the target is a vessel.
    pub vessel: Option<VesselSituation>,
    /// Celestial body attached to the target's orbit driver, if any.
    pub body: Option<BodyId>,
    /// The target's trajectory.
    pub orbit: Option<OrbitPatch>,
}

/// The active vessel as reported by the host each tick.
#[derive(Clone, Debug, Default)]
pub struct ActiveVessel {
    pub orbit: Option<OrbitPatch>,
    pub situation: VesselSituation,
    pub target: Option<TargetHandle>,
    /// Patch chain from the patched-conic solver; `None` when the vessel
    /// has no solver attached.
    pub patches: Option<PatchChain>,
}

/// Host-updated per-tick flight data.
#[derive(Resource, Default)]
pub struct FlightState {
    pub vessel: Option<ActiveVessel>,
    /// Current universal time, seconds.
    pub now_ut: f64,
}

/// Master switch for tracking, toggled by the host (typically with panel
/// visibility). Evaluation with tracking disabled is the cheap early exit.
#[derive(Resource)]
pub struct TrackingEnabled(pub bool);

impl Default for TrackingEnabled {
    fn default() -> Self {
        Self(true)
    }
}

/// Tunable settings for the tracker.
#[derive(Resource, Clone, Debug)]
pub struct TrackingSettings {
    /// How many patches ahead scans may look, sourced from the host's
    /// global conic-patch-limit setting. Never below 1.
    pub patch_limit: usize,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self { patch_limit: 3 }
    }
}

impl TrackingSettings {
    /// Set the patch limit, clamping anything below 1 up to 1.
    pub fn set_patch_limit(&mut self, limit: usize) {
        self.patch_limit = limit.max(1);
    }
}

/// The per-tick result published for display consumers. Read-only for
/// everyone but the tracker, which replaces it wholesale each tick.
#[derive(Resource, Clone, Debug, Default)]
pub struct ProximitySnapshot {
    /// Whether the rest of the snapshot is meaningful this tick.
    pub valid: bool,
    pub target_kind: TargetKind,
    /// The targeted body, for celestial targets.
    pub target_body: Option<BodyId>,
    /// Whether a usable encounter was found.
    pub intersects: bool,
    /// Separation at the encounter, meters.
    pub closest_distance: f64,
    /// UT of the encounter.
    pub closest_time: f64,
    /// Relative speed at the encounter, m/s.
    pub closest_relative_speed: f64,
    /// The resolved common-frame orbit pair, when resolution succeeded.
    pub phasing: Option<PhasingPair>,
    /// Whether a phase-angle readout is meaningful for this geometry.
    pub show_phase_angle: bool,
}

/// Read-only borrows of everything one evaluation needs — the explicit
/// context object that replaces the original's process-wide statics.
pub struct TrackingInputs<'a> {
    pub registry: &'a BodyRegistry,
    pub vessel: Option<&'a ActiveVessel>,
    /// Renderer markers; `Some` only while the 2-D map view is active.
    pub markers: Option<&'a [Marker]>,
    /// Current universal time, seconds.
    pub now_ut: f64,
}

/// The tracker itself. Owns the cached marker list; everything else flows
/// through [`TrackingInputs`] each tick.
#[derive(Resource, Default)]
pub struct TargetTracker {
    cached_markers: Vec<Marker>,
    last_kind: TargetKind,
}

/// Everything validation established about this tick's target.
struct ValidTarget<'a> {
    ship_orbit: &'a OrbitPatch,
    target_orbit: &'a OrbitPatch,
    kind: TargetKind,
    target_body: Option<BodyId>,
}

impl TargetTracker {
    /// Evaluate one tick and produce the snapshot to publish.
    ///
    /// With tracking disabled, returns the default (invalid, all-zero)
    /// snapshot without touching anything else. A validation failure also
    /// returns the default snapshot and clears the cached marker list.
    pub fn evaluate(
        &mut self,
        inputs: &TrackingInputs<'_>,
        settings: &TrackingSettings,
        tracking_enabled: bool,
    ) -> ProximitySnapshot {
        if !tracking_enabled {
            return ProximitySnapshot::default();
        }

        let Some(vessel) = inputs.vessel else {
            return self.invalidate();
        };
        let Some(valid) = validate_target(inputs.registry, vessel) else {
            return self.invalidate();
        };

        if valid.kind != self.last_kind {
            debug!("target classification: {:?} -> {:?}", self.last_kind, valid.kind);
            self.last_kind = valid.kind;
        }

        let mut snapshot = ProximitySnapshot {
            valid: true,
            target_kind: valid.kind,
            target_body: valid.target_body,
            ..Default::default()
        };

        // Frame reduction; in the shared-frame case the raw orbits are
        // already the phasing pair
        if valid.ship_orbit.body == valid.target_orbit.body {
            snapshot.phasing = Some(PhasingPair {
                ship: valid.ship_orbit.clone(),
                target: valid.target_orbit.clone(),
            });
        } else {
            // A phase-angle readout only means something when the ship is
            // itself orbiting a body that orbits something else
            snapshot.show_phase_angle = !inputs.registry.is_root(valid.ship_orbit.body);
            snapshot.phasing = resolve(inputs.registry, valid.ship_orbit, valid.target_orbit);
        }

        if valid.kind == TargetKind::None {
            return snapshot;
        }

        // No meaningful closest-approach data while surface-bound
        if vessel.situation.is_surface_bound() {
            return snapshot;
        }

        let estimate = self.estimate_approach(inputs, settings, vessel, &valid);
        snapshot.intersects = estimate.intersects;
        snapshot.closest_distance = estimate.distance;
        snapshot.closest_time = estimate.time;
        snapshot.closest_relative_speed = estimate.relative_speed;

        snapshot
    }

    /// Run strategy selection and estimation for a validated target.
    fn estimate_approach(
        &mut self,
        inputs: &TrackingInputs<'_>,
        settings: &TrackingSettings,
        vessel: &ActiveVessel,
        valid: &ValidTarget<'_>,
    ) -> ApproachEstimate {
        // Without a patched-conic solver there is nothing to estimate from
        let Some(chain) = vessel.patches.as_ref() else {
            return ApproachEstimate::default();
        };

        let is_vessel = valid.kind == TargetKind::Vessel;

        // A landed or splashed target vessel offers no encounter
        if let Some(target_situation) = vessel.target.as_ref().and_then(|t| t.vessel) {
            if target_situation.is_landed_or_splashed() {
                return ApproachEstimate::default();
            }
        }

        // Refresh the marker cache while the map view is up
        let markers: Option<&[Marker]> = match inputs.markers {
            Some(live) => {
                if self.cached_markers.is_empty() {
                    self.cached_markers = live.to_vec();
                }
                (!self.cached_markers.is_empty()).then_some(self.cached_markers.as_slice())
            }
            None => None,
        };

        // Strategy 1 input: the maneuver-predicted periapsis scan
        let periapsis = valid
            .target_body
            .and_then(|id| inputs.registry.get(id))
            .and_then(|body| {
                lowest_periapsis_altitude(chain, body, settings.patch_limit.max(1))
            });

        let strategy = approach::select_strategy(periapsis, markers, chain.has_maneuver_nodes());

        // Reference patch for the analytic path: maneuver-aware selection
        // when nodes are pending, the currently-flown patch otherwise
        let ref_patch = if chain.has_maneuver_nodes() {
            if is_vessel {
                select_reference_patch(chain, valid.target_orbit.body, None)
            } else {
                select_reference_patch(
                    chain,
                    valid.target_body.expect("celestial target has a body"),
                    Some(valid.target_orbit.body),
                )
            }
        } else {
            chain.current()
        };

        approach::estimate(
            strategy,
            ref_patch,
            Some(valid.target_orbit),
            is_vessel,
            inputs.now_ut,
        )
    }

    /// The `Invalid` transition: clear cached markers, publish nothing.
    fn invalidate(&mut self) -> ProximitySnapshot {
        self.cached_markers.clear();
        ProximitySnapshot::default()
    }
}

/// Check the validation preconditions and classify the target.
///
/// A meaningful result needs an active vessel with a target, and both ends
/// must expose an orbit whose reference body the registry knows.
fn validate_target<'a>(
    registry: &BodyRegistry,
    vessel: &'a ActiveVessel,
) -> Option<ValidTarget<'a>> {
    let ship_orbit = vessel.orbit.as_ref()?;
    if !registry.contains(ship_orbit.body) {
        return None;
    }
    let target = vessel.target.as_ref()?;
    let target_orbit = target.orbit.as_ref()?;
    if !registry.contains(target_orbit.body) {
        return None;
    }

    let (kind, target_body) = if target.vessel.is_some() {
        (TargetKind::Vessel, None)
    } else {
        match target.body.filter(|&id| registry.contains(id)) {
            Some(id) => (TargetKind::Celestial, Some(id)),
            None => (TargetKind::None, None),
        }
    };

    Some(ValidTarget {
        ship_orbit,
        target_orbit,
        kind,
        target_body,
    })
}

/// Plugin wiring the tracker into the host's fixed tick.
///
/// The host populates [`BodyRegistry`], [`FlightState`], [`RenderedMarkers`]
/// and toggles [`TrackingEnabled`]; the plugin publishes
/// [`ProximitySnapshot`].
pub struct TargetTrackingPlugin;

impl Plugin for TargetTrackingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BodyRegistry>()
            .init_resource::<FlightState>()
            .init_resource::<RenderedMarkers>()
            .init_resource::<TrackingEnabled>()
            .init_resource::<TrackingSettings>()
            .init_resource::<TargetTracker>()
            .init_resource::<ProximitySnapshot>()
            .add_systems(FixedUpdate, update_target_tracking);
    }
}

/// Per-tick system: bundle the host resources into [`TrackingInputs`] and
/// replace the published snapshot.
fn update_target_tracking(
    registry: Res<BodyRegistry>,
    flight: Res<FlightState>,
    rendered: Res<RenderedMarkers>,
    enabled: Res<TrackingEnabled>,
    settings: Res<TrackingSettings>,
    mut tracker: ResMut<TargetTracker>,
    mut snapshot: ResMut<ProximitySnapshot>,
) {
    let inputs = TrackingInputs {
        registry: &registry,
        vessel: flight.vessel.as_ref(),
        markers: rendered
            .map_view_active
            .then_some(rendered.markers.as_slice()),
        now_ut: flight.now_ut,
    };
    *snapshot = tracker.evaluate(&inputs, &settings, enabled.0);
}
