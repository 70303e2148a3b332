//! Conic orbit patches: evaluable two-body trajectory segments.
//!
//! An [`OrbitPatch`] is one conic section of a predicted trajectory, bounded
//! by maneuver nodes or sphere-of-influence transitions. Patches are owned
//! and produced by the host simulation's patched-conic solver; this crate
//! only evaluates them. Both elliptic (e < 1) and hyperbolic (e >= 1)
//! segments are supported.
//!
//! Kepler's equation is solved with Newton's method in both regimes.

use bevy::math::DVec3;
use std::f64::consts::TAU;

use crate::bodies::BodyId;

/// One conic segment of a trajectory, in its reference body's inertial frame.
///
/// Angular elements are radians; distances meters; times UT seconds.
/// Immutable for the duration of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitPatch {
    /// Reference body this patch orbits.
    pub body: BodyId,
    /// Standard gravitational parameter of the reference body (m³/s²).
    pub gm: f64,
    /// Semi-major axis in meters. Negative for hyperbolic patches.
    pub semi_major_axis: f64,
    /// Eccentricity (0 circular, <1 elliptic, >=1 hyperbolic).
    pub eccentricity: f64,
    /// Inclination to the reference plane.
    pub inclination: f64,
    /// Longitude of the ascending node.
    pub lan: f64,
    /// Argument of periapsis.
    pub arg_periapsis: f64,
    /// Mean anomaly at `epoch`. For hyperbolic patches this is the
    /// hyperbolic mean anomaly (negative before periapsis).
    pub mean_anomaly_at_epoch: f64,
    /// UT at which `mean_anomaly_at_epoch` holds.
    pub epoch: f64,
    /// Start of the patch's validity window.
    pub start_ut: f64,
    /// End of the patch's validity window (`f64::INFINITY` for the final patch).
    pub end_ut: f64,
    /// Whether the patched-conic solver considers this segment live.
    pub active: bool,
    /// Closest-approach time to the current target, precomputed by the host
    /// solver. Zero or negative when none has been computed.
    pub closest_target_approach_ut: f64,
}

impl OrbitPatch {
    /// Build a patch from periapsis/apoapsis radii (elliptic only).
    pub fn from_apsides(
        body: BodyId,
        gm: f64,
        periapsis_radius: f64,
        apoapsis_radius: f64,
        start_ut: f64,
    ) -> Self {
        debug_assert!(periapsis_radius <= apoapsis_radius);
        let semi_major_axis = 0.5 * (periapsis_radius + apoapsis_radius);
        let eccentricity =
            (apoapsis_radius - periapsis_radius) / (apoapsis_radius + periapsis_radius);
        Self {
            body,
            gm,
            semi_major_axis,
            eccentricity,
            inclination: 0.0,
            lan: 0.0,
            arg_periapsis: 0.0,
            mean_anomaly_at_epoch: 0.0,
            epoch: start_ut,
            start_ut,
            end_ut: f64::INFINITY,
            active: true,
            closest_target_approach_ut: 0.0,
        }
    }

    /// Periapsis radius in meters. `a(1 - e)` is positive in both regimes.
    pub fn periapsis_radius(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Apoapsis radius in meters. `None` for hyperbolic patches.
    pub fn apoapsis_radius(&self) -> Option<f64> {
        if self.eccentricity < 1.0 {
            Some(self.semi_major_axis * (1.0 + self.eccentricity))
        } else {
            None
        }
    }

    /// Semi-latus rectum `a(1 - e²)`, positive in both regimes.
    pub fn semi_latus_rectum(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity * self.eccentricity)
    }

    /// Mean motion in radians per second.
    pub fn mean_motion(&self) -> f64 {
        (self.gm / self.semi_major_axis.abs().powi(3)).sqrt()
    }

    /// Orbital period in seconds. `None` for hyperbolic patches.
    pub fn period(&self) -> Option<f64> {
        if self.eccentricity < 1.0 {
            Some(TAU / self.mean_motion())
        } else {
            None
        }
    }

    /// Mean anomaly at the given UT.
    pub fn mean_anomaly_at_ut(&self, ut: f64) -> f64 {
        self.mean_anomaly_at_epoch + self.mean_motion() * (ut - self.epoch)
    }

    /// Time until the next periapsis passage, in seconds.
    ///
    /// Elliptic patches always report a non-negative value (the next pass).
    /// Hyperbolic patches have a single pass: the value goes negative once
    /// periapsis is behind, which callers treat as "unreachable".
    pub fn time_to_periapsis(&self, ut: f64) -> f64 {
        let n = self.mean_motion();
        let m = self.mean_anomaly_at_ut(ut);
        if self.eccentricity < 1.0 {
            let m = m.rem_euclid(TAU);
            if m == 0.0 { 0.0 } else { (TAU - m) / n }
        } else {
            -m / n
        }
    }

    /// UT of the next periapsis passage relative to `ut`.
    pub fn periapsis_ut(&self, ut: f64) -> f64 {
        ut + self.time_to_periapsis(ut)
    }

    /// Whether `ut` falls inside the patch's validity window.
    pub fn contains_ut(&self, ut: f64) -> bool {
        self.start_ut <= ut && ut <= self.end_ut
    }

    /// Solve Kepler's equation M = E - e·sin(E) for the eccentric anomaly
    /// using Newton's method. Elliptic patches only.
    pub fn solve_eccentric_anomaly(&self, mean_anomaly: f64) -> f64 {
        // Normalize mean anomaly to [0, 2π)
        let m = mean_anomaly.rem_euclid(TAU);

        // Initial guess: E = M for low eccentricity, π for high e
        let mut e_anomaly = if self.eccentricity < 0.8 {
            m
        } else {
            std::f64::consts::PI
        };

        for _ in 0..50 {
            let f = e_anomaly - self.eccentricity * e_anomaly.sin() - m;
            let f_prime = 1.0 - self.eccentricity * e_anomaly.cos();

            let delta = f / f_prime;
            e_anomaly -= delta;

            if delta.abs() < 1e-12 {
                break;
            }
        }

        e_anomaly
    }

    /// Solve the hyperbolic Kepler equation M = e·sinh(H) - H for the
    /// hyperbolic anomaly using Newton's method.
    pub fn solve_hyperbolic_anomaly(&self, mean_anomaly: f64) -> f64 {
        // asinh(M/e) is a good starting point across the whole branch
        let mut h = (mean_anomaly / self.eccentricity).asinh();

        for _ in 0..50 {
            let f = self.eccentricity * h.sinh() - h - mean_anomaly;
            // f' = e·cosh(H) - 1 >= e - 1 > 0, so the step is well defined
            let f_prime = self.eccentricity * h.cosh() - 1.0;

            let delta = f / f_prime;
            h -= delta;

            if delta.abs() < 1e-12 * (1.0 + h.abs()) {
                break;
            }
        }

        h
    }

    /// True anomaly from eccentric anomaly (elliptic).
    pub fn eccentric_to_true_anomaly(&self, eccentric_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        let half = eccentric_anomaly / 2.0;
        // atan2 for full quadrant coverage
        let y = (1.0 + e).sqrt() * half.sin();
        let x = (1.0 - e).sqrt() * half.cos();
        2.0 * y.atan2(x)
    }

    /// True anomaly from hyperbolic anomaly.
    pub fn hyperbolic_to_true_anomaly(&self, hyperbolic_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        let ratio = ((e + 1.0) / (e - 1.0)).sqrt();
        2.0 * (ratio * (hyperbolic_anomaly / 2.0).tanh()).atan()
    }

    /// True anomaly at the given UT.
    pub fn true_anomaly_at_ut(&self, ut: f64) -> f64 {
        let m = self.mean_anomaly_at_ut(ut);
        if self.eccentricity < 1.0 {
            self.eccentric_to_true_anomaly(self.solve_eccentric_anomaly(m))
        } else {
            self.hyperbolic_to_true_anomaly(self.solve_hyperbolic_anomaly(m))
        }
    }

    /// Maximum reachable |true anomaly|. `TAU` for elliptic patches, the
    /// asymptote angle `acos(-1/e)` for hyperbolic ones.
    pub fn max_true_anomaly(&self) -> f64 {
        if self.eccentricity < 1.0 {
            TAU
        } else {
            (-(1.0 / self.eccentricity)).acos()
        }
    }

    /// Mean anomaly corresponding to a true anomaly.
    ///
    /// Returns `None` for a hyperbolic patch when the anomaly lies at or
    /// beyond the asymptote (the orbit never reaches that direction).
    pub fn mean_anomaly_of_true(&self, true_anomaly: f64) -> Option<f64> {
        let e = self.eccentricity;
        if e < 1.0 {
            let half = true_anomaly / 2.0;
            let y = (1.0 - e).sqrt() * half.sin();
            let x = (1.0 + e).sqrt() * half.cos();
            let ecc_anomaly = 2.0 * y.atan2(x);
            Some(ecc_anomaly - e * ecc_anomaly.sin())
        } else {
            if true_anomaly.abs() >= self.max_true_anomaly() {
                return None;
            }
            let arg = ((e - 1.0) / (e + 1.0)).sqrt() * (true_anomaly / 2.0).tan();
            if arg.abs() >= 1.0 {
                return None;
            }
            let h = 2.0 * arg.atanh();
            Some(e * h.sinh() - h)
        }
    }

    /// First UT at or after `after_ut` when the orbit reaches the given true
    /// anomaly.
    ///
    /// For elliptic patches the passage repeats every period, so the result
    /// is shifted by whole periods to land at or after `after_ut`. Hyperbolic
    /// patches have a single passage whose UT is returned as-is (it may lie
    /// before `after_ut`; patch-window checks reject it downstream). Returns
    /// `None` when the anomaly is unreachable.
    pub fn ut_for_true_anomaly(&self, true_anomaly: f64, after_ut: f64) -> Option<f64> {
        let m_target = self.mean_anomaly_of_true(true_anomaly)?;
        let n = self.mean_motion();
        let t = self.epoch + (m_target - self.mean_anomaly_at_epoch) / n;
        if let Some(period) = self.period() {
            let k = ((after_ut - t) / period).ceil();
            Some(t + k * period)
        } else {
            Some(t)
        }
    }

    /// Orbital radius at a true anomaly.
    pub fn radius_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        self.semi_latus_rectum() / (1.0 + self.eccentricity * true_anomaly.cos())
    }

    /// Body-centered position at a true anomaly.
    pub fn position_at_true_anomaly(&self, true_anomaly: f64) -> DVec3 {
        let r = self.radius_at_true_anomaly(true_anomaly);
        let perifocal = DVec3::new(r * true_anomaly.cos(), r * true_anomaly.sin(), 0.0);
        self.perifocal_to_frame(perifocal)
    }

    /// Body-centered velocity at a true anomaly.
    pub fn velocity_at_true_anomaly(&self, true_anomaly: f64) -> DVec3 {
        let scale = (self.gm / self.semi_latus_rectum()).sqrt();
        let perifocal = DVec3::new(
            -scale * true_anomaly.sin(),
            scale * (self.eccentricity + true_anomaly.cos()),
            0.0,
        );
        self.perifocal_to_frame(perifocal)
    }

    /// Body-centered position at the given UT.
    pub fn position_at_ut(&self, ut: f64) -> DVec3 {
        self.position_at_true_anomaly(self.true_anomaly_at_ut(ut))
    }

    /// Body-centered velocity at the given UT.
    pub fn velocity_at_ut(&self, ut: f64) -> DVec3 {
        self.velocity_at_true_anomaly(self.true_anomaly_at_ut(ut))
    }

    /// Unit normal of the orbital plane.
    pub fn normal(&self) -> DVec3 {
        self.perifocal_to_frame(DVec3::Z)
    }

    /// True anomaly of the point on this orbit's plane closest in direction
    /// to `point` (the direction's perifocal longitude). Hyperbolic patches
    /// clamp into the reachable branch.
    pub fn true_anomaly_toward(&self, point: DVec3) -> f64 {
        let local = self.frame_to_perifocal(point);
        let anomaly = local.y.atan2(local.x);
        if self.eccentricity < 1.0 {
            anomaly
        } else {
            let max = self.max_true_anomaly() * HYPERBOLIC_DOMAIN_FRACTION;
            anomaly.clamp(-max, max)
        }
    }

    /// Rotate a perifocal-frame vector into the reference body's frame:
    /// Rz(Ω) · Rx(i) · Rz(ω).
    fn perifocal_to_frame(&self, v: DVec3) -> DVec3 {
        let v = rotate_z(v, self.arg_periapsis);
        let v = rotate_x(v, self.inclination);
        rotate_z(v, self.lan)
    }

    /// Inverse of [`Self::perifocal_to_frame`].
    fn frame_to_perifocal(&self, v: DVec3) -> DVec3 {
        let v = rotate_z(v, -self.lan);
        let v = rotate_x(v, -self.inclination);
        rotate_z(v, -self.arg_periapsis)
    }
}

/// Fraction of the hyperbolic asymptote angle considered usable; radii
/// diverge unboundedly as the anomaly approaches the asymptote itself.
pub const HYPERBOLIC_DOMAIN_FRACTION: f64 = 0.95;

fn rotate_z(v: DVec3, angle: f64) -> DVec3 {
    let (sin, cos) = angle.sin_cos();
    DVec3::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos, v.z)
}

fn rotate_x(v: DVec3, angle: f64) -> DVec3 {
    let (sin, cos) = angle.sin_cos();
    DVec3::new(v.x, v.y * cos - v.z * sin, v.y * sin + v.z * cos)
}
