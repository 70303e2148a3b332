//! Test utilities for target tracking tests.
//!
//! Provides orbit-patch builders and a small fictional star system with
//! enough hierarchy depth (star, two planets, moons, a sub-moon) to
//! exercise every reference-frame resolution path.

/// Fixtures for creating test orbits and body hierarchies.
pub mod fixtures {
    use crate::bodies::{BodyId, BodyRegistry, CelestialBody};
    use crate::orbit::OrbitPatch;

    /// Gravitational parameter of the fixture star (m³/s²).
    pub const GM_STAR: f64 = 1.172_332_8e18;
    /// Gravitational parameter of a fixture planet (m³/s²).
    pub const GM_PLANET: f64 = 3.5316e12;
    /// Gravitational parameter of a fixture moon (m³/s²).
    pub const GM_MOON: f64 = 6.513_839_8e10;

    /// Circular, equatorial patch starting at `start_ut` on the +x axis.
    pub fn circular_patch(body: BodyId, gm: f64, radius: f64, start_ut: f64) -> OrbitPatch {
        OrbitPatch {
            body,
            gm,
            semi_major_axis: radius,
            eccentricity: 0.0,
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

    /// Equatorial elliptic patch at periapsis at `start_ut`.
    pub fn elliptical_patch(
        body: BodyId,
        gm: f64,
        periapsis_radius: f64,
        apoapsis_radius: f64,
        start_ut: f64,
    ) -> OrbitPatch {
        OrbitPatch::from_apsides(body, gm, periapsis_radius, apoapsis_radius, start_ut)
    }

    /// Equatorial hyperbolic patch passing periapsis at `periapsis_ut`.
    pub fn hyperbolic_patch(
        body: BodyId,
        gm: f64,
        periapsis_radius: f64,
        eccentricity: f64,
        periapsis_ut: f64,
    ) -> OrbitPatch {
        assert!(eccentricity > 1.0, "hyperbolic patch needs e > 1");
        OrbitPatch {
            body,
            gm,
            // a(1 - e) = periapsis radius, so a is negative
            semi_major_axis: periapsis_radius / (1.0 - eccentricity),
            eccentricity,
            inclination: 0.0,
            lan: 0.0,
            arg_periapsis: 0.0,
            mean_anomaly_at_epoch: 0.0,
            epoch: periapsis_ut,
            start_ut: periapsis_ut,
            end_ut: f64::INFINITY,
            active: true,
            closest_target_approach_ut: 0.0,
        }
    }

    /// A fictional system deep enough for every resolver path:
    ///
    /// ```text
    /// star
    /// ├── planet
    /// │   ├── moon_a
    /// │   │   └── submoon
    /// │   └── moon_b
    /// └── outer
    ///     └── moon_outer
    /// ```
    pub struct TestSystem {
        pub registry: BodyRegistry,
        pub star: BodyId,
        pub planet: BodyId,
        pub outer: BodyId,
        pub moon_a: BodyId,
        pub moon_b: BodyId,
        pub submoon: BodyId,
        pub moon_outer: BodyId,
    }

    /// Build the fixture system above.
    pub fn two_planet_system() -> TestSystem {
        let star = BodyId(0);
        let planet = BodyId(1);
        let outer = BodyId(2);
        let moon_a = BodyId(3);
        let moon_b = BodyId(4);
        let submoon = BodyId(5);
        let moon_outer = BodyId(6);

        let mut registry = BodyRegistry::new();
        let mut insert = |body: CelestialBody| {
            registry.insert(body).expect("fixture registry is well-formed");
        };

        insert(CelestialBody {
            id: star,
            name: "star".into(),
            parent: None,
            radius: 261_600_000.0,
            soi_radius: f64::INFINITY,
            orbit: None,
        });
        insert(CelestialBody {
            id: planet,
            name: "planet".into(),
            parent: Some(star),
            radius: 600_000.0,
            soi_radius: 84_000_000.0,
            orbit: Some(circular_patch(star, GM_STAR, 13_599_840_256.0, 0.0)),
        });
        insert(CelestialBody {
            id: outer,
            name: "outer".into(),
            parent: Some(star),
            radius: 320_000.0,
            soi_radius: 47_000_000.0,
            orbit: Some(circular_patch(star, GM_STAR, 20_726_155_264.0, 0.0)),
        });
        insert(CelestialBody {
            id: moon_a,
            name: "moon-a".into(),
            parent: Some(planet),
            radius: 200_000.0,
            soi_radius: 2_400_000.0,
            orbit: Some(circular_patch(planet, GM_PLANET, 12_000_000.0, 0.0)),
        });
        insert(CelestialBody {
            id: moon_b,
            name: "moon-b".into(),
            parent: Some(planet),
            radius: 60_000.0,
            soi_radius: 2_200_000.0,
            orbit: Some(circular_patch(planet, GM_PLANET, 47_000_000.0, 0.0)),
        });
        insert(CelestialBody {
            id: submoon,
            name: "submoon".into(),
            parent: Some(moon_a),
            radius: 10_000.0,
            soi_radius: 120_000.0,
            orbit: Some(circular_patch(moon_a, GM_MOON, 1_000_000.0, 0.0)),
        });
        insert(CelestialBody {
            id: moon_outer,
            name: "moon-outer".into(),
            parent: Some(outer),
            radius: 130_000.0,
            soi_radius: 1_000_000.0,
            orbit: Some(circular_patch(outer, GM_PLANET, 3_200_000.0, 0.0)),
        });

        TestSystem {
            registry,
            star,
            planet,
            outer,
            moon_a,
            moon_b,
            submoon,
            moon_outer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use approx::assert_relative_eq;

    #[test]
    fn test_circular_patch_is_circular() {
        let orbit = fixtures::circular_patch(
            crate::bodies::BodyId(1),
            fixtures::GM_PLANET,
            700_000.0,
            0.0,
        );
        assert_eq!(orbit.eccentricity, 0.0);
        assert_relative_eq!(orbit.periapsis_radius(), 700_000.0);
        assert_relative_eq!(orbit.apoapsis_radius().unwrap(), 700_000.0);
    }

    #[test]
    fn test_hyperbolic_patch_shape() {
        let orbit = fixtures::hyperbolic_patch(
            crate::bodies::BodyId(1),
            fixtures::GM_PLANET,
            700_000.0,
            1.5,
            0.0,
        );
        assert!(orbit.semi_major_axis < 0.0);
        assert!(orbit.period().is_none());
        assert_relative_eq!(orbit.periapsis_radius(), 700_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fixture_system_shape() {
        let system = fixtures::two_planet_system();
        assert_eq!(system.registry.len(), 7);
        assert_eq!(system.registry.root(), Some(system.star));
        assert_eq!(system.registry.parent_of(system.submoon), Some(system.moon_a));
        assert_eq!(system.registry.parent_of(system.moon_outer), Some(system.outer));
    }
}
