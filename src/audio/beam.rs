//! Static directional emission ("beamforming") via sound cones.
//!
//! A beam is nothing more than a direction vector plus an inner and outer
//! cone on a source. Listeners inside the inner cone hear the source at full
//! gain, listeners outside the outer cone at `outer_gain`, with a linear
//! transition in between.

use crate::driver::{SceneDriver, SourceFloat, SourceHandle, SourceVector, Vec3};
use crate::error::DriverError;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BeamPattern {
    /// Full inner cone angle in degrees
    pub inner_angle: f32,
    /// Full outer cone angle in degrees
    pub outer_angle: f32,
    /// Gain applied outside the outer cone
    pub outer_gain: f32,
}

impl Default for BeamPattern {
    fn default() -> Self {
        Self {
            inner_angle: 30.0,
            outer_angle: 60.0,
            outer_gain: 0.1,
        }
    }
}

impl BeamPattern {
    /// Gain factor for a listener `off_axis` degrees away from the beam axis.
    pub fn attenuation(&self, off_axis: f32) -> f32 {
        let angle = off_axis.abs();
        let inner = self.inner_angle / 2.0;
        let outer = self.outer_angle / 2.0;

        if angle <= inner {
            1.0
        } else if angle >= outer {
            self.outer_gain
        } else {
            let t = (angle - inner) / (outer - inner);
            1.0 + (self.outer_gain - 1.0) * t
        }
    }

    /// Gain factor heard at `listener` from a source at `source` pointing along `direction`.
    ///
    /// A zero direction means the source is omnidirectional.
    pub fn gain_towards(&self, direction: Vec3, source: Vec3, listener: Vec3) -> f32 {
        let to_listener = Vec3::new(
            listener.x - source.x,
            listener.y - source.y,
            listener.z - source.z,
        );
        let norm = direction.length() * to_listener.length();
        if norm == 0.0 {
            return 1.0;
        }

        let cos = (direction.dot(&to_listener) / norm).clamp(-1.0, 1.0);
        self.attenuation(cos.acos().to_degrees())
    }
}

/// Unit vector in the XZ plane, `angle` radians from +X towards +Z.
pub fn direction_from_angle(angle: f32) -> Vec3 {
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

/// Point `source` along `angle` (radians) and narrow it to `pattern`.
pub fn beamform<S: SceneDriver + ?Sized>(
    driver: &S,
    source: SourceHandle,
    angle: f32,
    pattern: &BeamPattern,
) -> Result<Vec3, DriverError> {
    let direction = direction_from_angle(angle);

    driver.set_source_vector(source, SourceVector::Direction, direction)?;
    driver.set_source_float(source, SourceFloat::ConeInnerAngle, pattern.inner_angle)?;
    driver.set_source_float(source, SourceFloat::ConeOuterAngle, pattern.outer_angle)?;
    driver.set_source_float(source, SourceFloat::ConeOuterGain, pattern.outer_gain)?;

    debug!(
        "{} beamed along {} (cones {}/{} deg, outer gain {})",
        source, direction, pattern.inner_angle, pattern.outer_angle, pattern.outer_gain
    );
    Ok(direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::MockScene;
    use mockall::predicate::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn direction_at_forty_five_degrees() {
        let direction = direction_from_angle(45.0f32.to_radians());
        assert!(direction.approx_eq(&Vec3::new(0.7071, 0.0, 0.7071), 1e-4));
        assert!((direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn attenuation_follows_cone_edges() {
        let pattern = BeamPattern::default();
        assert_eq!(pattern.attenuation(0.0), 1.0);
        assert_eq!(pattern.attenuation(15.0), 1.0);
        assert_eq!(pattern.attenuation(-10.0), 1.0);
        assert!((pattern.attenuation(22.5) - 0.55).abs() < 1e-6);
        assert_eq!(pattern.attenuation(30.0), 0.1);
        assert_eq!(pattern.attenuation(170.0), 0.1);
    }

    #[test]
    fn gain_towards_listener_behind_beam() {
        let pattern = BeamPattern::default();
        let forward = Vec3::new(0.0, 0.0, -1.0);
        let source = Vec3::ZERO;

        assert_eq!(
            pattern.gain_towards(forward, source, Vec3::new(0.0, 0.0, -4.0)),
            1.0
        );
        assert_eq!(
            pattern.gain_towards(forward, source, Vec3::new(0.0, 0.0, 4.0)),
            0.1
        );
        assert_eq!(
            pattern.gain_towards(Vec3::ZERO, source, Vec3::new(0.0, 0.0, 4.0)),
            1.0
        );
    }

    #[test]
    fn beamform_sets_direction_and_cones() {
        let source = SourceHandle::from_raw(1);
        let mut driver = MockScene::new();

        driver
            .expect_set_source_vector()
            .with(
                eq(source),
                eq(SourceVector::Direction),
                function(|v: &Vec3| v.approx_eq(&Vec3::new(0.7071, 0.0, 0.7071), 1e-4)),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));
        driver
            .expect_set_source_float()
            .with(eq(source), eq(SourceFloat::ConeInnerAngle), eq(30.0))
            .times(1)
            .returning(|_, _, _| Ok(()));
        driver
            .expect_set_source_float()
            .with(eq(source), eq(SourceFloat::ConeOuterAngle), eq(60.0))
            .times(1)
            .returning(|_, _, _| Ok(()));
        driver
            .expect_set_source_float()
            .with(eq(source), eq(SourceFloat::ConeOuterGain), eq(0.1))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let direction = beamform(&driver, source, FRAC_PI_4, &BeamPattern::default()).unwrap();
        assert!(direction.approx_eq(&Vec3::new(0.7071, 0.0, 0.7071), 1e-4));
    }
}
