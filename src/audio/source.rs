use crate::driver::{
    BufferHandle, PlaybackState, SceneDriver, SourceFloat, SourceHandle, SourceVector, Vec3,
};
use crate::error::DriverError;
use log::debug;

/// Playback parameters applied when a source is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceParams {
    pub pitch: f32,
    pub gain: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub looping: bool,
}

impl Default for SourceParams {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            gain: 1.0,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            looping: false,
        }
    }
}

impl SourceParams {
    pub fn at(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            ..Self::default()
        }
    }
}

/// Everything the driver reports about a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceSnapshot {
    pub params: SourceParams,
    pub buffer: Option<BufferHandle>,
    pub direction: Vec3,
    pub state: PlaybackState,
}

/// Create a source at `position`, bind `buffer` and start playing it once.
pub fn create_3d_source<S: SceneDriver + ?Sized>(
    driver: &S,
    buffer: BufferHandle,
    position: Vec3,
    velocity: Vec3,
) -> Result<SourceHandle, DriverError> {
    create_source_with(driver, buffer, &SourceParams::at(position, velocity))
}

pub fn create_source_with<S: SceneDriver + ?Sized>(
    driver: &S,
    buffer: BufferHandle,
    params: &SourceParams,
) -> Result<SourceHandle, DriverError> {
    let source = driver.gen_source()?;

    driver.set_source_float(source, SourceFloat::Pitch, params.pitch)?;
    driver.set_source_float(source, SourceFloat::Gain, params.gain)?;
    driver.set_source_vector(source, SourceVector::Position, params.position)?;
    driver.set_source_vector(source, SourceVector::Velocity, params.velocity)?;
    driver.set_source_looping(source, params.looping)?;
    driver.set_source_buffer(source, Some(buffer))?;
    driver.play_source(source)?;

    debug!("{} playing {} at {}", source, buffer, params.position);
    Ok(source)
}

pub fn source_params<S: SceneDriver + ?Sized>(
    driver: &S,
    source: SourceHandle,
) -> Result<SourceSnapshot, DriverError> {
    Ok(SourceSnapshot {
        params: SourceParams {
            pitch: driver.source_float(source, SourceFloat::Pitch)?,
            gain: driver.source_float(source, SourceFloat::Gain)?,
            position: driver.source_vector(source, SourceVector::Position)?,
            velocity: driver.source_vector(source, SourceVector::Velocity)?,
            looping: driver.source_looping(source)?,
        },
        buffer: driver.source_buffer(source)?,
        direction: driver.source_vector(source, SourceVector::Direction)?,
        state: driver.source_state(source)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::MockScene;
    use mockall::predicate::*;
    use mockall::Sequence;

    #[test]
    fn source_is_configured_before_playing() {
        let source = SourceHandle::from_raw(1);
        let buffer = BufferHandle::from_raw(1);
        let position = Vec3::new(2.0, 0.0, -5.0);
        let mut seq = Sequence::new();
        let mut driver = MockScene::new();

        driver
            .expect_gen_source()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || Ok(source));
        driver
            .expect_set_source_float()
            .with(eq(source), eq(SourceFloat::Pitch), eq(1.0))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        driver
            .expect_set_source_float()
            .with(eq(source), eq(SourceFloat::Gain), eq(1.0))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        driver
            .expect_set_source_vector()
            .with(eq(source), eq(SourceVector::Position), eq(position))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        driver
            .expect_set_source_vector()
            .with(eq(source), eq(SourceVector::Velocity), eq(Vec3::ZERO))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        driver
            .expect_set_source_looping()
            .with(eq(source), eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        driver
            .expect_set_source_buffer()
            .with(eq(source), eq(Some(buffer)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        driver
            .expect_play_source()
            .with(eq(source))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let created = create_3d_source(&driver, buffer, position, Vec3::ZERO).unwrap();
        assert_eq!(created, source);
    }

    #[test]
    fn rejected_parameter_aborts_before_play() {
        let mut driver = MockScene::new();
        driver
            .expect_gen_source()
            .returning(|| Ok(SourceHandle::from_raw(1)));
        driver
            .expect_set_source_float()
            .returning(|_, param, value| {
                Err(DriverError::InvalidValue {
                    param: param.name(),
                    value,
                })
            });
        driver.expect_play_source().never();

        let params = SourceParams {
            pitch: -1.0,
            ..SourceParams::default()
        };
        let result = create_source_with(&driver, BufferHandle::from_raw(1), &params);
        assert!(matches!(result, Err(DriverError::InvalidValue { .. })));
    }
}
