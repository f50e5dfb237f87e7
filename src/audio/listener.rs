use crate::driver::{ListenerParam, Orientation, SceneDriver, Vec3};
use crate::error::DriverError;
use log::debug;
use serde::{Deserialize, Serialize};

/// Position, velocity and orientation of the scene's single listener.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerPose {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Orientation,
}

/// Apply `pose` to the listener of the current context.
pub fn configure_listener<S: SceneDriver + ?Sized>(
    driver: &S,
    pose: &ListenerPose,
) -> Result<(), DriverError> {
    driver.set_listener_vector(ListenerParam::Position, pose.position)?;
    driver.set_listener_vector(ListenerParam::Velocity, pose.velocity)?;
    driver.set_listener_orientation(pose.orientation)?;

    debug!(
        "Listener at {} facing {} (up {})",
        pose.position, pose.orientation.forward, pose.orientation.up
    );
    Ok(())
}

/// Read the listener pose back from the driver.
pub fn read_listener<S: SceneDriver + ?Sized>(driver: &S) -> Result<ListenerPose, DriverError> {
    Ok(ListenerPose {
        position: driver.listener_vector(ListenerParam::Position)?,
        velocity: driver.listener_vector(ListenerParam::Velocity)?,
        orientation: driver.listener_orientation()?,
    })
}
