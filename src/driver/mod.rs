//! Low-level spatial audio driver interface.
//!
//! The scene code never talks to an audio backend directly. Everything goes
//! through [`DeviceDriver`] (device and context lifetime) and [`SceneDriver`]
//! (listener, buffers, sources, effects), which mirror the object-name based
//! API of classic 3D audio libraries.

mod cpal_output;
#[cfg(test)]
pub(crate) mod mock;
mod software;

pub use cpal_output::{output_device_names, resolve_output_device};
pub use software::{OutputBackend, SoftwareDriver, VIRTUAL_DEVICE_NAME};

use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point or direction in scene space (right-handed, -Z forward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn dot(&self, other: &Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Component-wise comparison with an absolute tolerance
    pub fn approx_eq(&self, other: &Vec3, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Listener orientation as a forward ("at") vector and an up vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            forward: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

macro_rules! driver_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub const KIND: &'static str = $kind;

            /// Wrap a raw driver object name
            pub fn from_raw(name: u32) -> Self {
                Self(name)
            }

            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

driver_handle!(
    /// An opened output endpoint.
    DeviceHandle,
    "device"
);
driver_handle!(
    /// A rendering context bound to one device.
    ContextHandle,
    "context"
);
driver_handle!(
    /// Sample storage referenced by sources.
    BufferHandle,
    "buffer"
);
driver_handle!(
    /// A sound emitter in 3D space.
    SourceHandle,
    "source"
);
driver_handle!(EffectHandle, "effect");
driver_handle!(EffectSlotHandle, "effect slot");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerParam {
    Position,
    Velocity,
}

/// Scalar source parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFloat {
    Pitch,
    Gain,
    /// Full inner cone angle in degrees
    ConeInnerAngle,
    /// Full outer cone angle in degrees
    ConeOuterAngle,
    ConeOuterGain,
}

impl SourceFloat {
    pub fn name(self) -> &'static str {
        match self {
            SourceFloat::Pitch => "pitch",
            SourceFloat::Gain => "gain",
            SourceFloat::ConeInnerAngle => "cone inner angle",
            SourceFloat::ConeOuterAngle => "cone outer angle",
            SourceFloat::ConeOuterGain => "cone outer gain",
        }
    }
}

/// Vector source parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceVector {
    Position,
    Velocity,
    Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Null,
    Reverb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectFloat {
    /// Reverb decay time in seconds
    ReverbDecayTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// Interleaved PCM sample data ready for upload into a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmData {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl PcmData {
    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }
}

/// Device and context lifetime management.
pub trait DeviceDriver {
    /// Open an output device; `None` selects the backend default
    fn open_device(&self, name: Option<&str>) -> Result<DeviceHandle, DriverError>;
    fn device_name(&self, device: DeviceHandle) -> Result<String, DriverError>;
    fn close_device(&self, device: DeviceHandle) -> Result<(), DriverError>;
    fn create_context(&self, device: DeviceHandle) -> Result<ContextHandle, DriverError>;
    /// Make `context` current for all object calls; `None` clears it
    fn make_context_current(&self, context: Option<ContextHandle>) -> Result<(), DriverError>;
    fn destroy_context(&self, context: ContextHandle) -> Result<(), DriverError>;
}

/// Object and parameter calls, valid only while a context is current.
pub trait SceneDriver {
    fn set_listener_vector(&self, param: ListenerParam, value: Vec3) -> Result<(), DriverError>;
    fn listener_vector(&self, param: ListenerParam) -> Result<Vec3, DriverError>;
    fn set_listener_orientation(&self, orientation: Orientation) -> Result<(), DriverError>;
    fn listener_orientation(&self) -> Result<Orientation, DriverError>;

    fn gen_buffer(&self) -> Result<BufferHandle, DriverError>;
    fn delete_buffer(&self, buffer: BufferHandle) -> Result<(), DriverError>;
    fn buffer_data(&self, buffer: BufferHandle, data: &PcmData) -> Result<(), DriverError>;
    fn buffer_frames(&self, buffer: BufferHandle) -> Result<usize, DriverError>;

    fn gen_source(&self) -> Result<SourceHandle, DriverError>;
    fn set_source_float(
        &self,
        source: SourceHandle,
        param: SourceFloat,
        value: f32,
    ) -> Result<(), DriverError>;
    fn source_float(&self, source: SourceHandle, param: SourceFloat) -> Result<f32, DriverError>;
    fn set_source_vector(
        &self,
        source: SourceHandle,
        param: SourceVector,
        value: Vec3,
    ) -> Result<(), DriverError>;
    fn source_vector(&self, source: SourceHandle, param: SourceVector)
        -> Result<Vec3, DriverError>;
    fn set_source_looping(&self, source: SourceHandle, looping: bool) -> Result<(), DriverError>;
    fn source_looping(&self, source: SourceHandle) -> Result<bool, DriverError>;
    fn set_source_buffer(
        &self,
        source: SourceHandle,
        buffer: Option<BufferHandle>,
    ) -> Result<(), DriverError>;
    fn source_buffer(&self, source: SourceHandle) -> Result<Option<BufferHandle>, DriverError>;
    fn play_source(&self, source: SourceHandle) -> Result<(), DriverError>;
    fn source_state(&self, source: SourceHandle) -> Result<PlaybackState, DriverError>;

    fn gen_effect(&self, kind: EffectKind) -> Result<EffectHandle, DriverError>;
    fn effect_kind(&self, effect: EffectHandle) -> Result<EffectKind, DriverError>;
    fn set_effect_float(
        &self,
        effect: EffectHandle,
        param: EffectFloat,
        value: f32,
    ) -> Result<(), DriverError>;
    fn effect_float(&self, effect: EffectHandle, param: EffectFloat) -> Result<f32, DriverError>;

    fn gen_effect_slot(&self) -> Result<EffectSlotHandle, DriverError>;
    fn attach_effect(
        &self,
        slot: EffectSlotHandle,
        effect: Option<EffectHandle>,
    ) -> Result<(), DriverError>;
    fn slot_effect(&self, slot: EffectSlotHandle) -> Result<Option<EffectHandle>, DriverError>;

    /// Route auxiliary send `send` of `source` into `slot` with no filter
    fn set_source_send(
        &self,
        source: SourceHandle,
        send: u32,
        slot: Option<EffectSlotHandle>,
    ) -> Result<(), DriverError>;
    fn source_send(
        &self,
        source: SourceHandle,
        send: u32,
    ) -> Result<Option<EffectSlotHandle>, DriverError>;
}

/// A driver able to run a whole scene.
pub trait AudioDriver: DeviceDriver + SceneDriver {}

impl<T: DeviceDriver + SceneDriver> AudioDriver for T {}
