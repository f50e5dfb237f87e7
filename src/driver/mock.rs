//! mockall double for the object half of the driver API.

use super::{
    BufferHandle, EffectFloat, EffectHandle, EffectKind, EffectSlotHandle, ListenerParam,
    Orientation, PcmData, PlaybackState, SceneDriver, SourceFloat, SourceHandle, SourceVector,
    Vec3,
};
use crate::error::DriverError;
use mockall::mock;

mock! {
    pub Scene {}
    impl SceneDriver for Scene {
        fn set_listener_vector(&self, param: ListenerParam, value: Vec3) -> Result<(), DriverError>;
        fn listener_vector(&self, param: ListenerParam) -> Result<Vec3, DriverError>;
        fn set_listener_orientation(&self, orientation: Orientation) -> Result<(), DriverError>;
        fn listener_orientation(&self) -> Result<Orientation, DriverError>;

        fn gen_buffer(&self) -> Result<BufferHandle, DriverError>;
        fn delete_buffer(&self, buffer: BufferHandle) -> Result<(), DriverError>;
        fn buffer_data(&self, buffer: BufferHandle, data: &PcmData) -> Result<(), DriverError>;
        fn buffer_frames(&self, buffer: BufferHandle) -> Result<usize, DriverError>;

        fn gen_source(&self) -> Result<SourceHandle, DriverError>;
        fn set_source_float(&self, source: SourceHandle, param: SourceFloat, value: f32) -> Result<(), DriverError>;
        fn source_float(&self, source: SourceHandle, param: SourceFloat) -> Result<f32, DriverError>;
        fn set_source_vector(&self, source: SourceHandle, param: SourceVector, value: Vec3) -> Result<(), DriverError>;
        fn source_vector(&self, source: SourceHandle, param: SourceVector) -> Result<Vec3, DriverError>;
        fn set_source_looping(&self, source: SourceHandle, looping: bool) -> Result<(), DriverError>;
        fn source_looping(&self, source: SourceHandle) -> Result<bool, DriverError>;
        fn set_source_buffer(&self, source: SourceHandle, buffer: Option<BufferHandle>) -> Result<(), DriverError>;
        fn source_buffer(&self, source: SourceHandle) -> Result<Option<BufferHandle>, DriverError>;
        fn play_source(&self, source: SourceHandle) -> Result<(), DriverError>;
        fn source_state(&self, source: SourceHandle) -> Result<PlaybackState, DriverError>;

        fn gen_effect(&self, kind: EffectKind) -> Result<EffectHandle, DriverError>;
        fn effect_kind(&self, effect: EffectHandle) -> Result<EffectKind, DriverError>;
        fn set_effect_float(&self, effect: EffectHandle, param: EffectFloat, value: f32) -> Result<(), DriverError>;
        fn effect_float(&self, effect: EffectHandle, param: EffectFloat) -> Result<f32, DriverError>;

        fn gen_effect_slot(&self) -> Result<EffectSlotHandle, DriverError>;
        fn attach_effect(&self, slot: EffectSlotHandle, effect: Option<EffectHandle>) -> Result<(), DriverError>;
        fn slot_effect(&self, slot: EffectSlotHandle) -> Result<Option<EffectHandle>, DriverError>;

        fn set_source_send(&self, source: SourceHandle, send: u32, slot: Option<EffectSlotHandle>) -> Result<(), DriverError>;
        fn source_send(&self, source: SourceHandle, send: u32) -> Result<Option<EffectSlotHandle>, DriverError>;
    }
}
