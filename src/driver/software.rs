use super::{
    output_device_names, resolve_output_device, BufferHandle, ContextHandle, DeviceDriver,
    DeviceHandle, EffectFloat, EffectHandle, EffectKind, EffectSlotHandle, ListenerParam,
    Orientation, PcmData, PlaybackState, SceneDriver, SourceFloat, SourceHandle, SourceVector,
    Vec3,
};
use crate::error::DriverError;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Name of the single endpoint exposed by the virtual backend.
pub const VIRTUAL_DEVICE_NAME: &str = "Virtual Output";

/// Auxiliary sends available on every source.
const MAX_AUXILIARY_SENDS: u32 = 2;

const REVERB_DECAY_RANGE: (f32, f32) = (0.1, 20.0);

/// Where the software driver resolves output devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputBackend {
    /// A single in-process endpoint, always available
    Virtual,
    /// The host audio system, via cpal
    #[default]
    Cpal,
}

impl OutputBackend {
    /// Output devices this backend can open
    pub fn device_names(self) -> Vec<String> {
        match self {
            OutputBackend::Virtual => vec![VIRTUAL_DEVICE_NAME.to_string()],
            OutputBackend::Cpal => output_device_names(),
        }
    }
}

struct DeviceRecord {
    name: String,
}

struct ContextRecord {
    device: u32,
}

struct ListenerRecord {
    position: Vec3,
    velocity: Vec3,
    orientation: Orientation,
}

impl Default for ListenerRecord {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            orientation: Orientation::default(),
        }
    }
}

struct SourceRecord {
    pitch: f32,
    gain: f32,
    position: Vec3,
    velocity: Vec3,
    direction: Vec3,
    cone_inner_angle: f32,
    cone_outer_angle: f32,
    cone_outer_gain: f32,
    looping: bool,
    buffer: Option<u32>,
    state: PlaybackState,
    sends: [Option<u32>; MAX_AUXILIARY_SENDS as usize],
}

impl Default for SourceRecord {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            gain: 1.0,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            direction: Vec3::ZERO,
            cone_inner_angle: 360.0,
            cone_outer_angle: 360.0,
            cone_outer_gain: 0.0,
            looping: false,
            buffer: None,
            state: PlaybackState::Initial,
            sends: [None; MAX_AUXILIARY_SENDS as usize],
        }
    }
}

struct EffectRecord {
    kind: EffectKind,
    decay_time: f32,
}

#[derive(Default)]
struct DriverState {
    backend: OutputBackend,
    context_limit: Option<usize>,
    next_device: u32,
    devices: HashMap<u32, DeviceRecord>,
    next_context: u32,
    contexts: HashMap<u32, ContextRecord>,
    current_context: Option<u32>,
    listener: ListenerRecord,
    next_buffer: u32,
    buffers: HashMap<u32, Option<PcmData>>,
    next_source: u32,
    sources: HashMap<u32, SourceRecord>,
    next_effect: u32,
    effects: HashMap<u32, EffectRecord>,
    next_slot: u32,
    slots: HashMap<u32, Option<u32>>,
    calls: Vec<&'static str>,
}

impl DriverState {
    fn record(&mut self, call: &'static str) {
        trace!("driver call: {}", call);
        self.calls.push(call);
    }

    fn require_context(&self) -> Result<(), DriverError> {
        match self.current_context {
            Some(_) => Ok(()),
            None => Err(DriverError::NoCurrentContext),
        }
    }

    fn source(&self, source: SourceHandle) -> Result<&SourceRecord, DriverError> {
        self.require_context()?;
        self.sources
            .get(&source.raw())
            .ok_or(DriverError::InvalidName {
                kind: SourceHandle::KIND,
                name: source.raw(),
            })
    }

    fn source_mut(&mut self, source: SourceHandle) -> Result<&mut SourceRecord, DriverError> {
        self.require_context()?;
        self.sources
            .get_mut(&source.raw())
            .ok_or(DriverError::InvalidName {
                kind: SourceHandle::KIND,
                name: source.raw(),
            })
    }

    fn effect(&self, effect: EffectHandle) -> Result<&EffectRecord, DriverError> {
        self.require_context()?;
        self.effects
            .get(&effect.raw())
            .ok_or(DriverError::InvalidName {
                kind: EffectHandle::KIND,
                name: effect.raw(),
            })
    }

    fn check_buffer(&self, buffer: BufferHandle) -> Result<(), DriverError> {
        if self.buffers.contains_key(&buffer.raw()) {
            Ok(())
        } else {
            Err(DriverError::InvalidName {
                kind: BufferHandle::KIND,
                name: buffer.raw(),
            })
        }
    }

    fn check_slot(&self, slot: EffectSlotHandle) -> Result<(), DriverError> {
        if self.slots.contains_key(&slot.raw()) {
            Ok(())
        } else {
            Err(DriverError::InvalidName {
                kind: EffectSlotHandle::KIND,
                name: slot.raw(),
            })
        }
    }
}

/// Allocate the next object name; names start at 1 and are never reused.
fn next_name(counter: &mut u32) -> u32 {
    *counter += 1;
    *counter
}

fn check_vector(param: &'static str, value: Vec3) -> Result<(), DriverError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DriverError::InvalidValue {
            param,
            value: f32::NAN,
        })
    }
}

fn check_source_float(param: SourceFloat, value: f32) -> Result<(), DriverError> {
    let valid = value.is_finite()
        && match param {
            SourceFloat::Pitch => value > 0.0,
            SourceFloat::Gain => value >= 0.0,
            SourceFloat::ConeInnerAngle | SourceFloat::ConeOuterAngle => {
                (0.0..=360.0).contains(&value)
            }
            SourceFloat::ConeOuterGain => (0.0..=1.0).contains(&value),
        };

    if valid {
        Ok(())
    } else {
        Err(DriverError::InvalidValue {
            param: param.name(),
            value,
        })
    }
}

/// In-memory implementation of the driver API.
///
/// Object state lives behind an `Arc<Mutex<_>>`, so clones of the driver
/// observe the same devices, contexts and objects. Buffers, sources,
/// effects and effect slots have separate name counters that all start at
/// 1, as with common hardware drivers.
#[derive(Clone)]
pub struct SoftwareDriver {
    state: Arc<Mutex<DriverState>>,
}

impl Default for SoftwareDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDriver {
    /// Driver backed by the virtual endpoint
    pub fn new() -> Self {
        Self::with_backend(OutputBackend::Virtual)
    }

    pub fn with_backend(backend: OutputBackend) -> Self {
        let state = DriverState {
            backend,
            ..DriverState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Limit how many contexts a device may host at once
    pub fn with_context_limit(self, limit: usize) -> Self {
        self.lock().context_limit = Some(limit);
        self
    }

    pub fn backend(&self) -> OutputBackend {
        self.lock().backend
    }

    /// Driver calls made so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn open_device_count(&self) -> usize {
        self.lock().devices.len()
    }

    pub fn live_context_count(&self) -> usize {
        self.lock().contexts.len()
    }

    pub fn current_context(&self) -> Option<ContextHandle> {
        self.lock().current_context.map(ContextHandle::from_raw)
    }

    pub fn buffer_count(&self) -> usize {
        self.lock().buffers.len()
    }

    pub fn source_count(&self) -> usize {
        self.lock().sources.len()
    }

    fn lock(&self) -> MutexGuard<'_, DriverState> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DeviceDriver for SoftwareDriver {
    fn open_device(&self, name: Option<&str>) -> Result<DeviceHandle, DriverError> {
        let backend = self.lock().backend;

        let device_name = match backend {
            OutputBackend::Virtual => match name {
                None => VIRTUAL_DEVICE_NAME.to_string(),
                Some(wanted) if wanted == VIRTUAL_DEVICE_NAME => wanted.to_string(),
                Some(wanted) => return Err(DriverError::NoDevice(wanted.to_string())),
            },
            OutputBackend::Cpal => resolve_output_device(name)?,
        };

        let mut state = self.lock();
        state.record("open_device");
        let id = next_name(&mut state.next_device);
        debug!("Opened device {} ({})", id, device_name);
        state.devices.insert(id, DeviceRecord { name: device_name });
        Ok(DeviceHandle::from_raw(id))
    }

    fn device_name(&self, device: DeviceHandle) -> Result<String, DriverError> {
        let state = self.lock();
        state
            .devices
            .get(&device.raw())
            .map(|d| d.name.clone())
            .ok_or(DriverError::InvalidName {
                kind: DeviceHandle::KIND,
                name: device.raw(),
            })
    }

    fn close_device(&self, device: DeviceHandle) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("close_device");

        if !state.devices.contains_key(&device.raw()) {
            return Err(DriverError::InvalidName {
                kind: DeviceHandle::KIND,
                name: device.raw(),
            });
        }
        if state.contexts.values().any(|c| c.device == device.raw()) {
            return Err(DriverError::InvalidOperation(format!(
                "{} still has live contexts",
                device
            )));
        }

        state.devices.remove(&device.raw());
        debug!("Closed {}", device);
        Ok(())
    }

    fn create_context(&self, device: DeviceHandle) -> Result<ContextHandle, DriverError> {
        let mut state = self.lock();
        state.record("create_context");

        if !state.devices.contains_key(&device.raw()) {
            return Err(DriverError::InvalidName {
                kind: DeviceHandle::KIND,
                name: device.raw(),
            });
        }

        let existing = state
            .contexts
            .values()
            .filter(|c| c.device == device.raw())
            .count();
        if let Some(limit) = state.context_limit {
            if existing >= limit {
                return Err(DriverError::ContextCreation(format!(
                    "{} supports at most {} context(s)",
                    device, limit
                )));
            }
        }

        let id = next_name(&mut state.next_context);
        state.contexts.insert(
            id,
            ContextRecord {
                device: device.raw(),
            },
        );
        Ok(ContextHandle::from_raw(id))
    }

    fn make_context_current(&self, context: Option<ContextHandle>) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("make_context_current");

        if let Some(context) = context {
            if !state.contexts.contains_key(&context.raw()) {
                return Err(DriverError::InvalidName {
                    kind: ContextHandle::KIND,
                    name: context.raw(),
                });
            }
        }

        state.current_context = context.map(ContextHandle::raw);
        Ok(())
    }

    fn destroy_context(&self, context: ContextHandle) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("destroy_context");

        if state.current_context == Some(context.raw()) {
            return Err(DriverError::InvalidOperation(format!(
                "{} is still current",
                context
            )));
        }
        if state.contexts.remove(&context.raw()).is_none() {
            return Err(DriverError::InvalidName {
                kind: ContextHandle::KIND,
                name: context.raw(),
            });
        }
        Ok(())
    }
}

impl SceneDriver for SoftwareDriver {
    fn set_listener_vector(&self, param: ListenerParam, value: Vec3) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("set_listener_vector");
        state.require_context()?;
        check_vector("listener vector", value)?;

        match param {
            ListenerParam::Position => state.listener.position = value,
            ListenerParam::Velocity => state.listener.velocity = value,
        }
        Ok(())
    }

    fn listener_vector(&self, param: ListenerParam) -> Result<Vec3, DriverError> {
        let state = self.lock();
        state.require_context()?;
        Ok(match param {
            ListenerParam::Position => state.listener.position,
            ListenerParam::Velocity => state.listener.velocity,
        })
    }

    fn set_listener_orientation(&self, orientation: Orientation) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("set_listener_orientation");
        state.require_context()?;
        check_vector("listener forward", orientation.forward)?;
        check_vector("listener up", orientation.up)?;

        state.listener.orientation = orientation;
        Ok(())
    }

    fn listener_orientation(&self) -> Result<Orientation, DriverError> {
        let state = self.lock();
        state.require_context()?;
        Ok(state.listener.orientation)
    }

    fn gen_buffer(&self) -> Result<BufferHandle, DriverError> {
        let mut state = self.lock();
        state.record("gen_buffer");
        state.require_context()?;

        let id = next_name(&mut state.next_buffer);
        state.buffers.insert(id, None);
        Ok(BufferHandle::from_raw(id))
    }

    fn delete_buffer(&self, buffer: BufferHandle) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("delete_buffer");
        state.require_context()?;
        state.check_buffer(buffer)?;

        if state
            .sources
            .values()
            .any(|s| s.buffer == Some(buffer.raw()))
        {
            return Err(DriverError::InvalidOperation(format!(
                "{} is still bound to a source",
                buffer
            )));
        }

        state.buffers.remove(&buffer.raw());
        Ok(())
    }

    fn buffer_data(&self, buffer: BufferHandle, data: &PcmData) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("buffer_data");
        state.require_context()?;
        state.check_buffer(buffer)?;

        if data.channels == 0 || data.sample_rate == 0 {
            return Err(DriverError::InvalidOperation(format!(
                "unsupported format: {} channel(s) at {} Hz",
                data.channels, data.sample_rate
            )));
        }
        if state
            .sources
            .values()
            .any(|s| s.buffer == Some(buffer.raw()))
        {
            return Err(DriverError::InvalidOperation(format!(
                "{} is in use",
                buffer
            )));
        }

        state.buffers.insert(buffer.raw(), Some(data.clone()));
        Ok(())
    }

    fn buffer_frames(&self, buffer: BufferHandle) -> Result<usize, DriverError> {
        let state = self.lock();
        state.require_context()?;
        match state.buffers.get(&buffer.raw()) {
            Some(data) => Ok(data.as_ref().map(PcmData::frames).unwrap_or(0)),
            None => Err(DriverError::InvalidName {
                kind: BufferHandle::KIND,
                name: buffer.raw(),
            }),
        }
    }

    fn gen_source(&self) -> Result<SourceHandle, DriverError> {
        let mut state = self.lock();
        state.record("gen_source");
        state.require_context()?;

        let id = next_name(&mut state.next_source);
        state.sources.insert(id, SourceRecord::default());
        Ok(SourceHandle::from_raw(id))
    }

    fn set_source_float(
        &self,
        source: SourceHandle,
        param: SourceFloat,
        value: f32,
    ) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("set_source_float");
        check_source_float(param, value)?;

        let record = state.source_mut(source)?;
        match param {
            SourceFloat::Pitch => record.pitch = value,
            SourceFloat::Gain => record.gain = value,
            SourceFloat::ConeInnerAngle => record.cone_inner_angle = value,
            SourceFloat::ConeOuterAngle => record.cone_outer_angle = value,
            SourceFloat::ConeOuterGain => record.cone_outer_gain = value,
        }
        Ok(())
    }

    fn source_float(&self, source: SourceHandle, param: SourceFloat) -> Result<f32, DriverError> {
        let state = self.lock();
        let record = state.source(source)?;
        Ok(match param {
            SourceFloat::Pitch => record.pitch,
            SourceFloat::Gain => record.gain,
            SourceFloat::ConeInnerAngle => record.cone_inner_angle,
            SourceFloat::ConeOuterAngle => record.cone_outer_angle,
            SourceFloat::ConeOuterGain => record.cone_outer_gain,
        })
    }

    fn set_source_vector(
        &self,
        source: SourceHandle,
        param: SourceVector,
        value: Vec3,
    ) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("set_source_vector");
        check_vector("source vector", value)?;

        let record = state.source_mut(source)?;
        match param {
            SourceVector::Position => record.position = value,
            SourceVector::Velocity => record.velocity = value,
            SourceVector::Direction => record.direction = value,
        }
        Ok(())
    }

    fn source_vector(
        &self,
        source: SourceHandle,
        param: SourceVector,
    ) -> Result<Vec3, DriverError> {
        let state = self.lock();
        let record = state.source(source)?;
        Ok(match param {
            SourceVector::Position => record.position,
            SourceVector::Velocity => record.velocity,
            SourceVector::Direction => record.direction,
        })
    }

    fn set_source_looping(&self, source: SourceHandle, looping: bool) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("set_source_looping");
        state.source_mut(source)?.looping = looping;
        Ok(())
    }

    fn source_looping(&self, source: SourceHandle) -> Result<bool, DriverError> {
        Ok(self.lock().source(source)?.looping)
    }

    fn set_source_buffer(
        &self,
        source: SourceHandle,
        buffer: Option<BufferHandle>,
    ) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("set_source_buffer");
        if let Some(buffer) = buffer {
            state.check_buffer(buffer)?;
        }

        let record = state.source_mut(source)?;
        if record.state == PlaybackState::Playing || record.state == PlaybackState::Paused {
            return Err(DriverError::InvalidOperation(format!(
                "cannot rebind {} while it is playing",
                source
            )));
        }
        record.buffer = buffer.map(BufferHandle::raw);
        Ok(())
    }

    fn source_buffer(&self, source: SourceHandle) -> Result<Option<BufferHandle>, DriverError> {
        let state = self.lock();
        Ok(state.source(source)?.buffer.map(BufferHandle::from_raw))
    }

    fn play_source(&self, source: SourceHandle) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("play_source");
        state.source_mut(source)?.state = PlaybackState::Playing;
        debug!("Playing {}", source);
        Ok(())
    }

    fn source_state(&self, source: SourceHandle) -> Result<PlaybackState, DriverError> {
        Ok(self.lock().source(source)?.state)
    }

    fn gen_effect(&self, kind: EffectKind) -> Result<EffectHandle, DriverError> {
        let mut state = self.lock();
        state.record("gen_effect");
        state.require_context()?;

        let id = next_name(&mut state.next_effect);
        state.effects.insert(
            id,
            EffectRecord {
                kind,
                decay_time: 1.49,
            },
        );
        Ok(EffectHandle::from_raw(id))
    }

    fn effect_kind(&self, effect: EffectHandle) -> Result<EffectKind, DriverError> {
        Ok(self.lock().effect(effect)?.kind)
    }

    fn set_effect_float(
        &self,
        effect: EffectHandle,
        param: EffectFloat,
        value: f32,
    ) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("set_effect_float");
        let kind = state.effect(effect)?.kind;

        match param {
            EffectFloat::ReverbDecayTime => {
                if kind != EffectKind::Reverb {
                    return Err(DriverError::InvalidOperation(format!(
                        "{} is not a reverb effect",
                        effect
                    )));
                }
                let (min, max) = REVERB_DECAY_RANGE;
                if !(min..=max).contains(&value) {
                    return Err(DriverError::InvalidValue {
                        param: "reverb decay time",
                        value,
                    });
                }
                if let Some(record) = state.effects.get_mut(&effect.raw()) {
                    record.decay_time = value;
                }
            }
        }
        Ok(())
    }

    fn effect_float(&self, effect: EffectHandle, param: EffectFloat) -> Result<f32, DriverError> {
        let state = self.lock();
        let record = state.effect(effect)?;
        match param {
            EffectFloat::ReverbDecayTime if record.kind == EffectKind::Reverb => {
                Ok(record.decay_time)
            }
            EffectFloat::ReverbDecayTime => Err(DriverError::InvalidOperation(format!(
                "{} is not a reverb effect",
                effect
            ))),
        }
    }

    fn gen_effect_slot(&self) -> Result<EffectSlotHandle, DriverError> {
        let mut state = self.lock();
        state.record("gen_effect_slot");
        state.require_context()?;

        let id = next_name(&mut state.next_slot);
        state.slots.insert(id, None);
        Ok(EffectSlotHandle::from_raw(id))
    }

    fn attach_effect(
        &self,
        slot: EffectSlotHandle,
        effect: Option<EffectHandle>,
    ) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("attach_effect");
        state.require_context()?;
        state.check_slot(slot)?;
        if let Some(effect) = effect {
            state.effect(effect)?;
        }

        state
            .slots
            .insert(slot.raw(), effect.map(EffectHandle::raw));
        Ok(())
    }

    fn slot_effect(&self, slot: EffectSlotHandle) -> Result<Option<EffectHandle>, DriverError> {
        let state = self.lock();
        state.require_context()?;
        state.check_slot(slot)?;
        Ok(state
            .slots
            .get(&slot.raw())
            .copied()
            .flatten()
            .map(EffectHandle::from_raw))
    }

    fn set_source_send(
        &self,
        source: SourceHandle,
        send: u32,
        slot: Option<EffectSlotHandle>,
    ) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.record("set_source_send");
        if send >= MAX_AUXILIARY_SENDS {
            return Err(DriverError::InvalidValue {
                param: "auxiliary send",
                value: send as f32,
            });
        }
        if let Some(slot) = slot {
            state.check_slot(slot)?;
        }

        state.source_mut(source)?.sends[send as usize] = slot.map(EffectSlotHandle::raw);
        Ok(())
    }

    fn source_send(
        &self,
        source: SourceHandle,
        send: u32,
    ) -> Result<Option<EffectSlotHandle>, DriverError> {
        let state = self.lock();
        let record = state.source(source)?;
        record
            .sends
            .get(send as usize)
            .copied()
            .map(|slot| slot.map(EffectSlotHandle::from_raw))
            .ok_or(DriverError::InvalidValue {
                param: "auxiliary send",
                value: send as f32,
            })
    }
}
