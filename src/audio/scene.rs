use super::beam::{beamform, BeamPattern};
use super::buffer::BufferLoader;
use super::effects::{apply_reverb, ReverbSend, ReverbSettings};
use super::listener::{configure_listener, ListenerPose};
use super::session::AudioSession;
use super::source::{create_source_with, SourceParams};
use crate::driver::{AudioDriver, BufferHandle, SourceHandle, Vec3};
use crate::error::Error;
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

/// Beam settings last applied to a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamState {
    pub angle: f32,
    pub direction: Vec3,
    pub pattern: BeamPattern,
}

/// What the scene knows about one of its sources.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    pub buffer: BufferHandle,
    pub params: SourceParams,
    pub reverb: Option<ReverbSend>,
    pub beam: Option<BeamState>,
}

/// A listener and any number of sources living in one audio session.
pub struct Scene<D: AudioDriver> {
    session: AudioSession<D>,
    listener: ListenerPose,
    buffers: Vec<BufferHandle>,
    sources: HashMap<SourceHandle, SourceEntry>,
}

impl<D: AudioDriver> Scene<D> {
    pub fn new(session: AudioSession<D>) -> Self {
        Self {
            session,
            listener: ListenerPose::default(),
            buffers: Vec::new(),
            sources: HashMap::new(),
        }
    }

    pub fn driver(&self) -> &D {
        self.session.driver()
    }

    pub fn session(&self) -> &AudioSession<D> {
        &self.session
    }

    pub fn listener(&self) -> &ListenerPose {
        &self.listener
    }

    pub fn configure_listener(&mut self, pose: ListenerPose) -> Result<(), Error> {
        configure_listener(self.session.driver(), &pose)?;
        self.listener = pose;
        Ok(())
    }

    pub fn load_buffer(&mut self, loader: &BufferLoader, path: &Path) -> Result<BufferHandle, Error> {
        let buffer = loader.load(self.session.driver(), path)?;
        self.buffers.push(buffer);
        Ok(buffer)
    }

    pub fn buffers(&self) -> &[BufferHandle] {
        &self.buffers
    }

    /// Create a playing source for `buffer` and register it
    pub fn spawn_source(
        &mut self,
        buffer: BufferHandle,
        params: SourceParams,
    ) -> Result<SourceHandle, Error> {
        let source = create_source_with(self.session.driver(), buffer, &params)?;
        self.sources.insert(
            source,
            SourceEntry {
                buffer,
                params,
                reverb: None,
                beam: None,
            },
        );
        info!("Registered {} ({} source(s) in scene)", source, self.sources.len());
        Ok(source)
    }

    /// Route `target` into a new reverb slot.
    ///
    /// Targets the scene does not know are still handed to the driver.
    pub fn apply_reverb(
        &mut self,
        target: SourceHandle,
        settings: &ReverbSettings,
    ) -> Result<ReverbSend, Error> {
        self.warn_if_unregistered(target, "reverb");
        let send = apply_reverb(self.session.driver(), target, settings)?;
        if let Some(entry) = self.sources.get_mut(&target) {
            entry.reverb = Some(send);
        }
        Ok(send)
    }

    pub fn beamform(
        &mut self,
        target: SourceHandle,
        angle: f32,
        pattern: &BeamPattern,
    ) -> Result<Vec3, Error> {
        self.warn_if_unregistered(target, "beam");
        let direction = beamform(self.session.driver(), target, angle, pattern)?;
        if let Some(entry) = self.sources.get_mut(&target) {
            entry.beam = Some(BeamState {
                angle,
                direction,
                pattern: *pattern,
            });
        }
        Ok(direction)
    }

    pub fn source(&self, source: SourceHandle) -> Option<&SourceEntry> {
        self.sources.get(&source)
    }

    pub fn sources(&self) -> impl Iterator<Item = (&SourceHandle, &SourceEntry)> {
        self.sources.iter()
    }

    /// Tear down the session; driver objects go with the context
    pub fn close(self) -> Result<(), Error> {
        info!(
            "Closing scene with {} source(s) and {} buffer(s)",
            self.sources.len(),
            self.buffers.len()
        );
        self.session.close()
    }

    fn warn_if_unregistered(&self, target: SourceHandle, what: &str) {
        if !self.sources.contains_key(&target) {
            warn!("Applying {} to {}, which is not a registered source", what, target);
        }
    }
}
