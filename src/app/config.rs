use crate::audio::{BeamPattern, ListenerPose, ReverbSettings};
use crate::driver::{OutputBackend, SoftwareDriver, Vec3};
use crate::error::Error;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which handle the reverb send and the beam are applied to.
///
/// The scene this program reproduces hands the *buffer* name to both
/// calls. With `Buffer` the buffer's raw name is reinterpreted as a source
/// name; with `Source` the freshly created source is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EffectTarget {
    #[default]
    Buffer,
    Source,
}

/// Scene settings
///
/// Unknown keys are rejected, so a stale or misspelled entry fails the load
/// instead of silently falling back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Output backend the scene's driver resolves devices through
    pub backend: OutputBackend,

    /// Output device name (None means backend default)
    pub device_name: Option<String>,

    pub sound_path: PathBuf,

    /// Decode `sound_path` instead of leaving the buffer empty
    pub decode: bool,

    pub beam_angle_degrees: f32,
    pub effect_target: EffectTarget,

    /// Idle loop period in milliseconds
    pub tick_ms: u64,

    pub listener: ListenerPose,
    pub source_position: Vec3,
    pub source_velocity: Vec3,
    pub reverb: ReverbSettings,
    pub beam: BeamPattern,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            backend: OutputBackend::default(),
            device_name: None,
            sound_path: PathBuf::from("sound.wav"),
            decode: false,
            beam_angle_degrees: 45.0,
            effect_target: EffectTarget::Buffer,
            tick_ms: 16,
            listener: ListenerPose::default(),
            source_position: Vec3::new(2.0, 0.0, -5.0),
            source_velocity: Vec3::ZERO,
            reverb: ReverbSettings::default(),
            beam: BeamPattern::default(),
        }
    }
}

impl SceneConfig {
    pub fn beam_angle(&self) -> f32 {
        self.beam_angle_degrees.to_radians()
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Software driver bound to the configured backend
    pub fn driver(&self) -> SoftwareDriver {
        SoftwareDriver::with_backend(self.backend)
    }

    pub fn from_toml(text: &str) -> Result<Self, Error> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Invalid scene config: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Cannot encode scene config: {}", e)))
    }
}

/// Owns the scene settings and the TOML file they come from
pub struct ConfigManager {
    settings: SceneConfig,
    config_file: PathBuf,
}

impl ConfigManager {
    /// Use `spatial_scene/config.toml` in the per-user config directory
    pub fn new() -> Result<Self, Error> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::Config("No per-user config directory on this host".to_string()))?;
        Self::with_file(base.join("spatial_scene").join("config.toml"))
    }

    /// Read `path`; a file that does not exist yet yields the defaults
    pub fn with_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let config_file = path.as_ref().to_path_buf();
        let settings = match fs::read_to_string(&config_file) {
            Ok(text) => SceneConfig::from_toml(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {:?}, using defaults", config_file);
                SceneConfig::default()
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "Cannot read {}: {}",
                    config_file.display(),
                    e
                )))
            }
        };

        Ok(Self {
            settings,
            config_file,
        })
    }

    /// Write the current settings, creating parent directories as needed
    pub fn save(&self) -> Result<(), Error> {
        let text = self.settings.to_toml()?;
        if let Some(dir) = self.config_file.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.config_file, text)?;

        debug!("Scene config written to {:?}", self.config_file);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_file
    }

    pub fn settings(&self) -> &SceneConfig {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SceneConfig {
        &mut self.settings
    }

    pub fn into_settings(self) -> SceneConfig {
        self.settings
    }
}
