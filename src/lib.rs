// spatial-scene: a single 3D audio source with reverb and a directional beam
// Expose public modules for use in integration tests

pub mod app;
pub mod audio;
pub mod driver;
pub mod error;

// Re-export commonly used types for convenience
pub use app::config::{ConfigManager, EffectTarget, SceneConfig};
pub use app::{run_scene, SceneReport};
pub use audio::{AudioSession, BufferLoader, Scene};
pub use driver::{AudioDriver, OutputBackend, SoftwareDriver, Vec3};
pub use error::{DriverError, Error};
