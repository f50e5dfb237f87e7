pub mod beam;
mod buffer;
mod decoder;
pub mod effects;
mod listener;
mod scene;
mod session;
mod source;

pub use beam::{beamform, direction_from_angle, BeamPattern};
pub use buffer::{BufferLoader, SoundDecoder};
pub use decoder::SymphoniaDecoder;
pub use effects::{apply_reverb, ReverbSend, ReverbSettings};
pub use listener::{configure_listener, read_listener, ListenerPose};
pub use scene::{BeamState, Scene, SourceEntry};
pub use session::AudioSession;
pub use source::{create_3d_source, create_source_with, source_params, SourceParams, SourceSnapshot};
