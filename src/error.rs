use thiserror::Error;

/// Failures reported by an audio driver implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    #[error("No output device available: {0}")]
    NoDevice(String),

    #[error("Context creation failed: {0}")]
    ContextCreation(String),

    #[error("No current context")]
    NoCurrentContext,

    #[error("Invalid {kind} name: {name}")]
    InvalidName { kind: &'static str, name: u32 },

    #[error("Invalid value for {param}: {value}")]
    InvalidValue { param: &'static str, value: f32 },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Unified error type for the scene library.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to open audio device: {0}")]
    DeviceOpen(DriverError),

    #[error("Failed to create audio context: {0}")]
    ContextCreate(DriverError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
