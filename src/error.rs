//! Error types for buffer, processor and plugin operations.

use thiserror::Error;

/// Errors raised by [`Buffer`](crate::audio::Buffer) operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BufferError {
    #[error("Channel count mismatch: {left} vs {right}")]
    ChannelMismatch { left: usize, right: usize },

    #[error("End frame is {distance} frames before begin frame")]
    InvertedRange { distance: isize },

    #[error("Buffer overflow: capacity {capacity} frames, requested {requested}")]
    BufferOverflow { capacity: usize, requested: usize },

    #[error("Frame range {begin}..{end} outside of buffer bounds 0..{frames}")]
    OutOfBounds {
        begin: isize,
        end: isize,
        frames: usize,
    },

    #[error("Insufficient data: need {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("Invalid sample rate conversion {source_rate} Hz -> {dest_rate} Hz")]
    InvalidRate { dest_rate: u32, source_rate: u32 },

    #[error("Resampler failed: {0}")]
    Resampler(String),

    #[error("Plugin: {0}")]
    Plugin(#[from] RegistryError),
}

/// Errors from plugin registry operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Unknown interface: {0}")]
    UnknownInterface(String),

    #[error("Interface '{0}' is registered with a different object type")]
    InterfaceTypeMismatch(String),

    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Plugin '{name}' still has {live} live instances")]
    PluginBusy { name: String, live: usize },

    #[error("Library: {0}")]
    Library(String),

    #[error("Plugin registry not initialized")]
    NotInitialized,
}

/// Errors from processor configuration and processing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessorError {
    #[error("Unknown property '{property}' on {processor}")]
    UnknownProperty {
        processor: &'static str,
        property: String,
    },

    #[error("Invalid value {value} for property '{property}'")]
    InvalidProperty { property: String, value: f64 },
}

pub type Result<T, E = BufferError> = std::result::Result<T, E>;
