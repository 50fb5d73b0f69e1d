//! Multi-format audio sample buffers with in-place processors and
//! plugin-provided sample rate conversion.
//!
//! # Modules
//! - [`audio`] - Sample kinds, frame cursors and [`Buffer`]
//! - [`pipeline`] - [`Processor`] trait, [`Leveler`], [`Silence`], [`ProcessorChain`]
//! - [`plugin`] - Plugin registry, interface tags and the built-in resampler
//! - [`config`] - Engine defaults loaded from JSON
//! - [`error`] - Error types

pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod plugin;

pub use audio::{AudioSample, Buffer, ConstFrame, Frame, SampleKind};
pub use config::EngineConfig;
pub use error::{BufferError, ProcessorError, RegistryError};
pub use pipeline::{Leveler, Processor, ProcessorChain, Silence};
pub use plugin::{Quality, Registry};
