//! Audio data types.
//!
//! # Data Types
//! - [`AudioSample`] - Trait for the supported sample kinds (i16, 24-bit, i32, f32)
//! - [`Buffer`] - Interleaved multi-channel samples
//! - [`Frame`] / [`ConstFrame`] - Cursors addressing one frame
//!
//! # Byte order
//! - [`endian`] - Host byte order probe and packed 24-bit helpers

pub mod buffer;
pub mod endian;
pub mod frame;
pub mod sample;

pub use buffer::Buffer;
pub use dasp_sample::I24;
pub use endian::Endianness;
pub use frame::{ConstFrame, Frame};
pub use sample::{AnySample, AnySlice, AudioSample, SampleKind};
