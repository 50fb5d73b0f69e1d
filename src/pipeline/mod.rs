//! In-place buffer processing.
//!
//! # Processors
//! - [`Leveler`] - level and stereo balance
//! - [`Silence`] - mutes the buffer
//!
//! [`ProcessorChain`] runs processors one after another on the same buffer.

pub mod chain;
pub mod effect;
pub mod processor;

pub use chain::ProcessorChain;
pub use effect::{Leveler, Silence};
pub use processor::Processor;
