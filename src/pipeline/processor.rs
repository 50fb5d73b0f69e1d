use tracing::error;

use crate::audio::{AudioSample, Buffer};
use crate::error::ProcessorError;

/// In-place transform applied to a buffer.
///
/// A processor exposes a fixed set of named `f64` properties and keeps no
/// state tied to a particular buffer between calls. `process` never changes
/// the buffer's shape.
pub trait Processor<T: AudioSample>: Send {
    fn name(&self) -> &'static str;

    /// Names accepted by [`Processor::property`] and [`Processor::set_property`].
    fn property_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn property(&self, name: &str) -> Result<f64, ProcessorError> {
        Err(unknown_property(self.name(), name))
    }

    fn set_property(&mut self, name: &str, _value: f64) -> Result<(), ProcessorError> {
        Err(unknown_property(self.name(), name))
    }

    fn process(&mut self, buffer: &mut Buffer<T>) -> Result<(), ProcessorError>;
}

pub(crate) fn unknown_property(processor: &'static str, name: &str) -> ProcessorError {
    error!("{} has no property '{}'", processor, name);
    ProcessorError::UnknownProperty {
        processor,
        property: name.to_string(),
    }
}

/// Accepts finite values inside `0.0..=1.0`.
pub(crate) fn normalized(name: &str, value: f64) -> Result<f64, ProcessorError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        error!("Rejected value {} for property '{}'", value, name);
        return Err(ProcessorError::InvalidProperty {
            property: name.to_string(),
            value,
        });
    }
    Ok(value)
}
