use crate::audio::{AudioSample, Buffer};
use crate::error::ProcessorError;
use crate::pipeline::processor::Processor;

/// Silences the whole buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl<T: AudioSample> Processor<T> for Silence {
    fn name(&self) -> &'static str {
        "Silence"
    }

    fn process(&mut self, buffer: &mut Buffer<T>) -> Result<(), ProcessorError> {
        buffer.silence();
        Ok(())
    }
}
