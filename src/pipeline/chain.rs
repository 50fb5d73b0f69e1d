use tracing::{error, trace};

use super::processor::Processor;
use crate::audio::{AudioSample, Buffer};
use crate::error::ProcessorError;

/// Processors applied in insertion order.
///
/// # Example
///
/// ```ignore
/// let mut chain = ProcessorChain::new()
///     .with(Leveler::from_config(&config))
///     .with(Silence);
/// chain.process(&mut buffer)?;
/// ```
pub struct ProcessorChain<T: AudioSample> {
    processors: Vec<Box<dyn Processor<T>>>,
}

impl<T: AudioSample> Default for ProcessorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: AudioSample> ProcessorChain<T> {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    pub fn with<P: Processor<T> + 'static>(mut self, processor: P) -> Self {
        self.push(processor);
        self
    }

    pub fn push<P: Processor<T> + 'static>(&mut self, processor: P) {
        self.processors.push(Box::new(processor));
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Processor<T> + 'static)> {
        self.processors.get_mut(index).map(|p| p.as_mut())
    }

    /// Runs every processor on `buffer`, stopping at the first failure.
    pub fn process(&mut self, buffer: &mut Buffer<T>) -> Result<(), ProcessorError> {
        for processor in self.processors.iter_mut() {
            trace!("Running {} on {} frames", processor.name(), buffer.frames());
            if let Err(e) = processor.process(buffer) {
                error!("{} failed: {}", processor.name(), e);
                return Err(e);
            }
        }
        Ok(())
    }
}
