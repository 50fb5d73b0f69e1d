//! Level and stereo balance.

use crate::audio::{AudioSample, Buffer};
use crate::config::{BALANCE_DEFAULT, EngineConfig, LEVEL_DEFAULT};
use crate::error::ProcessorError;
use crate::pipeline::processor::{Processor, normalized, unknown_property};

pub const BALANCE: &str = "Balance";
pub const LEVEL: &str = "Level";

/// Scales every channel by `2 * Level` and shifts gain between channel 0
/// (left) and channel 1 (right) according to `Balance`.
///
/// At `Balance = 0.5` both sides pass unchanged. Moving towards 0.0 fades the
/// right channel out, towards 1.0 the left one. Channels past the first two
/// and mono buffers only get the level gain. Results clip at full scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leveler {
    balance: f64,
    level: f64,
}

impl Default for Leveler {
    fn default() -> Self {
        Self {
            balance: BALANCE_DEFAULT,
            level: LEVEL_DEFAULT,
        }
    }
}

impl Leveler {
    pub fn new(level: f64, balance: f64) -> Result<Self, ProcessorError> {
        Ok(Self {
            level: normalized(LEVEL, level)?,
            balance: normalized(BALANCE, balance)?,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            level: config.level.clamp(0.0, 1.0),
            balance: config.balance.clamp(0.0, 1.0),
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Gain applied to `channel` of a buffer with `channels` channels.
    fn gain(&self, channel: usize, channels: usize) -> f64 {
        let level = 2.0 * self.level;
        if channels < 2 {
            return level;
        }
        match channel {
            0 => level * (2.0 * (1.0 - self.balance)).min(1.0),
            1 => level * (2.0 * self.balance).min(1.0),
            _ => level,
        }
    }
}

impl<T: AudioSample> Processor<T> for Leveler {
    fn name(&self) -> &'static str {
        "Leveler"
    }

    fn property_names(&self) -> &'static [&'static str] {
        &[BALANCE, LEVEL]
    }

    fn property(&self, name: &str) -> Result<f64, ProcessorError> {
        match name {
            BALANCE => Ok(self.balance),
            LEVEL => Ok(self.level),
            _ => Err(unknown_property("Leveler", name)),
        }
    }

    fn set_property(&mut self, name: &str, value: f64) -> Result<(), ProcessorError> {
        match name {
            BALANCE => self.balance = normalized(name, value)?,
            LEVEL => self.level = normalized(name, value)?,
            _ => return Err(unknown_property("Leveler", name)),
        }
        Ok(())
    }

    fn process(&mut self, buffer: &mut Buffer<T>) -> Result<(), ProcessorError> {
        let channels = buffer.channels();
        let gains: Vec<f64> = (0..channels).map(|ch| self.gain(ch, channels)).collect();
        if gains.iter().all(|&g| g == 1.0) {
            return Ok(());
        }

        for frame in buffer.iter_frames_mut() {
            for (sample, gain) in frame.iter_mut().zip(&gains) {
                *sample = T::from_f64_normalized(sample.to_f64_normalized() * gain);
            }
        }
        Ok(())
    }
}
