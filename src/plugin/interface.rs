//! Capability interfaces that plugins can provide.

use serde::{Deserialize, Serialize};

/// Marker for a capability identified by a string tag.
///
/// `Object` is the trait object every implementation of the capability is
/// handed out as.
pub trait Interface: 'static {
    const TAG: &'static str;
    type Object: ?Sized + Send + 'static;
}

/// Resampling fidelity, ordered from cheapest to best.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Fast,
    #[default]
    Normal,
    High,
}

/// Bulk sample rate converter over interleaved `f32` data.
pub trait Resampler: Send {
    /// Converts `source_frames` frames of `source` into exactly `dest_frames`
    /// frames of `dest`. `ratio` is destination rate over source rate.
    #[allow(clippy::too_many_arguments)]
    fn simple(
        &mut self,
        dest: &mut [f32],
        dest_frames: usize,
        source: &[f32],
        source_frames: usize,
        channels: usize,
        ratio: f64,
        quality: Quality,
    ) -> anyhow::Result<()>;
}

/// The resampling capability, registered under `"IResampler"`.
pub struct ResamplerInterface;

impl Interface for ResamplerInterface {
    const TAG: &'static str = "IResampler";
    type Object = dyn Resampler;
}
