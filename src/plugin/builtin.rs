//! Plugins compiled into the crate.
//!
//! - [`rubato_plugin`] - sample rate conversion backed by `rubato`

use anyhow::{Result, ensure};
use rubato::{
    FastFixedIn, PolynomialDegree, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use super::interface::{Quality, Resampler, ResamplerInterface};
use super::registry::Plugin;

const SINC_LEN: usize = 256;
const SINC_OVERSAMPLING: usize = 128;
const SINC_CUTOFF: f32 = 0.95;

// Upper bound on flush calls while draining the resampler's delay line.
const MAX_FLUSHES: usize = 1024;

pub fn rubato_plugin() -> Plugin {
    Plugin::builder(
        "rubato",
        env!("CARGO_PKG_VERSION"),
        "Polynomial and windowed-sinc sample rate conversion",
    )
    .provides::<ResamplerInterface, _>("RubatoResampler", || {
        Box::new(RubatoResampler) as Box<dyn Resampler>
    })
    .build()
}

/// Resamples a whole interleaved block in one pass.
///
/// `Fast` and `Normal` use linear and cubic polynomial interpolation, `High`
/// uses a windowed sinc filter. A ratio of exactly 1 copies the input.
#[derive(Debug, Default)]
pub struct RubatoResampler;

impl Resampler for RubatoResampler {
    fn simple(
        &mut self,
        dest: &mut [f32],
        dest_frames: usize,
        source: &[f32],
        source_frames: usize,
        channels: usize,
        ratio: f64,
        quality: Quality,
    ) -> Result<()> {
        ensure!(
            dest.len() >= dest_frames * channels,
            "destination holds {} samples, need {}",
            dest.len(),
            dest_frames * channels
        );
        ensure!(
            source.len() >= source_frames * channels,
            "source holds {} samples, need {}",
            source.len(),
            source_frames * channels
        );
        ensure!(ratio.is_finite() && ratio > 0.0, "invalid ratio {}", ratio);

        let dest = &mut dest[..dest_frames * channels];
        let source = &source[..source_frames * channels];
        dest.fill(0.0);

        if channels == 0 || dest_frames == 0 || source_frames == 0 {
            return Ok(());
        }

        if ratio == 1.0 {
            let frames = dest_frames.min(source_frames);
            dest[..frames * channels].copy_from_slice(&source[..frames * channels]);
            return Ok(());
        }

        let input = deinterleave(source, channels);
        let output = match quality {
            Quality::Fast => drive(
                FastFixedIn::<f32>::new(
                    ratio,
                    1.0,
                    PolynomialDegree::Linear,
                    source_frames,
                    channels,
                )?,
                &input,
                dest_frames,
            )?,
            Quality::Normal => drive(
                FastFixedIn::<f32>::new(
                    ratio,
                    1.0,
                    PolynomialDegree::Cubic,
                    source_frames,
                    channels,
                )?,
                &input,
                dest_frames,
            )?,
            Quality::High => {
                let parameters = SincInterpolationParameters {
                    sinc_len: SINC_LEN,
                    f_cutoff: SINC_CUTOFF,
                    oversampling_factor: SINC_OVERSAMPLING,
                    interpolation: SincInterpolationType::Cubic,
                    window: WindowFunction::BlackmanHarris2,
                };
                drive(
                    SincFixedIn::<f32>::new(ratio, 1.0, parameters, source_frames, channels)?,
                    &input,
                    dest_frames,
                )?
            }
        };

        for (frame_idx, frame) in dest.chunks_exact_mut(channels).enumerate() {
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = output[ch][frame_idx];
            }
        }
        Ok(())
    }
}

fn deinterleave(source: &[f32], channels: usize) -> Vec<Vec<f32>> {
    (0..channels)
        .map(|ch| source.iter().skip(ch).step_by(channels).copied().collect())
        .collect()
}

/// Runs one full chunk through `resampler`, flushes its delay line and
/// returns exactly `frames` frames per channel, aligned to the input.
fn drive<R: rubato::Resampler<f32>>(
    mut resampler: R,
    input: &[Vec<f32>],
    frames: usize,
) -> Result<Vec<Vec<f32>>> {
    let delay = resampler.output_delay();
    let wanted = delay + frames;

    let mut output = resampler.process(input, None)?;
    let mut flushes = 0;
    while output[0].len() < wanted && flushes < MAX_FLUSHES {
        let tail = resampler.process_partial(None::<&[Vec<f32>]>, None)?;
        if tail[0].is_empty() {
            break;
        }
        for (channel, rest) in output.iter_mut().zip(tail) {
            channel.extend(rest);
        }
        flushes += 1;
    }

    for channel in output.iter_mut() {
        channel.drain(..delay.min(channel.len()));
        channel.resize(frames, 0.0);
    }
    Ok(output)
}
