//! Channel-interleaved sample storage.

use dasp_sample::I24;
use tracing::{debug, error};

use super::endian::{pack_int24, unpack_int24};
use super::frame::{ConstFrame, Frame};
use super::sample::{AudioSample, SampleKind, decode_ne};
use crate::error::{BufferError, Result};
use crate::plugin::{self, Quality, Registry, ResamplerInterface};

/// Owns `channels * frames` samples, interleaved per frame.
///
/// Storage capacity is kept when the buffer shrinks, so repeated reshaping
/// within the largest size seen so far does not reallocate.
///
/// # Example
///
/// ```ignore
/// let mut buffer = Buffer::<i16>::with_shape(2, 100);
/// buffer.assign_raw(&bytes, SampleKind::Float32, 2, 100)?;
/// let half_rate = buffer.resample(22050, 44100, Quality::Normal)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer<T: AudioSample> {
    channels: usize,
    frames: usize,
    samples: Vec<T>,
}

impl<T: AudioSample> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: AudioSample> Buffer<T> {
    /// Empty buffer with no channels and no frames.
    pub fn new() -> Self {
        Self {
            channels: 0,
            frames: 0,
            samples: Vec::new(),
        }
    }

    /// Silent buffer of the given shape.
    pub fn with_shape(channels: usize, frames: usize) -> Self {
        Self {
            channels,
            frames,
            samples: vec![T::silence(); channels * frames],
        }
    }

    /// Buffer holding a converted copy of the range `begin..end`.
    pub fn from_range<S: AudioSample>(begin: ConstFrame<'_, S>, end: ConstFrame<'_, S>) -> Result<Self> {
        let mut buffer = Self::new();
        buffer.assign(begin, end)?;
        Ok(buffer)
    }

    /// Unpacks a host-order packed 24-bit PCM stream, as written by
    /// [`Buffer::native_int24`].
    pub fn from_native_int24(bytes: &[u8], channels: usize) -> Result<Self> {
        let samples: Vec<I24> = bytes
            .chunks_exact(3)
            .map(|packed| I24::new_unchecked(unpack_int24(packed)))
            .collect();
        let mut buffer = Self::new();
        buffer.assign_slice(&samples, channels)?;
        Ok(buffer)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of samples, `channels * frames`.
    pub fn size(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn kind(&self) -> SampleKind {
        T::KIND
    }

    pub fn data(&self) -> &[T] {
        &self.samples
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.samples
    }

    pub fn begin(&self) -> Frame {
        Frame::new(self.channels, 0)
    }

    pub fn end(&self) -> Frame {
        Frame::new(self.channels, self.frames as isize)
    }

    pub fn cbegin(&self) -> ConstFrame<'_, T> {
        ConstFrame::new(self.channels, &self.samples)
    }

    pub fn cend(&self) -> ConstFrame<'_, T> {
        self.cbegin() + self.frames
    }

    /// Samples of the frame at `frame`.
    pub fn frame(&self, frame: Frame) -> Result<&[T]> {
        let range = self.frame_range(frame)?;
        Ok(&self.samples[range])
    }

    pub fn frame_mut(&mut self, frame: Frame) -> Result<&mut [T]> {
        let range = self.frame_range(frame)?;
        Ok(&mut self.samples[range])
    }

    fn frame_range(&self, frame: Frame) -> Result<std::ops::Range<usize>> {
        self.check_channels(frame.channels())?;
        let position = frame.position();
        if position < 0 || position >= self.frames as isize {
            error!(
                "Frame {} out of buffer bounds 0..{}",
                position, self.frames
            );
            return Err(BufferError::OutOfBounds {
                begin: position,
                end: position + 1,
                frames: self.frames,
            });
        }
        let start = position as usize * self.channels;
        Ok(start..start + self.channels)
    }

    pub fn iter_frames(&self) -> impl Iterator<Item = &[T]> {
        self.samples.chunks_exact(self.channels.max(1))
    }

    pub fn iter_frames_mut(&mut self) -> impl Iterator<Item = &mut [T]> {
        self.samples.chunks_exact_mut(self.channels.max(1))
    }

    /// Samples of one channel across all frames.
    pub fn iter_channel(&self, channel: usize) -> impl Iterator<Item = &T> {
        assert!(
            channel < self.channels,
            "Channel index {} out of bounds (max {})",
            channel,
            self.channels.saturating_sub(1)
        );
        self.samples.iter().skip(channel).step_by(self.channels)
    }

    fn check_channels(&self, channels: usize) -> Result<()> {
        if channels != self.channels {
            error!(
                "Frame channels {} differ from buffer channels {}",
                channels, self.channels
            );
            return Err(BufferError::ChannelMismatch {
                left: self.channels,
                right: channels,
            });
        }
        Ok(())
    }

    /// Validates a source range and returns its frame count.
    fn range_len<S: AudioSample>(begin: &ConstFrame<'_, S>, end: &ConstFrame<'_, S>) -> Result<usize> {
        let Some(distance) = end.distance_from(begin) else {
            error!(
                "Begin and end frame channels count differs. Begin channels: {}, end channels: {}",
                begin.channels(),
                end.channels()
            );
            return Err(BufferError::ChannelMismatch {
                left: begin.channels(),
                right: end.channels(),
            });
        };
        if distance < 0 {
            error!("End frame is {} frames before begin frame", -distance);
            return Err(BufferError::InvertedRange { distance });
        }
        Ok(distance as usize)
    }

    /// Reshapes to the range's channel count and length, then copies it in.
    pub fn assign<S: AudioSample>(&mut self, begin: ConstFrame<'_, S>, end: ConstFrame<'_, S>) -> Result<()> {
        let count = Self::range_len(&begin, &end)?;
        if begin.span(count).is_none() {
            error!(
                "Source range {}..{} exceeds its storage",
                begin.position(),
                end.position()
            );
            return Err(BufferError::OutOfBounds {
                begin: begin.position(),
                end: end.position(),
                frames: count,
            });
        }
        self.reallocate(begin.channels(), count);
        self.copy(begin, end)?;
        Ok(())
    }

    /// Assigns interleaved `samples` of any kind. A trailing partial frame
    /// is ignored.
    pub fn assign_slice<S: AudioSample>(&mut self, samples: &[S], channels: usize) -> Result<()> {
        let begin = ConstFrame::new(channels, samples);
        self.assign(begin, ConstFrame::end_of(channels, samples))
    }

    /// Assigns `channels * frames` native-endian samples of `kind` decoded
    /// from `bytes`.
    pub fn assign_raw(
        &mut self,
        bytes: &[u8],
        kind: SampleKind,
        channels: usize,
        frames: usize,
    ) -> Result<()> {
        let Some(needed) = channels
            .checked_mul(frames)
            .and_then(|samples| samples.checked_mul(kind.byte_width()))
        else {
            error!(
                "Raw {:?} input shape {} channels x {} frames overflows",
                kind, channels, frames
            );
            return Err(BufferError::InsufficientData {
                needed: usize::MAX,
                available: bytes.len(),
            });
        };
        if bytes.len() < needed {
            error!(
                "Raw {:?} input of {} bytes, {} channels x {} frames needs {}",
                kind,
                bytes.len(),
                channels,
                frames,
                needed
            );
            return Err(BufferError::InsufficientData {
                needed,
                available: bytes.len(),
            });
        }

        let bytes = &bytes[..needed];
        match kind {
            SampleKind::Int16 => self.assign_decoded(&decode_ne::<i16>(bytes), channels, frames),
            SampleKind::Int24 => self.assign_decoded(&decode_ne::<I24>(bytes), channels, frames),
            SampleKind::Int32 => self.assign_decoded(&decode_ne::<i32>(bytes), channels, frames),
            SampleKind::Float32 => self.assign_decoded(&decode_ne::<f32>(bytes), channels, frames),
        }
    }

    fn assign_decoded<S: AudioSample>(&mut self, samples: &[S], channels: usize, frames: usize) -> Result<()> {
        let begin = ConstFrame::new(channels, samples);
        self.assign(begin, begin + frames)
    }

    /// Copies the range `begin..end` to the start of this buffer, converting
    /// samples to this buffer's kind. Returns the frame after the last one
    /// written.
    ///
    /// On error the buffer is left untouched.
    pub fn copy<S: AudioSample>(&mut self, begin: ConstFrame<'_, S>, end: ConstFrame<'_, S>) -> Result<Frame> {
        let count = Self::range_len(&begin, &end)?;

        if begin.channels() != self.channels {
            error!(
                "Source channels {} differ from buffer channels {}",
                begin.channels(),
                self.channels
            );
            return Err(BufferError::ChannelMismatch {
                left: self.channels,
                right: begin.channels(),
            });
        }

        if count > self.frames {
            error!(
                "Buffer overflow. Buffer frames: {} vs {}",
                self.frames, count
            );
            return Err(BufferError::BufferOverflow {
                capacity: self.frames,
                requested: count,
            });
        }

        let Some(source) = begin.span(count) else {
            error!(
                "Source range {}..{} exceeds its storage",
                begin.position(),
                end.position()
            );
            return Err(BufferError::OutOfBounds {
                begin: begin.position(),
                end: end.position(),
                frames: count,
            });
        };

        let dest = &mut self.samples[..count * self.channels];
        match T::same_kind(source) {
            Some(same) => dest.copy_from_slice(same),
            None => {
                for (d, s) in dest.iter_mut().zip(source) {
                    *d = s.convert();
                }
            }
        }

        Ok(self.begin() + count)
    }

    /// Silences every sample.
    pub fn silence(&mut self) {
        self.samples.fill(T::silence());
    }

    /// Silences the frames `begin..end`.
    pub fn silence_range(&mut self, begin: Frame, end: Frame) -> Result<()> {
        self.check_channels(begin.channels())?;
        self.check_channels(end.channels())?;

        let frames = self.frames as isize;
        let within = |frame: Frame| (0..=frames).contains(&frame.position());
        if !within(begin) || !within(end) || end < begin {
            error!(
                "Frame range {}..{} out of buffer bounds 0..{}",
                begin.position(),
                end.position(),
                self.frames
            );
            return Err(BufferError::OutOfBounds {
                begin: begin.position(),
                end: end.position(),
                frames: self.frames,
            });
        }

        let start = begin.position() as usize * self.channels;
        let stop = end.position() as usize * self.channels;
        self.samples[start..stop].fill(T::silence());
        Ok(())
    }

    /// Changes both dimensions. Contents are silenced when the shape changes.
    ///
    /// Storage is only reallocated when the new shape needs more samples than
    /// it can hold; the old allocation is released first so stale data is
    /// never copied.
    pub fn reallocate(&mut self, channels: usize, frames: usize) {
        if self.channels == channels && self.frames == frames {
            return;
        }

        let needed = channels * frames;
        if needed > self.samples.capacity() {
            self.samples = Vec::new();
        } else {
            self.samples.clear();
        }
        self.samples.resize(needed, T::silence());
        self.channels = channels;
        self.frames = frames;
    }

    /// Changes the frame count, keeping the channel count and the leading
    /// frames. New frames are silent.
    pub fn resize(&mut self, frames: usize) {
        if self.frames != frames {
            self.samples.resize(self.channels * frames, T::silence());
            self.frames = frames;
        }
    }

    /// Writes every sample as 24-bit PCM in host byte order, 3 bytes each.
    pub fn native_int24(&self, dest: &mut [u8]) -> Result<()> {
        let needed = self.size() * 3;
        if dest.len() < needed {
            error!(
                "24-bit destination holds {} bytes, need {}",
                dest.len(),
                needed
            );
            return Err(BufferError::InsufficientData {
                needed,
                available: dest.len(),
            });
        }

        for (sample, out) in self.samples.iter().zip(dest.chunks_exact_mut(3)) {
            pack_int24(sample.convert::<i32>(), out);
        }
        Ok(())
    }

    /// Resamples the whole buffer from `source_rate` to `dest_rate` using the
    /// process-wide plugin registry.
    pub fn resample(&self, dest_rate: u32, source_rate: u32, quality: Quality) -> Result<Self> {
        let registry = plugin::registry()?;
        self.resample_with(&registry, dest_rate, source_rate, quality)
    }

    /// Like [`Buffer::resample`] with an explicit registry.
    pub fn resample_with(
        &self,
        registry: &Registry,
        dest_rate: u32,
        source_rate: u32,
        quality: Quality,
    ) -> Result<Self> {
        let mut result = Self::new();
        result.resample_range_with(
            registry,
            self.cbegin(),
            self.cend(),
            dest_rate,
            source_rate,
            quality,
        )?;
        Ok(result)
    }

    /// Replaces this buffer with the range `begin..end` resampled from
    /// `source_rate` to `dest_rate`.
    pub fn resample_range<S: AudioSample>(
        &mut self,
        begin: ConstFrame<'_, S>,
        end: ConstFrame<'_, S>,
        dest_rate: u32,
        source_rate: u32,
        quality: Quality,
    ) -> Result<()> {
        let registry = plugin::registry()?;
        self.resample_range_with(&registry, begin, end, dest_rate, source_rate, quality)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn resample_range_with<S: AudioSample>(
        &mut self,
        registry: &Registry,
        begin: ConstFrame<'_, S>,
        end: ConstFrame<'_, S>,
        dest_rate: u32,
        source_rate: u32,
        quality: Quality,
    ) -> Result<()> {
        if dest_rate == 0 || source_rate == 0 {
            error!(
                "Cannot resample from {} Hz to {} Hz",
                source_rate, dest_rate
            );
            return Err(BufferError::InvalidRate {
                dest_rate,
                source_rate,
            });
        }

        let source_frames = Self::range_len(&begin, &end)?;
        let channels = begin.channels();
        let ratio = f64::from(dest_rate) / f64::from(source_rate);
        let dest_frames = (source_frames as f64 * ratio).floor() as usize;

        let factory = registry.factory_for::<ResamplerInterface>()?;
        let source = Buffer::<f32>::from_range(begin, end)?;
        let mut dest = Buffer::<f32>::with_shape(channels, dest_frames);

        debug!(
            "Resampling {} frames x {} channels, {} Hz -> {} Hz ({:?}) with {}",
            source_frames,
            channels,
            source_rate,
            dest_rate,
            quality,
            factory.provider()
        );

        {
            let mut resampler = factory.create();
            resampler
                .simple(
                    dest.data_mut(),
                    dest_frames,
                    source.data(),
                    source_frames,
                    channels,
                    ratio,
                    quality,
                )
                .map_err(|e| {
                    error!("Resampler {} failed: {:#}", factory.provider(), e);
                    BufferError::Resampler(format!("{e:#}"))
                })?;
        }

        self.assign(dest.cbegin(), dest.cend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::rubato_plugin;

    fn ramp(channels: usize, frames: usize) -> Buffer<i16> {
        let samples: Vec<i16> = (0..channels * frames).map(|i| i as i16 * 10).collect();
        let mut buffer = Buffer::new();
        buffer.assign_slice(&samples, channels).unwrap();
        buffer
    }

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.load(rubato_plugin()).unwrap();
        registry
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = Buffer::<f32>::new();
        assert_eq!(buffer.channels(), 0);
        assert_eq!(buffer.frames(), 0);
        assert_eq!(buffer.size(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_with_shape_is_silent() {
        for (channels, frames) in [(1, 1), (2, 100), (6, 33), (3, 0)] {
            let buffer = Buffer::<I24>::with_shape(channels, frames);
            assert_eq!(buffer.size(), channels * frames);
            assert!(buffer.data().iter().all(|s| s.inner() == 0));
        }
    }

    #[test]
    fn test_from_range_infers_shape() {
        let samples = [1.0f32, -1.0, 0.5, -0.5, 0.25, -0.25];
        let begin = ConstFrame::new(2, &samples);
        let buffer = Buffer::<i16>::from_range(begin, begin + 3).unwrap();
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.frames(), 3);
        assert_eq!(buffer.kind(), SampleKind::Int16);
        assert_eq!(buffer.data()[2], 16384);
        assert_eq!(buffer.data()[1], -32768);
    }

    #[test]
    fn test_copy_same_kind_is_exact() {
        let source = ramp(2, 10);
        let mut dest = Buffer::<i16>::with_shape(2, 10);
        let end = dest.copy(source.cbegin(), source.cend()).unwrap();
        assert_eq!(end, dest.end());
        assert_eq!(dest, source);
    }

    #[test]
    fn test_copy_is_idempotent() {
        let source = ramp(2, 8);
        let mut dest = Buffer::<f32>::with_shape(2, 12);
        dest.copy(source.cbegin(), source.cend()).unwrap();
        let once = dest.clone();
        dest.copy(source.cbegin(), source.cend()).unwrap();
        assert_eq!(dest, once);
    }

    #[test]
    fn test_copy_returns_end_of_written_range() {
        let source = ramp(1, 4);
        let mut dest = Buffer::<i32>::with_shape(1, 10);
        let end = dest.copy(source.cbegin(), source.cend()).unwrap();
        assert_eq!(end - dest.begin(), 4);
        assert_eq!(dest.data()[3], (30i32) << 16);
        assert_eq!(dest.data()[4], 0);
    }

    #[test]
    fn test_copy_channel_mismatch_leaves_destination() {
        let stereo = ramp(2, 4);
        let mono = ramp(1, 8);
        let mut dest = ramp(1, 8);

        let err = dest.copy(stereo.cbegin(), mono.cend()).unwrap_err();
        assert_eq!(err, BufferError::ChannelMismatch { left: 2, right: 1 });
        assert_eq!(dest, mono);
    }

    #[test]
    fn test_copy_inverted_range() {
        let source = ramp(2, 4);
        let mut dest = Buffer::<i16>::with_shape(2, 4);
        let err = dest.copy(source.cend(), source.cbegin()).unwrap_err();
        assert_eq!(err, BufferError::InvertedRange { distance: -4 });
    }

    #[test]
    fn test_copy_overflow() {
        let source = ramp(2, 8);
        let mut dest = Buffer::<i16>::with_shape(2, 4);
        let err = dest.copy(source.cbegin(), source.cend()).unwrap_err();
        assert_eq!(
            err,
            BufferError::BufferOverflow {
                capacity: 4,
                requested: 8
            }
        );
        assert!(dest.data().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_copy_past_source_storage() {
        let source = ramp(2, 4);
        let mut dest = Buffer::<i16>::with_shape(2, 8);
        let err = dest.copy(source.cbegin(), source.cbegin() + 6).unwrap_err();
        assert!(matches!(err, BufferError::OutOfBounds { .. }));
    }

    #[test]
    fn test_copy_into_fewer_channels_fails() {
        let stereo = ramp(2, 4);
        let mut dest = Buffer::<i16>::with_shape(1, 4);
        dest.data_mut().fill(7);

        let err = dest.copy(stereo.cbegin(), stereo.cend()).unwrap_err();
        assert_eq!(err, BufferError::ChannelMismatch { left: 1, right: 2 });
        assert!(dest.data().iter().all(|&s| s == 7));

        let mono = ramp(1, 3);
        let mut wide = Buffer::<f32>::with_shape(2, 3);
        assert!(matches!(
            wide.copy(mono.cbegin(), mono.cend()),
            Err(BufferError::ChannelMismatch { left: 2, right: 1 })
        ));
        assert!(wide.data().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_assign_raw_oversized_shape() {
        let mut buffer = Buffer::<i32>::with_shape(1, 2);
        let err = buffer
            .assign_raw(&[0u8; 4], SampleKind::Int32, usize::MAX / 2, 3)
            .unwrap_err();
        assert!(matches!(
            err,
            BufferError::InsufficientData { available: 4, .. }
        ));
        assert_eq!(buffer.frames(), 2);
    }

    #[test]
    fn test_silence_range() {
        let mut buffer = ramp(2, 10);
        let original = buffer.clone();
        let begin = buffer.begin() + 3;
        let end = buffer.begin() + 6;
        buffer.silence_range(begin, end).unwrap();

        for frame in 0..10 {
            let f = buffer.begin() + frame;
            let samples = buffer.frame(f).unwrap();
            if (3..6).contains(&frame) {
                assert!(samples.iter().all(|&s| s == 0));
            } else {
                assert_eq!(samples, original.frame(f).unwrap());
            }
        }
    }

    #[test]
    fn test_silence_range_bounds() {
        let mut buffer = ramp(2, 10);
        let begin = buffer.begin();
        let end = buffer.end();
        assert!(matches!(
            buffer.silence_range(begin - 1, end),
            Err(BufferError::OutOfBounds { .. })
        ));
        assert!(matches!(
            buffer.silence_range(begin, end + 1),
            Err(BufferError::OutOfBounds { .. })
        ));
        assert!(matches!(
            buffer.silence_range(begin + 5, begin + 2),
            Err(BufferError::OutOfBounds { .. })
        ));
        assert!(matches!(
            buffer.silence_range(Frame::new(1, 0), Frame::new(1, 1)),
            Err(BufferError::ChannelMismatch { .. })
        ));
        buffer.silence_range(begin, end).unwrap();
        assert!(buffer.data().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_silence_all() {
        let mut buffer = ramp(3, 5);
        buffer.silence();
        assert_eq!(buffer.size(), 15);
        assert!(buffer.data().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_reallocate_keeps_capacity_on_shrink() {
        let mut buffer = Buffer::<f32>::with_shape(2, 100);
        let capacity = buffer.capacity();
        buffer.reallocate(1, 50);
        assert_eq!(buffer.size(), 50);
        assert_eq!(buffer.capacity(), capacity);
        buffer.reallocate(2, 100);
        assert_eq!(buffer.capacity(), capacity);
        buffer.reallocate(4, 100);
        assert_eq!(buffer.size(), 400);
        assert!(buffer.capacity() >= 400);
    }

    #[test]
    fn test_resize_keeps_leading_frames() {
        let mut buffer = ramp(2, 4);
        buffer.resize(2);
        assert_eq!(buffer.data(), &[0, 10, 20, 30]);
        buffer.resize(3);
        assert_eq!(buffer.data(), &[0, 10, 20, 30, 0, 0]);
        assert_eq!(buffer.frames(), 3);
    }

    #[test]
    fn test_assign_raw_float_into_int() {
        let values = [0.5f32, -0.5, 0.25, 0.0];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let mut buffer = Buffer::<i16>::new();
        buffer.assign_raw(&bytes, SampleKind::Float32, 2, 2).unwrap();
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.data(), &[16384, -16384, 8192, 0]);
    }

    #[test]
    fn test_assign_raw_short_input() {
        let mut buffer = Buffer::<f32>::new();
        let err = buffer
            .assign_raw(&[0u8; 6], SampleKind::Int16, 2, 2)
            .unwrap_err();
        assert_eq!(
            err,
            BufferError::InsufficientData {
                needed: 8,
                available: 6
            }
        );
    }

    #[test]
    fn test_int24_round_trip_is_bit_exact() {
        let mut packed = Vec::new();
        for value in [0i32, 1, -1, 0x7F_FFFF, -0x80_0000, 123_456, -654_321] {
            let mut out = [0u8; 3];
            pack_int24(value << 8, &mut out);
            packed.extend_from_slice(&out);
        }
        let first = packed.clone();
        packed.extend_from_slice(&first);

        let widened: Vec<u8> = packed
            .chunks_exact(3)
            .flat_map(|b| unpack_int24(b).to_ne_bytes())
            .collect();
        let mut buffer = Buffer::<I24>::new();
        buffer
            .assign_raw(&widened, SampleKind::Int24, 2, packed.len() / 6)
            .unwrap();

        let mut out = vec![0u8; buffer.size() * 3];
        buffer.native_int24(&mut out).unwrap();
        assert_eq!(out, packed);

        let unpacked = Buffer::<I24>::from_native_int24(&packed, 2).unwrap();
        assert_eq!(unpacked, buffer);
    }

    #[test]
    fn test_native_int24_short_destination() {
        let buffer = Buffer::<i16>::with_shape(2, 2);
        let mut out = [0u8; 11];
        assert!(matches!(
            buffer.native_int24(&mut out),
            Err(BufferError::InsufficientData { needed: 12, .. })
        ));
    }

    #[test]
    fn test_frame_access() {
        let mut buffer = ramp(2, 3);
        let second = buffer.begin() + 1;
        assert_eq!(buffer.frame(second).unwrap(), &[20, 30]);
        buffer.frame_mut(second).unwrap()[0] = -1;
        assert_eq!(buffer.data()[2], -1);
        let end = buffer.end();
        assert!(buffer.frame(end).is_err());
    }

    #[test]
    fn test_iter_channel() {
        let buffer = ramp(2, 3);
        let left: Vec<_> = buffer.iter_channel(0).copied().collect();
        let right: Vec<_> = buffer.iter_channel(1).copied().collect();
        assert_eq!(left, vec![0, 20, 40]);
        assert_eq!(right, vec![10, 30, 50]);
        assert_eq!(buffer.iter_frames().count(), 3);
    }

    #[test]
    fn test_resample_identity() {
        let registry = registry();
        let samples: Vec<f32> = (0..200).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let mut buffer = Buffer::<i32>::new();
        buffer.assign_slice(&samples, 2).unwrap();

        let result = buffer
            .resample_with(&registry, 48000, 48000, Quality::Fast)
            .unwrap();
        assert_eq!(result.frames(), buffer.frames());
        assert_eq!(result.channels(), 2);
        for (a, b) in result.data().iter().zip(buffer.data()) {
            assert!((a.to_f64_normalized() - b.to_f64_normalized()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_resample_halves_sine() {
        let registry = registry();
        let mut buffer = Buffer::<f32>::with_shape(2, 100);
        for (i, frame) in buffer.iter_frames_mut().enumerate() {
            let v = (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin();
            frame.fill(v * 0.5);
        }

        let result = buffer
            .resample_with(&registry, 22050, 44100, Quality::Normal)
            .unwrap();
        assert_eq!(result.frames(), 50);
        assert_eq!(result.channels(), 2);
        assert_eq!(registry.live_instances("rubato"), Some(0));
    }

    #[test]
    fn test_resample_without_resampler() {
        let registry = Registry::new();
        let buffer = Buffer::<i16>::with_shape(2, 10);
        let err = buffer
            .resample_with(&registry, 22050, 44100, Quality::High)
            .unwrap_err();
        assert_eq!(
            err,
            BufferError::Plugin(crate::error::RegistryError::UnknownInterface(
                "IResampler".to_string()
            ))
        );
    }

    #[test]
    fn test_resample_zero_rate() {
        let registry = registry();
        let buffer = Buffer::<i16>::with_shape(1, 10);
        assert!(matches!(
            buffer.resample_with(&registry, 0, 44100, Quality::Fast),
            Err(BufferError::InvalidRate { .. })
        ));
    }
}
