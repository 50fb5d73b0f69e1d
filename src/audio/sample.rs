use std::fmt::Debug;

use dasp_sample::types::i24;
use dasp_sample::{FromSample, I24, Sample as DaspSample, ToSample};

/// Tag naming the numeric representation of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Int16,
    /// 24-bit integer held widened in 32 bits.
    Int24,
    Int32,
    Float32,
}

impl SampleKind {
    /// Width in bytes of one stored sample of this kind.
    pub const fn byte_width(self) -> usize {
        match self {
            SampleKind::Int16 => 2,
            SampleKind::Int24 | SampleKind::Int32 | SampleKind::Float32 => 4,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, SampleKind::Float32)
    }
}

/// Borrowed run of samples of any supported kind.
#[derive(Debug, Clone, Copy)]
pub enum AnySlice<'a> {
    Int16(&'a [i16]),
    Int24(&'a [I24]),
    Int32(&'a [i32]),
    Float32(&'a [f32]),
}

/// A sample of any supported kind, used to dispatch conversions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnySample {
    Int16(i16),
    Int24(I24),
    Int32(i32),
    Float32(f32),
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i16 {}
    impl Sealed for dasp_sample::I24 {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
}

/// Scalar audio value of one of the supported kinds.
///
/// The set of kinds is closed. Converting between kinds rescales full scale
/// to full scale through the `dasp_sample` conversion table.
pub trait AudioSample:
    DaspSample
    + FromSample<i16>
    + FromSample<I24>
    + FromSample<i32>
    + FromSample<f32>
    + FromSample<f64>
    + ToSample<i32>
    + ToSample<f64>
    + Default
    + Debug
    + Send
    + Sync
    + sealed::Sealed
    + 'static
{
    const KIND: SampleKind;

    fn silence() -> Self {
        Self::EQUILIBRIUM
    }

    fn to_any(self) -> AnySample;

    fn as_any_slice(samples: &[Self]) -> AnySlice<'_>;

    fn from_any_slice(samples: AnySlice<'_>) -> Option<&[Self]>;

    /// `source` viewed as `Self` when both kinds are the same.
    fn same_kind<S: AudioSample>(source: &[S]) -> Option<&[Self]> {
        Self::from_any_slice(S::as_any_slice(source))
    }

    /// Decodes one sample from `Self::KIND.byte_width()` native-endian bytes.
    fn from_ne_bytes(bytes: &[u8]) -> Self;

    /// Pulls a value that overflowed the kind's range back to full scale.
    fn saturate(self) -> Self {
        self
    }

    fn from_any(sample: AnySample) -> Self {
        let converted: Self = match sample {
            AnySample::Int16(s) => Self::from_sample_(s),
            AnySample::Int24(s) => Self::from_sample_(s),
            AnySample::Int32(s) => Self::from_sample_(s),
            AnySample::Float32(s) => Self::from_sample_(s),
        };
        converted.saturate()
    }

    /// Rescales this sample into another kind.
    fn convert<S: AudioSample>(self) -> S {
        S::from_any(self.to_any())
    }

    fn to_f64_normalized(self) -> f64 {
        self.to_sample_()
    }

    fn from_f64_normalized(value: f64) -> Self {
        Self::from_sample_(value.clamp(-1.0, 1.0)).saturate()
    }
}

impl AudioSample for i16 {
    const KIND: SampleKind = SampleKind::Int16;

    fn to_any(self) -> AnySample {
        AnySample::Int16(self)
    }

    fn as_any_slice(samples: &[Self]) -> AnySlice<'_> {
        AnySlice::Int16(samples)
    }

    fn from_any_slice(samples: AnySlice<'_>) -> Option<&[Self]> {
        match samples {
            AnySlice::Int16(samples) => Some(samples),
            _ => None,
        }
    }

    fn from_ne_bytes(bytes: &[u8]) -> Self {
        i16::from_ne_bytes([bytes[0], bytes[1]])
    }
}

impl AudioSample for I24 {
    const KIND: SampleKind = SampleKind::Int24;

    fn to_any(self) -> AnySample {
        AnySample::Int24(self)
    }

    fn as_any_slice(samples: &[Self]) -> AnySlice<'_> {
        AnySlice::Int24(samples)
    }

    fn from_any_slice(samples: AnySlice<'_>) -> Option<&[Self]> {
        match samples {
            AnySlice::Int24(samples) => Some(samples),
            _ => None,
        }
    }

    // Float full scale +1.0 maps one step past the 24-bit maximum.
    fn saturate(self) -> Self {
        I24::new_unchecked(self.inner().clamp(i24::MIN.inner(), i24::MAX.inner()))
    }

    fn from_ne_bytes(bytes: &[u8]) -> Self {
        let raw = i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        I24::new_unchecked(raw.clamp(i24::MIN.inner(), i24::MAX.inner()))
    }
}

impl AudioSample for i32 {
    const KIND: SampleKind = SampleKind::Int32;

    fn to_any(self) -> AnySample {
        AnySample::Int32(self)
    }

    fn as_any_slice(samples: &[Self]) -> AnySlice<'_> {
        AnySlice::Int32(samples)
    }

    fn from_any_slice(samples: AnySlice<'_>) -> Option<&[Self]> {
        match samples {
            AnySlice::Int32(samples) => Some(samples),
            _ => None,
        }
    }

    fn from_ne_bytes(bytes: &[u8]) -> Self {
        i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl AudioSample for f32 {
    const KIND: SampleKind = SampleKind::Float32;

    fn to_any(self) -> AnySample {
        AnySample::Float32(self)
    }

    fn as_any_slice(samples: &[Self]) -> AnySlice<'_> {
        AnySlice::Float32(samples)
    }

    fn from_any_slice(samples: AnySlice<'_>) -> Option<&[Self]> {
        match samples {
            AnySlice::Float32(samples) => Some(samples),
            _ => None,
        }
    }

    fn from_ne_bytes(bytes: &[u8]) -> Self {
        f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// Decodes a native-endian byte stream of samples of kind `S`.
pub fn decode_ne<S: AudioSample>(bytes: &[u8]) -> Vec<S> {
    bytes
        .chunks_exact(S::KIND.byte_width())
        .map(S::from_ne_bytes)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_match_types() {
        assert_eq!(i16::KIND, SampleKind::Int16);
        assert_eq!(I24::KIND, SampleKind::Int24);
        assert_eq!(i32::KIND, SampleKind::Int32);
        assert_eq!(f32::KIND, SampleKind::Float32);
        assert!(f32::KIND.is_float());
        assert!(!I24::KIND.is_float());
    }

    #[test]
    fn test_silence_is_zero() {
        assert_eq!(i16::silence(), 0);
        assert_eq!(I24::silence().inner(), 0);
        assert_eq!(i32::silence(), 0);
        assert_eq!(f32::silence(), 0.0);
    }

    #[test]
    fn test_conversion_rescales() {
        let half: i16 = 0.5f32.convert();
        assert_eq!(half, 16384);

        let widened: i32 = 16384i16.convert();
        assert_eq!(widened, 16384 << 16);

        let narrowed: I24 = (1i32 << 30).convert();
        assert_eq!(narrowed.inner(), 1 << 22);

        let back: f32 = I24::new_unchecked(1 << 22).convert();
        assert!((back - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_conversion_identity() {
        assert_eq!(1234i16.convert::<i16>(), 1234);
        assert_eq!((-0.25f32).convert::<f32>(), -0.25);
    }

    #[test]
    fn test_from_f64_normalized_clamps() {
        assert_eq!(i16::from_f64_normalized(2.0), i16::MAX);
        assert_eq!(f32::from_f64_normalized(-3.0), -1.0);
        assert_eq!(I24::from_f64_normalized(1.0), i24::MAX);
        assert_eq!(1.0f32.convert::<I24>(), i24::MAX);
    }

    #[test]
    fn test_same_kind_view() {
        let samples = [1i16, 2, 3];
        assert_eq!(i16::same_kind(&samples), Some(&samples[..]));
        assert!(f32::same_kind(&samples).is_none());
        assert!(i32::same_kind(&[I24::EQUILIBRIUM]).is_none());
    }

    #[test]
    fn test_decode_ne() {
        let values = [1i16, -2, 300];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        assert_eq!(decode_ne::<i16>(&bytes), values);

        let out_of_range = (1i32 << 28).to_ne_bytes();
        assert_eq!(decode_ne::<I24>(&out_of_range)[0], i24::MAX);
    }
}
