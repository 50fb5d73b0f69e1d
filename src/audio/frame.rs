//! Frame cursors.
//!
//! A frame is one time instant across all channels of interleaved storage.
//!
//! - [`Frame`] is a position handle into a [`Buffer`](super::Buffer). It holds
//!   no borrow; the buffer resolves and bounds-checks it on use.
//! - [`ConstFrame`] is a read cursor borrowing a sample slice, either a
//!   buffer's storage or externally produced data.
//!
//! Two cursors are only comparable when their channel counts match. Their
//! difference is the signed number of frames between them.

use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use super::sample::{AudioSample, SampleKind};

/// Position of one frame inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    channels: usize,
    position: isize,
}

impl Frame {
    pub fn new(channels: usize, position: isize) -> Self {
        Self { channels, position }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn position(&self) -> isize {
        self.position
    }

    /// Signed frames from `origin` to `self`, `None` when the channel counts
    /// differ.
    pub fn distance_from(&self, origin: &Frame) -> Option<isize> {
        (self.channels == origin.channels).then(|| self.position - origin.position)
    }
}

impl PartialOrd for Frame {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.channels != other.channels {
            return None;
        }
        self.position.partial_cmp(&other.position)
    }
}

/// Callers must ensure both frames have the same channel count; use
/// [`Frame::distance_from`] when that is not known.
impl Sub for Frame {
    type Output = isize;

    fn sub(self, rhs: Self) -> isize {
        debug_assert_eq!(self.channels, rhs.channels);
        self.position - rhs.position
    }
}

impl Add<usize> for Frame {
    type Output = Frame;

    fn add(mut self, rhs: usize) -> Frame {
        self += rhs;
        self
    }
}

impl AddAssign<usize> for Frame {
    fn add_assign(&mut self, rhs: usize) {
        self.position += rhs as isize;
    }
}

impl Sub<usize> for Frame {
    type Output = Frame;

    fn sub(mut self, rhs: usize) -> Frame {
        self -= rhs;
        self
    }
}

impl SubAssign<usize> for Frame {
    fn sub_assign(&mut self, rhs: usize) {
        self.position -= rhs as isize;
    }
}

/// Read cursor over interleaved samples of kind `S`.
#[derive(Debug)]
pub struct ConstFrame<'a, S> {
    samples: &'a [S],
    channels: usize,
    position: isize,
}

// Derives would require `S: Copy`.
impl<S> Clone for ConstFrame<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for ConstFrame<'_, S> {}

impl<'a, S: AudioSample> ConstFrame<'a, S> {
    /// Cursor at the first frame of `samples`.
    pub fn new(channels: usize, samples: &'a [S]) -> Self {
        Self {
            samples,
            channels,
            position: 0,
        }
    }

    /// Cursor one past the last complete frame of `samples`.
    pub fn end_of(channels: usize, samples: &'a [S]) -> Self {
        let frames = samples.len().checked_div(channels).unwrap_or(0);
        Self::new(channels, samples) + frames
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn position(&self) -> isize {
        self.position
    }

    pub fn kind(&self) -> SampleKind {
        S::KIND
    }

    /// Samples of the current frame, `None` when the cursor is out of range.
    pub fn samples(&self) -> Option<&'a [S]> {
        self.span(1)
    }

    /// Signed frames from `origin` to `self`, `None` when the channel counts
    /// differ.
    pub fn distance_from(&self, origin: &ConstFrame<'_, S>) -> Option<isize> {
        (self.channels == origin.channels).then(|| self.position - origin.position)
    }

    /// The `frames` frames starting at this cursor.
    pub fn span(&self, frames: usize) -> Option<&'a [S]> {
        let start = usize::try_from(self.position)
            .ok()?
            .checked_mul(self.channels)?;
        let len = frames.checked_mul(self.channels)?;
        self.samples.get(start..start.checked_add(len)?)
    }
}

impl<S> PartialEq for ConstFrame<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.samples, other.samples)
            && self.channels == other.channels
            && self.position == other.position
    }
}

/// Callers must ensure both cursors have the same channel count; use
/// [`ConstFrame::distance_from`] when that is not known.
impl<S> Sub for ConstFrame<'_, S> {
    type Output = isize;

    fn sub(self, rhs: Self) -> isize {
        debug_assert_eq!(self.channels, rhs.channels);
        self.position - rhs.position
    }
}

impl<S> Add<usize> for ConstFrame<'_, S> {
    type Output = Self;

    fn add(mut self, rhs: usize) -> Self {
        self += rhs;
        self
    }
}

impl<S> AddAssign<usize> for ConstFrame<'_, S> {
    fn add_assign(&mut self, rhs: usize) {
        self.position += rhs as isize;
    }
}

impl<S> Sub<usize> for ConstFrame<'_, S> {
    type Output = Self;

    fn sub(mut self, rhs: usize) -> Self {
        self.position -= rhs as isize;
        self
    }
}
