//! Frame sources.
//!
//! A [`FrameSource`] is a forward-only cursor over the frames of a video.
//! Samplers consume nothing else from their environment, so anything that
//! can hand out RGB frames in order can be sampled: [`VideoFile`](crate::VideoFile)
//! decodes real files through FFmpeg, and [`MemorySource`] serves frames
//! already held in memory.

use std::collections::VecDeque;

use image::RgbImage;

use crate::error::FramesiftError;

/// A forward-only, blocking supplier of video frames.
///
/// Implementations must release their underlying resources in
/// [`close`](FrameSource::close), which may be called any number of times.
/// Reading after `close` reports end-of-stream.
pub trait FrameSource {
    /// Total number of frames, or `0` when unknown.
    fn total_frames(&self) -> u64;

    /// Read the next frame. `Ok(None)` signals end-of-stream.
    fn read_next(&mut self) -> Result<Option<RgbImage>, FramesiftError>;

    /// Release the source. Idempotent.
    fn close(&mut self);

    /// Frame rate, when the source knows it.
    fn frames_per_second(&self) -> Option<f64> {
        None
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn total_frames(&self) -> u64 {
        (**self).total_frames()
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>, FramesiftError> {
        (**self).read_next()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn frames_per_second(&self) -> Option<f64> {
        (**self).frames_per_second()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn total_frames(&self) -> u64 {
        (**self).total_frames()
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>, FramesiftError> {
        (**self).read_next()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn frames_per_second(&self) -> Option<f64> {
        (**self).frames_per_second()
    }
}

/// An in-memory frame source.
///
/// Useful for synthetic videos and for frames obtained elsewhere. By
/// default the reported total equals the number of frames; containers
/// that misreport their length can be imitated with
/// [`with_reported_total`](MemorySource::with_reported_total).
///
/// # Example
///
/// ```
/// use framesift::{FrameSource, MemorySource};
/// use image::{Rgb, RgbImage};
///
/// let frames = (0..4u8).map(|v| RgbImage::from_pixel(8, 8, Rgb([v, v, v])));
/// let mut source = MemorySource::new(frames);
/// assert_eq!(source.total_frames(), 4);
/// assert!(source.read_next().unwrap().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: VecDeque<RgbImage>,
    reported_total: u64,
    frames_per_second: Option<f64>,
    frames_read: u64,
    close_calls: u32,
    closed: bool,
}

impl MemorySource {
    /// Create a source serving `frames` in order.
    pub fn new<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = RgbImage>,
    {
        let frames: VecDeque<RgbImage> = frames.into_iter().collect();
        let reported_total = frames.len() as u64;
        Self {
            frames,
            reported_total,
            frames_per_second: None,
            frames_read: 0,
            close_calls: 0,
            closed: false,
        }
    }

    /// Override the total frame count the source reports.
    #[must_use]
    pub fn with_reported_total(mut self, total: u64) -> Self {
        self.reported_total = total;
        self
    }

    /// Attach a frame rate so sampled frames carry timestamps.
    #[must_use]
    pub fn with_frames_per_second(mut self, frames_per_second: f64) -> Self {
        self.frames_per_second = Some(frames_per_second);
        self
    }

    /// Number of frames handed out so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Whether [`close`](FrameSource::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// How many times [`close`](FrameSource::close) has been called.
    pub fn close_calls(&self) -> u32 {
        self.close_calls
    }
}

impl FrameSource for MemorySource {
    fn total_frames(&self) -> u64 {
        self.reported_total
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>, FramesiftError> {
        if self.closed {
            return Ok(None);
        }
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.frames_read += 1;
        }
        Ok(frame)
    }

    fn close(&mut self) {
        self.close_calls += 1;
        if !self.closed {
            self.closed = true;
            self.frames.clear();
        }
    }

    fn frames_per_second(&self) -> Option<f64> {
        self.frames_per_second
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn frames(count: u8) -> Vec<RgbImage> {
        (0..count)
            .map(|v| RgbImage::from_pixel(2, 2, Rgb([v, v, v])))
            .collect()
    }

    #[test]
    fn serves_frames_in_order_then_end_of_stream() {
        let mut source = MemorySource::new(frames(3));
        for expected in 0..3u8 {
            let frame = source.read_next().unwrap().expect("frame");
            assert_eq!(frame.get_pixel(0, 0).0[0], expected);
        }
        assert!(source.read_next().unwrap().is_none());
        assert!(source.read_next().unwrap().is_none());
        assert_eq!(source.frames_read(), 3);
    }

    #[test]
    fn close_is_idempotent_and_ends_the_stream() {
        let mut source = MemorySource::new(frames(3));
        source.close();
        source.close();
        assert!(source.is_closed());
        assert_eq!(source.close_calls(), 2);
        assert!(source.read_next().unwrap().is_none());
    }

    #[test]
    fn reported_total_can_differ_from_contents() {
        let source = MemorySource::new(frames(3)).with_reported_total(0);
        assert_eq!(source.total_frames(), 0);
    }

    #[test]
    fn mutable_references_are_sources_too() {
        fn drain<S: FrameSource>(mut source: S) -> u64 {
            let mut count = 0;
            while source.read_next().unwrap().is_some() {
                count += 1;
            }
            count
        }

        let mut source = MemorySource::new(frames(2));
        assert_eq!(drain(&mut source), 2);
        assert_eq!(source.frames_read(), 2);
    }
}
