//! Sampled frames and sampling results.

use std::time::Duration;

use image::RgbImage;

/// One frame selected by a sampler.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Ordinal position of the frame in the source (0-indexed).
    pub index: u64,
    /// The decoded RGB pixels.
    pub image: RgbImage,
    /// Mean luminance difference from the previous baseline.
    ///
    /// Only set by [`SamplingPolicy::OnChange`](crate::SamplingPolicy::OnChange),
    /// and `None` for the first frame, which is selected unconditionally.
    pub change_score: Option<f64>,
    /// Presentation time, when the source knows its frame rate.
    pub timestamp: Option<Duration>,
}

/// The frames a sampler selected, in increasing index order.
///
/// Never longer than the requested frame count; shorter when the video ran
/// out first.
#[derive(Debug, Clone, Default)]
pub struct SampleResult {
    frames: Vec<SampledFrame>,
}

impl SampleResult {
    pub(crate) fn from_frames(frames: Vec<SampledFrame>) -> Self {
        Self { frames }
    }

    /// Number of selected frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Source ordinals of the selected frames.
    pub fn indices(&self) -> Vec<u64> {
        self.frames.iter().map(|frame| frame.index).collect()
    }

    /// The selected frames.
    pub fn frames(&self) -> &[SampledFrame] {
        &self.frames
    }

    /// Iterate over the selected frames.
    pub fn iter(&self) -> std::slice::Iter<'_, SampledFrame> {
        self.frames.iter()
    }

    /// Take ownership of the selected frames.
    pub fn into_frames(self) -> Vec<SampledFrame> {
        self.frames
    }
}

impl IntoIterator for SampleResult {
    type Item = SampledFrame;
    type IntoIter = std::vec::IntoIter<SampledFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a SampleResult {
    type Item = &'a SampledFrame;
    type IntoIter = std::slice::Iter<'a, SampledFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
