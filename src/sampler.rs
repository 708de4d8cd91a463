//! Frame sampling.
//!
//! A [`Sampler`] walks a [`FrameSource`] strictly forward and yields the
//! frames selected by its [`SamplingPolicy`]:
//!
//! - **Interval**: `interval = total_frames / num_frames`; frame `i` is
//!   selected when `i % interval == 0`. An interval of zero (short or
//!   unknown-length video) selects every frame.
//! - **OnChange**: frame 0 is always selected and becomes the baseline.
//!   Every later frame is reduced to luminance and scored by its mean
//!   absolute difference from the baseline; a score strictly above the
//!   threshold selects the frame and makes it the new baseline.
//! - **Spread**: `num_frames` positions spread evenly from the first to
//!   the last frame, selected as the cursor passes them.
//!
//! Every run stops as soon as `num_frames` frames are selected or the
//! source is exhausted. A shorter result is not an error.
//!
//! # Example
//!
//! ```no_run
//! use framesift::{FramesiftError, FrameSource, SampleOptions, SamplingPolicy, Sampler, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let options = SampleOptions::new()
//!     .with_policy(SamplingPolicy::on_change(30.0))
//!     .with_num_frames(30);
//!
//! for frame in Sampler::new(&mut video, &options)? {
//!     let frame = frame?;
//!     println!("frame {} (score {:?})", frame.index, frame.change_score);
//! }
//! video.close();
//! # Ok::<(), FramesiftError>(())
//! ```

use std::path::Path;

use image::{GrayImage, RgbImage};

use crate::configuration::{SampleOptions, SamplingPolicy};
use crate::conversion::{frame_number_to_timestamp, luminance, mean_absolute_difference};
use crate::error::FramesiftError;
use crate::frame::{SampleResult, SampledFrame};
use crate::progress::{CancellationToken, ProgressTracker};
use crate::sink::FrameSink;
use crate::source::FrameSource;
use crate::video::VideoFile;

/// Lifecycle of a single sampling run.
///
/// `Init -> Reading -> Done`. `Done` is terminal: once reached, the sampler
/// never reads from its source again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Created, nothing read yet.
    Init,
    /// Frames are being read.
    Reading,
    /// Enough frames selected, source exhausted, or an error occurred.
    Done,
}

/// Reads frames and counts their ordinals.
struct FrameCursor<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
    position: u64,
    cancellation: Option<CancellationToken>,
    tracker: ProgressTracker,
}

impl<S: FrameSource + ?Sized> FrameCursor<'_, S> {
    fn next_frame(&mut self) -> Result<Option<(u64, RgbImage)>, FramesiftError> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            return Err(FramesiftError::Cancelled);
        }

        let Some(image) = self.source.read_next()? else {
            return Ok(None);
        };

        let index = self.position;
        self.position += 1;
        self.tracker.advance(Some(index));
        Ok(Some((index, image)))
    }
}

/// Per-policy state.
enum Strategy {
    Interval {
        interval: u64,
    },
    OnChange {
        threshold: f64,
        /// Luminance of the last selected frame.
        baseline: Option<GrayImage>,
    },
    Spread {
        targets: Vec<u64>,
        next_target: usize,
    },
}

/// A frame selected by a strategy step: ordinal, pixels, change score.
type Selection = (u64, RgbImage, Option<f64>);

/// Lazy, pull-based sampler.
///
/// Each call to [`next()`](Iterator::next) reads just enough frames to
/// produce the next selection. Dropping the sampler early abandons the run;
/// the source itself stays open and belongs to the caller.
pub struct Sampler<'a, S: FrameSource + ?Sized> {
    cursor: FrameCursor<'a, S>,
    strategy: Strategy,
    num_frames: u64,
    selected: u64,
    state: SamplerState,
    frames_per_second: Option<f64>,
}

impl<'a, S: FrameSource + ?Sized> Sampler<'a, S> {
    /// Prepare a sampling run over `source`.
    ///
    /// # Errors
    ///
    /// Returns the validation errors of [`SampleOptions::validate`]. No frame
    /// is read until the first call to [`next()`](Iterator::next).
    pub fn new(source: &'a mut S, options: &SampleOptions) -> Result<Self, FramesiftError> {
        options.validate()?;

        let total_frames = source.total_frames();
        let num_frames = options.num_frames;

        let strategy = match options.policy {
            SamplingPolicy::Interval => {
                let interval = total_frames / num_frames;
                log::debug!(
                    "Interval sampling: {num_frames} of {total_frames} frames, interval {interval}"
                );
                Strategy::Interval { interval }
            }
            SamplingPolicy::OnChange { threshold } => {
                log::debug!("Change sampling: up to {num_frames} frames, threshold {threshold}");
                Strategy::OnChange {
                    threshold,
                    baseline: None,
                }
            }
            SamplingPolicy::Spread => {
                let targets = spread_indices(total_frames, num_frames);
                if targets.is_empty() {
                    log::warn!("Frame count unknown; spread sampling selects nothing");
                } else {
                    log::debug!("Spread sampling: targets {targets:?}");
                }
                Strategy::Spread {
                    targets,
                    next_target: 0,
                }
            }
        };

        let tracker = ProgressTracker::new(
            options.progress.clone(),
            options.policy.operation(),
            Some(total_frames),
            options.batch_size,
        );

        Ok(Self {
            frames_per_second: source.frames_per_second(),
            cursor: FrameCursor {
                source,
                position: 0,
                cancellation: options.cancellation.clone(),
                tracker,
            },
            strategy,
            num_frames,
            selected: 0,
            state: SamplerState::Init,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Frames selected so far.
    pub fn selected(&self) -> u64 {
        self.selected
    }

    /// Frames read from the source so far.
    pub fn frames_scanned(&self) -> u64 {
        self.cursor.position
    }

    fn finish(&mut self) {
        if self.state != SamplerState::Done {
            self.state = SamplerState::Done;
            self.cursor.tracker.finish();
            log::info!(
                "Sampling complete: selected {} of {} frames after scanning {}",
                self.selected,
                self.num_frames,
                self.cursor.position,
            );
        }
    }

    /// Read forward until the strategy selects a frame or the source ends.
    fn step(&mut self) -> Result<Option<Selection>, FramesiftError> {
        match &mut self.strategy {
            Strategy::Interval { interval } => loop {
                let Some((index, image)) = self.cursor.next_frame()? else {
                    return Ok(None);
                };
                if *interval == 0 || index % *interval == 0 {
                    return Ok(Some((index, image, None)));
                }
            },
            Strategy::OnChange {
                threshold,
                baseline,
            } => match baseline.as_mut() {
                None => {
                    let Some((index, image)) = self.cursor.next_frame()? else {
                        return Err(FramesiftError::EmptyVideo);
                    };
                    *baseline = Some(luminance(&image));
                    Ok(Some((index, image, None)))
                }
                Some(reference) => loop {
                    let Some((index, image)) = self.cursor.next_frame()? else {
                        return Ok(None);
                    };
                    let current = luminance(&image);
                    let score = mean_absolute_difference(reference, &current)?;
                    log::trace!("Frame {index}: change score {score:.2}");
                    if score > *threshold {
                        *reference = current;
                        return Ok(Some((index, image, Some(score))));
                    }
                },
            },
            Strategy::Spread {
                targets,
                next_target,
            } => loop {
                let Some(&target) = targets.get(*next_target) else {
                    return Ok(None);
                };
                let Some((index, image)) = self.cursor.next_frame()? else {
                    return Ok(None);
                };
                if index == target {
                    *next_target += 1;
                    return Ok(Some((index, image, None)));
                }
            },
        }
    }
}

impl<S: FrameSource + ?Sized> Iterator for Sampler<'_, S> {
    type Item = Result<SampledFrame, FramesiftError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == SamplerState::Done {
            return None;
        }
        if self.selected >= self.num_frames {
            self.finish();
            return None;
        }
        self.state = SamplerState::Reading;

        match self.step() {
            Ok(Some((index, image, change_score))) => {
                self.selected += 1;
                if self.selected >= self.num_frames {
                    self.finish();
                }
                Some(Ok(SampledFrame {
                    index,
                    image,
                    change_score,
                    timestamp: frame_number_to_timestamp(index, self.frames_per_second),
                }))
            }
            Ok(None) => {
                self.finish();
                None
            }
            Err(error) => {
                self.finish();
                Some(Err(error))
            }
        }
    }
}

/// Evenly spread frame ordinals from `0` to `total_frames - 1`, truncated
/// to integers and deduplicated. Empty when the total is unknown.
pub fn spread_indices(total_frames: u64, num_frames: u64) -> Vec<u64> {
    if total_frames == 0 || num_frames == 0 {
        return Vec::new();
    }
    if num_frames == 1 {
        return vec![0];
    }

    let last = (total_frames - 1) as u128;
    let steps = (num_frames - 1) as u128;
    let mut indices: Vec<u64> = (0..num_frames as u128)
        .map(|step| (step * last / steps) as u64)
        .collect();
    indices.dedup();
    indices
}

/// Run a sampler to completion and collect its selections.
///
/// Errors abort the run; no partial result is returned.
pub fn sample<S: FrameSource + ?Sized>(
    source: &mut S,
    options: &SampleOptions,
) -> Result<SampleResult, FramesiftError> {
    let frames = Sampler::new(source, options)?.collect::<Result<Vec<_>, _>>()?;
    Ok(SampleResult::from_frames(frames))
}

/// Select `num_frames` frames at a fixed interval.
///
/// # Example
///
/// ```
/// use framesift::MemorySource;
/// use image::{Rgb, RgbImage};
///
/// let frames = (0..100).map(|_| RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])));
/// let mut source = MemorySource::new(frames);
/// let result = framesift::sample_interval(&mut source, 5).unwrap();
/// assert_eq!(result.indices(), vec![0, 20, 40, 60, 80]);
/// ```
pub fn sample_interval<S: FrameSource + ?Sized>(
    source: &mut S,
    num_frames: u64,
) -> Result<SampleResult, FramesiftError> {
    sample(
        source,
        &SampleOptions::new()
            .with_policy(SamplingPolicy::Interval)
            .with_num_frames(num_frames),
    )
}

/// Select up to `num_frames` frames at scene changes.
///
/// # Errors
///
/// [`FramesiftError::EmptyVideo`] when the source yields no frame at all.
pub fn sample_on_change<S: FrameSource + ?Sized>(
    source: &mut S,
    num_frames: u64,
    threshold: f64,
) -> Result<SampleResult, FramesiftError> {
    sample(
        source,
        &SampleOptions::new()
            .with_policy(SamplingPolicy::on_change(threshold))
            .with_num_frames(num_frames),
    )
}

/// Select `num_frames` frames spread evenly over the whole video.
pub fn sample_spread<S: FrameSource + ?Sized>(
    source: &mut S,
    num_frames: u64,
) -> Result<SampleResult, FramesiftError> {
    sample(
        source,
        &SampleOptions::new()
            .with_policy(SamplingPolicy::Spread)
            .with_num_frames(num_frames),
    )
}

/// Push each selected frame into `sink` as soon as it is selected.
///
/// Returns the number of frames delivered. Stops at the first sampler or
/// sink error.
pub fn sample_to_sink<S, K>(
    source: &mut S,
    options: &SampleOptions,
    sink: &mut K,
) -> Result<usize, FramesiftError>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let mut delivered = 0;
    for frame in Sampler::new(source, options)? {
        sink.accept(delivered, &frame?)?;
        delivered += 1;
    }
    Ok(delivered)
}

/// Open a video file, sample it, and close it again.
///
/// The request is validated before the file is touched, and the file is
/// closed whether sampling succeeds or fails.
///
/// # Errors
///
/// [`FramesiftError::VideoOpen`] if the file cannot be opened, plus any
/// error of [`sample`].
pub fn sample_file<P: AsRef<Path>>(
    path: P,
    options: &SampleOptions,
) -> Result<SampleResult, FramesiftError> {
    options.validate()?;
    let mut video = VideoFile::open(path)?;
    let result = sample(&mut video, options);
    video.close();
    result
}
