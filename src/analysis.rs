//! Sample, caption, summarize.
//!
//! These functions tie the sampler to a [`Captioner`] and build a
//! [`VideoSummary`]. URLs are fetched first through a [`Downloader`].
//!
//! # Example
//!
//! ```no_run
//! use framesift::{CommandCaptioner, FramesiftError, SummaryOptions};
//!
//! let mut captioner = CommandCaptioner::new("blip-caption");
//! let summary = framesift::summarize_file("input.mp4", &SummaryOptions::new(), &mut captioner)?;
//! println!("{}", summary.render_text());
//! # Ok::<(), FramesiftError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::caption::Captioner;
use crate::configuration::{SampleOptions, SamplingPolicy};
use crate::download::Downloader;
use crate::error::FramesiftError;
use crate::frame::SampleResult;
use crate::progress::{OperationType, ProgressTracker};
use crate::sampler::sample;
use crate::sink::{DirectorySink, FrameSink};
use crate::source::FrameSource;
use crate::summary::{DEFAULT_KEYWORD_LIMIT, FrameCaption, VideoSummary};
use crate::video::VideoFile;

/// Frames captioned per summary unless configured otherwise.
pub const DEFAULT_SUMMARY_FRAMES: u64 = 8;

/// Most frames written next to a summary unless configured otherwise.
pub const DEFAULT_SAVED_FRAMES: usize = 5;

/// Configuration for building a [`VideoSummary`].
///
/// Defaults to spread sampling of 8 frames and 10 keywords. No frame images
/// are written unless a directory is set with
/// [`with_frame_directory`](SummaryOptions::with_frame_directory).
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub(crate) sample: SampleOptions,
    pub(crate) keyword_limit: usize,
    pub(crate) frame_directory: Option<PathBuf>,
    pub(crate) frame_prefix: String,
    pub(crate) saved_frame_limit: usize,
    pub(crate) overwrite: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            sample: SampleOptions::new()
                .with_policy(SamplingPolicy::Spread)
                .with_num_frames(DEFAULT_SUMMARY_FRAMES),
            keyword_limit: DEFAULT_KEYWORD_LIMIT,
            frame_directory: None,
            frame_prefix: "frame".to_string(),
            saved_frame_limit: DEFAULT_SAVED_FRAMES,
            overwrite: false,
        }
    }

    /// Replace the sampling configuration.
    ///
    /// Its progress callback and cancellation token also cover captioning.
    #[must_use]
    pub fn with_sample_options(mut self, sample: SampleOptions) -> Self {
        self.sample = sample;
        self
    }

    /// Set how many keywords the summary keeps.
    #[must_use]
    pub fn with_keyword_limit(mut self, limit: usize) -> Self {
        self.keyword_limit = limit;
        self
    }

    /// Write the first sampled frames as JPEG images into `directory`.
    #[must_use]
    pub fn with_frame_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.frame_directory = Some(directory.into());
        self
    }

    /// Set the file-name prefix of saved frames (default `frame`).
    #[must_use]
    pub fn with_frame_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.frame_prefix = prefix.into();
        self
    }

    /// Set how many sampled frames are saved at most (default 5).
    #[must_use]
    pub fn with_saved_frame_limit(mut self, limit: usize) -> Self {
        self.saved_frame_limit = limit;
        self
    }

    /// Allow saved frames to replace existing files.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Paths frames may be saved to, one per possible saved frame.
    ///
    /// Empty when no frame directory is set. Lets callers check for
    /// existing files before doing any work.
    pub fn saved_frame_paths(&self) -> Vec<PathBuf> {
        let Some(directory) = &self.frame_directory else {
            return Vec::new();
        };
        let limit = self
            .saved_frame_limit
            .min(usize::try_from(self.sample.num_frames).unwrap_or(usize::MAX));
        (0..limit)
            .map(|ordinal| directory.join(format!("{}_{ordinal}.jpg", self.frame_prefix)))
            .collect()
    }

    /// Sampling configuration.
    pub fn sample_options(&self) -> &SampleOptions {
        &self.sample
    }

    /// Maximum number of keywords.
    pub fn keyword_limit(&self) -> usize {
        self.keyword_limit
    }
}

/// Sample `source`, caption every selected frame, and summarize.
///
/// `label` names the video in the report. The first sampling or captioning
/// error aborts the run.
pub fn summarize_source<S, C>(
    source: &mut S,
    label: &str,
    options: &SummaryOptions,
    captioner: &mut C,
) -> Result<VideoSummary, FramesiftError>
where
    S: FrameSource + ?Sized,
    C: Captioner + ?Sized,
{
    let frames = sample(source, &options.sample)?;
    let saved_frames = save_frames(&frames, options)?;
    log::info!("Captioning {} frames from {label}", frames.len());

    let sample_options = &options.sample;
    let mut tracker = ProgressTracker::new(
        sample_options.progress.clone(),
        OperationType::Captioning,
        Some(frames.len() as u64),
        1,
    );

    let mut captions = Vec::with_capacity(frames.len());
    for (ordinal, frame) in frames.iter().enumerate() {
        if sample_options
            .cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            return Err(FramesiftError::Cancelled);
        }

        let text = captioner.caption(&frame.image)?;
        log::debug!("Frame {} (index {}): {text}", ordinal + 1, frame.index);
        captions.push(FrameCaption {
            ordinal,
            frame_index: frame.index,
            timestamp: frame.timestamp,
            text,
        });
        tracker.advance(Some(frame.index));
    }
    tracker.finish();

    let summary = VideoSummary::new(label, captions, options.keyword_limit);
    Ok(summary.with_saved_frames(saved_frames))
}

/// Write the first sampled frames into the configured frame directory.
fn save_frames(
    frames: &SampleResult,
    options: &SummaryOptions,
) -> Result<Vec<PathBuf>, FramesiftError> {
    let Some(directory) = &options.frame_directory else {
        return Ok(Vec::new());
    };
    if options.saved_frame_limit == 0 || frames.is_empty() {
        return Ok(Vec::new());
    }

    let mut sink = DirectorySink::create(directory)?
        .with_prefix(options.frame_prefix.as_str())
        .with_extension("jpg")
        .with_overwrite(options.overwrite);
    for (ordinal, frame) in frames.iter().take(options.saved_frame_limit).enumerate() {
        sink.accept(ordinal, frame)?;
    }
    Ok(sink.written().to_vec())
}

/// Summarize a local video file. The file is closed on every exit path.
pub fn summarize_file<P, C>(
    path: P,
    options: &SummaryOptions,
    captioner: &mut C,
) -> Result<VideoSummary, FramesiftError>
where
    P: AsRef<Path>,
    C: Captioner + ?Sized,
{
    options.sample.validate()?;
    let path = path.as_ref();
    let mut video = VideoFile::open(path)?;
    let summary = summarize_source(&mut video, &path.display().to_string(), options, captioner);
    video.close();
    summary
}

/// Download `url` into `destination`, then summarize it.
///
/// Returns the downloaded file's path with the summary; the file is left in
/// place.
pub fn summarize_url<D, C>(
    url: &str,
    downloader: &D,
    destination: &Path,
    options: &SummaryOptions,
    captioner: &mut C,
) -> Result<(PathBuf, VideoSummary), FramesiftError>
where
    D: Downloader + ?Sized,
    C: Captioner + ?Sized,
{
    options.sample.validate()?;
    let path = downloader.download(url, destination)?;

    let mut video = VideoFile::open(&path)?;
    let summary = summarize_source(&mut video, url, options, captioner);
    video.close();
    Ok((path, summary?))
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;
    use crate::progress::CancellationToken;
    use crate::source::MemorySource;

    fn shaded_video(count: u8) -> MemorySource {
        MemorySource::new((0..count).map(|value| RgbImage::from_pixel(2, 2, Rgb([value; 3]))))
    }

    #[test]
    fn defaults_spread_eight_frames() {
        let options = SummaryOptions::new();
        assert_eq!(options.sample_options().policy(), SamplingPolicy::Spread);
        assert_eq!(options.sample_options().num_frames(), 8);
        assert_eq!(options.keyword_limit(), 10);
        assert!(options.saved_frame_paths().is_empty());
    }

    #[test]
    fn saved_frame_paths_are_capped_by_frame_count() {
        let options = SummaryOptions::new()
            .with_sample_options(SampleOptions::new().with_num_frames(3))
            .with_frame_directory("frames")
            .with_frame_prefix("clip_frame");
        assert_eq!(
            options.saved_frame_paths(),
            vec![
                PathBuf::from("frames/clip_frame_0.jpg"),
                PathBuf::from("frames/clip_frame_1.jpg"),
                PathBuf::from("frames/clip_frame_2.jpg"),
            ]
        );
    }

    #[test]
    fn every_sampled_frame_is_captioned() {
        let mut source = shaded_video(20);
        let sample_options = SampleOptions::new()
            .with_policy(SamplingPolicy::Spread)
            .with_num_frames(3);
        let options = SummaryOptions::new().with_sample_options(sample_options);
        let mut captioner = |image: &RgbImage| -> Result<String, FramesiftError> {
            Ok(format!("gray square shade {}", image.get_pixel(0, 0)[0]))
        };

        let summary = summarize_source(&mut source, "memory", &options, &mut captioner).unwrap();
        let indices: Vec<u64> = summary.captions.iter().map(|c| c.frame_index).collect();
        assert_eq!(indices, vec![0, 9, 19]);
        assert_eq!(summary.captions[1].text, "gray square shade 9");
        assert_eq!(summary.keywords[0], ("gray".to_string(), 3));
    }

    #[test]
    fn caption_errors_abort_the_summary() {
        let mut source = shaded_video(4);
        let mut captioner = |_: &RgbImage| -> Result<String, FramesiftError> {
            Err(FramesiftError::CaptionFailed("model unavailable".to_string()))
        };

        let options = SummaryOptions::new();
        let error = summarize_source(&mut source, "memory", &options, &mut captioner)
            .unwrap_err();
        assert!(error.to_string().contains("model unavailable"));
    }

    #[test]
    fn cancellation_covers_captioning() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let mut source = shaded_video(10);
        let options = SummaryOptions::new()
            .with_sample_options(SampleOptions::new().with_cancellation(token));
        let mut captioner = move |_: &RgbImage| -> Result<String, FramesiftError> {
            canceller.cancel();
            Ok("first".to_string())
        };

        assert!(matches!(
            summarize_source(&mut source, "memory", &options, &mut captioner),
            Err(FramesiftError::Cancelled)
        ));
    }
}
