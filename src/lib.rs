//! # framesift
//!
//! Pick representative still frames out of a video.
//!
//! `framesift` walks a video once, front to back, and keeps only the frames
//! a [`SamplingPolicy`] selects: a fixed interval, every scene change, or
//! positions spread evenly over the whole running time. Selected frames can
//! be collected, streamed into a [`FrameSink`], or captioned into a
//! [`VideoSummary`]. Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Fixed-Interval Sampling
//!
//! ```no_run
//! use framesift::{FrameSource, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4").unwrap();
//! let frames = framesift::sample_interval(&mut video, 5).unwrap();
//! for frame in &frames {
//!     frame.image.save(format!("summary_frame_{}.jpg", frame.index)).unwrap();
//! }
//! video.close();
//! ```
//!
//! ### Scene-Change Sampling
//!
//! ```no_run
//! use framesift::{SampleOptions, SamplingPolicy};
//!
//! let options = SampleOptions::new()
//!     .with_policy(SamplingPolicy::on_change(30.0))
//!     .with_num_frames(30);
//! let frames = framesift::sample_file("input.mp4", &options).unwrap();
//! println!("{} scene changes", frames.len());
//! ```
//!
//! ### Writing Frames as They Are Found
//!
//! ```no_run
//! use framesift::{DirectorySink, SampleOptions, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4").unwrap();
//! let mut sink = DirectorySink::create("extracted_frames").unwrap();
//! framesift::sample_to_sink(&mut video, &SampleOptions::new(), &mut sink).unwrap();
//! ```
//!
//! ### Summaries
//!
//! ```no_run
//! use framesift::{CommandCaptioner, SummaryOptions};
//!
//! let mut captioner = CommandCaptioner::new("blip-caption");
//! let summary =
//!     framesift::summarize_file("input.mp4", &SummaryOptions::new(), &mut captioner).unwrap();
//! summary.save("summaries", "input", false).unwrap();
//! ```
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system. Summaries
//! of URLs additionally need `yt-dlp` on `PATH`.

pub mod analysis;
pub mod caption;
pub mod configuration;
mod conversion;
pub mod download;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod progress;
pub mod sampler;
pub mod sink;
pub mod source;
pub mod summary;
pub mod video;

pub use analysis::{
    DEFAULT_SAVED_FRAMES, DEFAULT_SUMMARY_FRAMES, SummaryOptions, summarize_file, summarize_source,
    summarize_url,
};
pub use caption::{Captioner, CommandCaptioner};
pub use configuration::{
    DEFAULT_CHANGE_THRESHOLD, DEFAULT_NUM_FRAMES, SampleOptions, SamplingPolicy,
};
pub use download::{DEFAULT_DOWNLOAD_FORMAT, Downloader, YtDlp, is_remote};
pub use error::FramesiftError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::{SampleResult, SampledFrame};
pub use metadata::VideoMetadata;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{
    Sampler, SamplerState, sample, sample_file, sample_interval, sample_on_change, sample_spread,
    sample_to_sink, spread_indices,
};
pub use sink::{DirectorySink, FrameSink};
pub use source::{FrameSource, MemorySource};
pub use summary::{
    DEFAULT_KEYWORD_LIMIT, FrameCaption, VideoSummary, extract_keywords, sanitize_file_stem,
};
pub use video::VideoFile;
