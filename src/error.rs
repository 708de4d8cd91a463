//! Error types for the `framesift` crate.
//!
//! This module defines [`FramesiftError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context to
//! diagnose a failure (paths, URLs, frame sizes, upstream messages) without
//! extra logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framesift` operations.
///
/// Sampling fails fast: an error is never accompanied by a partial result.
/// Running out of frames before `num_frames` are selected is not an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramesiftError {
    /// The video could not be opened (missing, unreadable, or corrupt).
    #[error("Failed to open video at {path}: {reason}")]
    VideoOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The video opened but yielded no frames at all.
    #[error("Video contains no readable frames")]
    EmptyVideo,

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A sampling request asked for zero frames.
    #[error("Requested frame count must be greater than zero")]
    InvalidFrameCount,

    /// A change threshold was negative or not a number.
    #[error("Invalid change threshold {0}: must be a non-negative number")]
    InvalidThreshold(f64),

    /// Two frames of the same video had different dimensions.
    #[error(
        "Frame size changed mid-stream: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}"
    )]
    FrameSizeMismatch {
        /// Width of the baseline frame.
        expected_width: u32,
        /// Height of the baseline frame.
        expected_height: u32,
        /// Width of the offending frame.
        actual_width: u32,
        /// Height of the offending frame.
        actual_height: u32,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding or saving a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An output file already exists and overwriting was not allowed.
    #[error("Output already exists: {0}")]
    OutputExists(PathBuf),

    /// Downloading a remote video failed.
    #[error("Download of {url} failed: {reason}")]
    DownloadFailed {
        /// The URL that was requested.
        url: String,
        /// Message reported by the downloader.
        reason: String,
    },

    /// The captioning collaborator failed.
    #[error("Captioning failed: {0}")]
    CaptionFailed(String),
}

impl From<FfmpegError> for FramesiftError {
    fn from(error: FfmpegError) -> Self {
        FramesiftError::FfmpegError(error.to_string())
    }
}
