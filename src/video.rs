//! FFmpeg-backed frame source.
//!
//! [`VideoFile`] opens a media file, locates its best video stream, and
//! decodes frames strictly forward, converting each to an 8-bit RGB
//! [`RgbImage`]. No seeking is performed: every policy in
//! [`sampler`](crate::sampler) reads from the start.
//!
//! # Example
//!
//! ```no_run
//! use framesift::{FramesiftError, FrameSource, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! println!("{}", video.metadata());
//! while let Some(frame) = video.read_next()? {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! video.close();
//! # Ok::<(), FramesiftError>(())
//! ```

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{error::FramesiftError, metadata::VideoMetadata, source::FrameSource};

/// Everything that has to be released when the video is closed.
struct DecodeState {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    /// Output size, fixed by the first decoded frame.
    output_size: Option<(u32, u32)>,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
}

impl DecodeState {
    /// Scale the current `decoded_frame` to RGB24 and copy it out.
    fn convert_current_frame(&mut self) -> Result<RgbImage, FramesiftError> {
        let source_format = self.decoded_frame.format();
        let source_width = self.decoded_frame.width();
        let source_height = self.decoded_frame.height();
        let (width, height) = *self
            .output_size
            .get_or_insert((source_width, source_height));

        // Some decoders switch pixel format or size mid-stream.
        let needs_scaler = self.scaler.as_ref().is_none_or(|scaler| {
            let input = scaler.input();
            input.format != source_format
                || input.width != source_width
                || input.height != source_height
        });
        if needs_scaler {
            self.scaler = Some(ScalingContext::get(
                source_format,
                source_width,
                source_height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?);
        }

        let scaler = self.scaler.as_mut().ok_or_else(|| {
            FramesiftError::VideoDecodeError("No pixel converter available".to_string())
        })?;
        scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;

        let buffer = crate::conversion::frame_to_buffer(&self.rgb_frame, width, height, 3);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            FramesiftError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }
}

/// A video file opened for forward frame reading.
///
/// Created via [`VideoFile::open`]. The FFmpeg demuxer, decoder, and scaler
/// are released by [`close`](FrameSource::close) or when the value is
/// dropped, whichever comes first.
pub struct VideoFile {
    state: Option<DecodeState>,
    metadata: VideoMetadata,
    video_stream_index: usize,
    path: PathBuf,
    frames_read: u64,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("frames_read", &self.frames_read)
            .field("closed", &self.state.is_none())
            .finish_non_exhaustive()
    }
}

fn open_error(path: &Path, reason: impl Display) -> FramesiftError {
    FramesiftError::VideoOpen {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

impl VideoFile {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, picks the best
    /// video stream, and reads its metadata.
    ///
    /// # Errors
    ///
    /// - [`FramesiftError::VideoOpen`] if the file is missing, unreadable,
    ///   or its decoder cannot be created.
    /// - [`FramesiftError::NoVideoStream`] if the file has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramesiftError> {
        let path = path.as_ref();

        log::debug!("Opening video: {}", path.display());

        ffmpeg_next::init()
            .map_err(|error| open_error(path, format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(path, error))?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let (video_stream_index, frames_per_second, header_frame_count, decoder) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(FramesiftError::NoVideoStream)?;

            let frame_rate = stream.avg_frame_rate();
            let frames_per_second = if frame_rate.denominator() != 0 {
                frame_rate.numerator() as f64 / frame_rate.denominator() as f64
            } else {
                let rate = stream.rate();
                if rate.denominator() != 0 {
                    rate.numerator() as f64 / rate.denominator() as f64
                } else {
                    0.0
                }
            };

            let decoder_context = CodecContext::from_parameters(stream.parameters())
                .map_err(|error| {
                    open_error(path, format!("Failed to read codec parameters: {error}"))
                })?;
            let decoder = decoder_context
                .decoder()
                .video()
                .map_err(|error| open_error(path, format!("Failed to create decoder: {error}")))?;

            (
                stream.index(),
                frames_per_second,
                stream.frames().max(0) as u64,
                decoder,
            )
        };

        let frame_count = if header_frame_count > 0 {
            header_frame_count
        } else if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            codec,
            duration,
        };

        log::info!(
            "Opened video: {} ({}, stream={})",
            path.display(),
            metadata,
            video_stream_index,
        );

        Ok(Self {
            state: Some(DecodeState {
                input_context,
                decoder,
                scaler: None,
                output_size: None,
                decoded_frame: VideoFrame::empty(),
                rgb_frame: VideoFrame::empty(),
                eof_sent: false,
            }),
            metadata,
            video_stream_index,
            path: path.to_path_buf(),
            frames_read: 0,
        })
    }

    /// Stream metadata captured at open time.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// The path this video was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frames decoded so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Whether the underlying FFmpeg resources have been released.
    pub fn is_closed(&self) -> bool {
        self.state.is_none()
    }
}

impl FrameSource for VideoFile {
    fn total_frames(&self) -> u64 {
        self.metadata.frame_count
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>, FramesiftError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(None);
        };

        loop {
            // Drain frames the decoder has already produced.
            if state.decoder.receive_frame(&mut state.decoded_frame).is_ok() {
                let image = state.convert_current_frame()?;
                self.frames_read += 1;
                return Ok(Some(image));
            }

            if state.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut state.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        state
                            .decoder
                            .send_packet(&packet)
                            .map_err(|error| FramesiftError::VideoDecodeError(error.to_string()))?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    state.decoder.send_eof()?;
                    state.eof_sent = true;
                }
                Err(error) => {
                    log::warn!("Skipping unreadable packet in {}: {error}", self.path.display());
                }
            }
        }
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            log::debug!(
                "Closed video: {} after {} frames",
                self.path.display(),
                self.frames_read
            );
        }
    }

    fn frames_per_second(&self) -> Option<f64> {
        (self.metadata.frames_per_second > 0.0).then_some(self.metadata.frames_per_second)
    }
}

impl Drop for VideoFile {
    fn drop(&mut self) {
        self.close();
    }
}
