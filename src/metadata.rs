//! Video stream metadata.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

/// Properties of the video stream a [`VideoFile`](crate::VideoFile) decodes.
///
/// Extracted once at open time; no decoding is involved.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frame rate, or `0.0` when the container does not say.
    pub frames_per_second: f64,
    /// Number of frames. Taken from the stream header when present,
    /// otherwise estimated from duration × frame rate. `0` when unknown.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
    /// Container duration.
    pub duration: Duration,
}

impl Display for VideoMetadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}x{} {} @ {:.2} fps, {} frames, {:.2}s",
            self.width,
            self.height,
            self.codec,
            self.frames_per_second,
            self.frame_count,
            self.duration.as_secs_f64(),
        )
    }
}
