//! Sampling configuration.
//!
//! [`SampleOptions`] is a builder that carries the sampling policy, the
//! target frame count, and operational settings (progress callbacks,
//! cancellation) without polluting every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framesift::{
//!     CancellationToken, ProgressCallback, ProgressInfo, SampleOptions, SamplingPolicy,
//! };
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} frames scanned", info.operation, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = SampleOptions::new()
//!     .with_policy(SamplingPolicy::on_change(30.0))
//!     .with_num_frames(10)
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_batch_size(25);
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::FramesiftError;
use crate::progress::{CancellationToken, NoOpProgress, OperationType, ProgressCallback};

/// Default number of frames to select.
pub const DEFAULT_NUM_FRAMES: u64 = 5;

/// Default mean luminance difference that counts as a scene change.
pub const DEFAULT_CHANGE_THRESHOLD: f64 = 30.0;

/// Which frames a sampler selects.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SamplingPolicy {
    /// Every `total_frames / num_frames`-th frame, starting at frame 0.
    /// Every frame when the video is shorter than `num_frames` or its
    /// length is unknown.
    #[default]
    Interval,
    /// Frame 0, then every frame whose mean luminance difference from the
    /// last selected frame exceeds `threshold` (0–255 scale).
    OnChange {
        /// Strict lower bound on the change score.
        threshold: f64,
    },
    /// `num_frames` positions spread evenly from the first to the last
    /// frame. Requires a known frame count.
    Spread,
}

impl SamplingPolicy {
    /// Scene-change policy with the given threshold.
    pub fn on_change(threshold: f64) -> Self {
        SamplingPolicy::OnChange { threshold }
    }

    /// Reject thresholds that are negative or not a number.
    pub fn validate(&self) -> Result<(), FramesiftError> {
        match *self {
            SamplingPolicy::OnChange { threshold } if threshold.is_nan() || threshold < 0.0 => {
                Err(FramesiftError::InvalidThreshold(threshold))
            }
            _ => Ok(()),
        }
    }

    /// Default file-name prefix for frames written by this policy.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            SamplingPolicy::Interval => "summary_frame",
            SamplingPolicy::OnChange { .. } => "scene_change",
            SamplingPolicy::Spread => "frame",
        }
    }

    pub(crate) fn operation(&self) -> OperationType {
        match self {
            SamplingPolicy::Interval => OperationType::IntervalSampling,
            SamplingPolicy::OnChange { .. } => OperationType::ChangeSampling,
            SamplingPolicy::Spread => OperationType::SpreadSampling,
        }
    }
}

impl Display for SamplingPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SamplingPolicy::Interval => write!(f, "interval"),
            SamplingPolicy::OnChange { threshold } => write!(f, "change (threshold {threshold})"),
            SamplingPolicy::Spread => write!(f, "spread"),
        }
    }
}

/// Configuration for a sampling run.
///
/// A default-constructed value selects [`DEFAULT_NUM_FRAMES`] frames with
/// [`SamplingPolicy::Interval`], reports no progress, and is never
/// cancelled.
#[derive(Clone)]
pub struct SampleOptions {
    pub(crate) policy: SamplingPolicy,
    pub(crate) num_frames: u64,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// Fire the progress callback every N scanned frames.
    pub(crate) batch_size: u64,
}

impl Debug for SampleOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SampleOptions")
            .field("policy", &self.policy)
            .field("num_frames", &self.num_frames)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            policy: SamplingPolicy::Interval,
            num_frames: DEFAULT_NUM_FRAMES,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set the sampling policy.
    #[must_use]
    pub fn with_policy(mut self, policy: SamplingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set how many frames to select at most.
    #[must_use]
    pub fn with_num_frames(mut self, num_frames: u64) -> Self {
        self.num_frames = num_frames;
        self
    }

    /// Attach a progress callback, fired while frames are scanned.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before every frame read.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The configured policy.
    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// The configured frame count.
    pub fn num_frames(&self) -> u64 {
        self.num_frames
    }

    /// Check the request before any source is touched.
    ///
    /// # Errors
    ///
    /// [`FramesiftError::InvalidFrameCount`] for a zero frame count and
    /// [`FramesiftError::InvalidThreshold`] for a negative or NaN threshold.
    pub fn validate(&self) -> Result<(), FramesiftError> {
        if self.num_frames == 0 {
            return Err(FramesiftError::InvalidFrameCount);
        }
        self.policy.validate()
    }
}
