//! Destinations for sampled frames.
//!
//! A [`FrameSink`] receives frames as a sampler selects them, so frames can
//! be written out without collecting the whole result first. See
//! [`sample_to_sink`](crate::sample_to_sink).
//!
//! # Example
//!
//! ```no_run
//! use framesift::{DirectorySink, FramesiftError, SampleOptions, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let mut sink = DirectorySink::create("extracted_frames")?.with_extension("jpg");
//! let written = framesift::sample_to_sink(&mut video, &SampleOptions::new(), &mut sink)?;
//! println!("wrote {written} frames");
//! # Ok::<(), FramesiftError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FramesiftError;
use crate::frame::SampledFrame;

/// Receives sampled frames in selection order.
pub trait FrameSink {
    /// Accept the `ordinal`-th selected frame (0-indexed).
    fn accept(&mut self, ordinal: usize, frame: &SampledFrame) -> Result<(), FramesiftError>;
}

/// In-memory sink.
impl FrameSink for Vec<SampledFrame> {
    fn accept(&mut self, _ordinal: usize, frame: &SampledFrame) -> Result<(), FramesiftError> {
        self.push(frame.clone());
        Ok(())
    }
}

/// Writes each frame as `<prefix>_<ordinal>.<extension>` into a directory.
///
/// The image format is inferred from the extension. Existing files are
/// only replaced when [`with_overwrite`](DirectorySink::with_overwrite) is
/// enabled.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
    prefix: String,
    extension: String,
    overwrite: bool,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Create a sink writing into `directory`, creating it if missing.
    ///
    /// Defaults: prefix `frame`, extension `jpg`, no overwriting.
    pub fn create<P: AsRef<Path>>(directory: P) -> Result<Self, FramesiftError> {
        let directory = directory.as_ref().to_path_buf();
        if !directory.exists() {
            fs::create_dir_all(&directory)?;
            log::info!("Created folder: {}", directory.display());
        }
        Ok(Self {
            directory,
            prefix: "frame".to_string(),
            extension: "jpg".to_string(),
            overwrite: false,
            written: Vec::new(),
        })
    }

    /// Set the file-name prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the file extension (with or without a leading dot).
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Allow replacing files that already exist.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Target directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Path the `ordinal`-th frame is written to.
    pub fn path_for(&self, ordinal: usize) -> PathBuf {
        self.directory
            .join(format!("{}_{ordinal}.{}", self.prefix, self.extension))
    }
}

impl FrameSink for DirectorySink {
    fn accept(&mut self, ordinal: usize, frame: &SampledFrame) -> Result<(), FramesiftError> {
        let path = self.path_for(ordinal);
        if path.exists() && !self.overwrite {
            return Err(FramesiftError::OutputExists(path));
        }

        frame.image.save(&path)?;
        match frame.change_score {
            Some(score) => log::info!("Saved: {} (change score: {score:.1})", path.display()),
            None => log::info!("Saved: {}", path.display()),
        }
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    fn frame(index: u64) -> SampledFrame {
        SampledFrame {
            index,
            image: RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])),
            change_score: None,
            timestamp: None,
        }
    }

    #[test]
    fn writes_numbered_files() {
        let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
        let target = temporary_directory.path().join("nested").join("frames");
        let mut sink = DirectorySink::create(&target)
            .expect("Failed to create sink")
            .with_prefix("scene_change")
            .with_extension(".PNG");

        sink.accept(0, &frame(0)).unwrap();
        sink.accept(1, &frame(7)).unwrap();

        assert_eq!(sink.written().len(), 2);
        assert!(target.join("scene_change_0.png").exists());
        assert!(target.join("scene_change_1.png").exists());
    }

    #[test]
    fn refuses_to_overwrite_by_default() {
        let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
        let mut sink = DirectorySink::create(temporary_directory.path())
            .unwrap()
            .with_extension("png");
        sink.accept(0, &frame(0)).unwrap();

        let mut second = DirectorySink::create(temporary_directory.path())
            .unwrap()
            .with_extension("png");
        assert!(matches!(
            second.accept(0, &frame(3)),
            Err(FramesiftError::OutputExists(_))
        ));

        let mut overwriting = second.with_overwrite(true);
        assert!(overwriting.accept(0, &frame(3)).is_ok());
    }

    #[test]
    fn vectors_collect_frames() {
        let mut buffer: Vec<SampledFrame> = Vec::new();
        buffer.accept(0, &frame(4)).unwrap();
        assert_eq!(buffer[0].index, 4);
    }
}
