//! Fetching remote videos.
//!
//! A [`Downloader`] turns a URL into a local file. [`YtDlp`] shells out to
//! the `yt-dlp` program, which must be installed separately.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framesift::{Downloader, FramesiftError, YtDlp};
//!
//! let downloader = YtDlp::new().with_format("worst[height<=360]");
//! let path = downloader.download("https://example.com/watch?v=abc", Path::new("downloads"))?;
//! println!("saved to {}", path.display());
//! # Ok::<(), FramesiftError>(())
//! ```

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::FramesiftError;

/// Format selector used when none is configured: the smallest rendition no
/// taller than 480 lines.
pub const DEFAULT_DOWNLOAD_FORMAT: &str = "worst[height<=480]";

/// Fetches a remote video into a local directory.
pub trait Downloader {
    /// Download `url` into `destination` and return the file's path.
    ///
    /// Failures are reported as [`FramesiftError::DownloadFailed`] carrying
    /// the underlying message.
    fn download(&self, url: &str, destination: &Path) -> Result<PathBuf, FramesiftError>;
}

/// Downloads through the `yt-dlp` command-line program.
///
/// Files are named `video_<unix-seconds>.<ext>`.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: OsString,
    format: String,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlp {
    /// Use `yt-dlp` from `PATH` with the default format selector.
    pub fn new() -> Self {
        Self {
            program: OsString::from("yt-dlp"),
            format: DEFAULT_DOWNLOAD_FORMAT.to_string(),
        }
    }

    /// Run a different executable.
    #[must_use]
    pub fn with_program(mut self, program: impl AsRef<OsStr>) -> Self {
        self.program = program.as_ref().to_os_string();
        self
    }

    /// Set the `--format` selector.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Configured format selector.
    pub fn format(&self) -> &str {
        &self.format
    }
}

impl Downloader for YtDlp {
    fn download(&self, url: &str, destination: &Path) -> Result<PathBuf, FramesiftError> {
        let failed = |reason: String| FramesiftError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        fs::create_dir_all(destination).map_err(|error| failed(error.to_string()))?;

        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let stem = format!("video_{seconds}");
        let template = destination.join(format!("{stem}.%(ext)s"));

        log::info!("Downloading {url}");
        let output = Command::new(&self.program)
            .arg("--format")
            .arg(&self.format)
            .arg("--output")
            .arg(&template)
            .arg("--no-simulate")
            .arg("--no-progress")
            .arg("--print")
            .arg("after_move:filepath")
            .arg(url)
            .output()
            .map_err(|error| {
                failed(format!(
                    "could not run {}: {error}",
                    self.program.to_string_lossy()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(failed(if stderr.is_empty() {
                format!(
                    "{} exited with {}",
                    self.program.to_string_lossy(),
                    output.status
                )
            } else {
                stderr
            }));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let printed = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(PathBuf::from)
            .filter(|path| path.is_file());

        let path = match printed {
            Some(path) => path,
            None => find_by_stem(destination, &stem).ok_or_else(|| {
                failed(format!(
                    "no downloaded file named {stem}.* in {}",
                    destination.display()
                ))
            })?,
        };

        log::info!("Downloaded: {}", path.display());
        Ok(path)
    }
}

/// First file in `directory` whose name starts with `<stem>.`.
fn find_by_stem(directory: &Path, stem: &str) -> Option<PathBuf> {
    let prefix = format!("{stem}.");
    fs::read_dir(directory)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(OsStr::to_str)
                    .is_some_and(|name| name.starts_with(&prefix))
        })
}

/// Whether `input` is an `http://` or `https://` URL rather than a path.
pub fn is_remote(input: &str) -> bool {
    let lower = input.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_told_apart_from_paths() {
        assert!(is_remote("https://example.com/video"));
        assert!(is_remote("HTTP://example.com/video"));
        assert!(!is_remote("videos/http_clip.mp4"));
        assert!(!is_remote("ftp://example.com/video"));
    }

    #[test]
    fn builder_overrides_format() {
        assert_eq!(YtDlp::new().format(), DEFAULT_DOWNLOAD_FORMAT);
        assert_eq!(YtDlp::new().with_format("best").format(), "best");
    }

    #[test]
    fn missing_program_is_a_download_failure() {
        let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
        let downloader = YtDlp::new().with_program("framesift-no-such-downloader");
        let error = downloader
            .download("https://example.com/v", temporary_directory.path())
            .unwrap_err();
        match error {
            FramesiftError::DownloadFailed { url, reason } => {
                assert_eq!(url, "https://example.com/v");
                assert!(reason.contains("could not run"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stem_lookup_ignores_other_files() {
        let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(temporary_directory.path().join("other.mp4"), b"x").unwrap();
        fs::write(temporary_directory.path().join("video_42.webm"), b"x").unwrap();

        let found = find_by_stem(temporary_directory.path(), "video_42").unwrap();
        assert!(found.ends_with("video_42.webm"));
        assert!(find_by_stem(temporary_directory.path(), "video_7").is_none());
    }
}
