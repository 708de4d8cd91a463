//! Image captioning collaborators.
//!
//! framesift never loads a captioning model itself. A [`Captioner`] is any
//! `caption(frame) -> text` capability: a closure, a binding to a model
//! runtime, or [`CommandCaptioner`], which delegates to an external program.
//!
//! # Example
//!
//! ```no_run
//! use framesift::{Captioner, CommandCaptioner, FramesiftError};
//! use image::RgbImage;
//!
//! // Any program that reads a PNG on stdin and prints a caption works.
//! let mut captioner = CommandCaptioner::new("blip-caption").arg("--max-length").arg("50");
//! let caption = captioner.caption(&RgbImage::new(64, 64))?;
//! println!("{caption}");
//! # Ok::<(), FramesiftError>(())
//! ```

use std::ffi::{OsStr, OsString};
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};
use std::thread;

use image::{ImageFormat, RgbImage};

use crate::error::FramesiftError;

/// Describes the content of a single frame.
///
/// Failures are reported as [`FramesiftError::CaptionFailed`] (or any other
/// variant) and are passed to the caller untouched; nothing retries.
pub trait Captioner {
    /// Produce a caption for `image`.
    fn caption(&mut self, image: &RgbImage) -> Result<String, FramesiftError>;
}

impl<F> Captioner for F
where
    F: FnMut(&RgbImage) -> Result<String, FramesiftError>,
{
    fn caption(&mut self, image: &RgbImage) -> Result<String, FramesiftError> {
        self(image)
    }
}

/// Runs an external program once per frame.
///
/// The frame is written to the program's stdin as PNG; the trimmed stdout
/// is the caption. A non-zero exit status or empty output is a failure
/// whose message carries the program's stderr.
#[derive(Debug, Clone)]
pub struct CommandCaptioner {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandCaptioner {
    /// Caption frames with `program`.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    /// Append one argument to the command line.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments to the command line.
    #[must_use]
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl Captioner for CommandCaptioner {
    fn caption(&mut self, image: &RgbImage) -> Result<String, FramesiftError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                FramesiftError::CaptionFailed(format!(
                    "could not run {}: {error}",
                    self.program_name()
                ))
            })?;

        // Feed stdin from a separate thread so a chatty program cannot
        // deadlock against a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || {
                // The program may exit without reading everything; its exit
                // status is what gets reported.
                let _ = stdin.write_all(&png);
            })
        });

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("{} exited with {}", self.program_name(), output.status)
            } else {
                stderr
            };
            return Err(FramesiftError::CaptionFailed(reason));
        }

        let caption = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if caption.is_empty() {
            return Err(FramesiftError::CaptionFailed(format!(
                "{} produced no caption",
                self.program_name()
            )));
        }

        log::debug!("Caption: {caption}");
        Ok(caption)
    }
}
