//! Caption-based video summaries.
//!
//! A [`VideoSummary`] gathers one caption per sampled frame, ranks the words
//! that recur across captions, and renders the lot as a plain-text report
//! or a JSON document.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};

use crate::error::FramesiftError;

/// Default number of keywords kept in a summary.
pub const DEFAULT_KEYWORD_LIMIT: usize = 10;

/// Longest file stem produced by [`sanitize_file_stem`].
const MAX_FILE_STEM_CHARS: usize = 50;

/// Caption of one sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCaption {
    /// Position among the sampled frames (0-indexed).
    pub ordinal: usize,
    /// Ordinal of the frame in the source video.
    pub frame_index: u64,
    /// Presentation time, when known.
    pub timestamp: Option<Duration>,
    /// Caption text.
    pub text: String,
}

/// Captions, keywords, and provenance for one analysed video.
#[derive(Debug, Clone)]
pub struct VideoSummary {
    /// What was analysed (file path or URL).
    pub source: String,
    /// Per-frame captions in frame order.
    pub captions: Vec<FrameCaption>,
    /// Most frequent caption words with their counts, most frequent first.
    pub keywords: Vec<(String, usize)>,
    /// Sampled frames written to disk alongside the summary.
    pub saved_frames: Vec<PathBuf>,
    /// When the summary was built, in seconds since the Unix epoch.
    pub generated_at: u64,
}

impl VideoSummary {
    /// Build a summary, ranking at most `keyword_limit` keywords.
    pub fn new(
        source: impl Into<String>,
        captions: Vec<FrameCaption>,
        keyword_limit: usize,
    ) -> Self {
        let texts = captions.iter().map(|caption| caption.text.as_str());
        let keywords = extract_keywords(texts, keyword_limit);
        let generated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);

        Self {
            source: source.into(),
            captions,
            keywords,
            saved_frames: Vec::new(),
            generated_at,
        }
    }

    /// Record the frame images written for this summary.
    #[must_use]
    pub fn with_saved_frames(mut self, saved_frames: Vec<PathBuf>) -> Self {
        self.saved_frames = saved_frames;
        self
    }

    /// Number of frames that were captioned.
    pub fn frames_analyzed(&self) -> usize {
        self.captions.len()
    }

    /// Human-readable report. Same as the [`Display`](fmt::Display) output.
    pub fn render_text(&self) -> String {
        self.to_string()
    }

    /// Machine-readable form.
    pub fn to_json(&self) -> Value {
        json!({
            "source": self.source,
            "generated_at": self.generated_at,
            "frames_analyzed": self.frames_analyzed(),
            "captions": self.captions.iter().map(|caption| json!({
                "ordinal": caption.ordinal,
                "frame_index": caption.frame_index,
                "timestamp_seconds": caption.timestamp.map(|t| t.as_secs_f64()),
                "text": caption.text,
            })).collect::<Vec<_>>(),
            "keywords": self.keywords.iter().map(|(word, count)| json!({
                "word": word,
                "count": count,
            })).collect::<Vec<_>>(),
            "saved_frames": self.saved_frames.iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>(),
            "summary": self.render_text(),
        })
    }

    /// Paths [`save`](VideoSummary::save) writes for `stem` in `directory`:
    /// `<stem>.txt` and `<stem>.json`, after [`sanitize_file_stem`].
    pub fn report_paths<P: AsRef<Path>>(directory: P, stem: &str) -> (PathBuf, PathBuf) {
        let directory = directory.as_ref();
        let stem = sanitize_file_stem(stem);
        (
            directory.join(format!("{stem}.txt")),
            directory.join(format!("{stem}.json")),
        )
    }

    /// Write `<stem>.txt` and `<stem>.json` into `directory`.
    ///
    /// The directory is created if missing. Existing reports are only
    /// replaced when `overwrite` is set; otherwise nothing is written and
    /// [`FramesiftError::OutputExists`] is returned. Returns the text and
    /// JSON paths.
    pub fn save<P: AsRef<Path>>(
        &self,
        directory: P,
        stem: &str,
        overwrite: bool,
    ) -> Result<(PathBuf, PathBuf), FramesiftError> {
        let directory = directory.as_ref();
        let (text_path, json_path) = Self::report_paths(directory, stem);
        if !overwrite {
            if let Some(existing) = [&text_path, &json_path].into_iter().find(|p| p.exists()) {
                return Err(FramesiftError::OutputExists(existing.clone()));
            }
        }

        fs::create_dir_all(directory)?;
        fs::write(&text_path, self.render_text())?;
        let json = serde_json::to_string_pretty(&self.to_json())
            .map_err(|error| FramesiftError::IoError(error.into()))?;
        fs::write(&json_path, json)?;

        log::info!(
            "Summary saved to {} and {}",
            text_path.display(),
            json_path.display()
        );
        Ok((text_path, json_path))
    }
}

impl fmt::Display for VideoSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        let thin_rule = "-".repeat(40);

        writeln!(f, "VIDEO SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Source: {}", self.source)?;
        writeln!(f, "Frames analyzed: {}", self.frames_analyzed())?;
        writeln!(f, "Generated at: {} (unix time)", self.generated_at)?;
        if !self.saved_frames.is_empty() {
            writeln!(f, "Frames saved: {}", self.saved_frames.len())?;
        }
        writeln!(f)?;

        writeln!(f, "FRAME DESCRIPTIONS")?;
        writeln!(f, "{thin_rule}")?;
        for caption in &self.captions {
            match caption.timestamp {
                Some(timestamp) => writeln!(
                    f,
                    "Frame {} ({:.1}min): {}",
                    caption.ordinal + 1,
                    timestamp.as_secs_f64() / 60.0,
                    caption.text
                )?,
                None => writeln!(f, "Frame {}: {}", caption.ordinal + 1, caption.text)?,
            }
        }

        if !self.keywords.is_empty() {
            let words: Vec<&str> = self
                .keywords
                .iter()
                .map(|(word, _)| word.as_str())
                .collect();
            writeln!(f)?;
            writeln!(f, "KEYWORDS")?;
            writeln!(f, "{thin_rule}")?;
            writeln!(f, "{}", words.join(", "))?;
            writeln!(f)?;
            writeln!(
                f,
                "The video appears to mainly contain: {}",
                words[..words.len().min(5)].join(", ")
            )?;
        }

        Ok(())
    }
}

/// Rank caption words by frequency.
///
/// Words are lower-cased and split on whitespace; only words longer than
/// three characters and made entirely of alphabetic characters count. Ties
/// keep first-appearance order.
pub fn extract_keywords<'a, I>(texts: I, limit: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for text in texts {
        for word in text.to_lowercase().split_whitespace() {
            if word.chars().count() <= 3 || !word.chars().all(char::is_alphabetic) {
                continue;
            }
            match positions.get(word) {
                Some(&position) => counts[position].1 += 1,
                None => {
                    positions.insert(word.to_string(), counts.len());
                    counts.push((word.to_string(), 1));
                }
            }
        }
    }

    // Stable sort keeps first-appearance order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

/// Make `name` safe to use as a file stem: characters that are invalid in
/// file names are replaced with `_` and the result is cut to 50 characters.
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .take(MAX_FILE_STEM_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(ordinal: usize, text: &str) -> FrameCaption {
        FrameCaption {
            ordinal,
            frame_index: ordinal as u64 * 10,
            timestamp: Some(Duration::from_secs(ordinal as u64 * 30)),
            text: text.to_string(),
        }
    }

    #[test]
    fn keywords_skip_short_and_non_alphabetic_words() {
        let keywords = extract_keywords(
            [
                "a man riding a horse on the beach",
                "a horse standing on a beach at sunset",
                "two horses, 3 dogs",
            ],
            10,
        );
        assert_eq!(
            keywords,
            vec![
                ("horse".to_string(), 2),
                ("beach".to_string(), 2),
                ("riding".to_string(), 1),
                ("standing".to_string(), 1),
                ("sunset".to_string(), 1),
                ("dogs".to_string(), 1),
            ]
        );
    }

    #[test]
    fn keyword_limit_is_applied() {
        let keywords = extract_keywords(["alpha beta gamma delta"], 2);
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[0].0, "alpha");
    }

    #[test]
    fn file_stems_are_sanitized() {
        assert_eq!(sanitize_file_stem("what? a: \"video\"/clip"), "what_ a_ _video__clip");
        assert_eq!(sanitize_file_stem(&"x".repeat(80)).len(), 50);
    }

    #[test]
    fn text_report_lists_frames_and_keywords() {
        let summary = VideoSummary::new(
            "clip.mp4",
            vec![caption(0, "a kitten playing"), caption(1, "a kitten sleeping")],
            DEFAULT_KEYWORD_LIMIT,
        );
        let report = summary.render_text();
        assert!(report.contains("Source: clip.mp4"));
        assert!(report.contains("Frames analyzed: 2"));
        assert!(report.contains("Frame 2 (0.5min): a kitten sleeping"));
        assert!(report.contains("mainly contain: kitten, playing, sleeping"));
    }

    #[test]
    fn json_carries_captions_and_keywords() {
        let summary = VideoSummary::new("clip.mp4", vec![caption(0, "sunny meadow")], 5);
        let json = summary.to_json();
        assert_eq!(json["frames_analyzed"], 1);
        assert_eq!(json["captions"][0]["text"], "sunny meadow");
        assert_eq!(json["keywords"][0]["word"], "sunny");
        assert_eq!(json["captions"][0]["timestamp_seconds"], 0.0);
    }

    #[test]
    fn save_writes_text_and_json() {
        let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
        let summary = VideoSummary::new("clip.mp4", vec![caption(0, "quiet harbor")], 5);
        let (text_path, json_path) = summary
            .save(temporary_directory.path().join("summaries"), "my/clip", false)
            .expect("Failed to save summary");

        assert!(text_path.ends_with("my_clip.txt"));
        let json: Value =
            serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(json["source"], "clip.mp4");
        assert_eq!(json["saved_frames"], json!([]));
    }

    #[test]
    fn save_refuses_to_replace_existing_reports() {
        let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
        let directory = temporary_directory.path();
        let (text_path, _) = VideoSummary::report_paths(directory, "clip");
        fs::write(&text_path, "earlier report").unwrap();

        let summary = VideoSummary::new("clip.mp4", vec![caption(0, "quiet harbor")], 5);
        let error = summary.save(directory, "clip", false).unwrap_err();
        assert!(matches!(error, FramesiftError::OutputExists(ref path) if *path == text_path));
        assert_eq!(fs::read_to_string(&text_path).unwrap(), "earlier report");
        assert!(!directory.join("clip.json").exists());

        summary
            .save(directory, "clip", true)
            .expect("Failed to overwrite summary");
        assert!(fs::read_to_string(&text_path).unwrap().starts_with("VIDEO SUMMARY"));
    }

    #[test]
    fn saved_frames_appear_in_both_renderings() {
        let summary = VideoSummary::new("clip.mp4", vec![caption(0, "quiet harbor")], 5)
            .with_saved_frames(vec![PathBuf::from("frames/clip_frame_0.jpg")]);
        assert!(summary.render_text().contains("Frames saved: 1"));
        assert_eq!(summary.to_json()["saved_frames"][0], "frames/clip_frame_0.jpg");
    }
}
