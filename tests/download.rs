//! Downloader integration tests.
//!
//! A small shell script stands in for `yt-dlp`, so these tests only run on
//! Unix and never touch the network.
#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::Mutex,
};

use framesift::{Downloader, FramesiftError, YtDlp};

// Scripts are written and executed under this lock: a script still open
// for writing in one thread cannot be executed from another.
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

fn write_script(directory: &Path, body: &str) -> PathBuf {
    let path = directory.join("fake-yt-dlp");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("Failed to mark script executable");
    path
}

/// Writes the `--format` selector into the `--output` file, with `%(ext)s`
/// resolved to `mp4`.
const DOWNLOADING_SCRIPT: &str = r#"
output=""
format=""
while [ $# -gt 0 ]; do
    case "$1" in
        --output) output="$2"; shift 2 ;;
        --format) format="$2"; shift 2 ;;
        *) shift ;;
    esac
done
path=$(printf '%s' "$output" | sed 's/%(ext)s/mp4/')
printf '%s' "$format" > "$path"
"#;

#[test]
fn returns_the_printed_path() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let script = write_script(
        temporary_directory.path(),
        &format!("{DOWNLOADING_SCRIPT}echo \"$path\""),
    );
    let destination = temporary_directory.path().join("downloads");

    let path = YtDlp::new()
        .with_program(&script)
        .download("https://example.com/watch?v=1", &destination)
        .expect("Failed to download");

    assert!(path.starts_with(&destination));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("video_") && name.ends_with(".mp4"), "{name}");
    // The script records the format selector it was given.
    assert_eq!(fs::read_to_string(&path).unwrap(), "worst[height<=480]");
}

#[test]
fn finds_the_file_when_nothing_is_printed() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let script = write_script(temporary_directory.path(), DOWNLOADING_SCRIPT);
    let destination = temporary_directory.path().join("downloads");

    let path = YtDlp::new()
        .with_program(&script)
        .with_format("best")
        .download("https://example.com/watch?v=2", &destination)
        .expect("Failed to download");

    assert_eq!(fs::read_to_string(&path).unwrap(), "best");
}

#[test]
fn failures_keep_the_program_message() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let script = write_script(
        temporary_directory.path(),
        "echo 'ERROR: Unsupported URL: https://example.com/nothing' >&2\nexit 1",
    );

    let error = YtDlp::new()
        .with_program(&script)
        .download("https://example.com/nothing", temporary_directory.path())
        .unwrap_err();

    match error {
        FramesiftError::DownloadFailed { url, reason } => {
            assert_eq!(url, "https://example.com/nothing");
            assert_eq!(reason, "ERROR: Unsupported URL: https://example.com/nothing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn success_without_a_file_is_a_failure() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let script = write_script(temporary_directory.path(), "exit 0");

    let error = YtDlp::new()
        .with_program(&script)
        .download("https://example.com/watch?v=3", temporary_directory.path())
        .unwrap_err();
    assert!(
        error.to_string().contains("no downloaded file"),
        "unexpected message: {error}"
    );
}
