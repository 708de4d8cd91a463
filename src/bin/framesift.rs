use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use framesift::{
    CommandCaptioner, DEFAULT_CHANGE_THRESHOLD, DEFAULT_DOWNLOAD_FORMAT, DEFAULT_KEYWORD_LIMIT,
    DEFAULT_NUM_FRAMES, DEFAULT_SAVED_FRAMES, DEFAULT_SUMMARY_FRAMES, DirectorySink, Downloader,
    FfmpegLogLevel, FrameSource, ProgressCallback, ProgressInfo, SampleOptions, SamplingPolicy,
    SummaryOptions, VideoFile, VideoSummary, YtDlp,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framesift metadata input.mp4 --json\n  framesift extract input.mp4 --frames 5\n  framesift extract input.mp4 --mode change --frames 30 --threshold 30 --progress\n  framesift summarize https://example.com/watch?v=abc --captioner blip-caption\n  framesift completions zsh > _framesift";

#[derive(Debug, Parser)]
#[command(
    name = "framesift",
    version,
    about = "Pick representative frames out of videos and summarize them",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while scanning or captioning.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Every total/N-th frame.
    Interval,
    /// Scene changes above a luminance threshold.
    Change,
    /// N frames spread evenly over the video.
    Spread,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print metadata for a video file.
    #[command(
        about = "Print video metadata",
        visible_alias = "info",
        after_help = "Examples:\n  framesift metadata input.mp4\n  framesift metadata input.mp4 --json"
    )]
    Metadata {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Sample frames and write them to a directory.
    #[command(
        about = "Sample video frames",
        after_help = "Examples:\n  framesift extract input.mp4 --frames 5 --out extracted_frames\n  framesift extract input.mp4 --mode change --threshold 25 --frames 30 --ext png"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Sampling policy.
        #[arg(long, value_enum, default_value_t = Mode::Interval)]
        mode: Mode,
        /// Maximum number of frames to keep.
        #[arg(long, default_value_t = DEFAULT_NUM_FRAMES)]
        frames: u64,
        /// Change score a frame must exceed (change mode only, 0-255).
        #[arg(long, default_value_t = DEFAULT_CHANGE_THRESHOLD)]
        threshold: f64,
        /// Output directory (default: extracted_frames, or smart_frames in change mode).
        #[arg(long)]
        out: Option<PathBuf>,
        /// File-name prefix (default depends on the mode).
        #[arg(long)]
        prefix: Option<String>,
        /// Output image extension (jpg, png, bmp, tiff).
        #[arg(long, default_value = "jpg")]
        ext: String,
        /// Print the selected frames as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Caption sampled frames and write a summary report.
    #[command(
        about = "Summarize a video with an image captioner",
        after_help = "Examples:\n  framesift summarize input.mp4 --captioner blip-caption\n  framesift summarize https://example.com/watch?v=abc --captioner ./caption.sh --captioner-arg --beams --captioner-arg 5"
    )]
    Summarize {
        /// Input video path or http(s) URL.
        input: String,
        /// Program that reads a PNG on stdin and prints a caption.
        #[arg(long)]
        captioner: String,
        /// Extra argument for the captioner (repeatable).
        #[arg(long = "captioner-arg", allow_hyphen_values = true)]
        captioner_args: Vec<String>,
        /// Number of frames to caption.
        #[arg(long, default_value_t = DEFAULT_SUMMARY_FRAMES)]
        frames: u64,
        /// Number of keywords to keep.
        #[arg(long, default_value_t = DEFAULT_KEYWORD_LIMIT)]
        keywords: usize,
        /// Directory for the .txt and .json reports.
        #[arg(long, default_value = "summaries")]
        out: PathBuf,
        /// Report file name without extension.
        #[arg(long)]
        name: Option<String>,
        /// Number of sampled frames saved under <OUT>/frames (0 disables).
        #[arg(long, default_value_t = DEFAULT_SAVED_FRAMES)]
        save_frames: usize,
        /// Directory for downloaded videos.
        #[arg(long, default_value = "downloads")]
        downloads: PathBuf,
        /// yt-dlp format selector for downloads.
        #[arg(long, default_value = DEFAULT_DOWNLOAD_FORMAT)]
        format: String,
    },

    /// Download a video with yt-dlp.
    #[command(about = "Download a video")]
    Download {
        /// Video URL.
        url: String,
        /// Destination directory.
        #[arg(long, default_value = "downloads")]
        out: PathBuf,
        /// yt-dlp format selector.
        #[arg(long, default_value = DEFAULT_DOWNLOAD_FORMAT)]
        format: String,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn policy_for(mode: Mode, threshold: f64) -> SamplingPolicy {
    match mode {
        Mode::Interval => SamplingPolicy::Interval,
        Mode::Change => SamplingPolicy::on_change(threshold),
        Mode::Spread => SamplingPolicy::Spread,
    }
}

fn default_output_directory(mode: Mode) -> PathBuf {
    match mode {
        Mode::Change => PathBuf::from("smart_frames"),
        Mode::Interval | Mode::Spread => PathBuf::from("extracted_frames"),
    }
}

fn report_stem(input: &str, name: Option<&str>) -> String {
    if let Some(name) = name {
        return name.to_string();
    }
    if framesift::is_remote(input) {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        return format!("summary_{seconds}");
    }
    Path::new(input)
        .file_stem()
        .map(|stem| format!("{}_summary", stem.to_string_lossy()))
        .unwrap_or_else(|| "summary".to_string())
}

fn init_logging(global: &GlobalOptions) {
    let level = if global.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global);

    let level = match &global.log_level {
        Some(level) => level
            .parse::<FfmpegLogLevel>()
            .map_err(|error| format!("unsupported --log-level: {error}"))?,
        None if global.verbose => FfmpegLogLevel::Warning,
        None => FfmpegLogLevel::Error,
    };
    framesift::set_ffmpeg_log_level(level);

    Ok(())
}

/// Fail before any work starts when an output would be clobbered.
fn ensure_outputs_free(
    paths: &[PathBuf],
    overwrite: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if overwrite {
        return Ok(());
    }
    match paths.iter().find(|path| path.exists()) {
        Some(path) => Err(format!(
            "output file already exists: {} (use --overwrite)",
            path.display()
        )
        .into()),
        None => Ok(()),
    }
}

fn new_progress_bar() -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let progress_bar = ProgressBar::new(0);
    let style =
        ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
    progress_bar.set_style(style.progress_chars("##-"));
    Ok(progress_bar)
}

/// Drives an indicatif bar from library progress reports.
struct TerminalProgress {
    bar: ProgressBar,
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        self.bar.set_message(format!("{:?}", info.operation));
    }
}

fn attach_progress(
    options: SampleOptions,
    global: &GlobalOptions,
) -> Result<(SampleOptions, Option<ProgressBar>), Box<dyn std::error::Error>> {
    if !global.progress {
        return Ok((options, None));
    }
    let bar = new_progress_bar()?;
    let options = options.with_progress(Arc::new(TerminalProgress { bar: bar.clone() }));
    Ok((options, Some(bar)))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Metadata { input, json } => {
            let video = VideoFile::open(&input)?;
            let metadata = video.metadata();
            if json {
                let payload = json!({
                    "path": input.display().to_string(),
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "codec": metadata.codec,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{metadata}");
            }
        }
        Commands::Extract {
            input,
            mode,
            frames,
            threshold,
            out,
            prefix,
            ext,
            json,
        } => {
            let policy = policy_for(mode, threshold);
            let options = SampleOptions::new()
                .with_policy(policy)
                .with_num_frames(frames);
            options.validate()?;
            let (options, progress_bar) = attach_progress(options, &cli.global)?;

            let out = out.unwrap_or_else(|| default_output_directory(mode));
            let mut sink = DirectorySink::create(&out)?
                .with_prefix(prefix.unwrap_or_else(|| policy.file_prefix().to_string()))
                .with_extension(&ext)
                .with_overwrite(cli.global.overwrite);

            let mut video = VideoFile::open(&input)?;
            let outcome = framesift::sample_to_sink(&mut video, &options, &mut sink);
            video.close();
            if let Some(bar) = progress_bar {
                bar.finish_with_message("done");
            }
            let written = outcome?;

            if json {
                let payload: Vec<_> = sink
                    .written()
                    .iter()
                    .map(|path| json!({ "path": path.display().to_string() }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                if cli.global.verbose {
                    for path in sink.written() {
                        eprintln!("saved {}", path.display());
                    }
                }
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Saved {written} frame(s) ({policy}) in '{}'",
                        sink.directory().display()
                    )
                    .green()
                );
            }
        }
        Commands::Summarize {
            input,
            captioner,
            captioner_args,
            frames,
            keywords,
            out,
            name,
            save_frames,
            downloads,
            format,
        } => {
            let stem = framesift::sanitize_file_stem(&report_stem(&input, name.as_deref()));
            let (text_path, json_path) = VideoSummary::report_paths(&out, &stem);
            let sample_options = SampleOptions::new()
                .with_policy(SamplingPolicy::Spread)
                .with_num_frames(frames);
            let (sample_options, progress_bar) = attach_progress(sample_options, &cli.global)?;
            let options = SummaryOptions::new()
                .with_sample_options(sample_options)
                .with_keyword_limit(keywords)
                .with_frame_directory(out.join("frames"))
                .with_frame_prefix(format!("{stem}_frame"))
                .with_saved_frame_limit(save_frames)
                .with_overwrite(cli.global.overwrite);

            let mut outputs = vec![text_path, json_path];
            outputs.extend(options.saved_frame_paths());
            ensure_outputs_free(&outputs, cli.global.overwrite)?;

            let mut captioner = CommandCaptioner::new(&captioner).args(&captioner_args);

            let outcome = if framesift::is_remote(&input) {
                let downloader = YtDlp::new().with_format(format);
                framesift::summarize_url(&input, &downloader, &downloads, &options, &mut captioner)
                    .map(|(path, summary)| {
                        println!("{} {}", "downloaded".green().bold(), path.display());
                        summary
                    })
            } else {
                framesift::summarize_file(&input, &options, &mut captioner)
            };
            if let Some(bar) = progress_bar {
                bar.finish_with_message("done");
            }
            let summary = outcome?;

            print!("{}", summary.render_text());
            for path in &summary.saved_frames {
                println!("{} {}", "saved".green().bold(), path.display());
            }
            let (text_path, json_path) = summary.save(&out, &stem, cli.global.overwrite)?;
            println!("{} {}", "saved".green().bold(), text_path.display());
            println!("{} {}", "saved".green().bold(), json_path.display());
        }
        Commands::Download { url, out, format } => {
            let downloader = YtDlp::new().with_format(format);
            let path = downloader.download(&url, &out)?;
            println!("{} {}", "saved".green().bold(), path.display());
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framesift", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
