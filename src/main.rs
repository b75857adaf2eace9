//! tubefetch - fetch video metadata and download streams
//!
//! Videos are processed one after another; a failure on one video is
//! reported at the end and does not stop the rest of the batch.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tubefetch::downloader::{
    DownloadConfig, DownloadEngine, DownloadOutcome, DownloadProgress, Downloader, FfmpegMuxer,
    Muxer, ProgressObserver,
};
use tubefetch::extractor::{UnavailableDecipherer, Video, YoutubeClient};
use tubefetch::utils::logging::init_tracing;
use tubefetch::utils::{AppSettings, LogLevel, Logger};

#[derive(Parser)]
#[command(name = "tubefetch", version, about = "Download videos and their metadata")]
struct Args {
    /// Settings file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print metadata and formats of the given videos
    Info {
        #[arg(required = true)]
        videos: Vec<String>,

        #[arg(short, long, value_enum, default_value_t = InfoOutput::Full)]
        output: InfoOutput,

        /// Keep formats whose MIME type contains every codec
        #[arg(short, long)]
        codec: Vec<String>,

        /// Keep formats matching any itag or quality
        #[arg(short, long)]
        quality: Vec<String>,
    },
    /// Download the given videos
    Download {
        #[arg(required = true)]
        videos: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// Output file name (single video only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// auto: download video and audio separately and mux them
        #[arg(short, long, value_enum, default_value_t = Mode::Auto)]
        mode: Mode,

        /// Itag, quality or quality label, e.g. 1080p or hd1080
        #[arg(short, long, default_value = "")]
        quality: String,

        /// Keep formats whose MIME type contains every codec
        #[arg(short, long)]
        codec: Vec<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InfoOutput {
    Full,
    Media,
    MediaSplit,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    None,
    Auto,
}

struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, progress: &DownloadProgress) {
        if progress.is_indeterminate() {
            eprintln!(
                "Progress: {:.2} MiB, Speed: {:.2} MB/s",
                progress.downloaded_bytes as f64 / 1024.0 / 1024.0,
                progress.speed / 1024.0 / 1024.0
            );
        } else {
            eprintln!(
                "Progress: {:.1}%, Speed: {:.2} MB/s",
                progress.percentage() * 100.0,
                progress.speed / 1024.0 / 1024.0
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = AppSettings::load_or_default(args.config.as_deref())
        .context("Failed to load settings")?;
    if let Some(level) = args.log_level {
        settings.log_level = level;
    }

    init_tracing(settings.log_level);
    let logger = Logger::new(settings.log_level);

    let client = YoutubeClient::new(&settings, Arc::new(UnavailableDecipherer), logger)
        .context("Failed to create HTTP client")?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    match args.command {
        Command::Info {
            videos,
            output,
            codec,
            quality,
        } => {
            for video_url in &videos {
                match client.get_video(video_url, &cancel).await {
                    Ok(video) => {
                        let video = apply_filters(video, &codec, &quality);
                        print_info(&video, output);
                    }
                    Err(e) => println!("ERROR: {} - {}", video_url, e),
                }
            }
            Ok(())
        }
        Command::Download {
            videos,
            directory,
            output,
            mode,
            quality,
            codec,
        } => {
            if output.is_some() && videos.len() > 1 {
                return Err(anyhow!("--output can only be used with a single video"));
            }

            let config = DownloadConfig {
                progress_interval: settings.progress_interval(),
                observer: Some(Arc::new(ConsoleProgress)),
            };
            let engine = DownloadEngine::new(client.clone(), config);
            let muxer = Arc::new(FfmpegMuxer::new(settings.ffmpeg_path.clone(), logger));
            let output_dir = directory.unwrap_or_else(|| settings.output_dir.clone());
            let mut downloader =
                Downloader::new(engine, muxer.clone(), logger).with_output_dir(output_dir);
            if let Some(temp_dir) = settings.temp_dir.clone() {
                downloader = downloader.with_temp_dir(temp_dir);
            }

            let split = quality.starts_with("hd") || mode == Mode::Auto;
            if split {
                eprintln!("check ffmpeg is installed....");
                muxer
                    .check_available()
                    .await
                    .context("please check ffmpeg is installed correctly")?;
            }

            let mut failures = Vec::new();
            for video_url in &videos {
                if cancel.is_cancelled() {
                    failures.push(format!("{}: cancelled", video_url));
                    continue;
                }
                let result = download_one(
                    &client,
                    &downloader,
                    video_url,
                    output.as_deref(),
                    split,
                    &quality,
                    &codec,
                    &cancel,
                )
                .await;

                match result {
                    Ok(DownloadOutcome::Completed(path)) => {
                        eprintln!("Downloaded {}", path.display())
                    }
                    Ok(DownloadOutcome::Skipped(path)) => {
                        eprintln!("SKIP: {} - file {} exists", video_url, path.display())
                    }
                    Err(e) => {
                        eprintln!("FAILED {}: {:#}", video_url, e);
                        failures.push(format!("{}: {:#}", video_url, e));
                    }
                }
            }

            if failures.is_empty() {
                Ok(())
            } else {
                Err(anyhow!(
                    "failure to process videos:\n{}",
                    failures.join("\n")
                ))
            }
        }
    }
}

fn apply_filters(video: Video, codec: &[String], quality: &[String]) -> Video {
    let video = if codec.is_empty() {
        video
    } else {
        video.filter_codec(codec)
    };
    if quality.is_empty() {
        video
    } else {
        video.filter_quality(quality)
    }
}

#[allow(clippy::too_many_arguments)]
async fn download_one(
    client: &YoutubeClient,
    downloader: &Downloader,
    video_url: &str,
    output: Option<&std::path::Path>,
    split: bool,
    quality: &str,
    codec: &[String],
    cancel: &CancellationToken,
) -> Result<DownloadOutcome> {
    let video = client.get_video(video_url, cancel).await?;
    eprintln!("▶ {}: '{}'", video.id, video.title);

    let video = apply_filters(video, codec, &[]);

    if split {
        return Ok(downloader
            .download_composite(&video, quality, output, cancel)
            .await?);
    }

    let candidates = if quality.is_empty() {
        video.formats.clone()
    } else {
        video.formats.filter_quality(&[quality])
    };
    let format = candidates
        .first()
        .ok_or_else(|| anyhow!("no format found for quality '{}'", quality))?;

    Ok(downloader.download(&video, format, output, cancel).await?)
}

fn print_info(video: &Video, output: InfoOutput) {
    println!("Title:       {}", video.title);
    if output == InfoOutput::Full {
        println!("Author:      {}", video.author);
        println!("Duration:    {:?}", video.duration);
        println!("Description: {}", video.description);
        println!();
    }

    println!(
        "{:>5} {:>4} {:>8} {:>8} {:>8} {:>3} {:>9} {:>9} {:>6}  MimeType",
        "itag", "fps", "quality", "label", "audio", "ch", "size[MB]", "bitrate", "rate"
    );

    let sections = if output == InfoOutput::MediaSplit {
        vec![
            &video.video_audio_formats,
            &video.video_formats,
            &video.audio_formats,
        ]
    } else {
        vec![&video.formats]
    };

    for (i, formats) in sections.into_iter().enumerate() {
        if i > 0 {
            println!("-");
        }
        for format in formats {
            let size = format.estimated_size(video.duration);
            let video_quality = if format.fps == 0 { "" } else { format.quality.as_str() };
            println!(
                "{:>5} {:>4} {:>8} {:>8} {:>8} {:>3} {:>9.1} {:>9} {:>6}  {}",
                format.itag,
                format.fps,
                video_quality,
                format.quality_label,
                format
                    .audio_quality
                    .trim_start_matches("AUDIO_QUALITY_")
                    .to_lowercase(),
                format.audio_channels,
                size as f64 / 1024.0 / 1024.0,
                format.effective_bitrate(),
                format.audio_sample_rate,
                format.mime_type
            );
        }
    }
}
