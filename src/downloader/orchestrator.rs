//! High level downloads: one stream to a file, or video + audio muxed together

use crate::downloader::engine::DownloadEngine;
use crate::downloader::merger::{cleanup_temp_files, Muxer};
use crate::extractor::models::{Format, Video};
use crate::utils::error::{Result, TubefetchError};
use crate::utils::filename::{pick_ideal_file_extension, sanitize_filename};
use crate::utils::logging::Logger;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use tokio_util::sync::CancellationToken;

/// Preferred companion audio itags for MPEG-4 video, best first
pub const MP4_AUDIO_ITAGS: [i64; 3] = [258, 256, 140];
/// Preferred companion audio itags for WebM video, best first
pub const WEBM_AUDIO_ITAGS: [i64; 3] = [251, 250, 249];

/// What happened to a requested download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed(PathBuf),
    /// The destination already existed and was left untouched
    Skipped(PathBuf),
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            DownloadOutcome::Completed(path) | DownloadOutcome::Skipped(path) => path,
        }
    }
}

/// Pick the video-only format and its companion audio format for split mode.
///
/// `quality` empty means the best video format; otherwise it must equal a
/// quality or quality label.
pub fn select_split_formats<'a>(video: &'a Video, quality: &str) -> Result<(&'a Format, &'a Format)> {
    let video_format = if quality.is_empty() {
        video.video_formats.first()
    } else {
        video.video_formats.find_by_quality(quality)
    };
    let video_format =
        video_format.ok_or_else(|| TubefetchError::NoVideoFormat(quality.to_string()))?;

    let candidates: &[i64] = if video_format.mime_type.contains("mp4") {
        &MP4_AUDIO_ITAGS
    } else if video_format.mime_type.contains("webm") {
        &WEBM_AUDIO_ITAGS
    } else {
        return Err(TubefetchError::UnsupportedMimeType(
            video_format.mime_type.clone(),
        ));
    };

    let audio_format = candidates
        .iter()
        .find_map(|itag| video.audio_formats.find_by_itag(*itag))
        .ok_or_else(|| TubefetchError::NoAudioFormat(quality.to_string()))?;

    Ok((video_format, audio_format))
}

/// Downloads videos into an output directory
#[derive(Clone)]
pub struct Downloader {
    engine: DownloadEngine,
    muxer: Arc<dyn Muxer>,
    output_dir: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    logger: Logger,
}

impl Downloader {
    pub fn new(engine: DownloadEngine, muxer: Arc<dyn Muxer>, logger: Logger) -> Self {
        Self {
            engine,
            muxer,
            output_dir: None,
            temp_dir: None,
            logger,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Keep intermediate split-mode streams in `dir` instead of the system
    /// temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Destination for `format`: `output_file` or the sanitized title plus
    /// an extension, placed in the output directory (created if needed)
    pub async fn output_file(
        &self,
        video: &Video,
        format: &Format,
        output_file: Option<&Path>,
    ) -> Result<PathBuf> {
        let file_name = match output_file {
            Some(name) => name.to_path_buf(),
            None => PathBuf::from(format!(
                "{}{}",
                sanitize_filename(&video.title),
                pick_ideal_file_extension(&format.mime_type)
            )),
        };

        match &self.output_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                Ok(dir.join(file_name))
            }
            None => Ok(file_name),
        }
    }

    /// Download a single format into one file, overwriting it
    pub async fn download(
        &self,
        video: &Video,
        format: &Format,
        output_file: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        self.logger.info(format!("Video '{}'", video.title));
        self.logger.info(format!(
            "Video (Quality '{}' | FPS '{}' | Codec '{}') - Audio (Channels '{}')",
            format.quality_label, format.fps, format.mime_type, format.audio_channels
        ));

        let dest = self.output_file(video, format, output_file).await?;
        self.logger.info(format!("Download to file={}", dest.display()));

        self.engine
            .download_format(video, format, &dest, cancel)
            .await?;

        Ok(DownloadOutcome::Completed(dest))
    }

    /// Download the best (or `quality`) video-only stream plus a matching
    /// audio stream and mux them into one file.
    ///
    /// An existing destination is reported as [`DownloadOutcome::Skipped`].
    pub async fn download_composite(
        &self,
        video: &Video,
        quality: &str,
        output_file: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        if video.video_formats.is_empty() {
            return Err(TubefetchError::NoVideoFormat(quality.to_string()));
        }
        let (video_format, audio_format) = select_split_formats(video, quality)?;

        self.logger.info(format!(
            "Video (Quality '{}' | FPS '{}' | Codec '{}')",
            video_format.quality_label, video_format.fps, video_format.mime_type
        ));
        self.logger.info(format!(
            "Audio (Channels '{}' | Codec '{}')",
            audio_format.audio_channels, audio_format.mime_type
        ));

        let dest = self.output_file(video, video_format, output_file).await?;
        if tokio::fs::try_exists(&dest).await? {
            self.logger.warn(format!(
                "SKIP: video {} - file {} exists",
                video.id,
                dest.display()
            ));
            return Ok(DownloadOutcome::Skipped(dest));
        }

        let video_tmp = self.temp_stream_file(".m4v")?;
        let audio_tmp = match self.temp_stream_file(".m4a") {
            Ok(path) => path,
            Err(e) => {
                cleanup_temp_files(vec![video_tmp], self.logger);
                return Err(e);
            }
        };

        let result = self
            .download_and_mux(
                video,
                video_format,
                audio_format,
                &video_tmp,
                &audio_tmp,
                &dest,
                cancel,
            )
            .await;

        cleanup_temp_files(vec![video_tmp, audio_tmp], self.logger);

        result.map(|()| DownloadOutcome::Completed(dest))
    }

    #[allow(clippy::too_many_arguments)]
    async fn download_and_mux(
        &self,
        video: &Video,
        video_format: &Format,
        audio_format: &Format,
        video_tmp: &Path,
        audio_tmp: &Path,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let client = self.engine.client();
        let video_url = client.get_stream_url(video, video_format).await?;
        let audio_url = client.get_stream_url(video, audio_format).await?;

        self.logger.info("Downloading video file...");
        self.engine.download_url(&video_url, video_tmp, cancel).await?;

        self.logger.info("Downloading audio file...");
        self.engine.download_url(&audio_url, audio_tmp, cancel).await?;

        if cancel.is_cancelled() {
            return Err(TubefetchError::Cancelled);
        }

        self.logger
            .info(format!("merging video and audio to {}", dest.display()));
        self.muxer.mux(video_tmp, audio_tmp, dest).await
    }

    fn temp_stream_file(&self, suffix: &str) -> Result<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("youtube_").suffix(suffix);
        let file = match &self.temp_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };
        Ok(file.into_temp_path())
    }
}
