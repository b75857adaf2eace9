//! Audio/video muxing through an external ffmpeg process

use crate::utils::error::{Result, TubefetchError};
use crate::utils::logging::Logger;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempPath;
use tokio::process::Command as AsyncCommand;

/// Combines a video-only and an audio-only file into one container
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Fails with [`TubefetchError::MuxerNotFound`] when the tool is missing
    async fn check_available(&self) -> Result<()>;

    /// Copy both streams verbatim into `output`, stopping at the shorter one
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;
}

/// [`Muxer`] backed by the `ffmpeg` binary
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    program: Option<PathBuf>,
    logger: Logger,
}

impl FfmpegMuxer {
    /// Use `program` when given, otherwise look `ffmpeg` up on PATH
    pub fn new(program: Option<PathBuf>, logger: Logger) -> Self {
        let program = program.or_else(|| which::which("ffmpeg").ok());
        if let Some(path) = &program {
            logger.debug(format!("Using ffmpeg at {}", path.display()));
        }
        Self { program, logger }
    }

    fn program(&self) -> Result<&Path> {
        self.program.as_deref().ok_or(TubefetchError::MuxerNotFound)
    }

    /// Arguments for a lossless `-shortest` copy
    pub fn mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = Vec::new();
        args.push("-y".into());
        args.push("-i".into());
        args.push(video.as_os_str().to_owned());
        args.push("-i".into());
        args.push(audio.as_os_str().to_owned());
        args.push("-c".into());
        args.push("copy".into());
        args.push("-shortest".into());
        args.push(output.as_os_str().to_owned());
        args.push("-loglevel".into());
        args.push("warning".into());
        args
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn check_available(&self) -> Result<()> {
        let program = self.program()?;
        let status = AsyncCommand::new(program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|_| TubefetchError::MuxerNotFound)?;

        if status.success() {
            Ok(())
        } else {
            Err(TubefetchError::MuxerNotFound)
        }
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        let program = self.program()?;
        self.logger
            .info(format!("Merging video and audio to {}", output.display()));

        let output_res = AsyncCommand::new(program)
            .args(Self::mux_args(video, audio, output))
            .stdin(Stdio::null())
            .output()
            .await;

        let out = match output_res {
            Ok(out) => out,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TubefetchError::MuxerNotFound)
            }
            Err(e) => return Err(e.into()),
        };

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(TubefetchError::Mux(format!(
                "ffmpeg exited with {}: {}",
                out.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Remove temporary stream files; failures are logged, never returned
pub fn cleanup_temp_files(paths: Vec<TempPath>, logger: Logger) {
    for path in paths {
        let shown = path.display().to_string();
        match path.close() {
            Ok(()) => logger.debug(format!("Removed temporary file: {}", shown)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => logger.warn(format!("Failed to remove temporary file {}: {}", shown, e)),
        }
    }
}
