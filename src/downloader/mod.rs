//! Download engine module

pub mod engine;
pub mod merger;
pub mod orchestrator;
pub mod progress;

// Re-export for convenience
pub use engine::{DownloadConfig, DownloadEngine};
pub use merger::{FfmpegMuxer, Muxer};
pub use orchestrator::{select_split_formats, DownloadOutcome, Downloader};
pub use progress::{DownloadProgress, DownloadStatus, ProgressObserver, ProgressTracker};
