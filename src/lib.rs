//! tubefetch library

pub mod downloader;
pub mod extractor;
pub mod utils;

// Re-export main types for easier use
pub use downloader::{DownloadConfig, DownloadEngine, DownloadOutcome, Downloader, FfmpegMuxer};
pub use extractor::{Decipherer, Format, FormatList, Video, YoutubeClient};
pub use utils::{AppSettings, LogLevel, Logger, Result, TubefetchError};
