//! Error handling for tubefetch

use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, TubefetchError>;

/// Main error type for tubefetch
#[derive(Debug, Error)]
pub enum TubefetchError {
    #[error("Invalid video id or URL: {0}")]
    InvalidVideoId(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("Response status is '{status}': {reason}")]
    ResponseStatus { status: String, reason: String },

    #[error("Cannot playback and download, status: {status}, reason: {reason}")]
    Playability { status: String, reason: String },

    #[error("Embedding this video has been disabled")]
    NotPlayableInEmbed,

    #[error("No player response found in the server's answer")]
    MissingPlayerResponse,

    #[error("Unable to parse player response JSON: {0}")]
    PlayerResponseJson(#[from] serde_json::Error),

    #[error("No formats found in the server's answer")]
    NoFormats,

    #[error("Cipher not found")]
    CipherNotFound,

    #[error("Failed to decipher stream URL: {0}")]
    Decipher(String),

    #[error("No video format found for quality '{0}'")]
    NoVideoFormat(String),

    #[error("No audio format found for quality '{0}'")]
    NoAudioFormat(String),

    #[error("Unhandled mime type: {0}")]
    UnsupportedMimeType(String),

    #[error("ffmpeg not found. Please install ffmpeg")]
    MuxerNotFound,

    #[error("Muxing failed: {0}")]
    Mux(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl TubefetchError {
    /// Whether the caller may retry through the watch page instead
    pub fn is_not_playable_in_embed(&self) -> bool {
        matches!(self, TubefetchError::NotPlayableInEmbed)
    }
}
