use crate::utils::error::{Result, TubefetchError};
use async_trait::async_trait;

/// Turns an opaque cipher payload into a playable stream URL.
///
/// The transform lives in the service's player script and changes often, so
/// the rest of the pipeline only depends on this seam.
#[async_trait]
pub trait Decipherer: Send + Sync {
    async fn decipher(&self, video_id: &str, cipher: &str) -> Result<String>;
}

/// Decipherer used when none is configured. Every ciphered format fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDecipherer;

#[async_trait]
impl Decipherer for UnavailableDecipherer {
    async fn decipher(&self, video_id: &str, _cipher: &str) -> Result<String> {
        Err(TubefetchError::Decipher(format!(
            "no decipherer configured for video {}",
            video_id
        )))
    }
}
