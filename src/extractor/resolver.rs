//! Playable URL resolution for a chosen format

use crate::extractor::models::{Format, Video};
use crate::extractor::traits::Decipherer;
use crate::utils::error::{Result, TubefetchError};
use crate::utils::logging::Logger;
use std::sync::Arc;

/// Resolves stream URLs, handing ciphered formats to a [`Decipherer`]
#[derive(Clone)]
pub struct StreamResolver {
    decipherer: Arc<dyn Decipherer>,
    logger: Logger,
}

impl StreamResolver {
    pub fn new(decipherer: Arc<dyn Decipherer>, logger: Logger) -> Self {
        Self { decipherer, logger }
    }

    /// Direct URL when present, else the deciphered cipher payload
    pub async fn resolve(&self, video: &Video, format: &Format) -> Result<String> {
        if let Some(url) = format.url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }

        let cipher = format
            .cipher
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(TubefetchError::CipherNotFound)?;

        self.logger
            .debug(format!("Deciphering itag {} of video {}", format.itag, video.id));
        self.decipherer.decipher(&video.id, cipher).await
    }
}
