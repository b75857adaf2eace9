//! HTTP access to the streaming service: metadata and stream responses

use crate::extractor::models::{Format, Video};
use crate::extractor::parser::{self, MetadataSource};
use crate::extractor::resolver::StreamResolver;
use crate::extractor::traits::Decipherer;
use crate::utils::config::AppSettings;
use crate::utils::error::{Result, TubefetchError};
use crate::utils::logging::Logger;
use regex::Regex;
use reqwest::{Client, Response, StatusCode};
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// Base URLs of the two metadata sources
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub stream_info: String,
    pub watch_page: String,
    pub embed_referer: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            stream_info: "https://youtube.com/get_video_info".to_string(),
            watch_page: "https://www.youtube.com/watch".to_string(),
            embed_referer: "https://youtube.googleapis.com/v/".to_string(),
        }
    }
}

/// Fetches video metadata and stream responses
#[derive(Clone)]
pub struct YoutubeClient {
    http: Client,
    endpoints: Endpoints,
    resolver: StreamResolver,
    embed_bypass: bool,
    logger: Logger,
}

impl YoutubeClient {
    pub fn new(
        settings: &AppSettings,
        decipherer: Arc<dyn Decipherer>,
        logger: Logger,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.connect_timeout())
            .build()?;

        Ok(Self {
            http,
            endpoints: Endpoints::default(),
            resolver: StreamResolver::new(decipherer, logger),
            embed_bypass: settings.embed_bypass,
            logger,
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn logger(&self) -> Logger {
        self.logger
    }

    /// Fetch metadata for a video id or URL.
    ///
    /// Uses the stream info endpoint first and falls back to the watch page
    /// when the video refuses to play embedded.
    pub async fn get_video(&self, url_or_id: &str, cancel: &CancellationToken) -> Result<Video> {
        let id = extract_video_id(url_or_id)?;

        match self.get_video_from_stream_info(&id, cancel).await {
            Err(e) if e.is_not_playable_in_embed() => {
                self.logger
                    .info(format!("Video {} not playable in embed, trying watch page", id));
                self.get_video_from_page(&id, cancel).await
            }
            other => other,
        }
    }

    pub async fn get_video_from_stream_info(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Video> {
        let mut url = format!(
            "{}?video_id={}",
            self.endpoints.stream_info,
            urlencoding::encode(id)
        );
        if self.embed_bypass {
            let eurl = format!("{}{}", self.endpoints.embed_referer, id);
            url.push_str("&eurl=");
            url.push_str(&urlencoding::encode(&eurl));
        }

        let body = self.http_get_text(&url, cancel).await?;
        parser::parse(id, &body, MetadataSource::StreamInfo)
    }

    pub async fn get_video_from_page(&self, id: &str, cancel: &CancellationToken) -> Result<Video> {
        let url = format!("{}?v={}", self.endpoints.watch_page, urlencoding::encode(id));
        let body = self.http_get_text(&url, cancel).await?;
        parser::parse(id, &body, MetadataSource::WatchPage)
    }

    /// Playable URL for a format
    pub async fn get_stream_url(&self, video: &Video, format: &Format) -> Result<String> {
        self.resolver.resolve(video, format).await
    }

    /// Open the stream of a format; the response is already checked for 200
    pub async fn get_stream(
        &self,
        video: &Video,
        format: &Format,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let url = self.get_stream_url(video, format).await?;
        self.http_get(&url, cancel).await
    }

    /// GET that only accepts `200 OK`
    pub async fn http_get(&self, url: &str, cancel: &CancellationToken) -> Result<Response> {
        self.logger.trace(format!("GET {}", url));

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TubefetchError::Cancelled),
            res = self.http.get(url).send() => res?,
        };

        if response.status() != StatusCode::OK {
            return Err(TubefetchError::UnexpectedStatus(response.status().as_u16()));
        }

        Ok(response)
    }

    async fn http_get_text(&self, url: &str, cancel: &CancellationToken) -> Result<String> {
        let response = self.http_get(url, cancel).await?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TubefetchError::Cancelled),
            body = response.text() => Ok(body?),
        }
    }
}

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?|shorts)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
        )
        .expect("video id pattern is valid")
    })
}

/// Extract the 11 character video id from a URL, or accept a bare id
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();
    let is_id_char = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';

    if input.len() == 11 && input.chars().all(is_id_char) {
        return Ok(input.to_string());
    }

    video_id_pattern()
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| id.chars().all(is_id_char))
        .map(str::to_string)
        .ok_or_else(|| TubefetchError::InvalidVideoId(input.to_string()))
}
