//! Player response parsing for both metadata sources

use crate::extractor::models::{Format, FormatList, Thumbnail, Video};
use crate::utils::error::{Result, TubefetchError};
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;
use url::form_urlencoded;

/// Where a metadata payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    /// URL-encoded answer of the stream info endpoint
    StreamInfo,
    /// HTML of the watch page
    WatchPage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlayerResponse {
    playability_status: PlayabilityStatus,
    streaming_data: StreamingData,
    video_details: VideoDetails,
    microformat: Microformat,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlayabilityStatus {
    status: String,
    reason: String,
    playable_in_embed: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StreamingData {
    formats: Vec<Format>,
    adaptive_formats: Vec<Format>,
    dash_manifest_url: Option<String>,
    hls_manifest_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VideoDetails {
    title: String,
    author: String,
    short_description: String,
    thumbnail: ThumbnailList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThumbnailList {
    thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Microformat {
    player_microformat_renderer: PlayerMicroformatRenderer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlayerMicroformatRenderer {
    length_seconds: String,
}

fn player_response_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"var ytInitialPlayerResponse\s*=\s*(\{.+?\});")
            .expect("player response pattern is valid")
    })
}

/// Parse a raw metadata payload into a classified and sorted [`Video`]
pub fn parse(video_id: &str, body: &str, source: MetadataSource) -> Result<Video> {
    let player_json: Cow<'_, str> = match source {
        MetadataSource::StreamInfo => Cow::Owned(player_json_from_stream_info(body)?),
        MetadataSource::WatchPage => Cow::Borrowed(player_json_from_page(body)?),
    };

    let response: PlayerResponse = serde_json::from_str(&player_json)?;
    check_playability(&response.playability_status, source)?;

    build_video(video_id, response)
}

fn player_json_from_stream_info(body: &str) -> Result<String> {
    let answer = parse_form(body);

    let status = answer.get("status").cloned().unwrap_or_default();
    if status != "ok" {
        return Err(TubefetchError::ResponseStatus {
            status,
            reason: answer.get("reason").cloned().unwrap_or_default(),
        });
    }

    answer
        .get("player_response")
        .filter(|pr| !pr.is_empty())
        .cloned()
        .ok_or(TubefetchError::MissingPlayerResponse)
}

fn player_json_from_page(body: &str) -> Result<&str> {
    player_response_pattern()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(TubefetchError::MissingPlayerResponse)
}

/// Decode an `application/x-www-form-urlencoded` body. The first value of a
/// repeated key wins.
fn parse_form(body: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for (key, value) in form_urlencoded::parse(body.trim().as_bytes()).into_owned() {
        fields.entry(key).or_insert(value);
    }
    fields
}

fn check_playability(status: &PlayabilityStatus, source: MetadataSource) -> Result<()> {
    if status.status == "OK" {
        return Ok(());
    }

    if source == MetadataSource::StreamInfo && !status.playable_in_embed {
        return Err(TubefetchError::NotPlayableInEmbed);
    }

    Err(TubefetchError::Playability {
        status: status.status.clone(),
        reason: status.reason.clone(),
    })
}

fn build_video(video_id: &str, response: PlayerResponse) -> Result<Video> {
    let PlayerResponse {
        streaming_data,
        video_details,
        microformat,
        ..
    } = response;

    let duration = microformat
        .player_microformat_renderer
        .length_seconds
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_default();

    let StreamingData {
        formats,
        adaptive_formats,
        dash_manifest_url,
        hls_manifest_url,
    } = streaming_data;

    let all: FormatList = formats.into_iter().chain(adaptive_formats).collect();
    if all.is_empty() {
        return Err(TubefetchError::NoFormats);
    }

    let mut video = Video {
        id: video_id.to_string(),
        title: video_details.title,
        description: video_details.short_description,
        author: video_details.author,
        duration,
        thumbnails: video_details.thumbnail.thumbnails,
        formats: all,
        dash_manifest_url,
        hls_manifest_url,
        ..Default::default()
    };
    video.classify();

    Ok(video)
}
