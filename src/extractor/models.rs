//! Data structures for video information

use serde::{Deserialize, Deserializer, Serialize};
use std::ops::Deref;
use std::time::Duration;

/// Video metadata plus its format catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    /// Zero when the server did not report a length
    pub duration: Duration,
    pub thumbnails: Vec<Thumbnail>,
    /// Every stream, combined and adaptive
    pub formats: FormatList,
    pub audio_formats: FormatList,
    pub video_formats: FormatList,
    pub video_audio_formats: FormatList,
    pub dash_manifest_url: Option<String>,
    pub hls_manifest_url: Option<String>,
}

/// Thumbnail image reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// One encoded stream, as described by the player response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Format {
    pub itag: i64,
    pub url: Option<String>,
    pub mime_type: String,
    pub quality: String,
    /// Opaque payload that has to be deciphered into a URL
    #[serde(rename = "signatureCipher", alias = "cipher")]
    pub cipher: Option<String>,
    pub bitrate: u64,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    #[serde(deserialize_with = "de_opt_u64")]
    pub last_modified: Option<u64>,
    #[serde(deserialize_with = "de_opt_u64")]
    pub content_length: Option<u64>,
    pub quality_label: String,
    pub projection_type: String,
    pub average_bitrate: u64,
    pub audio_quality: String,
    #[serde(deserialize_with = "de_opt_u64")]
    pub approx_duration_ms: Option<u64>,
    #[serde(deserialize_with = "de_u32")]
    pub audio_sample_rate: u32,
    pub audio_channels: u32,
}

impl Format {
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video")
    }

    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio")
    }

    /// Average bitrate when reported, else the peak bitrate
    pub fn effective_bitrate(&self) -> u64 {
        if self.average_bitrate > 0 {
            self.average_bitrate
        } else {
            self.bitrate
        }
    }

    /// Reported content length, or an estimate from bitrate and duration
    pub fn estimated_size(&self, duration: Duration) -> u64 {
        match self.content_length {
            Some(len) if len > 0 => len,
            _ => (self.effective_bitrate() as f64 * duration.as_secs_f64() / 8.0) as u64,
        }
    }
}

/// Ordered list of formats, best first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormatList(pub Vec<Format>);

impl FormatList {
    pub fn new(formats: Vec<Format>) -> Self {
        Self(formats)
    }
}

impl Deref for FormatList {
    type Target = [Format];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Format>> for FormatList {
    fn from(formats: Vec<Format>) -> Self {
        Self(formats)
    }
}

impl FromIterator<Format> for FormatList {
    fn from_iter<I: IntoIterator<Item = Format>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FormatList {
    type Item = Format;
    type IntoIter = std::vec::IntoIter<Format>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormatList {
    type Item = &'a Format;
    type IntoIter = std::slice::Iter<'a, Format>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// The player response encodes most integers as JSON strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(u64),
    Text(String),
}

impl Numeric {
    fn value(self) -> Option<u64> {
        match self {
            Numeric::Number(n) => Some(n),
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn de_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Numeric>::deserialize(deserializer)?.and_then(Numeric::value))
}

fn de_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = de_opt_u64(deserializer)?.unwrap_or(0);
    Ok(u32::try_from(value).unwrap_or(u32::MAX))
}
