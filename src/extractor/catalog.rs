//! Format classification, ordering and filtering

use crate::extractor::models::{Format, FormatList, Video};
use std::cmp::Ordering;

/// Best-first ordering between two formats.
///
/// Width, then fps, then kind: audio entries (fps 0 with channels) ahead of
/// everything else. Within audio: codec (mp4, opus), channels, bitrate and
/// sample rate. Otherwise: codec (av01, vp9, avc1), then bitrate.
pub fn compare_formats(a: &Format, b: &Format) -> Ordering {
    b.width
        .cmp(&a.width)
        .then_with(|| b.fps.cmp(&a.fps))
        .then_with(|| ranks_as_audio(b).cmp(&ranks_as_audio(a)))
        .then_with(|| {
            if ranks_as_audio(a) {
                audio_codec_rank(&b.mime_type)
                    .cmp(&audio_codec_rank(&a.mime_type))
                    .then_with(|| b.audio_channels.cmp(&a.audio_channels))
                    .then_with(|| b.bitrate.cmp(&a.bitrate))
                    .then_with(|| b.audio_sample_rate.cmp(&a.audio_sample_rate))
            } else {
                video_codec_rank(&b.mime_type)
                    .cmp(&video_codec_rank(&a.mime_type))
                    .then_with(|| b.bitrate.cmp(&a.bitrate))
            }
        })
}

fn ranks_as_audio(format: &Format) -> bool {
    format.fps == 0 && format.audio_channels > 0
}

// Higher is better, unrecognized is 0.
fn audio_codec_rank(mime_type: &str) -> u8 {
    if mime_type.contains("mp4") {
        2
    } else if mime_type.contains("opus") {
        1
    } else {
        0
    }
}

fn video_codec_rank(mime_type: &str) -> u8 {
    if mime_type.contains("av01") {
        3
    } else if mime_type.contains("vp9") {
        2
    } else if mime_type.contains("avc1") {
        1
    } else {
        0
    }
}

impl FormatList {
    /// Stable best-first sort
    pub fn sort(&mut self) {
        self.0.sort_by(compare_formats);
    }

    pub fn sorted(mut self) -> Self {
        self.sort();
        self
    }

    /// Formats whose MIME type contains every codec. Empty `codecs` keeps all.
    pub fn filter_codec<S: AsRef<str>>(&self, codecs: &[S]) -> FormatList {
        self.iter()
            .filter(|f| codecs.iter().all(|c| f.mime_type.contains(c.as_ref())))
            .cloned()
            .collect()
    }

    /// Formats matching any of the quality tokens, by itag or by substring of
    /// the quality and quality label
    pub fn filter_quality<S: AsRef<str>>(&self, qualities: &[S]) -> FormatList {
        self.iter()
            .filter(|f| qualities.iter().any(|q| matches_quality(f, q.as_ref())))
            .cloned()
            .collect()
    }

    /// First format whose quality or quality label equals `quality`
    pub fn find_by_quality(&self, quality: &str) -> Option<&Format> {
        self.iter()
            .find(|f| f.quality == quality || f.quality_label == quality)
    }

    pub fn find_by_itag(&self, itag: i64) -> Option<&Format> {
        self.iter().find(|f| f.itag == itag)
    }

    /// Formats whose MIME type contains `kind`, e.g. "audio" or "webm"
    pub fn find_by_type(&self, kind: &str) -> FormatList {
        self.iter()
            .filter(|f| f.mime_type.contains(kind))
            .cloned()
            .collect()
    }
}

fn matches_quality(format: &Format, token: &str) -> bool {
    if let Ok(itag) = token.trim().parse::<i64>() {
        if itag == format.itag {
            return true;
        }
    }
    format.quality.contains(token) || format.quality_label.contains(token)
}

impl Video {
    /// Split `formats` into the audio, video and combined views and sort all four
    pub fn classify(&mut self) {
        let mut audio = Vec::new();
        let mut video = Vec::new();
        let mut combined = Vec::new();

        for format in self.formats.iter() {
            if format.is_video() {
                if format.audio_channels == 0 {
                    video.push(format.clone());
                } else {
                    combined.push(format.clone());
                }
            } else if format.is_audio() {
                audio.push(format.clone());
            }
        }

        self.audio_formats = audio.into();
        self.video_formats = video.into();
        self.video_audio_formats = combined.into();
        self.sort_formats();
    }

    pub fn sort_formats(&mut self) {
        self.formats.sort();
        self.audio_formats.sort();
        self.video_formats.sort();
        self.video_audio_formats.sort();
    }

    /// A copy of this video keeping only formats that contain every codec
    pub fn filter_codec<S: AsRef<str>>(&self, codecs: &[S]) -> Video {
        self.map_views(|list| list.filter_codec(codecs))
    }

    /// A copy of this video keeping only formats matching any quality token
    pub fn filter_quality<S: AsRef<str>>(&self, qualities: &[S]) -> Video {
        self.map_views(|list| list.filter_quality(qualities))
    }

    fn map_views<F>(&self, f: F) -> Video
    where
        F: Fn(&FormatList) -> FormatList,
    {
        let mut video = Video {
            formats: f(&self.formats),
            audio_formats: f(&self.audio_formats),
            video_formats: f(&self.video_formats),
            video_audio_formats: f(&self.video_audio_formats),
            ..self.clone_metadata()
        };
        video.sort_formats();
        video
    }

    fn clone_metadata(&self) -> Video {
        Video {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            author: self.author.clone(),
            duration: self.duration,
            thumbnails: self.thumbnails.clone(),
            dash_manifest_url: self.dash_manifest_url.clone(),
            hls_manifest_url: self.hls_manifest_url.clone(),
            ..Default::default()
        }
    }
}
