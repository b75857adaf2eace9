//! Property checks for catalog filtering and ordering.

use proptest::prelude::*;
use tubefetch::extractor::{compare_formats, Format, FormatList};

const VIDEO_MIMES: [&str; 5] = [
    r#"video/mp4; codecs="avc1.640028""#,
    r#"video/mp4; codecs="av01.0.08M.08""#,
    r#"video/webm; codecs="vp9""#,
    r#"video/3gpp; codecs="mp4v.20.3""#,
    "video/x-flv",
];

const AUDIO_MIMES: [&str; 3] = [
    r#"audio/mp4; codecs="mp4a.40.2""#,
    r#"audio/webm; codecs="opus""#,
    "audio/ogg",
];

const QUALITIES: [(&str, &str); 4] = [
    ("hd1080", "1080p"),
    ("hd720", "720p"),
    ("medium", "360p"),
    ("tiny", "144p"),
];

fn arb_video() -> impl Strategy<Value = Format> {
    (
        0i64..400,
        prop::sample::select(vec![0u32, 640, 1280, 1920]),
        prop::sample::select(vec![0u32, 24, 30, 60]),
        0usize..VIDEO_MIMES.len(),
        0usize..QUALITIES.len(),
        prop::sample::select(vec![100_000u64, 500_000, 2_000_000]),
        prop::sample::select(vec![0u32, 2]),
    )
        .prop_map(|(itag, width, fps, mime, quality, bitrate, channels)| Format {
            itag,
            width,
            fps,
            mime_type: VIDEO_MIMES[mime].to_string(),
            quality: QUALITIES[quality].0.to_string(),
            quality_label: QUALITIES[quality].1.to_string(),
            bitrate,
            audio_channels: channels,
            ..Default::default()
        })
}

// Some audio entries lack channel information.
fn arb_audio() -> impl Strategy<Value = Format> {
    (
        0i64..400,
        0usize..AUDIO_MIMES.len(),
        prop::sample::select(vec![0u32, 1, 2, 6]),
        prop::sample::select(vec![48_000u64, 128_000, 160_000]),
        prop::sample::select(vec![0u32, 44_100, 48_000]),
    )
        .prop_map(|(itag, mime, channels, bitrate, rate)| Format {
            itag,
            mime_type: AUDIO_MIMES[mime].to_string(),
            quality: "tiny".to_string(),
            audio_channels: channels,
            bitrate,
            audio_sample_rate: rate,
            ..Default::default()
        })
}

fn arb_format() -> impl Strategy<Value = Format> {
    prop_oneof![arb_video(), arb_audio()]
}

fn arb_list() -> impl Strategy<Value = FormatList> {
    prop::collection::vec(arb_format(), 0..24).prop_map(FormatList::new)
}

fn arb_tokens() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(vec!["mp4", "webm", "avc1", "vp9", "720", "hd", "18", "137", "p"]),
        0..3,
    )
    .prop_map(|v| v.into_iter().map(str::to_string).collect())
}

fn is_subsequence(sub: &FormatList, full: &FormatList) -> bool {
    let mut it = full.iter();
    sub.iter().all(|f| it.any(|g| g == f))
}

proptest! {
    #[test]
    fn empty_codec_filter_is_identity(list in arb_list()) {
        let none: Vec<String> = Vec::new();
        prop_assert_eq!(list.filter_codec(&none), list);
    }

    #[test]
    fn codec_filter_keeps_only_full_matches_in_order(list in arb_list(), codecs in arb_tokens()) {
        let filtered = list.filter_codec(&codecs);
        for f in filtered.iter() {
            prop_assert!(codecs.iter().all(|c| f.mime_type.contains(c.as_str())));
        }
        let expected = list
            .iter()
            .filter(|f| codecs.iter().all(|c| f.mime_type.contains(c.as_str())))
            .count();
        prop_assert_eq!(filtered.len(), expected);
        prop_assert!(is_subsequence(&filtered, &list));
    }

    #[test]
    fn quality_filter_matches_and_is_idempotent(list in arb_list(), qualities in arb_tokens()) {
        let once = list.filter_quality(&qualities);
        for f in once.iter() {
            let matches = qualities.iter().any(|q| {
                q.parse::<i64>().map(|n| n == f.itag).unwrap_or(false)
                    || f.quality.contains(q.as_str())
                    || f.quality_label.contains(q.as_str())
            });
            prop_assert!(matches);
        }
        prop_assert!(is_subsequence(&once, &list));
        prop_assert_eq!(once.filter_quality(&qualities), once);
    }

    #[test]
    fn comparator_is_transitive(a in arb_format(), b in arb_format(), c in arb_format()) {
        use std::cmp::Ordering::*;
        let ab = compare_formats(&a, &b);
        let bc = compare_formats(&b, &c);
        prop_assert_eq!(compare_formats(&b, &a), ab.reverse());
        if ab != Greater && bc != Greater {
            prop_assert!(compare_formats(&a, &c) != Greater);
        }
    }

    #[test]
    fn sort_is_ordered_and_stable(list in arb_list()) {
        let sorted = list.clone().sorted();
        prop_assert_eq!(sorted.len(), list.len());

        for pair in sorted.windows(2) {
            prop_assert!(compare_formats(&pair[0], &pair[1]) != std::cmp::Ordering::Greater);
        }

        // equal keys keep their original relative order
        let mut indexed: Vec<(usize, &Format)> = list.iter().enumerate().collect();
        indexed.sort_by(|a, b| compare_formats(a.1, b.1).then(a.0.cmp(&b.0)));
        let expected: Vec<&Format> = indexed.into_iter().map(|(_, f)| f).collect();
        prop_assert_eq!(sorted.iter().collect::<Vec<_>>(), expected);
    }
}
