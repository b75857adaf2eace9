//! Output file naming

/// Sanitizes a video title into a file name.
///
/// Removes path traversal sequences, characters that are invalid on common
/// filesystems, and leading/trailing dots. Length is capped at 200 bytes on a
/// char boundary.
///
/// # Examples
/// ```
/// use tubefetch::utils::filename::sanitize_filename;
/// assert_eq!(sanitize_filename("../../etc/passwd"), "_etc_passwd");
/// assert_eq!(sanitize_filename("What? A: Title"), "What_ A_ Title");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

    let mut sanitized: String = name
        .replace("..", "")
        .chars()
        .map(|c| {
            if invalid_chars.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    sanitized = sanitized
        .trim()
        .trim_start_matches('.')
        .trim_end_matches('.')
        .trim_end()
        .to_string();

    while sanitized.contains("__") {
        sanitized = sanitized.replace("__", "_");
    }

    if sanitized.is_empty() {
        return "unnamed_video".to_string();
    }

    if sanitized.len() > 200 {
        let mut cut = 200;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
    }

    sanitized
}

/// File extension (with leading dot) for a stream MIME type
pub fn pick_ideal_file_extension(mime_type: &str) -> &'static str {
    let media_type = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match media_type.as_str() {
        "video/mp4" => ".mp4",
        "audio/mp4" => ".m4a",
        "video/webm" => ".webm",
        "audio/webm" => ".weba",
        "video/3gpp" => ".3gp",
        _ => ".mov",
    }
}
