//! Confidence scoring for discovered files.
//!
//! Four additive components, each capped, summed and clamped to 0-100:
//!
//! | component | max | basis                                        |
//! |-----------|-----|----------------------------------------------|
//! | header    | 40  | detected signature vs claimed MIME type      |
//! | size      | 25  | file size vs a per-type plausible minimum    |
//! | metadata  | 20  | presence of embedded metadata                |
//! | path      | 15  | well-known media folders vs cache/temp dirs  |
//!
//! The score ranks and filters candidates; it proves nothing about a file.

use crate::signature::detect;

/// Plausible minimum size for types missing from the table.
pub const DEFAULT_MIN_SIZE: u64 = 1024;

const MINIMUM_SIZES: &[(&str, u64)] = &[
    ("image/jpeg", 1024),
    ("image/png", 67),
    ("image/gif", 35),
    ("image/webp", 30),
    ("image/heic", 1024),
    ("video/mp4", 4096),
    ("video/quicktime", 4096),
    ("video/x-msvideo", 4096),
    ("video/x-matroska", 1024),
    ("video/3gpp", 1024),
    ("application/pdf", 1024),
    ("application/zip", 22),
];

/// Score how likely a file is a genuine artifact of `claimed_mime`.
pub fn score(
    header: &[u8],
    file_size: u64,
    claimed_mime: &str,
    path: &str,
    has_metadata: bool,
) -> u8 {
    let total = header_score(header, claimed_mime)
        + size_score(file_size, claimed_mime)
        + metadata_score(has_metadata, claimed_mime)
        + path_score(path);
    total.min(100)
}

/// Header component (0-40).
pub fn header_score(header: &[u8], claimed_mime: &str) -> u8 {
    if header.is_empty() {
        return 0;
    }
    let Some(found) = detect(header) else {
        return 5;
    };
    if found.mime_type == claimed_mime {
        40
    } else if top_level(found.mime_type) == top_level(claimed_mime) {
        30
    } else {
        20
    }
}

/// Size component (0-25).
pub fn size_score(file_size: u64, claimed_mime: &str) -> u8 {
    let min = minimum_size(claimed_mime);
    match file_size {
        0 => 0,
        s if s >= min.saturating_mul(10) => 25,
        s if s >= min.saturating_mul(2) => 20,
        s if s >= min => 15,
        _ => 5,
    }
}

/// Metadata component (0-20). Non-media files are not expected to carry
/// metadata, so its absence costs them less.
pub fn metadata_score(has_metadata: bool, claimed_mime: &str) -> u8 {
    let is_media = claimed_mime.starts_with("image/") || claimed_mime.starts_with("video/");
    match (has_metadata, is_media) {
        (true, true) => 20,
        (true, false) => 15,
        (false, false) => 10,
        (false, true) => 5,
    }
}

/// Location component (0-15), starting from a base of 10.
pub fn path_score(path: &str) -> u8 {
    let lower = path.replace('\\', "/").to_lowercase();
    let mut bonus: i32 = 10;

    for (segment, delta) in [
        ("/dcim/", 5),
        ("/pictures/", 5),
        ("/camera/", 5),
        ("/screenshots/", 5),
        ("/download/", 3),
        ("/.thumbnails/", -5),
        ("/cache/", -3),
    ] {
        if lower.contains(segment) {
            bonus += delta;
        }
    }
    if lower.contains("/temp/") {
        bonus -= 5;
    }
    if lower.contains("/tmp/") {
        bonus -= 5;
    }
    if has_hidden_segment(&lower) {
        bonus -= 3;
    }

    bonus.clamp(0, 15) as u8
}

/// Per-type plausible minimum size in bytes.
pub fn minimum_size(mime_type: &str) -> u64 {
    MINIMUM_SIZES
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|&(_, size)| size)
        .unwrap_or(DEFAULT_MIN_SIZE)
}

fn top_level(mime_type: &str) -> &str {
    mime_type.split('/').next().unwrap_or(mime_type)
}

/// Dot-prefixed path segments other than `.thumbnails`, which has its own penalty.
fn has_hidden_segment(lower_path: &str) -> bool {
    lower_path
        .split('/')
        .any(|s| s.starts_with('.') && !matches!(s, "." | ".." | ".thumbnails"))
}
