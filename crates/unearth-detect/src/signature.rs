//! Magic-byte signature detection.
//!
//! Signatures are tested in a fixed order and the first match wins. Container
//! formats (ISO-BMFF, RIFF, ZIP, OLE) share a prefix across several file
//! types, so their branches look further into the header to pick a subtype.

use unearth_core::{Category, SignatureMatch};

// Images
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const GIF87A: &[u8] = b"GIF87a";
const GIF89A: &[u8] = b"GIF89a";
const BMP: &[u8] = b"BM";
const TIFF_LE: &[u8] = &[0x49, 0x49, 0x2A, 0x00];
const TIFF_BE: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A];
const ICO: &[u8] = &[0x00, 0x00, 0x01, 0x00];

// Containers
const RIFF: &[u8] = b"RIFF";
const FTYP: &[u8] = b"ftyp";
const ZIP: &[u8] = &[b'P', b'K', 0x03, 0x04];
const ZIP_EMPTY: &[u8] = &[b'P', b'K', 0x05, 0x06];
const OLE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

// Video
const MATROSKA: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3];
const FLV: &[u8] = b"FLV";

// Documents and archives
const PDF: &[u8] = b"%PDF";
const RAR: &[u8] = &[b'R', b'a', b'r', b'!', 0x1A, 0x07];
const SEVEN_ZIP: &[u8] = &[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C];

// Audio
const ID3: &[u8] = b"ID3";
const MP3_SYNC: &[u8] = &[0xFF, 0xFB];
const FLAC: &[u8] = b"fLaC";
const OGG: &[u8] = b"OggS";

/// Minimum header length before ZIP entry names are probed.
const ZIP_PROBE_MIN: usize = 100;

/// OLE directory entries are only probed when this many bytes are present.
const OLE_PROBE_MIN: usize = 2080;

/// Start of the OLE marker window (first directory sector).
const OLE_WINDOW_START: usize = 512;

/// Identify a file format from its leading bytes.
///
/// About 32 bytes are enough for most formats. ZIP and OLE subtypes need a
/// longer header (see [`crate::EXTENDED_HEADER_LEN`]); with a short header
/// they fall back to the generic container type. Returns `None` when no
/// signature matches.
pub fn detect(header: &[u8]) -> Option<SignatureMatch> {
    if header.is_empty() {
        return None;
    }

    detect_image(header)
        .or_else(|| detect_iso_bmff(header))
        .or_else(|| detect_riff(header, b"AVI ", AVI))
        .or_else(|| detect_video(header))
        .or_else(|| detect_document(header))
        .or_else(|| detect_audio(header))
}

const AVI: SignatureMatch = SignatureMatch::new("video/x-msvideo", "avi", Category::Video);
const WEBP: SignatureMatch = SignatureMatch::new("image/webp", "webp", Category::Image);
const WAV: SignatureMatch = SignatureMatch::new("audio/wav", "wav", Category::Audio);

fn detect_image(header: &[u8]) -> Option<SignatureMatch> {
    let found = if starts_with(header, JPEG) {
        SignatureMatch::new("image/jpeg", "jpg", Category::Image)
    } else if starts_with(header, PNG) {
        SignatureMatch::new("image/png", "png", Category::Image)
    } else if starts_with(header, GIF87A) || starts_with(header, GIF89A) {
        SignatureMatch::new("image/gif", "gif", Category::Image)
    } else if starts_with(header, BMP) {
        SignatureMatch::new("image/bmp", "bmp", Category::Image)
    } else if starts_with(header, TIFF_LE) || starts_with(header, TIFF_BE) {
        SignatureMatch::new("image/tiff", "tiff", Category::Image)
    } else if starts_with(header, ICO) {
        SignatureMatch::new("image/x-icon", "ico", Category::Image)
    } else {
        return detect_riff(header, b"WEBP", WEBP);
    };
    Some(found)
}

/// `RIFF....XXXX` containers, where `XXXX` at offset 8 names the payload.
fn detect_riff(header: &[u8], form: &[u8; 4], found: SignatureMatch) -> Option<SignatureMatch> {
    (starts_with(header, RIFF) && matches_at(header, form, 8)).then_some(found)
}

/// ISO base media files: a `ftyp` box at offset 4 followed by a major brand.
fn detect_iso_bmff(header: &[u8]) -> Option<SignatureMatch> {
    if header.len() < 12 || !matches_at(header, FTYP, 4) {
        return None;
    }

    let brand = String::from_utf8_lossy(&header[8..12]).to_ascii_lowercase();
    let has = |needle: &str| brand.contains(needle);

    let found = if has("heic") || has("heif") || has("mif1") {
        SignatureMatch::new("image/heic", "heic", Category::Image)
    } else if has("isom") || has("mp4") || has("m4v") || has("avc") {
        SignatureMatch::new("video/mp4", "mp4", Category::Video)
    } else if has("qt") {
        SignatureMatch::new("video/quicktime", "mov", Category::Video)
    } else if has("3gp") || has("3g2") {
        SignatureMatch::new("video/3gpp", "3gp", Category::Video)
    } else {
        // Unlisted brands are treated as MP4.
        SignatureMatch::new("video/mp4", "mp4", Category::Video)
    };
    Some(found)
}

fn detect_video(header: &[u8]) -> Option<SignatureMatch> {
    if starts_with(header, MATROSKA) {
        Some(SignatureMatch::new("video/x-matroska", "mkv", Category::Video))
    } else if starts_with(header, FLV) {
        Some(SignatureMatch::new("video/x-flv", "flv", Category::Video))
    } else {
        None
    }
}

fn detect_document(header: &[u8]) -> Option<SignatureMatch> {
    if starts_with(header, PDF) {
        return Some(SignatureMatch::new("application/pdf", "pdf", Category::Document));
    }
    if starts_with(header, OLE) {
        return Some(detect_ole(header));
    }
    if starts_with(header, ZIP) || starts_with(header, ZIP_EMPTY) {
        return Some(detect_zip(header));
    }
    if starts_with(header, RAR) {
        return Some(SignatureMatch::new("application/x-rar-compressed", "rar", Category::Archive));
    }
    if starts_with(header, SEVEN_ZIP) {
        return Some(SignatureMatch::new("application/x-7z-compressed", "7z", Category::Archive));
    }
    None
}

/// Legacy Office compound files. Stream names live in the directory
/// sector, stored as UTF-16LE; plain ASCII occurrences are accepted too.
fn detect_ole(header: &[u8]) -> SignatureMatch {
    if header.len() >= OLE_PROBE_MIN {
        let window = &header[OLE_WINDOW_START..];
        let has = |marker: &str| contains_marker(window, marker);

        if has("Mirrorled Database") {
            return SignatureMatch::new("application/x-mdb", "mdb", Category::Database);
        }
        if has("WordDocument") {
            return SignatureMatch::new("application/msword", "doc", Category::Document);
        }
        if has("Workbook") {
            return SignatureMatch::new("application/vnd.ms-excel", "xls", Category::Document);
        }
        if has("PowerPoint") {
            return SignatureMatch::new("application/vnd.ms-powerpoint", "ppt", Category::Document);
        }
    }
    SignatureMatch::new("application/octet-stream", "ole", Category::Document)
}

/// ZIP-based formats, told apart by entry names near the start of the archive.
fn detect_zip(header: &[u8]) -> SignatureMatch {
    if header.len() >= ZIP_PROBE_MIN {
        let has = |needle: &[u8]| contains(header, needle);

        if has(b"word/") || has(b"_rels/") {
            return SignatureMatch::new(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "docx",
                Category::Document,
            );
        }
        if has(b"xl/") || has(b"worksheets/") {
            return SignatureMatch::new(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "xlsx",
                Category::Document,
            );
        }
        if has(b"ppt/") || has(b"slides/") {
            return SignatureMatch::new(
                "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                "pptx",
                Category::Document,
            );
        }
        if has(b"META-INF") || has(b"content.xml") {
            return SignatureMatch::new(
                "application/vnd.oasis.opendocument.text",
                "odt",
                Category::Document,
            );
        }
    }
    SignatureMatch::new("application/zip", "zip", Category::Archive)
}

fn detect_audio(header: &[u8]) -> Option<SignatureMatch> {
    if starts_with(header, ID3) || starts_with(header, MP3_SYNC) {
        return Some(SignatureMatch::new("audio/mpeg", "mp3", Category::Audio));
    }
    if let Some(found) = detect_riff(header, b"WAVE", WAV) {
        return Some(found);
    }
    if starts_with(header, FLAC) {
        return Some(SignatureMatch::new("audio/flac", "flac", Category::Audio));
    }
    if starts_with(header, OGG) {
        return Some(SignatureMatch::new("audio/ogg", "ogg", Category::Audio));
    }
    None
}

fn starts_with(data: &[u8], signature: &[u8]) -> bool {
    matches_at(data, signature, 0)
}

fn matches_at(data: &[u8], signature: &[u8], offset: usize) -> bool {
    data.get(offset..offset + signature.len()) == Some(signature)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Case-insensitive search for an ASCII marker in either ASCII or UTF-16LE form.
fn contains_marker(haystack: &[u8], marker: &str) -> bool {
    let ascii = marker.as_bytes();
    let wide: Vec<u8> = ascii.iter().flat_map(|&b| [b, 0]).collect();

    [ascii, wide.as_slice()].into_iter().any(|needle| {
        haystack
            .windows(needle.len())
            .any(|w| w.eq_ignore_ascii_case(needle))
    })
}
