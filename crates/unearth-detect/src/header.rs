//! Reading file headers and probing for embedded metadata.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Header length sufficient for plain magic-byte detection.
pub const DETECT_HEADER_LEN: usize = 32;

/// Header length used when container subtypes (ZIP, OLE) must be resolved.
pub const EXTENDED_HEADER_LEN: usize = 4096;

/// Read at most `len` bytes from the start of a file.
///
/// Short files yield a shorter buffer; empty files yield an empty one.
pub fn read_header(path: impl AsRef<Path>, len: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(len);
    file.take(len as u64).read_to_end(&mut header)?;
    Ok(header)
}

/// Answers whether a file carries extractable image/video metadata.
///
/// This stands in for an EXIF or media-metadata library; the answer only
/// feeds the metadata component of the confidence score.
pub trait MetadataProbe {
    fn has_metadata(&self, path: &Path, mime_type: &str) -> bool;
}

/// Probe that never finds metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataProbe for NoMetadata {
    fn has_metadata(&self, _path: &Path, _mime_type: &str) -> bool {
        false
    }
}

impl<F> MetadataProbe for F
where
    F: Fn(&Path, &str) -> bool,
{
    fn has_metadata(&self, path: &Path, mime_type: &str) -> bool {
        self(path, mime_type)
    }
}
