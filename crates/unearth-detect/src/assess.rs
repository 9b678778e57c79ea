//! One-call inspection of a candidate file.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use unearth_core::SignatureMatch;

use crate::confidence::score;
use crate::header::{EXTENDED_HEADER_LEN, MetadataProbe, read_header};
use crate::signature::detect;
use crate::source_app::detect_source_app;

/// Errors from inspecting a file on disk.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The file could not be opened or read.
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Content-based verdict for a single file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Format detected from the header, if any.
    pub signature: Option<SignatureMatch>,
    /// Confidence score (0-100).
    pub confidence: u8,
    /// A signature was found and disagrees with the claimed MIME type.
    pub mime_mismatch: bool,
    /// App the file's location suggests, if any.
    pub source_app: Option<String>,
}

/// Read a file's header and score it against its claimed MIME type.
pub fn assess(
    path: impl AsRef<Path>,
    claimed_mime: &str,
    probe: &dyn MetadataProbe,
) -> Result<Assessment, DetectError> {
    let path = path.as_ref();
    let read_err = |source| DetectError::Read {
        path: path.to_path_buf(),
        source,
    };

    let size = std::fs::metadata(path).map_err(read_err)?.len();
    let header = read_header(path, EXTENDED_HEADER_LEN).map_err(read_err)?;

    let signature = detect(&header);
    let path_str = path.to_string_lossy();
    let has_metadata = probe.has_metadata(path, claimed_mime);
    let confidence = score(&header, size, claimed_mime, &path_str, has_metadata);

    debug!(
        path = %path.display(),
        detected = signature.map(|s| s.mime_type),
        confidence,
        "assessed file"
    );

    Ok(Assessment {
        mime_mismatch: signature.is_some_and(|s| s.mime_type != claimed_mime),
        signature,
        confidence,
        source_app: detect_source_app(&path_str),
    })
}
