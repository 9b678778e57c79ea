//! Discovered file entries and content-inspection results.

use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::category::{Category, category_for_extension, mime_for_extension};

/// One regular file discovered by the walker.
///
/// Immutable once created. The path is the unique key within a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedEntry {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// File name (last path component).
    pub name: CompactString,
    /// Size in bytes.
    pub size: u64,
    /// Lowercased extension without the dot; may be empty.
    pub extension: CompactString,
    /// Extension-derived MIME type.
    pub mime_type: CompactString,
    /// Extension-derived category.
    pub category: Category,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
}

impl ScannedEntry {
    /// Build an entry, classifying it from the file name's extension.
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: SystemTime) -> Self {
        let path = path.into();
        let name: CompactString = path
            .file_name()
            .map(|n| n.to_string_lossy().into())
            .unwrap_or_default();
        let extension = extension_of(&name);

        Self {
            mime_type: mime_for_extension(&extension).into(),
            category: category_for_extension(&extension),
            name,
            extension,
            size,
            last_modified: DateTime::<Utc>::from(modified),
            path,
        }
    }

    /// Whether the file name starts with a dot.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Lowercased text after the last dot of a file name, empty when there is none.
///
/// Hidden names keep their suffix: `.nomedia` yields `nomedia`.
fn extension_of(name: &str) -> CompactString {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase().into())
        .unwrap_or_default()
}

/// Result of inspecting a file's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureMatch {
    /// Detected MIME type.
    pub mime_type: &'static str,
    /// Canonical extension for the detected format.
    pub extension: &'static str,
    /// Category of the detected format.
    pub category: Category,
}

impl SignatureMatch {
    pub const fn new(mime_type: &'static str, extension: &'static str, category: Category) -> Self {
        Self {
            mime_type,
            extension,
            category,
        }
    }
}

/// BLAKE3 content hash used for within-scan duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}
