//! Content-based file type detection for unearth.
//!
//! File extensions lie; leading bytes rarely do. This crate inspects a
//! file's header to find its real format and scores how likely it is that
//! a discovered file is a genuine, recoverable artifact of its claimed type.
//!
//! - **Signature detection** - ordered magic-byte tests with container
//!   disambiguation for ISO-BMFF, RIFF, ZIP and OLE files
//! - **Confidence scoring** - header, size, metadata and location
//!   heuristics combined into a 0-100 score
//! - **Partial hashing** - BLAKE3 over leading bytes for within-scan dedup
//!
//! Detection and scoring are pure functions of their inputs. Only
//! [`read_header`], [`assess`] and the hashing helpers touch the filesystem.
//!
//! ```rust
//! use unearth_detect::{detect, score};
//!
//! let header = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
//! let found = detect(&header).unwrap();
//! assert_eq!(found.mime_type, "image/jpeg");
//!
//! let confidence = score(&header, 50_000, "image/jpeg", "/sdcard/DCIM/Camera/a.jpg", true);
//! assert_eq!(confidence, 100);
//! ```

mod assess;
mod confidence;
mod hash;
mod header;
mod signature;
mod source_app;

pub use assess::{Assessment, DetectError, assess};
pub use confidence::{
    DEFAULT_MIN_SIZE, header_score, metadata_score, minimum_size, path_score, score, size_score,
};
pub use hash::{dedupe_by_content, full_hash, partial_hash};
pub use header::{
    DETECT_HEADER_LEN, EXTENDED_HEADER_LEN, MetadataProbe, NoMetadata, read_header,
};
pub use signature::detect;
pub use source_app::detect_source_app;

pub use unearth_core::SignatureMatch;
