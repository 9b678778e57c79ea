//! Core types and classification tables for unearth.
//!
//! This crate provides the data model shared by the walker, the content
//! detector and the scan coordinator: discovered entries, the closed
//! category set, extension-derived MIME lookup and scan configuration.

mod category;
mod config;
mod entry;
mod error;

pub use category::{Category, CategoryCounts, category_for_extension, mime_for_extension};
pub use config::{
    ConfigError, DEFAULT_MAX_DEPTH, DEFAULT_ROOTS, DEFAULT_SKIP_DIRS, ScanConfig,
    ScanConfigBuilder,
};
pub use entry::{ContentHash, ScannedEntry, SignatureMatch};
pub use error::{ScanError, ScanWarning, WarningKind};
