//! Scan configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory nesting limit below each root.
pub const DEFAULT_MAX_DEPTH: u32 = 20;

/// Directory names never descended into. Hidden dot-directories are not
/// listed here: recoverable data often lives in hidden app folders.
pub const DEFAULT_SKIP_DIRS: &[&str] =
    &["system32", "windows", "proc", "sys", "dev", "boot", ".git"];

/// Storage locations scanned when no roots are configured.
///
/// Locations that do not exist on the current machine are excluded at
/// scan time, so the list may be generous.
pub const DEFAULT_ROOTS: &[&str] = &[
    // Primary internal storage
    "/storage/emulated/0",
    "/storage/self/primary",
    "/sdcard",
    // Standard media folders
    "/storage/emulated/0/Download",
    "/storage/emulated/0/Documents",
    "/storage/emulated/0/DCIM",
    "/storage/emulated/0/Pictures",
    "/storage/emulated/0/Movies",
    "/storage/emulated/0/Music",
    "/storage/emulated/0/Recordings",
    // Hidden thumbnail and cache folders
    "/storage/emulated/0/.thumbnails",
    "/storage/emulated/0/.cache",
    "/storage/emulated/0/.trash",
    // Messaging app media
    "/storage/emulated/0/WhatsApp/Media",
    "/storage/emulated/0/Android/media/com.whatsapp",
    "/storage/emulated/0/Telegram",
    "/storage/emulated/0/Android/media/org.telegram.messenger",
    "/storage/emulated/0/Android/media",
    // External cards
    "/storage/extSdCard",
    "/storage/external_SD",
    "/storage/sdcard1",
];

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`ScanConfig`].
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value failed validation.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Configuration for one scan.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct ScanConfig {
    /// Root directories to scan (empty = [`DEFAULT_ROOTS`]).
    #[builder(default)]
    pub roots: Vec<PathBuf>,

    /// Deepest directory level read below a root (the root is level 0).
    #[builder(default = "DEFAULT_MAX_DEPTH")]
    pub max_depth: u32,

    /// Directory base names to skip, compared case-insensitively.
    #[builder(default = "default_skip_dirs()")]
    pub skip_dirs: Vec<String>,

    /// Descend through symbolic links.
    #[builder(default = "true")]
    pub follow_symlinks: bool,

    /// Report progress after this many files.
    #[builder(default = "200")]
    pub progress_every_files: u64,

    /// Report progress after this many bytes since the last report.
    #[builder(default = "5 * 1024 * 1024")]
    pub progress_every_bytes: u64,

    /// Entries per delivered file batch.
    #[builder(default = "50")]
    pub batch_size: usize,

    /// Pause between delivered batches, in milliseconds.
    #[builder(default = "10")]
    pub batch_delay_ms: u64,

    /// Capacity of the internal progress channel.
    #[builder(default = "256")]
    pub event_buffer: usize,

    /// Drop entries whose size and leading-bytes hash match an earlier entry.
    #[builder(default = "false")]
    pub dedupe_content: bool,

    /// Number of leading bytes hashed for content dedup.
    #[builder(default = "4096")]
    pub partial_hash_bytes: usize,
}

fn default_skip_dirs() -> Vec<String> {
    DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect()
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_depth == Some(0) {
            return Err("max_depth must be at least 1".to_string());
        }
        if self.batch_size == Some(0) {
            return Err("batch_size must be at least 1".to_string());
        }
        if self.progress_every_files == Some(0) {
            return Err("progress_every_files must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config scanning the given roots with default policy.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.check()?;
        Ok(config)
    }

    /// Load a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Roots to scan, falling back to [`DEFAULT_ROOTS`] when none are set.
    pub fn effective_roots(&self) -> Vec<PathBuf> {
        if self.roots.is_empty() {
            DEFAULT_ROOTS.iter().map(PathBuf::from).collect()
        } else {
            self.roots.clone()
        }
    }

    /// Check if a directory with this base name should not be entered.
    pub fn should_skip_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|s| s.eq_ignore_ascii_case(name))
    }

    fn check(&self) -> Result<(), ConfigError> {
        let message = if self.max_depth == 0 {
            "max_depth must be at least 1"
        } else if self.batch_size == 0 {
            "batch_size must be at least 1"
        } else if self.progress_every_files == 0 {
            "progress_every_files must be at least 1"
        } else {
            return Ok(());
        };
        Err(ConfigError::Invalid {
            message: message.to_string(),
        })
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            skip_dirs: default_skip_dirs(),
            follow_symlinks: true,
            progress_every_files: 200,
            progress_every_bytes: 5 * 1024 * 1024,
            batch_size: 50,
            batch_delay_ms: 10,
            event_buffer: 256,
            dedupe_content: false,
            partial_hash_bytes: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .roots(vec![PathBuf::from("/data")])
            .max_depth(5u32)
            .batch_size(10usize)
            .build()
            .unwrap();

        assert_eq!(config.roots, vec![PathBuf::from("/data")]);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.progress_every_files, 200);
        assert!(config.follow_symlinks);
    }

    #[test]
    fn test_builder_rejects_zero_depth() {
        let result = ScanConfig::builder().max_depth(0u32).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_effective_roots_fall_back_to_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.effective_roots().len(), DEFAULT_ROOTS.len());

        let config = ScanConfig::new(["/mnt/card"]);
        assert_eq!(config.effective_roots(), vec![PathBuf::from("/mnt/card")]);
    }

    #[test]
    fn test_should_skip_dir() {
        let config = ScanConfig::default();
        assert!(config.should_skip_dir("proc"));
        assert!(config.should_skip_dir("System32"));
        assert!(config.should_skip_dir(".git"));
        assert!(!config.should_skip_dir(".thumbnails"));
        assert!(!config.should_skip_dir("DCIM"));
    }

    #[test]
    fn test_toml_partial_config() {
        let config = ScanConfig::from_toml_str(
            r#"
            roots = ["/mnt/a", "/mnt/b"]
            max_depth = 4
            dedupe_content = true
            "#,
        )
        .unwrap();

        assert_eq!(config.roots.len(), 2);
        assert_eq!(config.max_depth, 4);
        assert!(config.dedupe_content);
        assert_eq!(config.batch_size, 50);
    }

    #[test]
    fn test_toml_rejects_invalid_values() {
        let err = ScanConfig::from_toml_str("batch_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = ScanConfig::from_toml_str("max_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
