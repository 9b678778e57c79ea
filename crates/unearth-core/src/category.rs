//! File categories and the static extension tables behind them.

use std::ops::{Index, IndexMut};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString, IntoEnumIterator};

/// Coarse classification bucket for a discovered file.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Application,
    Database,
    Code,
    Other,
}

impl Category {
    /// Position of this category in per-category counter arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Plural key used in completion summaries (`images`, `audio`, ...).
    pub fn summary_key(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
            Self::Audio => "audio",
            Self::Document => "documents",
            Self::Archive => "archives",
            Self::Application => "applications",
            Self::Database => "databases",
            Self::Code => "codes",
            Self::Other => "others",
        }
    }
}

/// Map a lowercased extension (without the dot) to its category.
///
/// Unknown and empty extensions map to [`Category::Other`].
pub fn category_for_extension(ext: &str) -> Category {
    match ext {
        "jpg" | "jpeg" | "png" | "webp" | "heic" | "heif" | "bmp" | "gif" | "tif" | "tiff"
        | "ico" | "raw" | "arw" | "cr2" | "nef" | "dng" | "orf" | "rw2" | "svg" | "psd"
        | "ai" | "eps" => Category::Image,

        "mp4" | "mkv" | "avi" | "mov" | "webm" | "flv" | "3gp" | "3gpp" | "m4v" | "mpg"
        | "mpeg" | "wmv" | "asf" | "ts" | "mts" | "m2ts" | "vob" | "ogv" | "rm" | "rmvb"
        | "divx" => Category::Video,

        "mp3" | "wav" | "aac" | "ogg" | "opus" | "flac" | "alac" | "m4a" | "wma" | "amr"
        | "aiff" | "mid" | "midi" | "ra" => Category::Audio,

        "pdf" | "doc" | "docx" | "dot" | "docm" | "xls" | "xlsx" | "xlsm" | "xlt" | "xltx"
        | "ppt" | "pptx" | "pptm" | "pot" | "potx" | "txt" | "rtf" | "csv" | "odt" | "ods"
        | "odp" | "md" | "markdown" | "log" | "tex" | "epub" | "mobi" | "azw" | "azw3"
        | "pages" | "numbers" | "key" => Category::Document,

        "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" | "lz" | "lzma" | "iso" | "dmg"
        | "cab" | "arj" | "z" | "deb" | "rpm" => Category::Archive,

        "apk" | "xapk" | "apkm" | "aab" | "exe" | "dll" | "so" | "bin" | "dat" | "img"
        | "vhd" | "vhdx" => Category::Application,

        "db" | "sqlite" | "sqlite3" | "bak" | "backup" | "old" | "dump" | "sql" | "realm"
        | "leveldb" => Category::Database,

        "json" | "xml" | "yaml" | "yml" | "ini" | "cfg" | "conf" | "env" | "properties"
        | "js" | "dart" | "java" | "kt" | "py" | "c" | "cpp" | "h" | "cs" | "php" | "go"
        | "rs" | "swift" => Category::Code,

        _ => Category::Other,
    }
}

/// Map a lowercased extension to a MIME type.
///
/// Unknown extensions fall back to `application/octet-stream`.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" | "heif" => "image/heic",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        "psd" => "image/vnd.adobe.photoshop",

        // Videos
        "mp4" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "flv" => "video/x-flv",
        "3gp" | "3gpp" => "video/3gpp",
        "m4v" => "video/x-m4v",
        "mpg" | "mpeg" => "video/mpeg",
        "wmv" | "asf" => "video/x-ms-wmv",
        "ts" | "mts" | "m2ts" => "video/mp2t",
        "vob" => "video/x-vob",
        "ogv" => "video/ogg",
        "rm" | "rmvb" => "video/x-pn-realvideo",
        "divx" => "video/x-divx",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "opus" => "audio/opus",
        "flac" => "audio/flac",
        "alac" | "m4a" => "audio/mp4",
        "wma" => "audio/x-ms-wma",
        "amr" => "audio/amr",
        "aiff" => "audio/aiff",
        "mid" | "midi" => "audio/midi",
        "ra" => "audio/x-realaudio",

        // Documents
        "pdf" => "application/pdf",
        "doc" | "dot" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsm" => "application/vnd.ms-excel.sheet.macroEnabled.12",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "pptm" => "application/vnd.ms-powerpoint.presentation.macroEnabled.12",
        "txt" | "log" => "text/plain",
        "rtf" => "application/rtf",
        "csv" => "text/csv",
        "odt" => "application/vnd.oasis.opendocument.text",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "odp" => "application/vnd.oasis.opendocument.presentation",
        "md" | "markdown" => "text/markdown",
        "tex" => "application/x-latex",
        "epub" => "application/epub+zip",
        "mobi" => "application/x-mobipocket-ebook",
        "azw" | "azw3" => "application/vnd.amazon.ebook",
        "pages" => "application/vnd.apple.pages",
        "numbers" => "application/vnd.apple.numbers",
        "key" => "application/vnd.apple.keynote",

        // Archives
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        "7z" => "application/x-7z-compressed",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        "bz2" => "application/x-bzip2",
        "xz" => "application/x-xz",
        "iso" => "application/x-iso9660-image",
        "dmg" => "application/x-dmg",
        "cab" => "application/vnd.ms-cab-compressed",

        // Applications
        "apk" | "xapk" => "application/vnd.android.package-archive",
        "exe" | "dll" => "application/x-msdownload",

        // Database
        "sql" => "text/x-sql",

        _ => "application/octet-stream",
    }
}

/// Per-category counters, indexed by [`Category::index`].
///
/// Serializes as a map keyed by [`Category::summary_key`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts(pub [u64; Category::COUNT]);

impl CategoryCounts {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum over all categories.
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Iterate over `(category, count)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        Category::iter().map(|c| (c, self.0[c.index()]))
    }
}

impl Index<Category> for CategoryCounts {
    type Output = u64;

    fn index(&self, category: Category) -> &u64 {
        &self.0[category.index()]
    }
}

impl IndexMut<Category> for CategoryCounts {
    fn index_mut(&mut self, category: Category) -> &mut u64 {
        &mut self.0[category.index()]
    }
}

impl Serialize for CategoryCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::COUNT))?;
        for (category, count) in self.iter() {
            map.serialize_entry(category.summary_key(), &count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_known_extensions() {
        assert_eq!(category_for_extension("jpg"), Category::Image);
        assert_eq!(category_for_extension("mkv"), Category::Video);
        assert_eq!(category_for_extension("flac"), Category::Audio);
        assert_eq!(category_for_extension("txt"), Category::Document);
        assert_eq!(category_for_extension("7z"), Category::Archive);
        assert_eq!(category_for_extension("apk"), Category::Application);
        assert_eq!(category_for_extension("sqlite"), Category::Database);
        assert_eq!(category_for_extension("rs"), Category::Code);
    }

    #[test]
    fn test_ambiguous_extensions_resolve_to_first_table() {
        // `rm` is listed for both video and audio, `ts` for video and code.
        assert_eq!(category_for_extension("rm"), Category::Video);
        assert_eq!(mime_for_extension("rm"), "video/x-pn-realvideo");
        assert_eq!(category_for_extension("ts"), Category::Video);
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(category_for_extension("xyz123"), Category::Other);
        assert_eq!(category_for_extension(""), Category::Other);
        assert_eq!(mime_for_extension("xyz123"), "application/octet-stream");
    }

    #[test]
    fn test_category_strings() {
        assert_eq!(Category::Image.to_string(), "image");
        assert_eq!(Category::from_str("database").unwrap(), Category::Database);
        assert_eq!(Category::Code.summary_key(), "codes");
    }

    #[test]
    fn test_counts_index_and_total() {
        let mut counts = CategoryCounts::new();
        counts[Category::Image] += 2;
        counts[Category::Other] += 1;
        assert_eq!(counts[Category::Image], 2);
        assert_eq!(counts.total(), 3);
    }
}
