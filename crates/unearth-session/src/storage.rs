//! Capacity of the volume holding a path.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sysinfo::Disks;

use unearth_core::DEFAULT_ROOTS;

/// Space on one mounted volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub mount_point: PathBuf,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

/// Report the volume whose mount point is the longest prefix of `path`.
///
/// Returns `None` when no mounted volume contains the path.
pub fn storage_info(path: impl AsRef<Path>) -> Option<StorageInfo> {
    let path = path.as_ref();
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let disks = Disks::new_with_refreshed_list();

    disks
        .list()
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| {
            let total_bytes = disk.total_space();
            let free_bytes = disk.available_space();
            StorageInfo {
                mount_point: disk.mount_point().to_path_buf(),
                total_bytes,
                used_bytes: total_bytes.saturating_sub(free_bytes),
                free_bytes,
            }
        })
}

/// The first default root present on this machine, else `/`.
pub fn primary_storage_path() -> PathBuf {
    DEFAULT_ROOTS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_dir())
        .unwrap_or_else(|| PathBuf::from("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_storage_path_exists() {
        assert!(primary_storage_path().is_dir());
    }

    #[test]
    fn test_storage_info_is_consistent() {
        // Containers may expose no disks at all.
        if let Some(info) = storage_info(std::env::temp_dir()) {
            assert_eq!(info.used_bytes + info.free_bytes, info.total_bytes);
            assert!(std::env::temp_dir()
                .canonicalize()
                .unwrap()
                .starts_with(&info.mount_point));
        }
    }
}
