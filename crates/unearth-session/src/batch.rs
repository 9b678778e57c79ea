//! Category-grouped, fixed-size delivery batches.

use indexmap::IndexMap;

use unearth_core::{Category, ScannedEntry};

use crate::events::{BatchFile, FileBatch};

/// Group entries by category.
///
/// Categories appear in the order their first entry was found, and
/// entries keep their traversal order within a category.
pub fn partition_by_category(entries: Vec<ScannedEntry>) -> IndexMap<Category, Vec<ScannedEntry>> {
    let mut groups: IndexMap<Category, Vec<ScannedEntry>> = IndexMap::new();
    for entry in entries {
        groups.entry(entry.category).or_default().push(entry);
    }
    groups
}

/// Split one category's entries into batches of at most `batch_size`.
pub fn category_batches(
    category: Category,
    entries: Vec<ScannedEntry>,
    batch_size: usize,
) -> Vec<FileBatch> {
    let batch_size = batch_size.max(1);
    let mut batches: Vec<FileBatch> = Vec::with_capacity(entries.len().div_ceil(batch_size));
    let mut files: Vec<BatchFile> = Vec::with_capacity(batch_size);

    for entry in entries {
        files.push(entry.into());
        if files.len() == batch_size {
            batches.push(FileBatch {
                category,
                batch_index: batches.len(),
                files: std::mem::replace(&mut files, Vec::with_capacity(batch_size)),
            });
        }
    }
    if !files.is_empty() {
        batches.push(FileBatch {
            category,
            batch_index: batches.len(),
            files,
        });
    }
    batches
}
