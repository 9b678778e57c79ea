//! Content hashing for within-scan duplicate detection.
//!
//! Two entries are treated as the same content when their sizes match and
//! the BLAKE3 hash of their leading bytes matches. Grouping by size first
//! means most files are never opened.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use blake3::Hasher;
use rayon::prelude::*;
use tracing::debug;

use unearth_core::{ContentHash, ScannedEntry};

/// Hash the first `bytes` bytes of a file. Returns `None` if it cannot be read.
pub fn partial_hash(path: impl AsRef<Path>, bytes: usize) -> Option<ContentHash> {
    let file = File::open(path.as_ref()).ok()?;
    let mut buf = Vec::with_capacity(bytes);
    file.take(bytes as u64).read_to_end(&mut buf).ok()?;

    let mut hasher = Hasher::new();
    hasher.update(&buf);
    Some(ContentHash::new(*hasher.finalize().as_bytes()))
}

/// Hash a whole file, memory-mapped on the rayon pool where possible.
pub fn full_hash(path: impl AsRef<Path>) -> Option<ContentHash> {
    let mut hasher = Hasher::new();
    hasher.update_mmap_rayon(path.as_ref()).ok()?;
    Some(ContentHash::new(*hasher.finalize().as_bytes()))
}

/// Drop entries whose content matches an earlier entry.
///
/// Entries are compared by size, then by partial hash. Files longer than
/// `partial_bytes` whose partial hashes collide are confirmed with a full
/// hash. The first occurrence (in input order) is kept. Files that cannot
/// be read are never treated as duplicates. Returns the surviving entries
/// and the number removed.
pub fn dedupe_by_content(
    entries: Vec<ScannedEntry>,
    partial_bytes: usize,
) -> (Vec<ScannedEntry>, usize) {
    let mut by_size: HashMap<u64, Vec<usize>> = HashMap::new();
    for (idx, entry) in entries.iter().enumerate() {
        by_size.entry(entry.size).or_default().push(idx);
    }

    // Only size groups with 2+ members can hold duplicates.
    let candidates: Vec<usize> = by_size
        .into_values()
        .filter(|group| group.len() > 1)
        .flatten()
        .collect();

    let partial: HashMap<usize, ContentHash> = candidates
        .par_iter()
        .filter_map(|&idx| partial_hash(&entries[idx].path, partial_bytes).map(|h| (idx, h)))
        .collect();

    let mut collisions: HashMap<(u64, ContentHash), Vec<usize>> = HashMap::new();
    for (&idx, &hash) in &partial {
        collisions.entry((entries[idx].size, hash)).or_default().push(idx);
    }

    // A partial hash covers the whole file when the file fits the window.
    let needs_full: HashSet<usize> = collisions
        .into_values()
        .filter(|group| group.len() > 1)
        .flatten()
        .filter(|&idx| entries[idx].size > partial_bytes as u64)
        .collect();
    let full: HashMap<usize, ContentHash> = needs_full
        .par_iter()
        .filter_map(|&idx| full_hash(&entries[idx].path).map(|h| (idx, h)))
        .collect();

    let mut seen: HashSet<(u64, ContentHash, Option<ContentHash>)> = HashSet::new();
    let mut kept = Vec::with_capacity(entries.len());
    let mut removed = 0;

    for (idx, entry) in entries.into_iter().enumerate() {
        let Some(&hash) = partial.get(&idx) else {
            kept.push(entry);
            continue;
        };
        let full_hash = full.get(&idx).copied();
        // A colliding file whose full hash could not be read stays.
        if full_hash.is_none() && needs_full.contains(&idx) {
            kept.push(entry);
            continue;
        }
        if !seen.insert((entry.size, hash, full_hash)) {
            debug!(path = %entry.path.display(), "dropping duplicate content");
            removed += 1;
            continue;
        }
        kept.push(entry);
    }

    (kept, removed)
}
