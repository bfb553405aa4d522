/*!
# Strata File Indexer

Incremental repository indexing built on content hashing.

## Features

- **Content-aware hashing**: streaming xxHash64 with parallel workers
- **Merkle tree**: hierarchical directory hashes for cheap change detection
- **Persistent index**: compact binary file-index format with save/load
- **Precise diffs**: added/modified/deleted/renamed between successive scans
- **Glob filtering**: include/exclude patterns with `*`, `**`, and `?`

## Example

```no_run
use strata_file_indexer::{Indexer, IndexerConfig};
use std::path::Path;

fn main() -> Result<(), strata_file_indexer::IndexerError> {
    let mut indexer = Indexer::new(IndexerConfig::default())?;
    let scan = indexer.scan(Path::new("./my-project"), None)?;

    println!(
        "scanned {} files in {:.1} ms",
        scan.total_files, scan.scan_time_ms
    );
    Ok(())
}
```
*/

mod config;
mod error;
mod glob;
pub mod hasher;
mod index;
mod indexer;
mod merkle;

pub use config::{default_exclude_patterns, IndexerConfig};
pub use error::{IndexerError, Result};
pub use glob::glob_match;
pub use index::FileIndex;
pub use indexer::{Indexer, ProgressCallback};
pub use merkle::MerkleTree;

pub use strata_code_chunker::Language;

use serde::{Deserialize, Serialize};

/// File entry in the index.
///
/// Paths use forward-slash separators regardless of platform. A
/// `content_hash` of 0 means the hash has not been computed; any other value
/// is the xxHash64 of the file bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the scan root.
    pub relative_path: String,

    /// xxHash64 of the file content, 0 when not computed.
    pub content_hash: u64,

    /// File size in bytes.
    pub size_bytes: u64,

    /// Last modification time, milliseconds since the epoch.
    pub mtime_ms: u64,

    /// Language detected from the file extension.
    pub language: Language,

    /// Whether the file content has been indexed downstream.
    pub is_indexed: bool,
}

/// Directory entry with its Merkle hash and subtree counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Path relative to the scan root.
    pub relative_path: String,

    /// Combined hash of everything under this directory.
    pub merkle_hash: u64,

    /// Number of files in the subtree.
    pub file_count: u32,

    /// Number of subdirectories in the subtree.
    pub dir_count: u32,
}

/// Kind of detected file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// A detected file change between two scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub kind: ChangeKind,

    /// Current path (the new path for renames).
    pub path: String,

    /// Previous path, populated only for renames.
    pub old_path: Option<String>,

    pub old_hash: u64,
    pub new_hash: u64,
}

/// Result of a scan operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub files: Vec<FileEntry>,
    pub directories: Vec<DirEntry>,
    pub total_size: u64,
    pub total_files: u32,
    pub total_dirs: u32,
    pub scan_time_ms: f64,
}

/// Result of a diff operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffResult {
    pub changes: Vec<FileChange>,
    pub added: u32,
    pub modified: u32,
    pub deleted: u32,
    pub renamed: u32,
    pub diff_time_ms: f64,
}
