//! Repository scanner and diff engine.

use crate::config::IndexerConfig;
use crate::error::{IndexerError, Result};
use crate::glob::GlobList;
use crate::hasher;
use crate::index::FileIndex;
use crate::merkle::MerkleTree;
use crate::{ChangeKind, DiffResult, DirEntry, FileChange, FileEntry, Language, ScanResult};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use walkdir::WalkDir;

/// Callback for progress reporting, invoked every 100 files and once at
/// completion with `(processed, total, current_path)`.
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;

/// How often the progress callback fires during entry building.
const PROGRESS_INTERVAL: usize = 100;

/// Repository scanner with include/exclude filtering, parallel content
/// hashing, and rename-aware diffing.
pub struct Indexer {
    config: IndexerConfig,
    includes: GlobList,
    excludes: GlobList,
    merkle: MerkleTree,
}

impl Indexer {
    /// Create an indexer; an empty exclude list installs the defaults.
    pub fn new(mut config: IndexerConfig) -> Result<Self> {
        if config.exclude_patterns.is_empty() {
            config.exclude_patterns = crate::config::default_exclude_patterns();
        }

        let includes = GlobList::compile(&config.include_patterns)?;
        let excludes = GlobList::compile(&config.exclude_patterns)?;

        Ok(Self {
            config,
            includes,
            excludes,
            merkle: MerkleTree::new(),
        })
    }

    /// Replace the configuration, recompiling glob patterns.
    pub fn set_config(&mut self, config: IndexerConfig) -> Result<()> {
        let rebuilt = Indexer::new(config)?;
        self.config = rebuilt.config;
        self.includes = rebuilt.includes;
        self.excludes = rebuilt.excludes;
        Ok(())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Merkle tree built by the most recent scan.
    pub fn merkle_tree(&mut self) -> &mut MerkleTree {
        &mut self.merkle
    }

    /// Walk `root`, filter paths, hash contents, and rebuild the Merkle tree.
    pub fn scan(&mut self, root: &Path, progress: Option<ProgressCallback>) -> Result<ScanResult> {
        let started = Instant::now();

        if !root.is_dir() {
            return Err(IndexerError::InvalidDirectory(root.display().to_string()));
        }

        info!("scanning {}", root.display());

        struct FileRecord {
            abs_path: PathBuf,
            rel_path: String,
            size: u64,
            mtime_ms: u64,
        }

        let mut files: Vec<FileRecord> = Vec::new();
        let mut dir_paths: Vec<String> = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .min_depth(1);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };

            let rel_path = match entry.path().strip_prefix(root) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };

            if self.excludes.matches(&rel_path) {
                continue;
            }

            if entry.file_type().is_dir() {
                dir_paths.push(rel_path);
            } else if entry.file_type().is_file() {
                if !self.includes.is_empty() && !self.includes.matches(&rel_path) {
                    continue;
                }

                let (size, mtime_ms) = match entry.metadata() {
                    Ok(metadata) => (metadata.len(), mtime_millis(&metadata)),
                    Err(_) => (0, 0),
                };
                if size > self.config.max_file_size {
                    debug!("skipping oversized file {rel_path} ({size} bytes)");
                    continue;
                }

                files.push(FileRecord {
                    abs_path: entry.into_path(),
                    rel_path,
                    size,
                    mtime_ms,
                });
            }
        }

        debug!("collected {} files, {} dirs", files.len(), dir_paths.len());

        let hashes = if self.config.compute_content_hash {
            let paths: Vec<PathBuf> = files.iter().map(|f| f.abs_path.clone()).collect();
            hasher::hash_files(&paths, self.config.parallel_workers)
        } else {
            vec![0; files.len()]
        };

        let mut result = ScanResult {
            total_files: files.len() as u32,
            total_dirs: dir_paths.len() as u32,
            ..Default::default()
        };

        self.merkle.clear();

        for (i, (record, hash)) in files.into_iter().zip(hashes).enumerate() {
            self.merkle.add_file(&record.rel_path, hash);

            if let Some(callback) = &progress {
                if i % PROGRESS_INTERVAL == 0 {
                    callback(i, result.total_files as usize, &record.rel_path);
                }
            }

            result.total_size += record.size;
            result.files.push(FileEntry {
                language: Language::from_path(Path::new(&record.rel_path)),
                relative_path: record.rel_path,
                content_hash: hash,
                size_bytes: record.size,
                mtime_ms: record.mtime_ms,
                is_indexed: false,
            });
        }

        for rel_path in &dir_paths {
            let merkle_hash = self.merkle.compute_hash(rel_path);
            let subtree_prefix = format!("{rel_path}/");
            let file_count = result
                .files
                .iter()
                .filter(|f| f.relative_path.starts_with(&subtree_prefix))
                .count() as u32;
            let dir_count = dir_paths
                .iter()
                .filter(|d| d.starts_with(&subtree_prefix))
                .count() as u32;

            result.directories.push(DirEntry {
                relative_path: rel_path.clone(),
                merkle_hash,
                file_count,
                dir_count,
            });
        }

        result.scan_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        if let Some(callback) = &progress {
            callback(result.total_files as usize, result.total_files as usize, "");
        }

        info!(
            "scanned {} files, {} dirs in {:.1} ms",
            result.total_files, result.total_dirs, result.scan_time_ms
        );

        Ok(result)
    }

    /// Compute file-level changes between two file lists.
    pub fn diff(&self, old_files: &[FileEntry], new_files: &[FileEntry]) -> DiffResult {
        let started = Instant::now();
        let mut result = DiffResult::default();

        let old_by_path: HashMap<&str, &FileEntry> = old_files
            .iter()
            .map(|e| (e.relative_path.as_str(), e))
            .collect();
        let new_by_path: HashMap<&str, &FileEntry> = new_files
            .iter()
            .map(|e| (e.relative_path.as_str(), e))
            .collect();

        let mut renamed_old: HashSet<&str> = HashSet::new();
        let mut renamed_new: HashSet<&str> = HashSet::new();

        if self.config.detect_renames {
            // Candidate targets are new-only paths, queued per hash in input
            // order; each side is consumed at most once.
            let mut candidates: HashMap<u64, VecDeque<&FileEntry>> = HashMap::new();
            for entry in new_files {
                if entry.content_hash != 0
                    && !old_by_path.contains_key(entry.relative_path.as_str())
                {
                    candidates
                        .entry(entry.content_hash)
                        .or_default()
                        .push_back(entry);
                }
            }

            for old_entry in old_files {
                if old_entry.content_hash == 0
                    || new_by_path.contains_key(old_entry.relative_path.as_str())
                {
                    continue;
                }
                let Some(queue) = candidates.get_mut(&old_entry.content_hash) else {
                    continue;
                };
                let Some(new_entry) = queue.pop_front() else {
                    continue;
                };

                renamed_old.insert(&old_entry.relative_path);
                renamed_new.insert(&new_entry.relative_path);
                result.changes.push(FileChange {
                    kind: ChangeKind::Renamed,
                    path: new_entry.relative_path.clone(),
                    old_path: Some(old_entry.relative_path.clone()),
                    old_hash: old_entry.content_hash,
                    new_hash: new_entry.content_hash,
                });
                result.renamed += 1;
            }
        }

        for new_entry in new_files {
            if renamed_new.contains(new_entry.relative_path.as_str()) {
                continue;
            }
            match old_by_path.get(new_entry.relative_path.as_str()) {
                None => {
                    result.changes.push(FileChange {
                        kind: ChangeKind::Added,
                        path: new_entry.relative_path.clone(),
                        old_path: None,
                        old_hash: 0,
                        new_hash: new_entry.content_hash,
                    });
                    result.added += 1;
                }
                Some(old_entry) if old_entry.content_hash != new_entry.content_hash => {
                    result.changes.push(FileChange {
                        kind: ChangeKind::Modified,
                        path: new_entry.relative_path.clone(),
                        old_path: None,
                        old_hash: old_entry.content_hash,
                        new_hash: new_entry.content_hash,
                    });
                    result.modified += 1;
                }
                Some(_) => {}
            }
        }

        for old_entry in old_files {
            if renamed_old.contains(old_entry.relative_path.as_str()) {
                continue;
            }
            if !new_by_path.contains_key(old_entry.relative_path.as_str()) {
                result.changes.push(FileChange {
                    kind: ChangeKind::Deleted,
                    path: old_entry.relative_path.clone(),
                    old_path: None,
                    old_hash: old_entry.content_hash,
                    new_hash: 0,
                });
                result.deleted += 1;
            }
        }

        result.diff_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        result
    }

    /// Scan `root` and diff it against a previously built index.
    pub fn incremental_update(
        &mut self,
        root: &Path,
        previous_index: &FileIndex,
    ) -> Result<DiffResult> {
        let scan = self.scan(root, None)?;
        let old_files = previous_index.get_all();
        Ok(self.diff(&old_files, &scan.files))
    }
}

fn mtime_millis(metadata: &std::fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|mtime| mtime.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
