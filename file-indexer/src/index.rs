//! Persistent file index.
//!
//! A thread-safe mapping from relative path to [`FileEntry`], paired with a
//! Merkle tree mirroring the same file set. Map and tree are one aggregate:
//! every mutator updates both under a single lock so they can never drift
//! apart.

use crate::error::{IndexerError, Result};
use crate::merkle::{ByteReader, MerkleTree};
use crate::{FileEntry, Language};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const INDEX_MAGIC: u32 = 0x4649_444E; // "FIDN"
const INDEX_VERSION: u32 = 1;

#[derive(Debug, Default)]
struct IndexInner {
    entries: HashMap<String, FileEntry>,
    merkle: MerkleTree,
}

/// Thread-safe persistent file index.
#[derive(Debug, Default)]
pub struct FileIndex {
    inner: Mutex<IndexInner>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a file entry.
    pub fn add(&self, entry: FileEntry) {
        let mut inner = self.lock();
        inner
            .merkle
            .add_file(&entry.relative_path, entry.content_hash);
        inner.entries.insert(entry.relative_path.clone(), entry);
    }

    /// Remove a file entry; unknown paths are ignored.
    pub fn remove(&self, path: &str) {
        let mut inner = self.lock();
        inner.entries.remove(path);
        inner.merkle.remove_file(path);
    }

    /// Look up an entry by relative path.
    pub fn get(&self, path: &str) -> Option<FileEntry> {
        self.lock().entries.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().entries.contains_key(path)
    }

    /// All entries, sorted by relative path.
    pub fn get_all(&self) -> Vec<FileEntry> {
        let inner = self.lock();
        let mut entries: Vec<FileEntry> = inner.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        entries
    }

    /// Entries whose detected language matches, sorted by relative path.
    pub fn get_by_language(&self, language: Language) -> Vec<FileEntry> {
        let inner = self.lock();
        let mut entries: Vec<FileEntry> = inner
            .entries
            .values()
            .filter(|e| e.language == language)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        entries
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Drop all entries and the mirrored tree.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.merkle.clear();
    }

    /// Merkle root hash over the indexed file set.
    pub fn merkle_hash(&self) -> u64 {
        self.lock().merkle.root_hash()
    }

    /// Save the index to disk in the binary `FIDN` format.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut guard = self.lock();
        let IndexInner { entries, merkle } = &mut *guard;

        let mut out = Vec::new();
        out.extend_from_slice(&INDEX_MAGIC.to_le_bytes());
        out.extend_from_slice(&INDEX_VERSION.to_le_bytes());
        out.extend_from_slice(&(entries.len() as u32).to_le_bytes());

        let mut paths: Vec<&String> = entries.keys().collect();
        paths.sort();
        for entry_path in paths {
            let entry = &entries[entry_path];
            out.extend_from_slice(&(entry.relative_path.len() as u32).to_le_bytes());
            out.extend_from_slice(entry.relative_path.as_bytes());
            out.extend_from_slice(&entry.content_hash.to_le_bytes());
            out.extend_from_slice(&entry.size_bytes.to_le_bytes());
            out.extend_from_slice(&entry.mtime_ms.to_le_bytes());
            out.push(entry.language.as_u8());
            out.push(u8::from(entry.is_indexed));
        }

        let blob = merkle.serialize();
        out.extend_from_slice(&(blob.len() as u32).to_le_bytes());
        out.extend_from_slice(&blob);

        fs::write(path, out)?;
        info!(
            "saved index with {} entries to {}",
            entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Load the index from disk.
    ///
    /// The file is parsed completely before any state is replaced, so a
    /// corrupt file leaves the existing index untouched.
    pub fn load(&self, path: &Path) -> Result<()> {
        let data = fs::read(path)?;
        let mut reader = ByteReader::new(&data);

        let magic = reader.read_u32()?;
        if magic != INDEX_MAGIC {
            return Err(IndexerError::Corrupt(format!(
                "bad index magic 0x{magic:08X}"
            )));
        }
        let version = reader.read_u32()?;
        if version != INDEX_VERSION {
            return Err(IndexerError::Corrupt(format!(
                "unsupported index version {version}"
            )));
        }

        let count = reader.read_u32()?;
        let mut entries = HashMap::with_capacity(count as usize);
        for _ in 0..count {
            let path_len = reader.read_u32()? as usize;
            let path_bytes = reader.read_bytes(path_len)?;
            let relative_path = String::from_utf8_lossy(path_bytes).into_owned();
            let content_hash = reader.read_u64()?;
            let size_bytes = reader.read_u64()?;
            let mtime_ms = reader.read_u64()?;
            let language = Language::from_u8(reader.read_u8()?);
            let is_indexed = reader.read_u8()? != 0;

            entries.insert(
                relative_path.clone(),
                FileEntry {
                    relative_path,
                    content_hash,
                    size_bytes,
                    mtime_ms,
                    language,
                    is_indexed,
                },
            );
        }

        let blob_len = reader.read_u32()? as usize;
        let blob = reader.read_bytes(blob_len)?;
        let merkle = MerkleTree::deserialize(blob)?;

        let mut inner = self.lock();
        inner.entries = entries;
        inner.merkle = merkle;
        debug!(
            "loaded index with {} entries from {}",
            inner.entries.len(),
            path.display()
        );
        Ok(())
    }
}
