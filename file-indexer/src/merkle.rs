//! Merkle tree over the scanned directory structure.
//!
//! Leaves carry file content hashes; each directory node carries a
//! deterministic left-fold combination of its children's hashes taken in
//! sorted name order. The empty directory hashes to 0.

use crate::error::{IndexerError, Result};
use std::collections::BTreeMap;

const MERKLE_MAGIC: u32 = 0x4D52_4B4C; // "MRKL"
const MERKLE_VERSION: u32 = 1;

const COMBINE_PRIME: u64 = 0x9E37_79B1_85EB_CA87;

/// Order-dependent hash combination used to fold children into a directory
/// hash.
fn combine(h1: u64, h2: u64) -> u64 {
    h1 ^ h2
        .wrapping_add(COMBINE_PRIME)
        .wrapping_add(h1 << 6)
        .wrapping_add(h1 >> 2)
}

#[derive(Debug, Clone)]
struct MerkleNode {
    name: String,
    hash: u64,
    is_file: bool,
    children: BTreeMap<String, MerkleNode>,
}

impl MerkleNode {
    fn new(name: &str, hash: u64, is_file: bool) -> Self {
        Self {
            name: name.to_string(),
            hash,
            is_file,
            children: BTreeMap::new(),
        }
    }
}

/// Hierarchical hash mirroring the scanned directory tree.
///
/// Not thread-safe on its own; callers needing shared access must wrap it
/// (the [`crate::FileIndex`] keeps one under its lock).
#[derive(Debug, Clone)]
pub struct MerkleTree {
    root: MerkleNode,
    dirty: bool,
}

impl Default for MerkleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MerkleTree {
    pub fn new() -> Self {
        Self {
            root: MerkleNode::new("", 0, false),
            dirty: false,
        }
    }

    /// Insert or update a file leaf, creating intermediate directories.
    pub fn add_file(&mut self, path: &str, content_hash: u64) {
        let mut node = &mut self.root;
        for component in split_path(path) {
            node = node
                .children
                .entry(component.to_string())
                .or_insert_with(|| MerkleNode::new(component, 0, false));
        }
        node.hash = content_hash;
        node.is_file = true;
        self.dirty = true;
    }

    /// Remove a file leaf. Intermediate directories are left in place; an
    /// emptied directory recomputes to hash 0.
    pub fn remove_file(&mut self, path: &str) {
        let components: Vec<&str> = split_path(path).collect();
        let Some((last, parents)) = components.split_last() else {
            return;
        };

        let mut node = &mut self.root;
        for component in parents {
            match node.children.get_mut(*component) {
                Some(child) => node = child,
                None => return,
            }
        }
        node.children.remove(*last);
        self.dirty = true;
    }

    /// Recompute and return the hash of the subtree rooted at `dir_path`.
    /// Missing paths hash to 0.
    pub fn compute_hash(&mut self, dir_path: &str) -> u64 {
        let mut node = &mut self.root;
        for component in split_path(dir_path) {
            match node.children.get_mut(component) {
                Some(child) => node = child,
                None => return 0,
            }
        }
        compute_node_hash(node)
    }

    /// Root hash of the whole tree, recomputed bottom-up when stale.
    pub fn root_hash(&mut self) -> u64 {
        if self.dirty {
            compute_node_hash(&mut self.root);
            self.dirty = false;
        }
        self.root.hash
    }

    /// Drop all nodes.
    pub fn clear(&mut self) {
        self.root = MerkleNode::new("", 0, false);
        self.dirty = false;
    }

    /// Paths whose subtree hashes differ between the two trees, parents
    /// before their differing children.
    pub fn diff(&self, other: &MerkleTree) -> Vec<String> {
        let mut changed = Vec::new();
        collect_diff(Some(&self.root), Some(&other.root), "", &mut changed);
        changed
    }

    /// Serialize the tree. Stale directory hashes are refreshed first so a
    /// serialize/deserialize round-trip preserves the root hash.
    pub fn serialize(&mut self) -> Vec<u8> {
        if self.dirty {
            compute_node_hash(&mut self.root);
            self.dirty = false;
        }

        let mut out = Vec::new();
        out.extend_from_slice(&MERKLE_MAGIC.to_le_bytes());
        out.extend_from_slice(&MERKLE_VERSION.to_le_bytes());
        serialize_node(&self.root, &mut out);
        out
    }

    /// Reconstruct a tree from serialized bytes. Fails on bad magic, bad
    /// version, or truncation without producing a partial tree.
    pub fn deserialize(data: &[u8]) -> Result<MerkleTree> {
        let mut reader = ByteReader::new(data);

        let magic = reader.read_u32()?;
        if magic != MERKLE_MAGIC {
            return Err(IndexerError::Corrupt(format!(
                "bad merkle magic 0x{magic:08X}"
            )));
        }
        let version = reader.read_u32()?;
        if version != MERKLE_VERSION {
            return Err(IndexerError::Corrupt(format!(
                "unsupported merkle version {version}"
            )));
        }

        let root = deserialize_node(&mut reader)?;
        Ok(MerkleTree { root, dirty: false })
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|c| !c.is_empty())
}

fn compute_node_hash(node: &mut MerkleNode) -> u64 {
    if node.is_file {
        return node.hash;
    }

    let mut combined = 0u64;
    for child in node.children.values_mut() {
        let child_hash = compute_node_hash(child);
        combined = combine(combined, child_hash);
    }
    node.hash = combined;
    combined
}

fn collect_diff(
    left: Option<&MerkleNode>,
    right: Option<&MerkleNode>,
    path: &str,
    changed: &mut Vec<String>,
) {
    let differs = match (left, right) {
        (None, None) => return,
        (Some(l), Some(r)) => l.hash != r.hash,
        _ => true,
    };
    if differs && !path.is_empty() {
        changed.push(path.to_string());
    }

    let mut names: Vec<&str> = Vec::new();
    for node in [left, right].into_iter().flatten() {
        for name in node.children.keys() {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
    }
    names.sort_unstable();

    for name in names {
        let child_left = left.and_then(|n| n.children.get(name));
        let child_right = right.and_then(|n| n.children.get(name));
        let child_path = if path.is_empty() {
            name.to_string()
        } else {
            format!("{path}/{name}")
        };
        collect_diff(child_left, child_right, &child_path, changed);
    }
}

fn serialize_node(node: &MerkleNode, out: &mut Vec<u8>) {
    out.extend_from_slice(&(node.name.len() as u32).to_le_bytes());
    out.extend_from_slice(node.name.as_bytes());
    out.extend_from_slice(&node.hash.to_le_bytes());
    out.push(u8::from(node.is_file));
    out.extend_from_slice(&(node.children.len() as u32).to_le_bytes());
    for child in node.children.values() {
        serialize_node(child, out);
    }
}

fn deserialize_node(reader: &mut ByteReader<'_>) -> Result<MerkleNode> {
    let name_len = reader.read_u32()? as usize;
    let name_bytes = reader.read_bytes(name_len)?;
    let name = String::from_utf8_lossy(name_bytes).into_owned();
    let hash = reader.read_u64()?;
    let is_file = reader.read_u8()? != 0;
    let child_count = reader.read_u32()?;

    let mut node = MerkleNode {
        name,
        hash,
        is_file,
        children: BTreeMap::new(),
    };
    for _ in 0..child_count {
        let child = deserialize_node(reader)?;
        node.children.insert(child.name.clone(), child);
    }
    Ok(node)
}

/// Little-endian cursor over serialized bytes.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(IndexerError::Corrupt("truncated data".to_string()));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }
}
