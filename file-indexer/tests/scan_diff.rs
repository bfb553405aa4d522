//! End-to-end scan, diff, and persistence tests against a real directory
//! tree.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use strata_file_indexer::{
    ChangeKind, FileIndex, Indexer, IndexerConfig, Language,
};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write");
}

#[test]
fn scan_then_rename_and_add_is_detected() {
    let dir = TempDir::new().expect("temp dir");
    let root = dir.path();

    write(root, "a.py", "print('a')\n");
    write(root, "dir/b.py", "print('b')\n");

    let mut indexer = Indexer::new(IndexerConfig::default()).expect("indexer");
    let first = indexer.scan(root, None).expect("first scan");
    assert_eq!(first.total_files, 2);
    let first_root_hash = indexer.merkle_tree().root_hash();

    // Rename dir/b.py -> dir/c.py (same content) and add new.py.
    fs::rename(root.join("dir/b.py"), root.join("dir/c.py")).expect("rename");
    write(root, "new.py", "print('new')\n");

    let second = indexer.scan(root, None).expect("second scan");
    let second_root_hash = indexer.merkle_tree().root_hash();
    assert_ne!(first_root_hash, second_root_hash);

    let diff = indexer.diff(&first.files, &second.files);
    assert_eq!(diff.renamed, 1);
    assert_eq!(diff.added, 1);
    assert_eq!(diff.modified, 0);
    assert_eq!(diff.deleted, 0);

    let rename = diff
        .changes
        .iter()
        .find(|c| c.kind == ChangeKind::Renamed)
        .expect("rename change");
    assert_eq!(rename.old_path.as_deref(), Some("dir/b.py"));
    assert_eq!(rename.path, "dir/c.py");

    let added = diff
        .changes
        .iter()
        .find(|c| c.kind == ChangeKind::Added)
        .expect("added change");
    assert_eq!(added.path, "new.py");
    assert_ne!(added.new_hash, 0);
}

#[test]
fn incremental_update_against_persisted_index() {
    let dir = TempDir::new().expect("temp dir");
    // Keep the persisted index outside the scanned tree.
    let root = &dir.path().join("repo");

    write(root, "src/lib.rs", "pub fn one() -> u32 { 1 }\n");
    write(root, "src/util.rs", "pub fn two() -> u32 { 2 }\n");
    write(root, "docs/notes.md", "# notes\n");

    let mut indexer = Indexer::new(IndexerConfig::default()).expect("indexer");
    let scan = indexer.scan(root, None).expect("scan");

    // Build and persist the index from the scan.
    let index = FileIndex::new();
    for entry in &scan.files {
        index.add(entry.clone());
    }
    let index_path = dir.path().join("state.idx");
    index.save(&index_path).expect("save");

    // Mutate the tree: edit one file, delete another.
    write(root, "src/lib.rs", "pub fn one() -> u32 { 11 }\n");
    fs::remove_file(root.join("docs/notes.md")).expect("remove");

    // Reload the persisted index and diff against a fresh scan.
    let reloaded = FileIndex::new();
    reloaded.load(&index_path).expect("load");
    assert_eq!(reloaded.len(), 3);
    assert_eq!(reloaded.merkle_hash(), index.merkle_hash());

    let diff = indexer
        .incremental_update(root, &reloaded)
        .expect("incremental update");

    assert_eq!(diff.modified, 1);
    assert_eq!(diff.deleted, 1);
    assert_eq!(diff.added, 0);
    assert_eq!(diff.renamed, 0);

    let modified = diff
        .changes
        .iter()
        .find(|c| c.kind == ChangeKind::Modified)
        .expect("modified change");
    assert_eq!(modified.path, "src/lib.rs");
    assert_ne!(modified.old_hash, modified.new_hash);

    let deleted = diff
        .changes
        .iter()
        .find(|c| c.kind == ChangeKind::Deleted)
        .expect("deleted change");
    assert_eq!(deleted.path, "docs/notes.md");
}

#[test]
fn unchanged_tree_diffs_empty_and_scan_is_deterministic() {
    let dir = TempDir::new().expect("temp dir");
    let root = dir.path();

    write(root, "pkg/a.go", "package pkg\n");
    write(root, "pkg/b.go", "package pkg\n\nfunc B() {}\n");

    let mut indexer = Indexer::new(IndexerConfig::default()).expect("indexer");
    let first = indexer.scan(root, None).expect("first");
    let first_hash = indexer.merkle_tree().root_hash();
    let second = indexer.scan(root, None).expect("second");
    let second_hash = indexer.merkle_tree().root_hash();

    assert_eq!(first_hash, second_hash);

    let diff = indexer.diff(&first.files, &second.files);
    assert_eq!(diff.changes.len(), 0);
    assert_eq!(diff.added + diff.modified + diff.deleted + diff.renamed, 0);
}

#[test]
fn languages_detected_per_extension() {
    let dir = TempDir::new().expect("temp dir");
    let root = dir.path();

    write(root, "main.rs", "fn main() {}\n");
    write(root, "app.ts", "const x = 1;\n");
    write(root, "tool.py", "x = 1\n");
    write(root, "plain.txt", "text\n");

    let mut indexer = Indexer::new(IndexerConfig::default()).expect("indexer");
    let scan = indexer.scan(root, None).expect("scan");

    let lang_of = |path: &str| {
        scan.files
            .iter()
            .find(|f| f.relative_path == path)
            .map(|f| f.language)
            .expect("file present")
    };
    assert_eq!(lang_of("main.rs"), Language::Rust);
    assert_eq!(lang_of("app.ts"), Language::TypeScript);
    assert_eq!(lang_of("tool.py"), Language::Python);
    assert_eq!(lang_of("plain.txt"), Language::Unknown);
}
