//! # Strata Code Chunker
//!
//! Splits source files into token-bounded, semantically coherent fragments
//! suitable for embedding into a vector store.
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Language Detection (extension map, config override wins)
//!     │
//!     ├──> Boundary Detection
//!     │    └─> per-language lexical scan → sorted SemanticBoundary list
//!     │
//!     ├──> Region Partitioning
//!     │    └─> boundaries split the source into typed regions
//!     │
//!     └──> Chunk Generation
//!          ├─> token-budget sliding window with overlap
//!          ├─> context extraction (parent scope, namespace, imports)
//!          └─> emit CodeChunk[]
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use strata_code_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::default());
//!
//! let code = "export function add(a: number, b: number): number { return a + b; }";
//! let result = chunker.chunk(code, Some("math.ts"));
//! println!("generated {} chunks", result.chunks.len());
//! ```

mod boundaries;
mod chunker;
mod config;
mod error;
mod language;
mod tokenizer;

pub use boundaries::BoundaryDetector;
pub use chunker::Chunker;
pub use config::ChunkerConfig;
pub use error::ChunkerError;
pub use language::Language;
pub use tokenizer::{count_tokens, find_token_boundary};

use serde::{Deserialize, Serialize};

/// Position of a chunk or boundary within a source file.
///
/// Lines and columns are 1-based; byte offset and length are 0-based and
/// always satisfy `byte_offset + byte_length <= source.len()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line_start: u32,
    pub line_end: u32,
    pub column_start: u32,
    pub column_end: u32,
    pub byte_offset: u32,
    pub byte_length: u32,
}

/// Kind of source construct a chunk or boundary covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkKind {
    #[default]
    Unknown,
    Function,
    Class,
    Struct,
    Interface,
    Enum,
    Module,
    Import,
    Export,
    Comment,
    Block,
    Statement,
}

impl ChunkKind {
    /// Lowercase label, stable across releases.
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkKind::Unknown => "unknown",
            ChunkKind::Function => "function",
            ChunkKind::Class => "class",
            ChunkKind::Struct => "struct",
            ChunkKind::Interface => "interface",
            ChunkKind::Enum => "enum",
            ChunkKind::Module => "module",
            ChunkKind::Import => "import",
            ChunkKind::Export => "export",
            ChunkKind::Comment => "comment",
            ChunkKind::Block => "block",
            ChunkKind::Statement => "statement",
        }
    }
}

/// A positional record marking the start (or structural end) of a recognized
/// declaration.
///
/// `is_start == false` marks the closing point of a function/class region.
/// For a single source the detector returns boundaries sorted by
/// `byte_offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticBoundary {
    pub line: u32,
    pub column: u32,
    pub byte_offset: u32,
    pub kind: ChunkKind,
    pub name: String,
    pub scope_depth: i32,
    pub is_start: bool,
}

/// Context information attached to a chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkContext {
    /// Enclosing function/class name, if any.
    pub parent_name: String,

    /// Enclosing namespace/module name, if any.
    pub namespace_name: String,

    /// Literal import/include lines from the source that are not physically
    /// contained in the chunk.
    pub imports: Vec<String>,
}

/// A contiguous slice of source bytes sized to a token budget, carrying
/// location and context metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChunk {
    /// The chunk content, byte-identical to the covered source range.
    pub content: String,

    /// Heuristic token count of `content`.
    pub token_count: u32,

    /// Location of the chunk within the source.
    pub location: SourceLocation,

    /// Kind of construct the chunk covers.
    pub kind: ChunkKind,

    /// Parent scope, namespace, and import context.
    pub context: ChunkContext,

    /// Dense 0-based index within one chunking result.
    pub chunk_index: u32,

    /// FNV-1a hash of `content`, 16 lowercase hex digits.
    pub hash: String,
}

/// Result of a chunking operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkResult {
    pub chunks: Vec<CodeChunk>,
    pub total_tokens: u32,
    pub total_lines: u32,
    pub chunking_time_ms: f64,
}

/// Byte-offset to line/column lookup table, built once per source.
#[derive(Debug)]
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-based (line, column) of a byte offset. Columns count bytes.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let line = self
            .line_starts
            .partition_point(|&start| start as usize <= offset);
        let start = self.line_starts[line - 1];
        (line as u32, offset as u32 - start + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chunk_kind_labels() {
        assert_eq!(ChunkKind::Function.as_str(), "function");
        assert_eq!(ChunkKind::Unknown.as_str(), "unknown");
        assert_eq!(ChunkKind::default(), ChunkKind::Unknown);
    }

    #[test]
    fn test_line_map_first_line() {
        let map = LineMap::new("hello\nworld\n");
        assert_eq!(map.line_col(0), (1, 1));
        assert_eq!(map.line_col(4), (1, 5));
        assert_eq!(map.line_col(5), (1, 6));
    }

    #[test]
    fn test_line_map_later_lines() {
        let map = LineMap::new("ab\ncd\nef");
        assert_eq!(map.line_col(3), (2, 1));
        assert_eq!(map.line_col(4), (2, 2));
        assert_eq!(map.line_col(6), (3, 1));
        assert_eq!(map.line_col(7), (3, 2));
        // One past the end resolves to the last line.
        assert_eq!(map.line_col(8), (3, 3));
    }

    #[test]
    fn test_line_map_empty_source() {
        let map = LineMap::new("");
        assert_eq!(map.line_col(0), (1, 1));
    }
}
