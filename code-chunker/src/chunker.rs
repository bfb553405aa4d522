use crate::boundaries::BoundaryDetector;
use crate::config::ChunkerConfig;
use crate::error::ChunkerError;
use crate::language::Language;
use crate::tokenizer::{count_tokens, find_token_boundary};
use crate::{ChunkContext, ChunkKind, ChunkResult, CodeChunk, LineMap, SemanticBoundary, SourceLocation};
use log::{debug, info};
use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Main code chunker.
pub struct Chunker {
    config: ChunkerConfig,
    detector: BoundaryDetector,
}

/// A typed region of the source, delimited by semantic boundaries.
struct Region {
    start: usize,
    end: usize,
    kind: ChunkKind,
    name: String,
}

impl Chunker {
    /// Create a new chunker with the given configuration.
    pub fn new(config: ChunkerConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("Invalid chunker configuration: {e}");
        }

        Self {
            config,
            detector: BoundaryDetector::new(),
        }
    }

    /// Update the configuration.
    pub fn set_config(&mut self, config: ChunkerConfig) {
        if let Err(e) = config.validate() {
            panic!("Invalid chunker configuration: {e}");
        }
        self.config = config;
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk source code into semantic pieces.
    ///
    /// The path is only used for language detection when the configuration
    /// does not pin a language.
    pub fn chunk(&self, source: &str, path: Option<&str>) -> ChunkResult {
        let started = Instant::now();

        let mut result = ChunkResult {
            total_tokens: count_tokens(source),
            total_lines: count_lines(source),
            ..Default::default()
        };

        if source.is_empty() {
            return result;
        }

        let mut language = self.config.language;
        if language == Language::Unknown {
            if let Some(path) = path {
                language = Language::from_path(Path::new(path));
            }
        }

        let boundaries = if self.config.respect_boundaries {
            self.detector.detect(source, language)
        } else {
            Vec::new()
        };

        let line_map = LineMap::new(source);

        result.chunks = if !boundaries.is_empty() {
            self.chunk_with_boundaries(source, &line_map, &boundaries)
        } else {
            self.chunk_sliding_window(source, &line_map)
        };

        for chunk in &mut result.chunks {
            chunk.hash = fnv1a_hex(&chunk.content);
            if self.config.include_context && !boundaries.is_empty() {
                self.extract_context(chunk, source, &boundaries);
            }
        }

        result.chunking_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "chunked {} into {} chunks ({} tokens)",
            path.unwrap_or("<memory>"),
            result.chunks.len(),
            result.total_tokens
        );

        result
    }

    /// Chunk a file from disk via memory mapping, falling back to a plain
    /// read when the file cannot be mapped.
    pub fn chunk_file(&self, path: &Path) -> Result<ChunkResult, ChunkerError> {
        let source = read_source(path)
            .ok_or_else(|| ChunkerError::FileOpen(path.display().to_string()))?;

        info!("chunking file {}", path.display());
        Ok(self.chunk(&source, path.to_str()))
    }

    /// Partition the source into typed regions and chunk each region under
    /// the token budget.
    fn chunk_with_boundaries(
        &self,
        source: &str,
        line_map: &LineMap,
        boundaries: &[SemanticBoundary],
    ) -> Vec<CodeChunk> {
        let regions = partition_regions(source, boundaries);
        let mut chunks = Vec::new();
        let mut chunk_index = 0u32;

        for region in &regions {
            let content = &source[region.start..region.end];
            if content.bytes().all(|b| b.is_ascii_whitespace()) {
                continue;
            }

            let region_tokens = count_tokens(content);
            if region_tokens <= self.config.max_chunk_tokens {
                chunks.push(self.make_chunk(
                    source,
                    line_map,
                    region.start,
                    region.end,
                    region.kind,
                    &region.name,
                    chunk_index,
                ));
                chunk_index += 1;
                continue;
            }

            // Oversized region: sliding window with overlap, confined to the
            // region.
            let mut pos = region.start;
            let mut overlap_bytes = 0usize;

            while pos < region.end {
                let mut chunk_start = pos;
                if overlap_bytes > 0 && pos > region.start {
                    chunk_start = pos - overlap_bytes.min(pos - region.start);
                }

                let remaining = &source[chunk_start..region.end];
                let budget_len = find_token_boundary(remaining, self.config.max_chunk_tokens);

                let mut chunk_end = chunk_start + budget_len;
                if chunk_end < region.end {
                    chunk_end = extend_to_line_end(source, chunk_end);
                }
                chunk_end = chunk_end.min(region.end);

                let chunk = self.make_chunk(
                    source,
                    line_map,
                    chunk_start,
                    chunk_end,
                    region.kind,
                    &region.name,
                    chunk_index,
                );
                overlap_bytes = find_token_boundary(&chunk.content, self.config.overlap_tokens);
                chunks.push(chunk);
                chunk_index += 1;

                pos = chunk_end;
                if chunk_end <= chunk_start {
                    break;
                }
            }
        }

        chunks
    }

    /// Sliding window over the whole source, used when boundaries are
    /// disabled or none were found.
    fn chunk_sliding_window(&self, source: &str, line_map: &LineMap) -> Vec<CodeChunk> {
        let mut chunks = Vec::new();
        let mut chunk_index = 0u32;
        let mut pos = 0usize;
        let mut overlap_bytes = 0usize;

        while pos < source.len() {
            let mut chunk_start = pos;
            if overlap_bytes > 0 && pos > 0 {
                chunk_start = pos - overlap_bytes.min(pos);
            }

            let remaining = &source[chunk_start..];
            let budget_len = find_token_boundary(remaining, self.config.max_chunk_tokens);

            let mut chunk_end = chunk_start + budget_len;
            if chunk_end < source.len() {
                chunk_end = extend_to_line_end(source, chunk_end);
            }
            chunk_end = chunk_end.min(source.len());

            // Undersized chunks absorb the next line, unless this is the
            // final chunk.
            if chunk_end < source.len()
                && count_tokens(&source[chunk_start..chunk_end]) < self.config.min_chunk_tokens
            {
                chunk_end = extend_to_line_end(source, (chunk_end + 1).min(source.len()));
                chunk_end = chunk_end.min(source.len());
            }

            let content = &source[chunk_start..chunk_end];
            if content.bytes().all(|b| b.is_ascii_whitespace()) {
                overlap_bytes = 0;
            } else {
                let chunk = self.make_chunk(
                    source,
                    line_map,
                    chunk_start,
                    chunk_end,
                    ChunkKind::Block,
                    "",
                    chunk_index,
                );
                overlap_bytes = find_token_boundary(&chunk.content, self.config.overlap_tokens);
                chunks.push(chunk);
                chunk_index += 1;
            }

            pos = chunk_end;
            if chunk_end <= chunk_start {
                break;
            }
        }

        chunks
    }

    #[allow(clippy::too_many_arguments)]
    fn make_chunk(
        &self,
        source: &str,
        line_map: &LineMap,
        start: usize,
        end: usize,
        kind: ChunkKind,
        name: &str,
        chunk_index: u32,
    ) -> CodeChunk {
        let content = source[start..end].to_string();
        let token_count = count_tokens(&content);
        let (line_start, column_start) = line_map.line_col(start);
        let (line_end, column_end) = line_map.line_col(end);

        CodeChunk {
            content,
            token_count,
            location: SourceLocation {
                line_start,
                line_end,
                column_start,
                column_end,
                byte_offset: start as u32,
                byte_length: (end - start) as u32,
            },
            kind,
            context: ChunkContext {
                parent_name: name.to_string(),
                ..Default::default()
            },
            chunk_index,
            hash: String::new(),
        }
    }

    /// Resolve the enclosing scope and import context for a chunk.
    fn extract_context(
        &self,
        chunk: &mut CodeChunk,
        source: &str,
        boundaries: &[SemanticBoundary],
    ) {
        let chunk_start = chunk.location.byte_offset;
        let chunk_end = chunk_start + chunk.location.byte_length;

        let mut best_depth = i32::MIN;
        let mut parent = String::new();
        let mut namespace = String::new();

        for b in boundaries {
            if !b.is_start || b.byte_offset > chunk_start {
                continue;
            }
            match b.kind {
                // The latest boundary at the greatest depth is the nearest
                // enclosing scope.
                ChunkKind::Function | ChunkKind::Class if b.scope_depth >= best_depth => {
                    parent = b.name.clone();
                    best_depth = b.scope_depth;
                }
                ChunkKind::Module => namespace = b.name.clone(),
                _ => {}
            }
        }

        chunk.context.parent_name = parent;
        chunk.context.namespace_name = namespace;

        if self.config.preserve_imports {
            let bytes = source.as_bytes();
            for b in boundaries {
                if b.kind != ChunkKind::Import {
                    continue;
                }
                let line_start = find_line_start(bytes, b.byte_offset as usize);
                let line_end = find_line_end(bytes, b.byte_offset as usize);
                let contained =
                    chunk_start as usize <= line_end && line_start <= chunk_end as usize;
                if !contained {
                    chunk
                        .context
                        .imports
                        .push(source[line_start..line_end].to_string());
                }
            }
        }
    }
}

/// Walk the sorted boundary list, opening a region at every start boundary
/// and closing one just past every end boundary. Bytes between regions form
/// untyped regions.
fn partition_regions(source: &str, boundaries: &[SemanticBoundary]) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut cur_start = 0usize;
    let mut cur_kind = ChunkKind::Unknown;
    let mut cur_name = String::new();

    for b in boundaries {
        let offset = b.byte_offset as usize;
        if b.is_start {
            if offset > cur_start {
                regions.push(Region {
                    start: cur_start,
                    end: offset,
                    kind: cur_kind,
                    name: std::mem::take(&mut cur_name),
                });
            }
            cur_start = offset;
            cur_kind = b.kind;
            cur_name = b.name.clone();
        } else {
            let end = offset + 1;
            if end > cur_start && end <= source.len() {
                regions.push(Region {
                    start: cur_start,
                    end,
                    kind: cur_kind,
                    name: std::mem::take(&mut cur_name),
                });
                cur_start = end;
                cur_kind = ChunkKind::Unknown;
            }
        }
    }

    if cur_start < source.len() {
        regions.push(Region {
            start: cur_start,
            end: source.len(),
            kind: cur_kind,
            name: cur_name,
        });
    }

    regions
}

/// Extend `offset` forward to just past the next newline so chunks never
/// split a line.
fn extend_to_line_end(source: &str, offset: usize) -> usize {
    let end = find_line_end(source.as_bytes(), offset);
    if end < source.len() {
        end + 1
    } else {
        end
    }
}

fn find_line_start(bytes: &[u8], mut offset: usize) -> usize {
    while offset > 0 && bytes[offset - 1] != b'\n' {
        offset -= 1;
    }
    offset
}

fn find_line_end(bytes: &[u8], mut offset: usize) -> usize {
    while offset < bytes.len() && bytes[offset] != b'\n' {
        offset += 1;
    }
    offset
}

fn count_lines(source: &str) -> u32 {
    1 + source.bytes().filter(|&b| b == b'\n').count() as u32
}

/// FNV-1a over the content, rendered as 16 lowercase hex digits.
fn fnv1a_hex(content: &str) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in content.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    format!("{hash:016x}")
}

/// Read a file as text, preferring a memory map. Returns `None` when the
/// file cannot be opened, mapped, or read.
fn read_source(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let metadata = file.metadata().ok()?;
    if metadata.len() == 0 {
        return Some(String::new());
    }

    // Mapping can fail on exotic filesystems; fall back to a plain read.
    match unsafe { Mmap::map(&file) } {
        Ok(mapped) => Some(decode_bytes(&mapped)),
        Err(_) => std::fs::read(path).ok().map(|bytes| decode_bytes(&bytes)),
    }
}

fn decode_bytes(bytes: &[u8]) -> String {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}
