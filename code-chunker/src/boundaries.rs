//! Semantic boundary detection.
//!
//! Per-language lexical recognizers built from two primitives: a byte-level
//! scanner that skips comments and string literals, and anchored regular
//! expressions applied at the current scan position against a bounded
//! look-ahead window. The detector is not a parser; it yields whatever valid
//! prefix it can recognize and never fails on malformed input.

use crate::language::Language;
use crate::{ChunkKind, LineMap, SemanticBoundary};
use once_cell::sync::Lazy;
use regex::bytes::{Captures, Regex};

/// Look-ahead window for declaration matching.
const LOOKAHEAD: usize = 200;

/// Wider window for Java/C-family declarations with long modifier lists.
const LOOKAHEAD_WIDE: usize = 300;

/// Doc comments longer than this many bytes become `Comment` boundaries.
const DOC_COMMENT_MIN_BYTES: usize = 50;

static JS_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^import\s").unwrap());
static JS_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+(?:default\s+)?)?class\s+([A-Za-z_$][A-Za-z0-9_$]*)").unwrap()
});
static JS_FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:export\s+(?:default\s+)?)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][A-Za-z0-9_$]*)?\s*\(",
    )
    .unwrap()
});
static JS_ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*(?:async\s+)?\([^)]*\)\s*=>",
    )
    .unwrap()
});
static JS_EXPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^export\s+(?:default\s+)?(?:async\s+)?(?:function|class|const|let|var)").unwrap()
});

static TS_INTERFACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+)?interface\s+([A-Za-z_$][A-Za-z0-9_$]*)").unwrap()
});
static TS_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+)?type\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=").unwrap()
});
static TS_ENUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+)?(?:const\s+)?enum\s+([A-Za-z_$][A-Za-z0-9_$]*)").unwrap()
});

static PY_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:async\s+)?def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
static PY_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^class\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static PY_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:from\s+[.\w]+\s+)?import\s").unwrap());

static RS_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:pub(?:\s*\([^)]*\))?\s+)?(?:async\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});
static RS_STRUCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:pub(?:\s*\([^)]*\))?\s+)?struct\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});
static RS_ENUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:pub(?:\s*\([^)]*\))?\s+)?enum\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});
static RS_IMPL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^impl(?:\s*<[^>]+>)?\s+(?:([A-Za-z_][A-Za-z0-9_]*)\s+for\s+)?([A-Za-z_][A-Za-z0-9_]*)")
        .unwrap()
});
static RS_TRAIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:pub(?:\s*\([^)]*\))?\s+)?trait\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});
static RS_MOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:pub(?:\s*\([^)]*\))?\s+)?mod\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});
static RS_USE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^use\s").unwrap());

static GO_PACKAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^package\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static GO_FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^func\s+(?:\([^)]+\)\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap()
});
static GO_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^type\s+([A-Za-z_][A-Za-z0-9_]*)\s+(struct|interface)").unwrap()
});
static GO_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^import\s").unwrap());

static JAVA_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:public|private|protected)\s+)?(?:abstract\s+)?(?:final\s+)?class\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .unwrap()
});
static JAVA_INTERFACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:public\s+)?interface\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static JAVA_ENUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:public\s+)?enum\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static JAVA_PACKAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^package\s").unwrap());
static JAVA_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^import\s").unwrap());

static CPP_INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#include\s").unwrap());
static CPP_NAMESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^namespace\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static CPP_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:template\s*<[^>]*>\s*)?class\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});
static CPP_STRUCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:template\s*<[^>]*>\s*)?struct\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

/// Detects semantic boundaries in source code.
#[derive(Debug, Default)]
pub struct BoundaryDetector;

impl BoundaryDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect boundaries in `source`, sorted by byte offset.
    ///
    /// Malformed input never fails; the detector emits whatever valid prefix
    /// it can recognize.
    pub fn detect(&self, source: &str, language: Language) -> Vec<SemanticBoundary> {
        let mut boundaries = match language {
            Language::JavaScript => scan_js_like(source, false),
            Language::TypeScript => scan_js_like(source, true),
            Language::Python => scan_python(source),
            Language::Rust => scan_rust(source),
            Language::Go => scan_go(source),
            Language::Java | Language::Kotlin => scan_java(source),
            Language::Cpp | Language::C | Language::CSharp => scan_cpp(source),
            Language::Ruby
            | Language::Php
            | Language::Swift
            | Language::Unknown => scan_generic(source),
        };

        // Stable sort keeps same-offset boundaries in emission order.
        boundaries.sort_by_key(|b| b.byte_offset);
        boundaries
    }
}

fn boundary(
    map: &LineMap,
    offset: usize,
    kind: ChunkKind,
    name: &str,
    scope_depth: i32,
    is_start: bool,
) -> SemanticBoundary {
    let (line, column) = map.line_col(offset);
    SemanticBoundary {
        line,
        column,
        byte_offset: offset as u32,
        kind,
        name: name.to_string(),
        scope_depth,
        is_start,
    }
}

fn lookahead(bytes: &[u8], pos: usize, width: usize) -> &[u8] {
    &bytes[pos..bytes.len().min(pos + width)]
}

fn match_len(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.end())
}

fn capture_name(caps: &Captures<'_>, group: usize) -> String {
    caps.get(group)
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .unwrap_or_default()
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn skip_to_eol(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos] != b'\n' {
        pos += 1;
    }
    pos
}

/// Skip a quoted string literal with backslash escapes; `pos` is at the
/// opening quote.
fn skip_string(bytes: &[u8], pos: usize, quote: u8) -> usize {
    let mut i = pos + 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            i += 2;
        } else if bytes[i] == quote {
            return i + 1;
        } else {
            i += 1;
        }
    }
    i
}

/// Skip a backtick template string, including nested `${...}` expressions.
fn skip_template_string(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos + 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            i += 2;
        } else if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            let mut depth = 1;
            i += 2;
            while i < bytes.len() && depth > 0 {
                match bytes[i] {
                    b'{' => depth += 1,
                    b'}' => depth -= 1,
                    _ => {}
                }
                i += 1;
            }
        } else if bytes[i] == b'`' {
            return i + 1;
        } else {
            i += 1;
        }
    }
    i
}

/// Skip a `//`, `/* */`, or `#` comment starting at `pos`.
fn skip_comment(bytes: &[u8], pos: usize) -> usize {
    if pos + 1 < bytes.len() && bytes[pos] == b'/' {
        match bytes[pos + 1] {
            b'/' => return skip_to_eol(bytes, pos),
            b'*' => {
                let mut i = pos + 2;
                while i + 1 < bytes.len() {
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        return i + 2;
                    }
                    i += 1;
                }
                return bytes.len();
            }
            _ => {}
        }
    }
    if pos < bytes.len() && bytes[pos] == b'#' {
        return skip_to_eol(bytes, pos);
    }
    pos
}

fn at_comment(bytes: &[u8], pos: usize) -> bool {
    bytes[pos] == b'/' && pos + 1 < bytes.len() && matches!(bytes[pos + 1], b'/' | b'*')
}

/// Find the position just past the delimiter matching `bytes[pos]`, skipping
/// strings and comments along the way.
fn find_matching(bytes: &[u8], pos: usize, open: u8, close: u8) -> usize {
    if pos >= bytes.len() || bytes[pos] != open {
        return pos;
    }
    let mut depth = 1;
    let mut i = pos + 1;
    while i < bytes.len() && depth > 0 {
        let c = bytes[i];
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
        } else if c == b'"' || c == b'\'' {
            i = skip_string(bytes, i, c);
            continue;
        } else if c == b'`' {
            i = skip_template_string(bytes, i);
            continue;
        } else if at_comment(bytes, i) {
            i = skip_comment(bytes, i);
            continue;
        }
        i += 1;
    }
    i
}

fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if &haystack[i..i + needle.len()] == needle {
            count += 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    count
}

/// JavaScript scan; with `typescript` set it also recognizes `interface`,
/// `type`, and `enum` declarations.
fn scan_js_like(source: &str, typescript: bool) -> Vec<SemanticBoundary> {
    let bytes = source.as_bytes();
    let map = LineMap::new(source);
    let mut out = Vec::new();
    let mut pos = 0;
    let mut depth: i32 = 0;
    let mut scopes: Vec<ChunkKind> = Vec::new();

    while pos < bytes.len() {
        pos = skip_whitespace(bytes, pos);
        if pos >= bytes.len() {
            break;
        }
        let c = bytes[pos];

        if at_comment(bytes, pos) {
            let start = pos;
            pos = skip_comment(bytes, pos);
            // Long doc comments are useful retrieval units of their own.
            if pos - start > DOC_COMMENT_MIN_BYTES {
                out.push(boundary(&map, start, ChunkKind::Comment, "", depth, true));
            }
            continue;
        }
        if c == b'"' || c == b'\'' {
            pos = skip_string(bytes, pos, c);
            continue;
        }
        if c == b'`' {
            pos = skip_template_string(bytes, pos);
            continue;
        }

        let window = lookahead(bytes, pos, LOOKAHEAD);

        if JS_IMPORT.is_match(window) {
            out.push(boundary(&map, pos, ChunkKind::Import, "", depth, true));
            pos = skip_to_eol(bytes, pos);
            continue;
        }

        if typescript {
            if let Some(caps) = TS_INTERFACE.captures(window) {
                let name = capture_name(&caps, 1);
                out.push(boundary(&map, pos, ChunkKind::Interface, &name, depth, true));
                pos += match_len(&caps);
                continue;
            }
            if let Some(caps) = TS_ENUM.captures(window) {
                let name = capture_name(&caps, 1);
                out.push(boundary(&map, pos, ChunkKind::Enum, &name, depth, true));
                pos += match_len(&caps);
                continue;
            }
            if let Some(caps) = TS_TYPE.captures(window) {
                let name = capture_name(&caps, 1);
                out.push(boundary(&map, pos, ChunkKind::Statement, &name, depth, true));
                pos += match_len(&caps);
                continue;
            }
        }

        if let Some(caps) = JS_CLASS.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Class, &name, depth, true));
            pos += match_len(&caps);
            while pos < bytes.len() && bytes[pos] != b'{' {
                pos += 1;
            }
            if pos < bytes.len() {
                scopes.push(ChunkKind::Class);
                depth += 1;
                pos += 1;
            }
            continue;
        }

        if let Some(caps) = JS_FUNC.captures(window) {
            let mut name = capture_name(&caps, 1);
            if name.is_empty() {
                name = "<anonymous>".to_string();
            }
            out.push(boundary(&map, pos, ChunkKind::Function, &name, depth, true));
            pos += match_len(&caps);
            while pos < bytes.len() && bytes[pos] != b'{' {
                pos += 1;
            }
            if pos < bytes.len() {
                scopes.push(ChunkKind::Function);
                depth += 1;
                pos += 1;
            }
            continue;
        }

        if let Some(caps) = JS_ARROW.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Function, &name, depth, true));
            pos += match_len(&caps);
            // Arrow bodies are optionally braced.
            let body = skip_whitespace(bytes, pos);
            if body < bytes.len() && bytes[body] == b'{' {
                scopes.push(ChunkKind::Function);
                depth += 1;
                pos = body + 1;
            }
            continue;
        }

        if let Some(m) = JS_EXPORT.find(window) {
            out.push(boundary(&map, pos, ChunkKind::Export, "", depth, true));
            pos += m.end();
            continue;
        }

        match c {
            b'{' => {
                scopes.push(ChunkKind::Block);
                depth += 1;
                pos += 1;
            }
            b'}' => {
                if let Some(kind) = scopes.pop() {
                    depth -= 1;
                    if matches!(kind, ChunkKind::Function | ChunkKind::Class) {
                        out.push(boundary(&map, pos, kind, "", depth, false));
                    }
                }
                pos += 1;
            }
            _ => pos += 1,
        }
    }

    out
}

/// Python scan. Line-oriented; leading whitespace stands in for scope depth
/// (tabs count as 4) and triple-quoted blocks are skipped wholesale.
fn scan_python(source: &str) -> Vec<SemanticBoundary> {
    const TRIPLE_DOUBLE: &[u8] = b"\"\"\"";
    const TRIPLE_SINGLE: &[u8] = b"'''";

    let bytes = source.as_bytes();
    let map = LineMap::new(source);
    let mut out = Vec::new();
    let mut pos = 0;
    let mut doc_delim: Option<&[u8]> = None;

    while pos < bytes.len() {
        let line_start = pos;
        let line_end = skip_to_eol(bytes, pos);
        let line = &bytes[line_start..line_end];
        pos = if line_end < bytes.len() { line_end + 1 } else { line_end };

        if let Some(delim) = doc_delim {
            if count_occurrences(line, delim) % 2 == 1 {
                doc_delim = None;
            }
            continue;
        }

        let mut indent = 0i32;
        let mut i = 0;
        while i < line.len() && (line[i] == b' ' || line[i] == b'\t') {
            indent += if line[i] == b'\t' { 4 } else { 1 };
            i += 1;
        }
        let content = &line[i..];
        if content.is_empty() || content[0] == b'#' {
            continue;
        }

        if let Some(caps) = PY_CLASS.captures(content) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, line_start, ChunkKind::Class, &name, indent / 4, true));
        } else if let Some(caps) = PY_DEF.captures(content) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, line_start, ChunkKind::Function, &name, indent / 4, true));
        } else if PY_IMPORT.is_match(content) {
            out.push(boundary(&map, line_start, ChunkKind::Import, "", 0, true));
        }

        for delim in [TRIPLE_DOUBLE, TRIPLE_SINGLE] {
            if count_occurrences(content, delim) % 2 == 1 {
                doc_delim = Some(delim);
                break;
            }
        }
    }

    out
}

fn scan_rust(source: &str) -> Vec<SemanticBoundary> {
    let bytes = source.as_bytes();
    let map = LineMap::new(source);
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        pos = skip_whitespace(bytes, pos);
        if pos >= bytes.len() {
            break;
        }
        if at_comment(bytes, pos) {
            pos = skip_comment(bytes, pos);
            continue;
        }
        if bytes[pos] == b'"' {
            pos = skip_string(bytes, pos, b'"');
            continue;
        }

        let window = lookahead(bytes, pos, LOOKAHEAD);

        if let Some(caps) = RS_FN.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Function, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = RS_STRUCT.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Struct, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = RS_ENUM.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Enum, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = RS_IMPL.captures(window) {
            let trait_name = capture_name(&caps, 1);
            let type_name = capture_name(&caps, 2);
            let name = if trait_name.is_empty() {
                type_name
            } else {
                format!("{trait_name} for {type_name}")
            };
            // Impl blocks behave like class extensions.
            out.push(boundary(&map, pos, ChunkKind::Class, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = RS_TRAIT.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Interface, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = RS_MOD.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Module, &name, 0, true));
            pos += match_len(&caps);
        } else if RS_USE.is_match(window) {
            out.push(boundary(&map, pos, ChunkKind::Import, "", 0, true));
            pos = skip_to_eol(bytes, pos);
        } else {
            pos += 1;
        }
    }

    out
}

fn scan_go(source: &str) -> Vec<SemanticBoundary> {
    let bytes = source.as_bytes();
    let map = LineMap::new(source);
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        pos = skip_whitespace(bytes, pos);
        if pos >= bytes.len() {
            break;
        }
        if at_comment(bytes, pos) {
            pos = skip_comment(bytes, pos);
            continue;
        }
        if bytes[pos] == b'"' || bytes[pos] == b'`' {
            pos = if bytes[pos] == b'`' {
                skip_template_string(bytes, pos)
            } else {
                skip_string(bytes, pos, b'"')
            };
            continue;
        }

        let window = lookahead(bytes, pos, LOOKAHEAD);

        if let Some(caps) = GO_PACKAGE.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Module, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = GO_FUNC.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Function, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = GO_TYPE.captures(window) {
            let name = capture_name(&caps, 1);
            let is_struct = caps
                .get(2)
                .is_some_and(|m| m.as_bytes() == b"struct");
            let kind = if is_struct {
                ChunkKind::Struct
            } else {
                ChunkKind::Interface
            };
            out.push(boundary(&map, pos, kind, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(m) = GO_IMPORT.find(window) {
            out.push(boundary(&map, pos, ChunkKind::Import, "", 0, true));
            pos += m.end();
            // Parenthesized import blocks are one unit.
            pos = skip_whitespace(bytes, pos);
            if pos < bytes.len() && bytes[pos] == b'(' {
                pos = find_matching(bytes, pos, b'(', b')');
            }
        } else {
            pos += 1;
        }
    }

    out
}

fn scan_java(source: &str) -> Vec<SemanticBoundary> {
    let bytes = source.as_bytes();
    let map = LineMap::new(source);
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        pos = skip_whitespace(bytes, pos);
        if pos >= bytes.len() {
            break;
        }
        if at_comment(bytes, pos) {
            pos = skip_comment(bytes, pos);
            continue;
        }
        if bytes[pos] == b'"' || bytes[pos] == b'\'' {
            pos = skip_string(bytes, pos, bytes[pos]);
            continue;
        }

        let window = lookahead(bytes, pos, LOOKAHEAD_WIDE);

        if JAVA_PACKAGE.is_match(window) {
            out.push(boundary(&map, pos, ChunkKind::Module, "", 0, true));
            pos = skip_to_eol(bytes, pos);
        } else if JAVA_IMPORT.is_match(window) {
            out.push(boundary(&map, pos, ChunkKind::Import, "", 0, true));
            pos = skip_to_eol(bytes, pos);
        } else if let Some(caps) = JAVA_CLASS.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Class, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = JAVA_INTERFACE.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Interface, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = JAVA_ENUM.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Enum, &name, 0, true));
            pos += match_len(&caps);
        } else {
            pos += 1;
        }
    }

    out
}

fn scan_cpp(source: &str) -> Vec<SemanticBoundary> {
    let bytes = source.as_bytes();
    let map = LineMap::new(source);
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        pos = skip_whitespace(bytes, pos);
        if pos >= bytes.len() {
            break;
        }
        if at_comment(bytes, pos) {
            pos = skip_comment(bytes, pos);
            continue;
        }
        if bytes[pos] == b'"' || bytes[pos] == b'\'' {
            pos = skip_string(bytes, pos, bytes[pos]);
            continue;
        }

        let window = lookahead(bytes, pos, LOOKAHEAD_WIDE);

        if CPP_INCLUDE.is_match(window) {
            out.push(boundary(&map, pos, ChunkKind::Import, "", 0, true));
            pos = skip_to_eol(bytes, pos);
        } else if let Some(caps) = CPP_NAMESPACE.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Module, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = CPP_CLASS.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Class, &name, 0, true));
            pos += match_len(&caps);
        } else if let Some(caps) = CPP_STRUCT.captures(window) {
            let name = capture_name(&caps, 1);
            out.push(boundary(&map, pos, ChunkKind::Struct, &name, 0, true));
            pos += match_len(&caps);
        } else {
            pos += 1;
        }
    }

    out
}

/// Generic fallback: outermost `{`/`}` pairs become Block boundaries.
fn scan_generic(source: &str) -> Vec<SemanticBoundary> {
    let bytes = source.as_bytes();
    let mut out = Vec::new();
    let mut depth: i32 = 0;
    let mut line = 1u32;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\n' => line += 1,
            b'{' => {
                if depth == 0 {
                    out.push(SemanticBoundary {
                        line,
                        column: 1,
                        byte_offset: i as u32,
                        kind: ChunkKind::Block,
                        name: String::new(),
                        scope_depth: depth,
                        is_start: true,
                    });
                }
                depth += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    out.push(SemanticBoundary {
                        line,
                        column: 1,
                        byte_offset: i as u32,
                        kind: ChunkKind::Block,
                        name: String::new(),
                        scope_depth: depth,
                        is_start: false,
                    });
                }
            }
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn detect(source: &str, language: Language) -> Vec<SemanticBoundary> {
        BoundaryDetector::new().detect(source, language)
    }

    #[test]
    fn test_js_function_declaration() {
        let source = "function greet(name) {\n  return name;\n}\n";
        let boundaries = detect(source, Language::JavaScript);

        let start = &boundaries[0];
        assert_eq!(start.kind, ChunkKind::Function);
        assert_eq!(start.name, "greet");
        assert_eq!(start.byte_offset, 0);
        assert_eq!(start.line, 1);
        assert!(start.is_start);

        let end = boundaries
            .iter()
            .find(|b| !b.is_start)
            .expect("end boundary");
        assert_eq!(end.kind, ChunkKind::Function);
        assert_eq!(end.byte_offset as usize, source.rfind('}').unwrap());
    }

    #[test]
    fn test_js_anonymous_function() {
        let source = "const handler = function (event) { return event; };\n";
        let boundaries = detect(source, Language::JavaScript);
        // `function (...)` without a name is detected mid-statement.
        let func = boundaries
            .iter()
            .find(|b| b.kind == ChunkKind::Function && b.is_start)
            .expect("function boundary");
        assert_eq!(func.name, "<anonymous>");
    }

    #[test]
    fn test_js_arrow_binding() {
        let source = "const add = (a, b) => {\n  return a + b;\n};\n";
        let boundaries = detect(source, Language::JavaScript);
        let func = &boundaries[0];
        assert_eq!(func.kind, ChunkKind::Function);
        assert_eq!(func.name, "add");
    }

    #[test]
    fn test_js_export_function_keeps_name() {
        let source = "export function add(a, b) { return a + b; }\n";
        let boundaries = detect(source, Language::JavaScript);
        assert_eq!(boundaries[0].kind, ChunkKind::Function);
        assert_eq!(boundaries[0].name, "add");
    }

    #[test]
    fn test_js_export_statement() {
        let source = "export const VERSION = 3;\n";
        let boundaries = detect(source, Language::JavaScript);
        assert_eq!(boundaries[0].kind, ChunkKind::Export);
    }

    #[test]
    fn test_js_import_statement() {
        let source = "import { readFile } from 'fs';\nconst x = 1;\n";
        let boundaries = detect(source, Language::JavaScript);
        assert_eq!(boundaries[0].kind, ChunkKind::Import);
        assert_eq!(boundaries[0].byte_offset, 0);
    }

    #[test]
    fn test_js_string_interior_never_matches() {
        let source = "const s = \"function fake() {\";\nconst t = 'class Fake';\n";
        let boundaries = detect(source, Language::JavaScript);
        assert!(boundaries
            .iter()
            .all(|b| !matches!(b.kind, ChunkKind::Function | ChunkKind::Class)));
    }

    #[test]
    fn test_js_comment_interior_never_matches() {
        let source = "// function fake() {}\nlet x = 1;\n";
        let boundaries = detect(source, Language::JavaScript);
        assert!(boundaries.iter().all(|b| b.kind != ChunkKind::Function));
    }

    #[test]
    fn test_js_template_string_skipped() {
        let source = "const s = `function fake() { ${inner} }`;\nfunction real() {}\n";
        let boundaries = detect(source, Language::JavaScript);
        let functions: Vec<_> = boundaries
            .iter()
            .filter(|b| b.kind == ChunkKind::Function && b.is_start)
            .collect();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "real");
    }

    #[test]
    fn test_js_long_doc_comment() {
        let source = format!(
            "/**\n * {}\n */\nfunction documented() {{}}\n",
            "x".repeat(60)
        );
        let boundaries = detect(&source, Language::JavaScript);
        assert_eq!(boundaries[0].kind, ChunkKind::Comment);
        assert_eq!(boundaries[0].byte_offset, 0);
    }

    #[test]
    fn test_js_nested_ends_are_properly_nested() {
        let source = "class Outer {\n  method() {\n    function inner() {\n    }\n  }\n}\n";
        let boundaries = detect(source, Language::JavaScript);

        let inner_end = boundaries
            .iter()
            .find(|b| !b.is_start && b.kind == ChunkKind::Function)
            .expect("inner end");
        let class_end = boundaries
            .iter()
            .find(|b| !b.is_start && b.kind == ChunkKind::Class)
            .expect("class end");
        assert!(inner_end.byte_offset < class_end.byte_offset);
        assert_eq!(class_end.byte_offset as usize, source.rfind('}').unwrap());
    }

    #[test]
    fn test_ts_adds_interface_type_enum() {
        let source = "interface Shape { area(): number; }\ntype Alias = string;\nenum Color { Red, Green }\n";
        let boundaries = detect(source, Language::TypeScript);

        let kinds: Vec<ChunkKind> = boundaries.iter().filter(|b| b.is_start).map(|b| b.kind).collect();
        assert!(kinds.contains(&ChunkKind::Interface));
        assert!(kinds.contains(&ChunkKind::Statement));
        assert!(kinds.contains(&ChunkKind::Enum));

        let interface = boundaries.iter().find(|b| b.kind == ChunkKind::Interface).unwrap();
        assert_eq!(interface.name, "Shape");
    }

    #[test]
    fn test_python_def_and_class_with_depth() {
        let source = "class Greeter:\n    def greet(self):\n        pass\n\ndef top():\n    pass\n";
        let boundaries = detect(source, Language::Python);

        assert_eq!(boundaries[0].kind, ChunkKind::Class);
        assert_eq!(boundaries[0].name, "Greeter");
        assert_eq!(boundaries[0].scope_depth, 0);

        assert_eq!(boundaries[1].kind, ChunkKind::Function);
        assert_eq!(boundaries[1].name, "greet");
        assert_eq!(boundaries[1].scope_depth, 1);

        assert_eq!(boundaries[2].kind, ChunkKind::Function);
        assert_eq!(boundaries[2].name, "top");
        assert_eq!(boundaries[2].scope_depth, 0);
    }

    #[test]
    fn test_python_tab_indent_counts_as_four() {
        let source = "class C:\n\tdef m(self):\n\t\tpass\n";
        let boundaries = detect(source, Language::Python);
        let method = boundaries.iter().find(|b| b.name == "m").unwrap();
        assert_eq!(method.scope_depth, 1);
    }

    #[test]
    fn test_python_imports() {
        let source = "import os\nfrom pathlib import Path\n";
        let boundaries = detect(source, Language::Python);
        assert_eq!(boundaries.len(), 2);
        assert!(boundaries.iter().all(|b| b.kind == ChunkKind::Import));
    }

    #[test]
    fn test_python_docstring_interior_skipped() {
        let source = "def real():\n    \"\"\"\n    def fake():\n    \"\"\"\n    pass\n";
        let boundaries = detect(source, Language::Python);
        let functions: Vec<_> = boundaries.iter().filter(|b| b.kind == ChunkKind::Function).collect();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "real");
    }

    #[test]
    fn test_rust_declarations() {
        let source = "use std::fmt;\n\npub struct Point {\n    x: f64,\n}\n\nimpl fmt::Display for Point {\n}\n\npub async fn run() {}\n";
        let boundaries = detect(source, Language::Rust);

        assert_eq!(boundaries[0].kind, ChunkKind::Import);
        let point = boundaries.iter().find(|b| b.kind == ChunkKind::Struct).unwrap();
        assert_eq!(point.name, "Point");
        let run = boundaries.iter().find(|b| b.kind == ChunkKind::Function).unwrap();
        assert_eq!(run.name, "run");
    }

    #[test]
    fn test_rust_impl_trait_for_type() {
        let source = "impl Display for Point {\n}\n";
        let boundaries = detect(source, Language::Rust);
        assert_eq!(boundaries[0].kind, ChunkKind::Class);
        assert_eq!(boundaries[0].name, "Display for Point");
    }

    #[test]
    fn test_rust_mod_and_trait() {
        let source = "pub mod geometry;\npub trait Area {\n    fn area(&self) -> f64;\n}\n";
        let boundaries = detect(source, Language::Rust);
        assert_eq!(boundaries[0].kind, ChunkKind::Module);
        assert_eq!(boundaries[0].name, "geometry");
        let area = boundaries.iter().find(|b| b.kind == ChunkKind::Interface).unwrap();
        assert_eq!(area.name, "Area");
    }

    #[test]
    fn test_rust_string_interior_never_matches() {
        let source = "const MSG: &str = \"fn fake() {}\";\n";
        let boundaries = detect(source, Language::Rust);
        assert!(boundaries.iter().all(|b| b.kind != ChunkKind::Function));
    }

    #[test]
    fn test_go_declarations() {
        let source = "package main\n\nimport (\n\t\"fmt\"\n)\n\ntype Server struct {}\n\nfunc (s *Server) Run() {}\n\nfunc main() {}\n";
        let boundaries = detect(source, Language::Go);

        assert_eq!(boundaries[0].kind, ChunkKind::Module);
        assert_eq!(boundaries[0].name, "main");
        let server = boundaries.iter().find(|b| b.kind == ChunkKind::Struct).unwrap();
        assert_eq!(server.name, "Server");
        let names: Vec<&str> = boundaries
            .iter()
            .filter(|b| b.kind == ChunkKind::Function)
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(names, vec!["Run", "main"]);
    }

    #[test]
    fn test_java_declarations() {
        let source = "package com.example;\n\nimport java.util.List;\n\npublic final class Widget {\n}\n";
        let boundaries = detect(source, Language::Java);

        assert_eq!(boundaries[0].kind, ChunkKind::Module);
        assert_eq!(boundaries[1].kind, ChunkKind::Import);
        let class = boundaries.iter().find(|b| b.kind == ChunkKind::Class).unwrap();
        assert_eq!(class.name, "Widget");
    }

    #[test]
    fn test_cpp_declarations() {
        let source = "#include <vector>\n\nnamespace geo {\n\ntemplate <typename T>\nclass Shape {\n};\n\nstruct Point {\n};\n\n}\n";
        let boundaries = detect(source, Language::Cpp);

        assert_eq!(boundaries[0].kind, ChunkKind::Import);
        let ns = boundaries.iter().find(|b| b.kind == ChunkKind::Module).unwrap();
        assert_eq!(ns.name, "geo");
        let class = boundaries.iter().find(|b| b.kind == ChunkKind::Class).unwrap();
        assert_eq!(class.name, "Shape");
        let point = boundaries.iter().find(|b| b.kind == ChunkKind::Struct).unwrap();
        assert_eq!(point.name, "Point");
    }

    #[test]
    fn test_generic_outermost_blocks() {
        let source = "setup {\n  nested { }\n}\ntail {\n}\n";
        let boundaries = detect(source, Language::Unknown);

        let starts: Vec<u32> = boundaries
            .iter()
            .filter(|b| b.is_start)
            .map(|b| b.byte_offset)
            .collect();
        let ends: Vec<u32> = boundaries
            .iter()
            .filter(|b| !b.is_start)
            .map(|b| b.byte_offset)
            .collect();
        assert_eq!(starts.len(), 2);
        assert_eq!(ends.len(), 2);
        assert!(boundaries.iter().all(|b| b.kind == ChunkKind::Block));
    }

    #[test]
    fn test_output_sorted_and_stable() {
        let source = "import a from 'a';\nfunction one() {}\nfunction two() {}\n";
        let first = detect(source, Language::JavaScript);
        let second = detect(source, Language::JavaScript);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].byte_offset <= w[1].byte_offset));
    }

    #[test]
    fn test_malformed_input_is_best_effort() {
        let source = "function broken(a, b { // missing paren\nclass X";
        let boundaries = detect(source, Language::JavaScript);
        // Whatever prefix parses is returned; nothing panics.
        assert!(boundaries.iter().any(|b| b.kind == ChunkKind::Function));
    }
}
