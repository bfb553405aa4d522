//! Glob pattern matching over relative paths.
//!
//! `*` matches any run of non-separator characters, `**` matches any run
//! including separators, and `?` matches a single non-separator character.
//! Matching is case-insensitive and anchored to the whole path.

use crate::error::{IndexerError, Result};
use regex::{Regex, RegexBuilder};

/// Translate a glob pattern into an unanchored regex body.
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str(r"[^/\\]*");
                }
            }
            '?' => out.push_str(r"[^/\\]"),
            '.' | '(' | ')' | '[' | ']' | '{' | '}' | '+' | '^' | '$' | '|' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    out
}

fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(&format!("^(?:{})$", glob_to_regex(pattern)))
        .case_insensitive(true)
        .build()
        .map_err(|e| IndexerError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Match a relative path against a single glob pattern.
///
/// Invalid patterns match nothing.
pub fn glob_match(path: &str, pattern: &str) -> bool {
    compile(pattern).map(|re| re.is_match(path)).unwrap_or(false)
}

/// A set of glob patterns compiled once.
#[derive(Debug)]
pub(crate) struct GlobList {
    patterns: Vec<Regex>,
}

impl GlobList {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_stops_at_separator() {
        assert!(glob_match("main.rs", "*.rs"));
        assert!(!glob_match("src/main.rs", "*.rs"));
    }

    #[test]
    fn test_double_star_crosses_separators() {
        assert!(glob_match("src/main.rs", "**.rs"));
        assert!(glob_match("a/b/c/util.min.js", "**/*.min.js"));
        assert!(glob_match("src/node_modules/pkg/index.js", "**/node_modules/**"));
        assert!(glob_match("deep/nested/.git/objects/ab", "**/.git/**"));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        assert!(glob_match("a.rs", "?.rs"));
        assert!(!glob_match("ab.rs", "?.rs"));
        assert!(!glob_match("/.rs", "?.rs"));
    }

    #[test]
    fn test_match_is_anchored() {
        assert!(!glob_match("src/main.rs.bak", "**/*.rs"));
        assert!(!glob_match("xmain.rs", "main.rs"));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert!(glob_match("README.MD", "readme.md"));
        assert!(glob_match("Src/Main.RS", "src/*.rs"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        assert!(glob_match("file.name", "file.name"));
        assert!(!glob_match("fileXname", "file.name"));
        assert!(glob_match("a+b.txt", "a+b.txt"));
    }

    #[test]
    fn test_brackets_are_literal_not_classes() {
        assert!(glob_match("[draft] notes.md", "[draft] notes.md"));
        assert!(!glob_match("d", "[draft]"));
    }

    #[test]
    fn test_glob_list() {
        let list =
            GlobList::compile(&["*.rs".to_string(), "**/tests/**".to_string()]).unwrap();
        assert!(list.matches("lib.rs"));
        assert!(list.matches("crate/tests/it.rs"));
        assert!(!list.matches("crate/src/lib.py"));
        assert!(!list.is_empty());
    }
}
