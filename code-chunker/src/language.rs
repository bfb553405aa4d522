use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported programming languages.
///
/// The discriminants are part of the file-index wire format, so they are
/// fixed and must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Language {
    Unknown = 0,
    JavaScript = 1,
    TypeScript = 2,
    Python = 3,
    Rust = 4,
    Go = 5,
    Java = 6,
    Cpp = 7,
    C = 8,
    CSharp = 9,
    Ruby = 10,
    Php = 11,
    Swift = 12,
    Kotlin = 13,
}

impl Language {
    /// Detect language from a file path's extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Detect language from a file extension string (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" | "mts" => Language::TypeScript,
            "py" | "pyw" => Language::Python,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "java" => Language::Java,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "h" => Language::Cpp,
            "c" => Language::C,
            "cs" => Language::CSharp,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            _ => Language::Unknown,
        }
    }

    /// Get the language name as string.
    pub fn name(self) -> &'static str {
        match self {
            Language::Unknown => "unknown",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
        }
    }

    /// Wire encoding used by the persistent file index.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode the wire representation; unrecognized values map to `Unknown`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Language::JavaScript,
            2 => Language::TypeScript,
            3 => Language::Python,
            4 => Language::Rust,
            5 => Language::Go,
            6 => Language::Java,
            7 => Language::Cpp,
            8 => Language::C,
            9 => Language::CSharp,
            10 => Language::Ruby,
            11 => Language::Php,
            12 => Language::Swift,
            13 => Language::Kotlin,
            _ => Language::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("rs"), Language::Rust);
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("ts"), Language::TypeScript);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("mjs"), Language::JavaScript);
        assert_eq!(Language::from_extension("kt"), Language::Kotlin);
        assert_eq!(Language::from_extension("h"), Language::Cpp);
        assert_eq!(Language::from_extension("unknown"), Language::Unknown);
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(Language::from_extension("RS"), Language::Rust);
        assert_eq!(Language::from_extension("Py"), Language::Python);
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path(Path::new("main.rs")), Language::Rust);
        assert_eq!(Language::from_path(Path::new("dir/script.py")), Language::Python);
        assert_eq!(Language::from_path(Path::new("index.ts")), Language::TypeScript);
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::Unknown);
    }

    #[test]
    fn test_wire_round_trip() {
        for value in 0u8..=13 {
            let language = Language::from_u8(value);
            assert_eq!(language.as_u8(), value);
        }
        assert_eq!(Language::from_u8(200), Language::Unknown);
    }
}
