use serde::{Deserialize, Serialize};

/// Default maximum file size considered by a scan (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for repository scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Glob patterns a file must match to be scanned. Empty means all files.
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Glob patterns excluding files and directories. Empty installs
    /// [`default_exclude_patterns`] at indexer construction.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Follow symbolic links during the walk.
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Hash file contents during the scan.
    #[serde(default = "default_true")]
    pub compute_content_hash: bool,

    /// Pair equal-content files across scans as renames.
    #[serde(default = "default_true")]
    pub detect_renames: bool,

    /// Files larger than this are silently excluded.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Worker count for parallel hashing, clamped to the CPU count.
    #[serde(default = "default_parallel_workers")]
    pub parallel_workers: u32,
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_parallel_workers() -> u32 {
    4
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            follow_symlinks: false,
            compute_content_hash: true,
            detect_renames: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            parallel_workers: default_parallel_workers(),
        }
    }
}

/// Exclude patterns installed when the configuration leaves the list empty.
pub fn default_exclude_patterns() -> Vec<String> {
    [
        "**/node_modules/**",
        "**/.git/**",
        "**/dist/**",
        "**/build/**",
        "**/__pycache__/**",
        "**/*.min.js",
        "**/*.min.css",
        "**/vendor/**",
        "**/.venv/**",
        "**/target/**",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = IndexerConfig::default();
        assert!(config.compute_content_hash);
        assert!(config.detect_renames);
        assert!(!config.follow_symlinks);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.parallel_workers, 4);
        assert!(config.exclude_patterns.is_empty());
    }

    #[test]
    fn test_default_excludes_cover_common_dirs() {
        let patterns = default_exclude_patterns();
        assert_eq!(patterns.len(), 10);
        assert!(patterns.iter().any(|p| p.contains("node_modules")));
        assert!(patterns.iter().any(|p| p.contains(".git")));
        assert!(patterns.iter().any(|p| p.contains("target")));
    }
}
