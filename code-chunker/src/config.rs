use crate::language::Language;
use serde::{Deserialize, Serialize};

/// Configuration for code chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum tokens per chunk (hard limit for the window search).
    pub max_chunk_tokens: u32,

    /// Minimum tokens per chunk; undersized window chunks are extended to the
    /// next line unless they are the final chunk.
    pub min_chunk_tokens: u32,

    /// Token overlap between consecutive chunks of an oversized region.
    pub overlap_tokens: u32,

    /// Respect semantic boundaries when partitioning the source.
    pub respect_boundaries: bool,

    /// Attach parent scope and namespace context to each chunk.
    pub include_context: bool,

    /// Attach import lines not physically contained in the chunk.
    pub preserve_imports: bool,

    /// Source language; `Unknown` auto-detects from the file path.
    pub language: Language,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: 512,
            min_chunk_tokens: 64,
            overlap_tokens: 50,
            respect_boundaries: true,
            include_context: true,
            preserve_imports: true,
            language: Language::Unknown,
        }
    }
}

impl ChunkerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_tokens == 0 {
            return Err("max_chunk_tokens must be greater than 0".into());
        }

        if self.min_chunk_tokens >= self.max_chunk_tokens {
            return Err("min_chunk_tokens must be less than max_chunk_tokens".into());
        }

        if self.overlap_tokens >= self.max_chunk_tokens {
            return Err("overlap_tokens must be less than max_chunk_tokens".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ChunkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_chunk_tokens, 512);
        assert_eq!(config.min_chunk_tokens, 64);
        assert_eq!(config.overlap_tokens, 50);
        assert!(config.respect_boundaries);
    }

    #[test]
    fn test_invalid_min_tokens() {
        let config = ChunkerConfig {
            min_chunk_tokens: 600,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_overlap() {
        let config = ChunkerConfig {
            overlap_tokens: 512,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
