//! Codec limits and loader options
//!
//! Settings can be loaded from a TOML file; every key is optional and falls
//! back to the limits the original game tools enforce.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::generation::Generation;

/// Codec configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Longest string subrecord accepted in TES3 files (default: 255)
    #[serde(default = "default_tes3_string_len")]
    pub tes3_max_string_len: usize,
    /// Longest string subrecord accepted in TES4 files (default: 511)
    #[serde(default = "default_tes4_string_len")]
    pub tes4_max_string_len: usize,
    /// Upper bound for a record's declared body size (default: 64 MiB)
    #[serde(default = "default_max_record_size")]
    pub max_record_size: u64,
    /// Deepest group nesting accepted when decoding (default: 32)
    #[serde(default = "default_max_group_depth")]
    pub max_group_depth: usize,
    /// Keep records without a schema as generic records (default: true)
    #[serde(default = "default_true")]
    pub keep_unknown_records: bool,
}

fn default_tes3_string_len() -> usize {
    CodecConfig::DEFAULT.tes3_max_string_len
}

fn default_tes4_string_len() -> usize {
    CodecConfig::DEFAULT.tes4_max_string_len
}

fn default_max_record_size() -> u64 {
    CodecConfig::DEFAULT.max_record_size
}

fn default_max_group_depth() -> usize {
    CodecConfig::DEFAULT.max_group_depth
}

fn default_true() -> bool {
    true
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl CodecConfig {
    /// Built-in limits, usable in `static` and `const` contexts.
    pub const DEFAULT: Self = Self {
        tes3_max_string_len: 255,
        tes4_max_string_len: 511,
        max_record_size: 64 * 1024 * 1024,
        max_group_depth: 32,
        keep_unknown_records: true,
    };

    /// String length cap for the given file generation.
    pub fn max_string_len(&self, generation: Generation) -> usize {
        match generation {
            Generation::Tes3 => self.tes3_max_string_len,
            Generation::Tes4 => self.tes4_max_string_len,
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load a configuration file, or return defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no codec config, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EsmError;

    #[test]
    fn test_default_limits() {
        let config = CodecConfig::default();
        assert_eq!(config.max_string_len(Generation::Tes3), 255);
        assert_eq!(config.max_string_len(Generation::Tes4), 511);
        assert_eq!(config.max_group_depth, 32);
        assert!(config.keep_unknown_records);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = CodecConfig::from_toml_str("tes4_max_string_len = 1024\n").unwrap();
        assert_eq!(config.tes4_max_string_len, 1024);
        assert_eq!(config.tes3_max_string_len, 255);
        assert_eq!(config.max_record_size, 64 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_toml() {
        let result = CodecConfig::from_toml_str("max_record_size = \"big\"");
        assert!(matches!(result, Err(EsmError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codec.toml");
        std::fs::write(&path, "keep_unknown_records = false\n").unwrap();

        let config = CodecConfig::load(&path).unwrap();
        assert!(!config.keep_unknown_records);

        let missing = CodecConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(missing, CodecConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = CodecConfig {
            max_record_size: 1024,
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(CodecConfig::from_toml_str(&text).unwrap(), config);
    }
}
