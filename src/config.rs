//! Shared configuration loading for scopeline.
//!
//! `defaults/scopeline.default.toml` is embedded into every binary so that
//! docs and runtime behavior stay in sync. Applications layer user-specific
//! files on top of those defaults via [`Loader`] before deserializing into
//! [`ScopelineConfig`].

use crate::scanning::MatchBudget;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/scopeline.default.toml");

/// Top-level configuration consumed by scopeline applications.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopelineConfig {
    pub matching: MatchingConfig,
    pub tokenizing: TokenizingConfig,
}

/// Knobs for the scanner backends.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    /// Per-pattern step budget for backtracking engines; 0 disables it.
    pub backtrack_limit: u32,
}

/// Knobs for the line tokenizer.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenizingConfig {
    /// Rule-stack depth cap.
    pub max_depth: usize,
}

impl ScopelineConfig {
    /// The embedded defaults with no user overrides.
    pub fn defaults() -> Result<Self, ConfigError> {
        Loader::new().load()
    }

    /// The configured budget in the scanner's terms.
    pub fn budget(&self) -> MatchBudget {
        match self.matching.backtrack_limit {
            0 => MatchBudget::unlimited(),
            steps => MatchBudget::steps(steps),
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Loader { builder }
    }

    /// Layer a user configuration file over the defaults. Missing files
    /// are skipped silently.
    pub fn with_file(mut self, path: &Path) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.to_path_buf()).required(false));
        self
    }

    pub fn load(self) -> Result<ScopelineConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Loader::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_defaults() {
        let config = ScopelineConfig::defaults().expect("defaults to deserialize");
        assert_eq!(config.matching.backtrack_limit, 0);
        assert_eq!(config.tokenizing.max_depth, 128);
        assert_eq!(config.budget(), MatchBudget::unlimited());
    }

    #[test]
    fn test_missing_user_file_is_skipped() {
        let config = Loader::new()
            .with_file(Path::new("does/not/exist.toml"))
            .load()
            .unwrap();
        assert_eq!(config.tokenizing.max_depth, 128);
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[matching]\nbacktrack_limit = 50000").unwrap();
        file.flush().unwrap();

        let config = Loader::new().with_file(file.path()).load().unwrap();
        assert_eq!(config.matching.backtrack_limit, 50_000);
        assert_eq!(config.budget(), MatchBudget::steps(50_000));
        // Untouched sections keep their defaults.
        assert_eq!(config.tokenizing.max_depth, 128);
    }
}
