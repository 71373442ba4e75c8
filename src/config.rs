//! Configuration loading and validation.
//!
//! Settings come from three layers, later layers overriding earlier ones:
//!
//! ```text
//! stock defaults  →  gallery-shrink.toml (or --config FILE)  →  command-line flags
//! ```
//!
//! Each layer is a sparse TOML table merged onto the previous one with
//! [`merge_toml`]; the merged result is deserialized into [`GalleryConfig`]
//! and validated once.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! quality = 90               # JPEG quality (1-100)
//! max_edge = 1200            # Longest side in pixels; smaller images are not upscaled
//! on_decode_failure = "drop" # "drop" or "copy" the original bytes of undecodable JPEGs
//!
//! [archive]
//! suffix = "proc"            # Trip.zip → Trip-proc.zip
//! skip_garbage = false       # Leave out __MACOSX/, .DS_Store, Thumbs.db
//!
//! [processing]
//! max_processes = 4          # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "gallery-shrink.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete tool configuration.
///
/// All fields have defaults; config files need only the values they change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Resize and re-encode settings.
    pub images: ImagesConfig,
    /// Output naming and entry filtering.
    pub archive: ArchiveConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

/// What to do with a JPEG entry that fails to decode or re-encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeFailurePolicy {
    /// Leave the entry out of the destination archive.
    #[default]
    #[serde(rename = "drop")]
    Discard,
    /// Copy the original bytes unchanged.
    #[serde(rename = "copy")]
    KeepOriginal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Bound on the longer edge, in pixels.
    pub max_edge: u32,
    pub on_decode_failure: DecodeFailurePolicy,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            max_edge: 1200,
            on_decode_failure: DecodeFailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Appended to the archive stem: `Trip.zip` → `Trip-<suffix>.zip`.
    pub suffix: String,
    /// Drop archive-tool metadata entries (`__MACOSX/` and friends).
    pub skip_garbage: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            suffix: "proc".to_string(),
            skip_garbage: false,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.max_edge == 0 {
            return Err(ConfigError::Validation(
                "images.max_edge must be greater than zero".into(),
            ));
        }
        let suffix = &self.archive.suffix;
        if suffix.is_empty() {
            return Err(ConfigError::Validation(
                "archive.suffix must not be empty".into(),
            ));
        }
        if suffix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "archive.suffix must not contain path separators: {suffix:?}"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GalleryConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays (in order) onto the stock defaults, then deserialize and validate.
pub fn resolve_config(
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = overlays
        .into_iter()
        .fold(stock_defaults_value()?, merge_toml);
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path` on top of the stock defaults.
///
/// A missing file is only an error when `required` is set (an explicit
/// `--config`); otherwise the defaults apply.
pub fn load_config(path: &Path, required: bool) -> Result<GalleryConfig, ConfigError> {
    match load_raw_config(path)? {
        Some(overlay) => resolve_config([overlay]),
        None if required => Err(ConfigError::NotFound(path.to_path_buf())),
        None => resolve_config(std::iter::empty()),
    }
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gallery-shrink configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Picked up from ./gallery-shrink.toml, or pass --config FILE.
# Command-line flags override values from this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Image re-encoding
# ---------------------------------------------------------------------------
[images]
# JPEG encoding quality (1 = worst, 100 = best).
quality = 90

# Longest side in pixels. Larger images are scaled down preserving aspect
# ratio; smaller images keep their size and are only re-encoded.
max_edge = 1200

# What to do with a JPEG entry that cannot be decoded or re-encoded:
#   "drop" - leave it out of the output archive
#   "copy" - keep the original bytes unchanged
on_decode_failure = "drop"

# ---------------------------------------------------------------------------
# Archives
# ---------------------------------------------------------------------------
[archive]
# Output archives are written next to the source: Trip.zip -> Trip-proc.zip.
# Archives already ending in -<suffix> are ignored in directory mode.
suffix = "proc"

# Leave archive-tool metadata out of the output
# (__MACOSX/ resource forks, .DS_Store, Thumbs.db).
skip_garbage = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = GalleryConfig::default();
        assert_eq!(config.images.quality, 90);
        assert_eq!(config.images.max_edge, 1200);
        assert_eq!(config.images.on_decode_failure, DecodeFailurePolicy::Discard);
        assert_eq!(config.archive.suffix, "proc");
        assert!(!config.archive.skip_garbage);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_partial_config() {
        let config: GalleryConfig = toml::from_str("[images]\nmax_edge = 2048\n").unwrap();
        assert_eq!(config.images.max_edge, 2048);
        // Default values preserved
        assert_eq!(config.images.quality, 90);
        assert_eq!(config.archive.suffix, "proc");
    }

    #[test]
    fn parse_decode_failure_policy() {
        let config: GalleryConfig =
            toml::from_str("[images]\non_decode_failure = \"copy\"\n").unwrap();
        assert_eq!(
            config.images.on_decode_failure,
            DecodeFailurePolicy::KeepOriginal
        );
        let bad: Result<GalleryConfig, _> =
            toml::from_str("[images]\non_decode_failure = \"explode\"\n");
        assert!(bad.is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(DEFAULT_CONFIG_FILE), false).unwrap();
        assert_eq!(config, GalleryConfig::default());
    }

    #[test]
    fn load_config_missing_required_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(&tmp.path().join("custom.toml"), true);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            "[archive]\nsuffix = \"web\"\nskip_garbage = true\n\n[processing]\nmax_processes = 2\n",
        )
        .unwrap();

        let config = load_config(&path, true).unwrap();
        assert_eq!(config.archive.suffix, "web");
        assert!(config.archive.skip_garbage);
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.images.quality, 90);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[images\nquality = ").unwrap();
        assert!(matches!(
            load_config(&path, false),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[images]\nquality = 0\n").unwrap();
        assert!(matches!(
            load_config(&path, false),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<GalleryConfig, _> = toml::from_str("[images]\nqualty = 80\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<GalleryConfig, _> = toml::from_str("[video]\nfps = 30\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_quality_bounds() {
        let mut config = GalleryConfig::default();
        config.images.quality = 100;
        assert!(config.validate().is_ok());
        config.images.quality = 1;
        assert!(config.validate().is_ok());
        config.images.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_max_edge_zero() {
        let mut config = GalleryConfig::default();
        config.images.max_edge = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_suffix() {
        let mut config = GalleryConfig::default();
        config.archive.suffix = String::new();
        assert!(config.validate().is_err());
        config.archive.suffix = "../evil".to_string();
        assert!(config.validate().is_err());
        config.archive.suffix = "small".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_zero_workers() {
        let mut config = GalleryConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Merging
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("[images]\nquality = 90\nmax_edge = 1200").unwrap();
        let overlay: toml::Value = toml::from_str("[images]\nquality = 70").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["images"]["quality"].as_integer(), Some(70));
        assert_eq!(merged["images"]["max_edge"].as_integer(), Some(1200));
    }

    #[test]
    fn resolve_config_layers_apply_in_order() {
        let file: toml::Value = toml::from_str("[images]\nquality = 70\nmax_edge = 800").unwrap();
        let flags: toml::Value = toml::from_str("[images]\nquality = 60").unwrap();
        let config = resolve_config([file, flags]).unwrap();
        assert_eq!(config.images.quality, 60);
        assert_eq!(config.images.max_edge, 800);
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("[images]\nmax_edge = 0").unwrap();
        assert!(resolve_config([overlay]).is_err());
    }

    // =========================================================================
    // Threads and stock file
    // =========================================================================

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 64),
        };
        assert_eq!(effective_threads(&config), cores);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: GalleryConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, GalleryConfig::default());
    }

    #[test]
    fn stock_defaults_value_is_table() {
        let value = stock_defaults_value().unwrap();
        assert!(value.is_table());
        assert!(value.get("images").is_some());
        assert!(value.get("archive").is_some());
    }
}
