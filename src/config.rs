//! Tool configuration module.
//!
//! Handles loading and validating `bg-index.toml`. User values are merged on
//! top of stock defaults, so a config file only needs the keys it overrides.
//!
//! ## Config File Location
//!
//! Place `bg-index.toml` in the directory being indexed (the `--source`
//! directory). The file is optional; without it every option keeps its
//! default. It is never listed in the generated index, and neither is the
//! index file itself.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_file = "bg_index.json"   # Index filename, written into the source dir
//! image_extensions = ["jpg", "jpeg", "png", "webp"]
//! ignore_files = []               # Extra filenames excluded from local scans
//!
//! [remote]
//! owner = ""                      # Repository owner (user or organization)
//! repo = ""                       # Repository name
//! branch = "main"                 # Branch to list
//! root_path = ""                  # Subtree to index, "" for the repo root
//! request_delay_secs = 0.5        # Pause between directory listing requests
//! retry_count = 3                 # Attempts per listing before giving up on it
//! # auth_token = "ghp_..."        # Sent as `Authorization: token ...`
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the source directory. Always excluded
/// from local scans, alongside the configured output file.
pub const CONFIG_FILE_NAME: &str = "bg-index.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Indexer configuration loaded from `bg-index.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Filename of the generated index, written into the source directory.
    pub output_file: String,
    /// Recognized image extensions, matched case-insensitively, no dot.
    pub image_extensions: Vec<String>,
    /// Extra filenames never included in a local scan.
    pub ignore_files: Vec<String>,
    /// Remote (GitHub contents API) settings, used by `fetch`.
    pub remote: RemoteConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            output_file: "bg_index.json".to_string(),
            image_extensions: ["jpg", "jpeg", "png", "webp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            ignore_files: Vec::new(),
            remote: RemoteConfig::default(),
        }
    }
}

impl IndexConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_file.is_empty() || self.output_file.contains('/') {
            return Err(ConfigError::Validation(
                "output_file must be a bare filename".into(),
            ));
        }
        if self.image_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "image_extensions must not be empty".into(),
            ));
        }
        if self.image_extensions.iter().any(|ext| ext.starts_with('.')) {
            return Err(ConfigError::Validation(
                "image_extensions entries are written without the leading dot".into(),
            ));
        }
        if self.remote.retry_count == 0 {
            return Err(ConfigError::Validation(
                "remote.retry_count must be at least 1".into(),
            ));
        }
        if !self.remote.request_delay_secs.is_finite() || self.remote.request_delay_secs < 0.0 {
            return Err(ConfigError::Validation(
                "remote.request_delay_secs must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// Does `name` carry one of the recognized image extensions?
    pub fn matches_extension(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .map(|ext| ext.to_string_lossy())
            .is_some_and(|ext| {
                self.image_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
            })
    }

    /// Is `name` excluded from local scans? Covers the index file itself, the
    /// config file, and any configured extras.
    pub fn is_ignored(&self, name: &str) -> bool {
        name == self.output_file
            || name == CONFIG_FILE_NAME
            || self.ignore_files.iter().any(|ignored| ignored == name)
    }
}

/// Remote repository settings for the GitHub contents API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch passed as the `ref` query parameter.
    pub branch: String,
    /// Subtree to index, relative to the repository root. Empty = the root.
    pub root_path: String,
    /// Seconds to wait before each listing request after the first.
    pub request_delay_secs: f64,
    /// Attempts per listing request before the directory is treated as empty.
    pub retry_count: u32,
    /// Personal access token attached as `Authorization: token ...`.
    pub auth_token: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            root_path: String::new(),
            request_delay_secs: 0.5,
            retry_count: 3,
            auth_token: None,
        }
    }
}

impl RemoteConfig {
    /// Check the fields `fetch` cannot do without.
    pub fn validate_for_fetch(&self) -> Result<(), ConfigError> {
        if self.owner.is_empty() || self.repo.is_empty() {
            return Err(ConfigError::Validation(
                "remote.owner and remote.repo must be set for fetch".into(),
            ));
        }
        if self.branch.is_empty() {
            return Err(ConfigError::Validation(
                "remote.branch must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Listing URL for the configured repository subtree.
    pub fn root_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/contents/{}?ref={}",
            self.owner, self.repo, self.root_path, self.branch
        )
    }
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Stock defaults as a `toml::Value::Table` — the base layer user overrides
/// are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(IndexConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
/// Base keys absent from the overlay are preserved.
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

/// Load `bg-index.toml` from a directory as a raw TOML value.
///
/// `Ok(None)` when the file does not exist; `Err` when it exists but does not
/// parse.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<IndexConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: IndexConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config for a source directory: stock defaults, with a
/// `bg-index.toml` overlay when present, rejecting unknown keys and
/// validating the result.
pub fn load_config(dir: &Path) -> Result<IndexConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `bg-index.toml` with all keys documented.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# bg-index Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# Place this file in the directory being indexed; it is excluded from the
# generated index automatically, as is the index file itself.

# Filename of the generated index, written into the source directory.
output_file = "bg_index.json"

# Recognized image extensions, matched case-insensitively, without the dot.
image_extensions = ["jpg", "jpeg", "png", "webp"]

# Extra filenames to exclude from local scans.
ignore_files = []

# ---------------------------------------------------------------------------
# Remote mode (the `fetch` command) - GitHub contents API
# ---------------------------------------------------------------------------
[remote]
# Repository owner and name, e.g. owner = "octocat", repo = "wallpapers".
owner = ""
repo = ""

# Branch to list.
branch = "main"

# Subtree to index, relative to the repository root. "" = the whole repo.
root_path = ""

# Seconds to pause before each listing request after the first, to stay
# under the API rate limit.
request_delay_secs = 0.5

# Attempts per listing request. A directory that fails every attempt is
# treated as empty; the run continues.
retry_count = 3

# Personal access token, sent as `Authorization: token ...`. Falls back to
# the GITHUB_TOKEN environment variable when unset.
# auth_token = "ghp_..."
"##
}
