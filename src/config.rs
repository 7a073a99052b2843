//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/pdfmarks/pdfmarks.toml`
//! 3. Local config: `<dir>/.pdfmarks.toml` (directory of the processed documents)
//! 4. Environment variables: `PDFMARKS_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::util::path::expand_env_vars;

/// Unified configuration for pdfmarks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory scanned by `batch` when none is given (default: ".")
    pub input_dir: PathBuf,
    /// Appended to the file stem of generated documents (default: "-bookmarked")
    pub suffix: String,
    /// Extension of the documents picked up by `batch`, without dot (default: "pdf")
    pub extension: String,
    /// Descend into subdirectories during `batch`
    pub recursive: bool,
    /// Trim surrounding whitespace from titles read out of documents
    pub strip_titles: bool,
    /// Page used for bookmarks whose destination cannot be resolved
    pub unresolved_page: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            suffix: "-bookmarked".into(),
            extension: "pdf".into(),
            recursive: false,
            strip_titles: true,
            unresolved_page: 1,
        }
    }
}

/// Raw settings for intermediate parsing (None → not specified, inherit from base).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub input_dir: Option<PathBuf>,
    pub suffix: Option<String>,
    pub extension: Option<String>,
    pub recursive: Option<bool>,
    pub strip_titles: Option<bool>,
    pub unresolved_page: Option<u32>,
}

/// Get the XDG config directory for pdfmarks.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pdfmarks").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("pdfmarks.toml"))
}

/// Get the path to the local config file in a document directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".pdfmarks.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.input_dir.to_string_lossy().as_ref());
        self.input_dir = PathBuf::from(expanded);
    }

    /// Normalize values that have a single canonical spelling.
    fn normalize(&mut self) {
        self.extension = self.extension.trim_start_matches('.').to_string();
    }

    /// Reject combinations that would make outputs collide with their inputs.
    fn validate(&self) -> Result<(), ApplicationError> {
        if self.suffix.is_empty() {
            return Err(ApplicationError::Config {
                message: "suffix must not be empty, outputs would overwrite inputs".into(),
            });
        }
        if self.suffix.contains(['/', '\\']) {
            return Err(ApplicationError::Config {
                message: format!("suffix must not contain path separators: {}", self.suffix),
            });
        }
        if self.extension.is_empty() {
            return Err(ApplicationError::Config {
                message: "extension must not be empty".into(),
            });
        }
        if self.unresolved_page == 0 {
            return Err(ApplicationError::Config {
                message: "unresolved_page starts at 1".into(),
            });
        }
        Ok(())
    }

    /// Merge overlay config onto self (base): overlay wins if specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            input_dir: overlay
                .input_dir
                .clone()
                .unwrap_or_else(|| self.input_dir.clone()),
            suffix: overlay.suffix.clone().unwrap_or_else(|| self.suffix.clone()),
            extension: overlay
                .extension
                .clone()
                .unwrap_or_else(|| self.extension.clone()),
            recursive: overlay.recursive.unwrap_or(self.recursive),
            strip_titles: overlay.strip_titles.unwrap_or(self.strip_titles),
            unresolved_page: overlay.unresolved_page.unwrap_or(self.unresolved_page),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a local `.pdfmarks.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/pdfmarks/pdfmarks.toml`
    /// 3. Local config: `<local_dir>/.pdfmarks.toml`
    /// 4. Environment variables: `PDFMARKS_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        current.normalize();
        current.validate()?;

        Ok(current)
    }

    /// Apply PDFMARKS_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("PDFMARKS").try_parsing(true))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("input_dir") {
            settings.input_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("suffix") {
            settings.suffix = val;
        }
        if let Ok(val) = config.get_string("extension") {
            settings.extension = val;
        }
        if let Ok(val) = config.get_bool("recursive") {
            settings.recursive = val;
        }
        if let Ok(val) = config.get_bool("strip_titles") {
            settings.strip_titles = val;
        }
        if let Ok(val) = config.get_int("unresolved_page") {
            settings.unresolved_page = u32::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("PDFMARKS_UNRESOLVED_PAGE out of range: {val}"),
            })?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# pdfmarks configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/pdfmarks/pdfmarks.toml
#   Local:  <document dir>/.pdfmarks.toml
#   Env:    PDFMARKS_* environment variables

# Directory scanned by `pdfmarks batch` without argument
# input_dir = "."

# Appended to the file stem of generated documents: book.pdf -> book-bookmarked.pdf
# suffix = "-bookmarked"

# Extension of documents picked up by `pdfmarks batch`
# extension = "pdf"

# Descend into subdirectories
# recursive = false

# Trim whitespace around bookmark titles read from documents
# strip_titles = true

# Page for bookmarks whose destination cannot be resolved
# unresolved_page = 1
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
