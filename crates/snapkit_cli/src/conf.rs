//! Defaults and the optional `snapkit.toml` settings file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use snapkit_io_fs::{EnumCopyPatternMode, EnumCopySymlinkStrategy};
use tracing::debug;

use crate::spec::ArchiveError;

pub const C_DIR_SOURCE_DEFAULT: &str = "src";
pub const C_FILE_CONFIG_DEFAULT: &str = "tsconfig.json";
pub const C_DIR_EXAMPLES_DEFAULT: &str = "examples";
/// Looked up in the project root when `--config` is not given.
pub const C_FILE_SETTINGS_DEFAULT: &str = "snapkit.toml";

/// On-disk layout of the settings file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSettings {
    source: Option<PathBuf>,
    config_file: Option<PathBuf>,
    examples: Option<PathBuf>,
    exclude: Option<Vec<String>>,
    pattern_mode: Option<String>,
    symlinks: Option<String>,
}

/// Validated settings; `None` means "not set, fall through to default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecSettings {
    pub dir_source: Option<PathBuf>,
    pub file_config: Option<PathBuf>,
    pub dir_examples: Option<PathBuf>,
    pub patterns_exclude: Option<Vec<String>>,
    pub rule_pattern: Option<EnumCopyPatternMode>,
    pub rule_symlink: Option<EnumCopySymlinkStrategy>,
}

impl SpecSettings {
    /// Parse settings text; `path` is only used in error messages.
    pub fn parse(txt: &str, path: &Path) -> Result<Self, ArchiveError> {
        let to_settings_error = |message: String| ArchiveError::Settings {
            path: path.to_path_buf(),
            message,
        };

        let raw: RawSettings = toml::from_str(txt).map_err(|e| to_settings_error(e.to_string()))?;
        let rule_pattern = raw
            .pattern_mode
            .as_deref()
            .map(str::parse::<EnumCopyPatternMode>)
            .transpose()
            .map_err(|e| to_settings_error(e.to_string()))?;
        let rule_symlink = raw
            .symlinks
            .as_deref()
            .map(str::parse::<EnumCopySymlinkStrategy>)
            .transpose()
            .map_err(|e| to_settings_error(e.to_string()))?;

        Ok(Self {
            dir_source: raw.source,
            file_config: raw.config_file,
            dir_examples: raw.examples,
            patterns_exclude: raw.exclude,
            rule_pattern,
            rule_symlink,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ArchiveError> {
        let txt = fs::read_to_string(path).map_err(|e| ArchiveError::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("loaded settings from {}", path.display());
        Self::parse(&txt, path)
    }

    /// An explicit path must exist; the default `<root>/snapkit.toml` is
    /// optional.
    pub fn resolve(dir_root: &Path, file_settings: Option<&Path>) -> Result<Self, ArchiveError> {
        if let Some(path) = file_settings {
            return Self::load(path);
        }
        let path_default = dir_root.join(C_FILE_SETTINGS_DEFAULT);
        if path_default.is_file() {
            Self::load(&path_default)
        } else {
            Ok(Self::default())
        }
    }
}
