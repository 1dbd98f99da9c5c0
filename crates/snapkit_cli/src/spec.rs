//! Archive options, report, and error types.

use std::io;
use std::path::{Path, PathBuf};

use snapkit_io_fs::{
    CopyFileError, CopyTreeError, EnumCopyPatternMode, EnumCopySymlinkStrategy, ReportCopy,
    SpecCopyOptions,
};
use thiserror::Error;

use crate::conf::{C_DIR_EXAMPLES_DEFAULT, C_DIR_SOURCE_DEFAULT, C_FILE_CONFIG_DEFAULT};

/// Inputs of one `archive_example` call. Relative paths resolve against
/// `dir_root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecArchiveOptions {
    pub dir_root: PathBuf,
    /// Source tree copied recursively.
    pub dir_source: PathBuf,
    /// Build configuration file copied next to the tree.
    pub file_config: PathBuf,
    /// Parent of every snapshot folder.
    pub dir_examples: PathBuf,
    /// Basenames (files and directories) left out of the snapshot.
    pub patterns_exclude: Vec<String>,
    pub rule_pattern: EnumCopyPatternMode,
    pub rule_symlink: EnumCopySymlinkStrategy,
    pub if_dry_run: bool,
}

impl Default for SpecArchiveOptions {
    fn default() -> Self {
        Self {
            dir_root: PathBuf::from("."),
            dir_source: PathBuf::from(C_DIR_SOURCE_DEFAULT),
            file_config: PathBuf::from(C_FILE_CONFIG_DEFAULT),
            dir_examples: PathBuf::from(C_DIR_EXAMPLES_DEFAULT),
            patterns_exclude: Vec::new(),
            rule_pattern: EnumCopyPatternMode::Glob,
            rule_symlink: EnumCopySymlinkStrategy::CopySymlinks,
            if_dry_run: false,
        }
    }
}

impl SpecArchiveOptions {
    /// Options rooted at `dir_root`, everything else default.
    pub fn with_root<P: AsRef<Path>>(dir_root: P) -> Self {
        Self {
            dir_root: dir_root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn path_dir_source(&self) -> PathBuf {
        self.dir_root.join(&self.dir_source)
    }

    pub fn path_file_config(&self) -> PathBuf {
        self.dir_root.join(&self.file_config)
    }

    pub fn path_dir_examples(&self) -> PathBuf {
        self.dir_root.join(&self.dir_examples)
    }

    /// `<root>/<examples>/<folder>`; the folder name is used verbatim.
    pub fn path_dir_destination(&self, folder: &str) -> PathBuf {
        self.path_dir_examples().join(folder)
    }

    pub fn to_copy_options(&self) -> SpecCopyOptions {
        SpecCopyOptions {
            patterns_exclude: (!self.patterns_exclude.is_empty())
                .then(|| self.patterns_exclude.clone()),
            rule_pattern: self.rule_pattern,
            rule_symlink: self.rule_symlink,
            if_dry_run: self.if_dry_run,
        }
    }
}

/// Outcome of a successful `archive_example` call.
#[derive(Debug, Clone)]
pub struct ReportArchive {
    /// `<root>/<examples>/<folder>`.
    pub path_dir_destination: PathBuf,
    pub report_tree: ReportCopy,
    pub if_config_copied: bool,
    pub if_dry_run: bool,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Missing folder name. Usage: save <folder>")]
    MissingFolderName,
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    #[error("Source directory not found: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("Configuration file not found: {}", .0.display())]
    ConfigFileMissing(PathBuf),
    #[error("Failed to create {}", .path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to copy source tree")]
    CopyTree(#[from] CopyTreeError),
    #[error("Source tree copied with {n_errors} error(s), first: {first}")]
    CopyIncomplete { n_errors: usize, first: String },
    #[error("Failed to copy configuration file")]
    CopyConfigFile(#[from] CopyFileError),
    #[error("Invalid settings file {}: {message}", .path.display())]
    Settings { path: PathBuf, message: String },
}
