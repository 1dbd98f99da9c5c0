//! Copy policies, option models, and error types.

use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Symlink handling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopySymlinkStrategy {
    /// Follow the link and copy the target bytes/entries.
    Dereference,
    /// Recreate the link at destination, pointing at the same target.
    CopySymlinks,
    /// Ignore symlink entries.
    SkipSymlinks,
}

/// Pattern matching mode for exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

/// What happened to a single-file copy request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyFileOutcome {
    Copied,
    /// Nothing written because of dry-run mode.
    Planned,
}

/// Unknown textual value for one of the `EnumCopy*` policies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind}: `{value}`. Expected one of: {expected}")]
pub struct ParseRuleError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for EnumCopyPatternMode {
    type Err = ParseRuleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "glob" => Ok(Self::Glob),
            "regex" => Ok(Self::Regex),
            "literal" => Ok(Self::Literal),
            _ => Err(ParseRuleError {
                kind: "pattern mode",
                value: value.to_string(),
                expected: "glob, regex, literal",
            }),
        }
    }
}

impl FromStr for EnumCopySymlinkStrategy {
    type Err = ParseRuleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dereference" => Ok(Self::Dereference),
            "copy" => Ok(Self::CopySymlinks),
            "skip" => Ok(Self::SkipSymlinks),
            _ => Err(ParseRuleError {
                kind: "symlink strategy",
                value: value.to_string(),
                expected: "copy, dereference, skip",
            }),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for [`crate::copy_tree`].
///
/// Anything already present at a destination path is an error: the tree
/// copy never merges into or overwrites existing entries.
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Exclude patterns applied to file and directory basenames.
    pub patterns_exclude: Option<Vec<String>>,
    pub rule_pattern: EnumCopyPatternMode,
    pub rule_symlink: EnumCopySymlinkStrategy,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            patterns_exclude: None,
            rule_pattern: EnumCopyPatternMode::Glob,
            rule_symlink: EnumCopySymlinkStrategy::CopySymlinks,
            if_dry_run: false,
        }
    }
}

/// Input options for [`crate::copy_file`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecCopyFileOptions {
    pub if_dry_run: bool,
}

/// One per-entry copy failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// Setup-stage failures of [`crate::copy_tree`]. Per-entry failures are
/// reported through [`crate::ReportCopy::errors`] instead.
#[derive(Debug, Error)]
pub enum CopyTreeError {
    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(String),
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        .path_dir_src.display(),
        .path_dir_dst.display()
    )]
    SourceDestinationOverlap {
        path_dir_src: PathBuf,
        path_dir_dst: PathBuf,
    },
    #[error("Failed to initialize destination {}: {message}", .path.display())]
    DestinationInitFailed { path: PathBuf, message: String },
}

/// Failures of [`crate::copy_file`].
#[derive(Debug, Error)]
pub enum CopyFileError {
    #[error("Source is not a regular file: {}", .0.display())]
    SourceNotFile(PathBuf),
    #[error("Destination exists: {}", .0.display())]
    DestinationExists(PathBuf),
    #[error("Destination is a directory: {}", .0.display())]
    DestinationIsDirectory(PathBuf),
    #[error("{0}")]
    UnsafeDestination(String),
    #[error("I/O failure on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn parse_rules_accept_cli_spellings() {
        assert_eq!("glob".parse(), Ok(EnumCopyPatternMode::Glob));
        assert_eq!("regex".parse(), Ok(EnumCopyPatternMode::Regex));
        assert_eq!("literal".parse(), Ok(EnumCopyPatternMode::Literal));
        assert_eq!("copy".parse(), Ok(EnumCopySymlinkStrategy::CopySymlinks));
        assert_eq!("dereference".parse(), Ok(EnumCopySymlinkStrategy::Dereference));
        assert_eq!("skip".parse(), Ok(EnumCopySymlinkStrategy::SkipSymlinks));
    }

    #[test]
    fn parse_rule_error_lists_expected_values() {
        let err = "fnmatch"
            .parse::<EnumCopyPatternMode>()
            .expect_err("unknown mode");
        assert_eq!(
            err.to_string(),
            "Invalid pattern mode: `fnmatch`. Expected one of: glob, regex, literal"
        );

        let err = "follow"
            .parse::<EnumCopySymlinkStrategy>()
            .expect_err("unknown strategy");
        assert_eq!(
            err.to_string(),
            "Invalid symlink strategy: `follow`. Expected one of: copy, dereference, skip"
        );
    }

    #[test]
    fn io_error_message_leaves_os_error_to_source() {
        let err = CopyFileError::Io {
            path: PathBuf::from("examples/x/tsconfig.json"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let txt_source = err.source().expect("source").to_string();
        assert_eq!(err.to_string(), "I/O failure on examples/x/tsconfig.json");
        assert!(!err.to_string().contains(&txt_source));
    }
}
