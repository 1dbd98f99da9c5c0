use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::report::ReportCopyBuilder;
use crate::spec::{CopyTreeError, EnumCopyPatternMode, SpecCopyOptions};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeCopyPatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypeCopyPatternSeq {
    fn compile(
        patterns: Option<&[String]>,
        rule_pattern: EnumCopyPatternMode,
    ) -> Result<Option<Self>, CopyTreeError> {
        let Some(patterns) = patterns.filter(|v| !v.is_empty()) else {
            return Ok(None);
        };

        let seq = match rule_pattern {
            EnumCopyPatternMode::Literal => Self::Literal(patterns.to_vec()),
            EnumCopyPatternMode::Glob => Self::Glob(
                patterns
                    .iter()
                    .map(|p| {
                        Glob::new(p)
                            .map(|glob| glob.compile_matcher())
                            .map_err(|e| CopyTreeError::InvalidPattern(e.to_string()))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            EnumCopyPatternMode::Regex => Self::Regex(
                patterns
                    .iter()
                    .map(|p| Regex::new(p).map_err(|e| CopyTreeError::InvalidPattern(e.to_string())))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(Some(seq))
    }

    fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

/// Compiled exclude rules, matched against file and directory basenames.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpecCopyPatterns {
    exclude: Option<TypeCopyPatternSeq>,
}

impl SpecCopyPatterns {
    pub(crate) fn from_options(spec_cp_options: &SpecCopyOptions) -> Result<Self, CopyTreeError> {
        Ok(Self {
            exclude: TypeCopyPatternSeq::compile(
                spec_cp_options.patterns_exclude.as_deref(),
                spec_cp_options.rule_pattern,
            )?,
        })
    }

    pub(crate) fn is_excluded(&self, name: &str) -> bool {
        self.exclude.as_ref().is_some_and(|p| p.is_match(name))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| absolutize_path(path))
}

/// `true` when either directory contains the other.
pub(crate) fn is_overlap(path_dir_src: &Path, path_dir_dst: &Path) -> bool {
    let path_src_resolved = normalize_path(path_dir_src);
    let path_dst_resolved = normalize_path(path_dir_dst);
    path_dst_resolved.starts_with(&path_src_resolved)
        || path_src_resolved.starts_with(&path_dst_resolved)
}

/// Reject destination paths that leave `path_dir_dst_root`, either lexically
/// or through an existing symlink anywhere below the root (item included).
pub(crate) fn validate_destination_path_safety(
    path_dst_item: &Path,
    path_dir_dst_root: &Path,
) -> Result<(), String> {
    let path_root_abs = absolutize_path(path_dir_dst_root);
    let path_item_abs = absolutize_path(path_dst_item);

    let path_rel = path_item_abs.strip_prefix(&path_root_abs).map_err(|_| {
        format!(
            "Unsafe destination path escapes destination root: {} (root={})",
            path_dst_item.display(),
            path_dir_dst_root.display()
        )
    })?;
    if path_rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(format!(
            "Unsafe destination path component: {}",
            path_dst_item.display()
        ));
    }

    let mut path_cursor = path_root_abs;
    for part_rel in path_rel.components() {
        path_cursor.push(part_rel);
        match fs::symlink_metadata(&path_cursor) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(format!(
                    "Unsafe destination path traverses symlink: {}",
                    path_cursor.display()
                ));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => {
                return Err(format!(
                    "Failed to inspect destination path {} ({e})",
                    path_cursor.display()
                ));
            }
        }
    }
    Ok(())
}

/// Map a source entry onto the destination tree.
pub(crate) fn derive_destination_path(
    path_src: &Path,
    path_dir_src: &Path,
    path_dir_dst: &Path,
) -> PathBuf {
    match path_src.strip_prefix(path_dir_src) {
        Ok(path_rel) => path_dir_dst.join(path_rel),
        Err(_) => path_dir_dst.join(path_src.file_name().unwrap_or_default()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ConflictPolicies

/// Returns `true` (and records an error) when something already occupies
/// `path_dst`. Existing entries are never merged into or overwritten.
pub(crate) fn is_destination_taken(
    path_dst: &Path,
    builder_cp_report: &mut ReportCopyBuilder,
) -> bool {
    let Ok(meta_dst) = fs::symlink_metadata(path_dst) else {
        return false;
    };
    let exception = if meta_dst.is_dir() {
        format!("Destination directory exists: {}", path_dst.display())
    } else {
        format!("Destination exists: {}", path_dst.display())
    };
    builder_cp_report.add_error(path_dst.to_path_buf(), exception);
    true
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CopyPrimitives

/// Recreate the link stored at `path_src` as `path_dst`.
pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> Result<(), io::Error> {
    let path_target = fs::read_link(path_src)?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&path_target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&path_target, path_dst)
        } else {
            symlink_file(&path_target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (path_target, path_dst);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

/// Byte copy plus, on Linux, permissions, timestamps and xattrs.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    #[cfg(target_os = "linux")]
    {
        apply_metadata_linux(path_file_src, path_file_dst)?;
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn apply_metadata_linux(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let meta_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, meta_src.permissions())?;
    set_file_times(
        path_file_dst,
        FileTime::from_last_access_time(&meta_src),
        FileTime::from_last_modification_time(&meta_src),
    )?;

    // Best effort: filesystems without xattr support still get the bytes.
    if let Ok(iter_names) = xattr::list(path_file_src) {
        for name in iter_names {
            if let Ok(Some(raw_value)) = xattr::get(path_file_src, &name) {
                let _ = xattr::set(path_file_dst, &name, &raw_value);
            }
        }
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
