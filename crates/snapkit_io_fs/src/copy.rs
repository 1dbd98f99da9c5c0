//! Tree traversal and copy execution.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{
    CopyFileError, CopyTreeError, EnumCopyFileOutcome, EnumCopySymlinkStrategy,
    SpecCopyFileOptions, SpecCopyOptions,
};
use crate::util::{
    SpecCopyPatterns, copy_file_with_metadata, create_symbolic_link, derive_destination_path,
    is_destination_taken, is_overlap, validate_destination_path_safety,
};

#[derive(Debug)]
struct SpecTreeEntry {
    path_src: PathBuf,
    name: String,
    if_is_symlink: bool,
}

struct SpecWalkContext<'a> {
    path_dir_src: PathBuf,
    path_dir_dst: PathBuf,
    spec_cp_options: &'a SpecCopyOptions,
    spec_cp_pats: SpecCopyPatterns,
    builder_cp_report: ReportCopyBuilder,
    set_visited_dirs: HashSet<(u64, u64)>,
}

/// Copy the directory tree `dir_source` into `dir_destination`.
///
/// The destination root is created when missing (unless dry-run). Children
/// keep their path relative to `dir_source`. Everything runs on the calling
/// thread: entries are visited sorted by name, directories before files,
/// and each file is copied as soon as it is reached.
///
/// Returns [`CopyTreeError`] only for setup failures (bad patterns, source is
/// not a directory, overlapping trees, unusable destination root). Anything
/// that goes wrong for an individual entry, including an entry that already
/// exists at destination, lands in [`ReportCopy::errors`].
pub fn copy_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, CopyTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    if !path_dir_src.is_dir() {
        return Err(CopyTreeError::SourceNotDirectory(path_dir_src));
    }
    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(CopyTreeError::SourceDestinationOverlap {
            path_dir_src,
            path_dir_dst,
        });
    }
    let spec_cp_pats = SpecCopyPatterns::from_options(&spec_cp_options)?;
    init_destination_root(&path_dir_dst, spec_cp_options.if_dry_run)?;

    debug!(
        "copy_tree {} -> {} (dry_run={})",
        path_dir_src.display(),
        path_dir_dst.display(),
        spec_cp_options.if_dry_run
    );

    let mut spec_walk_ctx = SpecWalkContext {
        path_dir_src: path_dir_src.clone(),
        path_dir_dst,
        spec_cp_options: &spec_cp_options,
        spec_cp_pats,
        builder_cp_report: ReportCopyBuilder::default(),
        set_visited_dirs: HashSet::new(),
    };
    walk_directory(&path_dir_src, &mut spec_walk_ctx);

    let report_cp = spec_walk_ctx.builder_cp_report.build();
    debug!("{report_cp}");
    Ok(report_cp)
}

/// Copy one regular file from `file_source` to `file_destination`.
///
/// The parent of the destination must already exist. An existing
/// destination of any kind is refused.
pub fn copy_file<P, Q>(
    file_source: P,
    file_destination: Q,
    spec_cp_file_options: SpecCopyFileOptions,
) -> Result<EnumCopyFileOutcome, CopyFileError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_file_src = file_source.as_ref();
    let path_file_dst = file_destination.as_ref();

    let meta_src = fs::metadata(path_file_src).map_err(|source| CopyFileError::Io {
        path: path_file_src.to_path_buf(),
        source,
    })?;
    if !meta_src.is_file() {
        return Err(CopyFileError::SourceNotFile(path_file_src.to_path_buf()));
    }

    match fs::symlink_metadata(path_file_dst) {
        Ok(meta_dst) if meta_dst.file_type().is_symlink() => {
            return Err(CopyFileError::UnsafeDestination(format!(
                "Unsafe destination path is an existing symlink: {}",
                path_file_dst.display()
            )));
        }
        Ok(meta_dst) if meta_dst.is_dir() => {
            return Err(CopyFileError::DestinationIsDirectory(
                path_file_dst.to_path_buf(),
            ));
        }
        Ok(_) => {
            return Err(CopyFileError::DestinationExists(
                path_file_dst.to_path_buf(),
            ));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(CopyFileError::Io {
                path: path_file_dst.to_path_buf(),
                source,
            });
        }
    }

    if spec_cp_file_options.if_dry_run {
        return Ok(EnumCopyFileOutcome::Planned);
    }
    copy_file_with_metadata(path_file_src, path_file_dst).map_err(|source| {
        CopyFileError::Io {
            path: path_file_dst.to_path_buf(),
            source,
        }
    })?;
    debug!(
        "copied {} -> {}",
        path_file_src.display(),
        path_file_dst.display()
    );
    Ok(EnumCopyFileOutcome::Copied)
}

fn init_destination_root(path_dir_dst: &Path, if_dry_run: bool) -> Result<(), CopyTreeError> {
    let to_init_error = |message: String| CopyTreeError::DestinationInitFailed {
        path: path_dir_dst.to_path_buf(),
        message,
    };

    match fs::symlink_metadata(path_dir_dst) {
        Ok(meta) if meta.file_type().is_symlink() => Err(to_init_error(
            "Destination root path must not be a symbolic link.".to_string(),
        )),
        Ok(meta) if !meta.is_dir() => Err(to_init_error(
            "Destination root path is not a directory.".to_string(),
        )),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if if_dry_run {
                return Ok(());
            }
            fs::create_dir_all(path_dir_dst).map_err(|e| to_init_error(e.to_string()))
        }
        Err(e) => Err(to_init_error(e.to_string())),
    }
}

fn walk_directory(path_dir: &Path, spec_walk_ctx: &mut SpecWalkContext<'_>) {
    if spec_walk_ctx.spec_cp_options.rule_symlink == EnumCopySymlinkStrategy::Dereference
        && !mark_directory_visited(path_dir, spec_walk_ctx)
    {
        return;
    }

    let Some((l_dirs, l_files)) =
        scan_directory(path_dir, &mut spec_walk_ctx.builder_cp_report)
    else {
        return;
    };

    for spec_dir_entry in l_dirs {
        spec_walk_ctx.builder_cp_report.add_scanned();
        if spec_walk_ctx.spec_cp_pats.is_excluded(&spec_dir_entry.name) {
            continue;
        }
        if let Some(path_next) = handle_dir_entry(spec_dir_entry, spec_walk_ctx) {
            walk_directory(&path_next, spec_walk_ctx);
        }
    }
    for spec_file_entry in l_files {
        spec_walk_ctx.builder_cp_report.add_scanned();
        if spec_walk_ctx.spec_cp_pats.is_excluded(&spec_file_entry.name) {
            continue;
        }
        handle_file_entry(spec_file_entry, spec_walk_ctx);
    }
}

/// Returns `false` when the directory was already walked (symlink loop).
#[cfg(unix)]
fn mark_directory_visited(path_dir: &Path, spec_walk_ctx: &mut SpecWalkContext<'_>) -> bool {
    use std::os::unix::fs::MetadataExt;

    match fs::metadata(path_dir) {
        Ok(meta) => {
            if spec_walk_ctx.set_visited_dirs.insert((meta.dev(), meta.ino())) {
                return true;
            }
            spec_walk_ctx
                .builder_cp_report
                .add_warning(format!("Symlink loop detected: {}", path_dir.display()));
            false
        }
        Err(e) => {
            spec_walk_ctx.builder_cp_report.add_warning(format!(
                "Failed to stat directory {} ({e})",
                path_dir.display()
            ));
            false
        }
    }
}

#[cfg(not(unix))]
fn mark_directory_visited(_path_dir: &Path, _spec_walk_ctx: &mut SpecWalkContext<'_>) -> bool {
    true
}

/// Split directory children into sorted (directories, files) lists.
/// Symlinks pointing at directories are listed as directories.
fn scan_directory(
    path_dir: &Path,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Option<(Vec<SpecTreeEntry>, Vec<SpecTreeEntry>)> {
    let iter_entries = match fs::read_dir(path_dir) {
        Ok(iter) => iter,
        Err(e) => {
            builder_cp_report.add_error(
                path_dir.to_path_buf(),
                format!("Failed to read directory {} ({e})", path_dir.display()),
            );
            return None;
        }
    };

    let mut l_dirs = Vec::new();
    let mut l_files = Vec::new();
    for res_entry in iter_entries {
        let entry = match res_entry {
            Ok(v) => v,
            Err(e) => {
                builder_cp_report.add_error(
                    path_dir.to_path_buf(),
                    format!("Failed to read entry under {} ({e})", path_dir.display()),
                );
                continue;
            }
        };
        let path_entry = entry.path();
        let file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                builder_cp_report.add_error(path_entry, e.to_string());
                continue;
            }
        };

        let if_is_symlink = file_type.is_symlink();
        let spec_entry = SpecTreeEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path_src: path_entry,
            if_is_symlink,
        };
        if file_type.is_dir() || (if_is_symlink && spec_entry.path_src.is_dir()) {
            l_dirs.push(spec_entry);
        } else if file_type.is_file() || if_is_symlink {
            l_files.push(spec_entry);
        } else {
            builder_cp_report.add_warning(format!(
                "Special file skipped: {}",
                spec_entry.path_src.display()
            ));
        }
    }

    l_dirs.sort_by(|a, b| a.name.cmp(&b.name));
    l_files.sort_by(|a, b| a.name.cmp(&b.name));
    Some((l_dirs, l_files))
}

/// Create the destination directory for `spec_dir_entry`.
/// Returns the source path to descend into, or `None` to prune the subtree.
fn handle_dir_entry(
    spec_dir_entry: SpecTreeEntry,
    spec_walk_ctx: &mut SpecWalkContext<'_>,
) -> Option<PathBuf> {
    let spec_cp_options = spec_walk_ctx.spec_cp_options;
    spec_walk_ctx.builder_cp_report.add_matched();

    let path_dir_dst_sub = derive_destination_path(
        &spec_dir_entry.path_src,
        &spec_walk_ctx.path_dir_src,
        &spec_walk_ctx.path_dir_dst,
    );

    if spec_dir_entry.if_is_symlink {
        match spec_cp_options.rule_symlink {
            EnumCopySymlinkStrategy::SkipSymlinks => {
                spec_walk_ctx.builder_cp_report.add_skipped();
                return None;
            }
            EnumCopySymlinkStrategy::CopySymlinks => {
                copy_symlink_entry(&spec_dir_entry.path_src, &path_dir_dst_sub, spec_walk_ctx);
                return None;
            }
            EnumCopySymlinkStrategy::Dereference => {}
        }
    }

    if let Err(msg) =
        validate_destination_path_safety(&path_dir_dst_sub, &spec_walk_ctx.path_dir_dst)
    {
        spec_walk_ctx
            .builder_cp_report
            .add_error(path_dir_dst_sub, msg);
        return None;
    }
    if is_destination_taken(&path_dir_dst_sub, &mut spec_walk_ctx.builder_cp_report) {
        return None;
    }

    if spec_cp_options.if_dry_run {
        spec_walk_ctx.builder_cp_report.add_skipped();
    } else if let Err(e) = fs::create_dir(&path_dir_dst_sub) {
        spec_walk_ctx
            .builder_cp_report
            .add_error(path_dir_dst_sub, e.to_string());
        return None;
    } else {
        spec_walk_ctx.builder_cp_report.add_copied();
    }
    Some(spec_dir_entry.path_src)
}

fn handle_file_entry(spec_file_entry: SpecTreeEntry, spec_walk_ctx: &mut SpecWalkContext<'_>) {
    let spec_cp_options = spec_walk_ctx.spec_cp_options;
    spec_walk_ctx.builder_cp_report.add_matched();

    let path_file_dst = derive_destination_path(
        &spec_file_entry.path_src,
        &spec_walk_ctx.path_dir_src,
        &spec_walk_ctx.path_dir_dst,
    );

    if spec_file_entry.if_is_symlink {
        match spec_cp_options.rule_symlink {
            EnumCopySymlinkStrategy::SkipSymlinks => {
                spec_walk_ctx.builder_cp_report.add_skipped();
                return;
            }
            EnumCopySymlinkStrategy::CopySymlinks => {
                copy_symlink_entry(&spec_file_entry.path_src, &path_file_dst, spec_walk_ctx);
                return;
            }
            EnumCopySymlinkStrategy::Dereference => {
                match fs::metadata(&spec_file_entry.path_src) {
                    Err(_) => {
                        spec_walk_ctx.builder_cp_report.add_error(
                            spec_file_entry.path_src.clone(),
                            format!("Broken symlink: {}", spec_file_entry.path_src.display()),
                        );
                        return;
                    }
                    Ok(meta) if !meta.is_file() => {
                        spec_walk_ctx.builder_cp_report.add_warning(format!(
                            "Special file target skipped: {}",
                            spec_file_entry.path_src.display()
                        ));
                        spec_walk_ctx.builder_cp_report.add_skipped();
                        return;
                    }
                    Ok(_) => {}
                }
            }
        }
    } else {
        warn_if_hard_link(&spec_file_entry.path_src, &mut spec_walk_ctx.builder_cp_report);
    }

    if let Err(msg) =
        validate_destination_path_safety(&path_file_dst, &spec_walk_ctx.path_dir_dst)
    {
        spec_walk_ctx.builder_cp_report.add_error(path_file_dst, msg);
        return;
    }
    if is_destination_taken(&path_file_dst, &mut spec_walk_ctx.builder_cp_report) {
        return;
    }
    if spec_cp_options.if_dry_run {
        spec_walk_ctx.builder_cp_report.add_skipped();
        return;
    }

    match copy_file_with_metadata(&spec_file_entry.path_src, &path_file_dst) {
        Ok(()) => {
            debug!("copied {}", path_file_dst.display());
            spec_walk_ctx.builder_cp_report.add_copied();
        }
        Err(e) => spec_walk_ctx
            .builder_cp_report
            .add_error(path_file_dst, e.to_string()),
    }
}

/// Symlinks are leaves, even when they point at a directory.
fn copy_symlink_entry(path_src: &Path, path_dst: &Path, spec_walk_ctx: &mut SpecWalkContext<'_>) {
    let builder_cp_report = &mut spec_walk_ctx.builder_cp_report;
    if let Err(msg) = validate_destination_path_safety(path_dst, &spec_walk_ctx.path_dir_dst) {
        builder_cp_report.add_error(path_dst.to_path_buf(), msg);
        return;
    }
    if is_destination_taken(path_dst, builder_cp_report) {
        return;
    }
    if spec_walk_ctx.spec_cp_options.if_dry_run {
        builder_cp_report.add_skipped();
        return;
    }

    match create_symbolic_link(path_src, path_dst) {
        Ok(()) => builder_cp_report.add_copied(),
        Err(e) => builder_cp_report.add_error(path_dst.to_path_buf(), e.to_string()),
    }
}

#[cfg(target_os = "linux")]
fn warn_if_hard_link(path_file_src: &Path, builder_cp_report: &mut ReportCopyBuilder) {
    use std::os::unix::fs::MetadataExt;

    if let Ok(meta) = fs::metadata(path_file_src)
        && meta.nlink() > 1
    {
        builder_cp_report.add_warning(format!(
            "Hard link detected: {}",
            path_file_src.display()
        ));
    }
}

#[cfg(not(target_os = "linux"))]
fn warn_if_hard_link(_path_file_src: &Path, _builder_cp_report: &mut ReportCopyBuilder) {}
