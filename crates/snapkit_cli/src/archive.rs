//! Snapshot the source tree and configuration file into
//! `<examples>/<folder>/`.

use std::fs;
use std::io;
use std::path::Path;

use snapkit_io_fs::{EnumCopyFileOutcome, SpecCopyFileOptions, copy_file, copy_tree};
use tracing::{error, info, warn};

use crate::conf::C_DIR_SOURCE_DEFAULT;
use crate::spec::{ArchiveError, ReportArchive, SpecArchiveOptions};

/// The folder name is used verbatim; only an empty string is refused.
pub fn validate_folder_name(folder: &str) -> Result<&str, ArchiveError> {
    if folder.is_empty() {
        return Err(ArchiveError::MissingFolderName);
    }
    Ok(folder)
}

/// Copy `<root>/<source>` and `<root>/<config file>` into
/// `<root>/<examples>/<folder>/`.
///
/// Steps run in order and the first failure ends the call. Nothing is
/// created when the folder name is missing, the destination already exists,
/// or either input is absent. Past that point there is no rollback: a
/// failing step leaves whatever earlier steps wrote.
pub fn archive_example(
    folder: &str,
    spec_archive_options: &SpecArchiveOptions,
) -> Result<ReportArchive, ArchiveError> {
    let folder = validate_folder_name(folder)?;
    let path_dir_src = spec_archive_options.path_dir_source();
    let path_file_config = spec_archive_options.path_file_config();
    let path_dir_dst = spec_archive_options.path_dir_destination(folder);
    let if_dry_run = spec_archive_options.if_dry_run;

    info!("Saving example to {}", path_dir_dst.display());

    if !path_dir_src.is_dir() {
        return Err(ArchiveError::SourceMissing(path_dir_src));
    }
    if !path_file_config.is_file() {
        return Err(ArchiveError::ConfigFileMissing(path_file_config));
    }
    create_destination(
        &spec_archive_options.path_dir_examples(),
        &path_dir_dst,
        if_dry_run,
    )?;

    let name_dir_src = path_dir_src
        .file_name()
        .unwrap_or(C_DIR_SOURCE_DEFAULT.as_ref());
    let report_tree = copy_tree(
        &path_dir_src,
        path_dir_dst.join(name_dir_src),
        spec_archive_options.to_copy_options(),
    )?;
    for warning in &report_tree.warnings {
        warn!("{warning}");
    }
    if let Some(spec_error) = report_tree.errors.first() {
        for spec_error_item in &report_tree.errors {
            error!(
                "{}: {}",
                spec_error_item.path.display(),
                spec_error_item.exception
            );
        }
        return Err(ArchiveError::CopyIncomplete {
            n_errors: report_tree.error_count(),
            first: spec_error.exception.clone(),
        });
    }

    let name_file_config = path_file_config
        .file_name()
        .ok_or_else(|| ArchiveError::ConfigFileMissing(path_file_config.clone()))?;
    let outcome_config = copy_file(
        &path_file_config,
        path_dir_dst.join(name_file_config),
        SpecCopyFileOptions { if_dry_run },
    )?;

    if if_dry_run {
        info!(
            "Dry run: example `{folder}` not written {}",
            report_tree.format("[PLAN]")
        );
    } else {
        info!(
            "Saved example `{folder}` {}",
            report_tree.format("[COPY]")
        );
    }

    Ok(ReportArchive {
        path_dir_destination: path_dir_dst,
        report_tree,
        if_config_copied: outcome_config == EnumCopyFileOutcome::Copied,
        if_dry_run,
    })
}

/// Single-level create: an existing destination is a conflict, never a
/// merge target. Only the examples directory itself is created on demand, so
/// a nested name such as `a/b` needs `<examples>/a` to exist already.
fn create_destination(
    path_dir_examples: &Path,
    path_dir_dst: &Path,
    if_dry_run: bool,
) -> Result<(), ArchiveError> {
    if fs::symlink_metadata(path_dir_dst).is_ok() {
        return Err(ArchiveError::DestinationExists(path_dir_dst.to_path_buf()));
    }
    if if_dry_run {
        return Ok(());
    }

    let to_create_error = |source: io::Error| ArchiveError::CreateDestination {
        path: path_dir_dst.to_path_buf(),
        source,
    };
    fs::create_dir_all(path_dir_examples).map_err(to_create_error)?;
    fs::create_dir(path_dir_dst).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => ArchiveError::DestinationExists(path_dir_dst.to_path_buf()),
        _ => to_create_error(e),
    })
}
