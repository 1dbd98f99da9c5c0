use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use snapkit_cli::{Cli, ReportArchive, SpecSettings, archive_example, validate_folder_name};
use tracing::{debug, error};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = snapkit_log::init_logging(cli.verbose) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(report_archive) => {
            debug!("{}", report_archive.report_tree);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ReportArchive> {
    // Checked first so a missing name never depends on settings parsing.
    let folder = validate_folder_name(cli.folder.as_deref().unwrap_or_default())?;

    let spec_settings = SpecSettings::resolve(&cli.root, cli.config.as_deref())?;
    let spec_archive_options = cli.to_archive_options(spec_settings);
    debug!("{spec_archive_options:?}");

    archive_example(folder, &spec_archive_options)
        .with_context(|| format!("Failed to save example `{folder}`"))
}
