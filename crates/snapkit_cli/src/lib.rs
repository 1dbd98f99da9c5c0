//! `snapkit_cli`: archive a project's source tree and build configuration
//! into `examples/<folder>/`.
//!
//! - `archive` : the archive operation
//! - `cli`     : `clap` definition of the `save` command line
//! - `conf`    : defaults and the optional `snapkit.toml`
//! - `spec`    : options, report, errors

pub mod archive;
pub mod cli;
pub mod conf;
pub mod spec;

pub use archive::{archive_example, validate_folder_name};
pub use cli::Cli;
pub use conf::SpecSettings;
pub use spec::{ArchiveError, ReportArchive, SpecArchiveOptions};
