//! Command-line surface of `save`.

use std::path::PathBuf;

use clap::Parser;
use snapkit_io_fs::{EnumCopyPatternMode, EnumCopySymlinkStrategy};

use crate::conf::SpecSettings;
use crate::spec::SpecArchiveOptions;

/// Snapshot the source tree and build config into examples/<FOLDER>
#[derive(Parser, Debug)]
#[command(name = "save", author, version, about, long_about = None)]
pub struct Cli {
    /// Destination folder name under the examples directory
    #[arg(value_name = "FOLDER")]
    pub folder: Option<String>,

    /// Project root
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Source tree, relative to the root [default: src]
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Configuration file, relative to the root [default: tsconfig.json]
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Examples directory, relative to the root [default: examples]
    #[arg(long, value_name = "DIR")]
    pub examples: Option<PathBuf>,

    /// Leave out files and directories whose basename matches (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub patterns_exclude: Vec<String>,

    /// How --exclude patterns are read: glob, regex or literal [default: glob]
    #[arg(long = "pattern-mode", value_name = "MODE")]
    pub rule_pattern: Option<EnumCopyPatternMode>,

    /// Symlinks inside the source tree: copy, dereference or skip [default: copy]
    #[arg(long = "symlinks", value_name = "MODE")]
    pub rule_symlink: Option<EnumCopySymlinkStrategy>,

    /// Report what would be copied without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Settings file [default: <ROOT>/snapkit.toml when present]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Command-line flags win over settings, settings win over defaults.
    pub fn to_archive_options(&self, spec_settings: SpecSettings) -> SpecArchiveOptions {
        let spec_default = SpecArchiveOptions::with_root(&self.root);
        let patterns_exclude = if self.patterns_exclude.is_empty() {
            spec_settings.patterns_exclude.unwrap_or_default()
        } else {
            self.patterns_exclude.clone()
        };

        SpecArchiveOptions {
            dir_source: self
                .source
                .clone()
                .or(spec_settings.dir_source)
                .unwrap_or(spec_default.dir_source),
            file_config: self
                .config_file
                .clone()
                .or(spec_settings.file_config)
                .unwrap_or(spec_default.file_config),
            dir_examples: self
                .examples
                .clone()
                .or(spec_settings.dir_examples)
                .unwrap_or(spec_default.dir_examples),
            patterns_exclude,
            rule_pattern: self
                .rule_pattern
                .or(spec_settings.rule_pattern)
                .unwrap_or(spec_default.rule_pattern),
            rule_symlink: self
                .rule_symlink
                .or(spec_settings.rule_symlink)
                .unwrap_or(spec_default.rule_symlink),
            if_dry_run: self.dry_run,
            dir_root: spec_default.dir_root,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn folder_is_optional_so_missing_name_is_reported_by_archiver() {
        let cli = Cli::try_parse_from(["save"]).expect("parse");
        assert!(cli.folder.is_none());
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn flags_parse_into_engine_enums() {
        let cli = Cli::try_parse_from([
            "save",
            "generics",
            "--exclude",
            "node_modules",
            "--exclude",
            "*.log",
            "--pattern-mode",
            "glob",
            "--symlinks",
            "skip",
            "--dry-run",
        ])
        .expect("parse");
        assert_eq!(cli.folder.as_deref(), Some("generics"));
        assert_eq!(cli.patterns_exclude, vec!["node_modules", "*.log"]);
        assert_eq!(cli.rule_symlink, Some(EnumCopySymlinkStrategy::SkipSymlinks));
        assert!(cli.dry_run);

        assert!(Cli::try_parse_from(["save", "x", "--symlinks", "follow"]).is_err());
    }

    #[test]
    fn cli_flags_override_settings_which_override_defaults() {
        let cli = Cli::try_parse_from(["save", "x", "-C", "/proj", "--source", "app"])
            .expect("parse");
        let spec_settings = SpecSettings {
            dir_source: Some(PathBuf::from("lib")),
            dir_examples: Some(PathBuf::from("snapshots")),
            patterns_exclude: Some(vec!["dist".to_string()]),
            ..SpecSettings::default()
        };

        let spec = cli.to_archive_options(spec_settings);
        assert_eq!(spec.dir_root, PathBuf::from("/proj"));
        assert_eq!(spec.dir_source, PathBuf::from("app"));
        assert_eq!(spec.dir_examples, PathBuf::from("snapshots"));
        assert_eq!(spec.file_config, PathBuf::from("tsconfig.json"));
        assert_eq!(spec.patterns_exclude, vec!["dist".to_string()]);
        assert_eq!(spec.rule_pattern, EnumCopyPatternMode::Glob);
        assert!(!spec.if_dry_run);
    }
}
