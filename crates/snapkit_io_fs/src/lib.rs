//! `snapkit_io_fs`: filesystem copy engine behind `save`.
//!
//! - `copy`   : tree traversal, copy planning, single-file copy
//! - `spec`   : policies, options, errors
//! - `report` : per-run counters and diagnostics
//! - `util`   : pattern matching, path safety, copy primitives

pub mod copy;
pub mod report;
pub mod spec;
mod util;

pub use copy::{copy_file, copy_tree};
pub use report::ReportCopy;
pub use spec::{
    CopyFileError, CopyTreeError, EnumCopyFileOutcome, EnumCopyPatternMode,
    EnumCopySymlinkStrategy, ParseRuleError, SpecCopyError, SpecCopyFileOptions, SpecCopyOptions,
};
