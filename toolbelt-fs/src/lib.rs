//! # toolbelt-fs
//!
//! Byte-exact stream/file comparison and atomic file replacement.
//!
//! - [`StreamComparator`] / [`files_equal`] — double-buffered equality checks
//!   with identity and size fast paths for files.
//! - [`replace_file`] / [`replace_file_if_different`] — temp file + rename,
//!   preserving the destination's permission bits.

pub mod compare;
pub mod error;
pub mod replace;
mod tee;

pub use compare::{
    compare_files, compare_files_with, files_equal, files_equal_with, streams_equal,
    with_default_comparator, FileComparison, StreamComparator,
};
pub use error::FsError;
pub use replace::{
    close_and_remove, replace_file, replace_file_if_different, ReplaceOptions, Replacer,
};
pub use toolbelt_core::{TempPlacement, DEFAULT_READ_BUFFER_SIZE};
