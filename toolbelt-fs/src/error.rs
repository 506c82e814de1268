//! Error types for toolbelt-fs.

use std::io::ErrorKind;
use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from comparison and replacement.
///
/// End-of-stream is never an error; it ends a comparison normally.
#[derive(Debug, Error)]
pub enum FsError {
    /// A path could not be opened (missing, permission denied, ...).
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata could not be read for a comparison input or a replace destination.
    #[error("cannot stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Write / chmod / rename / temp-file failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read failed on one of the streams being compared.
    #[error("read error during comparison: {0}")]
    Read(#[source] std::io::Error),

    /// Rejected before any I/O (zero buffer size, zero spool limit).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl FsError {
    /// `true` if the underlying I/O error is `ErrorKind::NotFound`.
    pub fn is_not_found(&self) -> bool {
        self.io_kind() == Some(ErrorKind::NotFound)
    }

    /// Kind of the wrapped I/O error, if any.
    pub fn io_kind(&self) -> Option<ErrorKind> {
        match self {
            FsError::Open { source, .. }
            | FsError::Stat { source, .. }
            | FsError::Io { source, .. }
            | FsError::Read(source) => Some(source.kind()),
            FsError::InvalidArgument(_) => None,
        }
    }
}

/// Convenience constructor for [`FsError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> FsError {
    FsError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`FsError::Open`].
pub(crate) fn open_err(path: impl Into<PathBuf>, source: std::io::Error) -> FsError {
    FsError::Open {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`FsError::Stat`].
pub(crate) fn stat_err(path: impl Into<PathBuf>, source: std::io::Error) -> FsError {
    FsError::Stat {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn not_found_is_detected_through_every_path_variant() {
        let missing = || io::Error::from(ErrorKind::NotFound);
        assert!(open_err("a", missing()).is_not_found());
        assert!(stat_err("a", missing()).is_not_found());
        assert!(io_err("a", missing()).is_not_found());
        assert!(FsError::Read(missing()).is_not_found());
        assert!(!FsError::InvalidArgument("x".into()).is_not_found());
    }

    #[test]
    fn messages_carry_the_path() {
        let err = open_err("/etc/missing.conf", io::Error::from(ErrorKind::NotFound));
        assert!(err.to_string().contains("/etc/missing.conf"), "got: {err}");
    }
}
