//! Atomic file replacement.
//!
//! ## `replace_file` — 5-step protocol
//!
//! 1. Stat the destination (it must already exist).
//! 2. Create a uniquely named temporary file.
//! 3. Copy the destination's permission bits onto it.
//! 4. Copy the new content into it and fsync.
//! 5. Rename it over the destination (atomic within one volume).
//!
//! Steps 1–4 never touch the destination. A failure in 2–5 removes the
//! temporary file before returning the error.
//!
//! ## `replace_file_if_different`
//!
//! Compares the new content against the destination while teeing it into a
//! spool, and only runs `replace_file` when they differ. The spool holds
//! everything the comparison consumed; the unread remainder of the source is
//! chained after it.

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, SpooledTempFile};
use toolbelt_core::{Config, TempPlacement, DEFAULT_READ_BUFFER_SIZE};

use crate::compare::{with_default_comparator, StreamComparator};
use crate::error::{io_err, open_err, stat_err, FsError};
use crate::tee::TeeReader;

/// Prefix of every temporary file created next to a destination.
const TEMP_PREFIX: &str = ".toolbelt";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Tuning for [`Replacer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOptions {
    /// Where the temporary file is created.
    pub temp_placement: TempPlacement,
    /// In-memory cap for the candidate content spool used by
    /// `replace_file_if_different`; `None` keeps everything in memory.
    pub spool_limit: Option<usize>,
    /// Comparator buffer size for `replace_file_if_different`.
    pub buffer_size: usize,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self {
            temp_placement: TempPlacement::default(),
            spool_limit: None,
            buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl From<&Config> for ReplaceOptions {
    fn from(config: &Config) -> Self {
        Self {
            temp_placement: config.temp_placement.clone(),
            spool_limit: config.spool_limit,
            buffer_size: config.buffer_size,
        }
    }
}

impl ReplaceOptions {
    fn validate(&self) -> Result<(), FsError> {
        if self.buffer_size == 0 {
            return Err(FsError::InvalidArgument(
                "buffer size must be > 0".to_string(),
            ));
        }
        if self.spool_limit == Some(0) {
            return Err(FsError::InvalidArgument(
                "spool limit must be > 0 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory the temporary file for `dest` is created in.
    fn temp_dir_for(&self, dest: &Path) -> PathBuf {
        match &self.temp_placement {
            TempPlacement::SameDirectory => match dest.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
            TempPlacement::SystemTemp => std::env::temp_dir(),
            TempPlacement::Dir(dir) => dir.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Replacer
// ---------------------------------------------------------------------------

/// Atomic replacer with its own comparator.
///
/// `replace_file_if_different` reuses the comparator's buffers, hence
/// `&mut self`.
#[derive(Debug)]
pub struct Replacer {
    options: ReplaceOptions,
    comparator: StreamComparator,
}

impl Replacer {
    pub fn new(options: ReplaceOptions) -> Result<Self, FsError> {
        options.validate()?;
        let comparator = StreamComparator::new(options.buffer_size)?;
        Ok(Self {
            options,
            comparator,
        })
    }

    pub fn options(&self) -> &ReplaceOptions {
        &self.options
    }

    /// Atomically overwrite the existing file `dest` with `new_content`,
    /// keeping its permission bits.
    ///
    /// `dest` is unchanged if any step fails.
    pub fn replace_file<R: Read>(&self, new_content: R, dest: &Path) -> Result<(), FsError> {
        replace_with(&self.options, new_content, dest)
    }

    /// Like [`Replacer::replace_file`], but skips the write when `dest`
    /// already holds exactly `new_content`.
    ///
    /// Returns `true` if `dest` was replaced and `false` if it was left alone.
    /// Consumed content is buffered (in memory up to `spool_limit`, on disk
    /// beyond it) so it can be written after the comparison.
    pub fn replace_file_if_different<R: Read>(
        &mut self,
        new_content: R,
        dest: &Path,
    ) -> Result<bool, FsError> {
        replace_if_different_with(&self.options, &mut self.comparator, new_content, dest)
    }
}

impl Default for Replacer {
    fn default() -> Self {
        Self {
            options: ReplaceOptions::default(),
            comparator: StreamComparator::default(),
        }
    }
}

/// [`Replacer::replace_file`] with default options.
pub fn replace_file<R: Read>(new_content: R, dest: &Path) -> Result<(), FsError> {
    replace_with(&ReplaceOptions::default(), new_content, dest)
}

/// [`Replacer::replace_file_if_different`] with default options and the
/// thread's default comparator.
pub fn replace_file_if_different<R: Read>(new_content: R, dest: &Path) -> Result<bool, FsError> {
    let options = ReplaceOptions::default();
    with_default_comparator(|c| replace_if_different_with(&options, c, new_content, dest))
}

/// Close `temp` and delete it from disk.
pub fn close_and_remove(temp: NamedTempFile) -> io::Result<()> {
    temp.close()
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn replace_with<R: Read>(
    options: &ReplaceOptions,
    mut new_content: R,
    dest: &Path,
) -> Result<(), FsError> {
    // Step 1: the destination must exist; its mode is carried over.
    let dest_meta = fs::metadata(dest).map_err(|e| stat_err(dest, e))?;

    // Step 2: unique temporary file.
    let temp_dir = options.temp_dir_for(dest);
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(&temp_dir)
        .map_err(|e| io_err(&temp_dir, e))?;

    // Step 3: permissions.
    if let Err(e) = temp.as_file().set_permissions(dest_meta.permissions()) {
        let err = io_err(temp.path(), e);
        return Err(abandon(temp, err));
    }

    // Step 4: content.
    let copied =
        io::copy(&mut new_content, temp.as_file_mut()).and_then(|_| temp.as_file().sync_all());
    if let Err(e) = copied {
        let err = io_err(temp.path(), e);
        return Err(abandon(temp, err));
    }

    // Step 5: atomic rename.
    if let Err(e) = temp.persist(dest) {
        return Err(abandon(e.file, io_err(dest, e.error)));
    }

    tracing::info!("replaced: {}", dest.display());
    Ok(())
}

fn replace_if_different_with<R: Read>(
    options: &ReplaceOptions,
    comparator: &mut StreamComparator,
    mut new_content: R,
    dest: &Path,
) -> Result<bool, FsError> {
    options.validate()?;
    let mut dest_file = File::open(dest).map_err(|e| open_err(dest, e))?;

    let mut spool = SpooledTempFile::new(options.spool_limit.unwrap_or(usize::MAX));
    let equal = comparator.streams_equal(
        TeeReader::new(&mut new_content, &mut spool),
        &mut dest_file,
    )?;
    drop(dest_file);

    if equal {
        tracing::debug!("unchanged: {}", dest.display());
        return Ok(false);
    }

    if spool.is_rolled() {
        tracing::debug!(
            "candidate for {} exceeded spool limit; buffered on disk",
            dest.display()
        );
    }
    spool
        .rewind()
        .map_err(|e| io_err(std::env::temp_dir(), e))?;
    replace_with(options, spool.chain(new_content), dest)?;
    Ok(true)
}

/// Best-effort removal of a temporary file on an error path.
///
/// Returns `err` unchanged; a cleanup failure is only logged.
fn abandon(temp: NamedTempFile, err: FsError) -> FsError {
    let path = temp.path().to_path_buf();
    if let Err(cleanup) = close_and_remove(temp) {
        tracing::warn!(
            "failed to remove temporary file {}: {cleanup}",
            path.display()
        );
    }
    err
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Yields `ok_bytes` of data, then fails.
    struct FailingReader {
        ok_bytes: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.ok_bytes == 0 {
                return Err(io::Error::other("source went away"));
            }
            let n = self.ok_bytes.min(buf.len());
            buf[..n].fill(b'n');
            self.ok_bytes -= n;
            Ok(n)
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn same_directory_placement_uses_parent() {
        let options = ReplaceOptions::default();
        assert_eq!(
            options.temp_dir_for(Path::new("/etc/app/config.yaml")),
            PathBuf::from("/etc/app")
        );
        assert_eq!(
            options.temp_dir_for(Path::new("config.yaml")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn explicit_and_system_placements() {
        let explicit = ReplaceOptions {
            temp_placement: TempPlacement::Dir(PathBuf::from("/scratch")),
            ..ReplaceOptions::default()
        };
        assert_eq!(
            explicit.temp_dir_for(Path::new("/etc/a")),
            PathBuf::from("/scratch")
        );

        let system = ReplaceOptions {
            temp_placement: TempPlacement::SystemTemp,
            ..ReplaceOptions::default()
        };
        assert_eq!(system.temp_dir_for(Path::new("/etc/a")), std::env::temp_dir());
    }

    #[test]
    fn options_from_config() {
        let config = Config {
            buffer_size: 128,
            temp_placement: TempPlacement::SystemTemp,
            spool_limit: Some(64),
        };
        let options = ReplaceOptions::from(&config);
        assert_eq!(options.buffer_size, 128);
        assert_eq!(options.temp_placement, TempPlacement::SystemTemp);
        assert_eq!(options.spool_limit, Some(64));
    }

    #[test]
    fn replacer_rejects_invalid_options() {
        let zero_buffer = ReplaceOptions {
            buffer_size: 0,
            ..ReplaceOptions::default()
        };
        assert!(matches!(
            Replacer::new(zero_buffer),
            Err(FsError::InvalidArgument(_))
        ));

        let zero_spool = ReplaceOptions {
            spool_limit: Some(0),
            ..ReplaceOptions::default()
        };
        assert!(matches!(
            Replacer::new(zero_spool),
            Err(FsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn copy_failure_leaves_destination_and_removes_temp() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("settings.conf");
        fs::write(&dest, "original").unwrap();

        let err = replace_file(FailingReader { ok_bytes: 3 }, &dest).unwrap_err();
        assert!(matches!(err, FsError::Io { .. }), "got: {err}");

        assert_eq!(fs::read_to_string(&dest).unwrap(), "original");
        assert_eq!(entries(dir.path()), vec!["settings.conf".to_string()]);
    }

    #[test]
    fn rename_failure_leaves_destination_and_removes_temp() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory cannot be replaced by a regular file.
        let dest = dir.path().join("occupied");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("inner"), "keep").unwrap();

        let err = replace_file(&b"new"[..], &dest).unwrap_err();
        assert!(matches!(err, FsError::Io { .. }), "got: {err}");

        assert!(dest.is_dir());
        assert_eq!(fs::read_to_string(dest.join("inner")).unwrap(), "keep");
        assert_eq!(entries(dir.path()), vec!["occupied".to_string()]);
    }

    #[test]
    fn close_and_remove_deletes_file() {
        let dir = TempDir::new().unwrap();
        let temp = NamedTempFile::new_in(dir.path()).unwrap();
        let path = temp.path().to_path_buf();
        assert!(path.exists());
        close_and_remove(temp).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn spool_spills_to_disk_past_limit() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("big.bin");
        fs::write(&dest, vec![b'o'; 300]).unwrap();

        let mut replacer = Replacer::new(ReplaceOptions {
            spool_limit: Some(16),
            buffer_size: 32,
            ..ReplaceOptions::default()
        })
        .unwrap();
        // Identical for the first 100 bytes, so the spool has to roll over.
        let mut source = vec![b'o'; 100];
        source.extend(vec![b'n'; 200]);

        assert!(replacer.replace_file_if_different(&source[..], &dest).unwrap());
        assert_eq!(fs::read(&dest).unwrap(), source);
    }
}
