//! Byte-exact equality for streams and files.
//!
//! ## `streams_equal` — double-buffered loop
//!
//! 1. Fill scratch buffer A from stream A, then buffer B from stream B.
//!    A fill only stops short at end-of-stream.
//! 2. Fill counts differ → unequal (one stream ended first).
//! 3. Both zero → equal.
//! 4. Compare the filled prefixes; first mismatch → unequal.
//!
//! ## `compare_files` — three tiers
//!
//! Same underlying file → equal; different sizes → unequal; otherwise
//! `streams_equal` over the two open handles.

use std::cell::RefCell;
use std::fmt;
use std::fs::{File, Metadata};
use std::io::{self, ErrorKind, Read};
use std::path::Path;

use toolbelt_core::DEFAULT_READ_BUFFER_SIZE;

use crate::error::{open_err, stat_err, FsError};

// ---------------------------------------------------------------------------
// StreamComparator
// ---------------------------------------------------------------------------

/// Compares byte streams with two reusable scratch buffers.
///
/// The buffers are mutated by every call, so [`StreamComparator::streams_equal`]
/// takes `&mut self`: one instance serves one caller at a time. Threads that
/// need a comparator without owning one use [`with_default_comparator`].
pub struct StreamComparator {
    buf_a: Box<[u8]>,
    buf_b: Box<[u8]>,
}

impl StreamComparator {
    /// Allocate a comparator with two buffers of `buffer_size` bytes.
    pub fn new(buffer_size: usize) -> Result<Self, FsError> {
        if buffer_size == 0 {
            return Err(FsError::InvalidArgument(
                "buffer size must be > 0".to_string(),
            ));
        }
        Ok(Self {
            buf_a: vec![0; buffer_size].into_boxed_slice(),
            buf_b: vec![0; buffer_size].into_boxed_slice(),
        })
    }

    pub fn buffer_size(&self) -> usize {
        self.buf_a.len()
    }

    /// `true` if both readers yield exactly the same bytes until end-of-stream.
    ///
    /// Streams are consumed from their current position; nothing is rewound.
    /// Reading stops at the first difference, so the streams may be left
    /// partially consumed. Any read error other than end-of-stream aborts the
    /// comparison with [`FsError::Read`].
    pub fn streams_equal<A, B>(&mut self, mut a: A, mut b: B) -> Result<bool, FsError>
    where
        A: Read,
        B: Read,
    {
        loop {
            let n_a = read_full(&mut a, &mut self.buf_a).map_err(FsError::Read)?;
            let n_b = read_full(&mut b, &mut self.buf_b).map_err(FsError::Read)?;
            if n_a != n_b {
                return Ok(false);
            }
            if n_a == 0 {
                return Ok(true);
            }
            if self.buf_a[..n_a] != self.buf_b[..n_b] {
                return Ok(false);
            }
        }
    }
}

impl Default for StreamComparator {
    fn default() -> Self {
        Self {
            buf_a: vec![0; DEFAULT_READ_BUFFER_SIZE].into_boxed_slice(),
            buf_b: vec![0; DEFAULT_READ_BUFFER_SIZE].into_boxed_slice(),
        }
    }
}

impl fmt::Debug for StreamComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamComparator")
            .field("buffer_size", &self.buffer_size())
            .finish()
    }
}

/// Read until `buf` is full or the reader reports end-of-stream.
///
/// Readers may return short counts (pipes, sockets, chunked adapters);
/// without refilling, equal content split differently would compare unequal.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ---------------------------------------------------------------------------
// Shared default instance
// ---------------------------------------------------------------------------

thread_local! {
    static DEFAULT_COMPARATOR: RefCell<StreamComparator> =
        RefCell::new(StreamComparator::default());
}

/// Run `f` with this thread's default comparator
/// ([`DEFAULT_READ_BUFFER_SIZE`] buffers).
///
/// A nested call on the same thread gets a fresh temporary comparator
/// instead of the shared one.
pub fn with_default_comparator<T, F>(f: F) -> T
where
    F: FnOnce(&mut StreamComparator) -> T,
{
    DEFAULT_COMPARATOR.with(|cell| match cell.try_borrow_mut() {
        Ok(mut comparator) => f(&mut *comparator),
        Err(_) => f(&mut StreamComparator::default()),
    })
}

/// [`StreamComparator::streams_equal`] using the thread's default comparator.
pub fn streams_equal<A: Read, B: Read>(a: A, b: B) -> Result<bool, FsError> {
    with_default_comparator(|c| c.streams_equal(a, b))
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Which check decided a file comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileComparison {
    /// Both paths resolve to the same underlying file; no content was read.
    SameFile,
    /// Sizes differ; no content was read.
    SizeMismatch,
    /// Contents were read and are identical.
    ContentEqual,
    /// Contents were read and differ.
    ContentDiffers,
}

impl FileComparison {
    pub fn is_equal(self) -> bool {
        matches!(self, FileComparison::SameFile | FileComparison::ContentEqual)
    }
}

/// Compare two files, reporting which tier decided.
///
/// Both files are opened first, so a missing path is an error even when the
/// other one is missing too. Handles are closed on every return path.
pub fn compare_files_with(
    comparator: &mut StreamComparator,
    path_a: &Path,
    path_b: &Path,
) -> Result<FileComparison, FsError> {
    let file_a = File::open(path_a).map_err(|e| open_err(path_a, e))?;
    let file_b = File::open(path_b).map_err(|e| open_err(path_b, e))?;

    let meta_a = file_a.metadata().map_err(|e| stat_err(path_a, e))?;
    let meta_b = file_b.metadata().map_err(|e| stat_err(path_b, e))?;

    if same_file(&meta_a, &meta_b, path_a, path_b) {
        tracing::debug!(
            "same file: {} == {}",
            path_a.display(),
            path_b.display()
        );
        return Ok(FileComparison::SameFile);
    }
    if meta_a.len() != meta_b.len() {
        tracing::debug!(
            "size mismatch: {} ({} bytes) vs {} ({} bytes)",
            path_a.display(),
            meta_a.len(),
            path_b.display(),
            meta_b.len()
        );
        return Ok(FileComparison::SizeMismatch);
    }

    if comparator.streams_equal(&file_a, &file_b)? {
        Ok(FileComparison::ContentEqual)
    } else {
        Ok(FileComparison::ContentDiffers)
    }
}

/// [`compare_files_with`] using the thread's default comparator.
pub fn compare_files(path_a: &Path, path_b: &Path) -> Result<FileComparison, FsError> {
    with_default_comparator(|c| compare_files_with(c, path_a, path_b))
}

/// `true` if both files store the same bytes.
pub fn files_equal(path_a: &Path, path_b: &Path) -> Result<bool, FsError> {
    compare_files(path_a, path_b).map(FileComparison::is_equal)
}

/// [`files_equal`] with a caller-owned comparator.
pub fn files_equal_with(
    comparator: &mut StreamComparator,
    path_a: &Path,
    path_b: &Path,
) -> Result<bool, FsError> {
    compare_files_with(comparator, path_a, path_b).map(FileComparison::is_equal)
}

#[cfg(unix)]
fn same_file(a: &Metadata, b: &Metadata, _path_a: &Path, _path_b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_file(_a: &Metadata, _b: &Metadata, path_a: &Path, path_b: &Path) -> bool {
    match (path_a.canonicalize(), path_b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
