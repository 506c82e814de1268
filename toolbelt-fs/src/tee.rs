//! Reader adapter that copies everything it yields into a sink.

use std::io::{self, Read, Write};

/// Every byte read through a `TeeReader` is also written to `sink`.
pub(crate) struct TeeReader<R, W> {
    reader: R,
    sink: W,
}

impl<R: Read, W: Write> TeeReader<R, W> {
    pub(crate) fn new(reader: R, sink: W) -> Self {
        Self { reader, sink }
    }
}

impl<R: Read, W: Write> Read for TeeReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.sink.write_all(&buf[..n])?;
        Ok(n)
    }
}
