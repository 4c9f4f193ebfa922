//! Random-access reader abstraction.
//!
//! Format parsers perform sparse positioned reads (headers at fixed offsets,
//! directory records, hunk maps), so the whole pipeline is built on
//! [`ReadAt`] rather than `Read + Seek`: calls are idempotent, carry no
//! cursor state, and wrappers (ZIP entries, CHD tracks, sector translation)
//! compose by translating offsets.

use std::io;
use std::sync::Arc;

use crate::error::IdentError;

/// A reader supporting positioned reads.
pub trait ReadAt {
    /// Read up to `buf.len()` bytes at `offset`, returning the count read.
    /// A return of 0 means end of data.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Read exactly `buf.len()` bytes at `offset`, or fail with
    /// `UnexpectedEof`.
    fn read_exact_at(&self, mut offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.read_at(offset, buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "failed to fill whole buffer",
                    ));
                }
                Ok(n) => {
                    offset += n as u64;
                    buf = &mut buf[n..];
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl ReadAt for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl ReadAt for Vec<u8> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.as_slice().read_at(offset, buf)
    }
}

#[cfg(unix)]
impl ReadAt for std::fs::File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }
}

#[cfg(windows)]
impl ReadAt for std::fs::File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

impl<T: ReadAt + ?Sized> ReadAt for &T {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

impl<T: ReadAt + ?Sized> ReadAt for Box<T> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

impl<T: ReadAt + ?Sized> ReadAt for Arc<T> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

/// Read `len` bytes at `offset` into a fresh buffer.
pub fn read_vec_at(reader: &dyn ReadAt, offset: u64, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact_at(offset, &mut buf)?;
    Ok(buf)
}

/// Read a fixed-size structure for a format parser.
///
/// A short read means the file cannot be this format, so `UnexpectedEof`
/// maps to [`IdentError::Invalid`] rather than an I/O failure; every other
/// I/O error is surfaced as-is.
pub fn read_header(
    reader: &dyn ReadAt,
    offset: u64,
    len: usize,
    what: &str,
) -> Result<Vec<u8>, IdentError> {
    read_vec_at(reader, offset, len).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            IdentError::invalid(format!("{what}: file too small"))
        } else {
            IdentError::Io(e)
        }
    })
}
