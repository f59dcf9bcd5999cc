//! Random-access byte sources probed by the engine.
//!
//! Every read the engine performs is positional: a source never carries a
//! cursor that one test could disturb for another. Short reads (including
//! end-of-stream) are reported as a byte count, not as an error, so callers
//! can tell "not enough data" apart from "the stream is unreadable".

use std::fs::File;
use std::io::{self, Cursor};

/// A byte-addressable, read-only stream.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read; `0` means `offset` is at or past the
    /// end of the stream.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

impl ByteSource for [u8] {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let start = match usize::try_from(offset) {
            Ok(start) if start < self.len() => start,
            _ => return Ok(0),
        };
        let available = &self[start..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }
}

impl ByteSource for Vec<u8> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.as_slice().read_at(buf, offset)
    }
}

impl<T: AsRef<[u8]>> ByteSource for Cursor<T> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.get_ref().as_ref().read_at(buf, offset)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &S {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read_at(buf, offset)
    }
}

#[cfg(unix)]
impl ByteSource for File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }
}

// `seek_read` moves the handle's cursor; positional semantics still hold
// because the engine never performs cursor-relative reads.
#[cfg(windows)]
impl ByteSource for File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

/// Fill `buf` from `offset`, looping over partial reads.
///
/// Stops early only at end-of-stream; returns how many bytes landed in `buf`.
pub fn read_full<S: ByteSource + ?Sized>(
    source: &S,
    buf: &mut [u8],
    offset: u64,
) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let Some(pos) = offset.checked_add(filled as u64) else {
            break;
        };
        match source.read_at(&mut buf[filled..], pos) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Read exactly `N` bytes at `offset`, or `None` on a short read.
pub fn read_array<const N: usize, S: ByteSource + ?Sized>(
    source: &S,
    offset: u64,
) -> io::Result<Option<[u8; N]>> {
    let mut buf = [0u8; N];
    let n = read_full(source, &mut buf, offset)?;
    Ok((n == N).then_some(buf))
}

const CHUNK_SIZE: usize = 8192;

/// Read from `offset` until end-of-stream or until `limit` bytes are collected.
pub fn read_remaining<S: ByteSource + ?Sized>(
    source: &S,
    offset: u64,
    limit: Option<usize>,
) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let want = match limit {
            Some(limit) if out.len() >= limit => break,
            Some(limit) => (limit - out.len()).min(CHUNK_SIZE),
            None => CHUNK_SIZE,
        };
        let Some(pos) = offset.checked_add(out.len() as u64) else {
            break;
        };
        let n = read_full(source, &mut chunk[..want], pos)?;
        out.extend_from_slice(&chunk[..n]);
        if n < want {
            break;
        }
    }
    Ok(out)
}

/// Read a NUL-terminated run starting at `offset`, capped at `max_len` bytes.
///
/// Returns the bytes before the terminator and the number of stream bytes
/// consumed (terminator included when one was found).
pub fn read_c_string<S: ByteSource + ?Sized>(
    source: &S,
    offset: u64,
    max_len: usize,
) -> io::Result<(Vec<u8>, usize)> {
    let mut out = Vec::new();
    let mut chunk = [0u8; 256];
    while out.len() < max_len {
        let want = (max_len - out.len()).min(chunk.len());
        let Some(pos) = offset.checked_add(out.len() as u64) else {
            break;
        };
        let n = read_full(source, &mut chunk[..want], pos)?;
        if let Some(nul) = chunk[..n].iter().position(|&b| b == 0) {
            out.extend_from_slice(&chunk[..nul]);
            let consumed = out.len() + 1;
            return Ok((out, consumed));
        }
        out.extend_from_slice(&chunk[..n]);
        if n < want {
            break;
        }
    }
    let consumed = out.len();
    Ok((out, consumed))
}
