//! Growable byte container with a write cursor and back-patch support.
//!
//! This is the serializer's sole means of writing bytes: it owns the
//! growing `Vec<u8>`, exposes the current write position so the caller can
//! reserve a length prefix up front and fill it in once the payload that
//! follows is known, and turns allocator exhaustion into a typed error
//! instead of aborting the process.

use crate::error::{Error, Result};

/// A growable byte buffer with append, reserve/patch, and position tracking.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Appends `bytes` to the end of the buffer.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.data
            .try_reserve(bytes.len())
            .map_err(|_| Error::OutOfMemory)?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Appends `n` zeroed bytes and returns their starting offset, for a
    /// length prefix to be [`patch`](Self::patch)ed in once known.
    pub fn reserve(&mut self, n: usize) -> Result<usize> {
        let offset = self.data.len();
        self.data.try_reserve(n).map_err(|_| Error::OutOfMemory)?;
        self.data.resize(offset + n, 0);
        Ok(offset)
    }

    /// Overwrites the `bytes.len()` bytes starting at `offset`, which must
    /// have been obtained from a prior [`reserve`](Self::reserve) call (or
    /// otherwise already exist in the buffer).
    pub fn patch(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        debug_assert!(end <= self.data.len(), "patch range out of bounds");
        self.data[offset..end].copy_from_slice(bytes);
    }

    /// The current write cursor, i.e. the number of bytes written so far.
    pub fn position(&self) -> usize {
        self.data.len()
    }

    /// An immutable view of everything written so far.
    pub fn slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer, returning the written bytes. Dropping a
    /// `ByteBuffer` without calling this (e.g. on an error path) releases
    /// its storage the same way: `Vec`'s own `Drop` impl, which is why
    /// every exit path — success or failure — frees a partial buffer
    /// without any explicit bookkeeping in the serializer.
    pub fn release(self) -> Vec<u8> {
        self.data
    }
}
