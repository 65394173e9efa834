//! Read-side buffer engine.
//!
//! Pulls fixed-size blocks from a byte source and serves them back in small,
//! variable-size pieces. A scalar whose bytes straddle a block boundary is
//! reassembled from a small carry-over buffer that retains the tail of the block
//! being discarded.
//!
//! The engine is strict about short reads: it tracks how many bytes of the current
//! block are valid and reports [`GraphcodeError::UnexpectedEndOfStream`] rather than
//! serving bytes the source never produced.

use std::io::{ErrorKind, Read};

use crate::error::{GraphcodeError, Result};
use crate::format::{MAX_SCALAR_WIDTH, MIN_BLOCK_SIZE};

/// A block-buffered reader with carry-over reassembly for boundary-straddling scalars.
#[derive(Debug)]
pub struct BlockReader<R: Read> {
    source: R,
    block: Vec<u8>,
    /// Number of valid bytes in `block`.
    filled: usize,
    cursor: usize,
    /// Tail of the previous block, indexed by block offset modulo its length.
    carry: [u8; MAX_SCALAR_WIDTH],
    /// Set once the source reported end-of-stream.
    exhausted: bool,
    consumed: u64,
}

impl<R: Read> BlockReader<R> {
    /// Creates a reader pulling `block_size` bytes per refill (clamped to [`MIN_BLOCK_SIZE`]).
    pub fn new(source: R, block_size: usize) -> Self {
        Self {
            source,
            block: vec![0; block_size.max(MIN_BLOCK_SIZE)],
            filled: 0,
            cursor: 0,
            carry: [0; MAX_SCALAR_WIDTH],
            exhausted: false,
            consumed: 0,
        }
    }

    /// Total bytes handed out so far.
    pub fn position(&self) -> u64 {
        self.consumed
    }

    /// Returns `true` once every byte of the source has been consumed.
    pub fn at_end(&mut self) -> Result<bool> {
        if self.cursor == self.filled {
            self.refill()?;
        }
        Ok(self.cursor == self.filled)
    }

    /// Returns the underlying source. Bytes already buffered are discarded.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Serves `count` bytes (at most [`MAX_SCALAR_WIDTH`]) in the first slots of the result.
    ///
    /// The bytes may span the end of the current block and the start of the next.
    pub fn fill(&mut self, count: usize) -> Result<[u8; MAX_SCALAR_WIDTH]> {
        if count > MAX_SCALAR_WIDTH {
            return Err(GraphcodeError::Internal(format!(
                "fill of {count} bytes exceeds the scalar width"
            )));
        }
        let mut out = [0u8; MAX_SCALAR_WIDTH];
        if self.cursor == self.filled {
            self.refill()?;
        }

        let available = self.filled - self.cursor;
        if available >= count {
            out[..count].copy_from_slice(&self.block[self.cursor..self.cursor + count]);
            self.cursor += count;
            self.consumed += count as u64;
            return Ok(out);
        }

        // Straddle: the head of the value lives in the tail of this block.
        let head_start = self.cursor;
        let block_len = self.filled;
        self.refill()?;
        for (i, slot) in out.iter_mut().take(available).enumerate() {
            let pos = head_start + i;
            debug_assert!(pos + MAX_SCALAR_WIDTH >= block_len);
            *slot = self.carry[pos % MAX_SCALAR_WIDTH];
        }

        let rest = count - available;
        if self.filled < rest {
            return Err(GraphcodeError::UnexpectedEndOfStream {
                needed: count,
                available: available + self.filled,
            });
        }
        out[available..count].copy_from_slice(&self.block[..rest]);
        self.cursor = rest;
        self.consumed += count as u64;
        Ok(out)
    }

    /// Copies exactly `dest.len()` bytes, refilling as many blocks as needed.
    pub fn read_bytes(&mut self, dest: &mut [u8]) -> Result<()> {
        let mut written = 0;
        while written < dest.len() {
            let chunk = self.next_chunk(dest.len() - written, dest.len(), written)?;
            dest[written..written + chunk.len()].copy_from_slice(chunk);
            written += chunk.len();
        }
        Ok(())
    }

    /// Reads exactly `len` bytes into a new vector.
    ///
    /// The vector grows with the data actually received, so a corrupted length
    /// prefix on a truncated stream fails without a matching up-front allocation.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len.min(self.block.len()));
        while out.len() < len {
            let received = out.len();
            let chunk = self.next_chunk(len - received, len, received)?;
            out.extend_from_slice(chunk);
        }
        Ok(out)
    }

    /// Returns up to `want` bytes from the current block, refilling it when exhausted.
    fn next_chunk(&mut self, want: usize, total: usize, received: usize) -> Result<&[u8]> {
        if self.cursor == self.filled {
            self.refill()?;
            if self.filled == 0 {
                return Err(GraphcodeError::UnexpectedEndOfStream {
                    needed: total,
                    available: received,
                });
            }
        }
        let take = want.min(self.filled - self.cursor);
        let start = self.cursor;
        self.cursor += take;
        self.consumed += take as u64;
        Ok(&self.block[start..start + take])
    }

    /// Saves the tail of the current block into the carry-over buffer and loads the next one.
    fn refill(&mut self) -> Result<()> {
        let tail_start = self.filled.saturating_sub(MAX_SCALAR_WIDTH);
        for pos in tail_start..self.filled {
            self.carry[pos % MAX_SCALAR_WIDTH] = self.block[pos];
        }

        self.cursor = 0;
        self.filled = 0;
        while !self.exhausted && self.filled < self.block.len() {
            match self.source.read(&mut self.block[self.filled..]) {
                Ok(0) => self.exhausted = true,
                Ok(n) => self.filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::trace!(bytes = self.filled, exhausted = self.exhausted, "refilled block");
        Ok(())
    }
}
