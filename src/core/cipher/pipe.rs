//! Bounded in-process byte pipe.
//!
//! Connects the decrypt producer to the encrypt consumer during repair so
//! plaintext only ever lives in a few in-flight buffers. The writer batches
//! bytes into chunks of `capacity` and hands them over a bounded channel;
//! dropping (or [`PipeWriter::close`]-ing) the writer is what the reader
//! sees as end-of-input.

use std::io::{self, Read, Write};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use zeroize::Zeroize;

use crate::core::constants::{MAX_PIPE_BUFFER, MIN_PIPE_BUFFER, PIPE_DEPTH};

/// Writing half. Not `Clone`: there is exactly one producer.
pub struct PipeWriter {
    tx: Option<SyncSender<Vec<u8>>>,
    buf: Vec<u8>,
    capacity: usize,
}

/// Reading half.
pub struct PipeReader {
    rx: Receiver<Vec<u8>>,
    chunk: Vec<u8>,
    pos: usize,
}

/// Create a pipe whose chunks are `capacity` bytes (clamped).
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let capacity = capacity.clamp(MIN_PIPE_BUFFER, MAX_PIPE_BUFFER);
    let (tx, rx) = sync_channel(PIPE_DEPTH);
    (
        PipeWriter {
            tx: Some(tx),
            buf: Vec::with_capacity(capacity),
            capacity,
        },
        PipeReader {
            rx,
            chunk: Vec::new(),
            pos: 0,
        },
    )
}

/// Buffer size hint for an object of `source_len` ciphertext bytes.
///
/// Ciphertext size over-estimates the plaintext, so one chunk usually
/// carries a small object whole. Large objects are capped.
pub fn buffer_hint(source_len: u64) -> usize {
    usize::try_from(source_len)
        .unwrap_or(MAX_PIPE_BUFFER)
        .clamp(MIN_PIPE_BUFFER, MAX_PIPE_BUFFER)
}

impl PipeWriter {
    fn send_chunk(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))?;
        let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(self.capacity));
        tx.send(chunk).map_err(|mut e| {
            e.0.zeroize();
            io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader hung up")
        })
    }

    /// Flush remaining bytes and close the write end.
    ///
    /// The reader only reaches EOF after this (or a drop); a producer that
    /// forgets to close leaves the consumer blocked forever.
    pub fn close(mut self) -> io::Result<()> {
        let flushed = self.send_chunk();
        self.tx.take();
        flushed
    }
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let room = self.capacity - self.buf.len();
        let n = room.min(data.len());
        self.buf.extend_from_slice(&data[..n]);
        if self.buf.len() >= self.capacity {
            self.send_chunk()?;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_chunk()
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        if self.tx.is_some() {
            let _ = self.send_chunk();
        }
        self.buf.zeroize();
    }
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        while self.pos == self.chunk.len() {
            self.chunk.zeroize();
            match self.rx.recv() {
                Ok(next) => {
                    self.chunk = next;
                    self.pos = 0;
                }
                // every sender dropped: end of input
                Err(_) => return Ok(0),
            }
        }
        let n = (self.chunk.len() - self.pos).min(out.len());
        out[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.chunk.zeroize();
    }
}
