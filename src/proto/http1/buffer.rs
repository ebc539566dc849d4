use std::cmp;
use std::io::{self, Read, Write};

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{ConnectionClosed, MalformedChunk, MalformedHeaderLine, Result};

/// smallest amount of bytes requested from the stream in one pull
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// largest amount of bytes requested from the stream in one pull
pub const MAX_PULL_SIZE: usize = 64 * 1024;

/// longest line accepted by `read_line`, terminator excluded
pub const MAX_LINE_SIZE: usize = 64 * 1024;

/// A stream plus the bytes received from it but not consumed yet.
///
/// Reads only touch the stream when the buffered bytes cannot satisfy the
/// request, and then always ask for at least [`DEFAULT_BUFFER_SIZE`] bytes.
#[derive(Debug)]
pub struct BufferedStream<S> {
    io: S,
    buf: BytesMut,
    read_size: usize,
}

impl<S> BufferedStream<S> {
    pub fn new(io: S) -> Self {
        Self::with_read_size(io, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_read_size(io: S, read_size: usize) -> Self {
        Self {
            io,
            buf: BytesMut::with_capacity(read_size),
            read_size: cmp::max(read_size, 1),
        }
    }

    /// number of received bytes not consumed yet
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn get_ref(&self) -> &S {
        &self.io
    }

    pub fn into_inner(self) -> S {
        self.io
    }
}

impl<S: Write> BufferedStream<S> {
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.io.write_all(data)?;
        self.io.flush()?;
        Ok(())
    }
}

impl<S: Read> BufferedStream<S> {
    /// pull up to `want` bytes from the stream, returning how many arrived.
    /// Zero means the peer closed the stream.
    fn fill(&mut self, want: usize) -> Result<usize> {
        let start = self.buf.len();
        let want = cmp::max(cmp::min(want, MAX_PULL_SIZE), self.read_size);
        self.buf.resize(start + want, 0);
        let read = loop {
            match self.io.read(&mut self.buf[start..]) {
                Ok(n) => break Ok(n),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };
        match read {
            Ok(n) => {
                self.buf.truncate(start + n);
                trace!("received {} bytes, {} buffered", n, self.buf.len());
                Ok(n)
            }
            Err(e) => {
                self.buf.truncate(start);
                Err(e.into())
            }
        }
    }

    /// Read the next line terminated by CRLF, without the terminator.
    ///
    /// Lines longer than [`MAX_LINE_SIZE`] are a `MalformedHeaderLine`.
    pub fn read_line(&mut self) -> Result<Bytes> {
        let mut searched = 0;
        loop {
            if let Some(eol) = find_crlf(&self.buf[searched..]) {
                if searched + eol > MAX_LINE_SIZE {
                    return Err(line_too_long());
                }
                let line = self.buf.split_to(searched + eol).freeze();
                self.buf.advance(2);
                return Ok(line);
            }
            // one extra byte may be the `\r` of the terminator
            if self.buf.len() > MAX_LINE_SIZE + 1 {
                return Err(line_too_long());
            }
            // the last byte may be the `\r` of a split terminator
            searched = self.buf.len().saturating_sub(1);
            if self.fill(self.read_size)? == 0 {
                return Err(ConnectionClosed.into());
            }
        }
    }

    /// Read exactly `n` bytes.
    pub fn read_exact(&mut self, n: usize) -> Result<Bytes> {
        while self.buf.len() < n {
            let required = n - self.buf.len();
            if self.fill(required)? == 0 {
                return Err(ConnectionClosed.into());
            }
        }
        Ok(self.buf.split_to(n).freeze())
    }

    /// Read at most `max` bytes, pulling from the stream only when nothing is
    /// buffered. An empty result means the peer closed the stream.
    pub fn read_available(&mut self, max: usize) -> Result<Bytes> {
        if max == 0 {
            return Ok(Bytes::new());
        }
        if self.buf.is_empty() && self.fill(self.read_size)? == 0 {
            return Ok(Bytes::new());
        }
        let n = cmp::min(max, self.buf.len());
        Ok(self.buf.split_to(n).freeze())
    }

    /// Read a chunk-size line of a chunked body, ignoring chunk extensions.
    pub fn read_chunk_size(&mut self) -> Result<u64> {
        loop {
            match httparse::parse_chunk_size(&self.buf) {
                Ok(httparse::Status::Complete((consumed, size))) => {
                    self.buf.advance(consumed);
                    return Ok(size);
                }
                Ok(httparse::Status::Partial) => {
                    if self.fill(self.read_size)? == 0 {
                        return Err(ConnectionClosed.into());
                    }
                }
                Err(_) => {
                    let end = cmp::min(self.buf.len(), 32);
                    return Err(MalformedChunk::new(format!(
                        "invalid chunk size line {:?}",
                        String::from_utf8_lossy(&self.buf[..end])
                    )).into());
                }
            }
        }
    }
}

fn line_too_long() -> crate::error::Error {
    MalformedHeaderLine::new(format!("line longer than {} bytes", MAX_LINE_SIZE)).into()
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}
