//! In-memory stream used by the unit tests.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

#[derive(Debug, Default)]
pub struct MockStream {
    reads: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    largest_request: usize,
    interrupt: bool,
    strict: bool,
    reads_attempted: usize,
}

impl MockStream {
    /// every chunk is handed out by a separate `read` call, then the stream
    /// reports a clean close
    pub fn from_chunks(chunks: &[&[u8]]) -> Self {
        Self {
            reads: chunks.iter().map(|c| c.to_vec()).collect(),
            ..Self::default()
        }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_chunks(&[data])
    }

    /// hand the data out one byte per `read` call
    pub fn trickle(data: &[u8]) -> Self {
        Self {
            reads: data.iter().map(|b| vec![*b]).collect(),
            ..Self::default()
        }
    }

    /// fail every read once the scripted data is used up, instead of closing
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn interrupt_first(mut self) -> Self {
        self.interrupt = true;
        self
    }

    pub fn push(&mut self, data: &[u8]) {
        self.reads.push_back(data.to_vec());
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    pub fn largest_read_request(&self) -> usize {
        self.largest_request
    }

    pub fn reads_attempted(&self) -> usize {
        self.reads_attempted
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads_attempted += 1;
        if self.interrupt {
            self.interrupt = false;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
        }
        self.largest_request = self.largest_request.max(buf.len());
        match self.reads.pop_front() {
            Some(mut chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.reads.push_front(chunk.split_off(n));
                }
                Ok(n)
            }
            None if self.strict => Err(io::Error::new(io::ErrorKind::Other, "unexpected read")),
            None => Ok(0),
        }
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
