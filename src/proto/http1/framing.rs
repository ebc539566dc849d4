use std::cmp;
use std::io::Read;

use bytes::Bytes;

use crate::error::{MalformedChunk, Result};
use crate::proto::http1::buffer::BufferedStream;
use crate::proto::http1::header::Converted;

/// How the end of a response body is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// the message has no body at all
    NoBody,
    /// `Content-Length` bytes follow the head
    Sized(u64),
    /// `Transfer-Encoding: chunked`
    Chunked,
    /// the body ends when the peer closes the stream
    UntilClose,
}

impl Framing {
    /// Classify a response. HEAD requests and 1xx, 204 and 304 responses never
    /// have a body, whatever their length headers claim. A chunked transfer
    /// coding wins over `Content-Length`; a missing or unparsable
    /// `Content-Length` leaves the body delimited by closure.
    ///
    /// Interim (1xx) responses are treated as final: each one answers a
    /// pending request, so an unsolicited `100 Continue` shifts every later
    /// response onto the wrong request.
    pub fn decide(head_request: bool, status: u16, chunked: bool, content_length: Option<&Converted<u64>>) -> Self {
        if head_request || (100..200).contains(&status) || status == 204 || status == 304 {
            return Framing::NoBody;
        }
        if chunked {
            return Framing::Chunked;
        }
        match content_length.and_then(Converted::value) {
            Some(len) => Framing::Sized(*len),
            None => Framing::UntilClose,
        }
    }
}

/// Progress through a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyState {
    /// bytes still expected
    Sized(u64),
    /// bytes left in the current chunk, zero when a size line comes next
    Chunked(u64),
    /// reading until the peer closes
    UntilClose,
    /// the body has been read completely
    Done,
}

impl BodyState {
    pub fn new(framing: Framing) -> Self {
        match framing {
            Framing::NoBody | Framing::Sized(0) => BodyState::Done,
            Framing::Sized(len) => BodyState::Sized(len),
            Framing::Chunked => BodyState::Chunked(0),
            Framing::UntilClose => BodyState::UntilClose,
        }
    }

    pub fn is_done(&self) -> bool {
        *self == BodyState::Done
    }

    /// Read at most `max` body bytes. A chunked body never returns bytes of
    /// two chunks from one call. With `max > 0`, an empty result means the
    /// body is done; `max == 0` always returns empty and changes nothing.
    pub fn read<S: Read>(&mut self, stream: &mut BufferedStream<S>, max: usize) -> Result<Bytes> {
        if max == 0 {
            return Ok(Bytes::new());
        }
        match *self {
            BodyState::Done => Ok(Bytes::new()),
            BodyState::Sized(remaining) => {
                let n = cmp::min(max as u64, remaining);
                let data = stream.read_exact(n as usize)?;
                *self = match remaining - n {
                    0 => BodyState::Done,
                    left => BodyState::Sized(left),
                };
                Ok(data)
            }
            BodyState::Chunked(left) => {
                let left = if left == 0 {
                    let size = stream.read_chunk_size()?;
                    trace!("chunk of {} bytes", size);
                    if size == 0 {
                        skip_trailers(stream)?;
                        *self = BodyState::Done;
                        return Ok(Bytes::new());
                    }
                    size
                } else {
                    left
                };
                let n = cmp::min(max as u64, left);
                let data = stream.read_exact(n as usize)?;
                let left = left - n;
                if left == 0 {
                    let crlf = stream.read_exact(2)?;
                    if &crlf[..] != b"\r\n" {
                        return Err(MalformedChunk::new("chunk data not followed by CRLF").into());
                    }
                }
                *self = BodyState::Chunked(left);
                Ok(data)
            }
            BodyState::UntilClose => {
                let data = stream.read_available(max)?;
                if data.is_empty() {
                    *self = BodyState::Done;
                }
                Ok(data)
            }
        }
    }
}

// trailer fields are not interpreted, only consumed up to the blank line
fn skip_trailers<S: Read>(stream: &mut BufferedStream<S>) -> Result<()> {
    loop {
        let line = stream.read_line()?;
        if line.is_empty() {
            return Ok(());
        }
        trace!("skipping trailer {:?}", String::from_utf8_lossy(&line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectionClosed;
    use crate::proto::mock::MockStream;

    fn drain(state: &mut BodyState, stream: &mut BufferedStream<MockStream>, step: usize) -> Vec<Vec<u8>> {
        let mut parts = Vec::new();
        while !state.is_done() {
            let part = state.read(stream, step).unwrap();
            if !part.is_empty() {
                parts.push(part.to_vec());
            }
        }
        parts
    }

    #[test]
    fn no_body_statuses_and_head() {
        let twelve = Converted::Value(12);
        assert_eq!(Framing::decide(true, 200, false, Some(&twelve)), Framing::NoBody);
        assert_eq!(Framing::decide(false, 204, false, Some(&twelve)), Framing::NoBody);
        assert_eq!(Framing::decide(false, 304, true, Some(&twelve)), Framing::NoBody);
        assert_eq!(Framing::decide(false, 101, false, None), Framing::NoBody);
    }

    #[test]
    fn chunked_wins_over_length() {
        let twelve = Converted::Value(12);
        assert_eq!(Framing::decide(false, 200, true, Some(&twelve)), Framing::Chunked);
        assert_eq!(Framing::decide(false, 200, false, Some(&twelve)), Framing::Sized(12));
    }

    #[test]
    fn unparsable_length_reads_until_close() {
        let raw = Converted::Raw("twelve".to_owned());
        assert_eq!(Framing::decide(false, 200, false, Some(&raw)), Framing::UntilClose);
        assert_eq!(Framing::decide(false, 200, false, None), Framing::UntilClose);
    }

    #[test]
    fn zero_length_is_done_immediately() {
        assert!(BodyState::new(Framing::Sized(0)).is_done());
        assert!(BodyState::new(Framing::NoBody).is_done());
    }

    #[test]
    fn sized_body_stops_at_length() {
        let mut stream = BufferedStream::new(MockStream::from_bytes(b"hello, worldHTTP/1.1"));
        let mut state = BodyState::new(Framing::Sized(12));
        assert_eq!(drain(&mut state, &mut stream, 5), vec![b"hello".to_vec(), b", wor".to_vec(), b"ld".to_vec()]);
        assert_eq!(stream.buffered(), 8);
    }

    #[test]
    fn chunks_are_decoded_one_at_a_time() {
        let wire = b"5\r\nhello\r\n5\r\n, wor\r\n2\r\nld\r\n0\r\n\r\n";
        let mut stream = BufferedStream::new(MockStream::trickle(wire));
        let mut state = BodyState::new(Framing::Chunked);
        assert_eq!(&state.read(&mut stream, 5).unwrap()[..], b"hello");
        assert_eq!(&state.read(&mut stream, 5).unwrap()[..], b", wor");
        assert_eq!(&state.read(&mut stream, 5).unwrap()[..], b"ld");
        assert!(state.read(&mut stream, 5).unwrap().is_empty());
        assert!(state.is_done());
        assert!(state.read(&mut stream, 5).unwrap().is_empty());
    }

    #[test]
    fn chunk_larger_than_read() {
        let wire = b"c\r\nhello, world\r\n0\r\nExpires: never\r\n\r\n";
        let mut stream = BufferedStream::new(MockStream::from_bytes(wire));
        let mut state = BodyState::new(Framing::Chunked);
        assert_eq!(drain(&mut state, &mut stream, 5), vec![b"hello".to_vec(), b", wor".to_vec(), b"ld".to_vec()]);
        assert_eq!(stream.buffered(), 0);
    }

    #[test]
    fn chunk_without_crlf_is_malformed() {
        let mut stream = BufferedStream::new(MockStream::from_bytes(b"2\r\nokXX"));
        let mut state = BodyState::new(Framing::Chunked);
        assert!(state.read(&mut stream, 10).unwrap_err().is::<MalformedChunk>());
    }

    #[test]
    fn until_close_ends_quietly() {
        let mut stream = BufferedStream::new(MockStream::from_chunks(&[b"line\r\n", b"line\r\n"]));
        let mut state = BodyState::new(Framing::UntilClose);
        assert_eq!(drain(&mut state, &mut stream, 1024), vec![b"line\r\n".to_vec(), b"line\r\n".to_vec()]);
    }

    #[test]
    fn sized_body_cut_short() {
        let mut stream = BufferedStream::new(MockStream::from_bytes(b"short"));
        let mut state = BodyState::new(Framing::Sized(10));
        assert!(state.read(&mut stream, 10).unwrap_err().is::<ConnectionClosed>());
    }
}
