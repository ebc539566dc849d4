use bytes::{BufMut, BytesMut};

use crate::body::Body;
use crate::error::{InvalidRequest, Result};
use crate::proto::http1::header::{canonical_name, check_value, is_framing_header};

const CRLF: &[u8] = b"\r\n";

/// Canonicalize caller supplied request headers into wire names.
///
/// `Content-Length` and `Transfer-Encoding` are dropped, the encoder decides
/// the framing of every request itself.
pub fn canonicalize<I, K, V>(headers: I) -> Result<Vec<(String, Vec<u8>)>>
    where I: IntoIterator<Item=(K, V)>,
          K: AsRef<str>,
          V: AsRef<[u8]>,
{
    let mut canonical = Vec::new();
    for (key, value) in headers {
        let name = canonical_name(key.as_ref())?;
        if is_framing_header(&name) {
            warn!("ignoring caller supplied {} header, framing is decided by the body", name);
            continue;
        }
        check_value(&name, value.as_ref())?;
        canonical.push((name.into_owned(), value.as_ref().to_vec()));
    }
    Ok(canonical)
}

/// Serializes requests and request chunks into their HTTP/1.1 wire form.
#[derive(Debug)]
pub struct RequestEncoder;

impl RequestEncoder {
    /// Encode the request line, `headers` and either the fixed `body` with a
    /// `Content-Length`, or the head of a chunked request when `body` is `None`.
    pub fn encode(method: &str, target: &str, headers: &[(String, Vec<u8>)], body: Option<&Body>) -> Result<BytesMut> {
        check_request_line(method, target)?;
        let body_len = body.map(Body::body_length).unwrap_or(0);
        let mut buf = BytesMut::with_capacity(256 + body_len);
        Self::ready_start_line(&mut buf, method, target);
        Self::ready_headers(&mut buf, headers);
        match body {
            Some(_) => {
                let mut len = itoa::Buffer::new();
                buf.put_slice(b"Content-Length: ");
                buf.put_slice(len.format(body_len).as_bytes());
                buf.put_slice(CRLF);
            }
            None => buf.put_slice(b"Transfer-Encoding: chunked\r\n"),
        }
        Self::end_of_headers(&mut buf);
        if let Some(body) = body {
            buf.put_slice(body.as_bytes());
        }
        Ok(buf)
    }

    /// Encode one chunk of a chunked body. An empty chunk is the terminator.
    pub fn encode_chunk(chunk: &[u8]) -> BytesMut {
        let mut buf = BytesMut::with_capacity(chunk.len() + 20);
        buf.put_slice(format!("{:x}", chunk.len()).as_bytes());
        buf.put_slice(CRLF);
        buf.put_slice(chunk);
        buf.put_slice(CRLF);
        buf
    }

    /// [Method SP Target SP Version]
    fn ready_start_line(buf: &mut BytesMut, method: &str, target: &str) {
        buf.put_slice(method.as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(target.as_bytes());
        buf.put_slice(b" HTTP/1.1\r\n");
    }

    fn ready_headers(buf: &mut BytesMut, headers: &[(String, Vec<u8>)]) {
        for (name, value) in headers {
            buf.put_slice(name.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value);
            buf.put_slice(CRLF);
        }
    }

    /// write \r\n
    fn end_of_headers(buf: &mut BytesMut) {
        buf.put_slice(CRLF);
    }
}

fn check_request_line(method: &str, target: &str) -> Result<()> {
    let bad = |s: &str| s.is_empty() || s.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control());
    if bad(method) {
        return Err(InvalidRequest::new(format!("method {:?}", method)).into());
    }
    if bad(target) {
        return Err(InvalidRequest::new(format!("target {:?}", target)).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InvalidHeaderValue, UnknownHeaderName};

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, Vec<u8>)> {
        canonicalize(pairs.iter().cloned()).unwrap()
    }

    #[test]
    fn fixed_body_gets_content_length() {
        let headers = headers(&[("host", "example.com"), ("user_agent", "httpipe")]);
        let buf = RequestEncoder::encode("POST", "/submit", &headers, Some(&Body::from_str("a=1"))).unwrap();
        assert_eq!(
            &buf[..],
            &b"POST /submit HTTP/1.1\r\nHost: example.com\r\nUser-Agent: httpipe\r\nContent-Length: 3\r\n\r\na=1"[..]
        );
    }

    #[test]
    fn empty_body_still_declares_length() {
        let buf = RequestEncoder::encode("GET", "/", &[], Some(&Body::empty())).unwrap();
        assert_eq!(&buf[..], &b"GET / HTTP/1.1\r\nContent-Length: 0\r\n\r\n"[..]);
    }

    #[test]
    fn absent_body_is_chunked() {
        let buf = RequestEncoder::encode("PUT", "/upload", &[], None).unwrap();
        assert_eq!(&buf[..], &b"PUT /upload HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n"[..]);
    }

    #[test]
    fn chunks_are_hex_sized() {
        assert_eq!(&RequestEncoder::encode_chunk(b"hello")[..], &b"5\r\nhello\r\n"[..]);
        assert_eq!(&RequestEncoder::encode_chunk(&[b'x'; 26])[..4], &b"1a\r\n"[..]);
        assert_eq!(&RequestEncoder::encode_chunk(b"")[..], &b"0\r\n\r\n"[..]);
    }

    #[test]
    fn caller_framing_headers_are_dropped() {
        let headers = headers(&[("content_length", "99"), ("Transfer-Encoding", "gzip"), ("accept", "*/*")]);
        assert_eq!(headers, vec![("Accept".to_owned(), b"*/*".to_vec())]);
    }

    #[test]
    fn bad_headers_are_rejected() {
        let err = canonicalize(vec![("not valid", "x")]).unwrap_err();
        assert!(err.is::<UnknownHeaderName>());
        let err = canonicalize(vec![("x_test", "a\r\nb")]).unwrap_err();
        assert!(err.is::<InvalidHeaderValue>());
    }

    #[test]
    fn request_line_is_validated() {
        assert!(RequestEncoder::encode("GET", "/a b", &[], None).unwrap_err().is::<InvalidRequest>());
        assert!(RequestEncoder::encode("", "/", &[], None).unwrap_err().is::<InvalidRequest>());
    }
}
