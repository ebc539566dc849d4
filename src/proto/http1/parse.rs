use std::io::Read;

use fnv::FnvHashMap;

use crate::error::{MalformedHeaderLine, MalformedStatusLine, ProtocolViolation, Result};
use crate::proto::http1::buffer::BufferedStream;
use crate::proto::http1::framing::Framing;
use crate::proto::http1::header::{convert, latin1, list_contains, parse_header_line, HeaderParams};
use crate::proto::http1::keep_alive;
use crate::proto::http1::pipeline::Pipeline;
use crate::response::Response;
use crate::version::Version;

const MAX_HEADERS: usize = 100;

/// The three parts of a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: Version,
    pub status: u16,
    pub reason: String,
}

/// Split a status line on its first two spaces. The reason phrase is the
/// rest of the line and may be empty or contain spaces.
pub fn parse_status_line(line: &[u8]) -> Result<StatusLine> {
    let malformed = || MalformedStatusLine::new(latin1(line));

    let sp = line.iter().position(|b| *b == b' ').ok_or_else(malformed)?;
    let version = Version::from_bytes(&line[..sp]).ok_or_else(malformed)?;

    let rest = &line[sp + 1..];
    let (code, reason) = match rest.iter().position(|b| *b == b' ') {
        Some(sp) => (&rest[..sp], &rest[sp + 1..]),
        None => (rest, &b""[..]),
    };
    if code.len() != 3 || !code.iter().all(u8::is_ascii_digit) {
        return Err(malformed().into());
    }
    let status = code.iter().fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
    if !(100..600).contains(&status) {
        return Err(malformed().into());
    }

    Ok(StatusLine {
        version,
        status,
        reason: latin1(reason),
    })
}

/// Reads response heads off a buffered stream.
#[derive(Debug)]
pub struct ResponseParser;

impl ResponseParser {
    /// Read the status line and headers of the next response and pair it with
    /// the oldest pending request.
    pub fn parse<S: Read>(stream: &mut BufferedStream<S>, pipeline: &mut Pipeline) -> Result<Response> {
        if pipeline.is_empty() {
            return Err(ProtocolViolation::new("no request is waiting for a response").into());
        }

        let status_line = stream.read_line().map_err(|err| {
            if err.is::<MalformedHeaderLine>() {
                MalformedStatusLine::new(err.to_string()).into()
            } else {
                err
            }
        })?;
        debug!("{}", String::from_utf8_lossy(&status_line));
        let StatusLine { version, status, reason } = parse_status_line(&status_line)?;

        let mut headers = FnvHashMap::default();
        let mut content_length = None;
        let mut chunked = false;
        let mut connection = None;
        let mut count = 0;
        loop {
            let line = stream.read_line()?;
            if line.is_empty() {
                break;
            }
            count += 1;
            if count > MAX_HEADERS {
                return Err(MalformedHeaderLine::new(format!("more than {} headers", MAX_HEADERS)).into());
            }
            let (name, value) = parse_header_line(&line)?;
            trace!("{}: {}", name, value);
            match name.as_str() {
                "content-length" => content_length = Some(convert::<u64>(&value)),
                "transfer-encoding" => chunked = last_coding_is_chunked(&value),
                "connection" => connection = Some(value.clone()),
                _ => {}
            }
            headers.insert(name, value);
        }

        let request = match pipeline.pop() {
            Some(request) => request,
            None => return Err(ProtocolViolation::new("no request is waiting for a response").into()),
        };
        let framing = Framing::decide(request.is_head(), status, chunked, content_length.as_ref());
        let keep_alive = keep_alive(version, connection.as_deref())
            && framing != Framing::UntilClose;
        let content_type = headers.get("content-type").map(|v: &String| HeaderParams::parse(v));
        debug!("{} {} answered with {:?} framing, keep-alive {}", request.method(), request.target(), framing, keep_alive);

        Ok(Response {
            version,
            status,
            reason,
            headers,
            content_length,
            chunked,
            connection,
            content_type,
            keep_alive,
            framing,
            request,
        })
    }
}

fn last_coding_is_chunked(value: &str) -> bool {
    value
        .rsplit(',')
        .next()
        .map(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectionClosed;
    use crate::proto::http1::header::Converted;
    use crate::proto::http1::pipeline::PendingRequest;
    use crate::proto::mock::MockStream;

    fn pipeline_of(methods: &[&str]) -> Pipeline {
        let mut pipeline = Pipeline::new();
        for method in methods {
            pipeline.push(PendingRequest::new(method, "/", vec![]));
        }
        pipeline
    }

    fn parse(wire: &[u8], method: &str) -> Result<Response> {
        let mut stream = BufferedStream::new(MockStream::from_bytes(wire));
        ResponseParser::parse(&mut stream, &mut pipeline_of(&[method]))
    }

    #[test]
    fn status_line_parts() {
        let line = parse_status_line(b"HTTP/1.1 404 Not Found").unwrap();
        assert_eq!(line.version, Version::Http11);
        assert_eq!(line.status, 404);
        assert_eq!(line.reason, "Not Found");

        let line = parse_status_line(b"HTTP/1.0 200 ").unwrap();
        assert_eq!(line.version, Version::Http10);
        assert_eq!(line.reason, "");

        assert_eq!(parse_status_line(b"HTTP/1.1 204").unwrap().reason, "");
    }

    #[test]
    fn malformed_status_lines() {
        for line in &[&b"HTTP/1.1"[..], b"HTTP/2 200 OK", b"HTTP/1.1 2000 OK", b"HTTP/1.1 OK 200", b"HTTP/1.1 099 Low", b"garbage"] {
            assert!(parse_status_line(line).unwrap_err().is::<MalformedStatusLine>(), "{:?}", line);
        }
    }

    #[test]
    fn headers_and_derived_values() {
        let response = parse(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=UTF-8\r\nContent-Length: 12\r\nX-Dup: 1\r\nx-dup: 2\r\n\r\n",
            "GET",
        ).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.reason(), "OK");
        assert_eq!(response.header("X-DUP"), Some("2"));
        assert_eq!(response.content_length(), Some(&Converted::Value(12)));
        assert_eq!(response.content_type().unwrap().value(), "text/plain");
        assert_eq!(response.charset(), Some("UTF-8"));
        assert_eq!(response.framing(), Framing::Sized(12));
        assert!(response.keep_alive());
    }

    #[test]
    fn head_response_has_no_body() {
        let response = parse(b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\n", "HEAD").unwrap();
        assert_eq!(response.framing(), Framing::NoBody);
        assert!(response.request().is_head());
    }

    #[test]
    fn not_modified_ignores_length() {
        let response = parse(b"HTTP/1.1 304 Not Modified\r\nContent-Length: 5\r\n\r\n", "GET").unwrap();
        assert_eq!(response.framing(), Framing::NoBody);
        let response = parse(b"HTTP/1.1 204 No Content\r\nContent-Length: 5\r\n\r\n", "GET").unwrap();
        assert_eq!(response.framing(), Framing::NoBody);
    }

    #[test]
    fn chunked_and_close_delimited() {
        let response = parse(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: gzip, chunked\r\nContent-Length: 3\r\n\r\n", "GET").unwrap();
        assert!(response.is_chunked());
        assert_eq!(response.framing(), Framing::Chunked);

        let response = parse(b"HTTP/1.1 200 OK\r\nContent-Length: lots\r\n\r\n", "GET").unwrap();
        assert_eq!(response.content_length(), Some(&Converted::Raw("lots".to_owned())));
        assert_eq!(response.framing(), Framing::UntilClose);
        assert!(!response.keep_alive());
    }

    #[test]
    fn http10_closes_by_default() {
        let response = parse(b"HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n", "GET").unwrap();
        assert!(!response.keep_alive());
        let response = parse(b"HTTP/1.0 200 OK\r\nConnection: keep-alive\r\nContent-Length: 0\r\n\r\n", "GET").unwrap();
        assert!(response.keep_alive());
        assert_eq!(response.connection(), Some("keep-alive"));
    }

    #[test]
    fn empty_pipeline_is_a_violation() {
        let mut stream = BufferedStream::new(MockStream::from_bytes(b"HTTP/1.1 200 OK\r\n\r\n").strict());
        let err = ResponseParser::parse(&mut stream, &mut Pipeline::new()).unwrap_err();
        assert!(err.is::<ProtocolViolation>());
        assert_eq!(stream.get_ref().reads_attempted(), 0);
    }

    #[test]
    fn truncated_head() {
        let err = parse(b"HTTP/1.1 200 OK\r\nContent-Le", "GET").unwrap_err();
        assert!(err.is::<ConnectionClosed>());
    }

    #[test]
    fn bad_header_line() {
        let err = parse(b"HTTP/1.1 200 OK\r\nnonsense\r\n\r\n", "GET").unwrap_err();
        assert!(err.is::<MalformedHeaderLine>());
    }

    #[test]
    fn repeated_headers_count_against_the_limit() {
        let mut wire = b"HTTP/1.1 200 OK\r\n".to_vec();
        for _ in 0..=MAX_HEADERS {
            wire.extend_from_slice(b"X-A: 1\r\n");
        }
        wire.extend_from_slice(b"\r\n");
        assert!(parse(&wire, "GET").unwrap_err().is::<MalformedHeaderLine>());

        let mut wire = b"HTTP/1.1 200 OK\r\n".to_vec();
        for _ in 0..MAX_HEADERS {
            wire.extend_from_slice(b"X-A: 1\r\n");
        }
        wire.extend_from_slice(b"\r\n");
        assert_eq!(parse(&wire, "GET").unwrap().header("x-a"), Some("1"));
    }

    #[test]
    fn interim_response_answers_a_request() {
        let mut stream = BufferedStream::new(MockStream::from_bytes(b"HTTP/1.1 100 Continue\r\n\r\n"));
        let mut pipeline = pipeline_of(&["POST", "GET"]);
        let response = ResponseParser::parse(&mut stream, &mut pipeline).unwrap();
        assert_eq!(response.framing(), Framing::NoBody);
        assert_eq!(response.request().method(), "POST");
        assert_eq!(pipeline.len(), 1);
    }

    #[test]
    fn endless_status_line() {
        let wire = vec![b'H'; 128 * 1024];
        assert!(parse(&wire, "GET").unwrap_err().is::<MalformedStatusLine>());
    }

    #[test]
    fn endless_header_line() {
        let mut wire = b"HTTP/1.1 200 OK\r\nX-Long: ".to_vec();
        wire.extend_from_slice(&vec![b'a'; 128 * 1024]);
        assert!(parse(&wire, "GET").unwrap_err().is::<MalformedHeaderLine>());
    }

    #[test]
    fn allow_is_a_list() {
        let response = parse(b"HTTP/1.1 200 OK\r\nAllow: GET, HEAD,POST\r\nContent-Length: 0\r\n\r\n", "OPTIONS").unwrap();
        assert_eq!(response.allow(), Some(vec!["GET", "HEAD", "POST"]));
    }
}
