use crate::proto::http1::header::list_contains;
use crate::version::Version;

pub(crate) mod buffer;
pub(crate) mod conn;
pub(crate) mod encode;
pub(crate) mod framing;
pub(crate) mod header;
pub(crate) mod parse;
pub(crate) mod pipeline;

/// true when a `Connection` header value lists `keep-alive`
pub fn connection_keep_alive(value: &str) -> bool {
    list_contains(value, "keep-alive")
}

/// true when a `Connection` header value lists `close`
pub fn connection_close(value: &str) -> bool {
    list_contains(value, "close")
}

/// Decide whether the stream stays usable after a response.
///
/// HTTP/1.1 connections persist unless the response says `close`; HTTP/1.0
/// connections close unless it says `keep-alive`.
pub fn keep_alive(version: Version, connection: Option<&str>) -> bool {
    match (version, connection) {
        (Version::Http11, Some(value)) => !connection_close(value),
        (Version::Http11, None) => true,
        (Version::Http10, Some(value)) => connection_keep_alive(value),
        (Version::Http10, None) => false,
    }
}
