//! The head of a received response.

use fnv::FnvHashMap;

use crate::proto::http1::framing::Framing;
use crate::proto::http1::header::{Converted, HeaderParams};
use crate::proto::http1::pipeline::PendingRequest;
use crate::version::Version;

/// Status line and headers of one response, plus the values derived from
/// them while the head was parsed.
///
/// Header names are stored lower-cased; lookups lower-case the name they are
/// given. When a header repeats, the last value wins.
#[derive(Debug, Clone)]
pub struct Response {
    pub(crate) version: Version,
    pub(crate) status: u16,
    pub(crate) reason: String,
    pub(crate) headers: FnvHashMap<String, String>,
    pub(crate) content_length: Option<Converted<u64>>,
    pub(crate) chunked: bool,
    pub(crate) connection: Option<String>,
    pub(crate) content_type: Option<HeaderParams>,
    pub(crate) keep_alive: bool,
    pub(crate) framing: Framing,
    pub(crate) request: PendingRequest,
}

impl Response {
    /// the version from the status line
    pub fn version(&self) -> Version {
        self.version
    }

    /// the numeric status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// the reason phrase, possibly empty
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// all headers, keyed by lower-cased name
    pub fn headers(&self) -> &FnvHashMap<String, String> {
        &self.headers
    }

    /// the raw value of header `name`
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// the value of header `name` split into value and parameters
    pub fn header_params(&self, name: &str) -> Option<HeaderParams> {
        self.header(name).map(HeaderParams::parse)
    }

    /// `Content-Length`, or its raw text when it is not a number
    pub fn content_length(&self) -> Option<&Converted<u64>> {
        self.content_length.as_ref()
    }

    /// `Content-Type` with its parameters
    pub fn content_type(&self) -> Option<&HeaderParams> {
        self.content_type.as_ref()
    }

    /// the `charset` parameter of `Content-Type`
    pub fn charset(&self) -> Option<&str> {
        self.content_type.as_ref().and_then(|ct| ct.param("charset"))
    }

    /// the raw `Transfer-Encoding` value
    pub fn transfer_encoding(&self) -> Option<&str> {
        self.header("transfer-encoding")
    }

    /// true when the final transfer coding is `chunked`
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// the raw `Connection` value
    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// the methods listed by `Allow`
    pub fn allow(&self) -> Option<Vec<&str>> {
        self.header("allow")
            .map(|v| v.split(',').map(str::trim).filter(|m| !m.is_empty()).collect())
    }

    /// `Location`
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// true when the connection stays open once this response is read
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// how the body of this response is delimited
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// the request this response answers
    pub fn request(&self) -> &PendingRequest {
        &self.request
    }
}

impl PartialEq<u16> for Response {
    fn eq(&self, status: &u16) -> bool {
        self.status == *status
    }
}
