//! A pipelining HTTP/1.1 client engine working directly on a byte stream.
//!
//! A [`Connection`](client::Connection) writes requests onto any
//! `Read + Write` stream as soon as they are issued and reads the responses
//! back in the same order. Bodies are framed by `Content-Length`, chunked
//! transfer coding or the end of the stream, and can be read incrementally
//! or decoded as a whole by media type and charset.

#![warn(missing_docs, missing_debug_implementations)]


#[macro_use]
extern crate log;

pub use url;

#[macro_use]
mod macros;
pub mod body;
pub mod content;
pub mod error;
pub mod response;
pub mod uri;
pub mod version;
mod client;
pub mod proto;

pub use crate::client::Connection;
pub use crate::proto::http1::conn::{host_header, socket_addr, HttpConfig, HttpConnector};
pub use crate::proto::http1::framing::Framing;
pub use crate::proto::http1::header::{Converted, HeaderParams};
pub use crate::proto::http1::pipeline::PendingRequest;
pub use crate::proto::http1::{connection_close, connection_keep_alive};

pub mod produce {
    //! the types needed for everyday use
    pub use url::{ParseError, Url};

    pub use crate::body::Body;
    pub use crate::client::Connection;
    pub use crate::content::{Content, Decode, DefaultDecoder};
    pub use crate::error::{Error, Result};
    pub use crate::proto::Transport;
    pub use crate::proto::http1::conn::{HttpConfig, HttpConnector};
    pub use crate::proto::http1::framing::Framing;
    pub use crate::response::Response;
    pub use crate::uri::{parse_uri, UriParts};
    pub use crate::version::Version;
}


fn _assert_types() {
    use produce::*;
    use std::net::TcpStream;
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    assert_send::<Connection<TcpStream>>();
    assert_send::<Response>();
    assert_send::<Error>();

    assert_sync::<Response>();
    assert_sync::<Body>();
}
