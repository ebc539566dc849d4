//! Wire level HTTP/1.x: framing, codecs and the pipeline of requests
//! waiting for their response.

use std::io::{Read, Write};

pub(crate) mod http1;
#[cfg(test)]
pub(crate) mod mock;

/// A byte stream a [`Connection`](crate::Connection) can run on. `read`
/// returning 0 means the peer closed the stream.
pub trait Transport: Read + Write {}

impl<T: Read + Write> Transport for T {}
