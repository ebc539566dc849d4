
use std::net::TcpStream;

use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;
use url::Url;

use crate::body::Body;
use crate::content::{decode_with, Content, Decode, DefaultDecoder};
use crate::error::{ConnectionClosed, Error, ProtocolViolation, Result};
use crate::proto::Transport;
use crate::proto::http1::buffer::BufferedStream;
use crate::proto::http1::conn::{host_header, socket_addr, HttpConfig, HttpConnector};
use crate::proto::http1::encode::{canonicalize, RequestEncoder};
use crate::proto::http1::framing::BodyState;
use crate::proto::http1::header::HeaderParams;
use crate::proto::http1::parse::ResponseParser;
use crate::proto::http1::pipeline::{PendingRequest, Pipeline};
use crate::response::Response;

/// largest span `read_all` asks the framing layer for at once
const READ_ALL_STEP: usize = 64 * 1024;

/// The response currently being read and what has been read of its body.
#[derive(Debug)]
struct Exchange {
    response: Response,
    body: BodyState,
    received: BytesMut,
    content: Option<Content>,
}

/// An HTTP/1.1 client connection over a byte stream.
///
/// Requests are written as soon as they are issued and answered strictly in
/// the order they were written: the Nth call to [`response`](Self::response)
/// returns the response to the Nth request. Several requests may be written
/// before any response is read.
///
/// ```no_run
/// use httpipe::produce::*;
///
/// let mut conn = Connection::open("http://localhost:8080/", HttpConfig::default()).unwrap();
/// conn.get("/hello").unwrap();
/// conn.get("/world").unwrap();
/// assert_eq!(conn.response().unwrap().status(), 200);
/// let hello = conn.read_all().unwrap();
/// assert_eq!(conn.response().unwrap().status(), 200);
/// let world = conn.content().unwrap();
/// ```
#[derive(Debug)]
pub struct Connection<S> {
    stream: Option<BufferedStream<S>>,
    host: String,
    default_headers: Vec<(String, Vec<u8>)>,
    pipeline: Pipeline,
    writable: bool,
    exchange: Option<Exchange>,
    decoder: Box<dyn Decode>,
}

impl Connection<TcpStream> {
    /// Connect to the host and port of `url`.
    pub fn open(url: &str, config: HttpConfig) -> Result<Self> {
        let url = Url::parse(url)?;
        let addr = socket_addr(&url)?;
        let host = host_header(&url)?;
        let stream = HttpConnector::with_http_config(config).connect(&addr)?;
        Ok(Connection::new(stream, &host))
    }
}

impl<S: Transport> Connection<S> {
    /// Wrap an already connected stream. Every request carries
    /// `Host: <host>`.
    pub fn new(stream: S, host: &str) -> Self {
        debug!("connection to {} established", host);
        Self {
            stream: Some(BufferedStream::new(stream)),
            host: host.to_owned(),
            default_headers: vec![("Host".to_owned(), host.as_bytes().to_vec())],
            pipeline: Pipeline::new(),
            writable: false,
            exchange: None,
            decoder: Box::new(DefaultDecoder),
        }
    }

    /// Like [`new`](Self::new), with headers written on every request.
    /// Headers passed to a single request replace defaults of the same name.
    pub fn with_headers<I, K, V>(stream: S, host: &str, headers: I) -> Result<Self>
        where I: IntoIterator<Item=(K, V)>,
              K: AsRef<str>,
              V: AsRef<[u8]>,
    {
        let mut conn = Self::new(stream, host);
        let headers = canonicalize(headers)?;
        conn.default_headers = merge(&conn.default_headers, headers);
        Ok(conn)
    }

    /// Replace the decoder used by [`content`](Self::content).
    pub fn set_decoder<D: Decode + 'static>(&mut self, decoder: D) {
        self.decoder = Box::new(decoder);
    }

    /// the value sent as `Host`
    pub fn host(&self) -> &str {
        &self.host
    }

    /// false once the stream was closed, by either side
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// true while a chunked request body is open for [`write_chunk`](Self::write_chunk)
    pub fn writable(&self) -> bool {
        self.writable
    }

    /// true while body bytes of the current response remain unread
    pub fn readable(&self) -> bool {
        self.exchange.as_ref().map_or(false, |e| !e.body.is_done())
    }

    /// requests whose responses have not been read completely
    pub fn pending(&self) -> usize {
        self.pipeline.len() + self.readable() as usize
    }

    /// the underlying stream, if still open
    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref().map(BufferedStream::get_ref)
    }

    /// Give up the connection and return the stream, if still open. Bytes
    /// already received but not read are lost.
    pub fn into_inner(self) -> Option<S> {
        self.stream.map(BufferedStream::into_inner)
    }

    /// Write a request.
    ///
    /// With `Some(body)` the request is complete once this returns. With
    /// `None` the request body is sent chunked: write it with
    /// [`write_chunk`](Self::write_chunk) and finish it with an empty chunk.
    /// A chunked body still open from an earlier request is finished first.
    pub fn request<I, K, V>(&mut self, method: &str, target: &str, body: Option<Body>, headers: I) -> Result<&mut Self>
        where I: IntoIterator<Item=(K, V)>,
              K: AsRef<str>,
              V: AsRef<[u8]>,
    {
        let headers = merge(&self.default_headers, canonicalize(headers)?);
        let buf = RequestEncoder::encode(method, target, &headers, body.as_ref())?;
        if self.writable {
            debug!("finishing open chunked request before {} {}", method, target);
            self.write_chunk(b"")?;
        }
        debug!("{} {} HTTP/1.1", method, target);
        for (name, value) in &headers {
            trace!("{}: {}", name, String::from_utf8_lossy(value));
        }
        self.send(&buf)?;
        self.writable = body.is_none();
        self.pipeline.push(PendingRequest::new(method, target, headers));
        Ok(self)
    }

    /// Write one chunk of the open chunked request. An empty chunk ends the
    /// request body.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(ProtocolViolation::new("no chunked request is open").into());
        }
        self.send(&RequestEncoder::encode_chunk(chunk))?;
        if chunk.is_empty() {
            self.writable = false;
        }
        Ok(())
    }

    /// Write several chunks, stopping after an empty one.
    pub fn write_chunks<I, C>(&mut self, chunks: I) -> Result<()>
        where I: IntoIterator<Item=C>,
              C: AsRef<[u8]>,
    {
        for chunk in chunks {
            let chunk = chunk.as_ref();
            self.write_chunk(chunk)?;
            if chunk.is_empty() {
                break;
            }
        }
        Ok(())
    }

    /// do http get request
    pub fn get(&mut self, target: &str) -> Result<&mut Self> {
        self.request("GET", target, Some(Body::empty()), no_headers())
    }

    /// do http head request
    pub fn head(&mut self, target: &str) -> Result<&mut Self> {
        self.request("HEAD", target, Some(Body::empty()), no_headers())
    }

    /// do http delete request
    pub fn delete(&mut self, target: &str) -> Result<&mut Self> {
        self.request("DELETE", target, Some(Body::empty()), no_headers())
    }

    /// do http post request, chunked when `body` is `None`
    pub fn post(&mut self, target: &str, body: Option<Body>) -> Result<&mut Self> {
        self.request("POST", target, body, no_headers())
    }

    /// do http put request, chunked when `body` is `None`
    pub fn put(&mut self, target: &str, body: Option<Body>) -> Result<&mut Self> {
        self.request("PUT", target, body, no_headers())
    }

    /// do http options request, chunked when `body` is `None`
    pub fn options(&mut self, target: &str, body: Option<Body>) -> Result<&mut Self> {
        self.request("OPTIONS", target, body, no_headers())
    }

    /// do http trace request, chunked when `body` is `None`
    pub fn trace(&mut self, target: &str, body: Option<Body>) -> Result<&mut Self> {
        self.request("TRACE", target, body, no_headers())
    }

    /// Read the head of the next response.
    ///
    /// Whatever is left of the previous response body is read and dropped
    /// first, and an open chunked request is finished.
    pub fn response(&mut self) -> Result<&Response> {
        if self.writable {
            debug!("finishing open chunked request before reading its response");
            self.write_chunk(b"")?;
        }
        if self.readable() {
            let skipped = self.read_all()?;
            debug!("dropped {} unread body bytes", skipped.len());
        }
        self.exchange = None;

        let parsed = match self.stream.as_mut() {
            Some(stream) => ResponseParser::parse(stream, &mut self.pipeline),
            None => {
                let outstanding = self.pipeline.clear();
                return Err(match outstanding {
                    0 => ProtocolViolation::new("no request is waiting for a response"),
                    n => ProtocolViolation::new(format!("connection closed with {} requests outstanding", n)),
                }.into());
            }
        };
        let response = match parsed {
            Ok(response) => response,
            Err(err) => return Err(self.fail(err)),
        };

        let body = BodyState::new(response.framing());
        if body.is_done() {
            self.finish(response.keep_alive());
        }
        let exchange = self.exchange.get_or_insert(Exchange {
            response,
            body,
            received: BytesMut::new(),
            content: None,
        });
        Ok(&exchange.response)
    }

    /// the response read last, if any
    pub fn last_response(&self) -> Option<&Response> {
        self.exchange.as_ref().map(|e| &e.response)
    }

    /// Read up to `n` bytes of the current response body.
    ///
    /// Sized bodies return exactly `n` bytes unless fewer remain; chunked
    /// bodies return at most the rest of the current chunk. For `n > 0` an
    /// empty result means the body is finished; `read(0)` is always empty,
    /// check [`readable`](Self::readable) instead.
    pub fn read(&mut self, n: usize) -> Result<Bytes> {
        let result = match (self.stream.as_mut(), self.exchange.as_mut()) {
            (_, None) => return Ok(Bytes::new()),
            (_, Some(exchange)) if exchange.body.is_done() => return Ok(Bytes::new()),
            (None, Some(_)) => return Err(ConnectionClosed.into()),
            (Some(stream), Some(exchange)) => match exchange.body.read(stream, n) {
                Ok(data) => {
                    exchange.received.extend_from_slice(&data);
                    Ok((data, exchange.body.is_done(), exchange.response.keep_alive()))
                }
                Err(err) => Err(err),
            },
        };
        match result {
            Ok((data, done, keep_alive)) => {
                if done {
                    self.finish(keep_alive);
                }
                Ok(data)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Read the rest of the current response body.
    pub fn read_all(&mut self) -> Result<Bytes> {
        let mut rest = BytesMut::new();
        while self.readable() {
            let data = self.read(READ_ALL_STEP)?;
            rest.extend_from_slice(&data);
        }
        Ok(rest.freeze())
    }

    /// every body byte of the current response read so far
    pub fn body(&self) -> Option<&[u8]> {
        self.exchange.as_ref().map(|e| &e.received[..])
    }

    /// The decoded body of the current response.
    ///
    /// The body is read to its end first. Decoding happens once, later
    /// calls return the same value without touching the stream.
    pub fn content(&mut self) -> Result<&Content> {
        if self.readable() {
            self.read_all()?;
        }
        let decoder = &*self.decoder;
        let exchange = match self.exchange.as_mut() {
            Some(exchange) => exchange,
            None => return Err(ProtocolViolation::new("no response has been read").into()),
        };
        let content = match exchange.content.take() {
            Some(content) => content,
            None => decode_with(
                decoder,
                exchange.response.content_type().map(HeaderParams::value),
                exchange.response.charset(),
                Bytes::copy_from_slice(&exchange.received),
            )?,
        };
        Ok(exchange.content.get_or_insert(content))
    }

    /// Deserialize the JSON body of the current response, reading it to its
    /// end first.
    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T> {
        if self.readable() {
            self.read_all()?;
        }
        match self.exchange.as_ref() {
            Some(exchange) => Ok(serde_json::from_slice(&exchange.received)?),
            None => Err(ProtocolViolation::new("no response has been read").into()),
        }
    }

    /// Close the stream.
    ///
    /// Requests still waiting for their response are dropped and reported
    /// as a protocol violation; the stream is closed either way.
    pub fn close(&mut self) -> Result<()> {
        debug!("closing connection to {}", self.host);
        if self.readable() {
            self.exchange = None;
        }
        self.stream = None;
        self.writable = false;
        match self.pipeline.clear() {
            0 => Ok(()),
            n => Err(ProtocolViolation::new(format!("closed with {} requests outstanding", n)).into()),
        }
    }

    /// Continue on a new stream to the same host. Outstanding requests are
    /// dropped, not resent.
    pub fn reconnect(&mut self, stream: S) {
        let dropped = self.pipeline.clear();
        if dropped > 0 {
            warn!("reconnecting to {} dropped {} outstanding requests", self.host, dropped);
        }
        debug!("reconnected to {}", self.host);
        self.stream = Some(BufferedStream::new(stream));
        self.writable = false;
        self.exchange = None;
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        let sent = match self.stream.as_mut() {
            Some(stream) => stream.write_all(data),
            None => return Err(ConnectionClosed.into()),
        };
        sent.map_err(|err| self.fail(err))
    }

    /// apply the keep-alive decision once a body is complete
    fn finish(&mut self, keep_alive: bool) {
        if keep_alive {
            return;
        }
        if !self.pipeline.is_empty() {
            warn!("{} closes the connection with {} requests outstanding", self.host, self.pipeline.len());
        }
        debug!("response ends the connection to {}", self.host);
        self.stream = None;
        self.writable = false;
    }

    /// drop the stream after an error that desynchronized it
    fn fail(&mut self, err: Error) -> Error {
        if err.is_fatal() && self.stream.is_some() {
            debug!("connection to {} failed: {}", self.host, err);
            self.stream = None;
            self.writable = false;
            self.exchange = None;
            self.pipeline.clear();
        }
        err
    }
}

fn no_headers() -> Vec<(&'static str, &'static str)> {
    Vec::new()
}

/// `defaults` followed by `extra`, leaving out defaults that `extra` replaces
fn merge(defaults: &[(String, Vec<u8>)], extra: Vec<(String, Vec<u8>)>) -> Vec<(String, Vec<u8>)> {
    let mut merged: Vec<_> = defaults
        .iter()
        .filter(|(name, _)| !extra.iter().any(|(other, _)| other.eq_ignore_ascii_case(name)))
        .cloned()
        .collect();
    merged.extend(extra);
    merged
}
