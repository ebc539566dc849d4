use std::error;
use std::fmt;
use std::io;
use std::result;

macro_rules! from_error {
    ($from:ty,$to:expr) => {
        impl From<$from> for Error{
            fn from(err: $from) -> Self {
                Error{
                    inner: $to(err)
                }
            }
        }
    };
}

macro_rules! impl_error {
    ($err_ty:ty) => {
        impl std::error::Error for $err_ty{}
    };
}

/// declare an error that only carries a message
macro_rules! message_error {
    ($(#[$attr:meta])* $name:ident, $prefix:expr) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            msg: String,
        }

        impl $name {
            /// create the error with given message
            pub fn new<M: Into<String>>(msg: M) -> Self {
                Self { msg: msg.into() }
            }

            /// the message this error was created with
            pub fn message(&self) -> &str {
                self.msg.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}: {}", $prefix, self.msg)
            }
        }
    };
}

/// A generic "error" for HTTP connections
///
/// Every failure of this crate converts to this type. Use [`Error::is`] or
/// [`Error::get_ref`] to find out which condition caused it.
#[derive(Clone)]
pub struct Error {
    inner: ErrorKind,
}

/// A `Result` typedef to use with the `httpipe::Error` type
pub type Result<T> = result::Result<T, Error>;

/// The peer closed the stream before the expected bytes arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionClosed;

impl fmt::Display for ConnectionClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("peer has closed connection")
    }
}

message_error!(
    /// The status line of a response could not be split into version, code and reason.
    MalformedStatusLine, "malformed status line");
message_error!(
    /// A response header line had no `:` or an empty name.
    MalformedHeaderLine, "malformed header line");
message_error!(
    /// A chunk-size line or chunk terminator was invalid.
    MalformedChunk, "malformed chunk");
message_error!(
    /// The connection was used in a way HTTP/1.1 framing does not allow.
    ProtocolViolation, "protocol violation");
message_error!(
    /// A request header identifier could not be turned into a wire name.
    UnknownHeaderName, "unknown header name");
message_error!(
    /// A request header value would break the request framing.
    InvalidHeaderValue, "invalid header value");
message_error!(
    /// The request line could not be written.
    InvalidRequest, "invalid request");
message_error!(
    /// The url could not be used to open a connection.
    InvalidUrl, "invalid url");
message_error!(
    /// The response content could not be decoded.
    DecodeError, "decode error");

/// An I/O failure of the underlying stream.
#[derive(Debug, Clone)]
pub struct IoError {
    repr: io::ErrorKind,
    msg: String,
}

impl IoError {
    /// the `std::io::ErrorKind` of the failure
    pub fn kind(&self) -> io::ErrorKind {
        self.repr
    }

    pub(crate) fn from_io(err: &io::Error) -> Self {
        Self {
            repr: err.kind(),
            msg: err.to_string(),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io error: {}", self.msg)
    }
}

#[derive(Clone)]
enum ErrorKind {
    ConnectionClosed(ConnectionClosed),
    MalformedStatusLine(MalformedStatusLine),
    MalformedHeaderLine(MalformedHeaderLine),
    MalformedChunk(MalformedChunk),
    ProtocolViolation(ProtocolViolation),
    UnknownHeaderName(UnknownHeaderName),
    InvalidHeaderValue(InvalidHeaderValue),
    InvalidRequest(InvalidRequest),
    InvalidUrl(InvalidUrl),
    Uri(url::ParseError),
    DecodeError(DecodeError),
    IoError(IoError),
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("httpipe::Error")
            // Skip the noise of the ErrorKind enum
            .field(&self.get_ref())
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.get_ref(), f)
    }
}

impl Error {
    /// Return true if the underlying error has the same type as T.
    pub fn is<T: error::Error + 'static>(&self) -> bool {
        self.get_ref().is::<T>()
    }

    /// Return a reference to the lower level, inner error.
    pub fn get_ref(&self) -> &(dyn error::Error + 'static) {
        use self::ErrorKind::*;
        match self.inner {
            ConnectionClosed(ref e) => e,
            MalformedStatusLine(ref e) => e,
            MalformedHeaderLine(ref e) => e,
            MalformedChunk(ref e) => e,
            ProtocolViolation(ref e) => e,
            UnknownHeaderName(ref e) => e,
            InvalidHeaderValue(ref e) => e,
            InvalidRequest(ref e) => e,
            InvalidUrl(ref e) => e,
            Uri(ref e) => e,
            DecodeError(ref e) => e,
            IoError(ref e) => e,
        }
    }

    /// Return true if the connection cannot be used after this error.
    ///
    /// Request-side validation errors leave the stream untouched, everything
    /// raised while reading a response desynchronizes it.
    pub fn is_fatal(&self) -> bool {
        use self::ErrorKind::*;
        match self.inner {
            ConnectionClosed(_) | MalformedStatusLine(_) | MalformedHeaderLine(_)
            | MalformedChunk(_) | IoError(_) => true,
            _ => false,
        }
    }
}

impl error::Error for Error {
    // Return any available cause from the inner error. Note the inner error is
    // not itself the cause.
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.get_ref().source()
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error {
            inner: ErrorKind::IoError(IoError::from_io(&err))
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            inner: ErrorKind::DecodeError(DecodeError::new(err.to_string()))
        }
    }
}

impl_error!(ConnectionClosed);
impl_error!(MalformedStatusLine);
impl_error!(MalformedHeaderLine);
impl_error!(MalformedChunk);
impl_error!(ProtocolViolation);
impl_error!(UnknownHeaderName);
impl_error!(InvalidHeaderValue);
impl_error!(InvalidRequest);
impl_error!(InvalidUrl);
impl_error!(DecodeError);
impl_error!(IoError);

from_error!(ConnectionClosed,ErrorKind::ConnectionClosed);
from_error!(MalformedStatusLine,ErrorKind::MalformedStatusLine);
from_error!(MalformedHeaderLine,ErrorKind::MalformedHeaderLine);
from_error!(MalformedChunk,ErrorKind::MalformedChunk);
from_error!(ProtocolViolation,ErrorKind::ProtocolViolation);
from_error!(UnknownHeaderName,ErrorKind::UnknownHeaderName);
from_error!(InvalidHeaderValue,ErrorKind::InvalidHeaderValue);
from_error!(InvalidRequest,ErrorKind::InvalidRequest);
from_error!(InvalidUrl,ErrorKind::InvalidUrl);
from_error!(url::ParseError,ErrorKind::Uri);
from_error!(DecodeError,ErrorKind::DecodeError);
from_error!(IoError,ErrorKind::IoError);
