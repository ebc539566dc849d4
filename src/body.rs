use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

/// Fixed-length request body
///
/// Requests sent with a `Body` carry a `Content-Length`; requests sent
/// without one switch the connection to chunked writes.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    kind: BodyKind
}

/// match body kind and process
#[macro_export]
macro_rules! body_kind {
    ($kind:expr, $text:ident => $process_text:block, $binary:ident  => $process_bin:block, $empty:ident => $process_ety:block) => {
        match $kind {
            $crate::body::BodyKind::Text($text) => $process_text
            $crate::body::BodyKind::Binary($binary) => $process_bin
            $crate::body::BodyKind::Empty =>  $process_ety
        }
    };
}

impl Body {
    /// create a empty Request body
    pub fn empty() -> Self {
        Self::new(BodyKind::Empty)
    }

    /// create the body use given `kind`
    pub fn new(kind: BodyKind) -> Self {
        Self {
            kind
        }
    }

    /// Create the Request Body from bytes
    pub fn from_bytes<B: AsRef<[u8]>>(bytes: B) -> Self {
        Body::new(BodyKind::Binary(Bytes::copy_from_slice(bytes.as_ref())))
    }

    /// Create the Request Body from string
    pub fn from_str(str: &str) -> Self {
        Body::new(BodyKind::Text(str.to_owned()))
    }

    /// Create the Request Body from string
    pub fn from_string(str: String) -> Self {
        Body::new(BodyKind::Text(str))
    }

    /// Create the Request Body from Vec
    pub fn from_vec(vec: Vec<u8>) -> Self {
        Body::new(BodyKind::Binary(Bytes::from(vec)))
    }

    /// Create the Request Body from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Self::from_vec(data))
    }

    /// Serialize `value` as compact JSON
    pub fn from_json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::from_vec(serde_json::to_vec(value)?))
    }

    /// return the Body length
    pub fn body_length(&self) -> usize {
        self.as_bytes().len()
    }

    /// the bytes sent on the wire
    pub fn as_bytes(&self) -> &[u8] {
        body_kind!(self.kind(),
            text => {
                text.as_bytes()
            },
            binary => {
                binary.as_ref()
            },
            empty => {
                &[]
            }
        )
    }

    /// return http body kind (Empty, Text or Binary)
    pub fn kind(&self) -> &BodyKind {
        &self.kind
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::from_str(text)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::from_string(text)
    }
}

impl From<Vec<u8>> for Body {
    fn from(data: Vec<u8>) -> Self {
        Body::from_vec(data)
    }
}

impl From<&[u8]> for Body {
    fn from(data: &[u8]) -> Self {
        Body::from_bytes(data)
    }
}

impl From<Bytes> for Body {
    fn from(data: Bytes) -> Self {
        Body::new(BodyKind::Binary(data))
    }
}

/// The Http Request Body Type
#[derive(Clone, Debug, PartialEq)]
pub enum BodyKind {
    /// the request content is text
    Text(String),
    /// the request content is binary
    Binary(Bytes),
    /// the request content is empty
    Empty,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn lengths_follow_the_bytes() {
        assert_eq!(Body::empty().body_length(), 0);
        assert_eq!(Body::from_str("caf\u{e9}").body_length(), 5);
        assert_eq!(Body::from_vec(vec![0, 1, 2]).as_bytes(), &[0, 1, 2]);
    }

    #[test]
    fn json_body_is_compact() {
        let mut statement = BTreeMap::new();
        statement.insert("statement", "RETURN 1");
        let body = Body::from_json(&statement).unwrap();
        assert_eq!(body.as_bytes(), br#"{"statement":"RETURN 1"}"#);
    }
}
