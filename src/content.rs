//! Turning a fully read response body into a typed value.

use std::fmt;

use bytes::Bytes;
use encoding_rs::Encoding;

use crate::error::Result;

/// charset assumed when `Content-Type` names none, or one that is unknown
pub const DEFAULT_CHARSET: &str = "ISO-8859-1";

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// a textual media type, decoded with its charset
    Text(String),
    /// a JSON media type, decoded with its charset and parsed
    Json(serde_json::Value),
    /// any other media type, untouched
    Binary(Bytes),
}

impl Content {
    /// the text, for textual content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    /// the parsed value, for JSON content
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Content::Json(value) => Some(value),
            _ => None,
        }
    }

    /// the raw bytes, for binary content
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Content::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl PartialEq<&str> for Content {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

/// Decodes raw bodies by media type.
///
/// `content_type` is the lower-cased media type without parameters and
/// `charset` the charset to decode text with. Returning `Ok(None)` leaves the
/// body as [`Content::Binary`].
pub trait Decode: Send {
    /// decode `raw`, or return `None` when the media type is not handled
    fn decode(&self, content_type: &str, charset: &str, raw: &Bytes) -> Result<Option<Content>>;
}

/// Decodes `text/*` into [`Content::Text`] and `application/json` (or any
/// `+json` type) into [`Content::Json`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDecoder;

impl Decode for DefaultDecoder {
    fn decode(&self, content_type: &str, charset: &str, raw: &Bytes) -> Result<Option<Content>> {
        if is_json(content_type) {
            let text = decode_text(charset, raw);
            return Ok(Some(Content::Json(serde_json::from_str(&text)?)));
        }
        if content_type.starts_with("text/") {
            return Ok(Some(Content::Text(decode_text(charset, raw))));
        }
        Ok(None)
    }
}

impl fmt::Debug for dyn Decode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decode")
    }
}

fn is_json(content_type: &str) -> bool {
    content_type == "application/json" || content_type.ends_with("+json")
}

/// Decode `raw` with the encoding labelled `charset`, falling back to
/// [`DEFAULT_CHARSET`] for unknown labels.
pub fn decode_text(charset: &str, raw: &[u8]) -> String {
    let encoding = Encoding::for_label(charset.trim().as_bytes())
        .or_else(|| Encoding::for_label(DEFAULT_CHARSET.as_bytes()))
        .unwrap_or(encoding_rs::WINDOWS_1252);
    let (text, _, had_errors) = encoding.decode(raw);
    if had_errors {
        debug!("body is not valid {}, undecodable bytes replaced", encoding.name());
    }
    text.into_owned()
}

/// Decode a complete body with `decoder`, given the `Content-Type` value and
/// its charset parameter.
pub fn decode_with(decoder: &dyn Decode, content_type: Option<&str>, charset: Option<&str>, raw: Bytes) -> Result<Content> {
    let content_type = match content_type {
        Some(ct) => ct.trim().to_ascii_lowercase(),
        None => return Ok(Content::Binary(raw)),
    };
    let charset = charset.unwrap_or(DEFAULT_CHARSET);
    match decoder.decode(&content_type, charset, &raw)? {
        Some(content) => Ok(content),
        None => Ok(Content::Binary(raw)),
    }
}
