use std::borrow::Cow;
use std::str::FromStr;

use fnv::FnvHashMap;

use crate::error::{InvalidHeaderValue, MalformedHeaderLine, Result, UnknownHeaderName};

/// request header identifiers and the name they are written as
const REQUEST_HEADERS: &[(&str, &str)] = &[
    ("accept", "Accept"),
    ("accept_charset", "Accept-Charset"),
    ("accept_datetime", "Accept-Datetime"),
    ("accept_encoding", "Accept-Encoding"),
    ("accept_language", "Accept-Language"),
    ("authorization", "Authorization"),
    ("cache_control", "Cache-Control"),
    ("connection", "Connection"),
    ("content_length", "Content-Length"),
    ("content_md5", "Content-MD5"),
    ("content_type", "Content-Type"),
    ("cookie", "Cookie"),
    ("date", "Date"),
    ("expect", "Expect"),
    ("from", "From"),
    ("host", "Host"),
    ("if_match", "If-Match"),
    ("if_modified_since", "If-Modified-Since"),
    ("if_none_match", "If-None-Match"),
    ("if_range", "If-Range"),
    ("if_unmodified_since", "If-Unmodified-Since"),
    ("max_forwards", "Max-Forwards"),
    ("origin", "Origin"),
    ("pragma", "Pragma"),
    ("proxy_authorization", "Proxy-Authorization"),
    ("range", "Range"),
    ("referer", "Referer"),
    ("te", "TE"),
    ("transfer_encoding", "Transfer-Encoding"),
    ("user_agent", "User-Agent"),
    ("upgrade", "Upgrade"),
    ("via", "Via"),
    ("warning", "Warning"),
];

/// Map a request header identifier such as `user_agent` to its wire name.
///
/// Identifiers missing from the table are transformed word by word: `_`
/// becomes `-` and every word is capitalized, so `x_request_id` and
/// `X_REQUEST_ID` are both written as `X-Request-Id`.
pub fn canonical_name(key: &str) -> Result<Cow<'static, str>> {
    if let Some((_, name)) = REQUEST_HEADERS.iter().find(|(id, _)| *id == key) {
        return Ok(Cow::Borrowed(*name));
    }
    if key.is_empty() {
        return Err(UnknownHeaderName::new("empty header name").into());
    }
    let mut name = String::with_capacity(key.len());
    for (i, word) in key.split(&['_', '-'][..]).enumerate() {
        if word.is_empty() || !word.bytes().all(is_token) {
            return Err(UnknownHeaderName::new(key).into());
        }
        if i > 0 {
            name.push('-');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.push_str(&chars.as_str().to_ascii_lowercase());
        }
    }
    Ok(Cow::Owned(name))
}

/// the framing headers the request writer emits itself
pub fn is_framing_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("transfer-encoding")
}

/// Check a request header value can be written without breaking the message.
pub fn check_value(name: &str, value: &[u8]) -> Result<()> {
    if value.iter().any(|b| *b == b'\r' || *b == b'\n' || *b == 0) {
        return Err(InvalidHeaderValue::new(format!("{} contains a line break", name)).into());
    }
    Ok(())
}

// RFC 7230 tchar, without the separators a header identifier may not contain
fn is_token(b: u8) -> bool {
    match b {
        b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => true,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'.' | b'^' | b'`' | b'|' | b'~' => true,
        _ => false,
    }
}

/// Decode header bytes as ISO-8859-1, which maps every byte to one char.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| char::from(*b)).collect()
}

/// Split a response header line into its lower-cased name and its value.
pub fn parse_header_line(line: &[u8]) -> Result<(String, String)> {
    let colon = match line.iter().position(|b| *b == b':') {
        Some(colon) => colon,
        None => return Err(MalformedHeaderLine::new(latin1(line)).into()),
    };
    let name = &line[..colon];
    if name.is_empty() || name.iter().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(MalformedHeaderLine::new(latin1(line)).into());
    }
    let mut value = &line[colon + 1..];
    while let Some((first, rest)) = value.split_first() {
        if *first != b' ' && *first != b'\t' {
            break;
        }
        value = rest;
    }
    while let Some((last, rest)) = value.split_last() {
        if *last != b' ' && *last != b'\t' {
            break;
        }
        value = rest;
    }
    Ok((latin1(name).to_ascii_lowercase(), latin1(value)))
}

/// The outcome of converting a header value: the typed value, or the raw
/// text when the conversion failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted<T> {
    /// conversion succeeded
    Value(T),
    /// conversion failed, the value as received
    Raw(String),
}

impl<T> Converted<T> {
    /// the typed value, if the conversion succeeded
    pub fn value(&self) -> Option<&T> {
        match self {
            Converted::Value(v) => Some(v),
            Converted::Raw(_) => None,
        }
    }
}

/// convert `value` to `T`, keeping the raw text when it does not parse
pub fn convert<T: FromStr>(value: &str) -> Converted<T> {
    match value.trim().parse() {
        Ok(v) => Converted::Value(v),
        Err(_) => Converted::Raw(value.to_owned()),
    }
}

/// A header value split into its primary value and its `;` parameters,
/// e.g. `text/plain; charset=UTF-8`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderParams {
    value: String,
    params: FnvHashMap<String, Option<String>>,
}

impl HeaderParams {
    /// Parse a header value. Only `;` outside of double quotes separates
    /// parameters. Parameter names are lower-cased, bare names map to `None`.
    pub fn parse(raw: &str) -> Self {
        let mut parts = split_top_level(raw).into_iter();
        let value = parts.next().unwrap_or("").trim_end().to_owned();
        let mut params = FnvHashMap::default();
        for part in parts {
            let part = part.trim_start_matches(&[' ', '\t'][..]);
            match part.find('=') {
                Some(eq) => {
                    let key = part[..eq].trim_end().to_ascii_lowercase();
                    params.insert(key, Some(unquote(part[eq + 1..].trim()).to_owned()));
                }
                None => {
                    params.insert(part.trim_end().to_ascii_lowercase(), None);
                }
            }
        }
        Self { value, params }
    }

    /// the value before the first parameter
    pub fn value(&self) -> &str {
        &self.value
    }

    /// all parameters
    pub fn params(&self) -> &FnvHashMap<String, Option<String>> {
        &self.params
    }

    /// the value of parameter `name`; `None` when it is missing or has no value
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .and_then(|v| v.as_deref())
    }

    /// true when parameter `name` is present, with or without a value
    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(&name.to_ascii_lowercase())
    }
}

fn split_top_level(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// does the comma separated `value` contain `needle`, ignoring case
pub fn list_contains(value: &str, needle: &str) -> bool {
    value.split(',').any(|v| v.trim().eq_ignore_ascii_case(needle))
}
