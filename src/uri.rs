//! Splitting URI references into their five components.

use std::sync::OnceLock;

use regex::Regex;

/// The components of a URI reference. Missing components are `None`, which
/// is distinct from a present but empty one; the path is always present and
/// may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UriParts<'a> {
    /// `foo` in `foo://example.com`
    pub scheme: Option<&'a str>,
    /// everything between `//` and the path
    pub authority: Option<&'a str>,
    /// the path, `""` when there is none
    pub path: &'a str,
    /// after `?`, up to the fragment
    pub query: Option<&'a str>,
    /// after `#`
    pub fragment: Option<&'a str>,
}

impl<'a> UriParts<'a> {
    /// the request target for this URI: its path (or `/`) plus the query
    pub fn target(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { self.path };
        match self.query {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_owned(),
        }
    }
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // RFC 3986, appendix B
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$")
            .expect("uri pattern is valid")
    })
}

/// Split `uri` into scheme, authority, path, query and fragment.
pub fn parse_uri(uri: &str) -> UriParts<'_> {
    // every part of the pattern is optional, it matches any input
    let caps = match pattern().captures(uri) {
        Some(caps) => caps,
        None => return UriParts { path: uri, ..UriParts::default() },
    };
    let part = |i: usize| caps.get(i).map(|m| m.as_str());
    UriParts {
        scheme: part(1),
        authority: part(2),
        path: part(3).unwrap_or(""),
        query: part(4),
        fragment: part(5),
    }
}
