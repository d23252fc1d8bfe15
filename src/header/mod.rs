//! Typed headers and the ordered, case-insensitive header collection.
//!
//! A [`Header`] pairs a name with a [`HeaderKind`] and a [`HeaderValue`].
//! The kind owns the grammar: every mutation goes through
//! [`HeaderKind::validate`] first, and a rejected value leaves the previous
//! one in place.

mod kinds;
mod registry;

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::codec::ContentType;
use crate::error::Error;

pub use kinds::HeaderKind;
pub use registry::{HeaderRegistry, HeaderSpec, Side};

// ── Values ────────────────────────────────────────────────────────────────────

/// The `Connection` header's two legal tokens.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConnectionMode {
    KeepAlive,
    Close,
}

impl ConnectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeepAlive => "keep-alive",
            Self::Close     => "close",
        }
    }
}

impl FromStr for ConnectionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("keep-alive") {
            Ok(Self::KeepAlive)
        } else if s.eq_ignore_ascii_case("close") {
            Ok(Self::Close)
        } else {
            Err(())
        }
    }
}

/// A parsed header value.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderValue {
    /// Comma-separated entries, order preserved.
    List(Vec<String>),
    Length(u64),
    /// `None` when the raw value named no known content type.
    ContentType(Option<ContentType>),
    Connection(ConnectionMode),
    Cookies(IndexMap<String, String>),
    Text(String),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => f.write_str(&items.join(", ")),
            Self::Length(n) => write!(f, "{n}"),
            Self::ContentType(Some(ct)) => f.write_str(ct.as_str()),
            Self::ContentType(None) => Ok(()),
            Self::Connection(mode) => f.write_str(mode.as_str()),
            Self::Cookies(pairs) => {
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 { f.write_str("; ")?; }
                    write!(f, "{k}={v}")?;
                }
                Ok(())
            }
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ── Header ────────────────────────────────────────────────────────────────────

/// One typed header.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    name: String,
    kind: HeaderKind,
    value: HeaderValue,
}

impl Header {
    /// Builds a header, validating `value` against `kind`.
    pub fn new(name: impl Into<String>, kind: HeaderKind, value: HeaderValue) -> Result<Self, Error> {
        let name = name.into();
        if !kind.validate(&value) {
            return Err(Error::header(&name, format!("value {:?} is not valid", value.to_string())));
        }
        Ok(Self { name, kind, value })
    }

    /// Parses `raw` with the kind's grammar.
    pub fn parse(name: impl Into<String>, kind: HeaderKind, raw: &str) -> Result<Self, Error> {
        let name = name.into();
        let value = kind.parse(&name, raw)?;
        Self::new(name, kind, value)
    }

    /// Free-text header under any name. Registered names such as
    /// `Content-Type` should use their typed constructor instead.
    pub fn other(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), kind: HeaderKind::Other, value: HeaderValue::Text(value.into()) }
    }

    pub fn content_type(ct: ContentType) -> Self {
        Self::typed(HeaderKind::ContentType, HeaderValue::ContentType(Some(ct)))
    }

    pub fn content_length(len: u64) -> Self {
        Self::typed(HeaderKind::ContentLength, HeaderValue::Length(len))
    }

    pub fn connection(mode: ConnectionMode) -> Self {
        Self::typed(HeaderKind::Connection, HeaderValue::Connection(mode))
    }

    // Only for kind/value pairs that are valid by construction.
    fn typed(kind: HeaderKind, value: HeaderValue) -> Self {
        let name = kind.canonical_name().unwrap_or_default().to_owned();
        Self { name, kind, value }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn kind(&self) -> HeaderKind { self.kind }
    pub fn value(&self) -> &HeaderValue { &self.value }

    /// Replaces the value. On a validation failure the old value is kept
    /// and the error is returned.
    pub fn set(&mut self, value: HeaderValue) -> Result<(), Error> {
        if !self.kind.validate(&value) {
            return Err(Error::header(&self.name, format!("value {:?} is not valid", value.to_string())));
        }
        self.value = value;
        Ok(())
    }

    /// Parses `raw` and [`set`](Header::set)s the result.
    pub fn update(&mut self, raw: &str) -> Result<(), Error> {
        let value = self.kind.parse(&self.name, raw)?;
        self.set(value)
    }

    /// Wire form of the value. May be empty, in which case the header is
    /// not emitted.
    pub fn serialize(&self) -> String {
        self.value.to_string()
    }
}

// ── Headers ───────────────────────────────────────────────────────────────────

/// Header collection keyed by lowercased name.
///
/// Iteration follows first-insertion order. Inserting a name that is
/// already present replaces the value in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headers {
    entries: IndexMap<String, Header>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a header. Returns the replaced one, if any.
    pub fn insert(&mut self, header: Header) -> Option<Header> {
        self.entries.insert(header.name.to_ascii_lowercase(), header)
    }

    pub fn get(&self, name: &str) -> Option<&Header> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Header> {
        self.entries.get_mut(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<Header> {
        self.entries.shift_remove(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.values()
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// The negotiated content type, if the header is present and recognised.
    pub fn content_type(&self) -> Option<ContentType> {
        match self.get("content-type")?.value() {
            HeaderValue::ContentType(ct) => *ct,
            _ => None,
        }
    }

    pub fn content_length(&self) -> Option<u64> {
        match self.get("content-length")?.value() {
            HeaderValue::Length(n) => Some(*n),
            _ => None,
        }
    }

    /// Raw text of a header, for free-text kinds and quick inspection.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(Header::serialize)
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        let mut headers = Self::new();
        for header in iter {
            headers.insert(header);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_mutation_keeps_previous_value() {
        let mut host = Header::parse("Host", HeaderKind::Host, "example.com").unwrap();
        let err = host.update("   ").unwrap_err();
        assert!(matches!(err, Error::HeaderParseError { .. }));
        assert_eq!(host.serialize(), "example.com");
    }

    #[test]
    fn lookup_ignores_case_and_last_write_wins() {
        let mut headers = Headers::new();
        headers.insert(Header::parse("X-Trace", HeaderKind::Other, "one").unwrap());
        headers.insert(Header::content_length(3));
        headers.insert(Header::parse("x-trace", HeaderKind::Other, "two").unwrap());

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.text("X-TRACE").as_deref(), Some("two"));
        let order: Vec<_> = headers.iter().map(|h| h.name().to_owned()).collect();
        assert_eq!(order, ["x-trace", "Content-Length"]);
    }

    #[test]
    fn typed_accessors() {
        let headers: Headers = [Header::content_type(ContentType::Json), Header::content_length(12)]
            .into_iter()
            .collect();
        assert_eq!(headers.content_type(), Some(ContentType::Json));
        assert_eq!(headers.content_length(), Some(12));
    }

    #[test]
    fn serialized_values_reparse_to_the_same_value() {
        let cases = [
            Header::content_length(1024),
            Header::connection(ConnectionMode::KeepAlive),
            Header::parse("Accept-Encoding", HeaderKind::AcceptEncoding, "br, gzip, deflate").unwrap(),
            Header::parse("Cookie", HeaderKind::Cookie, "a=1; b=2").unwrap(),
            Header::content_type(ContentType::Form),
        ];
        for header in cases {
            let reparsed = Header::parse(header.name(), header.kind(), &header.serialize()).unwrap();
            assert_eq!(reparsed, header);
        }
    }
}
