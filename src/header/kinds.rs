//! Per-kind parse grammars, validity predicates and serializers.

use indexmap::IndexMap;

use crate::codec::ContentType;
use crate::error::Error;

use super::{ConnectionMode, HeaderValue};

/// The shape of a header's value and the rules that govern it.
///
/// Several names can share a kind: `Accept-Encoding` and `Accept-Language`
/// are both comma lists, and a user-registered `X-Api-Key` can reuse
/// [`HeaderKind::Other`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HeaderKind {
    Accept,
    AcceptEncoding,
    AcceptLanguage,
    CacheControl,
    ContentLength,
    ContentType,
    Connection,
    Cookie,
    Host,
    UserAgent,
    Authorization,
    Server,
    SetCookie,
    /// Free text with no constraints. Unregistered names land here.
    Other,
}

impl HeaderKind {
    /// The standard spelling of the header this kind was made for.
    pub fn canonical_name(self) -> Option<&'static str> {
        Some(match self {
            Self::Accept         => "Accept",
            Self::AcceptEncoding => "Accept-Encoding",
            Self::AcceptLanguage => "Accept-Language",
            Self::CacheControl   => "Cache-Control",
            Self::ContentLength  => "Content-Length",
            Self::ContentType    => "Content-Type",
            Self::Connection     => "Connection",
            Self::Cookie         => "Cookie",
            Self::Host           => "Host",
            Self::UserAgent      => "User-Agent",
            Self::Authorization  => "Authorization",
            Self::Server         => "Server",
            Self::SetCookie      => "Set-Cookie",
            Self::Other          => return None,
        })
    }

    /// Parses a raw wire value. `name` is only used in error messages.
    pub fn parse(self, name: &str, raw: &str) -> Result<HeaderValue, Error> {
        match self {
            Self::Accept | Self::AcceptEncoding | Self::AcceptLanguage | Self::CacheControl => {
                let items: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect();
                if items.is_empty() {
                    return Err(Error::header(name, format!("{raw:?} must contain at least one entry")));
                }
                Ok(HeaderValue::List(items))
            }
            Self::ContentLength => raw
                .trim()
                .parse::<u64>()
                .map(HeaderValue::Length)
                .map_err(|_| Error::header(name, format!("{raw:?} is not a non-negative integer"))),
            Self::ContentType => Ok(HeaderValue::ContentType(ContentType::from_header(raw))),
            Self::Connection => raw
                .trim()
                .parse::<ConnectionMode>()
                .map(HeaderValue::Connection)
                .map_err(|()| Error::header(name, format!("{raw:?} is neither keep-alive nor close"))),
            Self::Cookie => parse_cookies(name, raw).map(HeaderValue::Cookies),
            Self::Host
            | Self::UserAgent
            | Self::Authorization
            | Self::Server
            | Self::SetCookie
            | Self::Other => Ok(HeaderValue::Text(raw.trim().to_owned())),
        }
    }

    /// The validity predicate every stored value must satisfy.
    pub fn validate(self, value: &HeaderValue) -> bool {
        match (self, value) {
            (Self::Accept | Self::AcceptEncoding | Self::AcceptLanguage | Self::CacheControl,
             HeaderValue::List(items)) => !items.is_empty(),
            (Self::ContentLength, HeaderValue::Length(_)) => true,
            // None is "present but unrecognised"; the consumer decides.
            (Self::ContentType, HeaderValue::ContentType(_)) => true,
            (Self::Connection, HeaderValue::Connection(_)) => true,
            (Self::Cookie, HeaderValue::Cookies(pairs)) => !pairs.is_empty(),
            (Self::Host | Self::UserAgent | Self::Authorization | Self::Server,
             HeaderValue::Text(s)) => !s.trim().is_empty(),
            (Self::SetCookie | Self::Other, HeaderValue::Text(_)) => true,
            _ => false,
        }
    }
}

/// `a=1; b=2`. A segment without `=` poisons the whole header.
fn parse_cookies(name: &str, raw: &str) -> Result<IndexMap<String, String>, Error> {
    let mut pairs = IndexMap::new();
    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((key, value)) = segment.split_once('=') else {
            return Err(Error::header(name, format!("cookie pair {segment:?} has no '='")));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::header(name, format!("cookie pair {segment:?} has an empty name")));
        }
        pairs.insert(key.to_owned(), value.trim().to_owned());
    }
    if pairs.is_empty() {
        return Err(Error::header(name, "no cookie pairs"));
    }
    Ok(pairs)
}
