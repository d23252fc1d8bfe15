//! HTTP method as a typed enum.
//!
//! Nine methods are recognised on the wire. Only five of them are routable:
//! `GET`, `POST`, `PUT`, `PATCH`, `DELETE`. The rest parse cleanly so the
//! request codec can report them precisely, and are rejected at dispatch.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    // Parsed, never routed ─────────────────────────────────────────────────────
    Head,
    Options,
    Trace,
    Connect,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }

    /// Whether handlers may be registered for this method.
    pub fn is_routable(self) -> bool {
        matches!(self, Self::Get | Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

/// Parses a method token. Matching ignores ASCII case, so `get` is `GET`.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.to_ascii_uppercase().as_str() {
            "CONNECT" => Self::Connect,
            "DELETE"  => Self::Delete,
            "GET"     => Self::Get,
            "HEAD"    => Self::Head,
            "OPTIONS" => Self::Options,
            "PATCH"   => Self::Patch,
            "POST"    => Self::Post,
            "PUT"     => Self::Put,
            "TRACE"   => Self::Trace,
            _         => return Err(Error::UnsupportedMethod(s.to_owned())),
        };
        Ok(method)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Patch".parse::<Method>().unwrap(), Method::Patch);
    }

    #[test]
    fn unknown_token_is_unsupported() {
        let err = "BREW".parse::<Method>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedMethod(ref m) if m == "BREW"));
    }

    #[test]
    fn only_crud_methods_route() {
        assert!(Method::Delete.is_routable());
        assert!(!Method::Head.is_routable());
        assert!(!Method::Options.is_routable());
    }
}
