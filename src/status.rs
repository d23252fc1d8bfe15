//! HTTP status codes as a typed enum.
//!
//! ```rust
//! use trellis::{Response, Status};
//!
//! let created = Response::builder().status(Status::Created).text("made it");
//! assert_eq!(created.status(), Status::Created);
//! assert_eq!(Status::NotFound.to_string(), "404 Not Found");
//! ```

use std::fmt;

/// The status codes trellis knows how to emit.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    // ── 1xx Informational ─────────────────────────────────────────────────────
    Continue,
    SwitchingProtocols,

    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,
    Created,
    Accepted,
    NoContent,

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently,
    Found,
    SeeOther,
    NotModified,
    TemporaryRedirect,

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    RequestTimeout,
    Conflict,
    ContentTooLarge,
    UnsupportedMediaType,
    ImATeapot,
    UnprocessableContent,
    RequestHeaderFieldsTooLarge,

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Continue                    => 100,
            Self::SwitchingProtocols          => 101,
            Self::Ok                          => 200,
            Self::Created                     => 201,
            Self::Accepted                    => 202,
            Self::NoContent                   => 204,
            Self::MovedPermanently            => 301,
            Self::Found                       => 302,
            Self::SeeOther                    => 303,
            Self::NotModified                 => 304,
            Self::TemporaryRedirect           => 307,
            Self::BadRequest                  => 400,
            Self::Unauthorized                => 401,
            Self::Forbidden                   => 403,
            Self::NotFound                    => 404,
            Self::MethodNotAllowed            => 405,
            Self::RequestTimeout              => 408,
            Self::Conflict                    => 409,
            Self::ContentTooLarge             => 413,
            Self::UnsupportedMediaType        => 415,
            Self::ImATeapot                   => 418,
            Self::UnprocessableContent        => 422,
            Self::RequestHeaderFieldsTooLarge => 431,
            Self::InternalServerError         => 500,
            Self::NotImplemented              => 501,
            Self::BadGateway                  => 502,
            Self::ServiceUnavailable          => 503,
        }
    }

    /// Reason phrase for the status line.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Continue                    => "Continue",
            Self::SwitchingProtocols          => "Switching Protocols",
            Self::Ok                          => "OK",
            Self::Created                     => "Created",
            Self::Accepted                    => "Accepted",
            Self::NoContent                   => "No Content",
            Self::MovedPermanently            => "Moved Permanently",
            Self::Found                       => "Found",
            Self::SeeOther                    => "See Other",
            Self::NotModified                 => "Not Modified",
            Self::TemporaryRedirect           => "Temporary Redirect",
            Self::BadRequest                  => "Bad Request",
            Self::Unauthorized                => "Unauthorized",
            Self::Forbidden                   => "Forbidden",
            Self::NotFound                    => "Not Found",
            Self::MethodNotAllowed            => "Method Not Allowed",
            Self::RequestTimeout              => "Request Timeout",
            Self::Conflict                    => "Conflict",
            Self::ContentTooLarge             => "Content Too Large",
            Self::UnsupportedMediaType        => "Unsupported Media Type",
            Self::ImATeapot                   => "I'm a teapot",
            Self::UnprocessableContent        => "Unprocessable Content",
            Self::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            Self::InternalServerError         => "Internal Server Error",
            Self::NotImplemented              => "Not Implemented",
            Self::BadGateway                  => "Bad Gateway",
            Self::ServiceUnavailable          => "Service Unavailable",
        }
    }

    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.code())
    }

    pub fn is_server_error(self) -> bool {
        self.code() >= 500
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}

/// `"404 Not Found"`: the tail of a status line.
impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}
