//! Unified error type.

use std::fmt;

use thiserror::Error;
use tracing::error;

use crate::codec::ContentType;
use crate::method::Method;
use crate::response::Response;
use crate::status::Status;

/// The error type returned by trellis's fallible operations.
///
/// Every variant knows which HTTP status it surfaces as ([`Error::status`]),
/// so any failure between the socket and the handler can be turned into a
/// response with [`Error::into_response`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid {name} header: {reason}")]
    HeaderParseError { name: String, reason: String },

    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("request body ended after {received} of {expected} bytes")]
    IncompleteBody { expected: usize, received: usize },

    #[error("mandatory header {0} is missing and has no default")]
    MissingMandatoryHeader(String),

    #[error("Content-Type header is missing or invalid")]
    MissingContentType,

    #[error("no codec registered for {0}")]
    UnsupportedContentType(ContentType),

    #[error("cannot bind parameter '{name}': {reason}")]
    ParameterBindingFailure { name: String, reason: String },

    #[error("no route found for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// Opaque failure raised from inside a handler.
    #[error("handler failed: {0}")]
    Handler(String),

    /// A serializer could not encode a response body.
    #[error("codec: {0}")]
    Codec(String),

    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps any displayable failure as an opaque handler error.
    pub fn handler(err: impl fmt::Display) -> Self {
        Self::Handler(err.to_string())
    }

    pub(crate) fn header(name: &str, reason: impl Into<String>) -> Self {
        Self::HeaderParseError { name: name.to_owned(), reason: reason.into() }
    }

    pub(crate) fn binding(name: &str, reason: impl Into<String>) -> Self {
        Self::ParameterBindingFailure { name: name.to_owned(), reason: reason.into() }
    }

    /// The status this error surfaces as on the wire.
    pub fn status(&self) -> Status {
        match self {
            Self::MalformedRequestLine(_)
            | Self::UnsupportedMethod(_)
            | Self::HeaderParseError { .. }
            | Self::MissingMandatoryHeader(_)
            | Self::MissingContentType
            | Self::IncompleteBody { .. }
            | Self::ParameterBindingFailure { .. } => Status::BadRequest,
            Self::HeadTooLarge(_) => Status::RequestHeaderFieldsTooLarge,
            Self::BodyTooLarge(_) => Status::ContentTooLarge,
            Self::RouteNotFound { .. } => Status::NotFound,
            Self::UnsupportedContentType(_) => Status::UnsupportedMediaType,
            Self::Handler(_)
            | Self::Codec(_)
            | Self::Config(_)
            | Self::Io(_) => Status::InternalServerError,
        }
    }

    /// Renders the error as a plain-text response.
    ///
    /// Client errors explain themselves. Server errors are logged here and
    /// answered with the bare reason phrase.
    pub fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            error!(error = %self, "request failed");
            status.reason().to_owned()
        } else {
            self.to_string()
        };
        Response::builder().status(status).text(body)
    }
}
