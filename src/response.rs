//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! A [`Response`] is built once by a handler (or by the dispatcher on its
//! behalf) and finalized exactly once when it is sent: mandatory headers are
//! filled, the body is encoded through the content codec, and
//! `Content-Length` is set to the encoded size.

use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::codec::{ContentCodecs, ContentType};
use crate::error::Error;
use crate::header::{Header, Headers, Side};
use crate::protocol::Protocol;
use crate::status::Status;

// ── Body ──────────────────────────────────────────────────────────────────────

/// What a response carries before encoding.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    /// Already wire text; written verbatim.
    Text(String),
    /// Interchange value; encoded by the codec named in `Content-Type`.
    Value(Value),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK)
///
/// ```rust
/// use serde_json::json;
/// use trellis::{Response, Status};
///
/// Response::json(json!({"id": 1}));
/// Response::text("hello");
/// Response::with_status(Status::NoContent);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use serde_json::json;
/// use trellis::{Header, Response, Status};
///
/// Response::builder()
///     .status(Status::Created)
///     .header(Header::other("Location", "/users/42"))
///     .json(json!({"id": 42}));
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    status: Status,
    headers: Headers,
    body: Body,
    encoded: Option<String>,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(value: Value) -> Self {
        Self::builder().json(value)
    }

    /// `200 OK`, `text/plain`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn with_status(code: Status) -> Self {
        Self::builder().status(code).no_body()
    }

    /// Empty `200 OK`.
    pub fn ok() -> Self {
        Self::with_status(Status::Ok)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::builder().status(Status::BadRequest).text(message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::builder().status(Status::NotFound).text(message)
    }

    pub fn internal_server_error() -> Self {
        Self::builder()
            .status(Status::InternalServerError)
            .text(Status::InternalServerError.reason())
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Headers::new(), status: Status::Ok }
    }

    pub fn status(&self) -> Status { self.status }
    pub fn headers(&self) -> &Headers { &self.headers }
    pub fn headers_mut(&mut self) -> &mut Headers { &mut self.headers }
    pub fn body(&self) -> &Body { &self.body }

    /// Text of a [`Body::Text`] body.
    pub fn body_text(&self) -> Option<&str> {
        match &self.body {
            Body::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The encoded body, once [`encode`](Response::encode) has run.
    pub fn encoded(&self) -> Option<&str> { self.encoded.as_deref() }

    /// Encodes the body and refreshes `Content-Length`.
    ///
    /// A non-empty body needs a recognised `Content-Type`; without one this
    /// fails with [`Error::MissingContentType`].
    pub fn encode(&mut self, codecs: &ContentCodecs) -> Result<(), Error> {
        let content_type = |headers: &Headers| headers.content_type().ok_or(Error::MissingContentType);
        let raw = match &self.body {
            Body::Empty => String::new(),
            Body::Text(text) => {
                content_type(&self.headers)?;
                text.clone()
            }
            Body::Value(value) => codecs.serialize(content_type(&self.headers)?, value)?,
        };
        if !self.body.is_empty() {
            self.headers.insert(Header::content_length(raw.len() as u64));
        }
        self.encoded = Some(raw);
        Ok(())
    }

    /// Finalizes the response into wire bytes:
    /// `STATUS-LINE\r\nHeader: value\r\n…\r\n\r\nBODY`.
    pub fn serialize(mut self, protocol: &Protocol) -> Result<Vec<u8>, Error> {
        protocol.headers().fill_mandatory(&mut self.headers, Side::Response)?;
        self.encode(protocol.codecs())?;

        let body = self.encoded.take().unwrap_or_default();
        let mut out = format!("HTTP/1.1 {}\r\n", self.status);
        for header in self.headers.iter() {
            let value = header.serialize();
            if !value.is_empty() {
                out.push_str(&format!("{}: {value}\r\n", header.name()));
            }
        }
        out.push_str("\r\n");
        out.push_str(&body);
        Ok(out.into_bytes())
    }

    pub(crate) async fn write_to<W: AsyncWrite + Unpin>(
        self,
        writer: &mut W,
        protocol: &Protocol,
    ) -> Result<(), Error> {
        let bytes = self.serialize(protocol)?;
        writer.write_all(&bytes).await?;
        writer.flush().await?;
        Ok(())
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by a body method, which also sets `Content-Type`.
pub struct ResponseBuilder {
    headers: Headers,
    status: Status,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, header: Header) -> Self {
        self.headers.insert(header);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, value: Value) -> Response {
        self.finish(Some(ContentType::Json), Body::Value(value))
    }

    /// Terminate with a plain-text body (`text/plain`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(Some(ContentType::Text), Body::Text(body.into()))
    }

    /// Terminate with any body, keeping whatever `Content-Type` was set.
    pub fn body(self, body: Body) -> Response {
        self.finish(None, body)
    }

    /// Terminate with no body (e.g. `Status::NoContent`).
    pub fn no_body(self) -> Response {
        self.finish(None, Body::Empty)
    }

    fn finish(mut self, content_type: Option<ContentType>, body: Body) -> Response {
        if let Some(ct) = content_type {
            self.headers.insert(Header::content_type(ct));
        }
        Response { status: self.status, headers: self.headers, body, encoded: None }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`] for plain router handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`Status`] directly from a handler: `return Status::NotFound`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::with_status(self) }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response { Error::into_response(self) }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(res) => res.into_response(),
            Err(err) => err.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::header::{ConnectionMode, HeaderKind};

    fn wire(res: Response) -> String {
        String::from_utf8(res.serialize(&Protocol::new("test")).unwrap()).unwrap()
    }

    #[test]
    fn body_without_content_type_fails_to_encode() {
        let mut res = Response::builder().body(Body::Text("orphan".into()));
        let err = res.encode(&ContentCodecs::new()).unwrap_err();
        assert!(matches!(err, Error::MissingContentType));
    }

    #[test]
    fn unrecognised_content_type_counts_as_missing() {
        let header = Header::parse("Content-Type", HeaderKind::ContentType, "application/xml").unwrap();
        let mut res = Response::builder().header(header).body(Body::Value(json!(1)));
        assert!(matches!(res.encode(&ContentCodecs::new()), Err(Error::MissingContentType)));
    }

    #[test]
    fn encode_caches_body_and_sets_length() {
        let mut res = Response::json(json!({"name": "Ann"}));
        res.encode(&ContentCodecs::new()).unwrap();
        assert_eq!(res.encoded(), Some(r#"{"name":"Ann"}"#));
        assert_eq!(res.headers().content_length(), Some(14));
    }

    #[test]
    fn unregistered_codec_is_unsupported() {
        let res = Response::builder()
            .header(Header::content_type(ContentType::Html))
            .body(Body::Value(json!("<p>")));
        let err = res.serialize(&Protocol::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedContentType(ContentType::Html)));
    }

    #[test]
    fn serializes_status_line_headers_and_body() {
        let res = Response::builder()
            .status(Status::Created)
            .header(Header::other("Location", "/users/3"))
            .text("made");
        assert_eq!(
            wire(res),
            "HTTP/1.1 201 Created\r\n\
             Location: /users/3\r\n\
             Content-Type: text/plain\r\n\
             Cache-Control: no-cache\r\n\
             Connection: close\r\n\
             Content-Length: 4\r\n\
             Server: test\r\n\
             \r\n\
             made",
        );
    }

    #[test]
    fn empty_body_gets_default_headers() {
        let out = wire(Response::with_status(Status::NoContent));
        assert!(out.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(out.contains("Content-Length: 0\r\n"));
        assert!(out.ends_with("\r\n\r\n"));
    }

    #[test]
    fn handler_set_headers_are_kept() {
        let res = Response::builder()
            .header(Header::connection(ConnectionMode::KeepAlive))
            .text("x");
        let out = wire(res);
        assert!(out.contains("Connection: keep-alive\r\n"));
        assert!(!out.contains("Connection: close"));
    }

    #[test]
    fn content_length_counts_bytes() {
        let mut res = Response::text("héllo");
        res.encode(&ContentCodecs::new()).unwrap();
        assert_eq!(res.headers().content_length(), Some(6));
    }
}
