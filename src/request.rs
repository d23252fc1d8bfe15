//! Incoming HTTP request type and its wire parser.
//!
//! Parsing is line oriented and tolerant of bare `\n` line endings:
//!
//! ```text
//! METHOD SP PATH[?QUERY] [SP VERSION]     ← request line
//! Name: value                              ← header lines, split on first ": "
//!                                          ← first blank line ends the head
//! body                                     ← exactly Content-Length bytes
//! ```

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::codec::ContentType;
use crate::error::Error;
use crate::header::{Header, Headers, Side};
use crate::method::Method;
use crate::protocol::Protocol;

/// Named values in the order they appeared.
pub type Params = IndexMap<String, String>;

/// An incoming HTTP request.
///
/// Immutable once parsed. The router hands handlers an enriched copy
/// carrying the path parameters of the matched route.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    headers: Headers,
    body: Option<String>,
    value: Option<Value>,
    path_params: Params,
    query: Params,
}

impl Request {
    /// Builds a request by hand. `target` may carry a query string.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            method,
            path,
            headers: Headers::new(),
            body: None,
            value: None,
            path_params: Params::new(),
            query,
        }
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.insert(header);
        self
    }

    /// Attaches a raw body and its `Content-Length`.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.headers.insert(Header::content_length(body.len() as u64));
        self.body = Some(body);
        self.value = None;
        self
    }

    /// Attaches a JSON body, already decoded, with matching headers.
    pub fn with_json(self, value: Value) -> Self {
        let mut req = self
            .with_header(Header::content_type(ContentType::Json))
            .with_body(value.to_string());
        req.value = Some(value);
        req
    }

    /// The copy the router passes on after a match.
    pub fn with_path_params(mut self, params: Params) -> Self {
        self.path_params = params;
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &Headers { &self.headers }

    /// Raw body text, present only when `Content-Length` was positive.
    pub fn body(&self) -> Option<&str> { self.body.as_deref() }

    /// The body decoded through the content codec, when that succeeded.
    pub fn body_value(&self) -> Option<&Value> { self.value.as_ref() }

    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers.get(name)
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &Params { &self.path_params }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &Params { &self.query }

    /// Parses a complete raw request.
    pub fn parse(raw: &[u8], protocol: &Protocol) -> Result<Self, Error> {
        let (head, rest) = split_head(raw);
        let head = String::from_utf8_lossy(head);
        let mut lines = head.lines();

        let request_line = lines.next().unwrap_or_default();
        let (method, target) = parse_request_line(request_line)?;
        let (path, query) = split_target(target);

        let mut headers = Headers::new();
        for line in lines {
            let Some((name, value)) = line.split_once(": ") else {
                debug!(line, "skipping header line without ': '");
                continue;
            };
            headers.insert(protocol.headers().parse(name, value)?);
        }
        protocol.headers().fill_mandatory(&mut headers, Side::Request)?;

        let (body, value) = match headers.content_length() {
            Some(len) if len > 0 => {
                let expected = usize::try_from(len).unwrap_or(usize::MAX);
                if rest.len() < expected {
                    return Err(Error::IncompleteBody { expected, received: rest.len() });
                }
                let text = String::from_utf8_lossy(&rest[..expected]).into_owned();
                let value = headers.content_type().and_then(|ct| {
                    protocol
                        .codecs()
                        .deserialize(ct, &text)
                        .inspect_err(|e| debug!(error = %e, "body kept as raw text"))
                        .ok()
                });
                (Some(text), value)
            }
            _ => (None, None),
        };

        Ok(Self {
            method,
            path,
            headers,
            body,
            value,
            path_params: Params::new(),
            query,
        })
    }
}

/// Splits at the first blank line. The blank line itself belongs to neither
/// half.
pub(crate) fn split_head(raw: &[u8]) -> (&[u8], &[u8]) {
    head_len(raw).map_or((raw, &[][..]), |(head, sep)| (&raw[..head], &raw[head + sep..]))
}

/// Finds the first blank line: returns the head length and the length of
/// the separator that follows it. Accepts `\r\n` and bare `\n`.
pub(crate) fn head_len(raw: &[u8]) -> Option<(usize, usize)> {
    let mut line_start = 0;
    for (i, &b) in raw.iter().enumerate() {
        if b != b'\n' {
            continue;
        }
        let line = &raw[line_start..i];
        if line.is_empty() || line == b"\r" {
            // Head ends before this blank line, including the newline that
            // terminated the previous one.
            let head = line_start.saturating_sub(if line_start >= 2 && raw[line_start - 2] == b'\r' { 2 } else { 1 });
            return Some((head, i + 1 - head));
        }
        line_start = i + 1;
    }
    None
}

fn parse_request_line(line: &str) -> Result<(Method, &str), Error> {
    let Some((method, rest)) = line.split_once(' ') else {
        return Err(Error::MalformedRequestLine(line.to_owned()));
    };
    let target = rest.split(' ').next().unwrap_or_default();
    if method.is_empty() || target.is_empty() {
        return Err(Error::MalformedRequestLine(line.to_owned()));
    }
    Ok((method.parse()?, target))
}

/// `path?a=1&b=2&flag` → (`path`, {a: 1, b: 2}). Pairs without `=` are dropped.
fn split_target(target: &str) -> (String, Params) {
    let Some((path, query)) = target.split_once('?') else {
        return (target.to_owned(), Params::new());
    };
    let params = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    (path.to_owned(), params)
}
