//! Name → kind registry with mandatory-header rules.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::codec::ContentType;
use crate::error::Error;

use super::{ConnectionMode, Header, HeaderKind, HeaderValue, Headers};

type DefaultFn = Arc<dyn Fn() -> HeaderValue + Send + Sync>;

/// Which message a mandatory rule applies to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Request,
    Response,
}

/// Everything the registry knows about one header name.
#[derive(Clone)]
pub struct HeaderSpec {
    name: String,
    kind: HeaderKind,
    on_request: bool,
    on_response: bool,
    default: Option<DefaultFn>,
}

impl HeaderSpec {
    pub fn name(&self) -> &str { &self.name }
    pub fn kind(&self) -> HeaderKind { self.kind }

    pub fn is_mandatory(&self, side: Side) -> bool {
        match side {
            Side::Request => self.on_request,
            Side::Response => self.on_response,
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

impl fmt::Debug for HeaderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("on_request", &self.on_request)
            .field("on_response", &self.on_response)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// Maps header names to kinds and decides which headers every message must
/// carry.
///
/// Built once at startup, then frozen inside a
/// [`Protocol`](crate::Protocol) and only read.
#[derive(Clone, Debug, Default)]
pub struct HeaderRegistry {
    specs: IndexMap<String, HeaderSpec>,
}

impl HeaderRegistry {
    /// A registry with no names at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard table.
    ///
    /// Requests must carry `Host` (no default). Responses get
    /// `Content-Type: text/plain`, `Content-Length: 0`, `Connection: close`,
    /// `Cache-Control: no-cache` and `Server: <server_name>` when missing.
    pub fn standard(server_name: &str) -> Self {
        let mut reg = Self::empty();
        for kind in [
            HeaderKind::Accept,
            HeaderKind::AcceptEncoding,
            HeaderKind::AcceptLanguage,
            HeaderKind::Authorization,
            HeaderKind::CacheControl,
            HeaderKind::Connection,
            HeaderKind::ContentLength,
            HeaderKind::ContentType,
            HeaderKind::Cookie,
            HeaderKind::Host,
            HeaderKind::Server,
            HeaderKind::SetCookie,
            HeaderKind::UserAgent,
        ] {
            if let Some(name) = kind.canonical_name() {
                reg.register(name, kind);
            }
        }

        let server = server_name.to_owned();
        if let Some(host) = reg.specs.get_mut("host") {
            host.on_request = true;
        }
        reg.require_on_response("content-type", || HeaderValue::ContentType(Some(ContentType::Text)));
        reg.require_on_response("content-length", || HeaderValue::Length(0));
        reg.require_on_response("connection", || HeaderValue::Connection(ConnectionMode::Close));
        reg.require_on_response("cache-control", || HeaderValue::List(vec!["no-cache".to_owned()]));
        reg.require_on_response("server", move || HeaderValue::Text(server.clone()));
        reg
    }

    fn require_on_response(&mut self, key: &str, default: impl Fn() -> HeaderValue + Send + Sync + 'static) {
        if let Some(spec) = self.specs.get_mut(key) {
            spec.on_response = true;
            spec.default = Some(Arc::new(default));
        }
    }

    /// Binds `name` to `kind`. Re-registering a name swaps its kind and keeps
    /// its mandatory rules.
    pub fn register(&mut self, name: &str, kind: HeaderKind) {
        self.specs
            .entry(name.to_ascii_lowercase())
            .and_modify(|spec| spec.kind = kind)
            .or_insert_with(|| HeaderSpec {
                name: name.to_owned(),
                kind,
                on_request: false,
                on_response: false,
                default: None,
            });
    }

    /// Marks a registered header as mandatory (or not) on one side.
    pub fn set_mandatory(&mut self, name: &str, side: Side, mandatory: bool) -> Result<(), Error> {
        let spec = self.spec_mut(name)?;
        match side {
            Side::Request => spec.on_request = mandatory,
            Side::Response => spec.on_response = mandatory,
        }
        Ok(())
    }

    /// Installs the factory used when a mandatory header is missing.
    pub fn set_default(
        &mut self,
        name: &str,
        default: impl Fn() -> HeaderValue + Send + Sync + 'static,
    ) -> Result<(), Error> {
        self.spec_mut(name)?.default = Some(Arc::new(default));
        Ok(())
    }

    fn spec_mut(&mut self, name: &str) -> Result<&mut HeaderSpec, Error> {
        self.specs
            .get_mut(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::Config(format!("header {name} is not registered")))
    }

    pub fn lookup(&self, name: &str) -> Option<&HeaderSpec> {
        self.specs.get(&name.to_ascii_lowercase())
    }

    /// Parses one raw header line value. Registered names use the canonical
    /// spelling and their kind; anything else is kept as free text under the
    /// name it arrived with.
    pub fn parse(&self, name: &str, raw: &str) -> Result<Header, Error> {
        match self.lookup(name) {
            Some(spec) => Header::parse(spec.name.clone(), spec.kind, raw),
            None => Header::parse(name, HeaderKind::Other, raw),
        }
    }

    /// Inserts a default for every mandatory header `headers` lacks.
    ///
    /// Fails with [`Error::MissingMandatoryHeader`] on the first missing
    /// header that has no default.
    pub fn fill_mandatory(&self, headers: &mut Headers, side: Side) -> Result<(), Error> {
        for spec in self.specs.values().filter(|s| s.is_mandatory(side)) {
            if headers.contains(&spec.name) {
                continue;
            }
            let Some(default) = &spec.default else {
                return Err(Error::MissingMandatoryHeader(spec.name.clone()));
            };
            headers.insert(Header::new(spec.name.clone(), spec.kind, default())?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_without_host_is_rejected() {
        let reg = HeaderRegistry::standard("trellis");
        let mut headers = Headers::new();
        let err = reg.fill_mandatory(&mut headers, Side::Request).unwrap_err();
        assert!(matches!(err, Error::MissingMandatoryHeader(ref name) if name == "Host"));
    }

    #[test]
    fn response_defaults_are_filled_in_order() {
        let reg = HeaderRegistry::standard("trellis/0.1");
        let mut headers = Headers::new();
        headers.insert(Header::content_type(ContentType::Json));
        reg.fill_mandatory(&mut headers, Side::Response).unwrap();

        let wire: Vec<_> = headers.iter().map(|h| format!("{}: {}", h.name(), h.serialize())).collect();
        assert_eq!(wire, [
            "Content-Type: application/json",
            "Cache-Control: no-cache",
            "Connection: close",
            "Content-Length: 0",
            "Server: trellis/0.1",
        ]);
    }

    #[test]
    fn registered_names_use_canonical_spelling() {
        let reg = HeaderRegistry::standard("s");
        let header = reg.parse("content-length", "7").unwrap();
        assert_eq!(header.name(), "Content-Length");
        assert_eq!(header.value(), &HeaderValue::Length(7));
    }

    #[test]
    fn unknown_names_are_free_text() {
        let reg = HeaderRegistry::standard("s");
        let header = reg.parse("X-Request-Id", "  abc ").unwrap();
        assert_eq!(header.kind(), HeaderKind::Other);
        assert_eq!(header.serialize(), "abc");
    }

    #[test]
    fn custom_registration_and_mandatory_rules() {
        let mut reg = HeaderRegistry::standard("s");
        reg.register("X-Api-Key", HeaderKind::Authorization);
        reg.set_mandatory("x-api-key", Side::Request, true).unwrap();
        assert!(reg.parse("X-Api-Key", " ").is_err());

        let mut headers = Headers::new();
        headers.insert(reg.parse("Host", "localhost").unwrap());
        let err = reg.fill_mandatory(&mut headers, Side::Request).unwrap_err();
        assert!(matches!(err, Error::MissingMandatoryHeader(ref n) if n == "X-Api-Key"));

        reg.set_default("X-Api-Key", || HeaderValue::Text("anonymous".into())).unwrap();
        reg.fill_mandatory(&mut headers, Side::Request).unwrap();
        assert_eq!(headers.text("x-api-key").as_deref(), Some("anonymous"));
    }

    #[test]
    fn mandatory_rules_need_a_registered_name() {
        let mut reg = HeaderRegistry::empty();
        assert!(matches!(reg.set_mandatory("Host", Side::Request, true), Err(Error::Config(_))));
    }
}
