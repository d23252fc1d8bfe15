//! Process-wide wire configuration: the header registry plus the content
//! codec registry.
//!
//! Build one at startup, adjust it, then hand it to a
//! [`Dispatcher`](crate::Dispatcher). From that point it lives behind an
//! `Arc` and is only ever read.

use crate::codec::{BodyCodec, ContentCodecs, ContentType};
use crate::header::{HeaderKind, HeaderRegistry};

/// Default value of the `Server` response header.
pub const DEFAULT_SERVER_NAME: &str = concat!("trellis/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct Protocol {
    headers: HeaderRegistry,
    codecs: ContentCodecs,
}

impl Protocol {
    /// Standard header table, JSON codec only.
    pub fn new(server_name: &str) -> Self {
        Self {
            headers: HeaderRegistry::standard(server_name),
            codecs: ContentCodecs::new(),
        }
    }

    pub fn headers(&self) -> &HeaderRegistry { &self.headers }
    pub fn codecs(&self) -> &ContentCodecs { &self.codecs }

    pub fn headers_mut(&mut self) -> &mut HeaderRegistry { &mut self.headers }

    /// Binds an extra header name to an existing kind. Chains.
    pub fn with_header(mut self, name: &str, kind: HeaderKind) -> Self {
        self.headers.register(name, kind);
        self
    }

    /// Fills a codec slot. Chains.
    pub fn with_codec(mut self, content_type: ContentType, codec: impl BodyCodec + 'static) -> Self {
        self.codecs.register(content_type, codec);
        self
    }
}

impl Default for Protocol {
    fn default() -> Self { Self::new(DEFAULT_SERVER_NAME) }
}
