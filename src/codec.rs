//! Content negotiation: the fixed content-type enumeration and the
//! serializer/deserializer registry keyed by it.
//!
//! Bodies travel through the framework as an opaque interchange value
//! ([`serde_json::Value`]). A [`BodyCodec`] turns that value into wire text
//! and back for one content type. JSON is always available; every other
//! slot is empty until something is registered into it, and an empty slot is
//! an error, never a silent fallback to JSON.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;

// ── ContentType ───────────────────────────────────────────────────────────────

/// The content types trellis can negotiate.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ContentType {
    Json,      // application/json
    Text,      // text/plain
    Html,      // text/html
    Form,      // application/x-www-form-urlencoded
    Multipart, // multipart/form-data
}

impl ContentType {
    pub const ALL: [ContentType; 5] =
        [Self::Json, Self::Text, Self::Html, Self::Form, Self::Multipart];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json      => "application/json",
            Self::Text      => "text/plain",
            Self::Html      => "text/html",
            Self::Form      => "application/x-www-form-urlencoded",
            Self::Multipart => "multipart/form-data",
        }
    }

    /// Matches a raw `Content-Type` value by case-insensitive prefix, so
    /// `Application/JSON; charset=utf-8` is [`ContentType::Json`].
    pub fn from_header(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|ct| raw.starts_with(ct.as_str()))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Codecs ────────────────────────────────────────────────────────────────────

/// Converts between wire text and the interchange value for one content type.
pub trait BodyCodec: Send + Sync {
    fn encode(&self, value: &Value) -> Result<String, Error>;
    fn decode(&self, text: &str) -> Result<Value, Error>;
}

/// The built-in JSON codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl BodyCodec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, Error> {
        serde_json::to_string(value).map_err(|e| Error::Codec(e.to_string()))
    }

    fn decode(&self, text: &str) -> Result<Value, Error> {
        serde_json::from_str(text).map_err(|e| Error::Codec(e.to_string()))
    }
}

/// Pass-through codec for `text/plain` and `text/html`.
///
/// Not registered by default. A string value is written as-is; any other
/// value is written in its JSON form.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextCodec;

impl BodyCodec for TextCodec {
    fn encode(&self, value: &Value) -> Result<String, Error> {
        Ok(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    fn decode(&self, text: &str) -> Result<Value, Error> {
        Ok(Value::String(text.to_owned()))
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Codec registry keyed by [`ContentType`].
#[derive(Clone)]
pub struct ContentCodecs {
    slots: HashMap<ContentType, Arc<dyn BodyCodec>>,
}

impl ContentCodecs {
    /// A registry with only JSON filled in.
    pub fn new() -> Self {
        let mut slots: HashMap<ContentType, Arc<dyn BodyCodec>> = HashMap::new();
        slots.insert(ContentType::Json, Arc::new(JsonCodec));
        Self { slots }
    }

    /// Fills (or replaces) the slot for `content_type`.
    pub fn register(&mut self, content_type: ContentType, codec: impl BodyCodec + 'static) {
        self.slots.insert(content_type, Arc::new(codec));
    }

    pub fn is_registered(&self, content_type: ContentType) -> bool {
        self.slots.contains_key(&content_type)
    }

    fn slot(&self, content_type: ContentType) -> Result<&Arc<dyn BodyCodec>, Error> {
        self.slots
            .get(&content_type)
            .ok_or(Error::UnsupportedContentType(content_type))
    }

    pub fn serialize(&self, content_type: ContentType, value: &Value) -> Result<String, Error> {
        self.slot(content_type)?.encode(value)
    }

    pub fn deserialize(&self, content_type: ContentType, text: &str) -> Result<Value, Error> {
        self.slot(content_type)?.decode(text)
    }
}

impl Default for ContentCodecs {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for ContentCodecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots.keys()).finish()
    }
}
