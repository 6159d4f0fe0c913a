//! The content-type keyed codec registry.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error;

use super::builtin::{CborCodec, FormCodec, JsonCodec};

/// A structured-body codec, keyed by content type.
pub trait Codec: Send + Sync {
    /// Canonical content type this codec serves.
    fn content_type(&self) -> &'static str;

    fn encode(&self, value: &Value) -> crate::Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> crate::Result<Value>;
}

impl std::fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("content_type", &self.content_type())
            .finish()
    }
}

/// Content types the library recognizes as structured but ships no codec
/// for. Requests naming them fail with `CodecNotAvailable` instead of
/// silently degrading to raw bytes.
const KNOWN_UNREGISTERED: &[&str] = &[
    "application/msgpack",
    "application/x-msgpack",
    "application/transit+json",
    "application/transit+msgpack",
];

/// Registry mapping content types (and short aliases) to codecs.
///
/// The registry is cloned into each client and never mutated afterwards;
/// register custom codecs before building the client.
#[derive(Clone)]
pub struct CodecRegistry {
    by_type: HashMap<String, Arc<dyn Codec>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CodecRegistry {
    /// An empty registry with no codecs at all.
    #[must_use]
    pub fn empty() -> Self {
        CodecRegistry {
            by_type: HashMap::new(),
        }
    }

    /// The stock registry: JSON, CBOR and url-encoded forms.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = CodecRegistry::empty();
        registry.register(Arc::new(JsonCodec), &["json"]);
        registry.register(Arc::new(CborCodec), &["cbor"]);
        registry.register(Arc::new(FormCodec), &["form"]);
        registry
    }

    /// Registers a codec under its canonical content type plus any short
    /// aliases. Later registrations shadow earlier ones.
    pub fn register(&mut self, codec: Arc<dyn Codec>, aliases: &[&str]) {
        self.by_type
            .insert(normalize(codec.content_type()), Arc::clone(&codec));
        for alias in aliases {
            self.by_type.insert(normalize(alias), Arc::clone(&codec));
        }
    }

    /// Looks up the codec a caller asked for by name, short alias or full
    /// content type. Anything unresolvable is `CodecNotAvailable`.
    pub fn require(&self, name: &str) -> crate::Result<Arc<dyn Codec>> {
        let key = normalize(name);
        self.by_type
            .get(&key)
            .cloned()
            .ok_or_else(|| error::codec_unavailable(name))
    }

    /// Resolves a codec for a response content type.
    ///
    /// Returns `Ok(Some)` for a registered type (including `+json`-style
    /// suffixed types), `Ok(None)` for types the registry has no opinion
    /// on, and an error for structured types it recognizes but has no
    /// codec registered for.
    pub fn for_content_type(&self, content_type: &str) -> crate::Result<Option<Arc<dyn Codec>>> {
        let key = normalize(content_type);
        if let Some(codec) = self.by_type.get(&key) {
            return Ok(Some(Arc::clone(codec)));
        }
        // Suffix convention: application/vnd.acme+json decodes as json.
        if let Some(suffix) = key.rsplit_once('+').map(|(_, s)| s) {
            if let Some(codec) = self.by_type.get(suffix) {
                return Ok(Some(Arc::clone(codec)));
            }
        }
        if KNOWN_UNREGISTERED.contains(&key.as_str()) {
            return Err(error::codec_unavailable(content_type));
        }
        Ok(None)
    }

    /// Decodes a body with the codec for `content_type`. A zero-length
    /// body is `Value::Null` regardless of codec.
    pub fn decode(&self, content_type_or_name: &str, bytes: &[u8]) -> crate::Result<Value> {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        self.require(content_type_or_name)?.decode(bytes)
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.by_type.keys().collect();
        keys.sort();
        f.debug_struct("CodecRegistry").field("types", &keys).finish()
    }
}

/// Lowercases and strips any parameters, leaving the type essence.
fn normalize(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
