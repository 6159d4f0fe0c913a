//! The declarative request descriptor threaded through the middleware
//! pipeline.

use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method};
use url::Url;

use crate::error;
use crate::http::params::Params;
use crate::http::url::ArrayStyle;
use crate::multipart::MultipartForm;

/// Request body shapes, mirroring the transport's body publishing
/// strategies plus a structured value encoded by the codec registry.
pub enum Body {
    /// Raw bytes, length known.
    Bytes(Bytes),
    /// Text, sent as UTF-8 bytes.
    Text(String),
    /// A streaming source, opened lazily and consumed destructively.
    Reader {
        reader: Box<dyn Read + Send>,
        len: Option<u64>,
    },
    /// File contents, streamed by the transport.
    File(PathBuf),
    /// A structured value; the body-encoding stage serializes it per the
    /// request content type.
    Structured(serde_json::Value),
}

impl Body {
    /// Statically known byte length, if any.
    #[must_use]
    pub fn known_length(&self) -> Option<u64> {
        match self {
            Body::Bytes(b) => Some(b.len() as u64),
            Body::Text(t) => Some(t.len() as u64),
            Body::Reader { len, .. } => *len,
            Body::File(path) => std::fs::metadata(path).ok().map(|m| m.len()),
            Body::Structured(_) => None,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Bytes(b) => f.debug_tuple("Bytes").field(&format!("{} bytes", b.len())).finish(),
            Body::Text(t) => f.debug_tuple("Text").field(&format!("{} chars", t.len())).finish(),
            Body::Reader { len, .. } => f.debug_tuple("Reader").field(len).finish(),
            Body::File(path) => f.debug_tuple("File").field(path).finish(),
            Body::Structured(v) => f.debug_tuple("Structured").field(v).finish(),
        }
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Bytes(value)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Structured(value)
    }
}

/// Desired response body representation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum As {
    /// Pick by response content type: registered structured codecs decode,
    /// `text/*` becomes text, everything else raw bytes.
    #[default]
    Auto,
    /// Decoded text.
    Text,
    /// Raw bytes.
    Bytes,
    /// The raw body stream, untouched.
    Stream,
    /// A named structured format (`"json"`, `"cbor"`, or a full content
    /// type), decoded through the codec registry.
    Structured(String),
}

/// Which status classes get structured-body coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coerce {
    /// Coerce only unexceptional responses (default).
    #[default]
    Unexceptional,
    /// Coerce every response, including error statuses.
    Always,
    /// Coerce only exceptional responses.
    Exceptional,
}

/// Basic-auth credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: Option<String>,
}

/// A declarative HTTP request.
///
/// Invariant, checked by [`Request::validate`] before any I/O: at most one
/// of `body`, `form_params`, `multipart` is set, and the nested-flattening
/// switches are mutually consistent.
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Body>,
    pub query_params: Option<Params>,
    pub form_params: Option<Params>,
    pub multipart: Option<MultipartForm>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub array_style: ArrayStyle,

    /// Flatten nested keys in both query and form params. Conflicts with
    /// the per-kind switches below.
    pub flatten_nested_keys: Option<bool>,
    /// Leave nested query params as opaque values.
    pub ignore_nested_query: bool,
    /// Flatten nested form params (default on).
    pub flatten_nested_form: Option<bool>,

    pub as_repr: As,
    pub coerce: Coerce,
    pub basic_auth: Option<BasicCredentials>,
    pub oauth_token: Option<String>,
    pub decompress_body: bool,
    /// Raise on exceptional status (default). When false the response is
    /// returned as data regardless of status.
    pub status_error: bool,
    pub timeout: Option<Duration>,
    pub expect_continue: bool,
    pub prefer_http2: bool,

    /// Set by the URL-resolution stage; transport input.
    pub resolved_url: Option<Url>,
}

impl Request {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Request {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            query_params: None,
            form_params: None,
            multipart: None,
            content_type: None,
            accept: None,
            array_style: ArrayStyle::default(),
            flatten_nested_keys: None,
            ignore_nested_query: false,
            flatten_nested_form: None,
            as_repr: As::default(),
            coerce: Coerce::default(),
            basic_auth: None,
            oauth_token: None,
            decompress_body: true,
            status_error: true,
            timeout: None,
            expect_continue: false,
            prefer_http2: false,
            resolved_url: None,
        }
    }

    /// Validates mutually exclusive options. Fails fast, before any
    /// network call.
    pub fn validate(&self) -> crate::Result<()> {
        let body_sources = usize::from(self.body.is_some())
            + usize::from(self.form_params.is_some())
            + usize::from(self.multipart.is_some());
        if body_sources > 1 {
            return Err(error::config(
                "only one of body, form_params and multipart may be set",
            ));
        }
        if self.flatten_nested_keys.is_some()
            && (self.ignore_nested_query || self.flatten_nested_form.is_some())
        {
            return Err(error::config(
                "flatten_nested_keys may not be combined with ignore_nested_query or flatten_nested_form",
            ));
        }
        Ok(())
    }

    /// Effective nested-flattening policy for query params (default on).
    #[must_use]
    pub fn query_flattening(&self) -> bool {
        match self.flatten_nested_keys {
            Some(flag) => flag,
            None => !self.ignore_nested_query,
        }
    }

    /// Effective nested-flattening policy for form params (default on).
    #[must_use]
    pub fn form_flattening(&self) -> bool {
        self.flatten_nested_form
            .or(self.flatten_nested_keys)
            .unwrap_or(true)
    }
}

/// Immutable snapshot of the request as dispatched to the transport,
/// attached to the response for diagnostics.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}
