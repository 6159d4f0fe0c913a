//! The normalized response descriptor.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use url::Url;

use crate::error;
use crate::http::request::RequestInfo;

/// Response body in the representation selected by the request's `as`
/// field. The transport always produces `Stream`; the coercion stage
/// converts it.
pub enum ResponseBody {
    /// Raw body stream as handed over by the transport. Finite, not
    /// restartable.
    Stream(Box<dyn Read + Send>),
    /// Buffered raw bytes.
    Bytes(Bytes),
    /// Decoded text.
    Text(String),
    /// Structured value decoded by a registered codec.
    Structured(serde_json::Value),
    /// No body.
    Empty,
}

impl ResponseBody {
    /// Drains a `Stream` body into `Bytes`; other shapes pass through
    /// their byte form where one exists.
    pub fn into_bytes(self) -> crate::Result<Bytes> {
        match self {
            ResponseBody::Stream(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).map_err(error::body)?;
                Ok(Bytes::from(buf))
            }
            ResponseBody::Bytes(b) => Ok(b),
            ResponseBody::Text(t) => Ok(Bytes::from(t.into_bytes())),
            ResponseBody::Structured(v) => {
                serde_json::to_vec(&v).map(Bytes::from).map_err(error::body)
            }
            ResponseBody::Empty => Ok(Bytes::new()),
        }
    }

    #[must_use]
    pub fn is_empty_repr(&self) -> bool {
        matches!(self, ResponseBody::Empty)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
            ResponseBody::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            ResponseBody::Text(t) => write!(f, "Text({} chars)", t.len()),
            ResponseBody::Structured(v) => f.debug_tuple("Structured").field(v).finish(),
            ResponseBody::Empty => f.write_str("Empty"),
        }
    }
}

/// A normalized HTTP response. Created once per exchange and immutable
/// once returned to the caller.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    pub body: ResponseBody,
    version: Version,
    request_time: Option<Duration>,
    uri: Option<Url>,
    request: Option<RequestInfo>,
    /// Content-Encoding the body arrived with before transparent
    /// decompression stripped it.
    orig_content_encoding: Option<String>,
}

impl Response {
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody, version: Version) -> Self {
        Response {
            status,
            headers,
            body,
            version,
            request_time: None,
            uri: None,
            request: None,
            orig_content_encoding: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header, lossily decoded.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    }

    /// All values of a multi-valued header, in insertion order.
    #[must_use]
    pub fn header_all(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect()
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Wall-clock time of the full exchange, including every middleware
    /// stage. Stamped by the timing stage.
    #[must_use]
    pub fn request_time(&self) -> Option<Duration> {
        self.request_time
    }

    #[must_use]
    pub fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    /// Snapshot of the request as dispatched to the transport.
    #[must_use]
    pub fn request(&self) -> Option<&RequestInfo> {
        self.request.as_ref()
    }

    #[must_use]
    pub fn orig_content_encoding(&self) -> Option<&str> {
        self.orig_content_encoding.as_deref()
    }

    pub(crate) fn set_request_time(&mut self, elapsed: Duration) {
        self.request_time = Some(elapsed);
    }

    pub(crate) fn set_uri(&mut self, uri: Url) {
        self.uri = Some(uri);
    }

    pub(crate) fn set_request(&mut self, info: RequestInfo) {
        self.request = Some(info);
    }

    pub(crate) fn set_orig_content_encoding(&mut self, encoding: String) {
        self.orig_content_encoding = Some(encoding);
    }

    /// Consumes the response, returning the body as bytes.
    pub fn into_bytes(self) -> crate::Result<Bytes> {
        self.body.into_bytes()
    }

    /// Consumes the response, returning the body as UTF-8 text.
    pub fn into_text(self) -> crate::Result<String> {
        match self.body {
            ResponseBody::Text(t) => Ok(t),
            other => {
                let bytes = other.into_bytes()?;
                String::from_utf8(bytes.to_vec()).map_err(error::decode)
            }
        }
    }

    /// Consumes the response, returning the structured body value. Decodes
    /// text/bytes bodies as JSON when no structured value is present.
    pub fn into_structured(self) -> crate::Result<serde_json::Value> {
        match self.body {
            ResponseBody::Structured(v) => Ok(v),
            other => {
                let bytes = other.into_bytes()?;
                if bytes.is_empty() {
                    return Ok(serde_json::Value::Null);
                }
                serde_json::from_slice(&bytes).map_err(error::decode)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_valued_headers_are_preserved() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", "a=1".parse().expect("header"));
        headers.append("set-cookie", "b=2".parse().expect("header"));
        let resp = Response::new(StatusCode::OK, headers, ResponseBody::Empty, Version::HTTP_11);
        assert_eq!(resp.header_all("set-cookie"), vec!["a=1", "b=2"]);
        assert_eq!(resp.header("set-cookie").as_deref(), Some("a=1"));
    }

    #[test]
    fn stream_body_drains_to_bytes() {
        let body = ResponseBody::Stream(Box::new(std::io::Cursor::new(b"hello".to_vec())));
        assert_eq!(body.into_bytes().expect("drain").as_ref(), b"hello");
    }
}
