//! Response output coercion.

use std::sync::Arc;

use http::header::CONTENT_TYPE;

use super::status::is_unexceptional;
use super::{Handler, Middleware};
use crate::codec::charset::{self, Charset};
use crate::codec::CodecRegistry;
use crate::http::request::{As, Coerce, Request};
use crate::http::response::{Response, ResponseBody};

/// Converts the raw response stream into the representation the request
/// asked for. Runs inside decompression, so it always sees plain bytes,
/// and outside the status check, so responses carried by status errors
/// are coerced too.
pub struct CoerceOutput {
    registry: Arc<CodecRegistry>,
}

impl CoerceOutput {
    #[must_use]
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        CoerceOutput { registry }
    }

    fn coerce(&self, as_repr: &As, resp: &mut Response) -> crate::Result<()> {
        if matches!(as_repr, As::Stream) {
            return Ok(());
        }
        let content_type = resp.header(CONTENT_TYPE.as_str());
        let bytes = std::mem::replace(&mut resp.body, ResponseBody::Empty).into_bytes()?;

        resp.body = match as_repr {
            As::Stream => unreachable!("handled above"),
            As::Bytes => ResponseBody::Bytes(bytes),
            As::Text => ResponseBody::Text(decode_text(&bytes, content_type.as_deref())?),
            As::Structured(name) => {
                ResponseBody::Structured(self.registry.decode(name, &bytes)?)
            }
            As::Auto => {
                let content_type = content_type.unwrap_or_default();
                if let Some(codec) = self.registry.for_content_type(&content_type)? {
                    if bytes.is_empty() {
                        ResponseBody::Structured(serde_json::Value::Null)
                    } else {
                        ResponseBody::Structured(codec.decode(&bytes)?)
                    }
                } else if content_type.starts_with("text/") {
                    ResponseBody::Text(decode_text(&bytes, Some(&content_type))?)
                } else {
                    ResponseBody::Bytes(bytes)
                }
            }
        };
        Ok(())
    }
}

fn decode_text(bytes: &[u8], content_type: Option<&str>) -> crate::Result<String> {
    let cs = match content_type {
        Some(ct) => charset::extract_charset(ct)?,
        None => Charset::Utf8,
    };
    charset::decode_bytes(bytes, cs)
}

impl Middleware for CoerceOutput {
    fn name(&self) -> &'static str {
        "coerce-output"
    }

    fn handle(&self, req: Request, next: &dyn Handler) -> crate::Result<Response> {
        let as_repr = req.as_repr.clone();
        let policy = req.coerce;
        let mut resp = next.call(req)?;

        let applies = match policy {
            Coerce::Always => true,
            Coerce::Unexceptional => is_unexceptional(resp.status()),
            Coerce::Exceptional => !is_unexceptional(resp.status()),
        };
        if applies {
            self.coerce(&as_repr, &mut resp)?;
        }
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, Method, StatusCode, Version};
    use serde_json::json;

    fn stage() -> CoerceOutput {
        CoerceOutput::new(Arc::new(CodecRegistry::builtin()))
    }

    fn terminal_with(
        status: StatusCode,
        content_type: &'static str,
        body: &'static [u8],
    ) -> impl Fn(Request) -> crate::Result<Response> {
        move |_req| {
            let mut headers = HeaderMap::new();
            if !content_type.is_empty() {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            Ok(Response::new(
                status,
                headers,
                ResponseBody::Stream(Box::new(std::io::Cursor::new(body.to_vec()))),
                Version::HTTP_11,
            ))
        }
    }

    #[test]
    fn auto_decodes_json_responses() {
        let resp = stage()
            .handle(
                Request::new(Method::GET, "http://example.com/"),
                &terminal_with(StatusCode::OK, "application/json", b"{\"a\":1}"),
            )
            .expect("ok");
        match resp.body {
            ResponseBody::Structured(v) => assert_eq!(v, json!({"a": 1})),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn auto_decodes_text_with_charset() {
        let resp = stage()
            .handle(
                Request::new(Method::GET, "http://example.com/"),
                &terminal_with(StatusCode::OK, "text/plain; charset=ISO-8859-1", b"caf\xe9"),
            )
            .expect("ok");
        match resp.body {
            ResponseBody::Text(t) => assert_eq!(t, "caf\u{e9}"),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn auto_leaves_unknown_types_as_bytes() {
        let resp = stage()
            .handle(
                Request::new(Method::GET, "http://example.com/"),
                &terminal_with(StatusCode::OK, "image/png", b"\x89PNG"),
            )
            .expect("ok");
        assert!(matches!(resp.body, ResponseBody::Bytes(_)));
    }

    #[test]
    fn zero_length_structured_body_is_null() {
        let mut req = Request::new(Method::GET, "http://example.com/");
        req.as_repr = As::Structured("json".to_string());
        let resp = stage()
            .handle(req, &terminal_with(StatusCode::OK, "application/json", b""))
            .expect("ok");
        match resp.body {
            ResponseBody::Structured(v) => assert_eq!(v, serde_json::Value::Null),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn stream_representation_is_left_untouched() {
        let mut req = Request::new(Method::GET, "http://example.com/");
        req.as_repr = As::Stream;
        let resp = stage()
            .handle(req, &terminal_with(StatusCode::OK, "application/json", b"{}"))
            .expect("ok");
        assert!(matches!(resp.body, ResponseBody::Stream(_)));
    }

    #[test]
    fn default_policy_skips_exceptional_responses() {
        let mut req = Request::new(Method::GET, "http://example.com/");
        req.status_error = false;
        let resp = stage()
            .handle(
                req,
                &terminal_with(StatusCode::NOT_FOUND, "application/json", b"{\"e\":1}"),
            )
            .expect("ok");
        assert!(matches!(resp.body, ResponseBody::Stream(_)));

        let mut req = Request::new(Method::GET, "http://example.com/");
        req.status_error = false;
        req.coerce = Coerce::Always;
        let resp = stage()
            .handle(
                req,
                &terminal_with(StatusCode::NOT_FOUND, "application/json", b"{\"e\":1}"),
            )
            .expect("ok");
        assert!(matches!(resp.body, ResponseBody::Structured(_)));
    }
}
