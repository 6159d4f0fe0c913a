//! Request body encoding: form params and structured values.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};

use super::{Handler, Middleware};
use crate::codec::charset::{self, Charset};
use crate::codec::CodecRegistry;
use crate::error;
use crate::http::request::{Body, Request};
use crate::http::response::Response;
use crate::http::url::encode_query_string;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Turns declarative body inputs into wire bytes.
///
/// Form params encode to a url-encoded body, structured values go through
/// the codec selected by the request content type (JSON by default), and
/// text bodies with an explicit non-UTF-8 charset are re-encoded. The
/// Content-Type header is set from the resulting shape unless the caller
/// already provided one.
pub struct EncodeBody {
    registry: Arc<CodecRegistry>,
}

impl EncodeBody {
    #[must_use]
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        EncodeBody { registry }
    }
}

impl Middleware for EncodeBody {
    fn name(&self) -> &'static str {
        "encode-body"
    }

    fn handle(&self, mut req: Request, next: &dyn Handler) -> crate::Result<Response> {
        if let Some(params) = req.form_params.take() {
            let encoded = encode_query_string(&params, req.array_style);
            let content_type = req
                .content_type
                .clone()
                .unwrap_or_else(|| FORM_CONTENT_TYPE.to_string());
            req.body = Some(encode_text(encoded, &content_type)?);
            set_content_type(&mut req, &content_type)?;
        } else {
            match req.body.take() {
                Some(Body::Structured(value)) => {
                    let content_type = req
                        .content_type
                        .clone()
                        .unwrap_or_else(|| "application/json".to_string());
                    let codec = self.registry.require(&content_type)?;
                    req.body = Some(Body::Bytes(Bytes::from(codec.encode(&value)?)));
                    set_content_type(&mut req, &content_type)?;
                }
                Some(Body::Text(text)) => {
                    match req.content_type.clone() {
                        Some(content_type) => {
                            req.body = Some(encode_text(text, &content_type)?);
                            set_content_type(&mut req, &content_type)?;
                        }
                        None => req.body = Some(Body::Text(text)),
                    };
                }
                other => {
                    req.body = other;
                    if let Some(content_type) = req.content_type.clone() {
                        set_content_type(&mut req, &content_type)?;
                    }
                }
            }
        }
        next.call(req)
    }
}

/// Encodes text per the charset of `content_type`; UTF-8 stays text.
fn encode_text(text: String, content_type: &str) -> crate::Result<Body> {
    let cs = charset::extract_charset(content_type)?;
    if cs == Charset::Utf8 {
        Ok(Body::Text(text))
    } else {
        Ok(Body::Bytes(Bytes::from(charset::encode_str(&text, cs)?)))
    }
}

fn set_content_type(req: &mut Request, content_type: &str) -> crate::Result<()> {
    if !req.headers.contains_key(CONTENT_TYPE) {
        let value = HeaderValue::from_str(content_type).map_err(error::config)?;
        req.headers.insert(CONTENT_TYPE, value);
    }
    Ok(())
}
