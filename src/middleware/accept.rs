//! Accept and Accept-Encoding header injection.

use http::header::{HeaderValue, ACCEPT, ACCEPT_ENCODING};

use super::{Handler, Middleware};
use crate::error;
use crate::http::request::Request;
use crate::http::response::Response;

/// Expands accept shorthands ("json" means "application/json") into the
/// Accept header and advertises the compression schemes the decompression
/// stage can transparently undo. Explicit headers always win.
pub struct AcceptHeaders;

/// Shorthands without a slash expand under the application tree.
fn expand_accept(value: &str) -> String {
    if value.contains('/') {
        value.to_string()
    } else {
        format!("application/{value}")
    }
}

impl Middleware for AcceptHeaders {
    fn name(&self) -> &'static str {
        "accept-headers"
    }

    fn handle(&self, mut req: Request, next: &dyn Handler) -> crate::Result<Response> {
        if let Some(accept) = req.accept.as_deref() {
            if !req.headers.contains_key(ACCEPT) {
                let value =
                    HeaderValue::from_str(&expand_accept(accept)).map_err(error::config)?;
                req.headers.insert(ACCEPT, value);
            }
        }
        if req.decompress_body && !req.headers.contains_key(ACCEPT_ENCODING) {
            req.headers
                .insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
        }
        next.call(req)
    }
}
