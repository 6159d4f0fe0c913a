//! URL resolution.

use url::Url;

use super::{Handler, Middleware};
use crate::error;
use crate::http::request::Request;
use crate::http::response::Response;

/// Parses the request URL once, fails fast on malformed input, and stamps
/// the final URL onto the response for diagnostics.
pub struct ResolveUrl;

impl Middleware for ResolveUrl {
    fn name(&self) -> &'static str {
        "resolve-url"
    }

    fn handle(&self, mut req: Request, next: &dyn Handler) -> crate::Result<Response> {
        let url = Url::parse(&req.url).map_err(error::invalid_url)?;
        if url.host_str().is_none() {
            return Err(error::invalid_url(format!("URL has no host: {}", req.url)));
        }
        req.resolved_url = Some(url.clone());

        let mut resp = next.call(req)?;
        // Inner stages may have appended query params.
        let final_url = resp
            .request()
            .map(|info| info.url.clone())
            .unwrap_or(url);
        resp.set_uri(final_url);
        Ok(resp)
    }
}
