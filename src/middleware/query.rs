//! Query parameter encoding.

use super::{Handler, Middleware};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::url::encode_query_string;

/// Encodes declared query params and merges them into the resolved URL,
/// after any query string already present in the raw URL.
pub struct EncodeQuery;

impl Middleware for EncodeQuery {
    fn name(&self) -> &'static str {
        "encode-query"
    }

    fn handle(&self, mut req: Request, next: &dyn Handler) -> crate::Result<Response> {
        if let Some(params) = req.query_params.take() {
            if !params.is_empty() {
                let encoded = encode_query_string(&params, req.array_style);
                if let Some(url) = req.resolved_url.as_mut() {
                    let merged = match url.query() {
                        Some(existing) if !existing.is_empty() => {
                            format!("{existing}&{encoded}")
                        }
                        _ => encoded,
                    };
                    url.set_query(Some(&merged));
                }
            }
        }
        next.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode, Version};
    use url::Url;

    use crate::http::params::Params;
    use crate::http::response::ResponseBody;

    fn final_url(mut req: Request, raw: &str) -> String {
        req.resolved_url = Some(Url::parse(raw).expect("url"));
        let out = std::sync::Mutex::new(String::new());
        let terminal = |req: Request| {
            *out.lock().expect("out") = req.resolved_url.expect("resolved").to_string();
            Ok(Response::new(
                StatusCode::OK,
                HeaderMap::new(),
                ResponseBody::Empty,
                Version::HTTP_11,
            ))
        };
        EncodeQuery.handle(req, &terminal).expect("ok");
        out.into_inner().expect("out")
    }

    #[test]
    fn params_append_to_the_resolved_url() {
        let mut req = Request::new(Method::GET, "http://example.com/s");
        req.query_params = Some(Params::new().add("q", "a b").add("n", 2));
        assert_eq!(
            final_url(req, "http://example.com/s"),
            "http://example.com/s?q=a+b&n=2"
        );
    }

    #[test]
    fn existing_query_strings_are_preserved() {
        let mut req = Request::new(Method::GET, "http://example.com/s?pre=1");
        req.query_params = Some(Params::new().add("q", "x"));
        assert_eq!(
            final_url(req, "http://example.com/s?pre=1"),
            "http://example.com/s?pre=1&q=x"
        );
    }
}
