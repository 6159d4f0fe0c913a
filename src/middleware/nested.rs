//! Nested parameter flattening.

use super::{Handler, Middleware};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::url::flatten_nested;

/// Flattens nested query and form params to `parent[child]` keys when the
/// request's flattening policy allows it. Disabled nesting is left intact
/// for the encoders to serialize as opaque JSON values.
pub struct FlattenNested;

impl Middleware for FlattenNested {
    fn name(&self) -> &'static str {
        "flatten-nested"
    }

    fn handle(&self, mut req: Request, next: &dyn Handler) -> crate::Result<Response> {
        if req.query_flattening() {
            if let Some(params) = req.query_params.as_ref().filter(|p| p.has_nested()) {
                req.query_params = Some(flatten_nested(params));
            }
        }
        if req.form_flattening() {
            if let Some(params) = req.form_params.as_ref().filter(|p| p.has_nested()) {
                req.form_params = Some(flatten_nested(params));
            }
        }
        next.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode, Version};

    use crate::http::params::Params;
    use crate::http::response::ResponseBody;
    use crate::http::url::{encode_query_string, ArrayStyle};

    fn ok_response() -> Response {
        Response::new(
            StatusCode::OK,
            HeaderMap::new(),
            ResponseBody::Empty,
            Version::HTTP_11,
        )
    }

    #[test]
    fn nested_query_params_flatten_by_default() {
        let terminal = |req: Request| {
            let params = req.query_params.expect("params");
            assert_eq!(
                encode_query_string(&params, ArrayStyle::Repeat),
                "a[b][c]=5"
            );
            Ok(ok_response())
        };
        let mut req = Request::new(Method::GET, "http://example.com/");
        req.query_params =
            Some(Params::new().add("a", Params::new().add("b", Params::new().add("c", 5))));
        FlattenNested.handle(req, &terminal).expect("ok");
    }

    #[test]
    fn ignored_nesting_stays_opaque() {
        let terminal = |req: Request| {
            let params = req.query_params.expect("params");
            assert!(params.has_nested());
            Ok(ok_response())
        };
        let mut req = Request::new(Method::GET, "http://example.com/");
        req.ignore_nested_query = true;
        req.query_params = Some(Params::new().add("a", Params::new().add("b", 1)));
        FlattenNested.handle(req, &terminal).expect("ok");
    }
}
