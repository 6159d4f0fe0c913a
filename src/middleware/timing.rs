//! Wall-clock timing for the full exchange.

use std::time::Instant;

use super::{Handler, Middleware};
use crate::http::request::Request;
use crate::http::response::Response;

/// Outermost stage. Stamps the elapsed wall-clock time of the whole
/// pipeline run onto the response, including responses carried inside
/// status errors.
pub struct Timing;

impl Middleware for Timing {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn handle(&self, req: Request, next: &dyn Handler) -> crate::Result<Response> {
        let start = Instant::now();
        match next.call(req) {
            Ok(mut resp) => {
                resp.set_request_time(start.elapsed());
                Ok(resp)
            }
            Err(mut err) => {
                if let Some(mut resp) = err.take_response() {
                    resp.set_request_time(start.elapsed());
                    err.put_response(resp);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode, Version};

    use crate::http::response::ResponseBody;

    #[test]
    fn request_time_is_stamped_on_success() {
        let terminal = |_req: Request| {
            Ok(Response::new(
                StatusCode::OK,
                HeaderMap::new(),
                ResponseBody::Empty,
                Version::HTTP_11,
            ))
        };
        let resp = Timing
            .handle(Request::new(Method::GET, "http://example.com/"), &terminal)
            .expect("ok");
        assert!(resp.request_time().is_some());
    }

    #[test]
    fn request_time_is_stamped_on_status_errors() {
        let terminal = |_req: Request| {
            Err(crate::error::status(Response::new(
                StatusCode::NOT_FOUND,
                HeaderMap::new(),
                ResponseBody::Empty,
                Version::HTTP_11,
            )))
        };
        let err = Timing
            .handle(Request::new(Method::GET, "http://example.com/"), &terminal)
            .expect_err("status error");
        assert!(err.response().expect("carried response").request_time().is_some());
    }
}
