//! Exceptional-status policy.

use http::StatusCode;

use super::{Handler, Middleware};
use crate::error;
use crate::http::request::Request;
use crate::http::response::Response;

/// True for statuses the library treats as ordinary data: success plus
/// the redirect statuses a non-following client legitimately returns.
#[must_use]
pub fn is_unexceptional(status: StatusCode) -> bool {
    status.is_success()
        || matches!(status.as_u16(), 300..=304 | 307)
}

/// Raises a `Status` error for exceptional responses, carrying the full
/// (already coerced) response as context. Opt out per request with
/// `status_error = false` to receive every response as data.
pub struct ExceptionalStatus;

impl Middleware for ExceptionalStatus {
    fn name(&self) -> &'static str {
        "exceptional-status"
    }

    fn handle(&self, req: Request, next: &dyn Handler) -> crate::Result<Response> {
        let raise = req.status_error;
        let resp = next.call(req)?;
        if raise && !is_unexceptional(resp.status()) {
            return Err(error::status(resp));
        }
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, Version};

    use crate::http::response::ResponseBody;

    fn terminal_with(status: StatusCode) -> impl Fn(Request) -> crate::Result<Response> {
        move |_req| {
            Ok(Response::new(
                status,
                HeaderMap::new(),
                ResponseBody::Empty,
                Version::HTTP_11,
            ))
        }
    }

    #[test]
    fn not_found_raises_with_the_response_attached() {
        let err = ExceptionalStatus
            .handle(
                Request::new(Method::GET, "http://example.com/"),
                &terminal_with(StatusCode::NOT_FOUND),
            )
            .expect_err("must raise");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(
            err.response().expect("carried").status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn opt_out_returns_error_statuses_as_data() {
        let mut req = Request::new(Method::GET, "http://example.com/");
        req.status_error = false;
        let resp = ExceptionalStatus
            .handle(req, &terminal_with(StatusCode::INTERNAL_SERVER_ERROR))
            .expect("data");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn redirect_statuses_are_unexceptional() {
        for code in [300u16, 301, 302, 303, 304, 307] {
            assert!(is_unexceptional(
                StatusCode::from_u16(code).expect("status")
            ));
        }
        assert!(!is_unexceptional(StatusCode::PERMANENT_REDIRECT));
        assert!(!is_unexceptional(StatusCode::BAD_REQUEST));
    }
}
