//! Eager request validation, before any I/O happens.

use super::{Handler, Middleware};
use crate::http::request::Request;
use crate::http::response::Response;

/// Rejects invalid option combinations up front so no connection is ever
/// opened for a request that cannot be sent.
pub struct Validate;

impl Middleware for Validate {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn handle(&self, req: Request, next: &dyn Handler) -> crate::Result<Response> {
        req.validate()?;
        next.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    use crate::http::params::Params;
    use crate::http::request::Body;

    #[test]
    fn invalid_requests_never_reach_the_terminal() {
        let terminal = |_req: Request| -> crate::Result<Response> {
            panic!("terminal must not run for invalid requests");
        };
        let mut req = Request::new(Method::POST, "http://example.com/");
        req.body = Some(Body::from("x"));
        req.form_params = Some(Params::new().add("a", "1"));
        let err = Validate.handle(req, &terminal).expect_err("must fail");
        assert_eq!(err.kind(), crate::error::Kind::InvalidConfig);
    }
}
