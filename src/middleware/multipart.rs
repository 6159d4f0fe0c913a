//! Multipart body substitution.

use http::header::{HeaderValue, CONTENT_TYPE};

use super::{Handler, Middleware};
use crate::error;
use crate::http::request::{Body, Request};
use crate::http::response::Response;
use crate::multipart::form;

/// Replaces a multipart form specification with its framed streaming body
/// and stamps the boundary-bearing Content-Type header.
pub struct EncodeMultipart;

impl Middleware for EncodeMultipart {
    fn name(&self) -> &'static str {
        "multipart"
    }

    fn handle(&self, mut req: Request, next: &dyn Handler) -> crate::Result<Response> {
        if let Some(multipart) = req.multipart.take() {
            let content_type = multipart.content_type();
            let (reader, len) = form::stream_body(multipart)?;
            req.body = Some(Body::Reader {
                reader: Box::new(reader),
                len,
            });
            req.headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_str(&content_type).map_err(error::config)?,
            );
        }
        next.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode, Version};
    use std::io::Read;

    use crate::http::response::ResponseBody;
    use crate::multipart::MultipartForm;

    #[test]
    fn multipart_form_becomes_a_streaming_body() {
        let terminal = |mut req: Request| {
            let content_type = req
                .headers
                .get(CONTENT_TYPE)
                .expect("content type")
                .to_str()
                .expect("ascii")
                .to_string();
            assert!(content_type.starts_with("multipart/form-data; boundary="));

            match req.body.take() {
                Some(Body::Reader { mut reader, len }) => {
                    let mut out = Vec::new();
                    reader.read_to_end(&mut out).expect("stream");
                    assert_eq!(len, Some(out.len() as u64));
                    let text = String::from_utf8(out).expect("utf8");
                    assert!(text.contains("name=\"f\""));
                    assert!(text.ends_with("--\r\n"));
                }
                other => panic!("unexpected body: {other:?}"),
            }
            Ok(Response::new(
                StatusCode::OK,
                HeaderMap::new(),
                ResponseBody::Empty,
                Version::HTTP_11,
            ))
        };
        let mut req = Request::new(Method::POST, "http://example.com/");
        req.multipart = Some(MultipartForm::new().text("f", "v"));
        EncodeMultipart.handle(req, &terminal).expect("ok");
    }
}
