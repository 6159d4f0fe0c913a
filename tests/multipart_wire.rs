//! Multipart bodies as they appear on the wire.

mod common;

use common::{client_with, StubTransport};
use paloma::{MultipartForm, Part};

#[test]
fn single_field_form_emits_exact_framing() {
    let stub = StubTransport::ok_empty();
    let client = client_with(&stub);

    client
        .post("http://example.com/upload")
        .multipart(MultipartForm::new().with_boundary("B").text("f", "v"))
        .send()
        .expect("ok");

    let captured = stub.captured();
    assert_eq!(
        captured[0].headers.get("content-type").expect("content type"),
        "multipart/form-data; boundary=B"
    );
    let expected = "--B\r\n\
                    Content-Disposition: form-data; name=\"f\"\r\n\
                    Content-Type: text/plain; charset=UTF-8\r\n\
                    Content-Transfer-Encoding: 8bit\r\n\
                    \r\n\
                    v\r\n\
                    --B--\r\n";
    assert_eq!(
        String::from_utf8(captured[0].body.clone()).expect("utf8"),
        expected
    );
}

#[test]
fn mixed_parts_keep_declaration_order() {
    let stub = StubTransport::ok_empty();
    let client = client_with(&stub);

    client
        .post("http://example.com/upload")
        .multipart(
            MultipartForm::new()
                .with_boundary("Mixed")
                .text("title", "hello")
                .part(
                    Part::bytes("blob", vec![0u8, 1, 2])
                        .file_name("data.bin")
                        .content_type("application/octet-stream"),
                ),
        )
        .send()
        .expect("ok");

    let body = stub.captured()[0].body.clone();
    let text = String::from_utf8_lossy(&body);
    let title_at = text.find("name=\"title\"").expect("title part");
    let blob_at = text.find("name=\"blob\"").expect("blob part");
    assert!(title_at < blob_at);
    assert!(text.contains("filename=\"data.bin\""));
    assert!(text.contains("Content-Transfer-Encoding: binary"));
    assert!(text.ends_with("--Mixed--\r\n"));
}

#[test]
fn generated_boundaries_differ_between_forms() {
    let first = MultipartForm::new();
    let second = MultipartForm::new();
    assert_ne!(first.boundary(), second.boundary());
    assert!(first.boundary().len() <= 70);
}

#[test]
fn multipart_conflicts_with_other_body_sources() {
    let stub = StubTransport::ok_empty();
    let client = client_with(&stub);

    let err = client
        .post("http://example.com/upload")
        .body("raw")
        .multipart(MultipartForm::new().text("f", "v"))
        .send()
        .expect_err("must fail");
    assert_eq!(err.kind(), paloma::Kind::InvalidConfig);
    assert!(stub.captured().is_empty());
}
