//! End-to-end pipeline behavior over a stub transport.

mod common;

use std::io::Write;

use common::{client_with, StubTransport};
use flate2::write::GzEncoder;
use flate2::Compression;
use http::{HeaderMap, HeaderValue, StatusCode};
use paloma::{As, Coerce, Params, ResponseBody};
use serde_json::json;

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers
}

#[test]
fn get_encodes_flattened_and_sequence_params() {
    let stub = StubTransport::ok_empty();
    let client = client_with(&stub);

    client
        .get("http://example.com/search")
        .query(
            Params::new()
                .add("a", Params::new().add("b", Params::new().add("c", 5)))
                .add("tags", vec!["x", "y"]),
        )
        .send()
        .expect("ok");

    let captured = stub.captured();
    assert_eq!(
        captured[0].url,
        "http://example.com/search?a[b][c]=5&tags=x&tags=y"
    );
    assert_eq!(captured[0].method, "GET");
}

#[test]
fn gzip_response_is_decompressed_before_coercion() {
    let stub = StubTransport::replying(|| {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"{\"status\":\"ok\"}").expect("write");
        let mut headers = json_headers();
        headers.insert("content-encoding", HeaderValue::from_static("gzip"));
        (StatusCode::OK, headers, enc.finish().expect("finish"))
    });
    let client = client_with(&stub);

    let resp = client.get("http://example.com/data").send().expect("ok");
    assert_eq!(resp.orig_content_encoding(), Some("gzip"));
    assert!(resp.header("content-encoding").is_none());
    assert_eq!(
        resp.into_structured().expect("structured"),
        json!({"status": "ok"})
    );

    let accept_encoding = stub.captured()[0]
        .headers
        .get("accept-encoding")
        .expect("advertised")
        .clone();
    assert_eq!(accept_encoding, "gzip, deflate");
}

#[test]
fn error_status_raises_and_carries_the_response() {
    let stub = StubTransport::replying(|| {
        (
            StatusCode::NOT_FOUND,
            json_headers(),
            b"{\"error\":\"missing\"}".to_vec(),
        )
    });
    let client = client_with(&stub);

    let err = client
        .get("http://example.com/nothing")
        .send()
        .expect_err("must raise");
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    let resp = err.into_response().expect("carried response");
    assert!(resp.request_time().is_some());
    assert_eq!(
        resp.into_structured().expect("structured"),
        json!({"error": "missing"})
    );
}

#[test]
fn coerce_always_decodes_exceptional_bodies_eagerly() {
    let stub = StubTransport::replying(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json_headers(),
            b"{\"error\":\"boom\"}".to_vec(),
        )
    });
    let client = client_with(&stub);

    let err = client
        .get("http://example.com/boom")
        .coerce(Coerce::Always)
        .send()
        .expect_err("must raise");
    let resp = err.into_response().expect("carried response");
    assert!(matches!(resp.body, ResponseBody::Structured(_)));
}

#[test]
fn allow_any_status_returns_errors_as_data() {
    let stub = StubTransport::replying(|| {
        (StatusCode::INTERNAL_SERVER_ERROR, HeaderMap::new(), Vec::new())
    });
    let client = client_with(&stub);

    let resp = client
        .get("http://example.com/unstable")
        .allow_any_status()
        .send()
        .expect("data");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn redirect_statuses_come_back_as_data() {
    let stub = StubTransport::replying(|| {
        let mut headers = HeaderMap::new();
        headers.insert("location", HeaderValue::from_static("http://example.com/moved"));
        (StatusCode::FOUND, headers, Vec::new())
    });
    let client = client_with(&stub);

    let resp = client.get("http://example.com/old").send().expect("data");
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.header("location").as_deref(),
        Some("http://example.com/moved")
    );
}

#[test]
fn form_params_post_as_urlencoded_body() {
    let stub = StubTransport::ok_empty();
    let client = client_with(&stub);

    client
        .post("http://example.com/submit")
        .form(Params::new().add("name", "Jane Doe").add("age", 30))
        .send()
        .expect("ok");

    let captured = stub.captured();
    assert_eq!(captured[0].body, b"name=Jane+Doe&age=30");
    assert_eq!(
        captured[0].headers.get("content-type").expect("content type"),
        "application/x-www-form-urlencoded"
    );
}

#[test]
fn json_body_and_accept_shorthand() {
    let stub = StubTransport::ok_empty();
    let client = client_with(&stub);

    client
        .post("http://example.com/items")
        .json(json!({"name": "widget"}))
        .accept("json")
        .send()
        .expect("ok");

    let captured = stub.captured();
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&captured[0].body).expect("json"),
        json!({"name": "widget"})
    );
    assert_eq!(
        captured[0].headers.get("content-type").expect("content type"),
        "application/json"
    );
    assert_eq!(
        captured[0].headers.get("accept").expect("accept"),
        "application/json"
    );
}

#[test]
fn auth_headers_are_applied() {
    let stub = StubTransport::ok_empty();
    let client = client_with(&stub);

    client
        .get("http://example.com/private")
        .basic_auth("user", Some("pass".to_string()))
        .send()
        .expect("ok");
    client
        .get("http://example.com/private")
        .bearer_auth("tok")
        .send()
        .expect("ok");
    client.get("http://u:p@example.com/private").send().expect("ok");

    let captured = stub.captured();
    assert_eq!(
        captured[0].headers.get("authorization").expect("basic"),
        "Basic dXNlcjpwYXNz"
    );
    assert_eq!(
        captured[1].headers.get("authorization").expect("bearer"),
        "Bearer tok"
    );
    assert_eq!(
        captured[2].headers.get("authorization").expect("userinfo"),
        "Basic dTpw"
    );
    assert_eq!(captured[2].url, "http://example.com/private");
}

#[test]
fn response_metadata_is_populated() {
    let stub = StubTransport::ok_empty();
    let client = client_with(&stub);

    let resp = client.get("http://example.com/meta").send().expect("ok");
    assert!(resp.request_time().is_some());
    assert_eq!(resp.uri().expect("uri").as_str(), "http://example.com/meta");
    let info = resp.request().expect("request info");
    assert_eq!(info.method, http::Method::GET);
}

#[test]
fn structured_output_of_empty_body_is_null() {
    let stub = StubTransport::replying(|| (StatusCode::NO_CONTENT, json_headers(), Vec::new()));
    let client = client_with(&stub);

    let value = client
        .get("http://example.com/empty")
        .output(As::Structured("json".to_string()))
        .send()
        .expect("ok")
        .into_structured()
        .expect("structured");
    assert_eq!(value, serde_json::Value::Null);
}

#[test]
fn async_send_round_trips() {
    let stub = StubTransport::ok_empty();
    let client = client_with(&stub);

    let pending = client.get("http://example.com/async").send_async();
    let resp = pending.wait().expect("ok");
    assert_eq!(resp.status(), StatusCode::OK);

    let (tx, rx) = crossbeam_channel::bounded(1);
    client
        .get("http://example.com/cb")
        .send_with(move |result| {
            let _ = tx.send(result.map(|r| r.status()));
        });
    assert_eq!(
        rx.recv_timeout(std::time::Duration::from_secs(5))
            .expect("callback")
            .expect("ok"),
        StatusCode::OK
    );
}

#[test]
fn stats_track_successes_and_failures() {
    let stub = StubTransport::replying(|| (StatusCode::BAD_GATEWAY, HeaderMap::new(), Vec::new()));
    let client = client_with(&stub);

    let _ = client.get("http://example.com/a").send();
    let _ = client.get("http://example.com/b").allow_any_status().send();
    let snap = client.stats();
    assert_eq!(snap.requests, 2);
    assert_eq!(snap.successes, 1);
    assert_eq!(snap.failures, 1);
}
