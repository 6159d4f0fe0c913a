//! The transport seam between the pipeline and a concrete HTTP engine.

use std::sync::Arc;

use http::header::COOKIE;
use http::HeaderValue;

use crate::config::{ClientConfig, CookiePolicy};
use crate::error;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::middleware::Handler;

pub mod engine;

pub use engine::UreqTransport;

/// A blocking HTTP engine. Receives a fully prepared request (resolved
/// URL, final headers, encoded body) and produces a raw streaming
/// response. Everything above this trait is engine-agnostic.
pub trait Transport: Send + Sync {
    fn execute(&self, req: Request) -> crate::Result<Response>;
}

/// The terminal pipeline handler: applies the cookie hooks around a
/// transport call and attaches the dispatched-request snapshot to the
/// response.
pub struct Dispatch {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl Dispatch {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Dispatch { transport, config }
    }
}

impl Handler for Dispatch {
    fn call(&self, mut req: Request) -> crate::Result<Response> {
        let url = req
            .resolved_url
            .clone()
            .ok_or_else(|| error::config("request reached the transport without a resolved URL"))?;

        let store = match self.config.cookie_policy {
            CookiePolicy::None => None,
            CookiePolicy::All | CookiePolicy::OriginOnly => self.config.cookie_store.as_deref(),
        };
        if let Some(store) = store {
            if !req.headers.contains_key(COOKIE) {
                if let Some(cookies) = store.cookies_for(&url) {
                    req.headers
                        .insert(COOKIE, HeaderValue::from_str(&cookies).map_err(error::config)?);
                }
            }
        }

        let info = crate::http::request::RequestInfo {
            method: req.method.clone(),
            url: url.clone(),
            headers: req.headers.clone(),
        };

        let mut resp = self.transport.execute(req)?;

        if let Some(store) = store {
            let set_cookie = resp.header_all("set-cookie");
            if !set_cookie.is_empty() {
                let accept = match self.config.cookie_policy {
                    CookiePolicy::OriginOnly => resp
                        .uri()
                        .map_or(true, |u| u.host_str() == url.host_str()),
                    _ => true,
                };
                if accept {
                    store.store(&url, &set_cookie);
                }
            }
        }

        resp.set_request(info);
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode, Version};
    use std::sync::Mutex;
    use url::Url;

    use crate::config::CookieStore;
    use crate::http::response::ResponseBody;

    struct StubTransport;

    impl Transport for StubTransport {
        fn execute(&self, req: Request) -> crate::Result<Response> {
            let mut headers = HeaderMap::new();
            if let Some(cookie) = req.headers.get(COOKIE) {
                headers.insert("x-echo-cookie", cookie.clone());
            }
            headers.append("set-cookie", "sid=abc".parse().expect("header"));
            Ok(Response::new(
                StatusCode::OK,
                headers,
                ResponseBody::Empty,
                Version::HTTP_11,
            ))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        stored: Mutex<Vec<String>>,
    }

    impl CookieStore for MemoryStore {
        fn cookies_for(&self, _url: &Url) -> Option<String> {
            Some("session=42".to_string())
        }

        fn store(&self, _url: &Url, set_cookie: &[String]) {
            self.stored.lock().expect("stored").extend_from_slice(set_cookie);
        }
    }

    fn request() -> Request {
        let mut req = Request::new(Method::GET, "http://example.com/");
        req.resolved_url = Some(Url::parse("http://example.com/").expect("url"));
        req
    }

    #[test]
    fn cookies_flow_through_the_store() {
        let store = Arc::new(MemoryStore::default());
        let config = ClientConfig {
            cookie_policy: CookiePolicy::All,
            cookie_store: Some(Arc::<MemoryStore>::clone(&store)),
            ..ClientConfig::default()
        };
        let dispatch = Dispatch::new(Arc::new(StubTransport), config);
        let resp = dispatch.call(request()).expect("ok");
        assert_eq!(resp.header("x-echo-cookie").as_deref(), Some("session=42"));
        assert_eq!(*store.stored.lock().expect("stored"), vec!["sid=abc"]);
    }

    #[test]
    fn cookie_handling_is_off_by_default() {
        let dispatch = Dispatch::new(Arc::new(StubTransport), ClientConfig::default());
        let resp = dispatch.call(request()).expect("ok");
        assert!(resp.header("x-echo-cookie").is_none());
    }

    #[test]
    fn request_snapshot_is_attached() {
        let dispatch = Dispatch::new(Arc::new(StubTransport), ClientConfig::default());
        let resp = dispatch.call(request()).expect("ok");
        let info = resp.request().expect("info");
        assert_eq!(info.method, Method::GET);
        assert_eq!(info.url.as_str(), "http://example.com/");
    }
}
