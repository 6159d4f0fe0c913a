//! The client: configuration, the fluent request builder, and sync and
//! async dispatch through the middleware pipeline.

use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use http::Method;

use crate::codec::{Codec, CodecRegistry};
use crate::config::{ClientConfig, CookiePolicy, CookieStore, HttpVersionPref, RedirectPolicy};
use crate::error;
use crate::http::params::Params;
use crate::http::request::{As, BasicCredentials, Body, Coerce, Request};
use crate::http::response::Response;
use crate::http::url::ArrayStyle;
use crate::middleware::Pipeline;
use crate::multipart::MultipartForm;
use crate::transport::{Dispatch, Transport, UreqTransport};

pub mod executor;
pub mod stats;

pub use executor::PendingResponse;
pub use stats::{Stats, StatsSnapshot};

use executor::Executor;

struct ClientRef {
    pipeline: Pipeline,
    dispatch: Dispatch,
    executor: Executor,
    stats: Stats,
}

/// A configured HTTP client.
///
/// Cheap to clone; every clone shares the pipeline, transport, worker
/// pool and counters.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientRef>,
}

impl Client {
    /// A client with default configuration and the bundled engine.
    pub fn new() -> crate::Result<Client> {
        Client::builder().build()
    }

    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// A throwaway client for a one-shot exchange with its own
    /// configuration, when the shared instance's settings do not fit.
    pub fn with_config(config: ClientConfig) -> crate::Result<Client> {
        Client::builder().config(config).build()
    }

    /// Starts a request with an explicit method.
    #[must_use]
    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            request: Ok(Request::new(method, url)),
        }
    }

    /// Starts a request from a method name, case-insensitively. Custom
    /// methods are allowed; malformed names fail at send time.
    #[must_use]
    pub fn request_named(&self, method: &str, url: impl Into<String>) -> RequestBuilder {
        let parsed = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(error::config);
        RequestBuilder {
            client: self.clone(),
            request: parsed.map(|m| Request::new(m, url)),
        }
    }

    #[must_use]
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    #[must_use]
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    #[must_use]
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    #[must_use]
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    #[must_use]
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    #[must_use]
    pub fn head(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// Sends a prepared request through the pipeline, blocking until the
    /// exchange completes.
    pub fn send(&self, req: Request) -> crate::Result<Response> {
        let result = self.inner.pipeline.execute(req, &self.inner.dispatch);
        match &result {
            Ok(resp) => self.inner.stats.record(true, resp.request_time()),
            Err(err) => self
                .inner
                .stats
                .record(false, err.response().and_then(Response::request_time)),
        }
        result
    }

    /// Sends on the worker pool, returning a completion handle.
    pub fn send_async(&self, req: Request) -> PendingResponse {
        let (tx, pending) = PendingResponse::channel();
        let client = self.clone();
        self.inner.executor.submit(Box::new(move || {
            let _ = tx.send(client.send(req));
        }));
        pending
    }

    /// Sends on the worker pool and hands the outcome to `callback`.
    pub fn send_with<F>(&self, req: Request, callback: F)
    where
        F: FnOnce(crate::Result<Response>) + Send + 'static,
    {
        let client = self.clone();
        self.inner.executor.submit(Box::new(move || {
            callback(client.send(req));
        }));
    }

    /// Counters for every exchange this client has run.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("pipeline", &self.inner.pipeline)
            .field("executor", &self.inner.executor)
            .finish()
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
    registry: CodecRegistry,
    transport: Option<Arc<dyn Transport>>,
    pipeline: Option<Pipeline>,
    workers: Option<usize>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        ClientBuilder {
            config: ClientConfig::default(),
            registry: CodecRegistry::builtin(),
            transport: None,
            pipeline: None,
            workers: None,
        }
    }

    /// Replaces the whole configuration at once.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn redirect_policy(mut self, policy: RedirectPolicy) -> Self {
        self.config.redirect_policy = policy;
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn http_version(mut self, version: HttpVersionPref) -> Self {
        self.config.version = version;
        self
    }

    #[must_use]
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.tls.danger_accept_invalid_certs = accept;
        self
    }

    #[must_use]
    pub fn cookie_store(mut self, policy: CookiePolicy, store: Arc<dyn CookieStore>) -> Self {
        self.config.cookie_policy = policy;
        self.config.cookie_store = Some(store);
        self
    }

    /// Registers an additional structured codec before the client is
    /// built.
    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn Codec>, aliases: &[&str]) -> Self {
        self.registry.register(codec, aliases);
        self
    }

    /// Swaps in a custom transport engine. Used by tests and by callers
    /// embedding their own engine.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the standard middleware stack with a custom one.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Worker threads for asynchronous sends.
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn build(self) -> crate::Result<Client> {
        self.config.validate()?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(UreqTransport::new(self.config.clone())?),
        };
        let workers = self.workers.unwrap_or_else(Executor::default_workers);
        let pipeline = self
            .pipeline
            .unwrap_or_else(|| Pipeline::standard(self.registry));
        Ok(Client {
            inner: Arc::new(ClientRef {
                pipeline,
                dispatch: Dispatch::new(transport, self.config),
                executor: Executor::new(workers),
                stats: Stats::default(),
            }),
        })
    }
}

/// Fluent builder for a single request. Terminates with [`send`],
/// [`send_async`] or [`send_with`].
///
/// [`send`]: RequestBuilder::send
/// [`send_async`]: RequestBuilder::send_async
/// [`send_with`]: RequestBuilder::send_with
#[must_use = "a request builder does nothing until sent"]
pub struct RequestBuilder {
    client: Client,
    request: crate::Result<Request>,
}

impl RequestBuilder {
    fn map(mut self, f: impl FnOnce(&mut Request)) -> Self {
        if let Ok(req) = self.request.as_mut() {
            f(req);
        }
        self
    }

    pub fn header(self, name: &str, value: &str) -> Self {
        let parsed = name
            .parse::<HeaderName>()
            .map_err(error::config)
            .and_then(|n| {
                value
                    .parse::<HeaderValue>()
                    .map_err(error::config)
                    .map(|v| (n, v))
            });
        match parsed {
            Ok((name, value)) => self.map(|req| {
                req.headers.append(name, value);
            }),
            Err(e) => RequestBuilder {
                client: self.client,
                request: self.request.and(Err(e)),
            },
        }
    }

    pub fn query(self, params: Params) -> Self {
        self.map(|req| req.query_params = Some(params))
    }

    pub fn form(self, params: Params) -> Self {
        self.map(|req| req.form_params = Some(params))
    }

    /// Sends `value` as the structured body, JSON-encoded unless a
    /// different content type selects another codec.
    pub fn json(self, value: serde_json::Value) -> Self {
        self.map(|req| req.body = Some(Body::Structured(value)))
    }

    pub fn body(self, body: impl Into<Body>) -> Self {
        self.map(|req| req.body = Some(body.into()))
    }

    pub fn multipart(self, form: MultipartForm) -> Self {
        self.map(|req| req.multipart = Some(form))
    }

    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.map(|req| req.content_type = Some(content_type))
    }

    /// Accept header, full media type or shorthand like `"json"`.
    pub fn accept(self, accept: impl Into<String>) -> Self {
        let accept = accept.into();
        self.map(|req| req.accept = Some(accept))
    }

    pub fn basic_auth(self, username: impl Into<String>, password: Option<String>) -> Self {
        let credentials = BasicCredentials {
            username: username.into(),
            password,
        };
        self.map(|req| req.basic_auth = Some(credentials))
    }

    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.map(|req| req.oauth_token = Some(token))
    }

    pub fn timeout(self, timeout: std::time::Duration) -> Self {
        self.map(|req| req.timeout = Some(timeout))
    }

    pub fn array_style(self, style: ArrayStyle) -> Self {
        self.map(|req| req.array_style = style)
    }

    /// Desired response body representation.
    pub fn output(self, as_repr: As) -> Self {
        self.map(|req| req.as_repr = as_repr)
    }

    /// Which status classes get body coercion.
    pub fn coerce(self, coerce: Coerce) -> Self {
        self.map(|req| req.coerce = coerce)
    }

    /// Disables the exceptional-status error; every response comes back
    /// as data.
    pub fn allow_any_status(self) -> Self {
        self.map(|req| req.status_error = false)
    }

    pub fn no_decompress(self) -> Self {
        self.map(|req| req.decompress_body = false)
    }

    pub fn flatten_nested_keys(self, flatten: bool) -> Self {
        self.map(|req| req.flatten_nested_keys = Some(flatten))
    }

    pub fn ignore_nested_query(self) -> Self {
        self.map(|req| req.ignore_nested_query = true)
    }

    pub fn flatten_nested_form(self, flatten: bool) -> Self {
        self.map(|req| req.flatten_nested_form = Some(flatten))
    }

    pub fn expect_continue(self) -> Self {
        self.map(|req| req.expect_continue = true)
    }

    /// Consumes the builder, returning the underlying request.
    pub fn build(self) -> crate::Result<Request> {
        let req = self.request?;
        req.validate()?;
        Ok(req)
    }

    pub fn send(self) -> crate::Result<Response> {
        let client = self.client.clone();
        client.send(self.request?)
    }

    pub fn send_async(self) -> PendingResponse {
        match self.request {
            Ok(req) => self.client.send_async(req),
            Err(e) => {
                let (tx, pending) = PendingResponse::channel();
                let _ = tx.send(Err(e));
                pending
            }
        }
    }

    pub fn send_with<F>(self, callback: F)
    where
        F: FnOnce(crate::Result<Response>) + Send + 'static,
    {
        match self.request {
            Ok(req) => self.client.send_with(req, callback),
            Err(e) => callback(Err(e)),
        }
    }
}
