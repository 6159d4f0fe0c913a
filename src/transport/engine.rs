//! The bundled blocking engine, built on ureq.
//!
//! Redirects, connection pooling and TLS live here; compression and
//! status handling are pipeline concerns, so the agent is configured with
//! both turned off.

use std::io::Read;

use http::header::{CONTENT_LENGTH, EXPECT};
use http::HeaderValue;
use ureq::Agent;

use crate::config::{ClientConfig, HttpVersionPref};
use crate::error;
use crate::http::request::{Body, Request};
use crate::http::response::{Response, ResponseBody};

use super::Transport;

pub struct UreqTransport {
    agent: Agent,
    config: ClientConfig,
}

impl UreqTransport {
    /// Builds the engine from a validated client configuration.
    pub fn new(config: ClientConfig) -> crate::Result<Self> {
        let agent = build_agent(&config, None)?;
        if config.version == HttpVersionPref::Http2 {
            tracing::debug!(
                target: "paloma::transport",
                "HTTP/2 preference noted; engine speaks HTTP/1.1"
            );
        }
        Ok(UreqTransport { agent, config })
    }
}

fn build_agent(
    config: &ClientConfig,
    request_timeout: Option<std::time::Duration>,
) -> crate::Result<Agent> {
    let mut builder = Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(config.redirect_policy.max_redirects())
        // Exhausting the limit surfaces the final 3xx as data.
        .max_redirects_will_error(false)
        .timeout_connect(Some(config.connect_timeout))
        .timeout_global(request_timeout.or(config.request_timeout))
        .user_agent(config.user_agent.as_str());

    if let Some(proxy) = config.proxy.as_deref() {
        let proxy = ureq::Proxy::new(proxy).map_err(error::config)?;
        builder = builder.proxy(Some(proxy));
    }
    if config.tls.danger_accept_invalid_certs || config.tls.client_cert_pem.is_some() {
        let mut tls = ureq::tls::TlsConfig::builder()
            .disable_verification(config.tls.danger_accept_invalid_certs);
        if let (Some(cert_pem), Some(key_pem)) =
            (&config.tls.client_cert_pem, &config.tls.client_key_pem)
        {
            tls = tls.client_cert(Some(client_cert(cert_pem, key_pem)?));
        }
        builder = builder.tls_config(tls.build());
    }

    Ok(builder.build().new_agent())
}

/// Loads the mutual-TLS identity from its PEM pair. The certificate PEM
/// may carry a chain; the first private key in the key PEM is used.
fn client_cert(cert_pem: &[u8], key_pem: &[u8]) -> crate::Result<ureq::tls::ClientCert> {
    use ureq::tls::{parse_pem, ClientCert, PemItem};

    let mut chain = Vec::new();
    for item in parse_pem(cert_pem) {
        if let PemItem::Certificate(cert) = item.map_err(error::tls)? {
            chain.push(cert);
        }
    }
    if chain.is_empty() {
        return Err(error::config("client certificate PEM holds no certificate"));
    }
    let key = parse_pem(key_pem)
        .find_map(|item| match item {
            Ok(PemItem::PrivateKey(key)) => Some(Ok(key)),
            Err(e) => Some(Err(e)),
            Ok(_) => None,
        })
        .ok_or_else(|| error::config("client key PEM holds no private key"))?
        .map_err(error::tls)?;
    Ok(ClientCert::new_with_certs(&chain, key))
}

impl Transport for UreqTransport {
    fn execute(&self, req: Request) -> crate::Result<Response> {
        let url = req
            .resolved_url
            .ok_or_else(|| error::config("request reached the transport without a resolved URL"))?;

        // Per-request timeouts need their own agent; the shared one keeps
        // the pooled connections for the common case.
        let agent;
        let agent = match req.timeout {
            Some(timeout) => {
                agent = build_agent(&self.config, Some(timeout))?;
                &agent
            }
            None => &self.agent,
        };

        let mut builder = http::Request::builder()
            .method(req.method.clone())
            .uri(url.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(req.headers.clone());
            if req.expect_continue {
                headers.insert(EXPECT, HeaderValue::from_static("100-continue"));
            }
            if let Some(len) = req.body.as_ref().and_then(Body::known_length) {
                if !headers.contains_key(CONTENT_LENGTH) {
                    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
                }
            }
        }

        if req.prefer_http2 {
            tracing::debug!(
                target: "paloma::transport",
                url = %url,
                "HTTP/2 requested; engine speaks HTTP/1.1"
            );
        }

        tracing::debug!(
            target: "paloma::transport",
            method = %req.method,
            url = %url,
            "dispatching request"
        );

        let result = match req.body {
            None => agent.run(builder.body(ureq::SendBody::none()).map_err(error::config)?),
            Some(Body::Bytes(bytes)) => {
                agent.run(builder.body(bytes.to_vec()).map_err(error::config)?)
            }
            Some(Body::Text(text)) => agent.run(builder.body(text).map_err(error::config)?),
            Some(Body::Reader { reader, .. }) => {
                let body = ureq::SendBody::from_owned_reader(SyncReader::new(reader));
                agent.run(builder.body(body).map_err(error::config)?)
            }
            Some(Body::File(path)) => {
                let file = std::fs::File::open(&path).map_err(error::body)?;
                agent.run(builder.body(file).map_err(error::config)?)
            }
            Some(Body::Structured(_)) => {
                return Err(error::config(
                    "structured body was not encoded before dispatch",
                ));
            }
        };

        let resp = result.map_err(|e| classify(e, &url))?;
        let (parts, body) = resp.into_parts();
        let reader: Box<dyn Read + Send> = Box::new(body.into_reader());
        let mut out = Response::new(
            parts.status,
            parts.headers,
            ResponseBody::Stream(reader),
            parts.version,
        );
        out.set_uri(url);
        Ok(out)
    }
}

/// Adapts a send-only reader to the engine's body reader bounds. The
/// body is only ever read from one thread; the lock is uncontended.
struct SyncReader {
    inner: std::sync::Mutex<Box<dyn Read + Send>>,
}

impl SyncReader {
    fn new(inner: Box<dyn Read + Send>) -> Self {
        SyncReader {
            inner: std::sync::Mutex::new(inner),
        }
    }
}

impl Read for SyncReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .read(buf)
    }
}


/// Maps engine failures onto the library's error kinds.
fn classify(e: ureq::Error, url: &url::Url) -> crate::Error {
    let err = match &e {
        ureq::Error::Timeout(_) => error::timeout(e),
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => error::connect(e),
        ureq::Error::Io(io)
            if matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ) =>
        {
            error::timeout(e)
        }
        _ => error::io(e),
    };
    error::with_url(err, url.clone())
}
