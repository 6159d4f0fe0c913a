use std::error::Error as StdError;
use std::fmt;

use http::StatusCode;

use crate::http::response::Response;

/// A Result alias where the Err case is `paloma::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents every failure this library can surface.
pub struct Error {
    pub(crate) inner: Box<Inner>,
}

pub(crate) struct Inner {
    pub(crate) kind: Kind,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
    pub(crate) url: Option<url::Url>,
    pub(crate) response: Option<Box<Response>>,
}

/// Error classification.
///
/// Validation kinds (`InvalidUrl`, `InvalidConfig`, `UnsupportedCharset`,
/// `CodecNotAvailable`) are raised before any I/O. Transport kinds
/// (`Connect`, `Timeout`, `Tls`, `Io`) originate below the middleware
/// pipeline and propagate through it unchanged. `Status` carries the full
/// response as structured context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Malformed URL input.
    InvalidUrl,
    /// Mutually exclusive or otherwise invalid option combinations.
    InvalidConfig,
    /// Explicit charset name not recognized.
    UnsupportedCharset,
    /// Content type requires an optional codec that is not registered.
    CodecNotAvailable,
    /// Response status outside the unexceptional set.
    Status(StatusCode),
    /// Connection establishment failure.
    Connect,
    /// Connect or request timeout.
    Timeout,
    /// TLS negotiation failure.
    Tls,
    /// I/O failure during transfer.
    Io,
    /// Malformed multipart/compressed/WebSocket framing.
    Protocol,
    /// Request or response body error.
    Body,
    /// Error decoding a response body.
    Decode,
    /// WebSocket session error.
    Ws,
}

impl Error {
    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                url: None,
                response: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub(crate) fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub(crate) fn with_url(mut self, url: url::Url) -> Self {
        self.inner.url = Some(url);
        self
    }

    #[must_use]
    pub(crate) fn with_response(mut self, response: Response) -> Self {
        self.inner.response = Some(Box::new(response));
        self
    }

    /// The classification of this error.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// The URL associated with this error, if any.
    #[must_use]
    pub fn url(&self) -> Option<&url::Url> {
        self.inner.url.as_ref()
    }

    /// The status code, when this is a `Status` error.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self.inner.kind {
            Kind::Status(code) => Some(code),
            _ => None,
        }
    }

    /// The full response carried by a `Status` error.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.inner.response.as_deref()
    }

    /// Consumes the error, returning the carried response if present.
    #[must_use]
    pub fn into_response(self) -> Option<Response> {
        self.inner.response.map(|b| *b)
    }

    /// True when the failure was a connect or request timeout, letting
    /// retry logic layered on top distinguish it from generic I/O.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.inner.kind == Kind::Timeout
    }

    /// True for any transport-level failure.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self.inner.kind,
            Kind::Connect | Kind::Timeout | Kind::Tls | Kind::Io
        )
    }

    /// True when raised by the exceptional-status stage.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self.inner.kind, Kind::Status(_))
    }

    pub(crate) fn take_response(&mut self) -> Option<Response> {
        self.inner.response.take().map(|b| *b)
    }

    pub(crate) fn put_response(&mut self, response: Response) {
        self.inner.response = Some(Box::new(response));
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("paloma::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref url) = self.inner.url {
            f.field("url", url);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::InvalidUrl => f.write_str("invalid URL"),
            Kind::InvalidConfig => f.write_str("invalid request or client configuration"),
            Kind::UnsupportedCharset => f.write_str("unsupported charset"),
            Kind::CodecNotAvailable => f.write_str("no codec registered for content type"),
            Kind::Status(code) => {
                let prefix = if code.is_client_error() {
                    "HTTP status client error"
                } else if code.is_server_error() {
                    "HTTP status server error"
                } else {
                    "HTTP status error"
                };
                write!(f, "{prefix} ({code})")
            }
            Kind::Connect => f.write_str("connection error"),
            Kind::Timeout => f.write_str("request timeout"),
            Kind::Tls => f.write_str("TLS error"),
            Kind::Io => f.write_str("I/O error during transfer"),
            Kind::Protocol => f.write_str("protocol framing error"),
            Kind::Body => f.write_str("request or response body error"),
            Kind::Decode => f.write_str("error decoding response body"),
            Kind::Ws => f.write_str("websocket error"),
        }?;
        if let Some(ref url) = self.inner.url {
            write!(f, " for url ({url})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
