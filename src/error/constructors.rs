use super::types::{Error, Kind};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `Error` for a malformed URL.
pub fn invalid_url<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::InvalidUrl).with(e.into())
}

/// Creates an `Error` for an invalid option combination, raised before any I/O.
pub fn config<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::InvalidConfig).with(e.into())
}

/// Creates an `Error` for an unrecognized explicit charset name.
pub fn charset(name: &str) -> Error {
    Error::new(Kind::UnsupportedCharset).with(format!("unrecognized charset name: {name}"))
}

/// Creates an `Error` for a known content type whose codec is not registered.
pub fn codec_unavailable(content_type: &str) -> Error {
    Error::new(Kind::CodecNotAvailable).with(format!(
        "content type {content_type} requires a codec that is not registered"
    ))
}

/// Creates a `Status` error carrying the full response as context.
pub fn status(response: crate::http::response::Response) -> Error {
    Error::new(Kind::Status(response.status())).with_response(response)
}

/// Creates an `Error` for a connection establishment failure.
pub fn connect<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connect).with(e.into())
}

/// Creates a timeout-classified `Error`, distinct from generic I/O.
pub fn timeout<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Timeout).with(e.into())
}

/// Creates an `Error` for a TLS failure.
pub fn tls<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Tls).with(e.into())
}

/// Creates an `Error` for an I/O failure during transfer.
pub fn io<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Io).with(e.into())
}

/// Creates an `Error` for malformed framing (multipart, compression, websocket).
pub fn protocol<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Protocol).with(e.into())
}

/// Creates an `Error` for a body read/write failure.
pub fn body<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Body).with(e.into())
}

/// Creates an `Error` for a response decode failure.
pub fn decode<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Decode).with(e.into())
}

/// Creates an `Error` for a websocket session failure.
pub fn ws<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Ws).with(e.into())
}

/// Attaches a URL to an existing error for better diagnostics.
pub fn with_url(e: Error, url: url::Url) -> Error {
    e.with_url(url)
}
