//! paloma is a declarative HTTP and WebSocket client.
//!
//! Requests are plain data descriptors run through a composable
//! middleware pipeline: nested-parameter flattening, body and multipart
//! encoding, transparent decompression, output coercion through a
//! content-type keyed codec registry, and an exceptional-status policy.
//! The transport underneath is a pluggable blocking engine; a bundled
//! ureq-backed engine is the default.
//!
//! ```no_run
//! use paloma::{Client, Params};
//!
//! # fn main() -> paloma::Result<()> {
//! let client = Client::new()?;
//! let body = client
//!     .get("https://httpbin.org/get")
//!     .query(Params::new().add("page", 2))
//!     .accept("json")
//!     .send()?
//!     .into_structured()?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```
//!
//! Asynchronous sends run on a lazily started worker pool and complete
//! through a [`PendingResponse`] handle or a callback; no async runtime
//! is involved.

#![warn(rust_2018_idioms)]

use std::sync::OnceLock;

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod multipart;
pub mod prelude;
pub mod transport;
pub mod ws;

pub use client::{Client, ClientBuilder, PendingResponse, RequestBuilder, StatsSnapshot};
pub use config::{ClientConfig, CookiePolicy, CookieStore, RedirectPolicy};
pub use error::{Error, Kind, Result};
pub use http::params::{ParamValue, Params};
pub use http::request::{As, Body, Coerce, Request};
pub use http::response::{Response, ResponseBody};
pub use multipart::{MultipartForm, Part};

static GLOBAL_CLIENT: OnceLock<Client> = OnceLock::new();

/// The process-wide default client, built on first use.
pub fn default_client() -> Result<&'static Client> {
    if let Some(client) = GLOBAL_CLIENT.get() {
        return Ok(client);
    }
    let client = Client::new()?;
    Ok(GLOBAL_CLIENT.get_or_init(|| client))
}

/// Shortcut for a GET on the default client.
pub fn get(url: impl Into<String>) -> Result<Response> {
    default_client()?.get(url).send()
}

/// Shortcut for a POST on the default client.
pub fn post(url: impl Into<String>, body: impl Into<Body>) -> Result<Response> {
    default_client()?.post(url).body(body).send()
}

/// Shortcut for a HEAD on the default client.
pub fn head(url: impl Into<String>) -> Result<Response> {
    default_client()?.head(url).send()
}
