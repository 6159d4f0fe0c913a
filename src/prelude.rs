//! Convenience re-exports for callers.
//!
//! ```
//! use paloma::prelude::*;
//! ```

pub use crate::client::{Client, ClientBuilder, PendingResponse, RequestBuilder};
pub use crate::codec::{Codec, CodecRegistry};
pub use crate::config::{ClientConfig, CookiePolicy, CookieStore, RedirectPolicy};
pub use crate::error::{Error, Kind, Result};
pub use crate::http::params::{ParamValue, Params};
pub use crate::http::request::{As, Body, Coerce, Request};
pub use crate::http::response::{Response, ResponseBody};
pub use crate::http::url::ArrayStyle;
pub use crate::multipart::{ContentSource, MultipartForm, Part};
pub use crate::ws::{FragmentAssembler, WsConnection, WsListener, WsMessage, WsSender, WsState};
