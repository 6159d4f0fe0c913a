//! Declarative HTTP types: the request/response descriptors, ordered
//! parameters, and the URL/query codec.

pub mod params;
pub mod request;
pub mod response;
pub mod url;

pub use params::{ParamValue, Params};
pub use request::{As, Body, Coerce, Request};
pub use response::{Response, ResponseBody};
pub use url::{encode_query_string, flatten_nested, parse_query_string, parse_url, ArrayStyle, UrlParts};
