//! URL parsing and query-string encoding.

use url::Url;

use crate::error;
use crate::http::params::{ParamValue, Params};

/// Decomposed URL components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
    pub user_info: Option<String>,
}

/// Parse and decompose a URL string.
///
/// # Errors
///
/// Returns an `InvalidUrl` error when the input is malformed or lacks a
/// host component.
pub fn parse_url(url_str: &str) -> Result<UrlParts, crate::Error> {
    let url = Url::parse(url_str).map_err(error::invalid_url)?;
    let host = url
        .host_str()
        .ok_or_else(|| error::invalid_url(format!("URL has no host: {url_str}")))?
        .to_string();

    let user_info = if url.username().is_empty() {
        None
    } else {
        let mut info = url.username().to_string();
        if let Some(password) = url.password() {
            info.push(':');
            info.push_str(password);
        }
        Some(info)
    };

    Ok(UrlParts {
        scheme: url.scheme().to_string(),
        host,
        port: url.port(),
        path: url.path().to_string(),
        query: url.query().map(str::to_string),
        user_info,
    })
}

/// How sequence values expand in a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayStyle {
    /// `k=v1&k=v2`
    #[default]
    Repeat,
    /// `k[]=v1&k[]=v2`
    Bracketed,
    /// `k[0]=v1&k[1]=v2`
    Indexed,
}

/// Encode an ordered parameter mapping into a query string.
///
/// Keys and values are percent-encoded as UTF-8; space encodes to `+` in
/// query context. Sequence values expand per `style`; nested mappings must
/// already have been flattened (see [`flatten_nested`]) or they serialize
/// as one opaque JSON value.
#[must_use]
pub fn encode_query_string(params: &Params, style: ArrayStyle) -> String {
    let mut out = String::new();
    for (key, value) in params.iter() {
        match value {
            ParamValue::Seq(items) => {
                for (idx, item) in items.iter().enumerate() {
                    let expanded_key = match style {
                        ArrayStyle::Repeat => key.clone(),
                        ArrayStyle::Bracketed => format!("{key}[]"),
                        ArrayStyle::Indexed => format!("{key}[{idx}]"),
                    };
                    push_pair(&mut out, &expanded_key, &item.opaque_text());
                }
            }
            other => push_pair(&mut out, key, &other.opaque_text()),
        }
    }
    out
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    if !out.is_empty() {
        out.push('&');
    }
    // Keys keep `[`/`]` literal so flattened nested keys stay readable
    // (a[b][c]=5); servers accept either form.
    push_encoded(out, key, true);
    out.push('=');
    push_encoded(out, value, false);
}

fn push_encoded(out: &mut String, text: &str, allow_brackets: bool) {
    for &byte in text.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b'[' | b']' if allow_brackets => out.push(byte as char),
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from_digit(u32::from(byte >> 4), 16).unwrap_or('0').to_ascii_uppercase());
                out.push(char::from_digit(u32::from(byte & 0x0f), 16).unwrap_or('0').to_ascii_uppercase());
            }
        }
    }
}

/// Parse a query string back into ordered key/value pairs.
#[must_use]
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Recursively flatten nested mappings, joining keys with `parent[child]`
/// syntax. Must be invoked explicitly by the caller owning the flattening
/// policy; the codecs above never flatten implicitly.
#[must_use]
pub fn flatten_nested(params: &Params) -> Params {
    let mut flat = Params::new();
    for (key, value) in params.iter() {
        flatten_into(&mut flat, key, value);
    }
    flat
}

fn flatten_into(flat: &mut Params, key: &str, value: &ParamValue) {
    match value {
        ParamValue::Nested(inner) => {
            for (child, child_value) in inner.iter() {
                flatten_into(flat, &format!("{key}[{child}]"), child_value);
            }
        }
        other => flat.push(key, other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_url_decomposes_components() {
        let parts = parse_url("https://user:pw@example.com:8443/a/b?x=1").expect("parse");
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.host, "example.com");
        assert_eq!(parts.port, Some(8443));
        assert_eq!(parts.path, "/a/b");
        assert_eq!(parts.query.as_deref(), Some("x=1"));
        assert_eq!(parts.user_info.as_deref(), Some("user:pw"));
    }

    #[test]
    fn parse_url_rejects_malformed_input() {
        let err = parse_url("http://").expect_err("must fail");
        assert_eq!(err.kind(), crate::error::Kind::InvalidUrl);
        let err = parse_url("not a url").expect_err("must fail");
        assert_eq!(err.kind(), crate::error::Kind::InvalidUrl);
    }

    #[test]
    fn array_styles_expand_sequences() {
        let params = Params::new().add("k", vec!["v1", "v2"]);
        assert_eq!(encode_query_string(&params, ArrayStyle::Repeat), "k=v1&k=v2");
        assert_eq!(
            encode_query_string(&params, ArrayStyle::Bracketed),
            "k[]=v1&k[]=v2"
        );
        assert_eq!(
            encode_query_string(&params, ArrayStyle::Indexed),
            "k[0]=v1&k[1]=v2"
        );
    }

    #[test]
    fn space_encodes_to_plus_in_query_context() {
        let params = Params::new().add("q", "a b");
        assert_eq!(encode_query_string(&params, ArrayStyle::Repeat), "q=a+b");
    }

    #[test]
    fn round_trip_preserves_pairs() {
        let params = Params::new().add("a", "1").add("b", "two words").add("c", 3);
        let encoded = encode_query_string(&params, ArrayStyle::Repeat);
        let decoded = parse_query_string(&encoded);
        assert_eq!(
            decoded,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "two words".to_string()),
                ("c".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn flatten_joins_keys_with_bracket_syntax() {
        let params = Params::new().add("a", Params::new().add("b", Params::new().add("c", 5)));
        let flat = flatten_nested(&params);
        assert_eq!(encode_query_string(&flat, ArrayStyle::Repeat), "a[b][c]=5");
        let decoded = parse_query_string(&encode_query_string(&flat, ArrayStyle::Repeat));
        assert_eq!(decoded, vec![("a[b][c]".to_string(), "5".to_string())]);
    }
}
