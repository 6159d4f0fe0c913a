//! Charset extraction from content-type strings and text encoding.

use crate::error;

/// Character encodings the library can emit directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    UsAscii,
    Latin1,
}

impl Charset {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
            Charset::Latin1 => "ISO-8859-1",
        }
    }

    fn from_name(name: &str) -> Option<Charset> {
        match name.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Charset::Utf8),
            "us-ascii" | "ascii" => Some(Charset::UsAscii),
            "iso-8859-1" | "latin-1" | "latin1" => Some(Charset::Latin1),
            _ => None,
        }
    }
}

/// Extracts the charset parameter from a content-type string.
///
/// The scan is case-insensitive and tolerates quoted values. A missing or
/// empty parameter defaults to UTF-8; an explicit but unrecognized name
/// fails with an `UnsupportedCharset` error.
pub fn extract_charset(content_type: &str) -> crate::Result<Charset> {
    let lower = content_type.to_ascii_lowercase();
    let Some(idx) = lower.find("charset=") else {
        return Ok(Charset::Utf8);
    };
    let raw = content_type[idx + "charset=".len()..]
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"')
        .trim();
    if raw.is_empty() {
        return Ok(Charset::Utf8);
    }
    Charset::from_name(raw).ok_or_else(|| error::charset(raw))
}

/// Encodes text in the given charset.
///
/// # Errors
///
/// Fails with a `Body` error when the text contains characters outside the
/// target charset's repertoire.
pub fn encode_str(text: &str, charset: Charset) -> crate::Result<Vec<u8>> {
    match charset {
        Charset::Utf8 => Ok(text.as_bytes().to_vec()),
        Charset::UsAscii => {
            if text.is_ascii() {
                Ok(text.as_bytes().to_vec())
            } else {
                Err(error::body("text is not representable in US-ASCII"))
            }
        }
        Charset::Latin1 => text
            .chars()
            .map(|c| {
                let code = c as u32;
                if code <= 0xFF {
                    Ok(code as u8)
                } else {
                    Err(error::body(format!(
                        "character {c:?} is not representable in ISO-8859-1"
                    )))
                }
            })
            .collect(),
    }
}

/// Decodes bytes in the given charset to text.
pub fn decode_bytes(bytes: &[u8], charset: Charset) -> crate::Result<String> {
    match charset {
        Charset::Utf8 => String::from_utf8(bytes.to_vec()).map_err(error::decode),
        Charset::UsAscii => {
            if bytes.is_ascii() {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            } else {
                Err(error::decode("body is not valid US-ASCII"))
            }
        }
        Charset::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}
