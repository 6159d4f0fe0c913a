//! Transparent response decompression.

use std::io::{Cursor, Read};

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH};

use super::{Handler, Middleware};
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBody};

const DEFAULT_LOOKAHEAD: usize = 512;

/// Unwraps gzip and deflate content encodings around the body stream.
///
/// Deflate bodies are probed: some servers send a zlib-wrapped stream and
/// some send raw deflate, so the first bytes are trial-decoded as zlib
/// before committing to a decoder. After unwrapping, the Content-Encoding
/// and Content-Length headers are dropped and the original encoding is
/// recorded on the response.
pub struct Decompress {
    lookahead: usize,
}

impl Default for Decompress {
    fn default() -> Self {
        Decompress {
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

impl Decompress {
    /// Overrides the number of bytes buffered for the deflate probe.
    #[must_use]
    pub fn with_lookahead(lookahead: usize) -> Self {
        Decompress { lookahead }
    }
}

impl Middleware for Decompress {
    fn name(&self) -> &'static str {
        "decompress"
    }

    fn handle(&self, req: Request, next: &dyn Handler) -> crate::Result<Response> {
        let enabled = req.decompress_body;
        let mut resp = next.call(req)?;
        if !enabled {
            return Ok(resp);
        }

        let encoding = resp
            .header(CONTENT_ENCODING.as_str())
            .map(|e| e.trim().to_ascii_lowercase());
        let encoding = match encoding.as_deref() {
            Some("gzip" | "x-gzip") => Encoding::Gzip,
            Some("deflate") => Encoding::Deflate,
            _ => return Ok(resp),
        };
        if resp.body.is_empty_repr() {
            return Ok(resp);
        }

        let raw: Box<dyn Read + Send> = match std::mem::replace(&mut resp.body, ResponseBody::Empty)
        {
            ResponseBody::Stream(reader) => reader,
            other => Box::new(Cursor::new(other.into_bytes()?.to_vec())),
        };
        resp.body = ResponseBody::Stream(self.wrap(encoding, raw)?);
        resp.headers_mut().remove(CONTENT_ENCODING);
        resp.headers_mut().remove(CONTENT_LENGTH);
        resp.set_orig_content_encoding(encoding.name().to_string());
        tracing::debug!(
            target: "paloma::middleware",
            encoding = encoding.name(),
            "decompressing response body"
        );
        Ok(resp)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Gzip,
    Deflate,
}

impl Encoding {
    fn name(self) -> &'static str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Deflate => "deflate",
        }
    }
}

impl Decompress {
    fn wrap(
        &self,
        encoding: Encoding,
        mut raw: Box<dyn Read + Send>,
    ) -> crate::Result<Box<dyn Read + Send>> {
        match encoding {
            Encoding::Gzip => Ok(Box::new(GzDecoder::new(raw))),
            Encoding::Deflate => {
                let mut head = vec![0u8; self.lookahead];
                let mut filled = 0;
                while filled < head.len() {
                    let n = raw.read(&mut head[filled..]).map_err(crate::error::body)?;
                    if n == 0 {
                        break;
                    }
                    filled += n;
                }
                head.truncate(filled);

                let zlib = looks_like_zlib(&head);
                let chained = Cursor::new(head).chain(raw);
                if zlib {
                    Ok(Box::new(ZlibDecoder::new(chained)))
                } else {
                    Ok(Box::new(DeflateDecoder::new(chained)))
                }
            }
        }
    }
}

/// Trial-decodes the buffered prefix as zlib. A clean run or a truncated
/// stream means zlib framing; a corrupt-data error means raw deflate.
fn looks_like_zlib(head: &[u8]) -> bool {
    let mut probe = ZlibDecoder::new(Cursor::new(head));
    let mut sink = [0u8; 256];
    loop {
        match probe.read(&mut sink) {
            Ok(0) => return true,
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return true,
            Err(_) => return false,
        }
    }
}
