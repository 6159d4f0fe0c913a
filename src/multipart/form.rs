//! Multipart/form-data framing and lazy body streaming.
//!
//! Wire format per RFC 2046 §5.1 with RFC 7578 form-data disposition
//! headers: CRLF line endings, `--{boundary}` delimiters and a
//! `--{boundary}--` terminal delimiter.

use std::fmt;
use std::io::Read;

use crate::codec::charset::{self, Charset};
use crate::error;
use crate::multipart::part::Part;
use crate::multipart::source::ContentSource;

/// Namespace tag prefixed to every generated boundary to reduce collision
/// risk with body content.
const BOUNDARY_TAG: &str = "paloma";

/// Generates a boundary token matching `^[A-Za-z0-9_]{1,70}$`, unique per
/// form so concurrent requests never share one.
#[must_use]
pub fn generate_boundary() -> String {
    format!(
        "{BOUNDARY_TAG}_{:016x}{:016x}",
        fastrand::u64(..),
        fastrand::u64(..)
    )
}

/// An ordered multipart/form-data body specification.
pub struct MultipartForm {
    parts: Vec<Part>,
    boundary: String,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        MultipartForm {
            parts: Vec::new(),
            boundary: generate_boundary(),
        }
    }

    /// Replaces the generated boundary. Callers own uniqueness when they
    /// take over.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Adds a data field with the supplied name and text value.
    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(Part::text(name, value))
    }

    /// Adds a customized part.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The Content-Type header value for this body.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Synthesizes the framed segment sequence: per part a boundary
    /// delimiter line, disposition/type/transfer-encoding headers, blank
    /// line, the content source, trailing CRLF; then the closing
    /// boundary line.
    ///
    /// Text content with an explicit content type is encoded in that
    /// type's charset here, so charset failures surface eagerly.
    pub fn into_segments(self) -> crate::Result<Vec<SegmentPiece>> {
        let boundary = self.boundary;
        let mut pieces = Vec::with_capacity(self.parts.len() * 3 + 1);

        for part in self.parts {
            let mut framing = Vec::new();
            framing.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            framing.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"",
                    part.disposition_name()
                )
                .as_bytes(),
            );
            if let Some(file_name) = part.effective_file_name() {
                framing.extend_from_slice(format!("; filename=\"{file_name}\"").as_bytes());
            }
            framing.extend_from_slice(b"\r\n");

            let content_type = part.effective_content_type();
            framing.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());

            let transfer_encoding = if part.source.is_text() { "8bit" } else { "binary" };
            framing.extend_from_slice(
                format!("Content-Transfer-Encoding: {transfer_encoding}\r\n").as_bytes(),
            );
            framing.extend_from_slice(b"\r\n");
            pieces.push(SegmentPiece::Framing(framing));

            // Explicit charsets re-encode text content up front.
            let source = match part.source {
                ContentSource::Text(text) if part.content_type.is_some() => {
                    let cs = charset::extract_charset(&content_type)?;
                    if cs == Charset::Utf8 {
                        ContentSource::Text(text)
                    } else {
                        ContentSource::Bytes(charset::encode_str(&text, cs)?.into())
                    }
                }
                other => other,
            };
            pieces.push(SegmentPiece::Source(source));
            pieces.push(SegmentPiece::Framing(b"\r\n".to_vec()));
        }

        pieces.push(SegmentPiece::Framing(format!("--{boundary}--\r\n").into_bytes()));
        Ok(pieces)
    }
}

impl fmt::Debug for MultipartForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartForm")
            .field("boundary", &self.boundary)
            .field("parts", &self.parts)
            .finish()
    }
}

/// One element of the framed segment sequence.
#[derive(Debug)]
pub enum SegmentPiece {
    /// Framing bytes owned by the builder.
    Framing(Vec<u8>),
    /// Borrowed-in content, streamed rather than copied.
    Source(ContentSource),
}

/// Total byte length of the framed body, if every source's length is
/// statically knowable. Short-circuits to `None` at the first unknown.
#[must_use]
pub fn compute_length(pieces: &[SegmentPiece]) -> Option<u64> {
    let mut total: u64 = 0;
    for piece in pieces {
        match piece {
            SegmentPiece::Framing(bytes) => total += bytes.len() as u64,
            SegmentPiece::Source(source) => total += source.known_length()?,
        }
    }
    Some(total)
}

enum ActivePiece {
    Framing(std::io::Cursor<Vec<u8>>),
    Open(Box<dyn Read + Send>),
}

/// Lazily streams the framed multipart body as one finite, non-restartable
/// byte stream. Sources are opened when reached and dropped (closed) once
/// fully consumed; the whole payload is never buffered.
pub struct MultipartReader {
    pending: std::vec::IntoIter<SegmentPiece>,
    active: Option<ActivePiece>,
}

impl MultipartReader {
    #[must_use]
    pub fn new(pieces: Vec<SegmentPiece>) -> Self {
        MultipartReader {
            pending: pieces.into_iter(),
            active: None,
        }
    }
}

impl Read for MultipartReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            if self.active.is_none() {
                match self.pending.next() {
                    Some(SegmentPiece::Framing(bytes)) => {
                        self.active = Some(ActivePiece::Framing(std::io::Cursor::new(bytes)));
                    }
                    Some(SegmentPiece::Source(source)) => {
                        self.active = Some(ActivePiece::Open(source.open_reader()?));
                    }
                    None => return Ok(0),
                }
            }

            let n = match self.active.as_mut() {
                Some(ActivePiece::Framing(cursor)) => cursor.read(buf)?,
                Some(ActivePiece::Open(reader)) => reader.read(buf)?,
                None => 0,
            };
            if n > 0 {
                return Ok(n);
            }
            // Exhausted; drop to close the underlying source.
            self.active = None;
        }
    }
}

/// Builds the streaming body and its optional length for a form.
pub fn stream_body(form: MultipartForm) -> crate::Result<(MultipartReader, Option<u64>)> {
    if form.is_empty() {
        return Err(error::config("multipart form has no parts"));
    }
    let pieces = form.into_segments()?;
    let len = compute_length(&pieces);
    Ok((MultipartReader::new(pieces), len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn materialize(pieces: Vec<SegmentPiece>) -> Vec<u8> {
        let mut reader = MultipartReader::new(pieces);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).expect("stream");
        out
    }

    #[test]
    fn single_text_part_produces_exact_wire_bytes() {
        let form = MultipartForm::new().with_boundary("B").text("f", "v");
        let body = materialize(form.into_segments().expect("segments"));
        let expected = "--B\r\n\
                        Content-Disposition: form-data; name=\"f\"\r\n\
                        Content-Type: text/plain; charset=UTF-8\r\n\
                        Content-Transfer-Encoding: 8bit\r\n\
                        \r\n\
                        v\r\n\
                        --B--\r\n";
        assert_eq!(String::from_utf8(body).expect("utf8"), expected);
    }

    #[test]
    fn boundary_tokens_are_unique_and_well_formed() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let boundary = generate_boundary();
            assert!(boundary.len() <= 70 && !boundary.is_empty());
            assert!(
                boundary
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_'),
                "bad boundary: {boundary}"
            );
            assert!(seen.insert(boundary), "boundary collision");
        }
    }

    #[test]
    fn computed_length_matches_materialized_body() {
        let form = MultipartForm::new()
            .with_boundary("LenCheck")
            .text("a", "hello")
            .part(Part::bytes("b", vec![1u8, 2, 3, 4]).file_name("b.bin"));
        let pieces = form.into_segments().expect("segments");
        let expected = compute_length(&pieces).expect("known length");
        let body = materialize(pieces);
        assert_eq!(expected, body.len() as u64);
    }

    #[test]
    fn unknown_source_length_short_circuits() {
        let form = MultipartForm::new()
            .text("a", "hello")
            .part(Part::reader("s", std::io::Cursor::new(vec![0u8; 16]), None));
        let pieces = form.into_segments().expect("segments");
        assert_eq!(compute_length(&pieces), None);
        // Still streams fine despite the unknown length.
        let body = materialize(pieces);
        assert!(!body.is_empty());
    }

    #[test]
    fn sized_reader_keeps_length_computable() {
        let form = MultipartForm::new()
            .with_boundary("Sized")
            .part(Part::reader("s", std::io::Cursor::new(vec![7u8; 16]), Some(16)));
        let pieces = form.into_segments().expect("segments");
        let expected = compute_length(&pieces).expect("known");
        assert_eq!(expected, materialize(pieces).len() as u64);
    }

    #[test]
    fn explicit_latin1_content_type_reencodes_text() {
        let form = MultipartForm::new().with_boundary("L").part(
            Part::text("t", "caf\u{e9}").content_type("text/plain; charset=ISO-8859-1"),
        );
        let body = materialize(form.into_segments().expect("segments"));
        let needle = b"\r\n\r\ncaf\xe9\r\n";
        assert!(
            body.windows(needle.len()).any(|w| w == needle),
            "latin-1 bytes not found in body"
        );
    }

    #[test]
    fn invalid_explicit_charset_fails_eagerly() {
        let form = MultipartForm::new()
            .part(Part::text("t", "x").content_type("text/plain; charset=klingon"));
        let err = form.into_segments().expect_err("must fail");
        assert_eq!(err.kind(), crate::error::Kind::UnsupportedCharset);
    }

    #[test]
    fn file_part_infers_name_and_mime_type() {
        let dir = std::env::temp_dir().join(format!("paloma-mp-{}", fastrand::u64(..)));
        std::fs::create_dir_all(&dir).expect("tmp dir");
        let path = dir.join("hello.json");
        std::fs::write(&path, b"{\"k\":1}").expect("write");

        let form = MultipartForm::new().with_boundary("F").part(Part::file("doc", &path));
        let pieces = form.into_segments().expect("segments");
        assert!(compute_length(&pieces).is_some());
        let body = String::from_utf8(materialize(pieces)).expect("utf8");
        assert!(body.contains("filename=\"hello.json\""));
        assert!(body.contains("Content-Type: application/json"));
        assert!(body.contains("Content-Transfer-Encoding: binary"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
