//! Content sources for multipart segments.

use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use bytes::Bytes;

/// The closed set of content origins a multipart part can stream from.
///
/// Framing bytes are owned by the builder; sources are streamed, not
/// copied, wherever the variant permits it. `File` sources are opened
/// lazily when the surrounding body stream reaches them. `Reader` sources
/// are consumed destructively and must not be reused across requests.
pub enum ContentSource {
    /// Inline text; encoded per the part's resolved charset.
    Text(String),
    /// Inline bytes.
    Bytes(Bytes),
    /// File contents, opened lazily and closed after full consumption.
    File(PathBuf),
    /// An arbitrary stream with an optionally known length.
    Reader {
        reader: Box<dyn Read + Send>,
        len: Option<u64>,
    },
}

impl ContentSource {
    /// Statically known byte length; `None` the moment the length cannot
    /// be determined without consuming the source.
    #[must_use]
    pub fn known_length(&self) -> Option<u64> {
        match self {
            ContentSource::Text(t) => Some(t.len() as u64),
            ContentSource::Bytes(b) => Some(b.len() as u64),
            ContentSource::File(path) => std::fs::metadata(path).ok().map(|m| m.len()),
            ContentSource::Reader { len, .. } => *len,
        }
    }

    /// Opens a reader over this source, consuming it.
    pub fn open_reader(self) -> std::io::Result<Box<dyn Read + Send>> {
        match self {
            ContentSource::Text(t) => Ok(Box::new(Cursor::new(t.into_bytes()))),
            ContentSource::Bytes(b) => Ok(Box::new(Cursor::new(b))),
            ContentSource::File(path) => Ok(Box::new(File::open(path)?)),
            ContentSource::Reader { reader, .. } => Ok(reader),
        }
    }

    /// True for sources carrying text, which frame as 8bit transfer
    /// encoding rather than binary.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, ContentSource::Text(_))
    }

    /// File name inferred from file-like sources.
    #[must_use]
    pub fn inferred_file_name(&self) -> Option<String> {
        match self {
            ContentSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            _ => None,
        }
    }

    /// Best-effort default content type for this source: text/plain with
    /// UTF-8 charset for text, MIME-guess for files, octet-stream
    /// otherwise.
    #[must_use]
    pub fn default_content_type(&self) -> String {
        match self {
            ContentSource::Text(_) => "text/plain; charset=UTF-8".to_string(),
            ContentSource::File(path) => mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            ContentSource::Bytes(_) | ContentSource::Reader { .. } => {
                "application/octet-stream".to_string()
            }
        }
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSource::Text(t) => f.debug_tuple("Text").field(&format!("{} chars", t.len())).finish(),
            ContentSource::Bytes(b) => f.debug_tuple("Bytes").field(&format!("{} bytes", b.len())).finish(),
            ContentSource::File(path) => f.debug_tuple("File").field(path).finish(),
            ContentSource::Reader { len, .. } => f.debug_tuple("Reader").field(len).finish(),
        }
    }
}

impl From<&str> for ContentSource {
    fn from(value: &str) -> Self {
        ContentSource::Text(value.to_string())
    }
}

impl From<String> for ContentSource {
    fn from(value: String) -> Self {
        ContentSource::Text(value)
    }
}

impl From<Vec<u8>> for ContentSource {
    fn from(value: Vec<u8>) -> Self {
        ContentSource::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for ContentSource {
    fn from(value: Bytes) -> Self {
        ContentSource::Bytes(value)
    }
}

impl From<PathBuf> for ContentSource {
    fn from(value: PathBuf) -> Self {
        ContentSource::File(value)
    }
}
