//! A single named part of a multipart/form-data body.

use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use bytes::Bytes;

use super::source::ContentSource;

/// One named unit of a multipart form.
pub struct Part {
    pub(crate) name: String,
    pub(crate) source: ContentSource,
    pub(crate) file_name: Option<String>,
    pub(crate) content_type: Option<String>,
    /// Overrides `name` in the Content-Disposition header when set.
    pub(crate) part_name: Option<String>,
}

impl Part {
    /// Makes a text part.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Part {
        Part::new(name, ContentSource::Text(value.into()))
    }

    /// Makes a part from arbitrary bytes.
    pub fn bytes(name: impl Into<String>, value: impl Into<Bytes>) -> Part {
        Part::new(name, ContentSource::Bytes(value.into()))
    }

    /// Makes a part streaming a file. The file name defaults to the
    /// path's final component and the content type is MIME-guessed.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Part {
        Part::new(name, ContentSource::File(path.into()))
    }

    /// Makes a part from an arbitrary stream. Pass the length when it is
    /// known so the whole body's content length stays computable.
    pub fn reader(
        name: impl Into<String>,
        reader: impl Read + Send + 'static,
        len: Option<u64>,
    ) -> Part {
        Part::new(
            name,
            ContentSource::Reader {
                reader: Box::new(reader),
                len,
            },
        )
    }

    fn new(name: impl Into<String>, source: ContentSource) -> Part {
        Part {
            name: name.into(),
            source,
            file_name: None,
            content_type: None,
            part_name: None,
        }
    }

    /// Sets the filename, builder style.
    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Part {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets an explicit content type, overriding source-based defaults.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Part {
        self.content_type = Some(content_type.into());
        self
    }

    /// Overrides the name used in the Content-Disposition header.
    #[must_use]
    pub fn part_name(mut self, part_name: impl Into<String>) -> Part {
        self.part_name = Some(part_name.into());
        self
    }

    /// The name emitted in this part's Content-Disposition header.
    #[must_use]
    pub fn disposition_name(&self) -> &str {
        self.part_name.as_deref().unwrap_or(&self.name)
    }

    /// The filename emitted, explicit or inferred from a file source.
    #[must_use]
    pub fn effective_file_name(&self) -> Option<String> {
        self.file_name
            .clone()
            .or_else(|| self.source.inferred_file_name())
    }

    /// The content type emitted, explicit or source-derived.
    #[must_use]
    pub fn effective_content_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| self.source.default_content_type())
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish()
    }
}
