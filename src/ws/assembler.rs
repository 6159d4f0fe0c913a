//! Reassembly of fragmented data messages.

use bytes::{Bytes, BytesMut};

use crate::error;

use super::event::WsMessage;

enum Partial {
    Text(String),
    Binary(BytesMut),
}

/// Accumulates message fragments until a final fragment completes them.
///
/// Control frames may interleave with a fragmented message; data
/// fragments of a second message may not. Feeding a continuation with no
/// message in progress, or a fresh first fragment while one is, is a
/// protocol error.
#[derive(Default)]
pub struct FragmentAssembler {
    partial: Option<Partial>,
}

impl FragmentAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a message is partially assembled.
    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.partial.is_some()
    }

    /// Feeds a text fragment. `first` marks the opening fragment of a
    /// message, `last` the closing one; a whole message is both.
    pub fn push_text(
        &mut self,
        data: &str,
        first: bool,
        last: bool,
    ) -> crate::Result<Option<WsMessage>> {
        match (first, self.partial.take()) {
            (true, Some(_)) => Err(error::protocol(
                "new text message started while another is in progress",
            )),
            (false, None) => Err(error::protocol(
                "text continuation with no message in progress",
            )),
            (true, None) => self.finish_text(data.to_string(), last),
            (false, Some(Partial::Text(mut buf))) => {
                buf.push_str(data);
                self.finish_text(buf, last)
            }
            (false, Some(Partial::Binary(_))) => Err(error::protocol(
                "text continuation inside a binary message",
            )),
        }
    }

    /// Feeds a binary fragment. Same contract as [`push_text`].
    ///
    /// [`push_text`]: FragmentAssembler::push_text
    pub fn push_binary(
        &mut self,
        data: &[u8],
        first: bool,
        last: bool,
    ) -> crate::Result<Option<WsMessage>> {
        match (first, self.partial.take()) {
            (true, Some(_)) => Err(error::protocol(
                "new binary message started while another is in progress",
            )),
            (false, None) => Err(error::protocol(
                "binary continuation with no message in progress",
            )),
            (true, None) => self.finish_binary(BytesMut::from(data), last),
            (false, Some(Partial::Binary(mut buf))) => {
                buf.extend_from_slice(data);
                self.finish_binary(buf, last)
            }
            (false, Some(Partial::Text(_))) => Err(error::protocol(
                "binary continuation inside a text message",
            )),
        }
    }

    fn finish_text(&mut self, buf: String, last: bool) -> crate::Result<Option<WsMessage>> {
        if last {
            Ok(Some(WsMessage::Text(buf)))
        } else {
            self.partial = Some(Partial::Text(buf));
            Ok(None)
        }
    }

    fn finish_binary(&mut self, buf: BytesMut, last: bool) -> crate::Result<Option<WsMessage>> {
        if last {
            Ok(Some(WsMessage::Binary(Bytes::from(buf))))
        } else {
            self.partial = Some(Partial::Binary(buf));
            Ok(None)
        }
    }
}
