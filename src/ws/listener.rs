//! The event listener a WebSocket session drives.

use bytes::Bytes;

use super::connection::WsSender;

/// Receives session events on the engine thread.
///
/// Delivery is credit based: each data message consumes one credit, and
/// the engine stops reading from the socket while no credits remain.
/// [`auto_rearm`](WsListener::auto_rearm) credits are granted back after
/// every delivery (one by default, so the default flow is continuous);
/// return zero and call [`WsSender::request`] yourself for manual
/// backpressure.
///
/// `last` is true when the payload completes a message. The engine
/// reassembles continuation frames before delivery, so `last` is always
/// true here; the flag exists so listeners are written against the
/// fragment-aware contract that [`FragmentAssembler`] implements.
///
/// [`FragmentAssembler`]: super::assembler::FragmentAssembler
#[allow(unused_variables)]
pub trait WsListener: Send + 'static {
    fn on_open(&mut self, ws: &WsSender) {}

    fn on_text(&mut self, ws: &WsSender, data: String, last: bool) {}

    fn on_binary(&mut self, ws: &WsSender, data: Bytes, last: bool) {}

    fn on_ping(&mut self, ws: &WsSender, data: Bytes) {}

    fn on_pong(&mut self, ws: &WsSender, data: Bytes) {}

    /// The peer initiated or completed the closing handshake.
    fn on_close(&mut self, ws: &WsSender, code: Option<u16>, reason: String) {}

    /// The session failed; the connection is aborted after this call.
    fn on_error(&mut self, ws: &WsSender, error: crate::Error) {}

    /// Credits granted back after each data delivery.
    fn auto_rearm(&self) -> u32 {
        1
    }

    /// Opt in to per-fragment delivery where the engine can provide it.
    ///
    /// The bundled engine reads whole messages off the socket, so this
    /// is advisory there; custom engines that surface raw continuation
    /// frames consult it before running a [`FragmentAssembler`].
    fn wants_fragments(&self) -> bool {
        false
    }
}
