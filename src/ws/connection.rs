//! The caller-facing half of a WebSocket session.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use bytes::Bytes;
use crossbeam_channel::Sender;

use crate::error;

use super::event::WsState;

pub(crate) enum Command {
    Text(String),
    Binary(Bytes),
    TextFragment { data: Bytes, first: bool, last: bool },
    BinaryFragment { data: Bytes, first: bool, last: bool },
    Ping(Bytes),
    Pong(Bytes),
    Close { code: u16, reason: String },
}

pub(crate) struct Shared {
    state: AtomicU8,
    abort: AtomicBool,
    credits: AtomicU64,
    /// Outbound fragmented message in progress.
    fragmenting: AtomicBool,
    /// Subprotocol agreed during the handshake, if any.
    subprotocol: Mutex<Option<String>>,
    input_closed: AtomicBool,
    output_closed: AtomicBool,
    wake: Mutex<()>,
    wake_cv: Condvar,
}

impl Shared {
    pub(crate) fn new(initial_credits: u64) -> Shared {
        Shared {
            state: AtomicU8::new(WsState::Connecting.as_u8()),
            abort: AtomicBool::new(false),
            credits: AtomicU64::new(initial_credits),
            fragmenting: AtomicBool::new(false),
            subprotocol: Mutex::new(None),
            input_closed: AtomicBool::new(false),
            output_closed: AtomicBool::new(false),
            wake: Mutex::new(()),
            wake_cv: Condvar::new(),
        }
    }

    pub(crate) fn set_subprotocol(&self, protocol: String) {
        *self
            .subprotocol
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(protocol);
    }

    pub(crate) fn subprotocol(&self) -> Option<String> {
        self.subprotocol
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn close_input(&self) {
        self.input_closed.store(true, Ordering::Release);
    }

    pub(crate) fn close_output(&self) {
        self.output_closed.store(true, Ordering::Release);
    }

    pub(crate) fn state(&self) -> WsState {
        WsState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: WsState) {
        self.state.store(state.as_u8(), Ordering::Release);
        self.notify();
    }

    pub(crate) fn aborted(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }

    pub(crate) fn credits(&self) -> u64 {
        self.credits.load(Ordering::Acquire)
    }

    pub(crate) fn consume_credit(&self) {
        let _ = self
            .credits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1));
    }

    pub(crate) fn add_credits(&self, n: u64) {
        if n > 0 {
            self.credits.fetch_add(n, Ordering::AcqRel);
            self.notify();
        }
    }

    /// Blocks briefly until credits arrive, the session dies, or the
    /// timeout lapses. The engine loop calls this between socket polls.
    pub(crate) fn wait_for_credits(&self, timeout: std::time::Duration) {
        let guard = self.wake.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if self.credits() == 0 && !self.aborted() && self.state().is_live() {
            let _ = self.wake_cv.wait_timeout(guard, timeout);
        }
    }

    fn notify(&self) {
        let _guard = self.wake.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.wake_cv.notify_all();
    }
}

/// Handle for sending into an open session. Clonable and usable from any
/// thread, including from listener callbacks on the engine thread.
#[derive(Clone)]
pub struct WsSender {
    pub(crate) tx: Sender<Command>,
    pub(crate) shared: Arc<Shared>,
}

impl WsSender {
    #[must_use]
    pub fn state(&self) -> WsState {
        self.shared.state()
    }

    /// The subprotocol the peer agreed to during the handshake.
    #[must_use]
    pub fn subprotocol(&self) -> Option<String> {
        self.shared.subprotocol()
    }

    /// True once the peer's half of the session is done, whether by a
    /// received close frame or by teardown.
    #[must_use]
    pub fn input_closed(&self) -> bool {
        self.shared.input_closed.load(Ordering::Acquire) || !self.state().is_live()
    }

    /// True once the local half is done sending.
    #[must_use]
    pub fn output_closed(&self) -> bool {
        self.shared.output_closed.load(Ordering::Acquire) || !self.state().is_live()
    }

    /// Sends a complete text message.
    pub fn send_text(&self, data: impl Into<String>) -> crate::Result<()> {
        self.dispatch(Command::Text(data.into()))
    }

    /// Sends a complete binary message.
    pub fn send_binary(&self, data: impl Into<Bytes>) -> crate::Result<()> {
        self.dispatch(Command::Binary(data.into()))
    }

    /// Sends one fragment of a text message. The first call opens the
    /// message; the call with `last` set closes it.
    pub fn send_text_fragment(&self, data: impl Into<String>, last: bool) -> crate::Result<()> {
        let first = !self.shared.fragmenting.swap(!last, Ordering::AcqRel);
        self.dispatch(Command::TextFragment {
            data: Bytes::from(data.into().into_bytes()),
            first,
            last,
        })
    }

    /// Sends one fragment of a binary message.
    pub fn send_binary_fragment(&self, data: impl Into<Bytes>, last: bool) -> crate::Result<()> {
        let first = !self.shared.fragmenting.swap(!last, Ordering::AcqRel);
        self.dispatch(Command::BinaryFragment {
            data: data.into(),
            first,
            last,
        })
    }

    pub fn ping(&self, data: impl Into<Bytes>) -> crate::Result<()> {
        self.dispatch(Command::Ping(data.into()))
    }

    pub fn pong(&self, data: impl Into<Bytes>) -> crate::Result<()> {
        self.dispatch(Command::Pong(data.into()))
    }

    /// Starts the closing handshake. The session moves to Closing and,
    /// once the peer acknowledges, to Closed.
    pub fn close(&self, code: u16, reason: impl Into<String>) -> crate::Result<()> {
        self.dispatch(Command::Close {
            code,
            reason: reason.into(),
        })
    }

    /// Grants `n` delivery credits to the reader.
    pub fn request(&self, n: u64) {
        self.shared.add_credits(n);
    }

    /// Tears the transport down without a closing handshake.
    pub fn abort(&self) {
        self.shared.abort.store(true, Ordering::Release);
        self.shared.notify();
    }

    fn dispatch(&self, command: Command) -> crate::Result<()> {
        if !self.state().is_live() {
            return Err(error::ws(format!(
                "cannot send in state {:?}",
                self.state()
            )));
        }
        self.tx
            .send(command)
            .map_err(|_| error::ws("session loop has exited"))
    }
}

impl std::fmt::Debug for WsSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsSender")
            .field("state", &self.state())
            .field("credits", &self.shared.credits())
            .finish()
    }
}

/// An established WebSocket session. Dropping the connection does not
/// close it; call [`WsSender::close`] or [`WsSender::abort`], then
/// [`join`](WsConnection::join) to wait for the engine thread.
pub struct WsConnection {
    sender: WsSender,
    handle: Option<JoinHandle<()>>,
}

impl WsConnection {
    pub(crate) fn new(sender: WsSender, handle: JoinHandle<()>) -> Self {
        WsConnection {
            sender,
            handle: Some(handle),
        }
    }

    /// A clonable sending handle.
    #[must_use]
    pub fn sender(&self) -> WsSender {
        self.sender.clone()
    }

    #[must_use]
    pub fn state(&self) -> WsState {
        self.sender.state()
    }

    /// The subprotocol the peer agreed to, once the handshake completes.
    #[must_use]
    pub fn subprotocol(&self) -> Option<String> {
        self.sender.subprotocol()
    }

    #[must_use]
    pub fn input_closed(&self) -> bool {
        self.sender.input_closed()
    }

    #[must_use]
    pub fn output_closed(&self) -> bool {
        self.sender.output_closed()
    }

    /// Blocks until the engine thread exits.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnection")
            .field("state", &self.state())
            .field("subprotocol", &self.subprotocol())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> WsSender {
        let (tx, _rx) = crossbeam_channel::unbounded();
        WsSender {
            tx,
            shared: Arc::new(Shared::new(1)),
        }
    }

    #[test]
    fn handle_tracks_the_agreed_subprotocol() {
        let ws = sender();
        assert_eq!(ws.subprotocol(), None);
        ws.shared.set_subprotocol("chat.v2".to_string());
        assert_eq!(ws.subprotocol().as_deref(), Some("chat.v2"));
    }

    #[test]
    fn half_close_flags_track_each_direction() {
        let ws = sender();
        ws.shared.set_state(WsState::Open);
        assert!(!ws.input_closed());
        assert!(!ws.output_closed());

        ws.shared.close_input();
        assert!(ws.input_closed());
        assert!(!ws.output_closed());

        ws.shared.set_state(WsState::Closed);
        assert!(ws.input_closed());
        assert!(ws.output_closed());
    }
}
