//! WebSocket session states and message shapes.

use bytes::Bytes;

/// Lifecycle of a WebSocket session.
///
/// The normal path is Connecting, Open, Closing, Closed. An abort tears
/// the transport down without a closing handshake and lands in Aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsState {
    Connecting,
    Open,
    Closing,
    Closed,
    Aborted,
}

impl WsState {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            WsState::Connecting => 0,
            WsState::Open => 1,
            WsState::Closing => 2,
            WsState::Closed => 3,
            WsState::Aborted => 4,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> WsState {
        match raw {
            0 => WsState::Connecting,
            1 => WsState::Open,
            2 => WsState::Closing,
            3 => WsState::Closed,
            _ => WsState::Aborted,
        }
    }

    /// True while data can still be sent.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, WsState::Connecting | WsState::Open)
    }
}

/// A complete data message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Bytes),
}

impl WsMessage {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            WsMessage::Text(t) => t.len(),
            WsMessage::Binary(b) => b.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
