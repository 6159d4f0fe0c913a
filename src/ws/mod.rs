//! WebSocket sessions: a blocking engine thread drives a listener, with
//! credit-based delivery flow control and a clonable sending handle.

pub mod assembler;
pub mod connection;
pub mod engine;
pub mod event;
pub mod listener;

pub use assembler::FragmentAssembler;
pub use connection::{WsConnection, WsSender};
pub use engine::{connect, WsOptions};
pub use event::{WsMessage, WsState};
pub use listener::WsListener;
