//! The blocking session loop over tungstenite.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{unbounded, Receiver};
use tungstenite::client::ClientRequestBuilder;
use tungstenite::protocol::frame::coding::{CloseCode, Data, OpCode};
use tungstenite::protocol::frame::Frame;
use tungstenite::protocol::CloseFrame;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::error;

use super::connection::{Command, Shared, WsConnection, WsSender};
use super::event::WsState;
use super::listener::WsListener;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Options for establishing a session.
#[derive(Debug, Clone)]
pub struct WsOptions {
    /// Extra handshake headers.
    pub headers: Vec<(String, String)>,
    /// Subprotocols offered in the handshake, in preference order.
    pub subprotocols: Vec<String>,
    /// Limit on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Socket poll interval; bounds how quickly outbound commands and
    /// aborts are picked up while the socket is idle.
    pub poll_interval: Duration,
    /// Delivery credits granted before `on_open` runs.
    pub initial_credits: u64,
}

impl Default for WsOptions {
    fn default() -> Self {
        WsOptions {
            headers: Vec::new(),
            subprotocols: Vec::new(),
            connect_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
            initial_credits: 1,
        }
    }
}

/// Spawns the session. The handshake runs on the session thread: the
/// handle comes back in `Connecting` state, and connection or handshake
/// failures reach the listener's `on_error`, never this function's
/// return value. Only a malformed URL fails here, before any I/O.
pub fn connect(
    url: &str,
    listener: impl WsListener,
    options: WsOptions,
) -> crate::Result<WsConnection> {
    let uri: http::Uri = url.parse().map_err(error::invalid_url)?;
    if uri.host().is_none() {
        return Err(error::invalid_url("websocket url has no host"));
    }

    let shared = Arc::new(Shared::new(options.initial_credits));
    let (tx, rx) = unbounded();
    let sender = WsSender {
        tx,
        shared: Arc::clone(&shared),
    };

    let loop_sender = sender.clone();
    let handle = thread::Builder::new()
        .name("paloma-ws".to_string())
        .spawn(move || session(uri, options, Box::new(listener), loop_sender, rx))
        .map_err(error::ws)?;

    Ok(WsConnection::new(sender, handle))
}

fn session(
    uri: http::Uri,
    options: WsOptions,
    mut listener: Box<dyn WsListener>,
    ws: WsSender,
    rx: Receiver<Command>,
) {
    match open_socket(&uri, &options, &ws.shared) {
        Ok(socket) => run_loop(socket, listener, ws, rx),
        Err(e) => {
            listener.on_error(&ws, e);
            ws.shared.set_state(WsState::Aborted);
        }
    }
}

/// Establishes the TCP connection and runs the opening handshake.
fn open_socket(uri: &http::Uri, options: &WsOptions, shared: &Shared) -> crate::Result<Socket> {
    let host = uri
        .host()
        .ok_or_else(|| error::invalid_url("websocket url has no host"))?;
    let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
        Some("wss") => 443,
        _ => 80,
    });

    let addrs = (host, port).to_socket_addrs().map_err(error::connect)?;
    let mut stream = None;
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, options.connect_timeout) {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(e) => last_err = Some(e),
        }
    }
    let stream = stream.ok_or_else(|| {
        error::connect(last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "hostname resolved no addresses")
        }))
    })?;

    let mut builder = ClientRequestBuilder::new(uri.clone());
    for (name, value) in &options.headers {
        builder = builder.with_header(name, value);
    }
    for protocol in &options.subprotocols {
        builder = builder.with_sub_protocol(protocol);
    }

    let (mut socket, response) = tungstenite::client_tls(builder, stream).map_err(|e| match e {
        tungstenite::HandshakeError::Failure(e) => classify(e),
        tungstenite::HandshakeError::Interrupted(_) => error::ws("handshake interrupted"),
    })?;
    if let Some(protocol) = response
        .headers()
        .get("sec-websocket-protocol")
        .and_then(|v| v.to_str().ok())
    {
        shared.set_subprotocol(protocol.to_string());
    }
    tracing::debug!(
        target: "paloma::ws",
        host,
        status = %response.status(),
        "websocket handshake complete"
    );
    set_read_timeout(&mut socket, options.poll_interval)?;
    Ok(socket)
}

fn set_read_timeout(socket: &mut Socket, timeout: Duration) -> crate::Result<()> {
    let stream = match socket.get_mut() {
        MaybeTlsStream::Plain(stream) => stream,
        MaybeTlsStream::Rustls(stream) => stream.get_mut(),
        _ => return Ok(()),
    };
    stream.set_read_timeout(Some(timeout)).map_err(error::ws)
}

fn run_loop(
    mut socket: Socket,
    mut listener: Box<dyn WsListener>,
    ws: WsSender,
    rx: Receiver<Command>,
) {
    let shared = Arc::clone(&ws.shared);
    shared.set_state(WsState::Open);
    listener.on_open(&ws);

    loop {
        if shared.aborted() {
            shared.set_state(WsState::Aborted);
            break;
        }

        if let Err(e) = drain_commands(&mut socket, &rx, &shared) {
            listener.on_error(&ws, e);
            shared.set_state(WsState::Aborted);
            break;
        }

        if shared.credits() == 0 && shared.state().is_live() {
            shared.wait_for_credits(Duration::from_millis(50));
            continue;
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                shared.consume_credit();
                listener.on_text(&ws, text.as_str().to_string(), true);
                shared.add_credits(u64::from(listener.auto_rearm()));
            }
            Ok(Message::Binary(data)) => {
                shared.consume_credit();
                listener.on_binary(&ws, data, true);
                shared.add_credits(u64::from(listener.auto_rearm()));
            }
            Ok(Message::Ping(data)) => listener.on_ping(&ws, data),
            Ok(Message::Pong(data)) => listener.on_pong(&ws, data),
            Ok(Message::Close(frame)) => {
                shared.set_state(WsState::Closing);
                shared.close_input();
                let (code, reason) = match frame {
                    Some(frame) => (Some(u16::from(frame.code)), frame.reason.to_string()),
                    None => (None, String::new()),
                };
                listener.on_close(&ws, code, reason);
            }
            Ok(Message::Frame(_)) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                shared.set_state(WsState::Closed);
                break;
            }
            Err(tungstenite::Error::Io(ref io))
                if matches!(
                    io.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) => {}
            Err(e) => {
                listener.on_error(&ws, classify(e));
                shared.set_state(WsState::Aborted);
                break;
            }
        }
    }
    shared.close_input();
    shared.close_output();
    tracing::debug!(target: "paloma::ws", state = ?shared.state(), "session loop exited");
}

fn drain_commands(
    socket: &mut Socket,
    rx: &Receiver<Command>,
    shared: &Shared,
) -> crate::Result<()> {
    let mut wrote = false;
    while let Ok(command) = rx.try_recv() {
        wrote = true;
        match command {
            Command::Text(data) => socket.send(Message::Text(data.into())).map_err(classify)?,
            Command::Binary(data) => socket.send(Message::Binary(data)).map_err(classify)?,
            Command::TextFragment { data, first, last } => {
                send_fragment(socket, data, Data::Text, first, last)?;
            }
            Command::BinaryFragment { data, first, last } => {
                send_fragment(socket, data, Data::Binary, first, last)?;
            }
            Command::Ping(data) => socket.send(Message::Ping(data)).map_err(classify)?,
            Command::Pong(data) => socket.send(Message::Pong(data)).map_err(classify)?,
            Command::Close { code, reason } => {
                shared.set_state(WsState::Closing);
                shared.close_output();
                socket
                    .close(Some(CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    }))
                    .map_err(classify)?;
            }
        }
    }
    if wrote {
        match socket.flush() {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed) => {}
            Err(tungstenite::Error::Io(ref io))
                if matches!(
                    io.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) => {}
            Err(e) => return Err(classify(e)),
        }
    }
    Ok(())
}

fn send_fragment(
    socket: &mut Socket,
    data: Bytes,
    kind: Data,
    first: bool,
    last: bool,
) -> crate::Result<()> {
    let opcode = if first {
        OpCode::Data(kind)
    } else {
        OpCode::Data(Data::Continue)
    };
    let frame = Frame::message(data, opcode, last);
    socket.send(Message::Frame(frame)).map_err(classify)
}

fn classify(e: tungstenite::Error) -> crate::Error {
    match &e {
        tungstenite::Error::Io(io)
            if matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ) =>
        {
            error::timeout(e)
        }
        tungstenite::Error::Io(io)
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotConnected
            ) =>
        {
            error::connect(e)
        }
        tungstenite::Error::Io(_) => error::io(e),
        tungstenite::Error::Tls(_) => error::tls(e),
        tungstenite::Error::Url(tungstenite::error::UrlError::UnableToConnect(_)) => {
            error::connect(e)
        }
        tungstenite::Error::Url(_) => error::invalid_url(e),
        tungstenite::Error::Protocol(_) => error::protocol(e),
        _ => error::ws(e),
    }
}
