//! Shared test support: a capturing stub transport.

use std::io::Read;
use std::sync::{Arc, Mutex};

use http::{HeaderMap, StatusCode, Version};
use paloma::transport::Transport;
use paloma::{Body, Client, Request, Response, ResponseBody};

/// What the transport saw for one dispatched request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

type Reply = dyn Fn() -> (StatusCode, HeaderMap, Vec<u8>) + Send + Sync;

/// A transport that records every request and replies from a closure.
pub struct StubTransport {
    pub seen: Mutex<Vec<Captured>>,
    reply: Box<Reply>,
}

impl StubTransport {
    pub fn replying(
        reply: impl Fn() -> (StatusCode, HeaderMap, Vec<u8>) + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(StubTransport {
            seen: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        })
    }

    pub fn ok_empty() -> Arc<Self> {
        Self::replying(|| (StatusCode::OK, HeaderMap::new(), Vec::new()))
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.seen.lock().expect("seen").clone()
    }
}

impl Transport for StubTransport {
    fn execute(&self, mut req: Request) -> paloma::Result<Response> {
        let url = req.resolved_url.clone().expect("resolved url");
        let body = match req.body.take() {
            None => Vec::new(),
            Some(Body::Bytes(b)) => b.to_vec(),
            Some(Body::Text(t)) => t.into_bytes(),
            Some(Body::Reader { mut reader, .. }) => {
                let mut out = Vec::new();
                reader.read_to_end(&mut out).expect("body stream");
                out
            }
            Some(other) => panic!("unexpected body at transport: {other:?}"),
        };
        self.seen.lock().expect("seen").push(Captured {
            method: req.method.to_string(),
            url: url.to_string(),
            headers: req.headers.clone(),
            body,
        });

        let (status, headers, reply_body) = (self.reply)();
        let body = if reply_body.is_empty() {
            ResponseBody::Empty
        } else {
            ResponseBody::Stream(Box::new(std::io::Cursor::new(reply_body)))
        };
        Ok(Response::new(status, headers, body, Version::HTTP_11))
    }
}

/// A client wired to the given stub.
pub fn client_with(stub: &Arc<StubTransport>) -> Client {
    Client::builder()
        .transport(Arc::<StubTransport>::clone(stub) as Arc<dyn Transport>)
        .workers(1)
        .build()
        .expect("client")
}
