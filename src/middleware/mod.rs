//! The composable middleware pipeline.
//!
//! Every request flows through an ordered stack of stages. A stage sees
//! the request on the way in and the response (or error) on the way out,
//! so a stage declared earlier wraps everything declared after it. The
//! terminal [`Handler`] at the bottom of the stack is the transport
//! adapter.
//!
//! The standard stack, outermost first:
//! timing, validation, nested-param flattening, body encoding, multipart,
//! accept headers, exceptional status, output coercion, decompression,
//! URL resolution, auth, query encoding. The response retraces the stack
//! in reverse, which is what lets decompression feed coercion and
//! coercion feed the status check.

use std::sync::Arc;

use crate::codec::CodecRegistry;
use crate::http::request::Request;
use crate::http::response::Response;

pub mod accept;
pub mod auth;
pub mod body;
pub mod coerce;
pub mod decompress;
pub mod multipart;
pub mod nested;
pub mod query;
pub mod status;
pub mod timing;
pub mod url;
pub mod validate;

/// The continuation a middleware stage invokes to pass the request on.
pub trait Handler: Send + Sync {
    fn call(&self, req: Request) -> crate::Result<Response>;
}

impl<F> Handler for F
where
    F: Fn(Request) -> crate::Result<Response> + Send + Sync,
{
    fn call(&self, req: Request) -> crate::Result<Response> {
        self(req)
    }
}

/// One stage of the pipeline.
pub trait Middleware: Send + Sync {
    /// Stable stage name, used in trace output.
    fn name(&self) -> &'static str;

    /// Processes the request, forwards it through `next`, then processes
    /// the result on the way back out.
    fn handle(&self, req: Request, next: &dyn Handler) -> crate::Result<Response>;
}

/// An ordered, immutable stack of middleware stages.
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Arc<dyn Middleware>]>,
}

impl Pipeline {
    /// Builds a pipeline from an explicit stage list, outermost first.
    #[must_use]
    pub fn new(stages: Vec<Arc<dyn Middleware>>) -> Self {
        Pipeline {
            stages: stages.into(),
        }
    }

    /// The standard stack described in the module docs.
    #[must_use]
    pub fn standard(registry: CodecRegistry) -> Self {
        let registry = Arc::new(registry);
        Pipeline::new(vec![
            Arc::new(timing::Timing),
            Arc::new(validate::Validate),
            Arc::new(nested::FlattenNested),
            Arc::new(body::EncodeBody::new(Arc::clone(&registry))),
            Arc::new(multipart::EncodeMultipart),
            Arc::new(accept::AcceptHeaders),
            Arc::new(status::ExceptionalStatus),
            Arc::new(coerce::CoerceOutput::new(Arc::clone(&registry))),
            Arc::new(decompress::Decompress::default()),
            Arc::new(url::ResolveUrl),
            Arc::new(auth::Authorize),
            Arc::new(query::EncodeQuery),
        ])
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs `req` through every stage down to `terminal` and back.
    pub fn execute(&self, req: Request, terminal: &dyn Handler) -> crate::Result<Response> {
        run(&self.stages, req, terminal)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

struct Rest<'a> {
    stages: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn Handler,
}

impl Handler for Rest<'_> {
    fn call(&self, req: Request) -> crate::Result<Response> {
        run(self.stages, req, self.terminal)
    }
}

fn run(
    stages: &[Arc<dyn Middleware>],
    req: Request,
    terminal: &dyn Handler,
) -> crate::Result<Response> {
    match stages.split_first() {
        None => terminal.call(req),
        Some((stage, rest)) => {
            tracing::trace!(target: "paloma::middleware", stage = stage.name(), "enter");
            stage.handle(
                req,
                &Rest {
                    stages: rest,
                    terminal,
                },
            )
        }
    }
}
