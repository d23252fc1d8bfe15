//! Request middleware.
//!
//! Middleware runs before routing, in registration order, and may rewrite
//! the request: normalise a header, tag it with a request id, redirect a
//! legacy path. Each step receives the output of the previous one.
//!
//! Any `Fn(Request) -> Request` closure is a middleware:
//!
//! ```rust
//! use trellis::{Dispatcher, Header, Protocol, Request};
//!
//! let mut app = Dispatcher::new(Protocol::default());
//! app.middleware(|req: Request| req.with_header(Header::other("X-Request-Id", "42")));
//! ```

use tracing::debug;

use crate::request::Request;

/// A `Request → Request` transform applied before routing.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request) -> Request;
}

impl<F> Middleware for F
where
    F: Fn(Request) -> Request + Send + Sync + 'static,
{
    fn handle(&self, req: Request) -> Request {
        self(req)
    }
}

/// Logs every request that reaches the router at `debug` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn handle(&self, req: Request) -> Request {
        debug!(method = %req.method(), path = req.path(), query = req.query_params().len(), "routing request");
        req
    }
}

/// Runs `chain` over `req` front to back.
pub(crate) fn apply(chain: &[Box<dyn Middleware>], req: Request) -> Request {
    chain.iter().fold(req, |req, m| m.handle(req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;
    use crate::method::Method;

    #[test]
    fn chain_runs_in_order() {
        let chain: Vec<Box<dyn Middleware>> = vec![
            Box::new(|req: Request| req.with_header(Header::other("X-Step", "one"))),
            Box::new(Trace),
            Box::new(|req: Request| {
                let seen = req.headers().text("x-step").unwrap_or_default();
                req.with_header(Header::other("X-Step", format!("{seen},two")))
            }),
        ];
        let req = apply(&chain, Request::new(Method::Get, "/"));
        assert_eq!(req.headers().text("X-Step").as_deref(), Some("one,two"));
    }
}
