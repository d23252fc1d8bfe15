//! Metadata-driven dispatch.
//!
//! A [`Dispatcher`] owns the frozen [`Protocol`], the [`Router`] and the
//! middleware chain. Handlers come in two flavours:
//!
//! - plain router handlers, `async fn(Request) -> impl IntoResponse`,
//!   registered with [`Dispatcher::route`];
//! - described handlers, registered with [`Dispatcher::register`] from a
//!   [`RouteMeta`] (method + path fragments) and a [`HandlerMeta`] (ordered
//!   [`Binding`]s + callable). The dispatcher wraps them so that, per
//!   request, arguments are bound from the path, query, body or framework,
//!   the callable runs, and its reply is mapped onto a response.
//!
//! ```rust
//! use trellis::{Args, Binding, Dispatcher, Error, HandlerMeta, Json, Protocol, RouteMeta, TypeTag};
//!
//! async fn get_item(args: Args) -> Result<Json<i32>, Error> {
//!     Ok(Json(args.get::<i32>(0)?))
//! }
//!
//! let mut app = Dispatcher::new(Protocol::default());
//! app.register(
//!     "/items",
//!     RouteMeta::get(["/{id}"]),
//!     HandlerMeta::new([Binding::path("id", TypeTag::Int)], get_item),
//! )?;
//! # Ok::<(), Error>(())
//! ```

mod binding;
mod reply;

use std::future::{self, Future};
use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxFuture, Endpoint, Handler, SharedEndpoint};
use crate::header::HeaderValue;
use crate::method::Method;
use crate::middleware::{self, Middleware};
use crate::protocol::Protocol;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

pub use binding::{Arg, Args, Binding, FromArg, Source, TypeTag};
pub use reply::{IntoReply, Json, Reply, ReturnType};

// ── Metadata ──────────────────────────────────────────────────────────────────

/// Method plus the path fragments a handler answers on, relative to the
/// controller prefix.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteMeta {
    method: Method,
    fragments: Vec<String>,
}

impl RouteMeta {
    /// No fragments means the prefix itself.
    pub fn new<I, S>(method: Method, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fragments: Vec<String> = fragments.into_iter().map(Into::into).collect();
        if fragments.is_empty() {
            fragments.push(String::new());
        }
        Self { method, fragments }
    }

    pub fn get<I: IntoIterator<Item = S>, S: Into<String>>(fragments: I) -> Self {
        Self::new(Method::Get, fragments)
    }

    pub fn post<I: IntoIterator<Item = S>, S: Into<String>>(fragments: I) -> Self {
        Self::new(Method::Post, fragments)
    }

    pub fn put<I: IntoIterator<Item = S>, S: Into<String>>(fragments: I) -> Self {
        Self::new(Method::Put, fragments)
    }

    pub fn patch<I: IntoIterator<Item = S>, S: Into<String>>(fragments: I) -> Self {
        Self::new(Method::Patch, fragments)
    }

    pub fn delete<I: IntoIterator<Item = S>, S: Into<String>>(fragments: I) -> Self {
        Self::new(Method::Delete, fragments)
    }

    pub fn method(&self) -> Method { self.method }
    pub fn fragments(&self) -> &[String] { &self.fragments }
}

type BoundFn = dyn Fn(Args) -> BoxFuture<Result<Reply, Error>> + Send + Sync;

/// Ordered parameter bindings, the callable, and its declared return type.
#[derive(Clone)]
pub struct HandlerMeta {
    bindings: Arc<[Binding]>,
    returns: ReturnType,
    call: Arc<BoundFn>,
}

impl HandlerMeta {
    /// Describes `f`. Its return type fixes the [`ReturnType`].
    pub fn new<B, F, Fut, R>(bindings: B, f: F) -> Self
    where
        B: IntoIterator<Item = Binding>,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        let call = move |args: Args| -> BoxFuture<Result<Reply, Error>> {
            let fut = f(args);
            Box::pin(async move { fut.await.into_reply() })
        };
        Self {
            bindings: bindings.into_iter().collect(),
            returns: R::RETURNS,
            call: Arc::new(call),
        }
    }

    pub fn bindings(&self) -> &[Binding] { &self.bindings }
    pub fn returns(&self) -> ReturnType { self.returns }
}

impl std::fmt::Debug for HandlerMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerMeta")
            .field("bindings", &self.bindings)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// The per-route wrapper: bind, invoke, map.
struct Bound {
    meta: HandlerMeta,
    protocol: Arc<Protocol>,
}

impl Endpoint for Bound {
    fn serve(&self, req: Request) -> BoxFuture {
        let args = match binding::bind(&self.meta.bindings, &req, self.protocol.codecs()) {
            Ok(args) => args,
            Err(err) => {
                debug!(error = %err, path = req.path(), "parameter binding failed");
                return Box::pin(future::ready(err.into_response()));
            }
        };
        let fut = (self.meta.call)(args);
        let returns = self.meta.returns;
        Box::pin(async move {
            fut.await
                .and_then(|reply| reply.into_response(returns))
                .unwrap_or_else(Error::into_response)
        })
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Protocol, routes and middleware: everything a connection needs to turn
/// a parsed request into a response.
///
/// Populate it at startup, then hand it to [`Server::serve`](crate::Server::serve),
/// after which it is shared read-only.
pub struct Dispatcher {
    protocol: Arc<Protocol>,
    router: Router,
    middleware: Vec<Box<dyn Middleware>>,
}

impl Dispatcher {
    pub fn new(protocol: Protocol) -> Self {
        Self { protocol: Arc::new(protocol), router: Router::new(), middleware: Vec::new() }
    }

    /// Starts from an existing router of plain handlers.
    pub fn with_router(protocol: Protocol, router: Router) -> Self {
        Self { router, ..Self::new(protocol) }
    }

    pub fn protocol(&self) -> &Arc<Protocol> { &self.protocol }
    pub fn router(&self) -> &Router { &self.router }

    /// Registers one route per fragment, at `normalize(prefix/fragment)`.
    pub fn register(&mut self, prefix: &str, route: RouteMeta, handler: HandlerMeta) -> Result<(), Error> {
        if !route.method.is_routable() {
            return Err(Error::UnsupportedMethod(route.method.to_string()));
        }
        for fragment in &route.fragments {
            let path = normalize_path(&format!("{prefix}/{fragment}"));
            let bound: SharedEndpoint = Arc::new(Bound { meta: handler.clone(), protocol: Arc::clone(&self.protocol) });
            self.router.add(route.method, &path, bound)?;
        }
        Ok(())
    }

    /// Registers a plain router handler.
    pub fn route(&mut self, method: Method, template: &str, handler: impl Handler) -> Result<(), Error> {
        self.router.add(method, template, handler.into_endpoint())
    }

    /// Makes `name` the default `Server` response header.
    ///
    /// Endpoints registered earlier keep their own protocol handle; they
    /// only read its codecs.
    pub(crate) fn set_server_name(&mut self, name: &str) {
        let name = name.to_owned();
        let headers = Arc::make_mut(&mut self.protocol).headers_mut();
        if let Err(err) = headers.set_default("server", move || HeaderValue::Text(name.clone())) {
            debug!(error = %err, "server name not applied");
        }
    }

    /// Appends to the middleware chain.
    pub fn middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Middleware, then routing, then the handler. Never fails: every error
    /// becomes its response.
    pub async fn dispatch(&self, req: Request) -> Response {
        if !req.method().is_routable() {
            return Error::UnsupportedMethod(req.method().to_string()).into_response();
        }
        let req = middleware::apply(&self.middleware, req);
        self.router.resolve(req).await
    }
}

/// Collapses repeated slashes, strips a trailing slash and ensures a leading
/// one. The root stays `/`.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
