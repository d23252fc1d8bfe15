//! Endpoints: the uniform shape every route target is stored in.
//!
//! The router holds one ordered `Vec` of routes whose targets have
//! different concrete types. Each target is therefore turned into an
//! [`Endpoint`] trait object behind an `Arc`, so connection tasks can share
//! it:
//!
//! ```text
//! async fn hello(req: Request) -> &'static str       plain handler
//!        │ Handler::into_endpoint
//!        ▼
//! Arc<PlainHandler<hello>>                           SharedEndpoint
//!        │ per request
//!        ▼
//! endpoint.serve(req) → BoxFuture<Response>
//! ```
//!
//! Described handlers registered through the
//! [`Dispatcher`](crate::Dispatcher) become endpoints too; their wrapper
//! binds arguments before calling the user function.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A boxed `Send` future, by default resolving to a [`Response`].
pub type BoxFuture<T = Response> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Something that turns a routed request into a response.
#[doc(hidden)]
pub trait Endpoint: Send + Sync + 'static {
    fn serve(&self, req: Request) -> BoxFuture;
}

#[doc(hidden)]
pub type SharedEndpoint = Arc<dyn Endpoint>;

/// A plain route handler: `async fn(Request) -> impl IntoResponse`.
///
/// Closures of the same shape qualify. The trait cannot be implemented
/// outside this crate.
pub trait Handler: sealed::Sealed + Sized + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_endpoint(self) -> SharedEndpoint;
}

mod sealed {
    pub trait Sealed {}
}

impl<F, Fut> sealed::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn into_endpoint(self) -> SharedEndpoint {
        Arc::new(PlainHandler(self))
    }
}

struct PlainHandler<F>(F);

impl<F, Fut> Endpoint for PlainHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn serve(&self, req: Request) -> BoxFuture {
        let pending = (self.0)(req);
        Box::pin(async move { pending.await.into_response() })
    }
}
