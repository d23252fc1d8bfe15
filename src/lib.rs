//! # trellis
//!
//! A minimal web-application server on raw TCP sockets.
//!
//! trellis reads HTTP/1.1-shaped requests straight off the socket, parses
//! them into typed headers, routes them through an ordered route table,
//! binds handler parameters from the path, the query string or the body,
//! and writes the reply back with every mandatory header filled in.
//!
//! ## What it does
//!
//! - Hand-written request/response codec: CRLF or bare LF, bodies bounded
//!   by `Content-Length`
//! - Typed headers with per-kind grammars and a mandatory-header registry
//! - `{name}` path templates, first registered route wins
//! - Content codecs keyed by `Content-Type`, JSON built in
//! - Declarative handlers: ordered [`Binding`]s + a callable
//! - One tokio task per connection, graceful shutdown on SIGTERM / Ctrl-C
//!
//! ## What it does not
//!
//! Keep-alive, pipelining, chunked transfer coding, `100-continue`, HTTP/2,
//! TLS, caching and authentication. Each connection carries one request.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use serde_json::{Value, json};
//! use trellis::{
//!     Args, Binding, Dispatcher, Error, HandlerMeta, Json, Protocol, RouteMeta, Server,
//!     ServerOptions, TypeTag,
//! };
//!
//! #[derive(Deserialize)]
//! struct NewUser { name: String }
//!
//! async fn get_user(args: Args) -> Result<Value, Error> {
//!     let id: i32 = args.get(0)?;
//!     Ok(json!({ "id": id }))
//! }
//!
//! async fn create_user(args: Args) -> Result<Json<Value>, Error> {
//!     let user: NewUser = args.json(0)?;
//!     Ok(Json(json!({ "created": user.name })))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let mut app = Dispatcher::new(Protocol::default());
//!     app.register(
//!         "/api/users",
//!         RouteMeta::get(["/{id}"]),
//!         HandlerMeta::new([Binding::path("id", TypeTag::Int)], get_user),
//!     )?;
//!     app.register(
//!         "/api/users",
//!         RouteMeta::post([""]),
//!         HandlerMeta::new([Binding::body("user", TypeTag::Json)], create_user),
//!     )?;
//!
//!     Server::bind(ServerOptions::default()).await?.serve(app).await
//! }
//! ```

mod codec;
mod config;
mod connection;
mod dispatch;
mod error;
mod handler;
mod header;
mod method;
mod path;
mod protocol;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod middleware;

pub use codec::{BodyCodec, ContentCodecs, ContentType, JsonCodec, TextCodec};
pub use config::ServerOptions;
pub use dispatch::{
    Arg, Args, Binding, Dispatcher, FromArg, HandlerMeta, IntoReply, Json, Reply, ReturnType, RouteMeta,
    Source, TypeTag, normalize_path,
};
pub use error::Error;
pub use handler::Handler;
pub use header::{ConnectionMode, Header, HeaderKind, HeaderRegistry, HeaderSpec, HeaderValue, Headers, Side};
pub use method::Method;
pub use path::PathMatcher;
pub use protocol::{DEFAULT_SERVER_NAME, Protocol};
pub use request::{Params, Request};
pub use response::{Body, IntoResponse, Response, ResponseBuilder};
pub use router::{Route, Router};
pub use server::Server;
pub use status::Status;
