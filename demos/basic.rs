//! Minimal trellis example: an in-memory user controller.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic [config.toml]
//!
//! Try:
//!   curl http://localhost:8080/api/users
//!   curl http://localhost:8080/api/users/1
//!   curl -X POST http://localhost:8080/api/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"Ann","email":"a@b.com"}'
//!   curl -X PUT http://localhost:8080/api/users/2 \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"Jane Roe","email":"jane@example.com"}'
//!   curl -X DELETE http://localhost:8080/api/users/1
//!   curl 'http://localhost:8080/hello?name=you'

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;
use trellis::{
    Args, Binding, Dispatcher, Error, HandlerMeta, Json, Method, Protocol, Request, Response, RouteMeta,
    Server, ServerOptions, TypeTag, middleware,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
struct User {
    #[serde(default)]
    id: Option<String>,
    name: String,
    email: String,
}

type Users = Arc<RwLock<IndexMap<String, User>>>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = match std::env::args().nth(1) {
        Some(path) => ServerOptions::load(path)?,
        None => ServerOptions::default(),
    };

    let mut app = Dispatcher::new(Protocol::default());
    app.middleware(middleware::Trace);
    app.route(Method::Get, "/hello", hello)?;
    user_controller(&mut app, seed())?;

    Server::bind(options).await?.serve(app).await
}

// GET /hello?name=…: a plain router handler, no bindings.
async fn hello(req: Request) -> Response {
    let name = req.query("name").unwrap_or("world");
    Response::text(format!("hello, {name}"))
}

fn seed() -> Users {
    let users = [
        User { id: Some("1".into()), name: "John Doe".into(), email: "john@example.com".into() },
        User { id: Some("2".into()), name: "Jane Smith".into(), email: "jane@example.com".into() },
    ];
    let map = users.into_iter().filter_map(|u| Some((u.id.clone()?, u))).collect();
    Arc::new(RwLock::new(map))
}

fn user_controller(app: &mut Dispatcher, users: Users) -> Result<(), Error> {
    const PREFIX: &str = "/api/users";

    let store = Arc::clone(&users);
    app.register(
        PREFIX,
        RouteMeta::get(["/"]),
        HandlerMeta::new([], move |_: Args| {
            let store = Arc::clone(&store);
            async move { Json(store.read().await.values().cloned().collect::<Vec<_>>()) }
        }),
    )?;

    let store = Arc::clone(&users);
    app.register(
        PREFIX,
        RouteMeta::get(["/{id}"]),
        HandlerMeta::new([Binding::path("id", TypeTag::String)], move |args: Args| {
            let store = Arc::clone(&store);
            async move {
                let id: String = args.get(0)?;
                Ok::<_, Error>(store.read().await.get(&id).cloned().map(Json))
            }
        }),
    )?;

    let store = Arc::clone(&users);
    app.register(
        PREFIX,
        RouteMeta::post(["/"]),
        HandlerMeta::new([Binding::body("user", TypeTag::Json)], move |args: Args| {
            let store = Arc::clone(&store);
            async move {
                let mut user: User = args.json(0)?;
                let mut users = store.write().await;
                let id = (users.len() + 1).to_string();
                user.id = Some(id.clone());
                users.insert(id, user.clone());
                Ok::<_, Error>(Json(user))
            }
        }),
    )?;

    let store = Arc::clone(&users);
    app.register(
        PREFIX,
        RouteMeta::put(["/{id}"]),
        HandlerMeta::new(
            [Binding::path("id", TypeTag::String), Binding::body("user", TypeTag::Json)],
            move |args: Args| {
                let store = Arc::clone(&store);
                async move {
                    let id: String = args.get(0)?;
                    let mut user: User = args.json(1)?;
                    let mut users = store.write().await;
                    let Some(slot) = users.get_mut(&id) else { return Ok::<_, Error>(None) };
                    user.id = Some(id);
                    *slot = user.clone();
                    Ok(Some(Json(user)))
                }
            },
        ),
    )?;

    let store = users;
    app.register(
        PREFIX,
        RouteMeta::delete(["/{id}"]),
        HandlerMeta::new([Binding::path("id", TypeTag::String)], move |args: Args| {
            let store = Arc::clone(&store);
            async move {
                let id: String = args.get(0)?;
                Ok::<_, Error>(match store.write().await.shift_remove(&id) {
                    Some(_) => Response::text("User deleted successfully"),
                    None => Response::not_found("User not found"),
                })
            }
        }),
    )
}
