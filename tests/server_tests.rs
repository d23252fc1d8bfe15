//! End-to-end tests over real sockets.

mod common;

use common::{Reply, options, request, send_raw, start, start_with};
use serde_json::{Value, json};
use trellis::{
    Args, Binding, Dispatcher, Error, HandlerMeta, Json, Method, Protocol, Request, Response, RouteMeta,
    ServerOptions, TypeTag,
};

async fn hello(_: Request) -> &'static str {
    "hello"
}

async fn boom(_: Request) -> Result<String, Error> {
    Err(Error::handler("connection pool exhausted: db-01"))
}

fn app() -> Dispatcher {
    let mut app = Dispatcher::new(Protocol::new("trellis-test"));
    app.route(Method::Get, "/hello", hello).unwrap();
    app.route(Method::Get, "/boom", boom).unwrap();
    app.register(
        "/api/users",
        RouteMeta::post([""]),
        HandlerMeta::new([Binding::body("user", TypeTag::Json)], |args: Args| async move {
            let user: Value = args.get(0)?;
            Ok::<_, Error>(Json(json!({ "greeting": format!("hi {}", user["name"].as_str().unwrap_or("?")) })))
        }),
    )
    .unwrap();
    app
}

#[tokio::test]
async fn plain_text_round_trip() {
    let server = start(app()).await;
    let raw = send_raw(server.addr, request("GET", "/hello", None).as_bytes()).await;

    assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"), "{raw}");
    let reply = Reply::parse(&raw);
    assert_eq!(reply.body, "hello");
    assert_eq!(reply.header("Content-Type"), Some("text/plain"));
    assert_eq!(reply.header("Content-Length"), Some("5"));
    assert_eq!(reply.header("Connection"), Some("close"));
    assert_eq!(reply.header("Cache-Control"), Some("no-cache"));
    assert_eq!(reply.header("Server"), Some("trellis-test"));
}

#[tokio::test]
async fn server_header_comes_from_options() {
    let mut app = Dispatcher::new(Protocol::default());
    app.route(Method::Get, "/hello", hello).unwrap();
    let server = start_with(app, ServerOptions { server_name: "custom-name".to_owned(), ..options() }).await;
    let reply = Reply::parse(&send_raw(server.addr, request("GET", "/hello", None).as_bytes()).await);
    assert_eq!(reply.header("Server"), Some("custom-name"));
}

#[tokio::test]
async fn header_order_follows_insertion() {
    let server = start(app()).await;
    let reply = Reply::parse(&send_raw(server.addr, request("GET", "/hello", None).as_bytes()).await);
    let names: Vec<_> = reply.headers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, ["Content-Type", "Cache-Control", "Connection", "Content-Length", "Server"]);
}

#[tokio::test]
async fn json_body_is_bound_and_answered_as_json() {
    let server = start(app()).await;
    let raw = request("POST", "/api/users", Some(r#"{"name":"Ann","email":"a@b.com"}"#));
    let reply = Reply::parse(&send_raw(server.addr, raw.as_bytes()).await);

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some("application/json"));
    let body: Value = serde_json::from_str(&reply.body).unwrap();
    assert_eq!(body, json!({ "greeting": "hi Ann" }));
    assert_eq!(reply.header("Content-Length"), Some(reply.body.len().to_string().as_str()));
}

#[tokio::test]
async fn unknown_route_is_404_naming_method_and_path() {
    let server = start(app()).await;
    let reply = Reply::parse(&send_raw(server.addr, request("GET", "/nope", None).as_bytes()).await);
    assert_eq!(reply.status, 404);
    assert!(reply.body.contains("GET"), "{}", reply.body);
    assert!(reply.body.contains("/nope"), "{}", reply.body);
}

#[tokio::test]
async fn handler_failure_is_500_without_details() {
    let server = start(app()).await;
    let reply = Reply::parse(&send_raw(server.addr, request("GET", "/boom", None).as_bytes()).await);
    assert_eq!(reply.status, 500);
    assert!(!reply.body.contains("db-01"));
}

#[tokio::test]
async fn malformed_requests_still_get_a_response() {
    let server = start(app()).await;

    let missing_host = Reply::parse(&send_raw(server.addr, b"GET /hello HTTP/1.1\r\n\r\n").await);
    assert_eq!(missing_host.status, 400);

    let bad_line = Reply::parse(&send_raw(server.addr, b"garbage\r\n\r\n").await);
    assert_eq!(bad_line.status, 400);

    let unknown_method = Reply::parse(&send_raw(server.addr, b"BREW /pot HTTP/1.1\r\nHost: h\r\n\r\n").await);
    assert_eq!(unknown_method.status, 400);

    let head = Reply::parse(&send_raw(server.addr, request("HEAD", "/hello", None).as_bytes()).await);
    assert_eq!(head.status, 400);
}

#[tokio::test]
async fn bare_lf_requests_are_accepted() {
    let server = start(app()).await;
    let raw = send_raw(server.addr, b"GET /hello HTTP/1.1\nHost: h\n\n").await;
    assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"), "{raw}");
}

#[tokio::test]
async fn concurrent_connections_are_isolated() {
    let server = start(app()).await;
    let mut clients = tokio::task::JoinSet::new();
    for i in 0..16 {
        let addr = server.addr;
        clients.spawn(async move {
            let path = if i % 2 == 0 { "/hello" } else { "/nope" };
            (i, Reply::parse(&send_raw(addr, request("GET", path, None).as_bytes()).await).status)
        });
    }
    while let Some(joined) = clients.join_next().await {
        let (i, status) = joined.unwrap();
        assert_eq!(status, if i % 2 == 0 { 200 } else { 404 });
    }
}

#[tokio::test]
async fn shutdown_stops_the_server() {
    let server = start(app()).await;
    server.shutdown.send(()).unwrap();
    server.task.await.unwrap().unwrap();
    assert!(tokio::net::TcpStream::connect(server.addr).await.is_err());
}

#[tokio::test]
async fn explicit_response_passes_through() {
    let mut app = app();
    app.register(
        "/teapot",
        RouteMeta::get(Vec::<String>::new()),
        HandlerMeta::new([], |_: Args| async { Response::with_status(trellis::Status::ImATeapot) }),
    )
    .unwrap();
    let server = start(app).await;
    let reply = Reply::parse(&send_raw(server.addr, request("GET", "/teapot", None).as_bytes()).await);
    assert_eq!(reply.status, 418);
    assert_eq!(reply.body, "");
    assert_eq!(reply.header("Content-Length"), Some("0"));
}
