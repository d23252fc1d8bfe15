//! Shared utilities for integration tests: a live server on an ephemeral
//! port and a raw TCP client.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use trellis::{Dispatcher, Server, ServerOptions};

/// A running server. Dropping the shutdown sender stops it.
pub struct Running {
    pub addr: SocketAddr,
    pub shutdown: oneshot::Sender<()>,
    pub task: JoinHandle<Result<(), trellis::Error>>,
}

/// Test defaults: ephemeral port, quiet, short timeout.
pub fn options() -> ServerOptions {
    ServerOptions {
        log_requests: false,
        read_timeout_ms: 2_000,
        server_name: "trellis-test".to_owned(),
        ..ServerOptions::default().with_addr("127.0.0.1", 0)
    }
}

/// Binds `127.0.0.1:0` and serves `app` in the background.
pub async fn start(app: Dispatcher) -> Running {
    start_with(app, options()).await
}

pub async fn start_with(app: Dispatcher, options: ServerOptions) -> Running {
    let server = Server::bind(options).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (shutdown, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(server.serve_with_shutdown(app, async move {
        let _ = rx.await;
    }));
    Running { addr, shutdown, task }
}

/// Sends `raw`, half-closes, and reads the full response.
pub async fn send_raw(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    stream.shutdown().await.unwrap();
    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .expect("response within 5s")
        .unwrap();
    String::from_utf8(out).unwrap()
}

/// A parsed response: status code, header lines, body.
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Reply {
    pub fn parse(raw: &str) -> Self {
        let (head, body) = raw.split_once("\r\n\r\n").expect("blank line after head");
        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap();
        let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();
        let headers = lines
            .map(|l| {
                let (k, v) = l.split_once(": ").unwrap();
                (k.to_owned(), v.to_owned())
            })
            .collect();
        Self { status, headers, body: body.to_owned() }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Formats a request with `Host` and, when `body` is given, JSON headers.
pub fn request(method: &str, path: &str, body: Option<&str>) -> String {
    match body {
        Some(body) => format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ),
        None => format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n"),
    }
}
