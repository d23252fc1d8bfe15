//! TCP listener, accept loop and graceful shutdown.
//!
//! # Lifecycle
//!
//! 1. [`Server::bind`] resolves `host`, then tries `port`, `port + 1`, … up
//!    to `max_port_attempts` times until a listener binds.
//! 2. [`Server::serve`] accepts connections and spawns one task per socket.
//!    A failing connection never takes the accept loop down with it.
//! 3. On SIGTERM or Ctrl-C the loop stops accepting, waits for in-flight
//!    connections to finish, and returns.
//!
//! In-flight handlers are never cancelled; a stuck handler holds shutdown
//! until the process is killed. Put a deadline on `main` if that matters.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket, lookup_host};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::ServerOptions;
use crate::connection::serve_connection;
use crate::dispatch::Dispatcher;
use crate::error::Error;

/// A bound HTTP server.
pub struct Server {
    listener: TcpListener,
    options: ServerOptions,
}

impl Server {
    /// Binds according to `options`, moving up one port at a time while the
    /// port is taken.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use trellis::{Server, ServerOptions};
    ///
    /// # async fn run() -> Result<(), trellis::Error> {
    /// let server = Server::bind(ServerOptions::default().with_addr("0.0.0.0", 3000)).await?;
    /// println!("listening on {}", server.local_addr()?);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn bind(options: ServerOptions) -> Result<Self, Error> {
        options.validate()?;

        let initial = options.port;
        let mut last_error = None;
        for attempt in 0..options.max_port_attempts {
            let Some(port) = initial.checked_add(attempt) else { break };
            match try_bind(&options.host, port, options.max_connections).await {
                Ok(listener) => {
                    if attempt > 0 {
                        info!(initial, port, "bound after moving off a busy port");
                    }
                    return Ok(Self { listener, options });
                }
                Err(e) => {
                    warn!(port, "bind failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error.map_or_else(|| "no port left to try".to_string(), |e| e.to_string());
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            format!(
                "failed to bind after {} attempts, initial port {initial}: {reason}",
                options.max_port_attempts
            ),
        )))
    }

    /// The address actually bound, which differs from the configured one
    /// after a port retry or with port `0`.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    pub fn options(&self) -> &ServerOptions { &self.options }

    /// Serves until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, dispatcher: Dispatcher) -> Result<(), Error> {
        self.serve_with_shutdown(dispatcher, shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains.
    ///
    /// `options.server_name` becomes the default `Server` response header.
    pub async fn serve_with_shutdown<F>(self, mut dispatcher: Dispatcher, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        dispatcher.set_server_name(&self.options.server_name);
        let dispatcher = Arc::new(dispatcher);
        let options = Arc::new(self.options);

        info!(%addr, routes = dispatcher.router().routes().len(), "trellis listening");

        let mut tasks = JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown is checked first so a queued backlog cannot delay it.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let dispatcher = Arc::clone(&dispatcher);
                    let options = Arc::clone(&options);
                    tasks.spawn(async move {
                        serve_connection(stream, peer, &dispatcher, &options).await;
                    });
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!("connection task failed: {e}");
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("connection task failed: {e}");
            }
        }

        info!(%addr, "trellis stopped");
        Ok(())
    }
}

async fn try_bind(host: &str, port: u16, backlog: u32) -> std::io::Result<TcpListener> {
    let addr = lookup_host((host, port)).await?.next().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, format!("{host} did not resolve"))
    })?;
    let socket = if addr.is_ipv4() { TcpSocket::new_v4()? } else { TcpSocket::new_v6()? };
    #[cfg(unix)]
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(backlog)
}

/// Resolves on the first shutdown signal the process receives: SIGTERM on
/// Unix, Ctrl-C everywhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
