//! Server options, loadable from TOML.
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8080
//! max_port_attempts = 10
//! read_timeout_ms = 30000
//! max_connections = 100
//! max_head_bytes = 65536
//! max_body_bytes = 1048576
//! log_requests = true
//! server_name = "trellis"
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::protocol::DEFAULT_SERVER_NAME;

/// Listener and per-connection settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerOptions {
    /// Interface to bind. Host names are resolved at bind time.
    pub host: String,

    /// First port to try. `0` asks the OS for an ephemeral port.
    pub port: u16,

    /// How many consecutive ports to try when the first is taken.
    pub max_port_attempts: u16,

    /// Per-read deadline on a client socket. A read that times out drops
    /// the connection.
    pub read_timeout_ms: u64,

    /// Listen backlog: connections queued before `accept`.
    pub max_connections: u32,

    /// Upper bound on the request line plus headers.
    pub max_head_bytes: usize,

    /// Largest `Content-Length` accepted. Bigger requests get a 413 before
    /// any body is read.
    pub max_body_bytes: usize,

    /// Emit one `info` line per request.
    pub log_requests: bool,

    /// Default value of the `Server` response header.
    pub server_name: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_port_attempts: 10,
            read_timeout_ms: 30_000,
            max_connections: 100,
            max_head_bytes: 64 * 1024,
            max_body_bytes: 1024 * 1024,
            log_requests: true,
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }
}

impl ServerOptions {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        let options: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let mut problems = Vec::new();
        if self.host.trim().is_empty() {
            problems.push("host must not be empty");
        }
        if self.max_port_attempts == 0 {
            problems.push("max_port_attempts must be at least 1");
        }
        if self.read_timeout_ms == 0 {
            problems.push("read_timeout_ms must be positive");
        }
        if self.max_connections == 0 {
            problems.push("max_connections must be positive");
        }
        if self.max_head_bytes < 16 {
            problems.push("max_head_bytes is too small to hold a request line");
        }
        if self.max_body_bytes == 0 {
            problems.push("max_body_bytes must be positive");
        }
        if self.server_name.trim().is_empty() {
            problems.push("server_name must not be empty");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(problems.join(", ")))
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Chaining setters for the common knobs.
    pub fn with_addr(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}
