//! Per-connection worker: read one request, dispatch it, write one response.
//!
//! Each accepted socket gets its own task running [`serve_connection`].
//! Every failure stays inside that task: I/O errors and timeouts are logged
//! and drop the connection, anything that produced at least one byte of
//! request gets an error response instead of a silent close.

use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::ServerOptions;
use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::request::{Request, head_len};
use crate::response::Response;

const READ_CHUNK: usize = 4 * 1024;

/// How reading the request ended.
enum Read {
    /// Head found and the declared body read, or the peer stopped sending
    /// before finishing the head.
    Complete,
    /// The peer closed before sending anything.
    Empty,
}

pub(crate) async fn serve_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    dispatcher: &Dispatcher,
    options: &ServerOptions,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_CHUNK);

    let response = match read_request(&mut stream, &mut buf, options).await {
        Ok(Read::Empty) => {
            debug!(%peer, "connection closed before any request");
            return;
        }
        Ok(Read::Complete) => match Request::parse(&buf, dispatcher.protocol()) {
            Ok(req) => {
                let (method, path) = (req.method(), req.path().to_owned());
                let res = dispatcher.dispatch(req).await;
                if options.log_requests {
                    info!(%peer, %method, path = %path, status = res.status().code(), "request served");
                }
                res
            }
            Err(err) => {
                warn!(%peer, error = %err, "unparseable request");
                err.into_response()
            }
        },
        Err(err @ (Error::HeadTooLarge(_) | Error::BodyTooLarge(_) | Error::IncompleteBody { .. })) => {
            warn!(%peer, error = %err, "rejecting request");
            err.into_response()
        }
        Err(err) => {
            warn!(%peer, error = %err, "dropping connection");
            return;
        }
    };

    respond(&mut stream, peer, response, dispatcher).await;
    if let Err(e) = stream.shutdown().await {
        debug!(%peer, "shutdown error: {e}");
    }
}

/// Writes `response`. If it cannot be encoded, a bare 500 goes out instead.
async fn respond<S>(stream: &mut S, peer: SocketAddr, response: Response, dispatcher: &Dispatcher)
where
    S: AsyncWrite + Unpin,
{
    let protocol = dispatcher.protocol();
    match response.write_to(stream, protocol).await {
        Ok(()) => {}
        Err(Error::Io(e)) => error!(%peer, "write error: {e}"),
        Err(err) => {
            error!(%peer, error = %err, "response could not be encoded");
            if let Err(e) = Response::internal_server_error().write_to(stream, protocol).await {
                error!(%peer, "write error: {e}");
            }
        }
    }
}

/// Fills `buf` with the request head and the declared body. Each read is
/// bounded by the configured timeout.
async fn read_request<S>(stream: &mut S, buf: &mut BytesMut, options: &ServerOptions) -> Result<Read, Error>
where
    S: AsyncRead + Unpin,
{
    let head_end = loop {
        if let Some((head, sep)) = head_len(buf) {
            if head > options.max_head_bytes {
                return Err(Error::HeadTooLarge(options.max_head_bytes));
            }
            break head + sep;
        }
        if buf.len() > options.max_head_bytes {
            return Err(Error::HeadTooLarge(options.max_head_bytes));
        }
        if read_some(stream, buf, options).await? == 0 {
            // No blank line: parse whatever arrived.
            return Ok(if buf.is_empty() { Read::Empty } else { Read::Complete });
        }
    };

    let body_len = declared_length(&buf[..head_end]);
    if body_len > options.max_body_bytes {
        return Err(Error::BodyTooLarge(options.max_body_bytes));
    }
    let wanted = head_end + body_len;
    while buf.len() < wanted {
        if read_some(stream, buf, options).await? == 0 {
            return Err(Error::IncompleteBody { expected: body_len, received: buf.len() - head_end });
        }
    }
    Ok(Read::Complete)
}

async fn read_some<S>(stream: &mut S, buf: &mut BytesMut, options: &ServerOptions) -> Result<usize, Error>
where
    S: AsyncRead + Unpin,
{
    buf.reserve(READ_CHUNK);
    match timeout(options.read_timeout(), stream.read_buf(buf)).await {
        Ok(read) => Ok(read?),
        Err(_) => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("no data within {} ms", options.read_timeout_ms),
        ))),
    }
}

/// Pre-scan of the head for `Content-Length`, so the worker knows how much
/// body to wait for. The real parse happens later in [`Request::parse`].
fn declared_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<u64>().ok())
        .map_or(0, |len| usize::try_from(len).unwrap_or(usize::MAX))
}
