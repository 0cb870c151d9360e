//! Stream connection to a console endpoint.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;

use super::config::{ConsoleTarget, Endpoint};
use crate::error::{Result, TransportError};

/// An open console stream.
///
/// Wraps the concrete socket types so the rest of the crate only deals
/// with `AsyncRead + AsyncWrite`.
#[derive(Debug)]
pub enum Connection {
    /// TCP connection.
    Tcp(TcpStream),

    /// Unix socket connection.
    #[cfg(unix)]
    Unix(UnixStream),
}

/// Open a connection to `target`, bounded by its connect timeout.
///
/// Makes exactly one attempt. Failures are classified into refused,
/// timed out, not found, or a generic connection failure.
pub async fn connect(target: &ConsoleTarget) -> Result<Connection> {
    let attempt = async {
        match &target.endpoint {
            Endpoint::Tcp { host, port } => TcpStream::connect((host.as_str(), *port))
                .await
                .map(Connection::Tcp),
            #[cfg(unix)]
            Endpoint::Unix(path) => UnixStream::connect(path).await.map(Connection::Unix),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "unix sockets are not supported on this platform",
            )),
        }
    };

    connect_with(target, attempt).await
}

/// Drive a connection `attempt` to `target` under its connect timeout.
pub(crate) async fn connect_with<F>(target: &ConsoleTarget, attempt: F) -> Result<Connection>
where
    F: Future<Output = io::Result<Connection>>,
{
    let address = target.address();
    debug!(
        "connecting to {} (timeout {:?})",
        address, target.connect_timeout
    );

    let connection = tokio::time::timeout(target.connect_timeout, attempt)
        .await
        .map_err(|_| TransportError::ConnectTimeout {
            address: address.clone(),
            timeout: target.connect_timeout,
        })?
        .map_err(|source| classify(address, target, source))?;

    debug!("connected to {}", target.address());
    Ok(connection)
}

fn classify(address: String, target: &ConsoleTarget, source: io::Error) -> TransportError {
    match source.kind() {
        io::ErrorKind::ConnectionRefused => TransportError::ConnectionRefused { address },
        io::ErrorKind::NotFound => TransportError::NotFound { address },
        io::ErrorKind::TimedOut => TransportError::ConnectTimeout {
            address,
            timeout: target.connect_timeout,
        },
        _ => TransportError::ConnectionFailed { address, source },
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            #[cfg(unix)]
            Connection::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Connection::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            #[cfg(unix)]
            Connection::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            #[cfg(unix)]
            Connection::Unix(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Connection::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            #[cfg(unix)]
            Connection::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}
