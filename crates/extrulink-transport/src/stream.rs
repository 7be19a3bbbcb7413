use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::unix::pipe;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};

/// The read side of a feed: implements `AsyncRead`.
///
/// On a named pipe this is the FIFO's read end; on TCP it is the connected
/// socket.
pub struct InboundStream {
    inner: InboundInner,
}

enum InboundInner {
    #[cfg(unix)]
    Pipe(pipe::Receiver),
    Tcp(TcpStream),
}

/// The write side of a command link: implements `AsyncWrite`.
pub struct OutboundStream {
    inner: OutboundInner,
}

enum OutboundInner {
    #[cfg(unix)]
    Pipe(pipe::Sender),
    Tcp(TcpStream),
}

/// Open an endpoint for reading.
///
/// A FIFO is opened without waiting for a writer; reads stay pending until
/// one connects, and end-of-stream is reported once it disconnects.
pub async fn open_inbound(endpoint: &Endpoint) -> Result<InboundStream> {
    let inner = match endpoint {
        #[cfg(unix)]
        Endpoint::NamedPipe(path) => {
            let rx = pipe::OpenOptions::new()
                .open_receiver(path)
                .map_err(|source| open_error(endpoint, source))?;
            InboundInner::Pipe(rx)
        }
        #[cfg(not(unix))]
        Endpoint::NamedPipe(_) => return Err(TransportError::Unsupported("named pipe")),
        Endpoint::Tcp(address) => {
            let stream = TcpStream::connect(address.as_str())
                .await
                .map_err(|source| open_error(endpoint, source))?;
            InboundInner::Tcp(stream)
        }
    };
    debug!(%endpoint, "opened for reading");
    Ok(InboundStream { inner })
}

/// Open an endpoint for writing.
///
/// Opening a FIFO fails when no reader has it open.
pub async fn open_outbound(endpoint: &Endpoint) -> Result<OutboundStream> {
    let inner = match endpoint {
        #[cfg(unix)]
        Endpoint::NamedPipe(path) => {
            let tx = pipe::OpenOptions::new()
                .open_sender(path)
                .map_err(|source| open_error(endpoint, source))?;
            OutboundInner::Pipe(tx)
        }
        #[cfg(not(unix))]
        Endpoint::NamedPipe(_) => return Err(TransportError::Unsupported("named pipe")),
        Endpoint::Tcp(address) => {
            let stream = TcpStream::connect(address.as_str())
                .await
                .map_err(|source| open_error(endpoint, source))?;
            stream.set_nodelay(true)?;
            OutboundInner::Tcp(stream)
        }
    };
    debug!(%endpoint, "opened for writing");
    Ok(OutboundStream { inner })
}

fn open_error(endpoint: &Endpoint, source: io::Error) -> TransportError {
    TransportError::Open {
        endpoint: endpoint.to_string(),
        source,
    }
}

impl AsyncRead for InboundStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            InboundInner::Pipe(rx) => Pin::new(rx).poll_read(cx, buf),
            InboundInner::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for OutboundStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            OutboundInner::Pipe(tx) => Pin::new(tx).poll_write(cx, buf),
            OutboundInner::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            OutboundInner::Pipe(tx) => Pin::new(tx).poll_flush(cx),
            OutboundInner::Tcp(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            #[cfg(unix)]
            OutboundInner::Pipe(tx) => Pin::new(tx).poll_shutdown(cx),
            OutboundInner::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

impl std::fmt::Debug for InboundStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            #[cfg(unix)]
            InboundInner::Pipe(_) => "named-pipe",
            InboundInner::Tcp(_) => "tcp",
        };
        f.debug_struct("InboundStream").field("type", &kind).finish()
    }
}

impl std::fmt::Debug for OutboundStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            #[cfg(unix)]
            OutboundInner::Pipe(_) => "named-pipe",
            OutboundInner::Tcp(_) => "tcp",
        };
        f.debug_struct("OutboundStream").field("type", &kind).finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn tcp_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = Endpoint::tcp(listener.local_addr().unwrap().to_string());

        let server = tokio::spawn(async move {
            let (mut feed, _) = listener.accept().await.unwrap();
            feed.write_all(b"0102\n").await.unwrap();
            let (mut commands, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 3];
            commands.read_exact(&mut buf).await.unwrap();
            buf
        });

        let mut inbound = open_inbound(&endpoint).await.unwrap();
        let mut buf = [0u8; 5];
        inbound.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"0102\n");

        let mut outbound = open_outbound(&endpoint).await.unwrap();
        outbound.write_all(b"ack").await.unwrap();
        outbound.flush().await.unwrap();
        assert_eq!(&server.await.unwrap(), b"ack");
    }

    #[tokio::test]
    async fn tcp_connect_refused_is_open_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = open_inbound(&Endpoint::tcp(address)).await.unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
        assert!(err.io_source().is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fifo_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed");
        crate::fifo::create_fifo(&path, crate::fifo::DEFAULT_FIFO_MODE).unwrap();
        let endpoint = Endpoint::named_pipe(&path);

        let mut inbound = open_inbound(&endpoint).await.unwrap();
        let mut outbound = open_outbound(&endpoint).await.unwrap();
        outbound.write_all(b"12:00:00.000|1|2\n").await.unwrap();
        drop(outbound);

        let mut text = String::new();
        inbound.read_to_string(&mut text).await.unwrap();
        assert_eq!(text, "12:00:00.000|1|2\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fifo_without_reader_cannot_be_opened_for_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands");
        crate::fifo::create_fifo(&path, crate::fifo::DEFAULT_FIFO_MODE).unwrap();

        let err = open_outbound(&Endpoint::named_pipe(&path)).await.unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_fifo_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_inbound(&Endpoint::named_pipe(dir.path().join("absent")))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
    }
}
