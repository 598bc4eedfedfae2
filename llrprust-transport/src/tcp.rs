//! TCP transport

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::{Link, LinkReader, LinkWriter, Transport, error::*};

/// TCP transport for LLRP readers
pub struct TcpTransport {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl TcpTransport {
    /// Create new TCP transport
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn resolve_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr_str, e)))?
            .collect();

        addrs
            .first()
            .copied()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr_str)))
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self) -> Result<Link> {
        let addr = self.resolve_addr().await?;

        debug!("Connecting to {}...", addr);

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)?
            .map_err(Error::Io)?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        debug!("Connected to {}", addr);

        let (read_half, write_half) = stream.into_split();

        Ok(Link {
            reader: Box::new(TcpLinkReader { read_half }),
            writer: Box::new(TcpLinkWriter { write_half }),
        })
    }

    fn remote_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

struct TcpLinkReader {
    read_half: OwnedReadHalf,
}

#[async_trait]
impl LinkReader for TcpLinkReader {
    async fn read_into(&mut self, buf: &mut BytesMut) -> Result<usize> {
        let n = self.read_half.read_buf(buf).await.map_err(Error::Io)?;

        if n == 0 {
            return Err(Error::ConnectionClosed);
        }

        trace!("Received {} bytes", n);
        Ok(n)
    }
}

struct TcpLinkWriter {
    write_half: OwnedWriteHalf,
}

#[async_trait]
impl LinkWriter for TcpLinkWriter {
    async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        trace!(
            "Sending {} bytes: {:02X?}",
            frame.len(),
            &frame[..frame.len().min(16)]
        );

        self.write_half.write_all(frame).await?;
        self.write_half.flush().await?;

        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        let _ = self.write_half.shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_transport_remote_addr() {
        let transport = TcpTransport::new("192.168.1.50", 5084);
        assert_eq!(transport.remote_addr(), "192.168.1.50:5084");
    }

    #[tokio::test]
    async fn test_tcp_transport_invalid_address() {
        let transport = TcpTransport::new("invalid..address", 5084)
            .with_connect_timeout(Duration::from_millis(100));

        let result = transport.connect().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_tcp_transport_loopback_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(&buf).await.unwrap();
        });

        let transport = TcpTransport::new(addr.ip().to_string(), addr.port());
        let mut link = transport.connect().await.unwrap();

        link.writer.write_frame(&[1, 2, 3, 4]).await.unwrap();

        let mut buf = BytesMut::new();
        while buf.len() < 4 {
            link.reader.read_into(&mut buf).await.unwrap();
        }
        assert_eq!(&buf[..], &[1, 2, 3, 4]);

        accept.await.unwrap();
    }

    #[tokio::test]
    async fn test_tcp_reader_eof_is_connection_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move {
            // Accept and immediately drop the socket
            let _ = listener.accept().await.unwrap();
        });

        let transport = TcpTransport::new(addr.ip().to_string(), addr.port());
        let mut link = transport.connect().await.unwrap();
        accept.await.unwrap();

        let mut buf = BytesMut::new();
        let result = link.reader.read_into(&mut buf).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }
}
