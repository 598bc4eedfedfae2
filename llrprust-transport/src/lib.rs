//! Transport layer for LLRP
//!
//! Provides the TCP link to a reader, split into independent read and
//! write halves so a dedicated receive path can run while command
//! senders share a serialized writer.

pub mod error;
pub mod tcp;

pub use error::{Error, Result};
pub use tcp::TcpTransport;

use async_trait::async_trait;
use bytes::BytesMut;

/// Inbound half of an established link
#[async_trait]
pub trait LinkReader: Send {
    /// Append whatever the transport has to `buf`, returning the byte
    /// count
    ///
    /// Blocks until data arrives; a clean EOF surfaces as
    /// [`Error::ConnectionClosed`].
    async fn read_into(&mut self, buf: &mut BytesMut) -> Result<usize>;
}

/// Outbound half of an established link
///
/// Callers must serialize access so no two frames interleave on the
/// wire.
#[async_trait]
pub trait LinkWriter: Send {
    /// Write one complete encoded frame
    async fn write_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Gracefully shut down the outbound side
    async fn shutdown(&mut self) -> Result<()>;
}

/// An established, split link
pub struct Link {
    pub reader: Box<dyn LinkReader>,
    pub writer: Box<dyn LinkWriter>,
}

/// Transport trait for establishing links to a reader
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect and split into reader/writer halves
    async fn connect(&self) -> Result<Link>;

    /// Get remote address
    fn remote_addr(&self) -> String;
}
