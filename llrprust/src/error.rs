//! High-level error types
//!
//! Three failure classes flow through here and stay distinguishable:
//! codec errors ([`Error::Core`], fatal to the connection), protocol
//! status errors ([`Error::Status`], the command failed but the
//! connection is fine), and transport/lifecycle errors.

use llrprust_core::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Codec failure: the byte stream is desynchronized and the session
    /// has moved to the Error state
    #[error("Core protocol error: {0}")]
    Core(#[from] llrprust_core::Error),

    /// Socket-level failure
    #[error("Transport error: {0}")]
    Transport(#[from] llrprust_transport::Error),

    /// Local registry rejected the command before it reached the wire
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] llrprust_core::lifecycle::LifecycleError),

    /// The reader answered with a non-success LLRPStatus
    #[error("Reader returned {code}: {description}")]
    Status {
        code: StatusCode,
        description: String,
    },

    /// The reader refused the connection in its first event notification
    #[error("Reader refused connection (status {status})")]
    HandshakeRefused { status: u16 },

    /// No response within the per-call timeout
    #[error("Timeout waiting for response after {seconds}s")]
    Timeout { seconds: u64 },

    /// Not connected to a reader
    #[error("Not connected")]
    NotConnected,

    /// The session failed while the call was in flight
    #[error("Connection lost")]
    ConnectionLost,

    /// The reader answered with a message of the wrong type
    #[error("Unexpected response message type {message_type}")]
    UnexpectedResponse { message_type: u16 },
}

impl Error {
    /// Check if retrying the same command on this connection can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::Timeout { .. } | Self::Lifecycle(_)
        )
    }

    /// Check if the error implies the connection is gone
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self,
            Self::Core(_)
                | Self::Transport(_)
                | Self::ConnectionLost
                | Self::HandshakeRefused { .. }
                | Self::NotConnected
        )
    }

    /// The LLRP status code, when the reader reported one
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes_stay_distinct() {
        let status = Error::Status {
            code: StatusCode::NoSuchRoSpec,
            description: "no such spec".into(),
        };
        assert!(status.is_recoverable());
        assert!(!status.requires_reconnect());
        assert_eq!(status.status_code(), Some(StatusCode::NoSuchRoSpec));

        let transport = Error::Transport(llrprust_transport::Error::ConnectionClosed);
        assert!(!transport.is_recoverable());
        assert!(transport.requires_reconnect());
        assert_eq!(transport.status_code(), None);

        let codec = Error::Core(llrprust_core::Error::UnknownTvType(0x44));
        assert!(codec.requires_reconnect());
    }
}
