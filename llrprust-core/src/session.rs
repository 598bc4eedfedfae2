//! Session state for an LLRP connection
//!
//! A session tracks:
//! - The connection lifecycle state machine
//! - Message-id allocation for request/response correlation
//! - The last time a keepalive arrived from the reader

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use crate::error::{Error, Result};

/// Connection lifecycle state
///
/// `Error` is reachable from every non-terminal state on transport or
/// codec failure; `Closed` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// TCP connect in progress
    Connecting,

    /// Socket up, waiting for the reader's connection-attempt event
    Connected,

    /// Handshake complete, commands may be issued
    Operational,

    /// CLOSE_CONNECTION sent, waiting for the response or EOF
    Closing,

    /// Shut down cleanly
    Closed,

    /// Torn down by a transport, codec, or liveness failure
    Error,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Error)
    }
}

/// Session manager
///
/// Thread-safe and cheap to clone (Arc internally); the receive path,
/// watchdog, and command callers all observe the same state.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Next message id handed to a request
    message_id: AtomicU32,

    /// Current lifecycle state
    state: parking_lot::RwLock<ConnectionState>,

    /// When the last KEEPALIVE arrived
    last_keepalive: parking_lot::Mutex<Option<Instant>>,
}

impl Session {
    /// Message ids start at 1; id 0 is reserved for reader-originated
    /// messages
    pub const INITIAL_MESSAGE_ID: u32 = 1;

    /// Create a session in the `Connecting` state
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                message_id: AtomicU32::new(Self::INITIAL_MESSAGE_ID),
                state: parking_lot::RwLock::new(ConnectionState::Connecting),
                last_keepalive: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Get current state
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    pub fn is_operational(&self) -> bool {
        matches!(self.state(), ConnectionState::Operational)
    }

    /// Allocate the next message id
    ///
    /// Uniqueness within the in-flight window is the caller's
    /// responsibility; wrap-around past `u32::MAX` restarts at 1.
    pub fn next_message_id(&self) -> u32 {
        let id = self.inner.message_id.fetch_add(1, Ordering::AcqRel);
        if id == 0 {
            // Wrapped; skip the reserved id
            return self.inner.message_id.fetch_add(1, Ordering::AcqRel);
        }
        id
    }

    /// Record a keepalive arrival
    pub fn touch_keepalive(&self) {
        *self.inner.last_keepalive.lock() = Some(Instant::now());
    }

    /// When the last keepalive arrived, if any
    pub fn last_keepalive(&self) -> Option<Instant> {
        *self.inner.last_keepalive.lock()
    }

    /// Socket established: `Connecting -> Connected`
    pub fn socket_connected(&self) -> Result<()> {
        self.transition(ConnectionState::Connected, |s| {
            matches!(s, ConnectionState::Connecting)
        })
    }

    /// Handshake complete: `Connected -> Operational`
    pub fn operational(&self) -> Result<()> {
        self.transition(ConnectionState::Operational, |s| {
            matches!(s, ConnectionState::Connected)
        })
    }

    /// Shutdown requested: any non-terminal state `-> Closing`
    pub fn begin_close(&self) -> Result<()> {
        self.transition(ConnectionState::Closing, |s| !s.is_terminal())
    }

    /// Shutdown finished: `Closing -> Closed`
    pub fn closed(&self) -> Result<()> {
        self.transition(ConnectionState::Closed, |s| {
            matches!(s, ConnectionState::Closing)
        })
    }

    /// Fatal failure: any non-terminal state `-> Error`
    ///
    /// Returns false when the session was already terminal, so only one
    /// flow performs the teardown.
    pub fn fail(&self) -> bool {
        let mut state = self.inner.state.write();
        if state.is_terminal() {
            return false;
        }
        *state = ConnectionState::Error;
        true
    }

    fn transition(
        &self,
        next: ConnectionState,
        allowed: impl Fn(ConnectionState) -> bool,
    ) -> Result<()> {
        let mut state = self.inner.state.write();
        if !allowed(*state) {
            return Err(Error::InvalidField {
                context: "ConnectionState",
                value: *state as u32,
            });
        }
        *state = next;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_session_new() {
        let session = Session::new();
        assert_eq!(session.state(), ConnectionState::Connecting);
        assert!(!session.is_operational());
        assert!(session.last_keepalive().is_none());
    }

    #[test]
    fn test_session_lifecycle() {
        let session = Session::new();
        session.socket_connected().unwrap();
        assert_eq!(session.state(), ConnectionState::Connected);

        session.operational().unwrap();
        assert!(session.is_operational());

        session.begin_close().unwrap();
        assert_eq!(session.state(), ConnectionState::Closing);

        session.closed().unwrap();
        assert_eq!(session.state(), ConnectionState::Closed);
        assert!(session.state().is_terminal());
    }

    #[test]
    fn test_invalid_transitions() {
        let session = Session::new();

        // Cannot go operational before the socket is up
        assert!(session.operational().is_err());

        session.socket_connected().unwrap();
        // Cannot re-enter Connected
        assert!(session.socket_connected().is_err());
    }

    #[test]
    fn test_fail_is_one_shot() {
        let session = Session::new();
        session.socket_connected().unwrap();

        assert!(session.fail());
        assert_eq!(session.state(), ConnectionState::Error);

        // Second failure observes the terminal state
        assert!(!session.fail());
    }

    #[test]
    fn test_fail_after_close_is_ignored() {
        let session = Session::new();
        session.begin_close().unwrap();
        session.closed().unwrap();

        assert!(!session.fail());
        assert_eq!(session.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_message_id_generation() {
        let session = Session::new();
        assert_eq!(session.next_message_id(), 1);
        assert_eq!(session.next_message_id(), 2);
        assert_eq!(session.next_message_id(), 3);
    }

    #[test]
    fn test_keepalive_stamp() {
        let session = Session::new();
        session.touch_keepalive();
        assert!(session.last_keepalive().is_some());
    }

    #[test]
    fn test_session_clone_shares_state() {
        let session1 = Session::new();
        let session2 = session1.clone();

        session1.socket_connected().unwrap();
        assert_eq!(session2.state(), ConnectionState::Connected);

        session2.next_message_id();
        assert_eq!(session1.next_message_id(), 2);
    }
}
