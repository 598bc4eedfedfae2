//! Application-facing reader event summaries
//!
//! These are the events pushed to observers by the connection layer:
//! protocol event notifications flattened into one enum, plus the
//! connection-lifecycle events the engine itself raises. Observers never
//! mutate engine state.

use std::fmt;

/// One event from the reader or the connection layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// The reader answered a connection attempt; status 0 is success
    ConnectionAttempt { status: u16 },

    /// The reader announced it is closing the connection
    ConnectionClose,

    /// The engine lost the connection (transport failure, codec
    /// desynchronization, or keepalive timeout)
    ConnectionLost,

    /// An antenna was connected or disconnected
    Antenna { antenna_id: u16, connected: bool },

    /// A GPI port changed level
    Gpi { port: u16, high: bool },

    /// A ROSpec started running on the reader
    RoSpecStarted { rospec_id: u32 },

    /// A ROSpec finished running
    RoSpecEnded { rospec_id: u32 },

    /// A ROSpec was preempted by a higher-priority one
    RoSpecPreempted {
        rospec_id: u32,
        preempting_rospec_id: u32,
    },

    /// An AISpec within a ROSpec ran to completion
    AiSpecEnded { rospec_id: u32, spec_index: u16 },

    /// The reader raised an exception outside the request/response path
    ReaderException { message: String },

    /// The reader's report buffer is filling up
    ReportBufferWarning { fill_percentage: u8 },

    /// The reader dropped reports on buffer overflow
    ReportBufferOverflow,

    /// The reader sent an ERROR_MESSAGE not tied to a pending request
    ReaderError { status: u16, description: String },
}

impl fmt::Display for ReaderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionAttempt { status } => {
                write!(f, "connection attempt (status {})", status)
            }
            Self::ConnectionClose => write!(f, "connection close announced"),
            Self::ConnectionLost => write!(f, "connection lost"),
            Self::Antenna { antenna_id, connected } => write!(
                f,
                "antenna {} {}",
                antenna_id,
                if *connected { "connected" } else { "disconnected" }
            ),
            Self::Gpi { port, high } => {
                write!(f, "GPI {} {}", port, if *high { "high" } else { "low" })
            }
            Self::RoSpecStarted { rospec_id } => write!(f, "ROSpec {} started", rospec_id),
            Self::RoSpecEnded { rospec_id } => write!(f, "ROSpec {} ended", rospec_id),
            Self::RoSpecPreempted { rospec_id, preempting_rospec_id } => write!(
                f,
                "ROSpec {} preempted by {}",
                rospec_id, preempting_rospec_id
            ),
            Self::AiSpecEnded { rospec_id, spec_index } => {
                write!(f, "AISpec {} of ROSpec {} ended", spec_index, rospec_id)
            }
            Self::ReaderException { message } => write!(f, "reader exception: {}", message),
            Self::ReportBufferWarning { fill_percentage } => {
                write!(f, "report buffer at {}%", fill_percentage)
            }
            Self::ReportBufferOverflow => write!(f, "report buffer overflow"),
            Self::ReaderError { status, description } => {
                write!(f, "reader error {}: {}", status, description)
            }
        }
    }
}
