//! # llrprust
//!
//! Rust client for EPCGlobal LLRP (Low Level Reader Protocol) RFID
//! readers.
//!
//! ## Features
//!
//! - Type-safe LLRP v1.0.1 message and parameter codec
//! - Async/await API using Tokio
//! - Request/response correlation with per-call timeouts
//! - Automatic keepalive acknowledgement and liveness watchdog
//! - ROSpec/AccessSpec lifecycle tracking
//! - Tag reports and reader events over broadcast channels
//!
//! ## Quick Start
//!
//! ```no_run
//! use llrprust::{Reader, RoSpec};
//!
//! #[tokio::main]
//! async fn main() -> llrprust::Result<()> {
//!     // Connect to reader
//!     let mut reader = Reader::new("192.168.1.50", 5084);
//!     reader.connect().await?;
//!
//!     // Run an inventory on all antennas
//!     let mut tags = reader.tag_reports();
//!     reader.add_rospec(RoSpec::immediate_inventory(1, vec![0])).await?;
//!     reader.enable_rospec(1).await?;
//!     reader.start_rospec(1).await?;
//!
//!     while let Ok(tag) = tags.recv().await {
//!         println!("{}", tag.epc_hex());
//!     }
//!
//!     // Disconnect
//!     reader.close().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod reader;

// Re-exports
pub use error::{Error, Result};
pub use reader::Reader;

// Re-export protocol types
pub use llrprust_core::access::{AccessSpec, AccessSpecState, OpSpec, OpSpecResult};
pub use llrprust_core::capabilities::{ReaderCapabilities, RequestedCapabilities};
pub use llrprust_core::config::{ConfigRequest, KeepaliveSpec, ReaderConfig};
pub use llrprust_core::report::TagReportData;
pub use llrprust_core::rospec::{RoSpec, RoSpecState};
pub use llrprust_core::session::ConnectionState;
pub use llrprust_core::{Message, MessageBody, StatusCode};
pub use llrprust_types::{Epc, ReaderEvent};
