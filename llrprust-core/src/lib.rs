//! # llrprust-core
//!
//! Core protocol implementation for EPCGlobal LLRP (Low Level Reader
//! Protocol) v1.0.1.
//!
//! This crate provides the low-level protocol primitives:
//! - Message framing with partial-frame reassembly
//! - The recursive TLV/TV parameter codec
//! - Typed parameter definitions (ROSpec, AccessSpec, capabilities,
//!   configuration, tag reports, reader events, vendor extensions)
//! - LLRP status codes
//! - The connection session state machine
//! - Client-side ROSpec/AccessSpec lifecycle registries

pub mod access;
pub mod capabilities;
pub mod codec;
pub mod config;
pub mod custom;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod message;
pub mod parameter;
pub mod report;
pub mod rospec;
pub mod session;
pub mod status;

pub use access::{AccessSpec, OpSpec, OpSpecResult};
pub use custom::CustomParameter;
pub use error::{Error, Result};
pub use message::{Message, MessageBody, MessageType};
pub use parameter::Parameter;
pub use report::TagReportData;
pub use rospec::RoSpec;
pub use session::{ConnectionState, Session};
pub use status::{LlrpStatus, StatusCode};

/// Default LLRP reader port
pub const DEFAULT_PORT: u16 = 5084;

/// Message header size
pub const HEADER_SIZE: usize = message::HEADER_SIZE;

/// LLRP protocol version spoken by this crate
pub const PROTOCOL_VERSION: u8 = message::PROTOCOL_VERSION;
