//! Type definitions for llrprust

pub mod epc;
pub mod error;
pub mod event;

pub use epc::Epc;
pub use error::{Error, Result};
pub use event::ReaderEvent;
