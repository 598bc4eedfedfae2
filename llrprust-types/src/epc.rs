//! Electronic Product Code value type

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An Electronic Product Code
///
/// Wraps the raw EPC bytes with hex parsing and formatting. Most Gen2
/// tags carry 96-bit (12-byte) EPCs, but any length is accepted.
///
/// # Examples
///
/// ```
/// use llrprust_types::Epc;
///
/// let epc: Epc = "8504700013684D573243363207702205".parse().unwrap();
/// assert_eq!(epc.len(), 16);
/// assert_eq!(epc.to_string(), "8504700013684D573243363207702205");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Epc(Vec<u8>);

impl Epc {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// EPC length in bits
    pub fn bit_count(&self) -> usize {
        self.0.len() * 8
    }
}

impl FromStr for Epc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes =
            hex::decode(s).map_err(|e| Error::Parse(format!("invalid EPC hex: {}", e)))?;
        Ok(Self(bytes))
    }
}

impl From<Vec<u8>> for Epc {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Epc {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for Epc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epc_parse_roundtrip() {
        let text = "8504700013684D573243363207702205";
        let epc: Epc = text.parse().unwrap();
        assert_eq!(epc.to_string(), text);
        assert_eq!(epc.bit_count(), 128);
    }

    #[test]
    fn test_epc_parse_lowercase() {
        let epc: Epc = "deadbeef".parse().unwrap();
        assert_eq!(epc.as_bytes(), &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(epc.to_string(), "DEADBEEF");
    }

    #[test]
    fn test_epc_parse_invalid() {
        assert!("not-hex".parse::<Epc>().is_err());
    }

    #[test]
    fn test_epc_from_bytes() {
        let epc = Epc::from(vec![0x30; 12]);
        assert_eq!(epc.len(), 12);
        assert!(!epc.is_empty());
    }
}
