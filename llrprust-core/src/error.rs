//! Error types for llrprust-core



/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core codec errors
///
/// Every variant indicates that the byte stream can no longer be trusted:
/// a failed decode leaves the stream position undefined, so callers must
/// treat these as fatal to the connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Buffer ended before the declared structure did
    #[error("Buffer too short: expected at least {expected} bytes, got {actual} bytes")]
    BufferTooShort {
        expected: usize,
        actual: usize,
    },

    /// Message header declares a length below the 10-byte header size
    #[error("Invalid message length: declared {declared} bytes")]
    InvalidMessageLength {
        declared: u32,
    },

    /// TLV parameter declares a length below its own 4-byte header
    #[error("Invalid parameter length: type {param_type} declares {declared} bytes")]
    InvalidParameterLength {
        param_type: u16,
        declared: usize,
    },

    /// TV parameter type not present in the static schema table
    ///
    /// TV payload lengths are implicit, so an unrecognized type cannot be
    /// skipped.
    #[error("Unknown TV parameter type: {0}")]
    UnknownTvType(u8),

    /// A mandatory one-of slot matched none of its alternatives
    #[error("Unexpected parameter in {context}: found type {found}")]
    UnexpectedParameter {
        context: &'static str,
        found: u16,
    },

    /// A mandatory parameter or field was absent
    #[error("Missing parameter in {context}: {missing}")]
    MissingParameter {
        context: &'static str,
        missing: &'static str,
    },

    /// A fixed field carried a value outside its defined range
    #[error("Invalid field value in {context}: {value}")]
    InvalidField {
        context: &'static str,
        value: u32,
    },

    /// Payload is not valid UTF-8 where the protocol requires it
    #[error("Invalid UTF-8 in {context}")]
    InvalidUtf8 {
        context: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::BufferTooShort { expected: 10, actual: 3 };
        assert!(err.to_string().contains("expected at least 10"));

        let err = Error::UnknownTvType(0x55);
        assert!(err.to_string().contains("85"));
    }
}
