//! LLRP status codes and the LLRPStatus parameter

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::codec::{self, FieldReader};
use crate::error::{Error, Result};

/// LLRPStatus parameter type code
pub const TYPE_LLRP_STATUS: u16 = 287;

/// LLRP status codes
///
/// Carried in the LLRPStatus parameter of every response message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatusCode {
    Success = 0,

    // Message/parameter errors
    ParameterError = 100,
    FieldError = 101,
    UnexpectedParameter = 102,
    MissingParameter = 103,
    DuplicateParameter = 104,
    OverflowParameter = 105,
    OverflowField = 106,
    UnknownParameter = 107,
    UnknownField = 108,
    UnsupportedMessage = 109,
    UnsupportedVersion = 110,
    UnsupportedParameter = 111,

    // ROSpec/AccessSpec errors
    NoSuchRoSpec = 200,
    NoSuchAccessSpec = 201,
    RoSpecCurrentlyDisabled = 202,
    RoSpecCurrentlyEnabled = 203,
    NoMoreRoSpecs = 204,
    NoMoreAccessSpecs = 205,
    AccessSpecCurrentlyDisabled = 206,
    AccessSpecCurrentlyEnabled = 207,
    RoSpecNotConfigured = 208,
    AccessSpecNotConfigured = 209,

    // Device errors
    DeviceError = 300,
    OutOfRange = 301,
    NoAntennaConnected = 302,
    ReaderTemperatureTooHigh = 303,
    ReaderOverheated = 304,
    ReaderInitializationFailure = 305,

    // Air protocol errors
    InvalidFrequency = 400,
    InvalidAntennaId = 401,
    InvalidPowerLevel = 402,
    CycleCountExceeded = 403,
    InvalidParameter = 404,

    // Other
    Other = 500,
}

impl StatusCode {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_error(self) -> bool {
        !self.is_success()
    }

    /// Status name as the protocol specification spells it
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "M_Success",
            Self::ParameterError => "M_ParameterError",
            Self::FieldError => "M_FieldError",
            Self::UnexpectedParameter => "M_UnexpectedParameter",
            Self::MissingParameter => "M_MissingParameter",
            Self::DuplicateParameter => "M_DuplicateParameter",
            Self::OverflowParameter => "M_OverflowParameter",
            Self::OverflowField => "M_OverflowField",
            Self::UnknownParameter => "M_UnknownParameter",
            Self::UnknownField => "M_UnknownField",
            Self::UnsupportedMessage => "M_UnsupportedMessage",
            Self::UnsupportedVersion => "M_UnsupportedVersion",
            Self::UnsupportedParameter => "M_UnsupportedParameter",
            Self::NoSuchRoSpec => "M_NoSuchROSpec",
            Self::NoSuchAccessSpec => "M_NoSuchAccessSpec",
            Self::RoSpecCurrentlyDisabled => "M_ROSpecCurrentlyDisabled",
            Self::RoSpecCurrentlyEnabled => "M_ROSpecCurrentlyEnabled",
            Self::NoMoreRoSpecs => "M_NoMoreROSpecs",
            Self::NoMoreAccessSpecs => "M_NoMoreAccessSpecs",
            Self::AccessSpecCurrentlyDisabled => "M_AccessSpecCurrentlyDisabled",
            Self::AccessSpecCurrentlyEnabled => "M_AccessSpecCurrentlyEnabled",
            Self::RoSpecNotConfigured => "M_ROSpecNotConfigured",
            Self::AccessSpecNotConfigured => "M_AccessSpecNotConfigured",
            Self::DeviceError => "M_DeviceError",
            Self::OutOfRange => "M_OutOfRange",
            Self::NoAntennaConnected => "M_NoAntennaConnected",
            Self::ReaderTemperatureTooHigh => "M_ReaderTemperatureTooHigh",
            Self::ReaderOverheated => "M_ReaderOverheated",
            Self::ReaderInitializationFailure => "M_ReaderInitializationFailure",
            Self::InvalidFrequency => "M_InvalidFrequency",
            Self::InvalidAntennaId => "M_InvalidAntennaID",
            Self::InvalidPowerLevel => "M_InvalidPowerLevel",
            Self::CycleCountExceeded => "M_CycleCountExceeded",
            Self::InvalidParameter => "M_InvalidParameter",
            Self::Other => "M_Other",
        }
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::Success),
            100 => Ok(Self::ParameterError),
            101 => Ok(Self::FieldError),
            102 => Ok(Self::UnexpectedParameter),
            103 => Ok(Self::MissingParameter),
            104 => Ok(Self::DuplicateParameter),
            105 => Ok(Self::OverflowParameter),
            106 => Ok(Self::OverflowField),
            107 => Ok(Self::UnknownParameter),
            108 => Ok(Self::UnknownField),
            109 => Ok(Self::UnsupportedMessage),
            110 => Ok(Self::UnsupportedVersion),
            111 => Ok(Self::UnsupportedParameter),
            200 => Ok(Self::NoSuchRoSpec),
            201 => Ok(Self::NoSuchAccessSpec),
            202 => Ok(Self::RoSpecCurrentlyDisabled),
            203 => Ok(Self::RoSpecCurrentlyEnabled),
            204 => Ok(Self::NoMoreRoSpecs),
            205 => Ok(Self::NoMoreAccessSpecs),
            206 => Ok(Self::AccessSpecCurrentlyDisabled),
            207 => Ok(Self::AccessSpecCurrentlyEnabled),
            208 => Ok(Self::RoSpecNotConfigured),
            209 => Ok(Self::AccessSpecNotConfigured),
            300 => Ok(Self::DeviceError),
            301 => Ok(Self::OutOfRange),
            302 => Ok(Self::NoAntennaConnected),
            303 => Ok(Self::ReaderTemperatureTooHigh),
            304 => Ok(Self::ReaderOverheated),
            305 => Ok(Self::ReaderInitializationFailure),
            400 => Ok(Self::InvalidFrequency),
            401 => Ok(Self::InvalidAntennaId),
            402 => Ok(Self::InvalidPowerLevel),
            403 => Ok(Self::CycleCountExceeded),
            404 => Ok(Self::InvalidParameter),
            500 => Ok(Self::Other),
            _ => Err(Error::InvalidField {
                context: "LLRPStatus.StatusCode",
                value: value as u32,
            }),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), *self as u16)
    }
}

/// LLRPStatus parameter
///
/// Every response message carries one. A non-success code is a protocol
/// status error: the command failed, but the connection remains usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlrpStatus {
    pub code: StatusCode,
    pub description: String,
}

impl LlrpStatus {
    pub fn success() -> Self {
        Self {
            code: StatusCode::Success,
            description: String::new(),
        }
    }

    pub fn error(code: StatusCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_LLRP_STATUS, |out| {
            out.put_u16(self.code.into());
            out.put_u16(self.description.len() as u16);
            out.put_slice(self.description.as_bytes());
        });
    }

    /// Decode from a parameter body (TLV header already stripped)
    ///
    /// FieldError/ParameterError detail sub-parameters are consumed but
    /// not retained.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let code = StatusCode::try_from(fields.u16()?)?;
        let desc_len = fields.u16()? as usize;
        let desc = fields.bytes(desc_len)?;
        let description = std::str::from_utf8(desc)
            .map_err(|_| Error::InvalidUtf8 { context: "LLRPStatus.ErrorDescription" })?
            .to_string();

        Ok(Self { code, description })
    }
}

impl fmt::Display for LlrpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.description)
        }
    }
}
