//! LLRP message framing and typed message bodies
//!
//! # Frame structure
//!
//! ```text
//! ┌──────────┬─────────┬──────────────┬──────────────┬──────────────┬─────────┐
//! │ Reserved │ Version │ Message Type │ Total Length │  Message ID  │  Body   │
//! │  3 bits  │ 3 bits  │   10 bits    │   4 bytes    │   4 bytes    │ N bytes │
//! └──────────┴─────────┴──────────────┴──────────────┴──────────────┴─────────┘
//! ```
//!
//! Total length includes the 10-byte header. All values are network byte
//! order. [`Message::decode`] returns `Ok(None)` until a complete frame is
//! buffered, which is what makes TCP stream reassembly correct regardless
//! of how the transport fragments frames.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};

use crate::access::AccessSpec;
use crate::capabilities::{ReaderCapabilities, RequestedCapabilities};
use crate::codec::ParamCursor;
use crate::config::{ConfigRequest, ReaderConfig};
use crate::error::{Error, Result};
use crate::events::ReaderEventNotificationData;
use crate::report::{TYPE_TAG_REPORT_DATA, TagReportData};
use crate::rospec::{RoSpec, TYPE_ROSPEC};
use crate::status::{LlrpStatus, TYPE_LLRP_STATUS};

/// LLRP protocol version carried in every header
pub const PROTOCOL_VERSION: u8 = 1;

/// Message header size in bytes
pub const HEADER_SIZE: usize = 10;

/// Message type codes from the LLRP v1.0.1 registry
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    // Client to reader
    GetReaderCapabilities = 1,
    GetReaderConfig = 2,
    SetReaderConfig = 3,
    CloseConnection = 4,
    AddRoSpec = 20,
    DeleteRoSpec = 21,
    StartRoSpec = 22,
    StopRoSpec = 23,
    EnableRoSpec = 24,
    DisableRoSpec = 25,
    GetRoSpecs = 26,
    AddAccessSpec = 40,
    DeleteAccessSpec = 41,
    EnableAccessSpec = 42,
    DisableAccessSpec = 43,
    GetAccessSpecs = 44,
    GetReport = 60,
    EnableEventsAndReports = 64,
    KeepaliveAck = 72,

    // Reader to client
    GetReaderCapabilitiesResponse = 11,
    GetReaderConfigResponse = 12,
    SetReaderConfigResponse = 13,
    CloseConnectionResponse = 14,
    AddRoSpecResponse = 30,
    DeleteRoSpecResponse = 31,
    StartRoSpecResponse = 32,
    StopRoSpecResponse = 33,
    EnableRoSpecResponse = 34,
    DisableRoSpecResponse = 35,
    GetRoSpecsResponse = 36,
    AddAccessSpecResponse = 50,
    DeleteAccessSpecResponse = 51,
    EnableAccessSpecResponse = 52,
    DisableAccessSpecResponse = 53,
    GetAccessSpecsResponse = 54,
    RoAccessReport = 61,
    Keepalive = 62,
    ReaderEventNotification = 63,
    ErrorMessage = 100,
}

impl MessageType {
    /// Check if this type is a response to a client request
    pub fn is_response(self) -> bool {
        matches!(
            self,
            Self::GetReaderCapabilitiesResponse
                | Self::GetReaderConfigResponse
                | Self::SetReaderConfigResponse
                | Self::CloseConnectionResponse
                | Self::AddRoSpecResponse
                | Self::DeleteRoSpecResponse
                | Self::StartRoSpecResponse
                | Self::StopRoSpecResponse
                | Self::EnableRoSpecResponse
                | Self::DisableRoSpecResponse
                | Self::GetRoSpecsResponse
                | Self::AddAccessSpecResponse
                | Self::DeleteAccessSpecResponse
                | Self::EnableAccessSpecResponse
                | Self::DisableAccessSpecResponse
                | Self::GetAccessSpecsResponse
                | Self::ErrorMessage
        )
    }

    /// Check if this type arrives unsolicited
    pub fn is_notification(self) -> bool {
        matches!(
            self,
            Self::RoAccessReport | Self::Keepalive | Self::ReaderEventNotification
        )
    }

    fn from_code(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::GetReaderCapabilities),
            2 => Some(Self::GetReaderConfig),
            3 => Some(Self::SetReaderConfig),
            4 => Some(Self::CloseConnection),
            20 => Some(Self::AddRoSpec),
            21 => Some(Self::DeleteRoSpec),
            22 => Some(Self::StartRoSpec),
            23 => Some(Self::StopRoSpec),
            24 => Some(Self::EnableRoSpec),
            25 => Some(Self::DisableRoSpec),
            26 => Some(Self::GetRoSpecs),
            40 => Some(Self::AddAccessSpec),
            41 => Some(Self::DeleteAccessSpec),
            42 => Some(Self::EnableAccessSpec),
            43 => Some(Self::DisableAccessSpec),
            44 => Some(Self::GetAccessSpecs),
            60 => Some(Self::GetReport),
            64 => Some(Self::EnableEventsAndReports),
            72 => Some(Self::KeepaliveAck),
            11 => Some(Self::GetReaderCapabilitiesResponse),
            12 => Some(Self::GetReaderConfigResponse),
            13 => Some(Self::SetReaderConfigResponse),
            14 => Some(Self::CloseConnectionResponse),
            30 => Some(Self::AddRoSpecResponse),
            31 => Some(Self::DeleteRoSpecResponse),
            32 => Some(Self::StartRoSpecResponse),
            33 => Some(Self::StopRoSpecResponse),
            34 => Some(Self::EnableRoSpecResponse),
            35 => Some(Self::DisableRoSpecResponse),
            36 => Some(Self::GetRoSpecsResponse),
            50 => Some(Self::AddAccessSpecResponse),
            51 => Some(Self::DeleteAccessSpecResponse),
            52 => Some(Self::EnableAccessSpecResponse),
            53 => Some(Self::DisableAccessSpecResponse),
            54 => Some(Self::GetAccessSpecsResponse),
            61 => Some(Self::RoAccessReport),
            62 => Some(Self::Keepalive),
            63 => Some(Self::ReaderEventNotification),
            100 => Some(Self::ErrorMessage),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as u16)
    }
}

/// Typed message body, one variant per supported message type
///
/// Unrecognized message types decode to [`MessageBody::Unknown`] so that
/// the message id stays available for response correlation and firmware
/// that sends newer notification types remains usable.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    GetReaderCapabilities {
        requested: RequestedCapabilities,
    },
    GetReaderCapabilitiesResponse {
        status: LlrpStatus,
        capabilities: ReaderCapabilities,
    },
    GetReaderConfig {
        antenna_id: u16,
        requested: ConfigRequest,
    },
    GetReaderConfigResponse {
        status: LlrpStatus,
        config: ReaderConfig,
    },
    SetReaderConfig {
        config: ReaderConfig,
    },
    SetReaderConfigResponse {
        status: LlrpStatus,
    },
    CloseConnection,
    CloseConnectionResponse {
        status: LlrpStatus,
    },
    AddRoSpec {
        rospec: RoSpec,
    },
    AddRoSpecResponse {
        status: LlrpStatus,
    },
    DeleteRoSpec {
        rospec_id: u32,
    },
    DeleteRoSpecResponse {
        status: LlrpStatus,
    },
    StartRoSpec {
        rospec_id: u32,
    },
    StartRoSpecResponse {
        status: LlrpStatus,
    },
    StopRoSpec {
        rospec_id: u32,
    },
    StopRoSpecResponse {
        status: LlrpStatus,
    },
    EnableRoSpec {
        rospec_id: u32,
    },
    EnableRoSpecResponse {
        status: LlrpStatus,
    },
    DisableRoSpec {
        rospec_id: u32,
    },
    DisableRoSpecResponse {
        status: LlrpStatus,
    },
    GetRoSpecs,
    GetRoSpecsResponse {
        status: LlrpStatus,
        rospecs: Vec<RoSpec>,
    },
    AddAccessSpec {
        access_spec: AccessSpec,
    },
    AddAccessSpecResponse {
        status: LlrpStatus,
    },
    DeleteAccessSpec {
        access_spec_id: u32,
    },
    DeleteAccessSpecResponse {
        status: LlrpStatus,
    },
    EnableAccessSpec {
        access_spec_id: u32,
    },
    EnableAccessSpecResponse {
        status: LlrpStatus,
    },
    DisableAccessSpec {
        access_spec_id: u32,
    },
    DisableAccessSpecResponse {
        status: LlrpStatus,
    },
    GetAccessSpecs,
    GetAccessSpecsResponse {
        status: LlrpStatus,
        access_specs: Vec<AccessSpec>,
    },
    GetReport,
    RoAccessReport {
        tag_reports: Vec<TagReportData>,
    },
    Keepalive,
    KeepaliveAck,
    ReaderEventNotification {
        data: ReaderEventNotificationData,
    },
    EnableEventsAndReports,
    ErrorMessage {
        status: LlrpStatus,
    },
    Unknown {
        message_type: u16,
        body: Bytes,
    },
}

impl MessageBody {
    /// Wire type code for this body
    pub fn message_type(&self) -> u16 {
        match self {
            Self::GetReaderCapabilities { .. } => MessageType::GetReaderCapabilities as u16,
            Self::GetReaderCapabilitiesResponse { .. } => {
                MessageType::GetReaderCapabilitiesResponse as u16
            }
            Self::GetReaderConfig { .. } => MessageType::GetReaderConfig as u16,
            Self::GetReaderConfigResponse { .. } => MessageType::GetReaderConfigResponse as u16,
            Self::SetReaderConfig { .. } => MessageType::SetReaderConfig as u16,
            Self::SetReaderConfigResponse { .. } => MessageType::SetReaderConfigResponse as u16,
            Self::CloseConnection => MessageType::CloseConnection as u16,
            Self::CloseConnectionResponse { .. } => MessageType::CloseConnectionResponse as u16,
            Self::AddRoSpec { .. } => MessageType::AddRoSpec as u16,
            Self::AddRoSpecResponse { .. } => MessageType::AddRoSpecResponse as u16,
            Self::DeleteRoSpec { .. } => MessageType::DeleteRoSpec as u16,
            Self::DeleteRoSpecResponse { .. } => MessageType::DeleteRoSpecResponse as u16,
            Self::StartRoSpec { .. } => MessageType::StartRoSpec as u16,
            Self::StartRoSpecResponse { .. } => MessageType::StartRoSpecResponse as u16,
            Self::StopRoSpec { .. } => MessageType::StopRoSpec as u16,
            Self::StopRoSpecResponse { .. } => MessageType::StopRoSpecResponse as u16,
            Self::EnableRoSpec { .. } => MessageType::EnableRoSpec as u16,
            Self::EnableRoSpecResponse { .. } => MessageType::EnableRoSpecResponse as u16,
            Self::DisableRoSpec { .. } => MessageType::DisableRoSpec as u16,
            Self::DisableRoSpecResponse { .. } => MessageType::DisableRoSpecResponse as u16,
            Self::GetRoSpecs => MessageType::GetRoSpecs as u16,
            Self::GetRoSpecsResponse { .. } => MessageType::GetRoSpecsResponse as u16,
            Self::AddAccessSpec { .. } => MessageType::AddAccessSpec as u16,
            Self::AddAccessSpecResponse { .. } => MessageType::AddAccessSpecResponse as u16,
            Self::DeleteAccessSpec { .. } => MessageType::DeleteAccessSpec as u16,
            Self::DeleteAccessSpecResponse { .. } => {
                MessageType::DeleteAccessSpecResponse as u16
            }
            Self::EnableAccessSpec { .. } => MessageType::EnableAccessSpec as u16,
            Self::EnableAccessSpecResponse { .. } => {
                MessageType::EnableAccessSpecResponse as u16
            }
            Self::DisableAccessSpec { .. } => MessageType::DisableAccessSpec as u16,
            Self::DisableAccessSpecResponse { .. } => {
                MessageType::DisableAccessSpecResponse as u16
            }
            Self::GetAccessSpecs => MessageType::GetAccessSpecs as u16,
            Self::GetAccessSpecsResponse { .. } => MessageType::GetAccessSpecsResponse as u16,
            Self::GetReport => MessageType::GetReport as u16,
            Self::RoAccessReport { .. } => MessageType::RoAccessReport as u16,
            Self::Keepalive => MessageType::Keepalive as u16,
            Self::KeepaliveAck => MessageType::KeepaliveAck as u16,
            Self::ReaderEventNotification { .. } => MessageType::ReaderEventNotification as u16,
            Self::EnableEventsAndReports => MessageType::EnableEventsAndReports as u16,
            Self::ErrorMessage { .. } => MessageType::ErrorMessage as u16,
            Self::Unknown { message_type, .. } => *message_type,
        }
    }

    /// The LLRPStatus of a response body, if this is a response
    pub fn status(&self) -> Option<&LlrpStatus> {
        match self {
            Self::GetReaderCapabilitiesResponse { status, .. }
            | Self::GetReaderConfigResponse { status, .. }
            | Self::SetReaderConfigResponse { status }
            | Self::CloseConnectionResponse { status }
            | Self::AddRoSpecResponse { status }
            | Self::DeleteRoSpecResponse { status }
            | Self::StartRoSpecResponse { status }
            | Self::StopRoSpecResponse { status }
            | Self::EnableRoSpecResponse { status }
            | Self::DisableRoSpecResponse { status }
            | Self::GetRoSpecsResponse { status, .. }
            | Self::AddAccessSpecResponse { status }
            | Self::DeleteAccessSpecResponse { status }
            | Self::EnableAccessSpecResponse { status }
            | Self::DisableAccessSpecResponse { status }
            | Self::GetAccessSpecsResponse { status, .. }
            | Self::ErrorMessage { status } => Some(status),
            _ => None,
        }
    }

    fn encode_body(&self, out: &mut BytesMut) {
        match self {
            Self::GetReaderCapabilities { requested } => {
                out.put_u8(*requested as u8);
            }
            Self::GetReaderCapabilitiesResponse { status, capabilities } => {
                status.encode(out);
                capabilities.encode_params(out);
            }
            Self::GetReaderConfig { antenna_id, requested } => {
                out.put_u16(*antenna_id);
                out.put_u16(requested.bits());
            }
            Self::GetReaderConfigResponse { status, config } => {
                status.encode(out);
                config.encode_params(out);
            }
            Self::SetReaderConfig { config } => {
                out.put_u8(u8::from(config.reset_to_factory_defaults) << 7);
                config.encode_params(out);
            }
            Self::AddRoSpec { rospec } => rospec.encode(out),
            Self::DeleteRoSpec { rospec_id }
            | Self::StartRoSpec { rospec_id }
            | Self::StopRoSpec { rospec_id }
            | Self::EnableRoSpec { rospec_id }
            | Self::DisableRoSpec { rospec_id } => out.put_u32(*rospec_id),
            Self::GetRoSpecsResponse { status, rospecs } => {
                status.encode(out);
                for rospec in rospecs {
                    rospec.encode(out);
                }
            }
            Self::AddAccessSpec { access_spec } => access_spec.encode(out),
            Self::DeleteAccessSpec { access_spec_id }
            | Self::EnableAccessSpec { access_spec_id }
            | Self::DisableAccessSpec { access_spec_id } => out.put_u32(*access_spec_id),
            Self::GetAccessSpecsResponse { status, access_specs } => {
                status.encode(out);
                for access_spec in access_specs {
                    access_spec.encode(out);
                }
            }
            Self::RoAccessReport { tag_reports } => {
                for report in tag_reports {
                    report.encode(out);
                }
            }
            Self::ReaderEventNotification { data } => data.encode(out),
            Self::SetReaderConfigResponse { status }
            | Self::CloseConnectionResponse { status }
            | Self::AddRoSpecResponse { status }
            | Self::DeleteRoSpecResponse { status }
            | Self::StartRoSpecResponse { status }
            | Self::StopRoSpecResponse { status }
            | Self::EnableRoSpecResponse { status }
            | Self::DisableRoSpecResponse { status }
            | Self::AddAccessSpecResponse { status }
            | Self::DeleteAccessSpecResponse { status }
            | Self::EnableAccessSpecResponse { status }
            | Self::DisableAccessSpecResponse { status }
            | Self::ErrorMessage { status } => status.encode(out),
            Self::CloseConnection
            | Self::GetRoSpecs
            | Self::GetAccessSpecs
            | Self::GetReport
            | Self::Keepalive
            | Self::KeepaliveAck
            | Self::EnableEventsAndReports => {}
            Self::Unknown { body, .. } => out.put_slice(body),
        }
    }

    /// Decode the LLRPStatus that leads a response body
    fn decode_status(body: &[u8], context: &'static str) -> Result<LlrpStatus> {
        let mut cursor = ParamCursor::new(body);
        while let Some(param) = cursor.next_param()? {
            if param.header.type_code() == TYPE_LLRP_STATUS {
                return LlrpStatus::decode(param.body);
            }
        }
        Err(Error::MissingParameter { context, missing: "LLRPStatus" })
    }

    fn decode_u32(body: &[u8]) -> Result<u32> {
        if body.len() < 4 {
            return Err(Error::BufferTooShort { expected: 4, actual: body.len() });
        }
        Ok(BigEndian::read_u32(&body[..4]))
    }

    fn decode(message_type: u16, body: &[u8]) -> Result<Self> {
        let Some(known) = MessageType::from_code(message_type) else {
            return Ok(Self::Unknown {
                message_type,
                body: Bytes::copy_from_slice(body),
            });
        };

        match known {
            MessageType::GetReaderCapabilities => {
                if body.is_empty() {
                    return Err(Error::BufferTooShort { expected: 1, actual: 0 });
                }
                Ok(Self::GetReaderCapabilities {
                    requested: RequestedCapabilities::try_from(body[0])?,
                })
            }
            MessageType::GetReaderCapabilitiesResponse => {
                let mut status = None;
                let mut capabilities = ReaderCapabilities::default();
                let mut cursor = ParamCursor::new(body);
                while let Some(param) = cursor.next_param()? {
                    if param.header.type_code() == TYPE_LLRP_STATUS {
                        status = Some(LlrpStatus::decode(param.body)?);
                    } else {
                        capabilities.absorb(&param)?;
                    }
                }
                Ok(Self::GetReaderCapabilitiesResponse {
                    status: status.ok_or(Error::MissingParameter {
                        context: "GET_READER_CAPABILITIES_RESPONSE",
                        missing: "LLRPStatus",
                    })?,
                    capabilities,
                })
            }
            MessageType::GetReaderConfig => {
                if body.len() < 4 {
                    return Err(Error::BufferTooShort { expected: 4, actual: body.len() });
                }
                Ok(Self::GetReaderConfig {
                    antenna_id: BigEndian::read_u16(&body[0..2]),
                    requested: ConfigRequest::from_bits_truncate(BigEndian::read_u16(&body[2..4])),
                })
            }
            MessageType::GetReaderConfigResponse => {
                let mut status = None;
                let mut config = ReaderConfig::new();
                let mut cursor = ParamCursor::new(body);
                while let Some(param) = cursor.next_param()? {
                    if param.header.type_code() == TYPE_LLRP_STATUS {
                        status = Some(LlrpStatus::decode(param.body)?);
                    } else {
                        config.absorb(&param)?;
                    }
                }
                Ok(Self::GetReaderConfigResponse {
                    status: status.ok_or(Error::MissingParameter {
                        context: "GET_READER_CONFIG_RESPONSE",
                        missing: "LLRPStatus",
                    })?,
                    config,
                })
            }
            MessageType::SetReaderConfig => {
                if body.is_empty() {
                    return Err(Error::BufferTooShort { expected: 1, actual: 0 });
                }
                let mut config = ReaderConfig::new();
                config.reset_to_factory_defaults = body[0] != 0;
                let mut cursor = ParamCursor::new(&body[1..]);
                while let Some(param) = cursor.next_param()? {
                    config.absorb(&param)?;
                }
                Ok(Self::SetReaderConfig { config })
            }
            MessageType::SetReaderConfigResponse => Ok(Self::SetReaderConfigResponse {
                status: Self::decode_status(body, "SET_READER_CONFIG_RESPONSE")?,
            }),
            MessageType::CloseConnection => Ok(Self::CloseConnection),
            MessageType::CloseConnectionResponse => Ok(Self::CloseConnectionResponse {
                status: Self::decode_status(body, "CLOSE_CONNECTION_RESPONSE")?,
            }),
            MessageType::AddRoSpec => {
                let mut cursor = ParamCursor::new(body);
                match cursor.next_param()? {
                    Some(param) if param.header.type_code() == TYPE_ROSPEC => {
                        Ok(Self::AddRoSpec { rospec: RoSpec::decode(param.body)? })
                    }
                    Some(param) => Err(Error::UnexpectedParameter {
                        context: "ADD_ROSPEC",
                        found: param.header.type_code(),
                    }),
                    None => Err(Error::MissingParameter {
                        context: "ADD_ROSPEC",
                        missing: "ROSpec",
                    }),
                }
            }
            MessageType::AddRoSpecResponse => Ok(Self::AddRoSpecResponse {
                status: Self::decode_status(body, "ADD_ROSPEC_RESPONSE")?,
            }),
            MessageType::DeleteRoSpec => Ok(Self::DeleteRoSpec {
                rospec_id: Self::decode_u32(body)?,
            }),
            MessageType::DeleteRoSpecResponse => Ok(Self::DeleteRoSpecResponse {
                status: Self::decode_status(body, "DELETE_ROSPEC_RESPONSE")?,
            }),
            MessageType::StartRoSpec => Ok(Self::StartRoSpec {
                rospec_id: Self::decode_u32(body)?,
            }),
            MessageType::StartRoSpecResponse => Ok(Self::StartRoSpecResponse {
                status: Self::decode_status(body, "START_ROSPEC_RESPONSE")?,
            }),
            MessageType::StopRoSpec => Ok(Self::StopRoSpec {
                rospec_id: Self::decode_u32(body)?,
            }),
            MessageType::StopRoSpecResponse => Ok(Self::StopRoSpecResponse {
                status: Self::decode_status(body, "STOP_ROSPEC_RESPONSE")?,
            }),
            MessageType::EnableRoSpec => Ok(Self::EnableRoSpec {
                rospec_id: Self::decode_u32(body)?,
            }),
            MessageType::EnableRoSpecResponse => Ok(Self::EnableRoSpecResponse {
                status: Self::decode_status(body, "ENABLE_ROSPEC_RESPONSE")?,
            }),
            MessageType::DisableRoSpec => Ok(Self::DisableRoSpec {
                rospec_id: Self::decode_u32(body)?,
            }),
            MessageType::DisableRoSpecResponse => Ok(Self::DisableRoSpecResponse {
                status: Self::decode_status(body, "DISABLE_ROSPEC_RESPONSE")?,
            }),
            MessageType::GetRoSpecs => Ok(Self::GetRoSpecs),
            MessageType::GetRoSpecsResponse => {
                let mut status = None;
                let mut rospecs = Vec::new();
                let mut cursor = ParamCursor::new(body);
                while let Some(param) = cursor.next_param()? {
                    match param.header.type_code() {
                        TYPE_LLRP_STATUS => status = Some(LlrpStatus::decode(param.body)?),
                        TYPE_ROSPEC => rospecs.push(RoSpec::decode(param.body)?),
                        _ => {}
                    }
                }
                Ok(Self::GetRoSpecsResponse {
                    status: status.ok_or(Error::MissingParameter {
                        context: "GET_ROSPECS_RESPONSE",
                        missing: "LLRPStatus",
                    })?,
                    rospecs,
                })
            }
            MessageType::AddAccessSpec => {
                let mut cursor = ParamCursor::new(body);
                match cursor.next_param()? {
                    Some(param)
                        if param.header.type_code() == crate::access::TYPE_ACCESS_SPEC =>
                    {
                        Ok(Self::AddAccessSpec {
                            access_spec: AccessSpec::decode(param.body)?,
                        })
                    }
                    Some(param) => Err(Error::UnexpectedParameter {
                        context: "ADD_ACCESSSPEC",
                        found: param.header.type_code(),
                    }),
                    None => Err(Error::MissingParameter {
                        context: "ADD_ACCESSSPEC",
                        missing: "AccessSpec",
                    }),
                }
            }
            MessageType::AddAccessSpecResponse => Ok(Self::AddAccessSpecResponse {
                status: Self::decode_status(body, "ADD_ACCESSSPEC_RESPONSE")?,
            }),
            MessageType::DeleteAccessSpec => Ok(Self::DeleteAccessSpec {
                access_spec_id: Self::decode_u32(body)?,
            }),
            MessageType::DeleteAccessSpecResponse => Ok(Self::DeleteAccessSpecResponse {
                status: Self::decode_status(body, "DELETE_ACCESSSPEC_RESPONSE")?,
            }),
            MessageType::EnableAccessSpec => Ok(Self::EnableAccessSpec {
                access_spec_id: Self::decode_u32(body)?,
            }),
            MessageType::EnableAccessSpecResponse => Ok(Self::EnableAccessSpecResponse {
                status: Self::decode_status(body, "ENABLE_ACCESSSPEC_RESPONSE")?,
            }),
            MessageType::DisableAccessSpec => Ok(Self::DisableAccessSpec {
                access_spec_id: Self::decode_u32(body)?,
            }),
            MessageType::DisableAccessSpecResponse => Ok(Self::DisableAccessSpecResponse {
                status: Self::decode_status(body, "DISABLE_ACCESSSPEC_RESPONSE")?,
            }),
            MessageType::GetAccessSpecs => Ok(Self::GetAccessSpecs),
            MessageType::GetAccessSpecsResponse => {
                let mut status = None;
                let mut access_specs = Vec::new();
                let mut cursor = ParamCursor::new(body);
                while let Some(param) = cursor.next_param()? {
                    match param.header.type_code() {
                        TYPE_LLRP_STATUS => status = Some(LlrpStatus::decode(param.body)?),
                        crate::access::TYPE_ACCESS_SPEC => {
                            access_specs.push(AccessSpec::decode(param.body)?)
                        }
                        _ => {}
                    }
                }
                Ok(Self::GetAccessSpecsResponse {
                    status: status.ok_or(Error::MissingParameter {
                        context: "GET_ACCESSSPECS_RESPONSE",
                        missing: "LLRPStatus",
                    })?,
                    access_specs,
                })
            }
            MessageType::GetReport => Ok(Self::GetReport),
            MessageType::RoAccessReport => {
                let mut tag_reports = Vec::new();
                let mut cursor = ParamCursor::new(body);
                while let Some(param) = cursor.next_param()? {
                    if param.header.type_code() == TYPE_TAG_REPORT_DATA {
                        tag_reports.push(TagReportData::decode(param.body)?);
                    } else {
                        tracing::trace!(
                            param_type = param.header.type_code(),
                            "skipping non-tag parameter in RO_ACCESS_REPORT"
                        );
                    }
                }
                Ok(Self::RoAccessReport { tag_reports })
            }
            MessageType::Keepalive => Ok(Self::Keepalive),
            MessageType::KeepaliveAck => Ok(Self::KeepaliveAck),
            MessageType::ReaderEventNotification => {
                let mut cursor = ParamCursor::new(body);
                match cursor.next_param()? {
                    Some(param)
                        if param.header.type_code()
                            == crate::events::TYPE_READER_EVENT_NOTIFICATION_DATA =>
                    {
                        Ok(Self::ReaderEventNotification {
                            data: ReaderEventNotificationData::decode(param.body)?,
                        })
                    }
                    Some(param) => Err(Error::UnexpectedParameter {
                        context: "READER_EVENT_NOTIFICATION",
                        found: param.header.type_code(),
                    }),
                    None => Err(Error::MissingParameter {
                        context: "READER_EVENT_NOTIFICATION",
                        missing: "ReaderEventNotificationData",
                    }),
                }
            }
            MessageType::EnableEventsAndReports => Ok(Self::EnableEventsAndReports),
            MessageType::ErrorMessage => Ok(Self::ErrorMessage {
                status: Self::decode_status(body, "ERROR_MESSAGE")?,
            }),
        }
    }
}

/// A framed LLRP message
///
/// # Examples
///
/// ```
/// use llrprust_core::message::{Message, MessageBody};
///
/// let msg = Message::new(7, MessageBody::Keepalive);
/// let mut buf = msg.encode();
///
/// let decoded = Message::decode(&mut buf).unwrap().unwrap();
/// assert_eq!(decoded.message_id, 7);
/// assert_eq!(decoded.body, MessageBody::Keepalive);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Protocol version from the header (3 bits)
    pub version: u8,
    /// Caller-assigned for requests, echoed verbatim in the response
    pub message_id: u32,
    pub body: MessageBody,
}

impl Message {
    pub fn new(message_id: u32, body: MessageBody) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message_id,
            body,
        }
    }

    pub fn message_type(&self) -> u16 {
        self.body.message_type()
    }

    /// Encode to a complete frame
    ///
    /// The length field is recomputed from the serialized body.
    pub fn encode(&self) -> BytesMut {
        let mut body = BytesMut::new();
        self.body.encode_body(&mut body);

        let mut out = BytesMut::with_capacity(HEADER_SIZE + body.len());
        out.put_u16((((self.version & 0x07) as u16) << 10) | (self.message_type() & 0x03FF));
        out.put_u32((HEADER_SIZE + body.len()) as u32);
        out.put_u32(self.message_id);
        out.extend_from_slice(&body);
        out
    }

    /// Decode one message from the front of `buf`
    ///
    /// Returns `Ok(None)` without consuming anything when fewer than the
    /// declared number of bytes are buffered; the caller retries after the
    /// transport delivers more. A declared length below the header size is
    /// a codec error and fatal to the connection.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>> {
        if buf.len() < HEADER_SIZE {
            return Ok(None);
        }

        let word = BigEndian::read_u16(&buf[0..2]);
        let declared = BigEndian::read_u32(&buf[2..6]) as usize;

        if declared < HEADER_SIZE {
            return Err(Error::InvalidMessageLength { declared: declared as u32 });
        }
        if buf.len() < declared {
            return Ok(None);
        }

        let message_id = BigEndian::read_u32(&buf[6..10]);
        let frame = buf.split_to(declared);
        let version = ((word >> 10) & 0x07) as u8;
        let message_type = word & 0x03FF;

        let body = MessageBody::decode(message_type, &frame[HEADER_SIZE..])?;

        tracing::trace!(message_type, message_id, len = declared, "decoded message");

        Ok(Some(Self { version, message_id, body }))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message[type={}](id={}, version={})",
            self.message_type(),
            self.message_id,
            self.version
        )
    }
}
