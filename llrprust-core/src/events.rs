//! Reader event notification parameters
//!
//! A READER_EVENT_NOTIFICATION carries one ReaderEventNotificationData
//! with a timestamp and whichever event parameters apply. The first
//! notification of a connection carries the ConnectionAttemptEvent that
//! gates the handshake.

use bytes::{BufMut, BytesMut};

use crate::codec::{self, FieldReader, ParamCursor};
use crate::error::{Error, Result};
use crate::rospec::TYPE_UTC_TIMESTAMP;
use crate::status::{LlrpStatus, TYPE_LLRP_STATUS};

pub const TYPE_UPTIME: u16 = 129;
pub const TYPE_READER_EVENT_NOTIFICATION_DATA: u16 = 246;
pub const TYPE_GPI_EVENT: u16 = 248;
pub const TYPE_ROSPEC_EVENT: u16 = 249;
pub const TYPE_REPORT_BUFFER_LEVEL_WARNING_EVENT: u16 = 250;
pub const TYPE_REPORT_BUFFER_OVERFLOW_ERROR_EVENT: u16 = 251;
pub const TYPE_READER_EXCEPTION_EVENT: u16 = 252;
pub const TYPE_AI_SPEC_EVENT: u16 = 254;
pub const TYPE_ANTENNA_EVENT: u16 = 255;
pub const TYPE_CONNECTION_ATTEMPT_EVENT: u16 = 256;
pub const TYPE_CONNECTION_CLOSE_EVENT: u16 = 257;

/// Event timestamp: one-of UTC microseconds or reader uptime microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Utc(u64),
    Uptime(u64),
}

impl Timestamp {
    pub fn microseconds(&self) -> u64 {
        match self {
            Self::Utc(us) | Self::Uptime(us) => *us,
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        let (param_type, us) = match self {
            Self::Utc(us) => (TYPE_UTC_TIMESTAMP, *us),
            Self::Uptime(us) => (TYPE_UPTIME, *us),
        };
        codec::put_tlv(out, param_type, |out| {
            out.put_u64(us);
        });
    }
}

/// Outcome of a connection attempt, reported by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ConnectionAttemptStatus {
    Success = 0,
    FailedReaderInitiatedConnectionExists = 1,
    FailedClientInitiatedConnectionExists = 2,
    FailedOtherReason = 3,
    AnotherConnectionAttempted = 4,
}

impl ConnectionAttemptStatus {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl TryFrom<u16> for ConnectionAttemptStatus {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::FailedReaderInitiatedConnectionExists),
            2 => Ok(Self::FailedClientInitiatedConnectionExists),
            3 => Ok(Self::FailedOtherReason),
            4 => Ok(Self::AnotherConnectionAttempted),
            other => Err(Error::InvalidField {
                context: "ConnectionAttemptEvent.Status",
                value: other as u32,
            }),
        }
    }
}

/// ROSpec lifecycle event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RoSpecEventKind {
    Started = 0,
    Ended = 1,
    Preempted = 2,
}

impl TryFrom<u8> for RoSpecEventKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Started),
            1 => Ok(Self::Ended),
            2 => Ok(Self::Preempted),
            other => Err(Error::InvalidField {
                context: "ROSpecEvent.EventType",
                value: other as u32,
            }),
        }
    }
}

/// Autonomous ROSpec state change on the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoSpecEvent {
    pub kind: RoSpecEventKind,
    pub rospec_id: u32,
    /// Set when `kind` is Preempted
    pub preempting_rospec_id: u32,
}

impl RoSpecEvent {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ROSPEC_EVENT, |out| {
            out.put_u8(self.kind as u8);
            out.put_u32(self.rospec_id);
            out.put_u32(self.preempting_rospec_id);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            kind: RoSpecEventKind::try_from(fields.u8()?)?,
            rospec_id: fields.u32()?,
            preempting_rospec_id: fields.u32()?,
        })
    }
}

/// End of an AISpec within a running ROSpec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiSpecEvent {
    pub rospec_id: u32,
    pub spec_index: u16,
}

impl AiSpecEvent {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_AI_SPEC_EVENT, |out| {
            // Event type 0 = end of AISpec, the only defined value
            out.put_u8(0);
            out.put_u32(self.rospec_id);
            out.put_u16(self.spec_index);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let _event_type = fields.u8()?;
        Ok(Self {
            rospec_id: fields.u32()?,
            spec_index: fields.u16()?,
        })
    }
}

/// Antenna connect/disconnect detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntennaEvent {
    pub connected: bool,
    pub antenna_id: u16,
}

impl AntennaEvent {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ANTENNA_EVENT, |out| {
            out.put_u8(u8::from(self.connected));
            out.put_u16(self.antenna_id);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            connected: fields.u8()? != 0,
            antenna_id: fields.u16()?,
        })
    }
}

/// GPI level change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpiEvent {
    pub port: u16,
    pub state: bool,
}

impl GpiEvent {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_GPI_EVENT, |out| {
            out.put_u16(self.port);
            out.put_u8(u8::from(self.state) << 7);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            port: fields.u16()?,
            state: fields.u8()? != 0,
        })
    }
}

/// Reader-side exception outside the request/response path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderExceptionEvent {
    pub message: String,
}

impl ReaderExceptionEvent {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_READER_EXCEPTION_EVENT, |out| {
            out.put_u16(self.message.len() as u16);
            out.put_slice(self.message.as_bytes());
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let len = fields.u16()? as usize;
        let raw = fields.bytes(len)?;
        let message = std::str::from_utf8(raw)
            .map_err(|_| Error::InvalidUtf8 { context: "ReaderExceptionEvent.Message" })?
            .to_string();
        // Optional ROSpecID/OpSpecID/AccessSpecID context parameters may
        // follow; they are consumed by the declared length.
        Ok(Self { message })
    }
}

/// Report buffer nearing capacity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBufferLevelWarningEvent {
    pub fill_percentage: u8,
}

impl ReportBufferLevelWarningEvent {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_REPORT_BUFFER_LEVEL_WARNING_EVENT, |out| {
            out.put_u8(self.fill_percentage);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self { fill_percentage: fields.u8()? })
    }
}

/// The event payload of a READER_EVENT_NOTIFICATION
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderEventNotificationData {
    pub timestamp: Timestamp,
    pub connection_attempt: Option<ConnectionAttemptStatus>,
    pub connection_close: bool,
    pub antenna: Option<AntennaEvent>,
    pub gpi: Option<GpiEvent>,
    pub rospec: Option<RoSpecEvent>,
    pub ai_spec: Option<AiSpecEvent>,
    pub exception: Option<ReaderExceptionEvent>,
    pub buffer_level_warning: Option<ReportBufferLevelWarningEvent>,
    pub buffer_overflow: bool,
    pub status: Option<LlrpStatus>,
}

impl ReaderEventNotificationData {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            connection_attempt: None,
            connection_close: false,
            antenna: None,
            gpi: None,
            rospec: None,
            ai_spec: None,
            exception: None,
            buffer_level_warning: None,
            buffer_overflow: false,
            status: None,
        }
    }

    /// The notification a reader sends to accept a new connection
    pub fn connection_accepted(timestamp: Timestamp) -> Self {
        Self {
            connection_attempt: Some(ConnectionAttemptStatus::Success),
            ..Self::new(timestamp)
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_READER_EVENT_NOTIFICATION_DATA, |out| {
            self.timestamp.encode(out);
            if let Some(status) = self.connection_attempt {
                codec::put_tlv(out, TYPE_CONNECTION_ATTEMPT_EVENT, |out| {
                    out.put_u16(status as u16);
                });
            }
            if self.connection_close {
                codec::put_tlv(out, TYPE_CONNECTION_CLOSE_EVENT, |_| {});
            }
            if let Some(antenna) = &self.antenna {
                antenna.encode(out);
            }
            if let Some(gpi) = &self.gpi {
                gpi.encode(out);
            }
            if let Some(rospec) = &self.rospec {
                rospec.encode(out);
            }
            if let Some(ai_spec) = &self.ai_spec {
                ai_spec.encode(out);
            }
            if let Some(exception) = &self.exception {
                exception.encode(out);
            }
            if let Some(warning) = &self.buffer_level_warning {
                warning.encode(out);
            }
            if self.buffer_overflow {
                codec::put_tlv(out, TYPE_REPORT_BUFFER_OVERFLOW_ERROR_EVENT, |_| {});
            }
            if let Some(status) = &self.status {
                status.encode(out);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut timestamp = None;
        let mut data = Self::new(Timestamp::Uptime(0));

        let mut cursor = ParamCursor::new(body);
        while let Some(param) = cursor.next_param()? {
            match param.header.type_code() {
                TYPE_UTC_TIMESTAMP => {
                    let mut fields = FieldReader::new(param.body);
                    timestamp = Some(Timestamp::Utc(fields.u64()?));
                }
                TYPE_UPTIME => {
                    let mut fields = FieldReader::new(param.body);
                    timestamp = Some(Timestamp::Uptime(fields.u64()?));
                }
                TYPE_CONNECTION_ATTEMPT_EVENT => {
                    let mut fields = FieldReader::new(param.body);
                    data.connection_attempt =
                        Some(ConnectionAttemptStatus::try_from(fields.u16()?)?);
                }
                TYPE_CONNECTION_CLOSE_EVENT => data.connection_close = true,
                TYPE_ANTENNA_EVENT => data.antenna = Some(AntennaEvent::decode(param.body)?),
                TYPE_GPI_EVENT => data.gpi = Some(GpiEvent::decode(param.body)?),
                TYPE_ROSPEC_EVENT => data.rospec = Some(RoSpecEvent::decode(param.body)?),
                TYPE_AI_SPEC_EVENT => data.ai_spec = Some(AiSpecEvent::decode(param.body)?),
                TYPE_READER_EXCEPTION_EVENT => {
                    data.exception = Some(ReaderExceptionEvent::decode(param.body)?)
                }
                TYPE_REPORT_BUFFER_LEVEL_WARNING_EVENT => {
                    data.buffer_level_warning =
                        Some(ReportBufferLevelWarningEvent::decode(param.body)?)
                }
                TYPE_REPORT_BUFFER_OVERFLOW_ERROR_EVENT => data.buffer_overflow = true,
                TYPE_LLRP_STATUS => data.status = Some(LlrpStatus::decode(param.body)?),
                other => {
                    tracing::trace!(
                        param_type = other,
                        "skipping unrecognized event parameter"
                    );
                }
            }
        }

        data.timestamp = timestamp.ok_or(Error::MissingParameter {
            context: "ReaderEventNotificationData",
            missing: "UTCTimestamp",
        })?;

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(data: &ReaderEventNotificationData) -> ReaderEventNotificationData {
        let mut out = BytesMut::new();
        data.encode(&mut out);

        let header = codec::parse_header(&out).unwrap();
        assert_eq!(header.type_code(), TYPE_READER_EVENT_NOTIFICATION_DATA);
        assert_eq!(header.total_len(), out.len());

        ReaderEventNotificationData::decode(&out[4..]).unwrap()
    }

    #[test]
    fn test_connection_accepted_roundtrip() {
        let data =
            ReaderEventNotificationData::connection_accepted(Timestamp::Utc(1_700_000_000_000_000));

        let decoded = roundtrip(&data);
        assert_eq!(decoded, data);
        assert!(decoded.connection_attempt.unwrap().is_success());
    }

    #[test]
    fn test_rospec_event_roundtrip() {
        let mut data = ReaderEventNotificationData::new(Timestamp::Uptime(88_000));
        data.rospec = Some(RoSpecEvent {
            kind: RoSpecEventKind::Ended,
            rospec_id: 0x04D2,
            preempting_rospec_id: 0,
        });

        let decoded = roundtrip(&data);
        assert_eq!(decoded.rospec, data.rospec);
    }

    #[test]
    fn test_exception_and_buffer_events() {
        let mut data = ReaderEventNotificationData::new(Timestamp::Uptime(1));
        data.exception = Some(ReaderExceptionEvent { message: "antenna fault".into() });
        data.buffer_level_warning = Some(ReportBufferLevelWarningEvent { fill_percentage: 85 });
        data.buffer_overflow = true;

        let decoded = roundtrip(&data);
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_missing_timestamp_rejected() {
        let mut out = BytesMut::new();
        codec::put_tlv(&mut out, TYPE_READER_EVENT_NOTIFICATION_DATA, |out| {
            codec::put_tlv(out, TYPE_CONNECTION_CLOSE_EVENT, |_| {});
        });

        let result = ReaderEventNotificationData::decode(&out[4..]);
        assert!(matches!(result, Err(Error::MissingParameter { .. })));
    }

    #[test]
    fn test_connection_attempt_status_values() {
        assert!(ConnectionAttemptStatus::try_from(0).unwrap().is_success());
        assert_eq!(
            ConnectionAttemptStatus::try_from(4).unwrap(),
            ConnectionAttemptStatus::AnotherConnectionAttempted
        );
        assert!(ConnectionAttemptStatus::try_from(5).is_err());
    }
}
