//! Generic parameter decoding
//!
//! Most decoding flows through the typed containers (messages know the
//! parameters they carry), but the protocol also needs a generic entry
//! point: unknown TLV types must round-trip as opaque blobs, and vendor
//! custom parameters must be preserved byte-exact without understanding
//! their payloads.

use bytes::{Bytes, BytesMut};

use crate::access::{self, AccessSpec};
use crate::codec::{self, ParamHeader};
use crate::config::{self, AntennaConfiguration, KeepaliveSpec};
use crate::custom::{CustomParameter, TYPE_CUSTOM, UnknownParameter};
use crate::error::Result;
use crate::events::{self, ReaderEventNotificationData};
use crate::report::{self, TagReportData, TvField};
use crate::rospec::{self, RoSpec};
use crate::status::{LlrpStatus, TYPE_LLRP_STATUS};

/// A single decoded parameter
///
/// Typed variants cover the parameters that are meaningful standalone;
/// everything structurally unrecognized is retained as [`Parameter::Unknown`]
/// so it can be skipped or re-encoded byte-identically.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// A TV-encoded field
    Tv(TvField),
    LlrpStatus(LlrpStatus),
    RoSpec(RoSpec),
    AccessSpec(AccessSpec),
    TagReportData(TagReportData),
    ReaderEventNotificationData(ReaderEventNotificationData),
    AntennaConfiguration(AntennaConfiguration),
    KeepaliveSpec(KeepaliveSpec),
    Custom(CustomParameter),
    Unknown(UnknownParameter),
}

impl Parameter {
    /// Decode one parameter from the front of `buf`
    ///
    /// Returns the parameter and the number of bytes consumed, which is
    /// always the parameter's declared length.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let header = codec::parse_header(buf)?;
        let total = header.total_len();
        let body = &buf[header.header_len()..total];

        let parameter = match header {
            ParamHeader::Tv { param_type, .. } => Self::Tv(TvField::decode(param_type, body)?),
            ParamHeader::Tlv { param_type, .. } => match param_type {
                TYPE_LLRP_STATUS => Self::LlrpStatus(LlrpStatus::decode(body)?),
                rospec::TYPE_ROSPEC => Self::RoSpec(RoSpec::decode(body)?),
                access::TYPE_ACCESS_SPEC => Self::AccessSpec(AccessSpec::decode(body)?),
                report::TYPE_TAG_REPORT_DATA => Self::TagReportData(TagReportData::decode(body)?),
                events::TYPE_READER_EVENT_NOTIFICATION_DATA => {
                    Self::ReaderEventNotificationData(ReaderEventNotificationData::decode(body)?)
                }
                config::TYPE_ANTENNA_CONFIGURATION => {
                    Self::AntennaConfiguration(AntennaConfiguration::decode(body)?)
                }
                config::TYPE_KEEPALIVE_SPEC => Self::KeepaliveSpec(KeepaliveSpec::decode(body)?),
                TYPE_CUSTOM => Self::Custom(CustomParameter::decode(body)?),
                _ => Self::Unknown(UnknownParameter {
                    param_type,
                    body: Bytes::copy_from_slice(body),
                }),
            },
        };

        Ok((parameter, total))
    }

    pub fn encode(&self, out: &mut BytesMut) {
        match self {
            Self::Tv(field) => field.encode(out),
            Self::LlrpStatus(status) => status.encode(out),
            Self::RoSpec(spec) => spec.encode(out),
            Self::AccessSpec(spec) => spec.encode(out),
            Self::TagReportData(report) => report.encode(out),
            Self::ReaderEventNotificationData(data) => data.encode(out),
            Self::AntennaConfiguration(config) => config.encode(out),
            Self::KeepaliveSpec(spec) => spec.encode(out),
            Self::Custom(custom) => custom.encode(out),
            Self::Unknown(unknown) => unknown.encode(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_reports_consumed_length() {
        let mut out = BytesMut::new();
        LlrpStatus::success().encode(&mut out);
        let encoded_len = out.len();
        out.extend_from_slice(&[0xFF; 4]);

        let (param, consumed) = Parameter::decode(&out).unwrap();
        assert_eq!(consumed, encoded_len);
        assert!(matches!(param, Parameter::LlrpStatus(ref s) if s.is_success()));
    }

    #[test]
    fn test_unknown_tlv_roundtrips_byte_identical() {
        // Type 900 is unassigned; the blob must survive decode → encode
        let mut original = BytesMut::new();
        codec::put_tlv(&mut original, 900, |out| {
            out.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7]);
        });

        let (param, consumed) = Parameter::decode(&original).unwrap();
        assert_eq!(consumed, original.len());
        assert!(matches!(param, Parameter::Unknown(_)));

        let mut reencoded = BytesMut::new();
        param.encode(&mut reencoded);
        assert_eq!(reencoded, original);
    }

    #[test]
    fn test_custom_parameter_decodes_typed() {
        let custom = CustomParameter::new(5882, 9, vec![0xCA, 0xFE]);
        let mut out = BytesMut::new();
        custom.encode(&mut out);

        let (param, _) = Parameter::decode(&out).unwrap();
        assert_eq!(param, Parameter::Custom(custom));
    }

    #[test]
    fn test_tv_parameter_decodes_typed() {
        let mut out = BytesMut::new();
        TvField::AntennaId(3).encode(&mut out);

        let (param, consumed) = Parameter::decode(&out).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(param, Parameter::Tv(TvField::AntennaId(3)));
    }

    #[test]
    fn test_typed_parameters_roundtrip_generically() {
        let params: Vec<Parameter> = vec![
            Parameter::RoSpec(RoSpec::immediate_inventory(5, vec![1])),
            Parameter::KeepaliveSpec(KeepaliveSpec::periodic(15_000)),
            Parameter::TagReportData(TagReportData::new(vec![0xAB; 12])),
        ];

        for original in params {
            let mut out = BytesMut::new();
            original.encode(&mut out);

            let (decoded, consumed) = Parameter::decode(&out).unwrap();
            assert_eq!(consumed, out.len());
            assert_eq!(decoded, original);
        }
    }
}
