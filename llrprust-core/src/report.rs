//! Tag report decoding: TagReportData and its TV sub-parameters
//!
//! Which optional fields a report carries is decided by the negotiated
//! report configuration, not by a fixed schema. The decoder reflects
//! exactly what the reader included; absent fields stay `None` and are
//! never given synthesized defaults.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};

use crate::access::OpSpecResult;
use crate::codec::{self, FieldReader, ParamCursor, ParamHeader};
use crate::custom::{CustomParameter, TYPE_CUSTOM};
use crate::error::{Error, Result};

pub const TYPE_TAG_REPORT_DATA: u16 = 240;
pub const TYPE_EPC_DATA: u16 = 241;

// TV parameter type codes used in tag reports
pub const TV_ANTENNA_ID: u8 = 1;
pub const TV_FIRST_SEEN_UTC: u8 = 2;
pub const TV_FIRST_SEEN_UPTIME: u8 = 3;
pub const TV_LAST_SEEN_UTC: u8 = 4;
pub const TV_LAST_SEEN_UPTIME: u8 = 5;
pub const TV_PEAK_RSSI: u8 = 6;
pub const TV_CHANNEL_INDEX: u8 = 7;
pub const TV_TAG_SEEN_COUNT: u8 = 8;
pub const TV_ROSPEC_ID: u8 = 9;
pub const TV_INVENTORY_PARAMETER_SPEC_ID: u8 = 10;
pub const TV_C1G2_CRC: u8 = 11;
pub const TV_C1G2_PC: u8 = 12;
pub const TV_EPC_96: u8 = 13;
pub const TV_SPEC_INDEX: u8 = 14;
pub const TV_CLIENT_REQUEST_OP_SPEC_RESULT: u8 = 15;
pub const TV_ACCESS_SPEC_ID: u8 = 16;
pub const TV_OP_SPEC_ID: u8 = 17;
pub const TV_C1G2_SINGULATION_DETAILS: u8 = 18;

/// A decoded TV parameter
///
/// The payload layout of each type comes from the static schema table in
/// [`crate::codec::tv_payload_len`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TvField {
    AntennaId(u16),
    FirstSeenUtc(u64),
    FirstSeenUptime(u64),
    LastSeenUtc(u64),
    LastSeenUptime(u64),
    /// dBm, two's-complement 8-bit
    PeakRssi(i8),
    ChannelIndex(u16),
    TagSeenCount(u16),
    RoSpecId(u32),
    InventoryParameterSpecId(u16),
    C1g2Crc(u16),
    C1g2Pc(u16),
    Epc96([u8; 12]),
    SpecIndex(u16),
    ClientRequestOpSpecResult(u16),
    AccessSpecId(u32),
    OpSpecId(u16),
    C1g2SingulationDetails { collisions: u16, empty_slots: u16 },
}

impl TvField {
    pub fn type_code(&self) -> u8 {
        match self {
            Self::AntennaId(_) => TV_ANTENNA_ID,
            Self::FirstSeenUtc(_) => TV_FIRST_SEEN_UTC,
            Self::FirstSeenUptime(_) => TV_FIRST_SEEN_UPTIME,
            Self::LastSeenUtc(_) => TV_LAST_SEEN_UTC,
            Self::LastSeenUptime(_) => TV_LAST_SEEN_UPTIME,
            Self::PeakRssi(_) => TV_PEAK_RSSI,
            Self::ChannelIndex(_) => TV_CHANNEL_INDEX,
            Self::TagSeenCount(_) => TV_TAG_SEEN_COUNT,
            Self::RoSpecId(_) => TV_ROSPEC_ID,
            Self::InventoryParameterSpecId(_) => TV_INVENTORY_PARAMETER_SPEC_ID,
            Self::C1g2Crc(_) => TV_C1G2_CRC,
            Self::C1g2Pc(_) => TV_C1G2_PC,
            Self::Epc96(_) => TV_EPC_96,
            Self::SpecIndex(_) => TV_SPEC_INDEX,
            Self::ClientRequestOpSpecResult(_) => TV_CLIENT_REQUEST_OP_SPEC_RESULT,
            Self::AccessSpecId(_) => TV_ACCESS_SPEC_ID,
            Self::OpSpecId(_) => TV_OP_SPEC_ID,
            Self::C1g2SingulationDetails { .. } => TV_C1G2_SINGULATION_DETAILS,
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tv_header(out, self.type_code());
        match self {
            Self::AntennaId(v)
            | Self::ChannelIndex(v)
            | Self::TagSeenCount(v)
            | Self::InventoryParameterSpecId(v)
            | Self::C1g2Crc(v)
            | Self::C1g2Pc(v)
            | Self::SpecIndex(v)
            | Self::ClientRequestOpSpecResult(v)
            | Self::OpSpecId(v) => out.put_u16(*v),
            Self::FirstSeenUtc(v)
            | Self::FirstSeenUptime(v)
            | Self::LastSeenUtc(v)
            | Self::LastSeenUptime(v) => out.put_u64(*v),
            Self::PeakRssi(v) => out.put_i8(*v),
            Self::RoSpecId(v) | Self::AccessSpecId(v) => out.put_u32(*v),
            Self::Epc96(epc) => out.put_slice(epc),
            Self::C1g2SingulationDetails { collisions, empty_slots } => {
                out.put_u16(*collisions);
                out.put_u16(*empty_slots);
            }
        }
    }

    /// Decode a TV payload for the given type code
    pub fn decode(param_type: u8, payload: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(payload);
        match param_type {
            TV_ANTENNA_ID => Ok(Self::AntennaId(fields.u16()?)),
            TV_FIRST_SEEN_UTC => Ok(Self::FirstSeenUtc(fields.u64()?)),
            TV_FIRST_SEEN_UPTIME => Ok(Self::FirstSeenUptime(fields.u64()?)),
            TV_LAST_SEEN_UTC => Ok(Self::LastSeenUtc(fields.u64()?)),
            TV_LAST_SEEN_UPTIME => Ok(Self::LastSeenUptime(fields.u64()?)),
            TV_PEAK_RSSI => Ok(Self::PeakRssi(fields.i8()?)),
            TV_CHANNEL_INDEX => Ok(Self::ChannelIndex(fields.u16()?)),
            TV_TAG_SEEN_COUNT => Ok(Self::TagSeenCount(fields.u16()?)),
            TV_ROSPEC_ID => Ok(Self::RoSpecId(fields.u32()?)),
            TV_INVENTORY_PARAMETER_SPEC_ID => {
                Ok(Self::InventoryParameterSpecId(fields.u16()?))
            }
            TV_C1G2_CRC => Ok(Self::C1g2Crc(fields.u16()?)),
            TV_C1G2_PC => Ok(Self::C1g2Pc(fields.u16()?)),
            TV_EPC_96 => {
                let mut epc = [0u8; 12];
                epc.copy_from_slice(fields.bytes(12)?);
                Ok(Self::Epc96(epc))
            }
            TV_SPEC_INDEX => Ok(Self::SpecIndex(fields.u16()?)),
            TV_CLIENT_REQUEST_OP_SPEC_RESULT => {
                Ok(Self::ClientRequestOpSpecResult(fields.u16()?))
            }
            TV_ACCESS_SPEC_ID => Ok(Self::AccessSpecId(fields.u32()?)),
            TV_OP_SPEC_ID => Ok(Self::OpSpecId(fields.u16()?)),
            TV_C1G2_SINGULATION_DETAILS => Ok(Self::C1g2SingulationDetails {
                collisions: fields.u16()?,
                empty_slots: fields.u16()?,
            }),
            other => Err(Error::UnknownTvType(other)),
        }
    }
}

/// One tag observation from an RO_ACCESS_REPORT
///
/// The EPC arrives as either the compact 96-bit TV form or the
/// variable-bit-length EPCData form; both normalize into [`Self::epc`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagReportData {
    pub epc: Bytes,
    pub rospec_id: Option<u32>,
    pub spec_index: Option<u16>,
    pub inventory_parameter_spec_id: Option<u16>,
    pub antenna_id: Option<u16>,
    /// Peak received signal strength in dBm
    pub peak_rssi: Option<i8>,
    pub channel_index: Option<u16>,
    /// Microseconds since the UTC epoch
    pub first_seen_utc: Option<u64>,
    /// Microseconds since reader boot
    pub first_seen_uptime: Option<u64>,
    pub last_seen_utc: Option<u64>,
    pub last_seen_uptime: Option<u64>,
    pub seen_count: Option<u16>,
    pub access_spec_id: Option<u32>,
    pub crc: Option<u16>,
    pub pc_bits: Option<u16>,
    /// Access operation results, in op-spec execution order
    pub op_results: Vec<OpSpecResult>,
    /// Vendor extensions, bytes preserved verbatim
    pub custom: Vec<CustomParameter>,
}

impl TagReportData {
    pub fn new(epc: impl Into<Bytes>) -> Self {
        Self {
            epc: epc.into(),
            ..Self::default()
        }
    }

    /// EPC as an uppercase hex string
    pub fn epc_hex(&self) -> String {
        hex::encode_upper(&self.epc)
    }

    /// First-seen timestamp, preferring the UTC form over uptime
    pub fn first_seen(&self) -> Option<u64> {
        self.first_seen_utc.or(self.first_seen_uptime)
    }

    /// Last-seen timestamp, preferring the UTC form over uptime
    pub fn last_seen(&self) -> Option<u64> {
        self.last_seen_utc.or(self.last_seen_uptime)
    }

    /// First-seen UTC timestamp as a `DateTime`
    pub fn first_seen_time(&self) -> Option<DateTime<Utc>> {
        self.first_seen_utc
            .and_then(|us| DateTime::from_timestamp_micros(us as i64))
    }

    /// Last-seen UTC timestamp as a `DateTime`
    pub fn last_seen_time(&self) -> Option<DateTime<Utc>> {
        self.last_seen_utc
            .and_then(|us| DateTime::from_timestamp_micros(us as i64))
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_TAG_REPORT_DATA, |out| {
            // EPC one-of: 96-bit EPCs take the compact TV form
            if self.epc.len() == 12 {
                let mut epc = [0u8; 12];
                epc.copy_from_slice(&self.epc);
                TvField::Epc96(epc).encode(out);
            } else {
                codec::put_tlv(out, TYPE_EPC_DATA, |out| {
                    out.put_u16((self.epc.len() * 8) as u16);
                    out.put_slice(&self.epc);
                });
            }

            if let Some(v) = self.rospec_id {
                TvField::RoSpecId(v).encode(out);
            }
            if let Some(v) = self.spec_index {
                TvField::SpecIndex(v).encode(out);
            }
            if let Some(v) = self.inventory_parameter_spec_id {
                TvField::InventoryParameterSpecId(v).encode(out);
            }
            if let Some(v) = self.antenna_id {
                TvField::AntennaId(v).encode(out);
            }
            if let Some(v) = self.peak_rssi {
                TvField::PeakRssi(v).encode(out);
            }
            if let Some(v) = self.channel_index {
                TvField::ChannelIndex(v).encode(out);
            }
            if let Some(v) = self.first_seen_utc {
                TvField::FirstSeenUtc(v).encode(out);
            }
            if let Some(v) = self.first_seen_uptime {
                TvField::FirstSeenUptime(v).encode(out);
            }
            if let Some(v) = self.last_seen_utc {
                TvField::LastSeenUtc(v).encode(out);
            }
            if let Some(v) = self.last_seen_uptime {
                TvField::LastSeenUptime(v).encode(out);
            }
            if let Some(v) = self.seen_count {
                TvField::TagSeenCount(v).encode(out);
            }
            if let Some(v) = self.access_spec_id {
                TvField::AccessSpecId(v).encode(out);
            }
            if let Some(v) = self.crc {
                TvField::C1g2Crc(v).encode(out);
            }
            if let Some(v) = self.pc_bits {
                TvField::C1g2Pc(v).encode(out);
            }
            for result in &self.op_results {
                result.encode(out);
            }
            for custom in &self.custom {
                custom.encode(out);
            }
        });
    }

    fn assign(&mut self, field: TvField) {
        match field {
            TvField::Epc96(epc) => self.epc = Bytes::copy_from_slice(&epc),
            TvField::RoSpecId(v) => self.rospec_id = Some(v),
            TvField::SpecIndex(v) => self.spec_index = Some(v),
            TvField::InventoryParameterSpecId(v) => {
                self.inventory_parameter_spec_id = Some(v)
            }
            TvField::AntennaId(v) => self.antenna_id = Some(v),
            TvField::PeakRssi(v) => self.peak_rssi = Some(v),
            TvField::ChannelIndex(v) => self.channel_index = Some(v),
            TvField::FirstSeenUtc(v) => self.first_seen_utc = Some(v),
            TvField::FirstSeenUptime(v) => self.first_seen_uptime = Some(v),
            TvField::LastSeenUtc(v) => self.last_seen_utc = Some(v),
            TvField::LastSeenUptime(v) => self.last_seen_uptime = Some(v),
            TvField::TagSeenCount(v) => self.seen_count = Some(v),
            TvField::AccessSpecId(v) => self.access_spec_id = Some(v),
            TvField::C1g2Crc(v) => self.crc = Some(v),
            TvField::C1g2Pc(v) => self.pc_bits = Some(v),
            // Singulation diagnostics and client-request plumbing carry no
            // report field
            TvField::ClientRequestOpSpecResult(_)
            | TvField::OpSpecId(_)
            | TvField::C1g2SingulationDetails { .. } => {}
        }
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut report = Self::default();
        let mut have_epc = false;

        let mut cursor = ParamCursor::new(body);
        while let Some(param) = cursor.next_param()? {
            match param.header {
                ParamHeader::Tv { param_type, .. } => {
                    let field = TvField::decode(param_type, param.body)?;
                    if matches!(field, TvField::Epc96(_)) {
                        have_epc = true;
                    }
                    report.assign(field);
                }
                ParamHeader::Tlv { param_type, .. } => match param_type {
                    TYPE_EPC_DATA => {
                        let mut fields = FieldReader::new(param.body);
                        let bit_count = fields.u16()? as usize;
                        let byte_count = bit_count.div_ceil(8);
                        report.epc = Bytes::copy_from_slice(fields.bytes(byte_count)?);
                        have_epc = true;
                    }
                    TYPE_CUSTOM => report.custom.push(CustomParameter::decode(param.body)?),
                    _ => {
                        if let Some(result) = OpSpecResult::decode_param(&param)? {
                            report.op_results.push(result);
                        } else {
                            tracing::trace!(
                                param_type,
                                "skipping unrecognized parameter in TagReportData"
                            );
                        }
                    }
                },
            }
        }

        if !have_epc {
            return Err(Error::MissingParameter {
                context: "TagReportData",
                missing: "EPCData",
            });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(report: &TagReportData) -> TagReportData {
        let mut out = BytesMut::new();
        report.encode(&mut out);

        let header = codec::parse_header(&out).unwrap();
        assert_eq!(header.type_code(), TYPE_TAG_REPORT_DATA);
        assert_eq!(header.total_len(), out.len());

        TagReportData::decode(&out[4..]).unwrap()
    }

    #[test]
    fn test_report_roundtrip_epc_data_form() {
        // 128-bit EPC takes the EPCData form
        let epc = hex::decode("8504700013684D573243363207702205").unwrap();
        let mut report = TagReportData::new(epc);
        report.antenna_id = Some(2);
        report.peak_rssi = Some(-77);

        let decoded = roundtrip(&report);
        assert_eq!(decoded, report);
        assert_eq!(decoded.epc_hex(), "8504700013684D573243363207702205");
    }

    #[test]
    fn test_report_roundtrip_epc96_form() {
        let mut report = TagReportData::new(vec![0x30; 12]);
        report.seen_count = Some(3);
        report.first_seen_utc = Some(1_700_000_000_000_000);
        report.last_seen_utc = Some(1_700_000_000_250_000);

        let decoded = roundtrip(&report);
        assert_eq!(decoded, report);
    }

    #[test]
    fn test_peak_rssi_twos_complement() {
        // Raw byte 0xB3 is -77 dBm as a two's-complement 8-bit value
        let mut out = BytesMut::new();
        codec::put_tlv(&mut out, TYPE_TAG_REPORT_DATA, |out| {
            TvField::Epc96([0x11; 12]).encode(out);
            codec::put_tv_header(out, TV_PEAK_RSSI);
            out.put_u8(0xB3);
        });

        let report = TagReportData::decode(&out[4..]).unwrap();
        assert_eq!(report.peak_rssi, Some(-77));
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        // Only AntennaID and PeakRSSI present
        let mut out = BytesMut::new();
        codec::put_tlv(&mut out, TYPE_TAG_REPORT_DATA, |out| {
            TvField::Epc96([0x22; 12]).encode(out);
            TvField::AntennaId(2).encode(out);
            TvField::PeakRssi(-60).encode(out);
        });

        let report = TagReportData::decode(&out[4..]).unwrap();
        assert_eq!(report.antenna_id, Some(2));
        assert_eq!(report.peak_rssi, Some(-60));
        assert_eq!(report.pc_bits, None);
        assert_eq!(report.first_seen_utc, None);
        assert_eq!(report.last_seen_utc, None);
        assert_eq!(report.seen_count, None);
    }

    #[test]
    fn test_missing_epc_rejected() {
        let mut out = BytesMut::new();
        codec::put_tlv(&mut out, TYPE_TAG_REPORT_DATA, |out| {
            TvField::AntennaId(1).encode(out);
        });

        let result = TagReportData::decode(&out[4..]);
        assert!(matches!(
            result,
            Err(Error::MissingParameter { missing: "EPCData", .. })
        ));
    }

    #[test]
    fn test_custom_parameters_preserved() {
        let mut report = TagReportData::new(vec![0x01; 12]);
        report.custom.push(CustomParameter::new(25882, 3, vec![9, 9, 9]));

        let decoded = roundtrip(&report);
        assert_eq!(decoded.custom.len(), 1);
        assert_eq!(decoded.custom[0].payload.as_ref(), &[9, 9, 9]);
    }

    #[test]
    fn test_op_results_in_report() {
        let mut report = TagReportData::new(vec![0x07; 12]);
        report.op_results.push(OpSpecResult::Write {
            result: 0,
            op_spec_id: 2,
            words_written: 4,
        });

        let decoded = roundtrip(&report);
        assert_eq!(decoded.op_results, report.op_results);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Both EPC wire forms normalize into the same bytes field
            #[test]
            fn epc_of_any_length_roundtrips(
                epc in proptest::collection::vec(any::<u8>(), 1..64)
            ) {
                let report = TagReportData::new(epc.clone());

                let mut out = BytesMut::new();
                report.encode(&mut out);

                let header = codec::parse_header(&out).unwrap();
                prop_assert_eq!(header.total_len(), out.len());

                let decoded = TagReportData::decode(&out[4..]).unwrap();
                prop_assert_eq!(decoded.epc.as_ref(), epc.as_slice());
            }

            #[test]
            fn rssi_bytes_decode_as_twos_complement(raw in any::<u8>()) {
                let field = TvField::decode(TV_PEAK_RSSI, &[raw]).unwrap();
                prop_assert_eq!(field, TvField::PeakRssi(raw as i8));
            }
        }
    }

    #[test]
    fn test_seen_timestamp_preference() {
        let mut report = TagReportData::new(vec![0x01; 12]);
        report.first_seen_uptime = Some(5_000);
        assert_eq!(report.first_seen(), Some(5_000));

        report.first_seen_utc = Some(1_700_000_000_000_000);
        assert_eq!(report.first_seen(), Some(1_700_000_000_000_000));
        assert!(report.first_seen_time().is_some());
    }
}
