//! Reader capability parameters
//!
//! Capabilities are an immutable snapshot negotiated once per connection.
//! Each group is optional in the response; absence means the reader does
//! not support (or was not asked for) that group, never that the value is
//! unknown.

use bytes::{BufMut, BytesMut};

use crate::codec::{self, FieldReader, RawParam};
use crate::error::{Error, Result};

pub const TYPE_GENERAL_DEVICE_CAPABILITIES: u16 = 137;
pub const TYPE_LLRP_CAPABILITIES: u16 = 142;
pub const TYPE_REGULATORY_CAPABILITIES: u16 = 143;
pub const TYPE_UHF_BAND_CAPABILITIES: u16 = 144;
pub const TYPE_C1G2_LLRP_CAPABILITIES: u16 = 327;

/// Capability group selector for GET_READER_CAPABILITIES
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RequestedCapabilities {
    #[default]
    All = 0,
    General = 1,
    Llrp = 2,
    Regulatory = 3,
    AirProtocol = 4,
}

impl TryFrom<u8> for RequestedCapabilities {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::All),
            1 => Ok(Self::General),
            2 => Ok(Self::Llrp),
            3 => Ok(Self::Regulatory),
            4 => Ok(Self::AirProtocol),
            other => Err(Error::InvalidField {
                context: "GET_READER_CAPABILITIES.RequestedData",
                value: other as u32,
            }),
        }
    }
}

/// General device identity and hardware limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralDeviceCapabilities {
    pub max_antennas: u16,
    pub can_set_antenna_properties: bool,
    pub has_utc_clock: bool,
    pub manufacturer_name: String,
    pub model_name: String,
    pub firmware_version: String,
}

impl GeneralDeviceCapabilities {
    fn put_string(out: &mut BytesMut, s: &str) {
        out.put_u16(s.len() as u16);
        out.put_slice(s.as_bytes());
    }

    fn read_string(fields: &mut FieldReader<'_>, context: &'static str) -> Result<String> {
        let len = fields.u16()? as usize;
        let raw = fields.bytes(len)?;
        Ok(std::str::from_utf8(raw)
            .map_err(|_| Error::InvalidUtf8 { context })?
            .to_string())
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_GENERAL_DEVICE_CAPABILITIES, |out| {
            out.put_u16(self.max_antennas);
            let mut flags = 0u8;
            if self.can_set_antenna_properties {
                flags |= 0x80;
            }
            if self.has_utc_clock {
                flags |= 0x40;
            }
            out.put_u8(flags);
            Self::put_string(out, &self.manufacturer_name);
            Self::put_string(out, &self.model_name);
            Self::put_string(out, &self.firmware_version);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let max_antennas = fields.u16()?;
        let flags = fields.u8()?;

        Ok(Self {
            max_antennas,
            can_set_antenna_properties: flags & 0x80 != 0,
            has_utc_clock: flags & 0x40 != 0,
            manufacturer_name: Self::read_string(
                &mut fields,
                "GeneralDeviceCapabilities.DeviceManufacturerName",
            )?,
            model_name: Self::read_string(&mut fields, "GeneralDeviceCapabilities.ModelName")?,
            firmware_version: Self::read_string(
                &mut fields,
                "GeneralDeviceCapabilities.FirmwareVersion",
            )?,
        })
        // Receive sensitivity tables and GPIO capability sub-parameters
        // may follow; they are consumed by the declared length.
    }
}

/// Protocol-level limits the reader enforces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlrpCapabilities {
    pub can_do_rf_survey: bool,
    pub can_report_buffer_fill_warning: bool,
    pub supports_client_request_op_spec: bool,
    pub can_do_tag_inventory_state_aware_singulation: bool,
    pub supports_event_and_report_holding: bool,
    pub max_priority_level_supported: u8,
    pub client_request_op_spec_timeout: u16,
    pub max_num_rospecs: u32,
    pub max_num_specs_per_rospec: u32,
    pub max_num_inventory_parameter_specs_per_ai_spec: u32,
    pub max_num_access_specs: u32,
    pub max_num_op_specs_per_access_spec: u32,
}

impl LlrpCapabilities {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_LLRP_CAPABILITIES, |out| {
            let mut flags = 0u8;
            if self.can_do_rf_survey {
                flags |= 0x80;
            }
            if self.can_report_buffer_fill_warning {
                flags |= 0x40;
            }
            if self.supports_client_request_op_spec {
                flags |= 0x20;
            }
            if self.can_do_tag_inventory_state_aware_singulation {
                flags |= 0x10;
            }
            if self.supports_event_and_report_holding {
                flags |= 0x08;
            }
            out.put_u8(flags);
            out.put_u8(self.max_priority_level_supported);
            out.put_u16(self.client_request_op_spec_timeout);
            out.put_u32(self.max_num_rospecs);
            out.put_u32(self.max_num_specs_per_rospec);
            out.put_u32(self.max_num_inventory_parameter_specs_per_ai_spec);
            out.put_u32(self.max_num_access_specs);
            out.put_u32(self.max_num_op_specs_per_access_spec);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let flags = fields.u8()?;

        Ok(Self {
            can_do_rf_survey: flags & 0x80 != 0,
            can_report_buffer_fill_warning: flags & 0x40 != 0,
            supports_client_request_op_spec: flags & 0x20 != 0,
            can_do_tag_inventory_state_aware_singulation: flags & 0x10 != 0,
            supports_event_and_report_holding: flags & 0x08 != 0,
            max_priority_level_supported: fields.u8()?,
            client_request_op_spec_timeout: fields.u16()?,
            max_num_rospecs: fields.u32()?,
            max_num_specs_per_rospec: fields.u32()?,
            max_num_inventory_parameter_specs_per_ai_spec: fields.u32()?,
            max_num_access_specs: fields.u32()?,
            max_num_op_specs_per_access_spec: fields.u32()?,
        })
    }
}

/// Regulatory region the reader operates in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegulatoryCapabilities {
    /// ISO 3166-1 numeric country code
    pub country_code: u16,
    /// 1 = ETSI 302-208, 2 = FCC Part 15, others per the registry
    pub communications_standard: u16,
}

impl RegulatoryCapabilities {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_REGULATORY_CAPABILITIES, |out| {
            out.put_u16(self.country_code);
            out.put_u16(self.communications_standard);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            country_code: fields.u16()?,
            communications_standard: fields.u16()?,
        })
        // UHF band tables follow as sub-parameters; frequency planning is
        // reader-side detail and is consumed by the declared length.
    }
}

/// Gen2 air-protocol capabilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1g2LlrpCapabilities {
    pub can_support_block_erase: bool,
    pub can_support_block_write: bool,
    pub can_support_block_permalock: bool,
    pub can_support_tag_recommissioning: bool,
    pub can_support_uhf_c1g2_custom_parameters: bool,
    pub can_support_xpc: bool,
    pub max_num_select_filters_per_query: u16,
}

impl C1g2LlrpCapabilities {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_C1G2_LLRP_CAPABILITIES, |out| {
            let mut flags = 0u8;
            if self.can_support_block_erase {
                flags |= 0x80;
            }
            if self.can_support_block_write {
                flags |= 0x40;
            }
            if self.can_support_block_permalock {
                flags |= 0x20;
            }
            if self.can_support_tag_recommissioning {
                flags |= 0x10;
            }
            if self.can_support_uhf_c1g2_custom_parameters {
                flags |= 0x08;
            }
            if self.can_support_xpc {
                flags |= 0x04;
            }
            out.put_u8(flags);
            out.put_u16(self.max_num_select_filters_per_query);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let flags = fields.u8()?;

        Ok(Self {
            can_support_block_erase: flags & 0x80 != 0,
            can_support_block_write: flags & 0x40 != 0,
            can_support_block_permalock: flags & 0x20 != 0,
            can_support_tag_recommissioning: flags & 0x10 != 0,
            can_support_uhf_c1g2_custom_parameters: flags & 0x08 != 0,
            can_support_xpc: flags & 0x04 != 0,
            max_num_select_filters_per_query: fields.u16()?,
        })
    }
}

/// Capability snapshot assembled from a GET_READER_CAPABILITIES_RESPONSE
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReaderCapabilities {
    pub general: Option<GeneralDeviceCapabilities>,
    pub llrp: Option<LlrpCapabilities>,
    pub regulatory: Option<RegulatoryCapabilities>,
    pub air_protocol: Option<C1g2LlrpCapabilities>,
}

impl ReaderCapabilities {
    pub fn encode_params(&self, out: &mut BytesMut) {
        if let Some(general) = &self.general {
            general.encode(out);
        }
        if let Some(llrp) = &self.llrp {
            llrp.encode(out);
        }
        if let Some(regulatory) = &self.regulatory {
            regulatory.encode(out);
        }
        if let Some(air_protocol) = &self.air_protocol {
            air_protocol.encode(out);
        }
    }

    /// Fold one decoded parameter into this snapshot; false when the
    /// parameter belongs to no capability group
    pub fn absorb(&mut self, param: &RawParam<'_>) -> Result<bool> {
        match param.header.type_code() {
            TYPE_GENERAL_DEVICE_CAPABILITIES => {
                self.general = Some(GeneralDeviceCapabilities::decode(param.body)?);
            }
            TYPE_LLRP_CAPABILITIES => {
                self.llrp = Some(LlrpCapabilities::decode(param.body)?);
            }
            TYPE_REGULATORY_CAPABILITIES => {
                self.regulatory = Some(RegulatoryCapabilities::decode(param.body)?);
            }
            TYPE_C1G2_LLRP_CAPABILITIES => {
                self.air_protocol = Some(C1g2LlrpCapabilities::decode(param.body)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ParamCursor;
    use pretty_assertions::assert_eq;

    fn sample() -> ReaderCapabilities {
        ReaderCapabilities {
            general: Some(GeneralDeviceCapabilities {
                max_antennas: 4,
                can_set_antenna_properties: false,
                has_utc_clock: true,
                manufacturer_name: "Bluebird".into(),
                model_name: "FR900".into(),
                firmware_version: "2.1.3".into(),
            }),
            llrp: Some(LlrpCapabilities {
                can_do_rf_survey: false,
                can_report_buffer_fill_warning: true,
                supports_client_request_op_spec: false,
                can_do_tag_inventory_state_aware_singulation: false,
                supports_event_and_report_holding: true,
                max_priority_level_supported: 7,
                client_request_op_spec_timeout: 0,
                max_num_rospecs: 8,
                max_num_specs_per_rospec: 4,
                max_num_inventory_parameter_specs_per_ai_spec: 1,
                max_num_access_specs: 16,
                max_num_op_specs_per_access_spec: 8,
            }),
            regulatory: Some(RegulatoryCapabilities {
                country_code: 410,
                communications_standard: 2,
            }),
            air_protocol: Some(C1g2LlrpCapabilities {
                can_support_block_erase: true,
                can_support_block_write: true,
                can_support_block_permalock: false,
                can_support_tag_recommissioning: false,
                can_support_uhf_c1g2_custom_parameters: false,
                can_support_xpc: false,
                max_num_select_filters_per_query: 2,
            }),
        }
    }

    #[test]
    fn test_capabilities_roundtrip() {
        let caps = sample();

        let mut out = BytesMut::new();
        caps.encode_params(&mut out);

        let mut decoded = ReaderCapabilities::default();
        let mut cursor = ParamCursor::new(&out);
        while let Some(param) = cursor.next_param().unwrap() {
            assert!(decoded.absorb(&param).unwrap());
        }

        assert_eq!(decoded, caps);
    }

    #[test]
    fn test_absent_groups_stay_absent() {
        let caps = ReaderCapabilities {
            llrp: sample().llrp,
            ..Default::default()
        };

        let mut out = BytesMut::new();
        caps.encode_params(&mut out);

        let mut decoded = ReaderCapabilities::default();
        let mut cursor = ParamCursor::new(&out);
        while let Some(param) = cursor.next_param().unwrap() {
            decoded.absorb(&param).unwrap();
        }

        assert!(decoded.general.is_none());
        assert!(decoded.regulatory.is_none());
        assert!(decoded.air_protocol.is_none());
        assert!(decoded.llrp.is_some());
    }

    #[test]
    fn test_general_capabilities_strings() {
        let general = sample().general.unwrap();

        let mut out = BytesMut::new();
        general.encode(&mut out);

        let decoded = GeneralDeviceCapabilities::decode(&out[4..]).unwrap();
        assert_eq!(decoded.manufacturer_name, "Bluebird");
        assert_eq!(decoded.model_name, "FR900");
        assert_eq!(decoded.firmware_version, "2.1.3");
    }

    #[test]
    fn test_requested_capabilities_conversion() {
        assert_eq!(RequestedCapabilities::try_from(0).unwrap(), RequestedCapabilities::All);
        assert_eq!(
            RequestedCapabilities::try_from(4).unwrap(),
            RequestedCapabilities::AirProtocol
        );
        assert!(RequestedCapabilities::try_from(9).is_err());
    }
}
