//! ROSpec parameters: boundary triggers, antenna inventory specs, report
//! specification
//!
//! A ROSpec is a schedulable inventory job. Its boundary (start/stop
//! triggers) and its antenna inventory specs are nested TLV parameters;
//! the trigger alternatives are one-of slots disambiguated by the type
//! code of the nested parameter.

use bytes::{BufMut, BytesMut};

use crate::codec::{self, FieldReader, ParamCursor};
use crate::config::AntennaConfiguration;
use crate::error::{Error, Result};

pub const TYPE_UTC_TIMESTAMP: u16 = 128;
pub const TYPE_ROSPEC: u16 = 177;
pub const TYPE_RO_BOUNDARY_SPEC: u16 = 178;
pub const TYPE_ROSPEC_START_TRIGGER: u16 = 179;
pub const TYPE_PERIODIC_TRIGGER_VALUE: u16 = 180;
pub const TYPE_GPI_TRIGGER_VALUE: u16 = 181;
pub const TYPE_ROSPEC_STOP_TRIGGER: u16 = 182;
pub const TYPE_AI_SPEC: u16 = 183;
pub const TYPE_AI_SPEC_STOP_TRIGGER: u16 = 184;
pub const TYPE_TAG_OBSERVATION_TRIGGER: u16 = 185;
pub const TYPE_INVENTORY_PARAMETER_SPEC: u16 = 186;
pub const TYPE_RO_REPORT_SPEC: u16 = 237;
pub const TYPE_TAG_REPORT_CONTENT_SELECTOR: u16 = 238;
pub const TYPE_C1G2_EPC_MEMORY_SELECTOR: u16 = 348;

/// Air protocol identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AirProtocol {
    Unspecified = 0,
    EpcGlobalClass1Gen2 = 1,
}

impl TryFrom<u8> for AirProtocol {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Unspecified),
            1 => Ok(Self::EpcGlobalClass1Gen2),
            other => Err(Error::InvalidField {
                context: "ProtocolID",
                value: other as u32,
            }),
        }
    }
}

/// ROSpec execution state as reported on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RoSpecState {
    Disabled = 0,
    Inactive = 1,
    Active = 2,
}

impl TryFrom<u8> for RoSpecState {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Inactive),
            2 => Ok(Self::Active),
            other => Err(Error::InvalidField {
                context: "ROSpec.CurrentState",
                value: other as u32,
            }),
        }
    }
}

/// GPI trigger condition: a GPI port reaching a level, with a timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpiTriggerValue {
    pub port: u16,
    /// Trigger on high (true) or low (false)
    pub event: bool,
    /// 0 = no timeout
    pub timeout_ms: u32,
}

impl GpiTriggerValue {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_GPI_TRIGGER_VALUE, |out| {
            out.put_u16(self.port);
            out.put_u8(u8::from(self.event) << 7);
            out.put_u32(self.timeout_ms);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            port: fields.u16()?,
            event: fields.u8()? != 0,
            timeout_ms: fields.u32()?,
        })
    }
}

/// Periodic trigger: fire every `period_ms` after `offset_ms`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicTriggerValue {
    pub offset_ms: u32,
    /// 0 = fire once
    pub period_ms: u32,
    /// Optional absolute start time, microseconds since the UTC epoch
    pub utc_time: Option<u64>,
}

impl PeriodicTriggerValue {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_PERIODIC_TRIGGER_VALUE, |out| {
            out.put_u32(self.offset_ms);
            out.put_u32(self.period_ms);
            if let Some(us) = self.utc_time {
                codec::put_tlv(out, TYPE_UTC_TIMESTAMP, |out| {
                    out.put_u64(us);
                });
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let offset_ms = fields.u32()?;
        let period_ms = fields.u32()?;

        let mut utc_time = None;
        let mut cursor = ParamCursor::new(fields.rest());
        while let Some(param) = cursor.next_param()? {
            if param.header.type_code() == TYPE_UTC_TIMESTAMP {
                let mut ts = FieldReader::new(param.body);
                utc_time = Some(ts.u64()?);
            }
        }

        Ok(Self { offset_ms, period_ms, utc_time })
    }
}

/// ROSpec start trigger: one-of slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoSpecStartTrigger {
    /// Started only by an explicit START_ROSPEC
    Null,
    /// Starts as soon as the spec is enabled
    Immediate,
    Periodic(PeriodicTriggerValue),
    Gpi(GpiTriggerValue),
}

impl RoSpecStartTrigger {
    fn type_value(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Immediate => 1,
            Self::Periodic(_) => 2,
            Self::Gpi(_) => 3,
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ROSPEC_START_TRIGGER, |out| {
            out.put_u8(self.type_value());
            match self {
                Self::Periodic(periodic) => periodic.encode(out),
                Self::Gpi(gpi) => gpi.encode(out),
                Self::Null | Self::Immediate => {}
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let trigger_type = fields.u8()?;
        let mut cursor = ParamCursor::new(fields.rest());

        match trigger_type {
            0 => Ok(Self::Null),
            1 => Ok(Self::Immediate),
            2 => match cursor.next_param()? {
                Some(param) if param.header.type_code() == TYPE_PERIODIC_TRIGGER_VALUE => {
                    Ok(Self::Periodic(PeriodicTriggerValue::decode(param.body)?))
                }
                Some(param) => Err(Error::UnexpectedParameter {
                    context: "ROSpecStartTrigger",
                    found: param.header.type_code(),
                }),
                None => Err(Error::MissingParameter {
                    context: "ROSpecStartTrigger",
                    missing: "PeriodicTriggerValue",
                }),
            },
            3 => match cursor.next_param()? {
                Some(param) if param.header.type_code() == TYPE_GPI_TRIGGER_VALUE => {
                    Ok(Self::Gpi(GpiTriggerValue::decode(param.body)?))
                }
                Some(param) => Err(Error::UnexpectedParameter {
                    context: "ROSpecStartTrigger",
                    found: param.header.type_code(),
                }),
                None => Err(Error::MissingParameter {
                    context: "ROSpecStartTrigger",
                    missing: "GPITriggerValue",
                }),
            },
            other => Err(Error::InvalidField {
                context: "ROSpecStartTrigger.ROSpecStartTriggerType",
                value: other as u32,
            }),
        }
    }
}

/// ROSpec stop trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoSpecStopTrigger {
    /// Runs until stopped explicitly or by its AISpecs completing
    Null,
    Duration(u32),
    Gpi(GpiTriggerValue),
}

impl RoSpecStopTrigger {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ROSPEC_STOP_TRIGGER, |out| {
            match self {
                Self::Null => {
                    out.put_u8(0);
                    out.put_u32(0);
                }
                Self::Duration(ms) => {
                    out.put_u8(1);
                    out.put_u32(*ms);
                }
                Self::Gpi(gpi) => {
                    out.put_u8(2);
                    out.put_u32(0);
                    gpi.encode(out);
                }
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let trigger_type = fields.u8()?;
        let duration = fields.u32()?;
        let mut cursor = ParamCursor::new(fields.rest());

        match trigger_type {
            0 => Ok(Self::Null),
            1 => Ok(Self::Duration(duration)),
            2 => match cursor.next_param()? {
                Some(param) if param.header.type_code() == TYPE_GPI_TRIGGER_VALUE => {
                    Ok(Self::Gpi(GpiTriggerValue::decode(param.body)?))
                }
                Some(param) => Err(Error::UnexpectedParameter {
                    context: "ROSpecStopTrigger",
                    found: param.header.type_code(),
                }),
                None => Err(Error::MissingParameter {
                    context: "ROSpecStopTrigger",
                    missing: "GPITriggerValue",
                }),
            },
            other => Err(Error::InvalidField {
                context: "ROSpecStopTrigger.ROSpecStopTriggerType",
                value: other as u32,
            }),
        }
    }
}

/// ROSpec boundary: when inventory starts and stops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoBoundarySpec {
    pub start_trigger: RoSpecStartTrigger,
    pub stop_trigger: RoSpecStopTrigger,
}

impl RoBoundarySpec {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_RO_BOUNDARY_SPEC, |out| {
            self.start_trigger.encode(out);
            self.stop_trigger.encode(out);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut cursor = ParamCursor::new(body);
        let mut start_trigger = None;
        let mut stop_trigger = None;

        while let Some(param) = cursor.next_param()? {
            match param.header.type_code() {
                TYPE_ROSPEC_START_TRIGGER => {
                    start_trigger = Some(RoSpecStartTrigger::decode(param.body)?)
                }
                TYPE_ROSPEC_STOP_TRIGGER => {
                    stop_trigger = Some(RoSpecStopTrigger::decode(param.body)?)
                }
                _ => {}
            }
        }

        Ok(Self {
            start_trigger: start_trigger.ok_or(Error::MissingParameter {
                context: "ROBoundarySpec",
                missing: "ROSpecStartTrigger",
            })?,
            stop_trigger: stop_trigger.ok_or(Error::MissingParameter {
                context: "ROBoundarySpec",
                missing: "ROSpecStopTrigger",
            })?,
        })
    }
}

/// Trigger on observing tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagObservationTrigger {
    /// 0 = upon seeing N tag observations, 1 = upon N attempts,
    /// 2 = N unique tags, 3 = idle time T with no new tags
    pub trigger_type: u8,
    pub number_of_tags: u16,
    pub number_of_attempts: u16,
    /// Idle time in milliseconds
    pub t_ms: u16,
    /// 0 = no timeout
    pub timeout_ms: u32,
}

impl TagObservationTrigger {
    /// Stop after `n` tag observations, bounded by `timeout_ms`
    pub fn upon_n_tags(n: u16, timeout_ms: u32) -> Self {
        Self {
            trigger_type: 0,
            number_of_tags: n,
            number_of_attempts: 0,
            t_ms: 0,
            timeout_ms,
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_TAG_OBSERVATION_TRIGGER, |out| {
            out.put_u8(self.trigger_type);
            out.put_u16(self.number_of_tags);
            out.put_u16(self.number_of_attempts);
            out.put_u16(self.t_ms);
            out.put_u32(self.timeout_ms);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            trigger_type: fields.u8()?,
            number_of_tags: fields.u16()?,
            number_of_attempts: fields.u16()?,
            t_ms: fields.u16()?,
            timeout_ms: fields.u32()?,
        })
    }
}

/// AISpec stop trigger: one-of slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiSpecStopTrigger {
    /// Runs until the owning ROSpec stops
    Null,
    Duration(u32),
    Gpi(GpiTriggerValue),
    TagObservation(TagObservationTrigger),
}

impl AiSpecStopTrigger {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_AI_SPEC_STOP_TRIGGER, |out| {
            match self {
                Self::Null => {
                    out.put_u8(0);
                    out.put_u32(0);
                }
                Self::Duration(ms) => {
                    out.put_u8(1);
                    out.put_u32(*ms);
                }
                Self::Gpi(gpi) => {
                    out.put_u8(2);
                    out.put_u32(0);
                    gpi.encode(out);
                }
                Self::TagObservation(trigger) => {
                    out.put_u8(3);
                    out.put_u32(0);
                    trigger.encode(out);
                }
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let trigger_type = fields.u8()?;
        let duration = fields.u32()?;
        let mut cursor = ParamCursor::new(fields.rest());

        match trigger_type {
            0 => Ok(Self::Null),
            1 => Ok(Self::Duration(duration)),
            2 => match cursor.next_param()? {
                Some(param) if param.header.type_code() == TYPE_GPI_TRIGGER_VALUE => {
                    Ok(Self::Gpi(GpiTriggerValue::decode(param.body)?))
                }
                Some(param) => Err(Error::UnexpectedParameter {
                    context: "AISpecStopTrigger",
                    found: param.header.type_code(),
                }),
                None => Err(Error::MissingParameter {
                    context: "AISpecStopTrigger",
                    missing: "GPITriggerValue",
                }),
            },
            3 => match cursor.next_param()? {
                Some(param) if param.header.type_code() == TYPE_TAG_OBSERVATION_TRIGGER => {
                    Ok(Self::TagObservation(TagObservationTrigger::decode(param.body)?))
                }
                Some(param) => Err(Error::UnexpectedParameter {
                    context: "AISpecStopTrigger",
                    found: param.header.type_code(),
                }),
                None => Err(Error::MissingParameter {
                    context: "AISpecStopTrigger",
                    missing: "TagObservationTrigger",
                }),
            },
            other => Err(Error::InvalidField {
                context: "AISpecStopTrigger.AISpecStopTriggerType",
                value: other as u32,
            }),
        }
    }
}

/// Inventory parameters for one air protocol, with optional per-antenna
/// overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryParameterSpec {
    /// Nonzero, unique within the AISpec
    pub spec_id: u16,
    pub protocol_id: AirProtocol,
    pub antenna_configurations: Vec<AntennaConfiguration>,
}

impl InventoryParameterSpec {
    pub fn gen2(spec_id: u16) -> Self {
        Self {
            spec_id,
            protocol_id: AirProtocol::EpcGlobalClass1Gen2,
            antenna_configurations: Vec::new(),
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_INVENTORY_PARAMETER_SPEC, |out| {
            out.put_u16(self.spec_id);
            out.put_u8(self.protocol_id as u8);
            for config in &self.antenna_configurations {
                config.encode(out);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let spec_id = fields.u16()?;
        let protocol_id = AirProtocol::try_from(fields.u8()?)?;

        let mut antenna_configurations = Vec::new();
        let mut cursor = ParamCursor::new(fields.rest());
        while let Some(param) = cursor.next_param()? {
            if param.header.type_code() == crate::config::TYPE_ANTENNA_CONFIGURATION {
                antenna_configurations.push(AntennaConfiguration::decode(param.body)?);
            }
        }

        Ok(Self { spec_id, protocol_id, antenna_configurations })
    }
}

/// Antenna inventory spec: which antennas to singulate on, until when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiSpec {
    /// Antenna id 0 means "all antennas"
    pub antenna_ids: Vec<u16>,
    pub stop_trigger: AiSpecStopTrigger,
    pub inventory_specs: Vec<InventoryParameterSpec>,
}

impl AiSpec {
    /// Inventory on the given antennas until the owning ROSpec stops
    pub fn all_protocol_defaults(antenna_ids: Vec<u16>) -> Self {
        Self {
            antenna_ids,
            stop_trigger: AiSpecStopTrigger::Null,
            inventory_specs: vec![InventoryParameterSpec::gen2(1)],
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_AI_SPEC, |out| {
            out.put_u16(self.antenna_ids.len() as u16);
            for antenna_id in &self.antenna_ids {
                out.put_u16(*antenna_id);
            }
            self.stop_trigger.encode(out);
            for spec in &self.inventory_specs {
                spec.encode(out);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let count = fields.u16()? as usize;
        let mut antenna_ids = Vec::with_capacity(count);
        for _ in 0..count {
            antenna_ids.push(fields.u16()?);
        }

        let mut stop_trigger = None;
        let mut inventory_specs = Vec::new();
        let mut cursor = ParamCursor::new(fields.rest());
        while let Some(param) = cursor.next_param()? {
            match param.header.type_code() {
                TYPE_AI_SPEC_STOP_TRIGGER => {
                    stop_trigger = Some(AiSpecStopTrigger::decode(param.body)?)
                }
                TYPE_INVENTORY_PARAMETER_SPEC => {
                    inventory_specs.push(InventoryParameterSpec::decode(param.body)?)
                }
                _ => {}
            }
        }

        if inventory_specs.is_empty() {
            return Err(Error::MissingParameter {
                context: "AISpec",
                missing: "InventoryParameterSpec",
            });
        }

        Ok(Self {
            antenna_ids,
            stop_trigger: stop_trigger.ok_or(Error::MissingParameter {
                context: "AISpec",
                missing: "AISpecStopTrigger",
            })?,
            inventory_specs,
        })
    }
}

bitflags::bitflags! {
    /// Which optional fields the reader includes in each TagReportData
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ReportContentFlags: u16 {
        const ROSPEC_ID                   = 0x8000;
        const SPEC_INDEX                  = 0x4000;
        const INVENTORY_PARAMETER_SPEC_ID = 0x2000;
        const ANTENNA_ID                  = 0x1000;
        const CHANNEL_INDEX               = 0x0800;
        const PEAK_RSSI                   = 0x0400;
        const FIRST_SEEN_TIMESTAMP        = 0x0200;
        const LAST_SEEN_TIMESTAMP         = 0x0100;
        const TAG_SEEN_COUNT              = 0x0080;
        const ACCESS_SPEC_ID              = 0x0040;
    }
}

/// C1G2-specific report content: CRC and PC bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct C1g2EpcMemorySelector {
    pub enable_crc: bool,
    pub enable_pc_bits: bool,
}

impl C1g2EpcMemorySelector {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_C1G2_EPC_MEMORY_SELECTOR, |out| {
            let mut flags = 0u8;
            if self.enable_crc {
                flags |= 0x80;
            }
            if self.enable_pc_bits {
                flags |= 0x40;
            }
            out.put_u8(flags);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let flags = fields.u8()?;
        Ok(Self {
            enable_crc: flags & 0x80 != 0,
            enable_pc_bits: flags & 0x40 != 0,
        })
    }
}

/// Selects the optional content of tag reports
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagReportContentSelector {
    pub flags: ReportContentFlags,
    pub c1g2_memory_selector: Option<C1g2EpcMemorySelector>,
}

impl TagReportContentSelector {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_TAG_REPORT_CONTENT_SELECTOR, |out| {
            out.put_u16(self.flags.bits());
            if let Some(selector) = &self.c1g2_memory_selector {
                selector.encode(out);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let flags = ReportContentFlags::from_bits_truncate(fields.u16()?);

        let mut c1g2_memory_selector = None;
        let mut cursor = ParamCursor::new(fields.rest());
        while let Some(param) = cursor.next_param()? {
            if param.header.type_code() == TYPE_C1G2_EPC_MEMORY_SELECTOR {
                c1g2_memory_selector = Some(C1g2EpcMemorySelector::decode(param.body)?);
            }
        }

        Ok(Self { flags, c1g2_memory_selector })
    }
}

/// When the reader assembles and sends tag reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RoReportTrigger {
    None = 0,
    UponNTagsOrEndOfAiSpec = 1,
    UponNTagsOrEndOfRoSpec = 2,
}

impl TryFrom<u8> for RoReportTrigger {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::UponNTagsOrEndOfAiSpec),
            2 => Ok(Self::UponNTagsOrEndOfRoSpec),
            other => Err(Error::InvalidField {
                context: "ROReportSpec.ROReportTrigger",
                value: other as u32,
            }),
        }
    }
}

/// Report assembly specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoReportSpec {
    pub trigger: RoReportTrigger,
    /// Tag count threshold for the N-tags triggers; 0 = unbounded
    pub n: u16,
    pub content_selector: TagReportContentSelector,
}

impl RoReportSpec {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_RO_REPORT_SPEC, |out| {
            out.put_u8(self.trigger as u8);
            out.put_u16(self.n);
            self.content_selector.encode(out);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let trigger = RoReportTrigger::try_from(fields.u8()?)?;
        let n = fields.u16()?;

        let mut content_selector = None;
        let mut cursor = ParamCursor::new(fields.rest());
        while let Some(param) = cursor.next_param()? {
            if param.header.type_code() == TYPE_TAG_REPORT_CONTENT_SELECTOR {
                content_selector = Some(TagReportContentSelector::decode(param.body)?);
            }
        }

        Ok(Self {
            trigger,
            n,
            content_selector: content_selector.ok_or(Error::MissingParameter {
                context: "ROReportSpec",
                missing: "TagReportContentSelector",
            })?,
        })
    }
}

/// Reader operation spec: a schedulable inventory job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoSpec {
    /// Nonzero, unique on the reader
    pub rospec_id: u32,
    /// Scheduling priority when antenna sets conflict; resolution is
    /// reader-implementation-defined
    pub priority: u8,
    pub current_state: RoSpecState,
    pub boundary: RoBoundarySpec,
    pub ai_specs: Vec<AiSpec>,
    pub report_spec: Option<RoReportSpec>,
}

impl RoSpec {
    /// Immediate-start inventory on the given antennas, reported at the
    /// end of each AISpec with all content fields enabled
    pub fn immediate_inventory(rospec_id: u32, antenna_ids: Vec<u16>) -> Self {
        Self {
            rospec_id,
            priority: 0,
            current_state: RoSpecState::Disabled,
            boundary: RoBoundarySpec {
                start_trigger: RoSpecStartTrigger::Immediate,
                stop_trigger: RoSpecStopTrigger::Null,
            },
            ai_specs: vec![AiSpec::all_protocol_defaults(antenna_ids)],
            report_spec: Some(RoReportSpec {
                trigger: RoReportTrigger::UponNTagsOrEndOfAiSpec,
                n: 0,
                content_selector: TagReportContentSelector {
                    flags: ReportContentFlags::all(),
                    c1g2_memory_selector: None,
                },
            }),
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ROSPEC, |out| {
            out.put_u32(self.rospec_id);
            out.put_u8(self.priority);
            out.put_u8(self.current_state as u8);
            self.boundary.encode(out);
            for ai_spec in &self.ai_specs {
                ai_spec.encode(out);
            }
            if let Some(report_spec) = &self.report_spec {
                report_spec.encode(out);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let rospec_id = fields.u32()?;
        let priority = fields.u8()?;
        let current_state = RoSpecState::try_from(fields.u8()?)?;

        let mut boundary = None;
        let mut ai_specs = Vec::new();
        let mut report_spec = None;

        let mut cursor = ParamCursor::new(fields.rest());
        while let Some(param) = cursor.next_param()? {
            match param.header.type_code() {
                TYPE_RO_BOUNDARY_SPEC => boundary = Some(RoBoundarySpec::decode(param.body)?),
                TYPE_AI_SPEC => ai_specs.push(AiSpec::decode(param.body)?),
                TYPE_RO_REPORT_SPEC => report_spec = Some(RoReportSpec::decode(param.body)?),
                _ => {}
            }
        }

        if ai_specs.is_empty() {
            return Err(Error::MissingParameter {
                context: "ROSpec",
                missing: "AISpec",
            });
        }

        Ok(Self {
            rospec_id,
            priority,
            current_state,
            boundary: boundary.ok_or(Error::MissingParameter {
                context: "ROSpec",
                missing: "ROBoundarySpec",
            })?,
            ai_specs,
            report_spec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(spec: &RoSpec) -> RoSpec {
        let mut out = BytesMut::new();
        spec.encode(&mut out);

        let header = codec::parse_header(&out).unwrap();
        assert_eq!(header.type_code(), TYPE_ROSPEC);
        assert_eq!(header.total_len(), out.len());

        RoSpec::decode(&out[4..]).unwrap()
    }

    #[test]
    fn test_immediate_rospec_roundtrip() {
        let spec = RoSpec::immediate_inventory(0x04D2, vec![1, 2]);
        assert_eq!(roundtrip(&spec), spec);
    }

    #[test]
    fn test_periodic_start_trigger_roundtrip() {
        let mut spec = RoSpec::immediate_inventory(7, vec![0]);
        spec.boundary.start_trigger = RoSpecStartTrigger::Periodic(PeriodicTriggerValue {
            offset_ms: 500,
            period_ms: 60_000,
            utc_time: Some(1_700_000_000_000_000),
        });
        spec.boundary.stop_trigger = RoSpecStopTrigger::Duration(30_000);
        assert_eq!(roundtrip(&spec), spec);
    }

    #[test]
    fn test_gpi_triggers_roundtrip() {
        let mut spec = RoSpec::immediate_inventory(9, vec![1]);
        spec.boundary.start_trigger = RoSpecStartTrigger::Gpi(GpiTriggerValue {
            port: 2,
            event: true,
            timeout_ms: 0,
        });
        spec.ai_specs[0].stop_trigger =
            AiSpecStopTrigger::TagObservation(TagObservationTrigger::upon_n_tags(50, 10_000));
        assert_eq!(roundtrip(&spec), spec);
    }

    #[test]
    fn test_start_trigger_one_of_mismatch() {
        // Declares a Periodic trigger but nests a GPITriggerValue
        let mut out = BytesMut::new();
        codec::put_tlv(&mut out, TYPE_ROSPEC_START_TRIGGER, |out| {
            out.put_u8(2);
            GpiTriggerValue { port: 1, event: false, timeout_ms: 0 }.encode(out);
        });

        let result = RoSpecStartTrigger::decode(&out[4..]);
        assert!(matches!(
            result,
            Err(Error::UnexpectedParameter { context: "ROSpecStartTrigger", found })
                if found == TYPE_GPI_TRIGGER_VALUE
        ));
    }

    #[test]
    fn test_start_trigger_missing_nested() {
        let mut out = BytesMut::new();
        codec::put_tlv(&mut out, TYPE_ROSPEC_START_TRIGGER, |out| {
            out.put_u8(2);
        });

        let result = RoSpecStartTrigger::decode(&out[4..]);
        assert!(matches!(result, Err(Error::MissingParameter { .. })));
    }

    #[test]
    fn test_rospec_missing_boundary_rejected() {
        let mut out = BytesMut::new();
        codec::put_tlv(&mut out, TYPE_ROSPEC, |out| {
            out.put_u32(1);
            out.put_u8(0);
            out.put_u8(0);
            AiSpec::all_protocol_defaults(vec![0]).encode(out);
        });

        let result = RoSpec::decode(&out[4..]);
        assert!(matches!(
            result,
            Err(Error::MissingParameter { missing: "ROBoundarySpec", .. })
        ));
    }

    #[test]
    fn test_content_selector_flags_roundtrip() {
        let selector = TagReportContentSelector {
            flags: ReportContentFlags::ANTENNA_ID | ReportContentFlags::PEAK_RSSI,
            c1g2_memory_selector: Some(C1g2EpcMemorySelector {
                enable_crc: false,
                enable_pc_bits: true,
            }),
        };

        let mut out = BytesMut::new();
        selector.encode(&mut out);

        let decoded = TagReportContentSelector::decode(&out[4..]).unwrap();
        assert_eq!(decoded, selector);
    }
}
