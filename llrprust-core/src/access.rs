//! AccessSpec parameters: tag memory operations and their results
//!
//! An AccessSpec is not independently schedulable; it executes
//! opportunistically when a running ROSpec singulates a tag matching its
//! target pattern. Its op specs execute strictly in list order, and the
//! reader skips the remainder of the list after the first failed
//! operation, reporting the failure in the matching OpSpecResult.

use bytes::{BufMut, BytesMut};

use crate::codec::{self, FieldReader, ParamCursor, RawParam};
use crate::error::{Error, Result};
use crate::rospec::AirProtocol;

pub const TYPE_ACCESS_SPEC: u16 = 207;
pub const TYPE_ACCESS_SPEC_STOP_TRIGGER: u16 = 208;
pub const TYPE_ACCESS_COMMAND: u16 = 209;
pub const TYPE_ACCESS_REPORT_SPEC: u16 = 239;
pub const TYPE_C1G2_TAG_SPEC: u16 = 338;
pub const TYPE_C1G2_TARGET_TAG: u16 = 339;
pub const TYPE_C1G2_READ: u16 = 341;
pub const TYPE_C1G2_WRITE: u16 = 342;
pub const TYPE_C1G2_KILL: u16 = 343;
pub const TYPE_C1G2_LOCK: u16 = 344;
pub const TYPE_C1G2_LOCK_PAYLOAD: u16 = 345;
pub const TYPE_C1G2_READ_OP_SPEC_RESULT: u16 = 349;
pub const TYPE_C1G2_WRITE_OP_SPEC_RESULT: u16 = 350;
pub const TYPE_C1G2_KILL_OP_SPEC_RESULT: u16 = 351;
pub const TYPE_C1G2_LOCK_OP_SPEC_RESULT: u16 = 352;

/// AccessSpec state: enabled specs are candidates for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSpecState {
    Disabled,
    Enabled,
}

/// Gen2 tag memory banks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MemoryBank {
    Reserved = 0,
    Epc = 1,
    Tid = 2,
    User = 3,
}

impl TryFrom<u8> for MemoryBank {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Reserved),
            1 => Ok(Self::Epc),
            2 => Ok(Self::Tid),
            3 => Ok(Self::User),
            other => Err(Error::InvalidField {
                context: "MB",
                value: other as u32,
            }),
        }
    }
}

/// When an AccessSpec retires itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessSpecStopTrigger {
    /// Lives until deleted
    Null,
    /// Retires after executing this many times
    OperationCount(u16),
}

impl AccessSpecStopTrigger {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ACCESS_SPEC_STOP_TRIGGER, |out| {
            match self {
                Self::Null => {
                    out.put_u8(0);
                    out.put_u16(0);
                }
                Self::OperationCount(n) => {
                    out.put_u8(1);
                    out.put_u16(*n);
                }
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let trigger_type = fields.u8()?;
        let count = fields.u16()?;
        match trigger_type {
            0 => Ok(Self::Null),
            1 => Ok(Self::OperationCount(count)),
            other => Err(Error::InvalidField {
                context: "AccessSpecStopTrigger.AccessSpecStopTriggerType",
                value: other as u32,
            }),
        }
    }
}

/// Tag pattern an AccessSpec applies to
///
/// Matches tag memory at `pointer` against `data` under `mask`; the mask
/// and data lengths are in bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1g2TargetTag {
    pub memory_bank: MemoryBank,
    /// Match (true) or non-match (false) the pattern
    pub match_pattern: bool,
    pub pointer: u16,
    pub mask_bit_count: u16,
    pub mask: Vec<u8>,
    pub data_bit_count: u16,
    pub data: Vec<u8>,
}

impl C1g2TargetTag {
    /// Match-anything pattern in EPC memory
    pub fn any() -> Self {
        Self {
            memory_bank: MemoryBank::Epc,
            match_pattern: true,
            pointer: 0,
            mask_bit_count: 0,
            mask: Vec::new(),
            data_bit_count: 0,
            data: Vec::new(),
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_C1G2_TARGET_TAG, |out| {
            out.put_u8(((self.memory_bank as u8) << 6) | (u8::from(self.match_pattern) << 5));
            out.put_u16(self.pointer);
            out.put_u16(self.mask_bit_count);
            out.put_slice(&self.mask);
            out.put_u16(self.data_bit_count);
            out.put_slice(&self.data);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let flags = fields.u8()?;
        let memory_bank = MemoryBank::try_from(flags >> 6)?;
        let match_pattern = flags & 0x20 != 0;
        let pointer = fields.u16()?;
        let mask_bit_count = fields.u16()?;
        let mask = fields.bytes(mask_bit_count.div_ceil(8) as usize)?.to_vec();
        let data_bit_count = fields.u16()?;
        let data = fields.bytes(data_bit_count.div_ceil(8) as usize)?.to_vec();

        Ok(Self {
            memory_bank,
            match_pattern,
            pointer,
            mask_bit_count,
            mask,
            data_bit_count,
            data,
        })
    }
}

/// Tag spec: one or two target patterns (two patterns AND together)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1g2TagSpec {
    pub patterns: Vec<C1g2TargetTag>,
}

impl C1g2TagSpec {
    pub fn any_tag() -> Self {
        Self { patterns: vec![C1g2TargetTag::any()] }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_C1G2_TAG_SPEC, |out| {
            for pattern in &self.patterns {
                pattern.encode(out);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut patterns = Vec::new();
        let mut cursor = ParamCursor::new(body);
        while let Some(param) = cursor.next_param()? {
            if param.header.type_code() == TYPE_C1G2_TARGET_TAG {
                patterns.push(C1g2TargetTag::decode(param.body)?);
            }
        }

        if patterns.is_empty() {
            return Err(Error::MissingParameter {
                context: "C1G2TagSpec",
                missing: "C1G2TargetTag",
            });
        }

        Ok(Self { patterns })
    }
}

/// Read words from tag memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1g2Read {
    pub op_spec_id: u16,
    pub access_password: u32,
    pub memory_bank: MemoryBank,
    pub word_pointer: u16,
    /// 0 = read to the end of the bank
    pub word_count: u16,
}

impl C1g2Read {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_C1G2_READ, |out| {
            out.put_u16(self.op_spec_id);
            out.put_u32(self.access_password);
            out.put_u8((self.memory_bank as u8) << 6);
            out.put_u16(self.word_pointer);
            out.put_u16(self.word_count);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            op_spec_id: fields.u16()?,
            access_password: fields.u32()?,
            memory_bank: MemoryBank::try_from(fields.u8()? >> 6)?,
            word_pointer: fields.u16()?,
            word_count: fields.u16()?,
        })
    }
}

/// Write words to tag memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1g2Write {
    pub op_spec_id: u16,
    pub access_password: u32,
    pub memory_bank: MemoryBank,
    pub word_pointer: u16,
    pub data: Vec<u16>,
}

impl C1g2Write {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_C1G2_WRITE, |out| {
            out.put_u16(self.op_spec_id);
            out.put_u32(self.access_password);
            out.put_u8((self.memory_bank as u8) << 6);
            out.put_u16(self.word_pointer);
            out.put_u16(self.data.len() as u16);
            for word in &self.data {
                out.put_u16(*word);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let op_spec_id = fields.u16()?;
        let access_password = fields.u32()?;
        let memory_bank = MemoryBank::try_from(fields.u8()? >> 6)?;
        let word_pointer = fields.u16()?;
        let word_count = fields.u16()? as usize;
        let mut data = Vec::with_capacity(word_count);
        for _ in 0..word_count {
            data.push(fields.u16()?);
        }

        Ok(Self {
            op_spec_id,
            access_password,
            memory_bank,
            word_pointer,
            data,
        })
    }
}

/// Permanently disable a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1g2Kill {
    pub op_spec_id: u16,
    pub kill_password: u32,
}

impl C1g2Kill {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_C1G2_KILL, |out| {
            out.put_u16(self.op_spec_id);
            out.put_u32(self.kill_password);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            op_spec_id: fields.u16()?,
            kill_password: fields.u32()?,
        })
    }
}

/// Lock privilege applied to one memory field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LockPrivilege {
    ReadWrite = 0,
    PermaLock = 1,
    PermaUnlock = 2,
    Unlock = 3,
}

impl TryFrom<u8> for LockPrivilege {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::ReadWrite),
            1 => Ok(Self::PermaLock),
            2 => Ok(Self::PermaUnlock),
            3 => Ok(Self::Unlock),
            other => Err(Error::InvalidField {
                context: "C1G2LockPayload.Privilege",
                value: other as u32,
            }),
        }
    }
}

/// Memory field a lock operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LockDataField {
    KillPassword = 0,
    AccessPassword = 1,
    EpcMemory = 2,
    TidMemory = 3,
    UserMemory = 4,
}

impl TryFrom<u8> for LockDataField {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::KillPassword),
            1 => Ok(Self::AccessPassword),
            2 => Ok(Self::EpcMemory),
            3 => Ok(Self::TidMemory),
            4 => Ok(Self::UserMemory),
            other => Err(Error::InvalidField {
                context: "C1G2LockPayload.DataField",
                value: other as u32,
            }),
        }
    }
}

/// One privilege/field pair inside a lock operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1g2LockPayload {
    pub privilege: LockPrivilege,
    pub data_field: LockDataField,
}

impl C1g2LockPayload {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_C1G2_LOCK_PAYLOAD, |out| {
            out.put_u8(self.privilege as u8);
            out.put_u8(self.data_field as u8);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            privilege: LockPrivilege::try_from(fields.u8()?)?,
            data_field: LockDataField::try_from(fields.u8()?)?,
        })
    }
}

/// Lock or unlock tag memory areas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1g2Lock {
    pub op_spec_id: u16,
    pub access_password: u32,
    pub payloads: Vec<C1g2LockPayload>,
}

impl C1g2Lock {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_C1G2_LOCK, |out| {
            out.put_u16(self.op_spec_id);
            out.put_u32(self.access_password);
            for payload in &self.payloads {
                payload.encode(out);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let op_spec_id = fields.u16()?;
        let access_password = fields.u32()?;

        let mut payloads = Vec::new();
        let mut cursor = ParamCursor::new(fields.rest());
        while let Some(param) = cursor.next_param()? {
            if param.header.type_code() == TYPE_C1G2_LOCK_PAYLOAD {
                payloads.push(C1g2LockPayload::decode(param.body)?);
            }
        }

        if payloads.is_empty() {
            return Err(Error::MissingParameter {
                context: "C1G2Lock",
                missing: "C1G2LockPayload",
            });
        }

        Ok(Self { op_spec_id, access_password, payloads })
    }
}

/// One tag memory operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpSpec {
    Read(C1g2Read),
    Write(C1g2Write),
    Kill(C1g2Kill),
    Lock(C1g2Lock),
}

impl OpSpec {
    pub fn op_spec_id(&self) -> u16 {
        match self {
            Self::Read(op) => op.op_spec_id,
            Self::Write(op) => op.op_spec_id,
            Self::Kill(op) => op.op_spec_id,
            Self::Lock(op) => op.op_spec_id,
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        match self {
            Self::Read(op) => op.encode(out),
            Self::Write(op) => op.encode(out),
            Self::Kill(op) => op.encode(out),
            Self::Lock(op) => op.encode(out),
        }
    }
}

/// The operations an AccessSpec performs, plus the pattern they apply to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCommand {
    pub tag_spec: C1g2TagSpec,
    /// Executed strictly in order; the reader stops at the first failure
    pub op_specs: Vec<OpSpec>,
}

impl AccessCommand {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ACCESS_COMMAND, |out| {
            self.tag_spec.encode(out);
            for op_spec in &self.op_specs {
                op_spec.encode(out);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut tag_spec = None;
        let mut op_specs = Vec::new();

        let mut cursor = ParamCursor::new(body);
        while let Some(param) = cursor.next_param()? {
            match param.header.type_code() {
                TYPE_C1G2_TAG_SPEC => tag_spec = Some(C1g2TagSpec::decode(param.body)?),
                TYPE_C1G2_READ => op_specs.push(OpSpec::Read(C1g2Read::decode(param.body)?)),
                TYPE_C1G2_WRITE => op_specs.push(OpSpec::Write(C1g2Write::decode(param.body)?)),
                TYPE_C1G2_KILL => op_specs.push(OpSpec::Kill(C1g2Kill::decode(param.body)?)),
                TYPE_C1G2_LOCK => op_specs.push(OpSpec::Lock(C1g2Lock::decode(param.body)?)),
                _ => {}
            }
        }

        Ok(Self {
            tag_spec: tag_spec.ok_or(Error::MissingParameter {
                context: "AccessCommand",
                missing: "C1G2TagSpec",
            })?,
            op_specs,
        })
    }
}

/// When access operation results are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AccessReportTrigger {
    /// With the ROSpec's ordinary tag reports
    WithRoReport = 0,
    /// Immediately at the end of each AccessSpec execution
    EndOfAccessSpec = 1,
}

/// Access report trigger parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReportSpec {
    pub trigger: AccessReportTrigger,
}

impl AccessReportSpec {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ACCESS_REPORT_SPEC, |out| {
            out.put_u8(self.trigger as u8);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let trigger = match fields.u8()? {
            0 => AccessReportTrigger::WithRoReport,
            1 => AccessReportTrigger::EndOfAccessSpec,
            other => {
                return Err(Error::InvalidField {
                    context: "AccessReportSpec.AccessReportTrigger",
                    value: other as u32,
                });
            }
        };
        Ok(Self { trigger })
    }
}

/// A tag memory operation job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessSpec {
    /// Nonzero, unique on the reader
    pub access_spec_id: u32,
    /// 0 = any antenna
    pub antenna_id: u16,
    pub protocol_id: AirProtocol,
    pub current_state: AccessSpecState,
    /// 0 = any ROSpec
    pub rospec_id: u32,
    pub stop_trigger: AccessSpecStopTrigger,
    pub command: AccessCommand,
    pub report_spec: Option<AccessReportSpec>,
}

impl AccessSpec {
    /// Spec running the given operations against every singulated tag
    pub fn for_any_tag(access_spec_id: u32, op_specs: Vec<OpSpec>) -> Self {
        Self {
            access_spec_id,
            antenna_id: 0,
            protocol_id: AirProtocol::EpcGlobalClass1Gen2,
            current_state: AccessSpecState::Disabled,
            rospec_id: 0,
            stop_trigger: AccessSpecStopTrigger::Null,
            command: AccessCommand {
                tag_spec: C1g2TagSpec::any_tag(),
                op_specs,
            },
            report_spec: None,
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ACCESS_SPEC, |out| {
            out.put_u32(self.access_spec_id);
            out.put_u16(self.antenna_id);
            out.put_u8(self.protocol_id as u8);
            out.put_u8(u8::from(self.current_state == AccessSpecState::Enabled) << 7);
            out.put_u32(self.rospec_id);
            self.stop_trigger.encode(out);
            self.command.encode(out);
            if let Some(report_spec) = &self.report_spec {
                report_spec.encode(out);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let access_spec_id = fields.u32()?;
        let antenna_id = fields.u16()?;
        let protocol_id = AirProtocol::try_from(fields.u8()?)?;
        let current_state = if fields.u8()? != 0 {
            AccessSpecState::Enabled
        } else {
            AccessSpecState::Disabled
        };
        let rospec_id = fields.u32()?;

        let mut stop_trigger = None;
        let mut command = None;
        let mut report_spec = None;

        let mut cursor = ParamCursor::new(fields.rest());
        while let Some(param) = cursor.next_param()? {
            match param.header.type_code() {
                TYPE_ACCESS_SPEC_STOP_TRIGGER => {
                    stop_trigger = Some(AccessSpecStopTrigger::decode(param.body)?)
                }
                TYPE_ACCESS_COMMAND => command = Some(AccessCommand::decode(param.body)?),
                TYPE_ACCESS_REPORT_SPEC => {
                    report_spec = Some(AccessReportSpec::decode(param.body)?)
                }
                _ => {}
            }
        }

        Ok(Self {
            access_spec_id,
            antenna_id,
            protocol_id,
            current_state,
            rospec_id,
            stop_trigger: stop_trigger.ok_or(Error::MissingParameter {
                context: "AccessSpec",
                missing: "AccessSpecStopTrigger",
            })?,
            command: command.ok_or(Error::MissingParameter {
                context: "AccessSpec",
                missing: "AccessCommand",
            })?,
            report_spec,
        })
    }
}

/// Result of one executed op spec, reported inside TagReportData
///
/// Each op type has a matching result variant; `result` is 0 on success,
/// with nonzero codes naming the failure cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpSpecResult {
    Read { result: u8, op_spec_id: u16, data: Vec<u16> },
    Write { result: u8, op_spec_id: u16, words_written: u16 },
    Kill { result: u8, op_spec_id: u16 },
    Lock { result: u8, op_spec_id: u16 },
}

impl OpSpecResult {
    pub fn is_success(&self) -> bool {
        self.result_code() == 0
    }

    pub fn result_code(&self) -> u8 {
        match self {
            Self::Read { result, .. }
            | Self::Write { result, .. }
            | Self::Kill { result, .. }
            | Self::Lock { result, .. } => *result,
        }
    }

    pub fn op_spec_id(&self) -> u16 {
        match self {
            Self::Read { op_spec_id, .. }
            | Self::Write { op_spec_id, .. }
            | Self::Kill { op_spec_id, .. }
            | Self::Lock { op_spec_id, .. } => *op_spec_id,
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        match self {
            Self::Read { result, op_spec_id, data } => {
                codec::put_tlv(out, TYPE_C1G2_READ_OP_SPEC_RESULT, |out| {
                    out.put_u8(*result);
                    out.put_u16(*op_spec_id);
                    out.put_u16(data.len() as u16);
                    for word in data {
                        out.put_u16(*word);
                    }
                });
            }
            Self::Write { result, op_spec_id, words_written } => {
                codec::put_tlv(out, TYPE_C1G2_WRITE_OP_SPEC_RESULT, |out| {
                    out.put_u8(*result);
                    out.put_u16(*op_spec_id);
                    out.put_u16(*words_written);
                });
            }
            Self::Kill { result, op_spec_id } => {
                codec::put_tlv(out, TYPE_C1G2_KILL_OP_SPEC_RESULT, |out| {
                    out.put_u8(*result);
                    out.put_u16(*op_spec_id);
                });
            }
            Self::Lock { result, op_spec_id } => {
                codec::put_tlv(out, TYPE_C1G2_LOCK_OP_SPEC_RESULT, |out| {
                    out.put_u8(*result);
                    out.put_u16(*op_spec_id);
                });
            }
        }
    }

    /// Decode from a raw parameter, or None when the type is not an
    /// op-spec result
    pub fn decode_param(param: &RawParam<'_>) -> Result<Option<Self>> {
        let mut fields = FieldReader::new(param.body);
        match param.header.type_code() {
            TYPE_C1G2_READ_OP_SPEC_RESULT => {
                let result = fields.u8()?;
                let op_spec_id = fields.u16()?;
                let word_count = fields.u16()? as usize;
                let mut data = Vec::with_capacity(word_count);
                for _ in 0..word_count {
                    data.push(fields.u16()?);
                }
                Ok(Some(Self::Read { result, op_spec_id, data }))
            }
            TYPE_C1G2_WRITE_OP_SPEC_RESULT => Ok(Some(Self::Write {
                result: fields.u8()?,
                op_spec_id: fields.u16()?,
                words_written: fields.u16()?,
            })),
            TYPE_C1G2_KILL_OP_SPEC_RESULT => Ok(Some(Self::Kill {
                result: fields.u8()?,
                op_spec_id: fields.u16()?,
            })),
            TYPE_C1G2_LOCK_OP_SPEC_RESULT => Ok(Some(Self::Lock {
                result: fields.u8()?,
                op_spec_id: fields.u16()?,
            })),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(spec: &AccessSpec) -> AccessSpec {
        let mut out = BytesMut::new();
        spec.encode(&mut out);

        let header = codec::parse_header(&out).unwrap();
        assert_eq!(header.type_code(), TYPE_ACCESS_SPEC);
        assert_eq!(header.total_len(), out.len());

        AccessSpec::decode(&out[4..]).unwrap()
    }

    #[test]
    fn test_access_spec_roundtrip() {
        let spec = AccessSpec::for_any_tag(
            42,
            vec![
                OpSpec::Read(C1g2Read {
                    op_spec_id: 1,
                    access_password: 0,
                    memory_bank: MemoryBank::Tid,
                    word_pointer: 0,
                    word_count: 4,
                }),
                OpSpec::Write(C1g2Write {
                    op_spec_id: 2,
                    access_password: 0xDEAD_BEEF,
                    memory_bank: MemoryBank::User,
                    word_pointer: 0,
                    data: vec![0x1234, 0x5678],
                }),
            ],
        );

        assert_eq!(roundtrip(&spec), spec);
    }

    #[test]
    fn test_access_spec_ops_keep_order() {
        let spec = AccessSpec::for_any_tag(
            7,
            vec![
                OpSpec::Kill(C1g2Kill { op_spec_id: 3, kill_password: 1 }),
                OpSpec::Lock(C1g2Lock {
                    op_spec_id: 4,
                    access_password: 2,
                    payloads: vec![C1g2LockPayload {
                        privilege: LockPrivilege::PermaLock,
                        data_field: LockDataField::EpcMemory,
                    }],
                }),
                OpSpec::Read(C1g2Read {
                    op_spec_id: 5,
                    access_password: 0,
                    memory_bank: MemoryBank::Epc,
                    word_pointer: 2,
                    word_count: 6,
                }),
            ],
        );

        let decoded = roundtrip(&spec);
        let ids: Vec<u16> = decoded.command.op_specs.iter().map(|op| op.op_spec_id()).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn test_target_tag_bit_lengths() {
        let pattern = C1g2TargetTag {
            memory_bank: MemoryBank::Epc,
            match_pattern: true,
            pointer: 32,
            mask_bit_count: 12,
            mask: vec![0xFF, 0xF0],
            data_bit_count: 12,
            data: vec![0xAB, 0xC0],
        };

        let mut out = BytesMut::new();
        pattern.encode(&mut out);

        let decoded = C1g2TargetTag::decode(&out[4..]).unwrap();
        assert_eq!(decoded, pattern);
    }

    #[test]
    fn test_access_command_missing_tag_spec() {
        let mut out = BytesMut::new();
        codec::put_tlv(&mut out, TYPE_ACCESS_COMMAND, |out| {
            C1g2Kill { op_spec_id: 1, kill_password: 0 }.encode(out);
        });

        let result = AccessCommand::decode(&out[4..]);
        assert!(matches!(
            result,
            Err(Error::MissingParameter { missing: "C1G2TagSpec", .. })
        ));
    }

    #[test]
    fn test_op_spec_result_roundtrip() {
        let results = vec![
            OpSpecResult::Read { result: 0, op_spec_id: 1, data: vec![0xAAAA, 0xBBBB] },
            OpSpecResult::Write { result: 0, op_spec_id: 2, words_written: 2 },
            OpSpecResult::Kill { result: 1, op_spec_id: 3 },
            OpSpecResult::Lock { result: 0, op_spec_id: 4 },
        ];

        for original in results {
            let mut out = BytesMut::new();
            original.encode(&mut out);

            let mut cursor = ParamCursor::new(&out);
            let param = cursor.next_param().unwrap().unwrap();
            let decoded = OpSpecResult::decode_param(&param).unwrap().unwrap();
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_op_spec_result_success() {
        let ok = OpSpecResult::Write { result: 0, op_spec_id: 1, words_written: 4 };
        let failed = OpSpecResult::Write { result: 3, op_spec_id: 1, words_written: 0 };

        assert!(ok.is_success());
        assert!(!failed.is_success());
    }
}
