//! Reader configuration parameters
//!
//! Covers the parameter group exchanged by GET_READER_CONFIG /
//! SET_READER_CONFIG: antenna properties and RF configuration, GPIO state,
//! keepalive and event delivery settings. A [`ReaderConfig`] is partial by
//! construction; on Set, omitted pieces mean "unchanged".

use bytes::{BufMut, BytesMut};

use crate::codec::{self, FieldReader, ParamCursor, RawParam};
use crate::error::{Error, Result};

pub const TYPE_GPO_WRITE_DATA: u16 = 219;
pub const TYPE_KEEPALIVE_SPEC: u16 = 220;
pub const TYPE_ANTENNA_PROPERTIES: u16 = 221;
pub const TYPE_ANTENNA_CONFIGURATION: u16 = 222;
pub const TYPE_RF_RECEIVER: u16 = 223;
pub const TYPE_RF_TRANSMITTER: u16 = 224;
pub const TYPE_GPI_PORT_CURRENT_STATE: u16 = 225;
pub const TYPE_EVENTS_AND_REPORTS: u16 = 226;

bitflags::bitflags! {
    /// Selector for the configuration groups a GET_READER_CONFIG requests
    ///
    /// An empty selector asks for everything the reader supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ConfigRequest: u16 {
        const ANTENNA_PROPERTIES    = 0x0001;
        const ANTENNA_CONFIGURATION = 0x0002;
        const KEEPALIVE_SPEC        = 0x0004;
        const EVENTS_AND_REPORTS    = 0x0008;
        const GPI_PORT_STATE        = 0x0010;
        const GPO_WRITE_DATA        = 0x0020;
    }
}

/// Read-only antenna information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntennaProperties {
    pub antenna_id: u16,
    pub connected: bool,
    /// Antenna gain in dBi * 100
    pub gain: i16,
}

impl AntennaProperties {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ANTENNA_PROPERTIES, |out| {
            out.put_u16(self.antenna_id);
            out.put_u8(u8::from(self.connected) << 7);
            out.put_i16(self.gain);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            antenna_id: fields.u16()?,
            connected: fields.u8()? != 0,
            gain: fields.i16()?,
        })
    }
}

/// RF receiver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfReceiver {
    /// Receive sensitivity table index
    pub receiver_sensitivity: i16,
}

impl RfReceiver {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_RF_RECEIVER, |out| {
            out.put_i16(self.receiver_sensitivity);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self { receiver_sensitivity: fields.i16()? })
    }
}

/// RF transmitter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfTransmitter {
    pub hop_table_id: u16,
    pub channel_index: u16,
    /// Transmit power in dBm * 100 (e.g. 2500 = 25.0 dBm)
    pub transmit_power: u16,
}

impl RfTransmitter {
    /// Transmit power in dBm
    pub fn power_dbm(&self) -> f64 {
        self.transmit_power as f64 / 100.0
    }

    /// Set transmit power from a dBm value
    pub fn set_power_dbm(&mut self, dbm: f64) {
        self.transmit_power = (dbm * 100.0) as u16;
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_RF_TRANSMITTER, |out| {
            out.put_u16(self.hop_table_id);
            out.put_u16(self.channel_index);
            out.put_u16(self.transmit_power);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            hop_table_id: fields.u16()?,
            channel_index: fields.u16()?,
            transmit_power: fields.u16()?,
        })
    }
}

/// Per-antenna configuration: receiver and transmitter settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntennaConfiguration {
    /// 0 applies to all antennas
    pub antenna_id: u16,
    pub rf_receiver: Option<RfReceiver>,
    pub rf_transmitter: Option<RfTransmitter>,
}

impl AntennaConfiguration {
    pub fn new(antenna_id: u16) -> Self {
        Self {
            antenna_id,
            rf_receiver: None,
            rf_transmitter: None,
        }
    }

    pub fn with_transmit_power(mut self, transmit_power: u16) -> Self {
        self.rf_transmitter = Some(RfTransmitter {
            hop_table_id: 0,
            channel_index: 0,
            transmit_power,
        });
        self
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_ANTENNA_CONFIGURATION, |out| {
            out.put_u16(self.antenna_id);
            if let Some(rx) = &self.rf_receiver {
                rx.encode(out);
            }
            if let Some(tx) = &self.rf_transmitter {
                tx.encode(out);
            }
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let antenna_id = fields.u16()?;

        let mut config = Self::new(antenna_id);
        let mut cursor = ParamCursor::new(fields.rest());
        while let Some(param) = cursor.next_param()? {
            match param.header.type_code() {
                TYPE_RF_RECEIVER => config.rf_receiver = Some(RfReceiver::decode(param.body)?),
                TYPE_RF_TRANSMITTER => {
                    config.rf_transmitter = Some(RfTransmitter::decode(param.body)?)
                }
                // Air-protocol inventory sub-parameters are reader-tuning
                // detail; skip anything else within the declared length.
                _ => {}
            }
        }

        Ok(config)
    }
}

/// Keepalive trigger kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveTrigger {
    Null,
    Periodic,
}

/// Keepalive specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepaliveSpec {
    pub trigger: KeepaliveTrigger,
    /// Keepalive period in milliseconds (Periodic trigger only)
    pub period_ms: u32,
}

impl KeepaliveSpec {
    pub fn periodic(period_ms: u32) -> Self {
        Self {
            trigger: KeepaliveTrigger::Periodic,
            period_ms,
        }
    }

    pub fn disabled() -> Self {
        Self {
            trigger: KeepaliveTrigger::Null,
            period_ms: 0,
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_KEEPALIVE_SPEC, |out| {
            out.put_u8(match self.trigger {
                KeepaliveTrigger::Null => 0,
                KeepaliveTrigger::Periodic => 1,
            });
            out.put_u32(self.period_ms);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let trigger = match fields.u8()? {
            0 => KeepaliveTrigger::Null,
            1 => KeepaliveTrigger::Periodic,
            other => {
                return Err(Error::InvalidField {
                    context: "KeepaliveSpec.KeepaliveTriggerType",
                    value: other as u32,
                });
            }
        };
        Ok(Self {
            trigger,
            period_ms: fields.u32()?,
        })
    }
}

/// Event and report delivery configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsAndReports {
    pub hold_events_and_reports_upon_reconnect: bool,
}

impl EventsAndReports {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_EVENTS_AND_REPORTS, |out| {
            out.put_u8(u8::from(self.hold_events_and_reports_upon_reconnect) << 7);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            hold_events_and_reports_upon_reconnect: fields.u8()? != 0,
        })
    }
}

/// GPI port state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpiState {
    Low,
    High,
    Unknown,
}

/// Current state of one GPI port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpiPortCurrentState {
    pub port: u16,
    pub config_enabled: bool,
    pub state: GpiState,
}

impl GpiPortCurrentState {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_GPI_PORT_CURRENT_STATE, |out| {
            out.put_u16(self.port);
            out.put_u8(u8::from(self.config_enabled) << 7);
            out.put_u8(match self.state {
                GpiState::Low => 0,
                GpiState::High => 1,
                GpiState::Unknown => 2,
            });
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let port = fields.u16()?;
        let config_enabled = fields.u8()? != 0;
        let state = match fields.u8()? {
            0 => GpiState::Low,
            1 => GpiState::High,
            2 => GpiState::Unknown,
            other => {
                return Err(Error::InvalidField {
                    context: "GPIPortCurrentState.State",
                    value: other as u32,
                });
            }
        };
        Ok(Self { port, config_enabled, state })
    }
}

/// Output level to write to one GPO port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpoWriteData {
    pub port: u16,
    pub data: bool,
}

impl GpoWriteData {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_GPO_WRITE_DATA, |out| {
            out.put_u16(self.port);
            out.put_u8(u8::from(self.data) << 7);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        Ok(Self {
            port: fields.u16()?,
            data: fields.u8()? != 0,
        })
    }
}

/// Partially-specified reader configuration
///
/// On SET_READER_CONFIG only the pieces present are applied; everything
/// else stays unchanged on the reader. The `reset_to_factory_defaults`
/// flag supersedes every other field in the same call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReaderConfig {
    pub reset_to_factory_defaults: bool,
    pub antenna_properties: Vec<AntennaProperties>,
    pub antenna_configurations: Vec<AntennaConfiguration>,
    pub keepalive: Option<KeepaliveSpec>,
    pub events_and_reports: Option<EventsAndReports>,
    pub gpi_ports: Vec<GpiPortCurrentState>,
    pub gpo_writes: Vec<GpoWriteData>,
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that resets the reader to factory defaults
    pub fn factory_defaults() -> Self {
        Self {
            reset_to_factory_defaults: true,
            ..Self::default()
        }
    }

    pub fn with_keepalive(mut self, spec: KeepaliveSpec) -> Self {
        self.keepalive = Some(spec);
        self
    }

    pub fn with_antenna_configuration(mut self, config: AntennaConfiguration) -> Self {
        self.antenna_configurations.push(config);
        self
    }

    pub fn with_events_and_reports(mut self, config: EventsAndReports) -> Self {
        self.events_and_reports = Some(config);
        self
    }

    /// Encode the parameter sequence shared by SET_READER_CONFIG and
    /// GET_READER_CONFIG_RESPONSE (the reset flag is written by the
    /// message codec, not here)
    pub fn encode_params(&self, out: &mut BytesMut) {
        for props in &self.antenna_properties {
            props.encode(out);
        }
        for config in &self.antenna_configurations {
            config.encode(out);
        }
        if let Some(keepalive) = &self.keepalive {
            keepalive.encode(out);
        }
        if let Some(events) = &self.events_and_reports {
            events.encode(out);
        }
        for gpi in &self.gpi_ports {
            gpi.encode(out);
        }
        for gpo in &self.gpo_writes {
            gpo.encode(out);
        }
    }

    /// Fold one decoded parameter into this configuration
    ///
    /// Returns false when the parameter type belongs to no configuration
    /// group, so callers can route it elsewhere.
    pub fn absorb(&mut self, param: &RawParam<'_>) -> Result<bool> {
        match param.header.type_code() {
            TYPE_ANTENNA_PROPERTIES => {
                self.antenna_properties.push(AntennaProperties::decode(param.body)?);
            }
            TYPE_ANTENNA_CONFIGURATION => {
                self.antenna_configurations.push(AntennaConfiguration::decode(param.body)?);
            }
            TYPE_KEEPALIVE_SPEC => {
                self.keepalive = Some(KeepaliveSpec::decode(param.body)?);
            }
            TYPE_EVENTS_AND_REPORTS => {
                self.events_and_reports = Some(EventsAndReports::decode(param.body)?);
            }
            TYPE_GPI_PORT_CURRENT_STATE => {
                self.gpi_ports.push(GpiPortCurrentState::decode(param.body)?);
            }
            TYPE_GPO_WRITE_DATA => {
                self.gpo_writes.push(GpoWriteData::decode(param.body)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_antenna_configuration_roundtrip() {
        let config = AntennaConfiguration {
            antenna_id: 3,
            rf_receiver: Some(RfReceiver { receiver_sensitivity: -7000 }),
            rf_transmitter: Some(RfTransmitter {
                hop_table_id: 1,
                channel_index: 4,
                transmit_power: 2500,
            }),
        };

        let mut out = BytesMut::new();
        config.encode(&mut out);

        let header = codec::parse_header(&out).unwrap();
        assert_eq!(header.total_len(), out.len());

        let decoded = AntennaConfiguration::decode(&out[4..]).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_transmit_power_dbm() {
        let mut tx = RfTransmitter {
            hop_table_id: 0,
            channel_index: 0,
            transmit_power: 2500,
        };
        assert_eq!(tx.power_dbm(), 25.0);

        tx.set_power_dbm(30.0);
        assert_eq!(tx.transmit_power, 3000);
    }

    #[test]
    fn test_keepalive_spec_roundtrip() {
        let spec = KeepaliveSpec::periodic(10_000);

        let mut out = BytesMut::new();
        spec.encode(&mut out);
        assert_eq!(out.len(), 9);

        let decoded = KeepaliveSpec::decode(&out[4..]).unwrap();
        assert_eq!(decoded, spec);
    }

    #[test]
    fn test_keepalive_invalid_trigger() {
        let body = [0x07, 0, 0, 0x27, 0x10];
        assert!(matches!(
            KeepaliveSpec::decode(&body),
            Err(Error::InvalidField { .. })
        ));
    }

    #[test]
    fn test_reader_config_absorb() {
        let original = ReaderConfig::new()
            .with_keepalive(KeepaliveSpec::periodic(5_000))
            .with_antenna_configuration(AntennaConfiguration::new(1).with_transmit_power(2700));

        let mut out = BytesMut::new();
        original.encode_params(&mut out);

        let mut decoded = ReaderConfig::new();
        let mut cursor = ParamCursor::new(&out);
        while let Some(param) = cursor.next_param().unwrap() {
            assert!(decoded.absorb(&param).unwrap());
        }

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_gpio_roundtrip() {
        let gpi = GpiPortCurrentState {
            port: 2,
            config_enabled: true,
            state: GpiState::High,
        };
        let mut out = BytesMut::new();
        gpi.encode(&mut out);
        assert_eq!(GpiPortCurrentState::decode(&out[4..]).unwrap(), gpi);

        let gpo = GpoWriteData { port: 1, data: true };
        let mut out = BytesMut::new();
        gpo.encode(&mut out);
        assert_eq!(GpoWriteData::decode(&out[4..]).unwrap(), gpo);
    }
}
