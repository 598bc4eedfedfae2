//! Vendor custom parameters and opaque unknown parameters

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{self, FieldReader};
use crate::error::Result;

/// Custom parameter type code (reserved for vendor extensions)
pub const TYPE_CUSTOM: u16 = 1023;

/// Vendor extension parameter
///
/// Identified by an IANA vendor id and a vendor-defined subtype. The
/// payload is opaque to the core protocol and survives decode→encode
/// byte-exact even when its internal structure is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomParameter {
    pub vendor_id: u32,
    pub subtype: u32,
    pub payload: Bytes,
}

impl CustomParameter {
    pub fn new(vendor_id: u32, subtype: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            vendor_id,
            subtype,
            payload: payload.into(),
        }
    }

    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, TYPE_CUSTOM, |out| {
            out.put_u32(self.vendor_id);
            out.put_u32(self.subtype);
            out.put_slice(&self.payload);
        });
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut fields = FieldReader::new(body);
        let vendor_id = fields.u32()?;
        let subtype = fields.u32()?;
        let payload = Bytes::copy_from_slice(fields.rest());

        Ok(Self { vendor_id, subtype, payload })
    }
}

/// Unrecognized TLV parameter, retained as an opaque blob
///
/// TLV lengths are explicit, so unknown types can always be skipped and
/// preserved. Re-encoding produces byte-identical output, which is what
/// lets vendor extensions round-trip through a client that does not
/// understand their semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownParameter {
    pub param_type: u16,
    /// Payload only; the header is reconstructed on encode
    pub body: Bytes,
}

impl UnknownParameter {
    pub fn encode(&self, out: &mut BytesMut) {
        codec::put_tlv(out, self.param_type, |out| {
            out.put_slice(&self.body);
        });
    }
}
