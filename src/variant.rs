//! Per-message-kind fixed headers.
//!
//! A small closed set: the address block (`ifaddrmsg`, 8 bytes) and the
//! link block (`ifinfomsg`, 16 bytes). Each variant sits between the
//! message envelope and the attribute list and supplies its own attribute
//! coder.

use crate::attr::{
    AttrValue, AttributeCoder, Attributes, DecodeContext, decode_ip, decode_string, decode_u32,
};
use crate::consts;
use crate::error::Error;
use serde::Serialize;

/// Wire size of [`AddressFields`].
pub const ADDRESS_WIRE_LEN: usize = 8;
/// Wire size of [`LinkFields`].
pub const LINK_WIRE_LEN: usize = 16;

/// Fixed block of an address message (`ifaddrmsg`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AddressFields {
    pub family: u8,
    pub prefix_len: u8,
    /// Full-width flags. Only the low byte fits the wire field; larger
    /// values travel as a synthetic `IFA_FLAGS` attribute, and on decode an
    /// `IFA_FLAGS` attribute supersedes the narrow byte.
    pub flags: u32,
    pub scope: u8,
    pub index: u32,
}

/// Fixed block of a link message (`ifinfomsg`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkFields {
    pub family: u8,
    pub device_type: u16,
    pub index: i32,
    pub flags: u32,
    pub change: u32,
}

/// Which fixed block a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Address,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VariantHeader {
    Address(AddressFields),
    Link(LinkFields),
}

impl VariantHeader {
    pub fn kind(&self) -> VariantKind {
        match self {
            VariantHeader::Address(_) => VariantKind::Address,
            VariantHeader::Link(_) => VariantKind::Link,
        }
    }

    pub fn wire_len(&self) -> usize {
        match self {
            VariantHeader::Address(_) => ADDRESS_WIRE_LEN,
            VariantHeader::Link(_) => LINK_WIRE_LEN,
        }
    }

    /// Attribute interpretation for this message kind.
    pub fn coder(&self) -> &'static dyn AttributeCoder {
        match self {
            VariantHeader::Address(_) => &AddressCoder,
            VariantHeader::Link(_) => &LinkCoder,
        }
    }

    /// Context threaded through attribute decoding.
    pub fn decode_context(&self) -> DecodeContext {
        let family = match self {
            VariantHeader::Address(fields) => fields.family,
            VariantHeader::Link(fields) => fields.family,
        };
        DecodeContext { family }
    }

    /// Write the fixed block.
    ///
    /// Returns a synthetic attribute when a field cannot fit its wire slot
    /// (the address flags overflow affordance); the caller must emit it
    /// ahead of its own attributes.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Option<(u16, AttrValue)> {
        match self {
            VariantHeader::Address(fields) => {
                buf.push(fields.family);
                buf.push(fields.prefix_len);
                buf.push(fields.flags as u8);
                buf.push(fields.scope);
                buf.extend_from_slice(&fields.index.to_ne_bytes());
                if fields.flags > u32::from(u8::MAX) {
                    Some((consts::IFA_FLAGS, AttrValue::U32(fields.flags)))
                } else {
                    None
                }
            }
            VariantHeader::Link(fields) => {
                buf.push(fields.family);
                buf.push(0); // pad byte, must be zero
                buf.extend_from_slice(&fields.device_type.to_ne_bytes());
                buf.extend_from_slice(&fields.index.to_ne_bytes());
                buf.extend_from_slice(&fields.flags.to_ne_bytes());
                buf.extend_from_slice(&fields.change.to_ne_bytes());
                None
            }
        }
    }

    /// Decode the fixed block of `kind` from the front of `buf`.
    pub fn decode(kind: VariantKind, buf: &[u8]) -> Result<(Self, usize), Error> {
        match kind {
            VariantKind::Address => {
                if buf.len() < ADDRESS_WIRE_LEN {
                    return Err(Error::Truncated);
                }
                let fields = AddressFields {
                    family: buf[0],
                    prefix_len: buf[1],
                    flags: u32::from(buf[2]),
                    scope: buf[3],
                    index: u32::from_ne_bytes(buf[4..8].try_into().unwrap()),
                };
                Ok((VariantHeader::Address(fields), ADDRESS_WIRE_LEN))
            }
            VariantKind::Link => {
                if buf.len() < LINK_WIRE_LEN {
                    return Err(Error::Truncated);
                }
                let fields = LinkFields {
                    family: buf[0],
                    device_type: u16::from_ne_bytes(buf[2..4].try_into().unwrap()),
                    index: i32::from_ne_bytes(buf[4..8].try_into().unwrap()),
                    flags: u32::from_ne_bytes(buf[8..12].try_into().unwrap()),
                    change: u32::from_ne_bytes(buf[12..16].try_into().unwrap()),
                };
                Ok((VariantHeader::Link(fields), LINK_WIRE_LEN))
            }
        }
    }

    /// Fold attribute-borne field values back into the fixed block.
    ///
    /// An `IFA_FLAGS` attribute carries the full-width address flags and
    /// wins over the 8-bit wire field.
    pub fn absorb_attrs(&mut self, attrs: &Attributes) {
        if let VariantHeader::Address(fields) = self
            && let Some(AttrValue::U32(full)) = attrs.get(consts::IFA_FLAGS)
        {
            fields.flags = *full;
        }
    }
}

/// Coder for address messages: IP payloads sized by the message family,
/// label as text, full-width flags as a number.
pub struct AddressCoder;

impl AttributeCoder for AddressCoder {
    fn decode_value(&self, attr_type: u16, payload: &[u8], ctx: &DecodeContext) -> AttrValue {
        let value = match attr_type {
            consts::IFA_ADDRESS
            | consts::IFA_LOCAL
            | consts::IFA_BROADCAST
            | consts::IFA_ANYCAST => decode_ip(payload, ctx.family),
            consts::IFA_LABEL => decode_string(payload),
            consts::IFA_FLAGS => decode_u32(payload),
            _ => None,
        };
        value.unwrap_or_else(|| AttrValue::Bytes(payload.to_vec()))
    }
}

/// Coder for link messages: names as text, numeric properties as numbers.
pub struct LinkCoder;

impl AttributeCoder for LinkCoder {
    fn decode_value(&self, attr_type: u16, payload: &[u8], _ctx: &DecodeContext) -> AttrValue {
        let value = match attr_type {
            consts::IFLA_IFNAME | consts::IFLA_QDISC => decode_string(payload),
            consts::IFLA_MTU | consts::IFLA_LINK => decode_u32(payload),
            _ => None,
        };
        value.unwrap_or_else(|| AttrValue::Bytes(payload.to_vec()))
    }
}
