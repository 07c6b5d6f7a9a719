//! Tagged-attribute (TLV) codec.
//!
//! Each entry on the wire is a 4-byte `(len, type)` sub-header, the value
//! bytes, then zero padding up to the alignment boundary. `len` counts the
//! sub-header and value but not the padding.

use crate::error::Error;
use crate::header::align;
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Encoded size of an attribute sub-header.
pub const ATTR_HEADER_SIZE: usize = 4;

/// A decoded attribute value.
///
/// Which interpretation an attribute gets is decided by the message
/// variant's [`AttributeCoder`]; [`Bytes`](AttrValue::Bytes) is the
/// fallback for everything a coder does not recognize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AttrValue {
    Bytes(Vec<u8>),
    U32(u32),
    /// NUL-terminated on the wire; the terminator is stripped on decode.
    String(String),
    Ip(IpAddr),
}

impl AttrValue {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            AttrValue::Bytes(bytes) => bytes.clone(),
            AttrValue::U32(value) => value.to_ne_bytes().to_vec(),
            AttrValue::String(text) => {
                let mut bytes = text.as_bytes().to_vec();
                bytes.push(0);
                bytes
            }
            AttrValue::Ip(IpAddr::V4(ip)) => ip.octets().to_vec(),
            AttrValue::Ip(IpAddr::V6(ip)) => ip.octets().to_vec(),
        }
    }
}

/// Insertion-ordered attribute list.
///
/// Wire order equals push order. Duplicate types are legal on this
/// transport and are preserved; [`get`](Attributes::get) returns the first
/// match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attributes {
    entries: Vec<(u16, AttrValue)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attr_type: u16, value: AttrValue) {
        self.entries.push((attr_type, value));
    }

    pub fn get(&self, attr_type: u16) -> Option<&AttrValue> {
        self.entries
            .iter()
            .find(|(entry_type, _)| *entry_type == attr_type)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u16, AttrValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        for (attr_type, value) in &self.entries {
            let payload = value.to_bytes();
            let total = ATTR_HEADER_SIZE + payload.len();
            buf.extend_from_slice(&(total as u16).to_ne_bytes());
            buf.extend_from_slice(&attr_type.to_ne_bytes());
            buf.extend_from_slice(&payload);
            buf.resize(buf.len() + (align(total) - total), 0);
        }
    }

    /// Walk `buf` from offset 0, decoding `(len, type, value)` triples and
    /// advancing by the aligned length each time until the buffer is
    /// exhausted.
    ///
    /// Fails with [`Error::TruncatedAttribute`] when a declared length is
    /// below the sub-header size or would read past the end of `buf`.
    pub fn decode(
        buf: &[u8],
        coder: &dyn AttributeCoder,
        ctx: &DecodeContext,
    ) -> Result<Self, Error> {
        let mut attrs = Attributes::new();
        let mut offset = 0;

        while offset < buf.len() {
            let rest = &buf[offset..];
            if rest.len() < ATTR_HEADER_SIZE {
                return Err(Error::TruncatedAttribute);
            }
            let total = u16::from_ne_bytes(rest[0..2].try_into().unwrap()) as usize;
            let attr_type = u16::from_ne_bytes(rest[2..4].try_into().unwrap());
            if total < ATTR_HEADER_SIZE || total > rest.len() {
                return Err(Error::TruncatedAttribute);
            }

            let payload = &rest[ATTR_HEADER_SIZE..total];
            attrs.push(attr_type, coder.decode_value(attr_type, payload, ctx));
            offset += align(total);
        }

        Ok(attrs)
    }
}

/// Scalar fields of the enclosing variant, available to coders during
/// decode. Never mutated by the codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeContext {
    /// Address family of the enclosing message; decides how address
    /// payloads are interpreted.
    pub family: u8,
}

/// Per-variant attribute interpretation hook.
pub trait AttributeCoder {
    fn decode_value(&self, attr_type: u16, payload: &[u8], ctx: &DecodeContext) -> AttrValue;
}

/// Default interpretation: every payload stays raw bytes.
pub struct RawCoder;

impl AttributeCoder for RawCoder {
    fn decode_value(&self, _attr_type: u16, payload: &[u8], _ctx: &DecodeContext) -> AttrValue {
        AttrValue::Bytes(payload.to_vec())
    }
}

pub(crate) fn decode_ip(payload: &[u8], family: u8) -> Option<AttrValue> {
    match (i32::from(family), payload.len()) {
        (libc::AF_INET, 4) => {
            let octets: [u8; 4] = payload.try_into().ok()?;
            Some(AttrValue::Ip(IpAddr::V4(Ipv4Addr::from(octets))))
        }
        (libc::AF_INET6, 16) => {
            let octets: [u8; 16] = payload.try_into().ok()?;
            Some(AttrValue::Ip(IpAddr::V6(Ipv6Addr::from(octets))))
        }
        _ => None,
    }
}

pub(crate) fn decode_string(payload: &[u8]) -> Option<AttrValue> {
    let trimmed = payload.strip_suffix(&[0]).unwrap_or(payload);
    std::str::from_utf8(trimmed)
        .ok()
        .map(|text| AttrValue::String(text.to_string()))
}

pub(crate) fn decode_u32(payload: &[u8]) -> Option<AttrValue> {
    let bytes: [u8; 4] = payload.try_into().ok()?;
    Some(AttrValue::U32(u32::from_ne_bytes(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::AF_INET;

    fn raw_ctx() -> DecodeContext {
        DecodeContext::default()
    }

    #[test]
    fn test_encode_layout_with_padding() {
        let mut attrs = Attributes::new();
        attrs.push(3, AttrValue::Bytes(vec![0xaa, 0xbb]));

        let mut buf = Vec::new();
        attrs.encode_into(&mut buf);

        // 4-byte sub-header + 2 value bytes + 2 padding bytes.
        assert_eq!(buf.len(), 8);
        assert_eq!(&buf[0..2], &6u16.to_ne_bytes());
        assert_eq!(&buf[2..4], &3u16.to_ne_bytes());
        assert_eq!(&buf[4..6], &[0xaa, 0xbb]);
        assert_eq!(&buf[6..8], &[0, 0]);
    }

    #[test]
    fn test_encode_aligned_value_has_no_padding() {
        let mut attrs = Attributes::new();
        attrs.push(1, AttrValue::Bytes(vec![1, 2, 3, 4]));

        let mut buf = Vec::new();
        attrs.encode_into(&mut buf);
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn test_round_trip_preserves_order_and_duplicates() {
        let mut attrs = Attributes::new();
        attrs.push(2, AttrValue::Bytes(vec![1]));
        attrs.push(9, AttrValue::Bytes(vec![2, 3, 4, 5, 6]));
        attrs.push(2, AttrValue::Bytes(vec![7, 8]));

        let mut buf = Vec::new();
        attrs.encode_into(&mut buf);

        let decoded = Attributes::decode(&buf, &RawCoder, &raw_ctx()).unwrap();
        assert_eq!(decoded, attrs);
        assert_eq!(decoded.get(2), Some(&AttrValue::Bytes(vec![1])));
    }

    #[test]
    fn test_decode_empty_buffer() {
        let decoded = Attributes::decode(&[], &RawCoder, &raw_ctx()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_decode_truncated_subheader() {
        let buf = [6u8, 0, 1];
        assert!(matches!(
            Attributes::decode(&buf, &RawCoder, &raw_ctx()),
            Err(Error::TruncatedAttribute)
        ));
    }

    #[test]
    fn test_decode_length_past_buffer() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&12u16.to_ne_bytes());
        buf.extend_from_slice(&1u16.to_ne_bytes());
        buf.extend_from_slice(&[0xff; 2]);
        assert!(matches!(
            Attributes::decode(&buf, &RawCoder, &raw_ctx()),
            Err(Error::TruncatedAttribute)
        ));
    }

    #[test]
    fn test_decode_length_below_subheader() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u16.to_ne_bytes());
        buf.extend_from_slice(&1u16.to_ne_bytes());
        assert!(matches!(
            Attributes::decode(&buf, &RawCoder, &raw_ctx()),
            Err(Error::TruncatedAttribute)
        ));
    }

    #[test]
    fn test_string_value_is_nul_terminated() {
        let value = AttrValue::String("eth0".to_string());
        assert_eq!(value.to_bytes(), b"eth0\0");
        assert_eq!(decode_string(b"eth0\0"), Some(value));
    }

    #[test]
    fn test_decode_ip_by_family() {
        let value = decode_ip(&[192, 168, 1, 1], AF_INET).unwrap();
        assert_eq!(value, AttrValue::Ip("192.168.1.1".parse().unwrap()));

        // Wrong payload width for the family falls through.
        assert_eq!(decode_ip(&[1, 2, 3], AF_INET), None);
    }

    #[test]
    fn test_u32_round_trip() {
        let value = AttrValue::U32(1500);
        assert_eq!(decode_u32(&value.to_bytes()), Some(value));
        assert_eq!(decode_u32(&[1, 2]), None);
    }
}
