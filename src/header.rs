//! Fixed-size message envelope.
//!
//! Every sub-message starts with this 16-byte header; `len` covers the
//! header itself plus the variant block and attribute list that follow.
//! Byte order is host-native, as for everything on this transport.

use crate::consts::{HeaderFlags, NLMSG_ALIGN};
use crate::error::Error;
use serde::Serialize;

/// Encoded size of [`MessageHeader`].
pub const HEADER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageHeader {
    /// Total bytes of this sub-message, header included.
    pub len: u32,
    /// Message kind: a request/response type or a reserved control type.
    pub msg_type: u16,
    /// Raw flag bits; see [`HeaderFlags`].
    pub flags: u16,
    /// Caller-assigned sequence number correlating response to request.
    pub seq: u32,
    /// Port id of the requesting endpoint; 0 addresses the kernel.
    pub pid: u32,
}

impl MessageHeader {
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.len.to_ne_bytes());
        buf.extend_from_slice(&self.msg_type.to_ne_bytes());
        buf.extend_from_slice(&self.flags.to_ne_bytes());
        buf.extend_from_slice(&self.seq.to_ne_bytes());
        buf.extend_from_slice(&self.pid.to_ne_bytes());
    }

    /// Decode one header from the front of `buf`.
    ///
    /// Fails with [`Error::Truncated`] when fewer than [`HEADER_SIZE`] bytes
    /// remain, or when the declared `len` is below the header size or runs
    /// past the end of `buf`.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), Error> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::Truncated);
        }
        let header = Self {
            len: u32::from_ne_bytes(buf[0..4].try_into().unwrap()),
            msg_type: u16::from_ne_bytes(buf[4..6].try_into().unwrap()),
            flags: u16::from_ne_bytes(buf[6..8].try_into().unwrap()),
            seq: u32::from_ne_bytes(buf[8..12].try_into().unwrap()),
            pid: u32::from_ne_bytes(buf[12..16].try_into().unwrap()),
        };
        let total = header.len as usize;
        if total < HEADER_SIZE || total > buf.len() {
            return Err(Error::Truncated);
        }
        Ok((header, HEADER_SIZE))
    }

    pub fn has_multi(&self) -> bool {
        self.flags & HeaderFlags::MULTI.bits() != 0
    }

    pub fn has_ack_requested(&self) -> bool {
        self.flags & HeaderFlags::ACK.bits() != 0
    }

    pub fn has_dump_interrupted(&self) -> bool {
        self.flags & HeaderFlags::DUMP_INTR.bits() != 0
    }
}

/// Round `n` up to the next [`NLMSG_ALIGN`] boundary.
///
/// Used identically by the sub-message walker and the attribute codec; the
/// two sides must agree or every attribute after the first misparses.
pub const fn align(n: usize) -> usize {
    (n + NLMSG_ALIGN - 1) & !(NLMSG_ALIGN - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> MessageHeader {
        MessageHeader {
            len: 32,
            msg_type: 20,
            flags: (HeaderFlags::REQUEST | HeaderFlags::ACK).bits(),
            seq: 7,
            pid: 4242,
        }
    }

    #[test]
    fn test_encode_layout() {
        let mut buf = Vec::new();
        sample_header().encode_into(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[0..4], &32u32.to_ne_bytes());
        assert_eq!(&buf[4..6], &20u16.to_ne_bytes());
        assert_eq!(&buf[6..8], &0x05u16.to_ne_bytes());
        assert_eq!(&buf[8..12], &7u32.to_ne_bytes());
        assert_eq!(&buf[12..16], &4242u32.to_ne_bytes());
    }

    #[test]
    fn test_round_trip() {
        let header = sample_header();
        let mut buf = Vec::new();
        header.encode_into(&mut buf);
        buf.resize(header.len as usize, 0);

        let (decoded, consumed) = MessageHeader::decode(&buf).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(consumed, HEADER_SIZE);
    }

    #[test]
    fn test_decode_short_buffer() {
        let buf = [0u8; HEADER_SIZE - 1];
        assert!(matches!(MessageHeader::decode(&buf), Err(Error::Truncated)));
    }

    #[test]
    fn test_decode_len_below_header_size() {
        let mut buf = Vec::new();
        let mut header = sample_header();
        header.len = 8;
        header.encode_into(&mut buf);
        assert!(matches!(MessageHeader::decode(&buf), Err(Error::Truncated)));
    }

    #[test]
    fn test_decode_len_past_buffer() {
        let mut buf = Vec::new();
        let mut header = sample_header();
        header.len = 64;
        header.encode_into(&mut buf);
        // Only 16 bytes present but the header claims 64.
        assert!(matches!(MessageHeader::decode(&buf), Err(Error::Truncated)));
    }

    #[test]
    fn test_flag_helpers() {
        let mut header = sample_header();
        assert!(header.has_ack_requested());
        assert!(!header.has_multi());
        assert!(!header.has_dump_interrupted());

        header.flags = (HeaderFlags::MULTI | HeaderFlags::DUMP_INTR).bits();
        assert!(header.has_multi());
        assert!(header.has_dump_interrupted());
        assert!(!header.has_ack_requested());
    }

    #[test]
    fn test_align_properties() {
        for n in 0..64usize {
            let aligned = align(n);
            assert_eq!(aligned % NLMSG_ALIGN, 0);
            assert!(aligned >= n);
            assert!(aligned < n + NLMSG_ALIGN);
        }
        assert_eq!(align(0), 0);
        assert_eq!(align(1), 4);
        assert_eq!(align(4), 4);
        assert_eq!(align(5), 8);
    }
}
