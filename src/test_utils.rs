//! Test support: a scripted in-memory endpoint and wire-level builders.

use crate::attr::Attributes;
use crate::consts;
use crate::header::{HEADER_SIZE, MessageHeader};
use crate::socket::{Datagram, DatagramEndpoint};
use crate::variant::VariantHeader;
use std::collections::VecDeque;
use std::io;

/// Endpoint that records every send and replays a queued script of receive
/// results. An exhausted script yields a hard error rather than blocking,
/// so a test with a missing terminal message fails instead of hanging.
pub struct MockEndpoint {
    pid: u32,
    pub sent: Vec<Vec<u8>>,
    script: VecDeque<io::Result<Datagram>>,
}

impl MockEndpoint {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            sent: Vec::new(),
            script: VecDeque::new(),
        }
    }

    pub fn queue(&mut self, datagram: Datagram) {
        self.script.push_back(Ok(datagram));
    }

    pub fn queue_data(&mut self, data: Vec<u8>) {
        self.queue(Datagram {
            data,
            truncated: false,
        });
    }

    pub fn queue_truncated(&mut self, data: Vec<u8>) {
        self.queue(Datagram {
            data,
            truncated: true,
        });
    }

    pub fn queue_io_error(&mut self, kind: io::ErrorKind) {
        self.script.push_back(Err(io::Error::new(kind, "scripted error")));
    }
}

impl DatagramEndpoint for MockEndpoint {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.sent.push(buf.to_vec());
        Ok(())
    }

    fn recv(&mut self) -> io::Result<Datagram> {
        self.script.pop_front().unwrap_or_else(|| {
            Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "receive script exhausted",
            ))
        })
    }

    fn local_pid(&self) -> u32 {
        self.pid
    }
}

/// Build one data sub-message: envelope, fixed block, synthetic overflow
/// attribute (if any), then `attrs`.
pub fn build_submessage(
    msg_type: u16,
    flags: u16,
    seq: u32,
    pid: u32,
    fields: &VariantHeader,
    attrs: &Attributes,
) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((attr_type, value)) = fields.encode_into(&mut body) {
        let mut synthetic = Attributes::new();
        synthetic.push(attr_type, value);
        synthetic.encode_into(&mut body);
    }
    attrs.encode_into(&mut body);
    frame(msg_type, flags, seq, pid, &body)
}

/// Build an `NLMSG_ERROR` sub-message: the code followed by a copy of the
/// offending request header.
pub fn build_error(code: i32, seq: u32, pid: u32) -> Vec<u8> {
    let offending = MessageHeader {
        len: HEADER_SIZE as u32,
        msg_type: 0,
        flags: 0,
        seq,
        pid,
    };
    let mut body = Vec::new();
    body.extend_from_slice(&code.to_ne_bytes());
    offending.encode_into(&mut body);
    frame(consts::NLMSG_ERROR, 0, seq, pid, &body)
}

/// Build an `NLMSG_DONE` sub-message (carries a zero status word).
pub fn build_done(seq: u32, pid: u32) -> Vec<u8> {
    frame(consts::NLMSG_DONE, 0, seq, pid, &0i32.to_ne_bytes())
}

fn frame(msg_type: u16, flags: u16, seq: u32, pid: u32, body: &[u8]) -> Vec<u8> {
    let header = MessageHeader {
        len: (HEADER_SIZE + body.len()) as u32,
        msg_type,
        flags,
        seq,
        pid,
    };
    let mut wire = Vec::with_capacity(HEADER_SIZE + body.len());
    header.encode_into(&mut wire);
    wire.extend_from_slice(body);
    wire
}
