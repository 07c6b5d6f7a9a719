//! One-request-at-a-time exchange over a datagram endpoint.
//!
//! A session frames a request, transmits it as a single datagram, then
//! receives datagrams until the response reaches a terminal condition:
//! a non-multipart data message, an acknowledgement, a done marker, or a
//! failure. Responses are demultiplexed purely by `(pid, seq)`; callers
//! must serialize requests on one socket, which `&mut self` enforces.

use crate::attr::Attributes;
use crate::consts::{self, HeaderFlags};
use crate::error::Error;
use crate::header::{HEADER_SIZE, MessageHeader, align};
use crate::socket::{Datagram, DatagramEndpoint};
use crate::variant::VariantHeader;
use log::{debug, warn};
use serde::Serialize;
use std::io;
use std::time::{Duration, Instant};

const DEFAULT_MAX_PARTS: usize = 4096;
const DEFAULT_MAX_FOREIGN: usize = 64;

/// Knobs for one session; defaults suit request/ack exchanges against the
/// local kernel.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Demand an acknowledgement; the exchange fails with
    /// [`Error::NotAcknowledged`] if none arrives.
    pub require_ack: bool,
    /// Overall deadline for the receive loop. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Most data parts accepted before a multipart response is declared
    /// incomplete.
    pub max_parts: usize,
    /// Most non-matching sub-messages skipped before giving up.
    pub max_foreign: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            require_ack: true,
            timeout: None,
            max_parts: DEFAULT_MAX_PARTS,
            max_foreign: DEFAULT_MAX_FOREIGN,
        }
    }
}

/// One outbound request.
///
/// `flags` carries request modifiers such as [`HeaderFlags::DUMP`]; the
/// session adds `REQUEST` (and `ACK` when required) itself.
#[derive(Debug, Clone)]
pub struct Request {
    pub msg_type: u16,
    pub flags: u16,
    pub fields: VariantHeader,
    pub attrs: Attributes,
}

impl Request {
    pub fn new(msg_type: u16, fields: VariantHeader) -> Self {
        Self {
            msg_type,
            flags: 0,
            fields,
            attrs: Attributes::new(),
        }
    }

    /// Mark this as a dump (return-all-matches) request.
    pub fn dump(mut self) -> Self {
        self.flags |= HeaderFlags::DUMP.bits();
        self
    }
}

/// One decoded response sub-message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub header: MessageHeader,
    pub fields: VariantHeader,
    pub attrs: Attributes,
}

/// Owns a datagram endpoint and a monotonically increasing sequence
/// counter. The counter starts at a non-zero value, wraps on overflow and
/// is never reset.
pub struct RequestSession<E: DatagramEndpoint> {
    endpoint: E,
    seq: u32,
    config: SessionConfig,
}

impl<E: DatagramEndpoint> RequestSession<E> {
    pub fn new(endpoint: E) -> Self {
        Self::with_config(endpoint, SessionConfig::default())
    }

    pub fn with_config(endpoint: E, config: SessionConfig) -> Self {
        Self {
            endpoint,
            seq: 0,
            config,
        }
    }

    /// The sequence number most recently issued (0 before the first
    /// request; the first request uses 1).
    pub fn sequence(&self) -> u32 {
        self.seq
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn endpoint_mut(&mut self) -> &mut E {
        &mut self.endpoint
    }

    fn next_seq(&mut self) -> u32 {
        self.seq = self.seq.wrapping_add(1);
        self.seq
    }

    /// Perform one request/response exchange.
    ///
    /// Transmits exactly one datagram, then receives until a terminal
    /// condition; returns the decoded data sub-messages in arrival order.
    /// An acknowledgement with no data yields `Ok(vec![])`.
    pub fn request(&mut self, request: Request) -> Result<Vec<Reply>, Error> {
        let seq = self.next_seq();
        let pid = self.endpoint.local_pid();
        let wire = encode_request(&request, seq, pid, self.config.require_ack);

        self.send_retrying(&wire)?;
        debug!(
            "sent type={} seq={} pid={} ({} bytes)",
            request.msg_type,
            seq,
            pid,
            wire.len()
        );

        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        let kind = request.fields.kind();
        let coder = request.fields.coder();

        let mut replies = Vec::new();
        let mut acknowledged = false;
        let mut foreign = 0usize;
        let mut done = false;

        while !done {
            let datagram = self.recv_retrying(deadline)?;
            if datagram.truncated {
                warn!("response for seq={} truncated by the transport", seq);
                return Err(Error::Truncated);
            }
            if datagram.data.is_empty() {
                warn!("zero-length datagram while waiting for seq={}", seq);
                return Err(Error::UnexpectedEof);
            }

            let mut offset = 0;
            while offset < datagram.data.len() {
                let rest = &datagram.data[offset..];
                let (header, _) = MessageHeader::decode(rest)?;
                let total = header.len as usize;
                offset += align(total);

                if header.pid != pid || header.seq != seq {
                    // Noise on a multiplexed socket, addressed at someone
                    // else; tolerated up to a bound.
                    foreign += 1;
                    if foreign > self.config.max_foreign {
                        warn!("gave up after {} unrelated sub-messages", foreign);
                        return Err(Error::ForeignFlood {
                            max: self.config.max_foreign,
                        });
                    }
                    continue;
                }

                if header.has_dump_interrupted() {
                    warn!("peer interrupted the dump for seq={}", seq);
                    return Err(Error::Interrupted);
                }

                match header.msg_type {
                    consts::NLMSG_ERROR => {
                        let code = decode_error_code(&rest[HEADER_SIZE..total])?;
                        if code != 0 {
                            warn!("peer rejected seq={} with code {}", seq, code);
                            return Err(Error::Protocol(code));
                        }
                        // Plain acknowledgement; nothing more follows on
                        // this path.
                        acknowledged = true;
                        done = true;
                        break;
                    }
                    consts::NLMSG_DONE => {
                        done = true;
                        break;
                    }
                    _ => {
                        let body = &rest[HEADER_SIZE..total];
                        let (mut fields, consumed) = VariantHeader::decode(kind, body)?;
                        let ctx = fields.decode_context();
                        let attrs = Attributes::decode(&body[consumed..], coder, &ctx)?;
                        fields.absorb_attrs(&attrs);
                        replies.push(Reply {
                            header,
                            fields,
                            attrs,
                        });
                        // Any valid data message counts as an implicit ack.
                        acknowledged = true;

                        if replies.len() > self.config.max_parts {
                            warn!("multipart response for seq={} exceeded {} parts", seq, self.config.max_parts);
                            return Err(Error::IncompleteMultipart {
                                max: self.config.max_parts,
                            });
                        }
                        if !header.has_multi() {
                            done = true;
                            break;
                        }
                    }
                }
            }
        }

        if self.config.require_ack && !acknowledged {
            warn!("response stream for seq={} ended without an ack", seq);
            return Err(Error::NotAcknowledged);
        }
        debug!("seq={} finished with {} replies", seq, replies.len());
        Ok(replies)
    }

    fn send_retrying(&mut self, buf: &[u8]) -> Result<(), Error> {
        loop {
            match self.endpoint.send(buf) {
                Ok(()) => return Ok(()),
                // Signal delivery restarts the call; no protocol state
                // changes.
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn recv_retrying(&mut self, deadline: Option<Instant>) -> Result<Datagram, Error> {
        loop {
            match self.endpoint.recv() {
                Ok(datagram) => return Ok(datagram),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    match deadline {
                        Some(d) if Instant::now() >= d => return Err(Error::Timeout),
                        _ => continue,
                    }
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

/// Frame a request: envelope, fixed block, synthetic overflow attribute (if
/// any), caller attributes; then finalize the total length.
fn encode_request(request: &Request, seq: u32, pid: u32, require_ack: bool) -> Vec<u8> {
    let mut flags = request.flags | HeaderFlags::REQUEST.bits();
    if require_ack {
        flags |= HeaderFlags::ACK.bits();
    }

    let mut body = Vec::new();
    if let Some((attr_type, value)) = request.fields.encode_into(&mut body) {
        let mut synthetic = Attributes::new();
        synthetic.push(attr_type, value);
        synthetic.encode_into(&mut body);
    }
    request.attrs.encode_into(&mut body);

    let header = MessageHeader {
        len: (HEADER_SIZE + body.len()) as u32,
        msg_type: request.msg_type,
        flags,
        seq,
        pid,
    };

    let mut wire = Vec::with_capacity(HEADER_SIZE + body.len());
    header.encode_into(&mut wire);
    wire.extend_from_slice(&body);
    wire
}

/// The error payload leads with the code; a copy of the offending header
/// follows and is not surfaced.
fn decode_error_code(payload: &[u8]) -> Result<i32, Error> {
    if payload.len() < 4 {
        return Err(Error::Truncated);
    }
    Ok(i32::from_ne_bytes(payload[..4].try_into().unwrap()))
}
