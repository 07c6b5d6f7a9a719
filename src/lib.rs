//! Request/response client for kernel netlink sockets.
//!
//! The crate frames control messages (fixed envelope + per-kind fixed
//! block + padded tagged attributes), transmits them over a datagram
//! endpoint and decodes the reply stream: multi-part aggregation,
//! acknowledgements, sequence/pid correlation and a typed failure
//! taxonomy. The real `NETLINK_ROUTE` socket lives behind the
//! [`DatagramEndpoint`] trait so the protocol machinery tests without a
//! kernel.

pub mod attr;
pub mod consts;
pub mod error;
pub mod header;
pub mod session;
pub mod socket;
pub mod test_utils;
pub mod variant;

pub use attr::{AttrValue, AttributeCoder, Attributes, DecodeContext, RawCoder};
pub use error::Error;
pub use header::MessageHeader;
pub use session::{Reply, Request, RequestSession, SessionConfig};
pub use socket::{Datagram, DatagramEndpoint};
#[cfg(target_os = "linux")]
pub use socket::RouteSocket;
pub use variant::{AddressFields, LinkFields, VariantHeader, VariantKind};
