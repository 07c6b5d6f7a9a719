//! Transport-defined netlink constants.
//!
//! These are the standard Linux values; they are exported here so nothing
//! else in the crate carries magic numbers.

use bitflags::bitflags;

/// Headers and attributes are padded to this boundary.
pub const NLMSG_ALIGN: usize = 4;

// Reserved control message types.
pub const NLMSG_NOOP: u16 = 1;
pub const NLMSG_ERROR: u16 = 2;
pub const NLMSG_DONE: u16 = 3;
pub const NLMSG_OVERRUN: u16 = 4;

// NETLINK_ROUTE request types for the supported variants.
pub const RTM_NEWLINK: u16 = 16;
pub const RTM_DELLINK: u16 = 17;
pub const RTM_GETLINK: u16 = 18;
pub const RTM_SETLINK: u16 = 19;
pub const RTM_NEWADDR: u16 = 20;
pub const RTM_DELADDR: u16 = 21;
pub const RTM_GETADDR: u16 = 22;

bitflags! {
    /// Flags carried in the message header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HeaderFlags: u16 {
        /// Indicates a request message.
        const REQUEST = 0x01;
        /// Multipart message, terminated by `NLMSG_DONE`.
        const MULTI = 0x02;
        /// Reply with an acknowledgment, with zero or an error code.
        const ACK = 0x04;
        /// Echo this request.
        const ECHO = 0x08;
        /// Dump was inconsistent due to a sequence change.
        const DUMP_INTR = 0x10;

        // Modifiers for get requests.
        const ROOT = 0x100;
        const MATCH = 0x200;
        const ATOMIC = 0x400;
        const DUMP = Self::ROOT.bits() | Self::MATCH.bits();

        // Modifiers for new requests; same bit positions as the get
        // modifiers, disambiguated by the message type.
        const REPLACE = 0x100;
        const EXCL = 0x200;
        const CREATE = 0x400;
        const APPEND = 0x800;
    }
}

bitflags! {
    /// Full-width address flags (`IFA_F_*`).
    ///
    /// Only the low eight bits fit the address variant's wire field; the
    /// rest travel in an `IFA_FLAGS` attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AddressFlags: u32 {
        const SECONDARY      = 0x01;
        const NODAD          = 0x02;
        const OPTIMISTIC     = 0x04;
        const DADFAILED      = 0x08;
        const HOMEADDRESS    = 0x10;
        const DEPRECATED     = 0x20;
        const TENTATIVE      = 0x40;
        const PERMANENT      = 0x80;
        const MANAGETEMPADDR = 0x100;
        const NOPREFIXROUTE  = 0x200;
        const MCAUTOJOIN     = 0x400;
        const STABLE_PRIVACY = 0x800;
    }
}

// Attribute types for address messages (`IFA_*`).
pub const IFA_UNSPEC: u16 = 0;
pub const IFA_ADDRESS: u16 = 1;
pub const IFA_LOCAL: u16 = 2;
pub const IFA_LABEL: u16 = 3;
pub const IFA_BROADCAST: u16 = 4;
pub const IFA_ANYCAST: u16 = 5;
pub const IFA_CACHEINFO: u16 = 6;
pub const IFA_FLAGS: u16 = 8;

// Attribute types for link messages (`IFLA_*`).
pub const IFLA_UNSPEC: u16 = 0;
pub const IFLA_ADDRESS: u16 = 1;
pub const IFLA_BROADCAST: u16 = 2;
pub const IFLA_IFNAME: u16 = 3;
pub const IFLA_MTU: u16 = 4;
pub const IFLA_LINK: u16 = 5;
pub const IFLA_QDISC: u16 = 6;
pub const IFLA_STATS: u16 = 7;
pub const IFLA_OPERSTATE: u16 = 16;

// Address families used by the coders.
pub const AF_UNSPEC: u8 = libc::AF_UNSPEC as u8;
pub const AF_INET: u8 = libc::AF_INET as u8;
pub const AF_INET6: u8 = libc::AF_INET6 as u8;

// Route scopes (`rt_scope_t`).
pub const RT_SCOPE_UNIVERSE: u8 = 0;
pub const RT_SCOPE_SITE: u8 = 200;
pub const RT_SCOPE_LINK: u8 = 253;
pub const RT_SCOPE_HOST: u8 = 254;
pub const RT_SCOPE_NOWHERE: u8 = 255;
