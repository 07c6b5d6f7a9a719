//! Failure taxonomy for one request/response exchange.
//!
//! Every kind is returned to the caller; nothing here is fatal to the
//! process. The only condition handled internally is the OS-level
//! interrupt/would-block retry in the session's send and receive paths.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport reported a truncated datagram, or a sub-message header
    /// claimed more bytes than the datagram holds. The response content is
    /// unrecoverable.
    #[error("response datagram truncated")]
    Truncated,

    /// A zero-length read where data was expected.
    #[error("unexpected end of stream on the socket")]
    UnexpectedEof,

    /// The peer flagged the dump as interrupted.
    #[error("peer interrupted the response")]
    Interrupted,

    /// The peer answered with a non-zero error code (an OS-style negative
    /// error number, surfaced unmodified).
    #[error("peer returned error code {0}")]
    Protocol(i32),

    /// An acknowledgement was required but the response stream ended
    /// without one.
    #[error("request was never acknowledged")]
    NotAcknowledged,

    /// A multipart response exceeded the configured part bound without
    /// reaching a terminal message.
    #[error("multipart response exceeded {max} parts without terminating")]
    IncompleteMultipart { max: usize },

    /// The caller-supplied deadline expired while waiting for more data.
    #[error("timed out waiting for a response")]
    Timeout,

    /// An attribute's declared length overruns the remaining buffer.
    #[error("attribute length overruns its buffer")]
    TruncatedAttribute,

    /// More unrelated sub-messages arrived than the session tolerates.
    #[error("skipped more than {max} unrelated sub-messages")]
    ForeignFlood { max: usize },

    /// An unrecoverable socket error.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}
