//! Wire protocol error types.

use thiserror::Error;

/// Errors raised while framing or decoding protocol messages.
///
/// The codec performs no semantic validation; these cover only header
/// dispatch and payload length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// The single-byte header did not match any known message type.
    #[error("unknown message type header {header:#04x} ({direction})")]
    UnknownMessageType {
        /// The header byte that failed lookup.
        header: u8,
        /// Which namespace was searched ("inbound" or "outbound").
        direction: &'static str,
    },

    /// The payload length did not match the fixed size for the type.
    #[error("malformed {message_type} payload: expected {expected} bytes, got {actual}")]
    MalformedPayload {
        /// Name of the message type being decoded.
        message_type: &'static str,
        /// The fixed payload size for that type.
        expected: usize,
        /// The number of bytes actually supplied.
        actual: usize,
    },
}
