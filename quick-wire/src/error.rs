//! Quick Error Types
//!
//! RFC 9000 Section 20 defines the transport error codes an endpoint closes a
//! connection with. The codecs in this crate never close anything themselves:
//! they report an [`Error`] precise enough for the frame-dispatch layer to pick
//! the matching [`TransportError`] via [`Error::transport_error`].

#![forbid(unsafe_code)]

use core::fmt;
use std::io;

use thiserror::Error;

/// First code of the reserved handshake (TLS alert) range.
pub const CRYPTO_ERROR_BASE: u64 = 0x0100;

/// Last code of the reserved handshake (TLS alert) range.
pub const CRYPTO_ERROR_MAX: u64 = 0x01ff;

/// Transport Error Codes as defined in RFC 9000 Section 20.1
///
/// The discriminant order matches the wire codes 0x00-0x10 and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportError {
    /// No error (0x00) - Used for graceful shutdown
    NoError,

    /// Internal Error (0x01) - Implementation error
    InternalError,

    /// Connection Refused (0x02) - Server refuses connection
    ConnectionRefused,

    /// Flow Control Error (0x03) - Peer exceeded flow control limits
    FlowControlError,

    /// Stream Limit Error (0x04) - Stream limit exceeded
    StreamLimitError,

    /// Stream State Error (0x05) - Frame received in invalid stream state
    StreamStateError,

    /// Final Size Error (0x06) - Final size violation
    FinalSizeError,

    /// Frame Encoding Error (0x07) - Frame encoding error
    FrameEncodingError,

    /// Transport Parameter Error (0x08) - Invalid transport parameters
    TransportParameterError,

    /// Connection ID Limit Error (0x09) - Connection ID limit exceeded
    ConnectionIdLimitError,

    /// Protocol Violation (0x0a) - Generic protocol violation
    ProtocolViolation,

    /// Invalid Token (0x0b) - Invalid Token received
    InvalidToken,

    /// Application Error (0x0c) - Application closed connection
    ApplicationError,

    /// Crypto Buffer Exceeded (0x0d) - CRYPTO data buffer overflowed
    CryptoBufferExceeded,

    /// Key Update Error (0x0e) - Key update error
    KeyUpdateError,

    /// AEAD Limit Reached (0x0f) - AEAD usage limit reached
    AeadLimitReached,

    /// No Viable Path (0x10) - No viable network path
    NoViablePath,

    /// Crypto Error (0x0100-0x01ff) - TLS alert code in the low byte
    CryptoError(u8),
}

/// Fixed code/name/description table, indexed by wire code.
const TRANSPORT_ERRORS: [(TransportError, &str, &str); 17] = [
    (TransportError::NoError, "NO_ERROR", "No error"),
    (
        TransportError::InternalError,
        "INTERNAL_ERROR",
        "The endpoint encountered an internal error and cannot continue with the connection",
    ),
    (
        TransportError::ConnectionRefused,
        "CONNECTION_REFUSED",
        "The server refused to accept a new connection",
    ),
    (
        TransportError::FlowControlError,
        "FLOW_CONTROL_ERROR",
        "An endpoint received more data than it permitted in its advertised data limits",
    ),
    (
        TransportError::StreamLimitError,
        "STREAM_LIMIT_ERROR",
        "An endpoint received a frame for a stream identifier that exceeded its advertised stream limit",
    ),
    (
        TransportError::StreamStateError,
        "STREAM_STATE_ERROR",
        "An endpoint received a frame for a stream that was not in a state that permitted that frame",
    ),
    (
        TransportError::FinalSizeError,
        "FINAL_SIZE_ERROR",
        "An endpoint received stream data or a final size that contradicts the established final size of the stream",
    ),
    (
        TransportError::FrameEncodingError,
        "FRAME_ENCODING_ERROR",
        "An endpoint received a frame that was badly formatted",
    ),
    (
        TransportError::TransportParameterError,
        "TRANSPORT_PARAMETER_ERROR",
        "An endpoint received transport parameters that were badly formatted",
    ),
    (
        TransportError::ConnectionIdLimitError,
        "CONNECTION_ID_LIMIT_ERROR",
        "The number of connection IDs provided by the peer exceeds the advertised active_connection_id_limit",
    ),
    (
        TransportError::ProtocolViolation,
        "PROTOCOL_VIOLATION",
        "An endpoint detected an error with protocol compliance that was not covered by more specific error codes",
    ),
    (
        TransportError::InvalidToken,
        "INVALID_TOKEN",
        "A server received a client Initial that contained an invalid Token field",
    ),
    (
        TransportError::ApplicationError,
        "APPLICATION_ERROR",
        "The application or application protocol caused the connection to be closed",
    ),
    (
        TransportError::CryptoBufferExceeded,
        "CRYPTO_BUFFER_EXCEEDED",
        "An endpoint has received more data in CRYPTO frames than it can buffer",
    ),
    (
        TransportError::KeyUpdateError,
        "KEY_UPDATE_ERROR",
        "An endpoint detected errors in performing key updates",
    ),
    (
        TransportError::AeadLimitReached,
        "AEAD_LIMIT_REACHED",
        "An endpoint has reached the confidentiality or integrity limit for the AEAD algorithm used by the given connection",
    ),
    (
        TransportError::NoViablePath,
        "NO_VIABLE_PATH",
        "An endpoint has determined that the network path is incapable of supporting QUIC",
    ),
];

const CRYPTO_ERROR_DESCRIPTION: &str = "The cryptographic handshake failed";

impl TransportError {
    /// Wire code of this error.
    pub fn code(self) -> u64 {
        match self {
            TransportError::CryptoError(alert) => CRYPTO_ERROR_BASE | alert as u64,
            TransportError::NoError => 0x00,
            TransportError::InternalError => 0x01,
            TransportError::ConnectionRefused => 0x02,
            TransportError::FlowControlError => 0x03,
            TransportError::StreamLimitError => 0x04,
            TransportError::StreamStateError => 0x05,
            TransportError::FinalSizeError => 0x06,
            TransportError::FrameEncodingError => 0x07,
            TransportError::TransportParameterError => 0x08,
            TransportError::ConnectionIdLimitError => 0x09,
            TransportError::ProtocolViolation => 0x0a,
            TransportError::InvalidToken => 0x0b,
            TransportError::ApplicationError => 0x0c,
            TransportError::CryptoBufferExceeded => 0x0d,
            TransportError::KeyUpdateError => 0x0e,
            TransportError::AeadLimitReached => 0x0f,
            TransportError::NoViablePath => 0x10,
        }
    }

    /// Look up an error by wire code. Returns `None` for unassigned codes.
    pub fn from_code(code: u64) -> Option<Self> {
        if (CRYPTO_ERROR_BASE..=CRYPTO_ERROR_MAX).contains(&code) {
            return Some(TransportError::CryptoError((code - CRYPTO_ERROR_BASE) as u8));
        }
        TRANSPORT_ERRORS.get(code as usize).map(|(e, _, _)| *e)
    }

    /// Upper-case protocol name, e.g. `FLOW_CONTROL_ERROR`.
    pub fn name(self) -> &'static str {
        match self {
            TransportError::CryptoError(_) => "CRYPTO_ERROR",
            other => TRANSPORT_ERRORS[other.code() as usize].1,
        }
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            TransportError::CryptoError(_) => CRYPTO_ERROR_DESCRIPTION,
            other => TRANSPORT_ERRORS[other.code() as usize].2,
        }
    }

    /// Returns true for codes in the reserved handshake range.
    pub fn is_crypto(self) -> bool {
        matches!(self, TransportError::CryptoError(_))
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x}): {}", self.name(), self.code(), self.description())
    }
}

impl std::error::Error for TransportError {}

/// Generic Result Type for codec operations
pub type Result<T> = core::result::Result<T, Error>;

/// Codec failure kinds.
///
/// Every variant is a value type so callers can compare and retry freely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A value or an arithmetic result exceeds 2^62 - 1.
    #[error("integer overflow: {0:#x} exceeds the 62-bit ceiling")]
    IntegerOverflow(u64),

    /// Malformed frame bytes, or an unknown frame type.
    #[error("frame encoding error: {0}")]
    FrameEncoding(&'static str),

    /// Input ended inside the named field. More bytes could complete it.
    #[error("frame encoding error: truncated {0}")]
    Truncated(&'static str),

    /// Offset + Length of received stream data cannot be given flow control credit.
    #[error("flow control error: offset {offset} + length {length} exceeds the 62-bit ceiling")]
    FlowControl { offset: u64, length: u64 },

    /// A value outside 0x08-0x0f was used where a STREAM frame type was required.
    #[error("invalid STREAM frame type: {0:#04x}")]
    InvalidFrameType(u64),

    /// Badly framed transport parameter record.
    #[error("transport parameter error: {0}")]
    TransportParameter(&'static str),

    /// Output buffer cannot hold the encoding.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Argument outside the domain of the operation.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The underlying reader failed for a reason other than running short.
    #[error("I/O error: {0:?}")]
    Io(io::ErrorKind),
}

impl Error {
    /// Transport error a frame-dispatch layer closes the connection with.
    pub fn transport_error(&self) -> TransportError {
        match self {
            Error::FrameEncoding(_) | Error::Truncated(_) | Error::InvalidFrameType(_) => {
                TransportError::FrameEncodingError
            }
            Error::FlowControl { .. } => TransportError::FlowControlError,
            Error::TransportParameter(_) => TransportError::TransportParameterError,
            Error::IntegerOverflow(_)
            | Error::BufferTooSmall { .. }
            | Error::InvalidInput(_)
            | Error::Io(_) => TransportError::InternalError,
        }
    }

    /// Returns true if more input could turn this failure into a success.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Error::Truncated(_))
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::Truncated("input"),
            kind => Error::Io(kind),
        }
    }
}

impl From<Error> for TransportError {
    fn from(e: Error) -> Self {
        e.transport_error()
    }
}
