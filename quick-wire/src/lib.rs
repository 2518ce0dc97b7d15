//! quick-wire: Wire-Format Codecs for the Quick QUIC Transport
//!
//! This crate turns raw packet bytes into typed values and back for the
//! parts of RFC 9000 that sit below the connection state machine.
//!
//! # Architecture
//!
//! - **No I/O of its own**: codecs consume `bytes::Buf`/`Bytes` or blocking
//!   `std::io::BufRead` readers and produce `bytes::BufMut` output
//! - **Zero-copy payloads**: STREAM data and transport parameter values are
//!   shared `Bytes` handles into the packet buffer
//! - **Atomic failures**: a failed decode from `Bytes` leaves the buffer where
//!   it was; a failed encode writes nothing
//! - **Errors map to transport codes**: every [`Error`] names the
//!   [`TransportError`] a connection would be closed with
//!
//! # Module Organization
//!
//! - `varint`: 62-bit variable-length integers (RFC 9000 Section 16)
//! - `packet`: packet number truncation and recovery, header first byte
//! - `frame`: frame type registry and the STREAM frame codec
//! - `stream_id`: stream identifiers and their classes
//! - `transport_parameter`: transport parameter record framing
//! - `error`: transport error codes and the codec error type
//! - `config`: codec options loadable from TOML
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use quick_wire::{StreamClass, StreamFrame, StreamId, VarInt};
//!
//! let mut id = StreamId::new(StreamClass::ClientBidi);
//! id.increment()?;
//!
//! let frame = StreamFrame::new(id, VarInt::from_u32(0), Bytes::from_static(b"GET /"), true);
//! let (header, payload) = frame.encode()?;
//!
//! let mut packet = Bytes::from([header.as_ref(), payload.as_ref()].concat());
//! assert_eq!(StreamFrame::decode(&mut packet)?, frame);
//! # Ok::<(), quick_wire::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod frame;
pub mod packet;
pub mod stream_id;
pub mod transport_parameter;
pub mod varint;

// Re-export key types
pub use config::{CodecConfig, OffsetOverflow};
pub use error::{Error, Result, TransportError};
pub use frame::{FrameTag, FrameType, StreamFrame, StreamFrameType};
pub use packet::{FirstByte, PacketNumber, PacketNumberSpace, PacketType, TruncatedPacketNumber};
pub use stream_id::{Side, StreamClass, StreamId};
pub use transport_parameter::{TransportParameter, TransportParameterId, TransportParameters};
pub use varint::VarInt;
