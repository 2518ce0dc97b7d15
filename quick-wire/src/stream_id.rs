//! # Stream Identifiers (RFC 9000 Section 2.1)
//!
//! A stream ID is a 62-bit integer. The two least significant bits carry the
//! stream class and never change; the remaining bits count streams of that
//! class, so the next stream of a class is always `id + 4`.
//!
//! ```text
//! Bits  Stream Type
//! 0x00  Client-Initiated, Bidirectional
//! 0x01  Server-Initiated, Bidirectional
//! 0x02  Client-Initiated, Unidirectional
//! 0x03  Server-Initiated, Unidirectional
//! ```

#![forbid(unsafe_code)]

use bytes::BufMut;
use core::fmt;

use crate::error::{Error, Result};
use crate::varint::{self, VarInt};

/// Maximum Stream ID value (2^62 - 1)
pub const MAX_STREAM_ID: u64 = varint::MAX;

/// Distance between consecutive stream IDs of one class.
const CLASS_STRIDE: u64 = 4;

const CLASS_MASK: u64 = 0b11;

/// Stream Class - Encodes directionality and initiator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamClass {
    /// Client-initiated bidirectional stream
    ClientBidi = 0x00,
    /// Server-initiated bidirectional stream
    ServerBidi = 0x01,
    /// Client-initiated unidirectional stream
    ClientUni = 0x02,
    /// Server-initiated unidirectional stream
    ServerUni = 0x03,
}

impl StreamClass {
    /// Build a class from initiator and directionality.
    pub fn new(initiator: Side, bidirectional: bool) -> Self {
        match (initiator, bidirectional) {
            (Side::Client, true) => StreamClass::ClientBidi,
            (Side::Server, true) => StreamClass::ServerBidi,
            (Side::Client, false) => StreamClass::ClientUni,
            (Side::Server, false) => StreamClass::ServerUni,
        }
    }

    fn from_bits(bits: u64) -> Self {
        match bits & CLASS_MASK {
            0x00 => StreamClass::ClientBidi,
            0x01 => StreamClass::ServerBidi,
            0x02 => StreamClass::ClientUni,
            _ => StreamClass::ServerUni,
        }
    }

    /// Base value: the first stream ID of this class.
    pub fn base(self) -> u64 {
        self as u64
    }

    /// Check if this stream class is bidirectional
    pub fn is_bidirectional(self) -> bool {
        matches!(self, StreamClass::ClientBidi | StreamClass::ServerBidi)
    }

    /// Check if this stream class is unidirectional
    pub fn is_unidirectional(self) -> bool {
        !self.is_bidirectional()
    }

    /// Endpoint that opens streams of this class.
    pub fn initiator(self) -> Side {
        match self {
            StreamClass::ClientBidi | StreamClass::ClientUni => Side::Client,
            StreamClass::ServerBidi | StreamClass::ServerUni => Side::Server,
        }
    }
}

/// Connection endpoint side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Client endpoint
    Client,
    /// Server endpoint
    Server,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(self) -> Side {
        match self {
            Side::Client => Side::Server,
            Side::Server => Side::Client,
        }
    }
}

/// Stream ID - Identifies a bidirectional or unidirectional stream
///
/// Values are normally kept within [`MAX_STREAM_ID`]; [`StreamId::from_raw`]
/// does not check so that out-of-range IDs received from a peer can still be
/// represented and rejected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u64);

impl StreamId {
    /// First stream ID of `class`.
    pub fn new(class: StreamClass) -> Self {
        Self(class.base())
    }

    /// Construct StreamId from raw u64 without range checks.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Construct the `index`-th stream of `class`.
    pub fn from_index(class: StreamClass, index: u64) -> Result<Self> {
        let id = index
            .checked_mul(CLASS_STRIDE)
            .and_then(|v| v.checked_add(class.base()))
            .filter(|&v| v <= MAX_STREAM_ID)
            .ok_or(Error::IntegerOverflow(index))?;
        Ok(Self(id))
    }

    /// Get the raw value
    pub fn value(self) -> u64 {
        self.0
    }

    /// Class encoded in the two low bits.
    pub fn class(self) -> StreamClass {
        StreamClass::from_bits(self.0)
    }

    /// Position among streams of the same class.
    pub fn index(self) -> u64 {
        self.0 >> 2
    }

    /// Check if this stream is bidirectional
    pub fn is_bidirectional(self) -> bool {
        self.class().is_bidirectional()
    }

    /// Check if this stream is unidirectional
    pub fn is_unidirectional(self) -> bool {
        self.class().is_unidirectional()
    }

    /// Check if `side` opened this stream.
    pub fn is_initiated_by(self, side: Side) -> bool {
        self.class().initiator() == side
    }

    /// Returns true if the value exceeds the 62-bit ceiling.
    pub fn is_overflowing(self) -> bool {
        self.0 > MAX_STREAM_ID
    }

    /// Advance to the next stream of the same class.
    ///
    /// On failure the ID is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `IntegerOverflow` if the next ID would exceed 2^62 - 1.
    pub fn increment(&mut self) -> Result<()> {
        *self = self.checked_next()?;
        Ok(())
    }

    /// The next stream of the same class, without mutating `self`.
    pub fn checked_next(self) -> Result<Self> {
        match self.0.checked_add(CLASS_STRIDE) {
            Some(next) if next <= MAX_STREAM_ID => Ok(Self(next)),
            overflowed => {
                let attempted = overflowed.unwrap_or(u64::MAX);
                tracing::debug!(
                    stream_id = self.0,
                    attempted,
                    "stream id increment exceeds 62-bit ceiling"
                );
                Err(Error::IntegerOverflow(attempted))
            }
        }
    }

    /// Varint-encoded wire form.
    pub fn to_wire(self) -> Result<Vec<u8>> {
        varint::to_vec(self.0)
    }

    /// Append the varint-encoded wire form to `buf`.
    pub fn encode<B: BufMut>(self, buf: &mut B) -> Result<usize> {
        varint::encode_buf(self.0, buf)
    }
}

impl From<VarInt> for StreamId {
    fn from(v: VarInt) -> Self {
        Self(v.into_inner())
    }
}

impl TryFrom<StreamId> for VarInt {
    type Error = Error;

    fn try_from(id: StreamId) -> Result<Self> {
        VarInt::from_u64(id.0)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_twice() {
        let mut id = StreamId::new(StreamClass::ClientBidi);
        id.increment().unwrap();
        id.increment().unwrap();
        assert_eq!(id.value(), 8);
    }

    #[test]
    fn test_increment_at_ceiling() {
        let mut id = StreamId::from_raw(MAX_STREAM_ID);
        assert_eq!(id.increment(), Err(Error::IntegerOverflow(MAX_STREAM_ID + 4)));
        assert_eq!(id.value(), MAX_STREAM_ID);

        let mut past = StreamId::from_raw(MAX_STREAM_ID + 1);
        assert!(past.increment().is_err());
        assert_eq!(past.value(), MAX_STREAM_ID + 1);

        let mut top = StreamId::from_raw(u64::MAX);
        assert_eq!(top.increment(), Err(Error::IntegerOverflow(u64::MAX)));
    }

    #[test]
    fn test_checked_next_leaves_original() {
        let id = StreamId::new(StreamClass::ServerBidi);
        assert_eq!(id.checked_next().unwrap().value(), 5);
        assert_eq!(id.value(), 1);
        assert_eq!(
            StreamId::from_raw(MAX_STREAM_ID).checked_next(),
            Err(Error::IntegerOverflow(MAX_STREAM_ID + 4))
        );
    }

    #[test]
    fn test_last_legal_increment() {
        // 2^62 - 1 - 4 is the last ID that can still be incremented.
        let mut id = StreamId::from_raw(MAX_STREAM_ID - 4);
        id.increment().unwrap();
        assert_eq!(id.value(), MAX_STREAM_ID);
        assert_eq!(id.class(), StreamClass::ServerUni);
    }

    #[test]
    fn test_class_of_each_base() {
        for class in [
            StreamClass::ClientBidi,
            StreamClass::ServerBidi,
            StreamClass::ClientUni,
            StreamClass::ServerUni,
        ] {
            assert_eq!(StreamId::new(class).class(), class);
        }
        assert_eq!(StreamId::from_raw(MAX_STREAM_ID).class(), StreamClass::ServerUni);
    }

    #[test]
    fn test_increment_preserves_class() {
        let mut id = StreamId::new(StreamClass::ServerBidi);
        for _ in 0..22 {
            id.increment().unwrap();
            assert_eq!(id.class(), StreamClass::ServerBidi);
        }
        assert_eq!(id.index(), 22);
    }

    #[test]
    fn test_class_properties() {
        assert!(StreamClass::ClientBidi.is_bidirectional());
        assert!(StreamClass::ServerUni.is_unidirectional());
        assert_eq!(StreamClass::ClientUni.initiator(), Side::Client);
        assert_eq!(StreamClass::new(Side::Server, false), StreamClass::ServerUni);
        assert!(StreamId::from_raw(5).is_initiated_by(Side::Server));
        assert!(!StreamId::from_raw(5).is_initiated_by(Side::Server.opposite()));
    }

    #[test]
    fn test_from_index() {
        assert_eq!(StreamId::from_index(StreamClass::ClientUni, 3).unwrap().value(), 14);
        assert!(StreamId::from_index(StreamClass::ClientBidi, 1 << 60).is_err());
    }

    #[test]
    fn test_to_wire() {
        assert_eq!(StreamId::from_raw(4).to_wire().unwrap(), [0x04]);
        assert_eq!(StreamId::from_raw(64).to_wire().unwrap(), [0x40, 0x40]);
        assert!(StreamId::from_raw(MAX_STREAM_ID + 1).to_wire().is_err());
    }
}
