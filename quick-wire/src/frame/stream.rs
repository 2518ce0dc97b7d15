//! # STREAM Frames (RFC 9000 Section 19.8)
//!
//! ```text
//! STREAM Frame {
//!   Type (i) = 0x08..0x0f,
//!   Stream ID (i),
//!   [Offset (i)],
//!   [Length (i)],
//!   Stream Data (..),
//! }
//! ```
//!
//! The low three bits of the type are flags: OFF (0x04) says an Offset field
//! is present, LEN (0x02) says a Length field is present, FIN (0x01) marks the
//! end of the stream. Without LEN the data runs to the end of the packet, so
//! every decoder here takes an explicit bound for "end of packet".

#![forbid(unsafe_code)]

use core::fmt;
use std::io::{self, BufRead, Read};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::types::{FRAME_TYPE_STREAM, FRAME_TYPE_STREAM_MAX};
use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::stream_id::StreamId;
use crate::varint::{self, VarInt};

/// FIN bit: last frame of the stream.
pub const STREAM_FRAME_BIT_FIN: u8 = 0x01;
/// LEN bit: a Length field is present.
pub const STREAM_FRAME_BIT_LEN: u8 = 0x02;
/// OFF bit: an Offset field is present.
pub const STREAM_FRAME_BIT_OFF: u8 = 0x04;

/// STREAM frame type byte.
///
/// Any byte can be held so that a bad type read off the wire or built by a
/// caller can be reported; [`StreamFrameType::is_valid`] tells whether it is
/// in 0x08-0x0f. The `with_*` setters return a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamFrameType(u8);

impl StreamFrameType {
    /// Plain STREAM type (0x08): no offset, no length, no FIN.
    pub const fn new() -> Self {
        Self(FRAME_TYPE_STREAM as u8)
    }

    /// Wrap a raw type byte without validation.
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw type byte.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns true if the byte is in 0x08-0x0f.
    pub fn is_valid(self) -> bool {
        (FRAME_TYPE_STREAM..=FRAME_TYPE_STREAM_MAX).contains(&(self.0 as u64))
    }

    pub fn has_offset(self) -> bool {
        self.0 & STREAM_FRAME_BIT_OFF != 0
    }

    pub fn has_length(self) -> bool {
        self.0 & STREAM_FRAME_BIT_LEN != 0
    }

    pub fn is_fin(self) -> bool {
        self.0 & STREAM_FRAME_BIT_FIN != 0
    }

    pub fn with_offset(self, on: bool) -> Self {
        self.with_bit(STREAM_FRAME_BIT_OFF, on)
    }

    pub fn with_length(self, on: bool) -> Self {
        self.with_bit(STREAM_FRAME_BIT_LEN, on)
    }

    pub fn with_fin(self, on: bool) -> Self {
        self.with_bit(STREAM_FRAME_BIT_FIN, on)
    }

    fn with_bit(self, bit: u8, on: bool) -> Self {
        Self(if on { self.0 | bit } else { self.0 & !bit })
    }

    fn check(self) -> Result<()> {
        if !self.is_valid() {
            return Err(Error::InvalidFrameType(self.0 as u64));
        }
        Ok(())
    }
}

impl Default for StreamFrameType {
    fn default() -> Self {
        Self::new()
    }
}

impl From<StreamFrameType> for u8 {
    fn from(t: StreamFrameType) -> Self {
        t.0
    }
}

impl fmt::Display for StreamFrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STREAM({:#04x}", self.0)?;
        for (bit, name) in [
            (STREAM_FRAME_BIT_OFF, "OFF"),
            (STREAM_FRAME_BIT_LEN, "LEN"),
            (STREAM_FRAME_BIT_FIN, "FIN"),
        ] {
            if self.0 & bit != 0 {
                write!(f, " {name}")?;
            }
        }
        f.write_str(")")
    }
}

/// STREAM frame.
///
/// The Length field is always `data.len()`. `data` is a shared handle, so
/// cloning a frame or encoding it never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFrame {
    pub frame_type: StreamFrameType,
    pub stream_id: StreamId,
    pub offset: VarInt,
    pub data: Bytes,
}

/// Fields that precede the stream data.
#[derive(Debug, Clone, Copy)]
struct Header {
    frame_type: StreamFrameType,
    stream_id: StreamId,
    offset: VarInt,
    data_len: u64,
}

impl StreamFrame {
    /// Build a frame carrying `data` at `offset`.
    ///
    /// The OFF bit is set for a non-zero offset and the LEN bit is always
    /// set, so the frame can be followed by other frames in the packet.
    pub fn new(stream_id: StreamId, offset: VarInt, data: Bytes, fin: bool) -> Self {
        let frame_type = StreamFrameType::new()
            .with_offset(offset.into_inner() != 0)
            .with_length(true)
            .with_fin(fin);
        Self {
            frame_type,
            stream_id,
            offset,
            data,
        }
    }

    /// Number of data bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_fin(&self) -> bool {
        self.frame_type.is_fin()
    }

    /// Stream offset just past the last data byte.
    ///
    /// # Errors
    ///
    /// `IntegerOverflow` if the result exceeds 2^62 - 1.
    pub fn end_offset(&self) -> Result<u64> {
        let offset = self.offset.into_inner();
        let end = offset.saturating_add(self.data.len() as u64);
        if end > varint::MAX {
            return Err(Error::IntegerOverflow(end));
        }
        Ok(end)
    }

    fn check_encodable(&self) -> Result<()> {
        self.frame_type.check()?;
        if !self.frame_type.has_offset() && self.offset != VarInt::ZERO {
            return Err(Error::InvalidInput("non-zero offset without the OFF bit"));
        }
        if let Err(e) = self.end_offset() {
            tracing::debug!(
                stream_id = self.stream_id.value(),
                offset = self.offset.into_inner(),
                length = self.data.len(),
                "refusing to encode STREAM frame past the 62-bit offset ceiling"
            );
            return Err(e);
        }
        Ok(())
    }

    /// Size of the header fields in bytes.
    pub fn header_len(&self) -> Result<usize> {
        let mut len = varint::encoded_len(self.frame_type.value() as u64)?
            + varint::encoded_len(self.stream_id.value())?;
        if self.frame_type.has_offset() {
            len += self.offset.size();
        }
        if self.frame_type.has_length() {
            len += varint::encoded_len(self.data.len() as u64)?;
        }
        Ok(len)
    }

    /// Write Type, Stream ID, [Offset] and [Length] to `buf`.
    ///
    /// Nothing is written if the frame cannot be encoded.
    pub fn encode_header<B: BufMut>(&self, buf: &mut B) -> Result<usize> {
        self.check_encodable()?;
        let needed = self.header_len()?;
        if buf.remaining_mut() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                available: buf.remaining_mut(),
            });
        }

        varint::encode_buf(self.frame_type.value() as u64, buf)?;
        self.stream_id.encode(buf)?;
        if self.frame_type.has_offset() {
            self.offset.encode(buf)?;
        }
        if self.frame_type.has_length() {
            varint::encode_buf(self.data.len() as u64, buf)?;
        }
        Ok(needed)
    }

    /// Encode the frame as a header buffer plus the payload handle.
    ///
    /// The payload is the frame's own `data`, not a copy; a sender can
    /// write both with vectored I/O.
    ///
    /// # Errors
    ///
    /// * `InvalidFrameType` if the type is outside 0x08-0x0f
    /// * `IntegerOverflow` if the stream ID exceeds 2^62 - 1 or
    ///   offset + length does
    /// * `InvalidInput` if a non-zero offset is set without the OFF bit
    pub fn encode(&self) -> Result<(Bytes, Bytes)> {
        let mut header = BytesMut::with_capacity(32);
        self.encode_header(&mut header)?;
        Ok((header.freeze(), self.data.clone()))
    }

    /// Encode header and payload contiguously into `buf`.
    pub fn encode_to<B: BufMut>(&self, buf: &mut B) -> Result<usize> {
        let needed = self.header_len()? + self.data.len();
        if buf.remaining_mut() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                available: buf.remaining_mut(),
            });
        }
        let header_len = self.encode_header(buf)?;
        buf.put_slice(&self.data);
        Ok(header_len + self.data.len())
    }

    /// Decode a frame from the front of `buf` with the default configuration.
    ///
    /// `buf` holds the rest of the packet; a frame without LEN takes all of
    /// it. On success `buf` is advanced past the frame and the payload shares
    /// its memory. On failure `buf` is left untouched.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        Self::decode_with(buf, &CodecConfig::default())
    }

    /// [`StreamFrame::decode`] with an explicit configuration.
    ///
    /// # Errors
    ///
    /// * `FrameEncoding` for a type outside 0x08-0x0f or a malformed field
    /// * `Truncated` for a field cut short, or data shorter than Length
    /// * `FrameEncoding` or `FlowControl` (per `config.offset_overflow`) if
    ///   Offset + Length exceeds 2^62 - 1
    pub fn decode_with(buf: &mut Bytes, config: &CodecConfig) -> Result<Self> {
        let (header, header_len) = parse_header(&buf[..], config)?;
        buf.advance(header_len);
        let data = buf.split_to(header.data_len as usize);
        Ok(header.into_frame(data))
    }

    /// Decode a frame from the front of a borrowed packet slice.
    ///
    /// Returns the frame and the number of bytes consumed. The payload is
    /// copied out of `packet`.
    pub fn parse(packet: &[u8], config: &CodecConfig) -> Result<(Self, usize)> {
        let (header, header_len) = parse_header(packet, config)?;
        let end = header_len + header.data_len as usize;
        let data = Bytes::copy_from_slice(&packet[header_len..end]);
        Ok((header.into_frame(data), end))
    }

    /// Read a frame from a blocking reader.
    ///
    /// `packet_remaining` is the number of packet bytes left at the reader's
    /// position; nothing past it is consumed. A frame without LEN takes all
    /// of it. The payload is copied into a fresh allocation, so a Length above
    /// `config.max_stream_data_len` is rejected first. The reader is advanced
    /// by whatever was read before a failure, and such a frame must be
    /// discarded with its packet.
    pub fn read<R: BufRead + ?Sized>(
        reader: &mut R,
        packet_remaining: u64,
        config: &CodecConfig,
    ) -> Result<Self> {
        let mut limited = Read::take(&mut *reader, packet_remaining);
        let strict = config.strict_minimal_varints;

        let raw_type = read_varint(&mut limited, strict, "frame type")?;
        let frame_type = stream_frame_type(raw_type)?;
        let stream_id = StreamId::from_raw(read_varint(&mut limited, strict, "stream id")?);
        let offset = if frame_type.has_offset() {
            read_varint(&mut limited, strict, "stream offset")?
        } else {
            0
        };
        let data_len = if frame_type.has_length() {
            read_varint(&mut limited, strict, "stream length")?
        } else {
            limited.limit()
        };

        let header = Header::checked(frame_type, stream_id, offset, data_len, config)?;
        if header.data_len > config.max_stream_data_len {
            tracing::debug!(
                stream_id = stream_id.value(),
                length = header.data_len,
                limit = config.max_stream_data_len,
                "STREAM frame data exceeds configured limit"
            );
            return Err(Error::FrameEncoding("stream data exceeds configured limit"));
        }
        if header.data_len > limited.limit() {
            return Err(truncated_data(header.data_len, limited.limit()));
        }

        let mut data = vec![0u8; header.data_len as usize];
        limited.read_exact(&mut data).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::Truncated("stream data"),
            _ => Error::from(e),
        })?;
        Ok(header.into_frame(Bytes::from(data)))
    }
}

impl Header {
    /// Run the offset check that precedes taking the data.
    fn checked(
        frame_type: StreamFrameType,
        stream_id: StreamId,
        offset: u64,
        data_len: u64,
        config: &CodecConfig,
    ) -> Result<Self> {
        if offset.saturating_add(data_len) > varint::MAX {
            tracing::debug!(
                stream_id = stream_id.value(),
                offset,
                length = data_len,
                "STREAM frame offset + length exceeds 2^62 - 1"
            );
            return Err(config.offset_overflow.to_error(offset, data_len));
        }
        Ok(Self {
            frame_type,
            stream_id,
            offset: VarInt::from_u64(offset)?,
            data_len,
        })
    }

    fn into_frame(self, data: Bytes) -> StreamFrame {
        StreamFrame {
            frame_type: self.frame_type,
            stream_id: self.stream_id,
            offset: self.offset,
            data,
        }
    }
}

fn stream_frame_type(raw: u64) -> Result<StreamFrameType> {
    match u8::try_from(raw) {
        Ok(byte) if StreamFrameType::from_raw(byte).is_valid() => Ok(StreamFrameType::from_raw(byte)),
        _ => {
            tracing::debug!(frame_type = raw, "not a STREAM frame type");
            Err(Error::FrameEncoding("not a STREAM frame type"))
        }
    }
}

fn truncated_data(needed: u64, available: u64) -> Error {
    tracing::debug!(needed, available, "STREAM data runs past the end of the packet");
    Error::Truncated("stream data")
}

/// Parse the header fields from `packet` without consuming anything.
///
/// Returns the header and its encoded size; the data is guaranteed to be
/// present in `packet` after it.
fn parse_header(packet: &[u8], config: &CodecConfig) -> Result<(Header, usize)> {
    let strict = config.strict_minimal_varints;
    let mut pos = 0;

    let frame_type = stream_frame_type(next_varint(packet, &mut pos, strict, "frame type")?)?;
    let stream_id = StreamId::from_raw(next_varint(packet, &mut pos, strict, "stream id")?);
    let offset = if frame_type.has_offset() {
        next_varint(packet, &mut pos, strict, "stream offset")?
    } else {
        0
    };
    let available = (packet.len() - pos) as u64;
    let data_len = if frame_type.has_length() {
        next_varint(packet, &mut pos, strict, "stream length")?
    } else {
        available
    };

    let header = Header::checked(frame_type, stream_id, offset, data_len, config)?;
    let available = (packet.len() - pos) as u64;
    if header.data_len > available {
        return Err(truncated_data(header.data_len, available));
    }
    Ok((header, pos))
}

fn next_varint(packet: &[u8], pos: &mut usize, strict: bool, field: &'static str) -> Result<u64> {
    let rest = &packet[*pos..];
    let decoded = if strict {
        varint::decode_minimal(rest)
    } else {
        varint::decode(rest)
    };
    let (value, consumed) = decoded.map_err(|e| {
        if e.is_truncation() {
            Error::Truncated(field)
        } else {
            e
        }
    })?;
    *pos += consumed;
    Ok(value)
}

fn read_varint<R: BufRead>(reader: &mut R, strict: bool, field: &'static str) -> Result<u64> {
    let (value, consumed) = varint::read(reader).map_err(|e| {
        if e.is_truncation() {
            Error::Truncated(field)
        } else {
            e
        }
    })?;
    let value = value.into_inner();
    if strict && !varint::is_minimal(value, consumed) {
        tracing::debug!(value, width = consumed, "rejecting non-minimal varint");
        return Err(Error::FrameEncoding("non-minimal varint encoding"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OffsetOverflow;
    use crate::stream_id::StreamClass;
    use std::io::Cursor;

    const ALL_TYPES: std::ops::RangeInclusive<u8> = 0x08..=0x0f;

    fn frame_with_type(raw: u8, data: &'static [u8]) -> StreamFrame {
        let frame_type = StreamFrameType::from_raw(raw);
        StreamFrame {
            frame_type,
            stream_id: StreamId::from_raw(4),
            offset: if frame_type.has_offset() {
                VarInt::from_u32(1000)
            } else {
                VarInt::ZERO
            },
            data: Bytes::from_static(data),
        }
    }

    fn wire(frame: &StreamFrame) -> Bytes {
        let mut buf = BytesMut::new();
        frame.encode_to(&mut buf).unwrap();
        buf.freeze()
    }

    #[test]
    fn test_type_bits() {
        let ty = StreamFrameType::new();
        assert_eq!(ty.value(), 0x08);
        assert!(!ty.has_offset() && !ty.has_length() && !ty.is_fin());

        let all = ty.with_offset(true).with_length(true).with_fin(true);
        assert_eq!(all.value(), 0x0f);
        assert!(all.has_offset() && all.has_length() && all.is_fin());
        assert_eq!(all.with_length(false).value(), 0x0d);
        // setters are pure
        assert_eq!(ty.value(), 0x08);

        assert!(!StreamFrameType::from_raw(0x07).is_valid());
        assert!(!StreamFrameType::from_raw(0x10).is_valid());
        assert!(ALL_TYPES.all(|raw| StreamFrameType::from_raw(raw).is_valid()));
        assert_eq!(all.to_string(), "STREAM(0x0f OFF LEN FIN)");
    }

    #[test]
    fn test_flag_table() {
        for raw in ALL_TYPES {
            let ty = StreamFrameType::from_raw(raw);
            assert_eq!(ty.has_offset(), raw & 0x04 != 0);
            assert_eq!(ty.has_length(), raw & 0x02 != 0);
            assert_eq!(ty.is_fin(), raw & 0x01 != 0);
        }
    }

    #[test]
    fn test_all_flag_combinations_roundtrip() {
        for raw in ALL_TYPES {
            let frame = frame_with_type(raw, b"hello");
            let mut buf = wire(&frame);
            let decoded = StreamFrame::decode(&mut buf).unwrap();
            assert_eq!(decoded, frame, "type={raw:#04x}");
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_encode_layout() {
        let frame = StreamFrame::new(StreamId::from_raw(4), VarInt::from_u32(64), Bytes::from_static(b"abc"), true);
        assert_eq!(frame.frame_type.value(), 0x0f);
        let (header, payload) = frame.encode().unwrap();
        assert_eq!(header.as_ref(), &[0x0f, 0x04, 0x40, 0x40, 0x03]);
        assert_eq!(payload.as_ref(), b"abc");
        // payload shares the frame's buffer
        assert_eq!(payload.as_ptr(), frame.data.as_ptr());

        let zero = StreamFrame::new(StreamId::from_raw(0), VarInt::ZERO, Bytes::new(), false);
        let (header, _) = zero.encode().unwrap();
        assert_eq!(header.as_ref(), &[0x0a, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_rejects_invalid_type() {
        let mut frame = frame_with_type(0x0a, b"x");
        frame.frame_type = StreamFrameType::from_raw(0x10);
        assert_eq!(frame.encode(), Err(Error::InvalidFrameType(0x10)));
        frame.frame_type = StreamFrameType::from_raw(0x07);
        assert_eq!(frame.encode(), Err(Error::InvalidFrameType(0x07)));
    }

    #[test]
    fn test_encode_offset_overflow() {
        let at_limit = StreamFrame::new(
            StreamId::from_raw(4),
            VarInt::from_u64(varint::MAX - 3).unwrap(),
            Bytes::from_static(b"abc"),
            false,
        );
        assert!(at_limit.encode().is_ok());
        assert_eq!(at_limit.end_offset().unwrap(), varint::MAX);

        let past = StreamFrame {
            data: Bytes::from_static(b"abcd"),
            ..at_limit
        };
        assert_eq!(past.encode(), Err(Error::IntegerOverflow(varint::MAX + 1)));
    }

    #[test]
    fn test_encode_offset_without_flag() {
        let mut frame = frame_with_type(0x0a, b"x");
        frame.offset = VarInt::from_u32(5);
        assert!(matches!(frame.encode(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let frame = frame_with_type(0x0e, b"hello");
        let mut small = [0u8; 4];
        let mut out = &mut small[..];
        assert!(matches!(frame.encode_to(&mut out), Err(Error::BufferTooSmall { .. })));
    }

    fn overflowing_wire(length: u64) -> Bytes {
        let mut buf = BytesMut::new();
        varint::encode_buf(0x0e, &mut buf).unwrap();
        varint::encode_buf(4, &mut buf).unwrap();
        varint::encode_buf(varint::MAX - 3, &mut buf).unwrap();
        varint::encode_buf(length, &mut buf).unwrap();
        buf.put_slice(&vec![0xaau8; length as usize]);
        buf.freeze()
    }

    #[test]
    fn test_decode_offset_at_ceiling() {
        let mut buf = overflowing_wire(3);
        let frame = StreamFrame::decode(&mut buf).unwrap();
        assert_eq!(frame.end_offset().unwrap(), varint::MAX);
    }

    #[test]
    fn test_decode_offset_overflow() {
        let original = overflowing_wire(4);

        let mut buf = original.clone();
        let err = StreamFrame::decode(&mut buf).unwrap_err();
        assert!(matches!(err, Error::FrameEncoding(_)));
        assert_eq!(buf, original);

        let config = CodecConfig {
            offset_overflow: OffsetOverflow::FlowControl,
            ..Default::default()
        };
        let mut buf = original.clone();
        assert_eq!(
            StreamFrame::decode_with(&mut buf, &config),
            Err(Error::FlowControl {
                offset: varint::MAX - 3,
                length: 4
            })
        );
    }

    #[test]
    fn test_decode_rejects_non_stream_type() {
        let mut buf = Bytes::from_static(&[0x06, 0x00, 0x00]);
        assert_eq!(
            StreamFrame::decode(&mut buf),
            Err(Error::FrameEncoding("not a STREAM frame type"))
        );
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_decode_short_data() {
        // LEN says 5 but only 2 bytes follow
        let mut buf = Bytes::from_static(&[0x0a, 0x04, 0x05, b'h', b'i']);
        let err = StreamFrame::decode(&mut buf).unwrap_err();
        assert!(err.is_truncation());
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_decode_truncated_fields() {
        for bytes in [&[][..], &[0x0c][..], &[0x0c, 0x04][..], &[0x0e, 0x04, 0x01][..]] {
            let mut buf = Bytes::copy_from_slice(bytes);
            let err = StreamFrame::decode(&mut buf).unwrap_err();
            assert!(err.is_truncation(), "{bytes:?}: {err}");
        }
    }

    #[test]
    fn test_decode_leaves_following_frames() {
        let mut buf = BytesMut::new();
        let first = StreamFrame::new(StreamId::from_raw(0), VarInt::ZERO, Bytes::from_static(b"one"), false);
        let second = StreamFrame::new(StreamId::from_raw(4), VarInt::from_u32(3), Bytes::from_static(b"two"), true);
        first.encode_to(&mut buf).unwrap();
        second.encode_to(&mut buf).unwrap();
        buf.put_u8(0x01); // PING

        let mut buf = buf.freeze();
        assert_eq!(StreamFrame::decode(&mut buf).unwrap(), first);
        assert_eq!(StreamFrame::decode(&mut buf).unwrap(), second);
        assert_eq!(buf.as_ref(), &[0x01]);
    }

    #[test]
    fn test_decode_without_length_takes_rest() {
        let mut buf = Bytes::from_static(&[0x08, 0x02, b'a', b'b', b'c']);
        let frame = StreamFrame::decode(&mut buf).unwrap();
        assert_eq!(frame.data.as_ref(), b"abc");
        assert_eq!(frame.stream_id.class(), StreamClass::ClientUni);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_read_data_limit() {
        let config = CodecConfig {
            max_stream_data_len: 2,
            ..Default::default()
        };
        let bytes = [0x0a, 0x04, 0x03, b'a', b'b', b'c'];
        let mut reader = Cursor::new(&bytes[..]);
        assert_eq!(
            StreamFrame::read(&mut reader, bytes.len() as u64, &config),
            Err(Error::FrameEncoding("stream data exceeds configured limit"))
        );

        // buffers already in memory are bounded by their own length
        let mut buf = Bytes::copy_from_slice(&bytes);
        assert_eq!(StreamFrame::decode_with(&mut buf, &config).unwrap().data.as_ref(), b"abc");
        assert!(StreamFrame::parse(&bytes, &config).is_ok());
    }

    #[test]
    fn test_large_payload_roundtrip() {
        let payload = Bytes::from(vec![0x5au8; 70_000]);
        let frame = StreamFrame::new(StreamId::from_raw(8), VarInt::from_u32(1 << 16), payload, true);
        let bytes = wire(&frame);

        let mut buf = bytes.clone();
        assert_eq!(StreamFrame::decode(&mut buf).unwrap(), frame);
        assert!(buf.is_empty());

        let (parsed, consumed) = StreamFrame::parse(&bytes, &CodecConfig::default()).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_strict_minimal_varints() {
        // stream id 4 sent in two bytes
        let bytes = [0x0a, 0x40, 0x04, 0x01, b'x'];
        let strict = CodecConfig {
            strict_minimal_varints: true,
            ..Default::default()
        };
        let (frame, consumed) = StreamFrame::parse(&bytes, &CodecConfig::default()).unwrap();
        assert_eq!(frame.stream_id.value(), 4);
        assert_eq!(consumed, 5);
        assert!(StreamFrame::parse(&bytes, &strict).is_err());
        assert!(StreamFrame::read(&mut Cursor::new(&bytes[..]), 5, &strict).is_err());
    }

    #[test]
    fn test_parse_slice() {
        let frame = frame_with_type(0x0e, b"payload");
        let bytes = wire(&frame);
        let (decoded, consumed) = StreamFrame::parse(&bytes, &CodecConfig::default()).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_read_all_flag_combinations() {
        for raw in ALL_TYPES {
            let frame = frame_with_type(raw, b"reader");
            let bytes = wire(&frame);
            let mut reader = Cursor::new(bytes.to_vec());
            let decoded = StreamFrame::read(&mut reader, bytes.len() as u64, &CodecConfig::default()).unwrap();
            assert_eq!(decoded, frame, "type={raw:#04x}");
            assert_eq!(reader.position(), bytes.len() as u64);
        }
    }

    #[test]
    fn test_read_respects_packet_bound() {
        // frame without LEN followed by bytes of the next packet
        let bytes = [0x08, 0x00, b'a', b'b', 0xff, 0xff];
        let mut reader = Cursor::new(&bytes[..]);
        let frame = StreamFrame::read(&mut reader, 4, &CodecConfig::default()).unwrap();
        assert_eq!(frame.data.as_ref(), b"ab");
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_read_length_past_bound() {
        let bytes = [0x0a, 0x00, 0x04, b'a', b'b', b'c', b'd'];
        let mut reader = Cursor::new(&bytes[..]);
        let err = StreamFrame::read(&mut reader, 5, &CodecConfig::default()).unwrap_err();
        assert!(err.is_truncation());

        // bound larger than what the reader actually holds
        let mut reader = Cursor::new(&bytes[..5]);
        let err = StreamFrame::read(&mut reader, 7, &CodecConfig::default()).unwrap_err();
        assert!(err.is_truncation());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn roundtrip(
                raw in 0x08u8..=0x0f,
                stream_id in 0u64..=varint::MAX,
                offset in 0u64..(1u64 << 40),
                data in proptest::collection::vec(any::<u8>(), 0..64),
            ) {
                let frame_type = StreamFrameType::from_raw(raw);
                let frame = StreamFrame {
                    frame_type,
                    stream_id: StreamId::from_raw(stream_id),
                    offset: if frame_type.has_offset() { VarInt::from_u64(offset).unwrap() } else { VarInt::ZERO },
                    data: Bytes::from(data),
                };
                let mut buf = wire(&frame);
                prop_assert_eq!(StreamFrame::decode(&mut buf).unwrap(), frame);
            }
        }
    }
}
