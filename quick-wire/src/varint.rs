//! Variable-length integer encoding per RFC 9000 Section 16.
//!
//! The two most significant bits of the first byte select the encoded width:
//!
//! ```text
//! 2MSB  Length  Usable Bits  Range
//! 00    1       6            0-63
//! 01    2       14           0-16383
//! 10    4       30           0-1073741823
//! 11    8       62           0-4611686018427387903
//! ```
//!
//! Encoders always pick the minimal width. Decoders accept any width unless
//! asked to be strict (see [`decode_minimal`]).

#![forbid(unsafe_code)]

use std::io::{self, BufRead, Read};

use bytes::{Buf, BufMut};
use core::fmt;

use crate::error::{Error, Result};

/// Maximum value that can be encoded (2^62 - 1)
pub const MAX: u64 = (1u64 << 62) - 1;

/// Largest value of each width, indexed by the 2-bit tag.
const WIDTH_LIMITS: [u64; 4] = [63, 16_383, 1_073_741_823, MAX];

/// Tag bits ORed into the first byte, indexed by the 2-bit tag.
const TAG_BITS: [u8; 4] = [0b0000_0000, 0b0100_0000, 0b1000_0000, 0b1100_0000];

/// Unsigned integer constrained to `[0, 2^62 - 1]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarInt(u64);

impl VarInt {
    /// The largest representable value.
    pub const MAX: VarInt = VarInt(MAX);

    /// Zero.
    pub const ZERO: VarInt = VarInt(0);

    /// Construct from a `u64`, rejecting values past the 62-bit ceiling.
    pub fn from_u64(value: u64) -> Result<Self> {
        if value > MAX {
            return Err(Error::IntegerOverflow(value));
        }
        Ok(Self(value))
    }

    /// Construct from a `u32`; always in range.
    pub const fn from_u32(value: u32) -> Self {
        Self(value as u64)
    }

    /// Raw value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Number of bytes the minimal encoding occupies.
    pub fn size(self) -> usize {
        // in range by construction
        width_for(self.0).unwrap_or(8)
    }

    /// Checked addition that stays within the 62-bit ceiling.
    pub fn checked_add(self, rhs: VarInt) -> Option<VarInt> {
        let sum = self.0.checked_add(rhs.0)?;
        (sum <= MAX).then_some(VarInt(sum))
    }

    /// Append the minimal encoding to `buf`.
    pub fn encode<B: BufMut>(self, buf: &mut B) -> Result<usize> {
        encode_buf(self.0, buf)
    }
}

impl From<u8> for VarInt {
    fn from(value: u8) -> Self {
        Self(value as u64)
    }
}

impl From<u32> for VarInt {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl TryFrom<u64> for VarInt {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        Self::from_u64(value)
    }
}

impl TryFrom<usize> for VarInt {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        Self::from_u64(value as u64)
    }
}

impl From<VarInt> for u64 {
    fn from(v: VarInt) -> Self {
        v.0
    }
}

impl fmt::Display for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Returns true if `value` exceeds the 62-bit ceiling.
pub fn is_overflowing(value: u64) -> bool {
    value > MAX
}

fn width_for(value: u64) -> Result<usize> {
    WIDTH_LIMITS
        .iter()
        .position(|&limit| value <= limit)
        .map(|tag| 1 << tag)
        .ok_or(Error::IntegerOverflow(value))
}

/// Width in bytes announced by the tag of `first`.
pub fn width_from_first_byte(first: u8) -> usize {
    1 << (first >> 6)
}

/// Calculate the encoded length of a varint without encoding it.
///
/// # Errors
///
/// Returns `IntegerOverflow` if the value exceeds MAX.
pub fn encoded_len(value: u64) -> Result<usize> {
    width_for(value)
}

/// Returns true if `value` is encoded in the shortest width that holds it.
pub fn is_minimal(value: u64, width: usize) -> bool {
    matches!(width_for(value), Ok(w) if w == width)
}

/// Encode a variable-length integer into a byte buffer.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns `IntegerOverflow` if the value exceeds MAX and `BufferTooSmall` if
/// `buf` cannot hold the encoding. Nothing is written on failure.
pub fn encode(value: u64, buf: &mut [u8]) -> Result<usize> {
    let width = width_for(value)?;
    if buf.len() < width {
        return Err(Error::BufferTooSmall {
            needed: width,
            available: buf.len(),
        });
    }

    let be = value.to_be_bytes();
    buf[..width].copy_from_slice(&be[8 - width..]);
    buf[0] |= TAG_BITS[width.trailing_zeros() as usize];
    Ok(width)
}

/// Encode a variable-length integer into a buffer that implements BufMut.
///
/// # Errors
///
/// Returns error if value exceeds MAX or buffer has insufficient space.
pub fn encode_buf<B: BufMut>(value: u64, buf: &mut B) -> Result<usize> {
    let mut temp = [0u8; 8];
    let written = encode(value, &mut temp)?;
    if buf.remaining_mut() < written {
        return Err(Error::BufferTooSmall {
            needed: written,
            available: buf.remaining_mut(),
        });
    }
    buf.put_slice(&temp[..written]);
    Ok(written)
}

/// Encode into a fresh byte vector.
pub fn to_vec(value: u64) -> Result<Vec<u8>> {
    let mut temp = [0u8; 8];
    let written = encode(value, &mut temp)?;
    Ok(temp[..written].to_vec())
}

/// Decode a variable-length integer from the front of a byte slice.
///
/// Returns the decoded value and the number of bytes consumed. Bytes past the
/// tagged width are left alone.
///
/// # Errors
///
/// Returns `FrameEncoding` if the slice is empty or shorter than the width
/// announced by its first byte.
pub fn decode(data: &[u8]) -> Result<(u64, usize)> {
    let first = *data.first().ok_or(Error::Truncated("varint: empty buffer"))?;
    let width = width_from_first_byte(first);
    if data.len() < width {
        return Err(Error::Truncated("varint"));
    }

    let mut be = [0u8; 8];
    be[8 - width..].copy_from_slice(&data[..width]);
    be[8 - width] &= 0x3f;
    Ok((u64::from_be_bytes(be), width))
}

/// Decode a complete varint byte string.
///
/// # Errors
///
/// Fails if the input is empty, longer than 8 bytes, or its length does not
/// match the width announced by the first byte.
pub fn decode_exact(data: &[u8]) -> Result<VarInt> {
    if data.is_empty() || data.len() > 8 {
        return Err(Error::FrameEncoding("varint byte string must hold 1 to 8 bytes"));
    }
    let (value, consumed) = decode(data)?;
    if consumed != data.len() {
        return Err(Error::FrameEncoding("trailing bytes after varint"));
    }
    Ok(VarInt(value))
}

/// Like [`decode`], but rejects over-long encodings.
pub fn decode_minimal(data: &[u8]) -> Result<(u64, usize)> {
    let (value, consumed) = decode(data)?;
    if !is_minimal(value, consumed) {
        tracing::debug!(value, width = consumed, "rejecting non-minimal varint");
        return Err(Error::FrameEncoding("non-minimal varint encoding"));
    }
    Ok((value, consumed))
}

/// Decode a variable-length integer from a buffer that implements Buf.
///
/// Peeks the first byte, then advances the buffer by exactly the encoded
/// width. On failure the buffer is not advanced.
///
/// # Errors
///
/// Returns `FrameEncoding` if buffer doesn't contain a complete varint.
pub fn decode_buf<B: Buf>(buf: &mut B) -> Result<u64> {
    decode_buf_with_len(buf).map(|(value, _)| value)
}

/// [`decode_buf`] that also reports the number of bytes consumed.
pub fn decode_buf_with_len<B: Buf>(buf: &mut B) -> Result<(u64, usize)> {
    if !buf.has_remaining() {
        return Err(Error::Truncated("varint: empty buffer"));
    }

    let width = width_from_first_byte(buf.chunk()[0]);
    if buf.remaining() < width {
        return Err(Error::Truncated("varint"));
    }

    let mut temp = [0u8; 8];
    buf.copy_to_slice(&mut temp[..width]);
    let (value, consumed) = decode(&temp[..width])?;
    Ok((value, consumed))
}

/// Read a varint from a (possibly blocking) reader.
///
/// The first byte is peeked through `fill_buf` without being consumed, then
/// exactly the announced number of bytes is read. Nothing past the varint is
/// consumed.
///
/// # Errors
///
/// A short read is reported as `FrameEncoding`; other reader failures as `Io`.
pub fn read<R: BufRead + ?Sized>(reader: &mut R) -> Result<(VarInt, usize)> {
    let width = {
        let peeked = reader.fill_buf()?;
        let first = *peeked
            .first()
            .ok_or(Error::Truncated("varint: empty reader"))?;
        width_from_first_byte(first)
    };

    let mut temp = [0u8; 8];
    Read::read_exact(reader, &mut temp[..width]).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::Truncated("varint"),
        _ => Error::from(e),
    })?;
    let (value, consumed) = decode(&temp[..width])?;
    Ok((VarInt(value), consumed))
}

/// Write the minimal encoding of `value` to an `io::Write`.
pub fn write<W: io::Write + ?Sized>(value: u64, writer: &mut W) -> Result<usize> {
    let mut temp = [0u8; 8];
    let written = encode(value, &mut temp)?;
    writer.write_all(&temp[..written])?;
    Ok(written)
}
