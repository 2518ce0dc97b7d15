//! # Packet Number Encoding/Decoding (RFC 9000 Section 17.1)
//!
//! Packet numbers use **truncated encoding** to minimize overhead. Instead of sending
//! the full 62-bit value, only the least significant bytes needed to
//! disambiguate the packet number from what the peer has acknowledged are sent.
//!
//! ## Encoding Algorithm (RFC 9000 Section A.2)
//!
//! ```text
//! num_unacked = full_pn - largest_acked      (full_pn + 1 if nothing acked)
//! num_bytes   = smallest n in 1..=4 with num_unacked <= 2^(8n - 1)
//! ```
//!
//! The receiver accepts any value within half a window of what it expects, so
//! the gap must fit in `8n - 1` bits for the reconstruction to land on
//! `full_pn`.
//!
//! ## Decoding Algorithm (RFC 9000 Section A.3)
//!
//! ```text
//! expected  = largest_pn + 1
//! win       = 2^(8 * len), hwin = win / 2
//! candidate = (expected & !(win - 1)) | truncated
//! candidate + win   if candidate <= expected - hwin and candidate < 2^62 - win
//! candidate - win   if candidate >  expected + hwin and candidate >= win
//! candidate         otherwise
//! ```

#![forbid(unsafe_code)]

use bytes::BufMut;

use super::PacketNumber;
use crate::error::{Error, Result};

/// Maximum packet number value (2^62 - 1)
pub const MAX_PACKET_NUMBER: u64 = (1u64 << 62) - 1;

/// Widest truncated encoding carried in a packet header.
pub const MAX_PACKET_NUMBER_LEN: usize = 4;

/// Truncated packet number as it appears on the wire (1-4 bytes, big-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncatedPacketNumber {
    bytes: [u8; MAX_PACKET_NUMBER_LEN],
    len: usize,
}

impl TruncatedPacketNumber {
    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[MAX_PACKET_NUMBER_LEN - self.len..]
    }

    /// Encoded width in bytes (1-4).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a truncated packet number holds at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Truncated value as an integer.
    pub fn value(&self) -> u64 {
        self.as_bytes()
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64)
    }

    /// Append the encoded bytes to `buf`.
    pub fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self.as_bytes());
    }
}

impl AsRef<[u8]> for TruncatedPacketNumber {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn check_range(pn: PacketNumber) -> Result<()> {
    if pn > MAX_PACKET_NUMBER {
        return Err(Error::IntegerOverflow(pn));
    }
    Ok(())
}

/// Number of packets between the peer's acknowledgement and `full_pn`.
fn num_unacked(full_pn: PacketNumber, largest_acked: Option<PacketNumber>) -> Result<u64> {
    check_range(full_pn)?;
    match largest_acked {
        Some(largest) => {
            check_range(largest)?;
            full_pn
                .checked_sub(largest)
                .ok_or(Error::InvalidInput("largest acknowledged packet number is ahead of the packet number"))
        }
        // Nothing acknowledged yet: every packet since the start of the space is in flight.
        None => Ok(full_pn + 1),
    }
}

/// Number of bytes needed to send `full_pn` (RFC 9000 Appendix A.2)
///
/// # Arguments
/// * `full_pn` - The full packet number to encode
/// * `largest_acked` - The largest packet number acknowledged by the peer, if any
///
/// # Errors
/// `IntegerOverflow` if either argument exceeds 2^62 - 1 or the gap needs more
/// than 4 bytes, `InvalidInput` if `largest_acked` is ahead of `full_pn`.
pub fn encoded_len(full_pn: PacketNumber, largest_acked: Option<PacketNumber>) -> Result<usize> {
    let unacked = num_unacked(full_pn, largest_acked)?;

    (1..=MAX_PACKET_NUMBER_LEN)
        .find(|&n| unacked <= 1u64 << (8 * n - 1))
        .ok_or_else(|| {
            tracing::debug!(full_pn, ?largest_acked, unacked, "packet number gap exceeds 4-byte window");
            Error::IntegerOverflow(unacked)
        })
}

/// Encode a packet number using truncated encoding (RFC 9000 Appendix A.2)
///
/// Both arguments must come from the same packet number space.
pub fn encode(
    full_pn: PacketNumber,
    largest_acked: Option<PacketNumber>,
) -> Result<TruncatedPacketNumber> {
    let len = encoded_len(full_pn, largest_acked)?;
    let be = full_pn.to_be_bytes();
    let mut bytes = [0u8; MAX_PACKET_NUMBER_LEN];
    bytes.copy_from_slice(&be[8 - MAX_PACKET_NUMBER_LEN..]);
    Ok(TruncatedPacketNumber { bytes, len })
}

/// Decode a truncated packet number to its full value (RFC 9000 Appendix A.3)
///
/// # Arguments
/// * `truncated` - The 1-4 packet number bytes from the (unprotected) header
/// * `largest_pn` - The largest packet number successfully processed in this space, if any
///
/// # Errors
/// `InvalidInput` if `truncated` is not 1-4 bytes long, `IntegerOverflow` if
/// `largest_pn` exceeds 2^62 - 1 or the reconstructed value would.
pub fn decode(truncated: &[u8], largest_pn: Option<PacketNumber>) -> Result<PacketNumber> {
    if truncated.is_empty() || truncated.len() > MAX_PACKET_NUMBER_LEN {
        return Err(Error::InvalidInput("truncated packet number must be 1 to 4 bytes"));
    }
    let expected_pn = match largest_pn {
        Some(largest) => {
            check_range(largest)?;
            largest + 1
        }
        None => 0,
    };
    let value = truncated
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64);
    decode_value(value, truncated.len() * 8, expected_pn)
}

/// Reconstruct a full packet number from an already-parsed truncated value.
///
/// # Arguments
/// * `truncated_pn` - The truncated packet number from the packet header
/// * `pn_nbits` - Number of bits in the truncated encoding (8, 16, 24, or 32)
/// * `expected_pn` - The expected next packet number (typically largest_received + 1)
///
/// # Errors
///
/// `InvalidInput` if `pn_nbits` is not 8, 16, 24, or 32. `IntegerOverflow` if
/// `expected_pn` exceeds 2^62, or if the only value the truncated bits can
/// stand for lies above 2^62 - 1.
pub fn decode_value(
    truncated_pn: u64,
    pn_nbits: usize,
    expected_pn: PacketNumber,
) -> Result<PacketNumber> {
    if !matches!(pn_nbits, 8 | 16 | 24 | 32) {
        return Err(Error::InvalidInput("packet number length must be 8, 16, 24 or 32 bits"));
    }

    if expected_pn > MAX_PACKET_NUMBER + 1 {
        return Err(Error::IntegerOverflow(expected_pn));
    }

    let pn_win = 1u64 << pn_nbits;
    let pn_hwin = pn_win / 2;
    let pn_mask = pn_win - 1;

    let candidate = (expected_pn & !pn_mask) | (truncated_pn & pn_mask);

    // The result must lie within half a window of expected_pn and never
    // leave the 62-bit space.
    let full_pn = if candidate + pn_hwin <= expected_pn && candidate < (1u64 << 62) - pn_win {
        candidate + pn_win
    } else if candidate > expected_pn + pn_hwin && candidate >= pn_win {
        candidate - pn_win
    } else {
        candidate
    };
    if full_pn > MAX_PACKET_NUMBER {
        tracing::debug!(
            truncated_pn,
            expected_pn,
            full_pn,
            "packet number decodes past 2^62 - 1"
        );
        return Err(Error::IntegerOverflow(full_pn));
    }
    Ok(full_pn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_len() {
        // No packets acked yet
        assert_eq!(encoded_len(0, None).unwrap(), 1);
        assert_eq!(encoded_len(127, None).unwrap(), 1);
        assert_eq!(encoded_len(128, None).unwrap(), 2);

        // Equal values
        assert_eq!(encoded_len(100, Some(100)).unwrap(), 1);

        // Small gap
        assert_eq!(encoded_len(100, Some(99)).unwrap(), 1);

        // Larger gap requiring 2 bytes
        assert_eq!(encoded_len(1000, Some(500)).unwrap(), 2);

        // Half-window boundaries
        assert_eq!(encoded_len(228, Some(100)).unwrap(), 1);
        assert_eq!(encoded_len(229, Some(100)).unwrap(), 2);
        assert_eq!(encoded_len(1 << 31, Some(0)).unwrap(), 4);
    }

    #[test]
    fn test_rfc9000_example_encoding() {
        // RFC 9000 Appendix A.2
        let encoded = encode(0xac5c02, Some(0xabe8b3)).unwrap();
        assert_eq!(encoded.as_bytes(), &[0x5c, 0x02]);

        let encoded = encode(0xace8fe, Some(0xabe8b3)).unwrap();
        assert_eq!(encoded.as_bytes(), &[0xac, 0xe8, 0xfe]);
    }

    #[test]
    fn test_rfc9000_example_decoding() {
        // RFC 9000 Appendix A.3
        assert_eq!(decode(&[0x9b, 0x32], Some(0xa82f30ea)).unwrap(), 0xa82f9b32);
    }

    #[test]
    fn test_decode_value() {
        // Expected PN = 10, received truncated PN = 11 (8 bits)
        assert_eq!(decode_value(11, 8, 10).unwrap(), 11);

        // Expected PN = 1000, received truncated PN with wrapping
        let truncated = 1005 & 0xFF;
        assert_eq!(decode_value(truncated, 8, 1000).unwrap(), 1005);

        // Late packet from the previous window
        assert_eq!(decode_value(0xff, 8, 0x101).unwrap(), 0xff);

        assert!(decode_value(1, 12, 0).is_err());
    }

    #[test]
    fn test_decode_near_ceiling_does_not_leave_space() {
        let expected = MAX_PACKET_NUMBER;
        let decoded = decode_value(0x00, 8, expected).unwrap();
        assert!(decoded <= MAX_PACKET_NUMBER);
    }

    #[test]
    fn test_decode_rejects_values_past_ceiling() {
        // Nothing above MAX_PACKET_NUMBER can follow it.
        assert_eq!(
            decode(&[0x05], Some(MAX_PACKET_NUMBER)),
            Err(Error::IntegerOverflow(MAX_PACKET_NUMBER + 6))
        );
        assert!(decode(&[0x00, 0x00, 0x00, 0x01], Some(MAX_PACKET_NUMBER)).is_err());
        // The low window still resolves below the ceiling.
        assert_eq!(decode(&[0xff], Some(MAX_PACKET_NUMBER)).unwrap(), MAX_PACKET_NUMBER);
        assert_eq!(decode(&[0xfe], Some(MAX_PACKET_NUMBER)).unwrap(), MAX_PACKET_NUMBER - 1);
    }

    #[test]
    fn test_decode_value_rejects_expected_out_of_range() {
        assert_eq!(decode_value(0xff, 8, u64::MAX), Err(Error::IntegerOverflow(u64::MAX)));
        assert_eq!(
            decode_value(0x00, 32, MAX_PACKET_NUMBER + 2),
            Err(Error::IntegerOverflow(MAX_PACKET_NUMBER + 2))
        );
        assert_eq!(decode_value(0xff, 8, MAX_PACKET_NUMBER + 1).unwrap(), MAX_PACKET_NUMBER);
    }

    #[test]
    fn test_roundtrip_pairs() {
        let cases: &[(u64, Option<u64>)] = &[
            (0xac5c02, Some(0xabe8b3)),
            (0, None),
            (1, None),
            (200, None),
            (77, Some(77)),
            (1130, Some(1000)),
            (0x1_0000_0000, Some(0xffff_ff00)),
            (MAX_PACKET_NUMBER, Some(MAX_PACKET_NUMBER - 1)),
        ];
        for &(full_pn, largest) in cases {
            let encoded = encode(full_pn, largest).unwrap();
            assert_eq!(
                decode(encoded.as_bytes(), largest).unwrap(),
                full_pn,
                "full_pn={full_pn:#x} largest={largest:?}"
            );
        }
    }

    #[test]
    fn test_encode_rejects_overflow() {
        assert_eq!(
            encode(MAX_PACKET_NUMBER + 1, None),
            Err(Error::IntegerOverflow(MAX_PACKET_NUMBER + 1))
        );
        assert!(encode(5, Some(MAX_PACKET_NUMBER + 1)).is_err());
        // Gap too wide for a 4-byte window
        assert!(encode(1 << 40, Some(0)).is_err());
        assert!(encode(3, Some(4)).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        assert!(decode(&[], None).is_err());
        assert!(decode(&[0; 5], None).is_err());
    }

    #[test]
    fn test_truncated_value() {
        let encoded = encode(0xac5c02, Some(0xabe8b3)).unwrap();
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded.value(), 0x5c02);
        let mut out = Vec::new();
        encoded.write(&mut out);
        assert_eq!(out, [0x5c, 0x02]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn roundtrip_within_window(largest in 0u64..(1u64 << 40), gap in 0u64..(1u64 << 31)) {
                let full_pn = largest + gap;
                let encoded = encode(full_pn, Some(largest)).unwrap();
                prop_assert_eq!(decode(encoded.as_bytes(), Some(largest)).unwrap(), full_pn);
            }
        }
    }
}
