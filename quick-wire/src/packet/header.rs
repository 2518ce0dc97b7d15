//! # Packet Header First Byte (RFC 9000 Section 17, RFC 8999)
//!
//! Only the first byte is handled here: header form, fixed bit, long packet
//! type and the packet number length bits. Everything behind it is protected
//! by the packet-protection layer.
//!
//! ```text
//! Long Header:  1 1 T T R R P P    (T = type, R = reserved, P = pn length - 1)
//! Short Header: 0 1 S R R K P P    (S = spin, K = key phase)
//! ```

#![forbid(unsafe_code)]

use super::PacketNumberSpace;
use crate::error::{Error, Result};

/// Header Form Bit (most significant bit)
/// 1 = Long Header, 0 = Short Header
pub const HEADER_FORM_BIT: u8 = 0x80;

/// Fixed Bit (second most significant bit)
/// MUST be set to 1 in all packets except Version Negotiation
pub const FIXED_BIT: u8 = 0x40;

/// Long Packet Type Mask (bits 4-5)
pub const LONG_PACKET_TYPE_MASK: u8 = 0x30;

/// Long Packet Type Values
pub const LONG_PACKET_TYPE_INITIAL: u8 = 0x00;
pub const LONG_PACKET_TYPE_0RTT: u8 = 0x10;
pub const LONG_PACKET_TYPE_HANDSHAKE: u8 = 0x20;
pub const LONG_PACKET_TYPE_RETRY: u8 = 0x30;

/// Spin Bit (Short Header, bit 5)
pub const SPIN_BIT: u8 = 0x20;

/// Key Phase Bit (Short Header, bit 2)
pub const KEY_PHASE_BIT: u8 = 0x04;

/// Packet Number Length Mask (bottom 2 bits)
/// Encodes (packet_number_length - 1)
pub const PACKET_NUMBER_LENGTH_MASK: u8 = 0x03;

/// Packet Type (RFC 9000 Section 17)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Initial packet (Long Header, type 0x0)
    Initial,
    /// 0-RTT packet (Long Header, type 0x1)
    ZeroRtt,
    /// Handshake packet (Long Header, type 0x2)
    Handshake,
    /// Retry packet (Long Header, type 0x3)
    Retry,
    /// 1-RTT packet (Short Header)
    OneRtt,
}

impl PacketType {
    /// Returns true if this is a long header packet type
    pub fn is_long_header(self) -> bool {
        !matches!(self, PacketType::OneRtt)
    }

    /// Retry packets carry no packet number.
    pub fn has_packet_number(self) -> bool {
        !matches!(self, PacketType::Retry)
    }

    /// Get the packet number space for this packet type
    pub fn packet_number_space(self) -> Option<PacketNumberSpace> {
        match self {
            PacketType::Initial => Some(PacketNumberSpace::Initial),
            PacketType::Handshake => Some(PacketNumberSpace::Handshake),
            PacketType::ZeroRtt | PacketType::OneRtt => Some(PacketNumberSpace::ApplicationData),
            PacketType::Retry => None,
        }
    }

    fn long_type_bits(self) -> Option<u8> {
        match self {
            PacketType::Initial => Some(LONG_PACKET_TYPE_INITIAL),
            PacketType::ZeroRtt => Some(LONG_PACKET_TYPE_0RTT),
            PacketType::Handshake => Some(LONG_PACKET_TYPE_HANDSHAKE),
            PacketType::Retry => Some(LONG_PACKET_TYPE_RETRY),
            PacketType::OneRtt => None,
        }
    }
}

/// First byte of a packet header.
///
/// Setters return a new value; the receiver is never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FirstByte(u8);

impl FirstByte {
    /// First byte for a packet of `packet_type` with the fixed bit set and a
    /// 1-byte packet number.
    pub fn new(packet_type: PacketType) -> Self {
        match packet_type.long_type_bits() {
            Some(bits) => Self(HEADER_FORM_BIT | FIXED_BIT | bits),
            None => Self(FIXED_BIT),
        }
    }

    /// Wrap a byte read off the wire.
    pub fn from_raw(byte: u8) -> Self {
        Self(byte)
    }

    /// Raw byte.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Returns true for the long header form.
    pub fn is_long_header(self) -> bool {
        self.0 & HEADER_FORM_BIT != 0
    }

    /// Fixed bit; packets with it cleared are discarded (except Version Negotiation).
    pub fn fixed_bit(self) -> bool {
        self.0 & FIXED_BIT != 0
    }

    /// Packet type announced by this byte.
    pub fn packet_type(self) -> PacketType {
        if !self.is_long_header() {
            return PacketType::OneRtt;
        }
        match self.0 & LONG_PACKET_TYPE_MASK {
            LONG_PACKET_TYPE_INITIAL => PacketType::Initial,
            LONG_PACKET_TYPE_0RTT => PacketType::ZeroRtt,
            LONG_PACKET_TYPE_HANDSHAKE => PacketType::Handshake,
            _ => PacketType::Retry,
        }
    }

    /// Packet number length in bytes (1-4), valid once header protection is removed.
    pub fn packet_number_len(self) -> usize {
        (self.0 & PACKET_NUMBER_LENGTH_MASK) as usize + 1
    }

    /// Same byte with the packet number length bits set for `len` bytes.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `len` is not 1-4 or the packet type carries no packet number.
    pub fn with_packet_number_len(self, len: usize) -> Result<Self> {
        if !(1..=4).contains(&len) {
            return Err(Error::InvalidInput("packet number length must be 1 to 4 bytes"));
        }
        if !self.packet_type().has_packet_number() {
            return Err(Error::InvalidInput("Retry packets carry no packet number"));
        }
        Ok(Self((self.0 & !PACKET_NUMBER_LENGTH_MASK) | (len as u8 - 1)))
    }

    /// Spin bit (short header only).
    pub fn spin(self) -> bool {
        !self.is_long_header() && self.0 & SPIN_BIT != 0
    }

    /// Same byte with the spin bit set or cleared; long headers are returned unchanged.
    pub fn with_spin(self, spin: bool) -> Self {
        if self.is_long_header() {
            return self;
        }
        Self(if spin { self.0 | SPIN_BIT } else { self.0 & !SPIN_BIT })
    }

    /// Key phase bit (short header only).
    pub fn key_phase(self) -> bool {
        !self.is_long_header() && self.0 & KEY_PHASE_BIT != 0
    }

    /// Same byte with the key phase bit set or cleared; long headers are returned unchanged.
    pub fn with_key_phase(self, phase: bool) -> Self {
        if self.is_long_header() {
            return self;
        }
        Self(if phase { self.0 | KEY_PHASE_BIT } else { self.0 & !KEY_PHASE_BIT })
    }
}

impl From<FirstByte> for u8 {
    fn from(b: FirstByte) -> Self {
        b.0
    }
}
