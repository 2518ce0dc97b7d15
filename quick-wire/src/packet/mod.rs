//! Packet numbers and packet number spaces.

pub mod header;
pub mod number;

pub use header::{FirstByte, PacketType};
pub use number::{TruncatedPacketNumber, MAX_PACKET_NUMBER, MAX_PACKET_NUMBER_LEN};

/// Packet Number - Monotonically increasing per packet number space
///
/// Packet numbers are 62-bit integers (0 to 2^62-1). "Nothing acknowledged
/// yet" is expressed as `Option::None` wherever a largest acknowledged packet
/// number is taken.
pub type PacketNumber = u64;

/// Packet Number Space (RFC 9000 Section 12.3)
///
/// Packet numbers and acknowledgements are only comparable within one space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketNumberSpace {
    /// Initial packet space (Initial packets)
    Initial = 0,
    /// Handshake packet space (Handshake packets)
    Handshake = 1,
    /// Application data packet space (0-RTT and 1-RTT packets)
    ApplicationData = 2,
}

impl PacketNumberSpace {
    /// All spaces in handshake order.
    pub const ALL: [PacketNumberSpace; 3] = [
        PacketNumberSpace::Initial,
        PacketNumberSpace::Handshake,
        PacketNumberSpace::ApplicationData,
    ];
}
