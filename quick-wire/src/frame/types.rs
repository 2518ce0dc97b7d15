//! # Frame Type Registry (RFC 9000 Section 12.4, 19)
//!
//! The first varint of each frame identifies its type. Several frames occupy
//! a small range of type values whose low bits carry flags, so classification
//! collapses each range to a single [`FrameTag`] while keeping the raw value.

#![forbid(unsafe_code)]

use core::fmt;
use std::io::BufRead;

use bytes::Buf;

use crate::error::{Error, Result};
use crate::varint;

/// Frame Type Constants (RFC 9000 Section 19)
pub const FRAME_TYPE_PADDING: u64 = 0x00;
pub const FRAME_TYPE_PING: u64 = 0x01;
pub const FRAME_TYPE_ACK: u64 = 0x02;
pub const FRAME_TYPE_ACK_ECN: u64 = 0x03;
pub const FRAME_TYPE_RESET_STREAM: u64 = 0x04;
pub const FRAME_TYPE_STOP_SENDING: u64 = 0x05;
pub const FRAME_TYPE_CRYPTO: u64 = 0x06;
pub const FRAME_TYPE_NEW_TOKEN: u64 = 0x07;
pub const FRAME_TYPE_STREAM: u64 = 0x08; // 0x08-0x0f
pub const FRAME_TYPE_STREAM_MAX: u64 = 0x0f;
pub const FRAME_TYPE_MAX_DATA: u64 = 0x10;
pub const FRAME_TYPE_MAX_STREAM_DATA: u64 = 0x11;
pub const FRAME_TYPE_MAX_STREAMS_BIDI: u64 = 0x12;
pub const FRAME_TYPE_MAX_STREAMS_UNI: u64 = 0x13;
pub const FRAME_TYPE_DATA_BLOCKED: u64 = 0x14;
pub const FRAME_TYPE_STREAM_DATA_BLOCKED: u64 = 0x15;
pub const FRAME_TYPE_STREAMS_BLOCKED_BIDI: u64 = 0x16;
pub const FRAME_TYPE_STREAMS_BLOCKED_UNI: u64 = 0x17;
pub const FRAME_TYPE_NEW_CONNECTION_ID: u64 = 0x18;
pub const FRAME_TYPE_RETIRE_CONNECTION_ID: u64 = 0x19;
pub const FRAME_TYPE_PATH_CHALLENGE: u64 = 0x1a;
pub const FRAME_TYPE_PATH_RESPONSE: u64 = 0x1b;
pub const FRAME_TYPE_CONNECTION_CLOSE_TRANSPORT: u64 = 0x1c;
pub const FRAME_TYPE_CONNECTION_CLOSE_APPLICATION: u64 = 0x1d;
pub const FRAME_TYPE_HANDSHAKE_DONE: u64 = 0x1e;

/// Closed set of frame kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameTag {
    /// 0x00
    Padding,
    /// 0x01
    Ping,
    /// 0x02-0x03
    Ack,
    /// 0x04
    ResetStream,
    /// 0x05
    StopSending,
    /// 0x06
    Crypto,
    /// 0x07
    NewToken,
    /// 0x08-0x0f, flags in the low 3 bits
    Stream,
    /// 0x10
    MaxData,
    /// 0x11
    MaxStreamData,
    /// 0x12-0x13
    MaxStreams,
    /// 0x14
    DataBlocked,
    /// 0x15
    StreamDataBlocked,
    /// 0x16-0x17
    StreamsBlocked,
    /// 0x18
    NewConnectionId,
    /// 0x19
    RetireConnectionId,
    /// 0x1a
    PathChallenge,
    /// 0x1b
    PathResponse,
    /// 0x1c-0x1d
    ConnectionClose,
    /// 0x1e
    HandshakeDone,
}

impl FrameTag {
    /// Map a raw frame type value to its tag.
    ///
    /// # Errors
    ///
    /// `FrameEncoding` for any value outside 0x00-0x1e.
    pub fn classify(raw: u64) -> Result<Self> {
        let tag = match raw {
            FRAME_TYPE_PADDING => FrameTag::Padding,
            FRAME_TYPE_PING => FrameTag::Ping,
            FRAME_TYPE_ACK | FRAME_TYPE_ACK_ECN => FrameTag::Ack,
            FRAME_TYPE_RESET_STREAM => FrameTag::ResetStream,
            FRAME_TYPE_STOP_SENDING => FrameTag::StopSending,
            FRAME_TYPE_CRYPTO => FrameTag::Crypto,
            FRAME_TYPE_NEW_TOKEN => FrameTag::NewToken,
            FRAME_TYPE_STREAM..=FRAME_TYPE_STREAM_MAX => FrameTag::Stream,
            FRAME_TYPE_MAX_DATA => FrameTag::MaxData,
            FRAME_TYPE_MAX_STREAM_DATA => FrameTag::MaxStreamData,
            FRAME_TYPE_MAX_STREAMS_BIDI | FRAME_TYPE_MAX_STREAMS_UNI => FrameTag::MaxStreams,
            FRAME_TYPE_DATA_BLOCKED => FrameTag::DataBlocked,
            FRAME_TYPE_STREAM_DATA_BLOCKED => FrameTag::StreamDataBlocked,
            FRAME_TYPE_STREAMS_BLOCKED_BIDI | FRAME_TYPE_STREAMS_BLOCKED_UNI => {
                FrameTag::StreamsBlocked
            }
            FRAME_TYPE_NEW_CONNECTION_ID => FrameTag::NewConnectionId,
            FRAME_TYPE_RETIRE_CONNECTION_ID => FrameTag::RetireConnectionId,
            FRAME_TYPE_PATH_CHALLENGE => FrameTag::PathChallenge,
            FRAME_TYPE_PATH_RESPONSE => FrameTag::PathResponse,
            FRAME_TYPE_CONNECTION_CLOSE_TRANSPORT | FRAME_TYPE_CONNECTION_CLOSE_APPLICATION => {
                FrameTag::ConnectionClose
            }
            FRAME_TYPE_HANDSHAKE_DONE => FrameTag::HandshakeDone,
            _ => {
                tracing::debug!(frame_type = raw, "unknown frame type");
                return Err(Error::FrameEncoding("unknown frame type"));
            }
        };
        Ok(tag)
    }

    /// Protocol name, e.g. `STREAM`.
    pub fn name(self) -> &'static str {
        match self {
            FrameTag::Padding => "PADDING",
            FrameTag::Ping => "PING",
            FrameTag::Ack => "ACK",
            FrameTag::ResetStream => "RESET_STREAM",
            FrameTag::StopSending => "STOP_SENDING",
            FrameTag::Crypto => "CRYPTO",
            FrameTag::NewToken => "NEW_TOKEN",
            FrameTag::Stream => "STREAM",
            FrameTag::MaxData => "MAX_DATA",
            FrameTag::MaxStreamData => "MAX_STREAM_DATA",
            FrameTag::MaxStreams => "MAX_STREAMS",
            FrameTag::DataBlocked => "DATA_BLOCKED",
            FrameTag::StreamDataBlocked => "STREAM_DATA_BLOCKED",
            FrameTag::StreamsBlocked => "STREAMS_BLOCKED",
            FrameTag::NewConnectionId => "NEW_CONNECTION_ID",
            FrameTag::RetireConnectionId => "RETIRE_CONNECTION_ID",
            FrameTag::PathChallenge => "PATH_CHALLENGE",
            FrameTag::PathResponse => "PATH_RESPONSE",
            FrameTag::ConnectionClose => "CONNECTION_CLOSE",
            FrameTag::HandshakeDone => "HANDSHAKE_DONE",
        }
    }

    /// ACK, PADDING and CONNECTION_CLOSE do not elicit acknowledgements (RFC 9002 Section 2).
    pub fn is_ack_eliciting(self) -> bool {
        !matches!(self, FrameTag::Ack | FrameTag::Padding | FrameTag::ConnectionClose)
    }
}

impl fmt::Display for FrameTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified frame type together with the raw value it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameType {
    pub tag: FrameTag,
    pub raw: u64,
}

impl FrameType {
    /// Classify `raw`.
    pub fn new(raw: u64) -> Result<Self> {
        Ok(Self {
            tag: FrameTag::classify(raw)?,
            raw,
        })
    }
}

/// Classify a raw frame type value.
pub fn classify(raw: u64) -> Result<FrameTag> {
    FrameTag::classify(raw)
}

/// Read and classify the leading frame type varint from a buffer.
///
/// # Errors
///
/// Any varint or classification failure is reported as `FrameEncoding`.
pub fn read_type<B: Buf>(buf: &mut B) -> Result<FrameType> {
    let raw = varint::decode_buf(buf)
        .map_err(|_| Error::Truncated("frame type"))?;
    FrameType::new(raw)
}

/// Read and classify the leading frame type varint from a reader.
///
/// # Errors
///
/// Any read, varint or classification failure is reported as `FrameEncoding`.
pub fn read_type_from<R: BufRead + ?Sized>(reader: &mut R) -> Result<FrameType> {
    let (raw, _) = varint::read(reader)
        .map_err(|_| Error::Truncated("frame type"))?;
    FrameType::new(raw.into_inner())
}
