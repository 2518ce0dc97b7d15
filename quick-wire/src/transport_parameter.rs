//! # Transport Parameters (RFC 9000 Section 18)
//!
//! Transport parameters are exchanged during the TLS handshake to
//! configure connection behavior. Each parameter is encoded as a
//! type-length-value (TLV) tuple:
//!
//! ```text
//! Transport Parameter {
//!   Transport Parameter ID (i),
//!   Transport Parameter Length (i),
//!   Transport Parameter Value (..),
//! }
//! ```
//!
//! Only the framing lives here. Values are kept as opaque bytes; what they
//! mean is up to the handshake layer.

#![forbid(unsafe_code)]

use core::fmt;

use bytes::{Buf, BufMut, Bytes};

use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::varint;

/// Transport Parameter ID (RFC 9000 Section 18.2)
///
/// IDs outside the registered set are legal on the wire and must be ignored
/// by the receiver, so any 62-bit value can be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransportParameterId(u64);

impl TransportParameterId {
    pub const ORIGINAL_DESTINATION_CONNECTION_ID: Self = Self(0x00);
    pub const MAX_IDLE_TIMEOUT: Self = Self(0x01);
    pub const STATELESS_RESET_TOKEN: Self = Self(0x02);
    pub const MAX_UDP_PAYLOAD_SIZE: Self = Self(0x03);
    pub const INITIAL_MAX_DATA: Self = Self(0x04);
    pub const INITIAL_MAX_STREAM_DATA_BIDI_LOCAL: Self = Self(0x05);
    pub const INITIAL_MAX_STREAM_DATA_BIDI_REMOTE: Self = Self(0x06);
    pub const INITIAL_MAX_STREAM_DATA_UNI: Self = Self(0x07);
    pub const INITIAL_MAX_STREAMS_BIDI: Self = Self(0x08);
    pub const INITIAL_MAX_STREAMS_UNI: Self = Self(0x09);
    pub const ACK_DELAY_EXPONENT: Self = Self(0x0a);
    pub const MAX_ACK_DELAY: Self = Self(0x0b);
    pub const DISABLE_ACTIVE_MIGRATION: Self = Self(0x0c);
    pub const PREFERRED_ADDRESS: Self = Self(0x0d);
    pub const ACTIVE_CONNECTION_ID_LIMIT: Self = Self(0x0e);
    pub const INITIAL_SOURCE_CONNECTION_ID: Self = Self(0x0f);
    pub const RETRY_SOURCE_CONNECTION_ID: Self = Self(0x10);

    const NAMES: [&'static str; 17] = [
        "original_destination_connection_id",
        "max_idle_timeout",
        "stateless_reset_token",
        "max_udp_payload_size",
        "initial_max_data",
        "initial_max_stream_data_bidi_local",
        "initial_max_stream_data_bidi_remote",
        "initial_max_stream_data_uni",
        "initial_max_streams_bidi",
        "initial_max_streams_uni",
        "ack_delay_exponent",
        "max_ack_delay",
        "disable_active_migration",
        "preferred_address",
        "active_connection_id_limit",
        "initial_source_connection_id",
        "retry_source_connection_id",
    ];

    /// Wrap a raw ID.
    ///
    /// # Errors
    ///
    /// `IntegerOverflow` if `id` exceeds 2^62 - 1.
    pub fn new(id: u64) -> Result<Self> {
        if varint::is_overflowing(id) {
            return Err(Error::IntegerOverflow(id));
        }
        Ok(Self(id))
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Registered name, or `None` for an unregistered ID.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMES.get(usize::try_from(self.0).ok()?).copied()
    }

    /// Reserved IDs of the form `31 * N + 27` (RFC 9000 Section 18.1).
    pub fn is_reserved(self) -> bool {
        self.0 % 31 == 27
    }
}

impl fmt::Display for TransportParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unknown({:#x})", self.0),
        }
    }
}

impl TryFrom<u64> for TransportParameterId {
    type Error = Error;

    fn try_from(id: u64) -> Result<Self> {
        Self::new(id)
    }
}

/// One transport parameter record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportParameter {
    pub id: TransportParameterId,
    pub value: Bytes,
}

impl TransportParameter {
    pub fn new(id: TransportParameterId, value: impl Into<Bytes>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }

    /// Length field; always the value's length.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Size of the encoded record.
    pub fn encoded_len(&self) -> Result<usize> {
        Ok(varint::encoded_len(self.id.0)?
            + varint::encoded_len(self.value.len() as u64)?
            + self.value.len())
    }

    /// Write `ID Length Value` to `buf`.
    ///
    /// Nothing is written if the record cannot be encoded.
    pub fn encode_buf<B: BufMut>(&self, buf: &mut B) -> Result<usize> {
        let needed = self.encoded_len()?;
        if buf.remaining_mut() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                available: buf.remaining_mut(),
            });
        }
        varint::encode_buf(self.id.0, buf)?;
        varint::encode_buf(self.value.len() as u64, buf)?;
        buf.put_slice(&self.value);
        Ok(needed)
    }

    /// Decode one record from the front of `buf`.
    ///
    /// On success `buf` is advanced past the record and the value shares its
    /// memory. On failure `buf` is left untouched.
    ///
    /// # Errors
    ///
    /// `TransportParameter` if any field is malformed or the value is shorter
    /// than its Length.
    pub fn decode_buf(buf: &mut Bytes) -> Result<Self> {
        Self::decode_with(buf, &CodecConfig::default())
    }

    /// [`TransportParameter::decode_buf`] with an explicit configuration.
    pub fn decode_with(buf: &mut Bytes, config: &CodecConfig) -> Result<Self> {
        let mut cursor = buf.clone();
        let id = read_field(&mut cursor, config, "truncated transport parameter id")?;
        let length = read_field(&mut cursor, config, "truncated transport parameter length")?;
        if length > cursor.remaining() as u64 {
            tracing::debug!(
                id,
                length,
                available = cursor.remaining(),
                "transport parameter value runs past the end of the buffer"
            );
            return Err(Error::TransportParameter("truncated transport parameter value"));
        }
        let value = cursor.split_to(length as usize);
        *buf = cursor;
        Ok(Self {
            id: TransportParameterId(id),
            value,
        })
    }
}

fn read_field(cursor: &mut Bytes, config: &CodecConfig, truncated: &'static str) -> Result<u64> {
    let (value, width) = varint::decode_buf_with_len(cursor).map_err(|e| {
        tracing::debug!(error = %e, "malformed transport parameter field");
        Error::TransportParameter(truncated)
    })?;
    if config.strict_minimal_varints && !varint::is_minimal(value, width) {
        tracing::debug!(value, width, "rejecting non-minimal varint");
        return Err(Error::TransportParameter("non-minimal varint encoding"));
    }
    Ok(value)
}

/// Ordered list of transport parameter records, as sent in the TLS
/// `quic_transport_parameters` extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportParameters {
    params: Vec<TransportParameter>,
}

impl TransportParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Later records with the same ID do not replace
    /// earlier ones.
    pub fn push(&mut self, param: TransportParameter) {
        self.params.push(param);
    }

    /// First record with `id`.
    pub fn get(&self, id: TransportParameterId) -> Option<&TransportParameter> {
        self.params.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: TransportParameterId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransportParameter> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Encode every record in order.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<usize> {
        let needed = self
            .params
            .iter()
            .try_fold(0usize, |acc, p| Ok::<_, Error>(acc + p.encoded_len()?))?;
        if buf.remaining_mut() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                available: buf.remaining_mut(),
            });
        }
        for param in &self.params {
            param.encode_buf(buf)?;
        }
        Ok(needed)
    }

    /// Decode records until `buf` is exhausted.
    ///
    /// # Errors
    ///
    /// `TransportParameter` for a malformed record, or for a repeated ID when
    /// `config.reject_duplicate_transport_parameters` is set (RFC 9000
    /// Section 7.4).
    pub fn decode_all(buf: &mut Bytes, config: &CodecConfig) -> Result<Self> {
        let mut cursor = buf.clone();
        let mut params = Self::new();
        while cursor.has_remaining() {
            let param = TransportParameter::decode_with(&mut cursor, config)?;
            if config.reject_duplicate_transport_parameters && params.contains(param.id) {
                tracing::debug!(id = param.id.value(), "duplicate transport parameter");
                return Err(Error::TransportParameter("duplicate transport parameter"));
            }
            params.push(param);
        }
        *buf = cursor;
        Ok(params)
    }
}

impl FromIterator<TransportParameter> for TransportParameters {
    fn from_iter<I: IntoIterator<Item = TransportParameter>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TransportParameters {
    type Item = &'a TransportParameter;
    type IntoIter = core::slice::Iter<'a, TransportParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
