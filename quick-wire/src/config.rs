//! Codec configuration.
//!
//! A [`CodecConfig`] selects the few places where RFC 9000 leaves an endpoint
//! a choice. Every field has a default, so an empty TOML document is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;
use crate::varint;

/// Error kind reported when a received STREAM frame's Offset + Length
/// exceeds 2^62 - 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetOverflow {
    /// Report `FRAME_ENCODING_ERROR`.
    #[default]
    FrameEncoding,
    /// Report `FLOW_CONTROL_ERROR` (RFC 9000 Section 19.8).
    FlowControl,
}

impl OffsetOverflow {
    pub(crate) fn to_error(self, offset: u64, length: u64) -> Error {
        match self {
            OffsetOverflow::FrameEncoding => {
                Error::FrameEncoding("stream offset + length exceeds 2^62 - 1")
            }
            OffsetOverflow::FlowControl => Error::FlowControl { offset, length },
        }
    }
}

/// Codec configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Error kind for a STREAM frame whose final offset would exceed 2^62 - 1
    /// (default: `frame_encoding`).
    pub offset_overflow: OffsetOverflow,

    /// Reject varints that are not in their shortest form (default: false).
    ///
    /// RFC 9000 permits over-long encodings except where a frame type says
    /// otherwise, so this is off by default.
    pub strict_minimal_varints: bool,

    /// Reject a transport parameter list that repeats an ID (default: true).
    #[serde(default = "default_true")]
    pub reject_duplicate_transport_parameters: bool,

    /// Largest STREAM payload `StreamFrame::read` allocates for one frame
    /// (default: 65535).
    ///
    /// Only the reader path copies the payload into a new buffer, so only it
    /// checks. In-memory decoders are bounded by the buffer they are given.
    #[serde(default = "default_max_stream_data_len")]
    pub max_stream_data_len: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_stream_data_len() -> u64 {
    u16::MAX as u64
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            offset_overflow: OffsetOverflow::FrameEncoding,
            strict_minimal_varints: false,
            reject_duplicate_transport_parameters: true,
            max_stream_data_len: default_max_stream_data_len(),
        }
    }
}

impl CodecConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CodecConfig =
            toml::from_str(contents).context("Failed to parse codec configuration")?;
        config
            .validate()
            .map_err(|errors| anyhow::anyhow!("Invalid codec configuration: {}", errors.join("; ")))?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize codec configuration")
    }

    /// Validate the configuration.
    ///
    /// Returns `Ok(())` if valid, or a list of error messages if invalid.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_stream_data_len == 0 {
            errors.push("max_stream_data_len must be greater than 0".to_string());
        }
        if self.max_stream_data_len > varint::MAX {
            errors.push(format!(
                "max_stream_data_len ({}) exceeds the varint ceiling ({})",
                self.max_stream_data_len,
                varint::MAX
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
