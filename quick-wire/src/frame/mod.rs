//! # Frame Types and STREAM Frames (RFC 9000 Section 12.4, 19)
//!
//! The registry classifies every frame type defined by RFC 9000. Of the frame
//! bodies only STREAM is encoded and decoded here.

pub mod stream;
pub mod types;

pub use stream::{StreamFrame, StreamFrameType};
pub use types::*;
