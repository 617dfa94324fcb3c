//! On-segment frame layout
//!
//! The header is a fixed little-endian encoding, never a native struct cast:
//! both endpoints may be built by different toolchains, so padding and byte
//! order must not depend on the platform.
//!
//! ```text
//! offset  0: chunk_id      u32 LE
//! offset  4: chunk_len     u64 LE
//! offset 12: total_chunks  u64 LE
//! offset 20: payload       chunk_len bytes
//! ```

use crate::{Error, Result};

/// Total bytes of the shared data region
pub const SEGMENT_BYTES: usize = 4_000_000;

/// Bytes occupied by the frame header
pub const HEADER_BYTES: usize = 4 + 8 + 8;

/// Largest payload a single frame can carry
pub const MAX_PAYLOAD: usize = SEGMENT_BYTES - HEADER_BYTES;

/// Frame header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Chunk index within the message, starting at 0
    pub chunk_id: u32,
    /// Payload bytes in this frame
    pub chunk_len: u64,
    /// Number of chunks in the whole message
    pub total_chunks: u64,
}

impl FrameHeader {
    /// Serialize into the first `HEADER_BYTES` of `buf`
    pub fn encode(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.chunk_id.to_le_bytes());
        buf[4..12].copy_from_slice(&self.chunk_len.to_le_bytes());
        buf[12..20].copy_from_slice(&self.total_chunks.to_le_bytes());
    }

    /// Deserialize from the first `HEADER_BYTES` of `buf`, validating the
    /// length field before any payload is touched.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_BYTES {
            return Err(Error::InvalidArgument("header slice shorter than HEADER_BYTES"));
        }
        let mut chunk_id = [0u8; 4];
        let mut chunk_len = [0u8; 8];
        let mut total_chunks = [0u8; 8];
        chunk_id.copy_from_slice(&buf[0..4]);
        chunk_len.copy_from_slice(&buf[4..12]);
        total_chunks.copy_from_slice(&buf[12..20]);

        let header = Self {
            chunk_id: u32::from_le_bytes(chunk_id),
            chunk_len: u64::from_le_bytes(chunk_len),
            total_chunks: u64::from_le_bytes(total_chunks),
        };
        if header.chunk_len == 0 || header.chunk_len > MAX_PAYLOAD as u64 {
            return Err(Error::CorruptFrame(header.chunk_len));
        }
        Ok(header)
    }
}

/// One received chunk: header fields plus an owned copy of the payload
#[derive(Debug)]
pub struct Frame {
    pub chunk_id: u32,
    pub total_chunks: u64,
    pub payload: Vec<u8>,
}
