//! Chunked message transfer on top of the frame handoff

use crate::channel::Channel;
use crate::frame::{FrameHeader, MAX_PAYLOAD};
use crate::{Error, Result};

/// Number of frames needed to carry `len` payload bytes
pub fn chunk_count(len: usize) -> u64 {
    len.div_ceil(MAX_PAYLOAD) as u64
}

impl Channel {
    /// Send `bytes` as one logical message, one frame per chunk.
    ///
    /// Every chunk is `MAX_PAYLOAD` bytes except a possibly shorter final
    /// one. The alternation invariant makes each `write_frame` block until
    /// the receiver has consumed the previous chunk, so chunks arrive in
    /// order. The first failure aborts the send.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Err(Error::InvalidArgument("cannot send an empty message"));
        }
        let total = chunk_count(bytes.len());
        if total > u32::MAX as u64 {
            return Err(Error::InvalidArgument("message needs more than u32::MAX chunks"));
        }

        for (i, chunk) in bytes.chunks(MAX_PAYLOAD).enumerate() {
            let header = FrameHeader {
                chunk_id: i as u32,
                chunk_len: chunk.len() as u64,
                total_chunks: total,
            };
            self.write_frame(&header, chunk)?;
        }
        Ok(())
    }

    /// Receive one logical message, reassembled from its chunks.
    ///
    /// The first frame fixes the nominal chunk size and the total count;
    /// the buffer is reserved at `total * chunk_len` up front and ends up
    /// shorter when the final chunk is a remainder. Any mid-message failure
    /// returns immediately, dropping the partially filled buffer.
    pub fn recv(&mut self) -> Result<Vec<u8>> {
        let first = self.read_frame()?;
        let chunk_len = first.payload.len();
        let total = first.total_chunks as usize;

        let mut message = Vec::new();
        message
            .try_reserve_exact(total.saturating_mul(chunk_len))
            .map_err(|_| Error::Allocation(total.saturating_mul(chunk_len)))?;
        message.extend_from_slice(&first.payload);

        // Chunk ids are informational; alternation already forces in-order
        // delivery, and peer-supplied values must not be able to panic us.
        for _ in 1..total {
            let frame = self.read_frame()?;
            message.extend_from_slice(&frame.payload);
        }
        Ok(message)
    }
}
