//! segchan - single-producer single-consumer shared-memory channel
//!
//! One fixed-capacity shared segment, handed back and forth between exactly
//! one producer and one consumer by two named binary semaphores. Messages
//! larger than the segment are split into ordered chunks, one frame per
//! handoff. See [`channel`] for the alternation state machine and [`frame`]
//! for the on-segment layout.

pub mod channel;
pub mod error;
pub mod frame;
pub mod sem;
pub mod shm;
pub mod transfer;

pub use channel::Channel;
pub use error::{Error, Result};
pub use frame::{Frame, FrameHeader, HEADER_BYTES, MAX_PAYLOAD, SEGMENT_BYTES};
pub use transfer::chunk_count;
