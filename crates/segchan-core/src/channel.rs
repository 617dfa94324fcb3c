//! Channel lifecycle and the two-semaphore handoff protocol
//!
//! A channel is one shared segment plus two named binary semaphores,
//! `writable` (initially 1) and `readable` (initially 0). Each operation
//! consumes the one permit the other side's release produced, which forces a
//! strict write-read-write-read alternation:
//!
//! ```text
//! state      (writable, readable)
//! Writable   (1, 0)   producer may write_frame
//! Readable   (0, 1)   consumer may read_frame
//! (0, 0)     transient, only inside an operation
//! (1, 1)     unreachable
//! ```

use crate::frame::{Frame, FrameHeader, HEADER_BYTES, MAX_PAYLOAD, SEGMENT_BYTES};
use crate::sem::Semaphore;
use crate::shm::SharedMemory;
use crate::{Error, Result};
use log::debug;

/// One endpoint of a single-producer single-consumer shared-memory channel
pub struct Channel {
    segment: SharedMemory,
    writable: Semaphore,
    readable: Semaphore,
}

impl Channel {
    /// Create the segment and both semaphores under the given names.
    ///
    /// None of the three names may exist yet. On any partial failure every
    /// object created so far is unlinked before the error is returned.
    /// Postcondition: the channel is in the Writable state.
    pub fn create(name: &str, write_sem: &str, read_sem: &str) -> Result<Self> {
        let mut writable = Semaphore::create(write_sem, 1)?;
        let mut readable = Semaphore::create(read_sem, 0)?;
        let mut segment = SharedMemory::create(name, SEGMENT_BYTES)?;

        writable.persist();
        readable.persist();
        segment.persist();
        debug!("created channel {name} (sems {write_sem}/{read_sem}, {SEGMENT_BYTES} bytes)");

        Ok(Self {
            segment,
            writable,
            readable,
        })
    }

    /// Attach to an already-created channel without altering its state.
    ///
    /// Follows the same rollback discipline as [`Channel::create`] when any
    /// of the three attach steps fails.
    pub fn open(name: &str, write_sem: &str, read_sem: &str) -> Result<Self> {
        let mut writable = Semaphore::open(write_sem)?;
        let mut readable = Semaphore::open(read_sem)?;
        let mut segment = SharedMemory::open(name, SEGMENT_BYTES)?;

        writable.persist();
        readable.persist();
        segment.persist();
        debug!("attached channel {name} (sems {write_sem}/{read_sem})");

        Ok(Self {
            segment,
            writable,
            readable,
        })
    }

    /// Unlink all three named objects, best-effort.
    ///
    /// Does not coordinate with in-flight operations; callers must guarantee
    /// no concurrent use.
    pub fn close(name: &str, write_sem: &str, read_sem: &str) {
        SharedMemory::unlink(name);
        Semaphore::unlink(write_sem);
        Semaphore::unlink(read_sem);
        debug!("closed channel {name} (sems {write_sem}/{read_sem})");
    }

    /// Total capacity of the shared region in bytes
    pub fn capacity(&self) -> usize {
        self.segment.size()
    }

    /// Write one frame. Precondition: Writable; postcondition: Readable.
    ///
    /// Blocks until the `writable` permit is available. Header and payload
    /// are fully in place before the `readable` post exposes them.
    pub fn write_frame(&mut self, header: &FrameHeader, payload: &[u8]) -> Result<()> {
        if payload.is_empty() || payload.len() > MAX_PAYLOAD {
            return Err(Error::InvalidArgument("payload length out of range"));
        }
        if payload.len() as u64 != header.chunk_len {
            return Err(Error::InvalidArgument("header length does not match payload"));
        }

        self.writable.wait()?;
        let data = self.segment.as_mut_slice();
        header.encode(&mut data[..HEADER_BYTES]);
        data[HEADER_BYTES..HEADER_BYTES + payload.len()].copy_from_slice(payload);
        self.readable.post()?;
        Ok(())
    }

    /// Read one frame. Precondition: Readable; postcondition: Writable.
    ///
    /// Blocks until the `readable` permit is available. A length field of 0
    /// or beyond [`MAX_PAYLOAD`] fails with [`Error::CorruptFrame`] before
    /// any payload is copied; the `writable` permit is not released in that
    /// case, since the segment content can no longer be trusted.
    pub fn read_frame(&mut self) -> Result<Frame> {
        self.readable.wait()?;
        let data = self.segment.as_mut_slice();
        let header = FrameHeader::decode(&data[..HEADER_BYTES])?;

        let len = header.chunk_len as usize;
        let mut payload = Vec::new();
        payload
            .try_reserve_exact(len)
            .map_err(|_| Error::Allocation(len))?;
        payload.extend_from_slice(&data[HEADER_BYTES..HEADER_BYTES + len]);

        // Stale frame bytes must never leak into a future misread.
        data.fill(0);
        self.writable.post()?;

        Ok(Frame {
            chunk_id: header.chunk_id,
            total_chunks: header.total_chunks,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn unique_names(tag: &str) -> (String, String, String) {
        let ts = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        (
            format!("/segchan_{tag}_{ts}"),
            format!("/segchan_{tag}_{ts}_w"),
            format!("/segchan_{tag}_{ts}_r"),
        )
    }

    #[test]
    fn test_create_starts_writable() {
        let (name, wsem, rsem) = unique_names("init");
        let chan = Channel::create(&name, &wsem, &rsem).unwrap();

        assert!(!chan.readable.try_wait().unwrap());
        assert!(chan.writable.try_wait().unwrap());
        chan.writable.post().unwrap();

        drop(chan);
        Channel::close(&name, &wsem, &rsem);
    }

    #[test]
    fn test_alternation() {
        let (name, wsem, rsem) = unique_names("alt");
        let mut chan = Channel::create(&name, &wsem, &rsem).unwrap();

        let header = FrameHeader {
            chunk_id: 0,
            chunk_len: 3,
            total_chunks: 1,
        };
        chan.write_frame(&header, b"abc").unwrap();

        // After a write the writable permit is gone until a read releases it.
        assert!(!chan.writable.try_wait().unwrap());

        let frame = chan.read_frame().unwrap();
        assert_eq!(frame.payload, b"abc");
        assert_eq!(frame.chunk_id, 0);
        assert_eq!(frame.total_chunks, 1);

        assert!(!chan.readable.try_wait().unwrap());
        assert!(chan.writable.try_wait().unwrap());
        chan.writable.post().unwrap();

        drop(chan);
        Channel::close(&name, &wsem, &rsem);
    }

    #[test]
    fn test_read_zeroes_region() {
        let (name, wsem, rsem) = unique_names("zero");
        let mut chan = Channel::create(&name, &wsem, &rsem).unwrap();

        let header = FrameHeader {
            chunk_id: 1,
            chunk_len: 5,
            total_chunks: 2,
        };
        chan.write_frame(&header, b"hello").unwrap();
        chan.read_frame().unwrap();

        let head = &chan.segment.as_slice()[..HEADER_BYTES + 5];
        assert!(head.iter().all(|&b| b == 0));

        drop(chan);
        Channel::close(&name, &wsem, &rsem);
    }

    #[test]
    fn test_corrupt_length_rejected() {
        let (name, wsem, rsem) = unique_names("corrupt");
        let mut chan = Channel::create(&name, &wsem, &rsem).unwrap();

        // Forge a frame with a zero length field directly in the segment.
        let bad = FrameHeader {
            chunk_id: 0,
            chunk_len: 0,
            total_chunks: 1,
        };
        bad.encode(&mut chan.segment.as_mut_slice()[..HEADER_BYTES]);
        chan.readable.post().unwrap();

        assert!(matches!(chan.read_frame(), Err(Error::CorruptFrame(0))));

        drop(chan);
        Channel::close(&name, &wsem, &rsem);
    }

    #[test]
    fn test_create_rollback_on_write_sem_conflict() {
        let (name, wsem, rsem) = unique_names("rb_w");
        let _existing = Semaphore::create(&wsem, 1).unwrap();

        assert!(matches!(
            Channel::create(&name, &wsem, &rsem),
            Err(Error::ResourceCreation(_))
        ));
        assert!(Semaphore::open(&rsem).is_err());
        assert!(SharedMemory::open(&name, SEGMENT_BYTES).is_err());
    }

    #[test]
    fn test_create_rollback_on_read_sem_conflict() {
        let (name, wsem, rsem) = unique_names("rb_r");
        let _existing = Semaphore::create(&rsem, 0).unwrap();

        assert!(matches!(
            Channel::create(&name, &wsem, &rsem),
            Err(Error::ResourceCreation(_))
        ));
        assert!(Semaphore::open(&wsem).is_err());
        assert!(SharedMemory::open(&name, SEGMENT_BYTES).is_err());
    }

    #[test]
    fn test_create_rollback_on_segment_conflict() {
        let (name, wsem, rsem) = unique_names("rb_s");
        let _existing = SharedMemory::create(&name, SEGMENT_BYTES).unwrap();

        assert!(matches!(
            Channel::create(&name, &wsem, &rsem),
            Err(Error::ResourceCreation(_))
        ));
        assert!(Semaphore::open(&wsem).is_err());
        assert!(Semaphore::open(&rsem).is_err());
    }

    #[test]
    fn test_open_rollback_on_undersized_segment() {
        let (name, wsem, rsem) = unique_names("rb_open");
        let mut existing_w = Semaphore::create(&wsem, 1).unwrap();
        let mut existing_r = Semaphore::create(&rsem, 0).unwrap();
        let mut existing_seg = SharedMemory::create(&name, 4096).unwrap();
        existing_w.persist();
        existing_r.persist();
        existing_seg.persist();

        // The segment is too small for a channel, so the attach fails at the
        // last step and must unlink everything attached so far.
        assert!(matches!(
            Channel::open(&name, &wsem, &rsem),
            Err(Error::ResourceAttach(_))
        ));
        assert!(Semaphore::open(&wsem).is_err());
        assert!(Semaphore::open(&rsem).is_err());
        assert!(SharedMemory::open(&name, 4096).is_err());
    }

    #[test]
    fn test_open_missing_fails() {
        let (name, wsem, rsem) = unique_names("open_missing");
        assert!(matches!(
            Channel::open(&name, &wsem, &rsem),
            Err(Error::ResourceAttach(_))
        ));
    }
}
