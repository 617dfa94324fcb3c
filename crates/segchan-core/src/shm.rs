//! POSIX shared memory wrapper

use crate::{Error, Result};
use shared_memory::{Shmem, ShmemConf};
use std::ffi::CString;

/// Shared memory region wrapper.
///
/// A freshly created or attached region unlinks its OS object on drop, so a
/// partially built channel rolls back by letting the wrappers fall out of
/// scope. [`SharedMemory::persist`] hands the name over to an explicit
/// [`SharedMemory::unlink`] later on.
pub struct SharedMemory {
    inner: Shmem,
    name: String,
    size: usize,
}

impl SharedMemory {
    /// Create a new shared memory region
    pub fn create(name: &str, size: usize) -> Result<Self> {
        let shmem = ShmemConf::new()
            .size(size)
            .os_id(name)
            .create()
            .map_err(|e| Error::ResourceCreation(format!("segment {name}: {e}")))?;

        Ok(Self {
            inner: shmem,
            name: name.to_string(),
            size,
        })
    }

    /// Open an existing shared memory region
    pub fn open(name: &str, size: usize) -> Result<Self> {
        let mut shmem = ShmemConf::new()
            .os_id(name)
            .open()
            .map_err(|e| Error::ResourceAttach(format!("segment {name}: {e}")))?;

        // Attach failures roll back like create failures, so the opener owns
        // the name from the moment the mapping exists; an undersized segment
        // below must be unlinked like any other partial attach.
        let _ = shmem.set_owner(true);

        if shmem.len() < size {
            return Err(Error::ResourceAttach(format!(
                "segment {name}: mapped {} bytes, expected {size}",
                shmem.len()
            )));
        }

        Ok(Self {
            inner: shmem,
            name: name.to_string(),
            size,
        })
    }

    /// Keep the OS object alive past this handle; only `unlink` removes it.
    pub fn persist(&mut self) {
        let _ = self.inner.set_owner(false);
    }

    /// Remove the named object, best-effort.
    pub fn unlink(name: &str) {
        if let Ok(c_name) = CString::new(name) {
            unsafe {
                libc::shm_unlink(c_name.as_ptr());
            }
        }
    }

    /// Get the name of the shared memory region
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the size of the shared memory region
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get a slice view of the shared memory
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.inner.as_ptr(), self.size) }
    }

    /// Get a mutable slice view of the shared memory
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.inner.as_ptr(), self.size) }
    }
}
