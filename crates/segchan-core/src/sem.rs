//! POSIX named semaphore wrapper

use crate::{Error, Result};
use std::ffi::CString;
use std::io;
use std::time::Duration;

/// Access mode bits for created objects
const MODE: libc::mode_t = 0o777;

/// Named binary semaphore.
///
/// Same rollback discipline as [`crate::shm::SharedMemory`]: the name is
/// unlinked on drop until [`Semaphore::persist`] is called, so a failed
/// channel setup leaves nothing behind.
pub struct Semaphore {
    sem: *mut libc::sem_t,
    name: CString,
    unlink_on_drop: bool,
}

// Safety: sem_t handles obtained from sem_open may be used from any thread
// of the opening process.
unsafe impl Send for Semaphore {}

impl Semaphore {
    /// Create a new named semaphore with the given initial value.
    ///
    /// Fails if the name already exists.
    pub fn create(name: &str, initial: u32) -> Result<Self> {
        let c_name = to_c_name(name)?;
        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                MODE as libc::c_uint,
                initial as libc::c_uint,
            )
        };
        if sem == libc::SEM_FAILED {
            return Err(Error::ResourceCreation(format!(
                "semaphore {name}: {}",
                io::Error::last_os_error()
            )));
        }
        Ok(Self {
            sem,
            name: c_name,
            unlink_on_drop: true,
        })
    }

    /// Open an existing named semaphore without altering its value.
    pub fn open(name: &str) -> Result<Self> {
        let c_name = to_c_name(name)?;
        let sem = unsafe { libc::sem_open(c_name.as_ptr(), libc::O_RDWR) };
        if sem == libc::SEM_FAILED {
            return Err(Error::ResourceAttach(format!(
                "semaphore {name}: {}",
                io::Error::last_os_error()
            )));
        }
        Ok(Self {
            sem,
            name: c_name,
            unlink_on_drop: true,
        })
    }

    /// Keep the named object alive past this handle.
    pub fn persist(&mut self) {
        self.unlink_on_drop = false;
    }

    /// Remove the named object, best-effort.
    pub fn unlink(name: &str) {
        if let Ok(c_name) = CString::new(name) {
            unsafe {
                libc::sem_unlink(c_name.as_ptr());
            }
        }
    }

    /// Decrement, blocking until the permit is available.
    pub fn wait(&self) -> Result<()> {
        loop {
            if unsafe { libc::sem_wait(self.sem) } == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(Error::Semaphore { op: "wait", source: err });
            }
        }
    }

    /// Decrement without blocking; `Ok(false)` if no permit was available.
    pub fn try_wait(&self) -> Result<bool> {
        loop {
            if unsafe { libc::sem_trywait(self.sem) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EAGAIN) => return Ok(false),
                Some(libc::EINTR) => continue,
                _ => return Err(Error::Semaphore { op: "trywait", source: err }),
            }
        }
    }

    /// Decrement, blocking at most `timeout`; `Ok(false)` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool> {
        let mut now = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) } != 0 {
            return Err(Error::Semaphore {
                op: "timedwait",
                source: io::Error::last_os_error(),
            });
        }
        let mut abs = libc::timespec {
            tv_sec: now.tv_sec + timeout.as_secs() as libc::time_t,
            tv_nsec: now.tv_nsec + timeout.subsec_nanos() as libc::c_long,
        };
        if abs.tv_nsec >= 1_000_000_000 {
            abs.tv_sec += 1;
            abs.tv_nsec -= 1_000_000_000;
        }
        loop {
            if unsafe { libc::sem_timedwait(self.sem, &abs) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::ETIMEDOUT) => return Ok(false),
                Some(libc::EINTR) => continue,
                _ => return Err(Error::Semaphore { op: "timedwait", source: err }),
            }
        }
    }

    /// Increment, releasing the permit to the other side.
    pub fn post(&self) -> Result<()> {
        if unsafe { libc::sem_post(self.sem) } == 0 {
            Ok(())
        } else {
            Err(Error::Semaphore {
                op: "post",
                source: io::Error::last_os_error(),
            })
        }
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            libc::sem_close(self.sem);
            if self.unlink_on_drop {
                libc::sem_unlink(self.name.as_ptr());
            }
        }
    }
}

fn to_c_name(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| Error::InvalidArgument("semaphore name contains NUL"))
}
