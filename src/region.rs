//! Contiguous byte spans with bulk copy in/out, optionally lock-protected.
//!
//! A [`Region`] covers a set of [`crate::element::Element`]s with a single
//! named byte span; the state vector's layout validator proves the span
//! exactly tiles those elements' backing memory (see
//! [`crate::state_vector`]). Regions never overlap each other.

use crate::pal::Lock;
use crate::result::{Result, SfError};

/// A contiguous byte span, optionally lock-protected, suitable for bulk
/// copy in/out (e.g. synchronizing a slice of the state vector across a
/// socket or between cores).
pub struct Region<'lock> {
    addr: *mut u8,
    size_bytes: usize,
    lock: Option<&'lock dyn Lock>,
}

// SAFETY: `Region` is a bare handle over caller-owned memory, mirroring
// `Element`'s contract; synchronization is the caller's responsibility
// (enforced in practice by always pairing cross-thread regions with a lock).
unsafe impl Send for Region<'_> {}
unsafe impl Sync for Region<'_> {}

impl<'lock> Region<'lock> {
    /// Constructs a region with no lock.
    ///
    /// # Safety
    ///
    /// `addr` must be valid for reads and writes of `size_bytes` contiguous
    /// bytes for as long as the `Region` is used.
    pub unsafe fn new(addr: *mut u8, size_bytes: usize) -> Self {
        Self {
            addr,
            size_bytes,
            lock: None,
        }
    }

    /// Constructs a region protected by `lock`.
    ///
    /// # Safety
    ///
    /// Same as [`Region::new`].
    pub unsafe fn with_lock(addr: *mut u8, size_bytes: usize, lock: &'lock dyn Lock) -> Self {
        Self {
            addr,
            size_bytes,
            lock: Some(lock),
        }
    }

    pub fn addr(&self) -> *const u8 {
        self.addr
    }

    pub fn size(&self) -> usize {
        self.size_bytes
    }

    /// Copies `buf` into the region's backing memory.
    ///
    /// Fails with [`SfError::RgnSize`] unless `buf.len() == self.size()`. If
    /// a lock is configured, it is acquired before the copy and released
    /// after; lock failure is surfaced to the caller as-is.
    pub fn write(&self, buf: &[u8]) -> Result<()> {
        if buf.len() != self.size_bytes {
            return Err(SfError::RgnSize);
        }

        if let Some(lock) = self.lock {
            lock.acquire()?;
        }

        // SAFETY: length checked above; `self.addr` is valid for
        // `size_bytes` bytes per the constructor's safety contract.
        unsafe {
            core::ptr::copy_nonoverlapping(buf.as_ptr(), self.addr, self.size_bytes);
        }

        if let Some(lock) = self.lock {
            lock.release()?;
        }

        Ok(())
    }

    /// Copies the region's backing memory into `buf`.
    ///
    /// Fails with [`SfError::RgnSize`] unless `buf.len() == self.size()`.
    /// Unlike `write`, a lock-acquire failure here is treated as fatal: reads
    /// must not silently return stale or torn data, so failure to acquire
    /// the lock is a logic error in the caller's configuration, not a
    /// recoverable runtime condition.
    pub fn read(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() != self.size_bytes {
            return Err(SfError::RgnSize);
        }

        if let Some(lock) = self.lock {
            lock.acquire()
                .expect("Region::read: lock acquire must not fail");
        }

        // SAFETY: length checked above; `self.addr` is valid for
        // `size_bytes` bytes per the constructor's safety contract.
        unsafe {
            core::ptr::copy_nonoverlapping(self.addr, buf.as_mut_ptr(), self.size_bytes);
        }

        if let Some(lock) = self.lock {
            lock.release()
                .expect("Region::read: lock release must not fail");
        }

        Ok(())
    }
}
