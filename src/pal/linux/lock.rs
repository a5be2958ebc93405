//! Userspace spinlock.
//!
//! The userspace analogue of the teacher kernel's `sync::spinlock::SpinLock`:
//! same atomic test-and-set busy loop, minus the interrupt masking (there are
//! no interrupts to mask outside of kernel mode). Exposed through explicit
//! `acquire`/`release` rather than an RAII guard because that is the shape
//! [`crate::pal::Lock`] and the original `ILock` contract both specify.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::pal::Lock;
use crate::result::Result;

pub struct LinuxSpinlock {
    locked: AtomicBool,
}

impl LinuxSpinlock {
    pub fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }
}

impl Default for LinuxSpinlock {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock for LinuxSpinlock {
    fn acquire(&self) -> Result<()> {
        while self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
        Ok(())
    }

    fn release(&self) -> Result<()> {
        self.locked.store(false, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn mutual_exclusion_under_contention() {
        let lock = Arc::new(LinuxSpinlock::new());
        let counter = Arc::new(std::sync::atomic::AtomicU64::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        lock.acquire().unwrap();
                        counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        lock.release().unwrap();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(counter.load(std::sync::atomic::Ordering::Relaxed), 8000);
    }
}
