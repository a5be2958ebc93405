//! `std::thread`-backed thread adapter.
//!
//! Scheduling policy/priority/affinity are no-ops unless the `realtime`
//! feature is enabled, in which case they are applied via `nix`/`libc`
//! (`sched_setaffinity`, `SCHED_FIFO`) the way `RTS007-evo-core`'s cycle
//! runner applies them to its worker threads. Without the feature this
//! degrades gracefully to plain `std::thread::spawn` on the default policy,
//! which is sufficient for development and for running the test suite
//! without elevated privileges.

use std::thread::JoinHandle;

use crate::pal::{Thread, ThreadHandle, ThreadPolicy};
use crate::result::{Result, SfError};

pub struct LinuxThread;

impl LinuxThread {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinuxThread {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LinuxThreadHandle {
    inner: JoinHandle<Result<()>>,
}

impl ThreadHandle for LinuxThreadHandle {
    fn await_result(self) -> Result<()> {
        self.inner.join().map_err(|_| SfError::ThrAwait)?
    }
}

impl Thread for LinuxThread {
    type Handle = LinuxThreadHandle;

    fn spawn(
        &self,
        priority: i32,
        policy: ThreadPolicy,
        affinity: u8,
        f: Box<dyn FnOnce() -> Result<()> + Send + 'static>,
    ) -> Result<Self::Handle> {
        let inner = std::thread::Builder::new()
            .spawn(move || {
                LinuxThread::set_current(priority, policy, affinity)?;
                f()
            })
            .map_err(|_| SfError::ThrCreate)?;

        Ok(LinuxThreadHandle { inner })
    }

    #[cfg(feature = "realtime")]
    fn set_current(priority: i32, policy: ThreadPolicy, affinity: u8) -> Result<()> {
        realtime::set_current(priority, policy, affinity)
    }

    #[cfg(not(feature = "realtime"))]
    fn set_current(_priority: i32, _policy: ThreadPolicy, _affinity: u8) -> Result<()> {
        Ok(())
    }

    #[cfg(feature = "realtime")]
    fn num_cores() -> u8 {
        realtime::num_cores()
    }

    #[cfg(not(feature = "realtime"))]
    fn num_cores() -> u8 {
        std::thread::available_parallelism()
            .map(|n| n.get() as u8)
            .unwrap_or(1)
    }
}

#[cfg(feature = "realtime")]
mod realtime {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::sys::resource::{setrlimit, Resource};
    use nix::unistd::Pid;

    use crate::pal::ThreadPolicy;
    use crate::result::{Result, SfError};

    pub(super) fn set_current(priority: i32, policy: ThreadPolicy, affinity: u8) -> Result<()> {
        if affinity != crate::pal::ALL_CORES {
            let mut set = CpuSet::new();
            set.set(affinity as usize).map_err(|_| SfError::ThrAff)?;
            sched_setaffinity(Pid::from_raw(0), &set).map_err(|_| SfError::ThrAff)?;
        }

        if policy == ThreadPolicy::RealTime {
            // SAFETY: FFI call into libc with a stack-local `sched_param`;
            // `sched_setscheduler` validates `priority` itself.
            unsafe {
                let param = libc::sched_param {
                    sched_priority: priority,
                };
                if libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) != 0 {
                    return Err(SfError::ThrPri);
                }
            }

            // Best-effort: lock pages to avoid page-fault jitter under RT
            // scheduling. Failure here (e.g. missing CAP_IPC_LOCK) is not
            // fatal to correctness, only to latency, so it is not propagated.
            let _ = setrlimit(Resource::RLIMIT_MEMLOCK, u64::MAX, u64::MAX);
        }

        Ok(())
    }

    pub(super) fn num_cores() -> u8 {
        std::thread::available_parallelism()
            .map(|n| n.get() as u8)
            .unwrap_or(1)
    }
}
