//! Platform abstraction layer.
//!
//! These traits are the *contracts* the runtime core consumes; this crate is
//! deliberately agnostic to how a given platform satisfies them. [`linux`]
//! is the one concrete adapter shipped here, since a runtime with no way to
//! actually execute would not be a usable crate — but core/, state_machine/,
//! executor/ etc. depend only on the traits in this module, never on
//! `pal::linux` directly (with the narrow exception of executor tests).

pub mod linux;

use crate::result::Result;

/// Number of nanoseconds in a second.
pub const NS_IN_S: u64 = 1_000_000_000;

/// Reserved clock value meaning "no time" / "not yet started". The largest
/// representable timestamp (~584 years in nanoseconds), so a real clock
/// reading should never collide with it.
pub const NO_TIME: u64 = u64::MAX;

/// Monotonically non-decreasing nanosecond clock.
pub trait Clock: Send + Sync {
    /// Current time in nanoseconds. Implementations documented as
    /// potentially non-monotonic (e.g. an NTP-adjusted real-time clock) must
    /// say so plainly; the state machine treats any observed decrease as a
    /// fatal `E_SM_TIME`.
    fn nano_time(&self) -> u64;

    /// Spinwaits (no yielding) until at least `ns` nanoseconds have passed.
    fn spin_wait(&self, ns: u64) {
        let start = self.nano_time();
        while self.nano_time().saturating_sub(start) < ns {
            core::hint::spin_loop();
        }
    }
}

/// Thread scheduling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPolicy {
    /// Fair/time-sharing scheduling; "fair" is platform-defined.
    Fair,
    /// Soft or hard real-time scheduling (e.g. `SCHED_FIFO`).
    RealTime,
}

/// Reserved affinity value meaning "no particular core" / "all cores".
pub const ALL_CORES: u8 = 0xFF;

/// Platform-agnostic threading interface.
///
/// Unlike the original C++ interface (which exposes a raw function-pointer
/// `Thread::init`), this is expressed as a method taking a boxed closure,
/// which is the idiomatic Rust analogue and composes with `std::thread`
/// without an unsafe function-pointer cast at every call site.
pub trait Thread: Send + Sync {
    /// A join handle returned by `spawn`.
    type Handle: ThreadHandle;

    /// Spawns `f` on a new thread with the given priority/policy/affinity.
    fn spawn(
        &self,
        priority: i32,
        policy: ThreadPolicy,
        affinity: u8,
        f: Box<dyn FnOnce() -> Result<()> + Send + 'static>,
    ) -> Result<Self::Handle>;

    /// Sets scheduling attributes of the *calling* thread.
    fn set_current(priority: i32, policy: ThreadPolicy, affinity: u8) -> Result<()>;

    /// Number of cores visible to the process.
    fn num_cores() -> u8;
}

/// A handle returned by [`Thread::spawn`]; blocks on [`ThreadHandle::await_result`]
/// until the thread exits.
pub trait ThreadHandle {
    fn await_result(self) -> Result<()>;
}

/// Spinlock contract used by [`crate::region::Region`].
pub trait Lock: Send + Sync {
    fn acquire(&self) -> Result<()>;
    fn release(&self) -> Result<()>;
}

/// Timed-select-capable datagram socket contract, used by the optional
/// region RX/TX tasks (`crate::task::region_io`).
pub trait Socket: Send {
    fn send(&self, buf: &[u8]) -> Result<usize>;
    fn recv(&self, buf: &mut [u8]) -> Result<usize>;

    /// Blocks up to `timeout_us` microseconds for the socket to become
    /// readable. Returns the remaining budget in microseconds so callers can
    /// compose multiple selects against a shared deadline.
    fn select(&self, timeout_us: u64) -> Result<SelectOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Ready { remaining_us: u64 },
    TimedOut,
}

/// Minimal text-output console contract.
pub trait Console: Send + Sync {
    fn write_line(&self, line: &str);
}
