//! Real-time and single-core task schedulers.
//!
//! Grounded in `sf/core/SpinExecutor.cpp` (single-core) and
//! `sf/core/RealTimeExecutor.hpp` (multi-core). Both share the same
//! calibration and spinwait shape; what differs is whether the worker loop
//! runs on the calling thread or on spawned, pinned, real-time threads. That
//! shared shape lives here; [`spin`] and [`realtime`] hold what's specific
//! to each variant.

pub mod realtime;
pub mod spin;

use tracing::instrument;

use crate::pal::{Clock, NS_IN_S};
use crate::result::{Result, SfError};
use crate::task::{Task, TaskRunner};

pub use realtime::{CoreConfig, RealTimeExecutor, RealTimeExecutorConfig};
pub use spin::SpinExecutor;

const ONE_YEAR_NS: u64 = NS_IN_S * 60 * 60 * 24 * 365;
const CALIBRATION_CYCLES: u32 = 1000;

/// A task reduced to its two externally-driven operations, so an executor
/// can hold a heterogeneous task list without being generic over every task
/// type it schedules.
pub trait Steppable: Send {
    fn init(&mut self) -> Result<()>;
    fn step(&mut self) -> Result<()>;
}

impl<T: Task + Send> Steppable for TaskRunner<T> {
    fn init(&mut self) -> Result<()> {
        TaskRunner::init(self)
    }

    fn step(&mut self) -> Result<()> {
        TaskRunner::step(self)
    }
}

/// Fails with [`SfError::ExeOvfl`] if `clock` is within a year of
/// overflowing its nanosecond counter.
#[instrument(skip_all)]
pub(crate) fn check_overflow(clock: &dyn Clock) -> Result<()> {
    if u64::MAX - clock.nano_time() < ONE_YEAR_NS {
        return Err(SfError::ExeOvfl);
    }
    Ok(())
}

/// Measures the average cost of one [`Clock::nano_time`] call over
/// [`CALIBRATION_CYCLES`] back-to-back samples.
pub(crate) fn calibrate_clock_overhead(clock: &dyn Clock) -> u64 {
    let mut total_ns: u64 = 0;
    for _ in 0..CALIBRATION_CYCLES {
        let start = clock.nano_time();
        let end = clock.nano_time();
        total_ns += end.saturating_sub(start);
    }
    total_ns / u64::from(CALIBRATION_CYCLES)
}

/// Runs the shared worker loop body on the calling thread: step every task
/// once per cycle, spinwait out the remainder, advance `cycle_end_ns` by
/// `period_ns`. Returns only when a task step fails, or (test-only escape
/// hatch) after `max_cycles` cycles when `max_cycles` is `Some` — the
/// original has no such bound, since `execute()` is documented to never
/// return in nominal operation, which is untestable as written.
pub(crate) fn run_cycles(
    clock: &dyn Clock,
    tasks: &mut [Box<dyn Steppable>],
    period_ns: u64,
    clock_overhead_ns: u64,
    max_cycles: Option<u64>,
) -> Result<()> {
    let epoch_ns = clock.nano_time();
    let mut cycle_end_ns = epoch_ns + period_ns;
    let mut cycles: u64 = 0;

    loop {
        for task in tasks.iter_mut() {
            task.step()?;
        }

        let target = cycle_end_ns.saturating_sub(clock_overhead_ns);
        while clock.nano_time() < target {
            core::hint::spin_loop();
        }

        cycle_end_ns += period_ns;
        cycles += 1;
        if max_cycles == Some(cycles) {
            return Ok(());
        }
    }
}
