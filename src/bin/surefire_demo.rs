//! Wires a small state vector, state machine, and clock-feeding task onto
//! the single-core spin executor, end to end.
//!
//! Runs two states: `Counting` increments a counter each cycle and
//! transitions to `Settled` once it reaches a threshold; `Settled` resets
//! the counter and transitions back. `RUST_LOG=debug` shows the state
//! machine's transition and state-vector init logging.

use surefire_core::action::Action;
use surefire_core::block::{Block, BlockArena};
use surefire_core::element::Element;
use surefire_core::executor::{SpinExecutor, Steppable};
use surefire_core::expr::{self, ExprArena};
use surefire_core::pal::linux::LinuxClock;
use surefire_core::pal::Clock;
use surefire_core::result::Result;
use surefire_core::state_machine::{StateConfig, StateMachine, StateMachineConfigBuilder};
use surefire_core::state_vector::{StateVector, StateVectorConfigBuilder};
use surefire_core::task::{Task, TaskRunner};
use surefire_core::types::ElementType;

const STATE_COUNTING: u32 = 1;
const STATE_SETTLED: u32 = 2;
const COUNT_THRESHOLD: i32 = 5;

/// Feeds the state vector's global time element from the executor's clock.
/// Every runtime needs at least one task upstream of a state machine to
/// advance its notion of time; in a full deployment this would usually be
/// folded into whatever task also drives sensor input.
struct ClockFeedTask<C: Clock> {
    clock: C,
    global_time: Element<u64>,
}

impl<C: Clock> Task for ClockFeedTask<C> {
    fn init_impl(&mut self) -> Result<()> {
        Ok(())
    }

    fn step_enable(&mut self) -> Result<()> {
        self.global_time.write(self.clock.nano_time());
        Ok(())
    }
}

/// Adapts a [`StateMachine`] to the [`Task`] interface so it can be driven
/// by an executor alongside ordinary tasks.
struct StateMachineTask<'sv> {
    sm: StateMachine<'sv>,
}

impl<'sv> Task for StateMachineTask<'sv> {
    fn init_impl(&mut self) -> Result<()> {
        Ok(())
    }

    fn step_enable(&mut self) -> Result<()> {
        self.sm.step()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut global_time: u64 = 0;
    let mut state: u32 = STATE_COUNTING;
    let mut state_time: u64 = 0;
    let mut counter: i32 = 0;

    let global_time_elem = unsafe { Element::from_raw(&mut global_time as *mut u64) };
    let state_elem = unsafe { Element::from_raw(&mut state as *mut u32) };
    let state_time_elem = unsafe { Element::from_raw(&mut state_time as *mut u64) };
    let counter_elem = unsafe { Element::from_raw(&mut counter as *mut i32) };

    let mut sv = StateVector::new();
    sv.init(
        StateVectorConfigBuilder::new()
            .element("global_time", global_time_elem)
            .element("state", state_elem)
            .element("state_time", state_time_elem)
            .element("counter", counter_elem)
            .build(),
    )?;

    let mut exprs = ExprArena::new();
    let zero = exprs.konst(0i32);
    let one = exprs.konst(1i32);
    let threshold = exprs.konst(COUNT_THRESHOLD);
    let counter_ref = exprs.element_ref(sv.get_ielement("counter")?);
    let counter_plus_one = exprs.bin_op(ElementType::Int32, "add", expr::add, counter_ref, one);
    let counter_reached_threshold = exprs.bin_op(
        ElementType::Bool,
        "ge",
        expr::greater_equals,
        counter_plus_one,
        threshold,
    );

    let mut blocks = BlockArena::new();
    let counting_entry = blocks.push(Block::new().action(Action::assign(counter_elem, zero)));
    let to_settled = blocks.push(Block::new().action(Action::transition(STATE_SETTLED)));
    let guard = blocks.push(
        Block::new()
            .guard(counter_reached_threshold)
            .if_block(to_settled),
    );
    let counting_step = blocks.push(
        Block::new()
            .action(Action::assign(counter_elem, counter_plus_one))
            .next(guard),
    );
    let back_to_counting = blocks.push(Block::new().action(Action::transition(STATE_COUNTING)));
    let settled_entry = blocks.push(
        Block::new()
            .action(Action::assign(counter_elem, zero))
            .next(back_to_counting),
    );

    // Leaked to `'static` since the arenas are assembled once at startup and
    // must outlive the executor, which never returns in nominal operation.
    let blocks: &'static BlockArena = Box::leak(Box::new(blocks));
    let exprs: &'static ExprArena = Box::leak(Box::new(exprs));

    let sm_config = StateMachineConfigBuilder::new(blocks, exprs)
        .state_elem(sv.get_element("state")?)
        .state_time_elem(sv.get_element("state_time")?)
        .global_time_elem(sv.get_element("global_time")?)
        .state(StateConfig {
            id: STATE_COUNTING,
            entry: Some(counting_entry),
            step: Some(counting_step),
            exit: None,
        })
        .state(StateConfig {
            id: STATE_SETTLED,
            entry: Some(settled_entry),
            step: None,
            exit: None,
        })
        .build()?;

    let mut sm = StateMachine::new();
    sm.init(sm_config)?;

    let clock_task: Box<dyn Steppable> = Box::new(TaskRunner::new(
        ClockFeedTask {
            clock: LinuxClock::new(),
            global_time: sv.get_element("global_time")?,
        },
        None,
    ));
    let sm_task: Box<dyn Steppable> = Box::new(TaskRunner::new(StateMachineTask { sm }, None));

    let mut executor = SpinExecutor::new(LinuxClock::new(), 1_000_000)
        .add_task(clock_task)
        .add_task(sm_task);

    executor.execute()
}
