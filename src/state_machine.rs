//! Hierarchical, time-aware block interpreter driving control logic.
//!
//! Grounded in `sfa/core/StateMachine.cpp`. The original's `step()` has a
//! documented bug: it gates the state's `step` label on `destState != 0`
//! where the surrounding comment says it should skip `step` when `entry`
//! already transitioned — i.e. the condition should be `destState == 0`.
//! This implementation follows the corrected reading, not the literal C++.

use tracing::instrument;

use crate::action::NO_TRANSITION;
use crate::block::{BlockArena, BlockId};
use crate::element::Element;
use crate::expr::{ExprArena, ExprId};
use crate::pal::NO_TIME;
use crate::result::{Result, SfError};

/// Per-node evaluation counters for runtime introspection, restored from the
/// original's `expression_stats` (see §10.5 of the design doc). Updated once
/// per [`StateMachine::step`] for each observed node, never on the
/// per-evaluation hot path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprStats {
    pub evals: u64,
    pub last_value: f64,
}

struct ObservedExpr {
    id: ExprId,
    stats: ExprStats,
}

pub struct StateConfig {
    pub id: u32,
    pub entry: Option<BlockId>,
    pub step: Option<BlockId>,
    pub exit: Option<BlockId>,
}

pub struct StateMachineConfig<'sv> {
    state_elem: Element<u32>,
    state_time_elem: Element<u64>,
    global_time_elem: Element<u64>,
    states: Vec<StateConfig>,
    blocks: &'sv BlockArena,
    exprs: &'sv ExprArena,
    observed: Vec<ObservedExpr>,
}

pub struct StateMachineConfigBuilder<'sv> {
    state_elem: Option<Element<u32>>,
    state_time_elem: Option<Element<u64>>,
    global_time_elem: Option<Element<u64>>,
    states: Vec<StateConfig>,
    blocks: &'sv BlockArena,
    exprs: &'sv ExprArena,
    observed: Vec<ExprId>,
}

impl<'sv> StateMachineConfigBuilder<'sv> {
    pub fn new(blocks: &'sv BlockArena, exprs: &'sv ExprArena) -> Self {
        Self {
            state_elem: None,
            state_time_elem: None,
            global_time_elem: None,
            states: Vec::new(),
            blocks,
            exprs,
            observed: Vec::new(),
        }
    }

    pub fn state_elem(mut self, elem: Element<u32>) -> Self {
        self.state_elem = Some(elem);
        self
    }

    pub fn state_time_elem(mut self, elem: Element<u64>) -> Self {
        self.state_time_elem = Some(elem);
        self
    }

    pub fn global_time_elem(mut self, elem: Element<u64>) -> Self {
        self.global_time_elem = Some(elem);
        self
    }

    pub fn state(mut self, state: StateConfig) -> Self {
        self.states.push(state);
        self
    }

    /// Registers `id` for per-node evaluation counters (see [`ExprStats`]).
    pub fn observe(mut self, id: ExprId) -> Self {
        self.observed.push(id);
        self
    }

    pub fn build(self) -> Result<StateMachineConfig<'sv>> {
        Ok(StateMachineConfig {
            state_elem: self.state_elem.ok_or(SfError::SmNull)?,
            state_time_elem: self.state_time_elem.ok_or(SfError::SmNull)?,
            global_time_elem: self.global_time_elem.ok_or(SfError::SmNull)?,
            states: self.states,
            blocks: self.blocks,
            exprs: self.exprs,
            observed: self
                .observed
                .into_iter()
                .map(|id| ObservedExpr {
                    id,
                    stats: ExprStats::default(),
                })
                .collect(),
        })
    }
}

/// `Uninitialized → Initialized`, then driven by repeated [`StateMachine::step`].
pub struct StateMachine<'sv> {
    config: Option<StateMachineConfig<'sv>>,
    state_cur: usize,
    time_state_start: u64,
    last_global_time: Option<u64>,
}

impl<'sv> Default for StateMachine<'sv> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'sv> StateMachine<'sv> {
    pub fn new() -> Self {
        Self {
            config: None,
            state_cur: 0,
            time_state_start: NO_TIME,
            last_global_time: None,
        }
    }

    /// Validates and installs `config`.
    ///
    /// Checks: not already initialized; at least one state; the initial
    /// value of the state element names a configured state; every
    /// transition destination reachable from any label resolves to a
    /// configured state (`E_SM_TRANS`); no exit label may reach a
    /// transition (`E_SM_TR_EXIT`).
    #[instrument(skip_all)]
    pub fn init(&mut self, config: StateMachineConfig<'sv>) -> Result<()> {
        if self.config.is_some() {
            return Err(SfError::SmReinit);
        }

        if config.states.is_empty() {
            return Err(SfError::SmEmpty);
        }

        let state_init = config.state_elem.read();
        let state_cur = config
            .states
            .iter()
            .position(|s| s.id == state_init)
            .ok_or(SfError::SmState)?;

        let known_ids: Vec<u32> = config.states.iter().map(|s| s.id).collect();
        for state in &config.states {
            for label in [state.entry, state.step, state.exit] {
                if let Some(block) = label {
                    let mut targets = Vec::new();
                    config.blocks.collect_transition_targets(block, &mut targets);
                    for target in targets {
                        if !known_ids.contains(&target) {
                            return Err(SfError::SmTrans);
                        }
                    }
                }
            }

            if let Some(exit) = state.exit {
                if config.blocks.contains_transition(exit) {
                    return Err(SfError::SmTrExit);
                }
            }
        }

        tracing::debug!(states = config.states.len(), "state machine initialized");
        self.state_cur = state_cur;
        self.time_state_start = NO_TIME;
        self.config = Some(config);
        Ok(())
    }

    fn current(&self) -> &StateConfig {
        &self.config.as_ref().unwrap().states[self.state_cur]
    }

    /// Executes one step. See module docs for the entry/step/exit ordering.
    #[instrument(skip_all, fields(state_id, t_state_elapsed))]
    pub fn step(&mut self) -> Result<()> {
        let config = self.config.as_ref().ok_or(SfError::SmUninit)?;

        let t_global = config.global_time_elem.read();
        if t_global == NO_TIME || self.last_global_time.is_some_and(|last| t_global <= last) {
            return Err(SfError::SmTime);
        }
        self.last_global_time = Some(t_global);

        if self.time_state_start == NO_TIME {
            config.state_elem.write(self.current().id);
            self.time_state_start = t_global;
        }
        let t_state_elapsed = t_global - self.time_state_start;
        config.state_time_elem.write(t_state_elapsed);

        tracing::Span::current().record("state_id", self.current().id);
        tracing::Span::current().record("t_state_elapsed", t_state_elapsed);

        let mut dest = NO_TRANSITION;
        if t_state_elapsed == 0 {
            if let Some(entry) = self.current().entry {
                dest = config.blocks.execute(entry, config.exprs);
            }
        }

        if dest == NO_TRANSITION {
            if let Some(step) = self.current().step {
                dest = config.blocks.execute(step, config.exprs);
            }
        }

        if dest != NO_TRANSITION {
            if let Some(exit) = self.current().exit {
                let _ = config.blocks.execute(exit, config.exprs);
            }

            tracing::debug!(from = self.current().id, to = dest, "state machine transition");

            let next_idx = config
                .states
                .iter()
                .position(|s| s.id == dest)
                .expect("transition destinations are validated at init");
            self.state_cur = next_idx;
            self.time_state_start = NO_TIME;
        }

        self.update_observers();
        Ok(())
    }

    fn update_observers(&mut self) {
        let config = match self.config.as_mut() {
            Some(c) => c,
            None => return,
        };
        for observed in &mut config.observed {
            let value = config.exprs.eval::<f64>(observed.id);
            observed.stats.evals += 1;
            observed.stats.last_value = value;
        }
    }

    /// Snapshot of the per-node counters registered via
    /// [`StateMachineConfigBuilder::observe`], in registration order.
    pub fn expr_stats(&self) -> Vec<ExprStats> {
        self.config
            .as_ref()
            .map(|c| c.observed.iter().map(|o| o.stats).collect())
            .unwrap_or_default()
    }
}
