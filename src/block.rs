//! The state machine's block interpreter.
//!
//! Grounded in `sfa/core/StateMachine.cpp`'s `StateMachine::Block::execute`.
//! A block is a DAG node, not a tree node — `next` chains form the
//! straight-line body of a label and `if`/`else` branch off it — so blocks
//! live in a [`BlockArena`] addressed by [`BlockId`] rather than behind
//! `Box`, the same ownership shape [`crate::expr::ExprArena`] uses for
//! expression nodes.

use crate::action::{Action, NO_TRANSITION};
use crate::expr::{ExprArena, ExprId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

/// `{guard, if_block, else_block, action, next}`; every field is optional.
#[derive(Default)]
pub struct Block {
    pub guard: Option<ExprId>,
    pub if_block: Option<BlockId>,
    pub else_block: Option<BlockId>,
    pub action: Option<Action>,
    pub next: Option<BlockId>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guard(mut self, guard: ExprId) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn if_block(mut self, id: BlockId) -> Self {
        self.if_block = Some(id);
        self
    }

    pub fn else_block(mut self, id: BlockId) -> Self {
        self.else_block = Some(id);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn next(mut self, id: BlockId) -> Self {
        self.next = Some(id);
        self
    }
}

/// Owning arena of blocks, built leaf-up (a block's `next`/`if`/`else`
/// targets must already exist in the arena when the block referencing them
/// is pushed), which rules out cycles by construction.
#[derive(Default)]
pub struct BlockArena {
    blocks: Vec<Block>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn push(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(block);
        id
    }

    fn get(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    /// Executes the block at `id` and everything it reaches this tick.
    /// Returns `0` ([`NO_TRANSITION`]) or a destination state id.
    pub fn execute(&self, id: BlockId, exprs: &ExprArena) -> u32 {
        let block = self.get(id);

        let dest = if let Some(guard) = block.guard {
            if exprs.eval_bool(guard) {
                block.if_block.map_or(NO_TRANSITION, |b| self.execute(b, exprs))
            } else {
                block.else_block.map_or(NO_TRANSITION, |b| self.execute(b, exprs))
            }
        } else if let Some(action) = &block.action {
            action.execute(exprs)
        } else {
            NO_TRANSITION
        };

        if dest != NO_TRANSITION {
            return dest;
        }

        block.next.map_or(NO_TRANSITION, |b| self.execute(b, exprs))
    }

    /// Walks every block reachable from `id` (both guard branches, `next`
    /// chains) and returns `true` if any reaches an [`Action::Transition`].
    /// Used by [`crate::state_machine`]'s init-time `E_SM_TR_EXIT` check:
    /// unlike [`BlockArena::execute`], this is a static reachability query
    /// and does not care which guard branch would be taken at runtime.
    pub fn contains_transition(&self, id: BlockId) -> bool {
        let block = self.get(id);

        let here = matches!(block.action, Some(Action::Transition { .. }));
        let branches = block.if_block.map_or(false, |b| self.contains_transition(b))
            || block.else_block.map_or(false, |b| self.contains_transition(b));
        let downstream = block.next.map_or(false, |b| self.contains_transition(b));

        here || branches || downstream
    }

    /// Collects every transition destination state id reachable from `id`,
    /// for the init-time `E_SM_TRANS` check (every referenced destination
    /// must name a configured state).
    pub fn collect_transition_targets(&self, id: BlockId, out: &mut Vec<u32>) {
        let block = self.get(id);

        if let Some(Action::Transition { dest_state }) = &block.action {
            out.push(*dest_state);
        }
        if let Some(b) = block.if_block {
            self.collect_transition_targets(b, out);
        }
        if let Some(b) = block.else_block {
            self.collect_transition_targets(b, out);
        }
        if let Some(b) = block.next {
            self.collect_transition_targets(b, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::expr::ExprArena;

    #[test]
    fn straight_line_chain_executes_in_order() {
        let mut cell_a: i32 = 0;
        let mut cell_b: i32 = 0;
        let elem_a = unsafe { Element::from_raw(&mut cell_a as *mut i32) };
        let elem_b = unsafe { Element::from_raw(&mut cell_b as *mut i32) };

        let mut exprs = ExprArena::new();
        let one = exprs.konst(1i32);
        let two = exprs.konst(2i32);

        let mut blocks = BlockArena::new();
        let second = blocks.push(Block::new().action(Action::assign(elem_b, two)));
        let first = blocks.push(Block::new().action(Action::assign(elem_a, one)).next(second));

        let dest = blocks.execute(first, &exprs);
        assert_eq!(dest, 0);
        assert_eq!(elem_a.read(), 1);
        assert_eq!(elem_b.read(), 2);
    }

    #[test]
    fn guard_picks_branch_and_propagates_transition() {
        let mut exprs = ExprArena::new();
        let t = exprs.konst(true);

        let mut blocks = BlockArena::new();
        let if_branch = blocks.push(Block::new().action(Action::transition(5)));
        let else_branch = blocks.push(Block::new().action(Action::transition(9)));
        let root = blocks.push(
            Block::new()
                .guard(t)
                .if_block(if_branch)
                .else_block(else_branch),
        );

        assert_eq!(blocks.execute(root, &exprs), 5);
    }

    #[test]
    fn transition_short_circuits_next() {
        let mut cell: i32 = 0;
        let elem = unsafe { Element::from_raw(&mut cell as *mut i32) };
        let mut exprs = ExprArena::new();
        let nine = exprs.konst(9i32);

        let mut blocks = BlockArena::new();
        let skipped = blocks.push(Block::new().action(Action::assign(elem, nine)));
        let root = blocks.push(Block::new().action(Action::transition(2)).next(skipped));

        assert_eq!(blocks.execute(root, &exprs), 2);
        assert_eq!(elem.read(), 0, "next must not execute after a transition");
    }

    #[test]
    fn null_block_is_a_nop() {
        let mut blocks = BlockArena::new();
        let exprs = ExprArena::new();
        let id = blocks.push(Block::new());
        assert_eq!(blocks.execute(id, &exprs), 0);
    }

    #[test]
    fn contains_transition_sees_through_branches_and_chains() {
        let mut blocks = BlockArena::new();
        let deep = blocks.push(Block::new().action(Action::transition(1)));
        let mid = blocks.push(Block::new().next(deep));
        let leaf = blocks.push(Block::new());

        assert!(blocks.contains_transition(mid));
        assert!(!blocks.contains_transition(leaf));
    }
}
