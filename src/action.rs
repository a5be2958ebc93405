//! Actions: the side-effecting leaves a [`crate::block::Block`] invokes.
//!
//! Grounded in `sfa/core/Action.hpp`'s `IAction`/`AssignmentAction`/
//! `TransitionAction`. The original expresses both as subclasses of a common
//! virtual `execute() -> bool` plus a `destState` field that's unused by
//! assignments; here that's a closed two-variant enum instead, and the
//! per-type write an `AssignmentAction<T>` subclass gave the original for
//! free is captured by an assembly-time closure instead of a vtable.

use crate::element::Element;
use crate::expr::{ExprArena, ExprId};
use crate::types::Scalar;

/// `0` is reserved to mean "no transition" (see [`crate::block`]).
pub const NO_TRANSITION: u32 = 0;

/// A side effect a block's `action` slot invokes once per execution.
pub enum Action {
    /// Evaluates `rhs` and writes it to `lhs`. Never requests a transition.
    Assignment(Assignment),
    /// Unconditionally requests a transition to `dest_state`, which must be
    /// nonzero (enforced by [`Action::transition`]).
    Transition { dest_state: u32 },
}

/// A typed `lhs := rhs` pair. The write closure is built once at assembly
/// time and captures `lhs`'s concrete scalar type, so stepping the state
/// machine never needs to know or branch on it.
pub struct Assignment {
    write: Box<dyn Fn(&ExprArena) + Send + Sync>,
}

impl Assignment {
    pub fn new<T: Scalar>(lhs: Element<T>, rhs: ExprId) -> Self {
        Self {
            write: Box::new(move |arena: &ExprArena| {
                let value: T = arena.eval(rhs);
                lhs.write(value);
            }),
        }
    }

    fn execute(&self, arena: &ExprArena) {
        (self.write)(arena);
    }
}

impl Action {
    /// Builds an `Assignment` action.
    pub fn assign<T: Scalar>(lhs: Element<T>, rhs: ExprId) -> Self {
        Action::Assignment(Assignment::new(lhs, rhs))
    }

    /// Builds a `Transition` action. Panics if `dest_state == 0`; `0` is the
    /// sentinel for "no transition" and is never a valid construction-time
    /// destination (a config-authoring bug, not a runtime condition — unlike
    /// the *referenced* destinations the original's `E_SM_TRANS` init check
    /// validates).
    pub fn transition(dest_state: u32) -> Self {
        assert_ne!(dest_state, NO_TRANSITION, "transition to state 0 is invalid");
        Action::Transition { dest_state }
    }

    /// Executes the action, returning the destination state id or
    /// [`NO_TRANSITION`].
    pub fn execute(&self, arena: &ExprArena) -> u32 {
        match self {
            Action::Assignment(a) => {
                a.execute(arena);
                NO_TRANSITION
            }
            Action::Transition { dest_state } => *dest_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprArena;

    #[test]
    fn assignment_writes_evaluated_rhs() {
        let mut cell: i32 = 0;
        let elem = unsafe { Element::from_raw(&mut cell as *mut i32) };
        let mut arena = ExprArena::new();
        let rhs = arena.konst(7i32);
        let action = Action::assign(elem, rhs);

        assert_eq!(action.execute(&arena), NO_TRANSITION);
        assert_eq!(elem.read(), 7);
    }

    #[test]
    fn transition_returns_dest_state() {
        let action = Action::transition(3);
        let arena = ExprArena::new();
        assert_eq!(action.execute(&arena), 3);
    }

    #[test]
    #[should_panic]
    fn transition_to_zero_panics() {
        Action::transition(0);
    }
}
