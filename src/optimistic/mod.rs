//! Optimistic updates: change local state first, confirm or roll back once
//! the request resolves.
//!
//! A command knows how to `apply`, `confirm` and `rollback` itself against a
//! piece of state. [`Optimistic`] runs it through
//! `Idle -> Applied -> Confirmed | RolledBack` and refuses anything else.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub mod comment;
pub mod like;

pub use comment::CommentThread;
pub use like::{LikeFlag, LikeToggle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Applied,
    Confirmed,
    RolledBack,
}

pub trait OptimisticCommand {
    type State;
    type Output;

    fn apply(&mut self, state: &mut Self::State);
    fn confirm(&mut self, state: &mut Self::State, output: Self::Output);
    fn rollback(&mut self, state: &mut Self::State);
}

#[derive(Debug)]
pub struct Optimistic<C> {
    command: C,
    phase: Phase,
}

impl<C: OptimisticCommand> Optimistic<C> {
    pub fn new(command: C) -> Self {
        Self {
            command,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn command(&self) -> &C {
        &self.command
    }

    pub fn apply(&mut self, state: &mut C::State) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.command.apply(state);
        self.phase = Phase::Applied;
        true
    }

    pub fn confirm(&mut self, state: &mut C::State, output: C::Output) -> bool {
        if self.phase != Phase::Applied {
            return false;
        }
        self.command.confirm(state, output);
        self.phase = Phase::Confirmed;
        true
    }

    pub fn rollback(&mut self, state: &mut C::State) -> bool {
        if self.phase != Phase::Applied {
            return false;
        }
        self.command.rollback(state);
        self.phase = Phase::RolledBack;
        true
    }
}

// User-facing failure message that clears itself after a delay
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransientError {
    message: Option<String>,
    generation: u64,
}

impl TransientError {
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    // Returns the generation to hand to the auto-clear task
    pub fn set(&mut self, message: String) -> u64 {
        self.generation += 1;
        self.message = Some(message);
        self.generation
    }

    // Only clears if nothing newer was recorded in the meantime
    pub fn clear_if(&mut self, generation: u64) {
        if self.generation == generation {
            self.message = None;
        }
    }

    pub fn dismiss(&mut self) {
        self.message = None;
    }
}

pub(crate) fn schedule_error_clear<S>(
    state: Arc<Mutex<S>>,
    slot: fn(&mut S) -> &mut TransientError,
    generation: u64,
    delay: Duration,
) where
    S: Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let mut guard = state.lock();
        slot(&mut *guard).clear_if(generation);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    // Adds to a counter, subtracts on rollback
    struct Add(i32);

    impl OptimisticCommand for Add {
        type State = i32;
        type Output = ();

        fn apply(&mut self, state: &mut i32) {
            *state += self.0;
        }

        fn confirm(&mut self, _state: &mut i32, _output: ()) {}

        fn rollback(&mut self, state: &mut i32) {
            *state -= self.0;
        }
    }

    #[test]
    fn applied_then_confirmed() {
        let mut state = 10;
        let mut op = Optimistic::new(Add(5));
        assert!(op.apply(&mut state));
        assert_eq!(state, 15);
        assert!(op.confirm(&mut state, ()));
        assert_eq!(op.phase(), Phase::Confirmed);
        assert_eq!(state, 15);
    }

    #[test]
    fn applied_then_rolled_back() {
        let mut state = 10;
        let mut op = Optimistic::new(Add(5));
        op.apply(&mut state);
        assert!(op.rollback(&mut state));
        assert_eq!(state, 10);
        assert_eq!(op.phase(), Phase::RolledBack);
    }

    #[test]
    fn illegal_transitions_are_refused() {
        let mut state = 0;
        let mut op = Optimistic::new(Add(1));
        assert!(!op.confirm(&mut state, ()));
        assert!(!op.rollback(&mut state));

        op.apply(&mut state);
        assert!(!op.apply(&mut state));
        op.confirm(&mut state, ());
        assert!(!op.rollback(&mut state));
        assert_eq!(state, 1);
    }

    #[test]
    fn newer_error_survives_older_clear() {
        let mut err = TransientError::default();
        let first = err.set("first".into());
        let _second = err.set("second".into());
        err.clear_if(first);
        assert_eq!(err.message(), Some("second"));
    }
}
