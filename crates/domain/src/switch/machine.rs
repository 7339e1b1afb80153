//! Delayed-revert state machine.
//!
//! Pure bookkeeping for a templated switch that, after being turned on or
//! off, falls back to the state it held before unless something newer
//! happens first. The machine knows nothing about clocks: it hands back a
//! [`PendingRevert`] carrying the delay and the owner decides when the delay
//! has elapsed and calls [`RevertMachine::revert`].

use std::time::Duration;

use crate::template::TemplateResult;

use super::state::SwitchState;

/// A scheduled fall-back to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRevert {
    /// State held immediately before the turn that scheduled this revert.
    pub revert_to: SwitchState,
    /// How long to wait before reverting.
    pub delay: Duration,
}

/// Result of an explicit turn on/off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: SwitchState,
    pub current: SwitchState,
    /// Revert scheduled by this transition, if the delay is non-zero.
    pub scheduled: Option<PendingRevert>,
}

/// Owns the current state and the (at most one) pending revert.
#[derive(Debug, Clone)]
pub struct RevertMachine {
    current: SwitchState,
    pending: Option<PendingRevert>,
    delay: Duration,
}

impl RevertMachine {
    /// A zero `delay` disables reverting entirely.
    #[must_use]
    pub fn new(initial: SwitchState, delay: Duration) -> Self {
        Self {
            current: initial,
            pending: None,
            delay,
        }
    }

    #[must_use]
    pub fn current(&self) -> SwitchState {
        self.current
    }

    #[must_use]
    pub fn pending(&self) -> Option<PendingRevert> {
        self.pending
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Drop the pending revert. Returns whether one was actually cancelled;
    /// calling it again is a no-op.
    pub fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Move to `target` and schedule a revert to the state held right before.
    ///
    /// Any earlier pending revert is replaced.
    pub fn turn(&mut self, target: SwitchState) -> Transition {
        self.pending = None;
        let previous = self.current;
        self.current = target;
        let scheduled = (!self.delay.is_zero()).then_some(PendingRevert {
            revert_to: previous,
            delay: self.delay,
        });
        self.pending = scheduled;
        Transition {
            previous,
            current: target,
            scheduled,
        }
    }

    /// Apply a fresh template result. It is authoritative: the pending
    /// revert is cancelled and nothing new is scheduled.
    pub fn apply_template(&mut self, result: &TemplateResult) -> SwitchState {
        self.pending = None;
        self.current = SwitchState::from_template(result);
        self.current
    }

    /// Fire the pending revert. Returns the restored state, or `None` when
    /// the revert was already cancelled or fired.
    pub fn revert(&mut self) -> Option<SwitchState> {
        let pending = self.pending.take()?;
        self.current = pending.revert_to;
        Some(self.current)
    }
}
