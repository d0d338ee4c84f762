//! # Settlement Gate
//!
//! ```text
//!                  policy checks pass
//!   ┌────────────┐ ─────────────────► ┌─────────┐  fully paid   ┌──────────┐
//!   │ Incomplete │                    │  Ready  │ ────────────► │ Settling │
//!   └────────────┘ ◄───────────────── └─────────┘               └────┬─────┘
//!         ▲          a check fails         ▲                         │
//!         │                                │ immediately        ok   │  err
//!         │ next edit   ┌─────────┐   ┌────┴───┐                     │
//!         └──────────── │ Settled │◄──┤        │◄────────────────────┘
//!                       └─────────┘   │ Failed │
//!                                     └────────┘
//! ```
//!
//! `Failed` is transient: the session records the failure message and lands
//! back in `Ready` so the operator can retry without re-entering payments.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Incomplete,
    Ready,
    Settling,
    Settled,
    Failed,
}

impl GateState {
    /// The resting state for an open ticket given whether policy checks pass.
    pub fn for_open_ticket(checks_pass: bool) -> Self {
        if checks_pass {
            GateState::Ready
        } else {
            GateState::Incomplete
        }
    }

    /// Whether the machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: GateState) -> bool {
        use GateState::*;
        matches!(
            (self, next),
            (Incomplete, Ready)
                | (Ready, Incomplete)
                | (Ready, Settling)
                | (Settling, Settled)
                | (Settling, Failed)
                | (Failed, Ready)
                | (Settled, Incomplete)
                | (Settled, Ready)
        )
    }

    /// Ticket and payments are frozen.
    pub fn is_locked(&self) -> bool {
        matches!(self, GateState::Settling)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateState::Incomplete => "incomplete",
            GateState::Ready => "ready",
            GateState::Settling => "settling",
            GateState::Settled => "settled",
            GateState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Holds the current gate state and logs each transition.
#[derive(Debug, Clone, Default)]
pub(crate) struct Gate {
    state: GateState,
}

impl Gate {
    pub(crate) fn state(&self) -> GateState {
        self.state
    }

    /// Moves to `next` if the machine allows it. Same-state moves are no-ops.
    pub(crate) fn transition(&mut self, next: GateState) -> bool {
        if self.state == next {
            return true;
        }
        if !self.state.can_transition_to(next) {
            return false;
        }
        info!(from = %self.state, to = %next, "Gate transition");
        self.state = next;
        true
    }

    /// Re-evaluates an open ticket (`Incomplete` or `Ready`).
    pub(crate) fn refresh(&mut self, checks_pass: bool) {
        if matches!(self.state, GateState::Incomplete | GateState::Ready) {
            self.transition(GateState::for_open_ticket(checks_pass));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(GateState::Incomplete.can_transition_to(GateState::Ready));
        assert!(GateState::Ready.can_transition_to(GateState::Settling));
        assert!(GateState::Settling.can_transition_to(GateState::Failed));
        assert!(GateState::Failed.can_transition_to(GateState::Ready));
        assert!(GateState::Settling.can_transition_to(GateState::Settled));
    }

    #[test]
    fn test_forbidden_transitions() {
        assert!(!GateState::Incomplete.can_transition_to(GateState::Settling));
        assert!(!GateState::Settling.can_transition_to(GateState::Ready));
        assert!(!GateState::Failed.can_transition_to(GateState::Settling));
        assert!(!GateState::Settled.can_transition_to(GateState::Settling));
    }

    #[test]
    fn test_gate_refresh_only_affects_open_states() {
        let mut gate = Gate::default();
        gate.refresh(true);
        assert_eq!(gate.state(), GateState::Ready);

        assert!(gate.transition(GateState::Settling));
        gate.refresh(false);
        assert_eq!(gate.state(), GateState::Settling);
        assert!(gate.state().is_locked());

        assert!(!gate.transition(GateState::Incomplete));
        assert!(gate.transition(GateState::Failed));
        assert!(gate.transition(GateState::Ready));
    }

    #[test]
    fn test_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&GateState::Settling).unwrap(), "\"settling\"");
    }
}
