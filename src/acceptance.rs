//! Acceptance: a run accepts exactly when it halts in one of the machine's accepting states.

use serde::Serialize;
use std::fmt;

use crate::machine::{run, ExecutionResult};
use crate::types::{Machine, Symbol};

/// The verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        self == Verdict::Accepted
    }
}

impl From<bool> for Verdict {
    fn from(accepted: bool) -> Self {
        if accepted {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => f.write_str("ACCEPTED"),
            Verdict::Rejected => f.write_str("REJECTED"),
        }
    }
}

/// Whether `state_name` is one of the machine's accepting states.
pub fn accepts(machine: &Machine, state_name: &str) -> bool {
    machine.is_accepting(state_name)
}

/// The verdict for a finished run of `machine`.
pub fn evaluate(machine: &Machine, result: &ExecutionResult) -> Verdict {
    machine.is_accepting_id(result.final_state_id).into()
}

/// Runs `machine` on `input` and judges the final state.
pub fn check_accept(machine: &Machine, input: &[Symbol]) -> (ExecutionResult, Verdict) {
    let result = run(machine, input);
    let verdict = evaluate(machine, &result);
    (result, verdict)
}
