//! This module defines the execution engine. A [`RunningMachine`] borrows an immutable
//! [`Machine`] and owns everything that changes during a run: the tape, the head position,
//! the current state and the step count.

use serde::Serialize;
use std::fmt;
use tracing::{debug, trace};

use crate::tape::Tape;
use crate::types::{
    display_symbol, Direction, Machine, Rule, RuntimeError, State, StateId, Symbol,
};

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step<'m> {
    /// The given rule was applied.
    Continue(&'m Rule),
    /// No rule of the current state reads the symbol under the head.
    Halt,
}

/// Why a run stopped. Halting on a missing rule is the only way a run ends normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HaltReason {
    NoMatchingRule,
}

/// Options for [`run_with`].
///
/// The default is unbounded execution without a trace, matching [`run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum number of rules to apply before giving up.
    pub step_limit: Option<usize>,
    /// Record a [`TraceEntry`] per applied step.
    pub record_trace: bool,
}

impl RunConfig {
    /// Unbounded execution without a trace.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn with_trace(mut self) -> Self {
        self.record_trace = true;
        self
    }
}

/// One applied step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    /// 1-based step number.
    pub step: usize,
    pub state: String,
    pub head: i64,
    pub read: Symbol,
    pub write: Symbol,
    pub direction: Direction,
    pub next_state: String,
}

/// The observable result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Name of the state the machine halted in.
    pub final_state: String,
    pub final_state_id: StateId,
    pub halted_by: HaltReason,
    /// Number of rules applied.
    pub steps: usize,
    /// Final head position, relative to the first input symbol.
    pub head: i64,
    /// Offset of the first cell of `tape`.
    pub tape_origin: i64,
    /// The non-blank region of the final tape.
    pub tape: Vec<Symbol>,
    /// Applied steps, when tracing was requested.
    pub trace: Vec<TraceEntry>,
}

impl ExecutionResult {
    /// The final tape region as text, blanks rendered as `_`.
    pub fn tape_string(&self) -> String {
        self.tape.iter().copied().map(display_symbol).collect()
    }
}

/// A view of one machine configuration, handed to an [`Observer`].
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// Number of steps applied so far.
    pub step: usize,
    pub state: &'a State,
    pub head: i64,
    pub tape: &'a Tape,
}

impl fmt::Display for Snapshot<'_> {
    /// Prints the tape, a caret under the head and the current state:
    ///
    /// ```text
    /// 1001
    ///  ^ B
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = match self.tape.bounds() {
            Some((start, end)) => (start.min(self.head), end.max(self.head)),
            None => (self.head, self.head),
        };
        let padding = (self.head - start) as usize;

        writeln!(f, "{}", self.tape.render(start, end))?;
        write!(f, "{:padding$}^ {}", "", self.state.name())
    }
}

/// Receives every configuration of a run: the initial one and one after each applied step.
///
/// Observers only look; they cannot influence the run. Closures taking a [`Snapshot`]
/// implement this trait.
pub trait Observer {
    fn observe(&mut self, snapshot: &Snapshot<'_>);
}

impl<F> Observer for F
where
    F: FnMut(&Snapshot<'_>),
{
    fn observe(&mut self, snapshot: &Snapshot<'_>) {
        (*self)(snapshot)
    }
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn observe(&mut self, _snapshot: &Snapshot<'_>) {}
}

/// A machine in the middle of a run.
pub struct RunningMachine<'m> {
    machine: &'m Machine,
    tape: Tape,
    head: i64,
    state: StateId,
    step_count: usize,
}

impl<'m> RunningMachine<'m> {
    /// Starts a run: `input` is written from offset 0, the head sits on offset 0 and the
    /// machine is in its initial state.
    pub fn new(machine: &'m Machine, input: &[Symbol]) -> Self {
        Self {
            machine,
            tape: Tape::from_input(input),
            head: 0,
            state: machine.initial_id(),
            step_count: 0,
        }
    }

    /// Executes a single step.
    ///
    /// Reads the symbol under the head and looks up the rule of the current state that
    /// reads it. Without such a rule the machine halts and nothing changes. Otherwise the
    /// rule's symbol is written, the state switches and the head moves.
    pub fn step(&mut self) -> Step<'m> {
        let Some(rule) = self.transition() else {
            return Step::Halt;
        };

        self.tape.write(self.head, rule.write);
        self.state = rule.next_state;
        self.head += rule.direction.delta();
        self.step_count += 1;

        Step::Continue(rule)
    }

    /// The rule that the next step would apply, if any.
    pub fn transition(&self) -> Option<&'m Rule> {
        let machine: &'m Machine = self.machine;
        machine.state(self.state).rule_for(self.symbol())
    }

    /// Whether the machine has halted, i.e. no rule matches the current configuration.
    pub fn is_halted(&self) -> bool {
        self.transition().is_none()
    }

    /// The symbol under the head.
    pub fn symbol(&self) -> Symbol {
        self.tape.read(self.head)
    }

    /// The current state.
    pub fn state(&self) -> &'m State {
        let machine: &'m Machine = self.machine;
        machine.state(self.state)
    }

    pub fn state_id(&self) -> StateId {
        self.state
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Returns the total number of steps executed so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// A view of the current configuration.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            step: self.step_count,
            state: self.state(),
            head: self.head,
            tape: &self.tape,
        }
    }

    /// Ends the run, consuming the tape.
    fn finish(self, trace: Vec<TraceEntry>) -> ExecutionResult {
        let (tape_origin, tape) = self.tape.written();
        let final_state = self.machine.state(self.state).name().to_string();

        debug!(
            final_state = final_state.as_str(),
            steps = self.step_count,
            head = self.head,
            "machine halted"
        );

        ExecutionResult {
            final_state,
            final_state_id: self.state,
            halted_by: HaltReason::NoMatchingRule,
            steps: self.step_count,
            head: self.head,
            tape_origin,
            tape,
            trace,
        }
    }
}

/// Runs `machine` on `input` until no rule applies.
///
/// There is no step bound: a machine that never halts makes this call never return. Use
/// [`run_with`] and a step limit for untrusted machines.
pub fn run(machine: &Machine, input: &[Symbol]) -> ExecutionResult {
    let mut running = RunningMachine::new(machine, input);
    while let Step::Continue(rule) = running.step() {
        trace!(
            step = running.step_count(),
            state = running.state().name(),
            head = running.head(),
            direction = %rule.direction,
            "applied rule"
        );
    }

    running.finish(Vec::new())
}

/// Runs `machine` on `input` with the given configuration, reporting every configuration
/// to `observer`.
///
/// # Returns
///
/// * `Ok(ExecutionResult)` once the machine halts.
/// * `Err(RuntimeError::StepLimitExceeded)` if a rule still applies after `step_limit`
///   steps. A machine that halts after exactly `step_limit` steps succeeds.
pub fn run_with<O>(
    machine: &Machine,
    input: &[Symbol],
    config: &RunConfig,
    observer: &mut O,
) -> Result<ExecutionResult, RuntimeError>
where
    O: Observer + ?Sized,
{
    let mut running = RunningMachine::new(machine, input);
    let mut trace = Vec::new();

    observer.observe(&running.snapshot());

    loop {
        if let Some(limit) = config.step_limit {
            if running.step_count() >= limit && !running.is_halted() {
                return Err(RuntimeError::StepLimitExceeded {
                    limit,
                    state: running.state().name().to_string(),
                    head: running.head(),
                });
            }
        }

        let state = running.state();
        let head = running.head();

        let Step::Continue(rule) = running.step() else {
            break;
        };

        trace!(
            step = running.step_count(),
            state = state.name(),
            head,
            read = ?display_symbol(rule.read),
            write = ?display_symbol(rule.write),
            direction = %rule.direction,
            "applied rule"
        );

        if config.record_trace {
            trace.push(TraceEntry {
                step: running.step_count(),
                state: state.name().to_string(),
                head,
                read: rule.read,
                write: rule.write,
                direction: rule.direction,
                next_state: machine.state(rule.next_state).name().to_string(),
            });
        }

        observer.observe(&running.snapshot());
    }

    Ok(running.finish(trace))
}
