//! This module provides functions for analyzing machines to spot likely mistakes before
//! execution. Unlike parse errors these findings never make a machine invalid: a machine
//! with unreachable states still runs, it just carries dead weight.

use std::collections::HashSet;
use thiserror::Error;

use crate::types::{display_symbol, Machine, StateId, Symbol, BLANK};

/// Represents the findings of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// States that no sequence of rules leads to from the initial state.
    #[error("Unreachable states detected: {0:?}")]
    UnreachableStates(Vec<String>),
    /// The accepting set is empty, so every run is rejected.
    #[error("No accepting states declared")]
    NoAcceptingStates,
    /// Accepting states exist but none is reachable, so every run is rejected.
    #[error("No accepting state is reachable from the initial state")]
    NeverAccepts,
    /// Input symbols that no rule of any state reads.
    #[error("Input contains symbols not read by any rule: {0:?}")]
    UnhandledInputSymbols(Vec<char>),
}

/// Analyzes a machine for structural oddities.
///
/// # Arguments
///
/// * `machine` - The machine to analyze.
///
/// # Returns
///
/// * The list of findings, empty when nothing looks suspicious.
pub fn analyze(machine: &Machine) -> Vec<Warning> {
    let reachable = reachable_states(machine);

    [check_unreachable_states, check_accepting_states]
        .iter()
        .filter_map(|check| check(machine, &reachable))
        .collect()
}

/// Checks an input word against the symbols the machine's rules read.
///
/// The blank is always considered handled.
pub fn check_input(machine: &Machine, input: &[Symbol]) -> Option<Warning> {
    let handled: HashSet<Symbol> = machine
        .states()
        .iter()
        .flat_map(|state| state.rules())
        .map(|rule| rule.read)
        .collect();

    let mut unhandled: Vec<char> = input
        .iter()
        .copied()
        .filter(|symbol| *symbol != BLANK && !handled.contains(symbol))
        .map(display_symbol)
        .collect();

    if unhandled.is_empty() {
        return None;
    }

    unhandled.sort_unstable();
    unhandled.dedup();
    Some(Warning::UnhandledInputSymbols(unhandled))
}

/// Collects the states reachable from the initial state with a depth-first traversal.
fn reachable_states(machine: &Machine) -> HashSet<StateId> {
    let mut visited = HashSet::new();
    let mut queue = vec![machine.initial_id()];

    while let Some(id) = queue.pop() {
        if !visited.insert(id) {
            continue;
        }

        for rule in machine.state(id).rules() {
            if !visited.contains(&rule.next_state) {
                queue.push(rule.next_state);
            }
        }
    }

    visited
}

fn check_unreachable_states(machine: &Machine, reachable: &HashSet<StateId>) -> Option<Warning> {
    // Header order keeps the output deterministic
    let unreachable: Vec<String> = machine
        .states()
        .iter()
        .enumerate()
        .filter(|(id, _)| !reachable.contains(id))
        .map(|(_, state)| state.name().to_string())
        .collect();

    (!unreachable.is_empty()).then_some(Warning::UnreachableStates(unreachable))
}

fn check_accepting_states(machine: &Machine, reachable: &HashSet<StateId>) -> Option<Warning> {
    let accepting = machine.accepting_ids();

    if accepting.is_empty() {
        return Some(Warning::NoAcceptingStates);
    }

    (!accepting.iter().any(|id| reachable.contains(id))).then_some(Warning::NeverAccepts)
}
