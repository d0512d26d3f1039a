//! This crate provides the core logic for a single-tape Turing machine simulator.
//! It includes modules for parsing machine descriptions, running machines on an
//! unbounded tape, judging acceptance, analyzing machines, and loading built-in and
//! on-disk descriptions.

pub mod acceptance;
pub mod analyzer;
pub mod grammar;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum generated from the `pest` grammar.
pub use crate::grammar::Rule as SyntaxRule;
/// Re-exports the acceptance entry points.
pub use acceptance::{accepts, check_accept, evaluate, Verdict};
/// Re-exports the `analyze` function and the `Warning` enum from the analyzer module.
pub use analyzer::{analyze, check_input, Warning};
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
/// Re-exports the execution engine.
pub use machine::{
    run, run_with, ExecutionResult, HaltReason, NoopObserver, Observer, RunConfig,
    RunningMachine, Snapshot, Step, TraceEntry,
};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `Catalog` and `MachineInfo` from the programs module.
pub use programs::{Catalog, MachineInfo};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the machine model and error types from the types module.
pub use types::{
    tape_symbols, Direction, Machine, MachineError, ParseError, Rule, RuntimeError, State,
    StateId, Symbol, BLANK, INPUT_BLANK_SYMBOL, MAX_DESCRIPTION_SIZE,
};
