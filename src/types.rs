//! This module defines the core data structures and types used throughout the simulator:
//! symbols, directions, transition rules, states, the machine definition itself and the
//! error types reported by the parser and the execution engine.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::grammar::Rule as GrammarRule;

/// A single tape symbol.
pub type Symbol = char;

/// Index of a state inside its [`Machine`], in header declaration order.
pub type StateId = usize;

/// The blank symbol: the value of every tape cell that was never written.
pub const BLANK: Symbol = '\0';
/// The placeholder used in descriptions and input words to denote [`BLANK`].
pub const INPUT_BLANK_SYMBOL: char = '_';
/// The maximum accepted size of a machine description, in bytes.
pub const MAX_DESCRIPTION_SIZE: usize = 65536; // 64KB

/// Normalizes the `_` placeholder to the blank symbol.
pub fn normalize_symbol(symbol: char) -> Symbol {
    if symbol == INPUT_BLANK_SYMBOL {
        BLANK
    } else {
        symbol
    }
}

/// Renders a symbol the way it is written in descriptions (`_` for blank).
pub fn display_symbol(symbol: Symbol) -> char {
    if symbol == BLANK {
        INPUT_BLANK_SYMBOL
    } else {
        symbol
    }
}

fn shown(symbol: &Symbol) -> char {
    display_symbol(*symbol)
}

/// Converts an input word into tape symbols, mapping `_` to the blank symbol.
pub fn tape_symbols(input: &str) -> Vec<Symbol> {
    input.chars().map(normalize_symbol).collect()
}

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
    /// Keep the head where it is.
    Stay,
}

impl Direction {
    /// The head offset applied by this direction.
    pub fn delta(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self {
            Direction::Left => '<',
            Direction::Right => '>',
            Direction::Stay => 'S',
        };
        write!(f, "{marker}")
    }
}

/// A single deterministic transition: match `read`, write `write`, move, switch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// The symbol that must be under the head for this rule to apply.
    pub read: Symbol,
    /// The symbol written in place of `read`.
    pub write: Symbol,
    /// The head movement applied after writing.
    pub direction: Direction,
    /// The state the machine switches to.
    pub next_state: StateId,
}

/// A named state and its ordered rule list.
///
/// A state without rules halts on every symbol. Rule input symbols are unique within a
/// state, so lookup by symbol is well defined and does not depend on rule order.
#[derive(Debug, Clone)]
pub struct State {
    name: String,
    rules: Vec<Rule>,
    lookup: HashMap<Symbol, usize>,
}

impl State {
    /// Creates a state with no rules.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// The unique name of this state.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rules of this state, in source order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the rule reading `symbol`, if any.
    pub fn rule_for(&self, symbol: Symbol) -> Option<&Rule> {
        self.lookup.get(&symbol).map(|&i| &self.rules[i])
    }

    /// A state with no rules halts immediately on any symbol.
    pub fn is_halting(&self) -> bool {
        self.rules.is_empty()
    }

    /// Appends a rule. Fails with the index of the existing rule if one already reads the
    /// same symbol.
    pub(crate) fn push_rule(&mut self, rule: Rule) -> Result<(), usize> {
        if let Some(&existing) = self.lookup.get(&rule.read) {
            return Err(existing);
        }

        self.lookup.insert(rule.read, self.rules.len());
        self.rules.push(rule);
        Ok(())
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for State {}

/// A validated machine definition. Immutable once built by the parser.
///
/// The initial state, every rule target and every accepting state are members of the
/// state list; the parser refuses to build a machine otherwise.
#[derive(Debug, Clone)]
pub struct Machine {
    states: Vec<State>,
    index: HashMap<String, StateId>,
    initial: StateId,
    accepting: Vec<StateId>,
    accepting_set: HashSet<StateId>,
    debug: bool,
}

impl Machine {
    /// Assembles a machine from already resolved parts.
    pub(crate) fn from_parts(
        states: Vec<State>,
        initial: StateId,
        accepting: Vec<StateId>,
        debug: bool,
    ) -> Self {
        let index = states
            .iter()
            .enumerate()
            .map(|(id, state)| (state.name.clone(), id))
            .collect();
        let accepting_set = accepting.iter().copied().collect();

        Self {
            states,
            index,
            initial,
            accepting,
            accepting_set,
            debug,
        }
    }

    /// All states, in header declaration order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The state with the given id.
    ///
    /// Ids handed out by this machine are always valid; a foreign id panics.
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    /// Looks up a state by name.
    pub fn state_by_name(&self, name: &str) -> Option<&State> {
        self.id_of(name).map(|id| &self.states[id])
    }

    /// Resolves a state name to its id.
    pub fn id_of(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    /// Id of the initial state.
    pub fn initial_id(&self) -> StateId {
        self.initial
    }

    /// The initial state.
    pub fn initial_state(&self) -> &State {
        &self.states[self.initial]
    }

    /// Accepting states, in the order they were listed.
    pub fn accepting_states(&self) -> impl Iterator<Item = &State> + '_ {
        self.accepting.iter().map(|&id| &self.states[id])
    }

    /// Ids of the accepting states, in the order they were listed.
    pub fn accepting_ids(&self) -> &[StateId] {
        &self.accepting
    }

    /// Rules of the named state, or `None` for an unknown name.
    pub fn rules_of(&self, name: &str) -> Option<&[Rule]> {
        self.state_by_name(name).map(State::rules)
    }

    /// Whether the named state is accepting. Unknown names are never accepting.
    pub fn is_accepting(&self, name: &str) -> bool {
        self.id_of(name).is_some_and(|id| self.is_accepting_id(id))
    }

    /// Whether the state with the given id is accepting.
    pub fn is_accepting_id(&self, id: StateId) -> bool {
        self.accepting_set.contains(&id)
    }

    /// Whether the description asked for verbose tracing (`DEBUG 1`).
    pub fn debug(&self) -> bool {
        self.debug
    }
}

/// Errors reported while parsing a machine description. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The text does not match the description grammar at all.
    #[error("Syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<GrammarRule>>),
    #[error("line {line}: expected the header line declaring all states")]
    MissingHeaderLine { line: usize },
    #[error("missing 'init' line")]
    MissingInitLine,
    #[error("line {line}: initial state '{name}' was not declared in the header")]
    UnknownInitialState { name: String, line: usize },
    #[error("line {line}: accepting state '{name}' was not declared in the header")]
    UnknownAcceptingState { name: String, line: usize },
    #[error("line {line}: block for undeclared state '{name}'")]
    UnknownStateBlock { name: String, line: usize },
    #[error("line {line}, column {column}: rule targets undeclared state '{name}'")]
    UnknownTargetState {
        name: String,
        line: usize,
        column: usize,
    },
    #[error(
        "line {line}: state '{state}' already has a rule reading '{}' (line {first_line})",
        shown(.symbol)
    )]
    DuplicateRuleInput {
        state: String,
        symbol: Symbol,
        line: usize,
        first_line: usize,
    },
    #[error("line {line}: malformed rule line '{text}'")]
    MalformedRuleLine { line: usize, text: String },
    #[error("line {line}: state '{name}' is declared twice")]
    DuplicateStateName { name: String, line: usize },
    #[error("line {line}: state '{name}' already has a block")]
    DuplicateStateBlock { name: String, line: usize },
    #[error("line {line}: duplicate '{section}' line")]
    DuplicateSection { section: &'static str, line: usize },
    #[error("line {line}: rule line outside of a state block")]
    RuleOutsideBlock { line: usize },
    #[error("line {line}: unexpected line '{text}'")]
    UnexpectedLine { line: usize, text: String },
    #[error("description is {0} bytes, the limit is {}", MAX_DESCRIPTION_SIZE)]
    TooLarge(usize),
}

/// Errors raised while running a machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The configured step budget ran out while a rule still applied.
    #[error("step limit of {limit} exceeded in state '{state}' at head position {head}")]
    StepLimitExceeded {
        limit: usize,
        state: String,
        head: i64,
    },
}

/// Represents the errors surfaced by the crate's outer entry points (loader, catalog).
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Description parsing error: {0}")]
    Parse(#[from] ParseError),
    #[error("Execution error: {0}")]
    Runtime(#[from] RuntimeError),
    /// Indicates an error related to reading description files.
    #[error("File error: {0}")]
    FileError(String),
    #[error("Unknown built-in machine: {0}")]
    UnknownMachine(String),
}
