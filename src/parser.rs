//! This module provides the parser for machine descriptions, utilizing the `pest` crate.
//! The grammar in `grammar.pest` classifies each line; this module enforces line order,
//! builds the symbol table from the header and resolves every state reference into a
//! validated [`Machine`].

use crate::{
    grammar::{DescriptionParser, Rule as Syntax},
    types::{
        normalize_symbol, Direction, Machine, ParseError, Rule, State, StateId, Symbol, BLANK,
        MAX_DESCRIPTION_SIZE,
    },
};
use pest::{
    iterators::{Pair, Pairs},
    Parser as PestParser,
};
use std::collections::HashMap;
use tracing::debug;

/// Parses the given description text into a validated [`Machine`].
///
/// This is the main entry point for reading machine descriptions. The header line
/// declares every state, so all names are known before the first rule line is read and
/// every reference is resolved in a single pass. Unresolved names, duplicate rule inputs
/// and out-of-order lines are reported with the offending line number.
///
/// # Arguments
///
/// * `input` - A string slice containing the machine description.
///
/// # Returns
///
/// * `Ok(Machine)` if the description is well formed.
/// * `Err(ParseError)` describing the first problem found otherwise.
pub fn parse(input: &str) -> Result<Machine, ParseError> {
    if input.len() > MAX_DESCRIPTION_SIZE {
        return Err(ParseError::TooLarge(input.len()));
    }

    let Some(program) = DescriptionParser::parse(Syntax::program, input)
        .map_err(Box::new)?
        .next()
    else {
        return Err(ParseError::MissingHeaderLine { line: 1 });
    };

    let machine = parse_lines(program.into_inner())?;

    debug!(
        states = machine.states().len(),
        initial = machine.initial_state().name(),
        accepting = machine.accepting_ids().len(),
        verbose = machine.debug(),
        "parsed machine description"
    );

    Ok(machine)
}

/// Walks the classified lines in order, feeding each one to a [`Builder`].
fn parse_lines(lines: Pairs<Syntax>) -> Result<Machine, ParseError> {
    let mut builder = Builder::default();

    for pair in lines {
        let line = line_of(&pair);
        match pair.as_rule() {
            Syntax::directive => builder.directive(pair, line)?,
            Syntax::header_line => builder.header(pair, line)?,
            Syntax::init_line => builder.init(pair, line)?,
            Syntax::accept_line => builder.accept(pair, line)?,
            Syntax::block_header => builder.block(pair, line)?,
            Syntax::rule_line => builder.rule(pair, line)?,
            Syntax::malformed_rule => {
                builder.require_header(line)?;
                return Err(ParseError::MalformedRuleLine {
                    line,
                    text: pair.as_str().trim().to_string(),
                });
            }
            Syntax::unknown_line => {
                builder.require_header(line)?;
                return Err(ParseError::UnexpectedLine {
                    line,
                    text: pair.as_str().trim().to_string(),
                });
            }
            _ => {} // EOI
        }
    }

    builder.finish()
}

/// Accumulates the machine while lines are read.
#[derive(Default)]
struct Builder {
    debug: bool,
    states: Vec<State>,
    names: HashMap<String, StateId>,
    header: Option<usize>,
    initial: Option<StateId>,
    accepting: Option<Vec<StateId>>,
    /// The state whose block is currently open.
    current: Option<StateId>,
    /// Line of each block header, per state.
    blocks: HashMap<StateId, usize>,
    /// Line of each rule, per state and input symbol.
    rule_lines: HashMap<(StateId, Symbol), usize>,
    has_directive: bool,
}

impl Builder {
    fn directive(&mut self, pair: Pair<Syntax>, line: usize) -> Result<(), ParseError> {
        if line != 1 {
            return Err(ParseError::UnexpectedLine {
                line,
                text: pair.as_str().trim().to_string(),
            });
        }

        self.has_directive = true;
        self.debug = pair
            .into_inner()
            .next()
            .is_some_and(|flag| flag.as_str() == "1");
        Ok(())
    }

    fn header(&mut self, pair: Pair<Syntax>, line: usize) -> Result<(), ParseError> {
        if self.header.is_some() {
            return Err(ParseError::DuplicateSection {
                section: "header",
                line,
            });
        }
        self.current = None;
        self.header = Some(line);

        for name in pair.into_inner() {
            let name = name.as_str();
            if self.names.contains_key(name) {
                return Err(ParseError::DuplicateStateName {
                    name: name.to_string(),
                    line,
                });
            }

            self.names.insert(name.to_string(), self.states.len());
            self.states.push(State::new(name));
        }

        Ok(())
    }

    fn init(&mut self, pair: Pair<Syntax>, line: usize) -> Result<(), ParseError> {
        self.require_header(line)?;
        self.current = None;

        if self.initial.is_some() {
            return Err(ParseError::DuplicateSection {
                section: "init",
                line,
            });
        }

        let name = parse_name(pair);
        let id = self
            .resolve(&name)
            .ok_or(ParseError::UnknownInitialState { name, line })?;

        self.initial = Some(id);
        Ok(())
    }

    fn accept(&mut self, pair: Pair<Syntax>, line: usize) -> Result<(), ParseError> {
        self.require_header(line)?;
        self.current = None;

        if self.accepting.is_some() {
            return Err(ParseError::DuplicateSection {
                section: "accept",
                line,
            });
        }

        let mut accepting = Vec::new();
        for name in pair.into_inner() {
            let name = name.as_str();
            let id = self
                .resolve(name)
                .ok_or_else(|| ParseError::UnknownAcceptingState {
                    name: name.to_string(),
                    line,
                })?;

            // Listing a state twice is harmless.
            if !accepting.contains(&id) {
                accepting.push(id);
            }
        }

        self.accepting = Some(accepting);
        Ok(())
    }

    fn block(&mut self, pair: Pair<Syntax>, line: usize) -> Result<(), ParseError> {
        self.require_header(line)?;

        let name = parse_name(pair);
        let id = self
            .resolve(&name)
            .ok_or_else(|| ParseError::UnknownStateBlock {
                name: name.clone(),
                line,
            })?;

        if self.blocks.insert(id, line).is_some() {
            return Err(ParseError::DuplicateStateBlock { name, line });
        }

        self.current = Some(id);
        Ok(())
    }

    fn rule(&mut self, pair: Pair<Syntax>, line: usize) -> Result<(), ParseError> {
        self.require_header(line)?;
        let state = self.current.ok_or(ParseError::RuleOutsideBlock { line })?;

        let text = pair.as_str().trim().to_string();
        let mut pairs = pair.into_inner();
        let (Some(read), Some(write), Some(direction), Some(target)) =
            (pairs.next(), pairs.next(), pairs.next(), pairs.next())
        else {
            return Err(ParseError::MalformedRuleLine { line, text });
        };

        let read = parse_symbol(read.as_str());
        let write = parse_symbol(write.as_str());
        let direction = parse_direction(direction.as_str())
            .ok_or(ParseError::MalformedRuleLine { line, text })?;

        let column = target.line_col().1;
        let next_state =
            self.resolve(target.as_str())
                .ok_or_else(|| ParseError::UnknownTargetState {
                    name: target.as_str().to_string(),
                    line,
                    column,
                })?;

        let rule = Rule {
            read,
            write,
            direction,
            next_state,
        };

        if self.states[state].push_rule(rule).is_err() {
            let first_line = self.rule_lines.get(&(state, read)).copied().unwrap_or(line);
            return Err(ParseError::DuplicateRuleInput {
                state: self.states[state].name().to_string(),
                symbol: read,
                line,
                first_line,
            });
        }

        self.rule_lines.insert((state, read), line);
        Ok(())
    }

    /// Every line other than the directive must follow the header.
    fn require_header(&self, line: usize) -> Result<(), ParseError> {
        if self.header.is_none() {
            return Err(ParseError::MissingHeaderLine { line });
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<StateId> {
        self.names.get(name).copied()
    }

    fn finish(self) -> Result<Machine, ParseError> {
        if self.header.is_none() {
            // Only blank lines and the directive were seen.
            let line = if self.has_directive { 2 } else { 1 };
            return Err(ParseError::MissingHeaderLine { line });
        }

        let initial = self.initial.ok_or(ParseError::MissingInitLine)?;
        let accepting = self.accepting.unwrap_or_default();

        Ok(Machine::from_parts(
            self.states,
            initial,
            accepting,
            self.debug,
        ))
    }
}

/// Parses a single direction marker.
///
/// Supports '>' or 'R' for Right, '<' or 'L' for Left, and 'S' for Stay.
fn parse_direction(marker: &str) -> Option<Direction> {
    match marker {
        ">" | "R" => Some(Direction::Right),
        "<" | "L" => Some(Direction::Left),
        "S" => Some(Direction::Stay),
        _ => None,
    }
}

/// Parses a single symbol, handling quoted and unquoted forms and the blank placeholder.
fn parse_symbol(input: &str) -> Symbol {
    let inner = if input.len() > 1 {
        input.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')).unwrap_or(input)
    } else {
        input
    };

    inner.chars().next().map_or(BLANK, normalize_symbol)
}

/// Extracts the single state name carried by an `init` line or a block header.
fn parse_name(pair: Pair<Syntax>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

fn line_of(pair: &Pair<Syntax>) -> usize {
    pair.line_col().0
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECOGNIZER: &str = "\
DEBUG 1
A, B, C, D, E, F, G
init A
accept C, F
A:
\t1, 1, >, B
B:
\t1, 1, >, C
\t0, 0, >, D
C:
\t0, 0, >, D
\t1, 1, >, G
D:
\t0, 0, >, D
\t1, 1, >, E
E:
\t_, _, S, F
G:
\t0, 0, >, D
\t1, 1, >, G
\t_, _, S, F
";

    #[test]
    fn test_parse_recognizer() {
        let machine = parse(RECOGNIZER).unwrap();

        assert!(machine.debug());
        assert_eq!(machine.states().len(), 7);
        assert_eq!(machine.initial_state().name(), "A");
        assert!(machine.is_accepting("C"));
        assert!(machine.is_accepting("F"));
        assert!(!machine.is_accepting("A"));

        let g = machine.rules_of("G").unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g[2].read, BLANK);
        assert_eq!(g[2].write, BLANK);
        assert_eq!(g[2].direction, Direction::Stay);
        assert_eq!(machine.state(g[2].next_state).name(), "F");

        // F is declared but has no block
        assert!(machine.state_by_name("F").unwrap().is_halting());
    }

    #[test]
    fn test_parse_structural_invariants() {
        let machine = parse(RECOGNIZER).unwrap();
        let count = machine.states().len();

        assert!(machine.initial_id() < count);
        assert!(machine.accepting_ids().iter().all(|&id| id < count));
        assert!(machine
            .states()
            .iter()
            .flat_map(State::rules)
            .all(|rule| rule.next_state < count));
    }

    #[test]
    fn test_parse_without_directive() {
        let machine = parse("q0 q1\ninit q0\naccept q1\nq0:\n\ta, b, >, q1\n").unwrap();

        assert!(!machine.debug());
        assert_eq!(machine.states().len(), 2);
        assert_eq!(machine.rules_of("q0").unwrap()[0].write, 'b');
    }

    #[test]
    fn test_parse_token_variants() {
        let input = "\
s, t
init s
accept t
s:
    1 -> 0 R t
\t0 -> 1, L, s
\t',' ' ' S t
";
        let machine = parse(input).unwrap();
        let rules = machine.rules_of("s").unwrap();

        assert_eq!(rules.len(), 3);
        assert_eq!((rules[0].read, rules[0].write), ('1', '0'));
        assert_eq!(rules[0].direction, Direction::Right);
        assert_eq!(rules[1].direction, Direction::Left);
        assert_eq!((rules[2].read, rules[2].write), (',', ' '));
        assert_eq!(rules[2].direction, Direction::Stay);
    }

    #[test]
    fn test_parse_crlf_and_blank_lines() {
        let input = "A B\r\n\r\ninit A\r\naccept B\r\nA:\r\n\r\n\t1, 1, >, B\r\n";
        let machine = parse(input).unwrap();

        // The blank line inside the block does not close it
        assert_eq!(machine.rules_of("A").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_missing_accept_line() {
        let machine = parse("A\ninit A\n").unwrap();
        assert_eq!(machine.accepting_ids().len(), 0);
        assert!(machine.initial_state().is_halting());
    }

    #[test]
    fn test_parse_empty_accept_line() {
        let machine = parse("A\ninit A\naccept\n").unwrap();
        assert!(machine.accepting_ids().is_empty());
    }

    #[test]
    fn test_parse_accept_before_init() {
        let machine = parse("A, B\naccept B\ninit A\n").unwrap();
        assert_eq!(machine.initial_state().name(), "A");
        assert!(machine.is_accepting("B"));
    }

    #[test]
    fn test_parse_missing_init() {
        let result = parse("A, B\naccept B\nA:\n\t1, 1, >, B\n");
        assert_eq!(result.unwrap_err(), ParseError::MissingInitLine);
    }

    #[test]
    fn test_parse_empty_input() {
        let error = parse("").unwrap_err();
        assert!(matches!(error, ParseError::MissingHeaderLine { line: 1 }));
    }

    #[test]
    fn test_parse_init_before_header() {
        let error = parse("init A\nA\n").unwrap_err();
        assert_eq!(error, ParseError::MissingHeaderLine { line: 1 });
    }

    #[test]
    fn test_parse_unknown_initial_state() {
        let error = parse("A\ninit Z\n").unwrap_err();
        assert_eq!(
            error,
            ParseError::UnknownInitialState {
                name: "Z".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn test_parse_unknown_accepting_state() {
        let error = parse("A B\ninit A\naccept B, Q\n").unwrap_err();
        assert_eq!(
            error,
            ParseError::UnknownAcceptingState {
                name: "Q".to_string(),
                line: 3
            }
        );
    }

    #[test]
    fn test_parse_unknown_state_block() {
        let error = parse("A\ninit A\nX:\n").unwrap_err();
        assert_eq!(
            error,
            ParseError::UnknownStateBlock {
                name: "X".to_string(),
                line: 3
            }
        );
    }

    #[test]
    fn test_parse_unknown_target_state() {
        let error = parse("A, B\ninit A\nA:\n\t1, 1, >, Q\n").unwrap_err();
        assert_eq!(
            error,
            ParseError::UnknownTargetState {
                name: "Q".to_string(),
                line: 4,
                column: 11
            }
        );
    }

    #[test]
    fn test_parse_duplicate_rule_input() {
        let error = parse("A\ninit A\nA:\n\t1, 1, >, A\n\t1, 0, <, A\n").unwrap_err();
        assert_eq!(
            error,
            ParseError::DuplicateRuleInput {
                state: "A".to_string(),
                symbol: '1',
                line: 5,
                first_line: 4
            }
        );
    }

    #[test]
    fn test_parse_duplicate_blank_input() {
        let error = parse("A\ninit A\nA:\n\t_, 1, >, A\n\t_, _, S, A\n").unwrap_err();
        assert!(matches!(
            error,
            ParseError::DuplicateRuleInput { symbol: BLANK, .. }
        ));
    }

    #[test]
    fn test_parse_malformed_rule_line() {
        let error = parse("A\ninit A\nA:\n\t1, 1, X, A\n").unwrap_err();
        assert_eq!(
            error,
            ParseError::MalformedRuleLine {
                line: 4,
                text: "1, 1, X, A".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rule_outside_block() {
        let error = parse("A\ninit A\n\t1, 1, >, A\n").unwrap_err();
        assert_eq!(error, ParseError::RuleOutsideBlock { line: 3 });
    }

    #[test]
    fn test_parse_block_closed_by_unindented_line() {
        let error = parse("A\nA:\n\t1, 1, >, A\ninit A\n\t0, 0, >, A\n").unwrap_err();
        assert_eq!(error, ParseError::RuleOutsideBlock { line: 5 });
    }

    #[test]
    fn test_parse_duplicate_state_name() {
        let error = parse("A, B, A\ninit A\n").unwrap_err();
        assert!(matches!(error, ParseError::DuplicateStateName { line: 1, .. }));
    }

    #[test]
    fn test_parse_duplicate_state_block() {
        let error = parse("A\ninit A\nA:\n\t1, 1, >, A\nA:\n").unwrap_err();
        assert!(error.to_string().contains("already has a block"));
    }

    #[test]
    fn test_parse_duplicate_init_line() {
        let error = parse("A B\ninit A\ninit B\n").unwrap_err();
        assert_eq!(
            error,
            ParseError::DuplicateSection {
                section: "init",
                line: 3
            }
        );
    }

    #[test]
    fn test_parse_directive_not_on_first_line() {
        let error = parse("A\nDEBUG 1\ninit A\n").unwrap_err();
        assert!(matches!(error, ParseError::UnexpectedLine { line: 2, .. }));
    }

    #[test]
    fn test_parse_unrecognized_line() {
        let error = parse("A\ninit A\n%%%\n").unwrap_err();
        assert_eq!(
            error,
            ParseError::UnexpectedLine {
                line: 3,
                text: "%%%".to_string()
            }
        );
    }

    #[test]
    fn test_parse_keywords_are_not_state_names() {
        let error = parse("init, A\n").unwrap_err();
        assert!(matches!(error, ParseError::MissingHeaderLine { line: 1 }));
    }

    #[test]
    fn test_parse_too_large() {
        let input = "A ".repeat(MAX_DESCRIPTION_SIZE);
        assert!(matches!(parse(&input), Err(ParseError::TooLarge(_))));
    }

    #[test]
    fn test_parse_symbol_forms() {
        assert_eq!(parse_symbol("a"), 'a');
        assert_eq!(parse_symbol("_"), BLANK);
        assert_eq!(parse_symbol("'_'"), BLANK);
        assert_eq!(parse_symbol("' '"), ' ');
        assert_eq!(parse_symbol("'"), '\'');
    }
}
