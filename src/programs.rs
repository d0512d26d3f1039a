//! Built-in machines. Their descriptions are embedded at compile time and parsed once, on
//! first use; the parsed machines are shared read-only by every caller and thread.

use crate::parser::parse;
use crate::types::{Machine, MachineError};
use tracing::warn;

/// Embedded descriptions, by name.
const MACHINE_TEXTS: [(&str, &str); 4] = [
    (
        "ones-zeros-one",
        include_str!("../machines/ones-zeros-one.tm"),
    ),
    ("even-ones", include_str!("../machines/even-ones.tm")),
    (
        "binary-increment",
        include_str!("../machines/binary-increment.tm"),
    ),
    ("busy-beaver-2", include_str!("../machines/busy-beaver-2.tm")),
];

lazy_static::lazy_static! {
    static ref MACHINES: Vec<(&'static str, Machine)> = MACHINE_TEXTS
        .iter()
        .filter_map(|&(name, text)| match parse(text) {
            Ok(machine) => Some((name, machine)),
            Err(e) => {
                warn!(name, error = %e, "failed to parse built-in machine");
                None
            }
        })
        .collect();
}

/// Summary information about a built-in machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineInfo {
    pub name: &'static str,
    pub initial_state: String,
    pub state_count: usize,
    pub rule_count: usize,
    pub accepting_states: Vec<String>,
}

/// Access to the built-in machines.
pub struct Catalog;

impl Catalog {
    /// Names of all built-in machines, in catalog order.
    pub fn names() -> Vec<&'static str> {
        MACHINES.iter().map(|(name, _)| *name).collect()
    }

    /// The description text of a built-in machine.
    pub fn source(name: &str) -> Option<&'static str> {
        MACHINE_TEXTS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, text)| *text)
    }

    /// A built-in machine by name.
    pub fn get(name: &str) -> Result<&'static Machine, MachineError> {
        Self::entry(name).map(|(_, machine)| machine)
    }

    /// Summary information about a built-in machine.
    pub fn info(name: &str) -> Result<MachineInfo, MachineError> {
        let (name, machine) = Self::entry(name)?;

        Ok(MachineInfo {
            name,
            initial_state: machine.initial_state().name().to_string(),
            state_count: machine.states().len(),
            rule_count: machine.states().iter().map(|s| s.rules().len()).sum(),
            accepting_states: machine
                .accepting_states()
                .map(|s| s.name().to_string())
                .collect(),
        })
    }

    fn entry(name: &str) -> Result<(&'static str, &'static Machine), MachineError> {
        MACHINES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(candidate, machine)| (*candidate, machine))
            .ok_or_else(|| MachineError::UnknownMachine(name.to_string()))
    }
}
