//! The tape: a logically bi-infinite row of cells, blank everywhere except a finite
//! written region. Cells are addressed by signed offset from the initial head position.

use std::collections::VecDeque;
use std::fmt;

use crate::types::{display_symbol, Symbol, BLANK};

/// A growable, double-ended tape.
///
/// Only the cells between the leftmost and rightmost write are stored; reads outside that
/// range yield [`BLANK`]. The buffer grows on either side as the head writes there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tape {
    cells: VecDeque<Symbol>,
    /// Offset of `cells[0]`.
    origin: i64,
}

impl Tape {
    /// Creates an entirely blank tape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tape holding `input` from offset 0 onwards.
    pub fn from_input(input: &[Symbol]) -> Self {
        Self {
            cells: input.iter().copied().collect(),
            origin: 0,
        }
    }

    /// Returns the symbol at `offset`.
    pub fn read(&self, offset: i64) -> Symbol {
        self.index(offset)
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(BLANK)
    }

    /// Writes `symbol` at `offset`, growing the buffer if needed.
    pub fn write(&mut self, offset: i64, symbol: Symbol) {
        if let Some(cell) = self.index(offset).and_then(|i| self.cells.get_mut(i)) {
            *cell = symbol;
            return;
        }

        // Blank cells outside the buffer are already blank.
        if symbol == BLANK {
            return;
        }

        if self.cells.is_empty() {
            self.origin = offset;
            self.cells.push_back(symbol);
        } else if offset < self.origin {
            for _ in offset + 1..self.origin {
                self.cells.push_front(BLANK);
            }
            self.cells.push_front(symbol);
            self.origin = offset;
        } else {
            let end = self.origin + self.cells.len() as i64;
            for _ in end..offset {
                self.cells.push_back(BLANK);
            }
            self.cells.push_back(symbol);
        }
    }

    /// The smallest range of offsets holding every non-blank cell, or `None` for a
    /// blank tape.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        let first = self.cells.iter().position(|&c| c != BLANK)?;
        let last = self.cells.iter().rposition(|&c| c != BLANK)?;
        Some((self.origin + first as i64, self.origin + last as i64))
    }

    /// The non-blank region of the tape and the offset of its first cell.
    ///
    /// A blank tape yields an empty region starting at offset 0.
    pub fn written(&self) -> (i64, Vec<Symbol>) {
        match self.bounds() {
            Some((start, end)) => (start, (start..=end).map(|o| self.read(o)).collect()),
            None => (0, Vec::new()),
        }
    }

    /// Renders the cells from `start` to `end` inclusive, blanks as `_`.
    pub fn render(&self, start: i64, end: i64) -> String {
        (start..=end).map(|o| display_symbol(self.read(o))).collect()
    }

    fn index(&self, offset: i64) -> Option<usize> {
        usize::try_from(offset - self.origin).ok()
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds() {
            Some((start, end)) => f.write_str(&self.render(start, end)),
            None => Ok(()),
        }
    }
}
