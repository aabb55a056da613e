//! This module defines the core data structures used throughout the crate:
//! the alphabets, transition keys and actions, programs, execution outcomes,
//! and the error type shared by the parser, loader and machine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::Rule;

/// The blank symbol, used for every cell that has never been written.
pub const BLANK_SYMBOL: char = '_';
/// The working alphabet: every symbol that may appear on a tape.
pub const WORKING_ALPHABET: [char; 4] = ['0', '1', '_', '#'];
/// The input alphabet: symbols valid in externally supplied words.
/// Excludes the blank symbol.
pub const INPUT_ALPHABET: [char; 3] = ['0', '1', '#'];

/// Checks whether a character belongs to the working alphabet.
pub fn is_working_symbol(c: char) -> bool {
    WORKING_ALPHABET.contains(&c)
}

/// Checks whether a character belongs to the input alphabet.
pub fn is_input_symbol(c: char) -> bool {
    INPUT_ALPHABET.contains(&c)
}

/// The lookup key of a transition: the machine's current state together with
/// the symbol read from each tape.
///
/// Lookups are exact-match only; there are no wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransitionKey {
    /// The state the machine must be in.
    pub state: String,
    /// The symbol that must be under the head of each tape, in tape order.
    pub read: Vec<char>,
}

impl TransitionKey {
    pub fn new(state: impl Into<String>, read: Vec<char>) -> Self {
        Self {
            state: state.into(),
            read,
        }
    }
}

/// The effect of a transition: the state to enter, the symbol written to each
/// tape, and the direction each head moves afterwards.
///
/// The `write` and `directions` vectors always have the machine's tape count
/// as their length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The next state the machine transitions to.
    pub next_state: String,
    /// A vector of characters to be written to each tape.
    pub write: Vec<char>,
    /// A vector of directions for each tape's head to move after the write.
    pub directions: Vec<Direction>,
}

/// A fully resolved transition table: one action per key.
pub type Rules = HashMap<TransitionKey, Action>;

/// Represents the possible directions a tape head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

/// A fully loaded and linked machine definition.
///
/// Produced by the loader: every call transition has already been spliced, so
/// `rules` contains no pending sub-machine references. The table is the
/// machine's entire program; `states` is kept for inspection only and plays
/// no part in execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The name of the machine, defaulting to its source path.
    pub name: String,
    /// The initial state.
    pub initial_state: String,
    /// The accept state. Reject is not a state; see [`Outcome`].
    pub accept_state: String,
    /// The number of tapes, inferred from the first transition of the source.
    pub tape_count: usize,
    /// Every state referenced by the table, sorted, for inspection.
    pub states: Vec<String>,
    /// The transition table.
    pub rules: Rules,
}

impl Program {
    /// Checks if the program is for a single-tape machine.
    pub fn is_single_tape(&self) -> bool {
        self.tape_count == 1
    }

    /// Total number of transitions in the table.
    pub fn transition_count(&self) -> usize {
        self.rules.len()
    }
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// The machine performed a transition and continues execution.
    Continue,
    /// The machine has reached a terminal outcome.
    Halt(Outcome),
}

/// The terminal outcome of an execution.
///
/// Reject is a first-class control outcome, not a named state: it is reached
/// whenever no transition matches the current configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The machine reached its accept state.
    Accept,
    /// No transition matched the current configuration.
    Reject,
}

/// A read-only view of a machine's configuration, for display layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The current state.
    pub state: String,
    /// The contents of each tape.
    pub tapes: Vec<String>,
    /// The head position of each tape.
    pub heads: Vec<isize>,
}

/// Represents the errors that can occur while loading or driving a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// Indicates a format violation in a machine definition.
    #[error("program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an inconsistency that is not tied to a single source span,
    /// such as a missing `init:` or `accept:` declaration.
    #[error("program validation error: {0}")]
    ValidationError(String),
    /// Indicates that a sub-machine referenced by a call transition could
    /// not be loaded. Carries the referencing file and line and the
    /// underlying failure, which may itself be a nested `SubMachineError`.
    #[error("{file}:{line}: failed to load sub-machine {path}: {source}")]
    SubMachineError {
        /// The file containing the call transition.
        file: String,
        /// The path of the sub-machine that failed to load.
        path: String,
        /// The line of the call transition.
        line: usize,
        /// The underlying failure.
        #[source]
        source: Box<TuringMachineError>,
    },
    /// Indicates an error reading a definition file from disk.
    #[error("file error: {0}")]
    FileError(String),
}

impl TuringMachineError {
    /// Attaches a source path to a parse error so that its rendered span
    /// names the offending file. Other variants are returned unchanged.
    pub(crate) fn with_path(self, path: &str) -> Self {
        match self {
            TuringMachineError::ParseError(e) => {
                TuringMachineError::ParseError(Box::new(e.with_path(path)))
            }
            other => other,
        }
    }
}
