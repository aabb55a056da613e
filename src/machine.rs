//! This module defines the `TuringMachine` struct, which executes a loaded
//! multi-tape program. It owns the machine's tapes and current state and
//! exposes stepping, full execution, resetting, word loading and a read-only
//! configuration snapshot.

use crate::tape::Tape;
use crate::types::{
    is_input_symbol, Outcome, Program, Snapshot, Step, TransitionKey, TuringMachineError,
};

/// A multi-tape Turing machine.
///
/// The machine is constructed from a fully linked [`Program`] and starts with
/// empty tapes; input words are placed with [`set_word`](Self::set_word). The
/// transition table is never mutated during execution, so a machine can be
/// `reset` and rerun across many words without reloading.
pub struct TuringMachine {
    state: String,
    tapes: Vec<Tape>,
    program: Program,
    step_count: usize,
}

impl TuringMachine {
    /// Creates a new `TuringMachine` for the given `Program`, in the
    /// program's initial state with all tapes empty.
    pub fn new(program: Program) -> Self {
        Self {
            state: program.initial_state.clone(),
            tapes: vec![Tape::new(); program.tape_count],
            program,
            step_count: 0,
        }
    }

    /// Executes a single step.
    ///
    /// The lookup key is the current state plus the symbol under each head
    /// (out-of-range reads yield blank). On a match the machine writes each
    /// tape, moves each head and enters the next state. With the accept
    /// state reached, or no matching entry, the machine halts; a missing
    /// entry is the reject outcome and mutates nothing.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if a transition fired.
    /// * `Step::Halt(outcome)` once the machine is in a terminal outcome;
    ///   further calls keep returning it.
    pub fn step(&mut self) -> Step {
        if self.is_accepted() {
            return Step::Halt(Outcome::Accept);
        }

        let key = TransitionKey::new(self.state.clone(), self.symbols());
        let action = match self.program.rules.get(&key) {
            Some(action) => action.clone(),
            None => return Step::Halt(Outcome::Reject),
        };

        for (i, tape) in self.tapes.iter_mut().enumerate() {
            tape.write(action.write[i]);
            tape.shift(action.directions[i]);
        }

        self.state = action.next_state;
        self.step_count += 1;

        Step::Continue
    }

    /// Runs the machine until it accepts or rejects and returns the outcome.
    ///
    /// No step budget is enforced: a non-terminating table loops forever,
    /// matching the underlying model. Callers needing a bound should drive
    /// [`step`](Self::step) themselves.
    pub fn execute(&mut self) -> Outcome {
        loop {
            if let Step::Halt(outcome) = self.step() {
                return outcome;
            }
        }
    }

    /// Resets the machine to its initial configuration: initial state, empty
    /// tapes, heads at position 0. The transition table is untouched.
    pub fn reset(&mut self) {
        self.state = self.program.initial_state.clone();
        for tape in &mut self.tapes {
            tape.clear();
        }
        self.step_count = 0;
    }

    /// Loads a word onto the first tape. See [`set_tape_word`](Self::set_tape_word).
    pub fn set_word(&mut self, word: &str) -> Result<(), TuringMachineError> {
        self.set_tape_word(0, word)
    }

    /// Loads a word onto the given tape, head at position 0.
    ///
    /// Other tapes and the current state are unaffected.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the word was placed.
    /// * `Err(TuringMachineError::ValidationError)` if the tape index is out
    ///   of bounds or the word contains a symbol outside the input alphabet.
    pub fn set_tape_word(
        &mut self,
        tape_index: usize,
        word: &str,
    ) -> Result<(), TuringMachineError> {
        if tape_index >= self.tapes.len() {
            return Err(TuringMachineError::ValidationError(format!(
                "tape index {} is out of bounds (machine has {} tapes)",
                tape_index,
                self.tapes.len()
            )));
        }

        if let Some(c) = word.chars().find(|&c| !is_input_symbol(c)) {
            return Err(TuringMachineError::ValidationError(format!(
                "invalid input symbol '{c}'"
            )));
        }

        self.tapes[tape_index].load(word);
        Ok(())
    }

    /// Returns the current state.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the initial state.
    pub fn initial_state(&self) -> &str {
        &self.program.initial_state
    }

    /// Returns the accept state.
    pub fn accept_state(&self) -> &str {
        &self.program.accept_state
    }

    /// Checks whether the machine is in its accept state.
    pub fn is_accepted(&self) -> bool {
        self.state == self.program.accept_state
    }

    /// Returns the loaded program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Returns the total number of steps executed since the last reset.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Returns a slice of the machine's tapes.
    pub fn tapes(&self) -> &[Tape] {
        &self.tapes
    }

    /// Returns the symbol currently under each tape's head.
    pub fn symbols(&self) -> Vec<char> {
        self.tapes.iter().map(Tape::read).collect()
    }

    /// Returns a read-only view of the current configuration for display.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            tapes: self.tapes.iter().map(Tape::contents).collect(),
            heads: self.tapes.iter().map(Tape::head).collect(),
        }
    }
}
