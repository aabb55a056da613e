//! This crate provides the core logic for a multi-tape Turing machine
//! interpreter. It includes modules for parsing machine definitions, linking
//! compositions of machines into a single transition table, executing them
//! on auto-growing tapes, optimizing transition tables before execution, and
//! managing a collection of embedded example machines.

pub mod loader;
pub mod machine;
pub mod optimizer;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `TuringMachine` struct from the machine module.
pub use machine::TuringMachine;
/// Re-exports the optimization passes from the optimizer module.
pub use optimizer::{optimize, remove_dead_transitions, simplify_chains};
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the machine definition and execution types from the types module.
pub use types::{
    Action, Direction, Outcome, Program, Rules, Snapshot, Step, TransitionKey,
    TuringMachineError, BLANK_SYMBOL, INPUT_ALPHABET, WORKING_ALPHABET,
};
