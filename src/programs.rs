//! A registry of embedded machine definitions, loadable by name or index.
//! The definitions ship with the crate under `machines/` and are compiled in
//! with `include_str!`; only call-free definitions are embedded, since call
//! transitions resolve against the file system.

use crate::loader::ProgramLoader;
use crate::types::{Program, TuringMachineError};

use std::sync::RwLock;

// Default embedded programs
const PROGRAM_TEXTS: [&str; 4] = [
    include_str!("../machines/palindrome.mt"),
    include_str!("../machines/increment.mt"),
    include_str!("../machines/copy.mt"),
    include_str!("../machines/erase.mt"),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<Program>> = RwLock::new(Vec::new());
}

pub struct ProgramManager;

impl ProgramManager {
    /// Initialize the ProgramManager with the embedded programs
    pub fn load() -> Result<(), TuringMachineError> {
        let mut programs = Vec::new();

        for program_text in PROGRAM_TEXTS {
            programs.push(ProgramLoader::load_program_from_string(program_text)?);
        }

        if let Ok(mut write_guard) = PROGRAMS.write() {
            *write_guard = programs;
        } else {
            return Err(TuringMachineError::FileError(
                "failed to acquire write lock".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        let _ = Self::load();

        PROGRAMS.read().map(|programs| programs.len()).unwrap_or(0)
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Program, TuringMachineError> {
        let _ = Self::load();

        PROGRAMS
            .read()
            .map_err(|_| TuringMachineError::FileError("failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("program index {index} out of range"))
            })
    }

    /// Get a program by its name
    pub fn get_program_by_name(name: &str) -> Result<Program, TuringMachineError> {
        let _ = Self::load();

        PROGRAMS
            .read()
            .map_err(|_| TuringMachineError::FileError("failed to acquire read lock".to_string()))?
            .iter()
            .find(|program| program.name == name)
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("program '{name}' not found"))
            })
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        let _ = Self::load();

        PROGRAMS
            .read()
            .map(|programs| {
                programs
                    .iter()
                    .map(|program| program.name.clone())
                    .collect()
            })
            .unwrap_or_else(|_| Vec::new())
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, TuringMachineError> {
        let program = Self::get_program_by_index(index)?;

        Ok(ProgramInfo {
            index,
            name: program.name.clone(),
            initial_state: program.initial_state.clone(),
            accept_state: program.accept_state.clone(),
            tape_count: program.tape_count,
            state_count: program.states.len(),
            transition_count: program.transition_count(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub initial_state: String,
    pub accept_state: String,
    pub tape_count: usize,
    pub state_count: usize,
    pub transition_count: usize,
}
