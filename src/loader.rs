//! This module provides the `ProgramLoader` struct, responsible for loading
//! machine definitions from files, strings and directories, and for linking:
//! every call transition is resolved by recursively loading the named
//! sub-machine and splicing its transition table into the host's, with all
//! sub-machine states renamed to stay globally unique.

use crate::parser::{parse, Entry, Source};
use crate::types::{
    Action, Direction, Program, Rules, TransitionKey, TuringMachineError,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Hands out the disambiguation tags appended to spliced sub-machine states.
///
/// One allocator is threaded through an entire top-level load and never
/// reset, so every call site of the composition tree gets a distinct tag,
/// including repeated and nested calls to the same definition file.
#[derive(Debug, Default)]
struct SuffixAllocator {
    next: u32,
}

impl SuffixAllocator {
    fn new() -> Self {
        Self::default()
    }

    fn next_tag(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}

/// Renames a sub-machine state with a call site's tag.
///
/// Tags stack across nesting levels: a state spliced twice carries one
/// suffix per level, and distinct outermost tags keep any two call chains
/// apart.
fn suffixed(state: &str, tag: u32) -> String {
    format!("{state}'{tag}")
}

/// `ProgramLoader` is a utility struct for loading machine definitions.
/// It provides methods to load a fully linked program from a file or a
/// string, and to discover and load all `.mt` files within a directory.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads and links a machine definition from the specified file path.
    ///
    /// Call transitions are resolved recursively; paths they name are
    /// relative to the referencing file's directory. Each call site loads
    /// its own copy of the sub-machine, so repeated calls never share table
    /// entries.
    ///
    /// # Arguments
    ///
    /// * `path` - A reference to the `Path` of the `.mt` file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file and every sub-machine it references load
    ///   and link cleanly.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * `Err(TuringMachineError::ParseError)` for format violations.
    /// * `Err(TuringMachineError::SubMachineError)` if a referenced
    ///   sub-machine fails to load, naming the referencing file and line.
    pub fn load_program(path: &Path) -> Result<Program, TuringMachineError> {
        let mut suffixes = SuffixAllocator::new();
        Self::load_file(path, &mut suffixes)
    }

    /// Loads and links a machine definition from the provided string.
    ///
    /// This is useful for definitions that are not stored in files, e.g.
    /// embedded programs. Sub-machine paths in call transitions are resolved
    /// relative to the current directory.
    pub fn load_program_from_string(content: &str) -> Result<Program, TuringMachineError> {
        let mut suffixes = SuffixAllocator::new();
        let source = parse(content)?;
        Self::link(source, Path::new("<string>"), &mut suffixes)
    }

    /// Loads all machine definition files (`.mt` extension) from a directory.
    ///
    /// Directories and other files are skipped; each `.mt` file yields one
    /// result, so a single broken definition does not hide the others.
    ///
    /// # Arguments
    ///
    /// * `directory` - A reference to the `Path` of the directory to scan.
    ///
    /// # Returns
    ///
    /// * `Vec<Result<(PathBuf, Program), TuringMachineError>>` - one entry
    ///   per definition file, carrying either the loaded program and its
    ///   path or the error that load produced.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), TuringMachineError>> {
        if !directory.exists() {
            return vec![Err(TuringMachineError::FileError(format!(
                "directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(TuringMachineError::FileError(format!(
                            "failed to read directory entry: {e}"
                        ))))
                    }
                };

                let path = entry.path();

                // Skip directories and non-.mt files
                if path.is_dir() || path.extension().is_none_or(|ext| ext != "mt") {
                    return None;
                }

                match Self::load_program(&path) {
                    Ok(program) => Some(Ok((path, program))),
                    Err(e) => Some(Err(e)),
                }
            })
            .collect()
    }

    /// Reads, parses and links one definition file.
    fn load_file(
        path: &Path,
        suffixes: &mut SuffixAllocator,
    ) -> Result<Program, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("failed to read file {}: {}", path.display(), e))
        })?;

        let source = parse(&content).map_err(|e| e.with_path(&path.display().to_string()))?;

        Self::link(source, path, suffixes)
    }

    /// Resolves every call transition of a parsed source and assembles the
    /// final transition table.
    fn link(
        source: Source,
        path: &Path,
        suffixes: &mut SuffixAllocator,
    ) -> Result<Program, TuringMachineError> {
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let tape_count = source.tape_count;
        let mut rules = Rules::new();

        for entry in source.entries {
            match entry {
                Entry::Normal { key, action } => {
                    rules.insert(key, action);
                }
                Entry::Call {
                    state,
                    read,
                    path: sub_path,
                    return_state,
                    line,
                } => {
                    let tag = suffixes.next_tag();
                    let sub = Self::load_file(&base.join(&sub_path), suffixes).map_err(|e| {
                        TuringMachineError::SubMachineError {
                            file: path.display().to_string(),
                            path: sub_path.clone(),
                            line,
                            source: Box::new(e),
                        }
                    })?;

                    if sub.tape_count != tape_count {
                        return Err(TuringMachineError::ValidationError(format!(
                            "{}:{}: sub-machine {} has {} tape(s), expected {}",
                            path.display(),
                            line,
                            sub_path,
                            sub.tape_count,
                            tape_count
                        )));
                    }

                    splice(&mut rules, &state, &read, sub, &return_state, tag);
                }
            }
        }

        let states = collect_states(&rules, &source.init, &source.accept);

        Ok(Program {
            name: source.name.unwrap_or_else(|| path.display().to_string()),
            initial_state: source.init,
            accept_state: source.accept,
            tape_count,
            states,
            rules,
        })
    }
}

/// Merges a loaded sub-machine into the host table at one call site.
///
/// A synthetic transition at the call's key hands control to the
/// sub-machine's (renamed) initial state, rewriting the symbols just read
/// and leaving every head in place. Each sub-machine transition is then
/// inserted with its key state renamed; targets are renamed too, except the
/// sub-machine's accept state, which becomes the call's return state — the
/// "return to caller" rewiring.
fn splice(
    rules: &mut Rules,
    state: &str,
    read: &[char],
    sub: Program,
    return_state: &str,
    tag: u32,
) {
    let Program {
        initial_state,
        accept_state,
        rules: sub_rules,
        ..
    } = sub;

    rules.insert(
        TransitionKey::new(state, read.to_vec()),
        Action {
            next_state: suffixed(&initial_state, tag),
            write: read.to_vec(),
            directions: vec![Direction::Stay; read.len()],
        },
    );

    for (key, action) in sub_rules {
        let next_state = if action.next_state == accept_state {
            return_state.to_string()
        } else {
            suffixed(&action.next_state, tag)
        };

        rules.insert(
            TransitionKey::new(suffixed(&key.state, tag), key.read),
            Action {
                next_state,
                ..action
            },
        );
    }
}

/// Gathers every state referenced by the final table, sorted, for inspection.
fn collect_states(rules: &Rules, init: &str, accept: &str) -> Vec<String> {
    let mut states = BTreeSet::new();
    states.insert(init.to_string());
    states.insert(accept.to_string());

    for (key, action) in rules {
        states.insert(key.state.clone());
        states.insert(action.next_state.clone());
    }

    states.into_iter().collect()
}
