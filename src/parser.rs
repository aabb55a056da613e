//! This module parses machine definition sources into their header fields
//! and transition entries, using the `pest` crate for the line structure and
//! a small state machine for pairing each transition key line with its
//! action line. Call transitions are recognized here but resolved by the
//! loader, which owns the recursive sub-machine splicing.

use crate::types::{
    is_working_symbol, Action, Direction, TransitionKey, TuringMachineError,
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Derives a `PestParser` for the line/row grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct MachineParser;

/// A parsed but unlinked machine definition.
///
/// Call transitions are still symbolic references to other files; the loader
/// resolves them recursively and produces a `Program`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Source {
    /// The declared name, if a `name:` header was present.
    pub name: Option<String>,
    /// The initial state.
    pub init: String,
    /// The accept state.
    pub accept: String,
    /// The tape count, inferred from the first transition line.
    pub tape_count: usize,
    /// Transition entries in source order.
    pub entries: Vec<Entry>,
}

/// A single transition entry of a definition file.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Entry {
    /// A key line paired with its action line.
    Normal { key: TransitionKey, action: Action },
    /// A one-line subroutine call: when `(state, read)` matches, control
    /// enters the machine defined in `path`, and its accept state is rewired
    /// to `return_state`.
    Call {
        state: String,
        read: Vec<char>,
        path: String,
        return_state: String,
        line: usize,
    },
}

/// Parses the given definition text into a `Source`.
///
/// This checks everything that can be checked within one file: header
/// uniqueness and shape, tape-count consistency, symbol and direction
/// validity, key/action-line pairing and key uniqueness. Mandatory headers
/// (`init:`, `accept:`) and the presence of at least one transition are
/// enforced after the walk.
///
/// # Arguments
///
/// * `input` - The definition text.
///
/// # Returns
///
/// * `Ok(Source)` if the text is a well-formed definition.
/// * `Err(TuringMachineError::ParseError)` for any in-file format violation.
/// * `Err(TuringMachineError::ValidationError)` for file-level omissions.
pub(crate) fn parse(input: &str) -> Result<Source, TuringMachineError> {
    let root = MachineParser::parse(Rule::source, input)
        .map_err(|e| TuringMachineError::ParseError(e.into()))?
        .next()
        .unwrap();

    build_source(root)
}

/// A key line waiting for its action line.
struct PendingKey<'i> {
    state: String,
    read: Vec<char>,
    span: Span<'i>,
}

/// Walks the parse tree and assembles the `Source`.
fn build_source(root: Pair<Rule>) -> Result<Source, TuringMachineError> {
    let mut name: Option<String> = None;
    let mut init: Option<String> = None;
    let mut accept: Option<String> = None;
    let mut tape_count: Option<usize> = None;
    let mut entries = Vec::new();
    let mut seen_headers = HashSet::new();
    let mut seen_keys = HashSet::new();
    let mut pending: Option<PendingKey> = None;

    for p in root.into_inner() {
        match p.as_rule() {
            Rule::header => {
                if let Some(pend) = &pending {
                    return Err(parse_error(
                        "transition key line is missing its action line",
                        pend.span,
                    ));
                }
                parse_header(p, &mut seen_headers, &mut name, &mut init, &mut accept)?;
            }
            Rule::row => {
                let span = p.as_span();
                let fields = parse_fields(p);

                match pending.take() {
                    Some(pend) => {
                        let k = tape_count.unwrap();
                        let action = parse_action_line(&fields, k, span)?;
                        entries.push(Entry::Normal {
                            key: TransitionKey::new(pend.state, pend.read),
                            action,
                        });
                    }
                    None => parse_entry_line(
                        fields,
                        span,
                        &mut tape_count,
                        &mut seen_keys,
                        &mut pending,
                        &mut entries,
                    )?,
                }
            }
            _ => {} // Skip EOI
        }
    }

    if let Some(pend) = pending {
        return Err(parse_error(
            "transition key line is missing its action line",
            pend.span,
        ));
    }

    let init = check_required(init, "init")?;
    let accept = check_required(accept, "accept")?;
    let tape_count = tape_count.ok_or_else(|| {
        TuringMachineError::ValidationError("program defines no transitions".to_string())
    })?;

    Ok(Source {
        name,
        init,
        accept,
        tape_count,
        entries,
    })
}

/// Parses a `key: value` header line into the matching slot.
///
/// `init` and `accept` must be single state tokens; a separator in the value
/// is fatal. Each header may appear at most once.
fn parse_header<'i>(
    pair: Pair<'i, Rule>,
    seen: &mut HashSet<String>,
    name: &mut Option<String>,
    init: &mut Option<String>,
    accept: &mut Option<String>,
) -> Result<(), TuringMachineError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let key = pairs.next().unwrap().as_str().to_string();
    let value = pairs
        .next()
        .map(|v| v.as_str().trim().to_string())
        .unwrap_or_default();

    if !seen.insert(key.clone()) {
        return Err(parse_error(
            &format!("Duplicate \"{key}:\" declaration"),
            span,
        ));
    }

    match key.as_str() {
        "name" => *name = Some(value),
        "init" | "accept" => {
            if value.contains(',') {
                return Err(parse_error(
                    &format!("'{key}:' must name a single state"),
                    span,
                ));
            }
            let state = strip_whitespace(&value);
            if state.is_empty() {
                return Err(parse_error(&format!("'{key}:' names no state"), span));
            }
            if key == "init" {
                *init = Some(state);
            } else {
                *accept = Some(state);
            }
        }
        _ => unreachable!("grammar admits no other header"),
    }

    Ok(())
}

/// Classifies a first transition line as a normal key line or a call line.
///
/// A line is a key line iff every field after the state is a single
/// working-alphabet symbol; anything else is a call line whose last two
/// fields are the sub-machine path and the return state. Either way the tape
/// count is inferred on first sight and enforced afterwards.
fn parse_entry_line<'i>(
    fields: Vec<(String, Span<'i>)>,
    span: Span<'i>,
    tape_count: &mut Option<usize>,
    seen_keys: &mut HashSet<TransitionKey>,
    pending: &mut Option<PendingKey<'i>>,
    entries: &mut Vec<Entry>,
) -> Result<(), TuringMachineError> {
    if fields.len() < 2 {
        return Err(parse_error(
            "malformed transition line: expected a state followed by read symbols",
            span,
        ));
    }

    let state = fields[0].0.clone();
    let symbolic = fields[1..].iter().all(|(s, _)| single_symbol(s).is_some());

    if symbolic {
        let k = fields.len() - 1;
        check_tape_count(tape_count, k, span)?;

        let read = parse_symbols(&fields[1..=k])?;
        check_unique_key(seen_keys, TransitionKey::new(state.clone(), read.clone()), span)?;

        *pending = Some(PendingKey { state, read, span });
    } else {
        if fields.len() < 4 {
            return Err(parse_error(
                "malformed call transition: expected state, read symbols, file path and return state",
                span,
            ));
        }

        let k = fields.len() - 3;
        check_tape_count(tape_count, k, span)?;

        let read = parse_symbols(&fields[1..=k])?;
        check_unique_key(seen_keys, TransitionKey::new(state.clone(), read.clone()), span)?;

        entries.push(Entry::Call {
            state,
            read,
            path: fields[k + 1].0.clone(),
            return_state: fields[k + 2].0.clone(),
            line: span.start_pos().line_col().0,
        });
    }

    Ok(())
}

/// Parses the action line of a normal transition:
/// `(next_state, write_1..write_k, move_1..move_k)`.
fn parse_action_line(
    fields: &[(String, Span)],
    k: usize,
    span: Span,
) -> Result<Action, TuringMachineError> {
    if fields.len() != 2 * k + 1 {
        return Err(parse_error(
            &format!(
                "malformed action line: expected {} fields for {} tape(s)",
                2 * k + 1,
                k
            ),
            span,
        ));
    }

    let next_state = fields[0].0.clone();
    let write = parse_symbols(&fields[1..=k])?;
    let directions = fields[k + 1..]
        .iter()
        .map(|(s, sp)| parse_direction(s, *sp))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Action {
        next_state,
        write,
        directions,
    })
}

/// Extracts the cleaned fields of a row together with their spans.
fn parse_fields(pair: Pair<Rule>) -> Vec<(String, Span)> {
    pair.into_inner()
        .map(|f| {
            let span = f.as_span();
            (strip_whitespace(f.as_str()), span)
        })
        .collect()
}

/// Parses a run of fields that must each be a single working-alphabet symbol.
fn parse_symbols(fields: &[(String, Span)]) -> Result<Vec<char>, TuringMachineError> {
    fields
        .iter()
        .map(|(s, span)| {
            single_symbol(s).ok_or_else(|| parse_error(&format!("invalid symbol '{s}'"), *span))
        })
        .collect()
}

/// Parses a single direction field.
///
/// Supports '<' or 'L' for Left, '>' or 'R' for Right, and '-' or 'S' for Stay.
fn parse_direction(input: &str, span: Span) -> Result<Direction, TuringMachineError> {
    match input {
        "<" | "L" => Ok(Direction::Left),
        ">" | "R" => Ok(Direction::Right),
        "-" | "S" => Ok(Direction::Stay),
        _ => Err(parse_error(
            &format!("Unsupported direction: {input}"),
            span,
        )),
    }
}

/// Returns the field's symbol if it is exactly one working-alphabet character.
fn single_symbol(field: &str) -> Option<char> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if is_working_symbol(c) => Some(c),
        _ => None,
    }
}

/// Removes every whitespace character from a field.
fn strip_whitespace(field: &str) -> String {
    field.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Infers the tape count from the first transition line, or enforces it on
/// every later one.
fn check_tape_count(
    tape_count: &mut Option<usize>,
    k: usize,
    span: Span,
) -> Result<(), TuringMachineError> {
    match *tape_count {
        None => {
            *tape_count = Some(k);
            Ok(())
        }
        Some(expected) if expected == k => Ok(()),
        Some(expected) => Err(parse_error(
            &format!("wrong number of tapes: expected {expected}, found {k}"),
            span,
        )),
    }
}

/// Rejects a second entry for the same `(state, read)` key.
fn check_unique_key(
    seen: &mut HashSet<TransitionKey>,
    key: TransitionKey,
    span: Span,
) -> Result<(), TuringMachineError> {
    if seen.contains(&key) {
        return Err(parse_error(
            &format!(
                "Duplicate transition rule: {},{}",
                key.state,
                key.read.iter().collect::<String>()
            ),
            span,
        ));
    }

    seen.insert(key);
    Ok(())
}

/// Checks that a mandatory header was declared.
fn check_required(value: Option<String>, field: &str) -> Result<String, TuringMachineError> {
    value.ok_or_else(|| {
        TuringMachineError::ValidationError(format!("missing '{field}:' declaration"))
    })
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}
