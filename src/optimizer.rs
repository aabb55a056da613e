//! Static optimization passes over a built transition table: collapsing
//! one-step no-motion hops and deleting transitions that can provably never
//! fire. Both passes rewrite the table in place, only ever replacing or
//! deleting entries, and both preserve the machine's observable behavior for
//! every reachable input. They run before execution, never during it.

use crate::types::{Direction, Program, TransitionKey, BLANK_SYMBOL};
use std::collections::HashSet;

/// Applies both passes: chain simplification, then dead-transition
/// elimination.
pub fn optimize(program: &mut Program) {
    simplify_chains(program);
    remove_dead_transitions(program);
}

/// Collapses one-step no-motion hops and prunes entries that are doomed to
/// reject.
///
/// A transition that moves no head and does not target the accept state
/// leaves the machine in a configuration known at optimization time: its own
/// next state and write symbols. If the table has an entry for that
/// configuration, the hop is skipped by copying the entry's effect over the
/// original's; if it has none, the original entry would reject one step
/// later, so it is deleted outright — key absence already signals reject.
///
/// This is a single pass, not a fixed point: chains of three or more
/// no-motion hops are only partially collapsed. Keys are visited in sorted
/// order so the output is deterministic.
pub fn simplify_chains(program: &mut Program) {
    let mut keys: Vec<TransitionKey> = program.rules.keys().cloned().collect();
    keys.sort();

    let mut doomed = Vec::new();
    for key in keys {
        let action = match program.rules.get(&key) {
            Some(action) => action.clone(),
            None => continue,
        };

        if action.directions.iter().any(|&d| d != Direction::Stay)
            || action.next_state == program.accept_state
        {
            continue;
        }

        let hop = TransitionKey::new(action.next_state, action.write);
        match program.rules.get(&hop).cloned() {
            Some(target) => {
                program.rules.insert(key, target);
            }
            None => doomed.push(key),
        }
    }

    for key in doomed {
        program.rules.remove(&key);
    }
}

/// Deletes transitions keyed on symbols that can never be read.
///
/// Tape 0 carries the externally supplied input and is exempt. For every
/// other tape, only blank is readable until something is written: the
/// readable-symbol set starts at `{_}` and grows by fixed-point iteration —
/// whenever a transition that requires reading an already-readable symbol
/// writes a different one, the written symbol becomes readable too. Once the
/// set is stable, any transition whose read symbol at that tape is outside
/// it can never fire and is deleted.
pub fn remove_dead_transitions(program: &mut Program) {
    if program.is_single_tape() {
        return;
    }

    for tape in 1..program.tape_count {
        let mut readable = HashSet::from([BLANK_SYMBOL]);

        loop {
            let mut grew = false;
            for (key, action) in &program.rules {
                let read = key.read[tape];
                let write = action.write[tape];
                if read != write && readable.contains(&read) && readable.insert(write) {
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }

        program
            .rules
            .retain(|key, _| readable.contains(&key.read[tape]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::TuringMachine;
    use crate::types::{Action, Outcome, Program, Rules};

    fn rule(
        state: &str,
        read: &[char],
        next: &str,
        write: &[char],
        directions: &[Direction],
    ) -> (TransitionKey, Action) {
        (
            TransitionKey::new(state, read.to_vec()),
            Action {
                next_state: next.to_string(),
                write: write.to_vec(),
                directions: directions.to_vec(),
            },
        )
    }

    fn program(
        initial: &str,
        accept: &str,
        tape_count: usize,
        rules: Vec<(TransitionKey, Action)>,
    ) -> Program {
        Program {
            name: "test".to_string(),
            initial_state: initial.to_string(),
            accept_state: accept.to_string(),
            tape_count,
            states: Vec::new(),
            rules: rules.into_iter().collect::<Rules>(),
        }
    }

    const STAY: [Direction; 1] = [Direction::Stay];
    const RIGHT: [Direction; 1] = [Direction::Right];

    #[test]
    fn test_simplify_collapses_one_hop() {
        let mut program = program(
            "q1",
            "acc",
            1,
            vec![
                rule("q1", &['0'], "q2", &['1'], &STAY),
                rule("q2", &['1'], "acc", &['1'], &RIGHT),
            ],
        );

        simplify_chains(&mut program);

        let first = &program.rules[&TransitionKey::new("q1", vec!['0'])];
        assert_eq!(first.next_state, "acc");
        assert_eq!(first.write, vec!['1']);
        assert_eq!(first.directions, vec![Direction::Right]);
    }

    #[test]
    fn test_simplify_prunes_doomed_entry() {
        let mut program = program(
            "q1",
            "acc",
            1,
            vec![rule("q1", &['0'], "q2", &['1'], &STAY)],
        );

        simplify_chains(&mut program);

        // (q2,'1') has no entry, so the hop would reject; the entry itself
        // can go, since a missing key rejects just the same.
        assert!(program.rules.is_empty());
    }

    #[test]
    fn test_simplify_keeps_accept_targeting_entries() {
        let mut program = program(
            "q1",
            "acc",
            1,
            vec![rule("q1", &['0'], "acc", &['1'], &STAY)],
        );

        simplify_chains(&mut program);

        assert_eq!(program.transition_count(), 1);
        let only = &program.rules[&TransitionKey::new("q1", vec!['0'])];
        assert_eq!(only.next_state, "acc");
    }

    #[test]
    fn test_simplify_keeps_moving_entries() {
        let mut program = program(
            "q1",
            "acc",
            1,
            vec![rule("q1", &['0'], "q9", &['1'], &RIGHT)],
        );

        simplify_chains(&mut program);

        // The head moves, so the next configuration is unknown statically.
        assert_eq!(program.transition_count(), 1);
    }

    #[test]
    fn test_simplify_is_single_pass() {
        let mut program = program(
            "q1",
            "acc",
            1,
            vec![
                rule("q1", &['0'], "q2", &['0'], &STAY),
                rule("q2", &['0'], "q3", &['0'], &STAY),
                rule("q3", &['0'], "q4", &['0'], &STAY),
                rule("q4", &['0'], "acc", &['1'], &RIGHT),
            ],
        );

        simplify_chains(&mut program);

        // Visiting q1 before q2 and q3 means the head of the chain advances
        // by only one hop; a fixed point would take it straight to q4's
        // effect.
        let first = &program.rules[&TransitionKey::new("q1", vec!['0'])];
        assert_eq!(first.next_state, "q3");
        assert_eq!(first.directions, vec![Direction::Stay]);

        let third = &program.rules[&TransitionKey::new("q3", vec!['0'])];
        assert_eq!(third.next_state, "acc");
        assert_eq!(third.directions, vec![Direction::Right]);
    }

    #[test]
    fn test_simplify_preserves_behavior() {
        let build = || {
            program(
                "q1",
                "acc",
                1,
                vec![
                    rule("q1", &['0'], "q2", &['1'], &STAY),
                    rule("q2", &['1'], "q3", &['#'], &STAY),
                    rule("q3", &['#'], "acc", &['#'], &RIGHT),
                    rule("q1", &['1'], "gone", &['1'], &STAY),
                ],
            )
        };

        let mut plain = TuringMachine::new(build());
        let mut optimized_program = build();
        simplify_chains(&mut optimized_program);
        let mut optimized = TuringMachine::new(optimized_program);

        for word in ["0", "1", "", "#"] {
            plain.reset();
            optimized.reset();
            plain.set_word(word).unwrap();
            optimized.set_word(word).unwrap();

            assert_eq!(
                plain.execute(),
                optimized.execute(),
                "outcome mismatch for {word:?}"
            );
            assert_eq!(
                plain.snapshot().tapes,
                optimized.snapshot().tapes,
                "tape mismatch for {word:?}"
            );
        }
    }

    #[test]
    fn test_dead_elimination_removes_unwritable_reads() {
        let stay2 = [Direction::Stay, Direction::Stay];
        let sweep = [Direction::Right, Direction::Stay];
        let mut program = program(
            "s",
            "acc",
            2,
            vec![
                rule("s", &['0', '_'], "s", &['_', '1'], &sweep),
                rule("s", &['1', '_'], "s", &['_', '_'], &sweep),
                rule("s", &['_', '1'], "acc", &['_', '1'], &stay2),
                // Tape 1 is only ever written '1' over blank, so these two
                // can never fire.
                rule("s", &['0', '0'], "s", &['_', '0'], &sweep),
                rule("s", &['1', '#'], "s", &['_', '#'], &sweep),
            ],
        );

        remove_dead_transitions(&mut program);

        assert_eq!(program.transition_count(), 3);
        assert!(!program
            .rules
            .contains_key(&TransitionKey::new("s", vec!['0', '0'])));
        assert!(!program
            .rules
            .contains_key(&TransitionKey::new("s", vec!['1', '#'])));
    }

    #[test]
    fn test_dead_elimination_chains_readability() {
        let stay2 = [Direction::Stay, Direction::Stay];
        let mut program = program(
            "a",
            "acc",
            2,
            vec![
                rule("a", &['0', '_'], "b", &['0', '1'], &stay2),
                rule("b", &['0', '1'], "c", &['0', '#'], &stay2),
                rule("c", &['0', '#'], "acc", &['0', '#'], &stay2),
            ],
        );

        remove_dead_transitions(&mut program);

        // '_' makes '1' readable, which in turn makes '#' readable.
        assert_eq!(program.transition_count(), 3);
    }

    #[test]
    fn test_dead_elimination_exempts_input_tape() {
        let stay2 = [Direction::Stay, Direction::Stay];
        let mut program = program(
            "a",
            "acc",
            2,
            // Nothing ever writes '#' on tape 0, but tape 0 holds the
            // externally supplied word, so the entry survives.
            vec![rule("a", &['#', '_'], "acc", &['#', '_'], &stay2)],
        );

        remove_dead_transitions(&mut program);

        assert_eq!(program.transition_count(), 1);
    }

    #[test]
    fn test_dead_elimination_is_a_no_op_for_single_tape() {
        let mut program = program(
            "a",
            "acc",
            1,
            vec![rule("a", &['#'], "acc", &['#'], &STAY)],
        );

        remove_dead_transitions(&mut program);

        assert_eq!(program.transition_count(), 1);
    }

    #[test]
    fn test_dead_elimination_preserves_behavior() {
        let sweep = [Direction::Right, Direction::Stay];
        let stay2 = [Direction::Stay, Direction::Stay];
        let build = || {
            program(
                "s",
                "acc",
                2,
                vec![
                    rule("s", &['0', '_'], "s", &['_', '_'], &sweep),
                    rule("s", &['1', '_'], "s", &['_', '_'], &sweep),
                    rule("s", &['_', '_'], "acc", &['_', '1'], &stay2),
                    rule("s", &['0', '#'], "s", &['_', '#'], &sweep),
                ],
            )
        };

        let mut plain = TuringMachine::new(build());
        let mut optimized_program = build();
        remove_dead_transitions(&mut optimized_program);
        let mut optimized = TuringMachine::new(optimized_program);

        for word in ["", "0", "10", "011"] {
            plain.reset();
            optimized.reset();
            plain.set_word(word).unwrap();
            optimized.set_word(word).unwrap();

            assert_eq!(plain.execute(), optimized.execute());
            assert_eq!(plain.snapshot().tapes, optimized.snapshot().tapes);
        }
    }

    #[test]
    fn test_optimize_applies_both_passes() {
        let stay2 = [Direction::Stay, Direction::Stay];
        let sweep = [Direction::Right, Direction::Stay];
        let mut program = program(
            "s",
            "acc",
            2,
            vec![
                // A no-motion hop with no matching follow-up entry.
                rule("s", &['0', '_'], "t", &['1', '_'], &stay2),
                // A transition reading a symbol never written on tape 1.
                rule("s", &['1', '#'], "s", &['1', '#'], &sweep),
                rule("s", &['_', '_'], "acc", &['_', '_'], &stay2),
            ],
        );

        optimize(&mut program);

        assert_eq!(program.transition_count(), 1);
        assert!(program
            .rules
            .contains_key(&TransitionKey::new("s", vec!['_', '_'])));
    }
}
