// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! §4.F: turning each state's kernel-plus-closure items and their computed
//! lookahead sets into a resolved action list — shift, reduce, accept or
//! backtrack — with shift/reduce and reduce/reduce conflicts resolved by
//! declared precedence and associativity where possible.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::lalr::LalrTables;
use crate::lr0::Lr0Automaton;
use crate::nullable::NullableDerives;
use crate::production::Production;
use crate::symbol::terminal::Token;
use crate::symbol::Associativity;

#[derive(Debug, Clone)]
pub enum Action {
    Shift(u32),
    Reduce(Production),
    Accept,
    /// A shift/reduce conflict with undeclared precedence, kept under
    /// `-B`/`%backtrack`: the shift (yacc's own default) is the committed
    /// first alternative, tried before the listed reduce candidates.
    Backtrack(u32, Vec<Production>),
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub token: Token,
    pub shift_target: Option<u32>,
    pub reduce_candidates: Vec<Production>,
    pub resolution: &'static str,
}

#[derive(Debug, Default)]
pub struct StateActions {
    pub state: u32,
    pub action_for_token: BTreeMap<Token, Action>,
    pub default_reduction: Option<Production>,
    pub conflicts: Vec<Conflict>,
}

pub struct ActionTable {
    pub states: Vec<StateActions>,
    pub shift_reduce_conflicts: usize,
    pub reduce_reduce_conflicts: usize,
}

impl ActionTable {
    /// Builds the resolved action list for every state, then checks the
    /// conflict counts against any `%expect`/`%expect-rr` declarations.
    pub fn build(
        automaton: &Lr0Automaton,
        nullable_derives: &NullableDerives,
        lalr_tables: &LalrTables,
        tokens: &[Option<Token>],
        expect: Option<usize>,
        expect_rr: Option<usize>,
        backtrack: bool,
    ) -> Result<Self, Error> {
        let reverse = crate::lalr::reverse_transitions(automaton);
        let mut states = Vec::with_capacity(automaton.states.len());
        let mut shift_reduce_conflicts = 0;
        let mut reduce_reduce_conflicts = 0;

        for state in &automaton.states {
            let mut actions: BTreeMap<Token, Action> = BTreeMap::new();
            let mut conflicts = Vec::new();

            for (token, &target) in state.shifts.iter() {
                actions.insert(token.clone(), Action::Shift(target));
            }

            let closure_items = automaton.closure_of(state.ident, nullable_derives);
            let mut reductions: BTreeMap<Token, Vec<Production>> = BTreeMap::new();
            for item in closure_items.iter().filter(|item| item.is_reducible()) {
                let production = item.production().clone();
                let look_ahead = lalr_tables.look_ahead(&reverse, item, state.ident);
                for index in look_ahead.iter() {
                    if let Some(Some(token)) = tokens.get(index) {
                        reductions
                            .entry(token.clone())
                            .or_insert_with(Vec::new)
                            .push(production.clone());
                    }
                }
            }

            for (token, mut candidates) in reductions {
                candidates.sort_by_key(|p| p.ident());
                match actions.get(&token).cloned() {
                    None if candidates.len() == 1 => {
                        actions.insert(token, reduce_or_accept(candidates.into_iter().next().unwrap()));
                    }
                    None => {
                        reduce_reduce_conflicts += candidates.len() - 1;
                        let resolution = "lowest-numbered rule wins";
                        let winner = candidates[0].clone();
                        conflicts.push(Conflict {
                            token: token.clone(),
                            shift_target: None,
                            reduce_candidates: candidates,
                            resolution,
                        });
                        actions.insert(token, reduce_or_accept(winner));
                    }
                    Some(Action::Shift(target)) => {
                        let resolution = resolve_shift_reduce(&token, &candidates);
                        match resolution {
                            ShiftReduceResolution::Shift => {
                                shift_reduce_conflicts += candidates.len();
                                conflicts.push(Conflict {
                                    token: token.clone(),
                                    shift_target: Some(target),
                                    reduce_candidates: candidates,
                                    resolution: "precedence favours shift",
                                });
                            }
                            ShiftReduceResolution::Reduce(winner) => {
                                if candidates.len() > 1 {
                                    reduce_reduce_conflicts += candidates.len() - 1;
                                }
                                conflicts.push(Conflict {
                                    token: token.clone(),
                                    shift_target: Some(target),
                                    reduce_candidates: candidates,
                                    resolution: "precedence favours reduce",
                                });
                                actions.insert(token, reduce_or_accept(winner));
                            }
                            ShiftReduceResolution::NonAssocError => {
                                conflicts.push(Conflict {
                                    token: token.clone(),
                                    shift_target: Some(target),
                                    reduce_candidates: candidates,
                                    resolution: "nonassociative: neither shift nor reduce",
                                });
                                actions.remove(&token);
                            }
                            ShiftReduceResolution::Ambiguous => {
                                shift_reduce_conflicts += candidates.len();
                                if backtrack {
                                    conflicts.push(Conflict {
                                        token: token.clone(),
                                        shift_target: Some(target),
                                        reduce_candidates: candidates.clone(),
                                        resolution: "undeclared precedence: backtracking enabled, shift tried first",
                                    });
                                    // Shift is the committed first alternative
                                    // (yacc convention); the reduce candidates
                                    // remain reachable if the shift path
                                    // dead-ends, tried in declaration order.
                                    actions.insert(token, Action::Backtrack(target, candidates));
                                } else {
                                    conflicts.push(Conflict {
                                        token: token.clone(),
                                        shift_target: Some(target),
                                        reduce_candidates: candidates,
                                        resolution: "undeclared precedence: default to shift",
                                    });
                                    // `actions[token]` already holds the
                                    // `Action::Shift(target)` inserted above;
                                    // leave it in place rather than overwrite
                                    // it with the suppressed reduces.
                                }
                            }
                        }
                    }
                    Some(Action::Reduce(_)) | Some(Action::Accept) | Some(Action::Backtrack(_, _)) => {
                        unreachable!("a token can only gain one shift action per state")
                    }
                }
            }

            let default_reduction = choose_default_reduction(&actions);
            if let Some(ref default) = default_reduction {
                actions.retain(|_, action| !matches!(action, Action::Reduce(p) if p.ident() == default.ident()));
            }

            states.push(StateActions {
                state: state.ident,
                action_for_token: actions,
                default_reduction,
                conflicts,
            });
        }

        if let Some(expected) = expect {
            if expected != shift_reduce_conflicts {
                return Err(Error::UnexpectedConflicts {
                    shift_reduce: shift_reduce_conflicts,
                    expected_shift_reduce: expected,
                    reduce_reduce: reduce_reduce_conflicts,
                    expected_reduce_reduce: expect_rr.unwrap_or(0),
                });
            }
        }
        if let Some(expected_rr) = expect_rr {
            if expected_rr != reduce_reduce_conflicts {
                return Err(Error::UnexpectedConflicts {
                    shift_reduce: shift_reduce_conflicts,
                    expected_shift_reduce: expect.unwrap_or(0),
                    reduce_reduce: reduce_reduce_conflicts,
                    expected_reduce_reduce: expected_rr,
                });
            }
        }

        Ok(Self {
            states,
            shift_reduce_conflicts,
            reduce_reduce_conflicts,
        })
    }
}

fn reduce_or_accept(production: Production) -> Action {
    if production.left_hand_side().is_start() {
        Action::Accept
    } else {
        Action::Reduce(production)
    }
}

enum ShiftReduceResolution {
    Shift,
    Reduce(Production),
    NonAssocError,
    Ambiguous,
}

/// Resolves a shift/reduce conflict on `token` against every candidate
/// reduction using the classic yacc rule: compare the shift token's
/// precedence/associativity against the reducing rule's; undeclared
/// precedence on either side cannot be resolved and defaults to shift.
fn resolve_shift_reduce(token: &Token, candidates: &[Production]) -> ShiftReduceResolution {
    if candidates.len() != 1 {
        return ShiftReduceResolution::Ambiguous;
    }
    let production = &candidates[0];
    if !token.precedence_has_been_set() || production.precedence() == 0 {
        return ShiftReduceResolution::Ambiguous;
    }
    match token.precedence().cmp(&production.precedence()) {
        std::cmp::Ordering::Greater => ShiftReduceResolution::Shift,
        std::cmp::Ordering::Less => ShiftReduceResolution::Reduce(production.clone()),
        std::cmp::Ordering::Equal => match production.associativity() {
            Associativity::Left => ShiftReduceResolution::Reduce(production.clone()),
            Associativity::Right => ShiftReduceResolution::Shift,
            Associativity::NonAssoc => ShiftReduceResolution::NonAssocError,
        },
    }
}

/// §4.F: the rule that reduces on the largest number of lookahead terminals
/// in this state becomes its default action (ties broken by lowest rule
/// number); the per-token entries it would otherwise need are then redundant
/// and are dropped by the caller. Reduce actions for every other rule stay as
/// explicit per-token entries.
fn choose_default_reduction(actions: &BTreeMap<Token, Action>) -> Option<Production> {
    let mut counts: BTreeMap<u32, (usize, Production)> = BTreeMap::new();
    for action in actions.values() {
        if let Action::Reduce(production) = action {
            counts
                .entry(production.ident())
                .or_insert_with(|| (0, production.clone()))
                .0 += 1;
        }
    }
    counts
        .into_values()
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.ident().cmp(&a.1.ident())))
        .map(|(_, production)| production)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::non_terminal::NonTerminal;
    use crate::symbol::Symbol;

    fn token(name: &str) -> Token {
        Token::new_literal_token(name, name, &lexan::Location::default())
    }

    fn rule(ident: u32, lhs_name: &str, precedence: Option<(Associativity, u16)>) -> Production {
        let lhs = NonTerminal::new_defined(lhs_name, &lexan::Location::default());
        Production::new(ident, lhs, ProductionTail::new(&[], None, precedence, None))
    }

    #[test]
    fn default_reduction_picks_majority_then_lowest_rule_number() {
        let low = rule(1, "A", None);
        let high = rule(5, "B", None);
        let mut actions = BTreeMap::new();
        actions.insert(token("a"), Action::Reduce(low.clone()));
        actions.insert(token("b"), Action::Reduce(low.clone()));
        actions.insert(token("c"), Action::Reduce(high));

        let chosen = choose_default_reduction(&actions).unwrap();
        assert_eq!(chosen.ident(), low.ident());
    }

    #[test]
    fn default_reduction_tie_break_favours_lowest_rule_number() {
        let first = rule(1, "A", None);
        let second = rule(2, "B", None);
        let mut actions = BTreeMap::new();
        actions.insert(token("a"), Action::Reduce(first.clone()));
        actions.insert(token("b"), Action::Reduce(second));

        let chosen = choose_default_reduction(&actions).unwrap();
        assert_eq!(chosen.ident(), first.ident());
    }

    #[test]
    fn shift_reduce_resolved_by_precedence() {
        let plus = token("+");
        plus.set_precedence(1);
        plus.set_associativity(Associativity::Left);
        let production = rule(1, "E", Some((Associativity::Left, 2)));

        match resolve_shift_reduce(&plus, std::slice::from_ref(&production)) {
            ShiftReduceResolution::Reduce(winner) => assert_eq!(winner.ident(), production.ident()),
            _ => panic!("expected the higher-precedence rule to win by reducing"),
        }
    }

    #[test]
    fn shift_reduce_left_associative_equal_precedence_reduces() {
        let star = token("*");
        star.set_precedence(2);
        star.set_associativity(Associativity::Left);
        let production = rule(1, "E", Some((Associativity::Left, 2)));

        assert!(matches!(
            resolve_shift_reduce(&star, std::slice::from_ref(&production)),
            ShiftReduceResolution::Reduce(_)
        ));
    }

    #[test]
    fn shift_reduce_undeclared_precedence_is_ambiguous() {
        let mystery = token("?");
        let production = rule(1, "E", None);
        assert!(matches!(
            resolve_shift_reduce(&mystery, std::slice::from_ref(&production)),
            ShiftReduceResolution::Ambiguous
        ));
    }

    #[test]
    fn reduce_or_accept_recognizes_start_symbol() {
        let start_rule = Production::new(
            0,
            NonTerminal::new_start(),
            ProductionTail::new(
                &[Symbol::NonTerminal(NonTerminal::new_defined(
                    "S",
                    &lexan::Location::default(),
                ))],
                None,
                None,
                None,
            ),
        );
        assert!(matches!(reduce_or_accept(start_rule), Action::Accept));
    }
}
