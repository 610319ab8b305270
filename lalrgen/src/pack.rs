// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! §4.G: compresses the per-state action tables built by [`crate::actions`]
//! into the displacement-packed `action`/`check`/`base`/`default` vectors a
//! generated parser indexes at runtime. A state's row is packed by finding
//! the smallest non-negative displacement at which every one of its entries
//! lands on an unoccupied `action`/`check` slot (first-fit row packing).

use std::collections::BTreeMap;

use crate::actions::{Action, ActionTable};
use crate::symbol::terminal::Token;

/// One packed table entry: `action[i]` is meaningful only where `check[i]`
/// equals the state that owns the row occupying slot `i`.
#[derive(Debug, Clone, Copy)]
pub enum PackedAction {
    Shift(u32),
    Reduce(u32),
    Accept,
}

pub struct PackedTables {
    pub base: Vec<i32>,
    pub default: Vec<i32>,
    pub action: Vec<Option<PackedAction>>,
    pub check: Vec<i32>,
}

impl PackedTables {
    /// First-fit packs every state's row (one entry per token with a
    /// non-default action) into a shared `action`/`check` vector pair. `base`
    /// holds, for each state, the displacement its row was packed at; `check`
    /// disambiguates overlapping rows by recording which state's row actually
    /// owns a given slot. `default` holds the state's default-reduction rule
    /// (encoded as `-(rule_ident + 1)`), or `0` for error.
    pub fn build(action_table: &ActionTable, token_index: impl Fn(&Token) -> usize, ntokens: usize) -> Self {
        let mut action: Vec<Option<PackedAction>> = Vec::new();
        let mut check: Vec<i32> = Vec::new();
        let mut base: Vec<i32> = Vec::with_capacity(action_table.states.len());
        let mut default: Vec<i32> = Vec::with_capacity(action_table.states.len());

        for state in &action_table.states {
            let mut row: BTreeMap<usize, PackedAction> = BTreeMap::new();
            for (token, packed_action) in state.action_for_token.iter() {
                let packed = match packed_action {
                    Action::Shift(target) => PackedAction::Shift(*target),
                    Action::Reduce(production) => PackedAction::Reduce(production.ident()),
                    Action::Accept => PackedAction::Accept,
                    Action::Backtrack(shift_target, _candidates) => {
                        // The shift is the committed first alternative (see
                        // `actions::Action::Backtrack`); the full candidate
                        // list survives only in the uncompressed
                        // `ActionTable` that `AAMULTI` is built from.
                        PackedAction::Shift(*shift_target)
                    }
                };
                row.insert(token_index(token), packed);
            }

            default.push(match &state.default_reduction {
                Some(production) => -(production.ident() as i32 + 1),
                None => 0,
            });

            if row.is_empty() {
                base.push(0);
                continue;
            }

            let displacement = first_fit_displacement(&row, &check);
            let required_len = displacement + ntokens;
            if action.len() < required_len {
                action.resize(required_len, None);
                check.resize(required_len, -1);
            }
            for (&token_idx, packed) in row.iter() {
                let slot = displacement + token_idx;
                action[slot] = Some(*packed);
                check[slot] = state.state as i32;
            }
            base.push(displacement as i32);
        }

        Self {
            base,
            default,
            action,
            check,
        }
    }
}

/// Smallest displacement `d >= 0` such that every `token_idx` in `row` lands
/// on a `check` slot that is either past the current table end or already
/// marked unoccupied (`-1`). Unbounded worst case is `O(states · ntokens)`
/// probes; real grammars are sparse enough that this converges quickly.
fn first_fit_displacement(row: &BTreeMap<usize, PackedAction>, check: &[i32]) -> usize {
    let mut displacement = 0usize;
    'candidate: loop {
        for &token_idx in row.keys() {
            let slot = displacement + token_idx;
            if slot < check.len() && check[slot] != -1 {
                displacement += 1;
                continue 'candidate;
            }
        }
        return displacement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionTable;
    use crate::lalr::LalrTables;
    use crate::lr0::Lr0Automaton;
    use crate::nullable::NullableDerives;
    use crate::production::{Production, ProductionTail};
    use crate::symbol::non_terminal::NonTerminal;
    use crate::symbol::Symbol;

    #[test]
    fn first_fit_finds_smallest_non_colliding_displacement() {
        let mut row = BTreeMap::new();
        row.insert(0usize, PackedAction::Accept);
        let check = vec![1, -1, -1];
        // slot 0 is occupied (check[0] != -1); displacement 1 lands on slot 1, free.
        assert_eq!(first_fit_displacement(&row, &check), 1);
    }

    #[test]
    fn first_fit_displacement_zero_on_empty_table() {
        let mut row = BTreeMap::new();
        row.insert(2usize, PackedAction::Shift(7));
        let check: Vec<i32> = Vec::new();
        assert_eq!(first_fit_displacement(&row, &check), 0);
    }

    /// `$accept : S $end ; S : 'a' ;` packs into 4 rows; state 0's shift on
    /// 'a' must survive round-tripping through `base`/`check`/`action`.
    #[test]
    fn build_packs_trivial_grammar_and_preserves_shift() {
        let loc = lexan::Location::default();
        let accept = NonTerminal::new_start();
        let s = NonTerminal::new_defined("S", &loc);
        let end = crate::symbol::terminal::Token::new_end();
        let a = crate::symbol::terminal::Token::new_literal_token("a", "a", &loc);
        a.set_index(1);

        let accept_production = Production::new(
            0,
            accept,
            ProductionTail::new(
                &[Symbol::NonTerminal(s.clone()), Symbol::Terminal(end.clone())],
                None,
                None,
                None,
            ),
        );
        let s_production = Production::new(
            1,
            s,
            ProductionTail::new(&[Symbol::Terminal(a.clone())], None, None, None),
        );

        let productions = vec![accept_production.clone(), s_production];
        let nullable_derives = NullableDerives::compute(&productions);
        let automaton = Lr0Automaton::build(&accept_production, &nullable_derives);
        let lalr_tables = LalrTables::compute(&automaton, &nullable_derives, 2);
        let tokens = vec![Some(end.clone()), Some(a.clone())];
        let action_table =
            ActionTable::build(&automaton, &nullable_derives, &lalr_tables, &tokens, None, None, false).unwrap();

        let packed = PackedTables::build(&action_table, |t| t.index(), 2);
        assert_eq!(packed.base.len(), 4);
        assert_eq!(packed.default.len(), 4);

        let state0_base = packed.base[0];
        assert!(state0_base >= 0);
        let slot = state0_base as usize + a.index();
        assert_eq!(packed.check[slot], 0);
        assert!(matches!(packed.action[slot], Some(PackedAction::Shift(_))));
    }
}
