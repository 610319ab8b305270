// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! §4.D: the LR(0) automaton. States carry only their kernel items; closure is
//! recomputed on demand from the frozen rule store rather than stored, so the
//! only thing that drives state identity is the kernel-item set (§3's Core
//! invariant).

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::nullable::NullableDerives;
use crate::production::{GrammarItemKey, Production};
use crate::symbol::non_terminal::NonTerminal;
use crate::symbol::terminal::Token;
use crate::symbol::Symbol;

#[derive(Debug)]
pub struct Lr0State {
    pub ident: u32,
    pub accessing_symbol: Option<Symbol>,
    pub kernel: BTreeSet<GrammarItemKey>,
    pub shifts: BTreeMap<Token, u32>,
    pub gotos: BTreeMap<NonTerminal, u32>,
}

pub struct Lr0Automaton {
    pub states: Vec<Lr0State>,
}

/// Epsilon-closure of a kernel item set: repeatedly add, for every item with
/// the dot immediately before a nonterminal `B`, a dot-zero item for each of
/// `derives(B)`. A visited-production set bounds this to one expansion per
/// nonterminal per call, matching the `O(|items|·|nonterminals|)` bound noted
/// in the design notes.
pub fn closure(
    kernel: &BTreeSet<GrammarItemKey>,
    nullable_derives: &NullableDerives,
) -> BTreeSet<GrammarItemKey> {
    let mut items: BTreeSet<GrammarItemKey> = kernel.clone();
    let mut expanded: BTreeSet<NonTerminal> = BTreeSet::new();
    let mut worklist: VecDeque<GrammarItemKey> = kernel.iter().cloned().collect();

    while let Some(item) = worklist.pop_front() {
        if let Some(Symbol::NonTerminal(non_terminal)) = item.next_symbol() {
            if expanded.insert(non_terminal.clone()) {
                for production in nullable_derives.derives(non_terminal) {
                    let new_item = GrammarItemKey::from(production);
                    if items.insert(new_item.clone()) {
                        worklist.push_back(new_item);
                    }
                }
            }
        }
    }
    items
}

impl Lr0Automaton {
    /// Seeds state 0 with the kernel item `$accept : · start $end`, then
    /// explores states breadth first: closure, group by next symbol, look the
    /// resulting goto kernel up in a map keyed by the kernel set itself so two
    /// states with identical kernels are never allocated twice.
    pub fn build(start_production: &Production, nullable_derives: &NullableDerives) -> Self {
        let seed_kernel: BTreeSet<GrammarItemKey> =
            std::iter::once(GrammarItemKey::from(start_production)).collect();

        let mut states: Vec<Lr0State> = Vec::new();
        let mut kernel_to_ident: BTreeMap<BTreeSet<GrammarItemKey>, u32> = BTreeMap::new();
        let mut queue: VecDeque<u32> = VecDeque::new();

        states.push(Lr0State {
            ident: 0,
            accessing_symbol: None,
            kernel: seed_kernel.clone(),
            shifts: BTreeMap::new(),
            gotos: BTreeMap::new(),
        });
        kernel_to_ident.insert(seed_kernel, 0);
        queue.push_back(0);

        while let Some(ident) = queue.pop_front() {
            let closure_items = closure(&states[ident as usize].kernel, nullable_derives);

            let mut by_symbol: BTreeMap<Symbol, BTreeSet<GrammarItemKey>> = BTreeMap::new();
            for item in closure_items.iter() {
                if let Some(symbol) = item.next_symbol() {
                    by_symbol
                        .entry(symbol.clone())
                        .or_insert_with(BTreeSet::new)
                        .insert(item.shifted());
                }
            }

            for (symbol, goto_kernel) in by_symbol {
                let target = if let Some(existing) = kernel_to_ident.get(&goto_kernel) {
                    *existing
                } else {
                    let new_ident = states.len() as u32;
                    states.push(Lr0State {
                        ident: new_ident,
                        accessing_symbol: Some(symbol.clone()),
                        kernel: goto_kernel.clone(),
                        shifts: BTreeMap::new(),
                        gotos: BTreeMap::new(),
                    });
                    kernel_to_ident.insert(goto_kernel, new_ident);
                    queue.push_back(new_ident);
                    new_ident
                };
                match &symbol {
                    Symbol::Terminal(token) => {
                        states[ident as usize].shifts.insert(token.clone(), target);
                    }
                    Symbol::NonTerminal(non_terminal) => {
                        states[ident as usize]
                            .gotos
                            .insert(non_terminal.clone(), target);
                    }
                }
            }
        }

        Self { states }
    }

    pub fn closure_of(&self, ident: u32, nullable_derives: &NullableDerives) -> BTreeSet<GrammarItemKey> {
        closure(&self.states[ident as usize].kernel, nullable_derives)
    }
}

#[cfg(test)]
mod tests {
    use super::Lr0Automaton;
    use crate::nullable::NullableDerives;
    use crate::production::{Production, ProductionTail};
    use crate::symbol::non_terminal::NonTerminal;
    use crate::symbol::terminal::Token;
    use crate::symbol::Symbol;

    /// `$accept : S $end ; S : 'a' ;` — the smallest automaton with a real
    /// shift/reduce/accept chain: 4 states, one shift out of state 0.
    #[test]
    fn trivial_grammar_has_four_states() {
        let loc = lexan::Location::default();
        let accept = NonTerminal::new_start();
        let s = NonTerminal::new_defined("S", &loc);
        let end = Token::new_literal_token("$end", "", &loc);
        let a = Token::new_literal_token("a", "a", &loc);

        let accept_production = Production::new(
            0,
            accept,
            ProductionTail::new(
                &[Symbol::NonTerminal(s.clone()), Symbol::Terminal(end)],
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

        let nullable_derives = NullableDerives::compute(&[accept_production.clone(), s_production]);
        let automaton = Lr0Automaton::build(&accept_production, &nullable_derives);

        assert_eq!(automaton.states.len(), 4);
        assert_eq!(automaton.states[0].shifts.len(), 1);
        assert!(automaton.states[0].shifts.contains_key(&a));
    }
}
