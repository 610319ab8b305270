// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! §4.E: DeRemer-Pennello lookahead computation. This is not adapted from any
//! prior implementation in this workspace — the kernel-carried, closure-time
//! lookahead merge used elsewhere in the corpus is a different (older, less
//! precise) technique. `reads`/`includes` and their SCC-based fixed points
//! are implemented here from the algorithm's published description.

use std::collections::BTreeMap;

use crate::bitset::TokenBitSet;
use crate::lr0::Lr0Automaton;
use crate::nullable::NullableDerives;
use crate::production::GrammarItemKey;
use crate::symbol::non_terminal::NonTerminal;
use crate::symbol::Symbol;

/// A nonterminal (goto) transition `(from, symbol) -> to`, given a dense id
/// equal to its position in [`LalrTables::transitions`]. Ascending transition
/// id order is the iteration order used throughout this module, per the
/// determinism requirement in §5.
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: u32,
    pub symbol: NonTerminal,
    pub to: u32,
}

struct Tarjan<'a> {
    graph: &'a [Vec<usize>],
    counter: usize,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    components: Vec<Vec<usize>>,
}

impl<'a> Tarjan<'a> {
    fn new(graph: &'a [Vec<usize>]) -> Self {
        let n = graph.len();
        Self {
            graph,
            counter: 0,
            stack: Vec::new(),
            on_stack: vec![false; n],
            index: vec![None; n],
            lowlink: vec![0; n],
            components: Vec::new(),
        }
    }

    /// Returns components in reverse topological order of the dependency
    /// graph: a node's dependencies are always in an earlier (or the same)
    /// component, never a later one.
    fn run(mut self) -> Vec<Vec<usize>> {
        for v in 0..self.graph.len() {
            if self.index[v].is_none() {
                self.strongconnect(v);
            }
        }
        self.components
    }

    fn strongconnect(&mut self, v: usize) {
        self.index[v] = Some(self.counter);
        self.lowlink[v] = self.counter;
        self.counter += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        let neighbours = self.graph[v].clone();
        for w in neighbours {
            if self.index[w].is_none() {
                self.strongconnect(w);
                self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
            } else if self.on_stack[w] {
                self.lowlink[v] = self.lowlink[v].min(self.index[w].unwrap());
            }
        }

        if self.lowlink[v] == self.index[v].unwrap() {
            let mut component = Vec::new();
            loop {
                let w = self.stack.pop().unwrap();
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

/// Resolves `graph`/`seeds` (a dependency graph over the same node set as
/// `seeds`, where node `n`'s final value is `seeds[n]` unioned with the final
/// value of every node in `graph[n]`) to a fixed point using Tarjan's SCCs.
/// Since components come out in reverse topological order, every out-of-
/// component dependency a member needs has already been finalized by the
/// time that member's component is processed — one pass per component
/// suffices, no outer iteration to quiescence is needed.
fn propagate(graph: &[Vec<usize>], seeds: &[TokenBitSet], width: usize) -> Vec<TokenBitSet> {
    let components = Tarjan::new(graph).run();
    let mut result = seeds.to_vec();
    for component in components {
        let members: std::collections::BTreeSet<usize> = component.iter().copied().collect();
        let mut shared = TokenBitSet::new(width);
        for &node in &component {
            shared.union_with(&seeds[node]);
        }
        for &node in &component {
            for &dep in &graph[node] {
                if !members.contains(&dep) {
                    shared.union_with(&result[dep]);
                }
            }
        }
        for &node in &component {
            result[node] = shared.clone();
        }
    }
    result
}

pub struct LalrTables {
    pub transitions: Vec<Transition>,
    index_of: BTreeMap<(u32, NonTerminal), usize>,
    pub read: Vec<TokenBitSet>,
    pub follow: Vec<TokenBitSet>,
    ntokens: usize,
}

impl LalrTables {
    fn transition_index(&self, state: u32, symbol: &NonTerminal) -> Option<usize> {
        self.index_of.get(&(state, symbol.clone())).copied()
    }

    /// §4.E steps 1-5: direct-reads, the reads relation and its SCC fixed
    /// point (`read`), then the includes relation and its SCC fixed point
    /// (`follow`), over the full set of nonterminal transitions in `automaton`.
    pub fn compute(automaton: &Lr0Automaton, nullable_derives: &NullableDerives, ntokens: usize) -> Self {
        let mut transitions = Vec::new();
        let mut index_of = BTreeMap::new();
        for state in &automaton.states {
            for (symbol, &target) in state.gotos.iter() {
                let idx = transitions.len();
                index_of.insert((state.ident, symbol.clone()), idx);
                transitions.push(Transition {
                    from: state.ident,
                    symbol: symbol.clone(),
                    to: target,
                });
            }
        }

        let dr: Vec<TokenBitSet> = transitions
            .iter()
            .map(|t| {
                let mut bits = TokenBitSet::new(ntokens);
                for token in automaton.states[t.to as usize].shifts.keys() {
                    bits.insert(token.index());
                }
                bits
            })
            .collect();

        let reads_graph: Vec<Vec<usize>> = transitions
            .iter()
            .map(|t| {
                automaton.states[t.to as usize]
                    .gotos
                    .iter()
                    .filter(|(c, _)| nullable_derives.is_nullable(c))
                    .filter_map(|(c, _)| index_of.get(&(t.to, c.clone())).copied())
                    .collect()
            })
            .collect();

        let read = propagate(&reads_graph, &dr, ntokens);

        let tables = Self {
            transitions,
            index_of,
            read,
            follow: Vec::new(),
            ntokens,
        };

        let includes_graph = tables.build_includes_graph(automaton, nullable_derives);
        let follow = propagate(&includes_graph, &tables.read, ntokens);

        Self { follow, ..tables }
    }

    /// §4.E step 4: `(p, A) includes (p', B)` iff some production `B -> β A γ`
    /// has nullable `γ`, reached by walking `β` forward from `p'`. Walking
    /// forward from every `(p', B)` transition through every one of `B`'s
    /// productions recovers every such `(p, A)` at the point the walk passes
    /// symbol `A`; this is exactly the set of transitions whose `Follow` must
    /// include `Follow(p', B)`.
    fn build_includes_graph(
        &self,
        automaton: &Lr0Automaton,
        nullable_derives: &NullableDerives,
    ) -> Vec<Vec<usize>> {
        let mut includes: Vec<Vec<usize>> = vec![Vec::new(); self.transitions.len()];
        for (source_idx, transition) in self.transitions.iter().enumerate() {
            for production in nullable_derives.derives(&transition.symbol) {
                let rhs: Vec<Symbol> = production.right_hand_side_symbols().cloned().collect();
                let mut cursor = transition.from;
                for (position, symbol) in rhs.iter().enumerate() {
                    if let Symbol::NonTerminal(a) = symbol {
                        let tail_nullable = rhs[position + 1..].iter().all(|s| match s {
                            Symbol::NonTerminal(nt) => nullable_derives.is_nullable(nt),
                            Symbol::Terminal(_) => false,
                        });
                        if tail_nullable {
                            if let Some(target_idx) = self.transition_index(cursor, a) {
                                includes[target_idx].push(source_idx);
                            }
                        }
                    }
                    let Some(next) = (match symbol {
                        Symbol::Terminal(token) => automaton.states[cursor as usize].shifts.get(token).copied(),
                        Symbol::NonTerminal(nt) => automaton.states[cursor as usize].gotos.get(nt).copied(),
                    }) else {
                        break;
                    };
                    cursor = next;
                }
            }
        }
        includes
    }

    /// §4.E step 5: `LA(q, r)` for a reducible item `A -> α ·` at state `q` is
    /// the union of `Follow(p, A)` over every transition `(p, A) -> q`
    /// reachable by walking `α` backwards from `q` (there may be more than
    /// one such `p` once LALR state merging has happened).
    pub fn look_ahead(
        &self,
        reverse: &BTreeMap<u32, Vec<(u32, Symbol)>>,
        item: &GrammarItemKey,
        state: u32,
    ) -> TokenBitSet {
        let rhs: Vec<Symbol> = item.production().right_hand_side_symbols().cloned().collect();
        let lhs = item.production().left_hand_side();
        let predecessors = predecessor_states(reverse, state, &rhs);
        let mut la = TokenBitSet::new(self.ntokens);
        for p in predecessors {
            if let Some(idx) = self.transition_index(p, lhs) {
                la.union_with(&self.follow[idx]);
            }
        }
        la
    }
}

/// All states reachable backwards from `end` by consuming `path` in reverse,
/// one symbol at a time, via the (possibly multi-valued) reverse transition
/// multimap. Explored level by level so every valid predecessor is found even
/// when several states transition into `end`/intermediate states on the same
/// symbol.
fn predecessor_states(
    reverse: &BTreeMap<u32, Vec<(u32, Symbol)>>,
    end: u32,
    path: &[Symbol],
) -> std::collections::BTreeSet<u32> {
    let mut frontier: std::collections::BTreeSet<u32> = std::iter::once(end).collect();
    for symbol in path.iter().rev() {
        let mut next_frontier = std::collections::BTreeSet::new();
        for state in frontier.iter() {
            if let Some(edges) = reverse.get(state) {
                for (from, edge_symbol) in edges {
                    if edge_symbol == symbol {
                        next_frontier.insert(*from);
                    }
                }
            }
        }
        frontier = next_frontier;
    }
    frontier
}

/// Builds the reverse transition multimap (`to -> [(from, symbol)]`) used by
/// [`LalrTables::look_ahead`] to walk a rule's rhs backwards from its
/// reducing state.
pub fn reverse_transitions(automaton: &Lr0Automaton) -> BTreeMap<u32, Vec<(u32, Symbol)>> {
    let mut reverse: BTreeMap<u32, Vec<(u32, Symbol)>> = BTreeMap::new();
    for state in &automaton.states {
        for (token, &target) in state.shifts.iter() {
            reverse
                .entry(target)
                .or_insert_with(Vec::new)
                .push((state.ident, Symbol::Terminal(token.clone())));
        }
        for (non_terminal, &target) in state.gotos.iter() {
            reverse
                .entry(target)
                .or_insert_with(Vec::new)
                .push((state.ident, Symbol::NonTerminal(non_terminal.clone())));
        }
    }
    reverse
}

#[cfg(test)]
mod tests {
    use super::{reverse_transitions, LalrTables};
    use crate::lr0::Lr0Automaton;
    use crate::nullable::NullableDerives;
    use crate::production::{GrammarItemKey, Production, ProductionTail};
    use crate::symbol::non_terminal::NonTerminal;
    use crate::symbol::terminal::Token;
    use crate::symbol::Symbol;

    /// `$accept : S $end ; S : 'a' ;` — the only viable lookahead for the
    /// reducible item `S : 'a' .` is `$end`, since nothing else can follow
    /// the start symbol.
    #[test]
    fn look_ahead_of_only_reduction_is_end() {
        let loc = lexan::Location::default();
        let accept = NonTerminal::new_start();
        let s = NonTerminal::new_defined("S", &loc);
        let end = Token::new_end();
        let a = Token::new_literal_token("a", "a", &loc);
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

        let productions = vec![accept_production.clone(), s_production.clone()];
        let nullable_derives = NullableDerives::compute(&productions);
        let automaton = Lr0Automaton::build(&accept_production, &nullable_derives);
        let lalr_tables = LalrTables::compute(&automaton, &nullable_derives, 2);
        let reverse = reverse_transitions(&automaton);

        let shift_a_state = automaton.states[0].shifts[&a];
        let item = GrammarItemKey::from(&s_production).shifted();
        assert!(item.is_reducible());

        let look_ahead = lalr_tables.look_ahead(&reverse, &item, shift_a_state);
        let found: Vec<usize> = look_ahead.iter().collect();
        assert_eq!(found, vec![end.index()]);
    }
}
