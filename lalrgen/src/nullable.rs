// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! §4.C: the nullable predicate and the `derives` index, both computed once
//! from the frozen rule store and reused by every later stage (closure,
//! reads-relation, table emission).

use std::collections::BTreeMap;

use crate::production::Production;
use crate::symbol::non_terminal::NonTerminal;
use crate::symbol::Symbol;

/// `nullable[A]` for every nonterminal, and the `derives[A]` rule list,
/// computed together since both are keyed on the same nonterminal set.
pub struct NullableDerives {
    nullable: BTreeMap<NonTerminal, bool>,
    derives: BTreeMap<NonTerminal, Vec<Production>>,
}

impl NullableDerives {
    /// Iterates to a fixed point: a nonterminal becomes nullable as soon as
    /// some rule for it has every rhs symbol already marked nullable (the
    /// empty rhs trivially qualifies). Converges in at most `|nonterminals|`
    /// passes since each pass that makes progress flips at least one entry
    /// from false to true.
    pub fn compute(productions: &[Production]) -> Self {
        let mut derives: BTreeMap<NonTerminal, Vec<Production>> = BTreeMap::new();
        let mut nullable: BTreeMap<NonTerminal, bool> = BTreeMap::new();
        for production in productions {
            derives
                .entry(production.left_hand_side().clone())
                .or_insert_with(Vec::new)
                .push(production.clone());
            nullable.entry(production.left_hand_side().clone()).or_insert(false);
        }

        loop {
            let mut changed = false;
            for production in productions {
                let lhs = production.left_hand_side();
                if *nullable.get(lhs).unwrap_or(&false) {
                    continue;
                }
                let all_nullable = production.right_hand_side_symbols().all(|symbol| match symbol {
                    Symbol::Terminal(_) => false,
                    Symbol::NonTerminal(nt) => *nullable.get(nt).unwrap_or(&false),
                });
                if all_nullable {
                    nullable.insert(lhs.clone(), true);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Self { nullable, derives }
    }

    pub fn is_nullable(&self, non_terminal: &NonTerminal) -> bool {
        *self.nullable.get(non_terminal).unwrap_or(&false)
    }

    pub fn derives(&self, non_terminal: &NonTerminal) -> &[Production] {
        self.derives
            .get(non_terminal)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::NullableDerives;
    use crate::production::{Production, ProductionTail};
    use crate::symbol::non_terminal::NonTerminal;
    use crate::symbol::terminal::Token;
    use crate::symbol::Symbol;

    fn nt(name: &str) -> NonTerminal {
        NonTerminal::new_defined(name, &lexan::Location::default())
    }

    fn token(name: &str) -> Token {
        Token::new_literal_token(name, name, &lexan::Location::default())
    }

    /// `S : A B C ; A : ; B : ;` — A and B are nullable, S and C are not.
    #[test]
    fn nullable_cascade_through_empty_rules() {
        let s = nt("S");
        let a = nt("A");
        let b = nt("B");
        let c_token = token("c");

        let s_rule = Production::new(
            0,
            s,
            ProductionTail::new(
                &[
                    Symbol::NonTerminal(a.clone()),
                    Symbol::NonTerminal(b.clone()),
                    Symbol::Terminal(c_token),
                ],
                None,
                None,
                None,
            ),
        );
        let a_rule = Production::new(1, a.clone(), ProductionTail::new(&[], None, None, None));
        let b_rule = Production::new(2, b.clone(), ProductionTail::new(&[], None, None, None));

        let derived = NullableDerives::compute(&[s_rule.clone(), a_rule, b_rule]);
        assert!(derived.is_nullable(&a));
        assert!(derived.is_nullable(&b));
        assert!(!derived.is_nullable(s_rule.left_hand_side()));
    }

    #[test]
    fn non_nullable_nonterminal_has_no_derives_entry_missing_as_false() {
        let s = nt("S");
        let derived = NullableDerives::compute(&[]);
        assert!(!derived.is_nullable(&s));
        assert!(derived.derives(&s).is_empty());
    }
}
