// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! Drives a grammar source string through every stage described in §4: read,
//! finalize the symbol table, compute nullability, build the LR(0) automaton,
//! propagate LALR(1) lookahead, resolve actions and pack the tables. §7's
//! error taxonomy governs what is fatal (returned as `Err`) versus what is
//! accumulated as a warning and reported alongside a successful build.

use std::collections::BTreeSet;

use crate::actions::ActionTable;
use crate::error::Error;
use crate::lalr::LalrTables;
use crate::lr0::Lr0Automaton;
use crate::nullable::NullableDerives;
use crate::pack::PackedTables;
use crate::production::{Production, ProductionTail};
use crate::reader;
use crate::symbol::non_terminal::NonTerminal;
use crate::symbol::terminal::Token;
use crate::symbol::{FinalizedSymbols, Symbol};

/// Everything downstream code generation (`crate::emit`) needs: the finalized
/// symbol table, the full (rule-0-prepended) production list, the automaton
/// and its packed action/goto tables, and the opaque user text the reader
/// lifted out of the grammar file.
pub struct GeneratedParser {
    pub symbols: FinalizedSymbols,
    pub productions: Vec<Production>,
    pub automaton: Lr0Automaton,
    pub nullable_derives: NullableDerives,
    pub lalr_tables: LalrTables,
    pub action_table: ActionTable,
    pub packed: PackedTables,
    pub prologue: Option<String>,
    pub epilogue: Option<String>,
    pub union_block: Option<String>,
    pub code_blocks: Vec<String>,
    pub pure_parser: bool,
    pub locations: bool,
    pub parse_param: Option<String>,
    pub lex_param: Option<String>,
    pub destructors: Vec<(Option<crate::symbol::tag::Tag>, String)>,
}

/// Reads `source` and runs it through every construction stage. Returns the
/// built tables plus any non-fatal warnings (`Error::UnreachableSymbol` and
/// `Error::UnusedRule`) accumulated along the way. `backtrack` mirrors the
/// original tool's `-B` flag (default off): with it unset, an undeclared
/// shift/reduce conflict resolves to a plain shift and the suppressed
/// reduces are only recorded in `conflicts`; with it set, the reduces are
/// additionally retried at parse time if the shift path dead-ends.
pub fn build(source: &str, label: &str, backtrack: bool) -> Result<(GeneratedParser, Vec<Error>), Error> {
    let mut reader_output = reader::read(source, label)?;

    if let Some(undeclared) = reader_output
        .symbols
        .non_terminals()
        .find(|nt| nt.is_undefined())
    {
        return Err(Error::UndeclaredNonterminal(
            undeclared.name().to_string(),
            undeclared.used_at(),
        ));
    }

    let start_non_terminal = reader_output.symbols.user_start().cloned();

    let symbols = std::mem::take(&mut reader_output.symbols);
    let finalized = symbols.finalize()?;

    let start_non_terminal = start_non_terminal.or(finalized.user_start.clone());
    let Some(start_non_terminal) = start_non_terminal else {
        return Err(Error::UndefinedStart);
    };

    if finalized.nsyms > u16::MAX as usize {
        return Err(Error::IntegerOverflow("symbol", finalized.nsyms));
    }
    if reader_output.productions.len() + 1 > u16::MAX as usize {
        return Err(Error::IntegerOverflow("production", reader_output.productions.len() + 1));
    }

    let accept_tail = ProductionTail::new(
        &[
            Symbol::NonTerminal(start_non_terminal),
            Symbol::Terminal(finalized.end_token.clone()),
        ],
        None,
        None,
        None,
    );
    let accept_production = Production::new(0, finalized.start_symbol.clone(), accept_tail);

    let mut productions = Vec::with_capacity(reader_output.productions.len() + 1);
    productions.push(accept_production.clone());
    productions.extend(reader_output.productions);

    let nullable_derives = NullableDerives::compute(&productions);
    let automaton = Lr0Automaton::build(&accept_production, &nullable_derives);
    let lalr_tables = LalrTables::compute(&automaton, &nullable_derives, finalized.ntokens);
    let tokens_by_index = finalized.token_by_index();
    let action_table = ActionTable::build(
        &automaton,
        &nullable_derives,
        &lalr_tables,
        &tokens_by_index,
        reader_output.expect,
        reader_output.expect_rr,
        backtrack,
    )?;
    let packed = PackedTables::build(&action_table, |token: &Token| token.index(), finalized.ntokens);

    if packed.base.len() != automaton.states.len() {
        return Err(Error::InternalInvariantViolation(
            "packed table row count does not match automaton state count",
        ));
    }

    let mut warnings = reachability_warnings(&finalized, &productions);

    // `%expect`/`%expect-rr` mismatches are fatal (checked inside
    // `ActionTable::build`); anything that survived to here with declared
    // conflict counts lower than the expectation was already a hard error.
    warnings.sort_by_key(Error::sort_key);

    let generated = GeneratedParser {
        symbols: finalized,
        productions,
        automaton,
        nullable_derives,
        lalr_tables,
        action_table,
        packed,
        prologue: reader_output.prologue,
        epilogue: reader_output.epilogue,
        union_block: reader_output.union_block,
        code_blocks: reader_output.code_blocks,
        pure_parser: reader_output.pure_parser,
        locations: reader_output.locations,
        parse_param: reader_output.parse_param,
        lex_param: reader_output.lex_param,
        destructors: reader_output.destructors,
    };

    Ok((generated, warnings))
}

/// §7: a nonterminal or token never reached by walking rule right-hand-sides
/// from the start symbol is `UnreachableSymbol`; a rule whose left-hand side
/// is itself unreachable can never be used, so it is separately reported as
/// `UnusedRule` (carrying the rule's own definition site, not the symbol's).
fn reachability_warnings(symbols: &FinalizedSymbols, productions: &[Production]) -> Vec<Error> {
    let (reachable_non_terminals, reachable_tokens) = reachable_symbols(&symbols.start_symbol, productions);

    let mut warnings = Vec::new();
    for non_terminal in symbols.non_terminals.iter() {
        if !reachable_non_terminals.contains(non_terminal) {
            warnings.push(Error::UnreachableSymbol(non_terminal.name().to_string()));
        }
    }
    for token in symbols.tokens.iter() {
        if !reachable_tokens.contains(token) {
            warnings.push(Error::UnreachableSymbol(token.name().to_string()));
        }
    }
    // Skip production 0: the synthetic `$accept` rule has no user definition
    // site and is reachable by construction.
    for production in productions.iter().skip(1) {
        if !reachable_non_terminals.contains(production.left_hand_side()) {
            if let Some(location) = production.left_hand_side().first_definition() {
                warnings.push(Error::UnusedRule(production.left_hand_side().name().to_string(), location));
            }
        }
    }
    warnings
}

fn reachable_symbols(start: &NonTerminal, productions: &[Production]) -> (BTreeSet<NonTerminal>, BTreeSet<Token>) {
    let mut non_terminals: BTreeSet<NonTerminal> = BTreeSet::new();
    let mut tokens: BTreeSet<Token> = BTreeSet::new();
    let mut worklist = vec![start.clone()];
    non_terminals.insert(start.clone());

    while let Some(current) = worklist.pop() {
        for production in productions.iter().filter(|p| p.left_hand_side() == &current) {
            for symbol in production.right_hand_side_symbols() {
                match symbol {
                    Symbol::Terminal(token) => {
                        tokens.insert(token.clone());
                    }
                    Symbol::NonTerminal(child) => {
                        if non_terminals.insert(child.clone()) {
                            worklist.push(child.clone());
                        }
                    }
                }
            }
        }
    }
    (non_terminals, tokens)
}
