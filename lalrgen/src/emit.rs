// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! §6: turns a [`crate::pipeline::GeneratedParser`] into the primary output
//! (a `lalr1_plus::Parser` implementation driven at runtime by the packed
//! action/goto tables) plus the `-d`/`-v`/`-g`/`-i` auxiliary outputs.
//!
//! Unlike the per-state match arms a self-hosting generator can get away
//! with, every terminal here may be produced by a hand written lexer fed
//! through an external pipeline, so `next_action`/`goto_state` interpret the
//! displacement-packed tables directly instead of emitting one match arm per
//! state.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::pack::PackedAction;
use crate::pipeline::GeneratedParser;
use crate::production::Production;
use crate::symbol::non_terminal::NonTerminal;
use crate::symbol::terminal::Token;

/// Turns a symbol's declared name into a valid Rust identifier. Token and
/// nonterminal names coming out of `%token`/rule declarations are already
/// valid identifiers; this only has work to do for the built-in `$`-prefixed
/// symbols and for raw literal terminals (`'+'`, `"while"`) whose name is the
/// literal text itself.
fn sanitize_ident(name: &str) -> String {
    let mut chars = name.chars();
    let mut out = String::new();
    if name.starts_with('$') {
        out.push_str("AA");
        chars.next();
    }
    for ch in chars {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push_str(&format!("_{:x}", ch as u32));
        }
    }
    if out.is_empty() || out.chars().next().unwrap().is_ascii_digit() {
        out.insert(0, '_');
    }
    capitalize(&out)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn terminal_ident(token: &Token) -> String {
    sanitize_ident(token.name())
}

fn non_terminal_ident(non_terminal: &NonTerminal) -> String {
    if non_terminal.is_start() {
        "AAAccept".to_string()
    } else if non_terminal.is_error() {
        "AAError".to_string()
    } else {
        sanitize_ident(non_terminal.name())
    }
}

fn format_u32_set(set: &BTreeSet<u32>) -> String {
    let mut string = "btree_set![".to_string();
    for (index, number) in set.iter().enumerate() {
        if index > 0 {
            string += ", ";
        }
        string += &number.to_string();
    }
    string += "]";
    string
}

/// States that own at least one reducible `… : … error <tail>` item, keyed
/// by the terminal that makes them viable error-recovery targets (§4.B's
/// `error` token contract): these are the states `recover_from_error` may
/// pop the stack back down to.
fn recovery_states_by_token(generated: &GeneratedParser) -> BTreeMap<Token, BTreeSet<u32>> {
    let reverse = crate::lalr::reverse_transitions(&generated.automaton);
    let tokens_by_index = generated.symbols.token_by_index();
    let mut by_token: BTreeMap<Token, BTreeSet<u32>> = BTreeMap::new();
    for state in &generated.automaton.states {
        let closure_items = generated.automaton.closure_of(state.ident, &generated.nullable_derives);
        for item in closure_items.iter().filter(|item| item.has_reducible_error_recovery_tail()) {
            let look_ahead = generated.lalr_tables.look_ahead(&reverse, item, state.ident);
            for index in look_ahead.iter() {
                if let Some(Some(token)) = tokens_by_index.get(index) {
                    by_token.entry(token.clone()).or_default().insert(state.ident);
                }
            }
        }
    }
    by_token
}

/// The tokens a state's resolved actions actually cover: every declared
/// token when a default reduction absorbs everything not explicitly listed,
/// otherwise just the explicit entries (§7's `SyntaxError` diagnostic uses
/// this to report what was expected).
fn look_ahead_tokens<'a>(state: &'a crate::actions::StateActions, all_tokens: &'a [Token]) -> Vec<&'a Token> {
    if state.default_reduction.is_some() {
        all_tokens.iter().collect()
    } else {
        state.action_for_token.keys().collect()
    }
}

pub fn write_parser_code<W: Write>(
    generated: &GeneratedParser,
    attribute_type: &str,
    target_type: &str,
    wtr: &mut W,
) -> io::Result<()> {
    wtr.write_all(b"// generated by lalrgen.\n\n")?;
    if let Some(prologue) = &generated.prologue {
        wtr.write_all(prologue.as_bytes())?;
        wtr.write_all(b"\n\n")?;
    }
    if let Some(union_block) = &generated.union_block {
        wtr.write_all(b"// %union\n")?;
        wtr.write_all(union_block.as_bytes())?;
        wtr.write_all(b"\n\n")?;
    }
    for code_block in &generated.code_blocks {
        wtr.write_all(code_block.as_bytes())?;
        wtr.write_all(b"\n\n")?;
    }

    write_symbol_enum_code(generated, wtr)?;
    write_lexical_analyzer_code(generated, wtr)?;
    write_packed_tables(generated, wtr)?;
    write_parser_implementation_code(generated, attribute_type, target_type, wtr)?;

    if let Some(epilogue) = &generated.epilogue {
        wtr.write_all(b"\n")?;
        wtr.write_all(epilogue.as_bytes())?;
        wtr.write_all(b"\n")?;
    }
    Ok(())
}

fn write_symbol_enum_code<W: Write>(generated: &GeneratedParser, wtr: &mut W) -> io::Result<()> {
    wtr.write_all(b"use std::collections::BTreeSet;\n\n")?;
    wtr.write_all(b"macro_rules! btree_set {\n")?;
    wtr.write_all(b"    () => { BTreeSet::new() };\n")?;
    wtr.write_all(b"    ( $( $x:expr ),* ) => {\n")?;
    wtr.write_all(b"        {\n")?;
    wtr.write_all(b"            let mut set = BTreeSet::new();\n")?;
    wtr.write_all(b"            $( set.insert($x); )*\n")?;
    wtr.write_all(b"            set\n")?;
    wtr.write_all(b"        }\n")?;
    wtr.write_all(b"    };\n")?;
    wtr.write_all(b"}\n\n")?;

    wtr.write_all(b"#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq)]\n")?;
    wtr.write_all(b"pub enum AATerminal {\n")?;
    wtr.write_all(b"    AAEnd,\n")?;
    for token in &generated.symbols.tokens {
        wtr.write_fmt(format_args!("    {},\n", terminal_ident(token)))?;
    }
    wtr.write_all(b"}\n\n")?;

    wtr.write_all(b"impl std::fmt::Display for AATerminal {\n")?;
    wtr.write_all(b"    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {\n")?;
    wtr.write_all(b"        match self {\n")?;
    wtr.write_all(b"            AATerminal::AAEnd => write!(f, \"$end\"),\n")?;
    for token in &generated.symbols.tokens {
        wtr.write_fmt(format_args!(
            "            AATerminal::{} => write!(f, r###\"{}\"###),\n",
            terminal_ident(token),
            token.text()
        ))?;
    }
    wtr.write_all(b"        }\n")?;
    wtr.write_all(b"    }\n")?;
    wtr.write_all(b"}\n\n")?;

    wtr.write_all(b"#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq)]\n")?;
    wtr.write_all(b"pub enum AANonTerminal {\n")?;
    wtr.write_all(b"    AAAccept,\n")?;
    wtr.write_all(b"    AAError,\n")?;
    for non_terminal in &generated.symbols.non_terminals {
        wtr.write_fmt(format_args!("    {},\n", non_terminal_ident(non_terminal)))?;
    }
    wtr.write_all(b"}\n\n")?;

    wtr.write_all(b"impl std::fmt::Display for AANonTerminal {\n")?;
    wtr.write_all(b"    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {\n")?;
    wtr.write_all(b"        match self {\n")?;
    wtr.write_all(b"            AANonTerminal::AAAccept => write!(f, \"$accept\"),\n")?;
    wtr.write_all(b"            AANonTerminal::AAError => write!(f, \"error\"),\n")?;
    for non_terminal in &generated.symbols.non_terminals {
        wtr.write_fmt(format_args!(
            "            AANonTerminal::{} => write!(f, r\"{}\"),\n",
            non_terminal_ident(non_terminal),
            non_terminal.name()
        ))?;
    }
    wtr.write_all(b"        }\n")?;
    wtr.write_all(b"    }\n")?;
    wtr.write_all(b"}\n\n")?;
    Ok(())
}

fn write_lexical_analyzer_code<W: Write>(generated: &GeneratedParser, wtr: &mut W) -> io::Result<()> {
    wtr.write_all(b"lazy_static::lazy_static! {\n")?;
    wtr.write_all(b"    static ref AALEXAN: lexan::LexicalAnalyzer<AATerminal> = {\n")?;
    wtr.write_all(b"        use AATerminal::*;\n")?;
    wtr.write_all(b"        lexan::LexicalAnalyzer::new(\n")?;
    wtr.write_all(b"            &[\n")?;
    // Every token the reader interns is registered with `lexan` as a literal
    // pattern: the grammar DSL has no `%token NAME /regex/` form, so the
    // regex-pattern slot below is always empty.
    for token in &generated.symbols.tokens {
        wtr.write_fmt(format_args!(
            "                ({}, r###\"{}\"###),\n",
            terminal_ident(token),
            token.text()
        ))?;
    }
    wtr.write_all(b"            ],\n")?;
    wtr.write_all(b"            &[],\n")?;
    wtr.write_all(b"            &[r\"\\s+\", r\"//[^\\n]*\", r\"/\\*(?:[^*]|\\*[^/])*\\*/\"],\n")?;
    wtr.write_all(b"            AAEnd,\n")?;
    wtr.write_all(b"        )\n")?;
    wtr.write_all(b"    };\n")?;
    wtr.write_all(b"}\n\n")?;
    Ok(())
}

/// §4.G's packed action table plus the two tables §6 additionally requires:
/// `rlen[r]` (production length) and the production's left-hand side, used
/// together by `production_data`. `AAMULTI` recovers the shift target plus
/// the full reduce-candidate list a `Backtrack` action needs that
/// `PackedTables` itself collapses to the single committed shift.
fn write_packed_tables<W: Write>(generated: &GeneratedParser, wtr: &mut W) -> io::Result<()> {
    let packed = &generated.packed;

    wtr.write_all(b"const AAACCEPT: i32 = i32::MAX;\n\n")?;

    wtr.write_all(b"static AABASE: &[i32] = &[\n")?;
    write_comma_list(wtr, packed.base.iter().map(|v| v.to_string()))?;
    wtr.write_all(b"];\n\n")?;

    wtr.write_all(b"static AADEFAULT: &[i32] = &[\n")?;
    write_comma_list(wtr, packed.default.iter().map(|v| v.to_string()))?;
    wtr.write_all(b"];\n\n")?;

    wtr.write_all(b"static AACHECK: &[i32] = &[\n")?;
    write_comma_list(wtr, packed.check.iter().map(|v| v.to_string()))?;
    wtr.write_all(b"];\n\n")?;

    wtr.write_all(b"static AAACTION: &[i32] = &[\n")?;
    write_comma_list(
        wtr,
        packed.action.iter().map(|entry| {
            match entry {
                Some(PackedAction::Shift(target)) => (*target as i32).to_string(),
                Some(PackedAction::Reduce(rule)) => (-(*rule as i32 + 1)).to_string(),
                Some(PackedAction::Accept) => "AAACCEPT".to_string(),
                None => "0".to_string(),
            }
        }),
    )?;
    wtr.write_all(b"];\n\n")?;

    wtr.write_all(b"static AARLEN: &[usize] = &[\n")?;
    write_comma_list(wtr, generated.productions.iter().map(|p| p.len().to_string()))?;
    wtr.write_all(b"];\n\n")?;

    wtr.write_all(b"static AARLHS: &[AANonTerminal] = &[\n")?;
    write_comma_list(
        wtr,
        generated
            .productions
            .iter()
            .map(|p| format!("AANonTerminal::{}", non_terminal_ident(p.left_hand_side()))),
    )?;
    wtr.write_all(b"];\n\n")?;

    let multi = backtrack_alternatives(generated);
    wtr.write_all(b"static AAMULTI: &[(u32, AATerminal, u32, &[u32])] = &[\n")?;
    for (state, token, shift_target, rules) in multi.iter() {
        wtr.write_fmt(format_args!(
            "    ({}, AATerminal::{}, {}, &[{}]),\n",
            state,
            terminal_ident(token),
            shift_target,
            rules.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
        ))?;
    }
    wtr.write_all(b"];\n\n")?;
    Ok(())
}

fn write_comma_list<W: Write>(wtr: &mut W, items: impl Iterator<Item = String>) -> io::Result<()> {
    let mut column = 0;
    for item in items {
        wtr.write_fmt(format_args!("{}, ", item))?;
        column += 1;
        if column % 16 == 0 {
            wtr.write_all(b"\n")?;
        }
    }
    wtr.write_all(b"\n")?;
    Ok(())
}

fn backtrack_alternatives(generated: &GeneratedParser) -> Vec<(u32, Token, u32, Vec<u32>)> {
    let mut out = Vec::new();
    for state in &generated.action_table.states {
        for (token, action) in state.action_for_token.iter() {
            if let crate::actions::Action::Backtrack(shift_target, candidates) = action {
                out.push((
                    state.state,
                    token.clone(),
                    *shift_target,
                    candidates.iter().map(Production::ident).collect(),
                ));
            }
        }
    }
    out
}

fn write_parser_implementation_code<W: Write>(
    generated: &GeneratedParser,
    attribute_type: &str,
    target_type: &str,
    wtr: &mut W,
) -> io::Result<()> {
    wtr.write_fmt(format_args!(
        "impl lalr1_plus::Parser<AATerminal, AANonTerminal, {}> for {} {{\n",
        attribute_type, target_type
    ))?;
    wtr.write_all(b"    fn lexical_analyzer(&self) -> &lexan::LexicalAnalyzer<AATerminal> {\n")?;
    wtr.write_all(b"        &AALEXAN\n")?;
    wtr.write_all(b"    }\n\n")?;

    write_error_recovery_code(generated, wtr)?;
    write_look_ahead_set_code(generated, wtr)?;
    write_next_action_code(generated, attribute_type, wtr)?;
    write_production_data_code(wtr)?;
    write_goto_table_code(generated, wtr)?;
    write_semantic_action_code(generated, attribute_type, wtr)?;

    wtr.write_all(b"}\n")?;
    Ok(())
}

fn write_error_recovery_code<W: Write>(generated: &GeneratedParser, wtr: &mut W) -> io::Result<()> {
    let by_token = recovery_states_by_token(generated);

    wtr.write_all(b"    fn viable_error_recovery_states(token: &AATerminal) -> BTreeSet<u32> {\n")?;
    wtr.write_all(b"        match token {\n")?;
    for token in &generated.symbols.tokens {
        if let Some(set) = by_token.get(token) {
            if !set.is_empty() {
                wtr.write_fmt(format_args!(
                    "            AATerminal::{} => {},\n",
                    terminal_ident(token),
                    format_u32_set(set)
                ))?;
            }
        }
    }
    // `$end` (and any token with no error-recovery tail in its lookahead) has
    // no viable recovery state to pop back to.
    wtr.write_all(b"            _ => btree_set![],\n")?;
    wtr.write_all(b"        }\n")?;
    wtr.write_all(b"    }\n\n")?;

    wtr.write_all(b"    fn error_goto_state(state: u32) -> u32 {\n")?;
    wtr.write_all(b"        match state {\n")?;
    for automaton_state in &generated.automaton.states {
        if let Some(target) = automaton_state.gotos.get(&generated.symbols.error_symbol) {
            wtr.write_fmt(format_args!("            {} => {},\n", automaton_state.ident, target))?;
        }
    }
    wtr.write_all(b"            _ => panic!(\"no error recovery goto for state {}\", state),\n")?;
    wtr.write_all(b"        }\n")?;
    wtr.write_all(b"    }\n\n")?;
    Ok(())
}

fn write_look_ahead_set_code<W: Write>(generated: &GeneratedParser, wtr: &mut W) -> io::Result<()> {
    wtr.write_all(b"    fn look_ahead_set(state: u32) -> BTreeSet<AATerminal> {\n")?;
    wtr.write_all(b"        use AATerminal::*;\n")?;
    wtr.write_all(b"        match state {\n")?;
    for state in &generated.action_table.states {
        let tokens = look_ahead_tokens(state, &generated.symbols.tokens);
        let names: Vec<String> = tokens.iter().map(|t| terminal_ident(t)).collect();
        wtr.write_fmt(format_args!(
            "            {} => btree_set![{}],\n",
            state.state,
            names.join(", ")
        ))?;
    }
    wtr.write_all(b"            _ => panic!(\"illegal state: {}\", state),\n")?;
    wtr.write_all(b"        }\n")?;
    wtr.write_all(b"    }\n\n")?;
    Ok(())
}

fn write_next_action_code<W: Write>(generated: &GeneratedParser, attribute_type: &str, wtr: &mut W) -> io::Result<()> {
    wtr.write_all(b"    fn next_action(\n")?;
    wtr.write_all(b"        &self,\n")?;
    wtr.write_all(b"        aa_state: u32,\n")?;
    wtr.write_fmt(format_args!(
        "        _aa_attributes: &lalr1_plus::ParseStack<AATerminal, AANonTerminal, {}>,\n",
        attribute_type
    ))?;
    wtr.write_all(b"        aa_token: &lexan::Token<AATerminal>,\n")?;
    wtr.write_all(b"    ) -> lalr1_plus::Action<AATerminal> {\n")?;
    wtr.write_all(b"        let aa_tag = *aa_token.tag();\n")?;
    wtr.write_all(b"        for (state, token, shift_target, alternatives) in AAMULTI.iter() {\n")?;
    wtr.write_all(b"            if *state == aa_state && *token == aa_tag {\n")?;
    wtr.write_all(b"                return lalr1_plus::Action::Backtrack(*shift_target, alternatives.to_vec());\n")?;
    wtr.write_all(b"            }\n")?;
    wtr.write_all(b"        }\n")?;
    wtr.write_all(b"        let aa_index = aa_terminal_index(aa_tag);\n")?;
    wtr.write_all(b"        let aa_slot = AABASE[aa_state as usize] + aa_index as i32;\n")?;
    wtr.write_all(b"        if aa_slot >= 0 && (aa_slot as usize) < AACHECK.len() && AACHECK[aa_slot as usize] == aa_state as i32 {\n")?;
    wtr.write_all(b"            aa_decode_action(AAACTION[aa_slot as usize])\n")?;
    wtr.write_all(b"        } else {\n")?;
    wtr.write_all(b"            match AADEFAULT[aa_state as usize] {\n")?;
    wtr.write_all(b"                0 => lalr1_plus::Action::SyntaxError(Self::look_ahead_set(aa_state).into_iter().collect()),\n")?;
    wtr.write_all(b"                neg => lalr1_plus::Action::Reduce((-neg - 1) as u32),\n")?;
    wtr.write_all(b"            }\n")?;
    wtr.write_all(b"        }\n")?;
    wtr.write_all(b"    }\n\n")?;
    Ok(())
}

fn write_production_data_code<W: Write>(wtr: &mut W) -> io::Result<()> {
    wtr.write_all(b"    fn production_data(production_id: u32) -> (AANonTerminal, usize) {\n")?;
    wtr.write_all(b"        (AARLHS[production_id as usize], AARLEN[production_id as usize])\n")?;
    wtr.write_all(b"    }\n\n")?;
    Ok(())
}

fn write_goto_table_code<W: Write>(generated: &GeneratedParser, wtr: &mut W) -> io::Result<()> {
    wtr.write_all(b"    fn goto_state(lhs: &AANonTerminal, current_state: u32) -> u32 {\n")?;
    wtr.write_all(b"        match current_state {\n")?;
    for state in &generated.automaton.states {
        if state.gotos.is_empty() {
            continue;
        }
        wtr.write_fmt(format_args!("            {} => match lhs {{\n", state.ident))?;
        for (non_terminal, target) in state.gotos.iter() {
            wtr.write_fmt(format_args!(
                "                AANonTerminal::{} => {},\n",
                non_terminal_ident(non_terminal),
                target
            ))?;
        }
        wtr.write_fmt(format_args!(
            "                _ => panic!(\"malformed goto table: ({{:?}}, {})\", lhs),\n",
            state.ident
        ))?;
        wtr.write_all(b"            },\n")?;
    }
    wtr.write_all(b"            _ => panic!(\"malformed goto table: ({:?}, {})\", lhs, current_state),\n")?;
    wtr.write_all(b"        }\n")?;
    wtr.write_all(b"    }\n\n")?;
    Ok(())
}

fn write_semantic_action_code<W: Write>(generated: &GeneratedParser, attribute_type: &str, wtr: &mut W) -> io::Result<()> {
    wtr.write_all(b"    fn do_semantic_action<F: FnMut(String, String)>(\n")?;
    wtr.write_all(b"        &mut self,\n")?;
    wtr.write_all(b"        aa_production_id: u32,\n")?;
    wtr.write_fmt(format_args!("        aa_rhs: Vec<{}>,\n", attribute_type))?;
    wtr.write_all(b"        mut aa_inject: F,\n")?;
    wtr.write_fmt(format_args!("    ) -> {} {{\n", attribute_type))?;
    wtr.write_all(b"        let mut aa_lhs = if let Some(a) = aa_rhs.first() {\n")?;
    wtr.write_all(b"            a.clone()\n")?;
    wtr.write_all(b"        } else {\n")?;
    wtr.write_fmt(format_args!("            {}::default()\n", attribute_type))?;
    wtr.write_all(b"        };\n")?;
    wtr.write_all(b"        match aa_production_id {\n")?;
    for production in &generated.productions {
        if let Some(action_code) = production.expanded_action() {
            wtr.write_fmt(format_args!("            {} => {{\n", production.ident()))?;
            wtr.write_fmt(format_args!("                // {}\n", production))?;
            wtr.write_fmt(format_args!("                {}\n", action_code))?;
            wtr.write_all(b"            }\n")?;
        }
    }
    wtr.write_all(b"            _ => aa_inject(String::new(), String::new()),\n")?;
    wtr.write_all(b"        };\n")?;
    wtr.write_all(b"        aa_lhs\n")?;
    wtr.write_all(b"    }\n\n")?;
    wtr.write_all(b"}\n\n")?;

    wtr.write_all(b"fn aa_terminal_index(tag: AATerminal) -> usize {\n")?;
    wtr.write_all(b"    match tag {\n")?;
    wtr.write_all(b"        AATerminal::AAEnd => 0,\n")?;
    for token in &generated.symbols.tokens {
        wtr.write_fmt(format_args!(
            "        AATerminal::{} => {},\n",
            terminal_ident(token),
            token.index()
        ))?;
    }
    wtr.write_all(b"    }\n")?;
    wtr.write_all(b"}\n\n")?;

    wtr.write_all(b"fn aa_decode_action(code: i32) -> lalr1_plus::Action<AATerminal> {\n")?;
    wtr.write_all(b"    if code == AAACCEPT {\n")?;
    wtr.write_all(b"        lalr1_plus::Action::Accept\n")?;
    wtr.write_all(b"    } else if code < 0 {\n")?;
    wtr.write_all(b"        lalr1_plus::Action::Reduce((-code - 1) as u32)\n")?;
    wtr.write_all(b"    } else {\n")?;
    wtr.write_all(b"        lalr1_plus::Action::Shift(code as u32)\n")?;
    wtr.write_all(b"    }\n")?;
    wtr.write_all(b"}\n")?;
    Ok(())
}

/// `-d`: a standalone header declaring the token enum and its external
/// (`%token NAME number`, or dense-index-derived) values, for a hand written
/// lexer built separately from the generated parser to depend on.
pub fn write_header<W: Write>(generated: &GeneratedParser, wtr: &mut W) -> io::Result<()> {
    wtr.write_all(b"// token values, for an externally maintained lexer.\n\n")?;
    wtr.write_fmt(format_args!("pub const AAEND: u32 = {};\n", 0))?;
    for token in &generated.symbols.tokens {
        wtr.write_fmt(format_args!(
            "pub const {}: u32 = {};\n",
            terminal_ident(token).to_uppercase(),
            token.value()
        ))?;
    }
    Ok(())
}

/// `-i`: `extern "C"` declarations for the same token values, for callers
/// outside the Rust build graph (e.g. a lexer generated by another tool).
pub fn write_externs<W: Write>(generated: &GeneratedParser, wtr: &mut W) -> io::Result<()> {
    wtr.write_all(b"// extern declarations for the token values below.\n\n")?;
    wtr.write_all(b"extern \"C\" {\n")?;
    for token in &generated.symbols.tokens {
        wtr.write_fmt(format_args!("    static {}: u32;\n", terminal_ident(token).to_uppercase()))?;
    }
    wtr.write_all(b"}\n")?;
    Ok(())
}

/// `-v`: a human readable description of every state (kernel items, shifts,
/// gotos, the resolved reduction/default and any conflicts the resolver had
/// to break) for grammar debugging, modelled on the verbose `.output` report
/// classic yacc implementations produce.
pub fn write_description<W: Write>(generated: &GeneratedParser, wtr: &mut W) -> io::Result<()> {
    wtr.write_fmt(format_args!(
        "{} terminals, {} nonterminals, {} productions, {} states\n",
        generated.symbols.tokens.len() + 1,
        generated.symbols.non_terminals.len() + 2,
        generated.productions.len(),
        generated.automaton.states.len(),
    ))?;
    wtr.write_fmt(format_args!(
        "{} shift/reduce conflicts, {} reduce/reduce conflicts\n\n",
        generated.action_table.shift_reduce_conflicts, generated.action_table.reduce_reduce_conflicts
    ))?;

    wtr.write_all(b"Productions:\n")?;
    for production in &generated.productions {
        wtr.write_fmt(format_args!("  {}: {}\n", production.ident(), production))?;
    }
    wtr.write_all(b"\n")?;

    for (automaton_state, action_state) in generated.automaton.states.iter().zip(generated.action_table.states.iter()) {
        wtr.write_fmt(format_args!("state {}\n", automaton_state.ident))?;
        for item in automaton_state.kernel.iter() {
            wtr.write_fmt(format_args!("    {}\n", item))?;
        }
        for (token, target) in automaton_state.shifts.iter() {
            wtr.write_fmt(format_args!("    shift {} -> {}\n", token.name(), target))?;
        }
        for (non_terminal, target) in automaton_state.gotos.iter() {
            wtr.write_fmt(format_args!("    goto {} -> {}\n", non_terminal.name(), target))?;
        }
        if let Some(default) = &action_state.default_reduction {
            wtr.write_fmt(format_args!("    default reduce by rule {}\n", default.ident()))?;
        }
        for conflict in action_state.conflicts.iter() {
            wtr.write_fmt(format_args!(
                "    conflict on {}: {}\n",
                conflict.token.name(),
                conflict.resolution
            ))?;
        }
        wtr.write_all(b"\n")?;
    }
    Ok(())
}

/// `-g`: a Graphviz description of the LR(0) automaton (states as nodes,
/// shifts/gotos as labelled edges) for visual inspection of large grammars.
pub fn write_graph<W: Write>(generated: &GeneratedParser, wtr: &mut W) -> io::Result<()> {
    wtr.write_all(b"digraph lalrgen {\n")?;
    wtr.write_all(b"    rankdir=LR;\n")?;
    for state in &generated.automaton.states {
        wtr.write_fmt(format_args!("    s{} [shape=box, label=\"{}\"];\n", state.ident, state.ident))?;
    }
    for state in &generated.automaton.states {
        for (token, target) in state.shifts.iter() {
            wtr.write_fmt(format_args!(
                "    s{} -> s{} [label=\"{}\"];\n",
                state.ident,
                target,
                token.name().replace('"', "\\\"")
            ))?;
        }
        for (non_terminal, target) in state.gotos.iter() {
            wtr.write_fmt(format_args!(
                "    s{} -> s{} [label=\"{}\", style=dashed];\n",
                state.ident,
                target,
                non_terminal.name()
            ))?;
        }
    }
    wtr.write_all(b"}\n")?;
    Ok(())
}
