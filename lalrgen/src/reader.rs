// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! §4.B: the grammar-file reader. Arbitrary Rust code (actions, the `%{ … %}`
//! prologue, `%union`/`%code` bodies) cannot be tokenized by a fixed regex
//! table, so a first pass lifts every brace-delimited block out of the source
//! and replaces it with a placeholder the main lexer can match as an ordinary
//! token; the reader looks the original text back up by placeholder index.

use lazy_static::lazy_static;

use crate::error::Error;
use crate::production::{Production, ProductionTail};
use crate::symbol::non_terminal::NonTerminal;
use crate::symbol::tag::{Tag, TagOrToken};
use crate::symbol::terminal::Token;
use crate::symbol::{Associativity, Symbol, SymbolTable};

const BLOCK_MARK: char = '\u{1}';
const PROLOGUE_MARK: char = '\u{2}';

/// Lifts `%{ … %}` and brace-delimited `{ … }` spans out of `source`,
/// replacing each with a one-token placeholder (`\u{2}<n>\u{2}` and
/// `\u{1}<n>\u{1}` respectively) so the rest of the grammar can be tokenized
/// by ordinary fixed patterns. Brace counting tracks (and skips over) Rust
/// string, character and line-comment syntax so braces inside action code
/// don't desynchronize the count.
fn extract_blocks(source: &str) -> (String, Vec<String>, Vec<String>) {
    let mut rewritten = String::with_capacity(source.len());
    let mut blocks = Vec::new();
    let mut prologues = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '%' && chars.get(i + 1) == Some(&'{') {
            let start = i + 2;
            let mut j = start;
            while j < chars.len() && !(chars[j] == '%' && chars.get(j + 1) == Some(&'}')) {
                j += 1;
            }
            let text: String = chars[start..j.min(chars.len())].iter().collect();
            let index = prologues.len();
            prologues.push(text);
            rewritten.push(PROLOGUE_MARK);
            rewritten.push_str(&index.to_string());
            rewritten.push(PROLOGUE_MARK);
            i = j + 2;
        } else if chars[i] == '{' {
            let (text, next) = scan_balanced_braces(&chars, i);
            let index = blocks.len();
            blocks.push(text);
            rewritten.push(BLOCK_MARK);
            rewritten.push_str(&index.to_string());
            rewritten.push(BLOCK_MARK);
            i = next;
        } else {
            rewritten.push(chars[i]);
            i += 1;
        }
    }
    (rewritten, blocks, prologues)
}

/// Scans a `{ … }` span starting at `chars[start] == '{'`, tracking nesting
/// depth and skipping over string/char literals and `//` comments so their
/// braces are not counted. Returns the inner text (braces excluded) and the
/// index just past the closing brace.
fn scan_balanced_braces(chars: &[char], start: usize) -> (String, usize) {
    let mut depth = 0i32;
    let mut i = start;
    let mut inner_start = start + 1;
    let mut inner_end = start + 1;
    while i < chars.len() {
        match chars[i] {
            '{' => {
                depth += 1;
                i += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    inner_end = i;
                    i += 1;
                    break;
                }
                i += 1;
            }
            '"' => {
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            '\'' => {
                // Distinguish a char literal from a lifetime by requiring the
                // closing quote within the next couple of characters.
                if chars.get(i + 1) == Some(&'\\') {
                    i += 4;
                } else if chars.get(i + 2) == Some(&'\'') {
                    i += 3;
                } else {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    if inner_start > inner_end {
        inner_start = inner_end;
    }
    (chars[inner_start..inner_end].iter().collect(), i)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GTok {
    Ident,
    CharLit,
    StrLit,
    Number,
    Block,
    Prologue,
    AngleTag,
    PercentToken,
    PercentType,
    PercentLeft,
    PercentRight,
    PercentNonAssoc,
    PercentStart,
    PercentUnion,
    PercentExpectRr,
    PercentExpect,
    PercentDestructor,
    PercentParseParam,
    PercentLexParam,
    PercentPureParser,
    PercentLocations,
    PercentCode,
    PercentPercent,
    PercentPrec,
    Colon,
    Semicolon,
    Pipe,
    Comma,
    End,
}

impl std::fmt::Display for GTok {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

lazy_static! {
    static ref LEXER: lexan::LexicalAnalyzer<GTok> = lexan::LexicalAnalyzer::new(
        &[
            (GTok::PercentExpectRr, "%expect-rr"),
            (GTok::PercentExpect, "%expect"),
            (GTok::PercentToken, "%token"),
            (GTok::PercentType, "%type"),
            (GTok::PercentLeft, "%left"),
            (GTok::PercentRight, "%right"),
            (GTok::PercentNonAssoc, "%nonassoc"),
            (GTok::PercentStart, "%start"),
            (GTok::PercentUnion, "%union"),
            (GTok::PercentDestructor, "%destructor"),
            (GTok::PercentParseParam, "%parse-param"),
            (GTok::PercentLexParam, "%lex-param"),
            (GTok::PercentPureParser, "%pure-parser"),
            (GTok::PercentLocations, "%locations"),
            (GTok::PercentCode, "%code"),
            (GTok::PercentPercent, "%%"),
            (GTok::PercentPrec, "%prec"),
            (GTok::Colon, ":"),
            (GTok::Semicolon, ";"),
            (GTok::Pipe, "|"),
            (GTok::Comma, ","),
        ],
        &[
            (GTok::Block, r"\x01\d+\x01"),
            (GTok::Prologue, r"\x02\d+\x02"),
            (GTok::AngleTag, r"<[A-Za-z_][A-Za-z0-9_]*>"),
            (GTok::CharLit, r"'(\\.|[^'\\])'"),
            (GTok::StrLit, r#""(\\.|[^"\\])*""#),
            (GTok::Number, r"\d+"),
            (GTok::Ident, r"[A-Za-z_$][A-Za-z0-9_]*"),
        ],
        &[r"\s+", r"//[^\n]*", r"/\*(?:[^*]|\*[^/])*\*/"],
        GTok::End,
    );
}

pub struct ReaderOutput {
    pub symbols: SymbolTable,
    pub productions: Vec<Production>,
    pub prologue: Option<String>,
    pub epilogue: Option<String>,
    pub union_block: Option<String>,
    pub code_blocks: Vec<String>,
    pub expect: Option<usize>,
    pub expect_rr: Option<usize>,
    pub pure_parser: bool,
    pub locations: bool,
    pub parse_param: Option<String>,
    pub lex_param: Option<String>,
    pub destructors: Vec<(Option<Tag>, String)>,
}

struct Reader<'a> {
    tokens: lexan::TokenStream<'a, GTok>,
    blocks: Vec<String>,
    prologues: Vec<String>,
    symbols: SymbolTable,
    productions: Vec<Production>,
    next_production_id: u32,
    mid_rule_counter: u32,
}

/// Parses the grammar text starting from the declarations section through
/// the trailing epilogue, per the token contract in §6. `label` is used only
/// for location tagging in diagnostics.
pub fn read(source: &str, label: &str) -> Result<ReaderOutput, Error> {
    let (rewritten, blocks, prologues) = extract_blocks(source);
    let tokens = LEXER.token_stream(rewritten, label.to_string());
    let mut reader = Reader {
        tokens,
        blocks,
        prologues,
        symbols: SymbolTable::default(),
        productions: Vec::new(),
        // Rule 0 is reserved for the synthetic `$accept : start $end` rule the
        // pipeline prepends once the user's start symbol is known.
        next_production_id: 1,
        mid_rule_counter: 0,
    };
    reader.run()
}

impl<'a> Reader<'a> {
    fn block_text(&self, lexeme: &str) -> String {
        let digits: String = lexeme.chars().filter(|c| c.is_ascii_digit()).collect();
        let index: usize = digits.parse().unwrap_or(0);
        self.blocks.get(index).cloned().unwrap_or_default()
    }

    fn prologue_text(&self, lexeme: &str) -> String {
        let digits: String = lexeme.chars().filter(|c| c.is_ascii_digit()).collect();
        let index: usize = digits.parse().unwrap_or(0);
        self.prologues.get(index).cloned().unwrap_or_default()
    }

    fn peek(&self) -> Result<lexan::Token<GTok>, Error> {
        self.tokens
            .front()
            .map_err(|e| Error::GrammarSyntaxError(e.to_string(), lexan::Location::default()))
    }

    fn advance(&mut self) -> Result<lexan::Token<GTok>, Error> {
        self.tokens
            .advance_front()
            .map_err(|e| Error::GrammarSyntaxError(e.to_string(), lexan::Location::default()))
    }

    fn expect(&mut self, tag: GTok) -> Result<lexan::Token<GTok>, Error> {
        let token = self.advance()?;
        if *token.tag() == tag {
            Ok(token)
        } else {
            Err(Error::GrammarSyntaxError(
                format!("expected {} but found \"{}\"", tag, token.lexeme()),
                token.location().clone(),
            ))
        }
    }

    fn run(&mut self) -> Result<ReaderOutput, Error> {
        let mut output = ReaderOutput {
            symbols: SymbolTable::default(),
            productions: Vec::new(),
            prologue: None,
            epilogue: None,
            union_block: None,
            code_blocks: Vec::new(),
            expect: None,
            expect_rr: None,
            pure_parser: false,
            locations: false,
            parse_param: None,
            lex_param: None,
            destructors: Vec::new(),
        };

        self.read_declarations(&mut output)?;
        self.expect(GTok::PercentPercent)?;
        self.read_rules()?;

        if let Ok(token) = self.peek() {
            if *token.tag() == GTok::PercentPercent {
                self.advance()?;
                output.epilogue = Some(self.remaining_raw_text());
            }
        }

        output.symbols = std::mem::take(&mut self.symbols);
        output.productions = std::mem::take(&mut self.productions);
        Ok(output)
    }

    /// Everything left in the stream after the second `%%`, concatenated
    /// verbatim; the epilogue is opaque user code, not grammar syntax.
    fn remaining_raw_text(&mut self) -> String {
        let mut text = String::new();
        while let Ok(token) = self.advance() {
            if *token.tag() == GTok::End {
                break;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(token.lexeme());
        }
        text
    }

    fn read_declarations(&mut self, output: &mut ReaderOutput) -> Result<(), Error> {
        loop {
            let token = self.peek()?;
            match token.tag() {
                GTok::Prologue => {
                    self.advance()?;
                    let text = self.prologue_text(token.lexeme());
                    output.prologue = Some(match output.prologue.take() {
                        Some(existing) => format!("{}\n{}", existing, text),
                        None => text,
                    });
                }
                GTok::PercentToken => {
                    self.advance()?;
                    self.read_token_declarations()?;
                }
                GTok::PercentType => {
                    self.advance()?;
                    self.read_type_declarations()?;
                }
                GTok::PercentLeft => {
                    self.advance()?;
                    self.read_precedence_declarations(Associativity::Left)?;
                }
                GTok::PercentRight => {
                    self.advance()?;
                    self.read_precedence_declarations(Associativity::Right)?;
                }
                GTok::PercentNonAssoc => {
                    self.advance()?;
                    self.read_precedence_declarations(Associativity::NonAssoc)?;
                }
                GTok::PercentStart => {
                    self.advance()?;
                    let name_token = self.expect(GTok::Ident)?;
                    self.symbols.start_non_terminal_used_at(name_token.location());
                    let target = self
                        .symbols
                        .non_terminal_defined_at(name_token.lexeme(), name_token.location())?;
                    self.symbols.set_user_start(target);
                }
                GTok::PercentUnion => {
                    self.advance()?;
                    let block_token = self.expect(GTok::Block)?;
                    output.union_block = Some(self.block_text(block_token.lexeme()));
                }
                GTok::PercentCode => {
                    self.advance()?;
                    let block_token = self.expect(GTok::Block)?;
                    output.code_blocks.push(self.block_text(block_token.lexeme()));
                }
                GTok::PercentDestructor => {
                    self.advance()?;
                    let block_token = self.expect(GTok::Block)?;
                    let action = self.block_text(block_token.lexeme());
                    let tag = if let Ok(next) = self.peek() {
                        if *next.tag() == GTok::AngleTag {
                            self.advance()?;
                            let name = next.lexeme().trim_matches(|c| c == '<' || c == '>');
                            Some(self.symbols.new_tag(name, next.location())?)
                        } else {
                            None
                        }
                    } else {
                        None
                    };
                    output.destructors.push((tag, action));
                }
                GTok::PercentParseParam => {
                    self.advance()?;
                    let block_token = self.expect(GTok::Block)?;
                    output.parse_param = Some(self.block_text(block_token.lexeme()));
                }
                GTok::PercentLexParam => {
                    self.advance()?;
                    let block_token = self.expect(GTok::Block)?;
                    output.lex_param = Some(self.block_text(block_token.lexeme()));
                }
                GTok::PercentPureParser => {
                    self.advance()?;
                    output.pure_parser = true;
                }
                GTok::PercentLocations => {
                    self.advance()?;
                    output.locations = true;
                }
                GTok::PercentExpect => {
                    self.advance()?;
                    let number_token = self.expect(GTok::Number)?;
                    output.expect = number_token.lexeme().parse().ok();
                }
                GTok::PercentExpectRr => {
                    self.advance()?;
                    let number_token = self.expect(GTok::Number)?;
                    output.expect_rr = number_token.lexeme().parse().ok();
                }
                GTok::PercentPercent | GTok::End => return Ok(()),
                _ => {
                    return Err(Error::GrammarSyntaxError(
                        format!("unexpected \"{}\" in declarations section", token.lexeme()),
                        token.location().clone(),
                    ))
                }
            }
        }
    }

    fn read_optional_tag(&mut self) -> Result<Option<Tag>, Error> {
        if let Ok(token) = self.peek() {
            if *token.tag() == GTok::AngleTag {
                self.advance()?;
                let name = token.lexeme().trim_matches(|c| c == '<' || c == '>');
                return Ok(Some(self.symbols.new_tag_or_get(name, token.location())?));
            }
        }
        Ok(None)
    }

    fn read_token_declarations(&mut self) -> Result<(), Error> {
        let tag = self.read_optional_tag()?;
        loop {
            let token = self.peek()?;
            match token.tag() {
                GTok::Ident => {
                    self.advance()?;
                    let text = match self.peek() {
                        Ok(lit) if *lit.tag() == GTok::StrLit => {
                            self.advance()?;
                            unquote(lit.lexeme())
                        }
                        _ => token.lexeme().to_string(),
                    };
                    let declared = self
                        .symbols
                        .new_literal_token(token.lexeme(), &text, token.location())
                        .or_else(|_| -> Result<Token, crate::symbol::Error> {
                            Ok(self.symbols.get_token(token.lexeme()).cloned().unwrap())
                        })?;
                    if let Ok(number_token) = self.peek() {
                        if *number_token.tag() == GTok::Number {
                            self.advance()?;
                            if let Ok(number) = number_token.lexeme().parse() {
                                self.symbols
                                    .set_explicit_token_number(token.lexeme(), number)?;
                            }
                        }
                    }
                    if let Some(tag) = &tag {
                        declared.set_type_tag(tag);
                    }
                }
                GTok::Comma => {
                    self.advance()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_type_declarations(&mut self) -> Result<(), Error> {
        let tag = self.read_optional_tag()?;
        loop {
            let token = self.peek()?;
            match token.tag() {
                GTok::Ident => {
                    self.advance()?;
                    let non_terminal = self
                        .symbols
                        .non_terminal_defined_at(token.lexeme(), token.location())?;
                    if let Some(tag) = &tag {
                        non_terminal.set_type_tag(tag);
                    }
                }
                GTok::Comma => {
                    self.advance()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_precedence_declarations(&mut self, associativity: Associativity) -> Result<(), Error> {
        let mut members = Vec::new();
        loop {
            let token = self.peek()?;
            match token.tag() {
                GTok::AngleTag => {
                    self.advance()?;
                    let name = token.lexeme().trim_matches(|c| c == '<' || c == '>');
                    let tag = self.symbols.new_tag_or_get(name, token.location())?;
                    members.push(TagOrToken::from(&tag));
                }
                GTok::Ident => {
                    self.advance()?;
                    let found = self.symbols.get_token(token.lexeme()).cloned();
                    let resolved = match found {
                        Some(existing) => existing,
                        None => self.symbols.new_literal_token(
                            token.lexeme(),
                            token.lexeme(),
                            token.location(),
                        )?,
                    };
                    members.push(TagOrToken::from(&resolved));
                }
                GTok::CharLit | GTok::StrLit => {
                    self.advance()?;
                    let text = unquote(token.lexeme());
                    let resolved = match self.symbols.get_literal_token(&text).cloned() {
                        Some(existing) => existing,
                        None => self
                            .symbols
                            .new_literal_token(&text, &text, token.location())?,
                    };
                    members.push(TagOrToken::from(&resolved));
                }
                GTok::Comma => {
                    self.advance()?;
                }
                _ => break,
            }
        }
        self.symbols.set_precedences(associativity, &members);
        Ok(())
    }

    fn read_rules(&mut self) -> Result<(), Error> {
        loop {
            let token = self.peek()?;
            if *token.tag() == GTok::PercentPercent || *token.tag() == GTok::End {
                return Ok(());
            }
            self.read_rule()?;
        }
    }

    fn read_rule(&mut self) -> Result<(), Error> {
        let name_token = self.expect(GTok::Ident)?;
        let lhs = self
            .symbols
            .non_terminal_defined_at(name_token.lexeme(), name_token.location())?;
        self.expect(GTok::Colon)?;
        loop {
            self.read_alternative(&lhs)?;
            let token = self.peek()?;
            if *token.tag() == GTok::Pipe {
                self.advance()?;
                continue;
            }
            self.expect(GTok::Semicolon)?;
            return Ok(());
        }
    }

    fn read_alternative(&mut self, lhs: &NonTerminal) -> Result<(), Error> {
        let mut rhs: Vec<Symbol> = Vec::new();
        let mut prec_override: Option<(Associativity, u16)> = None;
        let mut trailing_action: Option<String> = None;

        loop {
            let token = self.peek()?;
            match token.tag() {
                GTok::Ident => {
                    self.advance()?;
                    let symbol = if token.lexeme() == "error" {
                        self.symbols.error_symbol_used_at(token.location())
                    } else {
                        self.symbols.symbol_used_at(token.lexeme(), token.location())
                    };
                    rhs.push(symbol);
                }
                GTok::CharLit | GTok::StrLit => {
                    self.advance()?;
                    let text = unquote(token.lexeme());
                    let resolved = match self.symbols.get_literal_token(&text).cloned() {
                        Some(existing) => existing,
                        None => self
                            .symbols
                            .new_literal_token(&text, &text, token.location())?,
                    };
                    resolved.add_used_at(token.location());
                    rhs.push(Symbol::Terminal(resolved));
                }
                GTok::PercentPrec => {
                    self.advance()?;
                    let prec_token = self.peek()?;
                    let resolved = match prec_token.tag() {
                        GTok::Ident => {
                            self.advance()?;
                            self.symbols.get_token(prec_token.lexeme()).cloned()
                        }
                        GTok::CharLit | GTok::StrLit => {
                            self.advance()?;
                            let text = unquote(prec_token.lexeme());
                            self.symbols.get_literal_token(&text).cloned()
                        }
                        _ => {
                            return Err(Error::GrammarSyntaxError(
                                "expected a token after %prec".to_string(),
                                prec_token.location().clone(),
                            ))
                        }
                    };
                    if let Some(token) = resolved {
                        prec_override = Some(token.associativity_and_precedence());
                    }
                }
                GTok::Block => {
                    self.advance()?;
                    let action_text = self.block_text(token.lexeme());
                    let next_is_terminal = {
                        let next = self.peek()?;
                        matches!(
                            next.tag(),
                            GTok::Pipe | GTok::Semicolon | GTok::PercentPrec
                        )
                    };
                    if next_is_terminal {
                        trailing_action = Some(action_text);
                    } else {
                        // A mid-rule action: desugar into a synthetic, empty
                        // producing nonterminal whose own reduction runs this
                        // action, per §4.B.
                        self.mid_rule_counter += 1;
                        let synthetic_name = format!("$mid{}", self.mid_rule_counter);
                        let synthetic = self
                            .symbols
                            .non_terminal_defined_at(&synthetic_name, token.location())?;
                        let tail = ProductionTail::new(&[], None, None, Some(&action_text));
                        self.push_production(synthetic.clone(), tail);
                        rhs.push(Symbol::NonTerminal(synthetic));
                    }
                }
                _ => break,
            }
        }

        let tail = ProductionTail::new(&rhs, None, prec_override, trailing_action.as_deref());
        self.push_production(lhs.clone(), tail);
        Ok(())
    }

    fn push_production(&mut self, lhs: NonTerminal, tail: ProductionTail) {
        let production = Production::new(self.next_production_id, lhs, tail);
        self.next_production_id += 1;
        self.productions.push(production);
    }
}

fn unquote(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len() - 1];
    inner.replace("\\'", "'").replace("\\\"", "\"").replace("\\\\", "\\")
}
