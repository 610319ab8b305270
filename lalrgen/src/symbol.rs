// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>
use std::{collections::BTreeMap, fmt};

use crate::symbol::non_terminal::NonTerminal;
use crate::symbol::tag::{Tag, TagOrToken};
use crate::symbol::terminal::{Token, ERROR_INDEX};

pub mod non_terminal;
pub mod tag;
pub mod terminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    NonAssoc,
    Left,
    Right,
}

impl Default for Associativity {
    fn default() -> Self {
        Associativity::NonAssoc
    }
}

impl fmt::Display for Associativity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Associativity::*;
        match self {
            NonAssoc => write!(f, "NonAssoc"),
            Left => write!(f, "Left"),
            Right => write!(f, "Right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(Token),
    NonTerminal(NonTerminal),
}

impl Symbol {
    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(token) => token.name(),
            Symbol::NonTerminal(non_terminal) => non_terminal.name(),
        }
    }

    /// Dense index, valid only after [`SymbolTable::finalize`] has run.
    pub fn index(&self) -> usize {
        match self {
            Symbol::Terminal(token) => token.index(),
            Symbol::NonTerminal(non_terminal) => non_terminal.index(),
        }
    }
}

impl From<&Token> for Symbol {
    fn from(token: &Token) -> Self {
        Symbol::Terminal(token.clone())
    }
}

impl From<&NonTerminal> for Symbol {
    fn from(non_terminal: &NonTerminal) -> Self {
        Symbol::NonTerminal(non_terminal.clone())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug)]
pub enum Error {
    DuplicateTag(Tag),
    DuplicateToken(Token),
    DuplicateTokenDefinition(Token),
    ConflictsWithToken(Token),
    DuplicateSkipRule(String),
    DuplicateTokenNumber(Token, u32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DuplicateTag(tag) => {
                write!(f, "Tag \"{}\" already defined at {}", tag.name(), tag.defined_at())
            }
            Error::DuplicateToken(token) => {
                write!(f, "Token \"{}\" already defined at {}", token.name(), token.defined_at())
            }
            Error::DuplicateTokenDefinition(token) => write!(
                f,
                "Token \"{}\" defined at {} has same definition",
                token.name(),
                token.defined_at(),
            ),
            Error::ConflictsWithToken(token) => write!(
                f,
                "NonTerminal \"{}\" conflicts with token defined at {}.",
                token.name(),
                token.defined_at(),
            ),
            Error::DuplicateSkipRule(string) => write!(f, "Skip rule \"{}\" already defined.", string),
            Error::DuplicateTokenNumber(token, number) => write!(
                f,
                "Token number {} (wanted for \"{}\") is already in use.",
                number,
                token.name(),
            ),
        }
    }
}

/// Interns names, assigns dense indices and holds per-symbol attributes
/// (class, precedence, associativity, type tag) per §4.A. Terminals and
/// nonterminals are kept in separate, declaration-ordered maps so numbering at
/// [`Self::finalize`] is stable and reproducible.
#[derive(Debug)]
pub struct SymbolTable {
    tags: BTreeMap<String, Tag>,
    tokens: BTreeMap<String, Token>,
    literal_tokens: BTreeMap<String, Token>,
    regex_tokens: BTreeMap<String, Token>,
    non_terminals: BTreeMap<String, NonTerminal>,
    declaration_order: Vec<String>,
    skip_rules: Vec<String>,
    next_precedence: u16,
    start_non_terminal: NonTerminal,
    error_non_terminal: NonTerminal,
    end_token: Token,
    user_start: Option<NonTerminal>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self {
            tags: BTreeMap::new(),
            tokens: BTreeMap::new(),
            literal_tokens: BTreeMap::new(),
            regex_tokens: BTreeMap::new(),
            non_terminals: BTreeMap::new(),
            declaration_order: Vec::new(),
            skip_rules: Vec::new(),
            next_precedence: u16::MAX,
            start_non_terminal: NonTerminal::new_start(),
            error_non_terminal: NonTerminal::new_error(),
            end_token: Token::new_end(),
            user_start: None,
        }
    }
}

impl SymbolTable {
    pub fn new_tag(&mut self, name: &str, defined_at: &lexan::Location) -> Result<Tag, Error> {
        let tag = Tag::new(name, defined_at);
        if let Some(other) = self.tags.insert(name.to_string(), tag.clone()) {
            Err(Error::DuplicateTag(other))
        } else {
            Ok(tag)
        }
    }

    pub fn get_tag(&self, name: &str) -> Option<&Tag> {
        self.tags.get(name)
    }

    /// Like [`Self::new_tag`] but returns the existing tag (recording a fresh
    /// use site) instead of erroring when `name` was already declared; `%type`
    /// and `%left`/`%right`/`%nonassoc` lines may both name the same tag.
    pub fn new_tag_or_get(&mut self, name: &str, defined_at: &lexan::Location) -> Result<Tag, Error> {
        if let Some(tag) = self.tags.get(name) {
            tag.add_used_at(defined_at);
            Ok(tag.clone())
        } else {
            self.new_tag(name, defined_at)
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn new_literal_token(
        &mut self,
        name: &str,
        text: &str,
        defined_at: &lexan::Location,
    ) -> Result<Token, Error> {
        let token = Token::new_literal_token(name, text, defined_at);
        if let Some(other) = self.tokens.insert(name.to_string(), token.clone()) {
            Err(Error::DuplicateToken(other))
        } else if let Some(other) = self.literal_tokens.insert(text.to_string(), token.clone()) {
            Err(Error::DuplicateTokenDefinition(other))
        } else {
            self.declaration_order.push(name.to_string());
            Ok(token)
        }
    }

    pub fn new_regex_token(
        &mut self,
        name: &str,
        text: &str,
        defined_at: &lexan::Location,
    ) -> Result<Token, Error> {
        let token = Token::new_regex_token(name, text, defined_at);
        if let Some(other) = self.tokens.insert(name.to_string(), token.clone()) {
            Err(Error::DuplicateToken(other))
        } else if let Some(other) = self.regex_tokens.insert(text.to_string(), token.clone()) {
            Err(Error::DuplicateTokenDefinition(other))
        } else {
            self.declaration_order.push(name.to_string());
            Ok(token)
        }
    }

    pub fn get_token(&self, name: &str) -> Option<&Token> {
        self.tokens.get(name)
    }

    pub fn get_literal_token(&self, lexeme: &str) -> Option<&Token> {
        self.literal_tokens.get(lexeme)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn set_explicit_token_number(&mut self, name: &str, number: u32) -> Result<(), Error> {
        if let Some(collision) = self
            .tokens
            .values()
            .find(|t| t.explicit_value() == Some(number))
        {
            return Err(Error::DuplicateTokenNumber(collision.clone(), number));
        }
        if let Some(token) = self.tokens.get(name) {
            token.set_explicit_value(number);
        }
        Ok(())
    }

    pub fn non_terminal_defined_at(
        &mut self,
        name: &str,
        defined_at: &lexan::Location,
    ) -> Result<NonTerminal, Error> {
        if let Some(non_terminal) = self.non_terminals.get(name) {
            non_terminal.add_defined_at(defined_at);
            Ok(non_terminal.clone())
        } else if let Some(token) = self.tokens.get(name) {
            Err(Error::ConflictsWithToken(token.clone()))
        } else {
            let non_terminal = NonTerminal::new_defined(name, defined_at);
            self.non_terminals
                .insert(name.to_string(), non_terminal.clone());
            self.declaration_order.push(name.to_string());
            if self.user_start.is_none() {
                self.user_start = Some(non_terminal.clone());
            }
            Ok(non_terminal)
        }
    }

    pub fn non_terminals(&self) -> impl Iterator<Item = &NonTerminal> {
        self.non_terminals.values()
    }

    pub fn symbol_used_at(&mut self, name: &str, used_at: &lexan::Location) -> Symbol {
        if let Some(token) = self.tokens.get(name) {
            token.add_used_at(used_at);
            Symbol::Terminal(token.clone())
        } else if let Some(non_terminal) = self.non_terminals.get(name) {
            non_terminal.add_used_at(used_at);
            Symbol::NonTerminal(non_terminal.clone())
        } else {
            let non_terminal = NonTerminal::new_used(name, used_at);
            self.non_terminals
                .insert(name.to_string(), non_terminal.clone());
            Symbol::NonTerminal(non_terminal)
        }
    }

    pub fn error_symbol_used_at(&self, used_at: &lexan::Location) -> Symbol {
        self.error_non_terminal.add_used_at(used_at);
        Symbol::from(&self.error_non_terminal)
    }

    pub fn start_non_terminal_used_at(&self, used_at: &lexan::Location) -> NonTerminal {
        self.start_non_terminal.add_used_at(used_at);
        self.start_non_terminal.clone()
    }

    pub fn end_token(&self) -> &Token {
        &self.end_token
    }

    pub fn set_user_start(&mut self, non_terminal: NonTerminal) {
        self.user_start = Some(non_terminal);
    }

    pub fn user_start(&self) -> Option<&NonTerminal> {
        self.user_start.as_ref()
    }

    pub fn add_skip_rule(&mut self, skip_rule: &str) -> Result<(), Error> {
        if self.skip_rules.contains(&skip_rule.to_string()) {
            Err(Error::DuplicateSkipRule(skip_rule.to_string()))
        } else {
            self.skip_rules.push(skip_rule.to_string());
            Ok(())
        }
    }

    pub fn skip_rules(&self) -> &[String] {
        &self.skip_rules
    }

    pub fn set_precedences(&mut self, associativity: Associativity, tag_or_token_list: &[TagOrToken]) {
        let precedence = self.next_precedence;
        self.next_precedence -= 1;
        for tag_or_token in tag_or_token_list.iter() {
            match tag_or_token {
                TagOrToken::Tag(tag) => {
                    tag.set_associativity(associativity);
                    tag.set_precedence(precedence);
                }
                TagOrToken::Token(token) => {
                    token.set_associativity(associativity);
                    token.set_precedence(precedence);
                }
                TagOrToken::Invalid => (),
            }
        }
    }

    /// Assigns the dense indices described in §3/§4.A: `$end` is 0, `error` is
    /// 1, then user terminals in declaration order (honoring any explicit
    /// `%token NAME number` value), then `$accept` followed by the remaining
    /// nonterminals in declaration order. Consumes the table since no further
    /// symbols may be interned afterwards.
    pub fn finalize(self) -> Result<FinalizedSymbols, Error> {
        let mut next_index = 2usize;
        let mut tokens: Vec<Token> = Vec::with_capacity(self.tokens.len());
        for name in self.declaration_order.iter() {
            if let Some(token) = self.tokens.get(name) {
                token.set_index(next_index);
                next_index += 1;
                tokens.push(token.clone());
            }
        }
        self.error_non_terminal.set_index(ERROR_INDEX);

        let ntokens = next_index;
        let mut next_nt_index = ntokens;
        self.start_non_terminal.set_index(next_nt_index);
        next_nt_index += 1;
        let mut non_terminals: Vec<NonTerminal> = Vec::with_capacity(self.non_terminals.len());
        for name in self.declaration_order.iter() {
            if let Some(non_terminal) = self.non_terminals.get(name) {
                non_terminal.set_index(next_nt_index);
                next_nt_index += 1;
                non_terminals.push(non_terminal.clone());
            }
        }

        let start = self
            .user_start
            .clone()
            .or_else(|| non_terminals.first().cloned());

        Ok(FinalizedSymbols {
            ntokens,
            nsyms: next_nt_index,
            tokens,
            non_terminals,
            start_symbol: self.start_non_terminal.clone(),
            error_symbol: self.error_non_terminal.clone(),
            end_token: self.end_token.clone(),
            user_start: start,
        })
    }
}

/// The output of [`SymbolTable::finalize`]: `tokens`/`non_terminals` are in
/// final dense-index order (the built-ins `$end`/`error`/`$accept` are not
/// repeated in these vectors; they are reachable via the dedicated fields).
#[derive(Debug)]
pub struct FinalizedSymbols {
    pub ntokens: usize,
    pub nsyms: usize,
    pub tokens: Vec<Token>,
    pub non_terminals: Vec<NonTerminal>,
    pub start_symbol: NonTerminal,
    pub error_symbol: NonTerminal,
    pub end_token: Token,
    pub user_start: Option<NonTerminal>,
}

impl FinalizedSymbols {
    /// Dense-index-to-token lookup spanning `0..ntokens`, for decoding a
    /// [`crate::bitset::TokenBitSet`] back into concrete tokens. Index 1
    /// (`error`) has no corresponding entry: it is numbered in the terminal
    /// range for table-packing purposes but modelled as a nonterminal.
    pub fn token_by_index(&self) -> Vec<Option<Token>> {
        let mut by_index = vec![None; self.ntokens];
        by_index[self.end_token.index()] = Some(self.end_token.clone());
        for token in &self.tokens {
            by_index[token.index()] = Some(token.clone());
        }
        by_index
    }
}
