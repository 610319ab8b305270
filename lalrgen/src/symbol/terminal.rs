// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{btree_set, BTreeSet};
use std::fmt;
use std::iter::FromIterator;
use std::ops::{BitOr, BitOrAssign};

use crate::symbol::tag::Tag;
use crate::symbol::Associativity;
use std::rc::Rc;

/// Reserved dense index of the end-of-input terminal; always symbol 0.
pub const END_INDEX: usize = 0;
/// Reserved dense index of the built-in `error` terminal; always symbol 1.
pub const ERROR_INDEX: usize = 1;

#[derive(Debug, Default)]
pub struct TokenData {
    name: String,
    text: String,
    defined_at: lexan::Location,
    used_at: RefCell<Vec<lexan::Location>>,
    associativity: Cell<Associativity>,
    precedence: Cell<u16>,
    /// Dense index assigned at symbol-table finalization (§4.A); 0 until then.
    index: Cell<usize>,
    /// External token number, either user supplied via `%token NAME number` or
    /// auto assigned to equal `index` if never set explicitly.
    value: Cell<Option<u32>>,
    type_tag: RefCell<Option<Tag>>,
}

impl TokenData {
    pub fn new(name: &str, text: &str, defined_at: &lexan::Location) -> Self {
        let mut token_data = TokenData::default();
        token_data.name = name.to_string();
        token_data.text = text.to_string();
        token_data.defined_at = defined_at.clone();
        token_data
    }
}

#[derive(Debug, Clone)]
pub enum Token {
    Literal(Rc<TokenData>),
    Regex(Rc<TokenData>),
    /// The synthetic end-of-input terminal. Never produced by a lexer; the
    /// driver appends it once the token stream is exhausted. Always symbol 0.
    End(Rc<TokenData>),
}

impl Token {
    pub fn new_literal_token(name: &str, text: &str, defined_at: &lexan::Location) -> Self {
        Token::Literal(Rc::new(TokenData::new(name, text, defined_at)))
    }

    pub fn new_regex_token(name: &str, text: &str, defined_at: &lexan::Location) -> Self {
        Token::Regex(Rc::new(TokenData::new(name, text, defined_at)))
    }

    pub fn new_end() -> Self {
        let data = TokenData::new("$end", "", &lexan::Location::default());
        data.index.set(END_INDEX);
        Token::End(Rc::new(data))
    }

    fn data(&self) -> &Rc<TokenData> {
        match self {
            Token::Literal(token_data) | Token::Regex(token_data) | Token::End(token_data) => token_data,
        }
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn text(&self) -> &str {
        &self.data().text
    }

    pub fn defined_at(&self) -> &lexan::Location {
        &self.data().defined_at
    }

    pub fn used_at(&self) -> Vec<lexan::Location> {
        self.data().used_at.borrow().iter().cloned().collect()
    }

    pub fn is_unused(&self) -> bool {
        self.data().used_at.borrow().is_empty()
    }

    pub fn add_used_at(&self, used_at: &lexan::Location) {
        self.data().used_at.borrow_mut().push(used_at.clone())
    }

    pub fn associativity(&self) -> Associativity {
        self.data().associativity.get()
    }

    pub fn set_associativity(&self, associativity: Associativity) {
        self.data().associativity.set(associativity)
    }

    pub fn precedence(&self) -> u16 {
        self.data().precedence.get()
    }

    pub fn set_precedence(&self, precedence: u16) {
        debug_assert!(precedence > 0);
        self.data().precedence.set(precedence)
    }

    pub fn precedence_has_been_set(&self) -> bool {
        self.data().precedence.get() > 0
    }

    pub fn associativity_and_precedence(&self) -> (Associativity, u16) {
        (self.associativity(), self.precedence())
    }

    pub fn index(&self) -> usize {
        self.data().index.get()
    }

    pub fn set_index(&self, index: usize) {
        self.data().index.set(index)
    }

    pub fn explicit_value(&self) -> Option<u32> {
        self.data().value.get()
    }

    pub fn set_explicit_value(&self, value: u32) {
        self.data().value.set(Some(value))
    }

    pub fn value(&self) -> u32 {
        self.data().value.get().unwrap_or(self.index() as u32)
    }

    pub fn set_type_tag(&self, tag: &Tag) {
        *self.data().type_tag.borrow_mut() = Some(tag.clone())
    }

    pub fn type_tag(&self) -> Option<Tag> {
        self.data().type_tag.borrow().clone()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Token {}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.name().partial_cmp(other.name())
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenSet(BTreeSet<Token>);

impl TokenSet {
    pub fn new() -> Self {
        TokenSet::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.0.contains(token)
    }

    pub fn insert(&mut self, token: &Token) -> bool {
        self.0.insert(token.clone())
    }

    pub fn remove(&mut self, token: &Token) -> bool {
        self.0.remove(token)
    }

    pub fn difference<'a>(&'a self, other: &'a Self) -> btree_set::Difference<'a, Token> {
        self.0.difference(&other.0)
    }

    pub fn intersection<'a>(&'a self, other: &'a Self) -> btree_set::Intersection<'a, Token> {
        self.0.intersection(&other.0)
    }

    pub fn union<'a>(&'a self, other: &'a Self) -> btree_set::Union<'a, Token> {
        self.0.union(&other.0)
    }

    pub fn iter(&self) -> btree_set::Iter<Token> {
        self.0.iter()
    }
}

impl BitOrAssign<&Self> for TokenSet {
    fn bitor_assign(&mut self, rhs: &Self) {
        self.0 = self.0.bitor(&rhs.0)
    }
}

impl FromIterator<Token> for TokenSet {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Token>,
    {
        Self(BTreeSet::<Token>::from_iter(iter))
    }
}

impl fmt::Display for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut set_string = "TokenSet{".to_string();
        for (index, item) in self.iter().enumerate() {
            if index == 0 {
                set_string += &item.name().to_string();
            } else {
                set_string += &format!(", {}", item.name());
            }
        }
        set_string += "}";
        write!(f, "{}", set_string)
    }
}
