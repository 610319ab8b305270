// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>
use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
    fmt,
    rc::Rc,
};

use crate::symbol::tag::Tag;
use crate::symbol::{terminal::TokenSet, Associativity};

/// The accessible first-set of a nonterminal, plus whether the nonterminal is
/// nullable (`transparent`, in the sense that it can vanish from a closure
/// walk and expose what follows it).
#[derive(Debug, Clone, Default)]
pub struct FirstsData {
    pub token_set: TokenSet,
    pub transparent: bool,
}

impl fmt::Display for FirstsData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:({})", self.token_set, self.transparent)
    }
}

#[derive(Debug, Default)]
pub struct NonTerminalData {
    name: String,
    defined_at: RefCell<Vec<lexan::Location>>,
    used_at: RefCell<Vec<lexan::Location>>,
    firsts_data: RefCell<Option<FirstsData>>,
    associativity: Cell<Associativity>,
    precedence: Cell<u16>,
    /// Dense index assigned at symbol-table finalization (§4.A); 0 until then.
    index: Cell<usize>,
    type_tag: RefCell<Option<Tag>>,
}

impl PartialEq for NonTerminalData {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NonTerminalData {}

impl PartialOrd for NonTerminalData {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.name.partial_cmp(&other.name)
    }
}

impl Ord for NonTerminalData {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NonTerminal {
    UserDefined(Rc<NonTerminalData>),
    Error(Rc<NonTerminalData>),
    Start(Rc<NonTerminalData>),
}

impl NonTerminal {
    pub fn new_defined(name: &str, defined_at: &lexan::Location) -> Self {
        let mut non_terminal_data = NonTerminalData::default();
        non_terminal_data.name = name.to_string();
        non_terminal_data
            .defined_at
            .borrow_mut()
            .push(defined_at.clone());
        NonTerminal::UserDefined(Rc::new(non_terminal_data))
    }

    pub fn new_used(name: &str, used_at: &lexan::Location) -> Self {
        let mut non_terminal_data = NonTerminalData::default();
        non_terminal_data.name = name.to_string();
        non_terminal_data.used_at.borrow_mut().push(used_at.clone());
        NonTerminal::UserDefined(Rc::new(non_terminal_data))
    }

    pub fn new_error() -> Self {
        let mut non_terminal_data = NonTerminalData::default();
        non_terminal_data.name = "error".to_string();
        NonTerminal::Error(Rc::new(non_terminal_data))
    }

    pub fn new_start() -> Self {
        let mut non_terminal_data = NonTerminalData::default();
        non_terminal_data.name = "$accept".to_string();
        NonTerminal::Start(Rc::new(non_terminal_data))
    }

    fn data(&self) -> &Rc<NonTerminalData> {
        match self {
            NonTerminal::UserDefined(data) | NonTerminal::Error(data) | NonTerminal::Start(data) => {
                data
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn is_error(&self) -> bool {
        matches!(self, NonTerminal::Error(_))
    }

    pub fn is_start(&self) -> bool {
        matches!(self, NonTerminal::Start(_))
    }

    pub fn is_unused(&self) -> bool {
        self.data().used_at.borrow().is_empty()
    }

    pub fn is_undefined(&self) -> bool {
        match self {
            NonTerminal::UserDefined(non_terminal) => non_terminal.defined_at.borrow().is_empty(),
            NonTerminal::Error(_) | NonTerminal::Start(_) => false,
        }
    }

    pub fn first_definition(&self) -> Option<lexan::Location> {
        self.data().defined_at.borrow().first().cloned()
    }

    pub fn used_at(&self) -> Vec<lexan::Location> {
        self.data().used_at.borrow().iter().cloned().collect()
    }

    pub fn add_defined_at(&self, defined_at: &lexan::Location) {
        self.data().defined_at.borrow_mut().push(defined_at.clone())
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
        self.data().precedence.set(precedence)
    }

    pub fn index(&self) -> usize {
        self.data().index.get()
    }

    pub fn set_index(&self, index: usize) {
        self.data().index.set(index)
    }

    pub fn set_type_tag(&self, tag: &Tag) {
        *self.data().type_tag.borrow_mut() = Some(tag.clone())
    }

    pub fn type_tag(&self) -> Option<Tag> {
        self.data().type_tag.borrow().clone()
    }

    pub fn firsts_data(&self) -> FirstsData {
        self.data()
            .firsts_data
            .borrow()
            .clone()
            .unwrap_or_default()
    }

    pub fn set_firsts_data(&self, firsts_data: FirstsData) {
        *self.data().firsts_data.borrow_mut() = Some(firsts_data)
    }
}
