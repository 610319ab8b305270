// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! The error taxonomy of §7: reader errors abort before LR(0) construction
//! starts; everything from [`Error::SymbolClassConflict`] onward can only be
//! raised once the symbol table and rule store are frozen.

use std::fmt;

use crate::symbol;

#[derive(Debug)]
pub enum Error {
    GrammarSyntaxError(String, lexan::Location),
    SymbolClassConflict(String, lexan::Location),
    DuplicateTokenNumber(String, u32),
    UndeclaredNonterminal(String, Vec<lexan::Location>),
    UndefinedStart,
    /// Not fatal: accumulated and reported as a warning at the end of the run.
    UnreachableSymbol(String),
    /// Not fatal: accumulated and reported as a warning at the end of the run.
    UnusedRule(String, lexan::Location),
    UnexpectedConflicts {
        shift_reduce: usize,
        expected_shift_reduce: usize,
        reduce_reduce: usize,
        expected_reduce_reduce: usize,
    },
    IntegerOverflow(&'static str, usize),
    InternalInvariantViolation(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            GrammarSyntaxError(message, location) => write!(f, "{}: {}", location, message),
            SymbolClassConflict(name, location) => write!(
                f,
                "{}: \"{}\" is used as both a terminal and a nonterminal",
                location, name
            ),
            DuplicateTokenNumber(name, number) => {
                write!(f, "token number {} (for \"{}\") is already assigned", number, name)
            }
            UndeclaredNonterminal(name, locations) => write!(
                f,
                "\"{}\" is used but never defined (first use at {})",
                name,
                locations.first().map(|l| l.to_string()).unwrap_or_default()
            ),
            UndefinedStart => write!(f, "no nonterminal is defined to serve as the start symbol"),
            UnreachableSymbol(name) => write!(f, "\"{}\" is declared but never reachable from the start symbol", name),
            UnusedRule(lhs, location) => write!(f, "{}: rule for \"{}\" is never used", location, lhs),
            UnexpectedConflicts {
                shift_reduce,
                expected_shift_reduce,
                reduce_reduce,
                expected_reduce_reduce,
            } => write!(
                f,
                "expected {} shift/reduce and {} reduce/reduce conflicts, found {} and {}",
                expected_shift_reduce, expected_reduce_reduce, shift_reduce, reduce_reduce
            ),
            IntegerOverflow(what, count) => {
                write!(f, "{} count {} exceeds the representable width", what, count)
            }
            InternalInvariantViolation(what) => write!(f, "internal invariant violated: {}", what),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Stable ordering key so accumulated warnings print deterministically
    /// regardless of the set iteration order they were discovered in.
    pub fn sort_key(&self) -> String {
        match self {
            Error::UnreachableSymbol(name) => format!("0{}", name),
            Error::UnusedRule(name, location) => format!("1{}{}", name, location),
            other => format!("2{}", other),
        }
    }
}

impl From<symbol::Error> for Error {
    fn from(error: symbol::Error) -> Self {
        match error {
            symbol::Error::ConflictsWithToken(token) => {
                Error::SymbolClassConflict(token.name().to_string(), token.defined_at().clone())
            }
            symbol::Error::DuplicateTokenNumber(token, number) => {
                Error::DuplicateTokenNumber(token.name().to_string(), number)
            }
            symbol::Error::DuplicateTag(ref tag) => {
                Error::GrammarSyntaxError(error.to_string(), tag.defined_at().clone())
            }
            symbol::Error::DuplicateToken(ref token) | symbol::Error::DuplicateTokenDefinition(ref token) => {
                Error::GrammarSyntaxError(error.to_string(), token.defined_at().clone())
            }
            symbol::Error::DuplicateSkipRule(_) => {
                Error::GrammarSyntaxError(error.to_string(), lexan::Location::default())
            }
        }
    }
}
