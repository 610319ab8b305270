use std::convert::From;
use std::fmt;

/// Errors raised while *constructing* a [`crate::LexicalAnalyzer`], as distinct from
/// errors raised while using one to tokenize text (see [`crate::Error`]).
#[derive(Debug, PartialEq)]
pub enum ConstructionError<'a, T> {
    DuplicateHandle(T),
    DuplicatePattern(&'a str),
    EmptyPattern(Option<T>),
    RegexError(regex::Error),
}

impl<'a, T> From<regex::Error> for ConstructionError<'a, T> {
    fn from(error: regex::Error) -> Self {
        ConstructionError::RegexError(error)
    }
}

impl<'a, T: fmt::Debug> fmt::Display for ConstructionError<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConstructionError::DuplicateHandle(tag) => {
                write!(f, "tag {:?} is used for more than one pattern", tag)
            }
            ConstructionError::DuplicatePattern(pattern) => {
                write!(f, "pattern \"{}\" is registered more than once", pattern)
            }
            ConstructionError::EmptyPattern(tag) => {
                write!(f, "pattern for {:?} matches the empty string", tag)
            }
            ConstructionError::RegexError(error) => write!(f, "{}", error),
        }
    }
}
