// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! A small hand rolled lexical analyzer.
//!
//! This crate is the external lexer collaborator used by the grammar reader: it
//! turns a text buffer into a stream of tagged, located tokens. Longest match wins;
//! literal patterns are preferred over regular expression patterns of the same
//! length so that keywords take priority over identifier-like regexes that would
//! otherwise also match them.

mod error;

pub use error::ConstructionError;

use regex::Regex;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A position within a named piece of source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    label: Rc<String>,
    line: usize,
    column: usize,
}

impl Location {
    fn start(label: Rc<String>) -> Self {
        Self {
            label,
            line: 1,
            column: 1,
        }
    }

    fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    pub fn line_number(&self) -> usize {
        self.line
    }

    pub fn column_number(&self) -> usize {
        self.column
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.label, self.line, self.column)
    }
}

/// A single recognized (or injected) token.
#[derive(Debug, Clone)]
pub struct Token<T> {
    tag: T,
    lexeme: String,
    location: Location,
}

impl<T: Copy> Token<T> {
    pub fn tag(&self) -> &T {
        &self.tag
    }

    pub fn lexeme(&self) -> &String {
        &self.lexeme
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

/// Errors encountered while drawing tokens from a [`TokenStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<T> {
    /// No registered pattern matched at this location.
    UnexpectedText(String, Location),
    /// Two or more patterns of different tags matched the same (longest) lexeme.
    AmbiguousMatches(Vec<T>, String, Location),
    /// `advance()` was called on an exhausted stream.
    AdvancedWhenEmpty(Location),
}

impl<T: fmt::Display> fmt::Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnexpectedText(text, location) => {
                write!(f, "{}: unexpected text: \"{}\"", location, text)
            }
            Error::AmbiguousMatches(tags, text, location) => {
                write!(f, "{}: \"{}\" matches more than one pattern: ", location, text)?;
                for (index, tag) in tags.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", tag)?;
                }
                Ok(())
            }
            Error::AdvancedWhenEmpty(location) => {
                write!(f, "{}: advanced past end of input", location)
            }
        }
    }
}

struct Pattern<T> {
    tag: T,
    literal: Option<String>,
    regex: Option<Regex>,
}

/// An immutable table of patterns to tag; build once (usually as a `lazy_static`)
/// and reuse for every [`TokenStream`].
pub struct LexicalAnalyzer<T> {
    patterns: Vec<Pattern<T>>,
    skip_regexes: Vec<Regex>,
    end_tag: T,
}

impl<T: Copy + PartialEq + fmt::Debug> LexicalAnalyzer<T> {
    /// `literal_patterns` are matched as exact substrings; `regex_patterns` are
    /// anchored regular expressions; `skip_regexes` are anchored regular
    /// expressions for text (whitespace, comments) that is discarded between
    /// tokens. `end_tag` is returned once, as a zero length token, when the input
    /// is exhausted.
    ///
    /// Panics if the pattern table is malformed (see [`ConstructionError`]) —
    /// every call site builds its table from a fixed, compiled-in literal, so a
    /// malformed table is a programmer error to be caught at startup, not a
    /// recoverable condition callers need to branch on.
    pub fn new(
        literal_patterns: &[(T, &str)],
        regex_patterns: &[(T, &str)],
        skip_regexes: &[&str],
        end_tag: T,
    ) -> Self {
        Self::try_new(literal_patterns, regex_patterns, skip_regexes, end_tag)
            .unwrap_or_else(|err| panic!("invalid lexical analyzer definition: {}", err))
    }

    fn try_new<'a>(
        literal_patterns: &'a [(T, &'a str)],
        regex_patterns: &'a [(T, &'a str)],
        skip_regexes: &[&str],
        end_tag: T,
    ) -> Result<Self, ConstructionError<'a, T>> {
        let mut patterns = Vec::with_capacity(literal_patterns.len() + regex_patterns.len());
        let mut seen_tags: Vec<T> = Vec::with_capacity(patterns.capacity());
        let mut seen_literals: Vec<&str> = Vec::with_capacity(literal_patterns.len());
        for (tag, text) in literal_patterns {
            if seen_tags.contains(tag) {
                return Err(ConstructionError::DuplicateHandle(*tag));
            }
            if text.is_empty() {
                return Err(ConstructionError::EmptyPattern(Some(*tag)));
            }
            if seen_literals.contains(text) {
                return Err(ConstructionError::DuplicatePattern(*text));
            }
            seen_tags.push(*tag);
            seen_literals.push(*text);
            patterns.push(Pattern {
                tag: *tag,
                literal: Some(text.to_string()),
                regex: None,
            });
        }
        for (tag, text) in regex_patterns {
            if seen_tags.contains(tag) {
                return Err(ConstructionError::DuplicateHandle(*tag));
            }
            seen_tags.push(*tag);
            let anchored = format!("^(?:{})", text);
            let regex = Regex::new(&anchored)?;
            if regex.find("").is_some() {
                return Err(ConstructionError::EmptyPattern(Some(*tag)));
            }
            patterns.push(Pattern {
                tag: *tag,
                literal: None,
                regex: Some(regex),
            });
        }
        let skip_regexes = skip_regexes
            .iter()
            .map(|text| Regex::new(&format!("^(?:{})", text)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            skip_regexes,
            end_tag,
        })
    }

    fn skip_len(&self, text: &str) -> usize {
        let mut total = 0;
        loop {
            let mut advanced = false;
            for regex in self.skip_regexes.iter() {
                if let Some(m) = regex.find(&text[total..]) {
                    if m.end() > 0 {
                        total += m.end();
                        advanced = true;
                        break;
                    }
                }
            }
            if !advanced {
                return total;
            }
        }
    }

    /// Find the longest match at the start of `text`, preferring literals over
    /// regexes on a length tie, and reporting ambiguity between distinct tags
    /// that match the same longest length.
    fn longest_match(&self, text: &str) -> Result<Option<(T, usize)>, Vec<T>> {
        let mut best_len = 0;
        let mut best_is_literal = false;
        let mut best: Vec<T> = vec![];
        for pattern in self.patterns.iter() {
            let matched_len = if let Some(literal) = &pattern.literal {
                if text.starts_with(literal.as_str()) {
                    Some(literal.len())
                } else {
                    None
                }
            } else if let Some(regex) = &pattern.regex {
                regex.find(text).map(|m| m.end())
            } else {
                None
            };
            if let Some(len) = matched_len {
                if len == 0 {
                    continue;
                }
                let is_literal = pattern.literal.is_some();
                if len > best_len || (len == best_len && is_literal && !best_is_literal) {
                    best_len = len;
                    best_is_literal = is_literal;
                    best = vec![pattern.tag];
                } else if len == best_len && is_literal == best_is_literal {
                    best.push(pattern.tag);
                }
            }
        }
        if best.len() > 1 {
            Err(best)
        } else if let Some(tag) = best.first() {
            Ok(Some((*tag, best_len)))
        } else {
            Ok(None)
        }
    }

    pub fn token_stream(&self, text: String, label: String) -> TokenStream<T> {
        TokenStream::new(self, text, label)
    }
}

/// An opaque saved position of a [`TokenStream`], produced by
/// [`TokenStream::checkpoint`] and consumed by [`TokenStream::restore`].
#[derive(Clone)]
pub struct Checkpoint<T> {
    offset: usize,
    location: Location,
    pending: VecDeque<Result<Token<T>, Error<T>>>,
    exhausted: bool,
}

struct StreamState {
    text: String,
    offset: usize,
    location: Location,
}

/// A demand-driven, lookahead-of-one stream of tokens drawn from a fixed text
/// buffer. Mid-rule actions can [`TokenStream::inject`] extra skipped text (e.g.
/// desugared action text) ahead of the next real token.
pub struct TokenStream<'a, T> {
    lexan: &'a LexicalAnalyzer<T>,
    state: RefCell<StreamState>,
    pending: RefCell<VecDeque<Result<Token<T>, Error<T>>>>,
    exhausted: RefCell<bool>,
}

impl<'a, T: Copy + PartialEq> TokenStream<'a, T> {
    fn new(lexan: &'a LexicalAnalyzer<T>, text: String, label: String) -> Self {
        let location = Location::start(Rc::new(label));
        Self {
            lexan,
            state: RefCell::new(StreamState {
                text,
                offset: 0,
                location,
            }),
            pending: RefCell::new(VecDeque::new()),
            exhausted: RefCell::new(false),
        }
    }

    fn fetch_one(&self) -> Result<Token<T>, Error<T>> {
        let mut state = self.state.borrow_mut();
        let skip_len = self.lexan.skip_len(&state.text[state.offset..]);
        if skip_len > 0 {
            let skipped = state.text[state.offset..state.offset + skip_len].to_string();
            state.location.advance(&skipped);
            state.offset += skip_len;
        }
        let remaining = &state.text[state.offset..];
        if remaining.is_empty() {
            if *self.exhausted.borrow() {
                return Err(Error::AdvancedWhenEmpty(state.location.clone()));
            }
            *self.exhausted.borrow_mut() = true;
            return Ok(Token {
                tag: self.lexan.end_tag,
                lexeme: String::new(),
                location: state.location.clone(),
            });
        }
        match self.lexan.longest_match(remaining) {
            Ok(Some((tag, len))) => {
                let lexeme = remaining[..len].to_string();
                let location = state.location.clone();
                state.location.advance(&lexeme);
                state.offset += len;
                Ok(Token {
                    tag,
                    lexeme,
                    location,
                })
            }
            Ok(None) => {
                let lexeme = remaining.chars().next().unwrap().to_string();
                let location = state.location.clone();
                state.location.advance(&lexeme);
                state.offset += lexeme.len();
                Err(Error::UnexpectedText(lexeme, location))
            }
            Err(tags) => {
                let lexeme = remaining[..1].to_string();
                let location = state.location.clone();
                state.location.advance(&lexeme);
                state.offset += lexeme.len();
                Err(Error::AmbiguousMatches(tags, lexeme, location))
            }
        }
    }

    fn ensure_front(&self) {
        if self.pending.borrow().is_empty() {
            let token = self.fetch_one();
            self.pending.borrow_mut().push_back(token);
        }
    }

    /// Peek at the next token without consuming it.
    pub fn front(&self) -> Result<Token<T>, Error<T>> {
        self.ensure_front();
        self.pending.borrow().front().unwrap().clone()
    }

    /// Drop the current front token so the next call to [`Self::front`] returns
    /// the one after it.
    pub fn advance(&mut self) {
        self.ensure_front();
        self.pending.borrow_mut().pop_front();
    }

    /// Peek-and-consume in one call.
    pub fn advance_front(&mut self) -> Result<Token<T>, Error<T>> {
        let token = self.front();
        self.advance();
        token
    }

    /// Snapshot the stream's position so a tentative parse (backtracking) can be
    /// rolled back to this point if it turns out to be the wrong alternative.
    pub fn checkpoint(&self) -> Checkpoint<T>
    where
        T: Clone,
    {
        let state = self.state.borrow();
        Checkpoint {
            offset: state.offset,
            location: state.location.clone(),
            pending: self.pending.borrow().clone(),
            exhausted: *self.exhausted.borrow(),
        }
    }

    /// Restore a previously taken [`Checkpoint`], discarding anything consumed
    /// since it was made.
    pub fn restore(&mut self, checkpoint: Checkpoint<T>) {
        let mut state = self.state.borrow_mut();
        state.offset = checkpoint.offset;
        state.location = checkpoint.location;
        *self.pending.borrow_mut() = checkpoint.pending;
        *self.exhausted.borrow_mut() = checkpoint.exhausted;
    }

    pub fn is_empty(&self) -> bool {
        self.ensure_front();
        let pending = self.pending.borrow();
        match pending.front() {
            Some(Ok(token)) => token.tag == self.lexan.end_tag,
            _ => false,
        }
    }

    /// Splice text into the stream ahead of the next token, re-lexing it as if it
    /// had appeared at the current position. Used by the parser driver to feed
    /// injected mid-rule action text back through tokenization.
    pub fn inject(&mut self, text: String, label: String) {
        if text.is_empty() {
            return;
        }
        let mut state = self.state.borrow_mut();
        let remaining = state.text[state.offset..].to_string();
        state.text = format!("{}{}", text, remaining);
        state.offset = 0;
        if !label.is_empty() {
            state.location = Location::start(Rc::new(label));
        }
        self.pending.borrow_mut().clear();
        *self.exhausted.borrow_mut() = false;
    }
}
