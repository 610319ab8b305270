// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! Runtime support shared by every parser `lalrgen` emits: the parse stack, the
//! table driven driver loop, viable-state error recovery and bounded
//! backtracking for grammars with unresolved (but declared acceptable)
//! conflicts.

pub use std::{
    collections::BTreeSet,
    convert::From,
    default::Default,
    fmt::{self, Debug, Display},
    io::Write,
};

use lexan::TokenStream;

#[derive(Debug, Clone)]
pub enum Error<T: Ord + Copy + Debug + Display> {
    LexicalError(lexan::Error<T>, BTreeSet<T>),
    SyntaxError(lexan::Token<T>, BTreeSet<T>),
}

fn format_set<T: Ord + Display>(set: &BTreeSet<T>) -> String {
    let mut string = String::new();
    let last = set.len().saturating_sub(1);
    for (index, item) in set.iter().enumerate() {
        if index == 0 {
            string += &item.to_string();
        } else {
            if index == last {
                string += " or ";
            } else {
                string += ", ";
            };
            string += &item.to_string()
        }
    }
    string
}

impl<T: Ord + Copy + Debug + Display> Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LexicalError(lex_err, expected) => write!(
                f,
                "Lexical Error: {}: expected: {}.",
                lex_err,
                format_set(expected)
            ),
            Error::SyntaxError(found, expected) => write!(
                f,
                "Syntax Error: expected: {} found: {} at: {}.",
                format_set(expected),
                found.tag(),
                found.location()
            ),
        }
    }
}

pub trait ReportError<T: Ord + Copy + Debug + Display> {
    fn report_error(&mut self, error: &Error<T>) {
        let message = error.to_string();
        if let Error::LexicalError(lexan::Error::AmbiguousMatches(_, _, _), _) = error {
            panic!("Fatal Error: {}!!", message);
        }
        std::io::stderr()
            .write_all(message.as_bytes())
            .expect("nowhere to send diagnostics");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Symbol<T, N> {
    Terminal(T),
    NonTerminal(N),
    Start,
    Error,
}

/// The action table's verdict for (state, lookahead). `Backtrack` is only
/// produced for a `-B`-built parser's undeclared-precedence shift/reduce
/// conflicts: the shift is tried first (yacc's own default resolution),
/// then each listed reduce production in declaration order, rolling back on
/// syntax error until one lets the parse continue; if every alternative
/// dead-ends, the shift commits.
#[derive(Debug, Clone)]
pub enum Action<T: Copy + Debug> {
    Shift(u32),
    Reduce(u32),
    Accept,
    Backtrack(u32, Vec<u32>),
    SyntaxError(Vec<T>),
}

#[derive(Debug)]
pub struct ParseStack<T, N, A>
where
    T: Copy + Ord + Debug + Display,
    A: From<lexan::Token<T>> + From<Error<T>>,
{
    states: Vec<(Symbol<T, N>, u32)>,
    attributes: Vec<A>,
    last_error_state: Option<u32>,
}

impl<T, N, A> Clone for ParseStack<T, N, A>
where
    T: Copy + Ord + Debug + Display,
    N: Clone,
    A: Clone + From<lexan::Token<T>> + From<Error<T>>,
{
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
            attributes: self.attributes.clone(),
            last_error_state: self.last_error_state,
        }
    }
}

impl<T, N, A> ParseStack<T, N, A>
where
    T: Copy + Ord + Debug + Display,
    A: From<lexan::Token<T>> + From<Error<T>>,
{
    fn new() -> Self {
        Self {
            states: vec![(Symbol::Start, 0)],
            attributes: vec![],
            last_error_state: None,
        }
    }

    fn current_state(&self) -> u32 {
        self.states.last().unwrap().1
    }

    /// The attribute `n` positions from the top of the stack (1-based, as used by
    /// `$n` references in grammar actions and predicates).
    pub fn at_len_minus_n(&self, n: usize) -> &A {
        let len = self.attributes.len();
        &self.attributes[len - n]
    }

    fn pop_n(&mut self, n: usize) -> Vec<A> {
        let len = self.states.len();
        self.states.truncate(len - n);
        let len = self.attributes.len();
        self.attributes.split_off(len - n)
    }

    fn push_error(&mut self, state: u32, error: Error<T>) {
        self.states.push((Symbol::Error, state));
        self.attributes.push(A::from(error))
    }

    fn push_terminal(&mut self, token: lexan::Token<T>, new_state: u32) {
        self.states
            .push((Symbol::Terminal(*token.tag()), new_state));
        self.attributes.push(A::from(token));
    }

    fn push_non_terminal(&mut self, non_terminal: N, attribute: A, new_state: u32) {
        self.attributes.push(attribute);
        self.states
            .push((Symbol::NonTerminal(non_terminal), new_state));
    }

    fn is_last_error_state(&self, state: u32) -> bool {
        self.last_error_state == Some(state)
    }

    fn distance_to_viable_state<F: Fn(&T) -> BTreeSet<u32>>(
        &mut self,
        tokens: &mut TokenStream<T>,
        viable_error_recovery_states: F,
    ) -> Option<usize> {
        while !tokens.is_empty() {
            if let Ok(token) = tokens.front() {
                let viable_states = viable_error_recovery_states(token.tag());
                for sub in 1..self.states.len() {
                    let candidate = self.states[self.states.len() - sub].1;
                    if !self.is_last_error_state(candidate) && viable_states.contains(&candidate) {
                        self.last_error_state = Some(candidate);
                        return Some(sub - 1);
                    }
                }
            };
            tokens.advance();
        }
        None
    }
}

pub trait Parser<T, N, A>
where
    T: Ord + Copy + Debug + Display,
    N: Ord + Clone + Display + Debug,
    A: Default + Clone + From<lexan::Token<T>> + From<Error<T>>,
    Self: ReportError<T>,
{
    fn lexical_analyzer(&self) -> &lexan::LexicalAnalyzer<T>;

    fn next_action(
        &self,
        state: u32,
        attributes: &ParseStack<T, N, A>,
        token: &lexan::Token<T>,
    ) -> Action<T>;

    fn production_data(production_id: u32) -> (N, usize);

    fn goto_state(lhs: &N, current_state: u32) -> u32;

    fn do_semantic_action<F: FnMut(String, String)>(
        &mut self,
        _production_id: u32,
        _attributes: Vec<A>,
        mut inject: F,
    ) -> A {
        inject(String::new(), String::new());
        A::default()
    }

    fn viable_error_recovery_states(tag: &T) -> BTreeSet<u32>;

    fn error_goto_state(state: u32) -> u32;

    fn look_ahead_set(state: u32) -> BTreeSet<T>;

    fn recover_from_error(
        error: Error<T>,
        parse_stack: &mut ParseStack<T, N, A>,
        tokens: &mut TokenStream<T>,
    ) -> bool {
        if let Some(distance) =
            parse_stack.distance_to_viable_state(tokens, |t| Self::viable_error_recovery_states(t))
        {
            parse_stack.pop_n(distance);
            let next_state = Self::error_goto_state(parse_stack.current_state());
            parse_stack.push_error(next_state, error);
            true
        } else {
            false
        }
    }

    /// One reduce step of the driver, also used by `try_alternatives` to
    /// trial a candidate reduction; `parse_text` and `try_alternatives`
    /// implement the rollback around trial calls.
    fn step(
        &mut self,
        parse_stack: &mut ParseStack<T, N, A>,
        tokens: &mut TokenStream<T>,
        production_id: u32,
    ) {
        let (lhs, rhs_len) = Self::production_data(production_id);
        let rhs = parse_stack.pop_n(rhs_len);
        let next_state = Self::goto_state(&lhs, parse_stack.current_state());
        let attribute = self.do_semantic_action(production_id, rhs, |s, l| tokens.inject(s, l));
        parse_stack.push_non_terminal(lhs, attribute, next_state);
    }

    fn parse_text(&mut self, text: String, label: String) -> Result<(), Error<T>> {
        let mut tokens = self.lexical_analyzer().token_stream(text, label);
        let mut parse_stack = ParseStack::<T, N, A>::new();
        let mut result: Result<(), Error<T>> = Ok(());

        loop {
            match tokens.front() {
                Err(err) => {
                    let expected_tokens = Self::look_ahead_set(parse_stack.current_state());
                    let error = Error::LexicalError(err, expected_tokens);
                    self.report_error(&error);
                    result = Err(error.clone());
                    if !Self::recover_from_error(error, &mut parse_stack, &mut tokens) {
                        return result;
                    }
                }
                Ok(token) => match self.next_action(parse_stack.current_state(), &parse_stack, &token) {
                    Action::Accept => return result,
                    Action::Shift(next_state) => {
                        parse_stack.push_terminal(token, next_state);
                        tokens.advance();
                    }
                    Action::Reduce(production_id) => {
                        self.step(&mut parse_stack, &mut tokens, production_id);
                    }
                    Action::Backtrack(shift_target, alternatives) => {
                        if !self.try_alternatives(
                            &mut parse_stack,
                            &mut tokens,
                            &token,
                            shift_target,
                            &alternatives,
                        ) {
                            // Neither the shift nor any reduce alternative
                            // avoids an immediate syntax error; the shift
                            // commits (yacc's own default resolution).
                            parse_stack.push_terminal(token, shift_target);
                            tokens.advance();
                        }
                    }
                    Action::SyntaxError(_) => {
                        let expected_tokens = Self::look_ahead_set(parse_stack.current_state());
                        let error = Error::SyntaxError(token.clone(), expected_tokens);
                        self.report_error(&error);
                        result = Err(error.clone());
                        if !Self::recover_from_error(error, &mut parse_stack, &mut tokens) {
                            return result;
                        }
                    }
                },
            };
        }
    }

    /// Try the committed shift, then each reduce alternative in turn, on a
    /// cloned stack, checkpointing the (shared) token stream first so a dead
    /// end can be rolled back without disturbing the next candidate. The
    /// first trial whose immediately following action is not a syntax error
    /// wins and its stack replaces `parse_stack`. Returns whether anything
    /// survived; the caller commits to the shift if nothing did.
    fn try_alternatives(
        &mut self,
        parse_stack: &mut ParseStack<T, N, A>,
        tokens: &mut TokenStream<T>,
        token: &lexan::Token<T>,
        shift_target: u32,
        alternatives: &[u32],
    ) -> bool {
        let checkpoint = tokens.checkpoint();
        let mut trial_stack = parse_stack.clone();
        trial_stack.push_terminal(token.clone(), shift_target);
        tokens.advance();
        if self.trial_survives(&trial_stack, tokens) {
            *parse_stack = trial_stack;
            return true;
        }
        tokens.restore(checkpoint);

        for production_id in alternatives {
            let checkpoint = tokens.checkpoint();
            let mut trial_stack = parse_stack.clone();
            self.step(&mut trial_stack, tokens, *production_id);
            if self.trial_survives(&trial_stack, tokens) {
                *parse_stack = trial_stack;
                return true;
            }
            tokens.restore(checkpoint);
        }
        false
    }

    fn trial_survives(&self, trial_stack: &ParseStack<T, N, A>, tokens: &TokenStream<T>) -> bool {
        match tokens.front() {
            Ok(next_token) => !matches!(
                self.next_action(trial_stack.current_state(), trial_stack, &next_token),
                Action::SyntaxError(_)
            ),
            Err(_) => false,
        }
    }
}
