// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>

//! The LALR(1) construction pipeline as a library, so both the `lalrgen`
//! binary and its integration tests can drive [`pipeline::build`] directly.

pub mod actions;
pub mod bitset;
pub mod emit;
pub mod error;
pub mod lalr;
pub mod lr0;
pub mod nullable;
pub mod pack;
pub mod pipeline;
pub mod production;
pub mod reader;
pub mod symbol;
