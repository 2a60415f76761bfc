//! Decoding of Ludii trial logs: the line-oriented parser and the
//! per-variant inclusion policies.

pub mod parser;
pub mod variant;
