//! Implementation of the chess environment the trials are replayed in.

pub mod core;
pub mod position;
