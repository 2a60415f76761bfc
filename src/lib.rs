//! Converter for Ludii trial logs (`.trl`) of chess and Kriegspiel games
//! into Portable Game Notation.
//!
//! The pipeline lives in [`convert::Converter`]: a trial is parsed
//! ([`trial::parser`]), replayed move by move on a board tracker
//! ([`chess::position`]) under the variant's inclusion policy
//! ([`trial::variant`]), rendered as Standard Algebraic Notation
//! ([`pgn::san`]) and assembled into the final document
//! ([`pgn::transcript`]).

pub mod chess;
pub mod convert;
pub mod error;
pub mod pgn;
pub mod trial;

pub use convert::{Conversion, Converter};
pub use error::ConversionError;
