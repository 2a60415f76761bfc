//! Rendering of the converted game: Standard Algebraic Notation for
//! individual moves and assembly of the final PGN document.

pub mod san;
pub mod transcript;
