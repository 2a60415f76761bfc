//! Error taxonomy of a single trial conversion.
//!
//! Every error is local to one input file: the CLI reports it and moves on
//! to the next trial.

use thiserror::Error;

/// Reasons a trial log cannot be converted to PGN.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// A line of the trial does not match any known entry shape, or a
    /// `Move=` entry cannot be decoded.
    #[error("malformed trial at line {line}: {text}")]
    MalformedTrial {
        /// 1-based line number within the input.
        line: usize,
        /// The offending line, or a description of what failed to decode.
        text: String,
    },

    /// A logged action the variant policy admitted cannot be replayed on
    /// the tracked board. Indicates a corrupt or truncated log.
    #[error("cannot replay turn {turn}: {action}")]
    IllegalStateTransition {
        /// 0-based index of the action within the trial.
        turn: usize,
        /// Description of the unreplayable action.
        action: String,
    },

    /// The `game=` header names a game this converter does not understand.
    #[error("unsupported game variant: {0}")]
    UnsupportedVariant(String),
}
