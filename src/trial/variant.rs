//! Game variants and the per-variant inclusion policy deciding which
//! logged entries belong in the primary transcript.

use std::fmt;

use crate::error::ConversionError;
use crate::trial::parser::{ActionKind, LoggedAction};

const STANDARD_GAME: &str = "game=/lud/board/war/replacement/checkmate/chess/Chess.lud";
const KRIEGSPIEL_GAME: &str =
    "game=/lud/board/war/replacement/checkmate/chess/Kriegspiel (Chess).lud";

/// The chess variants the converter understands.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Standard,
    Kriegspiel,
}

impl Variant {
    /// The value of the PGN `Variant` tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Standard => "Chess",
            Self::Kriegspiel => "Kriegspiel (chess)",
        }
    }

    /// The inclusion policy for this variant.
    #[must_use]
    pub fn policy(self) -> &'static dyn VariantPolicy {
        match self {
            Self::Standard => &StandardPolicy,
            Self::Kriegspiel => &KriegspielPolicy,
        }
    }
}

impl TryFrom<&str> for Variant {
    type Error = ConversionError;

    /// Matches the `game=` header line of a trial.
    fn try_from(header: &str) -> Result<Self, ConversionError> {
        match header.trim() {
            STANDARD_GAME => Ok(Self::Standard),
            KRIEGSPIEL_GAME => Ok(Self::Kriegspiel),
            other => Err(ConversionError::UnsupportedVariant(other.to_owned())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Why a logged entry is left out of the primary transcript.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Initial piece placement, not a move.
    Setup,
    /// A move attempt the simulator rejected.
    Illegal,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup placement",
            Self::Illegal => "illegal under partial information",
        })
    }
}

/// Decision of a [`VariantPolicy`] on a single logged entry.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Emit,
    Skip(SkipReason),
}

/// Per-variant filter over logged entries, chosen once at conversion
/// start. Skipped entries are never applied to the board and only appear
/// in the debug trace.
pub trait VariantPolicy {
    /// Decides whether `action` belongs in the primary transcript.
    fn verdict(&self, action: &LoggedAction) -> Verdict;

    /// Whether the transcript carries umpire annotations as PGN comments.
    fn annotates(&self) -> bool {
        false
    }
}

/// Standard chess: every accepted move is emitted, setup placements are
/// not. Rejected entries should not occur; if a corrupt log carries one it
/// is skipped rather than replayed.
pub struct StandardPolicy;

impl VariantPolicy for StandardPolicy {
    fn verdict(&self, action: &LoggedAction) -> Verdict {
        match action.kind {
            ActionKind::Setup { .. } => Verdict::Skip(SkipReason::Setup),
            ActionKind::Move(_) => Verdict::Emit,
            ActionKind::Rejected { .. } => Verdict::Skip(SkipReason::Illegal),
        }
    }
}

/// Kriegspiel: the umpire rejects attempts that are illegal on the hidden
/// board, and the log keeps them. They stay out of the transcript (the
/// moves that were eventually accepted already describe the game) and are
/// listed in the debug trace instead.
pub struct KriegspielPolicy;

impl VariantPolicy for KriegspielPolicy {
    fn verdict(&self, action: &LoggedAction) -> Verdict {
        match action.kind {
            ActionKind::Setup { .. } => Verdict::Skip(SkipReason::Setup),
            ActionKind::Move(_) => Verdict::Emit,
            ActionKind::Rejected { .. } => Verdict::Skip(SkipReason::Illegal),
        }
    }

    fn annotates(&self) -> bool {
        true
    }
}
