//! [Standard Algebraic Notation] for replayed moves.
//!
//! The formatter is deterministic: the notation depends only on the
//! position the move was played in and on what applying it did.
//!
//! [Standard Algebraic Notation]: https://en.wikipedia.org/wiki/Algebraic_notation_(chess)

use std::fmt::Write;

use crate::chess::core::{Move, PieceKind};
use crate::chess::position::{AppliedEffect, CastleSide, Position};

/// Renders one applied move. `before` is the position the move was played
/// in (needed to resolve ambiguity between same-kind pieces); `effect` is
/// what [`Position::apply`] reported.
///
/// A move that leaves the opponent in check gets a `+` suffix; the
/// transcript assembler upgrades the final move's `+` to `#` when the
/// trial shows the game ended there.
#[must_use]
pub fn san(before: &Position, mv: Move, effect: &AppliedEffect) -> String {
    let mut notation = match effect.castle {
        Some(CastleSide::Short) => "O-O".to_owned(),
        Some(CastleSide::Long) => "O-O-O".to_owned(),
        None => {
            if effect.piece.kind == PieceKind::Pawn {
                pawn_move(mv, effect)
            } else {
                piece_move(before, mv, effect)
            }
        },
    };
    if effect.gives_check {
        notation.push('+');
    }
    notation
}

fn pawn_move(mv: Move, effect: &AppliedEffect) -> String {
    let mut notation = String::new();
    if effect.captured.is_some() {
        let _ = write!(notation, "{}x", mv.from.file());
    }
    let _ = write!(notation, "{}", mv.to);
    if let Some(promotion) = effect.promotion {
        let _ = write!(notation, "={}", PieceKind::from(promotion).san_letter());
    }
    notation
}

fn piece_move(before: &Position, mv: Move, effect: &AppliedEffect) -> String {
    let mut notation = String::new();
    notation.push(effect.piece.kind.san_letter());
    notation.push_str(&disambiguator(before, mv));
    if effect.captured.is_some() {
        notation.push('x');
    }
    let _ = write!(notation, "{}", mv.to);
    notation
}

/// The minimal qualifier distinguishing the moving piece from others of
/// the same kind that could reach the destination: originating file when
/// it suffices, rank when the file does not, the full square otherwise.
fn disambiguator(before: &Position, mv: Move) -> String {
    let others = before.disambiguators(mv.from, mv.to);
    if others.is_empty() {
        return String::new();
    }
    if others.iter().all(|square| square.file() != mv.from.file()) {
        return mv.from.file().to_string();
    }
    if others.iter().all(|square| square.rank() != mv.from.rank()) {
        return mv.from.rank().to_string();
    }
    mv.from.to_string()
}
