//! Assembly of the final PGN document and of the secondary debug trace.

use std::fmt::Write;

use crate::chess::position::AppliedEffect;
use crate::trial::parser::{GameResult, UmpireNote};
use crate::trial::variant::Variant;

/// Header metadata of the emitted game. The `Site` tag is always `Ludii`:
/// the trials are produced by the Ludii simulator, there is no venue.
#[derive(Clone, Debug)]
pub struct Headers {
    #[allow(missing_docs)]
    pub event: String,
    #[allow(missing_docs)]
    pub date: String,
    #[allow(missing_docs)]
    pub white: String,
    #[allow(missing_docs)]
    pub black: String,
}

/// One emitted move: notation plus an optional `{...}` umpire comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedMove {
    #[allow(missing_docs)]
    pub notation: String,
    #[allow(missing_docs)]
    pub comment: Option<String>,
}

/// Renders the whole PGN document: tag section, movetext as numbered
/// white/black pairs (one pair per line) and the terminating result token.
#[must_use]
pub fn render(
    headers: &Headers,
    variant: Variant,
    result: GameResult,
    moves: &[AnnotatedMove],
) -> String {
    let mut pgn = String::new();
    let _ = writeln!(pgn, "[Event \"{}\"]", headers.event);
    pgn.push_str("[Site \"Ludii\"]\n");
    let _ = writeln!(pgn, "[Date \"{}\"]", headers.date);
    let _ = writeln!(pgn, "[White \"{}\"]", headers.white);
    let _ = writeln!(pgn, "[Black \"{}\"]", headers.black);
    let _ = writeln!(pgn, "[Variant \"{}\"]", variant.tag());
    let _ = writeln!(pgn, "[Result \"{result}\"]");
    pgn.push('\n');

    for (index, pair) in moves.chunks(2).enumerate() {
        let _ = write!(pgn, "{}.", index + 1);
        for half in pair {
            let _ = write!(pgn, " {}", half.notation);
            if let Some(comment) = &half.comment {
                let _ = write!(pgn, " {comment}");
            }
        }
        pgn.push('\n');
    }
    let _ = write!(pgn, "{result}");
    pgn
}

/// Builds the `{...}` umpire annotation of a Kriegspiel move: the capture
/// square, check announcements extracted from the umpire notes, or the
/// number of pawn tries available to the defender when there is no check.
#[must_use]
pub fn umpire_comment(effect: &AppliedEffect, notes: &[UmpireNote], pawn_tries: usize) -> String {
    let mut items: Vec<String> = Vec::new();
    if effect.captured.is_some() {
        if let Some(square) = effect.captured_on {
            items.push(format!("X{square}"));
        }
    }

    // The umpire addresses both players, so each announcement appears once
    // per recipient. Deduplicate by message before reading check kinds.
    let mut check_initials = String::new();
    for (index, note) in notes.iter().enumerate() {
        let message = note.message.as_str();
        if !message.to_ascii_lowercase().contains("check") {
            continue;
        }
        if notes[..index].iter().any(|seen| seen.message == message) {
            continue;
        }
        if let Some(initial) = message.chars().next() {
            check_initials.push(initial.to_ascii_uppercase());
        }
    }
    if check_initials.is_empty() {
        if pawn_tries > 0 {
            items.push(format!("P{pawn_tries}"));
        }
    } else {
        items.push(format!("C{check_initials}"));
    }

    format!("{{{}}}", items.join(","))
}

/// Human-readable log of every entry of the trial and what the converter
/// did with it. Rendered next to the PGN when debug output is requested.
#[derive(Debug, Default)]
pub struct DebugTrace {
    lines: Vec<String>,
}

impl DebugTrace {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the verdict on one logged entry.
    pub fn entry(&mut self, turn: usize, raw: &str, outcome: &str) {
        self.lines.push(format!("turn {turn}: {raw}\n  -> {outcome}"));
    }

    /// Records a free-form observation (setup mismatch, ambiguous ending).
    pub fn note(&mut self, message: &str) {
        self.lines.push(format!("note: {message}"));
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chess::core::{Piece, PieceKind, Player, Square};

    fn headers() -> Headers {
        Headers {
            event: "test-game".to_owned(),
            date: "????.??.??".to_owned(),
            white: "Player 1".to_owned(),
            black: "Player 2".to_owned(),
        }
    }

    fn plain(notation: &str) -> AnnotatedMove {
        AnnotatedMove {
            notation: notation.to_owned(),
            comment: None,
        }
    }

    #[test]
    fn tag_section_and_movetext() {
        let moves = vec![plain("e4"), plain("e5"), plain("Nc3"), plain("Nc6")];
        let pgn = render(&headers(), Variant::Standard, GameResult::Unknown, &moves);
        assert_eq!(
            pgn,
            "[Event \"test-game\"]\n\
             [Site \"Ludii\"]\n\
             [Date \"????.??.??\"]\n\
             [White \"Player 1\"]\n\
             [Black \"Player 2\"]\n\
             [Variant \"Chess\"]\n\
             [Result \"*\"]\n\
             \n\
             1. e4 e5\n\
             2. Nc3 Nc6\n\
             *"
        );
    }

    #[test]
    fn odd_number_of_moves() {
        let moves = vec![plain("e4"), plain("e5"), plain("Qh5")];
        let pgn = render(&headers(), Variant::Standard, GameResult::WhiteWins, &moves);
        assert!(pgn.ends_with("1. e4 e5\n2. Qh5\n1-0"));
    }

    #[test]
    fn comments_follow_moves() {
        let moves = vec![
            AnnotatedMove {
                notation: "exd5".to_owned(),
                comment: Some("{Xd5}".to_owned()),
            },
            plain("e5"),
        ];
        let pgn = render(&headers(), Variant::Kriegspiel, GameResult::Unknown, &moves);
        assert!(pgn.contains("[Variant \"Kriegspiel (chess)\"]"));
        assert!(pgn.contains("1. exd5 {Xd5} e5\n"));
    }

    fn capture_effect() -> AppliedEffect {
        AppliedEffect {
            piece: Piece::new(Player::White, PieceKind::Pawn),
            captured: Some(Piece::new(Player::Black, PieceKind::Pawn)),
            captured_on: Some(Square::D5),
            castle: None,
            en_passant: false,
            promotion: None,
            gives_check: false,
        }
    }

    #[test]
    fn umpire_capture_and_pawn_tries() {
        let comment = umpire_comment(&capture_effect(), &[], 2);
        assert_eq!(comment, "{Xd5,P2}");
    }

    #[test]
    fn umpire_check_suppresses_pawn_tries() {
        let notes = vec![
            UmpireNote {
                message: "File check".to_owned(),
                recipient: 1,
            },
            UmpireNote {
                message: "File check".to_owned(),
                recipient: 2,
            },
        ];
        let mut effect = capture_effect();
        effect.captured = None;
        effect.captured_on = None;
        effect.gives_check = true;
        let comment = umpire_comment(&effect, &notes, 1);
        assert_eq!(comment, "{CF}");
    }

    #[test]
    fn umpire_empty_comment() {
        let mut effect = capture_effect();
        effect.captured = None;
        effect.captured_on = None;
        assert_eq!(umpire_comment(&effect, &[], 0), "{}");
    }

    #[test]
    fn debug_trace_lines() {
        let mut trace = DebugTrace::new();
        trace.entry(0, "Move=[Move:mover=0,to=4,what=5]", "skipped (setup placement)");
        trace.note("ambiguous ending");
        assert_eq!(
            trace.render(),
            "turn 0: Move=[Move:mover=0,to=4,what=5]\n  -> skipped (setup placement)\nnote: ambiguous ending"
        );
    }
}
