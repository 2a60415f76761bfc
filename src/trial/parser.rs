//! Parser for Ludii trial logs (`.trl`).
//!
//! A trial is line-oriented. The first line is a `game=` header naming the
//! played `.lud` game. `Move=[Move:...]` lines record everything the
//! simulator did: initial piece placements (`mover=0`), the moves of both
//! players (`mover=1|2`) and, for Kriegspiel, rejected attempts marked with
//! `Illegal move`. A trailing `winner=` line carries the outcome. All other
//! `key=value` lines are engine metadata (RNG state, rankings) and are
//! skipped.

use std::fmt;

use crate::chess::core::{Move, Piece, Player, Promotion, Square};
use crate::error::ConversionError;
use crate::trial::variant::Variant;

/// Game outcome as recorded by the trailing `winner=` line.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Unknown,
}

impl GameResult {
    /// The winning player, if the trial records a decisive outcome.
    #[must_use]
    pub const fn winner(self) -> Option<Player> {
        match self {
            Self::WhiteWins => Some(Player::White),
            Self::BlackWins => Some(Player::Black),
            Self::Draw | Self::Unknown => None,
        }
    }
}

impl fmt::Display for GameResult {
    /// The PGN result token.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Unknown => "*",
        })
    }
}

/// An umpire message attached to a logged move
/// (`[Note:message=...,to=N]`), addressed to one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UmpireNote {
    #[allow(missing_docs)]
    pub message: String,
    /// Ludii index of the addressed player (1 or 2).
    pub recipient: u8,
}

/// A decoded `mover=1|2` move entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    #[allow(missing_docs)]
    pub mover: Player,
    #[allow(missing_docs)]
    pub mv: Move,
    /// The entry carried a `Remove:` or `CapturedPiece` marker.
    pub captures: bool,
    #[allow(missing_docs)]
    pub notes: Vec<UmpireNote>,
}

/// Payload of one logged entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Initial placement of a piece (`mover=0`).
    Setup {
        #[allow(missing_docs)]
        square: Square,
        #[allow(missing_docs)]
        piece: Piece,
    },
    /// A move the simulator accepted.
    Move(MoveRecord),
    /// An attempt the simulator rejected (`Illegal move`). The coordinates
    /// are recovered when the entry still carries them.
    Rejected {
        #[allow(missing_docs)]
        mover: Option<Player>,
        #[allow(missing_docs)]
        from: Option<Square>,
        #[allow(missing_docs)]
        to: Option<Square>,
    },
}

/// One logged entry of the trial, immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggedAction {
    /// 0-based position among the trial's `Move=` entries.
    pub turn_index: usize,
    /// The raw logged line, kept for error reports and the debug trace.
    pub raw: String,
    #[allow(missing_docs)]
    pub kind: ActionKind,
}

impl LoggedAction {
    /// Whether the simulator accepted this entry.
    #[must_use]
    pub const fn is_legal(&self) -> bool {
        !matches!(self.kind, ActionKind::Rejected { .. })
    }

    /// Whether this entry is an initial placement rather than a move.
    #[must_use]
    pub const fn is_setup(&self) -> bool {
        matches!(self.kind, ActionKind::Setup { .. })
    }
}

/// A fully decoded trial log.
#[derive(Clone, Debug)]
pub struct Trial {
    #[allow(missing_docs)]
    pub variant: Variant,
    #[allow(missing_docs)]
    pub result: GameResult,
    /// All logged entries in simulator order.
    pub actions: Vec<LoggedAction>,
}

impl Trial {
    /// Decodes the full text of a `.trl` file.
    ///
    /// # Errors
    ///
    /// [`ConversionError::UnsupportedVariant`] when the `game=` header names
    /// an unknown game (checked before any move parsing), and
    /// [`ConversionError::MalformedTrial`] for lines that match no known
    /// entry shape or `Move=` entries that cannot be decoded.
    pub fn parse(content: &str) -> Result<Self, ConversionError> {
        let mut lines = content.lines().enumerate().map(|(index, line)| (index + 1, line.trim_end()));

        let variant = match lines.by_ref().find(|(_, line)| !line.is_empty()) {
            Some((_, header)) if header.starts_with("game=") => Variant::try_from(header)?,
            Some((number, text)) => {
                return Err(ConversionError::MalformedTrial {
                    line: number,
                    text: format!("expected a game= header, got: {text}"),
                })
            },
            None => {
                return Err(ConversionError::MalformedTrial {
                    line: 1,
                    text: "empty trial".to_owned(),
                })
            },
        };

        let mut result = GameResult::Unknown;
        let mut actions: Vec<LoggedAction> = Vec::new();
        for (number, line) in lines {
            if line.is_empty() {
                continue;
            }
            if let Some(entry) = line.strip_prefix("Move=") {
                let kind = decode_entry(entry).ok_or_else(|| ConversionError::MalformedTrial {
                    line: number,
                    text: line.to_owned(),
                })?;
                push_action(&mut actions, line, kind);
            } else if let Some(winner) = line.strip_prefix("winner=") {
                result = decode_winner(winner).ok_or_else(|| ConversionError::MalformedTrial {
                    line: number,
                    text: line.to_owned(),
                })?;
            } else if line.contains('=') {
                // Engine metadata (RNG state, rankings, timings).
            } else {
                return Err(ConversionError::MalformedTrial {
                    line: number,
                    text: line.to_owned(),
                });
            }
        }

        Ok(Self {
            variant,
            result,
            actions,
        })
    }
}

/// Appends a decoded entry, folding promotion continuations into the move
/// they complete. The simulator logs a promotion as a second entry on the
/// same square (`from` equal to `to`, with a `Promote:` payload) right
/// after the pawn's arrival.
fn push_action(actions: &mut Vec<LoggedAction>, raw: &str, kind: ActionKind) {
    if let ActionKind::Move(ref record) = kind {
        if record.mv.from == record.mv.to && record.mv.promotion.is_some() {
            if let Some(LoggedAction {
                kind: ActionKind::Move(previous),
                ..
            }) = actions.last_mut()
            {
                if previous.mover == record.mover && previous.mv.to == record.mv.from {
                    previous.mv.promotion = record.mv.promotion;
                    previous.captures |= record.captures;
                    previous.notes.extend(record.notes.iter().cloned());
                    return;
                }
            }
        }
    }
    actions.push(LoggedAction {
        turn_index: actions.len(),
        raw: raw.to_owned(),
        kind,
    });
}

fn decode_winner(value: &str) -> Option<GameResult> {
    match value.trim().parse::<u8>().ok()? {
        0 => Some(GameResult::Draw),
        1 => Some(GameResult::WhiteWins),
        2 => Some(GameResult::BlackWins),
        _ => None,
    }
}

fn decode_entry(entry: &str) -> Option<ActionKind> {
    if entry.contains("Illegal move") {
        let mover = field(entry, "mover=").and_then(|index| Player::from_mover(index).ok());
        let from = field(entry, "from=").and_then(|index| Square::try_from(index).ok());
        let to = field(entry, "to=").and_then(|index| Square::try_from(index).ok());
        return Some(ActionKind::Rejected { mover, from, to });
    }

    let mover = field(entry, "mover=")?;
    let to = Square::try_from(field(entry, "to=")?).ok()?;
    if mover == 0 {
        let piece = Piece::from_ludii_code(field(entry, "what=")?).ok()?;
        return Some(ActionKind::Setup { square: to, piece });
    }

    let mover = Player::from_mover(mover).ok()?;
    let from = Square::try_from(field(entry, "from=")?).ok()?;
    let promotion = match entry.split_once("Promote:") {
        Some((_, tail)) => {
            let kind = Piece::from_ludii_code(field(tail, "what=")?).ok()?.kind;
            Some(Promotion::try_from(kind).ok()?)
        },
        None => None,
    };
    let captures = entry.contains("Remove:") || entry.contains("CapturedPiece");
    Some(ActionKind::Move(MoveRecord {
        mover,
        mv: Move::new(from, to, promotion),
        captures,
        notes: decode_notes(entry),
    }))
}

/// Scans `[Note:message=...,to=N]` segments out of a move entry.
fn decode_notes(entry: &str) -> Vec<UmpireNote> {
    let mut notes = Vec::new();
    let mut rest = entry;
    while let Some((_, tail)) = rest.split_once("[Note:message=") {
        rest = tail;
        let Some((message, recipient_tail)) = tail.split_once(",to=") else {
            break;
        };
        let Some((recipient, after)) = recipient_tail.split_once(']') else {
            break;
        };
        if let Ok(recipient) = recipient.parse::<u8>() {
            notes.push(UmpireNote {
                message: message.to_owned(),
                recipient,
            });
        }
        rest = after;
    }
    notes
}

/// Reads the unsigned number following the first occurrence of `key`.
fn field(entry: &str, key: &str) -> Option<u8> {
    let (_, tail) = entry.split_once(key)?;
    let digits: &str = &tail[..tail.bytes().take_while(u8::is_ascii_digit).count()];
    digits.parse().ok()
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chess::core::{PieceKind, Player};

    const CHESS_HEADER: &str = "game=/lud/board/war/replacement/checkmate/chess/Chess.lud";
    const KRIEGSPIEL_HEADER: &str =
        "game=/lud/board/war/replacement/checkmate/chess/Kriegspiel (Chess).lud";

    #[test]
    fn header_selects_variant() {
        let trial = Trial::parse(CHESS_HEADER).unwrap();
        assert_eq!(trial.variant, Variant::Standard);
        assert_eq!(trial.result, GameResult::Unknown);

        let trial = Trial::parse(KRIEGSPIEL_HEADER).unwrap();
        assert_eq!(trial.variant, Variant::Kriegspiel);
    }

    #[test]
    fn unknown_game_is_rejected_before_moves() {
        let content = "game=/lud/board/war/replacement/checkmate/chess/Shogi.lud\nnonsense line";
        match Trial::parse(content) {
            Err(ConversionError::UnsupportedVariant(game)) => {
                assert!(game.contains("Shogi.lud"));
            },
            other => panic!("expected UnsupportedVariant, got {other:?}"),
        }
    }

    #[test]
    fn setup_and_moves() {
        let content = format!(
            "{CHESS_HEADER}\n\
             Move=[Move:mover=0,to=4,what=5]\n\
             Move=[Move:mover=1,from=12,to=28]\n\
             Move=[Move:mover=2,from=52,to=36]\n\
             winner=1\n"
        );
        let trial = Trial::parse(&content).unwrap();
        assert_eq!(trial.result, GameResult::WhiteWins);
        assert_eq!(trial.actions.len(), 3);
        assert_eq!(
            trial.actions[0].kind,
            ActionKind::Setup {
                square: Square::E1,
                piece: Piece::new(Player::White, PieceKind::King),
            }
        );
        assert!(trial.actions[0].is_setup());
        assert_eq!(
            trial.actions[1].kind,
            ActionKind::Move(MoveRecord {
                mover: Player::White,
                mv: Move::new(Square::E2, Square::E4, None),
                captures: false,
                notes: vec![],
            })
        );
        assert_eq!(trial.actions[2].turn_index, 2);
    }

    #[test]
    fn capture_markers_and_notes() {
        let content = format!(
            "{KRIEGSPIEL_HEADER}\n\
             Move=[Move:mover=1,from=28,to=35,Remove:35,[Note:message=Capture at d5,to=1],[Note:message=Capture at d5,to=2]]\n"
        );
        let trial = Trial::parse(&content).unwrap();
        let ActionKind::Move(record) = &trial.actions[0].kind else {
            panic!("expected a move");
        };
        assert!(record.captures);
        assert_eq!(
            record.notes,
            vec![
                UmpireNote {
                    message: "Capture at d5".to_owned(),
                    recipient: 1,
                },
                UmpireNote {
                    message: "Capture at d5".to_owned(),
                    recipient: 2,
                },
            ]
        );
    }

    #[test]
    fn illegal_attempt_is_rejected_kind() {
        let content = format!(
            "{KRIEGSPIEL_HEADER}\n\
             Move=[Move:Illegal move,mover=2,from=51,to=35]\n\
             Move=[Move:mover=2,from=52,to=44]\n"
        );
        let trial = Trial::parse(&content).unwrap();
        assert!(!trial.actions[0].is_legal());
        assert_eq!(
            trial.actions[0].kind,
            ActionKind::Rejected {
                mover: Some(Player::Black),
                from: Some(Square::D7),
                to: Some(Square::D5),
            }
        );
        assert!(trial.actions[1].is_legal());
    }

    #[test]
    fn promotion_continuation_is_folded() {
        let content = format!(
            "{CHESS_HEADER}\n\
             Move=[Move:mover=1,from=55,to=62,Remove:62]\n\
             Move=[Move:mover=1,from=62,to=62,Promote:what=11]\n"
        );
        let trial = Trial::parse(&content).unwrap();
        assert_eq!(trial.actions.len(), 1);
        let ActionKind::Move(record) = &trial.actions[0].kind else {
            panic!("expected a move");
        };
        assert_eq!(record.mv, Move::new(Square::H7, Square::G8, Some(Promotion::Queen)));
        assert!(record.captures);
    }

    #[test]
    fn inline_promotion() {
        let content = format!(
            "{CHESS_HEADER}\n\
             Move=[Move:mover=1,from=52,to=60,Promote:to=60,what=11]\n"
        );
        let trial = Trial::parse(&content).unwrap();
        let ActionKind::Move(record) = &trial.actions[0].kind else {
            panic!("expected a move");
        };
        assert_eq!(record.mv.promotion, Some(Promotion::Queen));
    }

    #[test]
    fn metadata_lines_are_skipped() {
        let content = format!("{CHESS_HEADER}\nRNG internal state=93,12,-5\nrankings=0.0,1.0,2.0\n");
        let trial = Trial::parse(&content).unwrap();
        assert!(trial.actions.is_empty());
    }

    #[test]
    fn unrecognized_line_is_malformed() {
        let content = format!("{CHESS_HEADER}\nthis is not a trial line\n");
        match Trial::parse(&content) {
            Err(ConversionError::MalformedTrial { line, text }) => {
                assert_eq!(line, 2);
                assert_eq!(text, "this is not a trial line");
            },
            other => panic!("expected MalformedTrial, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_move_entry_is_malformed() {
        let content = format!("{CHESS_HEADER}\nMove=[Move:mover=1,to=28]\n");
        match Trial::parse(&content) {
            Err(ConversionError::MalformedTrial { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedTrial, got {other:?}"),
        }
    }

    #[test]
    fn winner_mapping() {
        for (winner, result) in [
            ("winner=0", GameResult::Draw),
            ("winner=1", GameResult::WhiteWins),
            ("winner=2", GameResult::BlackWins),
        ] {
            let content = format!("{CHESS_HEADER}\n{winner}\n");
            assert_eq!(Trial::parse(&content).unwrap().result, result);
        }
    }
}
