//! The conversion pipeline: parse a trial, replay it through the board
//! tracker under the variant's inclusion policy, and assemble the PGN
//! document plus the optional debug trace.

use log::warn;

use crate::chess::core::Player;
use crate::chess::position::Position;
use crate::error::ConversionError;
use crate::pgn::san::san;
use crate::pgn::transcript::{self, AnnotatedMove, DebugTrace, Headers};
use crate::trial::parser::{ActionKind, GameResult, Trial};
use crate::trial::variant::{Variant, Verdict};

/// Output of one conversion.
#[derive(Debug)]
pub struct Conversion {
    /// The PGN document.
    pub pgn: String,
    /// The debug trace, present when the converter was built with
    /// [`Converter::with_debug`].
    pub debug: Option<String>,
    #[allow(missing_docs)]
    pub variant: Variant,
    #[allow(missing_docs)]
    pub result: GameResult,
}

/// Converts trial logs to PGN. Holds the header metadata shared by the
/// emitted games; one [`Converter`] can process any number of trials, each
/// conversion replays its own board.
#[derive(Clone, Debug)]
pub struct Converter {
    event: String,
    date: String,
    white: String,
    black: String,
    debug_enabled: bool,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// Creates a converter with the same defaults the interactive original
    /// front end fell back to: unnamed event, unknown date, numbered
    /// players.
    #[must_use]
    pub fn new() -> Self {
        Self {
            event: "?".to_owned(),
            date: "????.??.??".to_owned(),
            white: "Player 1".to_owned(),
            black: "Player 2".to_owned(),
            debug_enabled: false,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Sets the `Date` tag, expected in the PGN `YYYY.MM.DD` form.
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_players(mut self, white: impl Into<String>, black: impl Into<String>) -> Self {
        self.white = white.into();
        self.black = black.into();
        self
    }

    /// Enables collection of the debug trace alongside the PGN.
    #[must_use]
    pub const fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_enabled = enabled;
        self
    }

    /// Runs the full pipeline on the text of one `.trl` file.
    ///
    /// # Errors
    ///
    /// Any [`ConversionError`]: unsupported `game=` header, malformed
    /// lines, or a logged move that cannot be replayed.
    pub fn convert(&self, content: &str) -> Result<Conversion, ConversionError> {
        let trial = Trial::parse(content)?;
        let policy = trial.variant.policy();

        let mut position = Position::starting();
        let mut trace = DebugTrace::new();
        let mut moves: Vec<AnnotatedMove> = Vec::new();
        // Index into `moves`, mover and check flag of the last emitted
        // move, for the terminal mate upgrade.
        let mut last_emitted: Option<(usize, Player, bool)> = None;

        for action in &trial.actions {
            match policy.verdict(action) {
                Verdict::Skip(reason) => {
                    trace.entry(action.turn_index, &action.raw, &format!("skipped ({reason})"));
                    if let ActionKind::Setup { square, piece } = action.kind {
                        if !position.place(square, piece) {
                            warn!("setup places {piece} on {square}, deviating from the standard initial position");
                            trace.note(&format!(
                                "setup placement {piece} on {square} deviates from the standard initial position"
                            ));
                        }
                    }
                },
                Verdict::Emit => {
                    let ActionKind::Move(record) = &action.kind else {
                        // Policies only emit move entries.
                        continue;
                    };
                    let before = position.clone();
                    let effect = position.apply(record.mover, record.mv).map_err(|source| {
                        ConversionError::IllegalStateTransition {
                            turn: action.turn_index,
                            action: source.to_string(),
                        }
                    })?;
                    let notation = san(&before, record.mv, &effect);
                    let comment = policy.annotates().then(|| {
                        let pawn_tries = position.pawn_tries(record.mover.opponent());
                        transcript::umpire_comment(&effect, &record.notes, pawn_tries)
                    });
                    trace.entry(
                        action.turn_index,
                        &action.raw,
                        &format!("emitted as \"{notation}\""),
                    );
                    last_emitted = Some((moves.len(), record.mover, effect.gives_check));
                    moves.push(AnnotatedMove { notation, comment });
                },
            }
        }

        upgrade_terminal_check(&trial, last_emitted, &mut moves, &mut trace);

        let headers = Headers {
            event: self.event.clone(),
            date: self.date.clone(),
            white: self.white.clone(),
            black: self.black.clone(),
        };
        let pgn = transcript::render(&headers, trial.variant, trial.result, &moves);
        Ok(Conversion {
            pgn,
            debug: self.debug_enabled.then(|| trace.render()),
            variant: trial.variant,
            result: trial.result,
        })
    }

}

/// Rewrites the final move's `+` into `#` when the trial shows the game
/// ended on that check: an explicit `winner=` marker for the moving side
/// is authoritative; a trial that simply stops after a check is treated
/// as mate too, but flagged in the trace since the log does not say so.
fn upgrade_terminal_check(
    trial: &Trial,
    last_emitted: Option<(usize, Player, bool)>,
    moves: &mut [AnnotatedMove],
    trace: &mut DebugTrace,
) {
    let Some((index, mover, gives_check)) = last_emitted else {
        return;
    };
    if !gives_check {
        return;
    }
    let mate = match trial.result {
        GameResult::WhiteWins | GameResult::BlackWins => trial.result.winner() == Some(mover),
        GameResult::Unknown => {
            trace.note("ambiguous ending: final check treated as mate without a winner marker");
            true
        },
        GameResult::Draw => false,
    };
    if mate {
        let notation = &mut moves[index].notation;
        if notation.ends_with('+') {
            notation.pop();
            notation.push('#');
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    const CHESS_HEADER: &str = "game=/lud/board/war/replacement/checkmate/chess/Chess.lud";

    fn trial_of(moves: &[&str]) -> String {
        let mut content = format!("{CHESS_HEADER}\n");
        for mv in moves {
            content.push_str(&format!("Move=[Move:{mv}]\n"));
        }
        content
    }

    #[test]
    fn four_opening_moves() {
        // e2e4 e7e5 Nb1c3 Nb8c6
        let content = trial_of(&[
            "mover=1,from=12,to=28",
            "mover=2,from=52,to=36",
            "mover=1,from=1,to=18",
            "mover=2,from=57,to=42",
        ]);
        let conversion = Converter::new().convert(&content).unwrap();
        assert!(conversion.pgn.contains("1. e4 e5\n2. Nc3 Nc6\n*"));
        assert_eq!(conversion.debug, None);
    }

    #[test]
    fn corrupt_move_is_an_illegal_state_transition() {
        let content = trial_of(&["mover=1,from=28,to=36"]);
        match Converter::new().convert(&content) {
            Err(ConversionError::IllegalStateTransition { turn, action }) => {
                assert_eq!(turn, 0);
                assert!(action.contains("no piece on e4"));
            },
            other => panic!("expected IllegalStateTransition, got {other:?}"),
        }
    }

    #[test]
    fn debug_trace_is_opt_in() {
        let content = trial_of(&["mover=1,from=12,to=28"]);
        let conversion = Converter::new().with_debug(true).convert(&content).unwrap();
        let debug = conversion.debug.unwrap();
        assert!(debug.contains("emitted as \"e4\""));
    }
}
