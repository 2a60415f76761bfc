//! Square-centric [`Position`] implementation tracking the board state of a
//! replayed trial: pieces, side to move, castling rights and the en passant
//! target.
//!
//! Unlike an engine, the tracker never generates moves. The simulator that
//! produced the log already enforced legality, so [`Position::apply`] only
//! resolves what a logged move did (capture, castle, en passant, promotion)
//! and answers the attack/reach queries needed for Standard Algebraic
//! Notation and for Kriegspiel umpire announcements.

use std::fmt;

use anyhow::bail;
use arrayvec::ArrayVec;

use crate::chess::core::{
    CastleRights,
    File,
    Move,
    Piece,
    PieceKind,
    Player,
    Promotion,
    Rank,
    Square,
    BOARD_SIZE,
    BOARD_WIDTH,
};

const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Castling directions, named from White's perspective (short is the h-side
/// O-O, long is the a-side O-O-O).
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastleSide {
    Short,
    Long,
}

/// What a single applied move did to the board, recorded for the notation
/// formatter and the Kriegspiel umpire annotations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppliedEffect {
    /// The piece that moved (before any promotion).
    pub piece: Piece,
    /// The captured piece, if any (including en passant victims).
    pub captured: Option<Piece>,
    /// Square the captured piece stood on. Differs from the destination
    /// only for en passant.
    pub captured_on: Option<Square>,
    /// Set when the move was a castle.
    pub castle: Option<CastleSide>,
    /// Set when the capture was en passant.
    pub en_passant: bool,
    #[allow(missing_docs)]
    pub promotion: Option<Promotion>,
    /// Whether the move leaves the opponent's king attacked.
    pub gives_check: bool,
}

/// State of the tracked game: board, side to move, castling rights, move
/// counters. Forward-only; one owned instance per conversion.
///
/// ```
/// use trl2pgn::chess::position::Position;
///
/// assert_eq!(
///     &Position::starting().to_string(),
///     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
/// );
/// ```
#[derive(Clone)]
pub struct Position {
    board: [Option<Piece>; BOARD_SIZE as usize],
    side_to_move: Player,
    castling: CastleRights,
    en_passant_square: Option<Square>,
    halfmove_clock: u8,
    fullmove_counter: u16,
}

impl Position {
    /// Creates the starting position of the standard chess variant.
    #[must_use]
    pub fn starting() -> Self {
        const BACKRANK: [PieceKind; BOARD_WIDTH as usize] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut board = [None; BOARD_SIZE as usize];
        for (file, &kind) in BACKRANK.iter().enumerate() {
            let file = file as u8;
            board[file as usize] = Some(Piece::new(Player::White, kind));
            board[(file + BOARD_WIDTH) as usize] = Some(Piece::new(Player::White, PieceKind::Pawn));
            board[(BOARD_SIZE - BOARD_WIDTH * 2 + file) as usize] =
                Some(Piece::new(Player::Black, PieceKind::Pawn));
            board[(BOARD_SIZE - BOARD_WIDTH + file) as usize] =
                Some(Piece::new(Player::Black, kind));
        }
        Self {
            board,
            side_to_move: Player::White,
            castling: CastleRights::ALL,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_counter: 1,
        }
    }

    /// The piece standing on `square`, if any.
    #[must_use]
    pub fn at(&self, square: Square) -> Option<Piece> {
        self.board[square as usize]
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn us(&self) -> Player {
        self.side_to_move
    }

    /// Places `piece` on `square`, overwriting whatever stood there. Used
    /// for setup entries; returns whether the square already held exactly
    /// that piece, so callers can flag placements that deviate from the
    /// standard initial configuration.
    pub fn place(&mut self, square: Square, piece: Piece) -> bool {
        let matched = self.board[square as usize] == Some(piece);
        self.board[square as usize] = Some(piece);
        matched
    }

    fn king(&self, player: Player) -> Option<Square> {
        let king = Piece::new(player, PieceKind::King);
        self.squares_of(king).into_iter().next()
    }

    fn squares_of(&self, piece: Piece) -> ArrayVec<Square, { BOARD_SIZE as usize }> {
        let mut squares = ArrayVec::new();
        for index in 0..BOARD_SIZE {
            if self.board[index as usize] == Some(piece) {
                // The index is within 0..BOARD_SIZE.
                squares.push(Square::try_from(index).expect("index is a valid square"));
            }
        }
        squares
    }

    /// Replays one logged move of `mover`, mutating the board and the
    /// bookkeeping state.
    ///
    /// # Errors
    ///
    /// If the move cannot be resolved against the current board (empty
    /// origin square, wrong side to move, promotion of a non-pawn, or a
    /// castle with no rook). The simulator only logs legal moves, so any of
    /// these means the trial is corrupt or truncated.
    pub fn apply(&mut self, mover: Player, mv: Move) -> anyhow::Result<AppliedEffect> {
        let Some(piece) = self.at(mv.from) else {
            bail!("no piece on {} to play {mv}", mv.from)
        };
        if piece.owner != mover {
            bail!("{mv} moves a {} piece but the mover is {mover}", piece.owner);
        }
        if mover != self.side_to_move {
            bail!("{mover} played {mv} out of turn");
        }

        let file_delta = mv.to.file() as i8 - mv.from.file() as i8;
        let castle = if piece.kind == PieceKind::King && file_delta.abs() == 2 {
            Some(if file_delta > 0 {
                CastleSide::Short
            } else {
                CastleSide::Long
            })
        } else {
            None
        };

        let en_passant = piece.kind == PieceKind::Pawn
            && file_delta != 0
            && self.at(mv.to).is_none()
            && Some(mv.to) == self.en_passant_square;
        let captured_on = if en_passant {
            Some(Square::new(mv.to.file(), mv.from.rank()))
        } else {
            self.at(mv.to).map(|_| mv.to)
        };
        let captured = captured_on.and_then(|square| self.at(square));
        if let Some(square) = captured_on {
            self.board[square as usize] = None;
        }

        self.board[mv.from as usize] = None;
        self.board[mv.to as usize] = match mv.promotion {
            Some(promotion) => {
                if piece.kind != PieceKind::Pawn {
                    bail!("{mv} promotes but {} is not a pawn", mv.from);
                }
                Some(Piece::new(mover, PieceKind::from(promotion)))
            },
            None => Some(piece),
        };

        if let Some(side) = castle {
            self.relocate_castling_rook(mover, side)?;
        }

        self.update_castling_rights(piece, mv, captured_on);

        let rank_delta = mv.to.rank() as i8 - mv.from.rank() as i8;
        self.en_passant_square = if piece.kind == PieceKind::Pawn && rank_delta.abs() == 2 {
            mv.from.offset(0, mover.push_delta())
        } else {
            None
        };

        if piece.kind == PieceKind::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if mover == Player::Black {
            self.fullmove_counter += 1;
        }
        self.side_to_move = mover.opponent();

        // A missing opponent king can only happen in corrupt logs that
        // somehow still replay; treat it as "no check" rather than failing.
        let gives_check = self
            .king(mover.opponent())
            .is_some_and(|king| self.is_attacked(king, mover));

        Ok(AppliedEffect {
            piece,
            captured,
            captured_on,
            castle,
            en_passant,
            promotion: mv.promotion,
            gives_check,
        })
    }

    fn relocate_castling_rook(&mut self, player: Player, side: CastleSide) -> anyhow::Result<()> {
        let backrank = Rank::backrank(player);
        let (rook_from, rook_to) = match side {
            CastleSide::Short => (Square::new(File::H, backrank), Square::new(File::F, backrank)),
            CastleSide::Long => (Square::new(File::A, backrank), Square::new(File::D, backrank)),
        };
        let rook = Piece::new(player, PieceKind::Rook);
        if self.at(rook_from) != Some(rook) {
            bail!("{player} castles but there is no rook on {rook_from}");
        }
        self.board[rook_from as usize] = None;
        self.board[rook_to as usize] = Some(rook);
        Ok(())
    }

    fn update_castling_rights(&mut self, piece: Piece, mv: Move, captured_on: Option<Square>) {
        let lost = |square: Square| match square {
            Square::E1 => CastleRights::WHITE_BOTH,
            Square::H1 => CastleRights::WHITE_SHORT,
            Square::A1 => CastleRights::WHITE_LONG,
            Square::E8 => CastleRights::BLACK_BOTH,
            Square::H8 => CastleRights::BLACK_SHORT,
            Square::A8 => CastleRights::BLACK_LONG,
            _ => CastleRights::NONE,
        };
        if piece.kind == PieceKind::King {
            self.castling -= match piece.owner {
                Player::White => CastleRights::WHITE_BOTH,
                Player::Black => CastleRights::BLACK_BOTH,
            };
        }
        self.castling -= lost(mv.from);
        if let Some(square) = captured_on {
            self.castling -= lost(square);
        }
    }

    /// Whether `square` is attacked by any piece of `by`.
    #[must_use]
    pub fn is_attacked(&self, square: Square, by: Player) -> bool {
        (0..BOARD_SIZE).any(|index| {
            let from = Square::try_from(index).expect("index is a valid square");
            match self.at(from) {
                Some(piece) if piece.owner == by => self.attacks(from, piece, square),
                _ => false,
            }
        })
    }

    /// Whether the piece on `from` attacks `to`. Pawn attacks are the
    /// diagonal squares regardless of occupancy; sliding pieces respect
    /// blockers.
    fn attacks(&self, from: Square, piece: Piece, to: Square) -> bool {
        let file_delta = to.file() as i8 - from.file() as i8;
        let rank_delta = to.rank() as i8 - from.rank() as i8;
        match piece.kind {
            PieceKind::Pawn => file_delta.abs() == 1 && rank_delta == piece.owner.push_delta(),
            PieceKind::Knight => KNIGHT_JUMPS.contains(&(file_delta, rank_delta)),
            PieceKind::King => file_delta.abs().max(rank_delta.abs()) == 1,
            PieceKind::Rook => {
                (file_delta == 0) != (rank_delta == 0) && self.clear_path(from, to)
            },
            PieceKind::Bishop => {
                file_delta.abs() == rank_delta.abs()
                    && file_delta != 0
                    && self.clear_path(from, to)
            },
            PieceKind::Queen => {
                ((file_delta == 0) != (rank_delta == 0)
                    || (file_delta.abs() == rank_delta.abs() && file_delta != 0))
                    && self.clear_path(from, to)
            },
        }
    }

    /// Whether the piece on `from` could move to `to` under its movement
    /// pattern, with sliding blockers respected. Pins are not considered:
    /// the simulator already established legality, this only has to narrow
    /// down candidates for notation purposes.
    #[must_use]
    pub fn reaches(&self, from: Square, to: Square) -> bool {
        let Some(piece) = self.at(from) else {
            return false;
        };
        if self.at(to).is_some_and(|target| target.owner == piece.owner) {
            return false;
        }
        if piece.kind != PieceKind::Pawn {
            return self.attacks(from, piece, to);
        }
        let file_delta = to.file() as i8 - from.file() as i8;
        let rank_delta = to.rank() as i8 - from.rank() as i8;
        let push = piece.owner.push_delta();
        if file_delta == 0 {
            let single = from.offset(0, push);
            if rank_delta == push {
                return self.at(to).is_none();
            }
            return rank_delta == push * 2
                && from.rank() == Rank::pawns_starting(piece.owner)
                && single.is_some_and(|middle| self.at(middle).is_none())
                && self.at(to).is_none();
        }
        file_delta.abs() == 1
            && rank_delta == push
            && (self.at(to).is_some() || Some(to) == self.en_passant_square)
    }

    /// All intermediate squares between `from` and `to` (exclusive) are
    /// empty. `from` and `to` must be aligned on a rank, file or diagonal.
    fn clear_path(&self, from: Square, to: Square) -> bool {
        let file_step = (to.file() as i8 - from.file() as i8).signum();
        let rank_step = (to.rank() as i8 - from.rank() as i8).signum();
        let mut current = from;
        loop {
            current = match current.offset(file_step, rank_step) {
                Some(next) => next,
                None => return false,
            };
            if current == to {
                return true;
            }
            if self.at(current).is_some() {
                return false;
            }
        }
    }

    /// Other pieces of the same kind and color as the one on `from` that
    /// could also move to `to`. Non-empty result means the move text needs
    /// a file/rank qualifier.
    #[must_use]
    pub fn disambiguators(&self, from: Square, to: Square) -> ArrayVec<Square, 8> {
        let mut others = ArrayVec::new();
        let Some(piece) = self.at(from) else {
            return others;
        };
        for candidate in self.squares_of(piece) {
            if candidate != from && self.reaches(candidate, to) && !others.is_full() {
                others.push(candidate);
            }
        }
        others
    }

    /// Number of pawn-capture attempts (en passant included) available to
    /// `defender`, announced by the Kriegspiel umpire after each move.
    #[must_use]
    pub fn pawn_tries(&self, defender: Player) -> usize {
        let pawn = Piece::new(defender, PieceKind::Pawn);
        let push = defender.push_delta();
        self.squares_of(pawn)
            .into_iter()
            .map(|from| {
                [-1, 1]
                    .into_iter()
                    .filter_map(|file_delta| from.offset(file_delta, push))
                    .filter(|&to| {
                        self.at(to).is_some_and(|target| target.owner != defender)
                            || Some(to) == self.en_passant_square
                    })
                    .count()
            })
            .sum()
    }
}

impl fmt::Display for Position {
    /// Prints the position in [Forsyth-Edwards Notation] (FEN).
    ///
    /// [Forsyth-Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank_index in (0..BOARD_WIDTH).rev() {
            let mut empty = 0;
            for file_index in 0..BOARD_WIDTH {
                let square = Square::try_from(rank_index * BOARD_WIDTH + file_index)
                    .expect("index is a valid square");
                match self.at(square) {
                    Some(piece) => {
                        if empty > 0 {
                            write!(f, "{empty}")?;
                            empty = 0;
                        }
                        write!(f, "{piece}")?;
                    },
                    None => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{empty}")?;
            }
            if rank_index > 0 {
                write!(f, "/")?;
            }
        }
        let side = match self.side_to_move {
            Player::White => 'w',
            Player::Black => 'b',
        };
        write!(f, " {side} {} ", self.castling)?;
        match self.en_passant_square {
            Some(square) => write!(f, "{square}")?,
            None => write!(f, "-")?,
        }
        write!(f, " {} {}", self.halfmove_clock, self.fullmove_counter)
    }
}
