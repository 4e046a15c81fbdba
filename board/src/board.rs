//! [`Board`] holds one position's complete state: piece placement, side to
//! move, castling rights, en passant target, and the two move-clocks. It
//! deliberately does not track history (repetitions, prior positions) —
//! that lives above this crate, in the search driver.

use crate::bitboard::Bitboard;
use crate::constants::{DARK_SQUARES, LIGHT_SQUARES, RANKS};
use crate::movegen::castling::CastlingRights;
use crate::movegen::lookups::BETWEEN;
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;
use colored::Colorize;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Board {
    pub current: Color,

    /// Squares occupied by each piece type, regardless of color.
    pub piece_bbs: [Bitboard; PieceType::COUNT],

    /// Squares occupied by each side.
    pub occupied_squares: [Bitboard; Color::COUNT],

    /// Piece-by-square lookup; redundant with `piece_bbs`/`occupied_squares`
    /// but cheaper than scanning bitboards for single-square queries.
    pub piece_list: [Option<Piece>; Square::COUNT],

    pub castling_rights: CastlingRights,

    /// Target square of the last double pawn push, if any.
    pub en_passant: Option<Square>,

    /// Plies since the last capture or pawn push, for the fifty-move rule.
    pub half_moves: u8,

    /// Full-move counter, incremented after Black's move.
    pub full_moves: u16,

    /// Pieces pinned to their king, indexed by the pinned side.
    pub pinrays: [Bitboard; Color::COUNT],

    /// Pieces currently giving check to the side to move.
    pub checkers: Bitboard,

    /// Squares the opponent attacks, with the side-to-move's king removed
    /// from the blocker set (so a king can't "hide behind itself").
    pub threats: Bitboard,
}

impl Board {
    pub fn new(
        piece_list: [Option<Piece>; 64],
        piece_bbs: [Bitboard; 6],
        occupied_squares: [Bitboard; 2],
        current: Color,
        castling_rights: CastlingRights,
        en_passant: Option<Square>,
        half_moves: u8,
        full_moves: u16,
    ) -> Self {
        let mut board = Self {
            piece_list,
            piece_bbs,
            occupied_squares,
            current,
            castling_rights,
            en_passant,
            half_moves,
            full_moves,
            pinrays: [Bitboard::EMPTY; 2],
            checkers: Bitboard::EMPTY,
            threats: Bitboard::EMPTY,
        };

        board.pinrays = [
            board.compute_pinrays(Color::White),
            board.compute_pinrays(Color::Black),
        ];
        board.checkers = board.compute_checkers(current);
        board.threats = board.king_threats();

        board
    }

    pub fn occupied_by(&self, side: Color) -> Bitboard {
        self.occupied_squares[side]
    }

    pub fn all_occupied(&self) -> Bitboard {
        self.occupied_squares.into_iter().collect()
    }

    pub fn get_bb(&self, ptype: PieceType, color: Color) -> Bitboard {
        self.piece_bbs[ptype] & self.occupied_by(color)
    }

    pub fn get_at(&self, square: Square) -> Option<Piece> {
        self.piece_list[square]
    }

    /// # Panics
    /// Panics if `square` is already occupied.
    pub fn add_at(&mut self, square: Square, piece: Piece) {
        self.piece_list[square] = Some(piece);

        let bb: Bitboard = square.into();
        self.occupied_squares[piece.color()] |= bb;
        self.piece_bbs[piece.piece_type()] |= bb;
    }

    pub fn remove_at(&mut self, square: Square) -> Option<Piece> {
        let piece = self.piece_list[square]?;
        self.piece_list[square] = None;

        let bb: Bitboard = square.into();
        self.occupied_squares[piece.color()] &= !bb;
        self.piece_bbs[piece.piece_type()] &= !bb;

        Some(piece)
    }

    pub fn pawns(&self, side: Color) -> Bitboard {
        self.piece_bbs[PieceType::Pawn] & self.occupied_by(side)
    }

    pub fn knights(&self, side: Color) -> Bitboard {
        self.piece_bbs[PieceType::Knight] & self.occupied_by(side)
    }

    pub fn bishops(&self, side: Color) -> Bitboard {
        self.piece_bbs[PieceType::Bishop] & self.occupied_by(side)
    }

    pub fn rooks(&self, side: Color) -> Bitboard {
        self.piece_bbs[PieceType::Rook] & self.occupied_by(side)
    }

    pub fn queens(&self, side: Color) -> Bitboard {
        self.piece_bbs[PieceType::Queen] & self.occupied_by(side)
    }

    pub fn kings(&self, side: Color) -> Bitboard {
        self.piece_bbs[PieceType::King] & self.occupied_by(side)
    }

    pub fn diag_sliders(&self, side: Color) -> Bitboard {
        self.bishops(side) | self.queens(side)
    }

    pub fn hv_sliders(&self, side: Color) -> Bitboard {
        self.rooks(side) | self.queens(side)
    }

    /// All of `side`'s non-pawn, non-king pieces.
    pub fn pieces(&self, side: Color) -> Bitboard {
        self.knights(side) | self.bishops(side) | self.rooks(side) | self.queens(side)
    }

    pub fn get_pinrays(&self, us: Color) -> Bitboard {
        self.pinrays[us]
    }

    pub fn get_checkers(&self) -> Bitboard {
        self.checkers
    }

    pub fn get_threats(&self) -> Bitboard {
        self.threats
    }

    pub fn get_promo_rank(&self) -> Bitboard {
        if self.current.is_white() {
            RANKS[7]
        } else {
            RANKS[0]
        }
    }
}

impl Board {
    /// Squares unsafe for the side-to-move's king, computed with that king
    /// removed from the blocker set so sliding attacks through it still
    /// count (a king can't step back along the same checking ray).
    pub fn king_threats(&self) -> Bitboard {
        let us = self.current;
        let them = !us;
        let ours = self.occupied_by(us) & !self.kings(us);
        let theirs = self.occupied_by(them);
        let blockers = ours | theirs;

        let mut attacked = self.pawn_attacks(them);

        for square in self.knights(them) {
            attacked |= square.knight_squares();
        }
        for square in self.bishops(them) {
            attacked |= square.bishop_squares(blockers);
        }
        for square in self.rooks(them) {
            attacked |= square.rook_squares(blockers);
        }
        for square in self.queens(them) {
            attacked |= square.queen_squares(blockers);
        }
        for square in self.kings(them) {
            attacked |= square.king_squares();
        }

        attacked
    }

    pub fn pawn_attacks(&self, us: Color) -> Bitboard {
        let pawns = self.pawns(us);

        if us.is_white() {
            pawns.forward::<true>().left() | pawns.forward::<true>().right()
        } else {
            pawns.forward::<false>().left() | pawns.forward::<false>().right()
        }
    }

    /// Pieces giving check to `us`'s king right now.
    pub fn compute_checkers(&self, us: Color) -> Bitboard {
        self.xray_checkers(us, Bitboard::EMPTY)
    }

    /// Pieces that would give check to `us`'s king if `invisible` were
    /// removed from the board first — used to see "through" a piece about
    /// to move, e.g. when checking whether moving it exposes a check.
    pub fn xray_checkers(&self, us: Color, invisible: Bitboard) -> Bitboard {
        let them = !us;
        let ours_visible = self.occupied_by(us) & !invisible;
        let theirs_visible = self.occupied_by(them) & !invisible;
        let blockers = ours_visible | theirs_visible;
        let our_king = self.kings(us).first();

        (self.pawns(them) & our_king.pawn_attacks(us) & theirs_visible)
            | (self.knights(them) & our_king.knight_squares())
            | (self.bishops(them) & our_king.bishop_squares(blockers))
            | (self.rooks(them) & our_king.rook_squares(blockers))
            | (self.queens(them) & our_king.queen_squares(blockers))
    }

    /// Every piece, either side, currently attacking `square`.
    pub fn attackers(&self, square: Square, blockers: Bitboard) -> Bitboard {
        use Color::*;
        use PieceType::*;

        (square.pawn_attacks(Black) & self.pawns(White))
            | (square.pawn_attacks(White) & self.pawns(Black))
            | (square.knight_squares() & self.piece_bbs[Knight])
            | (square.bishop_squares(blockers) & self.piece_bbs[Bishop])
            | (square.rook_squares(blockers) & self.piece_bbs[Rook])
            | (square.queen_squares(blockers) & self.piece_bbs[Queen])
    }

    /// Rays pinning one of `us`'s pieces to `us`'s king.
    ///
    /// Computed by finding which of the opponent's sliders would check the
    /// king with all of `us`'s pieces removed, then checking whether the
    /// ray between slider and king contains exactly one of `us`'s pieces —
    /// if so, that lone piece is pinned (it must be ours, since otherwise
    /// the king would already be in check).
    pub fn compute_pinrays(&self, us: Color) -> Bitboard {
        let them = !us;
        let king_sq = self.kings(us).first();

        let ours = self.occupied_by(us);
        let theirs = self.occupied_by(them);
        let diag_sliders = self.diag_sliders(them);
        let hv_sliders = self.hv_sliders(them);

        let potential_pinners =
            king_sq.rook_squares(theirs) & hv_sliders | king_sq.bishop_squares(theirs) & diag_sliders;

        let mut pinrays = Bitboard::EMPTY;

        for pinner in potential_pinners {
            let mut ray = BETWEEN[pinner][king_sq];
            ray |= Bitboard::from(pinner);

            if (ray & ours).count() == 1 {
                pinrays |= ray;
            }
        }

        pinrays
    }
}

impl Board {
    pub fn in_check(&self) -> bool {
        !self.get_checkers().is_empty()
    }

    /// Rule-based draws: the fifty-move rule and insufficient material.
    /// Stalemate is deliberately excluded — detecting it requires a legal
    /// move generation pass, which callers already do separately.
    pub fn is_rule_draw(&self) -> bool {
        self.half_moves >= 100 || self.insufficient_material()
    }

    pub fn insufficient_material(&self) -> bool {
        use PieceType::*;

        if !self.piece_bbs[Pawn].is_empty() {
            return false;
        }

        let occupied = self.all_occupied();
        let num_pieces = occupied.count();
        let kings = self.piece_bbs[King];

        if num_pieces > 4 {
            return false;
        }
        if num_pieces == 2 {
            return true;
        }

        let minors = self.piece_bbs[Knight] | self.piece_bbs[Bishop];
        if occupied == kings | minors && minors.count() == 1 {
            return true;
        }

        let bishops = self.piece_bbs[Bishop];
        if occupied == kings | (bishops & LIGHT_SQUARES) || occupied == kings | (bishops & DARK_SQUARES) {
            return true;
        }

        false
    }

    /// Rough zugzwang heuristic used to gate null-move pruning: if the side
    /// to move has anything besides pawns and its king, zugzwang is
    /// considered unlikely enough to risk a null move.
    pub fn zugzwang_unlikely(&self) -> bool {
        let us = self.current;
        self.occupied_by(us) != self.pawns(us) | self.kings(us)
    }
}

impl FromStr for Board {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        Board::from_fen(value)
    }
}

/// One checkerboard-shaded padding row above/below a rank of pieces, used
/// by `Display` to pad pieces out to a roughly square glyph.
fn blank_line(rank: usize) -> String {
    let mut line = String::from("  \u{2551}");

    for file in 0..8 {
        let square = "     ";
        if (rank + file) % 2 == 0 {
            line.push_str(&square.on_white().to_string());
        } else {
            line.push_str(&square.on_black().to_string());
        }
    }

    line.push_str("\u{2551} ");
    line
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header = "     a    b    c    d    e    f    g    h   ";
        let mut lines = vec![header.to_string(), "  \u{2554}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2557}".to_string()];

        for (rank, squares) in Square::RANKS.into_iter().enumerate() {
            lines.push(blank_line(rank));

            let mut row = format!("{} \u{2551}", 8 - rank);
            for (file, sq) in squares.into_iter().enumerate() {
                let glyph = match self.get_at(sq) {
                    Some(piece) => format!("  {piece}  "),
                    None => "     ".to_string(),
                };

                let shaded = if (rank + file) % 2 == 0 {
                    glyph.black().on_white()
                } else {
                    glyph.white().on_black()
                };

                row.push_str(&shaded.to_string());
            }
            row.push_str(&format!("\u{2551} {}", 8 - rank));
            lines.push(row);

            lines.push(blank_line(rank));
        }

        lines.push("  \u{255a}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{255d}".to_string());
        lines.push(header.to_string());

        write!(f, "{}", lines.join("\n"))
    }
}

impl Board {
    /// The same position with every piece flipped to the opposite color
    /// and reflected top-to-bottom — used by the evaluator's symmetry
    /// tests to check that scoring a position and its mirror agree.
    pub fn mirror(&self) -> Self {
        let mut piece_bbs = [Bitboard::EMPTY; PieceType::COUNT];
        let mut occupied_squares = [Bitboard::EMPTY; Color::COUNT];
        let mut piece_list = [None; Square::COUNT];

        for (idx, &piece) in self.piece_list.iter().enumerate() {
            if let Some(piece) = piece {
                let square = Square::from(idx).flip();
                let bb = Bitboard::from(square);
                let mirrored = piece.mirror();

                piece_list[square] = Some(mirrored);
                piece_bbs[mirrored.piece_type()] |= bb;
                occupied_squares[mirrored.color()] |= bb;
            }
        }

        Self::new(
            piece_list,
            piece_bbs,
            occupied_squares,
            self.current.opp(),
            self.castling_rights.mirror(),
            self.en_passant.map(|ep| ep.flip()),
            self.half_moves,
            self.full_moves,
        )
    }
}

impl Board {
    /// Per-piece-type weight used to estimate how far into the game a
    /// position is. Sums to 24 with a full set of non-pawn material.
    const GAME_PHASE_VALUES: [u8; PieceType::COUNT] = [0, 1, 1, 2, 4, 0];

    /// Remaining material on a 0 (bare-kings endgame) to 24 (full set) scale.
    pub fn phase(&self) -> u8 {
        self.piece_list
            .iter()
            .flatten()
            .map(|&piece| Self::GAME_PHASE_VALUES[piece.piece_type()])
            .sum()
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attackers_finds_all_pieces_eyeing_a_square() {
        use Square::*;
        // kiwipete
        let board: Board = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
            .parse()
            .unwrap();

        let attackers = board.attackers(G4, board.all_occupied());
        let expected = [F3, E5, F6].into_iter().map(Bitboard::from).collect();
        assert_eq!(attackers, expected);

        let attackers = board.attackers(D5, board.all_occupied());
        let expected = [C3, E4, B6, E6, F6].into_iter().map(Bitboard::from).collect();
        assert_eq!(attackers, expected);
    }

    #[test]
    fn mirror_is_its_own_inverse() {
        let board = Board::default();
        assert_eq!(board.mirror().mirror(), board);
    }

    #[test]
    fn insufficient_material_detects_bare_kings() {
        let board: Board = "8/8/4k3/8/8/3K4/8/8 w - - 0 1".parse().unwrap();
        assert!(board.insufficient_material());
    }

    #[test]
    fn phase_is_full_in_starting_position() {
        assert_eq!(Board::default().phase(), 24);
    }
}
