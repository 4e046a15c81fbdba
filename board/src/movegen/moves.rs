//! [`Move`] packs a move's source, target, and special-case metadata
//! (castle, capture, en passant, promotion) into 16 bits so move lists can
//! be generated, sorted, and stored without heap allocation per move.

use crate::bitboard::Bitboard;
use crate::constants::RANKS;
use crate::movegen::attack_boards::{Direction, *};
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;
use anyhow::anyhow;
use itertools::Itertools;
use std::{fmt::Display, str::FromStr};

#[rustfmt::skip]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum MoveType {
    Quiet                 = 0b0000,
    DoublePush            = 0b0001,
    KingCastle            = 0b0010,
    QueenCastle           = 0b0011,
    Capture               = 0b0100,
    EnPassant             = 0b0101,
    KnightPromo           = 0b1000,
    BishopPromo           = 0b1001,
    RookPromo             = 0b1010,
    QueenPromo            = 0b1011,
    KnightPromoCapture    = 0b1100,
    BishopPromoCapture    = 0b1101,
    RookPromoCapture      = 0b1110,
    QueenPromoCapture     = 0b1111,
}

impl MoveType {
    /// Indexed by the raw 4-bit tag read out of a packed [`Move`]. Slots
    /// `0b0110`/`0b0111` are unused tag values and map to `Quiet`.
    const ALL: [MoveType; 16] = [
        MoveType::Quiet,
        MoveType::DoublePush,
        MoveType::KingCastle,
        MoveType::QueenCastle,
        MoveType::Capture,
        MoveType::EnPassant,
        MoveType::Quiet,
        MoveType::Quiet,
        MoveType::KnightPromo,
        MoveType::BishopPromo,
        MoveType::RookPromo,
        MoveType::QueenPromo,
        MoveType::KnightPromoCapture,
        MoveType::BishopPromoCapture,
        MoveType::RookPromoCapture,
        MoveType::QueenPromoCapture,
    ];
}

impl FromStr for MoveType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        use MoveType::*;

        match s {
            "N" | "n" => Ok(KnightPromo),
            "B" | "b" => Ok(BishopPromo),
            "R" | "r" => Ok(RookPromo),
            "Q" | "q" => Ok(QueenPromo),
            _ => Err(anyhow!("Not a valid promotion label")),
        }
    }
}

/// A move, packed into 16 bits: 6 bits source square, 6 bits target square,
/// 4 bits [`MoveType`] tag. The top two tag bits double as cheap
/// is-capture/is-promotion flags without unpacking the whole type.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
pub struct Move(u16);

impl Move {
    const SRC_MASK: u16 = 0b0000_0000_0011_1111;
    const TGT_MASK: u16 = 0b0000_1111_1100_0000;
    const TYPE_MASK: u16 = 0b1111_0000_0000_0000;
    pub const NULL: Move = Move(0);

    pub const fn new(src: Square, tgt: Square, mtype: MoveType) -> Move {
        let mut value = 0u16;
        value |= src as u16;
        value |= (tgt as u16) << 6;
        value |= (mtype as u16) << 12;

        Move(value)
    }

    pub fn src(self) -> Square {
        ((self.0 & Self::SRC_MASK) as usize).into()
    }

    pub fn tgt(self) -> Square {
        (((self.0 & Self::TGT_MASK) >> 6) as usize).into()
    }

    pub fn get_type(self) -> MoveType {
        let idx = (self.0 & Self::TYPE_MASK) >> 12;
        MoveType::ALL[idx as usize]
    }

    pub fn is_quiet(self) -> bool {
        self.get_type() == MoveType::Quiet
    }

    pub fn is_castle(self) -> bool {
        self.get_type() == MoveType::KingCastle || self.get_type() == MoveType::QueenCastle
    }

    pub fn is_double_push(self) -> bool {
        self.get_type() == MoveType::DoublePush
    }

    pub fn is_en_passant(self) -> bool {
        self.get_type() == MoveType::EnPassant
    }

    /// Cheap check against the tag's top bit, rather than matching on
    /// [`Move::get_type`].
    pub fn is_promotion(self) -> bool {
        self.0 & (1 << 15) != 0
    }

    /// Cheap check against the tag's second-highest bit.
    pub fn is_capture(self) -> bool {
        self.0 & (1 << 14) != 0
    }

    /// The square holding the piece this move captures: the target square
    /// for an ordinary capture, or the passed-over pawn's square (same file
    /// as the target, same rank as the source) for en passant.
    pub fn get_capture_sq(self) -> Square {
        if self.is_en_passant() {
            let tgt_file = self.tgt() as usize % 8;
            let src_rank = self.src() as usize / 8;
            Square::try_from_usize(tgt_file + 8 * src_rank).expect("en passant capture square is always valid")
        } else {
            self.tgt()
        }
    }

    /// The square a double push passed over, and that a following en
    /// passant capture would target.
    pub fn get_ep_square(self) -> Option<Square> {
        if self.is_double_push() {
            Some(BETWEEN[self.src() as usize][self.tgt() as usize].first())
        } else {
            None
        }
    }

    pub fn get_promo_type(self) -> Option<PieceType> {
        use MoveType::*;
        use PieceType::*;

        match self.get_type() {
            KnightPromo | KnightPromoCapture => Some(Knight),
            BishopPromo | BishopPromoCapture => Some(Bishop),
            RookPromo | RookPromoCapture => Some(Rook),
            QueenPromo | QueenPromoCapture => Some(Queen),
            _ => None,
        }
    }

    /// Color of a promoting move, inferred from which back rank the target
    /// square sits on. Doesn't itself check that this move is a pawn move
    /// or carries a promotion [`MoveType`].
    pub fn get_promo_color(self) -> Option<Color> {
        let target: Bitboard = self.tgt().into();

        if (target & RANKS[7]) != Bitboard::EMPTY {
            Some(Color::White)
        } else if (target & RANKS[0]) != Bitboard::EMPTY {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// The algebraic promotion letter (`Q`, `n`, ...), uppercase for white
    /// and lowercase for black.
    pub fn get_promo_label(self) -> Option<&'static str> {
        use Color::*;
        use PieceType::*;

        let ptype = self.get_promo_type()?;
        let color = self.get_promo_color()?;

        match (color, ptype) {
            (White, Knight) => Some("N"),
            (White, Bishop) => Some("B"),
            (White, Rook) => Some("R"),
            (White, Queen) => Some("Q"),
            (Black, Knight) => Some("n"),
            (Black, Bishop) => Some("b"),
            (Black, Rook) => Some("r"),
            (Black, Queen) => Some("q"),
            _ => None,
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.src(), self.tgt())?;

        if self.is_promotion() {
            let label = self.get_promo_label().expect("a promotion move always has a label");
            write!(f, "{label}")?;
        }

        Ok(())
    }
}

impl FromStr for Move {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        // Long algebraic notation is two 2-char squares, plus an optional
        // trailing 1-char promotion label.
        let char_chunks = s.chars().chunks(2);
        let mut chunks = char_chunks.into_iter().map(|chunk| chunk.collect::<String>());

        let sq1: Square = chunks.next().ok_or(anyhow!("Not a valid move string"))?.parse()?;
        let sq2: Square = chunks.next().ok_or(anyhow!("Not a valid move string"))?.parse()?;

        let mtype = match chunks.next() {
            Some(label) => label.parse()?,
            None => MoveType::Quiet,
        };

        Ok(Move::new(sq1, sq2, mtype))
    }
}

impl Piece {
    /// Squares visible to this piece standing on `sq`: every empty square
    /// along its directions of travel, up to and including the first
    /// blocker (friendly or enemy) in that direction. Callers mask out
    /// friendly-occupied squares themselves when they want attacks rather
    /// than raw visibility.
    pub fn visible_squares(&self, sq: Square, ours: Bitboard, theirs: Bitboard) -> Bitboard {
        use PieceType::*;

        let position: Bitboard = sq.into();
        let blockers = ours | theirs;

        match self.piece_type() {
            Bishop => Direction::DIAG.iter().fold(Bitboard::EMPTY, |acc, &dir| acc | visible_ray(dir, sq, blockers)),

            Rook => Direction::HV.iter().fold(Bitboard::EMPTY, |acc, &dir| acc | visible_ray(dir, sq, blockers)),

            Queen => Direction::ALL.iter().fold(Bitboard::EMPTY, |acc, &dir| acc | visible_ray(dir, sq, blockers)),

            Knight => KNIGHT_ATTACKS[sq as usize],

            King => KING_ATTACKS[sq as usize],

            Pawn => {
                let mut visible = Bitboard::EMPTY;
                let on_original_rank = position.on_pawn_rank(self.color());

                if self.color().is_white() {
                    visible |= theirs & PAWN_ATTACKS[Color::White as usize][sq as usize];
                    let single_push = PAWN_PUSHES[Color::White as usize][sq as usize] & !blockers;
                    visible |= single_push;

                    if on_original_rank && single_push != Bitboard::EMPTY {
                        visible |= PAWN_DBLPUSHES[Color::White as usize][sq as usize] & !blockers;
                    }
                } else {
                    visible |= theirs & PAWN_ATTACKS[Color::Black as usize][sq as usize];
                    let single_push = PAWN_PUSHES[Color::Black as usize][sq as usize] & !blockers;
                    visible |= single_push;

                    if on_original_rank && single_push != Bitboard::EMPTY {
                        visible |= PAWN_DBLPUSHES[Color::Black as usize][sq as usize] & !blockers;
                    }
                }

                visible
            }
        }
    }
}

/// The ray of squares starting at (and excluding) `square`, up to and
/// including the first blocker found in `blockers`.
pub fn visible_ray(dir: Direction, square: Square, blockers: Bitboard) -> Bitboard {
    let ray = RAYS[dir as usize][square as usize];
    let mut visible = ray;

    if let Some(blocker) = ray_blocker(dir, square, blockers) {
        visible &= !RAYS[dir as usize][blocker as usize];
    }

    visible
}

/// The nearest blocker to `square` along `dir`, if any — the lowest-index
/// one for a "positive" (toward h8) direction, the highest-index one for a
/// "negative" one, since that's whichever is geometrically closest.
fn ray_blocker(dir: Direction, square: Square, blockers: Bitboard) -> Option<Square> {
    let ray = RAYS[dir as usize][square as usize];
    let on_ray_bb = blockers & ray;

    let blocker = if dir.is_positive() {
        let lsb = on_ray_bb.trailing_zeros() as usize;
        Square::try_from_usize(lsb)
    } else {
        let lsb = (on_ray_bb.leading_zeros() + 1) as usize;
        64usize.checked_sub(lsb).and_then(Square::try_from_usize)
    };

    blocker
}

/// A parsed long-algebraic move (source, target, optional promotion piece)
/// that hasn't yet been matched against a legal move list to recover its
/// [`MoveType`] — used while reading UCI `position ... moves ...` input,
/// before a [`Board`](crate::board::Board) is available to disambiguate.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BareMove {
    src: Square,
    tgt: Square,
    promo_type: Option<Piece>,
}

impl BareMove {
    pub fn new(src: Square, tgt: Square, promo_type: Option<Piece>) -> Self {
        Self { src, tgt, promo_type }
    }

    pub fn src(&self) -> Square {
        self.src
    }

    pub fn tgt(&self) -> Square {
        self.tgt
    }

    pub fn promo_type(&self) -> Option<Piece> {
        self.promo_type
    }
}

impl FromStr for BareMove {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let char_chunks = s.chars().chunks(2);
        let mut chunks = char_chunks.into_iter().map(|chunk| chunk.collect::<String>());

        let src: Square = chunks.next().ok_or(anyhow!("Not a valid move string"))?.parse()?;
        let tgt: Square = chunks.next().ok_or(anyhow!("Not a valid move string"))?.parse()?;

        let promo_type = chunks.next().and_then(|label| {
            use Piece::*;

            match label.as_str() {
                "N" => Some(WN),
                "B" => Some(WB),
                "R" => Some(WR),
                "Q" => Some(WQ),
                "n" => Some(BN),
                "b" => Some(BB),
                "r" => Some(BR),
                "q" => Some(BQ),
                _ => None,
            }
        });

        Ok(BareMove::new(src, tgt, promo_type))
    }
}

impl Display for BareMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.src(), self.tgt())?;

        if let Some(ptype) = self.promo_type() {
            write!(f, "{ptype}")?;
        }

        Ok(())
    }
}

impl PartialEq<BareMove> for Move {
    fn eq(&self, bare: &BareMove) -> bool {
        self.src() == bare.src()
            && self.tgt() == bare.tgt()
            && bare.promo_type().map(|piece| piece.piece_type()) == self.get_promo_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_blocker_finds_nearest_piece_along_ray() {
        let dir = Direction::Up;
        let square = Square::D4;
        let blocker = Square::D7;
        let blockers = Bitboard(0xaa98605591844602);

        let result = ray_blocker(dir, square, blockers);

        assert_eq!(result, Some(blocker));
    }

    #[test]
    fn src_and_tgt_roundtrip() {
        let src = Square::D5;
        let tgt = Square::E6;

        let mv = Move::new(src, tgt, MoveType::Quiet);
        assert_eq!(mv.src(), src);
        assert_eq!(mv.tgt(), tgt);
    }

    #[test]
    fn get_type_recovers_the_packed_tag() {
        let mv = Move::new(Square::A7, Square::A8, MoveType::QueenPromoCapture);
        assert_eq!(mv.get_type(), MoveType::QueenPromoCapture);
        assert!(mv.is_capture());
        assert!(mv.is_promotion());
    }

    #[test]
    fn bare_moves_parse_print_and_compare_to_move() {
        use Piece::*;
        use Square::*;

        assert_eq!("a7a8Q".parse::<BareMove>().unwrap(), BareMove::new(A7, A8, Some(WQ)));
        assert_eq!("e7e8r".parse::<BareMove>().unwrap(), BareMove::new(E7, E8, Some(BR)));
        assert_eq!("e2e4".parse::<BareMove>().unwrap(), BareMove::new(E2, E4, None));

        assert_eq!(Move::new(A7, A8, MoveType::QueenPromo), "a7a8Q".parse::<BareMove>().unwrap());
        assert_eq!(
            Move::new(E7, E8, MoveType::RookPromoCapture),
            "e7e8r".parse::<BareMove>().unwrap()
        );

        assert_eq!(BareMove::new(A7, A8, Some(WQ)).to_string(), "a7a8Q");
        assert_eq!(BareMove::new(A7, A8, Some(BR)).to_string(), "a7a8r");
        assert_eq!(BareMove::new(A7, A8, None).to_string(), "a7a8");
    }
}
