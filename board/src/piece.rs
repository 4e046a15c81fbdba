//! Pieces, piece types, and colors, plus the unchecked array-index impls
//! that let per-piece/per-color/per-square tables be indexed directly by
//! these enums instead of by `as usize`.

use anyhow::anyhow;
use std::{
    fmt::Display,
    ops::{Index, IndexMut, Not},
    str::FromStr,
};
use Color::*;
use Piece::*;
use PieceType::*;

/// A piece type bound to a color (`White Knight`, `Black Queen`, ...).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Piece {
    WP, BP, WN, BN, WB, BB, WR, BR, WQ, BQ, WK, BK,
}

impl Piece {
    pub const COUNT: usize = 12;

    pub fn new(ptype: PieceType, color: Color) -> Self {
        match (color, ptype) {
            (White, Pawn) => WP,
            (White, Knight) => WN,
            (White, Bishop) => WB,
            (White, Rook) => WR,
            (White, Queen) => WQ,
            (White, King) => WK,

            (Black, Pawn) => BP,
            (Black, Knight) => BN,
            (Black, Bishop) => BB,
            (Black, Rook) => BR,
            (Black, Queen) => BQ,
            (Black, King) => BK,
        }
    }

    pub fn color(self) -> Color {
        if (self as usize) & 1 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn piece_type(self) -> PieceType {
        match self {
            WP | BP => Pawn,
            WN | BN => Knight,
            WB | BB => Bishop,
            WR | BR => Rook,
            WQ | BQ => Queen,
            WK | BK => King,
        }
    }

    pub fn is_pawn(&self) -> bool {
        self.piece_type() == PieceType::Pawn
    }

    pub fn is_knight(&self) -> bool {
        self.piece_type() == PieceType::Knight
    }

    pub fn is_bishop(&self) -> bool {
        self.piece_type() == PieceType::Bishop
    }

    pub fn is_rook(&self) -> bool {
        self.piece_type() == PieceType::Rook
    }

    pub fn is_queen(&self) -> bool {
        self.piece_type() == PieceType::Queen
    }

    pub fn is_king(&self) -> bool {
        self.piece_type() == PieceType::King
    }

    pub fn is_slider(&self) -> bool {
        self.is_rook() || self.is_bishop() || self.is_queen()
    }

    /// Horizontal/vertical slider: rook or queen.
    pub fn is_hv_slider(&self) -> bool {
        self.is_rook() || self.is_queen()
    }

    /// Diagonal slider: bishop or queen.
    pub fn is_diag_slider(&self) -> bool {
        self.is_bishop() || self.is_queen()
    }

    /// The same piece type, opposite color — used when evaluating a
    /// position from the other side's perspective.
    pub fn mirror(self) -> Self {
        match self {
            WP => BP,
            WN => BN,
            WB => BB,
            WR => BR,
            WQ => BQ,
            WK => BK,

            BP => WP,
            BN => WN,
            BB => WB,
            BR => WR,
            BQ => WQ,
            BK => WK,
        }
    }
}

#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    pub const COUNT: usize = 6;
}

#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const COUNT: usize = 2;

    pub fn opp(self) -> Self {
        !self
    }

    pub fn is_white(self) -> bool {
        self == White
    }

    pub fn is_black(self) -> bool {
        self == Black
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let piece = match *self {
            WP => "P",
            WR => "R",
            WN => "N",
            WB => "B",
            WQ => "Q",
            WK => "K",

            BP => "p",
            BR => "r",
            BN => "n",
            BB => "b",
            BQ => "q",
            BK => "k",
        };

        write!(f, "{piece}")
    }
}

impl FromStr for Piece {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "P" => Ok(WP),
            "N" => Ok(WN),
            "B" => Ok(WB),
            "R" => Ok(WR),
            "Q" => Ok(WQ),
            "K" => Ok(WK),
            "p" => Ok(BP),
            "n" => Ok(BN),
            "b" => Ok(BB),
            "r" => Ok(BR),
            "q" => Ok(BQ),
            "k" => Ok(BK),
            _ => Err(anyhow!("Not a valid piece string")),
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            White => write!(f, "w"),
            Black => write!(f, "b"),
        }
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "w" => Ok(White),
            "b" => Ok(Black),
            _ => Err(anyhow!("Not a valid color string")),
        }
    }
}

impl Not for Color {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            White => Black,
            Black => White,
        }
    }
}

/// Index a fixed-size table of length `$len` by `$ty` without bounds
/// checks. Sound because every variant of `$ty` is `< $len`.
macro_rules! impl_enum_index {
    ($ty:ty, $len:literal) => {
        impl<T> Index<$ty> for [T; $len] {
            type Output = T;

            fn index(&self, index: $ty) -> &Self::Output {
                unsafe { self.get_unchecked(index as usize) }
            }
        }

        impl<T> IndexMut<$ty> for [T; $len] {
            fn index_mut(&mut self, index: $ty) -> &mut Self::Output {
                unsafe { self.get_unchecked_mut(index as usize) }
            }
        }
    };
}

impl_enum_index!(Color, 2);
impl_enum_index!(PieceType, 6);
impl_enum_index!(Piece, 12);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_composes_and_decomposes() {
        for &ptype in &[Pawn, Knight, Bishop, Rook, Queen, King] {
            for &color in &[White, Black] {
                let piece = Piece::new(ptype, color);
                assert_eq!(piece.piece_type(), ptype);
                assert_eq!(piece.color(), color);
            }
        }
    }

    #[test]
    fn mirror_flips_color_keeps_type() {
        assert_eq!(WN.mirror(), BN);
        assert_eq!(BQ.mirror(), WQ);
    }

    #[test]
    fn color_not_toggles() {
        assert_eq!(!White, Black);
        assert_eq!(!Black, White);
    }

    #[test]
    fn parses_fen_piece_letters() {
        assert_eq!(Piece::from_str("Q").unwrap(), WQ);
        assert_eq!(Piece::from_str("k").unwrap(), BK);
        assert!(Piece::from_str("x").is_err());
    }
}
