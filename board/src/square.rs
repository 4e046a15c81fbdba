//! A [`Square`] names a single location on the board (`a1`..`h8`); a
//! [`crate::bitboard::Bitboard`] names an unordered set of them. Most of the
//! move generator's per-square lookups (pawn pushes, knight/king attacks,
//! ray blockers) hang off methods here.

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::movegen::lookups::{KING_ATTACKS, KNIGHT_ATTACKS, PAWN_ATTACKS, PAWN_DBLPUSHES, PAWN_PUSHES};
use crate::piece::{Color, Piece};
use anyhow::anyhow;
use std::ops::{Index, IndexMut};
use std::{fmt::Display, str::FromStr};
use Square::*;

#[rustfmt::skip]
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// An index into one of the 64 board squares. Cast to `usize` to index
/// into per-square lookup tables.
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}

impl Square {
    pub const COUNT: usize = 64;

    #[rustfmt::skip]
    /// All 64 squares, indexed by their `usize` value.
    pub const ALL: [Self; Self::COUNT] = [
        A1, B1, C1, D1, E1, F1, G1, H1,
        A2, B2, C2, D2, E2, F2, G2, H2,
        A3, B3, C3, D3, E3, F3, G3, H3,
        A4, B4, C4, D4, E4, F4, G4, H4,
        A5, B5, C5, D5, E5, F5, G5, H5,
        A6, B6, C6, D6, E6, F6, G6, H6,
        A7, B7, C7, D7, E7, F7, G7, H7,
        A8, B8, C8, D8, E8, F8, G8, H8,
    ];

    #[rustfmt::skip]
    /// Ranks from rank 8 down to rank 1, for printing a board top-to-bottom.
    pub const RANKS: [[Self; 8]; 8] = [
        [A8, B8, C8, D8, E8, F8, G8, H8],
        [A7, B7, C7, D7, E7, F7, G7, H7],
        [A6, B6, C6, D6, E6, F6, G6, H6],
        [A5, B5, C5, D5, E5, F5, G5, H5],
        [A4, B4, C4, D4, E4, F4, G4, H4],
        [A3, B3, C3, D3, E3, F3, G3, H3],
        [A2, B2, C2, D2, E2, F2, G2, H2],
        [A1, B1, C1, D1, E1, F1, G1, H1],
    ];

    #[rustfmt::skip]
    /// Lowercase algebraic names, for FEN/UCI parsing and printing.
    pub const NAMES: [&'static str; Self::COUNT] = [
        "a1", "b1", "c1", "d1", "e1", "f1", "g1", "h1",
        "a2", "b2", "c2", "d2", "e2", "f2", "g2", "h2",
        "a3", "b3", "c3", "d3", "e3", "f3", "g3", "h3",
        "a4", "b4", "c4", "d4", "e4", "f4", "g4", "h4",
        "a5", "b5", "c5", "d5", "e5", "f5", "g5", "h5",
        "a6", "b6", "c6", "d6", "e6", "f6", "g6", "h6",
        "a7", "b7", "c7", "d7", "e7", "f7", "g7", "h7",
        "a8", "b8", "c8", "d8", "e8", "f8", "g8", "h8",
    ];

    /// Rank index, `0` (rank 1) to `7` (rank 8).
    pub const fn rank(&self) -> usize {
        (*self as usize) / 8
    }

    /// File index, `0` (file a) to `7` (file h).
    pub const fn file(&self) -> usize {
        (*self as usize) % 8
    }

    /// Rank index as seen by `WHITE`: unflipped for white, mirrored for black.
    pub const fn relative_rank<const WHITE: bool>(&self) -> usize {
        let rank = *self as usize / 8;
        if WHITE {
            rank
        } else {
            7 - rank
        }
    }

    /// The square one rank closer to the opponent's back rank, or `None`
    /// off the edge of the board.
    pub fn forward(self, side: Color) -> Option<Self> {
        if side.is_white() {
            Self::ALL.get(self as usize + 8).copied()
        } else {
            Self::ALL.get((self as usize).saturating_sub(8)).copied()
        }
    }

    /// The square one rank closer to one's own back rank, or `None` off
    /// the edge of the board.
    pub fn backward(self, side: Color) -> Option<Self> {
        self.forward(side.opp())
    }

    /// Manhattan (taxicab) distance between two squares.
    pub fn distance(&self, other: Self) -> usize {
        self.hdistance(other) + self.vdistance(other)
    }

    /// Rank-only distance between two squares.
    pub fn vdistance(&self, other: Self) -> usize {
        self.rank().abs_diff(other.rank())
    }

    /// File-only distance between two squares.
    pub fn hdistance(&self, other: Self) -> usize {
        self.file().abs_diff(other.file())
    }

    /// Chebyshev distance, `max(|file delta|, |rank delta|)` — the number
    /// of king moves to get from one square to the other, ignoring blockers.
    pub fn max_dist(&self, other: Self) -> usize {
        usize::max(self.vdistance(other), self.hdistance(other))
    }

    /// Reflect across the board's horizontal midline (rank 1 <-> rank 8).
    pub const fn flip(&self) -> Self {
        // SAFETY: XOR with 56 stays within the 0..64 square range.
        unsafe { Self::new_unchecked((*self as u8) ^ 56) }
    }

    /// Reflect across the board's vertical midline (file a <-> file h).
    pub const fn mirror(&self) -> Self {
        // SAFETY: XOR with 7 stays within the 0..64 square range.
        unsafe { Self::new_unchecked((*self as u8) ^ 7) }
    }
}

impl Square {
    pub fn new(idx: u8) -> Option<Self> {
        if idx < 64 {
            Some(unsafe { std::mem::transmute::<u8, Self>(idx) })
        } else {
            None
        }
    }

    /// Like [`Square::new`], but takes a `usize` index — convenient at call
    /// sites that already computed an index via bit-counting intrinsics.
    pub fn try_from_usize(idx: usize) -> Option<Self> {
        u8::try_from(idx).ok().and_then(Self::new)
    }

    /// # Safety
    /// `idx` must be `< 64`.
    pub const unsafe fn new_unchecked(idx: u8) -> Self {
        unsafe { std::mem::transmute::<u8, Self>(idx) }
    }

    /// Squares a pawn of `side` standing here attacks (not pushes to).
    pub fn pawn_attacks(self, side: Color) -> Bitboard {
        PAWN_ATTACKS[side][self]
    }

    /// Squares a pawn of `side` standing here could legally move to,
    /// accounting for `blockers` on both the single- and double-push ranks.
    pub fn pawn_squares(self, side: Color, blockers: Bitboard) -> Bitboard {
        let push_mask = PAWN_PUSHES[side][self];
        let dbl_push_mask = PAWN_DBLPUSHES[side][self];

        let on_original_rank = if side.is_white() {
            self.rank() == 1
        } else {
            self.rank() == 6
        };

        let can_push = push_mask.overlap(blockers).is_empty();
        let can_dbl_push = on_original_rank && can_push && dbl_push_mask.overlap(blockers).is_empty();

        if can_dbl_push {
            push_mask | dbl_push_mask
        } else if can_push {
            push_mask
        } else {
            Bitboard::EMPTY
        }
    }

    #[inline(always)]
    pub fn pawn_pushes<const WHITE: bool>(self, blockers: Bitboard) -> Bitboard {
        if WHITE {
            PAWN_PUSHES[Color::White][self] & !blockers
        } else {
            PAWN_PUSHES[Color::Black][self] & !blockers
        }
    }

    pub fn pawn_double_pushes<const WHITE: bool>(self, blockers: Bitboard) -> Bitboard {
        let double_push_rank = if WHITE { 1 } else { 6 };

        if self.rank() != double_push_rank {
            return Bitboard::EMPTY;
        }

        self.pawn_pushes::<WHITE>(blockers).forward::<WHITE>() & !blockers
    }

    pub fn knight_squares(self) -> Bitboard {
        KNIGHT_ATTACKS[self]
    }

    pub fn queen_squares(self, blockers: Bitboard) -> Bitboard {
        self.bishop_squares(blockers) | self.rook_squares(blockers)
    }

    pub fn king_squares(self) -> Bitboard {
        KING_ATTACKS[self]
    }

    pub fn is_promo_rank(&self, side: Color) -> bool {
        match side {
            Color::White => self.rank() == 7,
            Color::Black => self.rank() == 0,
        }
    }
}

/// # Panics
/// Panics if `idx >= 64`.
impl From<usize> for Square {
    fn from(idx: usize) -> Self {
        Self::ALL[idx]
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Self::NAMES[*self])
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let idx = Self::NAMES
            .iter()
            .position(|&name| name == s.to_lowercase())
            .ok_or(anyhow!("Not a valid square identifier"))?;

        Ok(Self::ALL[idx])
    }
}

/// Index a fixed 64-entry table by [`Square`] without bounds checks — every
/// `Square` value is, by construction, a valid index.
macro_rules! impl_square_index {
    ($ty:ty) => {
        impl<T> Index<$ty> for [T; 64] {
            type Output = T;

            fn index(&self, index: $ty) -> &Self::Output {
                // SAFETY: every `Square` variant is < 64.
                unsafe { self.get_unchecked(index as usize) }
            }
        }
    };
}

impl_square_index!(Square);

impl<T> IndexMut<Square> for [T; 64] {
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        // SAFETY: every `Square` variant is < 64.
        unsafe { self.get_unchecked_mut(index as usize) }
    }
}

impl Index<Square> for Board {
    type Output = Option<Piece>;

    fn index(&self, sq: Square) -> &Self::Output {
        &self.piece_list[sq]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_and_file_roundtrip() {
        for &sq in Square::ALL.iter() {
            let idx = sq.rank() * 8 + sq.file();
            assert_eq!(Square::from(idx), sq);
        }
    }

    #[test]
    fn flip_is_its_own_inverse() {
        for &sq in Square::ALL.iter() {
            assert_eq!(sq.flip().flip(), sq);
        }
    }

    #[test]
    fn parses_lowercase_and_uppercase_names() {
        assert_eq!(Square::from_str("e4").unwrap(), E4);
        assert_eq!(Square::from_str("E4").unwrap(), E4);
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(Square::from_str("z9").is_err());
    }
}
