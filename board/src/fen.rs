//! Forsyth-Edwards Notation: the one-line board serialization UCI speaks
//! for `position fen ...` and that `Board::to_fen`/`FromStr` round-trip.
//!
//! A FEN string is six space-separated fields:
//!
//! 1. Piece placement, rank 8 down to rank 1, `/`-separated. Each rank is a
//!    run of piece letters (uppercase white, lowercase black) and digits
//!    counting consecutive empty squares.
//! 2. Side to move, `w` or `b`.
//! 3. Castling rights still available (`KQkq`, any subset, or `-`) — this
//!    tracks only whether the king/rook in question has ever moved, not
//!    whether castling is currently legal.
//! 4. En passant target square, or `-`.
//! 5. Halfmove clock since the last capture or pawn push (the fifty-move
//!    rule counter).
//! 6. Fullmove number, incremented after Black's move.
//!
//! Parsing is strict: a malformed field returns `Err` rather than guessing.

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::movegen::castling::CastlingRights;
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;
use anyhow::anyhow;
use itertools::Itertools;
use std::str::FromStr;

impl Board {
    pub fn to_fen(&self) -> String {
        let ranks = self.piece_list.into_iter().chunks(8);
        let ranks = ranks.into_iter().collect_vec();
        let mut rank_strs: Vec<String> = Vec::new();

        for rank in ranks.into_iter().rev() {
            let mut elements: Vec<String> = Vec::new();
            let piece_runs = rank.into_iter().group_by(|p| p.is_some());

            for run in &piece_runs {
                match run {
                    (true, pieces) => {
                        for piece in pieces {
                            elements.push(piece.unwrap().to_string());
                        }
                    }
                    (false, gaps) => elements.push(gaps.count().to_string()),
                }
            }

            rank_strs.push(elements.join(""));
        }

        let pieces = rank_strs.into_iter().join("/");
        let next_player = self.current.to_string();
        let castling = self.castling_rights.to_string();
        let en_passant = self
            .en_passant
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string());
        let half_moves = self.half_moves;
        let full_moves = self.full_moves;

        format!("{pieces} {next_player} {castling} {en_passant} {half_moves} {full_moves}")
    }

    pub fn from_fen(fen: &str) -> anyhow::Result<Board> {
        let mut parts = fen.split(' ');

        let piece_string = parts.next().ok_or(anyhow!("Invalid FEN string"))?;

        let mut piece_bbs = [Bitboard::EMPTY; PieceType::COUNT];
        let mut occupied_squares = [Bitboard::EMPTY; Color::COUNT];
        let mut piece_list = [None; Square::COUNT];
        let mut square_idx: usize = 0;

        // FEN lists ranks from 8 down to 1; walk them in reverse to fill
        // `piece_list` in ascending square order.
        for rank in piece_string.split('/').rev() {
            for c in rank.chars() {
                let c = c.to_string();

                if let Ok(gap) = usize::from_str(&c) {
                    square_idx += gap;
                } else if let Ok(piece) = Piece::from_str(&c) {
                    let square = Square::from(square_idx);
                    let bb = Bitboard::from(square);

                    piece_list[square_idx] = Some(piece);
                    piece_bbs[piece.piece_type()] |= bb;
                    occupied_squares[piece.color()] |= bb;

                    square_idx += 1;
                }
            }
        }

        let current: Color = parts.next().ok_or(anyhow!("Invalid FEN string"))?.parse()?;

        let castling_rights: CastlingRights = parts.next().ok_or(anyhow!("Invalid FEN string"))?.parse()?;

        let en_passant: Option<Square> = parts.next().ok_or(anyhow!("Invalid FEN string"))?.parse().ok();

        let half_moves = parts.next().ok_or(anyhow!("Invalid FEN string"))?.parse()?;

        let full_moves = parts.next().ok_or(anyhow!("Invalid FEN string"))?.parse()?;

        Ok(Board::new(
            piece_list,
            piece_bbs,
            occupied_squares,
            current,
            castling_rights,
            en_passant,
            half_moves,
            full_moves,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_position_roundtrips() {
        let initial_fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let board = Board::from_str(initial_fen).unwrap();
        assert_eq!(board.to_fen(), initial_fen);
    }

    #[test]
    fn en_passant_square_roundtrips() {
        let fen = "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2";
        let board = Board::from_str(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").is_err());
    }
}
