//! A `Board` plus just enough history to answer repetition questions.
//!
//! The board subsystem is stateless about the game's past; the search needs
//! threefold-repetition detection, so this thin wrapper tacks a Zobrist-key
//! history onto a `Board` and forwards `play_move`/`play_null_move` to it.
//! Like `Board::play_move`, both methods return a brand new `Position`
//! rather than mutating in place — the caller's old binding is untouched
//! and remains valid, which is what stands in for "Unmake" in this design
//! (see DESIGN.md).

use arrayvec::ArrayVec;

use board::board::Board;
use board::movegen::moves::Move;
use board::zobrist::ZHash;

/// How many past positions we keep around. A single game is rarely deeper
/// than this in plies-since-reset; the 50-move rule caps it at 100 anyway.
const HISTORY_CAP: usize = 128;

#[derive(Debug, Clone)]
pub struct Position {
    pub board: Board,
    pub hash: ZHash,
    history: ArrayVec<ZHash, HISTORY_CAP>,
}

impl Position {
    pub fn new(board: Board) -> Self {
        let hash = board.zobrist_key();

        Position { board, hash, history: ArrayVec::new() }
    }

    /// Play a move, returning the resulting position. The move is assumed
    /// to be legal.
    pub fn play_move(&self, mv: Move) -> Position {
        let new_board = self.board.play_move(mv);
        let mut history = self.history.clone();

        // The 50-move counter is reset exactly when history should be, since
        // positions can't repeat across a capture or pawn move.
        if new_board.half_moves == 0 {
            history.clear();
        } else if history.is_full() {
            history.remove(0);
        }

        history.push(self.hash);

        Position { hash: new_board.zobrist_key(), board: new_board, history }
    }

    /// Play a null move (pass the turn), used by null-move pruning.
    pub fn play_null_move(&self) -> Position {
        let new_board = self.board.play_move(Move::NULL);
        let mut history = self.history.clone();

        if history.is_full() {
            history.remove(0);
        }

        history.push(self.hash);

        Position { hash: new_board.zobrist_key(), board: new_board, history }
    }

    /// How many times `self.hash` has already occurred earlier in this game
    /// (not counting the current position itself).
    pub fn repetition_count(&self) -> usize {
        self.history.iter().rev().filter(|&&h| h == self.hash).count()
    }

    pub fn is_repetition_draw(&self) -> bool {
        self.repetition_count() >= 2
    }

    pub fn is_draw(&self) -> bool {
        self.board.is_rule_draw() || self.is_repetition_draw()
    }

    pub fn in_check(&self) -> bool {
        self.board.in_check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn repeated_position_is_detected() {
        let board = Board::from_str(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        )
        .unwrap();
        let mut pos = Position::new(board);

        let knight_out: Move = "g1f3".parse().unwrap();
        let knight_back: Move = "f3g1".parse().unwrap();
        let black_out: Move = "g8f6".parse().unwrap();
        let black_back: Move = "f6g8".parse().unwrap();

        pos = pos.play_move(knight_out);
        pos = pos.play_move(black_out);
        pos = pos.play_move(knight_back);
        pos = pos.play_move(black_back);
        assert!(!pos.is_repetition_draw());

        pos = pos.play_move(knight_out);
        pos = pos.play_move(black_out);
        pos = pos.play_move(knight_back);
        pos = pos.play_move(black_back);
        assert!(pos.is_repetition_draw());
    }

    #[test]
    fn pawn_move_resets_history() {
        let board = Board::from_str(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        )
        .unwrap();
        let pos = Position::new(board);
        let push: Move = "e2e4".parse().unwrap();
        let after = pos.play_move(push);
        assert_eq!(after.repetition_count(), 0);
    }
}
