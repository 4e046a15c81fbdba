//! Move ordering (C4): score candidate moves so the move most likely to
//! cause a cutoff is searched first.

use board::board::Board;
use board::movegen::moves::Move;
use board::piece::Color;

use crate::search_tables::{HistoryTable, Killers};

const TT_MOVE_SCORE: i32 = 30_000;
const CAPTURE_BASE: i32 = 10_000;
const KILLER_SCORE: [i32; 2] = [9_000, 8_000];

/// Score `moves` in place and sort them descending, highest-scored first.
/// Fewer than two moves need no sorting.
pub fn order_moves(
    board: &Board,
    moves: &mut [Move],
    tt_move: Option<Move>,
    killers: &Killers,
    history: &HistoryTable,
    stm: Color,
) {
    if moves.len() < 2 {
        return;
    }

    let mut scored: Vec<(Move, i32)> = moves
        .iter()
        .map(|&mv| (mv, score_move(board, mv, tt_move, killers, history, stm)))
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));

    for (slot, (mv, _)) in moves.iter_mut().zip(scored) {
        *slot = mv;
    }
}

fn score_move(
    board: &Board,
    mv: Move,
    tt_move: Option<Move>,
    killers: &Killers,
    history: &HistoryTable,
    stm: Color,
) -> i32 {
    if Some(mv) == tt_move {
        return TT_MOVE_SCORE;
    }

    if mv.is_capture() {
        let attacker_rank = board.get_at(mv.src()).map(|p| p.piece_type() as i32).unwrap_or(0);
        let victim_rank = if mv.is_en_passant() {
            0
        } else {
            board.get_at(mv.tgt()).map(|p| p.piece_type() as i32).unwrap_or(0)
        };
        return CAPTURE_BASE + 100 * attacker_rank - victim_rank;
    }

    if killers.slot(0) == mv {
        return KILLER_SCORE[0];
    }
    if killers.slot(1) == mv {
        return KILLER_SCORE[1];
    }

    history.get(stm, mv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use board::board::Board;
    use std::str::FromStr;

    #[test]
    fn tt_move_sorts_first() {
        let board = Board::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        let e2e4 = Move::from_str("e2e4").unwrap();
        let d2d4 = Move::from_str("d2d4").unwrap();
        let mut moves = [d2d4, e2e4];

        order_moves(&board, &mut moves, Some(e2e4), &Killers::new(), &HistoryTable::new(), Color::White);

        assert_eq!(moves[0], e2e4);
    }

    #[test]
    fn short_lists_are_left_alone() {
        let board = Board::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        let e2e4 = Move::from_str("e2e4").unwrap();
        let mut moves = [e2e4];
        order_moves(&board, &mut moves, None, &Killers::new(), &HistoryTable::new(), Color::White);
        assert_eq!(moves[0], e2e4);
    }
}
