//! Quiescence search (C5): captures and queen promotions only, with
//! standing-pat, to stop the main search from evaluating at a volatile leaf.

use arrayvec::ArrayVec;

use board::movegen::moves::{Move, MoveType};

use crate::eval::evaluate;
use crate::ordering::order_moves;
use crate::position::Position;
use crate::score::{Eval, EvalExt, LOOKUP_FAILED, NULL_SCORE};
use crate::search::SearchContext;
use crate::search_tables::PVTable;
use crate::tables::Bound;
use crate::MAX_PLY;

/// `qsearch(node, alpha, beta) -> (score, line)`.
pub fn qsearch(ctx: &mut SearchContext, pos: &Position, ply: usize, mut alpha: Eval, beta: Eval) -> (Eval, PVTable) {
    if ctx.aborted() {
        return (NULL_SCORE, PVTable::new());
    }

    if pos.board.insufficient_material() {
        return (0, PVTable::new());
    }

    if ply >= MAX_PLY {
        return (evaluate(&pos.board), PVTable::new());
    }

    let tt_entry = if ctx.config.use_tt { ctx.tt.probe(pos.hash).cloned() } else { None };
    if let Some(entry) = &tt_entry {
        if entry.eval != LOOKUP_FAILED {
            let corrected = entry.eval.relative(ply);
            let usable = match entry.bound {
                Bound::Exact => true,
                Bound::Lower => corrected >= beta,
                Bound::Upper => corrected <= alpha,
            };
            if usable {
                let mut pv = PVTable::new();
                if let Some(&mv) = entry.line.first() {
                    pv.add_to_front(mv, &PVTable::new());
                }
                return (corrected, pv);
            }
        }
    }

    let in_check = pos.in_check();
    let static_eval = match &tt_entry {
        Some(entry) if entry.static_eval != LOOKUP_FAILED => entry.static_eval,
        _ => evaluate(&pos.board),
    };
    ctx.node_stack[ply].static_eval = if in_check { None } else { Some(static_eval) };
    ctx.record_seldepth(ply);

    if !in_check {
        if static_eval >= beta {
            return (beta, PVTable::new());
        }
        alpha = alpha.max(static_eval);
    }

    let mut moves = pos.board.legal_moves::<false>();
    moves.retain(|mv| mv.is_capture() || mv.is_en_passant() || matches!(mv.get_type(), MoveType::QueenPromo | MoveType::QueenPromoCapture));
    if ctx.config.order_moves {
        order_moves(&pos.board, &mut moves, None, &ctx.killers[ply], &ctx.history, pos.board.current);
    }

    let mut best_line = PVTable::new();
    let mut bound = Bound::Upper;

    for mv in moves {
        if ctx.aborted() {
            return (NULL_SCORE, PVTable::new());
        }

        ctx.bump_nodes();
        let next = pos.play_move(mv);
        let (child_score, child_line) = qsearch(ctx, &next, ply + 1, -beta, -alpha);
        let score = -child_score;

        if score > alpha {
            alpha = score;
            bound = Bound::Exact;
            let mut pv = PVTable::new();
            pv.add_to_front(mv, &child_line);
            best_line = pv;

            if score >= beta {
                store(ctx, pos, ply, beta, Bound::Lower, &best_line, static_eval, in_check);
                return (beta, best_line);
            }
        }
    }

    store(ctx, pos, ply, alpha, bound, &best_line, static_eval, in_check);
    (alpha, best_line)
}

fn store(
    ctx: &mut SearchContext,
    pos: &Position,
    ply: usize,
    eval: Eval,
    bound: Bound,
    line: &PVTable,
    static_eval: Eval,
    in_check: bool,
) {
    if !ctx.config.use_tt {
        return;
    }
    let packed: ArrayVec<Move, MAX_PLY> = line.moves().iter().copied().collect();
    ctx.tt.store(
        pos.hash,
        0,
        ply,
        eval,
        bound,
        packed,
        if in_check { LOOKUP_FAILED } else { static_eval },
    );
}
