//! Main search (C6): alpha-beta with iterative deepening's per-node work —
//! mate-distance pruning, TT cutoffs, razoring, null-move pruning, ProbCut,
//! internal iterative deepening, check extensions, late-move
//! reductions/pruning, and the move loop that ties them together.

use arrayvec::ArrayVec;

use board::board::Board;
use board::movegen::moves::{Move, MoveType};
use board::piece::PieceType;

use crate::eval::evaluate;
use crate::eval::lookups::PASSED_PAWN_MASKS;
use crate::eval::params::EG_PIECE_VALUES;
use crate::ordering::order_moves;
use crate::position::Position;
use crate::score::{Eval, EvalExt, CHECKMATE, LOOKUP_FAILED, NEG_INF, NULL_SCORE};
use crate::search::quiescence::qsearch;
use crate::search::SearchContext;
use crate::search_tables::PVTable;
use crate::tables::Bound;
use crate::MAX_PLY;

/// `search(node, depth, alpha, beta) -> (score, line)`. `extensions` is the
/// count of check/passed-pawn extensions already spent along this branch.
pub fn search(
    ctx: &mut SearchContext,
    pos: &Position,
    ply: usize,
    depth: i32,
    mut alpha: Eval,
    mut beta: Eval,
    exclude: &[Move],
    extensions: u8,
) -> (Eval, PVTable) {
    if ctx.aborted() {
        return (NULL_SCORE, PVTable::new());
    }

    let root = ply == 0;

    if !root {
        if pos.is_repetition_draw() {
            return (0, PVTable::new());
        }
        if pos.board.insufficient_material() {
            return (0, PVTable::new());
        }
    }

    if ply >= MAX_PLY {
        return (evaluate(&pos.board), PVTable::new());
    }

    if depth <= 0 {
        return qsearch(ctx, pos, ply, alpha, beta);
    }

    if !root {
        alpha = alpha.max(-CHECKMATE + ply as Eval);
        beta = beta.min(CHECKMATE - ply as Eval - 1);
        if alpha >= beta {
            return (alpha, PVTable::new());
        }
    }

    let mut tt_entry = if ctx.config.use_tt { ctx.tt.probe(pos.hash).cloned() } else { None };
    let mut tt_move = tt_entry.as_ref().and_then(|e| e.line.first().copied());

    if !root {
        if let Some(entry) = &tt_entry {
            if entry.depth as i32 >= depth && entry.eval != LOOKUP_FAILED {
                let corrected = entry.eval.relative(ply);
                let usable = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => corrected >= beta,
                    Bound::Upper => corrected <= alpha,
                };
                if usable {
                    if entry.bound == Bound::Lower {
                        if let Some(mv) = tt_move {
                            if mv.is_quiet() {
                                ctx.killers[ply].add(mv);
                                ctx.history.bump(pos.board.current, mv, depth as usize);
                            }
                        }
                    }
                    let mut pv = PVTable::new();
                    if let Some(mv) = tt_move {
                        pv.add_to_front(mv, &PVTable::new());
                    }
                    return (corrected, pv);
                }
            }
        }
    }

    let in_check = pos.in_check();
    let static_eval = if in_check {
        None
    } else {
        match &tt_entry {
            Some(entry) if entry.static_eval != LOOKUP_FAILED => Some(entry.static_eval),
            _ => Some(evaluate(&pos.board)),
        }
    };
    ctx.node_stack[ply].static_eval = static_eval;
    ctx.record_seldepth(ply);

    let improving = match (static_eval, ctx.grandparent_eval(ply)) {
        (Some(eval), Some(grandparent)) => !in_check && eval > grandparent,
        (Some(_), None) => !in_check,
        _ => false,
    };

    let mut extensions = extensions;
    let mut depth = depth;

    if !root && !in_check {
        if let Some(eval) = static_eval {
            // Razoring.
            if depth <= 3 {
                let pawn_value = EG_PIECE_VALUES[PieceType::Pawn as usize] as Eval;
                let margin = eval + pawn_value;
                if margin < beta {
                    let (qscore, qline) = qsearch(ctx, pos, ply, alpha, beta);
                    if depth == 1 || qscore < beta {
                        return (qscore.max(margin), qline);
                    }
                }
            }

            // Null-move pruning.
            if depth > 2 && eval >= beta && ctx.null_move_allowed {
                let null_pos = pos.play_null_move();
                ctx.null_move_allowed = false;
                let (child_score, _) = search(ctx, &null_pos, ply + 1, depth - 3, -beta, -beta + 1, &[], extensions);
                ctx.null_move_allowed = true;
                if ctx.aborted() {
                    return (NULL_SCORE, PVTable::new());
                }
                let score = -child_score;
                if score >= beta {
                    let clamped = if score.is_mate() { beta } else { score };
                    return (clamped, PVTable::new());
                }
            }

            // ProbCut.
            if depth > ctx.config.probcut_depth_reduction as i32 && !beta.is_mate() {
                let derived_beta = beta + 191 - 54 * improving as Eval;
                let mut captures = pos.board.legal_moves::<false>();
                if ctx.config.order_moves {
                    order_moves(&pos.board, &mut captures, tt_move, &ctx.killers[ply], &ctx.history, pos.board.current);
                }

                for mv in captures {
                    if ctx.aborted() {
                        return (NULL_SCORE, PVTable::new());
                    }
                    let child_pos = pos.play_move(mv);
                    let (qs, _) = qsearch(ctx, &child_pos, ply + 1, -derived_beta, -derived_beta + 1);
                    if -qs < derived_beta {
                        continue;
                    }
                    let (fs, f_line) = search(
                        ctx,
                        &child_pos,
                        ply + 1,
                        depth - ctx.config.probcut_depth_reduction as i32,
                        -derived_beta,
                        -derived_beta + 1,
                        &[],
                        extensions,
                    );
                    if -fs >= derived_beta {
                        let mut pv = PVTable::new();
                        pv.add_to_front(mv, &f_line);
                        store(ctx, pos, depth, ply, beta, Bound::Lower, &pv, static_eval);
                        return (beta, pv);
                    }
                }
            }
        }
    }

    // Internal iterative deepening.
    let iid_reduction = ctx.config.iid_depth_reduction as i32;
    if !root && depth > iid_reduction && tt_move.is_none() {
        let (_, _) = search(ctx, pos, ply, depth - iid_reduction, alpha, beta, &[], extensions);
        if ctx.aborted() {
            return (NULL_SCORE, PVTable::new());
        }
        tt_entry = ctx.tt.probe(pos.hash).cloned();
        tt_move = tt_entry.as_ref().and_then(|e| e.line.first().copied());
    }

    // Check extension.
    if in_check && extensions < ctx.max_extensions {
        depth += 1;
        extensions += 1;
    }

    let futility_flag = !in_check && depth <= 3 && static_eval.map_or(false, |eval| {
        eval + futility_margin(depth, improving) <= alpha
    });

    let mut moves = pos.board.legal_moves::<true>();
    if moves.is_empty() {
        let score = if in_check { -(CHECKMATE - ply as Eval) } else { 0 };
        return (score, PVTable::new());
    }
    moves = queen_promotions_only(moves);
    if ctx.config.order_moves {
        order_moves(&pos.board, &mut moves, tt_move, &ctx.killers[ply], &ctx.history, pos.board.current);
    }

    let move_count = moves.len();
    let late_move_threshold = ctx.config.lmr_min_threshold.max(
        move_count * ctx.config.lmr_percentage as usize / 100,
    );

    let mut best_score = NEG_INF;
    let mut best_line = PVTable::new();
    let mut bound = Bound::Upper;

    for (i, &mv) in moves.iter().enumerate() {
        if root && exclude.contains(&mv) {
            continue;
        }

        let next = pos.play_move(mv);
        let gives_check = next.in_check();
        let quiet = mv.is_quiet();

        if futility_flag && i > 0 && quiet && !gives_check {
            continue;
        }

        let shallow = (depth as u8) < ctx.config.shallow_depth_threshold;
        let lmp_limit = late_move_prune_count(depth);
        let past_lmp = !root && shallow && i > lmp_limit;
        if past_lmp && quiet && !gives_check {
            continue;
        }

        ctx.bump_nodes();

        let mut r: i32 = 1;
        let mut reduced = false;
        if !root && i > late_move_threshold && !in_check && !gives_check {
            let is_killer = ctx.killers[ply].contains(mv);
            if past_lmp || (quiet && !is_killer) {
                r += lmr_reduction(depth, i);
                reduced = true;
            }
        }

        let mut child_extensions = extensions;
        if child_extensions < ctx.max_extensions && is_penultimate_passed_pawn_push(&pos.board, mv) {
            r -= 1;
            child_extensions += 1;
        }

        let (mut score, mut line) = {
            let (s, l) = search(ctx, &next, ply + 1, depth - r, -beta, -alpha, &[], child_extensions);
            (-s, l)
        };

        if reduced && score > alpha {
            let (s2, l2) = search(ctx, &next, ply + 1, depth - 1, -beta, -alpha, &[], child_extensions);
            score = -s2;
            line = l2;
        }

        if mv.is_promotion() && score == 0 {
            for alt in alternate_promotions(mv) {
                let alt_pos = pos.play_move(alt);
                let (s3, l3) = search(ctx, &alt_pos, ply + 1, depth - 1, -beta, -alpha, &[], child_extensions);
                if -s3 > 0 {
                    score = -s3;
                    line = l3;
                    break;
                }
            }
        }

        if ctx.aborted() {
            return (NULL_SCORE, PVTable::new());
        }

        if score > best_score {
            best_score = score;
            let mut pv = PVTable::new();
            pv.add_to_front(mv, &line);
            best_line = pv;
        }

        if score > alpha {
            alpha = score;
            bound = Bound::Exact;

            if score >= beta {
                store(ctx, pos, depth, ply, beta, Bound::Lower, &best_line, static_eval);
                if quiet {
                    ctx.history.bump(pos.board.current, mv, depth as usize);
                    ctx.killers[ply].add(mv);
                }
                return (beta, best_line);
            }
        }
    }

    store(ctx, pos, depth, ply, alpha, bound, &best_line, static_eval);
    (alpha, best_line)
}

fn store(
    ctx: &mut SearchContext,
    pos: &Position,
    depth: i32,
    ply: usize,
    eval: Eval,
    bound: Bound,
    line: &PVTable,
    static_eval: Option<Eval>,
) {
    if !ctx.config.use_tt {
        return;
    }
    let packed: ArrayVec<Move, MAX_PLY> = line.moves().iter().copied().collect();
    ctx.tt.store(
        pos.hash,
        depth.clamp(0, 255) as u8,
        ply,
        eval,
        bound,
        packed,
        static_eval.unwrap_or(LOOKUP_FAILED),
    );
}

/// `FM[improving?1:0][depth] = 165 * (depth - (improving ? 0 : 1))`.
fn futility_margin(depth: i32, improving: bool) -> Eval {
    165 * (depth - if improving { 0 } else { 1 })
}

/// `LMP(depth) = (3 + depth^2) / 2`.
fn late_move_prune_count(depth: i32) -> usize {
    ((3 + depth * depth) / 2).max(0) as usize
}

/// `R[depth][move_index] = max(round(ln(depth)*ln(index)/2) - 1, 0)`, over
/// a 64x64 domain clamped at the edges.
fn lmr_reduction(depth: i32, move_index: usize) -> i32 {
    let d = (depth.clamp(1, 63)) as f64;
    let i = (move_index.clamp(1, 63)) as f64;
    (((d.ln() * i.ln() / 2.0).round()) - 1.0).max(0.0) as i32
}

/// Keep only queen promotions (and queen promo-captures); a queen
/// promotion that scores exactly zero gets a second look at the other
/// three piece types in the move loop.
fn queen_promotions_only(moves: Vec<Move>) -> Vec<Move> {
    moves
        .into_iter()
        .filter(|mv| match mv.get_type() {
            MoveType::KnightPromo | MoveType::BishopPromo | MoveType::RookPromo => false,
            MoveType::KnightPromoCapture | MoveType::BishopPromoCapture | MoveType::RookPromoCapture => false,
            _ => true,
        })
        .collect()
}

fn alternate_promotions(mv: Move) -> [Move; 3] {
    let capture = mv.is_capture();
    let types = if capture {
        [MoveType::KnightPromoCapture, MoveType::RookPromoCapture, MoveType::BishopPromoCapture]
    } else {
        [MoveType::KnightPromo, MoveType::RookPromo, MoveType::BishopPromo]
    };
    [
        Move::new(mv.src(), mv.tgt(), types[0]),
        Move::new(mv.src(), mv.tgt(), types[1]),
        Move::new(mv.src(), mv.tgt(), types[2]),
    ]
}

fn is_penultimate_passed_pawn_push(board: &Board, mv: Move) -> bool {
    let Some(piece) = board.get_at(mv.src()) else { return false };
    if piece.piece_type() != PieceType::Pawn {
        return false;
    }

    let side = piece.color();
    let penultimate_rank = if side.is_white() { 6 } else { 1 };
    if mv.tgt().rank() != penultimate_rank {
        return false;
    }

    let enemy_pawns = board.pawns(side.opp());
    (PASSED_PAWN_MASKS[side as usize][mv.src() as usize] & enemy_pawns).is_empty()
}
