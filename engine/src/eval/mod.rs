//! Static evaluation (C2): material, piece-square tables, pawn structure,
//! mobility, king safety, colour weakness and outposts, blended by game
//! phase into a single side-to-move-relative centipawn value.

pub mod lookups;
pub mod params;
pub mod pawn_structure;

use board::bitboard::Bitboard;
use board::board::Board;
use board::piece::{Color, Piece, PieceType};

use crate::s;
use crate::score::{Eval, Score};
use pawn_structure::PawnStructure;

use params::{
    mirror_index, BISHOP_MOBILITY, BISHOP_OUTPOST_BONUS,
    BISHOP_PAIR_CLOSED, BISHOP_PAIR_OPEN, BISHOP_PSQT, COLOUR_WEAKNESS_PENALTY,
    EG_PIECE_VALUES, IMBALANCE_PAWN_FACTOR, KING_FILE_HALF_OPEN, KING_FILE_OPEN, KING_PSQT,
    KNIGHT_MOBILITY, KNIGHT_OUTPOST_BONUS, KNIGHT_PAIR_CLOSED, KNIGHT_PAIR_OPEN, KNIGHT_PSQT,
    MG_PIECE_VALUES, MOPUP_CORNER_BONUS, OPEN_POSITION_OCCUPANCY, OUTPOST_RANKS, PAWN_PSQT,
    QUEEN_MOBILITY, QUEEN_PSQT, ROOK_MOBILITY, ROOK_PSQT, SHIELD_FIRST_RANK, SHIELD_SECOND_RANK,
};

/// Evaluate `board` from the side-to-move's perspective.
pub fn evaluate(board: &Board) -> Eval {
    let phase = game_phase(board);
    let pawns = PawnStructure::compute(board);

    let white = side_score::<true>(board, &pawns);
    let black = side_score::<false>(board, &pawns);

    let mut blended = (white - black).blend(phase);

    if let Some(mopup) = mopup_bonus(board, phase, blended) {
        blended += mopup;
    }

    if board.current.is_black() {
        -blended
    } else {
        blended
    }
}

/// Total non-pawn material of both sides, using opening piece values. This
/// is the phase axis the score codec blends against.
fn game_phase(board: &Board) -> i32 {
    let mut phase = 0;
    for &ptype in &[PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
        let count = board.get_bb(ptype, Color::White).count()
            + board.get_bb(ptype, Color::Black).count();
        phase += count as i32 * MG_PIECE_VALUES[ptype as usize];
    }
    phase
}

fn side_score<const WHITE: bool>(board: &Board, pawns: &PawnStructure) -> Score {
    let us = if WHITE { Color::White } else { Color::Black };
    let them = us.opp();

    material(board, us)
        + psqt::<WHITE>(board, us)
        + pawns.score::<WHITE>()
        + imbalance(board, us, them)
        + minor_pairs(board, us)
        + mobility::<WHITE>(board)
        + king_safety::<WHITE>(board)
        + colour_weakness(board, us)
        + outposts::<WHITE>(board)
}

fn material(board: &Board, side: Color) -> Score {
    let mut score = Score::ZERO;
    for ptype in [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
    ] {
        let count = board.get_bb(ptype, side).count() as i32;
        score += Score::new(MG_PIECE_VALUES[ptype as usize], EG_PIECE_VALUES[ptype as usize]) * count;
    }
    score
}

fn psqt<const WHITE: bool>(board: &Board, side: Color) -> Score {
    let mut score = Score::ZERO;

    for sq in board.pawns(side) {
        let idx = if WHITE { sq as usize } else { sq.flip() as usize };
        score += PAWN_PSQT[idx];
    }

    for (ptype, table) in [
        (PieceType::Knight, &KNIGHT_PSQT),
        (PieceType::Bishop, &BISHOP_PSQT),
        (PieceType::Rook, &ROOK_PSQT),
        (PieceType::Queen, &QUEEN_PSQT),
        (PieceType::King, &KING_PSQT),
    ] {
        for sq in board.get_bb(ptype, side) {
            let idx = if WHITE { sq as usize } else { sq.flip() as usize };
            score += table[mirror_index(idx)];
        }
    }

    score
}

/// A small per-pawn penalty proportional to a side's own pawn count and its
/// material lead over the opponent.
fn imbalance(board: &Board, us: Color, them: Color) -> Score {
    let mg_material = |side: Color| -> i32 {
        [
            PieceType::Pawn,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Rook,
            PieceType::Queen,
        ]
        .iter()
        .map(|&pt| board.get_bb(pt, side).count() as i32 * MG_PIECE_VALUES[pt as usize])
        .sum()
    };

    let delta = (mg_material(us) - mg_material(them)).abs() / 100;
    let pawn_count = board.pawns(us).count() as i32;
    let penalty = delta * pawn_count;

    s!(-penalty * IMBALANCE_PAWN_FACTOR.0, -penalty * IMBALANCE_PAWN_FACTOR.1)
}

fn minor_pairs(board: &Board, side: Color) -> Score {
    let open = board.all_occupied().count() < OPEN_POSITION_OCCUPANCY;
    let mut score = Score::ZERO;

    if board.get_bb(PieceType::Knight, side).count() >= 2 {
        score += if open { KNIGHT_PAIR_OPEN } else { KNIGHT_PAIR_CLOSED };
    }
    if board.get_bb(PieceType::Bishop, side).count() >= 2 {
        score += if open { BISHOP_PAIR_OPEN } else { BISHOP_PAIR_CLOSED };
    }

    score
}

fn mobility<const WHITE: bool>(board: &Board) -> Score {
    let us = if WHITE { Color::White } else { Color::Black };
    let them = us.opp();

    let low_rank_pawns = blocked_or_low_rank_pawns::<WHITE>(board);
    let king_and_queen = board.kings(us) | board.queens(us);
    let enemy_pawn_attacks = pawn_structure::pawn_attacks(board.pawns(them), them as usize);

    let excluded = low_rank_pawns | king_and_queen | enemy_pawn_attacks;
    let mobility_area = !excluded;

    let ours = board.occupied_by(us);
    let theirs = board.occupied_by(them);
    let mut score = Score::ZERO;

    for (ptype, table) in [
        (PieceType::Knight, &KNIGHT_MOBILITY[..]),
        (PieceType::Bishop, &BISHOP_MOBILITY[..]),
        (PieceType::Rook, &ROOK_MOBILITY[..]),
        (PieceType::Queen, &QUEEN_MOBILITY[..]),
    ] {
        let piece = Piece::new(ptype, us);
        for sq in board.get_bb(ptype, us) {
            let attacks = piece.visible_squares(sq, ours, theirs) & mobility_area;
            let count = (attacks.count() as usize).min(table.len() - 1);
            score += table[count];
        }
    }

    score
}

/// Own pawns on their starting rank or immediately blocked by a pawn ahead.
fn blocked_or_low_rank_pawns<const WHITE: bool>(board: &Board) -> Bitboard {
    let us = if WHITE { Color::White } else { Color::Black };
    let our_pawns = board.pawns(us);
    let all = board.all_occupied();

    let blocked = if WHITE {
        our_pawns & (all >> 8)
    } else {
        our_pawns & (all << 8)
    };

    let low_rank = if WHITE {
        our_pawns & board::constants::RANKS[1]
    } else {
        our_pawns & board::constants::RANKS[6]
    };

    blocked | low_rank
}

fn king_safety<const WHITE: bool>(board: &Board) -> Score {
    let us = if WHITE { Color::White } else { Color::Black };
    let king_bb = board.kings(us);
    if king_bb.is_empty() {
        return Score::ZERO;
    }
    let king_sq = king_bb.first();
    let file = king_sq.file();
    let our_pawns = board.pawns(us);
    let their_pawns = board.pawns(us.opp());

    let mut score = Score::ZERO;

    let castled = if WHITE {
        matches!(king_sq.file(), 6 | 2) && king_sq.rank() == 0
    } else {
        matches!(king_sq.file(), 6 | 2) && king_sq.rank() == 7
    };

    if castled {
        let shield_files = [file.saturating_sub(1), file, (file + 1).min(7)];
        for &f in &shield_files {
            let file_pawns = our_pawns & board::constants::FILES[f];
            if file_pawns.is_empty() {
                continue;
            }
            let closest_rank = if WHITE {
                file_pawns.into_iter().map(|sq| sq.rank()).min().unwrap_or(7)
            } else {
                file_pawns.into_iter().map(|sq| sq.rank()).max().unwrap_or(0)
            };
            let distance = if WHITE { closest_rank - 1 } else { 6 - closest_rank };
            score += match distance {
                0 => SHIELD_FIRST_RANK,
                1 => SHIELD_SECOND_RANK,
                _ => Score::ZERO,
            };
        }
    }

    let lo = file.saturating_sub(1);
    let hi = (file + 1).min(7);
    for f in lo..=hi {
        let file_mask = board::constants::FILES[f];
        let has_own = !(our_pawns & file_mask).is_empty();
        let has_enemy = !(their_pawns & file_mask).is_empty();

        score += match (has_own, has_enemy) {
            (false, false) => KING_FILE_OPEN,
            (false, true) => KING_FILE_HALF_OPEN,
            _ => Score::ZERO,
        };
    }

    score
}

fn colour_weakness(board: &Board, side: Color) -> Score {
    let bishops = board.get_bb(PieceType::Bishop, side);
    let has_light = !(bishops & board::constants::LIGHT_SQUARES).is_empty();
    let has_dark = !(bishops & board::constants::DARK_SQUARES).is_empty();
    let pawns = board.pawns(side);
    let dark_pawns = (pawns & board::constants::DARK_SQUARES).count() as i32;
    let light_pawns = (pawns & board::constants::LIGHT_SQUARES).count() as i32;

    let mut score = Score::ZERO;
    if !has_light {
        let excess = (dark_pawns - light_pawns).max(0);
        score += COLOUR_WEAKNESS_PENALTY * excess;
    }
    if !has_dark {
        let excess = (light_pawns - dark_pawns).max(0);
        score += COLOUR_WEAKNESS_PENALTY * excess;
    }

    score
}

fn outposts<const WHITE: bool>(board: &Board) -> Score {
    let us = if WHITE { Color::White } else { Color::Black };
    let them = us.opp();
    let us_idx = us as usize;

    let our_pawn_attacks = pawn_structure::pawn_attacks(board.pawns(us), us_idx);
    let their_pawn_attacks = pawn_structure::pawn_attacks(board.pawns(them), them as usize);
    let outpost_zone = OUTPOST_RANKS[us_idx];

    let mut score = Score::ZERO;

    for (ptype, bonus) in [
        (PieceType::Knight, KNIGHT_OUTPOST_BONUS),
        (PieceType::Bishop, BISHOP_OUTPOST_BONUS),
    ] {
        for sq in board.get_bb(ptype, us) {
            let sq_bb = Bitboard::from(sq);
            let in_zone = !(sq_bb & outpost_zone).is_empty();
            let defended = !(sq_bb & our_pawn_attacks).is_empty();
            let attacked = !(sq_bb & their_pawn_attacks).is_empty();

            if in_zone && defended && !attacked {
                score += bonus;
            }
        }
    }

    score
}

/// Reward driving the losing king to the board's edge and the winning king
/// close to it, scaled down as the phase approaches the midgame.
fn mopup_bonus(board: &Board, phase: i32, blended: Eval) -> Option<Eval> {
    use crate::score::{ENDGAME_PHASE, OPENING_PHASE};

    if phase >= ENDGAME_PHASE || blended.abs() <= 200 {
        return None;
    }

    let winning = if blended > 0 { board.current } else { board.current.opp() };
    let losing = winning.opp();

    let winning_king = board.kings(winning).first();
    let losing_king = board.kings(losing).first();

    let corner_bonus = MOPUP_CORNER_BONUS[losing_king as usize] * 10;
    let closeness_bonus = (14 - winning_king.distance(losing_king) as i32) * 4;

    let scale = OPENING_PHASE - phase;
    let raw = corner_bonus + closeness_bonus;

    Some(raw * scale / OPENING_PHASE * blended.signum())
}
