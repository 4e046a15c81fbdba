//! The search engine's public entry point: `SearchContext` carries all the
//! mutable state a search needs (history, killers, TT, node bookkeeping),
//! `SearchConfig` the knobs it's tuned by, and [`search_best_move`] drives
//! iterative deepening to completion or cancellation.

pub mod negamax;
pub mod quiescence;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use board::movegen::moves::Move;
use uci::search_info::{Score as UciScore, SearchInfo};

use crate::position::Position;
use crate::score::{Eval, EvalExt, NEG_INF, NULL_SCORE, POS_INF};
use crate::search_tables::{HistoryTable, Killers, PVTable};
use crate::tables::TranspositionTable;
use crate::MAX_PLY;

/// Tuning knobs, set once per search and never mutated while it runs.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub use_tt: bool,
    pub reset_tt: bool,
    pub order_moves: bool,
    pub multipv: usize,
    pub iid_depth_reduction: u8,
    pub probcut_depth_reduction: u8,
    pub verification_min_depth: u8,
    pub lmr_min_threshold: usize,
    pub lmr_percentage: u32,
    pub shallow_depth_threshold: u8,
    pub max_depth: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            use_tt: true,
            reset_tt: false,
            order_moves: true,
            multipv: 1,
            iid_depth_reduction: 5,
            probcut_depth_reduction: 4,
            verification_min_depth: 6,
            lmr_min_threshold: 3,
            lmr_percentage: 50,
            shallow_depth_threshold: 8,
            max_depth: 64,
        }
    }
}

/// Per-ply transient state: the static evaluation (undefined while in
/// check), addressable by relative ply for the improving heuristic.
#[derive(Debug, Default, Copy, Clone)]
pub struct NodeState {
    pub static_eval: Option<Eval>,
}

pub struct SearchContext<'a> {
    pub tt: &'a mut TranspositionTable,
    pub killers: [Killers; MAX_PLY],
    pub history: HistoryTable,
    pub node_stack: [NodeState; MAX_PLY],
    pub abort: Arc<AtomicBool>,
    pub config: SearchConfig,
    pub nodes: u64,
    pub seldepth: usize,
    /// Extension budget for the in-flight iteration: "extensions < the
    /// iteration depth" per the main search's check-extension rule.
    pub max_extensions: u8,
    pub null_move_allowed: bool,
}

impl<'a> SearchContext<'a> {
    pub fn new(tt: &'a mut TranspositionTable, config: SearchConfig, abort: Arc<AtomicBool>) -> Self {
        if config.reset_tt {
            tt.clear();
        }

        SearchContext {
            tt,
            killers: [Killers::new(); MAX_PLY],
            history: HistoryTable::new(),
            node_stack: [NodeState::default(); MAX_PLY],
            abort,
            nodes: 0,
            seldepth: 0,
            max_extensions: config.max_depth,
            null_move_allowed: true,
            config,
        }
    }

    pub fn aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    pub fn bump_nodes(&mut self) {
        self.nodes += 1;
    }

    pub fn record_seldepth(&mut self, ply: usize) {
        self.seldepth = self.seldepth.max(ply);
    }

    pub fn grandparent_eval(&self, ply: usize) -> Option<Eval> {
        ply.checked_sub(2).and_then(|gp| self.node_stack[gp].static_eval)
    }
}

/// A completed root line: its score and principal variation.
#[derive(Debug, Clone)]
struct RootLine {
    score: Eval,
    pv: PVTable,
}

/// Drive iterative deepening from depth 1 until the abort flag, elapsed
/// time, or the configured max depth stops it. Returns the best line found
/// at the last fully-completed depth.
pub fn search_best_move(
    root: &Position,
    tt: &mut TranspositionTable,
    config: SearchConfig,
    abort: Arc<AtomicBool>,
    optimum_time: Option<Duration>,
    mut on_info: impl FnMut(&SearchInfo),
) -> Vec<Move> {
    let start = Instant::now();
    let multipv = config.multipv.max(1);
    let mut ctx = SearchContext::new(tt, config.clone(), abort);

    let mut previous: Vec<RootLine> = Vec::new();
    let mut last_complete: Vec<Move> = Vec::new();

    'iterative: for depth in 1..=config.max_depth {
        ctx.seldepth = 0;
        ctx.max_extensions = depth;
        let mut exclude: Vec<Move> = Vec::new();
        let mut this_depth: Vec<RootLine> = Vec::new();

        for pv_index in 0..multipv {
            let guess = previous.get(pv_index).map(|l| l.score);
            let (mut alpha, mut beta) = aspiration_window(guess, depth);

            let (score, line) = loop {
                if ctx.aborted() || past_optimum(start, optimum_time) {
                    break 'iterative;
                }

                let (score, line) = negamax::search(&mut ctx, root, 0, depth as i32, alpha, beta, &exclude, 0);

                if ctx.aborted() || score == NULL_SCORE {
                    break 'iterative;
                }

                if score <= alpha && alpha > NEG_INF {
                    alpha = widen(alpha, guess.unwrap_or(score), true);
                    continue;
                }
                if score >= beta && beta < POS_INF {
                    beta = widen(beta, guess.unwrap_or(score), false);
                    continue;
                }

                break (score, line);
            };

            if let Some(mv) = line.pv_move() {
                exclude.push(mv);
            }
            this_depth.push(RootLine { score, pv: line.clone() });

            let elapsed = start.elapsed().as_millis() as u64;
            let info = SearchInfo {
                depth: Some(depth),
                seldepth: Some(ctx.seldepth as u8),
                multipv: Some((pv_index + 1) as u8),
                time: Some(elapsed),
                nodes: Some(ctx.nodes as u32),
                score: Some(to_uci_score(score)),
                currmove: None,
                currmovenumber: None,
                hashfull: Some(ctx.tt.hashfull()),
                nps: Some(nps(ctx.nodes, elapsed)),
                pv: line.moves().to_vec(),
            };
            on_info(&info);
        }

        previous = this_depth;
        last_complete = previous
            .first()
            .map(|l| l.pv.moves().to_vec())
            .unwrap_or(last_complete);

        if let Some(optimum) = optimum_time {
            if start.elapsed() > optimum {
                break;
            }
        }
    }

    last_complete
}

/// Open `[eval - 25, eval + 25]` for depths past the first; full width
/// otherwise (there's no prior score to centre a window on).
fn aspiration_window(guess: Option<Eval>, depth: u8) -> (Eval, Eval) {
    match guess.filter(|_| depth > 1) {
        Some(eval) => (eval - 25, eval + 25),
        None => (NEG_INF, POS_INF),
    }
}

/// Quadruple the failed side of the window and re-centre on the last
/// known-good guess.
fn widen(bound: Eval, centre: Eval, failed_low: bool) -> Eval {
    let span = (centre - bound).abs().max(25) * 4;
    if failed_low {
        (centre - span).max(NEG_INF)
    } else {
        (centre + span).min(POS_INF)
    }
}

fn past_optimum(start: Instant, optimum: Option<Duration>) -> bool {
    match optimum {
        Some(d) => start.elapsed() > d,
        None => false,
    }
}

fn nps(nodes: u64, elapsed_ms: u64) -> u64 {
    if elapsed_ms == 0 {
        nodes * 1000
    } else {
        nodes * 1000 / elapsed_ms
    }
}

fn to_uci_score(score: Eval) -> UciScore {
    if score.is_mate() {
        let plies = score.mate_distance();
        let moves = (plies + 1) / 2;
        UciScore::Mate(if score > 0 { moves } else { -moves })
    } else {
        UciScore::Cp(score)
    }
}
