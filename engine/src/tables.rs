//! The transposition table (C3): a fixed-size array keyed by position hash,
//! storing depth, score, bound kind, best line and static eval.

use arrayvec::ArrayVec;

use board::movegen::moves::Move;
use board::zobrist::ZHash;

use crate::score::{Eval, EvalExt, LOOKUP_FAILED};
use crate::MAX_PLY;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone)]
pub struct TTEntry {
    pub hash: ZHash,
    pub eval: Eval,
    pub line: ArrayVec<Move, MAX_PLY>,
    pub depth: u8,
    pub bound: Bound,
    pub static_eval: Eval,
}

impl TTEntry {
    fn empty() -> Self {
        TTEntry {
            hash: ZHash::EMPTY,
            eval: LOOKUP_FAILED,
            line: ArrayVec::new(),
            depth: 0,
            bound: Bound::Exact,
            static_eval: LOOKUP_FAILED,
        }
    }

    fn is_empty(&self) -> bool {
        self.hash == ZHash::EMPTY
    }
}

pub struct TranspositionTable {
    slots: Vec<TTEntry>,
}

impl TranspositionTable {
    pub fn new(table_size: usize) -> Self {
        let table_size = table_size.max(1);
        TranspositionTable {
            slots: (0..table_size).map(|_| TTEntry::empty()).collect(),
        }
    }

    fn index(&self, hash: ZHash) -> usize {
        ((hash.as_u64() >> 36) as usize) % self.slots.len()
    }

    /// Read the slot for `hash`. Returns the entry and whether it was
    /// actually stored for this position (as opposed to an empty or
    /// colliding slot).
    pub fn probe(&self, hash: ZHash) -> Option<&TTEntry> {
        let entry = &self.slots[self.index(hash)];
        if entry.is_empty() || entry.hash != hash {
            None
        } else {
            Some(entry)
        }
    }

    /// Look up a usable score for `hash` at `depth`, correcting mate
    /// distances for `ply`. Returns `LOOKUP_FAILED` when nothing usable is
    /// stored.
    pub fn lookup_eval(&self, hash: ZHash, depth: u8, ply: usize, alpha: Eval, beta: Eval) -> Eval {
        let Some(entry) = self.probe(hash) else { return LOOKUP_FAILED };

        if entry.depth < depth || entry.eval == LOOKUP_FAILED {
            return LOOKUP_FAILED;
        }

        let corrected = entry.eval.relative(ply);

        match entry.bound {
            Bound::Exact => corrected,
            Bound::Upper if corrected <= alpha => corrected,
            Bound::Lower if corrected >= beta => corrected,
            _ => LOOKUP_FAILED,
        }
    }

    pub fn store(
        &mut self,
        hash: ZHash,
        depth: u8,
        ply: usize,
        eval: Eval,
        bound: Bound,
        line: ArrayVec<Move, MAX_PLY>,
        static_eval: Eval,
    ) {
        let index = self.index(hash);
        let slot = &self.slots[index];

        if depth < slot.depth && slot.hash == hash {
            return;
        }
        if depth < slot.depth && !slot.is_empty() {
            return;
        }

        self.slots[index] = TTEntry {
            hash,
            eval: eval.absolute(ply),
            line,
            depth,
            bound,
            static_eval,
        };
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = TTEntry::empty();
        }
    }

    /// Fraction of occupied slots, in per-mille (0-1000), for the UCI
    /// `hashfull` report.
    pub fn hashfull(&self) -> u32 {
        let sample = self.slots.len().min(1000);
        let occupied = self.slots[..sample].iter().filter(|e| !e.is_empty()).count();
        (occupied * 1000 / sample.max(1)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn hash(n: u64) -> ZHash {
        ZHash(n)
    }

    #[test]
    fn monotonic_depth_overwrite() {
        let mut tt = TranspositionTable::new(1024);
        let key = hash(0xDEAD_BEEF);
        let mv = Move::from_str("e2e4").unwrap();
        let mut line = ArrayVec::new();
        line.push(mv);

        tt.store(key, 5, 0, 100, Bound::Exact, line.clone(), 100);
        tt.store(key, 3, 0, 50, Bound::Exact, line.clone(), 50);
        assert_eq!(tt.probe(key).unwrap().depth, 5);

        tt.store(key, 7, 0, 80, Bound::Exact, line, 80);
        assert_eq!(tt.probe(key).unwrap().depth, 7);
    }

    #[test]
    fn probe_misses_on_collision() {
        let mut tt = TranspositionTable::new(4);
        let key = hash(1);
        tt.store(key, 2, 0, 10, Bound::Exact, ArrayVec::new(), 10);
        assert!(tt.probe(hash(999_999)).is_none() || tt.probe(hash(999_999)).unwrap().hash != hash(999_999));
    }

    #[test]
    fn clear_empties_all_slots() {
        let mut tt = TranspositionTable::new(16);
        let key = hash(42);
        tt.store(key, 1, 0, 5, Bound::Exact, ArrayVec::new(), 5);
        assert!(tt.probe(key).is_some());
        tt.clear();
        assert!(tt.probe(key).is_none());
    }
}
