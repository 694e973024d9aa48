// history.rs - Detects when a run falls into a short cycle

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::grid::AliveSet;

pub const DEFAULT_HISTORY: usize = 10;

/// Ring of recent generation hashes.
#[derive(Debug, Clone)]
pub struct CycleDetector {
    history: Vec<u64>,
    depth: usize,
    count: usize,
}

impl CycleDetector {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self { history: Vec::with_capacity(depth), depth, count: 0 }
    }

    pub fn hash_cells(cells: &AliveSet) -> u64 {
        let mut hasher = DefaultHasher::new();
        cells.hash(&mut hasher);
        hasher.finish()
    }

    /// Records `cells`; true if they match one of the recent generations.
    pub fn check(&mut self, cells: &AliveSet) -> bool {
        let current = Self::hash_cells(cells);
        if self.history.contains(&current) {
            return true;
        }
        if self.history.len() < self.depth {
            self.history.push(current);
        } else {
            self.history[self.count % self.depth] = current;
        }
        self.count += 1;
        false
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.count = 0;
    }
}

impl Default for CycleDetector {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}
