// life.rs - Life-like rules as a compute module
// Sparse step: only live cells and their neighbours are ever visited.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::ComputeModule;
use crate::codec::{self, StepResponse};
use crate::error::{ComputeError, LoadError};
use crate::grid::{AliveSet, Coordinate, GridSize};

/// Birth/survival rule, e.g. `B3/S23`. Bit `n` set means "n neighbours".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rule {
    birth: u16,
    survive: u16,
}

impl Rule {
    pub const fn conway() -> Self {
        Self { birth: 1 << 3, survive: (1 << 2) | (1 << 3) }
    }

    pub fn next_state(&self, alive: bool, neighbours: u8) -> bool {
        let mask = if alive { self.survive } else { self.birth };
        neighbours <= 8 && mask & (1 << neighbours) != 0
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::conway()
    }
}

impl FromStr for Rule {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| LoadError::InvalidRule {
            rule: s.to_string(),
            reason: reason.to_string(),
        };

        let mut birth = None;
        let mut survive = None;
        for part in s.trim().split('/') {
            let mut chars = part.chars();
            let slot = match chars.next().map(|c| c.to_ascii_uppercase()) {
                Some('B') => &mut birth,
                Some('S') => &mut survive,
                _ => return Err(invalid("expected `B<digits>/S<digits>`")),
            };
            if slot.is_some() {
                return Err(invalid("repeated section"));
            }
            let mut mask = 0u16;
            for c in chars {
                match c.to_digit(10) {
                    Some(n) if n <= 8 => mask |= 1 << n,
                    _ => return Err(invalid("neighbour counts must be digits 0-8")),
                }
            }
            *slot = Some(mask);
        }

        match (birth, survive) {
            // B0 would light up every empty cell, which a sparse step cannot express
            (Some(b), _) if b & 1 != 0 => Err(invalid("B0 rules are not supported")),
            (Some(birth), Some(survive)) => Ok(Self { birth, survive }),
            _ => Err(invalid("both B and S sections are required")),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = |mask: u16| {
            (0..=8u16)
                .filter(|&n| mask & (1 << n) != 0)
                .map(|n| n.to_string())
                .collect::<String>()
        };
        write!(f, "B{}/S{}", digits(self.birth), digits(self.survive))
    }
}

/// What happens at the grid edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Cells beyond the edge are always dead.
    #[default]
    Bounded,
    /// Opposite edges are joined.
    Toroidal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifeModule {
    rule: Rule,
    topology: Topology,
}

impl LifeModule {
    pub fn new(rule: Rule, topology: Topology) -> Self {
        Self { rule, topology }
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Advances `cells` by one generation. Cells outside the grid are
    /// clipped (bounded) or wrapped (toroidal) before counting.
    pub fn step(&self, cells: &AliveSet, grid: GridSize) -> AliveSet {
        let live: AliveSet = match self.topology {
            Topology::Bounded => cells.clipped_to(grid),
            Topology::Toroidal => cells.iter().map(|&c| grid.wrap(c)).collect(),
        };

        let mut counts: HashMap<Coordinate, u8> = HashMap::with_capacity(live.len() * 8);
        for &cell in &live {
            for n in cell.neighbours() {
                let n = match self.topology {
                    Topology::Bounded if !grid.contains(n) => continue,
                    Topology::Bounded => n,
                    Topology::Toroidal => grid.wrap(n),
                };
                *counts.entry(n).or_insert(0) += 1;
            }
        }

        let mut next: AliveSet = counts
            .iter()
            .filter(|&(&pos, &count)| self.rule.next_state(live.contains(pos), count))
            .map(|(&pos, _)| pos)
            .collect();

        // Isolated cells never show up in `counts`
        if self.rule.next_state(true, 0) {
            for &cell in &live {
                if !counts.contains_key(&cell) {
                    next.insert(cell);
                }
            }
        }
        next
    }
}

impl ComputeModule for LifeModule {
    fn compute_step(&self, request: &str) -> Result<String, ComputeError> {
        let request = codec::decode_request(request)?;
        let grid = GridSize::new(request.grid_size.width, request.grid_size.height)
            .map_err(|e| ComputeError::Rejected(e.to_string()))?;
        let alive_cells = self.step(&request.alive_cells, grid);
        codec::encode_response(&StepResponse { alive_cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(list: &[(i32, i32)]) -> AliveSet {
        list.iter().copied().collect()
    }

    fn grid(w: u32, h: u32) -> GridSize {
        GridSize::new(w, h).unwrap()
    }

    #[test]
    fn blinker_oscillates() {
        let life = LifeModule::default();
        let horizontal = cells(&[(1, 2), (2, 2), (3, 2)]);
        let vertical = life.step(&horizontal, grid(5, 5));
        assert_eq!(vertical, cells(&[(2, 1), (2, 2), (2, 3)]));
        assert_eq!(life.step(&vertical, grid(5, 5)), horizontal);
    }

    #[test]
    fn block_is_still() {
        let block = cells(&[(1, 1), (1, 2), (2, 1), (2, 2)]);
        assert_eq!(LifeModule::default().step(&block, grid(4, 4)), block);
    }

    #[test]
    fn dead_grid_stays_dead() {
        for size in [grid(1, 1), grid(7, 3), grid(250, 250)] {
            assert!(LifeModule::default().step(&AliveSet::new(), size).is_empty());
        }
    }

    #[test]
    fn bounded_edge_clips_births() {
        // Blinker on the top edge loses its upper arm
        let edge = cells(&[(0, 0), (1, 0), (2, 0)]);
        assert_eq!(LifeModule::default().step(&edge, grid(5, 5)), cells(&[(1, 0), (1, 1)]));
    }

    #[test]
    fn cells_outside_bounded_grid_vanish() {
        let outside = cells(&[(-1, 0), (-2, 0), (-3, 0)]);
        assert!(LifeModule::default().step(&outside, grid(5, 5)).is_empty());
    }

    #[test]
    fn torus_wraps_edges() {
        let life = LifeModule::new(Rule::conway(), Topology::Toroidal);
        let edge = cells(&[(0, 0), (1, 0), (2, 0)]);
        assert_eq!(life.step(&edge, grid(5, 5)), cells(&[(1, 4), (1, 0), (1, 1)]));
    }

    #[test]
    fn rule_parsing() {
        assert_eq!("B3/S23".parse::<Rule>().unwrap(), Rule::conway());
        assert_eq!("s23/b3".parse::<Rule>().unwrap(), Rule::conway());
        assert_eq!("B36/S23".parse::<Rule>().unwrap().to_string(), "B36/S23");
        assert_eq!("B3/S".parse::<Rule>().unwrap().to_string(), "B3/S");
        for bad in ["", "B3", "X3/S23", "B39/S23", "B3/S23/B4", "B03/S23"] {
            assert!(bad.parse::<Rule>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn survival_with_zero_neighbours() {
        let life = LifeModule::new("B3/S012345678".parse().unwrap(), Topology::Bounded);
        let lonely = cells(&[(2, 2)]);
        assert_eq!(life.step(&lonely, grid(5, 5)), lonely);
    }

    #[test]
    fn compute_step_rejects_zero_grid() {
        let err = LifeModule::default()
            .compute_step(r#"{"alive_cells":[],"grid_size":[0,5]}"#)
            .unwrap_err();
        assert!(matches!(err, ComputeError::Rejected(_)));
    }

    #[test]
    fn compute_step_rejects_oversized_grid() {
        let request = format!(
            r#"{{"alive_cells":[[-1,2],[0,2],[1,2]],"grid_size":[{},5]}}"#,
            u32::MAX
        );
        let err = LifeModule::new(Rule::conway(), Topology::Toroidal)
            .compute_step(&request)
            .unwrap_err();
        assert!(matches!(err, ComputeError::Rejected(_)), "{err:?}");
    }

    #[test]
    fn torus_wraps_at_widest_grid() {
        let life = LifeModule::new(Rule::conway(), Topology::Toroidal);
        let wide = GridSize::new(crate::grid::MAX_GRID_SIDE, 5).unwrap();
        let next = life.step(&cells(&[(-1, 2), (0, 2), (1, 2)]), wide);
        assert_eq!(next, cells(&[(0, 1), (0, 2), (0, 3)]));
        assert!(next.iter().all(|&c| wide.contains(c)));
    }

    #[test]
    fn compute_step_rejects_malformed_text() {
        let err = LifeModule::default().compute_step(r#"{"grid_size":[5,5]}"#).unwrap_err();
        assert!(matches!(err, ComputeError::InvalidRequest(_)));
    }
}
