// patterns.rs - Starting patterns and random seeding

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::{AliveSet, Coordinate, GridSize};

/// A named pattern. Cells are `(x, y)`; only their relative layout matters.
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(i32, i32)],
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "Glider",
        cells: &[(7, 6), (8, 7), (6, 8), (7, 8), (8, 8)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(24, 25), (25, 25), (26, 25)],
    },
    Pattern {
        name: "Toad",
        cells: &[(25, 24), (26, 24), (27, 24), (24, 25), (25, 25), (26, 25)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(10, 10), (11, 10), (10, 11), (11, 11), (12, 12), (13, 12), (12, 13), (13, 13)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Top half
            (24, 20), (25, 20), (26, 20), (30, 20), (31, 20), (32, 20),
            (22, 22), (27, 22), (29, 22), (34, 22),
            (22, 23), (27, 23), (29, 23), (34, 23),
            (22, 24), (27, 24), (29, 24), (34, 24),
            (24, 25), (25, 25), (26, 25), (30, 25), (31, 25), (32, 25),
            // Bottom half (mirrored)
            (24, 27), (25, 27), (26, 27), (30, 27), (31, 27), (32, 27),
            (22, 28), (27, 28), (29, 28), (34, 28),
            (22, 29), (27, 29), (29, 29), (34, 29),
            (22, 30), (27, 30), (29, 30), (34, 30),
            (24, 32), (25, 32), (26, 32), (30, 32), (31, 32), (32, 32),
        ],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(25, 25), (26, 25), (26, 24), (25, 26), (24, 26)],
    },
    Pattern {
        name: "Gosper Glider Gun",
        cells: &[
            (1, 5), (2, 5), (1, 6), (2, 6),
            (11, 5), (11, 6), (11, 7), (12, 4), (12, 8), (13, 3), (13, 9),
            (14, 3), (14, 9), (15, 6), (16, 4), (16, 8), (17, 5), (17, 6),
            (17, 7), (18, 6), (21, 3), (21, 4), (21, 5), (22, 3), (22, 4),
            (22, 5), (23, 2), (23, 6), (25, 1), (25, 2), (25, 6), (25, 7),
            (35, 3), (35, 4), (36, 3), (36, 4),
        ],
    },
];

pub fn find(name: &str) -> Option<&'static Pattern> {
    PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

impl Pattern {
    /// (width, height) of the bounding box.
    pub fn extent(&self) -> (i32, i32) {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        (max_x - min_x + 1, max_y - min_y + 1)
    }

    fn bounds(&self) -> (i32, i32, i32, i32) {
        let init = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        self.cells.iter().fold(init, |(ax, ay, bx, by), &(x, y)| {
            (ax.min(x), ay.min(y), bx.max(x), by.max(y))
        })
    }

    /// Places the pattern centred on `grid`, clipping whatever does not fit.
    pub fn place(&self, grid: GridSize) -> AliveSet {
        let (min_x, min_y, _, _) = self.bounds();
        let (w, h) = self.extent();
        let off_x = (grid.width as i32 - w).max(0) / 2;
        let off_y = (grid.height as i32 - h).max(0) / 2;

        self.cells
            .iter()
            .map(|&(x, y)| Coordinate::new(x - min_x + off_x, y - min_y + off_y))
            .filter(|&c| grid.contains(c))
            .collect()
    }
}

/// Pseudo-random fill: each cell is alive with probability `density`.
/// The same seed gives the same grid for a given `rand` release.
pub fn random_alive_set(grid: GridSize, seed: u64, density: f64) -> AliveSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cells = AliveSet::new();
    for y in 0..grid.height as i32 {
        for x in 0..grid.width as i32 {
            if rng.r#gen::<f64>() < density {
                cells.insert(Coordinate::new(x, y));
            }
        }
    }
    cells
}
