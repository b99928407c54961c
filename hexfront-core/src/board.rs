//! Hex board geometry with offset ("odd columns shifted down") coordinates
//!
//! Columns are `x`, rows are `y`. Odd columns sit half a hex lower than even
//! columns, so the two parities use mirrored neighbor tables. The bottom row
//! has no cell in odd columns.

use serde::{Deserialize, Serialize};

/// Offset hex coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub x: i32,
    pub y: i32,
}

impl Hex {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_odd_column(&self) -> bool {
        self.x.rem_euclid(2) == 1
    }

    fn offset(&self, (dx, dy): (i32, i32)) -> Hex {
        Hex::new(self.x + dx, self.y + dy)
    }
}

/// Neighbor order used for search expansion: N, NE, SE, S, SW, NW
const EVEN_COLUMN_NEIGHBORS: [(i32, i32); 6] = [(0, -1), (1, -1), (1, 0), (0, 1), (-1, 0), (-1, -1)];
const ODD_COLUMN_NEIGHBORS: [(i32, i32); 6] = [(0, -1), (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0)];

/// Edge index order used for river and road storage: SE, S, SW, NW, N, NE
const EVEN_COLUMN_EDGES: [(i32, i32); 6] = [(1, 0), (0, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];
const ODD_COLUMN_EDGES: [(i32, i32); 6] = [(1, 1), (0, 1), (-1, 1), (-1, 0), (0, -1), (1, 0)];

pub const EDGE_COUNT: u8 = 6;

fn neighbor_offsets(hex: Hex) -> &'static [(i32, i32); 6] {
    if hex.is_odd_column() {
        &ODD_COLUMN_NEIGHBORS
    } else {
        &EVEN_COLUMN_NEIGHBORS
    }
}

fn edge_offsets(hex: Hex) -> &'static [(i32, i32); 6] {
    if hex.is_odd_column() {
        &ODD_COLUMN_EDGES
    } else {
        &EVEN_COLUMN_EDGES
    }
}

/// Edge of `b` that faces `a`, given the edge of `a` that faces `b`
pub fn opposite_edge(edge: u8) -> u8 {
    (edge + 3) % EDGE_COUNT
}

/// Edge index of `from` shared with `to`, `None` when not adjacent
pub fn edge_between(from: Hex, to: Hex) -> Option<u8> {
    let delta = (to.x - from.x, to.y - from.y);
    edge_offsets(from)
        .iter()
        .position(|&offset| offset == delta)
        .map(|i| i as u8)
}

/// Hex on the other side of an edge (may be off the grid)
pub fn across_edge(hex: Hex, edge: u8) -> Hex {
    hex.offset(edge_offsets(hex)[(edge % EDGE_COUNT) as usize])
}

/// Rectangular grid dimensions with the clipped bottom row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: i32,
    pub height: i32,
}

impl GridSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Check if this hex exists on the grid
    pub fn contains(&self, hex: Hex) -> bool {
        hex.x >= 0
            && hex.x < self.width
            && hex.y >= 0
            && hex.y < self.height
            && !(hex.y == self.height - 1 && hex.is_odd_column())
    }

    /// Adjacent in-bounds hexes in N, NE, SE, S, SW, NW order
    pub fn adjacent_hexes(&self, hex: Hex) -> Vec<Hex> {
        neighbor_offsets(hex)
            .iter()
            .map(|&offset| hex.offset(offset))
            .filter(|&h| self.contains(h))
            .collect()
    }

    /// All grid hexes, row-major
    pub fn hexes(&self) -> impl Iterator<Item = Hex> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| Hex::new(x, y)))
            .filter(move |&h| self.contains(h))
    }

    /// Last existing row of a column
    pub fn last_row(&self, x: i32) -> i32 {
        if x.rem_euclid(2) == 1 {
            self.height - 2
        } else {
            self.height - 1
        }
    }
}

/// Pixel layout of the grid (view helper, does not affect adjacency)
#[derive(Clone, Copy, Debug, Serialize)]
pub struct HexLayout {
    pub radius: f32,
}

impl HexLayout {
    pub fn hex_width(&self) -> f32 {
        2.0 * self.radius
    }

    pub fn hex_height(&self) -> f32 {
        3f32.sqrt() * self.radius
    }

    /// Top-left corner of the hex's bounding box
    pub fn position(&self, hex: Hex) -> (f32, f32) {
        let x = hex.x as f32 * self.hex_width() * 0.75;
        let stagger = if hex.is_odd_column() { 0.5 * self.hex_height() } else { 0.0 };
        let y = hex.y as f32 * self.hex_height() + stagger;
        (x, y)
    }
}
