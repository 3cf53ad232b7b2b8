//! Cross-shaped board geometry: cells, railways, corner junctions
//!
//! The board is a square grid of which only the cross is addressable: four
//! seat zones of `ZONE_DEPTH` rows by `ZONE_WIDTH` columns around a central
//! hub of `ZONE_WIDTH` by `ZONE_WIDTH`. Everything here is independent of
//! occupancy.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Rows per seat zone (front row to back row)
pub const ZONE_DEPTH: i8 = 6;

/// Columns per seat zone, also the hub side length
pub const ZONE_WIDTH: i8 = 5;

/// Side length of the standard grid
pub const BOARD_SIZE: i8 = 2 * ZONE_DEPTH + ZONE_WIDTH;

/// Orthogonal direction vectors (row, col)
pub const ORTHOGONAL: [(i8, i8); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

/// Diagonal direction vectors (row, col)
pub const DIAGONAL: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, 1), (1, -1)];

// ============================================================================
// POSITION
// ============================================================================

/// Grid coordinate (row, col)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: i8,
    pub col: i8,
}

impl Position {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    pub fn offset(self, dr: i8, dc: i8) -> Self {
        Self::new(self.row + dr, self.col + dc)
    }

    /// Number of orthogonal steps between two positions
    pub fn distance_to(self, other: Position) -> u8 {
        ((self.row - other.row).unsigned_abs()) + ((self.col - other.col).unsigned_abs())
    }

    pub fn is_orthogonal_neighbor(self, other: Position) -> bool {
        self.distance_to(other) == 1
    }

    pub fn is_diagonal_neighbor(self, other: Position) -> bool {
        (self.row - other.row).abs() == 1 && (self.col - other.col).abs() == 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

// ============================================================================
// SEATS AND TEAMS
// ============================================================================

/// One of the four player positions, in turn order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Seat {
    South = 0,
    East = 1,
    North = 2,
    West = 3,
}

impl Seat {
    pub const ALL: [Seat; 4] = [Seat::South, Seat::East, Seat::North, Seat::West];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// Next seat in turn order
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn partner(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    pub fn team(self) -> Team {
        match self {
            Seat::South | Seat::North => Team::NorthSouth,
            Seat::East | Seat::West => Team::EastWest,
        }
    }

    pub fn is_teammate(self, other: Seat) -> bool {
        self.team() == other.team()
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Seat::South => "south",
            Seat::East => "east",
            Seat::North => "north",
            Seat::West => "west",
        };
        f.write_str(name)
    }
}

/// Seats 0/2 and 1/3 play together
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    NorthSouth,
    EastWest,
}

impl Team {
    pub fn seats(self) -> [Seat; 2] {
        match self {
            Team::NorthSouth => [Seat::South, Seat::North],
            Team::EastWest => [Seat::East, Seat::West],
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Team::NorthSouth => Team::EastWest,
            Team::EastWest => Team::NorthSouth,
        }
    }
}

// ============================================================================
// CELLS
// ============================================================================

/// Terrain classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Normal,
    Campsite,
    Headquarters,
    RailwayStation,
}

/// Static facts about one addressable cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellInfo {
    pub kind: CellKind,
    /// Part of a horizontal railway line
    pub rail_horizontal: bool,
    /// Part of a vertical railway line
    pub rail_vertical: bool,
    /// Owning zone; `None` for hub cells
    pub zone: Option<Seat>,
    /// Zone-local (depth, lateral); hub cells use (-1, -1)
    pub local: (i8, i8),
    /// A piece may end its move here
    pub stoppable: bool,
}

impl CellInfo {
    pub fn is_railway(&self) -> bool {
        self.rail_horizontal || self.rail_vertical
    }
}

// ============================================================================
// TOPOLOGY
// ============================================================================

/// Immutable board layout shared by every board snapshot
#[derive(Debug)]
pub struct Topology {
    depth: i8,
    width: i8,
    size: i8,
    cells: Vec<Option<CellInfo>>,
    /// Railway neighbours of each cell, corner junctions included
    rail_adjacency: Vec<Vec<Position>>,
    /// Curved junctions, one entry per unordered pair
    corners: Vec<(Position, Position)>,
}

impl Topology {
    /// Build a cross with the given zone depth and width
    pub fn new(depth: i8, width: i8) -> Self {
        assert!(depth >= 4 && width >= 5 && width % 2 == 1, "unsupported board shape {depth}x{width}");
        let size = 2 * depth + width;
        let mut topology = Self {
            depth,
            width,
            size,
            cells: vec![None; (size as usize) * (size as usize)],
            rail_adjacency: Vec::new(),
            corners: Vec::new(),
        };

        for row in 0..size {
            for col in 0..size {
                let pos = Position::new(row, col);
                let info = match topology.zone_coords(pos) {
                    Some((seat, d, l)) => Some(topology.zone_cell(seat, d, l)),
                    None => topology.hub_cell(pos),
                };
                let idx = topology.index(pos);
                topology.cells[idx] = info;
            }
        }

        topology.corners = topology.find_corners();
        topology.rail_adjacency = topology.build_rail_adjacency();
        topology
    }

    /// The 17x17 board, built once and shared
    pub fn standard() -> Arc<Topology> {
        static STANDARD: OnceLock<Arc<Topology>> = OnceLock::new();
        STANDARD
            .get_or_init(|| Arc::new(Topology::new(ZONE_DEPTH, ZONE_WIDTH)))
            .clone()
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn size(&self) -> i8 {
        self.size
    }

    pub fn zone_depth(&self) -> i8 {
        self.depth
    }

    pub fn zone_width(&self) -> i8 {
        self.width
    }

    pub(crate) fn index(&self, pos: Position) -> usize {
        pos.row as usize * self.size as usize + pos.col as usize
    }

    fn in_grid(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.col >= 0 && pos.row < self.size && pos.col < self.size
    }

    /// Whether the position is a cell of the cross
    pub fn contains(&self, pos: Position) -> bool {
        self.in_grid(pos) && self.cells[self.index(pos)].is_some()
    }

    /// Cell facts; panics when the position is not on the cross
    pub fn cell(&self, pos: Position) -> &CellInfo {
        match self.in_grid(pos).then(|| self.cells[self.index(pos)].as_ref()).flatten() {
            Some(info) => info,
            None => panic!("position {pos} is not a cell of the board"),
        }
    }

    /// Every addressable position, row-major
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size)
            .flat_map(move |row| (0..self.size).map(move |col| Position::new(row, col)))
            .filter(move |&pos| self.contains(pos))
    }

    pub fn classify(&self, pos: Position) -> CellKind {
        self.cell(pos).kind
    }

    pub fn is_railway(&self, pos: Position) -> bool {
        self.cell(pos).is_railway()
    }

    pub fn in_hub(&self, pos: Position) -> bool {
        let (lo, hi) = self.hub_bounds();
        (lo..=hi).contains(&pos.row) && (lo..=hi).contains(&pos.col)
    }

    /// Hub station or any zone cell
    pub fn is_stoppable(&self, pos: Position) -> bool {
        self.cell(pos).stoppable
    }

    pub fn zone_of(&self, pos: Position) -> Option<Seat> {
        self.cell(pos).zone
    }

    /// Zone and (depth, lateral) of a zone cell
    pub fn zone_local(&self, pos: Position) -> Option<(Seat, i8, i8)> {
        let info = self.cell(pos);
        info.zone.map(|seat| (seat, info.local.0, info.local.1))
    }

    /// Whether `pos` lies in the back two rows of `seat`'s zone
    pub fn in_back_rows(&self, pos: Position, seat: Seat) -> bool {
        matches!(self.zone_local(pos), Some((s, d, _)) if s == seat && d >= self.depth - 2)
    }

    /// Headquarters cells of a seat
    pub fn headquarters(&self, seat: Seat) -> [Position; 2] {
        [
            self.to_global(seat, self.depth - 1, 1),
            self.to_global(seat, self.depth - 1, self.width - 2),
        ]
    }

    /// Zone-local to grid coordinate. Depth -1 addresses the hub row in
    /// front of the zone.
    pub fn to_global(&self, seat: Seat, depth: i8, lateral: i8) -> Position {
        let (lo, hi) = self.hub_bounds();
        match seat {
            Seat::South => Position::new(hi + 1 + depth, lo + lateral),
            Seat::East => Position::new(hi - lateral, hi + 1 + depth),
            Seat::North => Position::new(lo - 1 - depth, hi - lateral),
            Seat::West => Position::new(lo + lateral, lo - 1 - depth),
        }
    }

    // ========================================================================
    // ADJACENCY AND RAILWAYS
    // ========================================================================

    /// One-step adjacency: orthogonal, or diagonal when either end is a campsite
    pub fn are_adjacent(&self, a: Position, b: Position) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        if a.is_orthogonal_neighbor(b) {
            return true;
        }
        a.is_diagonal_neighbor(b)
            && (self.classify(a) == CellKind::Campsite || self.classify(b) == CellKind::Campsite)
    }

    /// Orthogonal railway link with consistent orientation
    pub fn rail_linked(&self, a: Position, b: Position) -> bool {
        if !self.contains(a) || !self.contains(b) || !a.is_orthogonal_neighbor(b) {
            return false;
        }
        let (ca, cb) = (self.cell(a), self.cell(b));
        if a.row == b.row {
            ca.rail_horizontal && cb.rail_horizontal
        } else {
            ca.rail_vertical && cb.rail_vertical
        }
    }

    /// Curved-junction partners of a cell
    pub fn corner_neighbors(&self, pos: Position) -> Vec<Position> {
        self.corners
            .iter()
            .filter_map(|&(a, b)| {
                if a == pos {
                    Some(b)
                } else if b == pos {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }

    /// All curved junctions
    pub fn corners(&self) -> &[(Position, Position)] {
        &self.corners
    }

    /// Railway graph neighbours (straight links plus junctions)
    pub fn rail_neighbors(&self, pos: Position) -> &[Position] {
        &self.rail_adjacency[self.index(pos)]
    }

    /// Whether `pos` is on the outer depth line that runs into `corner`
    pub fn on_through_line(&self, pos: Position, corner: Position) -> bool {
        match (self.zone_local(pos), self.zone_local(corner)) {
            (Some((s, d, l)), Some((cs, 0, cl))) => s == cs && l == cl && d <= self.depth - 2,
            _ => false,
        }
    }

    /// Front-row middle cell that may not step straight into the hub
    pub fn is_front_center(&self, pos: Position) -> bool {
        matches!(self.zone_local(pos), Some((_, 0, l)) if l == self.width / 2)
    }

    /// For a front corner cell, the two orthogonal neighbours towards the
    /// hub whose joint occupation jams an engineer standing there
    pub fn jam_neighbors(&self, pos: Position) -> Option<[Position; 2]> {
        let (seat, d, l) = self.zone_local(pos)?;
        if d != 0 || (l != 0 && l != self.width - 1) {
            return None;
        }
        let inward = if l == 0 { 1 } else { l - 1 };
        Some([self.to_global(seat, -1, l), self.to_global(seat, 0, inward)])
    }

    // ========================================================================
    // CONSTRUCTION HELPERS
    // ========================================================================

    fn hub_bounds(&self) -> (i8, i8) {
        (self.depth, self.depth + self.width - 1)
    }

    fn zone_coords(&self, pos: Position) -> Option<(Seat, i8, i8)> {
        let (lo, hi) = self.hub_bounds();
        let row_in = (lo..=hi).contains(&pos.row);
        let col_in = (lo..=hi).contains(&pos.col);
        if col_in && pos.row > hi {
            Some((Seat::South, pos.row - hi - 1, pos.col - lo))
        } else if row_in && pos.col > hi {
            Some((Seat::East, pos.col - hi - 1, hi - pos.row))
        } else if col_in && pos.row < lo {
            Some((Seat::North, lo - 1 - pos.row, hi - pos.col))
        } else if row_in && pos.col < lo {
            Some((Seat::West, lo - 1 - pos.col, pos.row - lo))
        } else {
            None
        }
    }

    fn zone_cell(&self, seat: Seat, d: i8, l: i8) -> CellInfo {
        let (depth, width) = (self.depth, self.width);
        let headquarters = d == depth - 1 && (l == 1 || l == width - 2);
        let campsite = (1..=depth - 3).contains(&d) && (1..=width - 2).contains(&l) && (d + l) % 2 == 0;
        let lateral_rail = !campsite && (d == 0 || d == depth - 2);
        let depth_rail = (l == 0 || l == width - 1) && d <= depth - 2;

        let kind = if headquarters {
            CellKind::Headquarters
        } else if campsite {
            CellKind::Campsite
        } else if lateral_rail || depth_rail {
            CellKind::RailwayStation
        } else {
            CellKind::Normal
        };

        // South/North zones run laterally along rows; East/West along columns
        let (rail_horizontal, rail_vertical) = match seat {
            Seat::South | Seat::North => (lateral_rail, depth_rail),
            Seat::East | Seat::West => (depth_rail, lateral_rail),
        };

        CellInfo {
            kind,
            rail_horizontal,
            rail_vertical,
            zone: Some(seat),
            local: (d, l),
            stoppable: true,
        }
    }

    fn hub_cell(&self, pos: Position) -> Option<CellInfo> {
        if !self.in_hub(pos) {
            return None;
        }
        let (lo, _) = self.hub_bounds();
        let lines = [0, self.width / 2, self.width - 1];
        let row_line = lines.contains(&(pos.row - lo));
        let col_line = lines.contains(&(pos.col - lo));
        if !row_line && !col_line {
            return None;
        }
        let center = pos.row - lo == self.width / 2 && pos.col - lo == self.width / 2;
        let station = row_line && col_line && !center;
        Some(CellInfo {
            kind: if station { CellKind::RailwayStation } else { CellKind::Normal },
            rail_horizontal: row_line,
            rail_vertical: col_line,
            zone: None,
            local: (-1, -1),
            stoppable: station,
        })
    }

    fn find_corners(&self) -> Vec<(Position, Position)> {
        let mut corners = Vec::new();
        for seat in Seat::ALL {
            for l in [0, self.width - 1] {
                let p = self.to_global(seat, 0, l);
                for (dr, dc) in DIAGONAL {
                    let q = p.offset(dr, dc);
                    if !self.contains(q) {
                        continue;
                    }
                    if let Some((other, 0, ql)) = self.zone_local(q) {
                        if other != seat && (ql == 0 || ql == self.width - 1) && p < q {
                            corners.push((p, q));
                        }
                    }
                }
            }
        }
        corners
    }

    fn build_rail_adjacency(&self) -> Vec<Vec<Position>> {
        let mut adjacency = vec![Vec::new(); self.cells.len()];
        for pos in self.positions() {
            if !self.is_railway(pos) {
                continue;
            }
            let idx = self.index(pos);
            for (dr, dc) in ORTHOGONAL {
                let next = pos.offset(dr, dc);
                if self.rail_linked(pos, next) {
                    adjacency[idx].push(next);
                }
            }
            adjacency[idx].extend(self.corner_neighbors(pos));
        }
        adjacency
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn topo() -> Arc<Topology> {
        Topology::standard()
    }

    #[test]
    fn test_cross_shape() {
        let t = topo();
        assert_eq!(t.size(), 17);
        assert!(!t.contains(Position::new(0, 0)));
        assert!(!t.contains(Position::new(16, 16)));
        assert!(t.contains(Position::new(16, 8)));
        assert!(t.contains(Position::new(8, 0)));
        assert!(!t.contains(Position::new(-1, 8)));
        // Hub cells off the track lines are not part of the board
        assert!(!t.contains(Position::new(7, 7)));
        assert!(t.contains(Position::new(7, 8)));
    }

    #[test]
    fn test_cell_counts() {
        let t = topo();
        let zone_cells = t.positions().filter(|&p| t.zone_of(p).is_some()).count();
        assert_eq!(zone_cells, 4 * 30);
        let campsites = t.positions().filter(|&p| t.classify(p) == CellKind::Campsite).count();
        assert_eq!(campsites, 20);
        let hq = t.positions().filter(|&p| t.classify(p) == CellKind::Headquarters).count();
        assert_eq!(hq, 8);
        let stations = t.positions().filter(|&p| t.in_hub(p) && t.is_stoppable(p)).count();
        assert_eq!(stations, 8);
    }

    #[test]
    fn test_hub_center_is_pass_through() {
        let t = topo();
        let center = Position::new(8, 8);
        assert!(t.is_railway(center));
        assert!(!t.is_stoppable(center));
        assert!(t.is_stoppable(Position::new(6, 8)));
        assert!(!t.is_stoppable(Position::new(10, 7)));
    }

    #[test]
    fn test_zone_mapping_round_trip() {
        let t = topo();
        for seat in Seat::ALL {
            for d in 0..ZONE_DEPTH {
                for l in 0..ZONE_WIDTH {
                    let pos = t.to_global(seat, d, l);
                    assert_eq!(t.zone_local(pos), Some((seat, d, l)));
                }
            }
        }
    }

    #[test]
    fn test_headquarters_in_back_row() {
        let t = topo();
        assert_eq!(t.headquarters(Seat::South), [Position::new(16, 7), Position::new(16, 9)]);
        for seat in Seat::ALL {
            for hq in t.headquarters(seat) {
                assert_eq!(t.classify(hq), CellKind::Headquarters);
                assert!(t.in_back_rows(hq, seat));
            }
        }
    }

    #[test]
    fn test_adjacency() {
        let t = topo();
        // Orthogonal
        assert!(t.are_adjacent(Position::new(12, 6), Position::new(13, 6)));
        // Diagonal through a campsite at (12,7)
        assert!(t.are_adjacent(Position::new(11, 6), Position::new(12, 7)));
        // Diagonal without a campsite
        assert!(!t.are_adjacent(Position::new(11, 6), Position::new(10, 5)));
    }

    #[test]
    fn test_rail_links_respect_orientation() {
        let t = topo();
        assert!(t.rail_linked(Position::new(11, 6), Position::new(10, 6)));
        // Front row and hub edge are parallel lines with no cross link
        assert!(!t.rail_linked(Position::new(11, 7), Position::new(10, 7)));
        assert!(!t.rail_linked(Position::new(11, 8), Position::new(10, 8)));
        // Zone side line continues into the hub
        assert!(t.rail_linked(Position::new(10, 5), Position::new(10, 6)));
    }

    #[test]
    fn test_corners() {
        let t = topo();
        assert_eq!(t.corners().len(), 4);
        assert_eq!(t.corner_neighbors(Position::new(11, 6)), vec![Position::new(10, 5)]);
        assert_eq!(t.corner_neighbors(Position::new(6, 11)), vec![Position::new(5, 10)]);
        assert!(t.corner_neighbors(Position::new(11, 8)).is_empty());
    }

    #[test]
    fn test_through_line() {
        let t = topo();
        let corner = Position::new(11, 6);
        assert!(t.on_through_line(Position::new(15, 6), corner));
        assert!(!t.on_through_line(Position::new(16, 6), corner));
        assert!(!t.on_through_line(Position::new(11, 8), corner));
    }

    #[test]
    fn test_jam_neighbors() {
        let t = topo();
        assert_eq!(
            t.jam_neighbors(Position::new(11, 6)),
            Some([Position::new(10, 6), Position::new(11, 7)])
        );
        assert_eq!(t.jam_neighbors(Position::new(11, 8)), None);
    }

    #[test]
    fn test_teams() {
        assert_eq!(Seat::South.team(), Seat::North.team());
        assert_ne!(Seat::South.team(), Seat::East.team());
        assert_eq!(Seat::West.next(), Seat::South);
        assert_eq!(Seat::East.partner(), Seat::West);
    }

    #[test]
    #[should_panic]
    fn test_cell_lookup_off_board_panics() {
        topo().cell(Position::new(0, 0));
    }
}
