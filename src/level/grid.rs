//! Seeded maze carving on a boolean occupancy grid
//!
//! Carving order matters: every step after the wall bands only clears cells
//! (or forces doorways), and a final repair pass joins any region the exit
//! cannot reach, so the open cells always form one connected component.

use std::collections::VecDeque;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_GRID_SIZE;
use crate::error::ConfigError;

/// Probability that a band segment becomes wall
const BAND_WALL_CHANCE: f64 = 0.65;
/// Longest unbroken run of band walls before a gap is forced
const MAX_WALL_RUN: usize = 3;
/// Diagonal passages
const MIN_DIAGONAL_LEN: usize = 3;
const MAX_DIAGONAL_LEN: usize = 6;
/// Rooms
const MIN_ROOMS: usize = 3;
const MAX_ROOMS: usize = 6;
const MIN_ROOM_SIZE: usize = 2;
const MAX_ROOM_SIZE: usize = 4;
const ROOM_PLACEMENT_ATTEMPTS: usize = 10;
const DOORWAY_ATTEMPTS: usize = 12;
/// One shortcut per this many cells
const SHORTCUT_DIVISOR: usize = 12;
const SHORTCUT_CHANCE: f64 = 0.5;
/// Open cells inward from the exit
pub const EXIT_CORRIDOR_LEN: usize = 3;

/// Cardinal direction on the grid. North is -Z, East is +X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::North, Direction::East, Direction::South, Direction::West];

    /// Grid step (dx, dz) toward the neighbor in this direction
    pub fn offset(&self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// World-space unit vector (Y-up)
    pub fn to_vec3(&self) -> Vec3 {
        let (dx, dz) = self.offset();
        Vec3::new(dx as f32, 0.0, dz as f32)
    }
}

/// Rectangular open area carved into the maze
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Room {
    x: usize,
    z: usize,
    w: usize,
    d: usize,
}

impl Room {
    /// True if the rooms overlap or touch
    fn overlaps(&self, other: &Room) -> bool {
        self.x <= other.x + other.w
            && other.x <= self.x + self.w
            && self.z <= other.z + other.d
            && other.z <= self.z + self.d
    }

    /// Interior cells bordering the room, with the direction pointing away from it
    fn perimeter(&self, width: usize, depth: usize) -> Vec<(usize, usize, Direction)> {
        let mut cells = Vec::with_capacity(2 * (self.w + self.d));
        for z in self.z..self.z + self.d {
            cells.push((self.x - 1, z, Direction::West));
            cells.push((self.x + self.w, z, Direction::East));
        }
        for x in self.x..self.x + self.w {
            cells.push((x, self.z - 1, Direction::North));
            cells.push((x, self.z + self.d, Direction::South));
        }
        cells.retain(|&(x, z, _)| x > 0 && z > 0 && x < width - 1 && z < depth - 1);
        cells
    }
}

/// Maze occupancy grid (`true` = wall), row-major by Z
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    depth: usize,
    cells: Vec<bool>,
    /// Single open boundary cell
    exit: (usize, usize),
}

impl Grid {
    /// Carve a connected maze with rooms, shortcuts and one exit
    ///
    /// Deterministic for a given seed.
    pub fn generate(width: usize, depth: usize, seed: u64) -> Result<Self, ConfigError> {
        if width < MIN_GRID_SIZE || depth < MIN_GRID_SIZE {
            return Err(ConfigError::GridTooSmall {
                width,
                depth,
                min: MIN_GRID_SIZE,
            });
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let mut grid = Self::bordered(width, depth);

        grid.carve_bands(&mut rng);
        grid.carve_diagonals(&mut rng);
        grid.carve_rooms(&mut rng);
        grid.carve_shortcuts(&mut rng);
        grid.carve_exit(&mut rng);

        let repaired = grid.connect_regions();
        if repaired > 0 {
            log::warn!("Maze seed {seed}: carved {repaired} cells to join isolated regions");
        }
        debug_assert!(grid.is_connected(), "maze must be a single connected region");

        log::info!(
            "Generated {}x{} maze (seed {}): {} open cells, exit at {:?}",
            width,
            depth,
            seed,
            grid.open_count(),
            grid.exit
        );

        Ok(grid)
    }

    /// Border walls, open interior
    fn bordered(width: usize, depth: usize) -> Self {
        let mut cells = vec![false; width * depth];
        for z in 0..depth {
            for x in 0..width {
                if x == 0 || z == 0 || x == width - 1 || z == depth - 1 {
                    cells[z * width + x] = true;
                }
            }
        }
        Self {
            width,
            depth,
            cells,
            exit: (0, 0),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Exit cell (on the border)
    #[inline]
    pub fn exit(&self) -> (usize, usize) {
        self.exit
    }

    #[inline]
    fn index(&self, x: usize, z: usize) -> usize {
        z * self.width + x
    }

    /// Out-of-bounds cells count as walls
    #[inline]
    pub fn is_wall(&self, x: usize, z: usize) -> bool {
        x >= self.width || z >= self.depth || self.cells[self.index(x, z)]
    }

    #[inline]
    pub fn is_open(&self, x: usize, z: usize) -> bool {
        !self.is_wall(x, z)
    }

    #[inline]
    pub fn is_border(&self, x: usize, z: usize) -> bool {
        x == 0 || z == 0 || x == self.width - 1 || z == self.depth - 1
    }

    fn set(&mut self, x: usize, z: usize, wall: bool) {
        let i = self.index(x, z);
        self.cells[i] = wall;
    }

    /// Clear a cell unless it is on the border
    fn clear_interior(&mut self, x: usize, z: usize) {
        if x < self.width && z < self.depth && !self.is_border(x, z) {
            self.set(x, z, false);
        }
    }

    /// Neighboring cell, if inside the grid
    pub fn neighbor(&self, x: usize, z: usize, dir: Direction) -> Option<(usize, usize)> {
        let (dx, dz) = dir.offset();
        let nx = x.checked_add_signed(dx)?;
        let nz = z.checked_add_signed(dz)?;
        (nx < self.width && nz < self.depth).then_some((nx, nz))
    }

    /// True if the neighbor in `dir` exists and is open
    pub fn is_open_toward(&self, x: usize, z: usize, dir: Direction) -> bool {
        self.neighbor(x, z, dir).is_some_and(|(nx, nz)| self.is_open(nx, nz))
    }

    /// All open cells, row by row
    pub fn open_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.depth).flat_map(move |z| (0..self.width).map(move |x| (x, z))).filter(|&(x, z)| self.is_open(x, z))
    }

    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|&&wall| !wall).count()
    }

    /// Open border cells (a finished maze has exactly one: the exit)
    pub fn open_boundary_cells(&self) -> Vec<(usize, usize)> {
        self.open_cells().filter(|&(x, z)| self.is_border(x, z)).collect()
    }

    /// Cells reachable from `start` through open cells (4-connected)
    pub fn flood_fill(&self, start: (usize, usize)) -> Vec<bool> {
        let mut reached = vec![false; self.cells.len()];
        if self.is_wall(start.0, start.1) {
            return reached;
        }

        let mut queue = VecDeque::new();
        reached[self.index(start.0, start.1)] = true;
        queue.push_back(start);

        while let Some((x, z)) = queue.pop_front() {
            for dir in Direction::ALL {
                if let Some((nx, nz)) = self.neighbor(x, z, dir) {
                    let i = self.index(nx, nz);
                    if !reached[i] && !self.cells[i] {
                        reached[i] = true;
                        queue.push_back((nx, nz));
                    }
                }
            }
        }

        reached
    }

    /// Every open cell reachable from every other
    pub fn is_connected(&self) -> bool {
        let Some(start) = self.open_cells().next() else {
            return true;
        };
        let reached = self.flood_fill(start);
        reached.iter().filter(|&&r| r).count() == self.open_count()
    }

    // === Carving steps ===

    /// Periodic wall bands on a 2-3 cell stride, with gaps at least every 3 segments
    fn carve_bands(&mut self, rng: &mut Pcg32) {
        let stride = rng.random_range(2..=3);

        let mut x = stride;
        while x < self.width - 2 {
            self.carve_band(rng, (x, 1), (0, 1));
            x += stride;
        }

        let mut z = stride;
        while z < self.depth - 2 {
            self.carve_band(rng, (1, z), (1, 0));
            z += stride;
        }
    }

    /// One band from `start` along `step` until the border
    ///
    /// Every segment that does not become wall is opened, so a gap breaks
    /// runs left by earlier bands crossing this line too.
    fn carve_band(&mut self, rng: &mut Pcg32, start: (usize, usize), step: (usize, usize)) {
        let cross = (step.1, step.0);
        let (mut x, mut z) = start;
        let mut run = 0;
        while !self.is_border(x, z) {
            let wall = run < MAX_WALL_RUN
                && rng.random_bool(BAND_WALL_CHANCE)
                && self.wall_run_through(x, z, cross) <= MAX_WALL_RUN;
            self.set(x, z, wall);
            run = if wall { run + 1 } else { 0 };
            x += step.0;
            z += step.1;
        }
    }

    /// Length of the interior wall run along `axis` if (x, z) were wall
    fn wall_run_through(&self, x: usize, z: usize, (dx, dz): (usize, usize)) -> usize {
        let mut run = 1;

        let (mut cx, mut cz) = (x - dx, z - dz);
        while !self.is_border(cx, cz) && self.is_wall(cx, cz) {
            run += 1;
            cx -= dx;
            cz -= dz;
        }

        let (mut cx, mut cz) = (x + dx, z + dz);
        while !self.is_border(cx, cz) && self.is_wall(cx, cz) {
            run += 1;
            cx += dx;
            cz += dz;
        }
        run
    }

    /// Short staircase diagonals that only ever clear cells
    fn carve_diagonals(&mut self, rng: &mut Pcg32) {
        let count = (2 + self.width * self.depth / 80).min(8);
        for _ in 0..count {
            let mut x = rng.random_range(1..self.width - 1);
            let mut z = rng.random_range(1..self.depth - 1);
            let dx: isize = if rng.random_bool(0.5) { 1 } else { -1 };
            let dz: isize = if rng.random_bool(0.5) { 1 } else { -1 };
            let len = rng.random_range(MIN_DIAGONAL_LEN..=MAX_DIAGONAL_LEN);

            self.clear_interior(x, z);
            for _ in 0..len {
                // Step X then Z so consecutive cells share an edge
                let Some(nx) = step_within(x, dx, self.width) else { break };
                x = nx;
                self.clear_interior(x, z);
                let Some(nz) = step_within(z, dz, self.depth) else { break };
                z = nz;
                self.clear_interior(x, z);
            }
        }
    }

    fn random_room(&self, rng: &mut Pcg32, max_w: usize, max_d: usize) -> Room {
        let w = rng.random_range(MIN_ROOM_SIZE..=max_w);
        let d = rng.random_range(MIN_ROOM_SIZE..=max_d);
        Room {
            x: rng.random_range(1..=self.width - 1 - w),
            z: rng.random_range(1..=self.depth - 1 - d),
            w,
            d,
        }
    }

    /// 3-6 open rectangles, each given a doorway to the surrounding maze
    fn carve_rooms(&mut self, rng: &mut Pcg32) {
        let interior_w = self.width - 2;
        let interior_d = self.depth - 2;
        if interior_w < 2 * MIN_ROOM_SIZE || interior_d < 2 * MIN_ROOM_SIZE {
            return;
        }
        let max_w = (interior_w / 2).clamp(MIN_ROOM_SIZE, MAX_ROOM_SIZE);
        let max_d = (interior_d / 2).clamp(MIN_ROOM_SIZE, MAX_ROOM_SIZE);

        let count = rng.random_range(MIN_ROOMS..=MAX_ROOMS);
        let mut rooms: Vec<Room> = Vec::with_capacity(count);
        for _ in 0..count {
            let mut room = self.random_room(rng, max_w, max_d);
            for _ in 0..ROOM_PLACEMENT_ATTEMPTS {
                if rooms.iter().all(|r| !r.overlaps(&room)) {
                    break;
                }
                room = self.random_room(rng, max_w, max_d);
            }

            for z in room.z..room.z + room.d {
                for x in room.x..room.x + room.w {
                    self.clear_interior(x, z);
                }
            }
            rooms.push(room);
        }

        for room in &rooms {
            self.force_doorway(room, rng);
        }
    }

    /// Open one perimeter cell that leads to open space outside the room
    fn force_doorway(&mut self, room: &Room, rng: &mut Pcg32) {
        let perimeter = room.perimeter(self.width, self.depth);
        if perimeter.is_empty() {
            return;
        }

        for _ in 0..DOORWAY_ATTEMPTS {
            let (x, z, dir) = perimeter[rng.random_range(0..perimeter.len())];
            if self.is_open_toward(x, z, dir) {
                self.set(x, z, false);
                return;
            }
        }

        if let Some(&(x, z, _)) = perimeter.iter().find(|&&(x, z, dir)| self.is_open_toward(x, z, dir)) {
            log::warn!("Room at ({}, {}): doorway found by perimeter scan", room.x, room.z);
            self.set(x, z, false);
            return;
        }

        // Nothing open beyond the perimeter: punch two cells outward
        let (x, z, dir) = perimeter[0];
        log::warn!("Room at ({}, {}): no open cell beyond perimeter, punching through", room.x, room.z);
        self.set(x, z, false);
        if let Some((bx, bz)) = self.neighbor(x, z, dir) {
            self.clear_interior(bx, bz);
        }
    }

    /// Clear walls separating open cells on exactly one axis
    fn carve_shortcuts(&mut self, rng: &mut Pcg32) {
        let budget = (self.width * self.depth / SHORTCUT_DIVISOR).max(1);
        let mut carved = 0;

        for _ in 0..budget * 4 {
            if carved >= budget {
                break;
            }
            let x = rng.random_range(1..self.width - 1);
            let z = rng.random_range(1..self.depth - 1);
            if self.is_open(x, z) {
                continue;
            }

            let north_south = self.is_open(x, z - 1) && self.is_open(x, z + 1);
            let east_west = self.is_open(x - 1, z) && self.is_open(x + 1, z);
            // Walls open on both axes hold up a junction; leave them
            if north_south != east_west && rng.random_bool(SHORTCUT_CHANCE) {
                self.set(x, z, false);
                carved += 1;
            }
        }
    }

    /// One border cell plus a 3-cell corridor heading inward
    fn carve_exit(&mut self, rng: &mut Pcg32) {
        let side = Direction::ALL[rng.random_range(0..4)];
        let (x, z) = match side {
            Direction::North => (rng.random_range(1..self.width - 1), 0),
            Direction::South => (rng.random_range(1..self.width - 1), self.depth - 1),
            Direction::West => (0, rng.random_range(1..self.depth - 1)),
            Direction::East => (self.width - 1, rng.random_range(1..self.depth - 1)),
        };

        self.set(x, z, false);
        let inward = side.opposite();
        let mut cell = (x, z);
        for _ in 0..EXIT_CORRIDOR_LEN {
            match self.neighbor(cell.0, cell.1, inward) {
                Some(next) => {
                    cell = next;
                    self.set(cell.0, cell.1, false);
                }
                None => break,
            }
        }
        self.exit = (x, z);
    }

    /// Join every region the exit cannot reach; returns cells carved
    fn connect_regions(&mut self) -> usize {
        let mut carved = 0;
        loop {
            let reached = self.flood_fill(self.exit);
            let orphan = self.open_cells().find(|&(x, z)| !reached[self.index(x, z)]);
            let Some(orphan) = orphan else {
                break;
            };

            let path = self.interior_path_to_reached(orphan, &reached);
            if path.is_empty() {
                log::error!("No interior path from isolated cell {orphan:?}");
                break;
            }
            for (x, z) in path {
                if self.is_wall(x, z) {
                    self.set(x, z, false);
                    carved += 1;
                }
            }
        }
        carved
    }

    /// Shortest path through interior cells (walls included) from `start`
    /// to any cell already in `reached`
    fn interior_path_to_reached(&self, start: (usize, usize), reached: &[bool]) -> Vec<(usize, usize)> {
        let mut parent: Vec<Option<usize>> = vec![None; self.cells.len()];
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();

        seen[self.index(start.0, start.1)] = true;
        queue.push_back(start);

        while let Some((x, z)) = queue.pop_front() {
            let i = self.index(x, z);
            if reached[i] {
                let mut path = Vec::new();
                let mut cur = Some(i);
                while let Some(c) = cur {
                    path.push((c % self.width, c / self.width));
                    cur = parent[c];
                }
                return path;
            }
            for dir in Direction::ALL {
                if let Some((nx, nz)) = self.neighbor(x, z, dir) {
                    let ni = self.index(nx, nz);
                    // The exit is the only border cell a path may end on
                    let passable = !self.is_border(nx, nz) || reached[ni];
                    if passable && !seen[ni] {
                        seen[ni] = true;
                        parent[ni] = Some(i);
                        queue.push_back((nx, nz));
                    }
                }
            }
        }

        Vec::new()
    }
}

/// `v + d` if it stays strictly inside `0..len` (never on the border)
fn step_within(v: usize, d: isize, len: usize) -> Option<usize> {
    let n = v.checked_add_signed(d)?;
    (n > 0 && n < len - 1).then_some(n)
}

#[cfg(test)]
impl Grid {
    /// Build a grid from ASCII rows: `#` wall, `.` open, `E` exit
    pub(crate) fn from_ascii(rows: &[&str]) -> Self {
        let depth = rows.len();
        let width = rows[0].len();
        let mut cells = Vec::with_capacity(width * depth);
        let mut exit = (0, 0);
        for (z, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == 'E' {
                    exit = (x, z);
                }
                cells.push(c == '#');
            }
        }
        Self {
            width,
            depth,
            cells,
            exit,
        }
    }
}
