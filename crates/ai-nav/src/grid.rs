use crate::{Aabb, GridError, NavPath, NavRaycastHit, Navigator, Vec2};
use core::cmp::Ordering;
use std::collections::BinaryHeap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A goal closer than this to the last cell centre is not appended as an extra waypoint.
const GOAL_TOLERANCE: f32 = 0.3;

/// Cells are tested for obstacles slightly shrunk so touching neighbours don't count.
const OCCUPANCY_INSET: f32 = 0.025;

/// Integer cell coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Placement and resolution of a tile grid.
///
/// `origin` is the minimum corner; column `c` and row `r` cover
/// `[origin + (c * column_width, r * row_height), origin + ((c + 1) * column_width, (r + 1) * row_height))`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridSpec {
    pub origin: Vec2,
    pub columns: u32,
    pub rows: u32,
    pub column_width: f32,
    pub row_height: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            columns: 12,
            rows: 12,
            column_width: 1.5,
            row_height: 1.5,
        }
    }
}

impl GridSpec {
    pub fn new(
        origin: Vec2,
        columns: u32,
        rows: u32,
        column_width: f32,
        row_height: f32,
    ) -> Result<Self, GridError> {
        let spec = Self {
            origin,
            columns,
            rows,
            column_width,
            row_height,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Checks a spec built field by field, e.g. one loaded from a config file.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(GridError::Empty {
                columns: self.columns,
                rows: self.rows,
            });
        }
        let positive = |size: f32| size > 0.0;
        if !positive(self.column_width) || !positive(self.row_height) {
            return Err(GridError::CellSize {
                column_width: self.column_width,
                row_height: self.row_height,
            });
        }
        Ok(())
    }

    pub fn diagonal_cost(&self) -> f32 {
        (self.column_width * self.column_width + self.row_height * self.row_height).sqrt()
    }

    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn contains_tile(&self, tile: Tile) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.columns as i32 && tile.y < self.rows as i32
    }

    pub fn tile_at(&self, p: Vec2) -> Option<Tile> {
        let local = p - self.origin;
        let tile = Tile::new(
            (local.x / self.column_width).floor() as i32,
            (local.y / self.row_height).floor() as i32,
        );
        self.contains_tile(tile).then_some(tile)
    }

    pub fn tile_center(&self, tile: Tile) -> Vec2 {
        self.origin
            + Vec2::new(
                (tile.x as f32 + 0.5) * self.column_width,
                (tile.y as f32 + 0.5) * self.row_height,
            )
    }

    pub fn tile_bounds(&self, tile: Tile) -> Aabb {
        let min = self.origin
            + Vec2::new(
                tile.x as f32 * self.column_width,
                tile.y as f32 * self.row_height,
            );
        Aabb::new(min, min + Vec2::new(self.column_width, self.row_height))
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            self.origin,
            self.origin
                + Vec2::new(
                    self.columns as f32 * self.column_width,
                    self.rows as f32 * self.row_height,
                ),
        )
    }

    fn index(&self, tile: Tile) -> Option<usize> {
        if !self.contains_tile(tile) {
            return None;
        }
        Some(tile.y as usize * self.columns as usize + tile.x as usize)
    }

    fn tile_from_index(&self, idx: usize) -> Tile {
        let columns = self.columns as usize;
        Tile::new((idx % columns) as i32, (idx / columns) as i32)
    }

    /// Weighted octile distance between two tiles. Exact on an obstacle-free grid.
    fn heuristic(&self, a: Tile, b: Tile) -> f32 {
        let dx = (a.x - b.x).abs() as f32;
        let dy = (a.y - b.y).abs() as f32;
        let (w, h) = (self.column_width, self.row_height);
        w * dx + h * dy + (self.diagonal_cost() - w - h) * dx.min(dy)
    }
}

/// How the open set is prioritised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SearchOrder {
    /// Accumulated path cost only. Still optimal, but expands like an uninformed search.
    #[default]
    PathCost,
    /// Path cost plus the octile heuristic (classic A*).
    EstimatedTotal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct Edge {
    to: usize,
    cost: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes popped from the open set and expanded.
    pub expanded: usize,
}

#[derive(Debug)]
struct OpenNode {
    priority: f32,
    g: f32,
    index: usize,
    seq: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the lowest priority; deeper nodes first on ties,
        // then insertion order.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Grid navigation graph: one node per free cell, directed edges to the (up to) eight free
/// neighbours. Built once, immutable afterwards.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileGraph {
    spec: GridSpec,
    walkable: Vec<bool>,
    edges: Vec<Vec<Edge>>,
    order: SearchOrder,
}

impl TileGraph {
    /// Build from an occupancy test evaluated once per cell on its (slightly inset) bounds.
    pub fn build(spec: GridSpec, mut is_blocked: impl FnMut(&Aabb) -> bool) -> Self {
        let inset = Vec2::new(OCCUPANCY_INSET, OCCUPANCY_INSET);
        let mut walkable = vec![false; spec.cell_count()];
        for (idx, free) in walkable.iter_mut().enumerate() {
            let bounds = spec.tile_bounds(spec.tile_from_index(idx));
            let probe = Aabb::new(bounds.min + inset, bounds.max - inset);
            *free = !is_blocked(&probe);
        }

        let axis_x = spec.column_width;
        let axis_y = spec.row_height;
        let diagonal = spec.diagonal_cost();

        let mut edges = vec![Vec::new(); spec.cell_count()];
        for (idx, out) in edges.iter_mut().enumerate() {
            if !walkable[idx] {
                continue;
            }
            let tile = spec.tile_from_index(idx);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let Some(n_idx) = spec.index(Tile::new(tile.x + dx, tile.y + dy)) else {
                        continue;
                    };
                    if !walkable[n_idx] {
                        continue;
                    }
                    let cost = match (dx != 0, dy != 0) {
                        (true, true) => diagonal,
                        (true, false) => axis_x,
                        _ => axis_y,
                    };
                    out.push(Edge { to: n_idx, cost });
                }
            }
        }

        Self {
            spec,
            walkable,
            edges,
            order: SearchOrder::default(),
        }
    }

    /// Graph with every cell free.
    pub fn open(spec: GridSpec) -> Self {
        Self::build(spec, |_| false)
    }

    /// Graph whose blocked cells are those overlapping any of `obstacles`.
    pub fn from_obstacles(spec: GridSpec, obstacles: &[Aabb]) -> Self {
        Self::build(spec, |cell| obstacles.iter().any(|o| o.overlaps(cell)))
    }

    pub fn with_search_order(mut self, order: SearchOrder) -> Self {
        self.order = order;
        self
    }

    pub fn search_order(&self) -> SearchOrder {
        self.order
    }

    pub fn set_search_order(&mut self, order: SearchOrder) {
        self.order = order;
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn is_walkable(&self, tile: Tile) -> bool {
        self.spec
            .index(tile)
            .map(|idx| self.walkable[idx])
            .unwrap_or(false)
    }

    pub fn walkable_count(&self) -> usize {
        self.walkable.iter().filter(|w| **w).count()
    }

    /// Outgoing edges of `tile` as `(neighbour, cost)`, in construction order.
    pub fn neighbors(&self, tile: Tile) -> impl Iterator<Item = (Tile, f32)> + '_ {
        self.spec
            .index(tile)
            .map(|idx| self.edges[idx].as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|e| (self.spec.tile_from_index(e.to), e.cost))
    }

    /// Path query that also reports search effort.
    pub fn find_path_with_stats(&self, start: Vec2, goal: Vec2) -> (Option<NavPath>, SearchStats) {
        let mut stats = SearchStats::default();
        let (Some(start_tile), Some(goal_tile)) = (self.spec.tile_at(start), self.spec.tile_at(goal))
        else {
            tracing::debug!(?start, ?goal, "Path endpoint outside the grid");
            return (None, stats);
        };
        if !self.is_walkable(start_tile) || !self.is_walkable(goal_tile) {
            tracing::debug!(?start_tile, ?goal_tile, "Path endpoint inside a blocked cell");
            return (None, stats);
        }

        let Some((tiles, cost)) = self.a_star(start_tile, goal_tile, &mut stats) else {
            tracing::debug!(?start_tile, ?goal_tile, expanded = stats.expanded, "No path");
            return (None, stats);
        };

        let mut points = Vec::with_capacity(tiles.len() + 1);
        points.push(start);
        points.extend(tiles.iter().skip(1).map(|t| self.spec.tile_center(*t)));
        if points
            .last()
            .is_some_and(|last| last.distance(goal) > GOAL_TOLERANCE)
        {
            points.push(goal);
        }

        (Some(NavPath::new(points, cost)), stats)
    }

    fn a_star(&self, start: Tile, goal: Tile, stats: &mut SearchStats) -> Option<(Vec<Tile>, f32)> {
        let start_idx = self.spec.index(start)?;
        let goal_idx = self.spec.index(goal)?;

        let len = self.spec.cell_count();
        let mut g_score = vec![f32::INFINITY; len];
        let mut came_from: Vec<Option<usize>> = vec![None; len];
        let mut closed = vec![false; len];
        let mut open = BinaryHeap::new();
        let mut seq: u64 = 0;

        g_score[start_idx] = 0.0;
        open.push(OpenNode {
            priority: self.priority(0.0, start, goal),
            g: 0.0,
            index: start_idx,
            seq,
        });

        while let Some(node) = open.pop() {
            if closed[node.index] || node.g > g_score[node.index] {
                // Stale heap entry.
                continue;
            }
            closed[node.index] = true;
            stats.expanded += 1;

            if node.index == goal_idx {
                let mut out = vec![node.index];
                let mut current = node.index;
                while let Some(prev) = came_from[current] {
                    current = prev;
                    out.push(current);
                }
                out.reverse();
                let tiles = out.into_iter().map(|i| self.spec.tile_from_index(i)).collect();
                return Some((tiles, node.g));
            }

            for edge in &self.edges[node.index] {
                if closed[edge.to] {
                    continue;
                }
                let tentative = node.g + edge.cost;
                if tentative >= g_score[edge.to] {
                    continue;
                }
                g_score[edge.to] = tentative;
                came_from[edge.to] = Some(node.index);
                seq += 1;
                open.push(OpenNode {
                    priority: self.priority(tentative, self.spec.tile_from_index(edge.to), goal),
                    g: tentative,
                    index: edge.to,
                    seq,
                });
            }
        }

        None
    }

    fn priority(&self, g: f32, tile: Tile, goal: Tile) -> f32 {
        match self.order {
            SearchOrder::PathCost => g,
            SearchOrder::EstimatedTotal => g + self.spec.heuristic(tile, goal),
        }
    }
}

impl Navigator for TileGraph {
    fn find_path(&self, start: Vec2, goal: Vec2) -> Option<NavPath> {
        self.find_path_with_stats(start, goal).0
    }

    /// Cell walk (DDA) from `start` towards `end`. Leaving the grid counts as a hit.
    fn raycast(&self, start: Vec2, end: Vec2) -> Option<NavRaycastHit> {
        let delta = end - start;
        let mut tile = match self.spec.tile_at(start) {
            Some(tile) if self.is_walkable(tile) => tile,
            _ => {
                return Some(NavRaycastHit {
                    point: start,
                    normal: -delta.normalize_or_zero(),
                })
            }
        };

        let bounds = self.spec.tile_bounds(tile);
        let step_x: i32 = if delta.x > 0.0 { 1 } else if delta.x < 0.0 { -1 } else { 0 };
        let step_y: i32 = if delta.y > 0.0 { 1 } else if delta.y < 0.0 { -1 } else { 0 };

        let mut t_max_x = match step_x {
            1 => (bounds.max.x - start.x) / delta.x,
            -1 => (bounds.min.x - start.x) / delta.x,
            _ => f32::INFINITY,
        };
        let mut t_max_y = match step_y {
            1 => (bounds.max.y - start.y) / delta.y,
            -1 => (bounds.min.y - start.y) / delta.y,
            _ => f32::INFINITY,
        };
        let t_delta_x = if step_x != 0 {
            self.spec.column_width / delta.x.abs()
        } else {
            f32::INFINITY
        };
        let t_delta_y = if step_y != 0 {
            self.spec.row_height / delta.y.abs()
        } else {
            f32::INFINITY
        };

        loop {
            let (t, normal) = if t_max_x < t_max_y {
                tile.x += step_x;
                let t = t_max_x;
                t_max_x += t_delta_x;
                (t, Vec2::new(-step_x as f32, 0.0))
            } else {
                tile.y += step_y;
                let t = t_max_y;
                t_max_y += t_delta_y;
                (t, Vec2::new(0.0, -step_y as f32))
            };

            if !t.is_finite() || t > 1.0 {
                return None;
            }
            if !self.is_walkable(tile) {
                return Some(NavRaycastHit {
                    point: start + delta * t,
                    normal,
                });
            }
        }
    }

    fn nearest_point(&self, point: Vec2) -> Option<Vec2> {
        if let Some(tile) = self.spec.tile_at(point) {
            if self.is_walkable(tile) {
                return Some(point);
            }
        }

        (0..self.spec.cell_count())
            .filter(|idx| self.walkable[*idx])
            .map(|idx| self.spec.tile_center(self.spec.tile_from_index(idx)))
            .min_by(|a, b| {
                a.distance_squared(point)
                    .total_cmp(&b.distance_squared(point))
            })
    }
}
