use std::collections::BTreeMap;

use ai_nav::{Aabb, NavRaycastHit, Vec2};

use crate::data::{BodyId, Kinematic};

/// Read-only view of the moving bodies and static walls around a character.
///
/// Controllers only ever see the settled state from the end of the previous tick.
pub trait SpatialQuery {
    fn body(&self, id: BodyId) -> Option<Kinematic>;

    /// Append every body within `radius` of `center` (except `exclude`) to `out`, in id order.
    fn overlap_circle(
        &self,
        center: Vec2,
        radius: f32,
        exclude: Option<BodyId>,
        out: &mut Vec<(BodyId, Kinematic)>,
    );

    /// First wall hit along `direction` (unit length) within `max_distance`.
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<NavRaycastHit>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Cell(i32, i32);

/// Spatial hash over a frozen set of bodies, optionally paired with axis-aligned walls.
#[derive(Debug, Clone)]
pub struct BodySnapshot {
    cell_size: f32,
    bodies: Vec<(BodyId, Kinematic)>,
    buckets: BTreeMap<Cell, Vec<usize>>,
    obstacles: Vec<Aabb>,
}

impl Default for BodySnapshot {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl BodySnapshot {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1e-3),
            bodies: Vec::new(),
            buckets: BTreeMap::new(),
            obstacles: Vec::new(),
        }
    }

    pub fn from_bodies(
        cell_size: f32,
        bodies: impl IntoIterator<Item = (BodyId, Kinematic)>,
    ) -> Self {
        let mut snapshot = Self::new(cell_size);
        snapshot.rebuild(bodies);
        snapshot
    }

    pub fn with_obstacles(mut self, obstacles: Vec<Aabb>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn set_obstacles(&mut self, obstacles: Vec<Aabb>) {
        self.obstacles = obstacles;
    }

    pub fn obstacles(&self) -> &[Aabb] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Replace the frozen bodies. Later duplicates of an id are dropped.
    pub fn rebuild(&mut self, bodies: impl IntoIterator<Item = (BodyId, Kinematic)>) {
        self.bodies.clear();
        self.bodies.extend(bodies);
        self.bodies.sort_by_key(|(id, _)| *id);
        self.bodies.dedup_by_key(|(id, _)| *id);

        self.buckets.clear();
        for (idx, (_, body)) in self.bodies.iter().enumerate() {
            let cell = cell_for(body.position, self.cell_size);
            self.buckets.entry(cell).or_default().push(idx);
        }
    }
}

impl SpatialQuery for BodySnapshot {
    fn body(&self, id: BodyId) -> Option<Kinematic> {
        self.bodies
            .binary_search_by_key(&id, |(bid, _)| *bid)
            .ok()
            .map(|idx| self.bodies[idx].1)
    }

    fn overlap_circle(
        &self,
        center: Vec2,
        radius: f32,
        exclude: Option<BodyId>,
        out: &mut Vec<(BodyId, Kinematic)>,
    ) {
        let radius = radius.max(0.0);
        let radius_sq = radius * radius;
        let lo = cell_for(center - Vec2::new(radius, radius), self.cell_size);
        let hi = cell_for(center + Vec2::new(radius, radius), self.cell_size);

        let mut found: Vec<usize> = Vec::new();
        for y in lo.1..=hi.1 {
            for x in lo.0..=hi.0 {
                let Some(bucket) = self.buckets.get(&Cell(x, y)) else {
                    continue;
                };
                for &idx in bucket {
                    let (id, body) = self.bodies[idx];
                    if Some(id) == exclude {
                        continue;
                    }
                    if body.position.distance_squared(center) <= radius_sq {
                        found.push(idx);
                    }
                }
            }
        }

        // Indices follow id order.
        found.sort_unstable();
        out.extend(found.into_iter().map(|idx| self.bodies[idx]));
    }

    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<NavRaycastHit> {
        let direction = direction.normalized()?;
        self.obstacles
            .iter()
            .filter_map(|o| o.raycast(origin, direction, max_distance))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, normal)| NavRaycastHit {
                point: origin + direction * t,
                normal,
            })
    }
}

fn cell_for(p: Vec2, cell_size: f32) -> Cell {
    let cs = cell_size.max(1e-6);
    Cell((p.x / cs).floor() as i32, (p.y / cs).floor() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f32, y: f32) -> Kinematic {
        Kinematic::at(Vec2::new(x, y))
    }

    #[test]
    fn overlap_circle_is_id_ordered_and_excludes_self() {
        let snapshot = BodySnapshot::from_bodies(
            1.0,
            [
                (BodyId(9), body_at(0.5, 0.0)),
                (BodyId(1), body_at(0.0, 0.0)),
                (BodyId(4), body_at(-0.7, 0.2)),
                (BodyId(7), body_at(5.0, 5.0)),
            ],
        );

        let mut out = Vec::new();
        snapshot.overlap_circle(Vec2::ZERO, 1.0, Some(BodyId(1)), &mut out);
        let ids: Vec<u64> = out.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![4, 9]);
    }

    #[test]
    fn body_lookup_uses_snapshot_state() {
        let snapshot = BodySnapshot::from_bodies(2.0, [(BodyId(3), body_at(1.0, 2.0))]);
        assert_eq!(snapshot.body(BodyId(3)), Some(body_at(1.0, 2.0)));
        assert_eq!(snapshot.body(BodyId(4)), None);
    }

    #[test]
    fn raycast_returns_nearest_wall() {
        let snapshot = BodySnapshot::new(1.0).with_obstacles(vec![
            Aabb::new(Vec2::new(5.0, -1.0), Vec2::new(6.0, 1.0)),
            Aabb::new(Vec2::new(2.0, -1.0), Vec2::new(3.0, 1.0)),
        ]);

        let hit = snapshot
            .raycast(Vec2::ZERO, Vec2::new(2.0, 0.0), 10.0)
            .expect("hit");
        assert!((hit.point.x - 2.0).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));

        assert!(snapshot.raycast(Vec2::ZERO, Vec2::X, 1.5).is_none());
        assert!(snapshot.raycast(Vec2::ZERO, -Vec2::X, 10.0).is_none());
    }
}
