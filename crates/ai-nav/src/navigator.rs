use crate::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered waypoints from the requested start to the requested goal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavPath {
    pub points: Vec<Vec2>,
    /// Accumulated edge cost of the graph route (excludes the exact start/goal offsets).
    pub cost: f32,
}

impl NavPath {
    pub fn new(points: Vec<Vec2>, cost: f32) -> Self {
        Self { points, cost }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Euclidean length of the polyline through all waypoints.
    pub fn polyline_length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavRaycastHit {
    pub point: Vec2,
    /// Unit normal of the blocking surface, facing back towards the ray origin.
    pub normal: Vec2,
}

pub trait Navigator {
    /// Returns `None` when no route exists (unreachable, off-graph or blocked endpoints).
    fn find_path(&self, start: Vec2, goal: Vec2) -> Option<NavPath>;

    /// Returns the first point where the segment from `start` to `end` leaves navigable space.
    ///
    /// Backends that don't support raycasts may return `None`.
    fn raycast(&self, _start: Vec2, _end: Vec2) -> Option<NavRaycastHit> {
        None
    }

    /// Project a point onto the nearest navigable location.
    ///
    /// Backends that don't support projection may return `None`.
    fn nearest_point(&self, _point: Vec2) -> Option<Vec2> {
        None
    }
}
