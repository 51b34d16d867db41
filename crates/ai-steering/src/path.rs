use ai_nav::Vec2;

use crate::data::{Kinematic, SteeringOutput};
use crate::dynamic::{arrive_with, seek};
use crate::{MovementVars, Result, SteeringError};

/// Seeks through a waypoint chain and arrives on the last waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowPath {
    points: Vec<Vec2>,
    looped: bool,
    current: usize,
    arrived: bool,
}

impl FollowPath {
    pub fn new(points: Vec<Vec2>, looped: bool) -> Result<Self> {
        if points.is_empty() {
            return Err(SteeringError::EmptyPath);
        }
        if looped && points.len() == 1 {
            return Err(SteeringError::SingleWaypointLoop);
        }
        Ok(Self {
            points,
            looped,
            current: 0,
            arrived: false,
        })
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn is_looped(&self) -> bool {
        self.looped
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_waypoint(&self) -> Vec2 {
        self.points[self.current]
    }

    /// Within `path_arrival_radius` of the final waypoint. Never true for looped paths.
    pub fn arrived(&self) -> bool {
        self.arrived
    }

    fn is_final(&self) -> bool {
        !self.looped && self.current + 1 == self.points.len()
    }

    /// A waypoint counts as passed once the character is beyond it along the segment leading in.
    fn passed(&self, position: Vec2) -> bool {
        if self.current == 0 {
            return false;
        }
        let prev = self.points[self.current - 1];
        let segment = self.points[self.current] - prev;
        let len_sq = segment.length_squared();
        len_sq > 0.0 && (position - prev).dot(segment) >= len_sq
    }

    pub fn steer(&mut self, character: &Kinematic, vars: &MovementVars) -> SteeringOutput {
        while !self.is_final() {
            let waypoint = self.current_waypoint();
            let reached = character.position.distance(waypoint) <= vars.waypoint_radius
                || self.passed(character.position);
            if !reached {
                break;
            }
            self.current = if self.current + 1 == self.points.len() {
                0
            } else {
                self.current + 1
            };
            if self.looped && self.current == 0 {
                // One wrap per evaluation is enough.
                break;
            }
        }

        let waypoint = self.current_waypoint();
        if !self.is_final() {
            return seek(character, waypoint, vars);
        }

        if character.position.distance(waypoint) <= vars.path_arrival_radius {
            self.arrived = true;
            return SteeringOutput::NONE;
        }
        arrive_with(
            character,
            waypoint,
            vars.path_arrival_radius,
            vars.linear_slow_radius,
            vars,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_single_point_loops() {
        assert_eq!(FollowPath::new(vec![], false), Err(SteeringError::EmptyPath));
        assert_eq!(
            FollowPath::new(vec![Vec2::ZERO], true),
            Err(SteeringError::SingleWaypointLoop)
        );
        assert!(FollowPath::new(vec![Vec2::ZERO], false).is_ok());
    }

    #[test]
    fn advances_past_reached_waypoints() {
        let vars = MovementVars::default();
        let mut path = FollowPath::new(
            vec![Vec2::ZERO, Vec2::new(4.0, 0.0), Vec2::new(8.0, 0.0)],
            false,
        )
        .expect("path");

        let me = Kinematic::at(Vec2::new(0.1, 0.0));
        let out = path.steer(&me, &vars);
        assert_eq!(path.current_index(), 1);
        assert!(out.linear.x > 0.0);

        // Overshot the second waypoint sideways: still counts as passed.
        let me = Kinematic::at(Vec2::new(4.5, 2.0));
        path.steer(&me, &vars);
        assert_eq!(path.current_index(), 2);
        assert!(!path.arrived());

        let me = Kinematic::at(Vec2::new(7.9, 0.0));
        let out = path.steer(&me, &vars);
        assert!(path.arrived());
        assert!(out.is_none());
    }

    #[test]
    fn looped_paths_wrap_and_never_arrive() {
        let vars = MovementVars::default();
        let mut path =
            FollowPath::new(vec![Vec2::ZERO, Vec2::new(5.0, 0.0)], true).expect("path");

        path.steer(&Kinematic::at(Vec2::ZERO), &vars);
        assert_eq!(path.current_index(), 1);
        path.steer(&Kinematic::at(Vec2::new(5.0, 0.0)), &vars);
        assert_eq!(path.current_index(), 0);
        assert!(!path.arrived());
    }
}
