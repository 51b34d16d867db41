use core::f32::consts::{PI, TAU};

use ai_nav::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Velocities below this magnitude are snapped to zero.
pub const STOP_EPSILON: f32 = 0.001;

/// Handle of a moving body in a [`SpatialQuery`](crate::SpatialQuery).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

/// Position, orientation and their rates of change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Kinematic {
    pub position: Vec2,
    /// Radians, counter-clockwise from +x.
    pub orientation: f32,
    pub velocity: Vec2,
    /// Radians per second.
    pub rotation: f32,
}

impl Kinematic {
    pub fn new(position: Vec2, orientation: f32) -> Self {
        Self {
            position,
            orientation,
            ..Self::default()
        }
    }

    /// A static point target.
    pub fn at(position: Vec2) -> Self {
        Self::new(position, 0.0)
    }

    pub fn facing(&self) -> Vec2 {
        Vec2::from_angle(self.orientation)
    }
}

/// Where a behaviour steers to: a fixed point or another body's settled state.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Target {
    Point(Vec2),
    Body(BodyId),
}

impl From<Vec2> for Target {
    fn from(value: Vec2) -> Self {
        Target::Point(value)
    }
}

impl From<BodyId> for Target {
    fn from(value: BodyId) -> Self {
        Target::Body(value)
    }
}

/// Dynamic steering request: a linear acceleration and an angular acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringOutput {
    pub linear: Vec2,
    pub angular: f32,
}

impl SteeringOutput {
    pub const NONE: SteeringOutput = SteeringOutput {
        linear: Vec2::ZERO,
        angular: 0.0,
    };

    pub const fn new(linear: Vec2, angular: f32) -> Self {
        Self { linear, angular }
    }

    pub const fn linear(linear: Vec2) -> Self {
        Self {
            linear,
            angular: 0.0,
        }
    }

    pub const fn angular(angular: f32) -> Self {
        Self {
            linear: Vec2::ZERO,
            angular,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Kinematic steering request: the velocity and rotation to assign directly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KinematicOutput {
    pub velocity: Vec2,
    pub rotation: f32,
    /// New orientation, when the behaviour turns the character itself.
    pub orientation: Option<f32>,
}

impl KinematicOutput {
    pub const NONE: KinematicOutput = KinematicOutput {
        velocity: Vec2::ZERO,
        rotation: 0.0,
        orientation: None,
    };
}

/// Wrap an angle difference into `(-PI, PI]`.
pub fn map_to_range(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Wrap an orientation into `[0, TAU)`.
pub fn wrap_orientation(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Orientation facing `velocity`, or `current` if the velocity is zero.
pub fn new_orientation(current: f32, velocity: Vec2) -> f32 {
    if velocity.length_squared() > 0.0 {
        velocity.angle()
    } else {
        current
    }
}

pub fn clamp_length(v: Vec2, max_len: f32) -> Vec2 {
    let max_len = max_len.max(0.0);
    let len = v.length();
    if len <= max_len || len <= f32::EPSILON {
        v
    } else {
        v * (max_len / len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_to_range_picks_shortest_turn() {
        assert!((map_to_range(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
        assert!((map_to_range(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-5);
        assert!((map_to_range(PI) - PI).abs() < 1e-5);
        assert!((map_to_range(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn wrap_orientation_stays_in_one_turn() {
        assert!((wrap_orientation(-0.5) - (TAU - 0.5)).abs() < 1e-5);
        assert!((wrap_orientation(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((0.0..TAU).contains(&wrap_orientation(-1e-9)));
    }

    #[test]
    fn new_orientation_keeps_current_when_stopped() {
        assert_eq!(new_orientation(1.25, Vec2::ZERO), 1.25);
        assert!((new_orientation(1.25, Vec2::new(0.0, 2.0)) - PI / 2.0).abs() < 1e-6);
    }
}
