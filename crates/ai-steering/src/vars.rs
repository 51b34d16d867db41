use crate::{Result, SteeringError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named movement parameters for one character. Angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MovementVars {
    /// Avoidance radius. Agent avoidance looks for neighbours within twice this.
    pub radius: f32,
    pub max_speed: f32,
    pub max_rotation: f32,
    pub max_acceleration: f32,
    pub max_angular: f32,
    pub flee_threshold: f32,
    /// Time constant used by arrive, align and velocity matching.
    pub arrive_time: f32,
    /// Prediction horizon for pursue/evade.
    pub prediction: f32,
    pub linear_slow_radius: f32,
    pub linear_target_radius: f32,
    pub angular_slow_radius: f32,
    pub angular_target_radius: f32,
    /// Distance from a wall hit to the avoidance target.
    pub avoidance_distance: f32,
    pub linear_friction: f32,
    pub angular_friction: f32,
    pub min_separation: f32,
    /// Neighbour queries (separation, agent avoidance) run once every this many ticks.
    pub query_interval: u32,
    pub waypoint_radius: f32,
    pub path_arrival_radius: f32,
}

impl Default for MovementVars {
    fn default() -> Self {
        Self {
            radius: 2.0,
            max_speed: 10.0,
            max_rotation: 32f32.to_radians(),
            max_acceleration: 3.0,
            max_angular: 15f32.to_radians(),
            flee_threshold: 10.0,
            arrive_time: 0.25,
            prediction: 0.5,
            linear_slow_radius: 4.0,
            linear_target_radius: 1.0,
            angular_slow_radius: 6f32.to_radians(),
            angular_target_radius: 2f32.to_radians(),
            avoidance_distance: 1.5,
            linear_friction: 2.2,
            angular_friction: 0.90625,
            min_separation: 1.0,
            query_interval: 5,
            waypoint_radius: 0.75,
            path_arrival_radius: 0.25,
        }
    }
}

impl MovementVars {
    pub fn validate(&self) -> Result<()> {
        if self.min_separation.is_nan() || self.min_separation <= 0.0 {
            return Err(SteeringError::NonPositiveSeparation(self.min_separation));
        }
        let divisors = [
            ("arrive_time", self.arrive_time),
            ("prediction", self.prediction),
            ("linear_slow_radius", self.linear_slow_radius),
            ("angular_slow_radius", self.angular_slow_radius),
        ];
        if let Some(&(field, value)) = divisors
            .iter()
            .find(|(_, value)| value.is_nan() || *value <= 0.0)
        {
            return Err(SteeringError::NonPositive { field, value });
        }
        if self.query_interval == 0 {
            return Err(SteeringError::InvalidThrottle);
        }
        Ok(())
    }
}
