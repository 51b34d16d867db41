//! Kinematic control laws: velocities assigned directly, no blending or friction.

use ai_core::DeterministicRng;
use ai_nav::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::{clamp_length, new_orientation, Kinematic, KinematicOutput, Target};
use crate::dynamic::resolve;
use crate::{MovementVars, SpatialQuery};

fn facing_velocity(character: &Kinematic, velocity: Vec2) -> KinematicOutput {
    KinematicOutput {
        velocity,
        rotation: 0.0,
        orientation: Some(new_orientation(character.orientation, velocity)),
    }
}

pub fn seek(character: &Kinematic, target: Vec2, vars: &MovementVars) -> KinematicOutput {
    let velocity = (target - character.position).normalize_or_zero() * vars.max_speed;
    facing_velocity(character, velocity)
}

pub fn flee(character: &Kinematic, target: Vec2, vars: &MovementVars) -> KinematicOutput {
    let away = character.position - target;
    if away.length() > vars.flee_threshold {
        return KinematicOutput::NONE;
    }
    facing_velocity(character, away.normalize_or_zero() * vars.max_speed)
}

pub fn arrive(character: &Kinematic, target: Vec2, vars: &MovementVars) -> KinematicOutput {
    let offset = target - character.position;
    if offset.length() < vars.linear_target_radius {
        return KinematicOutput::NONE;
    }
    let velocity = clamp_length(offset / vars.arrive_time, vars.max_speed);
    facing_velocity(character, velocity)
}

/// Full speed ahead while the orientation drifts randomly by up to `max_rotation` per call.
pub fn wander(
    character: &Kinematic,
    rng: &mut impl DeterministicRng,
    vars: &MovementVars,
) -> KinematicOutput {
    let velocity = character.facing() * vars.max_speed;
    let turn = rng.next_binomial() * vars.max_rotation;
    KinematicOutput {
        velocity,
        rotation: 0.0,
        orientation: Some(character.orientation + turn),
    }
}

/// Base behaviour for a kinematic controller.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KinematicBehaviour {
    Seek(Target),
    Flee(Target),
    Arrive(Target),
    Wander,
}

impl KinematicBehaviour {
    pub fn steer<Q: SpatialQuery + ?Sized>(
        &self,
        character: &Kinematic,
        query: &Q,
        rng: &mut impl DeterministicRng,
        vars: &MovementVars,
    ) -> KinematicOutput {
        let point = |target: Target| resolve(&target, query).map(|k| k.position);
        let out = match *self {
            KinematicBehaviour::Seek(t) => point(t).map(|p| seek(character, p, vars)),
            KinematicBehaviour::Flee(t) => point(t).map(|p| flee(character, p, vars)),
            KinematicBehaviour::Arrive(t) => point(t).map(|p| arrive(character, p, vars)),
            KinematicBehaviour::Wander => Some(wander(character, rng, vars)),
        };
        out.unwrap_or(KinematicOutput::NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_core::SplitMix64;

    #[test]
    fn seek_moves_at_max_speed_and_faces_target() {
        let vars = MovementVars::default();
        let me = Kinematic::at(Vec2::ZERO);
        let out = seek(&me, Vec2::new(0.0, -4.0), &vars);
        assert_eq!(out.velocity, Vec2::new(0.0, -10.0));
        let orientation = out.orientation.unwrap_or_default();
        assert!((orientation + core::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn arrive_slows_near_the_target() {
        let vars = MovementVars::default();
        let me = Kinematic::at(Vec2::ZERO);
        assert_eq!(arrive(&me, Vec2::new(0.5, 0.0), &vars), KinematicOutput::NONE);

        let out = arrive(&me, Vec2::new(2.0, 0.0), &vars);
        assert_eq!(out.velocity, Vec2::new(8.0, 0.0));
        let far = arrive(&me, Vec2::new(20.0, 0.0), &vars);
        assert_eq!(far.velocity, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn wander_turns_by_at_most_max_rotation() {
        let vars = MovementVars::default();
        let me = Kinematic::new(Vec2::ZERO, 1.0);
        let mut rng = SplitMix64::new(3);
        for _ in 0..32 {
            let out = wander(&me, &mut rng, &vars);
            let turn = out.orientation.unwrap_or(1.0) - 1.0;
            assert!(turn.abs() < vars.max_rotation);
            assert!((out.velocity.length() - vars.max_speed).abs() < 1e-4);
        }
    }
}
