//! Dynamic control laws: each returns the acceleration to apply this tick.

use ai_core::DeterministicRng;
use ai_nav::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::controller::AvoidanceRay;
use crate::data::{clamp_length, map_to_range, wrap_orientation, Kinematic, SteeringOutput, Target};
use crate::{BodyId, MovementVars, SpatialQuery};

/// Numerator of the inverse-square separation falloff.
const SEPARATION_DECAY: f32 = 3.0;

pub fn seek(character: &Kinematic, target: Vec2, vars: &MovementVars) -> SteeringOutput {
    SteeringOutput::linear((target - character.position).normalize_or_zero() * vars.max_acceleration)
}

/// Seek in reverse. No steering once the target is beyond `flee_threshold`.
pub fn flee(character: &Kinematic, target: Vec2, vars: &MovementVars) -> SteeringOutput {
    let away = character.position - target;
    if away.length() > vars.flee_threshold {
        return SteeringOutput::NONE;
    }
    SteeringOutput::linear(away.normalize_or_zero() * vars.max_acceleration)
}

pub fn arrive(character: &Kinematic, target: Vec2, vars: &MovementVars) -> SteeringOutput {
    arrive_with(
        character,
        target,
        vars.linear_target_radius,
        vars.linear_slow_radius,
        vars,
    )
}

/// [`arrive`] with explicit radii.
pub fn arrive_with(
    character: &Kinematic,
    target: Vec2,
    target_radius: f32,
    slow_radius: f32,
    vars: &MovementVars,
) -> SteeringOutput {
    let direction = target - character.position;
    let distance = direction.length();
    if distance < target_radius {
        return SteeringOutput::NONE;
    }

    let target_speed = if distance > slow_radius {
        vars.max_speed
    } else {
        vars.max_speed * distance / slow_radius
    };
    let target_velocity = direction.normalize_or_zero() * target_speed;
    let linear = (target_velocity - character.velocity) / vars.arrive_time;
    SteeringOutput::linear(clamp_length(linear, vars.max_acceleration))
}

pub fn align(character: &Kinematic, target_orientation: f32, vars: &MovementVars) -> SteeringOutput {
    let rotation = map_to_range(target_orientation - character.orientation);
    let size = rotation.abs();
    if size < vars.angular_target_radius {
        return SteeringOutput::NONE;
    }

    let target_rotation = if size > vars.angular_slow_radius {
        vars.max_rotation
    } else {
        vars.max_rotation * size / vars.angular_slow_radius
    } * rotation.signum();

    let angular = (target_rotation - character.rotation) / vars.arrive_time;
    SteeringOutput::angular(angular.clamp(-vars.max_angular, vars.max_angular))
}

pub fn velocity_match(character: &Kinematic, target: &Kinematic, vars: &MovementVars) -> SteeringOutput {
    let linear = (target.velocity - character.velocity) / vars.arrive_time;
    SteeringOutput::linear(clamp_length(linear, vars.max_acceleration))
}

/// Where `target` will be after the closing-time estimate, capped by the prediction horizon.
fn predict(character: &Kinematic, target: &Kinematic, vars: &MovementVars) -> Vec2 {
    let distance = character.position.distance(target.position);
    let speed = character.velocity.length();
    let prediction = if speed <= distance / vars.prediction {
        vars.prediction
    } else {
        distance / speed
    };
    target.position + target.velocity * prediction
}

pub fn pursue(character: &Kinematic, target: &Kinematic, vars: &MovementVars) -> SteeringOutput {
    seek(character, predict(character, target, vars), vars)
}

pub fn evade(character: &Kinematic, target: &Kinematic, vars: &MovementVars) -> SteeringOutput {
    flee(character, predict(character, target, vars), vars)
}

pub fn face(character: &Kinematic, target: Vec2, vars: &MovementVars) -> SteeringOutput {
    let direction = target - character.position;
    if direction.length_squared() == 0.0 {
        return SteeringOutput::NONE;
    }
    align(character, direction.angle(), vars)
}

pub fn look_velocity(character: &Kinematic, vars: &MovementVars) -> SteeringOutput {
    if character.velocity.length_squared() == 0.0 {
        return SteeringOutput::NONE;
    }
    align(character, character.velocity.angle(), vars)
}

/// Wander state: a target drifting around a circle projected ahead of the character.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wander {
    pub offset: f32,
    pub radius: f32,
    /// Largest change of the wander orientation per evaluation, in radians.
    pub rate: f32,
    /// Current angle on the wander circle, relative to the character's orientation.
    pub orientation: f32,
}

impl Wander {
    pub fn new(offset: f32, radius: f32, rate: f32, orientation: f32) -> Self {
        Self {
            offset,
            radius,
            rate,
            orientation,
        }
    }

    pub fn steer(
        &mut self,
        character: &Kinematic,
        rng: &mut impl DeterministicRng,
        vars: &MovementVars,
    ) -> SteeringOutput {
        self.orientation = wrap_orientation(self.orientation + rng.next_binomial() * self.rate);

        let facing = character.facing();
        let circle_center = character.position + facing * self.offset;
        let target = circle_center
            + Vec2::from_angle(self.orientation + character.orientation) * self.radius;

        let turn = face(character, target, vars);
        SteeringOutput::new(facing * vars.max_acceleration, turn.angular)
    }
}

/// Inverse-square push away from every neighbour closer than `threshold`.
pub fn separation(
    character: &Kinematic,
    neighbours: impl IntoIterator<Item = Vec2>,
    threshold: f32,
    vars: &MovementVars,
) -> SteeringOutput {
    let threshold_sq = threshold * threshold;
    let mut linear = Vec2::ZERO;
    for neighbour in neighbours {
        let away = character.position - neighbour;
        let distance_sq = away.length_squared();
        if distance_sq > threshold_sq {
            continue;
        }
        let strength = (SEPARATION_DECAY / distance_sq).min(vars.max_acceleration);
        linear += away.normalize_or_zero() * strength;
    }
    SteeringOutput::linear(linear)
}

/// Steer away from the neighbour with the soonest predicted close approach.
pub fn agents_avoidance(
    character: &Kinematic,
    targets: &[Kinematic],
    vars: &MovementVars,
) -> SteeringOutput {
    let avoid_distance = 2.0 * vars.radius;

    struct Closest<'a> {
        target: &'a Kinematic,
        time: f32,
        min_separation: f32,
        distance: f32,
        relative_position: Vec2,
        relative_velocity: Vec2,
    }
    let mut closest: Option<Closest<'_>> = None;

    for target in targets {
        let relative_position = target.position - character.position;
        let relative_velocity = target.velocity - character.velocity;
        let relative_speed_sq = relative_velocity.length_squared();
        if relative_speed_sq <= f32::EPSILON {
            continue;
        }

        let time = -relative_position.dot(relative_velocity) / relative_speed_sq;
        let distance = relative_position.length();
        let min_separation = distance - relative_speed_sq.sqrt() * time;
        if min_separation > avoid_distance {
            continue;
        }
        if time <= 0.0 || closest.as_ref().is_some_and(|c| time >= c.time) {
            continue;
        }

        closest = Some(Closest {
            target,
            time,
            min_separation,
            distance,
            relative_position,
            relative_velocity,
        });
    }

    let Some(c) = closest else {
        return SteeringOutput::NONE;
    };

    let away = if c.min_separation <= 0.0 || c.distance <= avoid_distance {
        character.position - c.target.position
    } else {
        -(c.relative_position + c.relative_velocity * c.time)
    };
    SteeringOutput::linear(away.normalize_or_zero() * vars.max_acceleration)
}

/// Cast `rays` around the direction of travel and seek away from the first wall hit.
pub fn obstacle_avoidance<Q: SpatialQuery + ?Sized>(
    character: &Kinematic,
    rays: &[AvoidanceRay],
    query: &Q,
    vars: &MovementVars,
) -> SteeringOutput {
    if character.velocity.length_squared() == 0.0 {
        return SteeringOutput::NONE;
    }

    let heading = character.velocity.angle();
    for ray in rays {
        let direction = Vec2::from_angle(heading + ray.angle_offset);
        if let Some(hit) = query.raycast(character.position, direction, ray.length) {
            let target = hit.point + hit.normal * vars.avoidance_distance;
            return seek(character, target, vars);
        }
    }
    SteeringOutput::NONE
}

/// Base behaviour for a dynamic controller.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DynamicBehaviour {
    Seek(Target),
    Flee(Target),
    Arrive(Target),
    Align(BodyId),
    VelocityMatch(BodyId),
    Pursue(BodyId),
    Evade(BodyId),
    Face(Target),
    LookVelocity,
    Wander(Wander),
}

impl DynamicBehaviour {
    pub fn steer<Q: SpatialQuery + ?Sized>(
        &mut self,
        character: &Kinematic,
        query: &Q,
        rng: &mut impl DeterministicRng,
        vars: &MovementVars,
    ) -> SteeringOutput {
        let point = |target: Target| resolve(&target, query).map(|k| k.position);
        let body = |id: BodyId| resolve(&Target::Body(id), query);

        let out = match self {
            DynamicBehaviour::Seek(t) => point(*t).map(|p| seek(character, p, vars)),
            DynamicBehaviour::Flee(t) => point(*t).map(|p| flee(character, p, vars)),
            DynamicBehaviour::Arrive(t) => point(*t).map(|p| arrive(character, p, vars)),
            DynamicBehaviour::Face(t) => point(*t).map(|p| face(character, p, vars)),
            DynamicBehaviour::Align(id) => body(*id).map(|k| align(character, k.orientation, vars)),
            DynamicBehaviour::VelocityMatch(id) => {
                body(*id).map(|k| velocity_match(character, &k, vars))
            }
            DynamicBehaviour::Pursue(id) => body(*id).map(|k| pursue(character, &k, vars)),
            DynamicBehaviour::Evade(id) => body(*id).map(|k| evade(character, &k, vars)),
            DynamicBehaviour::LookVelocity => Some(look_velocity(character, vars)),
            DynamicBehaviour::Wander(w) => Some(w.steer(character, rng, vars)),
        };
        out.unwrap_or(SteeringOutput::NONE)
    }
}

pub(crate) fn resolve<Q: SpatialQuery + ?Sized>(target: &Target, query: &Q) -> Option<Kinematic> {
    match target {
        Target::Point(p) => Some(Kinematic::at(*p)),
        Target::Body(id) => {
            let body = query.body(*id);
            if body.is_none() {
                tracing::debug!(body = id.0, "Steering target not found");
            }
            body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_core::SplitMix64;

    fn vars() -> MovementVars {
        MovementVars::default()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn seek_and_flee_point_in_opposite_directions() {
        let me = Kinematic::at(Vec2::ZERO);
        let target = Vec2::new(3.0, 4.0);

        let s = seek(&me, target, &vars());
        let f = flee(&me, target, &vars());
        assert!(close(s.linear.length(), 3.0));
        assert!(close(s.linear.x, 1.8) && close(s.linear.y, 2.4));
        assert_eq!(f.linear, -s.linear);
    }

    #[test]
    fn flee_ignores_targets_beyond_threshold() {
        let me = Kinematic::at(Vec2::ZERO);
        assert!(flee(&me, Vec2::new(10.5, 0.0), &vars()).is_none());
        assert!(!flee(&me, Vec2::new(9.5, 0.0), &vars()).is_none());
    }

    #[test]
    fn arrive_stops_inside_target_radius_and_is_clamped() {
        let me = Kinematic::at(Vec2::ZERO);
        assert!(arrive(&me, Vec2::new(0.5, 0.5), &vars()).is_none());

        for d in [1.0, 2.0, 3.9, 4.0, 25.0] {
            let out = arrive(&me, Vec2::new(d, 0.0), &vars());
            assert!(out.linear.length() <= vars().max_acceleration + 1e-5);
            assert!(out.linear.x > 0.0);
        }
    }

    #[test]
    fn arrive_brakes_when_moving_fast_inside_slow_radius() {
        let mut me = Kinematic::at(Vec2::ZERO);
        me.velocity = Vec2::new(10.0, 0.0);
        let out = arrive(&me, Vec2::new(2.0, 0.0), &vars());
        assert!(out.linear.x < 0.0);
    }

    #[test]
    fn align_turns_the_short_way_and_respects_limits() {
        let me = Kinematic::new(Vec2::ZERO, 0.1);
        let out = align(&me, -0.1 + core::f32::consts::TAU, &vars());
        assert!(out.angular < 0.0);
        assert!(out.angular.abs() <= vars().max_angular + 1e-6);

        let aligned = align(&me, 0.1 + 1f32.to_radians(), &vars());
        assert!(aligned.is_none());
    }

    #[test]
    fn pursue_leads_a_moving_target() {
        let me = Kinematic::at(Vec2::ZERO);
        let mut target = Kinematic::at(Vec2::new(5.0, 0.0));
        target.velocity = Vec2::new(0.0, 4.0);

        // Character at rest: prediction uses the full horizon (0.5 s) -> (5, 2).
        let out = pursue(&me, &target, &vars());
        let expected = Vec2::new(5.0, 2.0).normalize_or_zero() * 3.0;
        assert!(close(out.linear.x, expected.x) && close(out.linear.y, expected.y));
    }

    #[test]
    fn face_and_look_velocity_need_a_direction() {
        let mut me = Kinematic::at(Vec2::new(1.0, 1.0));
        assert!(face(&me, Vec2::new(1.0, 1.0), &vars()).is_none());
        assert!(look_velocity(&me, &vars()).is_none());

        me.velocity = Vec2::new(0.0, 1.0);
        assert!(look_velocity(&me, &vars()).angular > 0.0);
    }

    #[test]
    fn wander_accelerates_forward_at_max() {
        let me = Kinematic::new(Vec2::ZERO, core::f32::consts::FRAC_PI_2);
        let mut wander = Wander::new(2.0, 0.5, 0.4, 0.0);
        let mut rng = SplitMix64::new(7);
        for _ in 0..16 {
            let out = wander.steer(&me, &mut rng, &vars());
            assert!(close(out.linear.x, 0.0));
            assert!(close(out.linear.y, 3.0));
        }
    }

    #[test]
    fn separation_pushes_away_and_ignores_distant_neighbours() {
        let me = Kinematic::at(Vec2::ZERO);
        let out = separation(&me, [Vec2::new(0.5, 0.0)], 1.0, &vars());
        assert!(close(out.linear.x, -3.0));
        assert!(close(out.linear.y, 0.0));

        assert!(separation(&me, [Vec2::new(1.5, 0.0)], 1.0, &vars()).is_none());
    }

    #[test]
    fn separation_falls_off_with_square_distance() {
        let mut v = vars();
        v.max_acceleration = 100.0;
        let me = Kinematic::at(Vec2::ZERO);
        let out = separation(&me, [Vec2::new(0.0, 2.0)], 3.0, &v);
        assert!(close(out.linear.y, -0.75));
    }

    #[test]
    fn agents_avoidance_steers_off_a_head_on_course() {
        let mut v = vars();
        v.radius = 0.5;
        let mut me = Kinematic::at(Vec2::ZERO);
        me.velocity = Vec2::new(1.0, 0.0);
        let mut other = Kinematic::at(Vec2::new(10.0, 0.3));
        other.velocity = Vec2::new(-1.0, 0.0);

        let out = agents_avoidance(&me, &[other], &v);
        assert!(close(out.linear.length(), v.max_acceleration));
        // Closest approach puts the other agent above us; steer below.
        assert!(out.linear.y < 0.0);
    }

    #[test]
    fn agents_avoidance_ignores_diverging_and_distant_agents() {
        let mut v = vars();
        v.radius = 0.5;
        let mut me = Kinematic::at(Vec2::ZERO);
        me.velocity = Vec2::new(1.0, 0.0);

        let mut behind = Kinematic::at(Vec2::new(-5.0, 0.0));
        behind.velocity = Vec2::new(-1.0, 0.0);
        let mut passing_wide = Kinematic::at(Vec2::new(10.0, 5.0));
        passing_wide.velocity = Vec2::new(-1.0, 0.0);

        assert!(agents_avoidance(&me, &[behind, passing_wide], &v).is_none());
    }

    #[test]
    fn agents_avoidance_moves_directly_away_when_overlapping() {
        let v = vars();
        let mut me = Kinematic::at(Vec2::ZERO);
        me.velocity = Vec2::new(1.0, 0.0);
        let mut other = Kinematic::at(Vec2::new(1.0, 1.0));
        other.velocity = Vec2::new(-1.0, 0.0);

        let out = agents_avoidance(&me, &[other], &v);
        let expected = Vec2::new(-1.0, -1.0).normalize_or_zero() * v.max_acceleration;
        assert!(close(out.linear.x, expected.x) && close(out.linear.y, expected.y));
    }
}
