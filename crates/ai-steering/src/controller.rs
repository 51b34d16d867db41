//! Per-character movement integration.
//!
//! A [`MovementController`] owns the kinematic state of one body. In dynamic mode every update
//! evaluates the base behaviour plus the optional wall avoidance, separation, agent avoidance and
//! look-where-you-go layers against the same snapshot, integrates the previous velocity, applies
//! friction and then adds the weighted accelerations.

use core::f32::consts::TAU;

use ai_core::rng::derive_seed;
use ai_core::{DeterministicRng, SplitMix64};
use ai_nav::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::{
    clamp_length, wrap_orientation, Kinematic, KinematicOutput, SteeringOutput, STOP_EPSILON,
};
use crate::dynamic::{self, DynamicBehaviour, Wander};
use crate::kinematic::KinematicBehaviour;
use crate::{BodyId, FollowPath, MovementVars, Result, SpatialQuery};

const WALL_AVOIDANCE_WEIGHT: f32 = 2.0;
const SEPARATION_WEIGHT: f32 = 7.0;
const AGENT_AVOIDANCE_WEIGHT: f32 = 2.5;

const WANDER_OFFSET: f32 = 2.0;
const WANDER_RADIUS: f32 = 0.5;
const WANDER_RATE: f32 = 0.4;

/// RNG stream used for wandering.
const WANDER_STREAM: u64 = 0x5741_4e44;

/// A wall probe cast from the character, rotated relative to its direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AvoidanceRay {
    /// Radians, counter-clockwise from the velocity direction.
    pub angle_offset: f32,
    pub length: f32,
}

impl AvoidanceRay {
    pub const fn new(angle_offset: f32, length: f32) -> Self {
        Self {
            angle_offset,
            length,
        }
    }
}

/// One long ray straight ahead and two short whiskers.
pub const DEFAULT_AVOIDANCE_RAYS: [AvoidanceRay; 3] = [
    AvoidanceRay::new(0.0, 2.0),
    AvoidanceRay::new(0.5, 1.0),
    AvoidanceRay::new(-0.5, 1.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MovementMode {
    #[default]
    Dynamic,
    Kinematic,
    PlayerControlled,
}

#[derive(Debug, Clone)]
enum BaseSteering {
    Dynamic(DynamicBehaviour),
    Kinematic(KinematicBehaviour),
    FollowPath(FollowPath),
}

/// Runs a neighbour query once every `interval` updates and replays its result in between.
#[derive(Debug, Clone, Copy)]
struct Throttle {
    interval: u32,
    counter: u32,
    last: Vec2,
}

impl Throttle {
    fn new(interval: u32, offset: u64) -> Self {
        let interval = interval.max(1);
        Self {
            interval,
            counter: (offset % interval as u64) as u32,
            last: Vec2::ZERO,
        }
    }

    fn advance(&mut self) -> bool {
        self.counter = (self.counter + 1) % self.interval;
        self.counter == 0
    }
}

#[derive(Debug, Clone)]
pub struct MovementController {
    id: BodyId,
    vars: MovementVars,
    kinematic: Kinematic,
    enabled: bool,
    mode: MovementMode,
    base: Option<BaseSteering>,
    wall_avoidance: bool,
    separation: bool,
    agent_avoidance: bool,
    look_velocity: bool,
    separation_throttle: Throttle,
    agent_avoidance_throttle: Throttle,
    rays: Vec<AvoidanceRay>,
    player_input: (Vec2, f32),
    rng: SplitMix64,
    neighbours: Vec<(BodyId, Kinematic)>,
}

impl MovementController {
    pub fn new(id: BodyId, kinematic: Kinematic, vars: MovementVars) -> Result<Self> {
        vars.validate()?;
        Ok(Self {
            id,
            vars,
            kinematic,
            enabled: true,
            mode: MovementMode::Dynamic,
            base: None,
            wall_avoidance: false,
            separation: false,
            agent_avoidance: false,
            look_velocity: false,
            separation_throttle: Throttle::new(vars.query_interval, id.0),
            agent_avoidance_throttle: Throttle::new(vars.query_interval, id.0),
            rays: DEFAULT_AVOIDANCE_RAYS.to_vec(),
            player_input: (Vec2::ZERO, 0.0),
            rng: SplitMix64::new(derive_seed(0, id.0, WANDER_STREAM)),
            neighbours: Vec::new(),
        })
    }

    /// Reseed the controller's random stream from a simulation seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SplitMix64::new(derive_seed(seed, self.id.0, WANDER_STREAM));
        self
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn vars(&self) -> &MovementVars {
        &self.vars
    }

    pub fn set_vars(&mut self, vars: MovementVars) -> Result<()> {
        vars.validate()?;
        if vars.query_interval != self.vars.query_interval {
            self.separation_throttle = Throttle::new(vars.query_interval, self.id.0);
            self.agent_avoidance_throttle = Throttle::new(vars.query_interval, self.id.0);
        }
        self.vars = vars;
        Ok(())
    }

    pub fn kinematic(&self) -> &Kinematic {
        &self.kinematic
    }

    pub fn position(&self) -> Vec2 {
        self.kinematic.position
    }

    /// Move the body without going through integration.
    pub fn teleport(&mut self, position: Vec2) {
        self.kinematic.position = position;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn is_kinematic(&self) -> bool {
        self.mode == MovementMode::Kinematic
    }

    pub fn set_player_controlled(&mut self, controlled: bool) {
        self.mode = if controlled {
            MovementMode::PlayerControlled
        } else {
            MovementMode::Dynamic
        };
    }

    /// Direction input (normalised internally) and turn input in `[-1, 1]`.
    pub fn set_player_input(&mut self, direction: Vec2, turn: f32) {
        self.player_input = (direction, turn.clamp(-1.0, 1.0));
    }

    pub fn set_avoidance_rays(&mut self, rays: Vec<AvoidanceRay>) {
        self.rays = rays;
    }

    pub fn enable_dynamic(&mut self, behaviour: DynamicBehaviour) {
        self.use_dynamic();
        self.base = Some(BaseSteering::Dynamic(behaviour));
    }

    pub fn enable_kinematic(&mut self, behaviour: KinematicBehaviour) {
        if self.mode != MovementMode::PlayerControlled {
            self.mode = MovementMode::Kinematic;
        }
        self.base = Some(BaseSteering::Kinematic(behaviour));
    }

    /// Dynamic wander from a random point on the wander circle.
    pub fn enable_dynamic_wander(&mut self) {
        let start = self.rng.next_f32_range(0.0, TAU);
        self.enable_dynamic(DynamicBehaviour::Wander(Wander::new(
            WANDER_OFFSET,
            WANDER_RADIUS,
            WANDER_RATE,
            start,
        )));
    }

    pub fn start_follow_path(&mut self, points: Vec<Vec2>, looped: bool) -> Result<()> {
        let path = FollowPath::new(points, looped)?;
        self.use_dynamic();
        tracing::debug!(
            body = self.id.0,
            waypoints = path.points().len(),
            looped,
            "Following path"
        );
        self.base = Some(BaseSteering::FollowPath(path));
        Ok(())
    }

    pub fn stop_follow_path(&mut self) -> bool {
        if !self.is_following_path() {
            tracing::warn!(
                body = self.id.0,
                "Trying to stop following a path, but the agent is not following one"
            );
            return false;
        }
        self.base = None;
        true
    }

    pub fn is_following_path(&self) -> bool {
        matches!(self.base, Some(BaseSteering::FollowPath(_)))
    }

    pub fn path(&self) -> Option<&FollowPath> {
        match &self.base {
            Some(BaseSteering::FollowPath(path)) => Some(path),
            _ => None,
        }
    }

    pub fn has_base_movement(&self) -> bool {
        self.base.is_some()
    }

    pub fn clear_base_movement(&mut self) {
        self.base = None;
    }

    pub fn toggle_wall_avoidance(&mut self) -> bool {
        self.use_dynamic();
        self.wall_avoidance = !self.wall_avoidance;
        self.wall_avoidance
    }

    pub fn toggle_separation(&mut self) -> bool {
        self.use_dynamic();
        self.separation = !self.separation;
        self.separation_throttle.last = Vec2::ZERO;
        self.separation
    }

    pub fn toggle_agent_avoidance(&mut self) -> bool {
        self.use_dynamic();
        self.agent_avoidance = !self.agent_avoidance;
        self.agent_avoidance_throttle.last = Vec2::ZERO;
        self.agent_avoidance
    }

    pub fn toggle_look_velocity(&mut self) -> bool {
        self.use_dynamic();
        self.look_velocity = !self.look_velocity;
        self.look_velocity
    }

    fn use_dynamic(&mut self) {
        if self.mode == MovementMode::Kinematic {
            self.mode = MovementMode::Dynamic;
        }
    }

    /// Advance one tick of `dt_seconds` against the settled state in `query`.
    pub fn update<Q: SpatialQuery + ?Sized>(&mut self, dt_seconds: f32, query: &Q) {
        if !self.enabled {
            return;
        }
        let dt = dt_seconds.max(0.0);
        match self.mode {
            MovementMode::PlayerControlled => self.controlled_update(dt),
            MovementMode::Kinematic => self.kinematic_update(dt, query),
            MovementMode::Dynamic => self.dynamic_update(dt, query),
        }
    }

    fn integrate(&mut self, dt: f32) {
        self.kinematic.position += self.kinematic.velocity * dt;
        self.kinematic.orientation =
            wrap_orientation(self.kinematic.orientation + self.kinematic.rotation * dt);
    }

    fn kinematic_update<Q: SpatialQuery + ?Sized>(&mut self, dt: f32, query: &Q) {
        let out = match &self.base {
            Some(BaseSteering::Kinematic(b)) => {
                b.steer(&self.kinematic, query, &mut self.rng, &self.vars)
            }
            _ => KinematicOutput::NONE,
        };

        if let Some(orientation) = out.orientation {
            self.kinematic.orientation = orientation;
        }
        self.integrate(dt);

        self.kinematic.velocity = clamp_length(out.velocity, self.vars.max_speed);
        self.kinematic.rotation = out.rotation;
    }

    fn controlled_update(&mut self, dt: f32) {
        let (direction, turn) = self.player_input;
        self.integrate(dt);

        self.kinematic.velocity = direction.normalize_or_zero() * self.vars.max_speed;
        self.kinematic.rotation = turn * self.vars.max_angular;
    }

    fn dynamic_update<Q: SpatialQuery + ?Sized>(&mut self, dt: f32, query: &Q) {
        let character = self.kinematic;
        let vars = self.vars;

        let base = match &mut self.base {
            Some(BaseSteering::Dynamic(b)) => b.steer(&character, query, &mut self.rng, &vars),
            Some(BaseSteering::FollowPath(path)) => path.steer(&character, &vars),
            _ => SteeringOutput::NONE,
        };
        let wall = if self.wall_avoidance {
            dynamic::obstacle_avoidance(&character, &self.rays, query, &vars)
        } else {
            SteeringOutput::NONE
        };
        let separation = self.separation_force(&character, query);
        let agent_avoidance = self.agent_avoidance_force(&character, query);
        let look = if self.look_velocity {
            dynamic::look_velocity(&character, &vars)
        } else {
            SteeringOutput::NONE
        };

        if self.path().is_some_and(FollowPath::arrived) {
            tracing::debug!(body = self.id.0, "Reached end of path");
            self.stop_follow_path();
        }

        self.integrate(dt);

        let k = &mut self.kinematic;
        let speed = k.velocity.length();
        k.velocity -= k.velocity.normalize_or_zero() * (vars.linear_friction * dt).min(speed);
        k.rotation -= k.rotation * vars.angular_friction * dt;
        if k.velocity.length() <= STOP_EPSILON {
            k.velocity = Vec2::ZERO;
        }

        k.velocity += (base.linear
            + wall.linear * WALL_AVOIDANCE_WEIGHT
            + separation.linear * SEPARATION_WEIGHT
            + agent_avoidance.linear * AGENT_AVOIDANCE_WEIGHT)
            * dt;
        k.rotation += (base.angular + look.angular) * dt;

        if k.velocity.length() <= STOP_EPSILON {
            k.velocity = Vec2::ZERO;
        }
        k.velocity = clamp_length(k.velocity, vars.max_speed);
        k.rotation = k.rotation.clamp(-vars.max_rotation, vars.max_rotation);
    }

    fn separation_force<Q: SpatialQuery + ?Sized>(
        &mut self,
        character: &Kinematic,
        query: &Q,
    ) -> SteeringOutput {
        let due = self.separation_throttle.advance();
        if !self.separation {
            return SteeringOutput::NONE;
        }
        if !due {
            return SteeringOutput::linear(self.separation_throttle.last);
        }

        self.neighbours.clear();
        query.overlap_circle(
            character.position,
            self.vars.min_separation,
            Some(self.id),
            &mut self.neighbours,
        );
        let out = dynamic::separation(
            character,
            self.neighbours.iter().map(|(_, k)| k.position),
            self.vars.min_separation,
            &self.vars,
        );
        self.separation_throttle.last = out.linear;
        out
    }

    fn agent_avoidance_force<Q: SpatialQuery + ?Sized>(
        &mut self,
        character: &Kinematic,
        query: &Q,
    ) -> SteeringOutput {
        let due = self.agent_avoidance_throttle.advance();
        if !self.agent_avoidance {
            return SteeringOutput::NONE;
        }
        if !due {
            return SteeringOutput::linear(self.agent_avoidance_throttle.last);
        }

        self.neighbours.clear();
        query.overlap_circle(
            character.position,
            self.vars.radius * 2.0,
            Some(self.id),
            &mut self.neighbours,
        );
        let targets: Vec<Kinematic> = self.neighbours.iter().map(|(_, k)| *k).collect();
        let out = dynamic::agents_avoidance(character, &targets, &self.vars);
        self.agent_avoidance_throttle.last = out.linear;
        out
    }
}
