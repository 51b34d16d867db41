//! The character archetypes and the state machines that drive them.

use ai_core::Capabilities;
use ai_fsm::{and, not, ConditionRef, FsmBuilder, State, StateId, StateMachine};
use ai_nav::Vec2;
use ai_steering::{BodyId, Kinematic, MovementController, MovementVars};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::actions::{
    deposit_resource, get_beer, look_for_bed, look_for_beer_table, look_for_resource, serve_beer,
    Announce, Effect, Idle,
};
use crate::components::{Drunkenness, Energy, Inventory, Mining};
use crate::conditions::{
    empty_tables, in_bed, inventory_amount, is_drinking, is_drunk, is_mining, rested, tired,
};
use crate::objects::ResourceKind;
use crate::{Result, Town};

/// Gold a miner carries before heading to a deposit.
pub const MINER_LOAD: u32 = 10;
/// Beers a waiter fetches per trip.
pub const WAITER_LOAD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Archetype {
    Miner,
    Drunkard,
    Waiter,
    /// Idles until tired, then sleeps.
    Debug,
}

impl Archetype {
    pub const ALL: [Archetype; 4] = [
        Archetype::Miner,
        Archetype::Drunkard,
        Archetype::Waiter,
        Archetype::Debug,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Archetype::Miner => "Miner",
            Archetype::Drunkard => "Drunkard",
            Archetype::Waiter => "Waiter",
            Archetype::Debug => "Debug",
        }
    }

    /// Components for a fresh character of this archetype standing at `position`.
    ///
    /// Every archetype moves with wall avoidance on and carries energy and an inventory.
    pub fn capabilities(
        self,
        id: u64,
        position: Vec2,
        vars: MovementVars,
        seed: u64,
    ) -> Result<Capabilities> {
        let mut mover =
            MovementController::new(BodyId(id), Kinematic::at(position), vars)?.with_seed(seed);
        mover.toggle_wall_avoidance();

        let caps = Capabilities::new()
            .with_actuator(mover)
            .with_sensor(Energy::default())
            .with_sensor(Inventory::new());
        Ok(match self {
            Archetype::Miner => caps.with_actuator(Mining::default()),
            Archetype::Drunkard => caps.with_actuator(Drunkenness::default()),
            Archetype::Waiter | Archetype::Debug => caps,
        })
    }

    /// Wire the archetype's machine for a character already spawned in `town`.
    pub fn build_fsm(self, town: &Town, agent: u64) -> Result<StateMachine<Town>> {
        match self {
            Archetype::Miner => miner(town, agent),
            Archetype::Drunkard => drunkard(town, agent),
            Archetype::Waiter => waiter(town, agent),
            Archetype::Debug => debug(town, agent),
        }
    }
}

/// "Looking for bed" and "Sleep", reachable from anywhere once tired.
fn add_sleep(
    fsm: &mut FsmBuilder<Town>,
    town: &Town,
    agent: u64,
) -> Result<(StateId, StateId)> {
    let looking = fsm.add_state(State::new("Looking for bed").on_execute(look_for_bed(town, agent)?));
    let sleep = fsm.add_state(
        State::new("Sleep")
            .on_execute(Announce::sleep(town, agent)?)
            .on_exit(Effect::wake_up(town, agent)?),
    );
    fsm.add_global_transition(looking, tired(town, agent)?)?;
    fsm.add_transition(looking, sleep, in_bed(town, agent)?)?;
    Ok((looking, sleep))
}

fn gold(town: &Town, agent: u64, predicate: fn(u32) -> bool) -> Result<ConditionRef<Town>> {
    inventory_amount(town, agent, ResourceKind::Gold, predicate)
}

fn beer(town: &Town, agent: u64, predicate: fn(u32) -> bool) -> Result<ConditionRef<Town>> {
    inventory_amount(town, agent, ResourceKind::Beer, predicate)
}

fn miner(town: &Town, agent: u64) -> Result<StateMachine<Town>> {
    let mut fsm = FsmBuilder::new(Archetype::Miner.name());
    let looking = fsm.add_state(
        State::new("Looking for vein")
            .on_execute(look_for_resource(town, agent, ResourceKind::Gold)?),
    );
    let mining = fsm.add_state(
        State::new("Mining")
            .on_execute(Announce::mining(town, agent)?)
            .on_exit(Effect::stop_mining(town, agent)?),
    );
    let storing = fsm.add_state(
        State::new("Storing").on_execute(deposit_resource(town, agent, ResourceKind::Gold)?),
    );
    let (_, sleep) = add_sleep(&mut fsm, town, agent)?;

    let loaded = || gold(town, agent, |n| n >= MINER_LOAD);
    let unloaded = || gold(town, agent, |n| n < MINER_LOAD);

    fsm.add_transition(looking, mining, is_mining(town, agent)?)?;
    fsm.add_transition(mining, storing, loaded()?)?;
    fsm.add_transition(storing, looking, unloaded()?)?;
    fsm.add_transition(sleep, looking, and(unloaded()?, rested(town, agent)?))?;
    fsm.add_transition(sleep, storing, and(loaded()?, rested(town, agent)?))?;
    Ok(fsm.build(looking)?)
}

fn drunkard(town: &Town, agent: u64) -> Result<StateMachine<Town>> {
    let mut fsm = FsmBuilder::new(Archetype::Drunkard.name());
    let looking = fsm.add_state(
        State::new("Looking for table").on_execute(look_for_beer_table(town, agent)?),
    );
    let drinking = fsm.add_state(
        State::new("Drinking beer")
            .on_execute(Announce::drinking(town, agent)?)
            .on_exit(Effect::stop_drinking(town, agent)?),
    );
    let drunk = fsm.add_state(
        State::new("Drunk")
            .on_execute(Effect::drunk(town, agent)?)
            .on_exit(Effect::sober_up(town, agent)?),
    );
    let (_, sleep) = add_sleep(&mut fsm, town, agent)?;

    let sober = || -> Result<ConditionRef<Town>> {
        Ok(and(
            not(is_drinking(town, agent)?),
            not(is_drunk(town, agent)?),
        ))
    };
    fsm.add_transition(looking, drinking, is_drinking(town, agent)?)?;
    fsm.add_transition(drinking, drunk, is_drunk(town, agent)?)?;
    fsm.add_transition(drunk, looking, sober()?)?;
    fsm.add_transition(sleep, drunk, and(is_drunk(town, agent)?, rested(town, agent)?))?;
    fsm.add_transition(sleep, looking, and(sober()?, rested(town, agent)?))?;
    Ok(fsm.build(looking)?)
}

fn waiter(town: &Town, agent: u64) -> Result<StateMachine<Town>> {
    let mut fsm = FsmBuilder::new(Archetype::Waiter.name());
    let idle = fsm.add_state(State::new("Idle"));
    let getting = fsm.add_state(
        State::new("Getting beer").on_execute(get_beer(town, agent, WAITER_LOAD)?),
    );
    let serving = fsm.add_state(State::new("Serving beer").on_execute(serve_beer(town, agent)?));
    let (_, sleep) = add_sleep(&mut fsm, town, agent)?;

    let none = || beer(town, agent, |n| n == 0);
    let some = || beer(town, agent, |n| n > 0);
    let full = || beer(town, agent, |n| n >= WAITER_LOAD);
    let empty = || empty_tables(town, agent);
    let served = || -> Result<ConditionRef<Town>> { Ok(not(empty_tables(town, agent)?)) };

    fsm.add_transition(idle, getting, none()?)?;
    fsm.add_transition(idle, serving, and(some()?, empty()?))?;
    fsm.add_transition(getting, idle, and(full()?, served()?))?;
    fsm.add_transition(getting, serving, and(full()?, empty()?))?;
    fsm.add_transition(serving, idle, and(some()?, served()?))?;
    fsm.add_transition(serving, getting, none()?)?;

    let awake = || rested(town, agent);
    fsm.add_transition(sleep, idle, and(and(some()?, served()?), awake()?))?;
    fsm.add_transition(sleep, getting, and(none()?, awake()?))?;
    fsm.add_transition(sleep, serving, and(and(some()?, empty()?), awake()?))?;
    Ok(fsm.build(idle)?)
}

fn debug(town: &Town, agent: u64) -> Result<StateMachine<Town>> {
    let mut fsm = FsmBuilder::new(Archetype::Debug.name());
    let idle = fsm.add_state(State::new("Idle").on_execute(Idle::new(town, agent)?));
    let looking = fsm.add_state(State::new("Looking for bed").on_execute(look_for_bed(town, agent)?));
    let sleep = fsm.add_state(
        State::new("Sleep")
            .on_execute(Announce::sleep(town, agent)?)
            .on_exit(Effect::wake_up(town, agent)?),
    );
    fsm.add_transition(idle, looking, tired(town, agent)?)?;
    fsm.add_transition(looking, sleep, in_bed(town, agent)?)?;
    fsm.add_transition(sleep, idle, rested(town, agent)?)?;
    Ok(fsm.build(idle)?)
}
