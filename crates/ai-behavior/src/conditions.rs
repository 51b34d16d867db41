//! Transition predicates over a character's components.
//!
//! Each constructor checks the capability the predicate reads, so a miswired archetype fails
//! when its machine is built rather than silently never transitioning.

use ai_fsm::{condition, ConditionRef};

use crate::components::{Drunkenness, Energy, Inventory, Mining};
use crate::objects::ResourceKind;
use crate::{Result, Town};

fn energy<'a>(town: &'a Town, agent: u64) -> Option<&'a Energy> {
    town.character(agent)?.energy()
}

fn drunkenness<'a>(town: &'a Town, agent: u64) -> Option<&'a Drunkenness> {
    town.character(agent)?.drunkenness()
}

/// Out of energy and not lying in a bed.
pub fn tired(town: &Town, agent: u64) -> Result<ConditionRef<Town>> {
    town.capabilities(agent)?.require_sensor::<Energy>()?;
    Ok(condition(|town: &Town, agent| {
        energy(town, agent).is_some_and(Energy::is_tired)
    }))
}

pub fn in_bed(town: &Town, agent: u64) -> Result<ConditionRef<Town>> {
    town.capabilities(agent)?.require_sensor::<Energy>()?;
    Ok(condition(|town: &Town, agent| {
        energy(town, agent).is_some_and(|e| e.bed().is_some())
    }))
}

pub fn rested(town: &Town, agent: u64) -> Result<ConditionRef<Town>> {
    town.capabilities(agent)?.require_sensor::<Energy>()?;
    Ok(condition(|town: &Town, agent| {
        energy(town, agent).is_some_and(Energy::is_rested)
    }))
}

pub fn missing_zone(town: &Town, agent: u64) -> Result<ConditionRef<Town>> {
    town.capabilities(agent)?;
    Ok(condition(|town: &Town, agent| town.agent_zone(agent).is_none()))
}

pub fn in_zone(town: &Town, agent: u64) -> Result<ConditionRef<Town>> {
    town.capabilities(agent)?;
    Ok(condition(|town: &Town, agent| town.agent_zone(agent).is_some()))
}

/// Compares the carried amount of `kind` with `predicate`.
pub fn inventory_amount<F>(
    town: &Town,
    agent: u64,
    kind: ResourceKind,
    predicate: F,
) -> Result<ConditionRef<Town>>
where
    F: Fn(u32) -> bool + 'static,
{
    town.capabilities(agent)?.require_sensor::<Inventory>()?;
    Ok(condition(move |town: &Town, agent| {
        town.character(agent)
            .and_then(|c| c.inventory())
            .is_some_and(|inv| predicate(inv.amount(kind)))
    }))
}

pub fn is_mining(town: &Town, agent: u64) -> Result<ConditionRef<Town>> {
    town.capabilities(agent)?.require_actuator::<Mining>()?;
    Ok(condition(|town: &Town, agent| {
        town.character(agent)
            .and_then(|c| c.mining())
            .is_some_and(Mining::is_mining)
    }))
}

pub fn is_drinking(town: &Town, agent: u64) -> Result<ConditionRef<Town>> {
    town.capabilities(agent)?.require_actuator::<Drunkenness>()?;
    Ok(condition(|town: &Town, agent| {
        drunkenness(town, agent).is_some_and(Drunkenness::is_drinking)
    }))
}

pub fn is_drunk(town: &Town, agent: u64) -> Result<ConditionRef<Town>> {
    town.capabilities(agent)?.require_actuator::<Drunkenness>()?;
    Ok(condition(|town: &Town, agent| {
        drunkenness(town, agent).is_some_and(Drunkenness::is_drunk)
    }))
}

/// Some beer table in the agent's zone has run dry.
pub fn empty_tables(town: &Town, agent: u64) -> Result<ConditionRef<Town>> {
    town.capabilities(agent)?;
    Ok(condition(|town: &Town, agent| town.has_empty_beer_tables(agent)))
}
