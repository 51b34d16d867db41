use std::collections::BTreeMap;

use ai_core::{Capabilities, WorldMut, WorldView};
use ai_nav::{Aabb, GridSpec, NavPath, Navigator, TileGraph, Vec2};
use ai_steering::{BodyId, BodySnapshot, MovementController};

use crate::components::{Drunkenness, Energy, Inventory, Mining};
use crate::objects::{Bed, BedId, Deposit, DepositId, ResourceKind, Vein, VeinId, ZoneId};
use crate::{BuildError, Result};

/// A walkable region with its own tile graph and the objects placed in it.
#[derive(Debug, Clone)]
pub struct Zone {
    pub name: String,
    bounds: Aabb,
    graph: TileGraph,
    pub(crate) beds: Vec<BedId>,
    pub(crate) veins: Vec<VeinId>,
    pub(crate) deposits: Vec<DepositId>,
    pub(crate) beer_tables: Vec<DepositId>,
}

impl Zone {
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn graph(&self) -> &TileGraph {
        &self.graph
    }

    pub fn beds(&self) -> &[BedId] {
        &self.beds
    }

    pub fn veins(&self) -> &[VeinId] {
        &self.veins
    }

    pub fn deposits(&self) -> &[DepositId] {
        &self.deposits
    }

    pub fn beer_tables(&self) -> &[DepositId] {
        &self.beer_tables
    }
}

/// Everything the town knows about one character: its capabilities and current zone.
pub struct Character {
    pub capabilities: Capabilities,
    pub(crate) zone: Option<ZoneId>,
}

impl Character {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            zone: None,
        }
    }

    pub fn zone(&self) -> Option<ZoneId> {
        self.zone
    }

    pub fn mover(&self) -> Option<&MovementController> {
        self.capabilities.actuator()
    }

    pub fn energy(&self) -> Option<&Energy> {
        self.capabilities.first_sensor()
    }

    pub fn inventory(&self) -> Option<&Inventory> {
        self.capabilities.first_sensor()
    }

    pub fn mining(&self) -> Option<&Mining> {
        self.capabilities.actuator()
    }

    pub fn drunkenness(&self) -> Option<&Drunkenness> {
        self.capabilities.actuator()
    }

    pub fn position(&self) -> Option<Vec2> {
        self.mover().map(MovementController::position)
    }
}

/// The shared world every town agent acts on.
///
/// Agents are keyed by `u64` ids and always visited in id order.
#[derive(Default)]
pub struct Town {
    zones: Vec<Zone>,
    obstacles: Vec<Aabb>,
    beds: Vec<Bed>,
    veins: Vec<Vein>,
    deposits: Vec<Deposit>,
    characters: BTreeMap<u64, Character>,
    bodies: BodySnapshot,
    elapsed: f64,
}

impl WorldView for Town {
    type Agent = u64;
}

impl WorldMut for Town {}

impl Town {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static obstacle. Zones added afterwards route around it.
    pub fn add_obstacle(&mut self, obstacle: Aabb) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Aabb] {
        &self.obstacles
    }

    pub fn add_zone(&mut self, name: impl Into<String>, spec: GridSpec) -> ZoneId {
        let name = name.into();
        let graph = TileGraph::from_obstacles(spec, &self.obstacles);
        tracing::debug!(
            zone = %name,
            walkable = graph.walkable_count(),
            cells = spec.cell_count(),
            "built zone graph"
        );
        let id = ZoneId(self.zones.len());
        self.zones.push(Zone {
            name,
            bounds: spec.bounds(),
            graph,
            beds: Vec::new(),
            veins: Vec::new(),
            deposits: Vec::new(),
            beer_tables: Vec::new(),
        });
        id
    }

    pub fn add_bed(&mut self, zone: ZoneId, position: Vec2) -> Result<BedId> {
        let id = BedId(self.beds.len());
        self.zone_mut(zone)?.beds.push(id);
        self.beds.push(Bed::new(position));
        Ok(id)
    }

    pub fn add_vein(&mut self, zone: ZoneId, vein: Vein) -> Result<VeinId> {
        let id = VeinId(self.veins.len());
        self.zone_mut(zone)?.veins.push(id);
        self.veins.push(vein);
        Ok(id)
    }

    pub fn add_deposit(&mut self, zone: ZoneId, deposit: Deposit) -> Result<DepositId> {
        let id = DepositId(self.deposits.len());
        self.zone_mut(zone)?.deposits.push(id);
        self.deposits.push(deposit);
        Ok(id)
    }

    /// A beer table is a beer deposit that drinkers sit at and waiters refill.
    pub fn add_beer_table(&mut self, zone: ZoneId, position: Vec2, beers: u32) -> Result<DepositId> {
        let id = DepositId(self.deposits.len());
        self.zone_mut(zone)?.beer_tables.push(id);
        self.deposits
            .push(Deposit::new(ResourceKind::Beer, position, beers));
        Ok(id)
    }

    pub fn spawn(&mut self, id: u64, capabilities: Capabilities) -> Result<()> {
        if self.characters.contains_key(&id) {
            return Err(BuildError::DuplicateAgent(id));
        }
        self.characters.insert(id, Character::new(capabilities));
        Ok(())
    }

    /// Drop a character that never acted. Claims are not released.
    pub(crate) fn despawn(&mut self, id: u64) -> Option<Character> {
        self.characters.remove(&id)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id.0)
    }

    fn zone_mut(&mut self, id: ZoneId) -> Result<&mut Zone> {
        self.zones.get_mut(id.0).ok_or(BuildError::UnknownZone(id))
    }

    pub fn bed(&self, id: BedId) -> Option<&Bed> {
        self.beds.get(id.0)
    }

    pub fn vein(&self, id: VeinId) -> Option<&Vein> {
        self.veins.get(id.0)
    }

    pub fn deposit(&self, id: DepositId) -> Option<&Deposit> {
        self.deposits.get(id.0)
    }

    pub fn deposit_mut(&mut self, id: DepositId) -> Option<&mut Deposit> {
        self.deposits.get_mut(id.0)
    }

    pub fn character(&self, id: u64) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn character_mut(&mut self, id: u64) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    pub fn characters(&self) -> impl Iterator<Item = (u64, &Character)> + '_ {
        self.characters.iter().map(|(id, c)| (*id, c))
    }

    pub fn capabilities(&self, id: u64) -> Result<&Capabilities> {
        self.character(id)
            .map(|c| &c.capabilities)
            .ok_or(BuildError::UnknownAgent(id))
    }

    pub fn mover_mut(&mut self, id: u64) -> Option<&mut MovementController> {
        self.character_mut(id)?.capabilities.actuator_mut()
    }

    pub fn inventory_mut(&mut self, id: u64) -> Option<&mut Inventory> {
        self.character_mut(id)?.capabilities.first_sensor_mut()
    }

    pub fn energy_mut(&mut self, id: u64) -> Option<&mut Energy> {
        self.character_mut(id)?.capabilities.first_sensor_mut()
    }

    pub fn position(&self, id: u64) -> Option<Vec2> {
        self.character(id)?.position()
    }

    pub fn agent_zone(&self, id: u64) -> Option<ZoneId> {
        self.character(id)?.zone
    }

    /// Seconds simulated so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Settled kinematics from the end of the previous step.
    pub fn bodies(&self) -> &BodySnapshot {
        &self.bodies
    }

    fn current_zone(&self, agent: u64) -> Option<&Zone> {
        self.zone(self.agent_zone(agent)?)
    }

    pub fn available_veins(&self, agent: u64, kind: ResourceKind) -> Vec<VeinId> {
        self.current_zone(agent).map_or_else(Vec::new, |zone| {
            zone.veins
                .iter()
                .copied()
                .filter(|id| {
                    self.veins[id.0].kind() == kind && self.veins[id.0].is_available()
                })
                .collect()
        })
    }

    pub fn available_beds(&self, agent: u64) -> Vec<BedId> {
        self.current_zone(agent).map_or_else(Vec::new, |zone| {
            zone.beds
                .iter()
                .copied()
                .filter(|id| self.beds[id.0].is_available())
                .collect()
        })
    }

    pub fn deposits_of(&self, agent: u64, kind: ResourceKind) -> Vec<DepositId> {
        self.current_zone(agent).map_or_else(Vec::new, |zone| {
            zone.deposits
                .iter()
                .copied()
                .filter(|id| self.deposits[id.0].kind() == kind)
                .collect()
        })
    }

    pub fn available_deposits(&self, agent: u64, kind: ResourceKind) -> Vec<DepositId> {
        let mut deposits = self.deposits_of(agent, kind);
        deposits.retain(|id| !self.deposits[id.0].has_consumer());
        deposits
    }

    pub fn available_beer_tables(&self, agent: u64) -> Vec<DepositId> {
        self.current_zone(agent).map_or_else(Vec::new, |zone| {
            zone.beer_tables
                .iter()
                .copied()
                .filter(|id| !self.deposits[id.0].has_consumer())
                .collect()
        })
    }

    pub fn empty_beer_tables(&self, agent: u64) -> Vec<DepositId> {
        self.current_zone(agent).map_or_else(Vec::new, |zone| {
            zone.beer_tables
                .iter()
                .copied()
                .filter(|id| self.deposits[id.0].amount() == 0)
                .collect()
        })
    }

    pub fn has_empty_beer_tables(&self, agent: u64) -> bool {
        self.current_zone(agent).is_some_and(|zone| {
            zone.beer_tables
                .iter()
                .any(|id| self.deposits[id.0].amount() == 0)
        })
    }

    /// Path across the agent's current zone. `None` outside any zone or when unreachable.
    pub fn find_path(&self, agent: u64, goal: Vec2) -> Option<NavPath> {
        let start = self.position(agent)?;
        let zone = self.current_zone(agent)?;
        let path = zone.graph.find_path(start, goal);
        tracing::debug!(
            agent,
            zone = %zone.name,
            ?start,
            ?goal,
            found = path.is_some(),
            "path request"
        );
        path
    }

    pub fn occupy_bed(&mut self, agent: u64, bed: BedId) -> bool {
        let Some(slot) = self.beds.get(bed.0) else {
            tracing::warn!(agent, ?bed, "Trying to occupy an unknown bed");
            return false;
        };
        let available = slot.is_available();
        let Some(energy) = self
            .characters
            .get_mut(&agent)
            .and_then(|c| c.capabilities.first_sensor_mut::<Energy>())
        else {
            tracing::warn!(agent, "Trying to occupy a bed without an energy sensor");
            return false;
        };
        if energy.bed.is_some() {
            tracing::warn!(agent, ?bed, "Trying to occupy a bed while already occupying one");
            return false;
        }
        if !available {
            tracing::warn!(agent, ?bed, "Trying to occupy an already occupied bed");
            return false;
        }
        energy.set_bed(Some(bed));
        self.beds[bed.0].occupant = Some(agent);
        tracing::info!(agent, ?bed, "occupied bed");
        true
    }

    pub fn vacate_bed(&mut self, agent: u64) -> bool {
        let Some(bed) = self
            .characters
            .get_mut(&agent)
            .and_then(|c| c.capabilities.first_sensor_mut::<Energy>())
            .and_then(|energy| {
                let bed = energy.bed;
                energy.set_bed(None);
                bed
            })
        else {
            tracing::warn!(agent, "Trying to deoccupy a bed but the character owns no bed");
            return false;
        };
        if let Some(slot) = self.beds.get_mut(bed.0) {
            slot.occupant = None;
        }
        tracing::info!(agent, ?bed, "left bed");
        true
    }

    pub fn start_mining(&mut self, agent: u64, vein: VeinId) -> bool {
        let Some(slot) = self.veins.get(vein.0) else {
            tracing::warn!(agent, ?vein, "Trying to mine an unknown vein");
            return false;
        };
        let available = slot.is_available();
        let Some(mining) = self
            .characters
            .get_mut(&agent)
            .and_then(|c| c.capabilities.actuator_mut::<Mining>())
        else {
            tracing::warn!(agent, "Trying to mine without a mining actuator");
            return false;
        };
        if mining.vein.is_some() {
            tracing::warn!(
                agent,
                ?vein,
                "Trying to start mining a resource while already owning a vein"
            );
            return false;
        }
        if !available {
            tracing::warn!(agent, ?vein, "Trying to occupy an already occupied resource");
            return false;
        }
        mining.set_vein(Some(vein));
        self.veins[vein.0].owner = Some(agent);
        tracing::info!(agent, ?vein, "started mining");
        true
    }

    pub fn stop_mining(&mut self, agent: u64) -> bool {
        let Some(vein) = self
            .characters
            .get_mut(&agent)
            .and_then(|c| c.capabilities.actuator_mut::<Mining>())
            .and_then(|mining| {
                let vein = mining.vein;
                mining.set_vein(None);
                vein
            })
        else {
            tracing::warn!(agent, "Trying to stop mining a resource while not owning a vein");
            return false;
        };
        if let Some(slot) = self.veins.get_mut(vein.0) {
            slot.owner = None;
        }
        tracing::info!(agent, ?vein, "stopped mining");
        true
    }

    pub fn occupy_beer_table(&mut self, agent: u64, table: DepositId) -> bool {
        let Some(slot) = self.deposits.get(table.0) else {
            tracing::warn!(agent, ?table, "Trying to occupy an unknown table");
            return false;
        };
        if slot.kind() != ResourceKind::Beer {
            tracing::warn!(agent, ?table, "Trying to occupy deposit with non beer resource");
            return false;
        }
        if slot.has_consumer() {
            tracing::warn!(
                agent,
                ?table,
                "Trying to occupy beer deposit that already has an owner"
            );
            return false;
        }
        let Some(drunkenness) = self
            .characters
            .get_mut(&agent)
            .and_then(|c| c.capabilities.actuator_mut::<Drunkenness>())
        else {
            tracing::warn!(agent, "Trying to drink without a drunkenness actuator");
            return false;
        };
        if drunkenness.table.is_some() {
            tracing::warn!(agent, ?table, "Trying to occupy a table while already at one");
            return false;
        }
        drunkenness.sit_at(table);
        self.deposits[table.0].consumer = Some(agent);
        tracing::info!(agent, ?table, "sat at beer table");
        true
    }

    pub fn vacate_beer_table(&mut self, agent: u64) -> bool {
        let Some(table) = self
            .characters
            .get_mut(&agent)
            .and_then(|c| c.capabilities.actuator_mut::<Drunkenness>())
            .and_then(Drunkenness::leave_table)
        else {
            tracing::warn!(
                agent,
                "Trying to deoccupy a deposit but the drinker owns no deposit"
            );
            return false;
        };
        if let Some(slot) = self.deposits.get_mut(table.0) {
            slot.consumer = None;
        }
        tracing::info!(agent, ?table, "left beer table");
        true
    }

    pub fn enter_zone(&mut self, agent: u64, zone: ZoneId) -> bool {
        let Some(name) = self.zones.get(zone.0).map(|z| z.name.clone()) else {
            tracing::warn!(agent, ?zone, "Trying to enter an unknown zone");
            return false;
        };
        let Some(character) = self.characters.get_mut(&agent) else {
            return false;
        };
        if let Some(current) = character.zone {
            tracing::warn!(
                agent,
                ?current,
                entering = ?zone,
                "Trying to enter a zone while already inside one"
            );
            return false;
        }
        character.zone = Some(zone);
        tracing::info!(agent, zone = %name, "entered zone");
        true
    }

    pub fn exit_zone(&mut self, agent: u64, zone: ZoneId) -> bool {
        let Some(character) = self.characters.get_mut(&agent) else {
            return false;
        };
        match character.zone {
            None => {
                tracing::warn!(agent, ?zone, "Trying to exit a zone while in none");
                false
            }
            Some(current) if current != zone => {
                tracing::debug!(agent, ?current, exiting = ?zone, "ignoring exit from another zone");
                false
            }
            Some(_) => {
                character.zone = None;
                tracing::info!(agent, ?zone, "left zone");
                true
            }
        }
    }

    /// Freeze every body's kinematics for this step's neighbour queries.
    pub(crate) fn snapshot_bodies(&mut self) {
        let bodies = self.characters.iter().filter_map(|(id, c)| {
            c.mover().map(|mover| (BodyId(*id), *mover.kinematic()))
        });
        self.bodies.rebuild(bodies);
        if self.bodies.obstacles().len() != self.obstacles.len() {
            self.bodies.set_obstacles(self.obstacles.clone());
        }
    }

    pub(crate) fn update_movement(&mut self, dt: f32) {
        for character in self.characters.values_mut() {
            if let Some(mover) = character.capabilities.actuator_mut::<MovementController>() {
                mover.update(dt, &self.bodies);
            }
        }
    }

    /// Fire zone exit and enter events from the characters' new positions.
    pub(crate) fn update_zones(&mut self) {
        let mut events = Vec::new();
        for (id, character) in &self.characters {
            let Some(position) = character.position() else {
                continue;
            };
            let inside = self
                .zones
                .iter()
                .position(|z| z.bounds.contains(position))
                .map(ZoneId);
            match (character.zone, inside) {
                (Some(current), Some(now)) if current == now => {}
                (Some(current), now) => {
                    events.push((*id, Some(current), now));
                }
                (None, Some(now)) => events.push((*id, None, Some(now))),
                (None, None) => {}
            }
        }
        for (id, left, entered) in events {
            if let Some(zone) = left {
                self.exit_zone(id, zone);
            }
            if let Some(zone) = entered {
                self.enter_zone(id, zone);
            }
        }
    }

    /// Regenerate veins, then advance every character's components.
    pub(crate) fn update_components(&mut self, dt: f32) {
        self.elapsed += f64::from(dt.max(0.0));
        for vein in &mut self.veins {
            vein.update(dt);
        }

        for (id, character) in self.characters.iter_mut() {
            let caps = &mut character.capabilities;
            if let Some(energy) = caps.first_sensor_mut::<Energy>() {
                energy.update(dt);
            }

            let mut mined = None;
            if let Some(mining) = caps.actuator_mut::<Mining>() {
                if let Some(vein) = mining.vein.and_then(|v| self.veins.get_mut(v.0)) {
                    let hits = mining.hits(dt, vein.amount() > 0);
                    let amount = (0..hits).map(|_| vein.consume(mining.per_hit())).sum::<u32>();
                    if hits > 0 {
                        tracing::debug!(agent = *id, amount, kind = ?vein.kind(), "mined");
                        mined = Some((vein.kind(), amount));
                    }
                }
            }
            if let Some((kind, amount)) = mined {
                if let Some(inventory) = caps.first_sensor_mut::<Inventory>() {
                    inventory.add(kind, amount);
                }
            }

            if let Some(drunkenness) = caps.actuator_mut::<Drunkenness>() {
                // Sobering starts on the step after the maximum is reached.
                let sobering = drunkenness.is_drunk();
                if let Some(table) = drunkenness.table.and_then(|t| self.deposits.get_mut(t.0)) {
                    let sips = drunkenness.sips(dt, table.amount() > 0);
                    for _ in 0..sips {
                        if !drunkenness.is_drinking() || table.take(1) == 0 {
                            break;
                        }
                        drunkenness.drink_beer();
                        tracing::debug!(agent = *id, level = drunkenness.level(), "drank a beer");
                    }
                }
                if sobering {
                    drunkenness.sober_up(dt);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tavern_with_drinker(beers: u32) -> (Town, DepositId) {
        let mut town = Town::new();
        let spec = GridSpec::new(Vec2::ZERO, 4, 4, 1.0, 1.0).expect("grid");
        let zone = town.add_zone("tavern", spec);
        let table = town
            .add_beer_table(zone, Vec2::new(1.5, 1.5), beers)
            .expect("table");
        town.spawn(1, Capabilities::new().with_actuator(Drunkenness::new(10, 2)))
            .expect("spawn");
        assert!(town.occupy_beer_table(1, table));
        (town, table)
    }

    fn drunkenness(town: &Town) -> &Drunkenness {
        town.character(1)
            .and_then(Character::drunkenness)
            .expect("drunkenness")
    }

    #[test]
    fn extra_sips_leave_beer_on_the_table() {
        let (mut town, table) = tavern_with_drinker(20);

        town.update_components(6.0);

        // Five beers at two levels each fill the drinker up.
        assert_eq!(town.deposit(table).map(Deposit::amount), Some(15));
        assert_eq!(drunkenness(&town).level(), 10);
        assert!(drunkenness(&town).is_drunk());
        assert!(!drunkenness(&town).is_drinking());
    }

    #[test]
    fn sobering_starts_on_the_next_step() {
        let (mut town, table) = tavern_with_drinker(20);

        town.update_components(6.0);
        assert_eq!(drunkenness(&town).level(), 10);

        town.update_components(3.0);
        assert_eq!(drunkenness(&town).level(), 7);
        assert_eq!(town.deposit(table).map(Deposit::amount), Some(15));
        assert_eq!(town.deposit(table).and_then(Deposit::consumer), Some(1));
    }

    #[test]
    fn an_empty_table_serves_nothing() {
        let (mut town, table) = tavern_with_drinker(1);

        town.update_components(4.0);

        assert_eq!(town.deposit(table).map(Deposit::amount), Some(0));
        assert_eq!(drunkenness(&town).level(), 2);
        assert!(drunkenness(&town).is_drinking());
    }
}
