//! Concrete town actions.
//!
//! Every constructor checks the capabilities the action will use while ticking and fails with
//! [`BuildError::Capability`](crate::BuildError::Capability) when one is missing.

use ai_core::{Action, ActionStatus, Blackboard, Capabilities, TickContext};
use ai_nav::Vec2;
use ai_steering::MovementController;

use crate::candidate::{CandidateSource, NearestCandidate, Sourcing, Visit};
use crate::components::{Drunkenness, Energy, Inventory, Mining};
use crate::objects::{BedId, DepositId, ResourceKind, VeinId};
use crate::{BuildError, Result, Town};

pub type LookForResource = NearestCandidate<VeinSource>;
pub type LookForBed = NearestCandidate<BedSource>;
pub type LookForBeerTable = NearestCandidate<BeerTableSource>;
pub type DepositResource = NearestCandidate<DepositSource>;
pub type GetBeer = NearestCandidate<BeerPickup>;
pub type ServeBeer = NearestCandidate<TableService>;

fn require_mover(caps: &Capabilities) -> Result<()> {
    Ok(caps.require_actuator::<MovementController>()?)
}

/// Veins of one kind that nobody is mining. Claiming starts mining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VeinSource {
    pub kind: ResourceKind,
}

impl CandidateSource for VeinSource {
    type Candidate = VeinId;
    const SOURCING: Sourcing = Sourcing::Persistent;

    fn name(&self) -> &'static str {
        "LookForResource"
    }

    fn candidates(&self, town: &Town, agent: u64, out: &mut Vec<(VeinId, Vec2)>) {
        out.extend(
            town.available_veins(agent, self.kind)
                .into_iter()
                .filter_map(|id| Some((id, town.vein(id)?.position))),
        );
    }

    fn is_valid(&self, town: &Town, _agent: u64, vein: VeinId) -> bool {
        town.vein(vein).is_some_and(|v| v.is_available())
    }

    fn visit(&mut self, town: &mut Town, agent: u64, vein: VeinId) -> Visit {
        if town.start_mining(agent, vein) {
            Visit::Finish
        } else {
            Visit::Next
        }
    }
}

pub fn look_for_resource(town: &Town, agent: u64, kind: ResourceKind) -> Result<LookForResource> {
    let caps = town.capabilities(agent)?;
    require_mover(caps)?;
    caps.require_actuator::<Mining>()?;
    Ok(NearestCandidate::new(VeinSource { kind }))
}

/// Free beds. Claiming lies down in the bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BedSource;

impl CandidateSource for BedSource {
    type Candidate = BedId;
    const SOURCING: Sourcing = Sourcing::Persistent;

    fn name(&self) -> &'static str {
        "LookForBed"
    }

    fn candidates(&self, town: &Town, agent: u64, out: &mut Vec<(BedId, Vec2)>) {
        out.extend(
            town.available_beds(agent)
                .into_iter()
                .filter_map(|id| Some((id, town.bed(id)?.position))),
        );
    }

    fn is_valid(&self, town: &Town, _agent: u64, bed: BedId) -> bool {
        town.bed(bed).is_some_and(|b| b.is_available())
    }

    fn visit(&mut self, town: &mut Town, agent: u64, bed: BedId) -> Visit {
        if town.occupy_bed(agent, bed) {
            Visit::Finish
        } else {
            Visit::Next
        }
    }
}

pub fn look_for_bed(town: &Town, agent: u64) -> Result<LookForBed> {
    let caps = town.capabilities(agent)?;
    require_mover(caps)?;
    caps.require_sensor::<Energy>()?;
    Ok(NearestCandidate::new(BedSource))
}

/// Beer tables without a drinker. Claiming sits down and starts drinking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeerTableSource;

impl CandidateSource for BeerTableSource {
    type Candidate = DepositId;
    const SOURCING: Sourcing = Sourcing::Persistent;

    fn name(&self) -> &'static str {
        "LookForBeerTable"
    }

    fn candidates(&self, town: &Town, agent: u64, out: &mut Vec<(DepositId, Vec2)>) {
        out.extend(
            town.available_beer_tables(agent)
                .into_iter()
                .filter_map(|id| Some((id, town.deposit(id)?.position))),
        );
    }

    fn is_valid(&self, town: &Town, _agent: u64, table: DepositId) -> bool {
        town.deposit(table).is_some_and(|t| !t.has_consumer())
    }

    fn visit(&mut self, town: &mut Town, agent: u64, table: DepositId) -> Visit {
        if town.occupy_beer_table(agent, table) {
            Visit::Finish
        } else {
            Visit::Next
        }
    }
}

pub fn look_for_beer_table(town: &Town, agent: u64) -> Result<LookForBeerTable> {
    let caps = town.capabilities(agent)?;
    require_mover(caps)?;
    caps.require_actuator::<Drunkenness>()?;
    Ok(NearestCandidate::new(BeerTableSource))
}

/// Every deposit of a kind, listed once at start. The whole carried amount goes into the
/// first one reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositSource {
    pub kind: ResourceKind,
}

impl CandidateSource for DepositSource {
    type Candidate = DepositId;
    const SOURCING: Sourcing = Sourcing::SinglePass;

    fn name(&self) -> &'static str {
        "DepositResource"
    }

    fn candidates(&self, town: &Town, agent: u64, out: &mut Vec<(DepositId, Vec2)>) {
        out.extend(
            town.deposits_of(agent, self.kind)
                .into_iter()
                .filter_map(|id| Some((id, town.deposit(id)?.position))),
        );
    }

    fn visit(&mut self, town: &mut Town, agent: u64, deposit: DepositId) -> Visit {
        let carried = town
            .inventory_mut(agent)
            .map(|inv| {
                let all = inv.amount(self.kind);
                inv.consume(self.kind, all)
            })
            .unwrap_or(0);
        if let Some(store) = town.deposit_mut(deposit) {
            if store.deposit(carried) {
                tracing::info!(agent, ?deposit, kind = ?self.kind, amount = carried, "deposited");
            }
        }
        Visit::Finish
    }
}

pub fn deposit_resource(town: &Town, agent: u64, kind: ResourceKind) -> Result<DepositResource> {
    let caps = town.capabilities(agent)?;
    require_mover(caps)?;
    caps.require_sensor::<Inventory>()?;
    Ok(NearestCandidate::new(DepositSource { kind }))
}

/// Free beer deposits, listed once at start. Takes what is still missing from each one
/// until `target` beers are carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeerPickup {
    target: u32,
    total: u32,
}

impl BeerPickup {
    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn total(&self) -> u32 {
        self.total
    }
}

impl CandidateSource for BeerPickup {
    type Candidate = DepositId;
    const SOURCING: Sourcing = Sourcing::SinglePass;

    fn name(&self) -> &'static str {
        "GetBeer"
    }

    fn candidates(&self, town: &Town, agent: u64, out: &mut Vec<(DepositId, Vec2)>) {
        out.extend(
            town.available_deposits(agent, ResourceKind::Beer)
                .into_iter()
                .filter_map(|id| Some((id, town.deposit(id)?.position))),
        );
    }

    fn is_valid(&self, town: &Town, _agent: u64, deposit: DepositId) -> bool {
        town.deposit(deposit).is_some_and(|d| !d.has_consumer())
    }

    fn visit(&mut self, town: &mut Town, agent: u64, deposit: DepositId) -> Visit {
        let wanted = self.target.saturating_sub(self.total);
        let taken = town.deposit_mut(deposit).map_or(0, |d| d.take(wanted));
        self.total += taken;
        if let Some(inv) = town.inventory_mut(agent) {
            inv.add(ResourceKind::Beer, taken);
        }
        tracing::info!(agent, ?deposit, taken, total = self.total, "picked up beer");
        if self.total >= self.target {
            Visit::Finish
        } else {
            Visit::Next
        }
    }

    fn is_done(&self, _town: &Town, _agent: u64) -> bool {
        self.total >= self.target
    }

    fn reset(&mut self) {
        self.total = 0;
    }
}

pub fn get_beer(town: &Town, agent: u64, target: u32) -> Result<GetBeer> {
    if target == 0 {
        return Err(BuildError::InvalidAmount(target));
    }
    let caps = town.capabilities(agent)?;
    require_mover(caps)?;
    caps.require_sensor::<Inventory>()?;
    Ok(NearestCandidate::new(BeerPickup { target, total: 0 }))
}

/// Empty beer tables. Each visit leaves one beer; ends once the carried beer runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableService;

fn carried_beer(town: &Town, agent: u64) -> u32 {
    town.character(agent)
        .and_then(|c| c.inventory())
        .map_or(0, |inv| inv.amount(ResourceKind::Beer))
}

impl CandidateSource for TableService {
    type Candidate = DepositId;
    const SOURCING: Sourcing = Sourcing::Persistent;

    fn name(&self) -> &'static str {
        "ServeBeer"
    }

    fn candidates(&self, town: &Town, agent: u64, out: &mut Vec<(DepositId, Vec2)>) {
        out.extend(
            town.empty_beer_tables(agent)
                .into_iter()
                .filter_map(|id| Some((id, town.deposit(id)?.position))),
        );
    }

    fn is_valid(&self, town: &Town, _agent: u64, table: DepositId) -> bool {
        town.deposit(table).is_some_and(|t| t.amount() == 0)
    }

    fn visit(&mut self, town: &mut Town, agent: u64, table: DepositId) -> Visit {
        let served = town
            .inventory_mut(agent)
            .map_or(0, |inv| inv.consume(ResourceKind::Beer, 1));
        if let Some(store) = town.deposit_mut(table) {
            if store.deposit(served) {
                tracing::info!(agent, ?table, "served a beer");
            }
        }
        Visit::Next
    }

    fn is_done(&self, town: &Town, agent: u64) -> bool {
        carried_beer(town, agent) == 0
    }
}

pub fn serve_beer(town: &Town, agent: u64) -> Result<ServeBeer> {
    let caps = town.capabilities(agent)?;
    require_mover(caps)?;
    caps.require_sensor::<Inventory>()?;
    Ok(NearestCandidate::new(TableService))
}

/// Burns one unit of energy per second, forever.
#[derive(Debug, Clone, PartialEq)]
pub struct Idle {
    waited: bool,
}

impl Idle {
    pub fn new(town: &Town, agent: u64) -> Result<Self> {
        town.capabilities(agent)?.require_sensor::<Energy>()?;
        Ok(Self { waited: false })
    }
}

impl Action<Town> for Idle {
    fn start(&mut self, _ctx: &TickContext, _agent: u64, _town: &mut Town, _bb: &mut Blackboard) {
        self.waited = false;
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        agent: u64,
        town: &mut Town,
        _bb: &mut Blackboard,
    ) -> ActionStatus<Town> {
        if self.waited {
            if let Some(energy) = town.energy_mut(agent) {
                energy.consume(1.0);
            }
        }
        self.waited = true;
        ActionStatus::seconds(1.0)
    }

    fn name(&self) -> &'static str {
        "Idle"
    }
}

/// Logs a line and finishes. The state's components do the actual work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announce {
    name: &'static str,
    message: &'static str,
}

impl Announce {
    pub fn mining(town: &Town, agent: u64) -> Result<Self> {
        town.capabilities(agent)?.require_actuator::<Mining>()?;
        Ok(Self {
            name: "Mining",
            message: "*mining*",
        })
    }

    pub fn sleep(town: &Town, agent: u64) -> Result<Self> {
        town.capabilities(agent)?.require_sensor::<Energy>()?;
        Ok(Self {
            name: "Sleep",
            message: "*snoring*",
        })
    }

    pub fn drinking(town: &Town, agent: u64) -> Result<Self> {
        town.capabilities(agent)?.require_actuator::<Drunkenness>()?;
        Ok(Self {
            name: "Drinking",
            message: "*drinking*",
        })
    }
}

impl Action<Town> for Announce {
    fn tick(
        &mut self,
        _ctx: &TickContext,
        agent: u64,
        _town: &mut Town,
        _bb: &mut Blackboard,
    ) -> ActionStatus<Town> {
        tracing::debug!(agent, action = self.name, "{}", self.message);
        ActionStatus::Success
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Applies one change to the town and finishes.
#[derive(Clone, Copy)]
pub struct Effect {
    name: &'static str,
    apply: fn(&mut Town, u64),
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect").field("name", &self.name).finish()
    }
}

impl Effect {
    pub fn stop_mining(town: &Town, agent: u64) -> Result<Self> {
        town.capabilities(agent)?.require_actuator::<Mining>()?;
        Ok(Self {
            name: "StopMining",
            apply: |town, agent| {
                town.stop_mining(agent);
            },
        })
    }

    pub fn wake_up(town: &Town, agent: u64) -> Result<Self> {
        town.capabilities(agent)?.require_sensor::<Energy>()?;
        Ok(Self {
            name: "WakeUp",
            apply: |town, agent| {
                town.vacate_bed(agent);
            },
        })
    }

    pub fn stop_drinking(town: &Town, agent: u64) -> Result<Self> {
        town.capabilities(agent)?.require_actuator::<Drunkenness>()?;
        Ok(Self {
            name: "StopDrinking",
            apply: |town, agent| {
                town.vacate_beer_table(agent);
            },
        })
    }

    /// Stagger around on a dynamic wander.
    pub fn drunk(town: &Town, agent: u64) -> Result<Self> {
        require_mover(town.capabilities(agent)?)?;
        Ok(Self {
            name: "Drunk",
            apply: |town, agent| {
                if let Some(mover) = town.mover_mut(agent) {
                    mover.enable_dynamic_wander();
                }
            },
        })
    }

    pub fn sober_up(town: &Town, agent: u64) -> Result<Self> {
        require_mover(town.capabilities(agent)?)?;
        Ok(Self {
            name: "SoberUp",
            apply: |town, agent| {
                if let Some(mover) = town.mover_mut(agent) {
                    mover.clear_base_movement();
                }
            },
        })
    }
}

impl Action<Town> for Effect {
    fn tick(
        &mut self,
        _ctx: &TickContext,
        agent: u64,
        town: &mut Town,
        _bb: &mut Blackboard,
    ) -> ActionStatus<Town> {
        tracing::debug!(agent, action = self.name, "applying");
        (self.apply)(town, agent);
        ActionStatus::Success
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
