//! The host loop that steps a [`Town`] and its agents.

use std::fmt;

use ai_core::{Capabilities, TickContext};
use ai_fsm::{tick_agents, Agent, FsmTraceLog, StateMachine, FSM_TRACE};
use ai_nav::Vec2;
use ai_steering::MovementVars;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::archetype::Archetype;
use crate::objects::ResourceKind;
use crate::{Result, Town};

/// A town plus one state machine per character, advanced in fixed steps.
pub struct Simulation {
    town: Town,
    agents: Vec<Agent<Town>>,
    seed: u64,
    steps: u64,
    trace: bool,
}

impl Simulation {
    pub fn new(town: Town, seed: u64) -> Self {
        Self {
            town,
            agents: Vec::new(),
            seed,
            steps: 0,
            trace: false,
        }
    }

    /// Record machine events for agents spawned from now on.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn spawn(
        &mut self,
        id: u64,
        archetype: Archetype,
        position: Vec2,
        vars: MovementVars,
    ) -> Result<()> {
        let capabilities = archetype.capabilities(id, position, vars, self.seed)?;
        self.spawn_with(id, capabilities, |town, agent| archetype.build_fsm(town, agent))?;
        tracing::info!(agent = id, archetype = archetype.name(), "spawned");
        Ok(())
    }

    /// Spawn a character with hand-built capabilities and machine.
    pub fn spawn_with<F>(&mut self, id: u64, capabilities: Capabilities, build: F) -> Result<()>
    where
        F: FnOnce(&Town, u64) -> Result<StateMachine<Town>>,
    {
        self.town.spawn(id, capabilities)?;
        let fsm = match build(&self.town, id) {
            Ok(fsm) => fsm,
            Err(err) => {
                self.town.despawn(id);
                return Err(err);
            }
        };
        let mut agent = Agent::new(id, fsm);
        if self.trace {
            agent.blackboard.set(FSM_TRACE, FsmTraceLog::default());
        }
        self.agents.push(agent);
        Ok(())
    }

    /// Advance everything by `dt` seconds.
    ///
    /// Bodies are snapshotted before any controller moves, so neighbour queries see last
    /// step's settled positions. Machines tick last, against the updated world.
    pub fn step(&mut self, dt: f32) {
        let ctx = TickContext::new(self.steps, dt, self.seed);
        self.town.snapshot_bodies();
        self.town.update_movement(dt);
        self.town.update_zones();
        self.town.update_components(dt);
        tick_agents(&mut self.agents, &ctx, &mut self.town);
        self.steps += 1;
    }

    pub fn run(&mut self, steps: u64, dt: f32) {
        for _ in 0..steps {
            self.step(dt);
        }
    }

    pub fn town(&self) -> &Town {
        &self.town
    }

    pub fn town_mut(&mut self) -> &mut Town {
        &mut self.town
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn agent(&self, id: u64) -> Option<&Agent<Town>> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn agents(&self) -> &[Agent<Town>] {
        &self.agents
    }

    pub fn state_name(&self, id: u64) -> Option<&str> {
        self.agent(id).map(|a| a.fsm.current_state_name())
    }

    pub fn trace(&self, id: u64) -> Option<&FsmTraceLog> {
        self.agent(id)?.blackboard.get(FSM_TRACE)
    }

    pub fn summary(&self) -> Summary {
        let mut agents: Vec<AgentSummary> = self
            .agents
            .iter()
            .map(|agent| {
                let character = self.town.character(agent.id);
                let inventory = character.and_then(|c| c.inventory());
                AgentSummary {
                    id: agent.id,
                    state: agent.fsm.current_state_name().to_owned(),
                    position: character.and_then(|c| c.position()).unwrap_or(Vec2::ZERO),
                    zone: character
                        .and_then(|c| c.zone())
                        .and_then(|z| self.town.zone(z))
                        .map(|z| z.name.clone()),
                    energy: character.and_then(|c| c.energy()).map_or(0.0, |e| e.level()),
                    gold: inventory.map_or(0, |i| i.amount(ResourceKind::Gold)),
                    beer: inventory.map_or(0, |i| i.amount(ResourceKind::Beer)),
                }
            })
            .collect();
        agents.sort_by_key(|a| a.id);
        Summary {
            steps: self.steps,
            elapsed: self.town.elapsed(),
            agents,
        }
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("agents", &self.agents.len())
            .field("seed", &self.seed)
            .field("steps", &self.steps)
            .finish()
    }
}

/// Where every character is and what it is doing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Summary {
    pub steps: u64,
    pub elapsed: f64,
    pub agents: Vec<AgentSummary>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentSummary {
    pub id: u64,
    pub state: String,
    pub position: Vec2,
    pub zone: Option<String>,
    pub energy: f32,
    pub gold: u32,
    pub beer: u32,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "after {} steps ({:.1}s):", self.steps, self.elapsed)?;
        for a in &self.agents {
            writeln!(
                f,
                "  #{:<3} {:<18} ({:>6.2}, {:>6.2}) zone={:<8} energy={:>4.1} gold={:<3} beer={}",
                a.id,
                a.state,
                a.position.x,
                a.position.y,
                a.zone.as_deref().unwrap_or("-"),
                a.energy,
                a.gold,
                a.beer,
            )?;
        }
        Ok(())
    }
}
