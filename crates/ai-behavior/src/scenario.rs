//! Declarative town descriptions, loadable from YAML or JSON with the `serde` feature.

use ai_nav::{Aabb, GridSpec, Vec2};
use ai_steering::MovementVars;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::archetype::Archetype;
use crate::objects::{Deposit, ResourceKind, Vein};
use crate::{BuildError, Result, Simulation, Town};

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Scenario {
    pub seed: u64,
    /// Walls shared by every zone.
    pub obstacles: Vec<Aabb>,
    pub zones: Vec<ZoneSpec>,
    pub agents: Vec<AgentSpec>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ZoneSpec {
    pub name: String,
    pub grid: GridSpec,
    #[cfg_attr(feature = "serde", serde(default))]
    pub beds: Vec<Vec2>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub veins: Vec<VeinSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub deposits: Vec<DepositSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub beer_tables: Vec<BeerTableSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VeinSpec {
    pub kind: ResourceKind,
    pub position: Vec2,
    #[cfg_attr(feature = "serde", serde(default = "full_vein"))]
    pub amount: u32,
}

#[cfg(feature = "serde")]
fn full_vein() -> u32 {
    Vein::DEFAULT_MAX
}

/// A deposit holding `amount` units, or an unlimited one when `amount` is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepositSpec {
    pub kind: ResourceKind,
    pub position: Vec2,
    #[cfg_attr(feature = "serde", serde(default))]
    pub amount: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BeerTableSpec {
    pub position: Vec2,
    #[cfg_attr(feature = "serde", serde(default))]
    pub beers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentSpec {
    pub id: u64,
    pub archetype: Archetype,
    pub position: Vec2,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vars: Option<MovementVars>,
}

impl Scenario {
    /// Lay out the town, then spawn every agent in listed order.
    pub fn build(&self) -> Result<Simulation> {
        self.build_traced(false)
    }

    /// [`build`](Self::build), recording every agent's machine events when `trace` is set.
    pub fn build_traced(&self, trace: bool) -> Result<Simulation> {
        let mut town = Town::new();
        for obstacle in &self.obstacles {
            town.add_obstacle(*obstacle);
        }
        for spec in &self.zones {
            spec.grid.validate().map_err(|source| BuildError::Grid {
                zone: spec.name.clone(),
                source,
            })?;
            let zone = town.add_zone(spec.name.clone(), spec.grid);
            for bed in &spec.beds {
                town.add_bed(zone, *bed)?;
            }
            for vein in &spec.veins {
                town.add_vein(zone, Vein::new(vein.kind, vein.position, vein.amount))?;
            }
            for deposit in &spec.deposits {
                let deposit = match deposit.amount {
                    Some(amount) => Deposit::new(deposit.kind, deposit.position, amount),
                    None => Deposit::unlimited(deposit.kind, deposit.position),
                };
                town.add_deposit(zone, deposit)?;
            }
            for table in &spec.beer_tables {
                town.add_beer_table(zone, table.position, table.beers)?;
            }
        }

        let mut sim = Simulation::new(town, self.seed).with_trace(trace);
        for agent in &self.agents {
            sim.spawn(
                agent.id,
                agent.archetype,
                agent.position,
                agent.vars.unwrap_or_default(),
            )?;
        }
        tracing::info!(
            zones = self.zones.len(),
            agents = self.agents.len(),
            seed = self.seed,
            "scenario built"
        );
        Ok(sim)
    }

    /// A mine and a tavern with one miner, one drunkard and one waiter.
    pub fn sample() -> Self {
        let room = |origin| GridSpec {
            origin,
            columns: 20,
            rows: 10,
            column_width: 1.0,
            row_height: 1.0,
        };
        let mine = room(Vec2::ZERO);
        let tavern = room(Vec2::new(0.0, 12.0));
        Self {
            seed: 7,
            obstacles: vec![Aabb::new(Vec2::new(9.0, 0.0), Vec2::new(10.0, 6.0))],
            zones: vec![
                ZoneSpec {
                    name: "mine".to_owned(),
                    grid: mine,
                    beds: vec![Vec2::new(2.5, 8.5)],
                    veins: vec![
                        VeinSpec {
                            kind: ResourceKind::Gold,
                            position: Vec2::new(16.5, 2.5),
                            amount: Vein::DEFAULT_MAX,
                        },
                        VeinSpec {
                            kind: ResourceKind::Gold,
                            position: Vec2::new(17.5, 7.5),
                            amount: Vein::DEFAULT_MAX,
                        },
                    ],
                    deposits: vec![DepositSpec {
                        kind: ResourceKind::Gold,
                        position: Vec2::new(2.5, 2.5),
                        amount: Some(0),
                    }],
                    beer_tables: Vec::new(),
                },
                ZoneSpec {
                    name: "tavern".to_owned(),
                    grid: tavern,
                    beds: vec![Vec2::new(1.5, 20.5), Vec2::new(3.5, 20.5)],
                    veins: Vec::new(),
                    deposits: vec![DepositSpec {
                        kind: ResourceKind::Beer,
                        position: Vec2::new(18.5, 13.5),
                        amount: None,
                    }],
                    beer_tables: vec![
                        BeerTableSpec {
                            position: Vec2::new(8.5, 16.5),
                            beers: 3,
                        },
                        BeerTableSpec {
                            position: Vec2::new(12.5, 16.5),
                            beers: 0,
                        },
                    ],
                },
            ],
            agents: vec![
                AgentSpec {
                    id: 1,
                    archetype: Archetype::Miner,
                    position: Vec2::new(4.5, 4.5),
                    vars: None,
                },
                AgentSpec {
                    id: 2,
                    archetype: Archetype::Drunkard,
                    position: Vec2::new(5.5, 14.5),
                    vars: None,
                },
                AgentSpec {
                    id: 3,
                    archetype: Archetype::Waiter,
                    position: Vec2::new(15.5, 18.5),
                    vars: None,
                },
            ],
        }
    }
}
