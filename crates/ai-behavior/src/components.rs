//! Per-character components registered as capabilities.
//!
//! [`Energy`] and [`Inventory`] are sensors; [`Mining`] and [`Drunkenness`] are actuators next
//! to the character's [`MovementController`](ai_steering::MovementController). Each component
//! advances on its own [`Interval`]s from [`Simulation::step`](crate::Simulation::step).

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::objects::{DepositId, Interval, ResourceKind, VeinId};
use crate::BedId;

/// Drains while awake and refills while in bed, one unit per period.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Energy {
    level: f32,
    max: f32,
    step: f32,
    interval: Interval,
    pub(crate) bed: Option<BedId>,
}

impl Default for Energy {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl Energy {
    pub fn new(max: f32) -> Self {
        let max = max.max(1.0);
        Self {
            level: max,
            max,
            step: 1.0,
            interval: Interval::new(1.0),
            bed: None,
        }
    }

    pub fn with_level(mut self, level: f32) -> Self {
        self.level = level.clamp(0.0, self.max);
        self
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn bed(&self) -> Option<BedId> {
        self.bed
    }

    pub fn is_rested(&self) -> bool {
        self.level >= self.max
    }

    /// Out of energy and not already lying in a bed.
    pub fn is_tired(&self) -> bool {
        self.level <= 0.0 && self.bed.is_none()
    }

    pub fn consume(&mut self, amount: f32) -> f32 {
        let consumed = amount.clamp(0.0, self.level);
        self.level -= consumed;
        consumed
    }

    pub(crate) fn set_bed(&mut self, bed: Option<BedId>) {
        self.bed = bed;
        self.interval.reset();
    }

    pub fn update(&mut self, dt: f32) {
        let sleeping = self.bed.is_some();
        let changing = if sleeping {
            self.level < self.max
        } else {
            self.level > 0.0
        };
        if !changing {
            self.interval.reset();
            return;
        }

        let fired = self.interval.advance(dt) as f32;
        if sleeping {
            self.level = (self.level + fired * self.step).min(self.max);
        } else {
            self.level = (self.level - fired * self.step).max(0.0);
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Inventory {
    amounts: BTreeMap<ResourceKind, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ResourceKind, amount: u32) -> Self {
        self.add(kind, amount);
        self
    }

    pub fn amount(&self, kind: ResourceKind) -> u32 {
        self.amounts.get(&kind).copied().unwrap_or(0)
    }

    pub fn add(&mut self, kind: ResourceKind, amount: u32) {
        let slot = self.amounts.entry(kind).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Remove up to `amount`, returning what was actually removed.
    pub fn consume(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let slot = self.amounts.entry(kind).or_insert(0);
        let consumed = amount.min(*slot);
        *slot -= consumed;
        consumed
    }
}

/// Works an owned vein: one hit per period while the vein has stock.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mining {
    pub(crate) vein: Option<VeinId>,
    per_hit: u32,
    hit: Interval,
}

impl Default for Mining {
    fn default() -> Self {
        Self::new(2, 1.0)
    }
}

impl Mining {
    pub fn new(per_hit: u32, hit_seconds: f32) -> Self {
        Self {
            vein: None,
            per_hit: per_hit.max(1),
            hit: Interval::new(hit_seconds),
        }
    }

    pub fn vein(&self) -> Option<VeinId> {
        self.vein
    }

    pub fn is_mining(&self) -> bool {
        self.vein.is_some()
    }

    pub fn per_hit(&self) -> u32 {
        self.per_hit
    }

    pub(crate) fn set_vein(&mut self, vein: Option<VeinId>) {
        self.vein = vein;
        self.hit.reset();
    }

    /// Number of hits due this tick. The swing only starts once the vein has stock.
    pub(crate) fn hits(&mut self, dt: f32, vein_has_stock: bool) -> u32 {
        if self.vein.is_none() || !vein_has_stock {
            self.hit.reset();
            return 0;
        }
        self.hit.advance(dt)
    }
}

/// Drinks from an occupied beer table until maxed out, then sobers up one level per period.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Drunkenness {
    level: u32,
    max: u32,
    per_beer: u32,
    sober_per_period: u32,
    pub(crate) table: Option<DepositId>,
    drinking: bool,
    sobering: bool,
    drink: Interval,
    sober: Interval,
}

impl Default for Drunkenness {
    fn default() -> Self {
        Self::new(10, 2)
    }
}

impl Drunkenness {
    pub fn new(max: u32, per_beer: u32) -> Self {
        Self {
            level: 0,
            max: max.max(1),
            per_beer,
            sober_per_period: 1,
            table: None,
            drinking: false,
            sobering: false,
            drink: Interval::new(1.0),
            sober: Interval::new(1.0),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn table(&self) -> Option<DepositId> {
        self.table
    }

    pub fn is_drinking(&self) -> bool {
        self.drinking
    }

    /// Hit the maximum and still sobering up.
    pub fn is_drunk(&self) -> bool {
        self.sobering
    }

    pub(crate) fn sit_at(&mut self, table: DepositId) {
        self.table = Some(table);
        self.drinking = self.level < self.max;
        self.drink.reset();
    }

    pub(crate) fn leave_table(&mut self) -> Option<DepositId> {
        self.drinking = false;
        self.table.take()
    }

    /// Sips due this tick while the table has beer.
    pub(crate) fn sips(&mut self, dt: f32, table_has_beer: bool) -> u32 {
        if !self.drinking || !table_has_beer {
            self.drink.reset();
            return 0;
        }
        self.drink.advance(dt)
    }

    /// Drink one beer. Reaching the maximum stops drinking and starts sobering.
    pub(crate) fn drink_beer(&mut self) {
        self.level = (self.level + self.per_beer).min(self.max);
        if self.level >= self.max {
            self.drinking = false;
            if !self.sobering {
                self.sobering = true;
                self.sober.reset();
            }
        }
    }

    pub(crate) fn sober_up(&mut self, dt: f32) {
        if !self.sobering {
            return;
        }
        let fired = self.sober.advance(dt);
        self.level = self
            .level
            .saturating_sub(fired.saturating_mul(self.sober_per_period));
        if self.level == 0 {
            self.sobering = false;
        }
    }
}
