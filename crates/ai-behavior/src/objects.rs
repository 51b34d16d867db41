//! Static world objects a zone lists: beds, regenerating veins and deposits.

use ai_nav::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResourceKind {
    Gold,
    Beer,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Gold, ResourceKind::Beer];
}

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub usize);
    };
}

object_id!(
    /// Index of a [`Zone`](crate::Zone) in its town.
    ZoneId
);
object_id!(BedId);
object_id!(VeinId);
object_id!(
    /// Index of a [`Deposit`]. Beer tables are deposits too.
    DepositId
);

/// Fixed-period countdown fed with tick durations.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval {
    period: f32,
    elapsed: f32,
}

impl Interval {
    /// Slack for accumulated float steps, so ten steps of 0.1 fill one second.
    const EPSILON: f32 = 1e-4;

    pub fn new(period: f32) -> Self {
        Self {
            period: period.max(Self::EPSILON * 10.0),
            elapsed: 0.0,
        }
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Add `dt` and return how many whole periods completed.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.elapsed += dt.max(0.0);
        let mut fired = 0;
        while self.elapsed + Self::EPSILON >= self.period {
            self.elapsed = (self.elapsed - self.period).max(0.0);
            fired += 1;
        }
        fired
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bed {
    pub position: Vec2,
    pub(crate) occupant: Option<u64>,
}

impl Bed {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            occupant: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn occupant(&self) -> Option<u64> {
        self.occupant
    }
}

/// A mineable resource that refills one unit per period once something was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct Vein {
    pub position: Vec2,
    kind: ResourceKind,
    amount: u32,
    max_amount: u32,
    regeneration_amount: u32,
    regeneration: Interval,
    regenerating: bool,
    pub(crate) owner: Option<u64>,
}

impl Vein {
    pub const DEFAULT_MAX: u32 = 10;

    pub fn new(kind: ResourceKind, position: Vec2, amount: u32) -> Self {
        Self::with_capacity(kind, position, amount, Self::DEFAULT_MAX)
    }

    pub fn with_capacity(kind: ResourceKind, position: Vec2, amount: u32, max_amount: u32) -> Self {
        let max_amount = max_amount.max(1);
        let amount = amount.min(max_amount);
        Self {
            position,
            kind,
            amount,
            max_amount,
            regeneration_amount: 1,
            regeneration: Interval::new(1.0),
            regenerating: amount < max_amount,
            owner: None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn max_amount(&self) -> u32 {
        self.max_amount
    }

    pub fn is_available(&self) -> bool {
        self.owner.is_none()
    }

    pub fn owner(&self) -> Option<u64> {
        self.owner
    }

    pub fn is_regenerating(&self) -> bool {
        self.regenerating
    }

    /// Take up to `amount`, returning what was actually taken.
    pub fn consume(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.amount);
        self.amount -= taken;
        if !self.regenerating && self.amount < self.max_amount {
            self.regenerating = true;
            self.regeneration.reset();
        }
        taken
    }

    pub fn update(&mut self, dt: f32) {
        if !self.regenerating {
            return;
        }
        let fired = self.regeneration.advance(dt);
        self.amount = self
            .amount
            .saturating_add(fired * self.regeneration_amount)
            .min(self.max_amount);
        if self.amount == self.max_amount {
            self.regenerating = false;
        }
    }
}

/// A store of one resource kind, either finite or unlimited, used by at most one consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Deposit {
    pub position: Vec2,
    kind: ResourceKind,
    amount: u32,
    unlimited: bool,
    pub(crate) consumer: Option<u64>,
}

impl Deposit {
    pub fn new(kind: ResourceKind, position: Vec2, amount: u32) -> Self {
        Self {
            position,
            kind,
            amount,
            unlimited: false,
            consumer: None,
        }
    }

    pub fn unlimited(kind: ResourceKind, position: Vec2) -> Self {
        Self {
            unlimited: true,
            ..Self::new(kind, position, 0)
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn is_unlimited(&self) -> bool {
        self.unlimited
    }

    /// Stored amount; `u32::MAX` when unlimited.
    pub fn amount(&self) -> u32 {
        if self.unlimited {
            u32::MAX
        } else {
            self.amount
        }
    }

    pub fn has_consumer(&self) -> bool {
        self.consumer.is_some()
    }

    pub fn consumer(&self) -> Option<u64> {
        self.consumer
    }

    pub fn take(&mut self, amount: u32) -> u32 {
        if self.unlimited {
            return amount;
        }
        let taken = amount.min(self.amount);
        self.amount -= taken;
        taken
    }

    pub fn deposit(&mut self, amount: u32) -> bool {
        if self.unlimited {
            return true;
        }
        if amount == 0 {
            tracing::warn!(kind = ?self.kind, "Trying to deposit 0 or less resources");
            return false;
        }
        self.amount = self.amount.saturating_add(amount);
        true
    }
}
