//! Side-effect free predicates guarding transitions.

use std::rc::Rc;

use ai_core::WorldView;

pub trait Condition<W: WorldView>: 'static {
    fn test(&self, world: &W, agent: W::Agent) -> bool;
}

/// Conditions are shared between transitions, so they are reference counted.
pub type ConditionRef<W> = Rc<dyn Condition<W>>;

pub struct FnCondition<F>(pub F);

impl<W, F> Condition<W> for FnCondition<F>
where
    W: WorldView,
    F: Fn(&W, W::Agent) -> bool + 'static,
{
    fn test(&self, world: &W, agent: W::Agent) -> bool {
        (self.0)(world, agent)
    }
}

pub fn condition<W, F>(f: F) -> ConditionRef<W>
where
    W: WorldView + 'static,
    F: Fn(&W, W::Agent) -> bool + 'static,
{
    Rc::new(FnCondition(f))
}

/// True when every part is true. Stops at the first false part.
pub struct And<W: WorldView> {
    parts: Vec<ConditionRef<W>>,
}

impl<W: WorldView> And<W> {
    pub fn new(parts: Vec<ConditionRef<W>>) -> Self {
        Self { parts }
    }
}

impl<W: WorldView + 'static> Condition<W> for And<W> {
    fn test(&self, world: &W, agent: W::Agent) -> bool {
        self.parts.iter().all(|c| c.test(world, agent))
    }
}

/// True when any part is true. Stops at the first true part.
pub struct Or<W: WorldView> {
    parts: Vec<ConditionRef<W>>,
}

impl<W: WorldView> Or<W> {
    pub fn new(parts: Vec<ConditionRef<W>>) -> Self {
        Self { parts }
    }
}

impl<W: WorldView + 'static> Condition<W> for Or<W> {
    fn test(&self, world: &W, agent: W::Agent) -> bool {
        self.parts.iter().any(|c| c.test(world, agent))
    }
}

pub struct Not<W: WorldView>(ConditionRef<W>);

impl<W: WorldView> Not<W> {
    pub fn new(inner: ConditionRef<W>) -> Self {
        Self(inner)
    }
}

impl<W: WorldView + 'static> Condition<W> for Not<W> {
    fn test(&self, world: &W, agent: W::Agent) -> bool {
        !self.0.test(world, agent)
    }
}

pub fn and<W: WorldView + 'static>(a: ConditionRef<W>, b: ConditionRef<W>) -> ConditionRef<W> {
    Rc::new(And::new(vec![a, b]))
}

pub fn or<W: WorldView + 'static>(a: ConditionRef<W>, b: ConditionRef<W>) -> ConditionRef<W> {
    Rc::new(Or::new(vec![a, b]))
}

pub fn not<W: WorldView + 'static>(inner: ConditionRef<W>) -> ConditionRef<W> {
    Rc::new(Not::new(inner))
}
