use core::fmt::Debug;

/// Stable identifier for an agent.
///
/// Agents are always processed in `Ord` order, and `stable_id` feeds seeding and logs, so
/// replays stay identical regardless of container iteration order.
pub trait AgentId: Copy + Ord + Eq + Debug + 'static {
    fn stable_id(self) -> u64;
}

impl AgentId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl AgentId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

impl AgentId for usize {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

/// Read-only world access.
///
/// The kernel does not prescribe which queries a world exposes. Conditions receive `&W`,
/// so anything a predicate needs must be reachable through shared access.
pub trait WorldView {
    type Agent: AgentId;
}

/// Write access used by actions.
pub trait WorldMut: WorldView {}
