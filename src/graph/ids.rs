//! Run-scoped identifier allocation.

use std::fmt;

/// Identifier of a keyword node, unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

/// Identifier of an emitted event, unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Monotonic allocator for node and event ids.
///
/// Pass the same allocator through graph construction, detection, and
/// assignment so that ghost nodes created during splitting never collide
/// with nodes created by the builder.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_node: u64,
    next_event: u64,
}

impl IdAllocator {
    /// Start both counters at 1.
    pub fn new() -> Self {
        Self {
            next_node: 1,
            next_event: 1,
        }
    }

    /// Allocate the next node id.
    pub fn next_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    /// Allocate the next event id.
    pub fn next_event_id(&mut self) -> EventId {
        let id = EventId(self.next_event);
        self.next_event += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_and_independent() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_node_id(), NodeId(1));
        assert_eq!(ids.next_node_id(), NodeId(2));
        assert_eq!(ids.next_event_id(), EventId(1));
        assert_eq!(ids.next_node_id(), NodeId(3));
        assert_eq!(NodeId(3).to_string(), "n3");
    }
}
