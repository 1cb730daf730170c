/// A cheap handle to refer to abstract tree nodes unambiguously
///
/// Side tables produced by name resolution and type checking are keyed by it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Advance internal counter to next node
    pub fn advance(&mut self) {
        self.0 += 1;
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct NodeIdCounter(NodeId);

impl NodeIdCounter {
    pub fn fresh(&mut self) -> NodeId {
        let id = self.0;
        self.0.advance();
        id
    }
}
