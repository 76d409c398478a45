//! Search nodes and the arena that owns them
//!
//! Every node holds one simulated frame and up to two children: the frame
//! after falling and the frame after flapping. Children are arena keys owned
//! by their parent; the parent key is a plain back-reference used to climb.
//! Removing a subtree from the arena frees its states immediately.

use slotmap::{SlotMap, new_key_type};

use super::score::Scorer;
use crate::config::Config;
use crate::sim::{GameState, advance};

new_key_type! {
    /// Stable handle to a node in the search arena
    pub struct NodeId;
}

/// Which action produced a child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// Let gravity act
    Fall = 0,
    /// Flap
    Flap = 1,
}

impl Branch {
    pub const ALL: [Branch; 2] = [Branch::Fall, Branch::Flap];

    #[inline]
    pub fn ascends(self) -> bool {
        self == Branch::Flap
    }
}

/// One simulated frame in the search tree
#[derive(Debug, Clone)]
pub struct SearchNode {
    state: GameState,
    parent: Option<NodeId>,
    children: [Option<NodeId>; 2],
    populated: bool,
}

impl SearchNode {
    fn new(parent: Option<NodeId>, state: GameState) -> Self {
        Self {
            state,
            parent,
            children: [None, None],
            populated: false,
        }
    }

    #[inline]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn child(&self, branch: Branch) -> Option<NodeId> {
        self.children[branch as usize]
    }

    /// Surviving children in branch order
    pub fn children(&self) -> impl Iterator<Item = (Branch, NodeId)> + '_ {
        Branch::ALL
            .into_iter()
            .filter_map(|b| self.child(b).map(|id| (b, id)))
    }

    /// Whether both children have been simulated
    #[inline]
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Populated, yet no surviving child remains
    ///
    /// An unpopulated node is never terminal: its children are simply not
    /// known yet.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.populated && self.children.iter().all(Option::is_none)
    }
}

/// Counters describing search effort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes whose children were simulated
    pub expansions: u64,
    /// Exhausted nodes backed out of
    pub climbs: u64,
    /// Nodes released from the arena
    pub disposed: u64,
}

/// Owner of every live search node
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: SlotMap<NodeId, SearchNode>,
    stats: SearchStats,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parentless node
    pub fn insert_root(&mut self, state: GameState) -> NodeId {
        self.nodes.insert(SearchNode::new(None, state))
    }

    pub fn get(&self, id: NodeId) -> Option<&SearchNode> {
        self.nodes.get(id)
    }

    /// Look up a node that must be live
    ///
    /// Panics on a released node: the tree never keeps stale handles.
    pub fn node(&self, id: NodeId) -> &SearchNode {
        match self.nodes.get(id) {
            Some(node) => node,
            None => panic!("search node {id:?} was already released"),
        }
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SearchNode)> {
        self.nodes.iter()
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub(crate) fn record_climb(&mut self) {
        self.stats.climbs += 1;
    }

    #[inline]
    pub fn is_terminal(&self, id: NodeId) -> bool {
        self.node(id).is_terminal()
    }

    /// Simulate both actions from `id` and keep the branches that survive
    ///
    /// Panics if the node was already expanded.
    pub fn expand(&mut self, id: NodeId, config: &Config) {
        let node = self.node(id);
        assert!(!node.populated, "search node {id:?} expanded twice");

        let outcomes = Branch::ALL.map(|b| advance(&node.state, b.ascends(), config));

        let mut children = [None, None];
        for (slot, next) in children.iter_mut().zip(outcomes) {
            // A dead bird is never a child
            if !next.bird.dead {
                *slot = Some(self.nodes.insert(SearchNode::new(Some(id), next)));
            }
        }

        let node = &mut self.nodes[id];
        node.children = children;
        node.populated = true;
        self.stats.expansions += 1;
    }

    /// The better surviving child of `id`, expanding it first if needed
    ///
    /// Flapping is chosen only when it scores strictly higher, so ties fall.
    /// Returns `None` when neither action survives.
    pub fn best_child<S>(&mut self, id: NodeId, config: &Config, scorer: &S) -> Option<NodeId>
    where
        S: Scorer + ?Sized,
    {
        if !self.node(id).populated {
            self.expand(id, config);
        }

        let node = self.node(id);
        match (node.child(Branch::Fall), node.child(Branch::Flap)) {
            (Some(fall), Some(flap)) => {
                let fall_score = scorer.score(&self.node(fall).state, config);
                let flap_score = scorer.score(&self.node(flap).state, config);
                Some(if flap_score > fall_score { flap } else { fall })
            }
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        }
    }

    /// Drop the link from `parent` to `child`
    ///
    /// Panics if `child` is not a child of `parent`.
    pub fn detach(&mut self, parent: NodeId, child: NodeId) {
        let node = match self.nodes.get_mut(parent) {
            Some(node) => node,
            None => panic!("detach from released node {parent:?}"),
        };
        match node.children.iter_mut().find(|slot| **slot == Some(child)) {
            Some(slot) => *slot = None,
            None => panic!("{child:?} is not a child of {parent:?}"),
        }
    }

    /// Clear the parent link of a node that becomes the new root
    pub fn orphan(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
    }

    /// `id` and all of its descendants, parents before children
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get(next) {
                out.push(next);
                stack.extend(node.children.iter().flatten().copied());
            }
        }
        out
    }

    /// Release `id` and its whole subtree, returning how many nodes were freed
    ///
    /// The parent's link to `id` is left alone; callers detach it.
    pub fn dispose(&mut self, id: NodeId) -> usize {
        let doomed = self.subtree(id);
        for &node in doomed.iter().rev() {
            self.nodes.remove(node);
        }
        self.stats.disposed += doomed.len() as u64;
        doomed.len()
    }
}
