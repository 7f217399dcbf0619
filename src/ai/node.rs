//! Arena-based simulation tree
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`], so
//! parent links are plain indices with no ownership. Once a node's best
//! line is known its children are cut down to that one entry, which is how
//! the chosen line is read back from the root.
//!
//! Pruned and rerooted-away nodes are only marked detached and lose their
//! state; their slots stay in the arena. A tree that is rerooted to follow
//! a planned line keeps growing until the controller starts a fresh search,
//! so [`SimulationTree::len`] can run well ahead of
//! [`SimulationTree::live_count`].

use crate::ai::RulesEngine;
use crate::core::{CardId, PlayerId};
use std::fmt;

/// Index of a node in its [`SimulationTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One decision point of the search
#[derive(Debug, Clone)]
pub struct SimulationNode<G: RulesEngine> {
    /// Released once the subtree is scored
    state: Option<G>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Whose decision produced `actions`
    pub acting_player: PlayerId,
    /// Actions applied to the parent's state to reach this node
    pub actions: Vec<G::Action>,
    /// Depth remaining when the node was created
    pub depth: i32,
    pub score: Option<i32>,
    /// Hash of the state as it was when this node's priority was simulated
    pub fingerprint: u64,
    pub combat: Option<G::Combat>,
    /// Library-search choices made on the way to this node
    pub search_targets: Vec<CardId>,
    detached: bool,
}

impl<G: RulesEngine> SimulationNode<G> {
    fn new(state: G, parent: Option<NodeId>, acting_player: PlayerId, depth: i32) -> Self {
        SimulationNode {
            state: Some(state),
            parent,
            children: Vec::new(),
            acting_player,
            actions: Vec::new(),
            depth,
            score: None,
            fingerprint: 0,
            combat: None,
            search_targets: Vec::new(),
            detached: false,
        }
    }

    pub fn state(&self) -> Option<&G> {
        self.state.as_ref()
    }

    pub fn has_state(&self) -> bool {
        self.state.is_some()
    }

    /// Exactly one action, which is the only case the repetition check
    /// looks at
    pub fn single_action(&self) -> Option<&G::Action> {
        match self.actions.as_slice() {
            [action] => Some(action),
            _ => None,
        }
    }

    /// Cut off from the tree by pruning
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

/// The search tree for one decision (or a chain of decisions when the
/// planned line is reused)
#[derive(Debug, Clone)]
pub struct SimulationTree<G: RulesEngine> {
    nodes: Vec<SimulationNode<G>>,
    root: NodeId,
}

impl<G: RulesEngine> SimulationTree<G> {
    /// Fresh tree whose root holds a private copy of the live state
    pub fn new(state: G, acting_player: PlayerId, depth: i32) -> Self {
        SimulationTree {
            nodes: vec![SimulationNode::new(state, None, acting_player, depth)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SimulationNode<G> {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SimulationNode<G> {
        &mut self.nodes[id.0]
    }

    /// Nodes ever allocated, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn state(&self, id: NodeId) -> Option<&G> {
        self.nodes[id.0].state.as_ref()
    }

    pub fn state_mut(&mut self, id: NodeId) -> Option<&mut G> {
        self.nodes[id.0].state.as_mut()
    }

    /// Drop the state of a node whose subtree is scored
    pub fn release_state(&mut self, id: NodeId) {
        self.nodes[id.0].state = None;
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        state: G,
        acting_player: PlayerId,
        actions: Vec<G::Action>,
        depth: i32,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = SimulationNode::new(state, Some(parent), acting_player, depth);
        node.actions = actions;
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// First (after pruning: only) child
    pub fn best_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.first().copied()
    }

    /// Keep `best` as the only child of `parent`, or no child at all.
    /// Everything below the discarded children is detached and loses its
    /// state.
    pub fn retain_only(&mut self, parent: NodeId, best: Option<NodeId>) {
        let children = std::mem::take(&mut self.nodes[parent.0].children);
        for child in children {
            if Some(child) != best {
                self.detach(child);
            }
        }
        if let Some(best) = best {
            self.nodes[parent.0].children.push(best);
        }
    }

    fn detach(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let node = &mut self.nodes[next.0];
            node.detached = true;
            node.state = None;
            node.combat = None;
            pending.append(&mut node.children);
        }
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, G> {
        Ancestors {
            tree: self,
            next: self.nodes[id.0].parent,
        }
    }

    /// The committed line below `from`, following first children
    pub fn spine(&self, from: NodeId) -> Vec<NodeId> {
        let mut line = Vec::new();
        let mut current = from;
        while let Some(child) = self.best_child(current) {
            line.push(child);
            current = child;
        }
        line
    }

    /// Continue from a node of the committed line. Its parent link is cut so
    /// that repetition checks stop at the new root.
    pub fn reroot(&mut self, id: NodeId) {
        self.nodes[id.0].parent = None;
        self.root = id;
    }

    /// Nodes reachable from the root
    pub fn live_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            count += 1;
            pending.extend(self.nodes[id.0].children.iter().copied());
        }
        count
    }
}

pub struct Ancestors<'a, G: RulesEngine> {
    tree: &'a SimulationTree<G>,
    next: Option<NodeId>,
}

impl<'a, G: RulesEngine> Iterator for Ancestors<'a, G> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.nodes[id.0].parent;
        Some(id)
    }
}
