// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Tree: a generational arena holding an ownership hierarchy.
//!
//! Nodes live in slots addressed by [`NodeId`] (index + generation), so the
//! tree has no owning cycles: parent and child relations are plain handles,
//! and a stale handle simply stops resolving after its node is removed.
//!
//! The structural invariant maintained by every mutation, with no
//! intermediate state observable by callers:
//!
//! - for every node `n` and child `c`: `c`'s parent is `n` **iff** `n`'s
//!   child list contains `c`, exactly once;
//! - no node is its own ancestor ([`Arena::attach`] refuses to create a
//!   cycle).
//!
//! Child order is significant: index 0 is the back-most sibling, the last
//! index the front-most. [`Arena::attach`] always appends, so the most
//! recently attached child is front-most.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use alloc::vec::Vec;
use smallvec::SmallVec;

/// Identifier for a node in an [`Arena`] (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Node<T> {
    generation: u32,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    value: T,
}

impl<T> Node<T> {
    fn new(generation: u32, value: T) -> Self {
        Self {
            generation,
            parent: None,
            children: SmallVec::new(),
            value,
        }
    }
}

/// An arena of tree nodes carrying values of type `T`.
///
/// Freed slots are recycled through a free list; each reuse bumps the slot's
/// generation so removed nodes' [`NodeId`]s become stale rather than aliasing
/// their successors.
pub struct Arena<T> {
    /// slots
    nodes: Vec<Option<Node<T>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<T> core::fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Arena")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Create an empty arena.
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Insert a new detached node and return its id.
    ///
    /// The node has no parent until [`Arena::attach`] links it somewhere;
    /// detached subtrees are fully functional, which is how scenes are
    /// assembled off-screen before being attached.
    pub fn insert(&mut self, value: T) -> NodeId {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, value));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId::new(idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, value)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId::new((self.nodes.len() - 1) as u32, generation)
        }
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Shared access to a live node's value.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node_opt(id).map(|n| &n.value)
    }

    /// Mutable access to a live node's value.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_opt_mut(id).map(|n| &mut n.value)
    }

    /// The parent of a live node, or `None` for roots and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// The ordered children of a node (back-most first). Empty for stale ids.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], |n| &n.children)
    }

    /// Link `child` under `parent`, appending it as the front-most child.
    ///
    /// The child is first detached from any prior parent, so a node always
    /// has at most one owner. Returns `false` (leaving the tree unchanged)
    /// if either id is stale, if `parent == child`, or if the link would
    /// make `child` its own ancestor.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent == child || !self.is_alive(parent) || !self.is_alive(child) {
            return false;
        }
        // Cycle guard: `child` must not already be above `parent`.
        let mut cursor = Some(parent);
        while let Some(n) = cursor {
            if n == child {
                return false;
            }
            cursor = self.parent_of(n);
        }
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
        true
    }

    /// Unlink a node from its parent, leaving its subtree alive but detached.
    ///
    /// No-op for roots and stale ids.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node_opt(id).and_then(|n| n.parent) else {
            return;
        };
        self.node_mut(parent).children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }

    /// Remove a node and its entire subtree from the arena.
    ///
    /// All removed ids become stale. No-op for stale ids.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.detach(id);
        let mut stack: Vec<NodeId> = alloc::vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes[n.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(n.idx());
            }
        }
    }

    /// The root of the tree containing `id`: the farthest parentless ancestor
    /// (possibly `id` itself).
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        let mut cursor = id;
        while let Some(parent) = self.parent_of(cursor) {
            cursor = parent;
        }
        Some(cursor)
    }

    /// Distance from `id` to its root (roots have depth 0).
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = id;
        while let Some(parent) = self.parent_of(cursor) {
            depth += 1;
            cursor = parent;
        }
        depth
    }

    /// The subtree rooted at `id` in pre-order, including `id` itself.
    ///
    /// Children are visited back-most first, so reversing the result walks
    /// the subtree front-most first (the hit-test order).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        if !self.is_alive(id) {
            return result;
        }
        let mut stack: Vec<NodeId> = alloc::vec![id];
        while let Some(n) = stack.pop() {
            result.push(n);
            for &child in self.children_of(n).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// `id` followed by its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        if !self.is_alive(id) {
            return result;
        }
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            result.push(n);
            cursor = self.parent_of(n);
        }
        result
    }

    /// Same-parent nodes excluding `id` itself. Empty for roots.
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent_of(id) else {
            return Vec::new();
        };
        self.children_of(parent)
            .iter()
            .copied()
            .filter(|&c| c != id)
            .collect()
    }

    /// The nearest of `id` and its ancestors satisfying `predicate`.
    pub fn find_ancestor(
        &self,
        id: NodeId,
        mut predicate: impl FnMut(NodeId, &T) -> bool,
    ) -> Option<NodeId> {
        let mut cursor = if self.is_alive(id) { Some(id) } else { None };
        while let Some(n) = cursor {
            if predicate(n, self.get(n)?) {
                return Some(n);
            }
            cursor = self.parent_of(n);
        }
        None
    }

    /// The first of `id` and its descendants (pre-order) satisfying `predicate`.
    pub fn find_descendant(
        &self,
        id: NodeId,
        mut predicate: impl FnMut(NodeId, &T) -> bool,
    ) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .find(|&n| self.get(n).is_some_and(|v| predicate(n, v)))
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node<T>> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        (n.generation == id.1).then_some(n)
    }

    /// Access a node known to be live; panics on stale ids.
    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn small_tree() -> (Arena<&'static str>, NodeId, NodeId, NodeId, NodeId, NodeId) {
        // root -> [a -> [c, d], b]
        let mut arena = Arena::new();
        let root = arena.insert("root");
        let a = arena.insert("a");
        let b = arena.insert("b");
        let c = arena.insert("c");
        let d = arena.insert("d");
        assert!(arena.attach(root, a));
        assert!(arena.attach(root, b));
        assert!(arena.attach(a, c));
        assert!(arena.attach(a, d));
        (arena, root, a, b, c, d)
    }

    #[test]
    fn attach_maintains_dual_invariant() {
        let (arena, root, a, b, ..) = small_tree();
        assert_eq!(arena.parent_of(a), Some(root));
        assert_eq!(arena.parent_of(b), Some(root));
        assert_eq!(arena.children_of(root), &[a, b]);
        assert_eq!(arena.parent_of(root), None);
    }

    #[test]
    fn reattach_moves_exactly_once() {
        let (mut arena, root, a, b, c, _) = small_tree();
        // Move c from a to b.
        assert!(arena.attach(b, c));
        assert_eq!(arena.parent_of(c), Some(b));
        assert_eq!(
            arena.children_of(b).iter().filter(|&&n| n == c).count(),
            1,
            "child appears exactly once in new parent"
        );
        assert!(
            !arena.children_of(a).contains(&c),
            "former parent no longer lists the child"
        );
        // Re-attaching to the same parent moves it to the front.
        assert!(arena.attach(root, a));
        assert_eq!(arena.children_of(root), &[b, a]);
    }

    #[test]
    fn attach_refuses_cycles() {
        let (mut arena, root, a, _, c, _) = small_tree();
        assert!(!arena.attach(c, a), "grandchild cannot adopt its ancestor");
        assert!(!arena.attach(a, a), "self-adoption refused");
        assert!(!arena.attach(a, root));
        // Tree unchanged.
        assert_eq!(arena.parent_of(a), Some(root));
        assert_eq!(arena.parent_of(c), Some(a));
    }

    #[test]
    fn detach_leaves_subtree_alive() {
        let (mut arena, root, a, _, c, d) = small_tree();
        arena.detach(a);
        assert_eq!(arena.parent_of(a), None);
        assert!(!arena.children_of(root).contains(&a));
        // Subtree intact and rooted at the detached node.
        assert_eq!(arena.root_of(c), Some(a));
        assert_eq!(arena.descendants(a), vec![a, c, d]);
    }

    #[test]
    fn remove_frees_subtree_and_stales_ids() {
        let (mut arena, root, a, b, c, d) = small_tree();
        arena.remove(a);
        for stale in [a, c, d] {
            assert!(!arena.is_alive(stale));
            assert!(arena.get(stale).is_none());
            assert_eq!(arena.parent_of(stale), None);
            assert!(arena.children_of(stale).is_empty());
        }
        assert_eq!(arena.children_of(root), &[b]);
    }

    #[test]
    fn slot_reuse_bumps_generation() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let b = arena.insert(2);
        assert!(!arena.is_alive(a));
        assert!(arena.is_alive(b));
        if a.0 == b.0 {
            assert!(b.1 > a.1, "generation must increase on reuse");
        }
    }

    #[test]
    fn preorder_descendants_and_reverse_front_first() {
        let (arena, root, a, b, c, d) = small_tree();
        assert_eq!(arena.descendants(root), vec![root, a, c, d, b]);
        // Reversed pre-order visits the front-most (last-attached) leaves first.
        let mut rev = arena.descendants(root);
        rev.reverse();
        assert_eq!(rev, vec![b, d, c, a, root]);
    }

    #[test]
    fn ancestors_include_self_then_walk_up() {
        let (arena, root, a, _, c, _) = small_tree();
        assert_eq!(arena.ancestors(c), vec![c, a, root]);
        assert_eq!(arena.ancestors(root), vec![root]);
    }

    #[test]
    fn siblings_exclude_self() {
        let (arena, root, a, b, c, d) = small_tree();
        assert_eq!(arena.siblings(a), vec![b]);
        assert_eq!(arena.siblings(c), vec![d]);
        assert!(arena.siblings(root).is_empty());
    }

    #[test]
    fn depth_and_root() {
        let (arena, root, a, _, c, _) = small_tree();
        assert_eq!(arena.depth(root), 0);
        assert_eq!(arena.depth(a), 1);
        assert_eq!(arena.depth(c), 2);
        assert_eq!(arena.root_of(c), Some(root));
        assert_eq!(arena.root_of(root), Some(root));
    }

    #[test]
    fn predicate_search_up_and_down() {
        let (arena, root, a, _, c, d) = small_tree();
        // Nearest ancestor search includes the start node.
        assert_eq!(arena.find_ancestor(c, |_, v| *v == "c"), Some(c));
        assert_eq!(arena.find_ancestor(c, |_, v| *v == "root"), Some(root));
        assert_eq!(arena.find_ancestor(c, |_, v| *v == "b"), None);
        // Descendant search is pre-order.
        assert_eq!(arena.find_descendant(root, |_, v| *v == "d"), Some(d));
        assert_eq!(arena.find_descendant(a, |_, v| *v == "b"), None);
    }

    #[test]
    fn stale_ids_degrade_to_empty_queries() {
        let (mut arena, _, a, ..) = small_tree();
        arena.remove(a);
        assert!(arena.descendants(a).is_empty());
        assert!(arena.ancestors(a).is_empty());
        assert!(arena.siblings(a).is_empty());
        assert_eq!(arena.root_of(a), None);
        assert_eq!(arena.find_ancestor(a, |_, _| true), None);
    }
}
