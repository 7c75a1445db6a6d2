// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, activeness, geometry, and the change journal.

use alloc::vec::Vec;
use kurbo::{Affine, Point, Rect, Size, Vec2};

use crate::changes::{Changes, TreeEvent};
use crate::error::TreeError;
use crate::types::{Axis, DrivenProperties, LocalRect, NodeFlags, NodeId};
use crate::util::transform_rect_bbox;

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena of rectangular nodes.
pub struct Tree {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    journal: Vec<TreeEvent>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("pending_events", &self.journal.len())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: LocalRect,
    flags: NodeFlags,
    active_in_hierarchy: bool,
    driven: DrivenProperties,
    // Per-property count of trackers driving it, in `DRIVEN_BITS` order.
    drive_counts: [u16; 4],
}

const DRIVEN_BITS: [DrivenProperties; 4] = [
    DrivenProperties::POSITION_X,
    DrivenProperties::POSITION_Y,
    DrivenProperties::WIDTH,
    DrivenProperties::HEIGHT,
];

impl Node {
    fn new(generation: u32, local: LocalRect, parent_active: bool) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
            flags: NodeFlags::default(),
            active_in_hierarchy: parent_active,
            driven: DrivenProperties::empty(),
            drive_counts: [0; 4],
        }
    }
}

/// Iterator from a node up to its root, inclusive.
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.parent(id);
        Some(id)
    }
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            journal: Vec::new(),
        }
    }

    /// Insert a new node as the last child of `parent` (or as a root if `None`).
    ///
    /// A stale `parent` inserts the node as a root.
    pub fn insert(&mut self, parent: Option<NodeId>, local: LocalRect) -> NodeId {
        let parent = parent.filter(|p| self.is_alive(*p));
        let parent_active = parent.is_none_or(|p| self.node(p).active_in_hierarchy);
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local, parent_active));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId indices are 32-bit."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes
                .push(Some(Node::new(generation, local, parent_active)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId indices are 32-bit."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent {
            self.link_parent(id, p);
            self.journal.push(TreeEvent::ChildrenChanged(p));
        }
        id
    }

    /// Remove a node and its subtree. Returns the removed ids in pre-order.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.is_alive(id) {
            return Vec::new();
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
            self.journal.push(TreeEvent::ChildrenChanged(parent));
        }
        let removed = self.descendants_pre_order(id);
        for &n in &removed {
            self.nodes[n.idx()] = None;
            self.free_list.push(n.idx());
        }
        removed
    }

    /// Reparent `id` under `new_parent` (or detach it to a root with `None`).
    ///
    /// Moving a node under itself or one of its descendants is rejected.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), TreeError> {
        if !self.is_alive(id) {
            return Err(TreeError::StaleNode(id));
        }
        if let Some(p) = new_parent {
            if !self.is_alive(p) {
                return Err(TreeError::StaleNode(p));
            }
            if self.is_ancestor_or_self(id, p) {
                return Err(TreeError::Cycle {
                    node: id,
                    parent: p,
                });
            }
        }
        let old_parent = self.node(id).parent;
        if old_parent == new_parent {
            return Ok(());
        }
        if let Some(old) = old_parent {
            self.unlink_parent(id, old);
            self.journal.push(TreeEvent::ChildrenChanged(old));
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
            self.journal.push(TreeEvent::ChildrenChanged(p));
        }
        self.journal.push(TreeEvent::ParentChanged(id));
        self.refresh_activity(id);
        Ok(())
    }

    /// Set the node's own active flag.
    ///
    /// Nodes whose hierarchy activeness flips as a result are journaled as
    /// [`TreeEvent::Activated`] / [`TreeEvent::Deactivated`] in pre-order.
    pub fn set_active(&mut self, id: NodeId, active: bool) {
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        if n.flags.contains(NodeFlags::ACTIVE) == active {
            return;
        }
        n.flags.set(NodeFlags::ACTIVE, active);
        self.refresh_activity(id);
    }

    /// Whether the node's own active flag is set.
    pub fn active_self(&self, id: NodeId) -> bool {
        self.node_opt(id)
            .is_some_and(|n| n.flags.contains(NodeFlags::ACTIVE))
    }

    /// Whether the node and all of its ancestors are active.
    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| n.active_in_hierarchy)
    }

    // --- structure queries ---

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Parent of a node, if any.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id)?.parent
    }

    /// Ordered children of a node. Empty for stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Number of children.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Child at position `i`.
    pub fn child(&self, id: NodeId, i: usize) -> Option<NodeId> {
        self.children(id).get(i).copied()
    }

    /// Number of ancestors above the node.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors_or_self(id).count().saturating_sub(1)
    }

    /// Walk from `id` to its root, inclusive. Empty for stale ids.
    pub fn ancestors_or_self(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.is_alive(id).then_some(id),
        }
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_or_self(node).any(|a| a == ancestor)
    }

    /// The subtree rooted at `id` in pre-order (parents before children).
    pub fn descendants_pre_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.is_alive(id) {
            return out;
        }
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Nodes without a parent, in slot order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n {
                Some(n) if n.parent.is_none() =>
                {
                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "NodeId indices are 32-bit."
                    )]
                    Some(NodeId::new(i as u32, n.generation))
                }
                _ => None,
            })
            .collect()
    }

    // --- geometry ---

    /// Local rect of a node.
    pub fn local(&self, id: NodeId) -> Option<&LocalRect> {
        self.node_opt(id).map(|n| &n.local)
    }

    /// Size of a node; zero for stale ids.
    pub fn size(&self, id: NodeId) -> Size {
        self.local(id).map_or(Size::ZERO, |l| l.size)
    }

    /// Position of a node inside its parent; origin for stale ids.
    pub fn position(&self, id: NodeId) -> Point {
        self.local(id).map_or(Point::ZERO, |l| l.position)
    }

    /// Local scale of a node; unit scale for stale ids.
    pub fn scale(&self, id: NodeId) -> Vec2 {
        self.local(id).map_or(Vec2::new(1.0, 1.0), |l| l.scale)
    }

    /// The node's rect in parent space (ignoring scale).
    pub fn rect(&self, id: NodeId) -> Rect {
        self.local(id).map_or(Rect::ZERO, LocalRect::to_rect)
    }

    /// Update the size. Journals [`TreeEvent::Resized`] if it changed.
    pub fn set_size(&mut self, id: NodeId, size: Size) {
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        if n.local.size != size {
            n.local.size = size;
            self.journal.push(TreeEvent::Resized(id));
        }
    }

    /// Update the size along one axis.
    pub fn set_size_along_axis(&mut self, id: NodeId, axis: Axis, value: f64) {
        let size = self.size(id);
        self.set_size(id, axis.with_size(size, value));
    }

    /// Update the position inside the parent.
    pub fn set_position(&mut self, id: NodeId, position: Point) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.position = position;
        }
    }

    /// Update the position along one axis.
    pub fn set_position_along_axis(&mut self, id: NodeId, axis: Axis, value: f64) {
        let position = self.position(id);
        self.set_position(id, axis.with_point(position, value));
    }

    /// Update the local scale.
    pub fn set_scale(&mut self, id: NodeId, scale: Vec2) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.scale = scale;
        }
    }

    /// Replace the whole local rect, journaling a resize if the size changed.
    pub fn set_local(&mut self, id: NodeId, local: LocalRect) {
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        let resized = n.local.size != local.size;
        n.local = local;
        if resized {
            self.journal.push(TreeEvent::Resized(id));
        }
    }

    /// Product of local translations and scales from the root down to `id`.
    pub fn world_transform(&self, id: NodeId) -> Affine {
        let mut tf = Affine::IDENTITY;
        for a in self.ancestors_or_self(id) {
            let l = self.node(a).local;
            tf = Affine::translate(l.position.to_vec2())
                * Affine::scale_non_uniform(l.scale.x, l.scale.y)
                * tf;
        }
        tf
    }

    /// Canvas-space bounding box of the node's rect.
    pub fn world_rect(&self, id: NodeId) -> Rect {
        if !self.is_alive(id) {
            return Rect::ZERO;
        }
        let size = self.size(id);
        transform_rect_bbox(
            self.world_transform(id),
            Rect::new(0.0, 0.0, size.width, size.height),
        )
    }

    /// Bounding box of the node's rect in the space of `ancestor`.
    ///
    /// Transforms above `ancestor` are left out; if `ancestor` is not an
    /// ancestor-or-self of `id` this is the same as [`world_rect`](Self::world_rect).
    pub fn rect_relative_to(&self, id: NodeId, ancestor: NodeId) -> Rect {
        if !self.is_alive(id) {
            return Rect::ZERO;
        }
        let mut tf = Affine::IDENTITY;
        for a in self.ancestors_or_self(id) {
            if a == ancestor {
                break;
            }
            let l = self.node(a).local;
            tf = Affine::translate(l.position.to_vec2())
                * Affine::scale_non_uniform(l.scale.x, l.scale.y)
                * tf;
        }
        let size = self.size(id);
        transform_rect_bbox(tf, Rect::new(0.0, 0.0, size.width, size.height))
    }

    // --- driven properties ---

    /// Rect properties currently controlled by a layout system.
    pub fn driven_properties(&self, id: NodeId) -> DrivenProperties {
        self.node_opt(id)
            .map_or(DrivenProperties::empty(), |n| n.driven)
    }

    /// Add one claim on each of `props`. Callers claim a property at most once.
    pub(crate) fn drive(&mut self, id: NodeId, props: DrivenProperties) {
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        for (count, bit) in n.drive_counts.iter_mut().zip(DRIVEN_BITS) {
            if props.contains(bit) {
                *count = count.saturating_add(1);
            }
        }
        n.driven |= props;
    }

    /// Drop one claim on each of `props`; a property stays driven while any claim remains.
    pub(crate) fn release(&mut self, id: NodeId, props: DrivenProperties) {
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        for (count, bit) in n.drive_counts.iter_mut().zip(DRIVEN_BITS) {
            if props.contains(bit) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    n.driven.remove(bit);
                }
            }
        }
    }

    // --- journal ---

    /// True if mutations were journaled since the last [`commit`](Self::commit).
    pub fn has_pending_changes(&self) -> bool {
        !self.journal.is_empty()
    }

    /// Drain the change journal.
    pub fn commit(&mut self) -> Changes {
        Changes {
            events: core::mem::take(&mut self.journal),
        }
    }

    // --- internals ---

    // Only for ids already checked alive.
    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        let parent_node = self.node_mut(parent);
        parent_node.children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        let p = self.node_mut(parent);
        p.children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }

    /// Recompute cached hierarchy activeness below `id`, journaling flips.
    fn refresh_activity(&mut self, id: NodeId) {
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            let parent_active = self
                .node(n)
                .parent
                .is_none_or(|p| self.node(p).active_in_hierarchy);
            let node = self.node_mut(n);
            let now = parent_active && node.flags.contains(NodeFlags::ACTIVE);
            if now == node.active_in_hierarchy && n != id {
                continue;
            }
            if now != node.active_in_hierarchy {
                node.active_in_hierarchy = now;
                self.journal.push(if now {
                    TreeEvent::Activated(n)
                } else {
                    TreeEvent::Deactivated(n)
                });
            }
            stack.extend(self.node(n).children.iter().rev().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sized(w: f64, h: f64) -> LocalRect {
        LocalRect::sized(w, h)
    }

    #[test]
    fn insert_links_children_in_order() {
        let mut tree = Tree::new();
        let root = tree.insert(None, sized(100.0, 100.0));
        let a = tree.insert(Some(root), sized(10.0, 10.0));
        let b = tree.insert(Some(root), sized(10.0, 10.0));
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.child(root, 1), Some(b));
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.depth(b), 1);
        assert_eq!(tree.roots(), vec![root]);
    }

    #[test]
    fn liveness_insert_remove_reuse() {
        let mut tree = Tree::new();
        let root = tree.insert(None, sized(1.0, 1.0));
        let a = tree.insert(Some(root), sized(1.0, 1.0));
        let a_child = tree.insert(Some(a), sized(1.0, 1.0));

        let removed = tree.remove(a);
        assert_eq!(removed, vec![a, a_child]);
        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(a_child));
        assert!(tree.children(root).is_empty());

        let b = tree.insert(Some(root), sized(1.0, 1.0));
        assert!(tree.is_alive(b));
        assert!(!tree.is_alive(a));
        if a.0 == b.0 {
            assert!(b.1 > a.1, "generation must increase on reuse");
        }
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut tree = Tree::new();
        let root = tree.insert(None, sized(1.0, 1.0));
        let mid = tree.insert(Some(root), sized(1.0, 1.0));
        let leaf = tree.insert(Some(mid), sized(1.0, 1.0));

        assert_eq!(
            tree.reparent(root, Some(leaf)),
            Err(TreeError::Cycle {
                node: root,
                parent: leaf
            })
        );
        assert_eq!(
            tree.reparent(mid, Some(mid)),
            Err(TreeError::Cycle {
                node: mid,
                parent: mid
            })
        );
        assert_eq!(tree.reparent(leaf, Some(root)), Ok(()));
        assert_eq!(tree.children(root), &[mid, leaf]);
    }

    #[test]
    fn activity_propagates_and_journals_flips() {
        let mut tree = Tree::new();
        let root = tree.insert(None, sized(1.0, 1.0));
        let a = tree.insert(Some(root), sized(1.0, 1.0));
        let b = tree.insert(Some(a), sized(1.0, 1.0));
        tree.set_active(b, false);
        let _ = tree.commit();

        tree.set_active(root, false);
        assert!(!tree.is_active_in_hierarchy(a));
        assert!(tree.active_self(a));
        let changes = tree.commit();
        // `b` was already inactive, so it does not flip.
        assert_eq!(
            changes.events,
            vec![TreeEvent::Deactivated(root), TreeEvent::Deactivated(a)]
        );

        tree.set_active(root, true);
        assert!(tree.is_active_in_hierarchy(a));
        assert!(!tree.is_active_in_hierarchy(b));
    }

    #[test]
    fn resize_is_journaled_only_on_change() {
        let mut tree = Tree::new();
        let n = tree.insert(None, sized(10.0, 10.0));
        tree.set_size(n, Size::new(10.0, 10.0));
        assert!(!tree.has_pending_changes());
        tree.set_size_along_axis(n, Axis::Horizontal, 20.0);
        let changes = tree.commit();
        assert_eq!(changes.resized().collect::<Vec<_>>(), vec![n]);
        assert_eq!(tree.size(n), Size::new(20.0, 10.0));
    }

    #[test]
    fn world_rect_accumulates_offsets_and_scale() {
        let mut tree = Tree::new();
        let root = tree.insert(None, sized(200.0, 200.0));
        let child = tree.insert(
            Some(root),
            LocalRect::new(Point::new(10.0, 20.0), Size::new(50.0, 40.0)),
        );
        let grandchild = tree.insert(
            Some(child),
            LocalRect::new(Point::new(5.0, 5.0), Size::new(10.0, 10.0)),
        );
        assert_eq!(tree.world_rect(grandchild), Rect::new(15.0, 25.0, 25.0, 35.0));

        tree.set_scale(child, Vec2::new(2.0, 2.0));
        assert_eq!(tree.world_rect(grandchild), Rect::new(20.0, 30.0, 40.0, 50.0));
        assert_eq!(tree.world_rect(child), Rect::new(10.0, 20.0, 110.0, 100.0));

        // Relative to `child`, only the grandchild's own offset applies.
        assert_eq!(
            tree.rect_relative_to(grandchild, child),
            Rect::new(5.0, 5.0, 15.0, 15.0)
        );
        assert_eq!(tree.rect_relative_to(child, child), Rect::new(0.0, 0.0, 50.0, 40.0));
        tree.set_position(root, Point::new(100.0, 100.0));
        assert_eq!(
            tree.rect_relative_to(grandchild, root),
            Rect::new(20.0, 30.0, 40.0, 50.0)
        );
    }

    #[test]
    fn stale_ids_are_inert() {
        let mut tree = Tree::new();
        let n = tree.insert(None, sized(1.0, 1.0));
        let _ = tree.remove(n);
        tree.set_size(n, Size::new(5.0, 5.0));
        tree.set_active(n, false);
        assert_eq!(tree.size(n), Size::ZERO);
        assert!(tree.children(n).is_empty());
        assert_eq!(tree.ancestors_or_self(n).count(), 0);
        assert_eq!(tree.reparent(n, None), Err(TreeError::StaleNode(n)));
    }
}
