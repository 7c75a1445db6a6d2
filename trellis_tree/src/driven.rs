// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bookkeeping for rect properties a layout controller overwrites.

use alloc::collections::BTreeMap;

use crate::tree::Tree;
use crate::types::{DrivenProperties, LocalRect, NodeId};

#[derive(Clone, Debug)]
struct Entry {
    // Driven since the last clear.
    active: DrivenProperties,
    // Properties whose pre-driving value is stored in `original`.
    remembered: DrivenProperties,
    original: LocalRect,
}

/// Records which properties of which nodes a single controller drives.
///
/// The first time a node is driven its local rect is remembered, so that
/// [`clear_and_revert`](Self::clear_and_revert) can restore the values the
/// node had before any driving happened. [`clear`](Self::clear) only releases
/// the properties and never touches values.
///
/// Several trackers may drive the same property of one node; the tree keeps
/// it driven until every one of them has released it.
#[derive(Clone, Debug, Default)]
pub struct DrivenTracker {
    entries: BTreeMap<NodeId, Entry>,
}

impl DrivenTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `props` of `node` as driven by this tracker's owner.
    pub fn add(&mut self, tree: &mut Tree, node: NodeId, props: DrivenProperties) {
        let Some(local) = tree.local(node).copied() else {
            return;
        };
        let entry = self.entries.entry(node).or_insert(Entry {
            active: DrivenProperties::empty(),
            remembered: props,
            original: local,
        });
        // Remember values for properties driven for the first time.
        let fresh = props - entry.remembered;
        if fresh.contains(DrivenProperties::POSITION_X) {
            entry.original.position.x = local.position.x;
        }
        if fresh.contains(DrivenProperties::POSITION_Y) {
            entry.original.position.y = local.position.y;
        }
        if fresh.contains(DrivenProperties::WIDTH) {
            entry.original.size.width = local.size.width;
        }
        if fresh.contains(DrivenProperties::HEIGHT) {
            entry.original.size.height = local.size.height;
        }
        entry.remembered |= props;

        let claimed = props - entry.active;
        entry.active |= props;
        tree.drive(node, claimed);
    }

    /// Release every driven property without changing any value.
    ///
    /// Nodes that were not driven since the previous clear, and nodes that no
    /// longer exist, are forgotten along with their remembered values.
    pub fn clear(&mut self, tree: &mut Tree) {
        self.entries.retain(|&node, entry| {
            let was_driven = !entry.active.is_empty();
            tree.release(node, entry.active);
            entry.active = DrivenProperties::empty();
            was_driven && tree.is_alive(node)
        });
    }

    /// Release every driven property and restore the pre-driving values.
    pub fn clear_and_revert(&mut self, tree: &mut Tree) {
        for (&node, entry) in &self.entries {
            let Some(mut local) = tree.local(node).copied() else {
                continue;
            };
            let props = entry.active;
            if props.contains(DrivenProperties::POSITION_X) {
                local.position.x = entry.original.position.x;
            }
            if props.contains(DrivenProperties::POSITION_Y) {
                local.position.y = entry.original.position.y;
            }
            if props.contains(DrivenProperties::WIDTH) {
                local.size.width = entry.original.size.width;
            }
            if props.contains(DrivenProperties::HEIGHT) {
                local.size.height = entry.original.size.height;
            }
            tree.set_local(node, local);
        }
        for (&node, entry) in &self.entries {
            tree.release(node, entry.active);
        }
        self.entries.clear();
    }

    /// True if nothing is currently driven.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|e| e.active.is_empty())
    }

    /// Properties of `node` currently driven by this tracker.
    pub fn driven(&self, node: NodeId) -> DrivenProperties {
        self.entries
            .get(&node)
            .map_or(DrivenProperties::empty(), |e| e.active)
    }

    /// Number of nodes this tracker holds state for.
    pub fn tracked_len(&self) -> usize {
        self.entries.len()
    }
}
