// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batched change journal returned by [`Tree::commit`](crate::Tree::commit).

use alloc::vec::Vec;

use crate::types::NodeId;

/// A single recorded mutation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TreeEvent {
    /// The node's width or height changed.
    Resized(NodeId),
    /// The node was attached to, detached from, or moved to a different parent.
    ParentChanged(NodeId),
    /// The node's child list changed (insert, remove, or reparent of a child).
    ChildrenChanged(NodeId),
    /// The node became active in the hierarchy.
    Activated(NodeId),
    /// The node stopped being active in the hierarchy.
    Deactivated(NodeId),
}

impl TreeEvent {
    /// The node the event refers to.
    #[must_use]
    pub const fn node(self) -> NodeId {
        match self {
            Self::Resized(n)
            | Self::ParentChanged(n)
            | Self::ChildrenChanged(n)
            | Self::Activated(n)
            | Self::Deactivated(n) => n,
        }
    }
}

/// Events accumulated since the previous commit, in mutation order.
#[derive(Clone, Debug, Default)]
pub struct Changes {
    /// Recorded events.
    pub events: Vec<TreeEvent>,
}

impl Changes {
    /// True if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Nodes whose size changed, in recording order (may repeat).
    pub fn resized(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.events.iter().filter_map(|e| match e {
            TreeEvent::Resized(n) => Some(*n),
            _ => None,
        })
    }
}
