// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural errors.

use core::fmt;

use crate::types::NodeId;

/// Error returned by structural tree operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// The handle does not refer to a live node.
    StaleNode(NodeId),
    /// The requested parent is the node itself or one of its descendants.
    Cycle {
        /// Node being moved.
        node: NodeId,
        /// Rejected parent.
        parent: NodeId,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleNode(id) => write!(f, "stale node id {id:?}"),
            Self::Cycle { node, parent } => {
                write!(f, "cannot parent {node:?} under its own descendant {parent:?}")
            }
        }
    }
}

impl core::error::Error for TreeError {}
