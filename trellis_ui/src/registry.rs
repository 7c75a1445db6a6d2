// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame queue of layout rebuild requests.

use indexmap::IndexSet;
use log::{debug, trace};
use trellis_tree::NodeId;

use crate::layout::LayoutRebuilder;
use crate::scene::Scene;

/// A pending rebuild of the layout rooted at `root`.
///
/// Two requests for the same root are the same request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RebuildRequest {
    /// Topmost node whose subtree is rebuilt together.
    pub root: NodeId,
}

/// Deduplicating queue of layout rebuilds, drained once per frame.
#[derive(Clone, Debug, Default)]
pub struct CanvasUpdateRegistry {
    layout_queue: IndexSet<RebuildRequest>,
    deferred: IndexSet<NodeId>,
    performing_layout: bool,
}

impl CanvasUpdateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `request` unless it is already queued.
    ///
    /// Refused while the queue is being processed; callers route those marks
    /// through [`defer`](Self::defer) instead.
    pub fn try_register_for_layout_rebuild(&mut self, request: RebuildRequest) -> bool {
        if self.performing_layout {
            debug!("refusing layout rebuild of {:?} during layout", request.root);
            return false;
        }
        self.layout_queue.insert(request)
    }

    /// True while queued rebuilds are running.
    pub fn is_rebuilding_layout(&self) -> bool {
        self.performing_layout
    }

    /// Hold a mark on `node` until the next frame's layout update.
    pub fn defer(&mut self, node: NodeId) {
        if self.deferred.insert(node) {
            debug!("deferring layout mark on {node:?} to the next frame");
        }
    }

    /// Number of queued rebuild roots.
    pub fn pending_layout_rebuilds(&self) -> usize {
        self.layout_queue.len()
    }

    /// True if a rebuild rooted at `root` is queued.
    pub fn is_queued(&self, root: NodeId) -> bool {
        self.layout_queue.contains(&RebuildRequest { root })
    }

    /// Queued roots in processing order (before sorting).
    pub fn queued_roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.layout_queue.iter().map(|r| r.root)
    }

    /// Number of marks held for the next frame.
    pub fn deferred_marks(&self) -> usize {
        self.deferred.len()
    }

    pub(crate) fn clear(&mut self) {
        self.layout_queue.clear();
        self.deferred.clear();
        self.performing_layout = false;
    }
}

/// Drain the layout queue: replay deferred marks, drop dead roots, sort
/// parents first, and rebuild each root.
pub(crate) fn perform_layout_update(scene: &mut Scene) {
    let deferred = core::mem::take(&mut scene.updates.deferred);
    for node in deferred {
        LayoutRebuilder::mark_layout_for_rebuild(scene, node);
    }

    let tree = &scene.tree;
    scene.updates.layout_queue.retain(|r| {
        let alive = tree.is_alive(r.root);
        if !alive {
            debug!("dropping layout rebuild of removed node {:?}", r.root);
        }
        alive
    });
    if scene.updates.layout_queue.is_empty() {
        return;
    }
    if scene.config.sort_layout_queue {
        scene
            .updates
            .layout_queue
            .sort_by(|a, b| tree.depth(a.root).cmp(&tree.depth(b.root)));
    }

    scene.updates.performing_layout = true;
    trace!("layout update: {} roots", scene.updates.layout_queue.len());
    let mut i = 0;
    while let Some(&request) = scene.updates.layout_queue.get_index(i) {
        if scene.tree.is_alive(request.root) {
            LayoutRebuilder::rebuild(scene, request.root);
        }
        i += 1;
    }
    scene.updates.layout_queue.clear();
    scene.updates.performing_layout = false;
}
