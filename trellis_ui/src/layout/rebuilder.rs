// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use log::trace;
use trellis_tree::NodeId;

use crate::component::Capabilities;
use crate::registry::RebuildRequest;
use crate::scene::Scene;

/// Finds rebuild roots and runs the four layout passes.
#[derive(Debug)]
pub struct LayoutRebuilder;

#[derive(Copy, Clone)]
enum Pass {
    Horizontal,
    Vertical,
}

impl LayoutRebuilder {
    /// Queue the layout that owns `node` for rebuild.
    ///
    /// The root is the topmost ancestor reached through an unbroken chain of
    /// parents carrying an active layout group. If no such parent exists the
    /// node itself is the root, but only when it has an active layout
    /// controller. Marks made while the queue is being processed are held
    /// until the next frame.
    pub fn mark_layout_for_rebuild(scene: &mut Scene, node: NodeId) {
        if !scene.tree.is_alive(node) {
            return;
        }
        if scene.updates.is_rebuilding_layout() {
            scene.updates.defer(node);
            return;
        }
        let root = Self::layout_root(scene, node);
        if root == node
            && scene
                .active_components(node, Capabilities::LAYOUT_CONTROLLER)
                .is_empty()
        {
            return;
        }
        if scene
            .updates
            .try_register_for_layout_rebuild(RebuildRequest { root })
        {
            trace!("queued layout rebuild of {root:?} (marked {node:?})");
        }
    }

    /// Rebuild the subtree at `node` now, outside the frame queue.
    pub fn force_rebuild_layout_immediate(scene: &mut Scene, node: NodeId) {
        if scene.tree.is_alive(node) {
            Self::rebuild(scene, node);
        }
    }

    /// Run horizontal calculation, horizontal control, vertical calculation,
    /// and vertical control over the subtree at `root`.
    pub fn rebuild(scene: &mut Scene, root: NodeId) {
        trace!("rebuilding layout at {root:?}");
        Self::perform_layout_calculation(scene, root, Pass::Horizontal);
        Self::perform_layout_control(scene, root, Pass::Horizontal);
        Self::perform_layout_calculation(scene, root, Pass::Vertical);
        Self::perform_layout_control(scene, root, Pass::Vertical);
    }

    fn layout_root(scene: &Scene, node: NodeId) -> NodeId {
        let mut root = node;
        let mut parent = scene.tree.parent(node);
        while let Some(p) = parent {
            if scene
                .active_components(p, Capabilities::LAYOUT_GROUP)
                .is_empty()
            {
                break;
            }
            root = p;
            parent = scene.tree.parent(p);
        }
        root
    }

    // Children before parents. A node without active elements or a layout
    // group is skipped together with its subtree.
    fn perform_layout_calculation(scene: &mut Scene, node: NodeId, pass: Pass) {
        let elements = scene.active_components(node, Capabilities::LAYOUT_ELEMENT);
        let has_group = scene
            .components
            .with_capabilities(node, Capabilities::LAYOUT_GROUP)
            .next()
            .is_some();
        if elements.is_empty() && !has_group {
            return;
        }
        for child in scene.tree.children(node).to_vec() {
            Self::perform_layout_calculation(scene, child, pass);
        }
        for id in elements {
            scene.with_component(id, |c, cx| {
                if let Some(e) = c.as_layout_element_mut() {
                    match pass {
                        Pass::Horizontal => e.calculate_layout_input_horizontal(cx),
                        Pass::Vertical => e.calculate_layout_input_vertical(cx),
                    }
                }
            });
        }
    }

    // Parents before children, self controllers before the rest. A node
    // without active controllers is skipped together with its subtree.
    fn perform_layout_control(scene: &mut Scene, node: NodeId, pass: Pass) {
        let controllers = scene.active_components(node, Capabilities::LAYOUT_CONTROLLER);
        if controllers.is_empty() {
            return;
        }
        let (self_controllers, others): (Vec<_>, Vec<_>) =
            controllers.into_iter().partition(|id| {
                scene
                    .components
                    .capabilities(*id)
                    .contains(Capabilities::LAYOUT_SELF_CONTROLLER)
            });
        for id in self_controllers.into_iter().chain(others) {
            scene.with_component(id, |c, cx| {
                if let Some(controller) = c.as_layout_controller_mut() {
                    match pass {
                        Pass::Horizontal => controller.set_layout_horizontal(cx),
                        Pass::Vertical => controller.set_layout_vertical(cx),
                    }
                }
            });
        }
        for child in scene.tree.children(node).to_vec() {
            Self::perform_layout_control(scene, child, pass);
        }
    }
}
