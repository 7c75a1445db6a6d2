// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Rect;
use log::warn;
use trellis_tree::NodeId;

use super::RectMask2D;
use crate::canvas::Canvas;
use crate::component::{Capabilities, ComponentId};
use crate::scene::{ComponentCx, Scene};

/// Stencil buffers hold this many nested masks.
pub const MAX_STENCIL_DEPTH: usize = 8;

/// Queries over the mask and canvas hierarchy.
#[derive(Debug)]
pub struct MaskUtilities;

impl MaskUtilities {
    /// Ask every clippable below `mask_node` to find its governing mask again.
    ///
    /// Components on `mask_node` itself and on inactive nodes are skipped.
    /// Rect masks below are told to rebuild their mask chains.
    pub fn notify_2d_mask_state_changed(scene: &mut Scene, mask_node: NodeId) {
        for node in Self::active_descendants(scene, mask_node) {
            for id in scene.components.of_type::<RectMask2D>(node).collect::<Vec<_>>() {
                if let Some(mask) = scene.components.downcast_mut::<RectMask2D>(id) {
                    mask.invalidate_mask_chain();
                }
            }
            let clippables: Vec<_> = scene
                .components
                .with_capabilities(node, Capabilities::CLIPPABLE)
                .collect();
            for id in clippables {
                scene.with_component(id, |c, cx| {
                    if let Some(clippable) = c.as_clippable_mut() {
                        clippable.recalculate_clipping(cx);
                    }
                });
            }
        }
    }

    /// Ask every maskable below `mask_node` to recompute its stencil state.
    ///
    /// Components on `mask_node` itself and on inactive nodes are skipped.
    pub fn notify_stencil_state_changed(scene: &mut Scene, mask_node: NodeId) {
        for node in Self::active_descendants(scene, mask_node) {
            let maskables: Vec<_> = scene
                .components
                .with_capabilities(node, Capabilities::MASKABLE)
                .collect();
            for id in maskables {
                scene.with_component(id, |c, cx| {
                    if let Some(maskable) = c.as_maskable_mut() {
                        maskable.recalculate_masking(cx);
                    }
                });
            }
        }
    }

    fn active_descendants(scene: &Scene, root: NodeId) -> Vec<NodeId> {
        scene
            .tree
            .descendants_pre_order(root)
            .into_iter()
            .filter(|n| *n != root && scene.tree.is_active_in_hierarchy(*n))
            .collect()
    }

    /// Active canvases on `node` and its ancestors, closest first.
    fn canvases(scene: &Scene, node: NodeId) -> Vec<(NodeId, bool)> {
        scene
            .tree
            .ancestors_or_self(node)
            .flat_map(|n| {
                scene
                    .components
                    .of_type::<Canvas>(n)
                    .filter(|id| scene.is_component_active(*id))
                    .map(move |id| {
                        let overrides = scene
                            .component::<Canvas>(id)
                            .is_some_and(Canvas::override_sorting);
                        (n, overrides)
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Active rect masks on `node` and its ancestors, closest first.
    fn rect_masks(scene: &Scene, node: NodeId) -> Vec<(NodeId, ComponentId)> {
        scene
            .tree
            .ancestors_or_self(node)
            .flat_map(|n| {
                scene
                    .components
                    .of_type::<RectMask2D>(n)
                    .map(move |id| (n, id))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    // True if an override-sorting canvas between `node` and the top separates
    // `mask_node` from it.
    fn crosses_sorting_boundary(
        scene: &Scene,
        canvases: &[(NodeId, bool)],
        mask_node: NodeId,
    ) -> bool {
        canvases
            .iter()
            .any(|&(canvas, overrides)| overrides && !scene.tree.is_ancestor_or_self(canvas, mask_node))
    }

    /// The closest active canvas that overrides sorting, or the topmost
    /// active canvas if none does.
    pub fn find_root_sort_override_canvas(scene: &Scene, start: NodeId) -> Option<NodeId> {
        let mut found = None;
        for (canvas, overrides) in Self::canvases(scene, start) {
            found = Some(canvas);
            if overrides {
                break;
            }
        }
        found
    }

    /// Topmost node carrying an active canvas at or above `node`.
    pub fn root_canvas(scene: &Scene, node: NodeId) -> Option<NodeId> {
        Self::canvases(scene, node).last().map(|&(canvas, _)| canvas)
    }

    /// The node's rect in the space of its root canvas.
    pub fn canvas_rect(scene: &Scene, node: NodeId) -> Option<Rect> {
        let canvas = Self::root_canvas(scene, node)?;
        Some(scene.tree.rect_relative_to(node, canvas))
    }

    /// Enabled stencil masks on the ancestors of `node`, up to and including
    /// `stop_after`, capped at [`MAX_STENCIL_DEPTH`].
    ///
    /// Each node counts once however many masks it carries.
    pub fn get_stencil_depth(scene: &Scene, node: NodeId, stop_after: Option<NodeId>) -> usize {
        if Some(node) == stop_after {
            return 0;
        }
        let mut depth = 0;
        let mut current = scene.tree.parent(node);
        while let Some(n) = current {
            let masked = scene
                .components
                .with_capabilities(n, Capabilities::MASK)
                .filter(|id| scene.is_component_active(*id))
                .filter_map(|id| scene.components.get(id))
                .filter_map(|c| c.as_mask())
                .any(|m| m.mask_enabled());
            if masked {
                depth += 1;
            }
            if Some(n) == stop_after {
                break;
            }
            current = scene.tree.parent(n);
        }
        if depth > MAX_STENCIL_DEPTH {
            warn!(
                "stencil depth {depth} under {node:?} exceeds {MAX_STENCIL_DEPTH}; extra masks are ignored"
            );
        }
        depth.min(MAX_STENCIL_DEPTH)
    }

    /// The rect mask that clips content on `node`.
    ///
    /// This is the closest active rect mask on a proper ancestor, unless an
    /// override-sorting canvas above `node` does not contain it.
    pub fn get_rect_mask_for_clippable(scene: &Scene, node: NodeId) -> Option<ComponentId> {
        let (mask_node, mask) = Self::rect_masks(scene, node)
            .into_iter()
            .find(|&(n, id)| n != node && scene.is_component_active(id))?;
        let canvases = Self::canvases(scene, node);
        if Self::crosses_sorting_boundary(scene, &canvases, mask_node) {
            return None;
        }
        Some(mask)
    }

    /// The active rect masks a clipper on `clipper_node` composes with,
    /// topmost first and including its own.
    ///
    /// A mask is left out when an override-sorting canvas on the path does
    /// not contain it.
    pub fn get_rect_masks_for_clip(scene: &Scene, clipper_node: NodeId, masks: &mut Vec<ComponentId>) {
        masks.clear();
        let candidates = Self::rect_masks(scene, clipper_node);
        if candidates.is_empty() {
            return;
        }
        let canvases = Self::canvases(scene, clipper_node);
        for &(mask_node, id) in candidates.iter().rev() {
            if !scene.is_component_active(id) {
                continue;
            }
            if !Self::crosses_sorting_boundary(scene, &canvases, mask_node) {
                masks.push(id);
            }
        }
    }
}

/// Clippable-side link to the governing [`RectMask2D`].
///
/// Clippables keep one of these and call [`update`](Self::update) whenever
/// their clipping must be recalculated: on enable, on parent or canvas
/// hierarchy changes, and from [`Clippable::recalculate_clipping`](super::Clippable::recalculate_clipping).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClipParent {
    mask: Option<ComponentId>,
}

impl ClipParent {
    /// Not attached to any mask.
    pub fn new() -> Self {
        Self::default()
    }

    /// The governing mask.
    pub fn mask(&self) -> Option<ComponentId> {
        self.mask
    }

    /// Re-resolve the governing mask of the invoked clippable.
    ///
    /// Returns true if the clippable left its previous mask; it should then
    /// drop its clip rect and stop culling.
    pub fn update(&mut self, cx: &mut ComponentCx<'_>, maskable: bool) -> bool {
        let this = cx.id();
        let new_mask = if maskable && cx.is_active_and_enabled() {
            MaskUtilities::get_rect_mask_for_clippable(cx.scene(), cx.node())
        } else {
            None
        };
        let mut detached = false;
        if let Some(old) = self.mask
            && (new_mask != Some(old) || !cx.scene().is_component_active(old))
        {
            if let Some(mask) = cx.scene_mut().component_mut::<RectMask2D>(old) {
                mask.remove_clippable(this);
            }
            detached = true;
        }
        if let Some(new) = new_mask
            && let Some(mask) = cx.scene_mut().component_mut::<RectMask2D>(new)
        {
            mask.add_clippable(this);
        }
        self.mask = new_mask;
        detached
    }

    /// Leave the governing mask. Returns true if there was one.
    pub fn detach(&mut self, cx: &mut ComponentCx<'_>) -> bool {
        let this = cx.id();
        let Some(old) = self.mask.take() else {
            return false;
        };
        if let Some(mask) = cx.scene_mut().component_mut::<RectMask2D>(old) {
            mask.remove_clippable(this);
        }
        true
    }
}
