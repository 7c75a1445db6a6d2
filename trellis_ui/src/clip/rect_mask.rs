// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use indexmap::IndexSet;
use kurbo::{Insets, Rect};
use log::trace;
use trellis_tree::NodeId;

use super::clipping::overlaps;
use super::{ClipRect, Clipper, Clipping, MaskUtilities};
use crate::component::{Capabilities, Component, ComponentId};
use crate::scene::{ComponentCx, Scene};

/// Clips the content below it to its rect, intersected with the rect masks
/// above it.
///
/// Clippables attach themselves through [`ClipParent`](super::ClipParent).
/// Each frame the mask recomputes its compound rect and pushes it to them
/// when it changed.
#[derive(Clone, Debug)]
pub struct RectMask2D {
    padding: Insets,
    targets: IndexSet<ComponentId>,
    clippers: Vec<ComponentId>,
    should_recalculate: bool,
    last_clip_rect: ClipRect,
    force_clip: bool,
}

impl Default for RectMask2D {
    fn default() -> Self {
        Self {
            padding: Insets::ZERO,
            targets: IndexSet::new(),
            clippers: Vec::new(),
            should_recalculate: true,
            last_clip_rect: ClipRect::INVALID,
            force_clip: false,
        }
    }
}

impl RectMask2D {
    /// A mask with no padding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_padding`](Self::set_padding).
    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    /// Space removed from each side of the node's rect.
    pub fn padding(&self) -> Insets {
        self.padding
    }

    /// Change the padding and have clippables below re-attach.
    pub fn set_padding(&mut self, cx: &mut ComponentCx<'_>, padding: Insets) {
        self.padding = padding;
        cx.notify_2d_mask_state_changed();
    }

    /// Clippables currently attached.
    pub fn targets(&self) -> impl ExactSizeIterator<Item = ComponentId> + '_ {
        self.targets.iter().copied()
    }

    /// Masks this one composed with in the last clipping pass, topmost first.
    pub fn mask_chain(&self) -> &[ComponentId] {
        &self.clippers
    }

    /// Clip rect pushed in the last clipping pass.
    pub fn last_clip_rect(&self) -> ClipRect {
        self.last_clip_rect
    }

    /// Attach a clippable. Its clip rect is pushed on the next pass.
    pub fn add_clippable(&mut self, clippable: ComponentId) {
        self.should_recalculate = true;
        self.targets.insert(clippable);
        self.force_clip = true;
    }

    /// Detach a clippable.
    pub fn remove_clippable(&mut self, clippable: ComponentId) {
        self.should_recalculate = true;
        self.targets.swap_remove(&clippable);
        self.force_clip = true;
    }

    /// The padded rect of a mask on `node` in the space of its root canvas.
    pub fn canvas_rect(&self, scene: &Scene, node: NodeId) -> Option<Rect> {
        Some(MaskUtilities::canvas_rect(scene, node)? - self.padding)
    }

    pub(crate) fn invalidate_mask_chain(&mut self) {
        self.should_recalculate = true;
    }

    fn compound_clip_rect(&self, cx: &ComponentCx<'_>, root_canvas: NodeId) -> ClipRect {
        let scene = cx.scene();
        let rects = self.clippers.iter().filter_map(|&id| {
            let node = scene.components().node_of(id)?;
            let padding = if id == cx.id() {
                self.padding
            } else {
                scene.component::<Self>(id)?.padding
            };
            Some(scene.tree().rect_relative_to(node, root_canvas) - padding)
        });
        let clip = Clipping::find_cull_and_clip_world_rect(rects);
        if scene.config().cull_masks_outside_root_canvas {
            let size = scene.tree().size(root_canvas);
            let canvas = Rect::new(0.0, 0.0, size.width, size.height);
            if !overlaps(clip.rect, canvas) {
                return ClipRect::INVALID;
            }
        }
        clip
    }
}

impl Clipper for RectMask2D {
    fn perform_clipping(&mut self, cx: &mut ComponentCx<'_>) {
        let node = cx.node();
        let Some(root_canvas) = MaskUtilities::root_canvas(cx.scene(), node) else {
            return;
        };
        if self.should_recalculate {
            MaskUtilities::get_rect_masks_for_clip(cx.scene(), node, &mut self.clippers);
            self.should_recalculate = false;
        }

        let clip = self.compound_clip_rect(cx, root_canvas);
        let changed = clip != self.last_clip_rect;
        let push = changed || self.force_clip;
        if changed {
            trace!("clip rect of {node:?} changed to {clip:?}");
        }
        let targets: Vec<_> = self.targets.iter().copied().collect();
        let scene = cx.scene_mut();
        for target in targets {
            scene.with_component(target, |c, tcx| {
                let Some(clippable) = c.as_clippable_mut() else {
                    return;
                };
                if push {
                    clippable.set_clip_rect(tcx, clip);
                }
                if changed || clippable.has_moved() {
                    clippable.cull(tcx, clip);
                }
            });
        }
        self.last_clip_rect = clip;
        self.force_clip = false;
    }
}

impl Component for RectMask2D {
    fn capabilities(&self) -> Capabilities {
        Capabilities::CLIPPER
    }

    fn as_clipper_mut(&mut self) -> Option<&mut dyn Clipper> {
        Some(self)
    }

    fn on_enable(&mut self, cx: &mut ComponentCx<'_>) {
        self.should_recalculate = true;
        let id = cx.id();
        cx.scene_mut().clippers.register(id);
        cx.notify_2d_mask_state_changed();
    }

    fn on_disable(&mut self, cx: &mut ComponentCx<'_>) {
        self.targets.clear();
        self.clippers.clear();
        let id = cx.id();
        cx.scene_mut().clippers.unregister(id);
        cx.notify_2d_mask_state_changed();
    }

    fn on_transform_parent_changed(&mut self, _cx: &mut ComponentCx<'_>) {
        self.should_recalculate = true;
    }

    fn on_canvas_hierarchy_changed(&mut self, _cx: &mut ComponentCx<'_>) {
        self.should_recalculate = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::clip::ClipTarget;
    use kurbo::{Point, Size};
    use trellis_tree::LocalRect;

    fn at(x: f64, y: f64, w: f64, h: f64) -> LocalRect {
        LocalRect::new(Point::new(x, y), Size::new(w, h))
    }

    struct Fixture {
        scene: Scene,
        canvas: NodeId,
        mask_node: NodeId,
        mask: ComponentId,
        content: NodeId,
        target: ComponentId,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::default();
        let canvas = scene.create_node(None, LocalRect::sized(400.0, 300.0));
        scene.add_component(canvas, Canvas::new());
        let mask_node = scene.create_node(Some(canvas), at(100.0, 50.0, 100.0, 80.0));
        let mask = scene
            .add_component(mask_node, RectMask2D::new())
            .expect("node is alive");
        let content = scene.create_node(Some(mask_node), at(10.0, 10.0, 20.0, 20.0));
        let target = scene
            .add_component(content, ClipTarget::new())
            .expect("node is alive");
        Fixture {
            scene,
            canvas,
            mask_node,
            mask,
            content,
            target,
        }
    }

    fn target(f: &Fixture) -> &ClipTarget {
        f.scene.component::<ClipTarget>(f.target).expect("target attached")
    }

    #[test]
    fn pushes_its_canvas_rect_to_attached_content() {
        let mut f = fixture();
        assert!(f.scene.clipper_registry().contains(f.mask));
        assert_eq!(target(&f).governing_mask(), Some(f.mask));
        f.scene.update();
        let expected = ClipRect::new(Rect::new(100.0, 50.0, 200.0, 130.0));
        assert_eq!(target(&f).clip_rect(), expected);
        assert!(!target(&f).is_culled());
        let mask = f.scene.component::<RectMask2D>(f.mask).expect("mask attached");
        assert_eq!(mask.last_clip_rect(), expected);
        assert_eq!(mask.mask_chain(), &[f.mask]);
        assert_eq!(mask.targets().collect::<Vec<_>>(), vec![f.target]);
    }

    #[test]
    fn padding_shrinks_the_clip_rect() {
        let mut f = fixture();
        let mask = f.mask;
        f.scene.update_component::<RectMask2D, _>(mask, |m, cx| {
            m.set_padding(cx, Insets::new(5.0, 10.0, 15.0, 20.0));
        });
        f.scene.update();
        assert_eq!(
            target(&f).clip_rect(),
            ClipRect::new(Rect::new(105.0, 60.0, 185.0, 110.0))
        );
    }

    #[test]
    fn nested_masks_intersect_their_rects() {
        let mut f = fixture();
        let inner = f.scene.create_node(Some(f.mask_node), at(50.0, 40.0, 100.0, 100.0));
        let inner_mask = f
            .scene
            .add_component(inner, RectMask2D::new())
            .expect("node is alive");
        f.scene
            .set_parent(f.content, Some(inner))
            .expect("valid reparent");
        f.scene.update();
        assert_eq!(target(&f).governing_mask(), Some(inner_mask));
        // Outer spans 100..200 x 50..130, inner 150..250 x 90..190.
        assert_eq!(
            target(&f).clip_rect(),
            ClipRect::new(Rect::new(150.0, 90.0, 200.0, 130.0))
        );
        let chain = f
            .scene
            .component::<RectMask2D>(inner_mask)
            .expect("mask attached")
            .mask_chain()
            .to_vec();
        assert_eq!(chain, vec![f.mask, inner_mask]);
    }

    #[test]
    fn content_outside_the_clip_rect_is_culled() {
        let mut f = fixture();
        f.scene.set_position(f.content, Point::new(150.0, 10.0));
        f.scene.update();
        assert!(target(&f).is_culled());
    }

    #[test]
    fn unmoved_content_skips_culling_while_the_rect_is_stable() {
        let mut f = fixture();
        f.scene.update();
        assert!(!target(&f).is_culled());

        // Moved without notice: the next pass neither sees a rect change nor a move.
        f.scene.tree_mut().set_position(f.content, Point::new(150.0, 10.0));
        f.scene.update();
        assert!(!target(&f).is_culled());

        let id = f.target;
        f.scene
            .update_component::<ClipTarget, _>(id, |t, _| t.mark_moved());
        f.scene.update();
        assert!(target(&f).is_culled());
    }

    #[test]
    fn a_changed_rect_always_reculls() {
        let mut f = fixture();
        f.scene.update();
        f.scene.tree_mut().set_position(f.content, Point::new(150.0, 10.0));
        // Widening the mask changes the rect; culling runs despite no move.
        f.scene.set_size(f.mask_node, Size::new(120.0, 80.0));
        f.scene.update();
        assert_eq!(
            target(&f).clip_rect(),
            ClipRect::new(Rect::new(100.0, 50.0, 220.0, 130.0))
        );
        assert!(target(&f).is_culled());
    }

    #[test]
    fn masks_outside_the_root_canvas_clip_everything() {
        let mut f = fixture();
        f.scene.set_position(f.mask_node, Point::new(500.0, 0.0));
        f.scene.update();
        assert_eq!(target(&f).clip_rect(), ClipRect::INVALID);
        assert!(target(&f).is_culled());
    }

    #[test]
    fn disabling_the_mask_releases_its_content() {
        let mut f = fixture();
        f.scene.update();
        f.scene.set_component_enabled(f.mask, false);
        assert!(!f.scene.clipper_registry().contains(f.mask));
        assert_eq!(target(&f).governing_mask(), None);
        assert_eq!(target(&f).clip_rect(), ClipRect::INVALID);
        assert!(!target(&f).is_culled());

        f.scene.set_component_enabled(f.mask, true);
        assert_eq!(target(&f).governing_mask(), Some(f.mask));
        f.scene.update();
        assert_eq!(
            target(&f).clip_rect(),
            ClipRect::new(Rect::new(100.0, 50.0, 200.0, 130.0))
        );
    }

    #[test]
    fn a_mask_without_a_canvas_does_nothing() {
        let mut f = fixture();
        f.scene.update();
        let canvas_component = f
            .scene
            .components()
            .of_type::<Canvas>(f.canvas)
            .next()
            .expect("canvas attached");
        f.scene.set_component_enabled(canvas_component, false);
        f.scene.set_size(f.mask_node, Size::new(10.0, 10.0));
        f.scene.update();
        // The previous rect stays in place.
        assert_eq!(
            target(&f).clip_rect(),
            ClipRect::new(Rect::new(100.0, 50.0, 200.0, 130.0))
        );
    }

    #[test]
    fn override_sorting_canvas_breaks_composition() {
        let mut f = fixture();
        let sub_canvas = f.scene.create_node(Some(f.mask_node), at(0.0, 0.0, 300.0, 300.0));
        let canvas_id = f
            .scene
            .add_component(sub_canvas, Canvas::new().with_override_sorting(true))
            .expect("node is alive");
        let inner = f.scene.create_node(Some(sub_canvas), at(50.0, 40.0, 100.0, 100.0));
        let inner_mask = f
            .scene
            .add_component(inner, RectMask2D::new())
            .expect("node is alive");
        f.scene.update();
        let chain = |f: &Fixture| {
            f.scene
                .component::<RectMask2D>(inner_mask)
                .expect("mask attached")
                .mask_chain()
                .to_vec()
        };
        assert_eq!(chain(&f), vec![inner_mask]);

        // Without the override the outer mask composes again.
        f.scene
            .update_component::<Canvas, _>(canvas_id, |c, cx| c.set_override_sorting(cx, false));
        f.scene.update();
        assert_eq!(chain(&f), vec![f.mask, inner_mask]);
    }
}
