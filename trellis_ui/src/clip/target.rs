// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::{ClipParent, ClipRect, Clippable, MaskUtilities, Maskable};
use crate::component::{Capabilities, Component, ComponentId};
use crate::scene::ComponentCx;

/// Rectangular content that records how masks affect it.
///
/// Renderers read [`clip_rect`](Self::clip_rect), [`is_culled`](Self::is_culled),
/// and [`stencil_depth`](Self::stencil_depth) when drawing the node.
#[derive(Clone, Debug)]
pub struct ClipTarget {
    maskable: bool,
    parent: ClipParent,
    clip: ClipRect,
    culled: bool,
    moved: bool,
    stencil_depth: usize,
}

impl Default for ClipTarget {
    fn default() -> Self {
        Self {
            maskable: true,
            parent: ClipParent::new(),
            clip: ClipRect::INVALID,
            culled: false,
            moved: true,
            stencil_depth: 0,
        }
    }
}

impl ClipTarget {
    /// Maskable content with no clip.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether masks apply at all.
    pub fn maskable(&self) -> bool {
        self.maskable
    }

    /// Opt in or out of masking.
    pub fn set_maskable(&mut self, cx: &mut ComponentCx<'_>, maskable: bool) {
        if self.maskable != maskable {
            self.maskable = maskable;
            self.recalculate_clipping(cx);
            self.recalculate_masking(cx);
        }
    }

    /// Clip rect from the governing mask; invalid when there is none.
    pub fn clip_rect(&self) -> ClipRect {
        self.clip
    }

    /// True if a mask hides the content entirely.
    pub fn is_culled(&self) -> bool {
        self.culled
    }

    /// Number of stencil masks above, up to the sorting root.
    pub fn stencil_depth(&self) -> usize {
        self.stencil_depth
    }

    /// The rect mask currently clipping this content.
    pub fn governing_mask(&self) -> Option<ComponentId> {
        self.parent.mask()
    }

    /// Have the next clipping pass re-cull this content.
    pub fn mark_moved(&mut self) {
        self.moved = true;
    }

    fn release(&mut self) {
        self.clip = ClipRect::INVALID;
        self.culled = false;
    }
}

impl Clippable for ClipTarget {
    fn recalculate_clipping(&mut self, cx: &mut ComponentCx<'_>) {
        if self.parent.update(cx, self.maskable) {
            self.release();
        }
    }

    fn set_clip_rect(&mut self, _cx: &mut ComponentCx<'_>, clip: ClipRect) {
        self.clip = clip;
    }

    fn cull(&mut self, cx: &mut ComponentCx<'_>, clip: ClipRect) {
        self.culled = match MaskUtilities::canvas_rect(cx.scene(), cx.node()) {
            Some(bounds) => clip.culls(bounds),
            None => !clip.valid,
        };
        self.moved = false;
    }

    fn has_moved(&self) -> bool {
        self.moved
    }
}

impl Maskable for ClipTarget {
    fn recalculate_masking(&mut self, cx: &mut ComponentCx<'_>) {
        self.stencil_depth = if self.maskable && cx.is_active_and_enabled() {
            let scene = cx.scene();
            let root = MaskUtilities::find_root_sort_override_canvas(scene, cx.node());
            MaskUtilities::get_stencil_depth(scene, cx.node(), root)
        } else {
            0
        };
    }
}

impl Component for ClipTarget {
    fn capabilities(&self) -> Capabilities {
        Capabilities::CLIPPABLE | Capabilities::MASKABLE
    }

    fn as_clippable_mut(&mut self) -> Option<&mut dyn Clippable> {
        Some(self)
    }

    fn as_maskable_mut(&mut self) -> Option<&mut dyn Maskable> {
        Some(self)
    }

    fn on_enable(&mut self, cx: &mut ComponentCx<'_>) {
        self.moved = true;
        self.recalculate_clipping(cx);
        self.recalculate_masking(cx);
    }

    fn on_disable(&mut self, cx: &mut ComponentCx<'_>) {
        if self.parent.detach(cx) {
            self.release();
        }
        self.stencil_depth = 0;
    }

    fn on_rect_transform_dimensions_change(&mut self, _cx: &mut ComponentCx<'_>) {
        self.moved = true;
    }

    fn on_transform_parent_changed(&mut self, cx: &mut ComponentCx<'_>) {
        self.moved = true;
        self.recalculate_clipping(cx);
        self.recalculate_masking(cx);
    }

    fn on_canvas_hierarchy_changed(&mut self, cx: &mut ComponentCx<'_>) {
        self.recalculate_clipping(cx);
        self.recalculate_masking(cx);
    }
}
