// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Insets;
use trellis_tree::{Axis, DrivenProperties, DrivenTracker, NodeId};

use crate::component::Capabilities;
use crate::scene::ComponentCx;

/// Where leftover space goes when children do not fill a group.
///
/// Laid out row-major from the upper left, so `anchor as usize % 3` is the
/// horizontal slot and `anchor as usize / 3` the vertical one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    /// Top, left.
    #[default]
    UpperLeft = 0,
    /// Top, centered.
    UpperCenter = 1,
    /// Top, right.
    UpperRight = 2,
    /// Middle, left.
    MiddleLeft = 3,
    /// Middle, centered.
    MiddleCenter = 4,
    /// Middle, right.
    MiddleRight = 5,
    /// Bottom, left.
    LowerLeft = 6,
    /// Bottom, centered.
    LowerCenter = 7,
    /// Bottom, right.
    LowerRight = 8,
}

impl TextAnchor {
    /// Fraction of leftover space placed before the first child: `0`, `0.5`, or `1`.
    pub fn alignment_on_axis(self, axis: Axis) -> f64 {
        let a = self as u8;
        let slot = match axis {
            Axis::Horizontal => a % 3,
            Axis::Vertical => a / 3,
        };
        f64::from(slot) * 0.5
    }
}

/// State and helpers shared by every layout group.
///
/// Concrete groups embed this, forward their lifecycle hooks to it, and call
/// [`collect_children`](Self::collect_children) at the start of their
/// horizontal calculation.
#[derive(Clone, Debug, Default)]
pub struct LayoutGroupCore {
    /// Space kept free inside the group's rect. `x0` is left, `y0` top,
    /// `x1` right, `y1` bottom.
    pub padding: Insets,
    /// Placement of leftover space.
    pub child_alignment: TextAnchor,
    tracker: DrivenTracker,
    rect_children: Vec<NodeId>,
    total_min: [f64; 2],
    total_preferred: [f64; 2],
    total_flexible: [f64; 2],
}

impl LayoutGroupCore {
    /// Core with no padding and upper-left alignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Children taking part in the current rebuild.
    pub fn rect_children(&self) -> &[NodeId] {
        &self.rect_children
    }

    /// Gather active children that no ignorer removes, and release every
    /// property driven in the previous rebuild.
    ///
    /// A child is ignored only if it has ignorers and all of them ask to be ignored.
    pub fn collect_children(&mut self, cx: &mut ComponentCx<'_>) {
        self.rect_children.clear();
        let scene = cx.scene();
        for &child in scene.tree().children(cx.node()) {
            if !scene.tree().is_active_in_hierarchy(child) {
                continue;
            }
            let mut ignorers = scene
                .components()
                .with_capabilities(child, Capabilities::LAYOUT_IGNORER)
                .filter_map(|id| scene.components().get(id))
                .filter_map(|c| c.as_layout_ignorer())
                .peekable();
            let included =
                ignorers.peek().is_none() || ignorers.any(|ignorer| !ignorer.ignore_layout());
            if included {
                self.rect_children.push(child);
            }
        }
        self.tracker.clear(cx.tree_mut());
    }

    /// Aggregate minimum size along `axis`.
    pub fn total_min_size(&self, axis: Axis) -> f64 {
        self.total_min[axis.index()]
    }

    /// Aggregate preferred size along `axis`.
    pub fn total_preferred_size(&self, axis: Axis) -> f64 {
        self.total_preferred[axis.index()]
    }

    /// Aggregate flexible size along `axis`.
    pub fn total_flexible_size(&self, axis: Axis) -> f64 {
        self.total_flexible[axis.index()]
    }

    /// Store the aggregate sizes for `axis`.
    pub fn set_layout_input_for_axis(
        &mut self,
        total_min: f64,
        total_preferred: f64,
        total_flexible: f64,
        axis: Axis,
    ) {
        let i = axis.index();
        self.total_min[i] = total_min;
        self.total_preferred[i] = total_preferred;
        self.total_flexible[i] = total_flexible;
    }

    /// Combined padding along `axis`.
    pub fn padding_along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.padding.x0 + self.padding.x1,
            Axis::Vertical => self.padding.y0 + self.padding.y1,
        }
    }

    /// Leading padding along `axis` (left or top).
    pub fn padding_start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.padding.x0,
            Axis::Vertical => self.padding.y0,
        }
    }

    /// Alignment fraction along `axis`.
    pub fn alignment_on_axis(&self, axis: Axis) -> f64 {
        self.child_alignment.alignment_on_axis(axis)
    }

    /// Offset of the first child when the children need
    /// `required_without_padding` along `axis`.
    pub fn start_offset(
        &self,
        cx: &ComponentCx<'_>,
        axis: Axis,
        required_without_padding: f64,
    ) -> f64 {
        let required = required_without_padding + self.padding_along(axis);
        let available = axis.of_size(cx.tree().size(cx.node()));
        let surplus = available - required;
        self.padding_start(axis) + surplus * self.alignment_on_axis(axis)
    }

    /// Place `child` at `pos` along `axis`, leaving its size alone.
    pub fn set_child_along_axis(
        &mut self,
        cx: &mut ComponentCx<'_>,
        child: NodeId,
        axis: Axis,
        pos: f64,
    ) {
        let tree = cx.tree_mut();
        self.tracker
            .add(tree, child, DrivenProperties::position(axis));
        tree.set_position_along_axis(child, axis, pos);
    }

    /// Place `child` at `pos` along `axis` and give it `size`.
    pub fn set_child_along_axis_with_size(
        &mut self,
        cx: &mut ComponentCx<'_>,
        child: NodeId,
        axis: Axis,
        pos: f64,
        size: f64,
    ) {
        let tree = cx.tree_mut();
        self.tracker.add(
            tree,
            child,
            DrivenProperties::position(axis) | DrivenProperties::size(axis),
        );
        tree.set_position_along_axis(child, axis, pos);
        tree.set_size_along_axis(child, axis, size);
    }

    /// True if the parent carries no layout group.
    pub fn is_root_layout_group(cx: &ComponentCx<'_>) -> bool {
        let scene = cx.scene();
        scene.tree().parent(cx.node()).is_none_or(|p| {
            scene
                .components()
                .with_capabilities(p, Capabilities::LAYOUT_GROUP)
                .next()
                .is_none()
        })
    }

    /// Queue a rebuild if the group is active.
    pub fn set_dirty(cx: &mut ComponentCx<'_>) {
        if cx.is_active_and_enabled() {
            cx.mark_layout_for_rebuild();
        }
    }

    /// Change the padding, rebuilding if it differs.
    pub fn set_padding(&mut self, cx: &mut ComponentCx<'_>, padding: Insets) {
        if self.padding != padding {
            self.padding = padding;
            Self::set_dirty(cx);
        }
    }

    /// Change the child alignment, rebuilding if it differs.
    pub fn set_child_alignment(&mut self, cx: &mut ComponentCx<'_>, anchor: TextAnchor) {
        if self.child_alignment != anchor {
            self.child_alignment = anchor;
            Self::set_dirty(cx);
        }
    }

    // Hooks, forwarded by the concrete groups.

    pub(crate) fn on_enable(&mut self, cx: &mut ComponentCx<'_>) {
        Self::set_dirty(cx);
    }

    pub(crate) fn on_disable(&mut self, cx: &mut ComponentCx<'_>) {
        self.tracker.clear_and_revert(cx.tree_mut());
        cx.mark_layout_for_rebuild();
    }

    pub(crate) fn on_rect_transform_dimensions_change(&mut self, cx: &mut ComponentCx<'_>) {
        if Self::is_root_layout_group(cx) {
            Self::set_dirty(cx);
        }
    }

    pub(crate) fn on_transform_children_changed(&mut self, cx: &mut ComponentCx<'_>) {
        Self::set_dirty(cx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_alignment_fractions() {
        assert_eq!(TextAnchor::UpperLeft.alignment_on_axis(Axis::Horizontal), 0.0);
        assert_eq!(TextAnchor::MiddleCenter.alignment_on_axis(Axis::Horizontal), 0.5);
        assert_eq!(TextAnchor::MiddleCenter.alignment_on_axis(Axis::Vertical), 0.5);
        assert_eq!(TextAnchor::LowerLeft.alignment_on_axis(Axis::Vertical), 1.0);
        assert_eq!(TextAnchor::UpperRight.alignment_on_axis(Axis::Horizontal), 1.0);
        assert_eq!(TextAnchor::UpperRight.alignment_on_axis(Axis::Vertical), 0.0);
    }

    #[test]
    fn padding_helpers_split_insets_by_axis() {
        let core = LayoutGroupCore {
            padding: Insets::new(1.0, 2.0, 3.0, 4.0),
            ..LayoutGroupCore::new()
        };
        assert_eq!(core.padding_along(Axis::Horizontal), 4.0);
        assert_eq!(core.padding_along(Axis::Vertical), 6.0);
        assert_eq!(core.padding_start(Axis::Horizontal), 1.0);
        assert_eq!(core.padding_start(Axis::Vertical), 2.0);
    }
}
