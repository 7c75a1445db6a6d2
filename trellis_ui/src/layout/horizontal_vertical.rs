// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use trellis_tree::{Axis, NodeId};

use super::{LayoutController, LayoutElement, LayoutGroupCore, LayoutUtility};
use crate::component::{Capabilities, Component};
use crate::scene::ComponentCx;

/// Lays children out in a single row or column.
///
/// Along the layout axis children are placed one after another with `spacing`
/// between them; along the other axis each child is aligned on its own.
#[derive(Clone, Debug)]
pub struct HorizontalOrVerticalLayoutGroup {
    /// Padding and alignment.
    pub core: LayoutGroupCore,
    /// Gap between neighbors along the layout axis.
    pub spacing: f64,
    /// Give every child a flexible size of at least 1 horizontally.
    pub child_force_expand_width: bool,
    /// Give every child a flexible size of at least 1 vertically.
    pub child_force_expand_height: bool,
    /// Drive child widths.
    pub child_control_width: bool,
    /// Drive child heights.
    pub child_control_height: bool,
    /// Account for child scale horizontally.
    pub child_scale_width: bool,
    /// Account for child scale vertically.
    pub child_scale_height: bool,
    /// Place children last to first.
    pub reverse_arrangement: bool,
    is_vertical: bool,
}

#[derive(Copy, Clone, Debug)]
struct ChildSizes {
    min: f64,
    preferred: f64,
    flexible: f64,
}

impl HorizontalOrVerticalLayoutGroup {
    fn new(is_vertical: bool) -> Self {
        Self {
            core: LayoutGroupCore::new(),
            spacing: 0.0,
            child_force_expand_width: true,
            child_force_expand_height: true,
            child_control_width: true,
            child_control_height: true,
            child_scale_width: false,
            child_scale_height: false,
            reverse_arrangement: false,
            is_vertical,
        }
    }

    /// A row.
    pub fn horizontal() -> Self {
        Self::new(false)
    }

    /// A column.
    pub fn vertical() -> Self {
        Self::new(true)
    }

    /// True for a column.
    pub fn is_vertical(&self) -> bool {
        self.is_vertical
    }

    /// Change the spacing, rebuilding if it differs.
    pub fn set_spacing(&mut self, cx: &mut ComponentCx<'_>, spacing: f64) {
        if self.spacing != spacing {
            self.spacing = spacing;
            LayoutGroupCore::set_dirty(cx);
        }
    }

    /// Change whether children are placed last to first.
    pub fn set_reverse_arrangement(&mut self, cx: &mut ComponentCx<'_>, reverse: bool) {
        if self.reverse_arrangement != reverse {
            self.reverse_arrangement = reverse;
            LayoutGroupCore::set_dirty(cx);
        }
    }

    /// Change whether child sizes along `axis` are driven.
    pub fn set_child_control_size(&mut self, cx: &mut ComponentCx<'_>, axis: Axis, control: bool) {
        let field = match axis {
            Axis::Horizontal => &mut self.child_control_width,
            Axis::Vertical => &mut self.child_control_height,
        };
        if *field != control {
            *field = control;
            LayoutGroupCore::set_dirty(cx);
        }
    }

    /// Change whether children expand along `axis`.
    pub fn set_child_force_expand(&mut self, cx: &mut ComponentCx<'_>, axis: Axis, expand: bool) {
        let field = match axis {
            Axis::Horizontal => &mut self.child_force_expand_width,
            Axis::Vertical => &mut self.child_force_expand_height,
        };
        if *field != expand {
            *field = expand;
            LayoutGroupCore::set_dirty(cx);
        }
    }

    fn control_size(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.child_control_width,
            Axis::Vertical => self.child_control_height,
        }
    }

    fn force_expand(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.child_force_expand_width,
            Axis::Vertical => self.child_force_expand_height,
        }
    }

    fn use_scale(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.child_scale_width,
            Axis::Vertical => self.child_scale_height,
        }
    }

    fn along_other_axis(&self, axis: Axis) -> bool {
        self.is_vertical ^ (axis == Axis::Vertical)
    }

    fn child_sizes(&self, cx: &ComponentCx<'_>, child: NodeId, axis: Axis) -> ChildSizes {
        let mut sizes = if self.control_size(axis) {
            let scene = cx.scene();
            ChildSizes {
                min: LayoutUtility::min_size(scene, child, axis),
                preferred: LayoutUtility::preferred_size(scene, child, axis),
                flexible: LayoutUtility::flexible_size(scene, child, axis),
            }
        } else {
            let current = axis.of_size(cx.tree().size(child));
            ChildSizes {
                min: current,
                preferred: current,
                flexible: 0.0,
            }
        };
        if self.force_expand(axis) {
            sizes.flexible = sizes.flexible.max(1.0);
        }
        sizes
    }

    fn scale_factor(&self, cx: &ComponentCx<'_>, child: NodeId, axis: Axis) -> f64 {
        if self.use_scale(axis) {
            axis.of_vec(cx.tree().scale(child))
        } else {
            1.0
        }
    }

    fn ordered_children(&self) -> Vec<NodeId> {
        let mut children = self.core.rect_children().to_vec();
        if self.reverse_arrangement {
            children.reverse();
        }
        children
    }

    /// Aggregate the children's sizes along `axis`.
    fn calc_along_axis(&mut self, cx: &ComponentCx<'_>, axis: Axis) {
        let combined_padding = self.core.padding_along(axis);
        let along_other_axis = self.along_other_axis(axis);

        let mut total_min = combined_padding;
        let mut total_preferred = combined_padding;
        let mut total_flexible = 0.0_f64;

        let children = self.core.rect_children();
        for &child in children {
            let ChildSizes {
                mut min,
                mut preferred,
                mut flexible,
            } = self.child_sizes(cx, child, axis);
            if self.use_scale(axis) {
                let scale = axis.of_vec(cx.tree().scale(child));
                min *= scale;
                preferred *= scale;
                flexible *= scale;
            }
            if along_other_axis {
                total_min = total_min.max(min + combined_padding);
                total_preferred = total_preferred.max(preferred + combined_padding);
                total_flexible = total_flexible.max(flexible);
            } else {
                total_min += min + self.spacing;
                total_preferred += preferred + self.spacing;
                total_flexible += flexible;
            }
        }
        if !along_other_axis && !children.is_empty() {
            total_min -= self.spacing;
            total_preferred -= self.spacing;
        }
        total_preferred = total_preferred.max(total_min);
        self.core
            .set_layout_input_for_axis(total_min, total_preferred, total_flexible, axis);
    }

    /// Position (and optionally size) the children along `axis`.
    fn set_children_along_axis(&mut self, cx: &mut ComponentCx<'_>, axis: Axis) {
        let size = axis.of_size(cx.tree().size(cx.node()));
        let control_size = self.control_size(axis);
        let alignment = self.core.alignment_on_axis(axis);
        let children = self.ordered_children();

        if self.along_other_axis(axis) {
            let inner_size = size - self.core.padding_along(axis);
            for child in children {
                let sizes = self.child_sizes(cx, child, axis);
                let scale = self.scale_factor(cx, child, axis);
                let upper = if sizes.flexible > 0.0 {
                    size
                } else {
                    sizes.preferred
                };
                let required = clamp(inner_size, sizes.min, upper);
                let start = self.core.start_offset(cx, axis, required * scale);
                if control_size {
                    self.core
                        .set_child_along_axis_with_size(cx, child, axis, start, required);
                } else {
                    let current = axis.of_size(cx.tree().size(child));
                    let offset_in_cell = (required - current) * alignment;
                    self.core
                        .set_child_along_axis(cx, child, axis, start + offset_in_cell);
                }
            }
            return;
        }

        let mut pos = self.core.padding_start(axis);
        let mut item_flexible_multiplier = 0.0;
        let total_min = self.core.total_min_size(axis);
        let total_preferred = self.core.total_preferred_size(axis);
        let total_flexible = self.core.total_flexible_size(axis);
        let surplus = size - total_preferred;
        if surplus > 0.0 {
            if total_flexible == 0.0 {
                pos = self.core.start_offset(
                    cx,
                    axis,
                    total_preferred - self.core.padding_along(axis),
                );
            } else if total_flexible > 0.0 {
                item_flexible_multiplier = surplus / total_flexible;
            }
        }
        let min_max_lerp = if total_min != total_preferred {
            ((size - total_min) / (total_preferred - total_min)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        for child in children {
            let sizes = self.child_sizes(cx, child, axis);
            let scale = self.scale_factor(cx, child, axis);
            let mut child_size = sizes.min + (sizes.preferred - sizes.min) * min_max_lerp;
            child_size += sizes.flexible * item_flexible_multiplier;
            if control_size {
                self.core
                    .set_child_along_axis_with_size(cx, child, axis, pos, child_size);
            } else {
                let current = axis.of_size(cx.tree().size(child));
                let offset_in_cell = (child_size - current) * alignment;
                self.core
                    .set_child_along_axis(cx, child, axis, pos + offset_in_cell);
            }
            pos += child_size * scale + self.spacing;
        }
    }
}

// Lower bound wins when the bounds cross.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

impl LayoutElement for HorizontalOrVerticalLayoutGroup {
    fn calculate_layout_input_horizontal(&mut self, cx: &mut ComponentCx<'_>) {
        self.core.collect_children(cx);
        self.calc_along_axis(cx, Axis::Horizontal);
    }

    fn calculate_layout_input_vertical(&mut self, cx: &mut ComponentCx<'_>) {
        self.calc_along_axis(cx, Axis::Vertical);
    }

    fn min_size(&self, axis: Axis) -> f64 {
        self.core.total_min_size(axis)
    }

    fn preferred_size(&self, axis: Axis) -> f64 {
        self.core.total_preferred_size(axis)
    }

    fn flexible_size(&self, axis: Axis) -> f64 {
        self.core.total_flexible_size(axis)
    }
}

impl LayoutController for HorizontalOrVerticalLayoutGroup {
    fn set_layout_horizontal(&mut self, cx: &mut ComponentCx<'_>) {
        self.set_children_along_axis(cx, Axis::Horizontal);
    }

    fn set_layout_vertical(&mut self, cx: &mut ComponentCx<'_>) {
        self.set_children_along_axis(cx, Axis::Vertical);
    }
}

impl Component for HorizontalOrVerticalLayoutGroup {
    fn capabilities(&self) -> Capabilities {
        Capabilities::LAYOUT_GROUP_ALL
    }

    fn as_layout_element(&self) -> Option<&dyn LayoutElement> {
        Some(self)
    }

    fn as_layout_element_mut(&mut self) -> Option<&mut dyn LayoutElement> {
        Some(self)
    }

    fn as_layout_controller_mut(&mut self) -> Option<&mut dyn LayoutController> {
        Some(self)
    }

    fn on_enable(&mut self, cx: &mut ComponentCx<'_>) {
        self.core.on_enable(cx);
    }

    fn on_disable(&mut self, cx: &mut ComponentCx<'_>) {
        self.core.on_disable(cx);
    }

    fn on_rect_transform_dimensions_change(&mut self, cx: &mut ComponentCx<'_>) {
        self.core.on_rect_transform_dimensions_change(cx);
    }

    fn on_transform_children_changed(&mut self, cx: &mut ComponentCx<'_>) {
        self.core.on_transform_children_changed(cx);
    }
}
