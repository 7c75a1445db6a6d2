// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use trellis_tree::Axis;

use super::{LayoutElement, LayoutGroupCore, LayoutIgnorer};
use crate::component::{Capabilities, Component};
use crate::scene::ComponentCx;

/// Hand-set layout sizes that override what other elements on the node report.
///
/// Negative sizes mean "unset". The default priority of 1 outranks elements
/// that keep the default of 0.
#[derive(Clone, Debug)]
pub struct ManualLayoutElement {
    /// Take the node out of its parent group.
    pub ignore_layout: bool,
    /// Minimum width and height.
    pub min: [f64; 2],
    /// Preferred width and height.
    pub preferred: [f64; 2],
    /// Flexible width and height.
    pub flexible: [f64; 2],
    /// Priority against other elements on the node.
    pub layout_priority: i32,
}

impl Default for ManualLayoutElement {
    fn default() -> Self {
        Self {
            ignore_layout: false,
            min: [-1.0; 2],
            preferred: [-1.0; 2],
            flexible: [-1.0; 2],
            layout_priority: 1,
        }
    }
}

impl ManualLayoutElement {
    /// Everything unset, priority 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of the preferred size.
    pub fn with_preferred(mut self, width: f64, height: f64) -> Self {
        self.preferred = [width, height];
        self
    }

    /// Builder form of the flexible size.
    pub fn with_flexible(mut self, width: f64, height: f64) -> Self {
        self.flexible = [width, height];
        self
    }

    /// Builder form of the minimum size.
    pub fn with_min(mut self, width: f64, height: f64) -> Self {
        self.min = [width, height];
        self
    }

    /// Change `ignore_layout`, rebuilding if it differs.
    pub fn set_ignore_layout(&mut self, cx: &mut ComponentCx<'_>, ignore: bool) {
        if self.ignore_layout != ignore {
            self.ignore_layout = ignore;
            LayoutGroupCore::set_dirty(cx);
        }
    }

    /// Change the minimum size along `axis`.
    pub fn set_min_size(&mut self, cx: &mut ComponentCx<'_>, axis: Axis, value: f64) {
        Self::set_value(cx, &mut self.min[axis.index()], value);
    }

    /// Change the preferred size along `axis`.
    pub fn set_preferred_size(&mut self, cx: &mut ComponentCx<'_>, axis: Axis, value: f64) {
        Self::set_value(cx, &mut self.preferred[axis.index()], value);
    }

    /// Change the flexible size along `axis`.
    pub fn set_flexible_size(&mut self, cx: &mut ComponentCx<'_>, axis: Axis, value: f64) {
        Self::set_value(cx, &mut self.flexible[axis.index()], value);
    }

    /// Change the priority.
    pub fn set_layout_priority(&mut self, cx: &mut ComponentCx<'_>, priority: i32) {
        if self.layout_priority != priority {
            self.layout_priority = priority;
            LayoutGroupCore::set_dirty(cx);
        }
    }

    fn set_value(cx: &mut ComponentCx<'_>, slot: &mut f64, value: f64) {
        if *slot != value {
            *slot = value;
            LayoutGroupCore::set_dirty(cx);
        }
    }
}

impl LayoutElement for ManualLayoutElement {
    fn min_size(&self, axis: Axis) -> f64 {
        self.min[axis.index()]
    }

    fn preferred_size(&self, axis: Axis) -> f64 {
        self.preferred[axis.index()]
    }

    fn flexible_size(&self, axis: Axis) -> f64 {
        self.flexible[axis.index()]
    }

    fn layout_priority(&self) -> i32 {
        self.layout_priority
    }
}

impl LayoutIgnorer for ManualLayoutElement {
    fn ignore_layout(&self) -> bool {
        self.ignore_layout
    }
}

impl Component for ManualLayoutElement {
    fn capabilities(&self) -> Capabilities {
        Capabilities::LAYOUT_ELEMENT | Capabilities::LAYOUT_IGNORER
    }

    fn as_layout_element(&self) -> Option<&dyn LayoutElement> {
        Some(self)
    }

    fn as_layout_element_mut(&mut self) -> Option<&mut dyn LayoutElement> {
        Some(self)
    }

    fn as_layout_ignorer(&self) -> Option<&dyn LayoutIgnorer> {
        Some(self)
    }

    fn on_enable(&mut self, cx: &mut ComponentCx<'_>) {
        LayoutGroupCore::set_dirty(cx);
    }

    // Runs after the flag is cleared, so the group is marked directly.
    fn on_disable(&mut self, cx: &mut ComponentCx<'_>) {
        cx.mark_layout_for_rebuild();
    }

    fn on_before_transform_parent_changed(&mut self, cx: &mut ComponentCx<'_>) {
        LayoutGroupCore::set_dirty(cx);
    }

    fn on_transform_parent_changed(&mut self, cx: &mut ComponentCx<'_>) {
        LayoutGroupCore::set_dirty(cx);
    }
}
