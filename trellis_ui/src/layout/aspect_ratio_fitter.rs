// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Size};
use log::debug;
use trellis_tree::{Axis, DrivenProperties, DrivenTracker};

use super::{LayoutController, LayoutGroupCore};
use crate::canvas::Canvas;
use crate::component::{Capabilities, Component};
use crate::scene::ComponentCx;

/// How an [`AspectRatioFitter`] enforces its ratio.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AspectMode {
    /// Do nothing.
    #[default]
    None,
    /// Height follows width.
    WidthControlsHeight,
    /// Width follows height.
    HeightControlsWidth,
    /// Largest rect of the ratio inside the parent, centered.
    FitInParent,
    /// Smallest rect of the ratio covering the parent, centered.
    EnvelopeParent,
}

impl AspectMode {
    fn needs_parent(self) -> bool {
        matches!(self, Self::FitInParent | Self::EnvelopeParent)
    }
}

const MIN_RATIO: f64 = 0.001;
const MAX_RATIO: f64 = 1000.0;

/// Keeps its node at a width-to-height ratio.
#[derive(Clone, Debug)]
pub struct AspectRatioFitter {
    aspect_mode: AspectMode,
    aspect_ratio: f64,
    tracker: DrivenTracker,
}

impl Default for AspectRatioFitter {
    fn default() -> Self {
        Self::new(AspectMode::None, 1.0)
    }
}

impl AspectRatioFitter {
    /// A fitter with `mode`; `ratio` is width over height, clamped to `[0.001, 1000]`.
    pub fn new(mode: AspectMode, ratio: f64) -> Self {
        Self {
            aspect_mode: mode,
            aspect_ratio: ratio.clamp(MIN_RATIO, MAX_RATIO),
            tracker: DrivenTracker::new(),
        }
    }

    /// Current mode.
    pub fn aspect_mode(&self) -> AspectMode {
        self.aspect_mode
    }

    /// Current ratio.
    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Change the mode and reapply.
    pub fn set_aspect_mode(&mut self, cx: &mut ComponentCx<'_>, mode: AspectMode) {
        if self.aspect_mode != mode {
            self.aspect_mode = mode;
            self.update_rect(cx);
        }
    }

    /// Change the ratio (clamped) and reapply.
    pub fn set_aspect_ratio(&mut self, cx: &mut ComponentCx<'_>, ratio: f64) {
        let ratio = ratio.clamp(MIN_RATIO, MAX_RATIO);
        if self.aspect_ratio != ratio {
            self.aspect_ratio = ratio;
            self.update_rect(cx);
        }
    }

    fn is_valid_on_node(&self, cx: &ComponentCx<'_>) -> bool {
        let node = cx.node();
        let has_parent = cx.tree().parent(node).is_some();
        if self.aspect_mode.needs_parent() && !has_parent {
            return false;
        }
        // A root canvas is sized by its host.
        let root_canvas = !has_parent
            && cx
                .scene()
                .components()
                .of_type::<Canvas>(node)
                .next()
                .is_some();
        !root_canvas
    }

    fn update_rect(&mut self, cx: &mut ComponentCx<'_>) {
        if !cx.is_active_and_enabled() {
            return;
        }
        if !self.is_valid_on_node(cx) {
            debug!("aspect ratio fitter on {:?} has nothing to drive", cx.node());
            return;
        }
        let node = cx.node();
        let ratio = self.aspect_ratio;
        let size = cx.tree().size(node);
        let parent_size = cx.tree().parent(node).map(|p| cx.tree().size(p));
        let tree = cx.tree_mut();
        self.tracker.clear(tree);
        match self.aspect_mode {
            AspectMode::None => {}
            AspectMode::HeightControlsWidth => {
                self.tracker.add(tree, node, DrivenProperties::WIDTH);
                tree.set_size_along_axis(node, Axis::Horizontal, size.height * ratio);
            }
            AspectMode::WidthControlsHeight => {
                self.tracker.add(tree, node, DrivenProperties::HEIGHT);
                tree.set_size_along_axis(node, Axis::Vertical, size.width / ratio);
            }
            AspectMode::FitInParent | AspectMode::EnvelopeParent => {
                let Some(parent) = parent_size else {
                    return;
                };
                let fit = self.aspect_mode == AspectMode::FitInParent;
                let wider_than_tall = parent.height * ratio < parent.width;
                let new_size = if wider_than_tall ^ fit {
                    Size::new(parent.width, parent.width / ratio)
                } else {
                    Size::new(parent.height * ratio, parent.height)
                };
                let position = Point::new(
                    (parent.width - new_size.width) * 0.5,
                    (parent.height - new_size.height) * 0.5,
                );
                self.tracker.add(tree, node, DrivenProperties::ALL);
                tree.set_size(node, new_size);
                tree.set_position(node, position);
            }
        }
    }
}

impl LayoutController for AspectRatioFitter {
    fn set_layout_horizontal(&mut self, _cx: &mut ComponentCx<'_>) {}

    fn set_layout_vertical(&mut self, cx: &mut ComponentCx<'_>) {
        self.update_rect(cx);
    }
}

impl Component for AspectRatioFitter {
    fn capabilities(&self) -> Capabilities {
        Capabilities::LAYOUT_SELF_CONTROLLER_ALL
    }

    fn as_layout_controller_mut(&mut self) -> Option<&mut dyn LayoutController> {
        Some(self)
    }

    fn on_enable(&mut self, cx: &mut ComponentCx<'_>) {
        self.update_rect(cx);
    }

    fn on_disable(&mut self, cx: &mut ComponentCx<'_>) {
        self.tracker.clear(cx.tree_mut());
        cx.mark_layout_for_rebuild();
    }

    fn on_rect_transform_dimensions_change(&mut self, cx: &mut ComponentCx<'_>) {
        self.update_rect(cx);
    }

    fn on_transform_parent_changed(&mut self, cx: &mut ComponentCx<'_>) {
        self.update_rect(cx);
        LayoutGroupCore::set_dirty(cx);
    }
}
