// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::component::{Capabilities, Component};
use crate::scene::ComponentCx;

/// Marks a node as the root of a drawing surface.
///
/// The topmost active canvas above a node defines the space clip rects are
/// computed in. A canvas that overrides sorting draws independently of the
/// canvases above it, so rect masks above it do not clip its content.
#[derive(Clone, Debug, Default)]
pub struct Canvas {
    override_sorting: bool,
}

impl Canvas {
    /// A canvas that sorts with its parent canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_override_sorting`](Self::set_override_sorting).
    pub fn with_override_sorting(mut self, override_sorting: bool) -> Self {
        self.override_sorting = override_sorting;
        self
    }

    /// Whether the canvas sorts independently.
    pub fn override_sorting(&self) -> bool {
        self.override_sorting
    }

    /// Change sorting independence and notify the subtree.
    pub fn set_override_sorting(&mut self, cx: &mut ComponentCx<'_>, override_sorting: bool) {
        if self.override_sorting != override_sorting {
            self.override_sorting = override_sorting;
            cx.notify_canvas_hierarchy_changed();
        }
    }
}

impl Component for Canvas {
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    fn on_enable(&mut self, cx: &mut ComponentCx<'_>) {
        cx.notify_canvas_hierarchy_changed();
    }

    fn on_disable(&mut self, cx: &mut ComponentCx<'_>) {
        cx.notify_canvas_hierarchy_changed();
    }
}
