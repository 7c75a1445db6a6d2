// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::Mask;
use crate::component::{Capabilities, Component};
use crate::scene::ComponentCx;

/// A mask drawn into the stencil buffer by the node's graphic.
///
/// Maskables below are told to recompute their stencil depth whenever the
/// mask turns on or off.
#[derive(Clone, Debug)]
pub struct StencilMask {
    has_graphic: bool,
}

impl Default for StencilMask {
    fn default() -> Self {
        Self { has_graphic: true }
    }
}

impl StencilMask {
    /// A mask backed by a graphic.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the node has a graphic to mask with.
    pub fn has_graphic(&self) -> bool {
        self.has_graphic
    }

    /// A mask without a graphic masks nothing.
    pub fn set_has_graphic(&mut self, cx: &mut ComponentCx<'_>, has_graphic: bool) {
        if self.has_graphic != has_graphic {
            self.has_graphic = has_graphic;
            cx.notify_stencil_state_changed();
        }
    }
}

impl Mask for StencilMask {
    fn mask_enabled(&self) -> bool {
        self.has_graphic
    }
}

impl Component for StencilMask {
    fn capabilities(&self) -> Capabilities {
        Capabilities::MASK
    }

    fn as_mask(&self) -> Option<&dyn Mask> {
        Some(self)
    }

    fn on_enable(&mut self, cx: &mut ComponentCx<'_>) {
        cx.notify_stencil_state_changed();
    }

    fn on_disable(&mut self, cx: &mut ComponentCx<'_>) {
        cx.notify_stencil_state_changed();
    }
}
