// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangular clipping and stencil mask bookkeeping.
//!
//! Once per frame [`ClipperRegistry::cull`] asks every registered [`Clipper`] to recompute its
//! compound clip rect, the intersection of its own rect with those of the
//! masks above it, and to push the result to the [`Clippable`]s below it.

mod clipping;
mod mask_utilities;
mod rect_mask;
mod registry;
mod stencil;
mod target;

pub use clipping::{ClipRect, Clipping};
pub use mask_utilities::{ClipParent, MAX_STENCIL_DEPTH, MaskUtilities};
pub use rect_mask::RectMask2D;
pub use registry::ClipperRegistry;
pub use stencil::StencilMask;
pub use target::ClipTarget;

use crate::scene::ComponentCx;

/// Content that can be clipped by a rectangular mask.
pub trait Clippable {
    /// Find the governing mask again, after the mask hierarchy changed.
    fn recalculate_clipping(&mut self, cx: &mut ComponentCx<'_>);
    /// Receive the compound clip rect of the governing mask.
    fn set_clip_rect(&mut self, cx: &mut ComponentCx<'_>, clip: ClipRect);
    /// Decide whether to hide entirely under `clip`.
    fn cull(&mut self, cx: &mut ComponentCx<'_>, clip: ClipRect);
    /// Whether the content moved since it was last culled.
    ///
    /// Culling is skipped for content that did not move while the clip rect
    /// stayed the same. Defaults to always re-culling.
    fn has_moved(&self) -> bool {
        true
    }
}

/// Computes and distributes clip rects once per frame.
pub trait Clipper {
    /// Recompute the clip rect and push it to the targets.
    fn perform_clipping(&mut self, cx: &mut ComponentCx<'_>);
}

/// A stencil mask.
pub trait Mask {
    /// Whether the mask currently masks anything.
    fn mask_enabled(&self) -> bool;
}

/// Content affected by stencil masks.
pub trait Maskable {
    /// React to a change in the stencil masks above.
    fn recalculate_masking(&mut self, cx: &mut ComponentCx<'_>);
}
