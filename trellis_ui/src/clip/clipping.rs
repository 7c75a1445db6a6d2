// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Rect;

/// A clip rectangle in canvas space and whether anything inside it is visible.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClipRect {
    /// The rectangle; [`Rect::ZERO`] when invalid.
    pub rect: Rect,
    /// False means "nothing is visible".
    pub valid: bool,
}

impl ClipRect {
    /// Nothing visible.
    pub const INVALID: Self = Self {
        rect: Rect::ZERO,
        valid: false,
    };

    /// A valid clip rect.
    pub const fn new(rect: Rect) -> Self {
        Self { rect, valid: true }
    }

    /// True if content occupying `bounds` is entirely clipped away.
    ///
    /// Touching edges do not count as overlap.
    pub fn culls(&self, bounds: Rect) -> bool {
        !self.valid || !overlaps(self.rect, bounds)
    }
}

impl Default for ClipRect {
    fn default() -> Self {
        Self::INVALID
    }
}

// Strict overlap on both axes; tolerant of rects with swapped edges.
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    let (a, b) = (a.abs(), b.abs());
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

/// Rectangle intersection for nested masks.
#[derive(Debug)]
pub struct Clipping;

impl Clipping {
    /// Intersect the canvas-space rects of a mask chain.
    ///
    /// An empty chain is [`ClipRect::INVALID`], never an unbounded rect. So is
    /// any chain whose intersection has no positive width or height.
    pub fn find_cull_and_clip_world_rect(rects: impl IntoIterator<Item = Rect>) -> ClipRect {
        let mut rects = rects.into_iter();
        let Some(mut current) = rects.next() else {
            return ClipRect::INVALID;
        };
        for r in rects {
            current = Rect::new(
                current.x0.max(r.x0),
                current.y0.max(r.y0),
                current.x1.min(r.x1),
                current.y1.min(r.y1),
            );
        }
        if current.width() <= 0.0 || current.height() <= 0.0 {
            return ClipRect::INVALID;
        }
        ClipRect::new(current)
    }
}
