// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Automatic layout.
//!
//! A rebuild runs four passes over a subtree: horizontal calculation
//! (children first), horizontal control (parents first), then the same two for
//! the vertical axis. Elements report sizes during the calculation passes;
//! controllers write rects during the control passes.

mod aspect_ratio_fitter;
mod content_size_fitter;
mod element;
mod grid;
mod group;
mod horizontal_vertical;
mod rebuilder;
mod utility;

pub use aspect_ratio_fitter::{AspectMode, AspectRatioFitter};
pub use content_size_fitter::{ContentSizeFitter, FitMode};
pub use element::ManualLayoutElement;
pub use grid::{Constraint, Corner, GridLayoutGroup};
pub use group::{LayoutGroupCore, TextAnchor};
pub use horizontal_vertical::HorizontalOrVerticalLayoutGroup;
pub use rebuilder::LayoutRebuilder;
pub use utility::{LayoutProperty, LayoutUtility};

use trellis_tree::Axis;

use crate::scene::ComponentCx;

/// A component that reports layout sizes for its node.
///
/// Negative `preferred` or `flexible` values mean "no opinion" and are skipped
/// when sizes are resolved.
#[allow(unused_variables, reason = "Default bodies ignore their context.")]
pub trait LayoutElement {
    /// Compute horizontal sizes. Children have already been calculated.
    fn calculate_layout_input_horizontal(&mut self, cx: &mut ComponentCx<'_>) {}
    /// Compute vertical sizes. Horizontal layout is final at this point.
    fn calculate_layout_input_vertical(&mut self, cx: &mut ComponentCx<'_>) {}
    /// Minimum size along `axis`.
    fn min_size(&self, axis: Axis) -> f64;
    /// Preferred size along `axis`.
    fn preferred_size(&self, axis: Axis) -> f64;
    /// Share of surplus space along `axis`.
    fn flexible_size(&self, axis: Axis) -> f64;
    /// Higher priorities override lower ones.
    fn layout_priority(&self) -> i32 {
        0
    }
}

/// A component that writes rects during the control passes.
pub trait LayoutController {
    /// Assign horizontal positions and sizes.
    fn set_layout_horizontal(&mut self, cx: &mut ComponentCx<'_>);
    /// Assign vertical positions and sizes.
    fn set_layout_vertical(&mut self, cx: &mut ComponentCx<'_>);
}

/// A component that can take its node out of its parent group's layout.
pub trait LayoutIgnorer {
    /// Exclude the node from the parent group.
    fn ignore_layout(&self) -> bool;
}
