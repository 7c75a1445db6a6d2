// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Size, Vec2};
use trellis_tree::Axis;

use super::{LayoutController, LayoutElement, LayoutGroupCore};
use crate::component::{Capabilities, Component};
use crate::scene::ComponentCx;

/// Corner the first cell is placed in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Top, left.
    #[default]
    UpperLeft = 0,
    /// Top, right.
    UpperRight = 1,
    /// Bottom, left.
    LowerLeft = 2,
    /// Bottom, right.
    LowerRight = 3,
}

/// How the column or row count is chosen.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// As many columns as fit the width.
    #[default]
    Flexible,
    /// Exactly `constraint_count` columns.
    FixedColumnCount,
    /// Exactly `constraint_count` rows.
    FixedRowCount,
}

/// Arranges children in equally sized cells.
#[derive(Clone, Debug)]
pub struct GridLayoutGroup {
    /// Padding and alignment.
    pub core: LayoutGroupCore,
    /// Size given to every child.
    pub cell_size: Size,
    /// Gap between cells.
    pub spacing: Vec2,
    /// Corner of the first cell.
    pub start_corner: Corner,
    /// Axis filled first.
    pub start_axis: Axis,
    /// Column/row count policy.
    pub constraint: Constraint,
    constraint_count: usize,
}

impl Default for GridLayoutGroup {
    fn default() -> Self {
        Self {
            core: LayoutGroupCore::new(),
            cell_size: Size::new(100.0, 100.0),
            spacing: Vec2::ZERO,
            start_corner: Corner::UpperLeft,
            start_axis: Axis::Horizontal,
            constraint: Constraint::Flexible,
            constraint_count: 2,
        }
    }
}

// Ceiling of `a / b` for a positive `b`.
fn div_ceil(a: usize, b: usize) -> usize {
    a.div_ceil(b.max(1))
}

// How many cells of `cell + spacing` fit in `extent`, at least one.
fn fit_count(extent: f64, cell: f64, spacing: f64) -> usize {
    if cell + spacing <= 0.0 {
        return usize::MAX;
    }
    let n = ((extent + spacing + 0.001) / (cell + spacing)).floor();
    if n >= 1.0 { to_count(n) } else { 1 }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Only called with a floored value of at least 1."
)]
fn to_count(n: f64) -> usize {
    n as usize
}

#[allow(
    clippy::cast_precision_loss,
    reason = "Cell counts are far below 2^52."
)]
fn to_f64(n: usize) -> f64 {
    n as f64
}

impl GridLayoutGroup {
    /// A grid with 100x100 cells and a flexible column count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns or rows forced by the constraint (at least 1).
    pub fn constraint_count(&self) -> usize {
        self.constraint_count
    }

    /// Set the forced column or row count; clamped to at least 1.
    pub fn with_constraint(mut self, constraint: Constraint, count: usize) -> Self {
        self.constraint = constraint;
        self.constraint_count = count.max(1);
        self
    }

    /// Change the constraint, rebuilding if it differs.
    pub fn set_constraint(&mut self, cx: &mut ComponentCx<'_>, constraint: Constraint, count: usize) {
        let count = count.max(1);
        if self.constraint != constraint || self.constraint_count != count {
            self.constraint = constraint;
            self.constraint_count = count;
            LayoutGroupCore::set_dirty(cx);
        }
    }

    /// Change the cell size, rebuilding if it differs.
    pub fn set_cell_size(&mut self, cx: &mut ComponentCx<'_>, cell_size: Size) {
        if self.cell_size != cell_size {
            self.cell_size = cell_size;
            LayoutGroupCore::set_dirty(cx);
        }
    }

    fn cell(&self, axis: Axis) -> f64 {
        axis.of_size(self.cell_size)
    }

    fn gap(&self, axis: Axis) -> f64 {
        axis.of_vec(self.spacing)
    }

    // Size is set in the horizontal pass; both positions in the vertical pass,
    // once the group's own height is final.
    fn set_cells_along_axis(&mut self, cx: &mut ComponentCx<'_>, axis: Axis) {
        let children = self.core.rect_children().to_vec();
        if axis == Axis::Horizontal {
            for &child in &children {
                let pos = cx.tree().position(child);
                self.core.set_child_along_axis_with_size(
                    cx,
                    child,
                    Axis::Horizontal,
                    pos.x,
                    self.cell_size.width,
                );
                self.core.set_child_along_axis_with_size(
                    cx,
                    child,
                    Axis::Vertical,
                    pos.y,
                    self.cell_size.height,
                );
            }
            return;
        }
        let count = children.len();
        if count == 0 {
            return;
        }

        let size = cx.tree().size(cx.node());
        let (mut cells_x, mut cells_y) = (1, 1);
        match self.constraint {
            Constraint::FixedColumnCount => {
                cells_x = self.constraint_count;
                if count > cells_x {
                    cells_y = div_ceil(count, cells_x);
                }
            }
            Constraint::FixedRowCount => {
                cells_y = self.constraint_count;
                if count > cells_y {
                    cells_x = div_ceil(count, cells_y);
                }
            }
            Constraint::Flexible => {
                cells_x = fit_count(
                    size.width - self.core.padding_along(Axis::Horizontal),
                    self.cell(Axis::Horizontal),
                    self.gap(Axis::Horizontal),
                );
                cells_y = fit_count(
                    size.height - self.core.padding_along(Axis::Vertical),
                    self.cell(Axis::Vertical),
                    self.gap(Axis::Vertical),
                );
            }
        }

        let corner = self.start_corner as usize;
        let (corner_x, corner_y) = (corner % 2, corner / 2);

        let (cells_per_main_axis, actual_x, actual_y) = match self.start_axis {
            Axis::Horizontal => {
                let per = cells_x;
                (per, cells_x.clamp(1, count), cells_y.clamp(1, div_ceil(count, per)))
            }
            Axis::Vertical => {
                let per = cells_y;
                (per, cells_x.clamp(1, div_ceil(count, per)), cells_y.clamp(1, count))
            }
        };

        let required = Vec2::new(
            to_f64(actual_x) * self.cell(Axis::Horizontal)
                + to_f64(actual_x - 1) * self.gap(Axis::Horizontal),
            to_f64(actual_y) * self.cell(Axis::Vertical)
                + to_f64(actual_y - 1) * self.gap(Axis::Vertical),
        );
        let start_x = self.core.start_offset(cx, Axis::Horizontal, required.x);
        let start_y = self.core.start_offset(cx, Axis::Vertical, required.y);

        for (i, child) in children.into_iter().enumerate() {
            let (cell_x, cell_y) = match self.start_axis {
                Axis::Horizontal => (i % cells_per_main_axis, i / cells_per_main_axis),
                Axis::Vertical => (i / cells_per_main_axis, i % cells_per_main_axis),
            };
            // Cells past the fitted block mirror to negative indices.
            let mut pos_x = to_f64(cell_x);
            let mut pos_y = to_f64(cell_y);
            if corner_x == 1 {
                pos_x = to_f64(actual_x) - 1.0 - pos_x;
            }
            if corner_y == 1 {
                pos_y = to_f64(actual_y) - 1.0 - pos_y;
            }
            let step_x = self.cell(Axis::Horizontal) + self.gap(Axis::Horizontal);
            let step_y = self.cell(Axis::Vertical) + self.gap(Axis::Vertical);
            self.core.set_child_along_axis_with_size(
                cx,
                child,
                Axis::Horizontal,
                start_x + step_x * pos_x,
                self.cell_size.width,
            );
            self.core.set_child_along_axis_with_size(
                cx,
                child,
                Axis::Vertical,
                start_y + step_y * pos_y,
                self.cell_size.height,
            );
        }
    }
}

impl LayoutElement for GridLayoutGroup {
    fn calculate_layout_input_horizontal(&mut self, cx: &mut ComponentCx<'_>) {
        self.core.collect_children(cx);
        let count = self.core.rect_children().len();
        let (min_columns, preferred_columns) = match self.constraint {
            Constraint::FixedColumnCount => (self.constraint_count, self.constraint_count),
            Constraint::FixedRowCount => {
                let n = div_ceil(count, self.constraint_count);
                (n, n)
            }
            Constraint::Flexible => (1, count.isqrt() + usize::from(count.isqrt().pow(2) < count)),
        };
        let padding = self.core.padding_along(Axis::Horizontal);
        let step = self.cell(Axis::Horizontal) + self.gap(Axis::Horizontal);
        self.core.set_layout_input_for_axis(
            padding + step * to_f64(min_columns) - self.gap(Axis::Horizontal),
            padding + step * to_f64(preferred_columns) - self.gap(Axis::Horizontal),
            -1.0,
            Axis::Horizontal,
        );
    }

    fn calculate_layout_input_vertical(&mut self, cx: &mut ComponentCx<'_>) {
        let count = self.core.rect_children().len();
        let min_rows = match self.constraint {
            Constraint::FixedColumnCount => div_ceil(count, self.constraint_count),
            Constraint::FixedRowCount => self.constraint_count,
            Constraint::Flexible => {
                let width = cx.tree().size(cx.node()).width;
                let cells_x = fit_count(
                    width - self.core.padding_along(Axis::Horizontal),
                    self.cell(Axis::Horizontal),
                    self.gap(Axis::Horizontal),
                );
                div_ceil(count, cells_x)
            }
        };
        let min_space = self.core.padding_along(Axis::Vertical)
            + (self.cell(Axis::Vertical) + self.gap(Axis::Vertical)) * to_f64(min_rows)
            - self.gap(Axis::Vertical);
        self.core
            .set_layout_input_for_axis(min_space, min_space, -1.0, Axis::Vertical);
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

impl LayoutController for GridLayoutGroup {
    fn set_layout_horizontal(&mut self, cx: &mut ComponentCx<'_>) {
        self.set_cells_along_axis(cx, Axis::Horizontal);
    }

    fn set_layout_vertical(&mut self, cx: &mut ComponentCx<'_>) {
        self.set_cells_along_axis(cx, Axis::Vertical);
    }
}

impl Component for GridLayoutGroup {
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
