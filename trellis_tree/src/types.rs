// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the rect tree: node identifiers, flags, axes, and local geometry.

use kurbo::{Point, Rect, Size, Vec2};

/// Identifier for a node in the tree.
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// ### Liveness
///
/// Use [`Tree::is_alive`](crate::Tree::is_alive) to check whether a `NodeId` still refers to a live node.
/// Stale `NodeId`s never alias a different live node because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw slot index (for diagnostics and side tables only).
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the generation counter.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Per-node flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The node itself is active. A node is active in the hierarchy only
        /// when it and every ancestor carry this flag.
        const ACTIVE = 0b0000_0001;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::ACTIVE
    }
}

bitflags::bitflags! {
    /// Rect properties currently overwritten by a layout controller.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DrivenProperties: u8 {
        /// Horizontal position within the parent.
        const POSITION_X = 0b0000_0001;
        /// Vertical position within the parent.
        const POSITION_Y = 0b0000_0010;
        /// Width.
        const WIDTH      = 0b0000_0100;
        /// Height.
        const HEIGHT     = 0b0000_1000;
        /// Both position components.
        const POSITION = Self::POSITION_X.bits() | Self::POSITION_Y.bits();
        /// Both size components.
        const SIZE = Self::WIDTH.bits() | Self::HEIGHT.bits();
        /// Everything.
        const ALL = Self::POSITION.bits() | Self::SIZE.bits();
    }
}

impl DrivenProperties {
    /// Position property along `axis`.
    #[must_use]
    pub const fn position(axis: Axis) -> Self {
        match axis {
            Axis::Horizontal => Self::POSITION_X,
            Axis::Vertical => Self::POSITION_Y,
        }
    }

    /// Size property along `axis`.
    #[must_use]
    pub const fn size(axis: Axis) -> Self {
        match axis {
            Axis::Horizontal => Self::WIDTH,
            Axis::Vertical => Self::HEIGHT,
        }
    }
}

/// One of the two layout axes.
///
/// Horizontal is axis `0`, vertical is axis `1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis.
    Horizontal = 0,
    /// The y axis (pointing down).
    Vertical = 1,
}

impl Axis {
    /// Both axes, horizontal first.
    pub const BOTH: [Self; 2] = [Self::Horizontal, Self::Vertical];

    /// Index of the axis (`0` or `1`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The other axis.
    #[must_use]
    pub const fn cross(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    /// Component of `size` along this axis.
    #[must_use]
    pub fn of_size(self, size: Size) -> f64 {
        match self {
            Self::Horizontal => size.width,
            Self::Vertical => size.height,
        }
    }

    /// Component of `point` along this axis.
    #[must_use]
    pub fn of_point(self, point: Point) -> f64 {
        match self {
            Self::Horizontal => point.x,
            Self::Vertical => point.y,
        }
    }

    /// Component of `v` along this axis.
    #[must_use]
    pub fn of_vec(self, v: Vec2) -> f64 {
        match self {
            Self::Horizontal => v.x,
            Self::Vertical => v.y,
        }
    }

    /// Returns `size` with the component along this axis replaced.
    #[must_use]
    pub fn with_size(self, size: Size, value: f64) -> Size {
        match self {
            Self::Horizontal => Size::new(value, size.height),
            Self::Vertical => Size::new(size.width, value),
        }
    }

    /// Returns `point` with the component along this axis replaced.
    #[must_use]
    pub fn with_point(self, point: Point, value: f64) -> Point {
        match self {
            Self::Horizontal => Point::new(value, point.y),
            Self::Vertical => Point::new(point.x, value),
        }
    }
}

/// Local rectangle of a node, relative to its parent's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalRect {
    /// Offset of the node's top-left corner inside its parent.
    pub position: Point,
    /// Width and height.
    pub size: Size,
    /// Local scale applied to the node and its subtree.
    pub scale: Vec2,
}

impl LocalRect {
    /// A rect at `position` with `size` and unit scale.
    #[must_use]
    pub const fn new(position: Point, size: Size) -> Self {
        Self {
            position,
            size,
            scale: Vec2::new(1.0, 1.0),
        }
    }

    /// A rect at the origin with the given size.
    #[must_use]
    pub const fn sized(width: f64, height: f64) -> Self {
        Self::new(Point::ZERO, Size::new(width, height))
    }

    /// The rect in parent space, ignoring scale.
    #[must_use]
    pub fn to_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }
}

impl Default for LocalRect {
    fn default() -> Self {
        Self::new(Point::ZERO, Size::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_accessors_round_trip() {
        let s = Size::new(3.0, 4.0);
        assert_eq!(Axis::Horizontal.of_size(s), 3.0);
        assert_eq!(Axis::Vertical.of_size(s), 4.0);
        assert_eq!(Axis::Vertical.with_size(s, 9.0), Size::new(3.0, 9.0));
        assert_eq!(Axis::Horizontal.cross(), Axis::Vertical);
        assert_eq!(Axis::Vertical.index(), 1);
    }

    #[test]
    fn driven_property_helpers() {
        assert_eq!(
            DrivenProperties::position(Axis::Horizontal) | DrivenProperties::size(Axis::Vertical),
            DrivenProperties::POSITION_X | DrivenProperties::HEIGHT
        );
        assert!(DrivenProperties::ALL.contains(DrivenProperties::SIZE));
    }
}
