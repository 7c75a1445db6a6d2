// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Tree: the rect hierarchy that automatic layout and clipping operate on.
//!
//! - Represents a hierarchy of rectangles with a position inside the parent, a size, and a local scale.
//! - Tracks per-node activeness; a node is active in the hierarchy only if every ancestor is active.
//! - Records which rect properties are currently driven by a layout controller.
//! - Journals structural and size mutations; [`Tree::commit`] drains them as [`Changes`].
//!
//! ## Not a layout engine
//!
//! This crate stores geometry and reports what changed. Measuring and arranging
//! nodes is done by `trellis_ui`, which consumes the journal to decide what to rebuild.
//!
//! ## API overview
//!
//! - [`Tree`]: arena of nodes.
//! - [`NodeId`]: generational handle of a node.
//! - [`LocalRect`]: position, size, and scale of a node relative to its parent.
//! - [`Axis`]: horizontal (`0`) or vertical (`1`).
//! - [`DrivenProperties`] / [`DrivenTracker`]: which properties a controller overwrites,
//!   with an optional revert to the pre-driving values.
//! - [`TreeEvent`] / [`Changes`]: the mutation journal.
//!
//! ### Minimal usage
//!
//! ```
//! use trellis_tree::{LocalRect, Tree, TreeEvent};
//! use kurbo::{Point, Rect, Size};
//!
//! let mut tree = Tree::new();
//! let root = tree.insert(None, LocalRect::sized(200.0, 100.0));
//! let child = tree.insert(
//!     Some(root),
//!     LocalRect::new(Point::new(10.0, 10.0), Size::new(50.0, 20.0)),
//! );
//! let _ = tree.commit();
//!
//! tree.set_size(child, Size::new(80.0, 20.0));
//! let changes = tree.commit();
//! assert_eq!(changes.events, vec![TreeEvent::Resized(child)]);
//! assert_eq!(tree.world_rect(child), Rect::new(10.0, 10.0, 90.0, 30.0));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod changes;
mod driven;
mod error;
mod tree;
mod types;
mod util;

pub use changes::{Changes, TreeEvent};
pub use driven::DrivenTracker;
pub use error::TreeError;
pub use tree::{Ancestors, Tree};
pub use types::{Axis, DrivenProperties, LocalRect, NodeFlags, NodeId};
