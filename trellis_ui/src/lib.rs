// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis UI: automatic layout and rectangular clipping over a [`trellis_tree`] hierarchy.
//!
//! - [`Scene`] owns the tree, the components attached to its nodes, and the per-frame registries.
//! - [`layout`] holds the rebuild engine and the stock controllers: rows, columns, grids,
//!   content size fitters, and aspect ratio fitters.
//! - [`clip`] holds rect masks, stencil masks, and the once-per-frame culling pass.
//!
//! Components are plain Rust values implementing [`Component`]. A component advertises the
//! roles it plays through [`Capabilities`] and receives lifecycle callbacks with a
//! [`ComponentCx`] that gives it access to the rest of the scene.
//!
//! ## Frame order
//!
//! [`Scene::update`] drains tree mutations into component callbacks, rebuilds every queued
//! layout root, drains the mutations the rebuild made, and finally runs every clipper.
//!
//! ### Minimal usage
//!
//! ```
//! use kurbo::Size;
//! use trellis_tree::LocalRect;
//! use trellis_ui::Scene;
//! use trellis_ui::layout::{HorizontalOrVerticalLayoutGroup, ManualLayoutElement};
//!
//! let mut scene = Scene::default();
//! let row = scene.create_node(None, LocalRect::sized(200.0, 100.0));
//! let mut group = HorizontalOrVerticalLayoutGroup::horizontal();
//! group.child_force_expand_width = false;
//! group.child_force_expand_height = false;
//! scene.add_component(row, group);
//!
//! let a = scene.create_node(Some(row), LocalRect::default());
//! let b = scene.create_node(Some(row), LocalRect::default());
//! scene.add_component(a, ManualLayoutElement::new().with_preferred(50.0, 20.0));
//! scene.add_component(b, ManualLayoutElement::new().with_preferred(30.0, 20.0));
//!
//! scene.update();
//! assert_eq!(scene.tree().position(b).x, 50.0);
//! assert_eq!(scene.tree().size(b), Size::new(30.0, 20.0));
//! ```

mod canvas;
pub mod clip;
mod component;
pub mod layout;
mod registry;
mod scene;

#[cfg(test)]
mod test_util;

pub use canvas::Canvas;
pub use component::{Capabilities, Component, ComponentId, ComponentStore};
pub use registry::{CanvasUpdateRegistry, RebuildRequest};
pub use scene::{ComponentCx, Scene, SceneConfig};
