// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use indexmap::IndexSet;
use log::{debug, trace};

use crate::component::ComponentId;
use crate::scene::Scene;

/// Clippers that recompute their clip rects once per frame.
///
/// Registration order is processing order. The set tolerates registration
/// and removal while [`cull`](Self::cull) walks it.
#[derive(Clone, Debug, Default)]
pub struct ClipperRegistry {
    clippers: IndexSet<ComponentId>,
}

impl ClipperRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clipper; returns false if it was already registered.
    pub fn register(&mut self, clipper: ComponentId) -> bool {
        self.clippers.insert(clipper)
    }

    /// Remove a clipper; returns false if it was not registered.
    pub fn unregister(&mut self, clipper: ComponentId) -> bool {
        let removed = self.clippers.shift_remove(&clipper);
        if !removed {
            debug!("unregistering unknown clipper {clipper:?}");
        }
        removed
    }

    /// True if `clipper` is registered.
    pub fn contains(&self, clipper: ComponentId) -> bool {
        self.clippers.contains(&clipper)
    }

    /// Number of registered clippers.
    pub fn len(&self) -> usize {
        self.clippers.len()
    }

    /// True if no clipper is registered.
    pub fn is_empty(&self) -> bool {
        self.clippers.is_empty()
    }

    /// Clipper at position `i`.
    pub fn get(&self, i: usize) -> Option<ComponentId> {
        self.clippers.get_index(i).copied()
    }

    pub(crate) fn clear(&mut self) {
        self.clippers.clear();
    }

    /// Run every clipper registered in `scene` once.
    ///
    /// Clippers registered during the walk wait for the next frame.
    pub fn cull(scene: &mut Scene) {
        let count = scene.clippers.len();
        trace!("culling with {count} clippers");
        for i in 0..count {
            let Some(id) = scene.clippers.get(i) else {
                break;
            };
            scene.with_component(id, |c, cx| {
                if let Some(clipper) = c.as_clipper_mut() {
                    clipper.perform_clipping(cx);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::RectMask2D;
    use trellis_tree::LocalRect;

    #[test]
    fn masks_register_while_enabled() {
        let mut scene = Scene::default();
        let root = scene.create_node(None, LocalRect::sized(10.0, 10.0));
        let a = scene
            .add_component(root, RectMask2D::new())
            .expect("node is alive");
        let b = scene
            .add_component(root, RectMask2D::new())
            .expect("node is alive");
        assert_eq!(scene.clipper_registry().len(), 2);
        assert_eq!(scene.clipper_registry().get(0), Some(a));

        scene.set_component_enabled(a, false);
        assert!(!scene.clipper_registry().contains(a));
        assert_eq!(scene.clipper_registry().get(0), Some(b));
        scene.set_active(root, false);
        assert!(scene.clipper_registry().is_empty());
    }

    #[test]
    fn duplicate_and_unknown_ids_are_reported() {
        let mut scene = Scene::default();
        let root = scene.create_node(None, LocalRect::sized(10.0, 10.0));
        let id = scene
            .add_component(root, RectMask2D::new())
            .expect("node is alive");
        let mut reg = ClipperRegistry::new();
        assert!(reg.register(id));
        assert!(!reg.register(id));
        assert!(reg.unregister(id));
        assert!(!reg.unregister(id));
        assert!(reg.is_empty());
    }
}
