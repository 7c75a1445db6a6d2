// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene context: tree, components, registries, and the per-frame tick.

use std::any::Any;

use kurbo::{Point, Size};
use log::{trace, warn};
use trellis_tree::{LocalRect, NodeId, Tree, TreeError, TreeEvent};

use crate::clip::{self, ClipperRegistry};
use crate::component::{Capabilities, Component, ComponentId, ComponentStore};
use crate::layout::LayoutRebuilder;
use crate::registry::{self, CanvasUpdateRegistry};

/// Tunables for a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneConfig {
    /// Upper bound on cascaded rounds of tree-event dispatch per flush.
    ///
    /// Hooks may mutate the tree and produce further events; dispatch stops
    /// after this many rounds and the remainder waits for the next flush.
    pub max_event_rounds: usize,
    /// Rebuild queued layout roots parents-first.
    pub sort_layout_queue: bool,
    /// Treat mask rects that do not overlap the root canvas as fully clipped.
    pub cull_masks_outside_root_canvas: bool,
}

impl SceneConfig {
    /// Create a config with explicit values.
    pub const fn new(
        max_event_rounds: usize,
        sort_layout_queue: bool,
        cull_masks_outside_root_canvas: bool,
    ) -> Self {
        Self {
            max_event_rounds,
            sort_layout_queue,
            cull_masks_outside_root_canvas,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new(16, true, true)
    }
}

/// Follow-up work a component requests from inside a callback.
///
/// These run after the component is back in its slot, so the notified
/// components can reach it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Deferred {
    Notify2DMaskStateChanged,
    NotifyStencilStateChanged,
    CanvasHierarchyChanged,
}

/// Owner of everything that takes part in layout and clipping.
///
/// A scene is an explicit context object: create one per independent UI,
/// call [`update`](Self::update) once per frame, and [`shutdown`](Self::shutdown)
/// when done.
pub struct Scene {
    pub(crate) tree: Tree,
    pub(crate) components: ComponentStore,
    pub(crate) updates: CanvasUpdateRegistry,
    pub(crate) clippers: ClipperRegistry,
    pub(crate) config: SceneConfig,
    dispatching: bool,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("tree", &self.tree)
            .field("components", &self.components)
            .field("updates", &self.updates)
            .field("clippers", &self.clippers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new(config: SceneConfig) -> Self {
        Self {
            tree: Tree::new(),
            components: ComponentStore::new(),
            updates: CanvasUpdateRegistry::new(),
            clippers: ClipperRegistry::new(),
            config,
            dispatching: false,
        }
    }

    /// Disable every component and drop all pending work.
    pub fn shutdown(&mut self) {
        for id in self.components.ids() {
            self.set_component_enabled(id, false);
        }
        self.updates.clear();
        self.clippers.clear();
        let _ = self.tree.commit();
    }

    /// The node tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Direct tree access. Hooks for the recorded changes run on the next
    /// [`update`](Self::update) or scene mutation.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// The component table.
    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    /// Pending layout work.
    pub fn canvas_updates(&self) -> &CanvasUpdateRegistry {
        &self.updates
    }

    /// Registered clippers.
    pub fn clipper_registry(&self) -> &ClipperRegistry {
        &self.clippers
    }

    /// Active configuration.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    // --- per-frame tick ---

    /// Run one frame: dispatch pending hooks, rebuild queued layouts, and cull.
    pub fn update(&mut self) {
        self.flush_events();
        registry::perform_layout_update(self);
        self.flush_events();
        ClipperRegistry::cull(self);
    }

    /// Rebuild the layout rooted at `node` right away, bypassing the queue.
    pub fn force_rebuild_layout_immediate(&mut self, node: NodeId) {
        LayoutRebuilder::force_rebuild_layout_immediate(self, node);
        self.flush_events();
    }

    /// Queue the layout containing `node` for the next [`update`](Self::update).
    pub fn mark_layout_for_rebuild(&mut self, node: NodeId) {
        LayoutRebuilder::mark_layout_for_rebuild(self, node);
    }

    // --- tree mutators ---

    /// Create a node as the last child of `parent`.
    pub fn create_node(&mut self, parent: Option<NodeId>, local: LocalRect) -> NodeId {
        let id = self.tree.insert(parent, local);
        self.flush_events();
        id
    }

    /// Disable and remove the subtree rooted at `node`, including its components.
    pub fn remove_node(&mut self, node: NodeId) {
        if !self.tree.is_alive(node) {
            return;
        }
        self.tree.set_active(node, false);
        self.flush_events();
        for n in self.tree.descendants_pre_order(node) {
            self.components.remove_node(n);
        }
        let _ = self.tree.remove(node);
        self.flush_events();
    }

    /// Move `node` under `parent` (or make it a root).
    pub fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<(), TreeError> {
        if !self.tree.is_alive(node) {
            return Err(TreeError::StaleNode(node));
        }
        if self.tree.parent(node) == parent {
            return Ok(());
        }
        if let Some(p) = parent {
            if !self.tree.is_alive(p) {
                return Err(TreeError::StaleNode(p));
            }
            if self.tree.is_ancestor_or_self(node, p) {
                return Err(TreeError::Cycle { node, parent: p });
            }
        }
        for n in self.tree.descendants_pre_order(node) {
            self.for_each_active_component(n, |c, cx| c.on_before_transform_parent_changed(cx));
        }
        self.tree.reparent(node, parent)?;
        self.flush_events();
        Ok(())
    }

    /// Set the node's own active flag.
    pub fn set_active(&mut self, node: NodeId, active: bool) {
        self.tree.set_active(node, active);
        self.flush_events();
    }

    /// Set the node's size.
    pub fn set_size(&mut self, node: NodeId, size: Size) {
        self.tree.set_size(node, size);
        self.flush_events();
    }

    /// Set the node's position inside its parent.
    pub fn set_position(&mut self, node: NodeId, position: Point) {
        self.tree.set_position(node, position);
        self.flush_events();
    }

    // --- component mutators ---

    /// Attach an enabled component; `on_enable` runs if the node is active.
    pub fn add_component<C: Component>(&mut self, node: NodeId, component: C) -> Option<ComponentId> {
        if !self.tree.is_alive(node) {
            return None;
        }
        let id = self.components.insert(node, component);
        if self.tree.is_active_in_hierarchy(node) {
            self.with_component(id, |c, cx| c.on_enable(cx));
        }
        self.flush_events();
        Some(id)
    }

    /// Disable and detach a component.
    pub fn remove_component(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        self.set_component_enabled(id, false);
        self.components.remove(id)
    }

    /// Toggle a component's own enabled flag, running `on_enable`/`on_disable`
    /// when its active-and-enabled state flips.
    pub fn set_component_enabled(&mut self, id: ComponentId, enabled: bool) {
        if !self.components.is_alive(id) || self.components.is_enabled(id) == enabled {
            return;
        }
        let node_active = self
            .components
            .node_of(id)
            .is_some_and(|n| self.tree.is_active_in_hierarchy(n));
        self.components.set_enabled(id, enabled);
        if node_active {
            if enabled {
                self.with_component(id, |c, cx| c.on_enable(cx));
            } else {
                self.with_component(id, |c, cx| c.on_disable(cx));
            }
        }
        self.flush_events();
    }

    /// Run `f` on a component of concrete type `C` with a callback context.
    ///
    /// Returns `None` if the id is stale, of another type, or currently invoked.
    pub fn update_component<C: Component, R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut C, &mut ComponentCx<'_>) -> R,
    ) -> Option<R> {
        let r = self
            .with_component(id, |c, cx| {
                let any: &mut dyn Any = c;
                any.downcast_mut::<C>().map(|c| f(c, cx))
            })
            .flatten();
        self.flush_events();
        r
    }

    /// Typed shared access to a component.
    pub fn component<C: Component>(&self, id: ComponentId) -> Option<&C> {
        self.components.downcast(id)
    }

    /// Typed exclusive access to a component, without hooks.
    pub fn component_mut<C: Component>(&mut self, id: ComponentId) -> Option<&mut C> {
        self.components.downcast_mut(id)
    }

    /// Enabled and on a node active in the hierarchy.
    pub fn is_component_active(&self, id: ComponentId) -> bool {
        self.components.is_enabled(id)
            && self
                .components
                .node_of(id)
                .is_some_and(|n| self.tree.is_active_in_hierarchy(n))
    }

    /// Active components of `node` declaring any of `caps`, in attach order.
    pub fn active_components(&self, node: NodeId, caps: Capabilities) -> Vec<ComponentId> {
        self.components
            .with_capabilities(node, caps)
            .filter(|id| self.is_component_active(*id))
            .collect()
    }

    // --- dispatch ---

    /// Invoke `f` on a component taken out of its slot.
    pub(crate) fn with_component<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut (dyn Component + 'static), &mut ComponentCx<'_>) -> R,
    ) -> Option<R> {
        let node = self.components.node_of(id)?;
        let mut component = self.components.take(id)?;
        let mut cx = ComponentCx {
            scene: self,
            this: id,
            node,
            deferred: Vec::new(),
        };
        let r = f(&mut *component, &mut cx);
        let deferred = core::mem::take(&mut cx.deferred);
        self.components.restore(id, component);
        for d in deferred {
            self.run_deferred(node, d);
        }
        Some(r)
    }

    fn for_each_active_component(
        &mut self,
        node: NodeId,
        mut f: impl FnMut(&mut (dyn Component + 'static), &mut ComponentCx<'_>),
    ) {
        for id in self.components.on_node(node).to_vec() {
            if self.is_component_active(id) {
                self.with_component(id, &mut f);
            }
        }
    }

    fn run_deferred(&mut self, node: NodeId, deferred: Deferred) {
        match deferred {
            Deferred::Notify2DMaskStateChanged => {
                clip::MaskUtilities::notify_2d_mask_state_changed(self, node);
            }
            Deferred::NotifyStencilStateChanged => {
                clip::MaskUtilities::notify_stencil_state_changed(self, node);
            }
            Deferred::CanvasHierarchyChanged => {
                for n in self.tree.descendants_pre_order(node) {
                    self.for_each_active_component(n, |c, cx| c.on_canvas_hierarchy_changed(cx));
                }
            }
        }
    }

    /// Dispatch journaled tree events to component hooks.
    ///
    /// No-op while a dispatch or layout rebuild is already running; the outer
    /// loop picks the new events up.
    pub(crate) fn flush_events(&mut self) {
        if self.dispatching || self.updates.is_rebuilding_layout() {
            return;
        }
        self.dispatching = true;
        for _ in 0..self.config.max_event_rounds {
            let changes = self.tree.commit();
            if changes.is_empty() {
                break;
            }
            trace!("dispatching {} tree events", changes.events.len());
            for event in changes.events {
                self.dispatch_event(event);
            }
        }
        if self.tree.has_pending_changes() {
            warn!(
                "tree events still pending after {} dispatch rounds",
                self.config.max_event_rounds
            );
        }
        self.dispatching = false;
    }

    fn dispatch_event(&mut self, event: TreeEvent) {
        let node = event.node();
        if !self.tree.is_alive(node) {
            return;
        }
        match event {
            TreeEvent::Resized(_) => {
                self.for_each_active_component(node, |c, cx| {
                    c.on_rect_transform_dimensions_change(cx);
                });
            }
            TreeEvent::ParentChanged(_) => {
                for n in self.tree.descendants_pre_order(node) {
                    self.for_each_active_component(n, |c, cx| {
                        c.on_transform_parent_changed(cx);
                        c.on_canvas_hierarchy_changed(cx);
                    });
                }
            }
            TreeEvent::ChildrenChanged(_) => {
                self.for_each_active_component(node, |c, cx| c.on_transform_children_changed(cx));
            }
            TreeEvent::Activated(_) => {
                for id in self.components.on_node(node).to_vec() {
                    if self.components.is_enabled(id) && self.tree.is_active_in_hierarchy(node) {
                        self.with_component(id, |c, cx| c.on_enable(cx));
                    }
                }
            }
            TreeEvent::Deactivated(_) => {
                for id in self.components.on_node(node).to_vec() {
                    if self.components.is_enabled(id) && !self.tree.is_active_in_hierarchy(node) {
                        self.with_component(id, |c, cx| c.on_disable(cx));
                    }
                }
            }
        }
    }
}

/// Context handed to component callbacks.
///
/// The invoked component is out of its slot for the duration of the call, so
/// the rest of the scene is freely reachable through [`scene_mut`](Self::scene_mut).
pub struct ComponentCx<'a> {
    scene: &'a mut Scene,
    this: ComponentId,
    node: NodeId,
    deferred: Vec<Deferred>,
}

impl core::fmt::Debug for ComponentCx<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComponentCx")
            .field("this", &self.this)
            .field("node", &self.node)
            .field("deferred", &self.deferred)
            .finish_non_exhaustive()
    }
}

impl ComponentCx<'_> {
    /// Id of the invoked component.
    pub fn id(&self) -> ComponentId {
        self.this
    }

    /// Node the invoked component is attached to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The whole scene.
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    /// The whole scene, mutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scene
    }

    /// The node tree.
    pub fn tree(&self) -> &Tree {
        &self.scene.tree
    }

    /// The node tree, mutably. Hooks for the changes run after the callback.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.scene.tree
    }

    /// Whether the invoked component is enabled on an active node.
    pub fn is_active_and_enabled(&self) -> bool {
        self.scene.is_component_active(self.this)
    }

    /// Queue the layout containing this component's node for rebuild.
    pub fn mark_layout_for_rebuild(&mut self) {
        LayoutRebuilder::mark_layout_for_rebuild(self.scene, self.node);
    }

    /// Tell clippables below this node that 2D masking changed, once the
    /// callback returns.
    pub fn notify_2d_mask_state_changed(&mut self) {
        self.defer(Deferred::Notify2DMaskStateChanged);
    }

    /// Tell maskables below this node that stencil masking changed, once the
    /// callback returns.
    pub fn notify_stencil_state_changed(&mut self) {
        self.defer(Deferred::NotifyStencilStateChanged);
    }

    /// Send `on_canvas_hierarchy_changed` through this node's subtree, once the
    /// callback returns.
    pub fn notify_canvas_hierarchy_changed(&mut self) {
        self.defer(Deferred::CanvasHierarchyChanged);
    }

    fn defer(&mut self, d: Deferred) {
        if !self.deferred.contains(&d) {
            self.deferred.push(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{CallLog, Recorder};

    #[test]
    fn hooks_follow_activation_and_enabled_state() {
        let log = CallLog::default();
        let mut scene = Scene::default();
        let root = scene.create_node(None, LocalRect::sized(100.0, 100.0));
        let child = scene.create_node(Some(root), LocalRect::sized(10.0, 10.0));
        let id = scene
            .add_component(child, Recorder::new("r", &log))
            .expect("node is alive");
        assert_eq!(log.take(), vec!["r.enable"]);

        scene.set_active(root, false);
        assert_eq!(log.take(), vec!["r.disable"]);
        // Disabling an inactive component's flag runs no hook.
        scene.set_component_enabled(id, false);
        scene.set_active(root, true);
        assert!(log.take().is_empty());

        scene.set_component_enabled(id, true);
        assert_eq!(log.take(), vec!["r.enable"]);
        scene.set_size(child, Size::new(20.0, 10.0));
        assert_eq!(log.take(), vec!["r.dimensions"]);
    }

    #[test]
    fn reparent_notifies_before_and_after_for_the_subtree() {
        let log = CallLog::default();
        let mut scene = Scene::default();
        let a = scene.create_node(None, LocalRect::sized(10.0, 10.0));
        let b = scene.create_node(None, LocalRect::sized(10.0, 10.0));
        let moved = scene.create_node(Some(a), LocalRect::sized(1.0, 1.0));
        let inner = scene.create_node(Some(moved), LocalRect::sized(1.0, 1.0));
        scene.add_component(a, Recorder::new("a", &log));
        scene.add_component(b, Recorder::new("b", &log));
        scene.add_component(inner, Recorder::new("inner", &log));
        let _ = log.take();

        scene.set_parent(moved, Some(b)).expect("valid reparent");
        assert_eq!(
            log.take(),
            vec![
                "inner.before_parent",
                "a.children",
                "b.children",
                "inner.parent",
                "inner.canvas_hierarchy",
            ]
        );
        assert!(matches!(
            scene.set_parent(b, Some(inner)),
            Err(TreeError::Cycle { .. })
        ));
    }

    #[test]
    fn remove_node_disables_then_detaches_components() {
        let log = CallLog::default();
        let mut scene = Scene::default();
        let root = scene.create_node(None, LocalRect::sized(10.0, 10.0));
        let child = scene.create_node(Some(root), LocalRect::sized(1.0, 1.0));
        let id = scene
            .add_component(child, Recorder::new("c", &log))
            .expect("node is alive");
        scene.add_component(root, Recorder::new("root", &log));
        let _ = log.take();

        scene.remove_node(child);
        assert_eq!(log.take(), vec!["c.disable", "root.children"]);
        assert!(!scene.components().is_alive(id));
        assert!(!scene.tree().is_alive(child));
    }

    #[test]
    fn update_component_downcasts_and_rejects_other_types() {
        let log = CallLog::default();
        let mut scene = Scene::default();
        let n = scene.create_node(None, LocalRect::sized(1.0, 1.0));
        let id = scene
            .add_component(n, Recorder::new("r", &log))
            .expect("node is alive");
        let name = scene.update_component::<Recorder, _>(id, |r, cx| {
            assert_eq!(cx.id(), id);
            assert!(cx.is_active_and_enabled());
            r.name
        });
        assert_eq!(name, Some("r"));
        assert!(
            scene
                .update_component::<crate::Canvas, _>(id, |_, _| ())
                .is_none()
        );
    }

    #[test]
    fn shutdown_disables_everything() {
        let log = CallLog::default();
        let mut scene = Scene::default();
        let n = scene.create_node(None, LocalRect::sized(1.0, 1.0));
        let id = scene
            .add_component(n, Recorder::new("r", &log))
            .expect("node is alive");
        let _ = log.take();
        scene.shutdown();
        assert_eq!(log.take(), vec!["r.disable"]);
        assert!(!scene.is_component_active(id));
        assert_eq!(scene.canvas_updates().pending_layout_rebuilds(), 0);
        assert!(scene.clipper_registry().is_empty());
    }
}
