// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Components attached to nodes, and the table that stores them.
//!
//! Every component declares its [`Capabilities`] once, when it is attached. The
//! layout and clipping engines filter a node's component list by capability bit
//! and then reach the matching trait object through the `as_*` accessors, so no
//! per-pass type introspection is needed.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use trellis_tree::NodeId;

use crate::clip::{Clippable, Clipper, Mask, Maskable};
use crate::layout::{LayoutController, LayoutElement, LayoutIgnorer};
use crate::scene::ComponentCx;

bitflags::bitflags! {
    /// What a component takes part in.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u16 {
        /// Reports min/preferred/flexible sizes ([`LayoutElement`]).
        const LAYOUT_ELEMENT         = 1 << 0;
        /// Assigns rect values during the control passes ([`LayoutController`]).
        const LAYOUT_CONTROLLER      = 1 << 1;
        /// A controller that only touches its own node. Runs before other controllers.
        const LAYOUT_SELF_CONTROLLER = 1 << 2;
        /// A controller that arranges its children.
        const LAYOUT_GROUP           = 1 << 3;
        /// Can opt the node out of its parent group ([`LayoutIgnorer`]).
        const LAYOUT_IGNORER         = 1 << 4;
        /// Receives a clip rect ([`Clippable`]).
        const CLIPPABLE              = 1 << 5;
        /// Computes and pushes clip rects once per frame ([`Clipper`]).
        const CLIPPER                = 1 << 6;
        /// A stencil mask ([`Mask`]).
        const MASK                   = 1 << 7;
        /// Reacts to stencil state changes ([`Maskable`]).
        const MASKABLE               = 1 << 8;

        /// A group controller that also reports its aggregate size.
        const LAYOUT_GROUP_ALL = Self::LAYOUT_ELEMENT.bits()
            | Self::LAYOUT_CONTROLLER.bits()
            | Self::LAYOUT_GROUP.bits();
        /// A controller of its own rect.
        const LAYOUT_SELF_CONTROLLER_ALL = Self::LAYOUT_CONTROLLER.bits()
            | Self::LAYOUT_SELF_CONTROLLER.bits();
    }
}

/// Behavior attached to a node.
///
/// All hooks default to doing nothing. Hooks are only invoked for components
/// that are enabled on a node that is active in the hierarchy.
#[allow(unused_variables, reason = "Default hook bodies ignore their context.")]
pub trait Component: Any {
    /// Capability set, read once when the component is attached.
    fn capabilities(&self) -> Capabilities;

    /// Layout element view, if [`Capabilities::LAYOUT_ELEMENT`] is declared.
    fn as_layout_element(&self) -> Option<&dyn LayoutElement> {
        None
    }
    /// Mutable layout element view.
    fn as_layout_element_mut(&mut self) -> Option<&mut dyn LayoutElement> {
        None
    }
    /// Layout controller view, if [`Capabilities::LAYOUT_CONTROLLER`] is declared.
    fn as_layout_controller_mut(&mut self) -> Option<&mut dyn LayoutController> {
        None
    }
    /// Layout ignorer view.
    fn as_layout_ignorer(&self) -> Option<&dyn LayoutIgnorer> {
        None
    }
    /// Clippable view.
    fn as_clippable_mut(&mut self) -> Option<&mut dyn Clippable> {
        None
    }
    /// Clipper view.
    fn as_clipper_mut(&mut self) -> Option<&mut dyn Clipper> {
        None
    }
    /// Stencil mask view.
    fn as_mask(&self) -> Option<&dyn Mask> {
        None
    }
    /// Maskable view.
    fn as_maskable_mut(&mut self) -> Option<&mut dyn Maskable> {
        None
    }

    /// The component became active and enabled.
    fn on_enable(&mut self, cx: &mut ComponentCx<'_>) {}
    /// The component stopped being active and enabled.
    fn on_disable(&mut self, cx: &mut ComponentCx<'_>) {}
    /// The node's width or height changed.
    fn on_rect_transform_dimensions_change(&mut self, cx: &mut ComponentCx<'_>) {}
    /// The node (or an ancestor) is about to be moved to a new parent.
    fn on_before_transform_parent_changed(&mut self, cx: &mut ComponentCx<'_>) {}
    /// The node (or an ancestor) was moved to a new parent.
    fn on_transform_parent_changed(&mut self, cx: &mut ComponentCx<'_>) {}
    /// The node's child list changed.
    fn on_transform_children_changed(&mut self, cx: &mut ComponentCx<'_>) {}
    /// The set of canvases above the node changed.
    fn on_canvas_hierarchy_changed(&mut self, cx: &mut ComponentCx<'_>) {}
}

/// Generational handle of an attached component.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32, u32);

impl ComponentId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

struct Slot {
    generation: u32,
    node: NodeId,
    enabled: bool,
    caps: Capabilities,
    type_id: TypeId,
    // `None` while the component is being invoked.
    component: Option<Box<dyn Component>>,
}

/// Table of components, with ordered per-node lists.
#[derive(Default)]
pub struct ComponentStore {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    by_node: HashMap<NodeId, Vec<ComponentId>>,
}

impl core::fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("ComponentStore")
            .field("alive", &alive)
            .field("nodes", &self.by_node.len())
            .finish_non_exhaustive()
    }
}

impl ComponentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `component` to `node`, enabled, after any existing components.
    pub fn insert<C: Component>(&mut self, node: NodeId, component: C) -> ComponentId {
        let caps = component.capabilities();
        let slot = |generation| Slot {
            generation,
            node,
            enabled: true,
            caps,
            type_id: TypeId::of::<C>(),
            component: Some(Box::new(component)),
        };
        let id = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(slot(generation));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Component counts stay far below u32::MAX."
            )]
            ComponentId(idx as u32, generation)
        } else {
            self.slots.push(Some(slot(1)));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Component counts stay far below u32::MAX."
            )]
            ComponentId((self.slots.len() - 1) as u32, 1)
        };
        self.by_node.entry(node).or_default().push(id);
        id
    }

    /// Detach a component. Returns it unless it is currently being invoked.
    pub fn remove(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        let slot = self.slot(id)?;
        let node = slot.node;
        let slot = self.slots[id.idx()].take()?;
        self.free_list.push(id.idx());
        if let Some(list) = self.by_node.get_mut(&node) {
            list.retain(|c| *c != id);
            if list.is_empty() {
                self.by_node.remove(&node);
            }
        }
        slot.component
    }

    /// Detach every component of `node`.
    pub fn remove_node(&mut self, node: NodeId) {
        for id in self.by_node.remove(&node).unwrap_or_default() {
            if self.slot(id).is_some() {
                self.slots[id.idx()] = None;
                self.free_list.push(id.idx());
            }
        }
    }

    /// True if `id` refers to an attached component.
    pub fn is_alive(&self, id: ComponentId) -> bool {
        self.slot(id).is_some()
    }

    /// Components of `node`, in attach order.
    pub fn on_node(&self, node: NodeId) -> &[ComponentId] {
        self.by_node.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Components of `node` declaring any of `caps`, in attach order.
    pub fn with_capabilities(
        &self,
        node: NodeId,
        caps: Capabilities,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.on_node(node)
            .iter()
            .copied()
            .filter(move |id| self.capabilities(*id).intersects(caps))
    }

    /// Components of `node` whose concrete type is `C`, in attach order.
    pub fn of_type<C: Component>(&self, node: NodeId) -> impl Iterator<Item = ComponentId> + '_ {
        self.on_node(node)
            .iter()
            .copied()
            .filter(move |id| self.slot(*id).is_some_and(|s| s.type_id == TypeId::of::<C>()))
    }

    /// Node the component is attached to.
    pub fn node_of(&self, id: ComponentId) -> Option<NodeId> {
        self.slot(id).map(|s| s.node)
    }

    /// Capability set of the component (empty for stale ids).
    pub fn capabilities(&self, id: ComponentId) -> Capabilities {
        self.slot(id).map_or(Capabilities::empty(), |s| s.caps)
    }

    /// The component's own enabled flag.
    pub fn is_enabled(&self, id: ComponentId) -> bool {
        self.slot(id).is_some_and(|s| s.enabled)
    }

    pub(crate) fn set_enabled(&mut self, id: ComponentId, enabled: bool) {
        if let Some(s) = self.slot_mut(id) {
            s.enabled = enabled;
        }
    }

    /// True while the component is taken out of its slot to be invoked.
    pub fn is_taken(&self, id: ComponentId) -> bool {
        self.slot(id).is_some_and(|s| s.component.is_none())
    }

    /// Shared access; `None` for stale or currently invoked components.
    pub fn get(&self, id: ComponentId) -> Option<&(dyn Component + 'static)> {
        self.slot(id)?.component.as_deref()
    }

    /// Exclusive access; `None` for stale or currently invoked components.
    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut (dyn Component + 'static)> {
        self.slot_mut(id)?.component.as_deref_mut()
    }

    /// Typed shared access.
    pub fn downcast<C: Component>(&self, id: ComponentId) -> Option<&C> {
        let any: &dyn Any = self.get(id)?;
        any.downcast_ref()
    }

    /// Typed exclusive access.
    pub fn downcast_mut<C: Component>(&mut self, id: ComponentId) -> Option<&mut C> {
        let any: &mut dyn Any = self.get_mut(id)?;
        any.downcast_mut()
    }

    /// All live component ids, in slot order.
    pub fn ids(&self) -> Vec<ComponentId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "Component counts stay far below u32::MAX."
                )]
                s.as_ref().map(|s| ComponentId(i as u32, s.generation))
            })
            .collect()
    }

    pub(crate) fn take(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        self.slot_mut(id)?.component.take()
    }

    /// Put a taken component back. Dropped if it was detached meanwhile.
    pub(crate) fn restore(&mut self, id: ComponentId, component: Box<dyn Component>) {
        if let Some(s) = self.slot_mut(id) {
            s.component = Some(component);
        }
    }

    fn slot(&self, id: ComponentId) -> Option<&Slot> {
        let s = self.slots.get(id.idx())?.as_ref()?;
        (s.generation == id.1).then_some(s)
    }

    fn slot_mut(&mut self, id: ComponentId) -> Option<&mut Slot> {
        let s = self.slots.get_mut(id.idx())?.as_mut()?;
        if s.generation != id.1 {
            return None;
        }
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_tree::{LocalRect, Tree};

    struct Plain;
    impl Component for Plain {
        fn capabilities(&self) -> Capabilities {
            Capabilities::empty()
        }
    }

    struct Ignorer;
    impl Component for Ignorer {
        fn capabilities(&self) -> Capabilities {
            Capabilities::LAYOUT_IGNORER
        }
    }

    fn node() -> NodeId {
        Tree::new().insert(None, LocalRect::default())
    }

    #[test]
    fn per_node_lists_keep_attach_order() {
        let n = node();
        let mut store = ComponentStore::new();
        let a = store.insert(n, Plain);
        let b = store.insert(n, Ignorer);
        let c = store.insert(n, Plain);
        assert_eq!(store.on_node(n), &[a, b, c]);
        assert_eq!(
            store
                .with_capabilities(n, Capabilities::LAYOUT_IGNORER)
                .collect::<Vec<_>>(),
            vec![b]
        );
        assert_eq!(store.of_type::<Plain>(n).collect::<Vec<_>>(), vec![a, c]);

        assert!(store.remove(b).is_some());
        assert_eq!(store.on_node(n), &[a, c]);
        assert!(!store.is_alive(b));
    }

    #[test]
    fn taken_components_keep_their_metadata() {
        let n = node();
        let mut store = ComponentStore::new();
        let a = store.insert(n, Ignorer);
        let boxed = store.take(a).expect("component present");
        assert!(store.is_taken(a));
        assert!(store.get(a).is_none());
        assert_eq!(store.capabilities(a), Capabilities::LAYOUT_IGNORER);
        assert_eq!(store.node_of(a), Some(n));
        store.restore(a, boxed);
        assert!(store.downcast::<Ignorer>(a).is_some());
        assert!(store.downcast::<Plain>(a).is_none());
    }

    #[test]
    fn restore_after_removal_drops_the_component() {
        let n = node();
        let mut store = ComponentStore::new();
        let a = store.insert(n, Plain);
        let boxed = store.take(a).expect("component present");
        assert!(store.remove(a).is_none());
        store.restore(a, boxed);
        assert!(!store.is_alive(a));
        let b = store.insert(n, Plain);
        assert_ne!(a, b, "reused slot must get a new generation");
    }
}
