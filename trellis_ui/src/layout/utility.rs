// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use trellis_tree::{Axis, NodeId};

use super::LayoutElement;
use crate::component::{Capabilities, ComponentId};
use crate::scene::Scene;

/// One of the three sizes a [`LayoutElement`] reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LayoutProperty {
    /// Minimum size.
    Min,
    /// Preferred size.
    Preferred,
    /// Flexible share.
    Flexible,
}

impl LayoutProperty {
    fn read(self, element: &dyn LayoutElement, axis: Axis) -> f64 {
        match self {
            Self::Min => element.min_size(axis),
            Self::Preferred => element.preferred_size(axis),
            Self::Flexible => element.flexible_size(axis),
        }
    }
}

/// Resolves a node's effective layout sizes from all of its layout elements.
#[derive(Debug)]
pub struct LayoutUtility;

impl LayoutUtility {
    /// Effective minimum size of `node` along `axis`.
    pub fn min_size(scene: &Scene, node: NodeId, axis: Axis) -> f64 {
        Self::layout_property(scene, node, axis, LayoutProperty::Min, 0.0)
    }

    /// Effective preferred size of `node` along `axis`, never below the minimum.
    pub fn preferred_size(scene: &Scene, node: NodeId, axis: Axis) -> f64 {
        let min = Self::layout_property(scene, node, axis, LayoutProperty::Min, 0.0);
        let preferred = Self::layout_property(scene, node, axis, LayoutProperty::Preferred, 0.0);
        min.max(preferred)
    }

    /// Effective flexible size of `node` along `axis`.
    pub fn flexible_size(scene: &Scene, node: NodeId, axis: Axis) -> f64 {
        Self::layout_property(scene, node, axis, LayoutProperty::Flexible, 0.0)
    }

    /// Resolve `property` over the active layout elements of `node`.
    ///
    /// A higher priority replaces the running value; an equal priority keeps the
    /// larger value; negative values are skipped. Returns `default` if nothing
    /// contributes.
    pub fn layout_property(
        scene: &Scene,
        node: NodeId,
        axis: Axis,
        property: LayoutProperty,
        default: f64,
    ) -> f64 {
        Self::layout_property_with_source(scene, node, axis, property, default).0
    }

    /// Like [`layout_property`](Self::layout_property), also returning the
    /// component that supplied the value.
    pub fn layout_property_with_source(
        scene: &Scene,
        node: NodeId,
        axis: Axis,
        property: LayoutProperty,
        default: f64,
    ) -> (f64, Option<ComponentId>) {
        let mut value = default;
        let mut max_priority = i32::MIN;
        let mut source = None;
        for id in scene
            .components
            .with_capabilities(node, Capabilities::LAYOUT_ELEMENT)
        {
            if !scene.is_component_active(id) {
                continue;
            }
            let Some(element) = scene.components.get(id).and_then(|c| c.as_layout_element())
            else {
                continue;
            };
            let priority = element.layout_priority();
            if priority < max_priority {
                continue;
            }
            let candidate = property.read(element, axis);
            if candidate < 0.0 {
                continue;
            }
            if priority > max_priority {
                value = candidate;
                max_priority = priority;
                source = Some(id);
            } else if candidate > value {
                value = candidate;
                source = Some(id);
            }
        }
        (value, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::StubElement;
    use trellis_tree::LocalRect;

    fn scene_with(elements: Vec<StubElement>) -> (Scene, NodeId, Vec<ComponentId>) {
        let mut scene = Scene::default();
        let node = scene.create_node(None, LocalRect::sized(100.0, 100.0));
        let ids = elements
            .into_iter()
            .map(|e| scene.add_component(node, e).expect("node is alive"))
            .collect();
        (scene, node, ids)
    }

    #[test]
    fn higher_priority_wins_even_when_smaller() {
        let (scene, node, ids) = scene_with(vec![
            StubElement::preferred(10.0, 0.0),
            StubElement::preferred(5.0, 0.0).with_priority(1),
        ]);
        assert_eq!(LayoutUtility::preferred_size(&scene, node, Axis::Horizontal), 5.0);
        let (_, source) = LayoutUtility::layout_property_with_source(
            &scene,
            node,
            Axis::Horizontal,
            LayoutProperty::Preferred,
            0.0,
        );
        assert_eq!(source, Some(ids[1]));
    }

    #[test]
    fn equal_priority_takes_the_larger_value() {
        let (scene, node, _) = scene_with(vec![
            StubElement::preferred(10.0, 0.0),
            StubElement::preferred(20.0, 0.0),
        ]);
        assert_eq!(LayoutUtility::preferred_size(&scene, node, Axis::Horizontal), 20.0);

        let (scene, node, _) = scene_with(vec![
            StubElement::preferred(20.0, 0.0),
            StubElement::preferred(10.0, 0.0),
        ]);
        assert_eq!(LayoutUtility::preferred_size(&scene, node, Axis::Horizontal), 20.0);
    }

    #[test]
    fn negative_values_are_ignored() {
        // The negative element has the higher priority but must not claim it.
        let (scene, node, _) = scene_with(vec![
            StubElement::preferred(-1.0, 0.0).with_priority(5),
            StubElement::preferred(7.0, 0.0),
        ]);
        assert_eq!(LayoutUtility::preferred_size(&scene, node, Axis::Horizontal), 7.0);

        let (scene, node, _) = scene_with(vec![StubElement::preferred(-1.0, -1.0)]);
        assert_eq!(
            LayoutUtility::layout_property(
                &scene,
                node,
                Axis::Vertical,
                LayoutProperty::Preferred,
                3.0
            ),
            3.0
        );
    }

    #[test]
    fn preferred_is_at_least_min() {
        let (scene, node, _) =
            scene_with(vec![StubElement::preferred(10.0, 0.0).with_min(15.0, 0.0)]);
        assert_eq!(LayoutUtility::min_size(&scene, node, Axis::Horizontal), 15.0);
        assert_eq!(LayoutUtility::preferred_size(&scene, node, Axis::Horizontal), 15.0);
    }

    #[test]
    fn disabled_elements_do_not_contribute() {
        let (mut scene, node, ids) = scene_with(vec![
            StubElement::preferred(10.0, 0.0).with_flexible(2.0, 0.0),
            StubElement::preferred(30.0, 0.0).with_priority(3),
        ]);
        scene.set_component_enabled(ids[1], false);
        assert_eq!(LayoutUtility::preferred_size(&scene, node, Axis::Horizontal), 10.0);
        assert_eq!(LayoutUtility::flexible_size(&scene, node, Axis::Horizontal), 2.0);
        scene.set_active(node, false);
        assert_eq!(LayoutUtility::preferred_size(&scene, node, Axis::Horizontal), 0.0);
    }
}
