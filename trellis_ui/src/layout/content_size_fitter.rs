// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use trellis_tree::{Axis, DrivenProperties, DrivenTracker};

use super::{LayoutController, LayoutGroupCore, LayoutUtility};
use crate::component::{Capabilities, Component};
use crate::scene::ComponentCx;

/// What a [`ContentSizeFitter`] sizes its node to along one axis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FitMode {
    /// Leave the size alone.
    #[default]
    Unconstrained,
    /// The node's resolved minimum size.
    MinSize,
    /// The node's resolved preferred size.
    PreferredSize,
}

/// Resizes its own node to the sizes its layout elements report.
#[derive(Clone, Debug, Default)]
pub struct ContentSizeFitter {
    /// Horizontal mode.
    pub horizontal_fit: FitMode,
    /// Vertical mode.
    pub vertical_fit: FitMode,
    tracker: DrivenTracker,
}

impl ContentSizeFitter {
    /// A fitter with the given modes.
    pub fn new(horizontal_fit: FitMode, vertical_fit: FitMode) -> Self {
        Self {
            horizontal_fit,
            vertical_fit,
            tracker: DrivenTracker::new(),
        }
    }

    /// Mode along `axis`.
    pub fn fit(&self, axis: Axis) -> FitMode {
        match axis {
            Axis::Horizontal => self.horizontal_fit,
            Axis::Vertical => self.vertical_fit,
        }
    }

    /// Change the mode along `axis`, rebuilding if it differs.
    pub fn set_fit(&mut self, cx: &mut ComponentCx<'_>, axis: Axis, fit: FitMode) {
        let field = match axis {
            Axis::Horizontal => &mut self.horizontal_fit,
            Axis::Vertical => &mut self.vertical_fit,
        };
        if *field != fit {
            *field = fit;
            LayoutGroupCore::set_dirty(cx);
        }
    }

    fn handle_self_fitting_along_axis(&mut self, cx: &mut ComponentCx<'_>, axis: Axis) {
        let node = cx.node();
        let size = match self.fit(axis) {
            FitMode::Unconstrained => return,
            FitMode::MinSize => LayoutUtility::min_size(cx.scene(), node, axis),
            FitMode::PreferredSize => LayoutUtility::preferred_size(cx.scene(), node, axis),
        };
        let tree = cx.tree_mut();
        self.tracker.add(tree, node, DrivenProperties::size(axis));
        tree.set_size_along_axis(node, axis, size);
    }
}

impl LayoutController for ContentSizeFitter {
    fn set_layout_horizontal(&mut self, cx: &mut ComponentCx<'_>) {
        self.tracker.clear(cx.tree_mut());
        self.handle_self_fitting_along_axis(cx, Axis::Horizontal);
    }

    fn set_layout_vertical(&mut self, cx: &mut ComponentCx<'_>) {
        self.handle_self_fitting_along_axis(cx, Axis::Vertical);
    }
}

impl Component for ContentSizeFitter {
    fn capabilities(&self) -> Capabilities {
        Capabilities::LAYOUT_SELF_CONTROLLER_ALL
    }

    fn as_layout_controller_mut(&mut self) -> Option<&mut dyn LayoutController> {
        Some(self)
    }

    fn on_enable(&mut self, cx: &mut ComponentCx<'_>) {
        LayoutGroupCore::set_dirty(cx);
    }

    fn on_disable(&mut self, cx: &mut ComponentCx<'_>) {
        self.tracker.clear(cx.tree_mut());
        cx.mark_layout_for_rebuild();
    }

    fn on_rect_transform_dimensions_change(&mut self, cx: &mut ComponentCx<'_>) {
        LayoutGroupCore::set_dirty(cx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::HorizontalOrVerticalLayoutGroup;
    use crate::scene::Scene;
    use crate::test_util::StubElement;
    use kurbo::Size;
    use trellis_tree::LocalRect;

    #[test]
    fn fits_a_leaf_to_its_element() {
        let mut scene = Scene::default();
        let node = scene.create_node(None, LocalRect::sized(1.0, 1.0));
        scene.add_component(node, StubElement::preferred(30.0, 40.0).with_min(10.0, 15.0));
        let id = scene
            .add_component(
                node,
                ContentSizeFitter::new(FitMode::PreferredSize, FitMode::MinSize),
            )
            .expect("node is alive");
        scene.update();
        assert_eq!(scene.tree().size(node), Size::new(30.0, 15.0));
        assert_eq!(scene.tree().driven_properties(node), DrivenProperties::SIZE);

        scene.update_component::<ContentSizeFitter, _>(id, |f, cx| {
            f.set_fit(cx, Axis::Vertical, FitMode::Unconstrained);
        });
        scene.update();
        assert_eq!(scene.tree().size(node), Size::new(30.0, 15.0));
        assert_eq!(scene.tree().driven_properties(node), DrivenProperties::WIDTH);
    }

    #[test]
    fn wraps_a_row_around_its_children() {
        let mut scene = Scene::default();
        let root = scene.create_node(None, LocalRect::sized(500.0, 30.0));
        let mut group = HorizontalOrVerticalLayoutGroup::horizontal();
        group.spacing = 10.0;
        group.child_force_expand_width = false;
        scene.add_component(root, group);
        scene.add_component(
            root,
            ContentSizeFitter::new(FitMode::PreferredSize, FitMode::Unconstrained),
        );
        let kids: Vec<_> = (0..2)
            .map(|_| {
                let n = scene.create_node(Some(root), LocalRect::sized(1.0, 1.0));
                scene.add_component(n, StubElement::preferred(50.0, 20.0));
                n
            })
            .collect();
        scene.update();
        assert_eq!(scene.tree().size(root), Size::new(110.0, 30.0));
        assert_eq!(scene.tree().position(kids[1]).x, 60.0);

        // The resize re-dirties once, and the next frame settles.
        scene.update();
        scene.update();
        assert_eq!(scene.canvas_updates().pending_layout_rebuilds(), 0);
        assert_eq!(scene.tree().size(root), Size::new(110.0, 30.0));
    }

    #[test]
    fn disabling_releases_without_reverting() {
        let mut scene = Scene::default();
        let node = scene.create_node(None, LocalRect::sized(1.0, 1.0));
        scene.add_component(node, StubElement::preferred(30.0, 40.0));
        let id = scene
            .add_component(
                node,
                ContentSizeFitter::new(FitMode::PreferredSize, FitMode::PreferredSize),
            )
            .expect("node is alive");
        scene.update();
        scene.set_component_enabled(id, false);
        assert_eq!(scene.tree().size(node), Size::new(30.0, 40.0));
        assert!(scene.tree().driven_properties(node).is_empty());
    }
}
