// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording stubs shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use trellis_tree::Axis;

use crate::component::{Capabilities, Component};
use crate::layout::{LayoutController, LayoutElement};
use crate::scene::ComponentCx;

/// Shared, ordered record of callback names.
#[derive(Clone, Default)]
pub(crate) struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub(crate) fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    /// Drain everything recorded so far.
    pub(crate) fn take(&self) -> Vec<String> {
        core::mem::take(&mut *self.0.borrow_mut())
    }
}

/// Logs every lifecycle hook as `name.hook`.
pub(crate) struct Recorder {
    pub(crate) name: &'static str,
    log: CallLog,
}

impl Recorder {
    pub(crate) fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            log: log.clone(),
        }
    }

    fn record(&self, hook: &str) {
        self.log.push(format!("{}.{hook}", self.name));
    }
}

impl Component for Recorder {
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    fn on_enable(&mut self, _cx: &mut ComponentCx<'_>) {
        self.record("enable");
    }

    fn on_disable(&mut self, _cx: &mut ComponentCx<'_>) {
        self.record("disable");
    }

    fn on_rect_transform_dimensions_change(&mut self, _cx: &mut ComponentCx<'_>) {
        self.record("dimensions");
    }

    fn on_before_transform_parent_changed(&mut self, _cx: &mut ComponentCx<'_>) {
        self.record("before_parent");
    }

    fn on_transform_parent_changed(&mut self, _cx: &mut ComponentCx<'_>) {
        self.record("parent");
    }

    fn on_transform_children_changed(&mut self, _cx: &mut ComponentCx<'_>) {
        self.record("children");
    }

    fn on_canvas_hierarchy_changed(&mut self, _cx: &mut ComponentCx<'_>) {
        self.record("canvas_hierarchy");
    }
}

/// A layout element with fixed sizes. Min defaults to 0, flexible to -1.
pub(crate) struct StubElement {
    min: [f64; 2],
    preferred: [f64; 2],
    flexible: [f64; 2],
    priority: i32,
    log: Option<(&'static str, CallLog)>,
}

impl StubElement {
    pub(crate) fn preferred(width: f64, height: f64) -> Self {
        Self {
            min: [0.0; 2],
            preferred: [width, height],
            flexible: [-1.0; 2],
            priority: 0,
            log: None,
        }
    }

    pub(crate) fn with_min(mut self, width: f64, height: f64) -> Self {
        self.min = [width, height];
        self
    }

    pub(crate) fn with_flexible(mut self, width: f64, height: f64) -> Self {
        self.flexible = [width, height];
        self
    }

    pub(crate) fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Record the calculation passes as `name.calc_h` / `name.calc_v`.
    pub(crate) fn logged(mut self, name: &'static str, log: &CallLog) -> Self {
        self.log = Some((name, log.clone()));
        self
    }

    fn record(&self, pass: &str) {
        if let Some((name, log)) = &self.log {
            log.push(format!("{name}.{pass}"));
        }
    }
}

impl LayoutElement for StubElement {
    fn calculate_layout_input_horizontal(&mut self, _cx: &mut ComponentCx<'_>) {
        self.record("calc_h");
    }

    fn calculate_layout_input_vertical(&mut self, _cx: &mut ComponentCx<'_>) {
        self.record("calc_v");
    }

    fn min_size(&self, axis: Axis) -> f64 {
        self.min[axis.index()]
    }

    fn preferred_size(&self, axis: Axis) -> f64 {
        self.preferred[axis.index()]
    }

    fn flexible_size(&self, axis: Axis) -> f64 {
        self.flexible[axis.index()]
    }

    fn layout_priority(&self) -> i32 {
        self.priority
    }
}

impl Component for StubElement {
    fn capabilities(&self) -> Capabilities {
        Capabilities::LAYOUT_ELEMENT
    }

    fn as_layout_element(&self) -> Option<&dyn LayoutElement> {
        Some(self)
    }

    fn as_layout_element_mut(&mut self) -> Option<&mut dyn LayoutElement> {
        Some(self)
    }
}

type Hook = Box<dyn FnMut(&mut ComponentCx<'_>)>;

/// A controller that logs `name.set_h` / `name.set_v` and can run a hook
/// during the horizontal pass.
pub(crate) struct StubController {
    name: &'static str,
    log: CallLog,
    self_controller: bool,
    on_horizontal: Option<Hook>,
}

impl StubController {
    pub(crate) fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            log: log.clone(),
            self_controller: false,
            on_horizontal: None,
        }
    }

    pub(crate) fn self_controller(mut self) -> Self {
        self.self_controller = true;
        self
    }

    pub(crate) fn on_horizontal(mut self, hook: impl FnMut(&mut ComponentCx<'_>) + 'static) -> Self {
        self.on_horizontal = Some(Box::new(hook));
        self
    }
}

impl LayoutController for StubController {
    fn set_layout_horizontal(&mut self, cx: &mut ComponentCx<'_>) {
        self.log.push(format!("{}.set_h", self.name));
        if let Some(hook) = &mut self.on_horizontal {
            hook(cx);
        }
    }

    fn set_layout_vertical(&mut self, _cx: &mut ComponentCx<'_>) {
        self.log.push(format!("{}.set_v", self.name));
    }
}

impl Component for StubController {
    fn capabilities(&self) -> Capabilities {
        if self.self_controller {
            Capabilities::LAYOUT_SELF_CONTROLLER_ALL
        } else {
            Capabilities::LAYOUT_CONTROLLER
        }
    }

    fn as_layout_controller_mut(&mut self) -> Option<&mut dyn LayoutController> {
        Some(self)
    }
}
