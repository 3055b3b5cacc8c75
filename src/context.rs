//! Per-render mutable state threaded through opcode execution (spec.md
//! §4.6, §4.7): the custom-element instance stack and the
//! enclosing-host stack used to decide when nested custom elements need
//! a `defer-hydration` marker.

use crate::element::ElementRenderer;

/// One entry of the host stack: the tag name of a custom element whose
/// light-DOM children are currently being rendered.
#[derive(Debug, Clone)]
pub struct HostFrame {
    pub tag_name: String,
}

/// State carried across one top-level `render` call and all of the
/// nested templates it walks. Not `Send`-shared: a fresh `RenderContext`
/// is created per render and never reused (spec.md §5 "no state is
/// carried between renders").
#[derive(Default)]
pub struct RenderContext {
    instance_stack: Vec<Box<dyn ElementRenderer>>,
    host_stack: Vec<HostFrame>,
    /// Whether each currently-executing template (innermost last) is
    /// hydratable, so a server-only template nested inside a hydratable
    /// one can be rejected (spec.md §6).
    hydratable_stack: Vec<bool>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_instance(&mut self, instance: Box<dyn ElementRenderer>) {
        self.instance_stack.push(instance);
    }

    pub fn pop_instance(&mut self) -> Option<Box<dyn ElementRenderer>> {
        self.instance_stack.pop()
    }

    pub fn current_instance_mut(&mut self) -> Option<&mut Box<dyn ElementRenderer>> {
        self.instance_stack.last_mut()
    }

    pub fn push_host(&mut self, tag_name: impl Into<String>) {
        self.host_stack.push(HostFrame { tag_name: tag_name.into() });
    }

    pub fn pop_host(&mut self) -> Option<HostFrame> {
        self.host_stack.pop()
    }

    pub fn is_inside_custom_element_host(&self) -> bool {
        !self.host_stack.is_empty()
    }

    pub fn push_hydratable(&mut self, hydratable: bool) {
        self.hydratable_stack.push(hydratable);
    }

    pub fn pop_hydratable(&mut self) {
        self.hydratable_stack.pop();
    }

    pub fn current_hydratable(&self) -> Option<bool> {
        self.hydratable_stack.last().copied()
    }
}
