//! Custom-element renderer registry and lifecycle (spec.md §4.5, §4.6).
//!
//! The source system lets a custom element supply its own server-side
//! renderer class, instantiated per occurrence, that can observe
//! property/attribute bindings, run a connected-callback equivalent, and
//! emit a declarative shadow root. This module is that registry plus the
//! built-in fallback behavior for tag names with no registered renderer.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use or_poisoned::OrPoisoned;

use crate::template::TemplateResult;

/// Per-occurrence state for one custom element instance during a render.
pub trait ElementRenderer: Send {
    /// Reflects a bound property onto its instance, per the table in
    /// spec.md §4.5. The default implementation does nothing, which is
    /// correct for any property not present in that table.
    fn set_property(&mut self, _name: &str, _value: &str) {}

    /// Runs after all of the element's attribute/property bindings have
    /// been applied; returns the attributes that should additionally be
    /// serialized onto the host tag (e.g. ARIA mirrored from a property,
    /// per spec.md §4.6).
    fn connected_callback(&mut self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// The element's declarative shadow root content, if it has one.
    /// Returning `None` means the element has no shadow root at all
    /// (distinct from an empty one).
    fn shadow_root(&mut self) -> Option<ShadowRoot> {
        None
    }
}

/// A declarative shadow root to be serialized as
/// `<template shadowrootmode="MODE">...</template>` (spec.md §4.6).
pub struct ShadowRoot {
    pub mode: ShadowRootMode,
    pub content: TemplateResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowRootMode {
    Open,
    Closed,
}

impl ShadowRootMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ShadowRootMode::Open => "open",
            ShadowRootMode::Closed => "closed",
        }
    }
}

/// A factory for one custom element tag's [`ElementRenderer`].
pub trait ElementRendererClass: Send + Sync {
    fn create(&self) -> Box<dyn ElementRenderer>;
}

/// The renderer used for a custom element with no registered class: it
/// reflects nothing, runs no lifecycle behavior, and has no shadow root
/// (spec.md §4.6 "Fallback behavior").
#[derive(Default)]
pub struct FallbackRenderer;

impl ElementRenderer for FallbackRenderer {}

/// The process-wide table of tag name to renderer factory (spec.md §5
/// "Global state"), mirroring a browser's `customElements` registry.
static REGISTRY: Lazy<RwLock<HashMap<String, &'static dyn ElementRendererClass>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a renderer class for a custom element tag name. Re-registering
/// the same tag name replaces the previous renderer, matching
/// `customElements.define`'s one-definition-per-name behavior (a second
/// call in the browser throws; here the last writer wins, since this
/// crate only ever runs single-process and is not trying to model a
/// misbehaving caller).
pub fn define(tag_name: impl Into<String>, class: &'static dyn ElementRendererClass) {
    REGISTRY.write().or_poisoned().insert(tag_name.into(), class);
}

/// Instantiates the renderer registered for `tag_name`, or a
/// [`FallbackRenderer`] if none is registered.
pub fn create_renderer(tag_name: &str) -> Box<dyn ElementRenderer> {
    match REGISTRY.read().or_poisoned().get(tag_name) {
        Some(class) => class.create(),
        None => Box::new(FallbackRenderer),
    }
}

/// Property names reflected to attributes on the host element, and the
/// attribute name each reflects to (spec.md §4.5). Properties not in this
/// table are applied to the in-memory instance only and never reach
/// serialized output.
pub const REFLECTED_PROPERTIES: &[(&str, &str)] = &[
    ("id", "id"),
    ("className", "class"),
    ("title", "title"),
    ("lang", "lang"),
    ("dir", "dir"),
    ("hidden", "hidden"),
    ("tabIndex", "tabindex"),
    ("value", "value"),
    ("checked", "checked"),
    ("disabled", "disabled"),
];

/// Looks up the attribute a property name reflects to, if any.
pub fn reflected_attribute_for(property: &str) -> Option<&'static str> {
    REFLECTED_PROPERTIES
        .iter()
        .find(|(p, _)| *p == property)
        .map(|(_, attr)| *attr)
}

/// ARIA-related property to attribute mirroring (spec.md §4.6): these are
/// mirrored from the instance back onto the host tag during
/// `connected_callback`, in addition to (not instead of) any explicit
/// `aria-*` attribute binding already present.
pub const ARIA_MIRRORED_PROPERTIES: &[(&str, &str)] = &[
    ("role", "role"),
    ("ariaLabel", "aria-label"),
    ("ariaHidden", "aria-hidden"),
    ("ariaExpanded", "aria-expanded"),
    ("ariaDisabled", "aria-disabled"),
    ("ariaChecked", "aria-checked"),
    ("ariaSelected", "aria-selected"),
];

pub fn aria_attribute_for(property: &str) -> Option<&'static str> {
    ARIA_MIRRORED_PROPERTIES
        .iter()
        .find(|(p, _)| *p == property)
        .map(|(_, attr)| *attr)
}
