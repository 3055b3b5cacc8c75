//! Directive classification and resolution (spec.md §6, §4.3 step 1, §4.7).
//!
//! A directive is, in the source language, a function result tagged with
//! an identity so the renderer can recognize it without running arbitrary
//! code. Since this crate has no macro front end producing such tags, a
//! directive invocation is instead modeled directly as a variant of this
//! enum — the caller builds a [`DirectiveResult`] the way it would call a
//! directive function, and the renderer resolves it exactly the way
//! spec.md §4.7 describes: full directives render their underlying
//! content, partial directives render with reduced behavior, and
//! client-only directives are a compile-time-classified error.

use crate::error::{RenderError, Result};
use crate::value::Value;

/// What a resolved directive expands to, from the executor's point of
/// view.
#[derive(Debug)]
pub enum Resolved {
    /// A single value to render in place of the directive.
    Value(Value),
    /// Multiple values, rendered left to right (e.g. `repeat`, `map`,
    /// `join`, `range`).
    Values(Vec<Value>),
    /// Content that bypasses escaping entirely (`unsafeHTML`/`unsafeSVG`/
    /// `unsafeMathML`).
    RawHtml(String),
}

/// A directive invocation. Full-support and partial directives carry
/// their operands pre-evaluated by the caller, since this crate has no
/// expression language of its own to defer them with; client-only
/// directives carry nothing but their name, because SSR never evaluates
/// their arguments at all (spec.md §6).
#[derive(Debug)]
pub enum DirectiveResult {
    /// `repeat`: full support.
    Repeat(Vec<Value>),
    /// `map`: full support.
    Map(Vec<Value>),
    /// `join`: full support.
    Join(Vec<Value>, String),
    /// `range`: full support.
    Range(Vec<Value>),
    /// `when`: full support.
    When { condition: bool, truthy: Box<Value>, falsy: Box<Value> },
    /// `choose`: full support.
    Choose { matched: bool, case: Box<Value> },
    /// `ifDefined`: full support. Only meaningful on an attribute part;
    /// `None` omits the attribute.
    IfDefined(Option<Box<Value>>),
    /// `guard`: full support. SSR has no previous render to compare
    /// against, so this always (re-)renders its value.
    Guard(Box<Value>),
    /// `unsafeHTML`: full support.
    UnsafeHtml(String),
    /// `unsafeSVG`: full support.
    UnsafeSvg(String),
    /// `unsafeMathML`: full support.
    UnsafeMathMl(String),
    /// `classMap`: partial, render-only. Entries are emitted in iteration
    /// order; no update-time diffing exists to omit.
    ClassMap(Vec<(String, bool)>),
    /// `styleMap`: partial, render-only.
    StyleMap(Vec<(String, String)>),
    /// `keyed`: partial, render-only. The key itself has no SSR meaning
    /// since there is no prior render to compare it against.
    Keyed { value: Box<Value> },
    /// A directive with no meaningful server-side behavior
    /// (`cache`, `live`, `until`, `asyncAppend`, `asyncReplace`, `ref`,
    /// `templateContent`): using one is a render error (spec.md §6).
    ClientOnly { name: &'static str },
}

/// Names of directives with full SSR support (spec.md §6).
pub const FULL_SUPPORT: &[&str] = &[
    "repeat",
    "map",
    "join",
    "range",
    "when",
    "choose",
    "ifDefined",
    "guard",
    "unsafeHTML",
    "unsafeSVG",
    "unsafeMathML",
];

/// Names of directives with partial, render-only SSR support.
pub const PARTIAL_SUPPORT: &[&str] = &["classMap", "styleMap", "keyed"];

/// Names of directives with no SSR behavior at all.
pub const CLIENT_ONLY: &[&str] = &[
    "cache",
    "live",
    "until",
    "asyncAppend",
    "asyncReplace",
    "ref",
    "templateContent",
];

impl DirectiveResult {
    /// Expands this directive invocation into renderable content, or
    /// fails if it names a client-only directive (spec.md §4.7).
    pub fn resolve(self) -> Result<Resolved> {
        match self {
            DirectiveResult::Repeat(items)
            | DirectiveResult::Map(items)
            | DirectiveResult::Range(items) => Ok(Resolved::Values(items)),
            DirectiveResult::Join(items, separator) => {
                use itertools::Itertools;
                let out = items
                    .into_iter()
                    .intersperse_with(|| Value::Text(separator.clone()))
                    .collect();
                Ok(Resolved::Values(out))
            }
            DirectiveResult::When { condition, truthy, falsy } => {
                Ok(Resolved::Value(if condition { *truthy } else { *falsy }))
            }
            DirectiveResult::Choose { matched, case } => Ok(Resolved::Value(if matched {
                *case
            } else {
                Value::Nothing
            })),
            DirectiveResult::IfDefined(value) => Ok(Resolved::Value(match value {
                Some(v) => *v,
                None => Value::Nothing,
            })),
            DirectiveResult::Guard(value) => Ok(Resolved::Value(*value)),
            DirectiveResult::UnsafeHtml(html)
            | DirectiveResult::UnsafeSvg(html)
            | DirectiveResult::UnsafeMathMl(html) => Ok(Resolved::RawHtml(html)),
            DirectiveResult::ClassMap(entries) => {
                let joined = entries
                    .into_iter()
                    .filter(|(_, included)| *included)
                    .map(|(name, _)| name)
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok(Resolved::Value(Value::Text(joined)))
            }
            DirectiveResult::StyleMap(entries) => {
                let joined = entries
                    .into_iter()
                    .map(|(prop, value)| format!("{prop}: {value};"))
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok(Resolved::Value(Value::Text(joined)))
            }
            DirectiveResult::Keyed { value } => Ok(Resolved::Value(*value)),
            DirectiveResult::ClientOnly { name } => {
                Err(RenderError::UnsupportedDirective {
                    name,
                    full: FULL_SUPPORT,
                    partial: PARTIAL_SUPPORT,
                })
            }
        }
    }
}
