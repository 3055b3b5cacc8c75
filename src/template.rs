//! `TemplateResult` and the template-identity problem (spec.md §3, §9
//! "Tagged-template identity without closures").
//!
//! The source language this system was specified against gives every
//! tagged-template-literal call site a cheap, stable identity for free:
//! the same call site always produces the same backing array of static
//! strings, and that array can be hashed by reference. Rust has no
//! equivalent syntax, so this crate takes the option spec.md names
//! explicitly: "require the caller to allocate and reuse a template
//! descriptor at declaration sites". A `TemplateResult` is built from a
//! `&'static [&'static str]` that the caller declares once (typically as a
//! `static` item) and passes by reference on every render; the opcode and
//! digest caches key off that slice's address.

use crate::value::Value;

/// The static-fragment half of a template: the strings between the holes,
/// declared once per call site and reused on every render.
///
/// Two `Statics` values are considered the same template if and only if
/// they point at the same backing slice — not if their contents happen to
/// be equal. This matches spec.md's invariant that the opcode cache is
/// keyed by *identity*, not by structural equality, and is what lets a
/// cache hit be an `O(1)` pointer comparison rather than an `O(n)` string
/// comparison.
#[derive(Clone, Copy, Debug)]
pub struct Statics(pub &'static [&'static str]);

impl Statics {
    /// A stable, process-lifetime identity for this static-fragment array.
    /// Used as the opcode-cache and digest-cache key.
    pub fn identity(&self) -> usize {
        self.0.as_ptr() as usize
    }

    /// The static fragments themselves, in source order.
    pub fn fragments(&self) -> &'static [&'static str] {
        self.0
    }
}

impl PartialEq for Statics {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}
impl Eq for Statics {}

/// An already-assembled template: the input to rendering (spec.md §3).
///
/// Core never sees the tagged-template syntax that produced this; it only
/// ever consumes `TemplateResult`s, which is why a front-end that collects
/// static strings and dynamic values from some other syntax (a macro, a
/// builder, a parser) can sit in front of this crate without it knowing or
/// caring.
#[derive(Debug)]
pub struct TemplateResult {
    pub(crate) statics: Statics,
    pub(crate) values: Vec<Value>,
    pub(crate) hydratable: bool,
}

impl TemplateResult {
    /// Constructs a hydratable template result: markers are emitted, any
    /// binding kind is allowed, and it may not contain a server-only
    /// template.
    pub fn hydratable(statics: &'static [&'static str], values: Vec<Value>) -> Self {
        Self {
            statics: Statics(statics),
            values,
            hydratable: true,
        }
    }

    /// Constructs a server-only template result: no markers are ever
    /// emitted, top-level document structure and raw-text bindings are
    /// permitted, and property/event bindings are forbidden.
    pub fn server_only(statics: &'static [&'static str], values: Vec<Value>) -> Self {
        Self {
            statics: Statics(statics),
            values,
            hydratable: false,
        }
    }

    /// Whether this template was constructed with [`TemplateResult::hydratable`].
    pub fn is_hydratable(&self) -> bool {
        self.hydratable
    }

    pub(crate) fn statics(&self) -> Statics {
        self.statics
    }
}

/// Tagged-template constructor for hydratable templates. Mirrors the
/// `html` tag from the template-literal front end (out of scope per
/// spec.md §1) closely enough to use from tests and from callers that
/// don't have their own front end: `html(&STATICS, values)`.
pub fn html(statics: &'static [&'static str], values: Vec<Value>) -> TemplateResult {
    TemplateResult::hydratable(statics, values)
}

/// Tagged-template constructor for server-only templates (spec.md §6,
/// `serverHtml`).
pub fn server_html(statics: &'static [&'static str], values: Vec<Value>) -> TemplateResult {
    TemplateResult::server_only(statics, values)
}
