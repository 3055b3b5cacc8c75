//! The error taxonomy described in spec.md §7.
//!
//! Compile-time structural errors are cached alongside the opcode list they
//! describe (see [`crate::compile`]), so a template that fails to compile
//! fails identically on every subsequent render. Runtime directive errors
//! and internal invariant violations surface through the same enum so
//! callers don't need to match on multiple error types.

use thiserror::Error;

/// Every error this crate can produce, grouped the way spec.md §7 groups
/// them: template-structure errors, directive errors, and internal
/// invariant violations.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// A property binding (`.name=`) appeared in a server-only template.
    #[error("property bindings are forbidden in server-only templates")]
    ForbiddenPropertyBinding,

    /// An event binding (`@name=`) appeared in a server-only template.
    #[error("event bindings are forbidden in server-only templates")]
    ForbiddenEventBinding,

    /// An element-part binding appeared in a server-only template.
    #[error("element-part bindings are forbidden in server-only templates")]
    ForbiddenElementPartBinding,

    /// A binding appeared inside an executable `<script>` element.
    #[error("bindings are not allowed inside an executable <script> element")]
    BindingInScript,

    /// A binding appeared inside a `<style>` element of a server-only
    /// template.
    #[error("bindings are not allowed inside <style> in a server-only template")]
    BindingInStyle,

    /// A server-only template was nested inside a hydratable one.
    #[error(
        "a server-only template cannot be rendered inside a hydratable template"
    )]
    ServerOnlyInsideHydratable,

    /// A client-only directive was resolved during SSR.
    #[error(
        "`{name}` is a client-only directive and has no server-rendering \
         behavior; fully supported directives are {full:?}; \
         render-only directives are {partial:?}"
    )]
    UnsupportedDirective {
        /// Human-readable directive name, as given to the error message.
        name: &'static str,
        /// The fully supported directive list, from spec.md §6.
        full: &'static [&'static str],
        /// The partially (render-only) supported directive list.
        partial: &'static [&'static str],
    },

    /// A bug in this crate: an opcode's `partIndex` bookkeeping did not
    /// land on `values.len()` at the end of execution, an opcode walked the
    /// compiler's offset backwards, or an unknown opcode kind was
    /// encountered.
    #[error("internal invariant violation: {0}")]
    Internal(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
