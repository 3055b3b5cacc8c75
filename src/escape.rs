//! HTML-entity escaping and the four fixed hydration marker strings
//! (spec.md §4.3, §6).
//!
//! These are pure, total functions: nothing here allocates more than the
//! output buffer, and nothing here can fail.

use std::fmt::Write as _;

/// Escapes the five characters spec.md §4.3 names, in a single left-to-right
/// pass. Anything else passes through untouched.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Same escape set as [`escape_text`]; kept as a separate name because
/// spec.md §4.3 calls out attribute-value escaping and text escaping as
/// the same operation applied at different call sites, and callers read
/// more clearly when the call site says which one they mean.
pub fn escape_attr(s: &str) -> String {
    escape_text(s)
}

/// `<!--lit-part DIGEST-->`, opening a hydratable template whose static
/// structure hashes to `digest`.
pub fn open_part_with_digest(digest: &str) -> String {
    let mut out = String::with_capacity(14 + digest.len());
    out.push_str("<!--lit-part ");
    out.push_str(digest);
    out.push_str("-->");
    out
}

/// `<!--lit-part-->`, opening a child-part that has no digest of its own
/// (a primitive value, an array, or the empty/`nothing` part).
pub const OPEN_PART: &str = "<!--lit-part-->";

/// `<!--/lit-part-->`, closing any child-part or template part.
pub const CLOSE_PART: &str = "<!--/lit-part-->";

/// `<!--lit-node N-->`, marking the Nth depth-first comment/element node as
/// carrying bindings the hydration client needs to find.
pub fn node_marker(node_index: usize) -> String {
    let mut out = String::with_capacity(14);
    out.push_str("<!--lit-node ");
    let _ = write!(out, "{node_index}");
    out.push_str("-->");
    out
}
