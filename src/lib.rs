//! Server-side rendering for a component-oriented HTML template
//! language: opcode-compiled templates, declarative shadow DOM, and
//! hydration markers.
//!
//! The public surface is deliberately small: build a [`TemplateResult`]
//! with [`html`] or [`server_html`], then [`render`] it to a [`Fragment`]
//! tree, then either [`stream::collect_sync`] it whole or drive it
//! through a chunk-coalescing [`stream::ByteStream`].

mod compile;
mod context;
mod digest;
mod directive;
mod element;
mod error;
mod escape;
mod executor;
mod fragment;
mod opcode;
mod stream;
mod template;
mod value;

pub use context::RenderContext;
pub use directive::{DirectiveResult, Resolved as DirectiveResolved, CLIENT_ONLY, FULL_SUPPORT, PARTIAL_SUPPORT};
pub use element::{
    define, aria_attribute_for, reflected_attribute_for, ElementRenderer, ElementRendererClass,
    ShadowRoot, ShadowRootMode,
};
pub use error::{RenderError, Result};
pub use fragment::Fragment;
pub use stream::{collect, collect_sync, ByteStream, StreamOptions};
pub use template::{html, server_html, Statics, TemplateResult};
pub use value::Value;

/// Renders a template to its [`Fragment`] tree (spec.md §4 "Rendering
/// pipeline"). Each call uses a fresh [`RenderContext`]; no state is
/// carried between renders.
#[tracing::instrument(level = "trace", skip_all)]
pub async fn render(template: TemplateResult) -> Result<Fragment> {
    let mut ctx = RenderContext::new();
    executor::execute_template(&mut ctx, template).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<T>(fut: impl std::future::Future<Output = T>) -> T {
        futures::executor::block_on(fut)
    }

    #[test]
    fn renders_a_simple_greeting() {
        static FRAGS: &[&str] = &["<p>Hello, ", "!</p>"];
        let template = html(FRAGS, vec![Value::Text("world".into())]);
        let fragment = run(render(template)).unwrap();
        let out = String::from_utf8(stream::collect_sync(&fragment)).unwrap();
        assert!(out.contains("Hello, world!"));
        assert!(out.starts_with("<!--lit-part"));
        assert!(out.ends_with("<!--/lit-part-->"));
    }

    #[test]
    fn renders_nested_templates() {
        static INNER: &[&str] = &["<span>", "</span>"];
        static OUTER: &[&str] = &["<div>", "</div>"];
        let inner = html(INNER, vec![Value::Text("nested".into())]);
        let outer = html(OUTER, vec![Value::Template(Box::new(inner))]);
        let fragment = run(render(outer)).unwrap();
        let out = String::from_utf8(stream::collect_sync(&fragment)).unwrap();
        assert!(out.contains("<span>"));
        assert!(out.contains("nested"));
    }

    #[test]
    fn renders_arrays_of_values_in_order() {
        static FRAGS: &[&str] = &["<ul>", "</ul>"];
        let items: Value = vec!["a", "b", "c"]
            .into_iter()
            .map(|s| Value::Text(s.to_string()))
            .collect::<Vec<_>>()
            .into();
        let template = html(FRAGS, vec![items]);
        let fragment = run(render(template)).unwrap();
        let out = String::from_utf8(stream::collect_sync(&fragment)).unwrap();
        let a_pos = out.find('a').unwrap();
        let b_pos = out.find('b').unwrap();
        let c_pos = out.find('c').unwrap();
        assert!(a_pos < b_pos && b_pos < c_pos);
    }

    // spec.md §8 scenario A: a single primitive child part inside a
    // hydratable template.
    #[test]
    fn scenario_a_primitive_child_part() {
        static FRAGS: &[&str] = &["<div>Hello, ", "!</div>"];
        let digest = digest::compute(FRAGS);
        let fragment = run(render(html(FRAGS, vec![Value::Text("Alice".into())]))).unwrap();
        let out = String::from_utf8(stream::collect_sync(&fragment)).unwrap();
        assert_eq!(
            out,
            format!(
                "<!--lit-part {digest}--><div>Hello, <!--lit-part-->Alice<!--/lit-part-->!</div><!--/lit-part-->"
            )
        );
    }

    // spec.md §8 scenario B: a boolean attribute and an event binding on
    // the same bound element.
    #[test]
    fn scenario_b_boolean_and_event_bindings() {
        static FRAGS: &[&str] = &["<button ?disabled=\"", "\" @click=\"", "\">OK</button>"];
        let template = html(FRAGS, vec![Value::Bool(true), Value::Text("handler".into())]);
        let fragment = run(render(template)).unwrap();
        let out = String::from_utf8(stream::collect_sync(&fragment)).unwrap();
        assert!(out.contains("<!--lit-node 0-->"));
        assert!(out.contains("<button disabled>OK</button>"));
        assert!(!out.contains("handler"));
    }

    // spec.md §8 scenario C: a server-only document wrapping a hydratable
    // fragment. No markers at the document level; the inner template keeps
    // its own. The exact placement of an implicit `<head>` is left to the
    // HTML parser (see DESIGN.md), so this checks structure rather than a
    // byte-exact match.
    #[test]
    fn scenario_c_server_only_wraps_hydratable() {
        static INNER: &[&str] = &["<p>", "</p>"];
        static OUTER: &[&str] = &["<!DOCTYPE html><html><body>", "</body></html>"];
        let inner = html(INNER, vec![Value::Text("x".into())]);
        let outer = server_html(OUTER, vec![Value::Template(Box::new(inner))]);
        let fragment = run(render(outer)).unwrap();
        let out = String::from_utf8(stream::collect_sync(&fragment)).unwrap();
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.contains("<html"));
        assert!(out.contains("<body"));
        assert!(out.contains("<!--lit-part"));
        assert!(out.contains("<p><!--lit-part-->x<!--/lit-part--></p>"));
        assert!(out.ends_with("</html>"));
        assert!(!out.starts_with("<!--lit-part"));
    }

    // spec.md §8 scenario D: an array of nested templates, each wrapping a
    // primitive child. Marker nesting must balance.
    #[test]
    fn scenario_d_array_of_nested_templates() {
        static ITEM: &[&str] = &["<li>", "</li>"];
        static LIST: &[&str] = &["<ul>", "</ul>"];
        let items: Value = vec!["a", "b"]
            .into_iter()
            .map(|s| Value::Template(Box::new(html(ITEM, vec![Value::Text(s.into())]))))
            .collect::<Vec<_>>()
            .into();
        let template = html(LIST, vec![items]);
        let fragment = run(render(template)).unwrap();
        let out = String::from_utf8(stream::collect_sync(&fragment)).unwrap();
        let opens = out.matches("<!--lit-part").count();
        let closes = out.matches("<!--/lit-part-->").count();
        assert_eq!(opens, closes);
        assert!(out.contains("<li>a</li>") || out.contains("<li><!--lit-part-->a"));
    }

    // spec.md §8 scenario E: a client-only directive fails with an error
    // naming it and listing the supported directives.
    #[test]
    fn scenario_e_client_only_directive_fails() {
        static FRAGS: &[&str] = &["", ""];
        let directive = DirectiveResult::ClientOnly { name: "cache" };
        let template = html(FRAGS, vec![Value::Directive(Box::new(directive))]);
        let err = run(render(template)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("cache"));
        assert!(FULL_SUPPORT.iter().any(|name| message.contains(name)));
    }

    // spec.md §8 scenario F: the same render, collected whole vs. streamed
    // through a 1-byte chunk size, must produce identical bytes.
    #[test]
    fn scenario_f_stream_equivalence_across_chunk_sizes() {
        static FRAGS: &[&str] = &["<div>Hello, ", "!</div>"];
        let whole = run(render(html(FRAGS, vec![Value::Text("Alice".into())]))).unwrap();
        let expected = stream::collect_sync(&whole);

        let chunked = run(render(html(FRAGS, vec![Value::Text("Alice".into())]))).unwrap();
        let tiny_stream = ByteStream::new(&chunked, StreamOptions { chunk_size: 1 });
        let tiny = run(stream::collect(tiny_stream));
        assert_eq!(tiny, expected);

        let unchunked = run(render(html(FRAGS, vec![Value::Text("Alice".into())]))).unwrap();
        let one_chunk_stream = ByteStream::new(&unchunked, StreamOptions { chunk_size: usize::MAX });
        let one_chunk = run(stream::collect(one_chunk_stream));
        assert_eq!(one_chunk, expected);
    }
}
