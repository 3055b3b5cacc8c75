//! Walks a compiled opcode list in lockstep with a template's dynamic
//! values, producing a [`Fragment`] tree (spec.md §4.3, §4.4).
//!
//! Every recursive call here returns a boxed, pinned future rather than
//! being declared `async fn` directly: a template can render a nested
//! template, whose values can themselves render further nested
//! templates, and an `async fn` calling itself is a future whose size
//! depends on itself. Boxing at each recursive entry point erases that
//! self-reference the same way `Box<dyn Trait>` erases a recursive enum.

use std::future::Future;
use std::pin::Pin;

use crate::compile;
use crate::context::RenderContext;
use crate::directive::{DirectiveResult, Resolved};
use crate::element::{self, ShadowRootMode};
use crate::error::{RenderError, Result};
use crate::escape::{self, CLOSE_PART, OPEN_PART};
use crate::fragment::Fragment;
use crate::opcode::{AttrKind, Opcode};
use crate::template::TemplateResult;
use crate::value::Value;

type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Renders a template and everything it contains, consuming it (spec.md
/// §4.3: a template is rendered exactly once).
pub fn execute_template<'a>(
    ctx: &'a mut RenderContext,
    template: TemplateResult,
) -> BoxedFuture<'a, Result<Fragment>> {
    Box::pin(async move {
        let opcodes = compile::compile_for(template.statics())?;
        let hydratable = template.is_hydratable();
        if !hydratable && ctx.current_hydratable() == Some(true) {
            return Err(RenderError::ServerOnlyInsideHydratable);
        }
        ctx.push_hydratable(hydratable);
        let digest = hydratable.then(|| crate::digest::digest_for(template.statics()));
        let mut values = template.values.into_iter();
        let mut chunks: Vec<Fragment> = Vec::new();

        if hydratable {
            chunks.push(Fragment::Chunk(escape::open_part_with_digest(&digest.unwrap())));
        }

        for op in opcodes.ops.iter() {
            match op {
                Opcode::Text(s) => chunks.push(Fragment::Chunk(s.clone())),

                Opcode::PossibleNodeMarker { bound_attributes_count, node_index } => {
                    if hydratable
                        && (*bound_attributes_count > 0 || ctx.is_inside_custom_element_host())
                    {
                        chunks.push(Fragment::Chunk(escape::node_marker(*node_index)));
                    }
                }

                Opcode::ChildPart { .. } => {
                    let value = values
                        .next()
                        .ok_or(RenderError::Internal("missing value for child part"))?;
                    let mut inner = Vec::new();
                    if hydratable {
                        inner.push(Fragment::Chunk(OPEN_PART.to_string()));
                    }
                    inner.push(render_value(ctx, value).await?);
                    if hydratable {
                        inner.push(Fragment::Chunk(CLOSE_PART.to_string()));
                    }
                    chunks.push(Fragment::Nested(inner));
                }

                Opcode::AttributePart {
                    name,
                    kind,
                    static_strings,
                    use_custom_element_instance,
                    ..
                } => {
                    if !hydratable && matches!(kind, AttrKind::Property) {
                        return Err(RenderError::ForbiddenPropertyBinding);
                    }
                    if !hydratable && matches!(kind, AttrKind::Event) {
                        return Err(RenderError::ForbiddenEventBinding);
                    }
                    let needed = static_strings.len().saturating_sub(1);
                    let mut parts = Vec::with_capacity(needed);
                    for _ in 0..needed {
                        let value = values.next().ok_or(RenderError::Internal(
                            "missing value for attribute part",
                        ))?;
                        parts.push(value);
                    }
                    if let Some(chunk) = render_attribute(
                        ctx,
                        *kind,
                        name,
                        static_strings,
                        parts,
                        *use_custom_element_instance,
                    )? {
                        chunks.push(Fragment::Chunk(chunk));
                    }
                }

                Opcode::ElementPart { .. } => {
                    if !hydratable {
                        return Err(RenderError::ForbiddenElementPartBinding);
                    }
                    values
                        .next()
                        .ok_or(RenderError::Internal("missing value for element part"))?;
                }

                Opcode::CustomElementOpen { tag_name, .. } => {
                    if ctx.is_inside_custom_element_host() {
                        chunks.push(Fragment::Chunk(" defer-hydration".to_string()));
                    }
                    ctx.push_instance(element::create_renderer(tag_name));
                    ctx.push_host(tag_name.clone());
                }

                Opcode::CustomElementAttributes => {
                    if let Some(instance) = ctx.current_instance_mut() {
                        let mut extra = String::new();
                        for (name, value) in instance.connected_callback() {
                            extra.push(' ');
                            extra.push_str(&name);
                            extra.push_str("=\"");
                            extra.push_str(&escape::escape_attr(&value));
                            extra.push('"');
                        }
                        if !extra.is_empty() {
                            chunks.push(Fragment::Chunk(extra));
                        }
                    }
                }

                Opcode::CustomElementShadow => {
                    if let Some(instance) = ctx.current_instance_mut() {
                        if let Some(shadow) = instance.shadow_root() {
                            let mode = shadow.mode;
                            let content = execute_template(ctx, shadow.content).await?;
                            let open = format!(
                                "<template shadowrootmode=\"{mode}\" shadowroot=\"{mode}\">",
                                mode = mode_str(mode)
                            );
                            chunks.push(Fragment::Nested(vec![
                                Fragment::Chunk(open),
                                content,
                                Fragment::Chunk("</template>".to_string()),
                            ]));
                        }
                    }
                }

                Opcode::CustomElementClose => {
                    ctx.pop_instance();
                    ctx.pop_host();
                }
            }
        }

        if values.next().is_some() {
            return Err(RenderError::Internal(
                "template produced fewer part consumers than values supplied",
            ));
        }

        if hydratable {
            chunks.push(Fragment::Chunk(CLOSE_PART.to_string()));
        }

        ctx.pop_hydratable();
        Ok(Fragment::Nested(chunks))
    })
}

fn mode_str(mode: ShadowRootMode) -> &'static str {
    mode.as_str()
}

fn render_value<'a>(ctx: &'a mut RenderContext, value: Value) -> BoxedFuture<'a, Result<Fragment>> {
    Box::pin(async move {
        match value {
            Value::Nothing | Value::NoChange => Ok(Fragment::empty()),
            Value::Text(s) => Ok(Fragment::Chunk(escape::escape_text(&s))),
            Value::Bool(b) => Ok(Fragment::Chunk(escape::escape_text(&b.to_string()))),
            Value::Template(t) => execute_template(ctx, *t).await,
            Value::Array(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    rendered.push(render_value(ctx, item).await?);
                }
                Ok(Fragment::Nested(rendered))
            }
            Value::Future(fut) => {
                let resolved = fut.await;
                render_value(ctx, resolved).await
            }
            Value::Directive(directive) => render_directive(ctx, *directive).await,
        }
    })
}

fn render_directive<'a>(
    ctx: &'a mut RenderContext,
    directive: DirectiveResult,
) -> BoxedFuture<'a, Result<Fragment>> {
    Box::pin(async move {
        match directive.resolve()? {
            Resolved::Value(v) => render_value(ctx, v).await,
            Resolved::Values(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    rendered.push(render_value(ctx, item).await?);
                }
                Ok(Fragment::Nested(rendered))
            }
            Resolved::RawHtml(html) => Ok(Fragment::Chunk(html)),
        }
    })
}

/// Converts a value used in attribute position to its string form.
/// Templates, arrays, and futures have no meaning as an attribute value
/// (spec.md §4.4 "Attribute parts accept only scalar values").
fn value_to_attr_string(value: Value) -> Result<String> {
    match value {
        Value::Nothing | Value::NoChange => Ok(String::new()),
        Value::Text(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Directive(d) => match d.resolve()? {
            Resolved::Value(v) => value_to_attr_string(v),
            Resolved::RawHtml(s) => Ok(s),
            Resolved::Values(_) => Err(RenderError::Internal(
                "directive produced multiple values in attribute position",
            )),
        },
        Value::Template(_) | Value::Array(_) | Value::Future(_) => Err(RenderError::Internal(
            "non-scalar value used in attribute position",
        )),
    }
}

/// Returns truthiness for a `?boolean` attribute binding.
fn value_is_truthy(value: &Value) -> bool {
    match value {
        Value::Nothing | Value::NoChange => false,
        Value::Bool(b) => *b,
        Value::Text(s) => !s.is_empty(),
        _ => true,
    }
}

fn render_attribute(
    ctx: &mut RenderContext,
    kind: AttrKind,
    name: &str,
    static_strings: &[String],
    values: Vec<Value>,
    use_custom_element_instance: bool,
) -> Result<Option<String>> {
    match kind {
        AttrKind::Boolean => {
            let value = values.into_iter().next().unwrap_or(Value::Nothing);
            if value_is_truthy(&value) {
                Ok(Some(format!(" {name}")))
            } else {
                Ok(None)
            }
        }
        AttrKind::Property => {
            let rendered = {
                let mut out = String::new();
                let mut iter = values.into_iter();
                for (i, fragment) in static_strings.iter().enumerate() {
                    out.push_str(fragment);
                    if i + 1 < static_strings.len() {
                        let value = iter.next().unwrap_or(Value::Nothing);
                        let as_string = value_to_attr_string(value)?;
                        if use_custom_element_instance {
                            if let Some(instance) = ctx.current_instance_mut() {
                                instance.set_property(name, &as_string);
                            }
                        }
                        out.push_str(&as_string);
                    }
                }
                out
            };
            match element::reflected_attribute_for(name) {
                Some(attr_name) => {
                    Ok(Some(format!(" {attr_name}=\"{}\"", escape::escape_attr(&rendered))))
                }
                None => Ok(None),
            }
        }
        AttrKind::Attribute => {
            let mut out = String::new();
            let mut iter = values.into_iter();
            for (i, fragment) in static_strings.iter().enumerate() {
                out.push_str(fragment);
                if i + 1 < static_strings.len() {
                    let value = iter.next().unwrap_or(Value::Nothing);
                    out.push_str(&value_to_attr_string(value)?);
                }
            }
            Ok(Some(format!(" {name}=\"{}\"", escape::escape_attr(&out))))
        }
        AttrKind::Event => {
            // Consumed for part-index bookkeeping; events never produce output during SSR.
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::html;

    fn run<T>(fut: impl Future<Output = T>) -> T {
        futures::executor::block_on(fut)
    }

    #[test]
    fn renders_plain_text_child() {
        static FRAGS: &[&str] = &["<p>", "</p>"];
        let mut ctx = RenderContext::new();
        let template = html(FRAGS, vec![Value::Text("hi".into())]);
        let fragment = run(execute_template(&mut ctx, template)).unwrap();
        let out: String = fragment.iterate().collect();
        assert!(out.contains("hi"));
        assert!(out.contains("lit-part"));
    }

    #[test]
    fn escapes_text_content() {
        static FRAGS: &[&str] = &["<p>", "</p>"];
        let mut ctx = RenderContext::new();
        let template = html(FRAGS, vec![Value::Text("<script>".into())]);
        let fragment = run(execute_template(&mut ctx, template)).unwrap();
        let out: String = fragment.iterate().collect();
        assert!(!out.contains("<script>"));
        assert!(out.contains("&lt;script&gt;"));
    }

    #[test]
    fn boolean_attribute_omitted_when_falsy() {
        static FRAGS: &[&str] = &["<input ?disabled=\"", "\">"];
        let mut ctx = RenderContext::new();
        let template = html(FRAGS, vec![Value::Bool(false)]);
        let fragment = run(execute_template(&mut ctx, template)).unwrap();
        let out: String = fragment.iterate().collect();
        assert!(!out.contains("disabled"));
    }

    #[test]
    fn boolean_attribute_present_when_truthy() {
        static FRAGS: &[&str] = &["<input ?disabled=\"", "\">"];
        let mut ctx = RenderContext::new();
        let template = html(FRAGS, vec![Value::Bool(true)]);
        let fragment = run(execute_template(&mut ctx, template)).unwrap();
        let out: String = fragment.iterate().collect();
        assert!(out.contains("disabled"));
    }

    #[test]
    fn server_only_template_emits_no_markers() {
        use crate::template::server_html;
        static FRAGS: &[&str] = &["<p>", "</p>"];
        let mut ctx = RenderContext::new();
        let template = server_html(FRAGS, vec![Value::Text("hi".into())]);
        let fragment = run(execute_template(&mut ctx, template)).unwrap();
        let out: String = fragment.iterate().collect();
        assert!(!out.contains("lit-part"));
        assert!(!out.contains("lit-node"));
    }

    #[test]
    fn custom_element_open_tag_is_well_formed() {
        static FRAGS: &[&str] = &["<my-widget class=\"", "\"></my-widget>"];
        let mut ctx = RenderContext::new();
        let template = html(FRAGS, vec![Value::Text("box".into())]);
        let fragment = run(execute_template(&mut ctx, template)).unwrap();
        let out: String = fragment.iterate().collect();
        assert!(out.contains("<my-widget class=\"box\">"));
        assert!(out.contains("</my-widget>"));
    }

    #[test]
    fn nested_custom_element_gets_defer_hydration() {
        static INNER: &[&str] = &["<my-inner></my-inner>"];
        static OUTER: &[&str] = &["<my-outer>", "</my-outer>"];
        let mut ctx = RenderContext::new();
        let inner = html(INNER, vec![]);
        let outer = html(OUTER, vec![Value::Template(Box::new(inner))]);
        let fragment = run(execute_template(&mut ctx, outer)).unwrap();
        let out: String = fragment.iterate().collect();
        assert!(out.contains("<my-inner defer-hydration>"));
    }

    #[test]
    fn server_only_template_nested_in_hydratable_is_rejected() {
        use crate::template::server_html;
        static INNER: &[&str] = &["<p>inner</p>"];
        static OUTER: &[&str] = &["<div>", "</div>"];
        let mut ctx = RenderContext::new();
        let inner = server_html(INNER, vec![]);
        let outer = html(OUTER, vec![Value::Template(Box::new(inner))]);
        let err = run(execute_template(&mut ctx, outer)).unwrap_err();
        assert!(matches!(err, RenderError::ServerOnlyInsideHydratable));
    }

    #[test]
    fn server_only_property_binding_is_rejected() {
        use crate::template::server_html;
        static FRAGS: &[&str] = &["<input .value=\"", "\">"];
        let mut ctx = RenderContext::new();
        let template = server_html(FRAGS, vec![Value::Text("hi".into())]);
        let err = run(execute_template(&mut ctx, template)).unwrap_err();
        assert!(matches!(err, RenderError::ForbiddenPropertyBinding));
    }

    #[test]
    fn event_binding_produces_no_output_in_hydratable_template() {
        static FRAGS: &[&str] = &["<button @click=\"", "\">OK</button>"];
        let mut ctx = RenderContext::new();
        let template = html(FRAGS, vec![Value::Text("onClick".into())]);
        let fragment = run(execute_template(&mut ctx, template)).unwrap();
        let out: String = fragment.iterate().collect();
        assert!(out.contains("<button>OK</button>"));
        assert!(!out.contains("onClick"));
    }

    #[test]
    fn server_only_event_binding_is_rejected() {
        use crate::template::server_html;
        static FRAGS: &[&str] = &["<button @click=\"", "\">OK</button>"];
        let mut ctx = RenderContext::new();
        let template = server_html(FRAGS, vec![Value::Text("onClick".into())]);
        let err = run(execute_template(&mut ctx, template)).unwrap_err();
        assert!(matches!(err, RenderError::ForbiddenEventBinding));
    }
}
