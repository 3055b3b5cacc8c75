//! The template compiler: turns a template's static fragments into an
//! opcode list (spec.md §4.2).
//!
//! The source system gets each hole's position in the markup for free,
//! because its template-literal front end records it while building the
//! static-string array. This crate never sees that front end, so it
//! recovers hole positions the way spec.md §9 suggests: join the static
//! fragments with a sentinel in each hole, parse the result once with a
//! real HTML parser, then read hole positions back off the parsed tree.
//! A sentinel is a private-use-area code point pair wrapping the hole's
//! index, chosen because no legitimate template text will ever contain
//! one, and because it survives parsing unescaped in every context a
//! hole can legally appear in (element content, attribute values, bare
//! attribute position).
//!
//! Fragments are parsed in a `<template>` context rather than as a full
//! document or as `<body>` children, matching how declarative shadow
//! roots and other template content needs to avoid the parser's foster
//! -parenting corrections for table content (`<tr>`, `<td>`, ... showing
//! up with no enclosing `<table>`).

use std::cell::RefCell;
use std::sync::{Arc, RwLock};

use html5ever::driver::{parse_document, parse_fragment};
use html5ever::tendril::TendrilSink;
use html5ever::{local_name, ns, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use once_cell::sync::Lazy;
use or_poisoned::OrPoisoned;
use rustc_hash::FxHashMap;

use crate::error::{RenderError, Result};
use crate::opcode::{AttrKind, Opcode, Opcodes};
use crate::template::Statics;

const SENTINEL_OPEN: char = '\u{E000}';
const SENTINEL_CLOSE: char = '\u{E001}';

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

fn sentinel(index: usize) -> String {
    format!("{SENTINEL_OPEN}{index}{SENTINEL_CLOSE}")
}

/// One piece of text that may or may not be a hole reference.
enum Segment {
    Literal(String),
    Hole(usize),
}

/// Splits `s` on sentinel markers, preserving surrounding literal text.
fn split_sentinels(s: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut literal = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == SENTINEL_OPEN {
            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if d == SENTINEL_CLOSE {
                    chars.next();
                    break;
                }
                digits.push(d);
                chars.next();
            }
            if let Ok(index) = digits.parse::<usize>() {
                if !literal.is_empty() {
                    out.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                out.push(Segment::Hole(index));
                continue;
            }
            literal.push(c);
            literal.push_str(&digits);
        } else {
            literal.push(c);
        }
    }
    if !literal.is_empty() {
        out.push(Segment::Literal(literal));
    }
    out
}

/// `Some(index)` iff `s` is exactly one hole with no surrounding text —
/// the shape a bare element-part binding (`<div ${directive}>`) takes
/// once parsed as an attribute name.
fn sentinel_only(s: &str) -> Option<usize> {
    match split_sentinels(s).as_slice() {
        [Segment::Hole(i)] => Some(*i),
        _ => None,
    }
}

/// Whether `source`'s first non-whitespace, non-comment bytes mark it as a
/// whole document rather than a content fragment (spec.md §9 "Parser
/// choice": "selection is driven by a regex over the first non-whitespace,
/// non-comment bytes").
fn looks_like_document(source: &str) -> bool {
    let mut rest = source.trim_start();
    loop {
        if let Some(after_comment) = rest.strip_prefix("<!--") {
            match after_comment.find("-->") {
                Some(end) => {
                    rest = after_comment[end + 3..].trim_start();
                    continue;
                }
                None => return false,
            }
        }
        break;
    }
    let lower = rest.to_ascii_lowercase();
    lower.starts_with("<!doctype") || lower.starts_with("<html")
}

struct Compiler {
    ops: Vec<Opcode>,
    next_node_index: usize,
    hole_count: usize,
}

impl Compiler {
    fn walk_children(&mut self, node: &Handle, in_raw_text_parent: Option<&str>) -> Result<()> {
        for child in node.children.borrow().iter() {
            self.walk(child, in_raw_text_parent)?;
        }
        Ok(())
    }

    fn walk(&mut self, node: &Handle, in_raw_text_parent: Option<&str>) -> Result<()> {
        match &node.data {
            NodeData::Document => self.walk_children(node, None),
            NodeData::Doctype { name, .. } => {
                self.ops
                    .push(Opcode::Text(format!("<!DOCTYPE {}>", name.as_ref())));
                Ok(())
            }
            NodeData::Comment { contents } => {
                self.ops
                    .push(Opcode::Text(format!("<!--{}-->", contents.as_ref())));
                Ok(())
            }
            NodeData::ProcessingInstruction { .. } => Ok(()),
            NodeData::Text { contents } => {
                let text = contents.borrow();
                if let Some(raw_tag) = in_raw_text_parent {
                    if text.contains(SENTINEL_OPEN) {
                        return Err(match raw_tag {
                            "script" => RenderError::BindingInScript,
                            "style" => RenderError::BindingInStyle,
                            _ => RenderError::Internal("binding inside raw-text element"),
                        });
                    }
                    self.ops.push(Opcode::Text(text.to_string()));
                    return Ok(());
                }
                for segment in split_sentinels(&text) {
                    match segment {
                        Segment::Literal(s) => {
                            self.ops.push(Opcode::Text(crate::escape::escape_text(&s)))
                        }
                        Segment::Hole(_) => {
                            self.hole_count += 1;
                            self.ops.push(Opcode::ChildPart {
                                node_index: self.next_node_index,
                                use_custom_element_instance: false,
                            });
                        }
                    }
                }
                Ok(())
            }
            NodeData::Element { name, attrs, .. } => self.walk_element(node, name, attrs),
        }
    }

    fn walk_element(
        &mut self,
        node: &Handle,
        name: &html5ever::QualName,
        attrs: &RefCell<Vec<html5ever::Attribute>>,
    ) -> Result<()> {
        let tag_name = name.local.as_ref().to_string();
        let node_index = self.next_node_index;
        self.next_node_index += 1;
        let is_custom_element = tag_name.contains('-');

        let mut bound_attributes_count = 0usize;
        let mut static_attrs: Vec<(String, String)> = Vec::new();
        let mut dynamic_ops: Vec<Opcode> = Vec::new();

        for attr in attrs.borrow().iter() {
            let raw_name = attr.name.local.as_ref();
            let value = attr.value.as_ref();

            if let Some(hole) = sentinel_only(raw_name) {
                let _ = hole;
                self.hole_count += 1;
                bound_attributes_count += 1;
                dynamic_ops.push(Opcode::ElementPart { node_index });
                continue;
            }

            let segments = split_sentinels(value);
            let has_hole = segments.iter().any(|s| matches!(s, Segment::Hole(_)));
            if !has_hole {
                static_attrs.push((raw_name.to_string(), value.to_string()));
                continue;
            }

            bound_attributes_count += 1;
            let (kind, display_name) = classify_attr_name(raw_name);

            let mut static_strings = Vec::new();
            let mut current = String::new();
            let mut value_count = 0usize;
            for segment in segments {
                match segment {
                    Segment::Literal(s) => current.push_str(&s),
                    Segment::Hole(_) => {
                        self.hole_count += 1;
                        value_count += 1;
                        static_strings.push(std::mem::take(&mut current));
                    }
                }
            }
            static_strings.push(current);
            let _ = value_count;

            dynamic_ops.push(Opcode::AttributePart {
                node_index,
                name: display_name,
                kind,
                static_strings,
                tag_name: tag_name.clone(),
                use_custom_element_instance: is_custom_element,
            });
        }

        self.ops.push(Opcode::PossibleNodeMarker { bound_attributes_count, node_index });

        let mut open_tag = format!("<{tag_name}");
        for (name, value) in &static_attrs {
            open_tag.push(' ');
            open_tag.push_str(name);
            open_tag.push_str("=\"");
            open_tag.push_str(&crate::escape::escape_attr(value));
            open_tag.push('"');
        }
        self.ops.push(Opcode::Text(open_tag));

        if is_custom_element {
            self.ops
                .push(Opcode::CustomElementOpen { node_index, tag_name: tag_name.clone() });
        }

        self.ops.extend(dynamic_ops);

        if is_custom_element {
            self.ops.push(Opcode::CustomElementAttributes);
        }

        self.ops.push(Opcode::Text(">".to_string()));

        if is_custom_element {
            self.ops.push(Opcode::CustomElementShadow);
        }

        let is_void = VOID_ELEMENTS.contains(&tag_name.as_str());
        if !is_void {
            let raw_text_parent = match tag_name.as_str() {
                "script" | "style" => Some(tag_name.as_str()),
                _ => None,
            };
            self.walk_children(node, raw_text_parent)?;
            self.ops.push(Opcode::Text(format!("</{tag_name}>")));
        }
        if is_custom_element {
            self.ops.push(Opcode::CustomElementClose);
        }
        Ok(())
    }
}

/// Classifies an attribute's binding kind from its raw (possibly
/// prefixed) name, and returns the attribute/property name with the
/// prefix stripped (spec.md §4.2 "Edge cases").
fn classify_attr_name(raw: &str) -> (AttrKind, String) {
    match raw.as_bytes().first() {
        Some(b'.') => (AttrKind::Property, raw[1..].to_string()),
        Some(b'?') => (AttrKind::Boolean, raw[1..].to_string()),
        Some(b'@') => (AttrKind::Event, raw[1..].to_string()),
        _ => (AttrKind::Attribute, raw.to_string()),
    }
}

/// Parses and compiles a template's static fragments into an opcode
/// list. Does not itself consult or populate the cache; see
/// [`compile_for`] for the memoized entry point actually used by
/// rendering.
pub fn compile(fragments: &'static [&'static str]) -> Result<Opcodes> {
    let mut source = String::new();
    for (i, fragment) in fragments.iter().enumerate() {
        source.push_str(fragment);
        if i + 1 < fragments.len() {
            source.push_str(&sentinel(i));
        }
    }

    // A template that opens with `<!doctype`/`<html>` describes a whole
    // document (spec.md §9 "Parser choice"): parsing it in a `<template>`
    // fragment context would silently drop the doctype and merge `<html>`/
    // `<body>` into the synthetic context element instead of preserving
    // them. Everything else is parsed as template content, which also
    // sidesteps the HTML parser's foster-parenting of bare table rows.
    let is_document = looks_like_document(&source);
    let dom: RcDom = if is_document {
        parse_document(RcDom::default(), ParseOpts::default()).one(source)
    } else {
        let context_name = QualName::new(None, ns!(html), local_name!("template"));
        parse_fragment(RcDom::default(), ParseOpts::default(), context_name, vec![], false).one(source)
    };

    let mut compiler = Compiler { ops: Vec::new(), next_node_index: 0, hole_count: 0 };
    if is_document {
        compiler.walk_children(&dom.document, None)?;
    } else {
        // Fragment parsing wraps the real content in a synthetic element
        // named after the context (`<template>` here) rather than
        // attaching it directly to the document — walk past it.
        for child in dom.document.children.borrow().iter() {
            compiler.walk_children(child, None)?;
        }
    }

    if compiler.hole_count != fragments.len().saturating_sub(1) {
        return Err(RenderError::Internal(
            "compiled opcode list does not reference every hole in the template",
        ));
    }

    Ok(Opcodes { ops: compiler.ops, expected_values: fragments.len().saturating_sub(1) })
}

/// Process-wide, never-evicted cache from template identity to compiled
/// opcodes — or to the compile error the template produced, since a
/// template that fails to compile fails the same way on every
/// subsequent render of the same call site (spec.md §7).
static OPCODE_CACHE: Lazy<
    RwLock<FxHashMap<usize, std::result::Result<Arc<Opcodes>, RenderError>>>,
> = Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Returns the memoized compiled opcodes for `statics`, compiling and
/// caching on the first call for a given template identity.
pub fn compile_for(statics: Statics) -> Result<Arc<Opcodes>> {
    let key = statics.identity();
    if let Some(hit) = OPCODE_CACHE.read().or_poisoned().get(&key) {
        return hit.clone();
    }
    let result = compile(statics.fragments()).map(Arc::new);
    OPCODE_CACHE.write().or_poisoned().insert(key, result.clone());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_str(fragments: &'static [&'static str]) -> Opcodes {
        compile(fragments).expect("compile should succeed")
    }

    #[test]
    fn plain_text_has_no_holes() {
        static FRAGS: &[&str] = &["<p>hello</p>"];
        let opcodes = compile_str(FRAGS);
        assert_eq!(opcodes.expected_values, 0);
    }

    #[test]
    fn single_child_hole_produces_child_part() {
        static FRAGS: &[&str] = &["<p>", "</p>"];
        let opcodes = compile_str(FRAGS);
        assert_eq!(opcodes.expected_values, 1);
        assert!(opcodes.ops.iter().any(|op| matches!(op, Opcode::ChildPart { .. })));
    }

    #[test]
    fn attribute_hole_produces_attribute_part() {
        static FRAGS: &[&str] = &["<div class=\"", "\"></div>"];
        let opcodes = compile_str(FRAGS);
        assert_eq!(opcodes.expected_values, 1);
        assert!(opcodes
            .ops
            .iter()
            .any(|op| matches!(op, Opcode::AttributePart { kind: AttrKind::Attribute, .. })));
    }

    #[test]
    fn property_prefix_is_classified() {
        static FRAGS: &[&str] = &["<input .value=\"", "\">"];
        let opcodes = compile_str(FRAGS);
        assert!(opcodes
            .ops
            .iter()
            .any(|op| matches!(op, Opcode::AttributePart { kind: AttrKind::Property, name, .. } if name == "value")));
    }

    #[test]
    fn event_binding_compiles_as_attribute_part() {
        static FRAGS: &[&str] = &["<button @click=\"", "\"></button>"];
        let opcodes = compile(FRAGS).unwrap();
        assert!(opcodes
            .ops
            .iter()
            .any(|op| matches!(op, Opcode::AttributePart { kind: AttrKind::Event, .. })));
    }

    #[test]
    fn script_content_binding_is_rejected() {
        static FRAGS: &[&str] = &["<script>const x = ", ";</script>"];
        let err = compile(FRAGS).unwrap_err();
        assert!(matches!(err, RenderError::BindingInScript));
    }

    #[test]
    fn custom_element_gets_lifecycle_opcodes() {
        static FRAGS: &[&str] = &["<my-widget></my-widget>"];
        let opcodes = compile_str(FRAGS);
        assert!(opcodes.ops.iter().any(|op| matches!(op, Opcode::CustomElementOpen { .. })));
        assert!(opcodes.ops.iter().any(|op| matches!(op, Opcode::CustomElementShadow)));
        assert!(opcodes.ops.iter().any(|op| matches!(op, Opcode::CustomElementClose)));
    }

    #[test]
    fn fragment_parsing_does_not_leak_the_context_wrapper() {
        static FRAGS: &[&str] = &["<div>", "</div>"];
        let opcodes = compile_str(FRAGS);
        let text: String = opcodes
            .ops
            .iter()
            .filter_map(|op| match op {
                Opcode::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert!(!text.contains("template"));
        assert!(text.starts_with("<div"));
    }

    #[test]
    fn doctype_is_preserved_verbatim() {
        static FRAGS: &[&str] = &["<!DOCTYPE html><html><body>", "</body></html>"];
        let opcodes = compile_str(FRAGS);
        let text: String = opcodes
            .ops
            .iter()
            .filter_map(|op| match op {
                Opcode::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert!(text.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn looks_like_document_ignores_leading_whitespace_and_comments() {
        assert!(looks_like_document("<!doctype html><html></html>"));
        assert!(looks_like_document("  \n<!-- hi --><html></html>"));
        assert!(!looks_like_document("<div>hello</div>"));
        assert!(!looks_like_document("hello <html> mid-string"));
    }

    #[test]
    fn compile_for_memoizes_by_identity() {
        static FRAGS: &[&str] = &["<p>", "</p>"];
        let statics = Statics(FRAGS);
        let a = compile_for(statics).unwrap();
        let b = compile_for(statics).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
