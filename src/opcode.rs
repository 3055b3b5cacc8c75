//! The compiled form of a template (spec.md §3 "Opcode list", §4.2).

/// The four attribute binding kinds, distinguished by the single-character
/// prefix on the attribute's name (spec.md §4.2 "Edge cases").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// No prefix: a plain HTML attribute.
    Attribute,
    /// `.name`: a JS/host-object property, reflected to an attribute only
    /// via the table in spec.md §4.5.
    Property,
    /// `?name`: present iff truthy.
    Boolean,
    /// `@name`: never produces output during SSR.
    Event,
}

/// One element of a template's compiled representation (spec.md §3).
#[derive(Debug, Clone)]
pub enum Opcode {
    /// Emit a static fragment verbatim.
    Text(String),

    /// Splice the next dynamic value as a child. Wrapped in child-part
    /// markers unless the template is server-only.
    ChildPart {
        node_index: usize,
        use_custom_element_instance: bool,
    },

    /// Splice one or more dynamic values into an attribute.
    AttributePart {
        node_index: usize,
        name: String,
        kind: AttrKind,
        /// The static strings surrounding each dynamic value in this
        /// attribute, e.g. `["", " ", ""]` for `class="${a} ${b}"`. Always
        /// has `values.len() + 1` entries for the values this part
        /// consumes.
        static_strings: Vec<String>,
        tag_name: String,
        use_custom_element_instance: bool,
    },

    /// Consume one dynamic value; the directive it names is a no-op
    /// during SSR.
    ElementPart { node_index: usize },

    /// Emit `<!--lit-node N-->` iff the node has bindings or sits inside a
    /// custom-element host context, and the template is hydratable.
    PossibleNodeMarker {
        bound_attributes_count: usize,
        node_index: usize,
    },

    /// Begin rendering a custom element: look up its renderer, instantiate
    /// it, and push it onto the instance stack.
    CustomElementOpen { node_index: usize, tag_name: String },
    /// Run `connectedCallback` and emit the element's reflected
    /// attributes.
    CustomElementAttributes,
    /// Emit the element's declarative shadow root.
    CustomElementShadow,
    /// Pop the element off the instance stack.
    CustomElementClose,
}

/// A compiled template: an ordered opcode list plus the number of dynamic
/// values it expects to consume. spec.md §3's invariant ("`partIndex` at
/// end equals the number of dynamic values") is checked against
/// `expected_values` by the executor.
#[derive(Debug, Clone)]
pub struct Opcodes {
    pub ops: Vec<Opcode>,
    pub expected_values: usize,
}
