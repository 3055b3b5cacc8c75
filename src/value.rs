//! The dynamic-value sum type (spec.md §9 "Deep-dispatch value rendering").
//!
//! A hole in a template can be filled with a primitive, one of two
//! sentinels, a nested template, a directive result, an arbitrary-depth
//! iterable, or a future value. Rather than dispatching on `TypeId` at
//! render time the way a dynamically typed host language would, this is
//! modeled as a closed enum and dispatched on by `match` — the "tagged
//! variant representation" spec.md's design notes call for.

use std::future::Future;
use std::pin::Pin;

use crate::template::TemplateResult;

/// A still-pending dynamic value. Boxed and type-erased because a
/// template's value array holds values of heterogeneous concrete future
/// types.
pub type BoxFuture = Pin<Box<dyn Future<Output = Value> + Send>>;

/// One hole's worth of dynamic content (spec.md §3 "TemplateResult", §9
/// "Deep-dispatch value rendering").
pub enum Value {
    /// The `nothing` sentinel: renders as an empty child-part.
    Nothing,
    /// The `noChange` sentinel: instructs the renderer to leave a
    /// previously committed value alone. SSR has no previous commit to
    /// leave alone, so it is treated identically to `Nothing`.
    NoChange,
    /// A primitive value, already converted to its string form. HTML-escaped
    /// at commit time (spec.md §4.3).
    Text(String),
    /// A boolean, used for `?boolean` attribute bindings.
    Bool(bool),
    /// A nested template (spec.md §4.3 step 3).
    Template(Box<TemplateResult>),
    /// A directive invocation (spec.md §4.3 step 1, §6, §4.7 directive
    /// adapter).
    Directive(Box<crate::directive::DirectiveResult>),
    /// An iterable of further values, rendered left to right
    /// (spec.md §4.3 step 4).
    Array(Vec<Value>),
    /// A value that resolves asynchronously (spec.md §4, §5 "Suspension
    /// points").
    Future(BoxFuture),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nothing => write!(f, "Nothing"),
            Value::NoChange => write!(f, "NoChange"),
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Value::Directive(d) => f.debug_tuple("Directive").field(d).finish(),
            Value::Array(a) => f.debug_tuple("Array").field(a).finish(),
            Value::Future(_) => f.debug_tuple("Future").field(&"..").finish(),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nothing
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<TemplateResult> for Value {
    fn from(t: TemplateResult) -> Self {
        Value::Template(Box::new(t))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Nothing,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

macro_rules! impl_from_display_numeric {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Text(v.to_string())
                }
            }
        )*
    };
}

impl_from_display_numeric!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
