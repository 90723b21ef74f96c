// src/sanitize/schema.rs
//
// Payload types describe themselves through a static `Schema` instead of being
// inspected at runtime. The walker only ever touches what a schema declares.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone};
use uuid::Uuid;

use super::cache::OnceMap;
use super::classifier;
use crate::error::SanitizeError;

/// Declared shape of a payload property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Bytes,
    /// Any other terminal value: ids, timestamps, enums.
    Scalar,
    /// A nested structured object.
    Object,
    /// A collection of nodes.
    Collection,
    /// Synthetic property that is never part of the payload proper.
    Metadata,
}

impl FieldKind {
    pub const fn name(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Bytes => "bytes",
            FieldKind::Scalar => "scalar",
            FieldKind::Object => "object",
            FieldKind::Collection => "collection",
            FieldKind::Metadata => "metadata",
        }
    }

    pub const fn is_container(self) -> bool {
        matches!(self, FieldKind::Object | FieldKind::Collection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// The explicit "untrusted HTML" marker.
    pub sanitize_html: bool,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            sanitize_html: false,
        }
    }

    /// A string field holding untrusted HTML.
    pub const fn html(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text).marked()
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn object(name: &'static str) -> Self {
        Self::new(name, FieldKind::Object)
    }

    pub const fn collection(name: &'static str) -> Self {
        Self::new(name, FieldKind::Collection)
    }

    pub const fn scalar(name: &'static str) -> Self {
        Self::new(name, FieldKind::Scalar)
    }

    pub const fn marked(self) -> Self {
        Self {
            sanitize_html: true,
            ..self
        }
    }
}

/// Static descriptor table of one payload type.
#[derive(Debug)]
pub struct Schema {
    pub type_name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

/// Mutable access to one property of a structured payload.
pub enum Property<'a> {
    Text(&'a mut String),
    OptionalText(&'a mut Option<String>),
    Node(&'a mut dyn PayloadNode),
}

/// A structured object: a type with a schema and addressable properties.
pub trait Sanitizable {
    fn schema(&self) -> &'static Schema;

    /// Hands out the property `name`, or `None` if the type has no such property.
    fn property(&mut self, name: &str) -> Option<Property<'_>>;
}

/// How the walker sees a value.
pub enum Node<'a> {
    /// Strings, numbers, booleans, bytes and other leaves. Nothing to recurse into.
    Terminal,
    Collection(Vec<&'a mut dyn PayloadNode>),
    Object(&'a mut dyn Sanitizable),
}

/// Any value that can appear in a payload graph.
pub trait PayloadNode {
    fn node(&mut self) -> Node<'_>;
}

macro_rules! terminal_nodes {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PayloadNode for $ty {
                fn node(&mut self) -> Node<'_> {
                    Node::Terminal
                }
            }
        )*
    };
}

terminal_nodes!(
    String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    Uuid, NaiveDate, serde_json::Value,
);

impl<Tz: TimeZone> PayloadNode for DateTime<Tz> {
    fn node(&mut self) -> Node<'_> {
        Node::Terminal
    }
}

impl<T: PayloadNode> PayloadNode for Option<T> {
    fn node(&mut self) -> Node<'_> {
        match self {
            Some(value) => value.node(),
            None => Node::Terminal,
        }
    }
}

impl<T: PayloadNode + ?Sized> PayloadNode for Box<T> {
    fn node(&mut self) -> Node<'_> {
        (**self).node()
    }
}

impl<T: PayloadNode> PayloadNode for Vec<T> {
    fn node(&mut self) -> Node<'_> {
        Node::Collection(
            self.iter_mut()
                .map(|item| item as &mut dyn PayloadNode)
                .collect(),
        )
    }
}

impl<K, V: PayloadNode> PayloadNode for HashMap<K, V> {
    fn node(&mut self) -> Node<'_> {
        Node::Collection(
            self.values_mut()
                .map(|item| item as &mut dyn PayloadNode)
                .collect(),
        )
    }
}

impl<K, V: PayloadNode> PayloadNode for BTreeMap<K, V> {
    fn node(&mut self) -> Node<'_> {
        Node::Collection(
            self.values_mut()
                .map(|item| item as &mut dyn PayloadNode)
                .collect(),
        )
    }
}

/// What the walker does with a planned property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Sanitize,
    Recurse,
}

/// The properties of a type the walker has to visit, in schema order.
///
/// Unmarked leaves and metadata are left out entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePlan {
    pub type_name: &'static str,
    pub steps: Vec<(&'static str, Step)>,
}

impl TypePlan {
    pub fn build(schema: &Schema) -> Result<Self, SanitizeError> {
        let mut steps = Vec::new();
        for field in schema.fields {
            if field.sanitize_html && field.kind != FieldKind::Text {
                return Err(SanitizeError::MarkerOnNonText {
                    model: schema.type_name,
                    field: field.name,
                });
            }
            if field.kind == FieldKind::Metadata {
                continue;
            }
            if field.kind.is_container() {
                steps.push((field.name, Step::Recurse));
            } else if classifier::is_candidate(field) {
                steps.push((field.name, Step::Sanitize));
            }
        }
        Ok(Self {
            type_name: schema.type_name,
            steps,
        })
    }

    pub fn sanitized_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps
            .iter()
            .filter(|(_, step)| *step == Step::Sanitize)
            .map(|(name, _)| *name)
    }
}

/// Compute-once memo of type plans, keyed by schema identity.
///
/// A failed plan is remembered as well: a misapplied marker stays misapplied.
#[derive(Debug, Default)]
pub struct PlanCache {
    plans: OnceMap<usize, Result<Arc<TypePlan>, SanitizeError>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self, schema: &'static Schema) -> Result<Arc<TypePlan>, SanitizeError> {
        let key = std::ptr::from_ref(schema) as usize;
        self.plans
            .get_or_compute(&key, || TypePlan::build(schema).map(Arc::new))
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ARTICLE: Schema = Schema {
        type_name: "Article",
        fields: &[
            FieldDescriptor::new("class", FieldKind::Metadata),
            FieldDescriptor::scalar("id"),
            FieldDescriptor::html("body"),
            FieldDescriptor::text("slug"),
            FieldDescriptor::collection("comments"),
            FieldDescriptor::object("author"),
        ],
    };

    static BROKEN: Schema = Schema {
        type_name: "Broken",
        fields: &[FieldDescriptor::new("rating", FieldKind::Number).marked()],
    };

    #[test]
    fn plan_keeps_marked_text_and_containers_in_order() {
        let plan = TypePlan::build(&ARTICLE).unwrap();
        assert_eq!(
            plan.steps,
            vec![
                ("body", Step::Sanitize),
                ("comments", Step::Recurse),
                ("author", Step::Recurse),
            ]
        );
        assert_eq!(plan.sanitized_fields().collect::<Vec<_>>(), vec!["body"]);
    }

    #[test]
    fn marker_on_number_is_a_configuration_error() {
        assert_eq!(
            TypePlan::build(&BROKEN),
            Err(SanitizeError::MarkerOnNonText {
                model: "Broken",
                field: "rating",
            })
        );
    }

    #[test]
    fn plan_cache_builds_each_schema_once() {
        let cache = PlanCache::new();
        let first = cache.plan(&ARTICLE).unwrap();
        let second = cache.plan(&ARTICLE).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.plan(&BROKEN).is_err());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn collections_expose_their_elements() {
        let mut items = vec![Some(1_u32), None, Some(3)];
        match items.node() {
            Node::Collection(children) => assert_eq!(children.len(), 3),
            _ => panic!("vec must be a collection"),
        }
        let mut text = String::from("<b>x</b>");
        assert!(matches!(text.node(), Node::Terminal));
    }
}
