// src/sanitize/walker.rs

use super::HtmlSanitizer;
use super::classifier;
use super::schema::{FieldKind, Node, PayloadNode, Property, Sanitizable, Step};
use super::scope::CallSite;
use super::tracker::{DiscardTracker, SanitizationContext};
use crate::error::SanitizeError;

/// Walks one payload graph, rewriting every eligible string in place.
///
/// All state is borrowed for the duration of a single call: the shared
/// sanitizer only contributes its policy, result cache and plan cache.
pub struct Walker<'a> {
    sanitizer: &'a HtmlSanitizer,
    site: CallSite,
    tracker: &'a mut DiscardTracker,
}

impl<'a> Walker<'a> {
    pub fn new(sanitizer: &'a HtmlSanitizer, site: CallSite, tracker: &'a mut DiscardTracker) -> Self {
        Self {
            sanitizer,
            site,
            tracker,
        }
    }

    pub fn walk(&mut self, root: &mut dyn PayloadNode) -> Result<(), SanitizeError> {
        match root.node() {
            Node::Terminal => Ok(()),
            Node::Collection(items) => {
                for item in items {
                    self.walk(item)?;
                }
                Ok(())
            }
            Node::Object(object) => self.walk_object(object),
        }
    }

    fn walk_object(&mut self, object: &mut dyn Sanitizable) -> Result<(), SanitizeError> {
        let schema = object.schema();
        let plan = self.sanitizer.plan(schema)?;

        for &(field, step) in &plan.steps {
            let property = object
                .property(field)
                .ok_or(SanitizeError::UnresolvedProperty {
                    model: schema.type_name,
                    field,
                })?;

            match (step, property) {
                (Step::Recurse, Property::Node(child)) => self.walk(child)?,
                (Step::Sanitize, Property::Text(value)) => {
                    self.sanitize_text(value, schema.type_name, field);
                }
                (Step::Sanitize, Property::OptionalText(value)) => {
                    if let Some(value) = value.as_mut() {
                        self.sanitize_text(value, schema.type_name, field);
                    }
                }
                (step, _) => {
                    let expected = match step {
                        Step::Sanitize => FieldKind::Text.name(),
                        Step::Recurse => "object or collection",
                    };
                    return Err(SanitizeError::PropertyKindMismatch {
                        model: schema.type_name,
                        field,
                        expected,
                    });
                }
            }
        }
        Ok(())
    }

    fn sanitize_text(&mut self, value: &mut String, model: &'static str, field: &'static str) {
        if !classifier::has_markup(Some(value.as_str())) {
            return;
        }
        let entry = self.sanitizer.clean(value);
        self.tracker
            .absorb(SanitizationContext::new(&self.site, model, field), &entry.discards);
        if *value != entry.value {
            value.clone_from(&entry.value);
        }
    }
}
