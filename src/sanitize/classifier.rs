// src/sanitize/classifier.rs

use super::schema::{FieldDescriptor, FieldKind};

/// Type-level half of eligibility: string-typed and explicitly marked.
///
/// Invariant per type, which is why plans may memoize it.
pub fn is_candidate(field: &FieldDescriptor) -> bool {
    field.kind == FieldKind::Text && field.sanitize_html
}

/// Value-level half of eligibility: present, non-empty and containing markup.
///
/// Re-evaluated for every instance.
pub fn has_markup(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty() && v.contains('<'))
}

pub fn is_eligible(field: &FieldDescriptor, value: Option<&str>) -> bool {
    is_candidate(field) && has_markup(value)
}
