// src/sanitize/tracker.rs

use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::policy::DiscardObserver;
use super::scope::CallSite;

/// `tracing` target of audit records. `main` routes it to its own log file.
pub const AUDIT_TARGET: &str = "sanitize::audit";

/// Where a sanitized value came from. Built fresh for every visited field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizationContext {
    pub model: &'static str,
    pub controller: &'static str,
    pub method: &'static str,
    pub field: &'static str,
}

impl SanitizationContext {
    pub fn new(site: &CallSite, model: &'static str, field: &'static str) -> Self {
        Self {
            model,
            controller: site.module,
            method: site.handler,
            field,
        }
    }
}

/// Tags and attributes a policy removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscardRecord {
    tags: Vec<String>,
    attributes: BTreeMap<String, Vec<String>>,
}

impl DiscardRecord {
    pub fn record_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn record_attributes<S: AsRef<str>>(&mut self, tag: &str, attributes: &[S]) {
        let entry = self.attributes.entry(tag.to_string()).or_default();
        for attr in attributes {
            let attr = attr.as_ref();
            if !entry.iter().any(|a| a == attr) {
                entry.push(attr.to_string());
            }
        }
    }

    pub fn merge(&mut self, other: &DiscardRecord) {
        for tag in &other.tags {
            self.record_tag(tag);
        }
        for (tag, attrs) in &other.attributes {
            self.record_attributes(tag, attrs.as_slice());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.attributes.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.attributes.clear();
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn attributes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.attributes
    }

    /// `[script, iframe]`, or an empty string.
    pub fn render_tags(&self) -> String {
        if self.tags.is_empty() {
            return String::new();
        }
        format!("[{}]", self.tags.join(", "))
    }

    /// `{b=[onclick], img=[onerror, src]}`, or an empty string.
    pub fn render_attributes(&self) -> String {
        if self.attributes.is_empty() {
            return String::new();
        }
        let entries: Vec<String> = self
            .attributes
            .iter()
            .map(|(tag, attrs)| format!("{tag}=[{}]", attrs.join(", ")))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }
}

impl DiscardObserver for DiscardRecord {
    fn discarded_tag(&mut self, caller: &str, tag: &str) {
        tracing::trace!(caller, tag, "tag discarded");
        self.record_tag(tag);
    }

    fn discarded_attributes(&mut self, caller: &str, tag: &str, attributes: &[&str]) {
        tracing::trace!(caller, tag, ?attributes, "attributes discarded");
        self.record_attributes(tag, attributes);
    }
}

/// Audit message template with `{fieldName}`, `{modelClassName}`,
/// `{controllerClassName}`, `{controllerMethodName}`, `{rejectedTags}` and
/// `{rejectedAttributes}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTemplate(String);

impl AuditTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn render(
        &self,
        field: &str,
        model: &str,
        controller: &str,
        method: &str,
        record: &DiscardRecord,
    ) -> String {
        self.0
            .replace("{fieldName}", field)
            .replace("{modelClassName}", model)
            .replace("{controllerClassName}", controller)
            .replace("{controllerMethodName}", method)
            .replace("{rejectedTags}", &record.render_tags())
            .replace("{rejectedAttributes}", &record.render_attributes())
    }
}

/// Accumulates discards for one hook invocation and flushes them as a single
/// audit message.
///
/// One tracker per invocation. It is never shared between requests.
#[derive(Debug, Default)]
pub struct DiscardTracker {
    record: DiscardRecord,
    contexts: Vec<SanitizationContext>,
}

impl DiscardTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tag(&mut self, context: SanitizationContext, tag: &str) {
        self.note(context);
        self.record.record_tag(tag);
    }

    pub fn record_attributes(&mut self, context: SanitizationContext, tag: &str, attributes: &[&str]) {
        self.note(context);
        self.record.record_attributes(tag, attributes);
    }

    /// Folds in everything a single sanitize call discarded for `context`.
    pub fn absorb(&mut self, context: SanitizationContext, record: &DiscardRecord) {
        if record.is_empty() {
            return;
        }
        self.note(context);
        self.record.merge(record);
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    pub fn record(&self) -> &DiscardRecord {
        &self.record
    }

    /// Renders the accumulated discards and resets the tracker.
    ///
    /// Returns `None` without touching the template when nothing was discarded.
    pub fn flush_if_non_empty(&mut self, template: &AuditTemplate) -> Option<String> {
        if self.record.is_empty() {
            return None;
        }
        let fields = self.join_distinct(|c| c.field);
        let models = self.join_distinct(|c| c.model);
        let (controller, method) = self
            .contexts
            .first()
            .map_or(("", ""), |c| (c.controller, c.method));

        let message = template.render(&fields, &models, controller, method, &self.record);
        self.clear();
        Some(message)
    }

    pub fn clear(&mut self) {
        self.record.clear();
        self.contexts.clear();
    }

    fn note(&mut self, context: SanitizationContext) {
        if !self.contexts.contains(&context) {
            self.contexts.push(context);
        }
    }

    fn join_distinct(&self, part: impl Fn(&SanitizationContext) -> &'static str) -> String {
        let mut seen: Vec<&str> = Vec::new();
        for context in &self.contexts {
            let value = part(context);
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
        seen.join(", ")
    }
}

/// Destination of flushed audit messages.
///
/// Emitting must not block the request path and must never fail it.
pub trait AuditSink: Send + Sync {
    fn emit(&self, message: &str);
}

/// Writes audit messages as `warn` events on [`AUDIT_TARGET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, message: &str) {
        tracing::warn!(target: AUDIT_TARGET, "{}", message);
    }
}

/// Keeps audit messages in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    messages: Mutex<Vec<String>>,
}

impl MemoryAuditSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: CallSite = CallSite::new("hotels_api::handlers::hotels", "create_hotel");

    fn template() -> AuditTemplate {
        AuditTemplate::new(
            "{controllerClassName}#{controllerMethodName} {modelClassName}.{fieldName} \
             tags={rejectedTags} attrs={rejectedAttributes}",
        )
    }

    #[test]
    fn flush_renders_every_placeholder_then_resets() {
        let mut tracker = DiscardTracker::new();
        let ctx = SanitizationContext::new(&SITE, "HotelInput", "description");

        tracker.record_tag(ctx, "script");
        tracker.record_attributes(ctx, "b", &["onclick"]);

        let message = tracker.flush_if_non_empty(&template()).unwrap();
        assert_eq!(
            message,
            "hotels_api::handlers::hotels#create_hotel HotelInput.description \
             tags=[script] attrs={b=[onclick]}"
        );
        assert!(tracker.is_empty());
        assert!(tracker.flush_if_non_empty(&template()).is_none());
    }

    #[test]
    fn empty_tracker_does_not_flush() {
        let mut tracker = DiscardTracker::new();
        let ctx = SanitizationContext::new(&SITE, "HotelInput", "name");
        tracker.absorb(ctx, &DiscardRecord::default());
        assert!(tracker.flush_if_non_empty(&template()).is_none());
    }

    #[test]
    fn fields_and_models_are_joined_once() {
        let mut tracker = DiscardTracker::new();
        tracker.record_tag(SanitizationContext::new(&SITE, "Hotel", "name"), "iframe");
        tracker.record_tag(SanitizationContext::new(&SITE, "Facility", "short_description"), "iframe");
        tracker.record_tag(SanitizationContext::new(&SITE, "Hotel", "name"), "script");

        let message = tracker
            .flush_if_non_empty(&AuditTemplate::new("{modelClassName}|{fieldName}|{rejectedTags}"))
            .unwrap();
        assert_eq!(message, "Hotel, Facility|name, short_description|[iframe, script]");
    }

    #[test]
    fn attributes_merge_per_tag() {
        let mut record = DiscardRecord::default();
        record.record_attributes("img", &["onerror"]);
        record.record_attributes("img", &["onerror", "onload"]);
        record.record_attributes("a", &["onclick"]);

        assert_eq!(record.render_attributes(), "{a=[onclick], img=[onerror, onload]}");
        assert_eq!(record.render_tags(), "");
    }
}
