// src/sanitize/mod.rs

//! Declarative HTML sanitization of request and response payloads.
//!
//! Payload types opt individual string fields in through their static
//! [`Schema`]. [`HtmlSanitizer`] is built once at startup and shared by every
//! request; everything a single call mutates lives in that call.
//!
//! Two integration strategies share the same policy and cache:
//! * payload walking through [`hooks`], which visits a whole object graph
//!   before a handler runs or before its response is serialized;
//! * field-level sanitization through [`field`], bound to serde on the
//!   individual field.

pub mod cache;
pub mod classifier;
pub mod field;
pub mod hooks;
pub mod policy;
pub mod schema;
pub mod scope;
pub mod tracker;
pub mod walker;

use std::borrow::Cow;
use std::sync::Arc;

pub use cache::{CleanEntry, ResultCache};
pub use hooks::{SanitizeHook, SanitizedJson};
pub use policy::{AllowListPolicy, DiscardObserver, SanitizePolicy};
pub use schema::{
    FieldDescriptor, FieldKind, Node, PayloadNode, PlanCache, Property, Sanitizable, Schema,
    TypePlan,
};
pub use scope::{CallSite, ScopeFilter};
pub use tracker::{
    AUDIT_TARGET, AuditSink, AuditTemplate, DiscardRecord, DiscardTracker, MemoryAuditSink,
    SanitizationContext, TracingAuditSink,
};
pub use walker::Walker;

use crate::config::SanitizeConfig;
use crate::error::SanitizeError;

/// Identifies the policy's caller in trace output.
const POLICY_CALLER: &str = "HtmlSanitizer";

/// The process-wide sanitization pipeline.
pub struct HtmlSanitizer {
    policy: Arc<dyn SanitizePolicy>,
    cache: ResultCache,
    plans: PlanCache,
    scope: ScopeFilter,
    template: AuditTemplate,
    sink: Arc<dyn AuditSink>,
}

impl HtmlSanitizer {
    pub fn new(policy: Arc<dyn SanitizePolicy>, scope: ScopeFilter, template: AuditTemplate) -> Self {
        Self {
            policy,
            cache: ResultCache::new(None),
            plans: PlanCache::new(),
            scope,
            template,
            sink: Arc::new(TracingAuditSink),
        }
    }

    /// Allow-list policy, scope and template from configuration, audit to `tracing`.
    pub fn from_config(config: &SanitizeConfig) -> Result<Self, SanitizeError> {
        let mut sanitizer = Self::new(
            Arc::new(AllowListPolicy::from_config(config)),
            ScopeFilter::new(&config.scope_pattern)?,
            AuditTemplate::new(config.warning_message.clone()),
        );
        sanitizer.cache = ResultCache::new(config.cache_capacity);
        Ok(sanitizer)
    }

    /// Default allow-list, every call site in scope.
    pub fn with_defaults() -> Self {
        let config = SanitizeConfig::default();
        Self::new(
            Arc::new(AllowListPolicy::from_config(&config)),
            ScopeFilter::all(),
            AuditTemplate::new(config.warning_message),
        )
    }

    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_scope(mut self, scope: ScopeFilter) -> Self {
        self.scope = scope;
        self
    }

    /// Validates a payload type's schema ahead of the first request.
    pub fn register(&self, schema: &'static Schema) -> Result<(), SanitizeError> {
        let plan = self.plans.plan(schema)?;
        tracing::debug!(
            model = plan.type_name,
            fields = ?plan.sanitized_fields().collect::<Vec<_>>(),
            "registered sanitizable payload"
        );
        Ok(())
    }

    pub fn plan(&self, schema: &'static Schema) -> Result<Arc<TypePlan>, SanitizeError> {
        self.plans.plan(schema)
    }

    pub fn in_scope(&self, site: &CallSite) -> bool {
        self.scope.in_scope(site)
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Looks `raw` up in the result cache, sanitizing it on a miss.
    ///
    /// The cached value is a fixed point of the policy: the fresh result is
    /// sanitized a second time before it is stored.
    pub fn clean(&self, raw: &str) -> Arc<CleanEntry> {
        self.cache.get_or_compute(raw, || {
            let mut discards = DiscardRecord::default();
            let first = self.policy.sanitize(raw, Some(&mut discards), POLICY_CALLER);
            let value = self.policy.sanitize(&first, None, POLICY_CALLER);
            if value != first {
                tracing::debug!("second sanitize pass changed the value");
            }
            tracing::trace!(cached = self.cache.len(), "sanitized value cached");
            CleanEntry { value, discards }
        })
    }

    /// Sanitizes a single value, leaving values without markup untouched.
    pub fn sanitize_value<'v>(&self, raw: &'v str) -> Cow<'v, str> {
        if !classifier::has_markup(Some(raw)) {
            return Cow::Borrowed(raw);
        }
        Cow::Owned(self.clean(raw).value.clone())
    }

    /// Sanitizes a single value and audits its discards right away.
    pub fn sanitize_field<'v>(&self, raw: &'v str, context: SanitizationContext) -> Cow<'v, str> {
        if !classifier::has_markup(Some(raw)) {
            return Cow::Borrowed(raw);
        }
        let entry = self.clean(raw);
        let mut tracker = DiscardTracker::new();
        tracker.absorb(context, &entry.discards);
        self.flush(&mut tracker);
        Cow::Owned(entry.value.clone())
    }

    /// Runs the payload-walking strategy for one hook invocation.
    ///
    /// Returns `Ok(false)` without touching the payload when `site` is out of scope.
    pub fn sanitize_payload(
        &self,
        payload: &mut dyn PayloadNode,
        site: CallSite,
    ) -> Result<bool, SanitizeError> {
        if !self.in_scope(&site) {
            tracing::trace!(module = site.module, handler = site.handler, "out of sanitize scope");
            return Ok(false);
        }
        let mut tracker = DiscardTracker::new();
        Walker::new(self, site, &mut tracker).walk(payload)?;
        self.flush(&mut tracker);
        Ok(true)
    }

    fn flush(&self, tracker: &mut DiscardTracker) {
        if let Some(message) = tracker.flush_if_non_empty(&self.template) {
            self.sink.emit(&message);
        }
    }
}

impl std::fmt::Debug for HtmlSanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlSanitizer")
            .field("scope", &self.scope)
            .field("template", &self.template)
            .field("cached", &self.cache.len())
            .field("plans", &self.plans.len())
            .finish_non_exhaustive()
    }
}
