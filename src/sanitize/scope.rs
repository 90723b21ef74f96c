// src/sanitize/scope.rs

use regex::Regex;

use crate::error::SanitizeError;

/// Identifies the handler a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// Module path of the handler, as given by `module_path!()`.
    pub module: &'static str,
    /// Handler function name.
    pub handler: &'static str,
}

impl CallSite {
    pub const fn new(module: &'static str, handler: &'static str) -> Self {
        Self { module, handler }
    }
}

/// Decides whether the pipeline runs for a call site.
///
/// The pattern must match the whole module path, so `hotels_api::handlers`
/// does not accidentally cover `hotels_api::handlers_internal`.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    pattern: Option<Regex>,
}

impl ScopeFilter {
    pub fn new(pattern: &str) -> Result<Self, SanitizeError> {
        let anchored = format!("^(?:{pattern})$");
        let pattern = Regex::new(&anchored).map_err(|e| SanitizeError::InvalidScopePattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Every call site is in scope.
    pub fn all() -> Self {
        Self { pattern: None }
    }

    pub fn in_scope(&self, site: &CallSite) -> bool {
        self.pattern
            .as_ref()
            .is_none_or(|pattern| pattern.is_match(site.module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_whole_module_path() {
        let filter = ScopeFilter::new(r"hotels_api::handlers(::.*)?").unwrap();

        assert!(filter.in_scope(&CallSite::new("hotels_api::handlers", "list")));
        assert!(filter.in_scope(&CallSite::new("hotels_api::handlers::hotels", "list")));
        assert!(!filter.in_scope(&CallSite::new("hotels_api::handlers_internal", "list")));
        assert!(!filter.in_scope(&CallSite::new("other::hotels_api::handlers", "list")));
    }

    #[test]
    fn unrestricted_filter_accepts_everything() {
        assert!(ScopeFilter::all().in_scope(&CallSite::new("anything::at_all", "f")));
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let err = ScopeFilter::new("hotels_api::(").unwrap_err();
        assert!(matches!(err, SanitizeError::InvalidScopePattern { .. }));
    }
}
