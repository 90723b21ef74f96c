// src/sanitize/field.rs
//
// Field-level strategy: sanitization bound to serde on individually marked
// fields, `#[serde(with = "crate::sanitize::field")]` for `String` and
// `#[serde(with = "crate::sanitize::field::option")]` for `Option<String>`.
// No graph walk and no scope check: where the attribute sits is the scope.
//
// Those two modules cannot tell which field they serve, so audit records show
// `-` for model and field. `sanitized_field!` generates a `with` module bound
// to a named model and field instead.

use std::sync::{Arc, LazyLock, OnceLock};

use serde::{Deserialize, Deserializer, Serializer};

use super::HtmlSanitizer;
use super::scope::CallSite;
use super::tracker::SanitizationContext;

static INSTALLED: OnceLock<Arc<HtmlSanitizer>> = OnceLock::new();

static FALLBACK: LazyLock<Arc<HtmlSanitizer>> =
    LazyLock::new(|| Arc::new(HtmlSanitizer::with_defaults()));

const SERIALIZE_SITE: CallSite = CallSite::new("serde", "serialize");
const DESERIALIZE_SITE: CallSite = CallSite::new("serde", "deserialize");

/// Model and field of the generic modules, which serde does not reveal.
const UNKNOWN: &str = "-";

/// Makes `sanitizer` the one used by serde-bound fields.
///
/// Returns `false` if a sanitizer was already installed; the first one stays.
pub fn install(sanitizer: Arc<HtmlSanitizer>) -> bool {
    INSTALLED.set(sanitizer).is_ok()
}

/// The installed sanitizer, or a default-configured one.
pub fn sanitizer() -> &'static HtmlSanitizer {
    match INSTALLED.get() {
        Some(installed) => installed,
        None => &FALLBACK,
    }
}

fn context(site: &CallSite) -> SanitizationContext {
    SanitizationContext::new(site, UNKNOWN, UNKNOWN)
}

/// Builds the audit context of one field for a serde call site.
pub type ContextFn = fn(&CallSite) -> SanitizationContext;

pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<str> + ?Sized,
    S: Serializer,
{
    serialize_in(value, serializer, context)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_in(deserializer, context)
}

#[doc(hidden)]
pub fn serialize_in<T, S>(value: &T, serializer: S, context: ContextFn) -> Result<S::Ok, S::Error>
where
    T: AsRef<str> + ?Sized,
    S: Serializer,
{
    let clean = sanitizer().sanitize_field(value.as_ref(), context(&SERIALIZE_SITE));
    serializer.serialize_str(&clean)
}

#[doc(hidden)]
pub fn deserialize_in<'de, D>(deserializer: D, context: ContextFn) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let clean = sanitizer().sanitize_field(&raw, context(&DESERIALIZE_SITE));
    Ok(clean.into_owned())
}

/// Generates a serde `with` module that sanitizes one field and audits it
/// under its model and field name.
///
/// ```ignore
/// sanitized_field!(summary_name, "HotelSummary", "name");
/// sanitized_field!(option summary_note, "HotelSummary", "note");
///
/// #[serde(with = "summary_name")]
/// name: String,
/// ```
macro_rules! sanitized_field {
    (option $vis:vis $module:ident, $model:literal, $field:literal) => {
        $vis mod $module {
            use $crate::sanitize::{CallSite, SanitizationContext};

            pub fn context(site: &CallSite) -> SanitizationContext {
                SanitizationContext::new(site, $model, $field)
            }

            pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                $crate::sanitize::field::option::serialize_in(value, serializer, context)
            }

            pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::sanitize::field::option::deserialize_in(deserializer, context)
            }
        }
    };
    ($vis:vis $module:ident, $model:literal, $field:literal) => {
        $vis mod $module {
            use $crate::sanitize::{CallSite, SanitizationContext};

            pub fn context(site: &CallSite) -> SanitizationContext {
                SanitizationContext::new(site, $model, $field)
            }

            pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
            where
                T: AsRef<str> + ?Sized,
                S: ::serde::Serializer,
            {
                $crate::sanitize::field::serialize_in(value, serializer, context)
            }

            pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::sanitize::field::deserialize_in(deserializer, context)
            }
        }
    };
}

pub(crate) use sanitized_field;

pub mod option {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{ContextFn, DESERIALIZE_SITE, SERIALIZE_SITE, context, sanitizer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_in(value, serializer, context)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_in(deserializer, context)
    }

    #[doc(hidden)]
    pub fn serialize_in<S>(
        value: &Option<String>,
        serializer: S,
        context: ContextFn,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => {
                let clean = sanitizer().sanitize_field(value, context(&SERIALIZE_SITE));
                serializer.serialize_some(&*clean)
            }
            None => serializer.serialize_none(),
        }
    }

    #[doc(hidden)]
    pub fn deserialize_in<'de, D>(
        deserializer: D,
        context: ContextFn,
    ) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|raw| {
            sanitizer()
                .sanitize_field(&raw, context(&DESERIALIZE_SITE))
                .into_owned()
        }))
    }
}
