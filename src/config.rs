// src/config.rs

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::net::SocketAddr;

use dotenvy::dotenv;
use thiserror::Error;

/// Default audit message. Placeholders are substituted verbatim at flush time.
pub const DEFAULT_WARNING_MESSAGE: &str = "Rejected HTML in {modelClassName}.{fieldName} \
    handled by {controllerClassName}::{controllerMethodName}: \
    tags={rejectedTags} attributes={rejectedAttributes}";

pub const DEFAULT_SCOPE_PATTERN: &str = "hotels_api::handlers(::.*)?";

const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i",
    "img", "li", "ol", "p", "pre", "s", "span", "strong", "sub", "sup", "table", "tbody", "td",
    "th", "thead", "tr", "u", "ul",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} is not valid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub rust_log: String,
    pub log_dir: String,
    pub cors_allowed_origins: Vec<String>,
    pub sanitize: SanitizeConfig,
}

/// Settings of the HTML sanitization pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeConfig {
    /// Regex matched against the whole module path of a handler.
    pub scope_pattern: String,
    /// Audit message template.
    pub warning_message: String,
    pub allowed_tags: BTreeSet<String>,
    /// Attributes allowed on every allowed tag.
    pub generic_attributes: BTreeSet<String>,
    pub tag_attributes: BTreeMap<String, BTreeSet<String>>,
    pub url_schemes: BTreeSet<String>,
    /// `None` keeps every sanitized value for the lifetime of the process.
    pub cache_capacity: Option<usize>,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        let tag_attributes = [
            ("a", &["href", "target"][..]),
            ("img", &["src", "alt", "width", "height"][..]),
        ]
        .into_iter()
        .map(|(tag, attrs)| (tag.to_string(), to_set(attrs.iter().copied())))
        .collect();

        Self {
            scope_pattern: DEFAULT_SCOPE_PATTERN.to_string(),
            warning_message: DEFAULT_WARNING_MESSAGE.to_string(),
            allowed_tags: to_set(DEFAULT_ALLOWED_TAGS.iter().copied()),
            generic_attributes: to_set(["title"]),
            tag_attributes,
            url_schemes: to_set(["http", "https", "mailto"]),
            cache_capacity: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v).collect())
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Ok(Self {
            bind_addr,
            rust_log,
            log_dir,
            cors_allowed_origins,
            sanitize: SanitizeConfig::from_env()?,
        })
    }
}

impl SanitizeConfig {
    /// Overrides the defaults with whatever `SANITIZE_*` variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(pattern) = env::var("SANITIZE_SCOPE_PATTERN") {
            config.scope_pattern = pattern;
        }
        if let Ok(message) = env::var("SANITIZE_WARNING_MESSAGE") {
            config.warning_message = message;
        }
        if let Ok(tags) = env::var("SANITIZE_ALLOWED_TAGS") {
            config.allowed_tags = lowercase_set(&tags);
        }
        if let Ok(attrs) = env::var("SANITIZE_GENERIC_ATTRIBUTES") {
            config.generic_attributes = lowercase_set(&attrs);
        }
        if let Ok(raw) = env::var("SANITIZE_TAG_ATTRIBUTES") {
            config.tag_attributes = parse_tag_attributes(&raw)?;
        }
        if let Ok(schemes) = env::var("SANITIZE_URL_SCHEMES") {
            config.url_schemes = lowercase_set(&schemes);
        }
        if let Ok(capacity) = env::var("SANITIZE_CACHE_CAPACITY") {
            let capacity = capacity.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: "SANITIZE_CACHE_CAPACITY",
                    reason: e.to_string(),
                }
            })?;
            config.cache_capacity = Some(capacity);
        }

        Ok(config)
    }
}

/// Parses `a=href|target;img=src|alt` into a per-tag attribute table.
pub fn parse_tag_attributes(raw: &str) -> Result<BTreeMap<String, BTreeSet<String>>, ConfigError> {
    let mut table = BTreeMap::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (tag, attrs) = entry.split_once('=').ok_or_else(|| ConfigError::Invalid {
            key: "SANITIZE_TAG_ATTRIBUTES",
            reason: format!("entry `{entry}` is missing `=`"),
        })?;
        let tag = tag.trim().to_ascii_lowercase();
        if tag.is_empty() {
            return Err(ConfigError::Invalid {
                key: "SANITIZE_TAG_ATTRIBUTES",
                reason: format!("entry `{entry}` has no tag name"),
            });
        }
        let attrs: BTreeSet<String> = attrs
            .split('|')
            .map(|a| a.trim().to_ascii_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        table.entry(tag).or_insert_with(BTreeSet::new).extend(attrs);
    }
    Ok(table)
}

/// Comma-separated names, compared case-insensitively by the policy.
fn lowercase_set(value: &str) -> BTreeSet<String> {
    split_list(value).map(|s| s.to_ascii_lowercase()).collect()
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn to_set<'a>(items: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    items.into_iter().map(str::to_string).collect()
}
