// src/sanitize/policy.rs

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::SanitizeConfig;

/// Tags whose whole content is dropped rather than unwrapped when they are not allowed.
const CLEAN_CONTENT_TAGS: &[&str] = &["script", "style"];

/// Elements whose content the HTML parser reads as text up to the matching end tag.
const RAW_TEXT_TAGS: &[&str] = &[
    "script", "style", "textarea", "title", "iframe", "noscript", "noembed", "noframes", "xmp",
    "plaintext",
];

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([A-Za-z][A-Za-z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).unwrap()
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#).unwrap()
});

/// Receives everything a policy removes.
///
/// `caller` only attributes the call in logs.
pub trait DiscardObserver {
    fn discarded_tag(&mut self, caller: &str, tag: &str);

    fn discarded_attributes(&mut self, caller: &str, tag: &str, attributes: &[&str]);
}

/// An allow-list HTML sanitization policy.
///
/// Implementations must be deterministic: the same input under the same
/// configuration yields the same output and the same discard notifications.
pub trait SanitizePolicy: Send + Sync {
    fn sanitize(
        &self,
        input: &str,
        observer: Option<&mut dyn DiscardObserver>,
        caller: &str,
    ) -> String;
}

/// Allow-list policy backed by `ammonia`.
///
/// `ammonia` does the actual cleaning. Discards are reported from a
/// lightweight scan of the input's start tags against the same allow-list;
/// the scan is only used for auditing and is never a security boundary.
#[derive(Debug, Clone, Default)]
pub struct AllowListPolicy {
    tags: BTreeSet<String>,
    generic_attributes: BTreeSet<String>,
    tag_attributes: BTreeMap<String, BTreeSet<String>>,
    url_schemes: BTreeSet<String>,
}

impl AllowListPolicy {
    /// A policy allowing exactly `tags`, with no attributes.
    pub fn new<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            tags: tags.into_iter().map(str::to_ascii_lowercase).collect(),
            url_schemes: ["http", "https", "mailto"].map(String::from).into(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &SanitizeConfig) -> Self {
        Self {
            tags: config.allowed_tags.clone(),
            generic_attributes: config.generic_attributes.clone(),
            tag_attributes: config.tag_attributes.clone(),
            url_schemes: config.url_schemes.clone(),
        }
    }

    pub fn with_generic_attributes<'a>(mut self, attrs: impl IntoIterator<Item = &'a str>) -> Self {
        self.generic_attributes
            .extend(attrs.into_iter().map(str::to_ascii_lowercase));
        self
    }

    pub fn with_tag_attributes<'a>(
        mut self,
        tag: &str,
        attrs: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.tag_attributes
            .entry(tag.to_ascii_lowercase())
            .or_default()
            .extend(attrs.into_iter().map(str::to_ascii_lowercase));
        self
    }

    fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    fn allows_attribute(&self, tag: &str, attribute: &str) -> bool {
        self.generic_attributes.contains(attribute)
            || self
                .tag_attributes
                .get(tag)
                .is_some_and(|attrs| attrs.contains(attribute))
    }

    /// Attributes `ammonia` treats as URLs.
    fn is_url_attribute(tag: &str, attribute: &str) -> bool {
        matches!(attribute, "href" | "src")
            || (tag == "form" && attribute == "action")
            || (tag == "object" && attribute == "data")
            || (matches!(tag, "button" | "input") && attribute == "formaction")
            || (tag == "a" && attribute == "ping")
            || (tag == "video" && attribute == "poster")
    }

    /// Same decision `ammonia` makes: absolute URLs need an allowed scheme,
    /// relative ones pass through, anything unparsable is dropped.
    fn allows_url(&self, value: &str) -> bool {
        match Url::parse(value) {
            Ok(url) => self.url_schemes.contains(url.scheme()),
            Err(url::ParseError::RelativeUrlWithoutBase) => true,
            Err(_) => false,
        }
    }

    fn builder(&self) -> ammonia::Builder<'_> {
        let tags: HashSet<&str> = self.tags.iter().map(String::as_str).collect();
        let generic: HashSet<&str> = self.generic_attributes.iter().map(String::as_str).collect();
        let per_tag: HashMap<&str, HashSet<&str>> = self
            .tag_attributes
            .iter()
            .map(|(tag, attrs)| (tag.as_str(), attrs.iter().map(String::as_str).collect()))
            .collect();
        let schemes: HashSet<&str> = self.url_schemes.iter().map(String::as_str).collect();
        // ammonia refuses overlap between clean-content tags and allowed tags.
        let clean_content: HashSet<&str> = CLEAN_CONTENT_TAGS
            .iter()
            .copied()
            .filter(|tag| !self.tags.contains(*tag) && !self.tag_attributes.contains_key(*tag))
            .collect();

        let mut builder = ammonia::Builder::default();
        builder
            .tags(tags)
            .generic_attributes(generic)
            .tag_attributes(per_tag)
            .url_schemes(schemes)
            .clean_content_tags(clean_content)
            .link_rel(None)
            .strip_comments(true);
        builder
    }

    /// Reports every start tag or attribute the allow-list will remove.
    fn report_discards(&self, input: &str, observer: &mut dyn DiscardObserver, caller: &str) {
        let without_comments = COMMENT.replace_all(input, "");
        let source = without_comments.as_ref();
        let lower = source.to_ascii_lowercase();

        let mut pos = 0;
        while let Some(caps) = START_TAG.captures_at(source, pos) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            pos = whole.end();
            let tag = name.as_str().to_ascii_lowercase();

            if self.allows_tag(&tag) {
                let attributes = caps.get(2).map_or("", |m| m.as_str());
                let rejected = self.rejected_attributes(&tag, attributes);
                if !rejected.is_empty() {
                    let names: Vec<&str> = rejected.iter().map(String::as_str).collect();
                    observer.discarded_attributes(caller, &tag, &names);
                }
            } else {
                observer.discarded_tag(caller, &tag);
            }

            if RAW_TEXT_TAGS.contains(&tag.as_str()) {
                // The body of a raw-text element is text, not tags.
                let closing = format!("</{tag}");
                pos = lower[pos..]
                    .find(&closing)
                    .map_or(source.len(), |offset| pos + offset);
            }
        }
    }

    fn rejected_attributes(&self, tag: &str, attributes: &str) -> Vec<String> {
        let mut rejected: Vec<String> = Vec::new();
        for attr in ATTRIBUTE.captures_iter(attributes) {
            let Some(name) = attr.get(1) else { continue };
            let name = name.as_str().to_ascii_lowercase();
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str());

            let allowed = self.allows_attribute(tag, &name)
                && (!Self::is_url_attribute(tag, &name) || self.allows_url(value));
            if !allowed && !rejected.contains(&name) {
                rejected.push(name);
            }
        }
        rejected
    }
}

impl SanitizePolicy for AllowListPolicy {
    fn sanitize(
        &self,
        input: &str,
        observer: Option<&mut dyn DiscardObserver>,
        caller: &str,
    ) -> String {
        if let Some(observer) = observer {
            self.report_discards(input, observer, caller);
        }
        self.builder().clean(input).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        tags: Vec<String>,
        attributes: Vec<(String, Vec<String>)>,
    }

    impl DiscardObserver for Recorder {
        fn discarded_tag(&mut self, _caller: &str, tag: &str) {
            self.tags.push(tag.to_string());
        }

        fn discarded_attributes(&mut self, _caller: &str, tag: &str, attributes: &[&str]) {
            self.attributes.push((
                tag.to_string(),
                attributes.iter().map(|a| a.to_string()).collect(),
            ));
        }
    }

    #[test]
    fn strips_script_and_event_handlers() {
        let policy = AllowListPolicy::new(["b"]);
        let mut recorder = Recorder::default();

        let output = policy.sanitize(
            "<script>alert(1)</script><b onclick='x'>ok</b>",
            Some(&mut recorder),
            "test",
        );

        assert_eq!(output, "<b>ok</b>");
        assert_eq!(recorder.tags, vec!["script"]);
        assert_eq!(
            recorder.attributes,
            vec![("b".to_string(), vec!["onclick".to_string()])]
        );
    }

    #[test]
    fn keeps_allowed_attributes() {
        let policy = AllowListPolicy::new(["a"]).with_tag_attributes("a", ["href"]);
        let mut recorder = Recorder::default();

        let output = policy.sanitize(
            r#"<a href="https://example.com" onmouseover="x()">link</a>"#,
            Some(&mut recorder),
            "test",
        );

        assert_eq!(output, r#"<a href="https://example.com">link</a>"#);
        assert!(recorder.tags.is_empty());
        assert_eq!(recorder.attributes[0].1, vec!["onmouseover".to_string()]);
    }

    #[test]
    fn unwraps_disallowed_tags_but_keeps_text() {
        let policy = AllowListPolicy::new(Vec::<&str>::new());
        assert_eq!(policy.sanitize("<i>x</i>", None, "test"), "x");
    }

    #[test]
    fn ignores_markup_inside_dropped_script_and_comments() {
        let policy = AllowListPolicy::new(["b"]);
        let mut recorder = Recorder::default();

        policy.sanitize(
            "<!-- <iframe> --><SCRIPT>document.write('<img src=x>')</SCRIPT>",
            Some(&mut recorder),
            "test",
        );

        assert_eq!(recorder.tags, vec!["script"]);
        assert!(recorder.attributes.is_empty());
    }

    #[test]
    fn reports_url_attributes_with_disallowed_schemes() {
        let policy = AllowListPolicy::from_config(&SanitizeConfig::default());
        let mut recorder = Recorder::default();

        let output = policy.sanitize(
            r#"<a href="javascript:alert(1)">x</a><img src="javascript:y"><img src="/logo.png">"#,
            Some(&mut recorder),
            "test",
        );

        assert_eq!(output, r#"<a>x</a><img><img src="/logo.png">"#);
        assert!(recorder.tags.is_empty());
        assert_eq!(
            recorder.attributes,
            vec![
                ("a".to_string(), vec!["href".to_string()]),
                ("img".to_string(), vec!["src".to_string()]),
            ]
        );
    }

    #[test]
    fn allowed_schemes_and_relative_urls_are_not_reported() {
        let policy = AllowListPolicy::from_config(&SanitizeConfig::default());
        let mut recorder = Recorder::default();

        policy.sanitize(
            r#"<a href="https://example.com/a">a</a><a href="mailto:x@example.com">b</a><a href="../c">c</a>"#,
            Some(&mut recorder),
            "test",
        );

        assert!(recorder.tags.is_empty());
        assert!(recorder.attributes.is_empty());
    }

    #[test]
    fn markup_inside_raw_text_elements_is_not_reported() {
        let policy = AllowListPolicy::new(["b"]);
        let mut recorder = Recorder::default();

        let output = policy.sanitize(
            r#"<textarea><b onclick="x">hi</b></textarea><title><i>t</i></title>"#,
            Some(&mut recorder),
            "test",
        );

        assert!(!output.contains("<b"));
        assert_eq!(recorder.tags, vec!["textarea", "title"]);
        assert!(recorder.attributes.is_empty());
    }

    #[test]
    fn allowing_script_does_not_panic() {
        let policy = AllowListPolicy::new(["script"]);
        let output = policy.sanitize("<script>x</script>", None, "test");
        assert!(output.contains("<script>"));
    }
}
