//! Process-wide style registry.
//!
//! Each component type contributes its template's `<style>` blocks exactly
//! once. Entries are keyed by type name, inserted only when absent and never
//! removed for the lifetime of the process.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::config::RuntimeConfig;

lazy_static! {
    // Comments and scripts are matched first so any `<style>` text inside them
    // is passed through untouched. Only group 1 marks a real style element.
    static ref STYLE_RE: Regex = Regex::new(
        r"(?is)<!--.*?-->|<script(?:\s[^>]*)?>.*?</script\s*>|<style(?:\s[^>]*)?>(.*?)</style\s*>"
    )
    .unwrap();
    static ref GLOBAL_REGISTRY: StyleRegistry = StyleRegistry::new();
}

#[derive(Debug, Default)]
pub struct StyleRegistry {
    entries: Mutex<BTreeMap<String, String>>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every element in the process.
    pub fn global() -> &'static StyleRegistry {
        &GLOBAL_REGISTRY
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.lock().contains_key(type_name)
    }

    pub fn get(&self, type_name: &str) -> Option<String> {
        self.lock().get(type_name).cloned()
    }

    /// Returns `true` when the entry was inserted, `false` when one already existed.
    pub fn insert_if_absent(&self, type_name: &str, css: String) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(type_name) {
            return false;
        }
        entries.insert(type_name.to_string(), css);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Slot ids of every populated entry, e.g. `style-SectionPortfolio`.
    pub fn ids(&self, config: &RuntimeConfig) -> Vec<String> {
        self.lock().keys().map(|name| config.style_id(name)).collect()
    }

    /// Render the entry as a `<style>` element for injection into the document head.
    pub fn stylesheet(&self, type_name: &str, config: &RuntimeConfig) -> Option<String> {
        self.get(type_name)
            .map(|css| format!("<style id=\"{}\">{}</style>", config.style_id(type_name), css))
    }
}

/// Strip every `<style>` element from `markup`. The first time a type is
/// seen, the elements' contents are merged into the registry.
pub fn extract_styles(markup: &str, type_name: &str, registry: &StyleRegistry) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let stripped = STYLE_RE.replace_all(markup, |caps: &Captures| match caps.get(1) {
        Some(css) => {
            blocks.push(css.as_str().to_string());
            String::new()
        }
        None => caps[0].to_string(),
    });

    if blocks.is_empty() {
        return markup.to_string();
    }

    if !registry.contains(type_name) {
        let mut merged = String::new();
        for css in &blocks {
            merged.push_str(css);
            merged.push('\n');
        }
        if !merged.trim().is_empty() && registry.insert_if_absent(type_name, merged) {
            tracing::debug!(component = type_name, "Registered component styles");
        }
    }

    stripped.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "<style>.a { color: red; }</style><div class=\"a\"></div><STYLE media=\"print\">.b {}</STYLE>";

    #[test]
    fn test_styles_merge_once_per_type() {
        let registry = StyleRegistry::new();

        let first = extract_styles(TEMPLATE, "Card", &registry);
        let second = extract_styles(TEMPLATE, "Card", &registry);

        assert_eq!(first, "<div class=\"a\"></div>");
        assert_eq!(second, first);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("Card").as_deref(),
            Some(".a { color: red; }\n.b {}\n")
        );
    }

    #[test]
    fn test_existing_entry_is_not_remerged() {
        let registry = StyleRegistry::new();
        registry.insert_if_absent("Card", "original".to_string());

        let stripped = extract_styles(TEMPLATE, "Card", &registry);

        assert_eq!(stripped, "<div class=\"a\"></div>");
        assert_eq!(registry.get("Card").as_deref(), Some("original"));
    }

    #[test]
    fn test_blank_styles_register_nothing() {
        let registry = StyleRegistry::new();
        let stripped = extract_styles("<style>  </style><p></p>", "Empty", &registry);
        assert_eq!(stripped, "<p></p>");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_stylesheet_rendering() {
        let registry = StyleRegistry::new();
        registry.insert_if_absent("Card", ".a{}".to_string());
        let config = RuntimeConfig::default();
        assert_eq!(
            registry.stylesheet("Card", &config).as_deref(),
            Some("<style id=\"style-Card\">.a{}</style>")
        );
        assert_eq!(registry.ids(&config), vec!["style-Card".to_string()]);

        let custom = RuntimeConfig {
            style_id_prefix: "css-".to_string(),
            ..Default::default()
        };
        assert_eq!(registry.ids(&custom), vec!["css-Card".to_string()]);
        assert!(registry.stylesheet("Missing", &custom).is_none());
    }

    #[test]
    fn test_style_prefixed_tags_are_not_styles() {
        let registry = StyleRegistry::new();
        let markup = "<style-box>hi</style-box><styles></styles><p>x</p><style>.a{}</style>";

        let stripped = extract_styles(markup, "Boxed", &registry);

        assert_eq!(stripped, "<style-box>hi</style-box><styles></styles><p>x</p>");
        assert_eq!(registry.get("Boxed").as_deref(), Some(".a{}\n"));
    }

    #[test]
    fn test_style_text_in_comments_and_scripts_is_kept() {
        let registry = StyleRegistry::new();
        let markup = "<!-- <style>.old{}</style> --><script>const s = '<style>.x{}</style>';</script><style>.live{}</style><i></i>";

        let stripped = extract_styles(markup, "Commented", &registry);

        assert_eq!(
            stripped,
            "<!-- <style>.old{}</style> --><script>const s = '<style>.x{}</style>';</script><i></i>"
        );
        assert_eq!(registry.get("Commented").as_deref(), Some(".live{}\n"));
    }

    #[test]
    fn test_markup_without_styles_is_unchanged() {
        let registry = StyleRegistry::new();
        let markup = "<!-- if(this.open) --><p>x</p><!-- endif -->";
        assert_eq!(extract_styles(markup, "Plain", &registry), markup);
        assert!(registry.is_empty());
    }
}
