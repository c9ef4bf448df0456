//! Rewrites relative resource references so they no longer depend on the
//! location of the page hosting the component.

use markup5ever_rcdom::Handle;
use url::Url;

use crate::config::RuntimeConfig;
use crate::dom;
use crate::error::PathError;

pub fn resolve_reference(reference: &str, base: &Url) -> Result<Url, PathError> {
    base.join(reference).map_err(|e| PathError {
        path: reference.to_string(),
        base: base.to_string(),
        reason: e.to_string(),
    })
}

/// Rewrite every relative resource attribute below `root` against `base`.
/// Returns the number of rewritten attributes; failures keep the original value.
pub fn resolve_paths(root: &Handle, base: &Url, config: &RuntimeConfig) -> usize {
    let mut rewritten = 0;

    for node in dom::descendant_elements(root) {
        for attribute in &config.resource_attributes {
            let Some(value) = dom::get_attr(&node, attribute) else {
                continue;
            };
            if !config.is_relative(&value) {
                continue;
            }
            match resolve_reference(&value, base) {
                Ok(url) => {
                    dom::set_attr(&node, attribute, url.as_str());
                    rewritten += 1;
                }
                Err(e) => tracing::warn!(error = %e, "Failed to resolve path"),
            }
        }
    }

    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://site.test/components/Card/Card.js").unwrap()
    }

    #[test]
    fn test_relative_sources_become_absolute() {
        let root = dom::parse_fragment_root(
            "<img src=\"./img/a.png\"><btn-link src=\"../shared/icon.svg\"></btn-link><img src=\"/abs.png\"><img src=\"https://cdn.test/x.png\">",
        );

        let count = resolve_paths(&root, &base(), &RuntimeConfig::default());

        assert_eq!(count, 2);
        assert_eq!(
            dom::inner_html(&root),
            "<img src=\"https://site.test/components/Card/img/a.png\">\
             <btn-link src=\"https://site.test/components/shared/icon.svg\"></btn-link>\
             <img src=\"/abs.png\"><img src=\"https://cdn.test/x.png\">"
        );
    }

    #[test]
    fn test_configured_attributes() {
        let config = RuntimeConfig {
            resource_attributes: vec!["src".to_string(), "href".to_string()],
            ..Default::default()
        };
        let root = dom::parse_fragment_root("<a href=\"./doc.pdf\">doc</a>");
        assert_eq!(resolve_paths(&root, &base(), &config), 1);
        assert_eq!(
            dom::get_attr(&root.children.borrow()[0], "href").as_deref(),
            Some("https://site.test/components/Card/doc.pdf")
        );
    }

    #[test]
    fn test_unresolvable_base_keeps_original() {
        let base = Url::parse("data:text/plain,x").unwrap();
        let root = dom::parse_fragment_root("<img src=\"./a.png\">");
        assert_eq!(resolve_paths(&root, &base, &RuntimeConfig::default()), 0);
        assert_eq!(dom::inner_html(&root), "<img src=\"./a.png\">");
    }
}
