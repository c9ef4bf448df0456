//! Content projection into `<slot>` insertion points.
//!
//! Caller-supplied markup captured before the first render is distributed
//! into the processed template:
//!
//! 1. Every `<slot name="n">` receives, in source order, all captured elements
//!    carrying `slot="n"`. A slot with no matches keeps its fallback content.
//! 2. The first `<slot>` without a name receives the remaining top-level
//!    captured nodes that carry no `slot` attribute, but only when they
//!    include an element or non-blank text.
//!
//! Elements addressed to a slot the template does not declare are dropped.

use markup5ever_rcdom::Handle;

use crate::dom;

/// Merge `captured` into the template tree rooted at `template`.
pub fn project(template: &Handle, captured: &Handle) {
    let slots: Vec<Handle> = dom::descendant_elements(template)
        .into_iter()
        .filter(|node| dom::tag_name(node).as_deref() == Some("slot"))
        .collect();

    for slot in slots.iter() {
        let Some(name) = dom::get_attr(slot, "name") else {
            continue;
        };
        let matches: Vec<Handle> = dom::descendant_elements(captured)
            .into_iter()
            .filter(|node| dom::get_attr(node, "slot").as_deref() == Some(name.as_str()))
            .collect();
        if matches.is_empty() {
            continue;
        }
        dom::clear_children(slot);
        for node in matches {
            dom::append(slot, node);
        }
    }

    let Some(default_slot) = slots.iter().find(|slot| !dom::has_attr(slot, "name")) else {
        return;
    };

    let default_nodes: Vec<Handle> = captured
        .children
        .borrow()
        .iter()
        .filter(|node| !(dom::is_element(node) && dom::has_attr(node, "slot")))
        .cloned()
        .collect();

    let has_content = default_nodes.iter().any(|node| {
        dom::is_element(node) || dom::text(node).is_some_and(|t| !t.trim().is_empty())
    });
    if !has_content {
        return;
    }

    dom::clear_children(default_slot);
    for node in default_nodes {
        dom::append(default_slot, node);
    }
}

/// Project `captured` markup into `template` markup and return the merged tree.
pub fn project_markup(template: &str, captured: Option<&str>) -> Handle {
    let root = dom::parse_fragment_root(template);
    if let Some(captured) = captured {
        let content = dom::parse_fragment_root(captured);
        project(&root, &content);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(template: &str, captured: Option<&str>) -> String {
        dom::inner_html(&project_markup(template, captured))
    }

    #[test]
    fn test_named_slots_receive_matching_elements_in_order() {
        let template = "<header><slot name=\"title\">Default title</slot></header><slot name=\"footer\">Fallback</slot>";
        let captured = "<h1 slot=\"title\">One</h1><p>body</p><h2 slot=\"title\">Two</h2>";

        assert_eq!(
            render(template, Some(captured)),
            "<header><slot name=\"title\"><h1 slot=\"title\">One</h1><h2 slot=\"title\">Two</h2></slot></header><slot name=\"footer\">Fallback</slot>"
        );
    }

    #[test]
    fn test_nested_tagged_elements_are_found() {
        let template = "<slot name=\"icon\"></slot>";
        let captured = "<div><img slot=\"icon\" src=\"./i.png\"></div>";
        assert_eq!(
            render(template, Some(captured)),
            "<slot name=\"icon\"><img slot=\"icon\" src=\"./i.png\"></slot>"
        );
    }

    #[test]
    fn test_unmatched_tagged_element_is_dropped() {
        let template = "<div><slot>fallback</slot></div>";
        let captured = "<span slot=\"missing\">lost</span><em>kept</em>";
        assert_eq!(
            render(template, Some(captured)),
            "<div><slot><em>kept</em></slot></div>"
        );
    }

    #[test]
    fn test_blank_default_content_keeps_fallback() {
        let template = "<slot>fallback</slot>";
        assert_eq!(
            render(template, Some("   \n  <b slot=\"x\">x</b>  ")),
            "<slot>fallback</slot>"
        );
    }

    #[test]
    fn test_default_slot_keeps_text_and_element_order() {
        let template = "<p><slot></slot></p>";
        assert_eq!(
            render(template, Some("Hello <b>world</b>!")),
            "<p><slot>Hello <b>world</b>!</slot></p>"
        );
    }

    #[test]
    fn test_no_captured_content_leaves_template() {
        assert_eq!(render("<slot>x</slot>", None), "<slot>x</slot>");
    }
}
