//! Markup tree helpers over `html5ever` and `markup5ever_rcdom`.
//!
//! Fragments are parsed in a `<body>` context; the returned handle is the
//! synthetic `<html>` container whose children are the fragment nodes.

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_fragment, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::RefCell;
use std::rc::Rc;
use tendril::StrTendril;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parse a markup fragment and return its container node.
pub fn parse_fragment_root(html: &str) -> Handle {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, vec![]).one(html);
    let document = dom.document.clone();
    let root = document.children.borrow().first().cloned();
    match root {
        Some(root) => {
            // Unhook the container so it outlives the document cleanly.
            root.parent.set(None);
            document.children.borrow_mut().clear();
            root
        }
        None => document,
    }
}

/// Serialize the children of `node` as markup.
pub fn inner_html(node: &Handle) -> String {
    let mut buf = Vec::new();
    let handle: SerializableHandle = node.clone().into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    if let Err(e) = serialize(&mut buf, &handle, opts) {
        tracing::warn!(error = %e, "Markup serialization failed");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

pub fn tag_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

/// Text of a text node, `None` for any other node.
pub fn text(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// Concatenated descendant text.
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } => collect_text(child, out),
            _ => {}
        }
    }
}

pub fn get_attr(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn has_attr(node: &Handle, name: &str) -> bool {
    get_attr(node, name).is_some()
}

pub fn set_attr(node: &Handle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        match attrs.iter_mut().find(|a| &*a.name.local == name) {
            Some(attr) => attr.value = StrTendril::from(value),
            None => attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value: StrTendril::from(value),
            }),
        }
    }
}

pub fn remove_attr(node: &Handle, name: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        attrs.borrow_mut().retain(|a| &*a.name.local != name);
    }
}

pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/// Remove `node` from its parent, if it has one.
pub fn detach(node: &Handle) {
    let parent = node.parent.take().and_then(|weak| weak.upgrade());
    if let Some(parent) = parent {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
}

/// Move `child` to the end of `parent`'s children.
pub fn append(parent: &Handle, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

pub fn clear_children(node: &Handle) {
    let children: Vec<Handle> = node.children.borrow_mut().drain(..).collect();
    for child in children {
        child.parent.set(None);
    }
}

/// Parse `html` and move the resulting nodes to the end of `parent`.
pub fn append_html(parent: &Handle, html: &str) {
    let fragment = parse_fragment_root(html);
    let nodes: Vec<Handle> = fragment.children.borrow().clone();
    for node in nodes {
        append(parent, node);
    }
}

pub fn set_text_content(node: &Handle, text: &str) {
    clear_children(node);
    append(node, create_text(text));
}

/// Element descendants of `node` in document order, excluding `node` itself.
pub fn descendant_elements(node: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    collect_elements(node, &mut out);
    out
}

fn collect_elements(node: &Handle, out: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if is_element(child) {
            out.push(child.clone());
            collect_elements(child, out);
        }
    }
}

pub fn query_selector(root: &Handle, selector: &Selector) -> Option<Handle> {
    descendant_elements(root)
        .into_iter()
        .find(|node| selector.matches(node))
}

pub fn query_selector_all(root: &Handle, selector: &Selector) -> Vec<Handle> {
    descendant_elements(root)
        .into_iter()
        .filter(|node| selector.matches(node))
        .collect()
}

/// A compound selector: optional tag, `#id`, `.class` and `[attr]`/`[attr="v"]` parts.
/// Combinators are not supported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn parse(source: &str) -> Option<Self> {
        let source = source.trim();
        if source.is_empty() || source.contains(char::is_whitespace) {
            return None;
        }

        let mut selector = Selector::default();
        let chars: Vec<char> = source.chars().collect();
        let mut i = 0;

        let read_ident = |i: &mut usize| -> String {
            let start = *i;
            while *i < chars.len() && (chars[*i].is_alphanumeric() || chars[*i] == '-' || chars[*i] == '_') {
                *i += 1;
            }
            chars[start..*i].iter().collect()
        };

        if chars[0] != '.' && chars[0] != '#' && chars[0] != '[' {
            let tag = read_ident(&mut i);
            if tag.is_empty() {
                return None;
            }
            selector.tag = Some(tag.to_ascii_lowercase());
        }

        while i < chars.len() {
            match chars[i] {
                '#' => {
                    i += 1;
                    let id = read_ident(&mut i);
                    if id.is_empty() {
                        return None;
                    }
                    selector.id = Some(id);
                }
                '.' => {
                    i += 1;
                    let class = read_ident(&mut i);
                    if class.is_empty() {
                        return None;
                    }
                    selector.classes.push(class);
                }
                '[' => {
                    let close = chars[i..].iter().position(|&c| c == ']')? + i;
                    let body: String = chars[i + 1..close].iter().collect();
                    let (name, value) = match body.split_once('=') {
                        Some((name, value)) => {
                            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                            (name.trim().to_string(), Some(value.to_string()))
                        }
                        None => (body.trim().to_string(), None),
                    };
                    if name.is_empty() {
                        return None;
                    }
                    selector.attributes.push((name, value));
                    i = close + 1;
                }
                _ => return None,
            }
        }

        Some(selector)
    }

    pub fn matches(&self, node: &Handle) -> bool {
        let Some(tag) = tag_name(node) else {
            return false;
        };
        if let Some(expected) = &self.tag {
            if *expected != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if get_attr(node, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = get_attr(node, "class").unwrap_or_default();
            let classes: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        self.attributes.iter().all(|(name, value)| match value {
            Some(value) => get_attr(node, name).as_deref() == Some(value.as_str()),
            None => has_attr(node, name),
        })
    }
}
