//! Host element contract and a headless implementation.
//!
//! The host owns the element's external attributes and its rendered subtree.
//! The runtime only talks to it through [`HostElement`].

use markup5ever_rcdom::Handle;
use std::collections::BTreeMap;

use crate::dom::{self, Selector};
use crate::value::Value;

/// Identity of the element that raised an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    pub type_name: &'static str,
    pub instance_id: u64,
}

/// A custom action event. Bubbles and crosses shadow boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub name: String,
    pub bubbles: bool,
    pub composed: bool,
    /// Current property values of the dispatching element.
    pub detail: BTreeMap<String, Value>,
    pub component: ComponentRef,
}

impl ActionEvent {
    pub fn new(name: impl Into<String>, component: ComponentRef, detail: BTreeMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            bubbles: true,
            composed: true,
            detail,
            component,
        }
    }

    /// The detail payload as JSON, with the back-reference under `component`.
    pub fn detail_json(&self) -> serde_json::Value {
        let mut map: serde_json::Map<String, serde_json::Value> = self
            .detail
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        map.insert(
            "component".to_string(),
            serde_json::json!({
                "type": self.component.type_name,
                "id": self.component.instance_id,
            }),
        );
        serde_json::Value::Object(map)
    }
}

pub trait HostElement {
    /// Handle to a node inside the rendered subtree.
    type Node: Clone;

    fn get_attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&mut self, name: &str, value: &str);
    fn remove_attribute(&mut self, name: &str);

    fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    fn inner_html(&self) -> String;

    /// Replace the whole rendered subtree.
    fn set_inner_html(&mut self, html: &str);

    /// First node of the subtree matching a simple selector.
    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    fn clear_children(&mut self, node: &Self::Node);
    fn append_html(&mut self, node: &Self::Node, html: &str);
    fn set_text_content(&mut self, node: &Self::Node, text: &str);
    fn set_node_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
    fn remove_node_attribute(&mut self, node: &Self::Node, name: &str);

    fn dispatch_event(&mut self, event: ActionEvent);
}

/// In-memory host element backed by an rcdom tree.
///
/// Useful for server-side rendering and tests; dispatched events are recorded.
pub struct MemoryHost {
    tag: String,
    attributes: Vec<(String, String)>,
    root: Handle,
    events: Vec<ActionEvent>,
}

impl MemoryHost {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            root: dom::parse_fragment_root(""),
            events: Vec::new(),
        }
    }

    /// Host whose light DOM already holds caller-supplied markup.
    pub fn with_content(tag: impl Into<String>, html: &str) -> Self {
        let mut host = Self::new(tag);
        host.set_inner_html(html);
        host
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn events(&self) -> &[ActionEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<ActionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn text_of(&self, selector: &str) -> Option<String> {
        self.query_selector(selector).map(|node| dom::text_content(&node))
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<Handle> {
        Selector::parse(selector)
            .map(|parsed| dom::query_selector_all(&self.root, &parsed))
            .unwrap_or_default()
    }

    pub fn inner_html_of(&self, selector: &str) -> Option<String> {
        self.query_selector(selector).map(|node| dom::inner_html(&node))
    }

    pub fn attribute_of(&self, selector: &str, name: &str) -> Option<String> {
        self.query_selector(selector)
            .and_then(|node| dom::get_attr(&node, name))
    }

    /// Serialize the element itself, attributes and subtree included.
    pub fn outer_html(&self) -> String {
        let mut out = format!("<{}", self.tag);
        for (name, value) in &self.attributes {
            if value.is_empty() {
                out.push_str(&format!(" {}", name));
            } else {
                out.push_str(&format!(" {}=\"{}\"", name, value.replace('"', "&quot;")));
            }
        }
        out.push('>');
        out.push_str(&self.inner_html());
        out.push_str(&format!("</{}>", self.tag));
        out
    }
}

impl HostElement for MemoryHost {
    type Node = Handle;

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|(n, _)| n != name);
    }

    fn inner_html(&self) -> String {
        dom::inner_html(&self.root)
    }

    fn set_inner_html(&mut self, html: &str) {
        self.root = dom::parse_fragment_root(html);
    }

    fn query_selector(&self, selector: &str) -> Option<Handle> {
        let parsed = Selector::parse(selector)?;
        dom::query_selector(&self.root, &parsed)
    }

    fn clear_children(&mut self, node: &Handle) {
        dom::clear_children(node);
    }

    fn append_html(&mut self, node: &Handle, html: &str) {
        dom::append_html(node, html);
    }

    fn set_text_content(&mut self, node: &Handle, text: &str) {
        dom::set_text_content(node, text);
    }

    fn set_node_attribute(&mut self, node: &Handle, name: &str, value: &str) {
        dom::set_attr(node, name, value);
    }

    fn remove_node_attribute(&mut self, node: &Handle, name: &str) {
        dom::remove_attr(node, name);
    }

    fn dispatch_event(&mut self, event: ActionEvent) {
        tracing::debug!(event = %event.name, component = event.component.type_name, "Dispatching action event");
        self.events.push(event);
    }
}
