//! Component Element Lifecycle
//!
//! An [`Element`] pairs a leaf [`Component`] with the runtime state the base
//! element owns: reflected properties, acquired template artifacts, captured
//! caller content and the connection generation.
//!
//! ## Pipeline
//!
//! connect → fetch `<TypeName><suffix>` → strip styles into the registry →
//! store raw template → directives → project caller content → resolve paths →
//! commit to host → `rendered` hook → one `process_inner_template` hook per
//! extracted fragment.
//!
//! Property writes after the first render only reach the leaf's
//! `property_changed` hook (which by default updates the view); they never
//! re-run the pipeline. Writes before the first render change state and
//! attributes but render nothing.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use url::Url;

use crate::acquire::{template_url, AcquireOutcome, AcquireTicket};
use crate::config::RuntimeConfig;
use crate::directive;
use crate::dom;
use crate::error::{AcquireError, CoercionError, EvalError, RuntimeError, TransportError};
use crate::expr::{self, Scope};
use crate::fetch::{FetchResponse, TemplateFetcher};
use crate::host::{ActionEvent, ComponentRef, HostElement, MemoryHost};
use crate::paths;
use crate::project;
use crate::reflect::{PropertyChange, PropertyStore};
use crate::schema::PropertySchema;
use crate::styles::{extract_styles, StyleRegistry};
use crate::value::Value;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

// ═══════════════════════════════════════════════════════════════════════════════
// LEAF CONTRACT
// ═══════════════════════════════════════════════════════════════════════════════

/// A concrete component type.
///
/// Leaves declare a schema and override the hooks they care about; every hook
/// has a working default.
pub trait Component<H: HostElement>: Sized {
    /// Type identifier. Names the template resource and the style slot.
    const TYPE_NAME: &'static str;

    fn schema() -> &'static PropertySchema;

    /// Runs once per property whose value changed under strict inequality.
    fn property_changed(&mut self, cx: &mut ElementState<H>, change: &PropertyChange) {
        let _ = change;
        if cx.is_rendered() {
            self.update_view(cx);
        }
    }

    /// Push current property values into the rendered subtree.
    fn update_view(&mut self, cx: &mut ElementState<H>) {
        let _ = cx;
    }

    /// Runs after each commit to the host.
    fn rendered(&mut self, cx: &mut ElementState<H>) {
        self.update_view(cx);
    }

    /// Runs once per extracted fragment after each commit.
    fn process_inner_template(&mut self, cx: &mut ElementState<H>, name: &str, fragment: &str) {
        let _ = (cx, name, fragment);
    }

    /// Methods reachable from template expressions as `this.name(args)`.
    fn call_method(&self, props: &PropertyStore, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let _ = (props, args);
        Err(EvalError::UnknownMethod {
            name: name.to_string(),
        })
    }
}

/// Where list expansion appends its output.
pub enum Target<'a, N> {
    Selector(&'a str),
    Node(N),
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSTANCE SCOPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only view of an instance used by directives and interpolation.
pub struct InstanceScope<'a, C, H> {
    component: &'a C,
    props: &'a PropertyStore,
    item: Option<&'a Value>,
    _host: PhantomData<fn() -> H>,
}

impl<'a, C, H> InstanceScope<'a, C, H>
where
    C: Component<H>,
    H: HostElement,
{
    pub fn new(component: &'a C, state: &'a ElementState<H>) -> Self {
        Self {
            component,
            props: &state.props,
            item: state.item.as_ref(),
            _host: PhantomData,
        }
    }
}

impl<C, H> Scope for InstanceScope<'_, C, H>
where
    C: Component<H>,
    H: HostElement,
{
    fn property(&self, name: &str) -> Option<Value> {
        if name == "item" {
            if let Some(item) = self.item {
                return Some(item.clone());
            }
        }
        self.props.get(name).cloned()
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        self.component.call_method(self.props, name, args)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENT STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the runtime owns for one element, handed to leaf hooks.
pub struct ElementState<H: HostElement> {
    host: H,
    props: PropertyStore,
    config: Arc<RuntimeConfig>,
    type_name: &'static str,
    instance_id: u64,
    base_url: Option<Url>,
    raw_template: Option<String>,
    html: Option<String>,
    initial_content: Option<String>,
    inner_templates: Vec<(String, String)>,
    generation: u64,
    connected: bool,
    pending: VecDeque<PropertyChange>,
    item: Option<Value>,
}

impl<H: HostElement> ElementState<H> {
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn props(&self) -> &PropertyStore {
        &self.props
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Write a property from inside a hook. The change hook for it runs after
    /// the current hook returns.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) -> bool {
        match self.props.set(&mut self.host, name, value.into()) {
            Some(change) => {
                self.pending.push_back(change);
                true
            }
            None => false,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn raw_template(&self) -> Option<&str> {
        self.raw_template.as_deref()
    }

    /// Directive-free render source. `None` until the first render.
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn is_rendered(&self) -> bool {
        self.html.is_some()
    }

    pub fn initial_content(&self) -> Option<&str> {
        self.initial_content.as_deref()
    }

    pub fn inner_templates(&self) -> &[(String, String)] {
        &self.inner_templates
    }

    pub fn inner_template(&self, name: &str) -> Option<&str> {
        self.inner_templates
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, fragment)| fragment.as_str())
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Evaluate `${...}` interpolations against the instance. On failure the
    /// template is returned unchanged.
    pub fn evaluate_string<C: Component<H>>(&self, component: &C, template: &str) -> String {
        let scope = InstanceScope::new(component, self);
        match expr::interpolate(template, &scope) {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(component = self.type_name, error = %e, "Template string evaluation failed");
                template.to_string()
            }
        }
    }

    /// Replace the target's content with one instantiation of `fragment` per
    /// item, in collection order. `this.item` is bound only while each item is
    /// evaluated. Returns the number of items rendered.
    pub fn render_inner_template_list<C: Component<H>>(
        &mut self,
        component: &C,
        items: &Value,
        fragment: &str,
        target: Target<'_, H::Node>,
    ) -> usize {
        let container = match target {
            Target::Selector(selector) => self.host.query_selector(selector),
            Target::Node(node) => Some(node),
        };
        let (Some(container), Some(items)) = (container, items.as_array()) else {
            tracing::debug!(component = self.type_name, "List expansion skipped: no target or no items");
            return 0;
        };

        self.host.clear_children(&container);
        for item in items {
            self.item = Some(item.clone());
            let markup = self.evaluate_string(component, fragment);
            self.host.append_html(&container, &markup);
        }
        self.item = None;

        items.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENT
// ═══════════════════════════════════════════════════════════════════════════════

pub struct ElementBuilder<C, H> {
    component: C,
    host: H,
    config: Arc<RuntimeConfig>,
    initial: Vec<(String, Value)>,
}

impl<C, H> ElementBuilder<C, H>
where
    C: Component<H>,
    H: HostElement,
{
    pub fn config(mut self, config: Arc<RuntimeConfig>) -> Self {
        self.config = config;
        self
    }

    /// Pre-declare an initial value. Takes priority over the schema default.
    pub fn initial(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.initial.push((name.into(), value.into()));
        self
    }

    /// Install properties, then deliver the observed attributes the host
    /// already carried as ordinary attribute notifications.
    pub fn build(self) -> Element<C, H> {
        let mut host = self.host;
        let existing: Vec<(&'static str, String)> = C::schema()
            .observed_attributes()
            .into_iter()
            .filter_map(|attribute| host.get_attribute(attribute).map(|value| (attribute, value)))
            .collect();

        let props = PropertyStore::install(C::schema(), &mut host, self.initial);
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(component = C::TYPE_NAME, instance = instance_id, "Element created");

        let mut element = Element {
            component: self.component,
            state: ElementState {
                host,
                props,
                config: self.config,
                type_name: C::TYPE_NAME,
                instance_id,
                base_url: None,
                raw_template: None,
                html: None,
                initial_content: None,
                inner_templates: Vec::new(),
                generation: 0,
                connected: false,
                pending: VecDeque::new(),
                item: None,
            },
        };

        for (attribute, value) in existing {
            // Rejections are already logged.
            let _ = element.attribute_changed(attribute, None, Some(&value));
        }
        element
    }
}

pub struct Element<C, H>
where
    C: Component<H>,
    H: HostElement,
{
    component: C,
    state: ElementState<H>,
}

impl<C, H> Element<C, H>
where
    C: Component<H>,
    H: HostElement,
{
    pub fn new(component: C, host: H) -> Self {
        Self::builder(component, host).build()
    }

    pub fn builder(component: C, host: H) -> ElementBuilder<C, H> {
        ElementBuilder {
            component,
            host,
            config: Arc::new(RuntimeConfig::default()),
            initial: Vec::new(),
        }
    }

    /// Attribute keys the host must report changes for.
    pub fn observed_attributes() -> Vec<&'static str> {
        C::schema().observed_attributes()
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }

    pub fn state(&self) -> &ElementState<H> {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.state.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.state.host
    }

    pub fn instance_id(&self) -> u64 {
        self.state.instance_id
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.state.props.get(name)
    }

    /// Write a property, reflect it and run the change hook if it changed.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.state.set_property(name, value);
        self.flush();
    }

    /// Inbound sync entry point for host attribute notifications.
    pub fn attribute_changed(
        &mut self,
        attribute: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), CoercionError> {
        let state = &mut self.state;
        match state.props.attribute_changed(&mut state.host, attribute, old, new) {
            Ok(Some(change)) => {
                state.pending.push_back(change);
                self.flush();
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::warn!(component = C::TYPE_NAME, error = %e, "Rejected attribute value");
                Err(e)
            }
        }
    }

    /// Change an attribute on the host the way markup or script outside the
    /// element would, then deliver the notification.
    pub fn set_external_attribute(&mut self, attribute: &str, value: Option<&str>) -> Result<(), CoercionError> {
        let old = self.state.host.get_attribute(attribute);
        match value {
            Some(value) => self.state.host.set_attribute(attribute, value),
            None => self.state.host.remove_attribute(attribute),
        }
        self.attribute_changed(attribute, old.as_deref(), value)
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Acquisition
    // ───────────────────────────────────────────────────────────────────────────

    /// Attach to the document. `base` is the location of the module defining
    /// the component type; its template is resolved next to it.
    ///
    /// Every call starts a new generation, so tickets from earlier connections
    /// are rejected on completion.
    pub fn connect(&mut self, base: Url) -> Result<AcquireTicket, AcquireError> {
        let state = &mut self.state;
        state.generation += 1;
        state.connected = true;

        if state.initial_content.is_none() && state.raw_template.is_none() {
            let content = state.host.inner_html();
            if !content.trim().is_empty() {
                state.initial_content = Some(content);
            }
        }

        let url = template_url(&base, C::TYPE_NAME, &state.config.template_suffix).map_err(|e| {
            tracing::error!(component = C::TYPE_NAME, error = %e, "Template location is invalid");
            e
        })?;
        state.base_url = Some(base);

        tracing::debug!(component = C::TYPE_NAME, url = %url, generation = state.generation, "Acquiring template");
        Ok(AcquireTicket {
            generation: state.generation,
            instance_id: state.instance_id,
            url,
            type_name: C::TYPE_NAME,
        })
    }

    pub fn disconnect(&mut self) {
        self.state.connected = false;
        self.state.generation += 1;
        tracing::debug!(component = C::TYPE_NAME, instance = self.state.instance_id, "Element disconnected");
    }

    /// Finish an acquisition started by [`Element::connect`].
    pub fn complete_acquire(
        &mut self,
        ticket: AcquireTicket,
        response: Result<FetchResponse, TransportError>,
        registry: &StyleRegistry,
    ) -> Result<AcquireOutcome, AcquireError> {
        if ticket.instance_id != self.state.instance_id
            || ticket.generation != self.state.generation
            || !self.state.connected
        {
            tracing::debug!(
                component = C::TYPE_NAME,
                url = %ticket.url,
                ticket = ticket.generation,
                current = self.state.generation,
                "Discarding stale template response"
            );
            return Ok(AcquireOutcome::Discarded);
        }

        let response = response.map_err(|e| {
            tracing::error!(component = C::TYPE_NAME, url = %ticket.url, error = %e, "Template request failed");
            AcquireError::from(e)
        })?;
        if !response.ok() {
            tracing::error!(component = C::TYPE_NAME, url = %ticket.url, status = response.status, "Template request failed");
            return Err(AcquireError::Status {
                url: ticket.url.to_string(),
                status: response.status,
            });
        }

        let raw = extract_styles(&response.body, C::TYPE_NAME, registry);
        self.state.raw_template = Some(raw);
        self.force_update();
        Ok(AcquireOutcome::Rendered)
    }

    /// Connect and acquire synchronously through `fetcher`, using the
    /// process-wide style registry.
    pub fn load_template(&mut self, base: Url, fetcher: &dyn TemplateFetcher) -> Result<AcquireOutcome, AcquireError> {
        self.load_template_with(base, fetcher, StyleRegistry::global())
    }

    pub fn load_template_with(
        &mut self,
        base: Url,
        fetcher: &dyn TemplateFetcher,
        registry: &StyleRegistry,
    ) -> Result<AcquireOutcome, AcquireError> {
        let ticket = self.connect(base)?;
        let response = fetcher.fetch(&ticket.url);
        self.complete_acquire(ticket, response, registry)
    }

    /// Fetch the template again from the current connection's base.
    /// A disconnected element is left disconnected.
    pub fn reload(&mut self, fetcher: &dyn TemplateFetcher, registry: &StyleRegistry) -> Result<AcquireOutcome, AcquireError> {
        if !self.state.connected {
            return Err(AcquireError::NotConnected);
        }
        let base = self.state.base_url.clone().ok_or(AcquireError::NotConnected)?;
        self.load_template_with(base, fetcher, registry)
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Rendering
    // ───────────────────────────────────────────────────────────────────────────

    /// Re-run directives against current state and render.
    pub fn force_update(&mut self) {
        let Some(raw) = self.state.raw_template.as_deref() else {
            tracing::debug!(component = C::TYPE_NAME, "No template yet, skipping update");
            return;
        };

        let processed = {
            let scope = InstanceScope::new(&self.component, &self.state);
            directive::process(raw, &scope)
        };
        self.state.inner_templates = processed.inner_templates;
        self.state.html = Some(processed.html);

        self.render();

        let fragments = self.state.inner_templates.clone();
        for (name, fragment) in &fragments {
            self.component
                .process_inner_template(&mut self.state, name, fragment);
            self.flush();
        }
    }

    /// Project caller content into the render source, resolve relative paths
    /// and commit the result to the host in one step.
    pub fn render(&mut self) {
        let Some(html) = self.state.html.as_deref() else {
            return;
        };

        let root = project::project_markup(html, self.state.initial_content.as_deref());
        if let Some(base) = &self.state.base_url {
            paths::resolve_paths(&root, base, &self.state.config);
        }
        let markup = dom::inner_html(&root);

        self.state.host.set_inner_html(&markup);
        tracing::debug!(component = C::TYPE_NAME, instance = self.state.instance_id, "Rendered");

        self.component.rendered(&mut self.state);
        self.flush();
    }

    pub fn evaluate_string(&self, template: &str) -> String {
        self.state.evaluate_string(&self.component, template)
    }

    pub fn render_inner_template_list(&mut self, items: &Value, fragment: &str, target: Target<'_, H::Node>) -> usize {
        self.state
            .render_inner_template_list(&self.component, items, fragment, target)
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Events
    // ───────────────────────────────────────────────────────────────────────────

    /// Action event carrying the current property values.
    pub fn action_event(&self, name: &str) -> ActionEvent {
        ActionEvent::new(
            name,
            ComponentRef {
                type_name: C::TYPE_NAME,
                instance_id: self.state.instance_id,
            },
            self.state.props.snapshot(),
        )
    }

    pub fn dispatch_action(&mut self, name: &str) {
        let event = self.action_event(name);
        self.state.host.dispatch_event(event);
    }

    fn flush(&mut self) {
        while let Some(change) = self.state.pending.pop_front() {
            tracing::debug!(
                component = C::TYPE_NAME,
                property = %change.name,
                "Property changed"
            );
            self.component.property_changed(&mut self.state, &change);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVER-SIDE RENDERING
// ═══════════════════════════════════════════════════════════════════════════════

/// Render one element on a headless host and return its stylesheet (when the
/// type registered one) followed by the element's outer markup.
pub fn render_to_string<C>(
    component: C,
    host: MemoryHost,
    base: Url,
    config: Arc<RuntimeConfig>,
    fetcher: &dyn TemplateFetcher,
    registry: &StyleRegistry,
) -> Result<String, RuntimeError>
where
    C: Component<MemoryHost>,
{
    let mut element = Element::builder(component, host).config(config).build();
    element.load_template_with(base, fetcher, registry)?;

    let mut out = registry
        .stylesheet(C::TYPE_NAME, element.state().config())
        .unwrap_or_default();
    out.push_str(&element.host().outer_html());
    Ok(out)
}
