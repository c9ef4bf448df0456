//! # Component Runtime
//!
//! Runtime for declarative, attribute-driven components. Each component type
//! supplies a property schema, a markup template fetched by naming convention
//! and optional directives embedded in that template. The runtime keeps three
//! things in step: typed internal state, the host's string attributes and the
//! rendered subtree.
//!
//! ## Invariants
//!
//! 1. **Reflection**: every declared property with an attribute key mirrors its
//!    value outward on write. `null`/`false` remove the attribute, booleans are
//!    presence-only, numbers use their decimal form.
//!
//! 2. **No feedback loops**: outbound writes skip attributes that already hold
//!    the exact string; inbound sync skips values equal to the current one.
//!
//! 3. **Seeding is not a change**: initial values are written to missing
//!    attributes once, without running the change hook.
//!
//! 4. **One style entry per type**: `<style>` blocks are merged into the
//!    process-wide [`StyleRegistry`] the first time a type is acquired and
//!    stripped from every template.
//!
//! 5. **Stale responses are dropped**: acquisition tickets carry the
//!    connection generation; any disconnect or reconnect invalidates them.
//!
//! 6. **Directive order**: conditionals resolve before fragments are
//!    extracted. A failing condition leaves its block verbatim.
//!
//! 7. **Single commit**: projection and path resolution happen on the merged
//!    tree before it reaches the host.
//!
//! 8. **Transient item scope**: `this.item` exists only while one list item
//!    is being instantiated.

mod acquire;
mod config;
mod directive;
mod dom;
mod element;
mod error;
mod expr;
mod fetch;
mod host;
mod paths;
mod project;
mod reflect;
mod schema;
mod styles;
mod value;


pub use acquire::{template_url, AcquireOutcome, AcquireTicket};
pub use config::RuntimeConfig;
pub use directive::{extract_inner_templates, process as process_directives, process_conditionals, ProcessedTemplate};
pub use dom::Selector;
pub use element::{render_to_string, Component, Element, ElementBuilder, ElementState, InstanceScope, Target};
pub use error::{
    AcquireError, CoercionError, ConfigError, EvalError, PathError, RuntimeError, TransportError,
};
pub use expr::{evaluate, interpolate, parse as parse_expression, Expr, Scope};
pub use fetch::{FetchResponse, FsFetcher, MemoryFetcher, TemplateFetcher};
pub use host::{ActionEvent, ComponentRef, HostElement, MemoryHost};
pub use paths::{resolve_paths, resolve_reference};
pub use project::{project, project_markup};
pub use reflect::{PropertyChange, PropertyStore};
pub use schema::{PropertyDescriptor, PropertyKind, PropertySchema};
pub use styles::{extract_styles, StyleRegistry};
pub use value::{parse_number, Value};
