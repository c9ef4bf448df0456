//! Template acquisition.
//!
//! A component type's template lives next to the module that defines it and
//! is named after the type: `<TypeName><suffix>`. Acquisition is split into a
//! ticket issued on connect and a completion that carries the fetch result,
//! so the fetch itself may happen anywhere in between.

use url::Url;

use crate::error::AcquireError;

/// Resolve the conventional template location for `type_name` relative to `base`.
pub fn template_url(base: &Url, type_name: &str, suffix: &str) -> Result<Url, AcquireError> {
    let template = format!("{}{}", type_name, suffix);
    base.join(&template).map_err(|e| AcquireError::InvalidUrl {
        template,
        base: base.to_string(),
        reason: e.to_string(),
    })
}

/// An in-flight acquisition for one connection of one element.
///
/// The generation ties the ticket to the connection that issued it; completing
/// a ticket after the element was disconnected or reconnected is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireTicket {
    pub(crate) generation: u64,
    pub(crate) instance_id: u64,
    pub url: Url,
    pub type_name: &'static str,
}

impl AcquireTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The template was stored and the element rendered.
    Rendered,
    /// The ticket no longer matches the element's connection; nothing changed.
    Discarded,
}
