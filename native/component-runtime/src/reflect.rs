//! Property/attribute reflection.
//!
//! Keeps each declared property's internal value in step with its external
//! attribute on the host. Writes reflect outward; attribute changes reported
//! by the host are coerced and written back through the same path. Both
//! directions stop when the other side already holds the value, which keeps
//! the two syncs from feeding each other.

use std::collections::BTreeMap;

use crate::error::CoercionError;
use crate::host::HostElement;
use crate::schema::{PropertyDescriptor, PropertySchema};
use crate::value::Value;

/// A property whose value changed under strict inequality.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub name: String,
    pub old: Value,
    pub new: Value,
}

/// Internal values of one element, laid out in schema order.
#[derive(Debug, Clone)]
pub struct PropertyStore {
    schema: &'static PropertySchema,
    values: Vec<Value>,
}

impl PropertyStore {
    /// Two-phase construction: resolve every initial value first (pre-declared,
    /// then schema default, then null), then seed missing attributes without
    /// reporting any change.
    pub fn install<H: HostElement>(
        schema: &'static PropertySchema,
        host: &mut H,
        predeclared: Vec<(String, Value)>,
    ) -> Self {
        let mut values: Vec<Value> = schema.entries().map(|(_, d)| d.default.clone()).collect();

        for (name, value) in predeclared {
            match schema.index_of(&name) {
                Some(index) => values[index] = value,
                None => tracing::debug!(property = %name, "Ignoring undeclared initial value"),
            }
        }

        for ((_, descriptor), value) in schema.entries().zip(values.iter()) {
            let Some(attribute) = descriptor.attribute.as_deref() else {
                continue;
            };
            if host.has_attribute(attribute) {
                continue;
            }
            if let Some(external) = descriptor.kind.attribute_value(value) {
                host.set_attribute(attribute, &external);
            }
        }

        Self { schema, values }
    }

    pub fn schema(&self) -> &'static PropertySchema {
        self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).map(|index| &self.values[index])
    }

    /// Snapshot of every property value, keyed by name.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.schema
            .entries()
            .zip(self.values.iter())
            .map(|((name, _), value)| (name.to_string(), value.clone()))
            .collect()
    }

    /// Store `value`, reflect it to the host and report a change if it differs.
    /// Undeclared names are ignored.
    pub fn set<H: HostElement>(
        &mut self,
        host: &mut H,
        name: &str,
        value: Value,
    ) -> Option<PropertyChange> {
        let Some(index) = self.schema.index_of(name) else {
            tracing::debug!(property = name, "Ignoring write to undeclared property");
            return None;
        };
        self.write(host, index, value)
    }

    fn write<H: HostElement>(
        &mut self,
        host: &mut H,
        index: usize,
        value: Value,
    ) -> Option<PropertyChange> {
        let (name, descriptor) = self.schema.entry(index)?;
        reflect(host, descriptor, &value);

        let old = std::mem::replace(&mut self.values[index], value);
        if old.strict_eq(&self.values[index]) {
            return None;
        }
        Some(PropertyChange {
            name: name.to_string(),
            old,
            new: self.values[index].clone(),
        })
    }

    /// Inbound sync for an attribute change reported by the host.
    ///
    /// Unknown keys and unchanged values are ignored. Numeric attributes that
    /// do not parse are rejected and leave the internal value untouched.
    pub fn attribute_changed<H: HostElement>(
        &mut self,
        host: &mut H,
        attribute: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<Option<PropertyChange>, CoercionError> {
        if old == new {
            return Ok(None);
        }
        let Some((index, _, descriptor)) = self.schema.find_by_attribute(attribute) else {
            return Ok(None);
        };

        let value = descriptor.kind.coerce(attribute, new)?;
        if self.values[index].strict_eq(&value) {
            return Ok(None);
        }
        Ok(self.write(host, index, value))
    }
}

fn reflect<H: HostElement>(host: &mut H, descriptor: &PropertyDescriptor, value: &Value) {
    let Some(attribute) = descriptor.attribute.as_deref() else {
        return;
    };
    match descriptor.kind.attribute_value(value) {
        None => host.remove_attribute(attribute),
        Some(external) => {
            if host.get_attribute(attribute).as_deref() != Some(external.as_str()) {
                host.set_attribute(attribute, &external);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::schema::PropertyDescriptor;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref SCHEMA: PropertySchema = PropertySchema::new()
            .property(
                "label",
                PropertyDescriptor::string().attribute("label").default_value("x"),
            )
            .property(
                "count",
                PropertyDescriptor::number().attribute("count").default_value(0),
            )
            .property("open", PropertyDescriptor::boolean().attribute("open"))
            .property("note", PropertyDescriptor::string());
    }

    #[test]
    fn test_install_seeds_missing_attributes_only() {
        let mut host = MemoryHost::new("x-test").with_attribute("label", "from-markup");
        let store = PropertyStore::install(&SCHEMA, &mut host, vec![]);

        assert_eq!(store.get("label"), Some(&Value::from("x")));
        assert_eq!(host.get_attribute("label").as_deref(), Some("from-markup"));
        assert_eq!(host.get_attribute("count").as_deref(), Some("0"));
        assert!(!host.has_attribute("open"));
        assert_eq!(store.get("open"), Some(&Value::Null));
    }

    #[test]
    fn test_predeclared_values_win_over_defaults() {
        let mut host = MemoryHost::new("x-test");
        let store = PropertyStore::install(
            &SCHEMA,
            &mut host,
            vec![
                ("count".to_string(), Value::from(5)),
                ("bogus".to_string(), Value::from(1)),
            ],
        );
        assert_eq!(store.get("count"), Some(&Value::from(5)));
        assert_eq!(host.get_attribute("count").as_deref(), Some("5"));
        assert_eq!(store.get("bogus"), None);
    }

    #[test]
    fn test_boolean_reflection_roundtrip() {
        let mut host = MemoryHost::new("x-test");
        let mut store = PropertyStore::install(&SCHEMA, &mut host, vec![]);

        let change = store.set(&mut host, "open", Value::Bool(true)).unwrap();
        assert_eq!(change.old, Value::Null);
        assert_eq!(host.get_attribute("open").as_deref(), Some(""));

        let external = host.get_attribute("open");
        let inbound = store
            .attribute_changed(&mut host, "open", external.as_deref(), external.as_deref())
            .unwrap();
        assert!(inbound.is_none());
        assert_eq!(store.get("open"), Some(&Value::Bool(true)));

        store.set(&mut host, "open", Value::Bool(false));
        assert!(!host.has_attribute("open"));
        store.set(&mut host, "open", Value::Bool(true));
        store.set(&mut host, "open", Value::Null);
        assert!(!host.has_attribute("open"));
    }

    #[test]
    fn test_number_roundtrip_is_exact() {
        let mut host = MemoryHost::new("x-test");
        let mut store = PropertyStore::install(&SCHEMA, &mut host, vec![]);

        store.set(&mut host, "count", Value::from(42));
        assert_eq!(host.get_attribute("count").as_deref(), Some("42"));

        store.set(&mut host, "count", Value::from(1));
        let change = store
            .attribute_changed(&mut host, "count", Some("1"), Some("42"))
            .unwrap()
            .unwrap();
        assert_eq!(change.new, Value::Number(42.0));
        assert_eq!(store.get("count"), Some(&Value::Number(42.0)));
    }

    #[test]
    fn test_non_numeric_attribute_is_rejected() {
        let mut host = MemoryHost::new("x-test");
        let mut store = PropertyStore::install(&SCHEMA, &mut host, vec![]);

        let result = store.attribute_changed(&mut host, "count", Some("0"), Some("many"));
        assert!(matches!(result, Err(CoercionError::NotANumber { .. })));
        assert_eq!(store.get("count"), Some(&Value::from(0)));
    }

    #[test]
    fn test_unknown_attribute_and_unreflected_property() {
        let mut host = MemoryHost::new("x-test");
        let mut store = PropertyStore::install(&SCHEMA, &mut host, vec![]);

        assert_eq!(
            store.attribute_changed(&mut host, "nope", None, Some("1")),
            Ok(None)
        );
        let change = store.set(&mut host, "note", Value::from("hi")).unwrap();
        assert_eq!(change.new, Value::from("hi"));
        assert!(!host.has_attribute("note"));
        assert!(store.set(&mut host, "missing", Value::from(1)).is_none());
    }

    #[test]
    fn test_identical_write_reports_nothing() {
        let mut host = MemoryHost::new("x-test");
        let mut store = PropertyStore::install(&SCHEMA, &mut host, vec![]);
        assert!(store.set(&mut host, "label", Value::from("x")).is_none());
    }
}
