//! Property schema interpretation.
//!
//! A schema is declared once per component type and shared read-only by every
//! instance. It maps each property name to its kind, its optional external
//! attribute key and its default value.

use crate::error::CoercionError;
use crate::value::{parse_number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Number,
    Boolean,
}

impl PropertyKind {
    /// Coerce an inbound attribute value. `None` means the attribute was removed.
    pub fn coerce(&self, attribute: &str, raw: Option<&str>) -> Result<Value, CoercionError> {
        match self {
            PropertyKind::Boolean => Ok(Value::Bool(raw.is_some())),
            PropertyKind::String => Ok(raw.map(Value::from).unwrap_or(Value::Null)),
            PropertyKind::Number => match raw {
                None => Ok(Value::Null),
                Some(text) => parse_number(text).map(Value::Number).ok_or_else(|| {
                    CoercionError::NotANumber {
                        attribute: attribute.to_string(),
                        value: text.to_string(),
                    }
                }),
            },
        }
    }

    /// External representation of an internal value; `None` removes the attribute.
    pub fn attribute_value(&self, value: &Value) -> Option<String> {
        match value {
            Value::Null | Value::Bool(false) => None,
            _ if *self == PropertyKind::Boolean => Some(String::new()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub kind: PropertyKind,
    pub attribute: Option<String>,
    pub default: Value,
}

impl PropertyDescriptor {
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            attribute: None,
            default: Value::Null,
        }
    }

    pub fn string() -> Self {
        Self::new(PropertyKind::String)
    }

    pub fn number() -> Self {
        Self::new(PropertyKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(PropertyKind::Boolean)
    }

    pub fn attribute(mut self, key: impl Into<String>) -> Self {
        self.attribute = Some(key.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySchema {
    entries: Vec<(String, PropertyDescriptor)>,
}

impl PropertySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declaring a name twice replaces the earlier descriptor in place.
    pub fn property(mut self, name: impl Into<String>, descriptor: PropertyDescriptor) -> Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = descriptor,
            None => self.entries.push((name, descriptor)),
        }
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub(crate) fn entry(&self, index: usize) -> Option<(&str, &PropertyDescriptor)> {
        self.entries.get(index).map(|(n, d)| (n.as_str(), d))
    }

    /// External keys the host must report changes for, in declaration order.
    pub fn observed_attributes(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|(_, d)| d.attribute.as_deref())
            .collect()
    }

    /// Reverse lookup from an external key to the property it reflects.
    pub fn find_by_attribute(&self, key: &str) -> Option<(usize, &str, &PropertyDescriptor)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, (_, d))| d.attribute.as_deref() == Some(key))
            .map(|(i, (n, d))| (i, n.as_str(), d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portfolio_schema() -> PropertySchema {
        PropertySchema::new()
            .property(
                "userName",
                PropertyDescriptor::string()
                    .attribute("user-name")
                    .default_value("Guest"),
            )
            .property("internal", PropertyDescriptor::number().default_value(3))
            .property(
                "isMale",
                PropertyDescriptor::boolean()
                    .attribute("is-male")
                    .default_value(false),
            )
    }

    #[test]
    fn test_observed_attributes_skip_unreflected_entries() {
        let schema = portfolio_schema();
        assert_eq!(schema.observed_attributes(), vec!["user-name", "is-male"]);
    }

    #[test]
    fn test_find_by_attribute() {
        let schema = portfolio_schema();
        let (index, name, _) = schema.find_by_attribute("is-male").unwrap();
        assert_eq!((index, name), (2, "isMale"));
        assert!(schema.find_by_attribute("unknown").is_none());
    }

    #[test]
    fn test_boolean_coercion_is_presence() {
        let kind = PropertyKind::Boolean;
        assert_eq!(kind.coerce("x", Some("")), Ok(Value::Bool(true)));
        assert_eq!(kind.coerce("x", Some("false")), Ok(Value::Bool(true)));
        assert_eq!(kind.coerce("x", None), Ok(Value::Bool(false)));
        assert_eq!(kind.attribute_value(&Value::Bool(true)), Some(String::new()));
        assert_eq!(kind.attribute_value(&Value::Bool(false)), None);
    }

    #[test]
    fn test_number_coercion_rejects_garbage() {
        let kind = PropertyKind::Number;
        assert_eq!(kind.coerce("age", Some("42")), Ok(Value::Number(42.0)));
        assert_eq!(
            kind.coerce("age", Some("forty")),
            Err(CoercionError::NotANumber {
                attribute: "age".to_string(),
                value: "forty".to_string()
            })
        );
        assert_eq!(kind.attribute_value(&Value::from(42)), Some("42".to_string()));
    }

    #[test]
    fn test_redeclaring_keeps_position() {
        let schema = portfolio_schema().property("userName", PropertyDescriptor::string());
        assert_eq!(schema.index_of("userName"), Some(0));
        assert_eq!(schema.observed_attributes(), vec!["is-male"]);
    }
}
