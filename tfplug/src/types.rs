//! Core type system for tfplug
//!
//! This module provides the core types used throughout the framework,
//! including Dynamic values, attribute paths and diagnostics.

use crate::error::{Result, TfplugError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Dynamic represents Terraform values that can be of any type
/// This is the core type for all configuration and state data
/// IMPORTANT: Always use type-safe accessors instead of matching directly
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    /// Explicit null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integral number
    Int(i64),
    /// Non-integral number
    Float(f64),
    /// String value
    String(String),
    /// List of values (ordered, allows duplicates)
    List(Vec<Dynamic>),
    /// Map of string keys to values (objects are represented as Maps)
    Map(HashMap<String, Dynamic>),
    /// Value not yet known (during planning)
    Unknown,
}

impl Dynamic {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integral value; a float is accepted only when the conversion is lossless
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Dynamic::Int(i) => Some(*i),
            Dynamic::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Dynamic::Int(i) => Some(*i as f64),
            Dynamic::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Dynamic>> {
        match self {
            Dynamic::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) => "int",
            Dynamic::Float(_) => "float",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }

    /// Replaces every unknown value (at any depth) with null
    pub fn resolve_unknowns(&mut self) {
        match self {
            Dynamic::Unknown => *self = Dynamic::Null,
            Dynamic::List(items) => items.iter_mut().for_each(Dynamic::resolve_unknowns),
            Dynamic::Map(map) => map.values_mut().for_each(Dynamic::resolve_unknowns),
            _ => {}
        }
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(value.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(value: String) -> Self {
        Dynamic::String(value)
    }
}

impl From<i64> for Dynamic {
    fn from(value: i64) -> Self {
        Dynamic::Int(value)
    }
}

impl From<f64> for Dynamic {
    fn from(value: f64) -> Self {
        Dynamic::Float(value)
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

impl From<Vec<Dynamic>> for Dynamic {
    fn from(value: Vec<Dynamic>) -> Self {
        Dynamic::List(value)
    }
}

impl From<HashMap<String, Dynamic>> for Dynamic {
    fn from(value: HashMap<String, Dynamic>) -> Self {
        Dynamic::Map(value)
    }
}

impl Serialize for Dynamic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Int(i) => serializer.serialize_i64(*i),
            Dynamic::Float(f) => serializer.serialize_f64(*f),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(l) => l.serialize(serializer),
            Dynamic::Map(m) => m.serialize(serializer),
            Dynamic::Unknown => serializer.serialize_str("__unknown__"),
        }
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct DynamicVisitor;

        impl<'de> Visitor<'de> for DynamicVisitor {
            type Value = Dynamic;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a valid Dynamic value")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Null)
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Null)
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Bool(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Int(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Dynamic, E> {
                Ok(i64::try_from(value)
                    .map(Dynamic::Int)
                    .unwrap_or(Dynamic::Float(value as f64)))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Float(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Dynamic, E> {
                if value == "__unknown__" {
                    Ok(Dynamic::Unknown)
                } else {
                    Ok(Dynamic::String(value.to_string()))
                }
            }

            fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<Dynamic, E> {
                if value == "__unknown__" {
                    Ok(Dynamic::Unknown)
                } else {
                    Ok(Dynamic::String(value))
                }
            }

            fn visit_seq<V>(self, mut seq: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Dynamic::List(vec))
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut hashmap = HashMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    hashmap.insert(key, value);
                }
                Ok(Dynamic::Map(hashmap))
            }
        }

        deserializer.deserialize_any(DynamicVisitor)
    }
}

/// DynamicValue wraps Dynamic and provides typed access by attribute path
/// This is what gets passed between Terraform and the provider
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self {
            value: Dynamic::Null,
        }
    }

    pub fn unknown() -> Self {
        Self {
            value: Dynamic::Unknown,
        }
    }

    /// An empty object, the usual starting point for building state
    pub fn object() -> Self {
        Self {
            value: Dynamic::Map(HashMap::new()),
        }
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.value)?)
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        let value = serde_json::from_slice(data)?;
        Ok(Self { value })
    }

    /// Raw lookup; absent attributes and out-of-range indexes yield None
    pub fn get(&self, path: &AttributePath) -> Option<&Dynamic> {
        let mut current = &self.value;

        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => m.get(name)?,
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    l.get(usize::try_from(*idx).ok()?)?
                }
                _ => return None,
            };
        }

        Some(current)
    }

    /// Type-safe accessors - ALWAYS use these instead of pattern matching
    /// These fail loudly on absent values and on type mismatches
    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        self.require(path, "string", |v| v.as_str().map(str::to_string))
    }

    pub fn get_int(&self, path: &AttributePath) -> Result<i64> {
        self.require(path, "int", Dynamic::as_i64)
    }

    pub fn get_float(&self, path: &AttributePath) -> Result<f64> {
        self.require(path, "float", Dynamic::as_f64)
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        self.require(path, "bool", Dynamic::as_bool)
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        self.require(path, "list", |v| v.as_list().map(<[Dynamic]>::to_vec))
    }

    pub fn get_map(&self, path: &AttributePath) -> Result<HashMap<String, Dynamic>> {
        self.require(path, "map", |v| v.as_map().cloned())
    }

    /// Optional accessors: absent, null and unknown values read as None,
    /// a present value of the wrong type is still an error
    pub fn get_opt_string(&self, path: &AttributePath) -> Result<Option<String>> {
        self.optional(path, "string", |v| v.as_str().map(str::to_string))
    }

    pub fn get_opt_int(&self, path: &AttributePath) -> Result<Option<i64>> {
        self.optional(path, "int", Dynamic::as_i64)
    }

    pub fn get_opt_float(&self, path: &AttributePath) -> Result<Option<f64>> {
        self.optional(path, "float", Dynamic::as_f64)
    }

    pub fn get_opt_bool(&self, path: &AttributePath) -> Result<Option<bool>> {
        self.optional(path, "bool", Dynamic::as_bool)
    }

    pub fn get_opt_list(&self, path: &AttributePath) -> Result<Option<Vec<Dynamic>>> {
        self.optional(path, "list", |v| v.as_list().map(<[Dynamic]>::to_vec))
    }

    pub fn get_opt_map(&self, path: &AttributePath) -> Result<Option<HashMap<String, Dynamic>>> {
        self.optional(path, "map", |v| v.as_map().cloned())
    }

    /// Type-safe setters - Use for building state/config objects
    pub fn set_string(&mut self, path: &AttributePath, value: String) -> Result<()> {
        self.set_value(path, Dynamic::String(value))
    }

    pub fn set_int(&mut self, path: &AttributePath, value: i64) -> Result<()> {
        self.set_value(path, Dynamic::Int(value))
    }

    pub fn set_float(&mut self, path: &AttributePath, value: f64) -> Result<()> {
        self.set_value(path, Dynamic::Float(value))
    }

    pub fn set_bool(&mut self, path: &AttributePath, value: bool) -> Result<()> {
        self.set_value(path, Dynamic::Bool(value))
    }

    pub fn set_list(&mut self, path: &AttributePath, value: Vec<Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::List(value))
    }

    pub fn set_map(&mut self, path: &AttributePath, value: HashMap<String, Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::Map(value))
    }

    pub fn set_null(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Null)
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_unknown()
    }

    /// Mark computed values as unknown during planning
    pub fn mark_unknown(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Unknown)
    }

    fn require<T>(
        &self,
        path: &AttributePath,
        expected: &str,
        extract: impl Fn(&Dynamic) -> Option<T>,
    ) -> Result<T> {
        let value = self
            .get(path)
            .ok_or_else(|| TfplugError::AttributeNotFound(path.to_string()))?;
        extract(value).ok_or_else(|| TfplugError::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            actual: value.type_name().to_string(),
        })
    }

    fn optional<T>(
        &self,
        path: &AttributePath,
        expected: &str,
        extract: impl Fn(&Dynamic) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(_) => self.require(path, expected, extract).map(Some),
        }
    }

    fn set_value(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        let Some((last, parents)) = path.steps.split_last() else {
            self.value = new_value;
            return Ok(());
        };

        // For non-empty paths, ensure we have a map at the root
        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        for (idx, step) in parents.iter().enumerate() {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                    let next = &path.steps[idx + 1];
                    let slot = m.entry(name.clone()).or_insert(Dynamic::Null);
                    if slot.is_null() || slot.is_unknown() {
                        *slot = match next {
                            AttributePathStep::ElementKeyInt(_) => Dynamic::List(Vec::new()),
                            _ => Dynamic::Map(HashMap::new()),
                        };
                    }
                    slot
                }
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(i)) => {
                    let len = l.len();
                    usize::try_from(*i)
                        .ok()
                        .and_then(|i| l.get_mut(i))
                        .ok_or_else(|| TfplugError::InvalidPath {
                            path: path.to_string(),
                            reason: format!("index {} past the end of a {}-element list", i, len),
                        })?
                }
                (other, _) => {
                    return Err(TfplugError::InvalidPath {
                        path: path.to_string(),
                        reason: format!("cannot step into {}", other.type_name()),
                    })
                }
            };
        }

        match (current, last) {
            (Dynamic::Map(m), AttributePathStep::AttributeName(name))
            | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                m.insert(name.clone(), new_value);
                Ok(())
            }
            (Dynamic::List(l), AttributePathStep::ElementKeyInt(i)) => {
                let len = l.len();
                match usize::try_from(*i) {
                    Ok(i) if i < len => {
                        l[i] = new_value;
                        Ok(())
                    }
                    Ok(i) if i == len => {
                        l.push(new_value);
                        Ok(())
                    }
                    _ => Err(TfplugError::InvalidPath {
                        path: path.to_string(),
                        reason: format!("index {} past the end of a {}-element list", i, len),
                    }),
                }
            }
            (other, _) => Err(TfplugError::InvalidPath {
                path: path.to_string(),
                reason: format!("cannot step into {}", other.type_name()),
            }),
        }
    }
}

/// AttributePath represents a path to an attribute within a DynamicValue
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps
            .push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                AttributePathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                AttributePathStep::AttributeName(name) => write!(f, ".{}", name)?,
                AttributePathStep::ElementKeyString(key) => write!(f, "[\"{}\"]", key)?,
                AttributePathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Individual step in an AttributePath
#[derive(Debug, Clone, PartialEq)]
pub enum AttributePathStep {
    /// Access attribute by name in object/map
    AttributeName(String),
    /// Access element by string key (for maps)
    ElementKeyString(String),
    /// Access element by integer index (for lists)
    ElementKeyInt(i64),
}

/// Diagnostic represents a warning or error from the provider
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Config represents configuration values
pub type Config = DynamicValue;

/// State represents resource state values
pub type State = DynamicValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_value_string_access() {
        let mut dv = DynamicValue::object();
        dv.set_string(&AttributePath::new("name"), "test".to_string())
            .unwrap();

        let result = dv.get_string(&AttributePath::new("name")).unwrap();
        assert_eq!(result, "test");
    }

    #[test]
    fn dynamic_value_nested_access() {
        let mut dv = DynamicValue::object();
        let path = AttributePath::new("config").attribute("endpoint");
        dv.set_string(&path, "https://example.com".to_string())
            .unwrap();

        let result = dv.get_string(&path).unwrap();
        assert_eq!(result, "https://example.com");
    }

    #[test]
    fn typed_getter_reports_mismatch_instead_of_casting() {
        let mut dv = DynamicValue::object();
        dv.set_string(&AttributePath::new("template_id"), "1000".to_string())
            .unwrap();

        match dv.get_int(&AttributePath::new("template_id")) {
            Err(TfplugError::TypeMismatch {
                path,
                expected,
                actual,
            }) => {
                assert_eq!(path, "template_id");
                assert_eq!(expected, "int");
                assert_eq!(actual, "string");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn optional_getter_treats_null_and_absent_alike() {
        let mut dv = DynamicValue::object();
        dv.set_null(&AttributePath::new("description")).unwrap();

        assert_eq!(
            dv.get_opt_string(&AttributePath::new("description"))
                .unwrap(),
            None
        );
        assert_eq!(
            dv.get_opt_string(&AttributePath::new("missing")).unwrap(),
            None
        );
        assert!(dv.get_string(&AttributePath::new("missing")).is_err());
    }

    #[test]
    fn integral_float_reads_as_int() {
        let dv = DynamicValue::new(Dynamic::Map(HashMap::from([(
            "width".to_string(),
            Dynamic::Float(1920.0),
        )])));
        assert_eq!(dv.get_int(&AttributePath::new("width")).unwrap(), 1920);
    }

    #[test]
    fn set_through_list_index_appends_at_end() {
        let mut dv = DynamicValue::object();
        let path = AttributePath::new("output_info")
            .index(0)
            .attribute("output_app");
        dv.set_string(&path, "live".to_string()).unwrap();

        assert_eq!(dv.get_string(&path).unwrap(), "live");
        assert_eq!(
            dv.get_list(&AttributePath::new("output_info"))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn json_decoding_keeps_integers_integral() {
        let dv = DynamicValue::decode_json(br#"{"count": 3, "ratio": 0.5, "gone": null}"#).unwrap();

        assert_eq!(dv.get(&AttributePath::new("count")), Some(&Dynamic::Int(3)));
        assert_eq!(
            dv.get(&AttributePath::new("ratio")),
            Some(&Dynamic::Float(0.5))
        );
        assert_eq!(dv.get(&AttributePath::new("gone")), Some(&Dynamic::Null));
    }

    #[test]
    fn resolve_unknowns_reaches_nested_values() {
        let mut value = Dynamic::Map(HashMap::from([
            ("id".to_string(), Dynamic::Unknown),
            (
                "items".to_string(),
                Dynamic::List(vec![Dynamic::Unknown, Dynamic::Int(1)]),
            ),
        ]));
        value.resolve_unknowns();

        let map = value.as_map().unwrap();
        assert_eq!(map["id"], Dynamic::Null);
        assert_eq!(map["items"], Dynamic::List(vec![Dynamic::Null, Dynamic::Int(1)]));
    }

    #[test]
    fn attribute_path_display() {
        let path = AttributePath::new("input_list")
            .index(2)
            .attribute("input_domain");
        assert_eq!(path.to_string(), "input_list[2].input_domain");
    }
}
