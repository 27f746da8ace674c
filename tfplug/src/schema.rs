//! Schema types and builders for tfplug
//!
//! This module provides the schema system for defining resource and data source
//! schemas, including attribute types, nested blocks, defaults and validation.

use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use crate::validator::Validator;
use std::collections::HashMap;
use std::sync::Arc;

/// AttributeType defines the type system for Terraform attributes
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Int,
    Float,
    Bool,
    List(Box<AttributeType>),               // Ordered, allows duplicates
    Set(Box<AttributeType>),                // Unordered, no duplicates
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

impl AttributeType {
    /// Whether a value conforms to this type; null and unknown conform to every type
    pub fn accepts(&self, value: &Dynamic) -> bool {
        match (self, value) {
            (_, Dynamic::Null) | (_, Dynamic::Unknown) => true,
            (AttributeType::String, Dynamic::String(_)) => true,
            (AttributeType::Bool, Dynamic::Bool(_)) => true,
            (AttributeType::Int, v) => v.as_i64().is_some(),
            (AttributeType::Float, v) => v.as_f64().is_some(),
            (AttributeType::List(inner), Dynamic::List(items))
            | (AttributeType::Set(inner), Dynamic::List(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            (AttributeType::Map(inner), Dynamic::Map(entries)) => {
                entries.values().all(|item| inner.accepts(item))
            }
            (AttributeType::Object(fields), Dynamic::Map(entries)) => entries
                .iter()
                .all(|(k, v)| fields.get(k).is_some_and(|t| t.accepts(v))),
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Int => "int",
            AttributeType::Float => "float",
            AttributeType::Bool => "bool",
            AttributeType::List(_) => "list",
            AttributeType::Set(_) => "set",
            AttributeType::Map(_) => "map",
            AttributeType::Object(_) => "object",
        }
    }
}

/// Schema is returned by providers/resources/data sources
/// Version is used for state migration
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64, // Increment when schema changes require migration
    pub block: Block, // Root block containing all attributes
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attribute(name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block.nested_block(name)
    }

    /// Names of top-level attributes and blocks fixed at creation
    pub fn immutable_attributes(&self) -> Vec<&str> {
        self.block
            .attributes
            .iter()
            .filter(|a| a.immutable)
            .map(|a| a.name.as_str())
            .chain(
                self.block
                    .block_types
                    .iter()
                    .filter(|b| b.immutable)
                    .map(|b| b.type_name.as_str()),
            )
            .collect()
    }

    /// Names of top-level attributes and blocks a user may set
    pub fn configurable_attributes(&self) -> Vec<&str> {
        self.block
            .attributes
            .iter()
            .filter(|a| a.required || a.optional)
            .map(|a| a.name.as_str())
            .chain(self.block.block_types.iter().map(|b| b.type_name.as_str()))
            .collect()
    }

    /// Fills absent or null attributes that declare a default
    pub fn apply_defaults(&self, value: &mut DynamicValue) {
        if let Dynamic::Map(map) = &mut value.value {
            self.block.apply_defaults(map);
        }
    }

    pub fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        match &config.value {
            Dynamic::Map(map) => self
                .block
                .validate(map, &AttributePath::root(), &mut diagnostics),
            Dynamic::Null | Dynamic::Unknown => {}
            other => diagnostics.push(Diagnostic::error(
                "Invalid configuration",
                format!("expected an object, got {}", other.type_name()),
            )),
        }
        diagnostics
    }
}

/// Block represents a configuration block
#[derive(Debug, Clone)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
    pub deprecated: bool,
}

impl Block {
    fn empty() -> Self {
        Self {
            version: 0,
            attributes: Vec::new(),
            block_types: Vec::new(),
            description: String::new(),
            deprecated: false,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block_types.iter().find(|b| b.type_name == name)
    }

    fn apply_defaults(&self, map: &mut HashMap<String, Dynamic>) {
        for attr in &self.attributes {
            if let Some(default) = &attr.default {
                let slot = map.entry(attr.name.clone()).or_insert(Dynamic::Null);
                if slot.is_null() {
                    *slot = default.clone();
                }
            }
        }

        for nested in &self.block_types {
            if let Some(Dynamic::List(items)) = map.get_mut(&nested.type_name) {
                for item in items.iter_mut() {
                    if let Dynamic::Map(inner) = item {
                        nested.block.apply_defaults(inner);
                    }
                }
            }
        }
    }

    fn validate(
        &self,
        map: &HashMap<String, Dynamic>,
        base: &AttributePath,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        for attr in &self.attributes {
            let path = base.clone().attribute(&attr.name);
            let value = map.get(&attr.name).unwrap_or(&Dynamic::Null);

            if attr.required && value.is_null() {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required attribute",
                        format!("The attribute \"{}\" is required", path),
                    )
                    .with_attribute(path),
                );
                continue;
            }

            if attr.computed && !attr.optional && !attr.required && !value.is_null() {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid configuration",
                        format!("The attribute \"{}\" is computed and cannot be set", path),
                    )
                    .with_attribute(path),
                );
                continue;
            }

            if !attr.r#type.accepts(value) {
                diagnostics.push(
                    Diagnostic::error(
                        "Incorrect attribute value type",
                        format!(
                            "The attribute \"{}\" must be a {}, got {}",
                            path,
                            attr.r#type.name(),
                            value.type_name()
                        ),
                    )
                    .with_attribute(path),
                );
                continue;
            }

            if !value.is_null() && !value.is_unknown() {
                for validator in &attr.validators {
                    validator.validate(value, &path, diagnostics);
                }
            }
        }

        for nested in &self.block_types {
            let path = base.clone().attribute(&nested.type_name);
            let items: &[Dynamic] = match map.get(&nested.type_name) {
                None | Some(Dynamic::Null) => &[],
                Some(Dynamic::Unknown) => continue,
                Some(Dynamic::List(items)) => items,
                Some(other) => {
                    diagnostics.push(
                        Diagnostic::error(
                            "Incorrect block type",
                            format!(
                                "The block \"{}\" must be a list, got {}",
                                path,
                                other.type_name()
                            ),
                        )
                        .with_attribute(path),
                    );
                    continue;
                }
            };

            let count = items.len() as i64;
            if count < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(
                        "Insufficient blocks",
                        format!(
                            "At least {} \"{}\" block(s) are required",
                            nested.min_items, path
                        ),
                    )
                    .with_attribute(path.clone()),
                );
            }
            if nested.max_items > 0 && count > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(
                        "Too many blocks",
                        format!(
                            "No more than {} \"{}\" block(s) are allowed",
                            nested.max_items, path
                        ),
                    )
                    .with_attribute(path.clone()),
                );
            }

            for (idx, item) in items.iter().enumerate() {
                if let Dynamic::Map(inner) = item {
                    nested
                        .block
                        .validate(inner, &path.clone().index(idx as i64), diagnostics);
                }
            }
        }
    }
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Fixed at creation; changing it later is rejected instead of planned
    pub immutable: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub default: Option<Dynamic>,
    pub deprecated: bool,
}

// Manual Debug implementation since validators don't implement Debug
impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("description", &self.description)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("immutable", &self.immutable)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .field("default", &self.default)
            .field("deprecated", &self.deprecated)
            .finish()
    }
}

/// NestedBlock represents a nested configuration block
#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: i64,
    pub max_items: i64,
    pub immutable: bool,
}

/// NestingMode defines how nested blocks are structured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NestingMode {
    Single,
    List,
    Set,
}

/// AttributeBuilder provides fluent API for building attributes
/// ALWAYS use this instead of constructing Attribute directly
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    /// Create a new attribute builder
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                immutable: false,
                validators: Vec::new(),
                default: None,
                deprecated: false,
            },
        }
    }

    /// Set description
    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    /// Mark as optional
    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    /// Mark as computed
    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    /// Mark as sensitive (hidden)
    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    /// Mark as fixed after creation
    pub fn immutable(mut self) -> Self {
        self.attribute.immutable = true;
        self
    }

    /// Mark as deprecated
    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    /// Add validator
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    /// Value used when the configuration leaves the attribute unset
    pub fn default_value(mut self, value: impl Into<Dynamic>) -> Self {
        self.attribute.default = Some(value.into());
        self
    }

    /// Finalize the attribute
    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// NestedBlockBuilder provides the same fluent API for nested blocks
pub struct NestedBlockBuilder {
    nested: NestedBlock,
}

impl NestedBlockBuilder {
    /// Create a list-nested block builder
    pub fn new(type_name: &str) -> Self {
        Self {
            nested: NestedBlock {
                type_name: type_name.to_string(),
                block: Block::empty(),
                nesting: NestingMode::List,
                min_items: 0,
                max_items: 0,
                immutable: false,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.nested.block.description = desc.to_string();
        self
    }

    pub fn nesting(mut self, nesting: NestingMode) -> Self {
        self.nested.nesting = nesting;
        self
    }

    pub fn min_items(mut self, min: i64) -> Self {
        self.nested.min_items = min;
        self
    }

    pub fn max_items(mut self, max: i64) -> Self {
        self.nested.max_items = max;
        self
    }

    /// Shorthand for a required block: at least one item
    pub fn required(self) -> Self {
        self.min_items(1)
    }

    pub fn immutable(mut self) -> Self {
        self.nested.immutable = true;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.nested.block.attributes.push(attr);
        self
    }

    pub fn build(self) -> NestedBlock {
        self.nested
    }
}

/// SchemaBuilder provides fluent API for building schemas
/// ALWAYS use this for consistency
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block::empty(),
            },
        }
    }

    /// Set schema version
    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    /// Add attribute
    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    /// Add nested block
    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    /// Set description
    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    /// Mark as deprecated
    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    /// Finalize the schema
    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
