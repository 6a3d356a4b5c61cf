//! Static type metadata: class and field descriptors.
//!
//! Descriptors are produced by a [`TypeRegistry`](crate::TypeRegistry) from
//! explicit registrations; nothing here is discovered at runtime.

use config_types::ConfigObject;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::plugin::PluginMap;

/// Name of a registered type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Whether a type can be instantiated as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Concrete,
    Abstract,
    Interface,
}

/// Declared element type of a field (the value type for maps, the element
/// type for arrays and collections).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    String,
    Boolean,
    Number,
    Enum(String),
    /// Anything a string is assignable to; kept as an opaque leaf
    Any,
    /// A registered type that is expanded structurally
    Type(TypeName),
}

impl ElementType {
    pub fn of_type(name: impl Into<TypeName>) -> Self {
        Self::Type(name.into())
    }

    /// Leaves are never recursed into
    pub fn is_leaf(&self) -> bool {
        !matches!(self, ElementType::Type(_))
    }

    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            ElementType::Type(name) => Some(name),
            _ => None,
        }
    }

    /// Parse a declared element type.
    ///
    /// `string`, `boolean`, `number`, `any` and `enum:<Name>` are leaf kinds;
    /// anything else names a registered type.
    pub fn parse(spec: &str) -> Self {
        match spec {
            "string" => ElementType::String,
            "boolean" | "bool" => ElementType::Boolean,
            "number" | "int" | "long" | "float" | "double" => ElementType::Number,
            "any" => ElementType::Any,
            other => match other.strip_prefix("enum:") {
                Some(name) => ElementType::Enum(name.to_string()),
                None => ElementType::Type(TypeName::new(other)),
            },
        }
    }
}

/// Structural shape of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldShape {
    #[default]
    Single,
    Array,
    Collection,
    /// Collection whose elements are themselves arrays
    CollectionOfArrays,
    Map,
    /// Map whose values are arrays
    MapOfArrays,
}

impl FieldShape {
    pub fn is_array(&self) -> bool {
        matches!(self, FieldShape::Array)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, FieldShape::Collection | FieldShape::CollectionOfArrays)
    }

    /// Array or collection: the value must be a list
    pub fn is_list_shaped(&self) -> bool {
        self.is_array() || self.is_collection()
    }

    pub fn is_nested_array(&self) -> bool {
        matches!(self, FieldShape::CollectionOfArrays)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, FieldShape::Map | FieldShape::MapOfArrays)
    }

    pub fn is_map_of_arrays(&self) -> bool {
        matches!(self, FieldShape::MapOfArrays)
    }
}

/// One declared field of a type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    element: ElementType,
    shape: FieldShape,
    auto_array: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, element: ElementType) -> Self {
        Self {
            name: name.into(),
            element,
            shape: FieldShape::Single,
            auto_array: false,
        }
    }

    pub fn with_shape(mut self, shape: FieldShape) -> Self {
        self.shape = shape;
        self
    }

    /// Promote bare scalars to one-element lists for list-shaped fields
    pub fn with_auto_array(mut self, enabled: bool) -> Self {
        self.auto_array = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> &ElementType {
        &self.element
    }

    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    pub fn auto_array(&self) -> bool {
        self.auto_array
    }
}

/// Fully merged metadata for one type (inherited fields included)
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    name: Option<TypeName>,
    kind: ClassKind,
    value_codable: bool,
    fields: Vec<FieldDescriptor>,
    field_defaults: ConfigObject,
    plugin_map: Arc<PluginMap>,
}

impl ClassDescriptor {
    pub fn new(
        name: TypeName,
        kind: ClassKind,
        value_codable: bool,
        fields: Vec<FieldDescriptor>,
        field_defaults: ConfigObject,
        plugin_map: Arc<PluginMap>,
    ) -> Self {
        Self {
            name: Some(name),
            kind,
            value_codable,
            fields,
            field_defaults,
            plugin_map,
        }
    }

    /// Stand-in for "no type known yet" under a category without a base type
    pub fn undetermined(plugin_map: Arc<PluginMap>) -> Self {
        Self {
            name: None,
            kind: ClassKind::Abstract,
            value_codable: false,
            fields: Vec::new(),
            field_defaults: ConfigObject::new(),
            plugin_map,
        }
    }

    pub fn name(&self) -> Option<&TypeName> {
        self.name.as_ref()
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// No type, or an abstract/interface type: the node must say what it is
    pub fn needs_disambiguation(&self) -> bool {
        self.name.is_none() || self.kind != ClassKind::Concrete
    }

    /// Concrete type that can be built straight from a scalar
    pub fn is_value_codable(&self) -> bool {
        self.value_codable && !self.needs_disambiguation()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_defaults(&self) -> &ConfigObject {
        &self.field_defaults
    }

    pub fn plugin_map(&self) -> &Arc<PluginMap> {
        &self.plugin_map
    }
}

impl std::fmt::Display for ClassDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "<undetermined {}>", self.plugin_map),
        }
    }
}
