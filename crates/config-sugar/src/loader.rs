//! Registry loader
//!
//! Reads a YAML registry definition (categories, aliases, types and expander
//! options) and builds a [`CodecRegistry`] from it.
//!
//! ```yaml
//! options:
//!   strict_aliases: true
//! categories:
//!   filter:
//!     base: Filter
//!     array: chain
//!     aliases:
//!       chain: { type: Chain, primary: filters }
//!       field: { type: FieldFilter, primary: name, inline: true }
//! types:
//!   Filter: { kind: abstract, category: filter }
//!   Chain:
//!     extends: Filter
//!     fields:
//!       - { name: filters, type: Filter, shape: array, auto_array: true }
//! ```

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use config_types::ConfigObject;

use crate::descriptor::{ClassKind, ElementType, FieldDescriptor, FieldShape, TypeName};
use crate::error::{SugarError, SugarResult};
use crate::options::ExpandOptions;
use crate::plugin::{Alias, PluginMap, DEFAULT_CLASS_FIELD};
use crate::registry::{CodecRegistry, TypeDef};
use crate::source;

/// Top-level registry definition document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryDefinition {
    pub options: ExpandOptions,
    pub categories: IndexMap<String, CategoryDefinition>,
    pub types: IndexMap<String, TypeDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryDefinition {
    #[serde(default = "default_class_field")]
    pub class_field: String,
    #[serde(default)]
    pub base: Option<TypeName>,
    #[serde(default)]
    pub array: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub aliases: IndexMap<String, AliasDefinition>,
}

fn default_class_field() -> String {
    DEFAULT_CLASS_FIELD.to_string()
}

/// An alias names either a type or another alias
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AliasDefinition {
    #[serde(rename = "type")]
    pub ty: Option<TypeName>,
    pub redirect: Option<String>,
    pub primary: Option<String>,
    pub inline: bool,
    pub defaults: Option<serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeDefinition {
    pub kind: ClassKind,
    pub extends: Option<TypeName>,
    pub category: Option<String>,
    pub value_codable: bool,
    pub fields: Vec<FieldDefinition>,
    pub defaults: Option<serde_yaml::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub name: String,
    /// `string`, `boolean`, `number`, `any`, `enum:<Name>` or a type name
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub shape: FieldShape,
    #[serde(default)]
    pub auto_array: bool,
}

/// A built registry together with the options its definition declared
#[derive(Debug)]
pub struct LoadedRegistry {
    pub registry: CodecRegistry,
    pub options: ExpandOptions,
}

impl RegistryDefinition {
    pub fn from_yaml_str(text: &str) -> SugarResult<Self> {
        serde_yaml::from_str(text).map_err(|e| SugarError::registry(e.to_string()))
    }

    /// Build and validate the registry
    pub fn build(&self) -> SugarResult<CodecRegistry> {
        let mut builder = CodecRegistry::builder();
        for (name, category) in &self.categories {
            builder.add_category(category.plugin_map(name)?);
        }
        for (name, def) in &self.types {
            builder.add_type(def.type_def(name)?);
        }
        builder.build()
    }
}

impl CategoryDefinition {
    fn plugin_map(&self, name: &str) -> SugarResult<PluginMap> {
        let mut map = PluginMap::new(name).with_class_field(self.class_field.as_str());
        if let Some(base) = &self.base {
            map = map.with_base_type(base.clone());
        }
        if let Some(array) = &self.array {
            map = map.with_array_alias(array.as_str());
        }
        if let Some(default) = &self.default {
            map = map.with_default_alias(default.as_str());
        }
        for (alias_name, alias) in &self.aliases {
            let label = format!("category {} alias {}", name, alias_name);
            map = map.with_alias(alias_name.as_str(), alias.alias(&label)?);
        }
        Ok(map)
    }
}

impl AliasDefinition {
    fn alias(&self, label: &str) -> SugarResult<Alias> {
        let mut alias = match (&self.ty, &self.redirect) {
            (Some(ty), None) => Alias::to_type(ty.clone()),
            (None, Some(target)) => Alias::redirect(target.as_str()),
            _ => {
                return Err(SugarError::registry(format!(
                    "{} must set exactly one of 'type' and 'redirect'",
                    label
                )))
            }
        };
        if let Some(primary) = &self.primary {
            alias = alias.with_primary(primary.as_str());
        }
        if let Some(defaults) = &self.defaults {
            alias = alias.with_defaults(defaults_object(label, defaults)?);
        }
        if self.inline {
            alias = alias.inlined();
        }
        Ok(alias)
    }
}

impl TypeDefinition {
    fn type_def(&self, name: &str) -> SugarResult<TypeDef> {
        let mut def = TypeDef::new(name, self.kind);
        if let Some(parent) = &self.extends {
            def = def.extends(parent.clone());
        }
        if let Some(category) = &self.category {
            def = def.in_category(category.as_str());
        }
        if self.value_codable {
            def = def.value_codable();
        }
        for field in &self.fields {
            let descriptor = FieldDescriptor::new(field.name.as_str(), ElementType::parse(&field.ty))
                .with_shape(field.shape)
                .with_auto_array(field.auto_array);
            def = def.with_field(descriptor);
        }
        if let Some(defaults) = &self.defaults {
            def = def.with_field_defaults(defaults_object(&format!("{} defaults", name), defaults)?);
        }
        Ok(def)
    }
}

fn defaults_object(label: &str, value: &serde_yaml::Value) -> SugarResult<ConfigObject> {
    let tree = source::from_yaml_value(label, value)?;
    tree.as_object()
        .cloned()
        .ok_or_else(|| SugarError::registry(format!("{}: defaults must be a mapping", label)))
}

/// Load a registry definition file
pub fn load_registry(path: impl AsRef<Path>) -> Result<LoadedRegistry> {
    let path = path.as_ref();
    info!("Loading registry definition from {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let definition = RegistryDefinition::from_yaml_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let registry = definition
        .build()
        .with_context(|| format!("Invalid registry definition in {}", path.display()))?;

    info!(
        "Loaded {} categories with {} types",
        definition.categories.len(),
        definition.types.len()
    );

    Ok(LoadedRegistry {
        registry,
        options: definition.options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::registry::TypeRegistry;
    use std::io::Write;

    const DEFINITION: &str = r#"
options:
  max_depth: 32
categories:
  filter:
    base: Filter
    array: all
    default: identity
    aliases:
      chain:
        type: Chain
        primary: filters
        defaults: { failFast: true }
      all: { redirect: chain }
      field: { type: FieldFilter, primary: name, inline: true }
      identity: { type: Identity }
types:
  Filter: { kind: abstract, category: filter }
  Chain:
    extends: Filter
    fields:
      - { name: filters, type: Filter, shape: array, auto_array: true }
      - { name: failFast, type: boolean }
  FieldFilter:
    extends: Filter
    fields:
      - { name: name, type: string }
      - { name: mode, type: "enum:Mode" }
    defaults: { mode: exact }
  Identity: { extends: Filter }
"#;

    #[test]
    fn test_definition_builds() {
        let definition = RegistryDefinition::from_yaml_str(DEFINITION).unwrap();
        assert_eq!(definition.options.max_depth, 32);
        assert!(!definition.options.strict_aliases);

        let registry = definition.build().unwrap();
        let plugins = registry.plugin_map("filter").unwrap();
        assert_eq!(plugins.array_alias(), Some("chain"));
        assert_eq!(plugins.inlined_aliases().collect::<Vec<_>>(), vec!["field"]);

        let field = registry
            .class_descriptor(&TypeName::new("FieldFilter"))
            .unwrap();
        assert_eq!(field.fields().len(), 2);
        assert_eq!(
            field.field("mode").unwrap().element(),
            &ElementType::Enum("Mode".to_string())
        );
        assert!(field.field_defaults().contains_key("mode"));
    }

    #[test]
    fn test_alias_needs_exactly_one_target() {
        let text = "categories:\n  c:\n    aliases:\n      x: { primary: a }\n";
        let err = RegistryDefinition::from_yaml_str(text)
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);
        assert!(err.to_string().contains("exactly one of 'type' and 'redirect'"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = RegistryDefinition::from_yaml_str("categoriez: {}\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);
    }

    #[test]
    fn test_load_registry_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DEFINITION.as_bytes()).unwrap();

        let loaded = load_registry(file.path()).unwrap();
        assert_eq!(loaded.options.max_depth, 32);
        assert!(loaded.registry.has_type(&TypeName::new("Chain")));
    }

    #[test]
    fn test_load_registry_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_registry(dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
