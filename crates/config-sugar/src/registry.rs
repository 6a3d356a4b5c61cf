//! Type registry: categories, aliases and lazily computed class descriptors.
//!
//! Types are registered explicitly through [`CodecRegistryBuilder`]. `build()`
//! checks every cross reference up front, so descriptor computation itself
//! cannot fail and can run inside the memoizing cache.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use config_types::{ConfigObject, ConfigValue};
use indexmap::IndexMap;
use tracing::debug;

use crate::cache::DescriptorCache;
use crate::descriptor::{ClassDescriptor, ClassKind, ElementType, FieldDescriptor, TypeName};
use crate::error::{SugarError, SugarResult};
use crate::plugin::{AliasTarget, PluginMap};

/// Source of type metadata consumed by the expander
pub trait TypeRegistry: Send + Sync {
    /// Merged descriptor for a registered type
    fn class_descriptor(&self, ty: &TypeName) -> SugarResult<Arc<ClassDescriptor>>;

    /// Plugin map of a registered category
    fn plugin_map(&self, category: &str) -> Option<Arc<PluginMap>>;
}

/// Registration record for one type
#[derive(Debug, Clone)]
pub struct TypeDef {
    name: TypeName,
    kind: ClassKind,
    extends: Option<TypeName>,
    category: Option<String>,
    value_codable: bool,
    fields: Vec<FieldDescriptor>,
    field_defaults: ConfigObject,
}

impl TypeDef {
    pub fn new(name: impl Into<TypeName>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            extends: None,
            category: None,
            value_codable: false,
            fields: Vec::new(),
            field_defaults: ConfigObject::new(),
        }
    }

    pub fn concrete(name: impl Into<TypeName>) -> Self {
        Self::new(name, ClassKind::Concrete)
    }

    pub fn abstract_type(name: impl Into<TypeName>) -> Self {
        Self::new(name, ClassKind::Abstract)
    }

    pub fn interface(name: impl Into<TypeName>) -> Self {
        Self::new(name, ClassKind::Interface)
    }

    /// Inherit fields, defaults and category from `parent`
    pub fn extends(mut self, parent: impl Into<TypeName>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Instances can be built directly from a scalar
    pub fn value_codable(mut self) -> Self {
        self.value_codable = true;
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_field_default(mut self, field: impl Into<String>, value: ConfigValue) -> Self {
        self.field_defaults = self.field_defaults.with_value(field, value);
        self
    }

    pub fn with_field_defaults(mut self, defaults: ConfigObject) -> Self {
        self.field_defaults = defaults.with_fallback(&self.field_defaults);
        self
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }
}

/// Collects categories and types, then validates them into a [`CodecRegistry`]
#[derive(Debug, Default)]
pub struct CodecRegistryBuilder {
    categories: IndexMap<String, PluginMap>,
    types: IndexMap<TypeName, TypeDef>,
}

impl CodecRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, plugin_map: PluginMap) -> Self {
        self.add_category(plugin_map);
        self
    }

    pub fn with_type(mut self, def: TypeDef) -> Self {
        self.add_type(def);
        self
    }

    /// Register a category; a later registration under the same name replaces it
    pub fn add_category(&mut self, plugin_map: PluginMap) {
        self.categories
            .insert(plugin_map.category().to_string(), plugin_map);
    }

    /// Register a type; a later registration under the same name replaces it
    pub fn add_type(&mut self, def: TypeDef) {
        self.types.insert(def.name.clone(), def);
    }

    pub fn build(self) -> SugarResult<CodecRegistry> {
        self.validate()?;
        debug!(
            categories = self.categories.len(),
            types = self.types.len(),
            "built codec registry"
        );
        Ok(CodecRegistry {
            categories: self
                .categories
                .into_iter()
                .map(|(name, map)| (name, Arc::new(map)))
                .collect(),
            types: self.types.into_iter().collect(),
            descriptors: DescriptorCache::new(),
            uncategorized: Arc::new(PluginMap::empty()),
        })
    }

    fn validate(&self) -> SugarResult<()> {
        for (name, plugins) in &self.categories {
            self.validate_category(name, plugins)?;
        }
        for def in self.types.values() {
            self.validate_type(def)?;
        }
        Ok(())
    }

    fn require_type(&self, ty: &TypeName, context: impl FnOnce() -> String) -> SugarResult<()> {
        if self.types.contains_key(ty) {
            Ok(())
        } else {
            Err(SugarError::registry(format!(
                "{} references unknown type '{}'",
                context(),
                ty
            )))
        }
    }

    fn validate_category(&self, name: &str, plugins: &PluginMap) -> SugarResult<()> {
        if let Some(base) = plugins.base_type() {
            self.require_type(base, || format!("category '{}' base type", name))?;
        }
        for (alias_name, alias) in plugins.aliases() {
            match alias.target() {
                AliasTarget::Type(ty) => {
                    self.require_type(ty, || format!("alias '{}.{}'", name, alias_name))?;
                }
                AliasTarget::Redirect(_) => {
                    if plugins.last_alias(alias_name).is_none() {
                        return Err(SugarError::registry(format!(
                            "alias '{}.{}' redirects to an unknown alias or forms a cycle",
                            name, alias_name
                        )));
                    }
                }
            }
            if alias.is_inline() && plugins.primary_field(alias_name).is_none() {
                return Err(SugarError::registry(format!(
                    "inlined alias '{}.{}' must declare a primary field",
                    name, alias_name
                )));
            }
        }
        let sugar_aliases = [
            ("array", plugins.declared_array_alias()),
            ("default", plugins.declared_default_alias()),
        ];
        for (setting, alias) in sugar_aliases {
            if let Some(alias) = alias {
                if !plugins.is_alias(alias) {
                    return Err(SugarError::registry(format!(
                        "category '{}' {} alias '{}' is not a registered alias",
                        name, setting, alias
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_type(&self, def: &TypeDef) -> SugarResult<()> {
        if let Some(category) = &def.category {
            if !self.categories.contains_key(category) {
                return Err(SugarError::registry(format!(
                    "type '{}' belongs to unknown category '{}'",
                    def.name, category
                )));
            }
        }
        for field in &def.fields {
            if let ElementType::Type(ty) = field.element() {
                self.require_type(ty, || format!("field '{}.{}'", def.name, field.name()))?;
            }
        }

        let mut seen = HashSet::new();
        seen.insert(&def.name);
        let mut current = def;
        while let Some(parent) = &current.extends {
            self.require_type(parent, || format!("type '{}' parent", current.name))?;
            if !seen.insert(parent) {
                return Err(SugarError::registry(format!(
                    "type '{}' has a cyclic inheritance chain",
                    def.name
                )));
            }
            current = &self.types[parent];
        }
        Ok(())
    }
}

/// In-memory registry with a lazily filled, sharded descriptor cache
#[derive(Debug)]
pub struct CodecRegistry {
    categories: HashMap<String, Arc<PluginMap>>,
    types: HashMap<TypeName, TypeDef>,
    descriptors: DescriptorCache<TypeName, ClassDescriptor>,
    uncategorized: Arc<PluginMap>,
}

impl CodecRegistry {
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::new()
    }

    pub fn has_type(&self, ty: &TypeName) -> bool {
        self.types.contains_key(ty)
    }

    /// Number of descriptors computed so far
    pub fn descriptors_computed(&self) -> usize {
        self.descriptors.computed()
    }

    fn compute_descriptor(
        &self,
        def: &TypeDef,
        parent: Option<&Arc<ClassDescriptor>>,
    ) -> ClassDescriptor {
        // Redeclared fields keep the inherited position
        let mut fields: IndexMap<String, FieldDescriptor> = IndexMap::new();
        let mut field_defaults = def.field_defaults.clone();
        let mut plugin_map = None;
        if let Some(parent) = parent {
            for field in parent.fields() {
                fields.insert(field.name().to_string(), field.clone());
            }
            field_defaults = field_defaults.with_fallback(parent.field_defaults());
            plugin_map = Some(Arc::clone(parent.plugin_map()));
        }
        for field in &def.fields {
            fields.insert(field.name().to_string(), field.clone());
        }
        if let Some(category) = &def.category {
            plugin_map = self.categories.get(category).cloned();
        }

        debug!(ty = %def.name, fields = fields.len(), "computed class descriptor");
        ClassDescriptor::new(
            def.name.clone(),
            def.kind,
            def.value_codable,
            fields.into_values().collect(),
            field_defaults,
            plugin_map.unwrap_or_else(|| Arc::clone(&self.uncategorized)),
        )
    }
}

impl TypeRegistry for CodecRegistry {
    fn class_descriptor(&self, ty: &TypeName) -> SugarResult<Arc<ClassDescriptor>> {
        if let Some(descriptor) = self.descriptors.get(ty) {
            return Ok(descriptor);
        }
        let def = self
            .types
            .get(ty)
            .ok_or_else(|| SugarError::unknown_type(ty.as_str()))?;
        // Parent first, outside this type's cell
        let parent = def
            .extends
            .as_ref()
            .map(|p| self.class_descriptor(p))
            .transpose()?;
        Ok(self
            .descriptors
            .get_or_init(ty, || self.compute_descriptor(def, parent.as_ref())))
    }

    fn plugin_map(&self, category: &str) -> Option<Arc<PluginMap>> {
        self.categories.get(category).cloned()
    }
}
