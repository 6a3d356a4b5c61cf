//! Expansion driver: root entry point, typed entry point and field expansion.
//!
//! One [`Expander`] can serve any number of calls, concurrently if the
//! registry allows it. Each call runs in its own [`Pass`], which owns the
//! call's warnings and nothing else; descriptors are the only state shared
//! between calls.

use config_types::{ConfigList, ConfigObject, ConfigValue, Origin, ValueType};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::descriptor::{ClassDescriptor, FieldDescriptor, TypeName};
use crate::error::{SugarError, SugarResult};
use crate::options::ExpandOptions;
use crate::registry::TypeRegistry;
use crate::resolve::resolve_type;

/// A discriminator that named no registered alias.
///
/// Expansion of the node continued with the type known before the
/// discriminator was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasWarning {
    pub alias: String,
    pub category: String,
    pub origin: Origin,
}

impl std::fmt::Display for AliasWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: '{}' is not a registered alias in category '{}'",
            self.origin, self.alias, self.category
        )
    }
}

/// Result of a reported expansion
#[derive(Debug, Clone)]
pub struct Expansion {
    pub value: ConfigValue,
    pub warnings: Vec<AliasWarning>,
}

/// Expands sugared trees against a [`TypeRegistry`]
pub struct Expander<'r> {
    registry: &'r dyn TypeRegistry,
    options: ExpandOptions,
}

impl<'r> Expander<'r> {
    pub fn new(registry: &'r dyn TypeRegistry) -> Self {
        Self {
            registry,
            options: ExpandOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    /// Expand a document of the form `{ <category>: <node> }`.
    ///
    /// Returns the canonical form of `<node>`, typed by the category's base
    /// type (or left undetermined when the category has none).
    pub fn expand_root(&self, root: &ConfigValue) -> SugarResult<ConfigValue> {
        self.expand_root_reported(root).map(|expansion| expansion.value)
    }

    /// Expand `node` as an instance of `ty`
    pub fn expand(&self, ty: &TypeName, node: &ConfigValue) -> SugarResult<ConfigValue> {
        self.expand_reported(ty, node).map(|expansion| expansion.value)
    }

    /// [`expand_root`](Self::expand_root), also returning alias warnings
    pub fn expand_root_reported(&self, root: &ConfigValue) -> SugarResult<Expansion> {
        let (category, node) = root
            .as_object()
            .and_then(ConfigObject::single_entry)
            .ok_or_else(|| {
                SugarError::structure(root.origin(), "config root must have exactly one key")
            })?;
        let plugins = self
            .registry
            .plugin_map(category)
            .ok_or_else(|| SugarError::unknown_category(node.origin(), category))?;

        let descriptor = match plugins.base_type() {
            Some(base) => self.registry.class_descriptor(base)?,
            None => Arc::new(ClassDescriptor::undetermined(Arc::clone(&plugins))),
        };
        debug!(category, base = %descriptor, "expanding config root");
        self.run(&descriptor, node)
    }

    /// [`expand`](Self::expand), also returning alias warnings
    pub fn expand_reported(&self, ty: &TypeName, node: &ConfigValue) -> SugarResult<Expansion> {
        let descriptor = self.registry.class_descriptor(ty)?;
        self.run(&descriptor, node)
    }

    fn run(&self, descriptor: &Arc<ClassDescriptor>, node: &ConfigValue) -> SugarResult<Expansion> {
        let mut pass = Pass {
            registry: self.registry,
            options: &self.options,
            warnings: Vec::new(),
        };
        let value = pass.expand_value(descriptor, node, 1)?;
        Ok(Expansion {
            value,
            warnings: pass.warnings,
        })
    }
}

/// State of one top-level expansion call
pub(crate) struct Pass<'a> {
    pub(crate) registry: &'a dyn TypeRegistry,
    pub(crate) options: &'a ExpandOptions,
    pub(crate) warnings: Vec<AliasWarning>,
}

impl Pass<'_> {
    /// Fail once `depth` passes the configured limit
    pub(crate) fn check_depth(&self, node: &ConfigValue, depth: usize) -> SugarResult<()> {
        if depth > self.options.max_depth {
            return Err(SugarError::depth_exceeded(
                node.origin(),
                self.options.max_depth,
            ));
        }
        Ok(())
    }

    /// Resolve `node` against `ty`, then expand the fields of whatever type
    /// the resolved node names. `depth` is the node's tree level.
    pub(crate) fn expand_value(
        &mut self,
        ty: &Arc<ClassDescriptor>,
        node: &ConfigValue,
        depth: usize,
    ) -> SugarResult<ConfigValue> {
        self.check_depth(node, depth)?;
        let resolved = resolve_type(ty, node, ty.plugin_map())?;
        let Some(root) = resolved.as_object() else {
            return Ok(resolved);
        };
        let target = self.tagged_type(ty, root)?;
        let fields = self.expand_fields(&target, root, depth)?;
        Ok(ConfigValue::object(fields, resolved.origin().clone()))
    }

    /// Type named by the discriminator of a resolved object, or `ty` when the
    /// object carries none.
    fn tagged_type(
        &mut self,
        ty: &Arc<ClassDescriptor>,
        root: &ConfigObject,
    ) -> SugarResult<Arc<ClassDescriptor>> {
        let plugins = ty.plugin_map();
        let Some(tag) = root.get(plugins.class_field()) else {
            return Ok(Arc::clone(ty));
        };
        let Some(alias) = tag.as_str() else {
            return Ok(Arc::clone(ty));
        };
        if let Some(name) = plugins.resolve_alias(alias) {
            return self.registry.class_descriptor(name);
        }
        // uncategorized types have no aliases; a string field that happens
        // to share the discriminator name is just data
        if plugins.category().is_empty() {
            return Ok(Arc::clone(ty));
        }
        if self.options.strict_aliases {
            return Err(SugarError::unresolved_alias(
                tag.origin(),
                plugins.category(),
                alias,
            ));
        }
        warn!(
            category = plugins.category(),
            alias,
            origin = %tag.origin(),
            keeping = %ty,
            "unresolved alias, deferring to known type"
        );
        self.warnings.push(AliasWarning {
            alias: alias.to_string(),
            category: plugins.category().to_string(),
            origin: tag.origin().clone(),
        });
        Ok(Arc::clone(ty))
    }

    /// Expand every declared field of `ty` found in (or defaulted into) `root`
    fn expand_fields(
        &mut self,
        ty: &ClassDescriptor,
        root: &ConfigObject,
        depth: usize,
    ) -> SugarResult<ConfigObject> {
        let mut out = root.clone();
        for field in ty.fields() {
            let name = field.name();
            let mut value = match root.get(name) {
                Some(value) => value.clone(),
                None => match ty.field_defaults().get(name) {
                    Some(default) => {
                        let value = default.with_origin(default.origin().derived("global default : "));
                        out = out.with_value(name, value.clone());
                        value
                    }
                    None => continue,
                },
            };

            if field.shape().is_list_shaped()
                && field.auto_array()
                && value.value_type() != ValueType::List
            {
                let origin = value.origin().derived("auto collection of ");
                value = ConfigValue::list(ConfigList::from(vec![value]), origin);
                out = out.with_value(name, value.clone());
            }

            let Some(element) = field.element().type_name() else {
                continue;
            };
            let expanded = self.expand_field(field, element, &value, depth + 1)?;
            out = out.with_value(name, expanded);
        }
        Ok(out)
    }

    fn expand_field(
        &mut self,
        field: &FieldDescriptor,
        element: &TypeName,
        value: &ConfigValue,
        depth: usize,
    ) -> SugarResult<ConfigValue> {
        let shape = field.shape();
        if shape.is_list_shaped() {
            self.expand_list(value, field.name(), element, shape.is_nested_array(), depth)
        } else if shape.is_map() {
            self.expand_map(value, field.name(), element, shape.is_map_of_arrays(), depth)
        } else {
            let descriptor = self.registry.class_descriptor(element)?;
            self.expand_value(&descriptor, value, depth)
        }
    }
}
