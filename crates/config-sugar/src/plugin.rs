//! Per-category plugin maps: discriminator field, aliases and their defaults.

use config_types::{ConfigObject, ConfigValue, Origin};
use indexmap::IndexMap;

use crate::descriptor::TypeName;

/// Reserved key in an alias default fragment naming its primary field
pub const PRIMARY_KEY: &str = "_primary";

/// Discriminator field used when a category does not choose one
pub const DEFAULT_CLASS_FIELD: &str = "type";

/// What an alias points at
#[derive(Debug, Clone, PartialEq)]
pub enum AliasTarget {
    Type(TypeName),
    /// Another alias of the same category
    Redirect(String),
}

/// A registered alias
#[derive(Debug, Clone)]
pub struct Alias {
    target: AliasTarget,
    defaults: ConfigObject,
    inline: bool,
}

impl Alias {
    pub fn to_type(name: impl Into<TypeName>) -> Self {
        Self {
            target: AliasTarget::Type(name.into()),
            defaults: ConfigObject::new(),
            inline: false,
        }
    }

    pub fn redirect(alias: impl Into<String>) -> Self {
        Self {
            target: AliasTarget::Redirect(alias.into()),
            defaults: ConfigObject::new(),
            inline: false,
        }
    }

    /// Field that receives a shorthand value which is not an object
    pub fn with_primary(mut self, field: impl Into<String>) -> Self {
        let value = ConfigValue::string(field, Origin::new("alias primary field"));
        self.defaults = self.defaults.with_value(PRIMARY_KEY, value);
        self
    }

    /// Merge `defaults` into this alias's default fragment (existing keys win)
    pub fn with_defaults(mut self, defaults: ConfigObject) -> Self {
        self.defaults = self.defaults.with_fallback(&defaults);
        self
    }

    /// Allow the alias name to appear as a bare key selecting this type
    pub fn inlined(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn target(&self) -> &AliasTarget {
        &self.target
    }

    pub fn defaults(&self) -> &ConfigObject {
        &self.defaults
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }
}

/// Alias table and sugar settings for one category
#[derive(Debug, Clone)]
pub struct PluginMap {
    category: String,
    class_field: String,
    base_type: Option<TypeName>,
    aliases: IndexMap<String, Alias>,
    array_alias: Option<String>,
    default_alias: Option<String>,
    origin: Origin,
}

impl PluginMap {
    pub fn new(category: impl Into<String>) -> Self {
        let category = category.into();
        Self {
            origin: Origin::new(format!("plugin category {}", category)),
            category,
            class_field: DEFAULT_CLASS_FIELD.to_string(),
            base_type: None,
            aliases: IndexMap::new(),
            array_alias: None,
            default_alias: None,
        }
    }

    /// Plugin map for types that belong to no category
    pub fn empty() -> Self {
        Self::new("")
    }

    pub fn with_class_field(mut self, field: impl Into<String>) -> Self {
        self.class_field = field.into();
        self
    }

    pub fn with_base_type(mut self, base: impl Into<TypeName>) -> Self {
        self.base_type = Some(base.into());
        self
    }

    pub fn with_alias(mut self, name: impl Into<String>, alias: Alias) -> Self {
        self.aliases.insert(name.into(), alias);
        self
    }

    /// Alias used when a list appears where an object was expected
    pub fn with_array_alias(mut self, alias: impl Into<String>) -> Self {
        self.array_alias = Some(alias.into());
        self
    }

    /// Alias used when nothing else determines the type
    pub fn with_default_alias(mut self, alias: impl Into<String>) -> Self {
        self.default_alias = Some(alias.into());
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn class_field(&self) -> &str {
        &self.class_field
    }

    pub fn base_type(&self) -> Option<&TypeName> {
        self.base_type.as_ref()
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &Alias)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Follow redirects to the alias that names a type.
    ///
    /// Returns `None` for unknown aliases and for redirect cycles.
    pub fn last_alias<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        let mut current = name;
        for _ in 0..=self.aliases.len() {
            match &self.aliases.get(current)?.target {
                AliasTarget::Type(_) => return Some(current),
                AliasTarget::Redirect(next) => current = next,
            }
        }
        None
    }

    /// Type registered for `alias`, or `None` when the alias is unknown
    pub fn resolve_alias(&self, alias: &str) -> Option<&TypeName> {
        let last = self.last_alias(alias)?;
        match &self.aliases.get(last)?.target {
            AliasTarget::Type(name) => Some(name),
            AliasTarget::Redirect(_) => None,
        }
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.resolve_alias(name).is_some()
    }

    /// Default fragment for `alias`, including the defaults of every alias it
    /// redirects through (nearer aliases win). Unknown aliases yield an empty
    /// object.
    pub fn alias_defaults(&self, alias: &str) -> ConfigObject {
        let mut merged = ConfigObject::new();
        let mut current = alias;
        for _ in 0..=self.aliases.len() {
            let Some(entry) = self.aliases.get(current) else {
                break;
            };
            merged = merged.with_fallback(&entry.defaults);
            match &entry.target {
                AliasTarget::Type(_) => break,
                AliasTarget::Redirect(next) => current = next,
            }
        }
        merged
    }

    /// Primary field declared in `alias`'s default fragment
    pub fn primary_field(&self, alias: &str) -> Option<String> {
        primary_of(&self.alias_defaults(alias))
    }

    /// Aliases that may appear as bare keys, in registration order
    pub fn inlined_aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases
            .iter()
            .filter(|(_, alias)| alias.inline)
            .map(|(name, _)| name.as_str())
    }

    /// Array-shorthand alias, resolved through redirects
    pub fn array_alias(&self) -> Option<&str> {
        self.array_alias
            .as_deref()
            .and_then(|alias| self.last_alias(alias))
    }

    /// Default alias, resolved through redirects
    pub fn default_alias(&self) -> Option<&str> {
        self.default_alias
            .as_deref()
            .and_then(|alias| self.last_alias(alias))
    }

    /// Configured array alias before redirect resolution
    pub fn declared_array_alias(&self) -> Option<&str> {
        self.array_alias.as_deref()
    }

    /// Configured default alias before redirect resolution
    pub fn declared_default_alias(&self) -> Option<&str> {
        self.default_alias.as_deref()
    }
}

impl std::fmt::Display for PluginMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.category.is_empty() {
            f.write_str("uncategorized types")
        } else {
            write!(f, "category '{}'", self.category)
        }
    }
}

/// Primary field name declared in a default fragment
pub(crate) fn primary_of(defaults: &ConfigObject) -> Option<String> {
    defaults
        .get(PRIMARY_KEY)
        .and_then(ConfigValue::as_str)
        .map(str::to_string)
}
