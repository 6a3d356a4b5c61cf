//! Type resolution: decide what concrete type a node stands for and rewrite
//! it into its tagged object form.
//!
//! ## Rules, in order
//!
//! ```text
//! non-object:
//!   list + undetermined type   → { <class>: <array alias>, <primary>: list } ⊕ alias defaults
//!   scalar + value type        → unchanged
//!   anything else              → TypeMismatch
//! object:
//!   explicit string tag        → object ⊕ alias defaults
//!   undetermined type:
//!     { <alias>: v }           → v (or { <primary>: v }) + tag ⊕ alias defaults
//!     one inlined alias key    → key moved to <primary> + tag ⊕ alias defaults
//!     two inlined alias keys   → Structure error
//!     category default alias   → object + tag ⊕ alias defaults
//!   otherwise                  → unchanged
//! ```
//!
//! `⊕` merges the alias default fragment underneath: explicit keys always win.
//! For the array and default aliases the fragment covers the whole redirect
//! chain from the configured alias, while the tag names the alias it ends at.

use config_types::{ConfigObject, ConfigValue, ValueType};
use tracing::debug;

use crate::descriptor::ClassDescriptor;
use crate::error::{SugarError, SugarResult};
use crate::plugin::{primary_of, PluginMap};

/// Resolve `value` against `ty` using the category rules in `plugins`.
///
/// Returns a tagged object, the object unchanged when no rule applies, or a
/// scalar passed through for types built from scalars.
pub fn resolve_type(
    ty: &ClassDescriptor,
    value: &ConfigValue,
    plugins: &PluginMap,
) -> SugarResult<ConfigValue> {
    let Some(root) = value.as_object() else {
        return resolve_non_object(ty, value, plugins);
    };
    let origin = value.origin();
    let class_field = plugins.class_field();

    // normal, explicit typing
    if let Some(alias) = root.get(class_field).and_then(ConfigValue::as_str) {
        let defaults = plugins.alias_defaults(alias);
        return Ok(ConfigValue::object(root.with_fallback(&defaults), origin.clone()));
    }

    if !ty.needs_disambiguation() {
        return Ok(value.clone());
    }

    if let Some(resolved) = single_key_shorthand(root, value, plugins)? {
        return Ok(resolved);
    }
    if let Some(resolved) = inlined_shorthand(root, value, plugins)? {
        return Ok(resolved);
    }
    if let Some(resolved) = default_type(root, value, plugins) {
        return Ok(resolved);
    }
    Ok(value.clone())
}

fn resolve_non_object(
    ty: &ClassDescriptor,
    value: &ConfigValue,
    plugins: &PluginMap,
) -> SugarResult<ConfigValue> {
    let origin = value.origin();
    if ty.needs_disambiguation() {
        if value.value_type() == ValueType::List {
            return array_shorthand(value, plugins);
        }
    } else if ty.is_value_codable() {
        return Ok(value.with_origin(origin.derived("unchanged for value type ")));
    }
    Err(SugarError::type_mismatch(
        origin,
        format!("invalid config type of {} for {}", value.value_type(), plugins),
    ))
}

fn array_shorthand(value: &ConfigValue, plugins: &PluginMap) -> SugarResult<ConfigValue> {
    let origin = value.origin();
    let no_array_type = || {
        SugarError::type_mismatch(
            origin,
            "found an array instead of an object, but no array type set",
        )
    };
    let declared = plugins.declared_array_alias().ok_or_else(no_array_type)?;
    let alias = plugins.array_alias().ok_or_else(no_array_type)?;
    let defaults = plugins.alias_defaults(declared);
    let primary = primary_of(&defaults).ok_or_else(no_array_type)?;

    debug!(category = plugins.category(), alias, %origin, "array sugar");
    let tag_origin = plugins
        .origin()
        .derived(&format!("{} array sugar : ", plugins.category()));
    let fields = ConfigObject::new()
        .with_value(plugins.class_field(), ConfigValue::string(alias, tag_origin))
        .with_value(primary, value.clone());
    Ok(ConfigValue::object(
        fields.with_fallback(&defaults),
        origin.clone(),
    ))
}

/// `{ "alias": { ... } }` or `{ "alias": <primary value> }`
fn single_key_shorthand(
    root: &ConfigObject,
    value: &ConfigValue,
    plugins: &PluginMap,
) -> SugarResult<Option<ConfigValue>> {
    let Some((alias, inner)) = root.single_entry() else {
        return Ok(None);
    };
    if !plugins.is_alias(alias) {
        return Ok(None);
    }
    let origin = value.origin();
    let defaults = plugins.alias_defaults(alias);
    let fields = match inner.as_object() {
        Some(obj) => obj.clone(),
        None => match primary_of(&defaults) {
            Some(primary) => ConfigObject::new().with_value(primary, inner.clone()),
            None => {
                return Err(SugarError::wrong_type(
                    inner.origin(),
                    alias,
                    ValueType::Object,
                    inner.value_type(),
                ))
            }
        },
    };

    debug!(category = plugins.category(), alias, %origin, "single key to type");
    let tag = ConfigValue::string(alias, origin.derived("single key to type from "));
    let tagged = fields
        .with_value(plugins.class_field(), tag)
        .with_fallback(&defaults);
    Ok(Some(ConfigValue::object(tagged, origin.clone())))
}

/// `{ "inlinedAlias": v, ...other fields }`
fn inlined_shorthand(
    root: &ConfigObject,
    value: &ConfigValue,
    plugins: &PluginMap,
) -> SugarResult<Option<ConfigValue>> {
    let origin = value.origin();
    let mut matched: Option<&str> = None;
    for alias in plugins.inlined_aliases() {
        if root.contains_key(alias) {
            if let Some(first) = matched {
                return Err(SugarError::structure(
                    origin,
                    format!(
                        "no type specified, more than one key, and both {} and {} match for inlined types.",
                        first, alias
                    ),
                ));
            }
            matched = Some(alias);
        }
    }
    let Some(alias) = matched else {
        return Ok(None);
    };
    let Some(inlined) = root.get(alias) else {
        return Ok(None);
    };

    let defaults = plugins.alias_defaults(alias);
    let primary = primary_of(&defaults).ok_or_else(|| {
        SugarError::type_mismatch(
            origin,
            format!("inlined alias '{}' declares no primary field", alias),
        )
    })?;

    debug!(category = plugins.category(), alias, %origin, "inlined key to type");
    let tag = ConfigValue::string(alias, origin.derived("inlined key to type from "));
    let fields = root
        .without_key(alias)
        .with_value(primary, inlined.clone())
        .with_fallback(&defaults)
        .with_value(plugins.class_field(), tag);
    Ok(Some(ConfigValue::object(fields, origin.clone())))
}

fn default_type(
    root: &ConfigObject,
    value: &ConfigValue,
    plugins: &PluginMap,
) -> Option<ConfigValue> {
    let alias = plugins.default_alias()?;
    let defaults = plugins.alias_defaults(plugins.declared_default_alias()?);

    debug!(category = plugins.category(), alias, origin = %value.origin(), "default type");
    let tag_origin = plugins
        .origin()
        .derived(&format!("{} default type : ", plugins.category()));
    let tagged = root
        .with_value(plugins.class_field(), ConfigValue::string(alias, tag_origin))
        .with_fallback(&defaults);
    Some(ConfigValue::object(tagged, value.origin().clone()))
}
