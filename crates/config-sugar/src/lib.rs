//! Sugar expansion for typed configuration trees.
//!
//! Hand-written configuration is full of shortcuts: a bare value where a list
//! was expected, a type alias used as the only key of an object, a field
//! value written under its alias, an object with no type tag at all. This
//! crate rewrites such trees into one canonical shape: every polymorphic
//! object carries an explicit discriminator, every defaulted field is
//! present, and lists and maps are normalized all the way down.
//!
//! # Architecture
//!
//! ```text
//! { category: node } ──► Expander ──► resolve_type ──► expand_fields
//!                            │              ▲                │
//!                            │              └── lists/maps ◄─┘
//!                            │
//!                            └── TypeRegistry (CodecRegistry)
//!                                    ├── PluginMap per category
//!                                    └── DescriptorCache (once per type)
//! ```
//!
//! # Key Concepts
//!
//! - **PluginMap**: a category's discriminator field, aliases, alias
//!   defaults and sugar settings
//! - **ClassDescriptor**: a type's fields (inherited ones included), field
//!   defaults and governing plugin map
//! - **Expander**: runs one expansion per call; descriptors are the only
//!   state shared between calls
//!
//! # Example
//!
//! ```ignore
//! use config_sugar::{loader, source, Expander};
//!
//! let loaded = loader::load_registry("registry.yaml")?;
//! let doc = source::from_yaml_str("job.yaml", &std::fs::read_to_string("job.yaml")?)?;
//! let canonical = Expander::new(&loaded.registry)
//!     .with_options(loaded.options)
//!     .expand_root(&doc)?;
//! ```

mod cache;
mod collection;
mod descriptor;
mod error;
mod expand;
mod options;
mod plugin;
mod registry;
mod resolve;

pub mod loader;
pub mod source;

pub use cache::DescriptorCache;
pub use descriptor::{ClassDescriptor, ClassKind, ElementType, FieldDescriptor, FieldShape, TypeName};
pub use error::{ErrorKind, SugarError, SugarResult};
pub use expand::{AliasWarning, Expander, Expansion};
pub use options::{ExpandOptions, DEFAULT_MAX_DEPTH, ENV_MAX_DEPTH, ENV_STRICT_ALIASES};
pub use plugin::{Alias, AliasTarget, PluginMap, DEFAULT_CLASS_FIELD, PRIMARY_KEY};
pub use registry::{CodecRegistry, CodecRegistryBuilder, TypeDef, TypeRegistry};
pub use resolve::resolve_type;

pub use config_types::{ConfigList, ConfigObject, ConfigValue, Origin, ValueKind, ValueType};

/// Expand `{ <category>: <node> }` with default options
pub fn expand_root(registry: &dyn TypeRegistry, root: &ConfigValue) -> SugarResult<ConfigValue> {
    Expander::new(registry).expand_root(root)
}

/// Expand `node` as an instance of `ty` with default options
pub fn expand(registry: &dyn TypeRegistry, ty: &TypeName, node: &ConfigValue) -> SugarResult<ConfigValue> {
    Expander::new(registry).expand(ty, node)
}
