//! Config Types - Level 1 Foundation Types
//!
//! Pure data structures for the configuration value tree consumed and produced
//! by the sugar expansion engine.
//!
//! ## Architecture Level: LEVEL 1 (Foundation)
//!
//! This crate sits at the bottom of the workspace. The engine, the registry and
//! the CLI all depend on it; it depends on nothing else in the workspace.
//!
//! ## Contents
//!
//! - [`Origin`] - human-readable provenance attached to every node
//! - [`ValueType`] - the six node kinds
//! - [`ConfigValue`] - an immutable, origin-tracked node
//! - [`ConfigObject`] / [`ConfigList`] - persistent containers (copy-on-write)
//!
//! ## Rules
//!
//! 1. **IMMUTABLE** - every "modification" returns a new node
//! 2. **ORIGINS ARE DIAGNOSTIC ONLY** - they never take part in equality
//! 3. **THREAD SAFE** - all types are `Send + Sync`

mod object;
mod value;

pub use object::{ConfigList, ConfigObject};
pub use value::{ConfigValue, ValueKind};

use std::sync::Arc;

// ============================================================================
// ORIGIN LOCATOR
// ============================================================================

/// Provenance of a node, e.g. `pipeline.yaml: source.filters.0`.
///
/// Cheap to clone. Never compared when comparing values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    description: Arc<str>,
}

impl Origin {
    /// Create an origin from a free-form description
    pub fn new(description: impl AsRef<str>) -> Self {
        Self {
            description: Arc::from(description.as_ref()),
        }
    }

    /// Origin used for nodes built in code rather than parsed from a source
    pub fn synthetic() -> Self {
        Self::new("synthetic")
    }

    /// Describe a node derived from this one: `"<prefix><this origin>"`
    pub fn derived(&self, prefix: &str) -> Self {
        Self::new(format!("{}{}", prefix, self.description))
    }

    /// Origin of a child reached through `segment` (object key or list index)
    pub fn child(&self, segment: &str) -> Self {
        Self::new(format!("{}.{}", self.description, segment))
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

impl From<&str> for Origin {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// NODE KINDS
// ============================================================================

/// Runtime kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Boolean,
    Number,
    String,
    List,
    Object,
}

impl ValueType {
    /// Upper-case kind name used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Null => "NULL",
            ValueType::Boolean => "BOOLEAN",
            ValueType::Number => "NUMBER",
            ValueType::String => "STRING",
            ValueType::List => "LIST",
            ValueType::Object => "OBJECT",
        }
    }

    /// Scalars are everything but lists and objects
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ValueType::List | ValueType::Object)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
