//! Expansion error types.

use config_types::{Origin, ValueType};
use thiserror::Error;

/// Stable classification of [`SugarError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Structure,
    UnknownCategory,
    TypeMismatch,
    DepthExceeded,
    UnresolvedAlias,
    UnknownType,
    Registry,
    Source,
}

/// Errors raised while expanding a configuration tree.
///
/// Every variant tied to a node carries that node's origin. All variants are
/// fatal to the enclosing top-level call.
#[derive(Debug, Clone, Error)]
pub enum SugarError {
    /// Root arity is wrong, or more than one inlined alias matched.
    #[error("{origin}: {message}")]
    Structure { origin: Origin, message: String },

    /// The root's single key is not a registered category.
    #[error("{origin}: {category}: top level key must be a valid category")]
    UnknownCategory { origin: Origin, category: String },

    /// A node's kind does not fit the rule being applied.
    #[error("{origin}: {message}")]
    TypeMismatch { origin: Origin, message: String },

    /// Nesting is deeper than the configured limit.
    #[error("{origin}: nesting exceeds maximum expansion depth of {limit}")]
    DepthExceeded { origin: Origin, limit: usize },

    /// A discriminator names an unregistered alias (strict mode only).
    #[error("{origin}: '{alias}' is not a registered alias in category '{category}'")]
    UnresolvedAlias {
        origin: Origin,
        category: String,
        alias: String,
    },

    /// A type name was never registered.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A registry definition is inconsistent.
    #[error("invalid registry definition: {0}")]
    Registry(String),

    /// Source text could not be turned into a value tree.
    #[error("{origin}: {message}")]
    Source { origin: Origin, message: String },
}

impl SugarError {
    pub fn structure(origin: &Origin, message: impl Into<String>) -> Self {
        Self::Structure {
            origin: origin.clone(),
            message: message.into(),
        }
    }

    pub fn unknown_category(origin: &Origin, category: impl Into<String>) -> Self {
        Self::UnknownCategory {
            origin: origin.clone(),
            category: category.into(),
        }
    }

    pub fn type_mismatch(origin: &Origin, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            origin: origin.clone(),
            message: message.into(),
        }
    }

    /// `<field> has type <found> rather than <expected>`
    pub fn wrong_type(origin: &Origin, field: &str, expected: ValueType, found: ValueType) -> Self {
        Self::type_mismatch(
            origin,
            format!("{} has type {} rather than {}", field, found, expected),
        )
    }

    pub fn depth_exceeded(origin: &Origin, limit: usize) -> Self {
        Self::DepthExceeded {
            origin: origin.clone(),
            limit,
        }
    }

    pub fn unresolved_alias(
        origin: &Origin,
        category: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self::UnresolvedAlias {
            origin: origin.clone(),
            category: category.into(),
            alias: alias.into(),
        }
    }

    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType(name.into())
    }

    pub fn registry(details: impl Into<String>) -> Self {
        Self::Registry(details.into())
    }

    pub fn source(origin: &Origin, message: impl Into<String>) -> Self {
        Self::Source {
            origin: origin.clone(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Structure { .. } => ErrorKind::Structure,
            Self::UnknownCategory { .. } => ErrorKind::UnknownCategory,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::UnresolvedAlias { .. } => ErrorKind::UnresolvedAlias,
            Self::UnknownType(_) => ErrorKind::UnknownType,
            Self::Registry(_) => ErrorKind::Registry,
            Self::Source { .. } => ErrorKind::Source,
        }
    }

    /// Origin of the offending node, when the error concerns one
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Self::Structure { origin, .. }
            | Self::UnknownCategory { origin, .. }
            | Self::TypeMismatch { origin, .. }
            | Self::DepthExceeded { origin, .. }
            | Self::UnresolvedAlias { origin, .. }
            | Self::Source { origin, .. } => Some(origin),
            Self::UnknownType(_) | Self::Registry(_) => None,
        }
    }
}

/// Result type for all engine operations
pub type SugarResult<T> = Result<T, SugarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_origin() {
        let origin = Origin::new("job.yaml: source");
        let err = SugarError::wrong_type(&origin, "filters", ValueType::List, ValueType::String);
        assert_eq!(
            err.to_string(),
            "job.yaml: source: filters has type STRING rather than LIST"
        );
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.origin(), Some(&origin));
    }

    #[test]
    fn error_kinds() {
        let origin = Origin::synthetic();
        assert_eq!(
            SugarError::unknown_category(&origin, "nope").kind(),
            ErrorKind::UnknownCategory
        );
        assert_eq!(SugarError::depth_exceeded(&origin, 8).kind(), ErrorKind::DepthExceeded);
        assert!(SugarError::unknown_type("Missing").origin().is_none());
        assert!(SugarError::registry("bad").to_string().contains("bad"));
    }
}
