//! Expansion options.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default recursion limit, in tree levels
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Environment variable overriding [`ExpandOptions::max_depth`]
pub const ENV_MAX_DEPTH: &str = "CONFIG_SUGAR_MAX_DEPTH";

/// Environment variable overriding [`ExpandOptions::strict_aliases`]
pub const ENV_STRICT_ALIASES: &str = "CONFIG_SUGAR_STRICT_ALIASES";

/// Tunables for one expander
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandOptions {
    /// Deepest tree level the expander will descend into
    pub max_depth: usize,
    /// Fail on discriminators naming unregistered aliases instead of warning
    pub strict_aliases: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_aliases: false,
        }
    }
}

impl ExpandOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_aliases = true;
        self
    }

    /// Defaults overridden by `CONFIG_SUGAR_MAX_DEPTH` and
    /// `CONFIG_SUGAR_STRICT_ALIASES`
    pub fn from_env() -> Self {
        Self::default().overridden_by(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup. Unparseable values are ignored.
    pub fn overridden_by(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_MAX_DEPTH) {
            match raw.trim().parse::<usize>() {
                Ok(depth) => self.max_depth = depth,
                Err(_) => warn!("ignoring {}={:?}: not a number", ENV_MAX_DEPTH, raw),
            }
        }
        if let Some(raw) = lookup(ENV_STRICT_ALIASES) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.strict_aliases = true,
                "0" | "false" | "no" | "off" => self.strict_aliases = false,
                _ => warn!("ignoring {}={:?}: not a boolean", ENV_STRICT_ALIASES, raw),
            }
        }
        self
    }
}
