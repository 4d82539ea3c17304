//! Store configuration.
//!
//! ```rust
//! use rxbox::StoreConfig;
//!
//! let config = StoreConfig::default().debug(true).strict(true).max_depth(16);
//! assert!(config.debug);
//!
//! let loaded = StoreConfig::from_json(r#"{"debug": true, "history_limit": 50}"#)
//!     .expect("valid config");
//! assert_eq!(loaded.history_limit, Some(50));
//! assert!(!loaded.strict);
//! ```

use serde::{Deserialize, Serialize};

/// Default nesting limit applied to deltas in strict mode.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Settings for a [`Store`](crate::Store).
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Keep every past state instead of only the previous one.
    pub debug: bool,
    /// Validate deltas before merging them.
    pub strict: bool,
    /// Nesting limit for deltas, checked only in strict mode.
    pub max_depth: usize,
    /// Cap on debug-mode history length; `None` keeps everything.
    pub history_limit: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debug: false,
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
            history_limit: None,
        }
    }
}

impl StoreConfig {
    /// Set the initial debug flag.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enable or disable strict delta validation.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the strict-mode nesting limit.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Cap debug-mode history at `limit` entries.
    #[must_use]
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input or mistyped fields.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
