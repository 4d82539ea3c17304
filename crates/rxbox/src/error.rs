//! Error handling for store operations.
//!
//! Reads, subscriptions, and history access never fail. Only calls that
//! accept caller data (`assign_state`) or convert the state into a caller
//! type (`get_state_as`) return errors, and every error is raised before
//! the state is touched.
//!
//! # Example
//!
//! ```rust
//! use rxbox::error::StoreError;
//! use rxbox_core::CoreError;
//!
//! fn handle_error(err: StoreError) {
//!     match err {
//!         StoreError::Core(CoreError::InvalidKey { key, .. }) => {
//!             tracing::warn!(%key, "delta key is not addressable");
//!         }
//!         StoreError::Serialization { reason } => {
//!             tracing::error!(%reason, "delta could not be converted");
//!         }
//!         _ => tracing::warn!(?err, "store error"),
//!     }
//! }
//! ```

use rxbox_core::CoreError;
use thiserror::Error;

/// Errors from store operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// The delta was rejected by conversion or strict-mode validation.
    #[error("invalid delta: {0}")]
    Core(#[from] CoreError),

    /// The delta could not be serialized into a state tree.
    #[error("delta serialization failed: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The state could not be converted into the requested type.
    #[error("state deserialization failed: {reason}")]
    Deserialize {
        /// Description of the conversion failure.
        reason: String,
    },
}

impl StoreError {
    /// Check if this error came from strict-mode validation.
    #[must_use]
    pub fn is_strict_rejection(&self) -> bool {
        matches!(
            self,
            Self::Core(CoreError::InvalidKey { .. } | CoreError::DepthExceeded { .. })
        )
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
