// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for fixture resolution
//!
//! Lookup failures are reported with the position that was requested. Errors
//! raised by client computations travel through [`FixtureError::Computation`]
//! untouched, and errors that are already a `FixtureError` (for example a
//! missing key read through `head`) are returned exactly as they were raised.

use thiserror::Error;

/// Result type alias for fixture operations
pub type Result<T> = std::result::Result<T, FixtureError>;

/// Errors produced while reading or materializing a fixture tree
#[derive(Error, Debug)]
pub enum FixtureError {
    /// Key absent from a composite node
    #[error("Key '{key}' not found")]
    KeyNotFound {
        /// The requested key
        key: String,
    },

    /// Index past the end of a sequence node
    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// Length of the sequence at the time of the lookup
        len: usize,
    },

    /// A key was used on a sequence node, or an index on a composite node
    #[error("Cannot address {node_kind} node with {position}")]
    PositionMismatch {
        /// Rendered position (`key 'a'` / `index 0`)
        position: String,
        /// Kind of node that rejected it
        node_kind: &'static str,
    },

    /// Navigation continued past a scalar value
    #[error("Cannot read {position} from a scalar value")]
    NotAContainer {
        /// Rendered position that was requested
        position: String,
    },

    /// Malformed pointer passed to `pointer()`
    #[error("Invalid pointer '{pointer}': {reason}")]
    InvalidPointer {
        /// The pointer as supplied
        pointer: String,
        /// What was wrong with it
        reason: String,
    },

    /// Template of the wrong shape for the requested operation
    #[error("Expected {expected} template, found {found}")]
    InvalidTemplate {
        /// Shape that was required
        expected: &'static str,
        /// Shape that was supplied
        found: &'static str,
    },

    /// The root of the tree was dropped while a descendant is still in use
    #[error("Head node is no longer alive")]
    HeadDropped,

    /// Nesting went past the configured depth limit
    #[error("Maximum nesting depth of {limit} exceeded")]
    MaxDepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// Deferred computations kept returning deferred computations
    #[error("Deferred computation chain longer than {limit}")]
    DeferredChainTooDeep {
        /// Configured limit
        limit: usize,
    },

    /// Error raised by a client-authored deferred computation
    #[error(transparent)]
    Computation(#[from] anyhow::Error),
}

impl FixtureError {
    /// Create a key not found error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create an index out of range error
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create a position mismatch error
    pub fn position_mismatch(position: impl ToString, node_kind: &'static str) -> Self {
        Self::PositionMismatch {
            position: position.to_string(),
            node_kind,
        }
    }

    /// Create a not-a-container error
    pub fn not_a_container(position: impl ToString) -> Self {
        Self::NotAContainer {
            position: position.to_string(),
        }
    }

    /// Create an invalid pointer error
    pub fn invalid_pointer(pointer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPointer {
            pointer: pointer.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid template error
    pub fn invalid_template(expected: &'static str, found: &'static str) -> Self {
        Self::InvalidTemplate { expected, found }
    }

    /// Create a client computation error from a message
    pub fn computation(message: impl std::fmt::Display) -> Self {
        Self::Computation(anyhow::anyhow!("{message}"))
    }

    /// True for the two lookup failures (`KeyNotFound` / `IndexOutOfRange`)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::KeyNotFound { .. } | Self::IndexOutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FixtureError::key_not_found("name").to_string(),
            "Key 'name' not found"
        );
        assert_eq!(
            FixtureError::index_out_of_range(3, 2).to_string(),
            "Index 3 out of range for sequence of length 2"
        );
        assert_eq!(
            FixtureError::computation("boom").to_string(),
            "boom"
        );
    }

    #[test]
    fn test_client_errors_convert_transparently() {
        fn client() -> Result<u8> {
            let parsed: anyhow::Result<u8> = Err(anyhow::anyhow!("client failure"));
            Ok(parsed?)
        }

        let err = client().unwrap_err();
        assert!(matches!(err, FixtureError::Computation(_)));
        assert_eq!(err.to_string(), "client failure");
        assert!(!err.is_not_found());
    }
}
