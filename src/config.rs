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

//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Default nesting limit for wrapped nodes
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default limit for deferred computations returning deferred computations
pub const DEFAULT_MAX_DEFERRED_CHAIN: usize = 32;

/// Limits applied while resolving a fixture tree
///
/// One configuration is shared by every node of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Deepest nesting level a node may be wrapped at (root is 0)
    pub max_depth: usize,
    /// How many deferred results may be unwound for one position
    pub max_deferred_chain: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_deferred_chain: DEFAULT_MAX_DEFERRED_CHAIN,
        }
    }
}

impl ResolverConfig {
    /// Create a configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the deferred chain limit
    pub fn with_max_deferred_chain(mut self, max_deferred_chain: usize) -> Self {
        self.max_deferred_chain = max_deferred_chain;
        self
    }
}
