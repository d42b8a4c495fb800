// SPDX-License-Identifier: MIT
//
// Engine configuration.

use serde::{Deserialize, Serialize};

/// Settings that shape how mutated documents are written back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Compress content streams on the way out. For protection runs the
    /// pipeline compresses before encrypting instead, since readers decrypt
    /// first and then apply stream filters.
    pub compress_output: bool,
}
