// SPDX-License-Identifier: MIT
//
// quire-core: Core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use types::*;
