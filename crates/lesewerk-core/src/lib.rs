// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Lesewerk — Core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::PipelineConfig;
pub use error::LesewerkError;
pub use types::*;
