// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Unified error types for Lesewerk.

use thiserror::Error;

/// Top-level error type for all Lesewerk operations.
#[derive(Debug, Error)]
pub enum LesewerkError {
    // -- Engine errors --
    /// No candidate engine source could be constructed and initialised.
    /// Fatal to the batch that triggered initialisation.
    #[error("recognition engine initialisation failed: {0}")]
    EngineInit(String),

    /// A single recognition call failed. Isolated to one job.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    // -- Renderer errors --
    /// No candidate renderer source succeeded. Documents are skipped,
    /// image inputs remain usable.
    #[error("page renderer unavailable: {0}")]
    RendererUnavailable(String),

    /// Rasterising one document page failed. Isolated to that page's job.
    #[error("failed to render page {page}: {reason}")]
    PageRender { page: u32, reason: String },

    // -- Input errors --
    #[error("could not read input file {name}: {reason}")]
    InputRead { name: String, reason: String },

    #[error("image decoding failed: {0}")]
    ImageDecode(String),

    // -- Ambient --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LesewerkError>;
