//! Error types for the decksheet library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DeckSheetError`] — **Fatal**: the compilation cannot produce the
//!   requested output (bad deck file, unresolvable card under the abort
//!   policy, output collision, broken image). Returned as
//!   `Err(DeckSheetError)` from [`crate::compile`].
//!
//! * [`CardError`] — **Non-fatal**: a single card could not be resolved or
//!   downloaded while [`crate::config::UnresolvedPolicy::Skip`] is active.
//!   Collected into [`crate::output::CompileOutput::skipped`] so callers can
//!   report which cards were dropped from the sheets.
//!
//! Normalization and output-write failures are always fatal: a sheet with a
//! silently missing or misshapen card defeats the point of a print run.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the decksheet library.
///
/// Per-card failures under the skip policy use [`CardError`] and are stored
/// in [`crate::output::CompileOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum DeckSheetError {
    // ── Deck file errors ──────────────────────────────────────────────────
    /// Deck list file was not found at the given path.
    #[error("Deck file not found: '{path}'\nCheck the path exists and is readable.")]
    DeckFileNotFound { path: PathBuf },

    /// Process does not have read permission on the deck file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// A deck-list line did not match `<count> <card name>`.
    #[error("Deck list line {line}: {detail}")]
    Parse { line: usize, detail: String },

    // ── Resolution errors ─────────────────────────────────────────────────
    /// The card-data service found no card for this name.
    #[error("No card found for '{name}': {detail}")]
    Resolution { name: String, detail: String },

    // ── Fetch errors ──────────────────────────────────────────────────────
    /// HTTP download of a card image or lookup response failed.
    #[error("Failed to fetch '{url}': {reason}\nCheck your internet connection.")]
    Fetch { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Fetch timed out after {secs}s for '{url}'\nIncrease --timeout.")]
    FetchTimeout { url: String, secs: u64 },

    // ── Image errors ──────────────────────────────────────────────────────
    /// A cached image could not be decoded or resized to card dimensions.
    #[error("Failed to normalize image '{path}': {detail}")]
    Normalization { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output path already exists and overwrite was not requested.
    #[error("Output file already exists: '{path}'\nPass --overwrite to replace it.")]
    OutputExists { path: PathBuf },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single card, produced only under the skip policy.
///
/// The compilation continues without the card; its deck entries are excluded
/// from sheet composition.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum CardError {
    /// The card name could not be resolved to an image URL.
    #[error("'{name}' could not be resolved: {detail}")]
    Unresolved { name: String, detail: String },

    /// The image URL resolved but the download failed.
    #[error("'{name}' image download failed: {reason}")]
    FetchFailed { name: String, reason: String },
}

impl CardError {
    /// Name of the card this error concerns.
    pub fn card_name(&self) -> &str {
        match self {
            CardError::Unresolved { name, .. } => name,
            CardError::FetchFailed { name, .. } => name,
        }
    }
}
