//! Result types returned by [`crate::compile`].

use crate::error::CardError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a compilation run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOutput {
    /// Per-page image files, in print order. Empty when page output is off.
    pub page_paths: Vec<PathBuf>,

    /// The merged multi-page PDF, when one was requested.
    pub merged_path: Option<PathBuf>,

    /// Cards dropped under the skip policy, with the reason each was
    /// dropped. Always empty under the abort policy.
    pub skipped: Vec<CardError>,

    /// Timing and counting statistics for the run.
    pub stats: CompileStats,
}

/// Statistics for one compilation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileStats {
    /// Distinct card names in the deck list.
    pub unique_cards: usize,
    /// Total card slots requested (sum of counts), before skips.
    pub total_cards: usize,
    /// Unique cards served from the on-disk cache.
    pub cache_hits: usize,
    /// Unique cards downloaded this run.
    pub downloads: usize,
    /// Cards dropped under the skip policy.
    pub skipped_cards: usize,
    /// Sheets composed.
    pub pages: usize,
    /// Milliseconds spent resolving, downloading, and normalizing.
    pub fetch_duration_ms: u64,
    /// Milliseconds spent composing and writing output.
    pub output_duration_ms: u64,
    /// Wall-clock milliseconds for the whole run.
    pub total_duration_ms: u64,
}
