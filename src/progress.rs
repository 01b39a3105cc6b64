//! Progress-callback trait for per-card compilation events.
//!
//! Inject an [`Arc<dyn CompileProgressCallback>`] via
//! [`crate::config::CompileConfigBuilder::progress_callback`] to receive
//! events as the pipeline fetches and normalizes each unique card. The CLI
//! uses this to drive its progress bar; library callers can forward events
//! anywhere without the library knowing how the host application
//! communicates.

use std::sync::Arc;

/// Called by the compile loop as it processes each unique card.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is sequential, so events for one run
/// arrive in order on one task, but implementations must still be
/// `Send + Sync` to cross the async boundary.
pub trait CompileProgressCallback: Send + Sync {
    /// Called once after parsing, before any card is fetched.
    ///
    /// # Arguments
    /// * `unique_cards` — number of distinct card names to fetch
    /// * `total_cards`  — total slots the sheets will contain
    fn on_compile_start(&self, unique_cards: usize, total_cards: usize) {
        let _ = (unique_cards, total_cards);
    }

    /// Called before a card is looked up in the cache.
    fn on_card_start(&self, index: usize, unique_cards: usize, name: &str) {
        let _ = (index, unique_cards, name);
    }

    /// Called when a card's image is ready (from cache or network).
    ///
    /// `cached` is true when no network access was needed.
    fn on_card_ready(&self, index: usize, unique_cards: usize, name: &str, cached: bool) {
        let _ = (index, unique_cards, name, cached);
    }

    /// Called when a card is dropped under the skip policy.
    fn on_card_skipped(&self, index: usize, unique_cards: usize, name: &str, error: &str) {
        let _ = (index, unique_cards, name, error);
    }

    /// Called once after output writing, with the number of sheets produced.
    fn on_compile_complete(&self, pages: usize) {
        let _ = pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl CompileProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CompileConfig`].
pub type ProgressCallback = Arc<dyn CompileProgressCallback>;
