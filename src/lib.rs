//! # decksheet
//!
//! Compile Magic: The Gathering deck lists into printable card sheets.
//!
//! ## Why this crate?
//!
//! Proxying a deck for playtesting means hunting down card images one by
//! one, resizing them, and arranging them for print. This crate does the
//! whole run from a plain-text deck list: it resolves each card name
//! against the Scryfall card database, downloads and caches the images,
//! normalizes them to a uniform card size, and tiles them onto fixed-grid
//! sheets ready for a printer — as page images, a merged PDF, or both.
//!
//! ## Pipeline Overview
//!
//! ```text
//! deck list
//!  │
//!  ├─ 1. Parse      `<count> <name>` lines, SB: sideboard, # comments
//!  ├─ 2. Resolve    exact name lookup against the Scryfall API
//!  ├─ 3. Cache      name-keyed on-disk store; reruns skip the network
//!  ├─ 4. Normalize  resize to card size, aspect preserved, white padding
//!  ├─ 5. Compose    tile slots onto 3×3 sheets with uniform gutters
//!  └─ 6. Write      page01.png … + optional merged multi-page PDF
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use decksheet::{compile, CompileConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CompileConfig::builder()
//!         .page_prefix("deck-page")
//!         .merge_path("deck.pdf")
//!         .build()?;
//!     let output = compile("deck.txt", &config).await?;
//!     println!("{} pages written", output.stats.pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `decksheet` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! decksheet = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compile;
pub mod config;
pub mod deck;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compile::{compile, compile_sync};
pub use config::{
    default_cache_dir, CardFace, CompileConfig, CompileConfigBuilder, PageFormat, UnresolvedPolicy,
};
pub use deck::{parse_deck, DeckEntry};
pub use error::{CardError, DeckSheetError};
pub use output::{CompileOutput, CompileStats};
pub use pipeline::normalize::{FitNormalizer, Normalizer};
pub use pipeline::resolve::{CardResolver, ResolvedCard, ScryfallResolver};
pub use progress::{CompileProgressCallback, NoopProgressCallback, ProgressCallback};
