//! Full-run compilation entry points.
//!
//! [`compile`] drives every stage in order: parse the deck list, fetch and
//! normalize each unique card (one at a time — the card service rate-limits
//! aggressive clients, and a print run is not latency-sensitive), tile the
//! sheets, and write the requested outputs. [`compile_sync`] wraps it for
//! synchronous callers.

use crate::config::{CompileConfig, UnresolvedPolicy, default_cache_dir};
use crate::deck::{self, DeckEntry};
use crate::error::{CardError, DeckSheetError};
use crate::output::{CompileOutput, CompileStats};
use crate::pipeline::cache::ImageCache;
use crate::pipeline::compose::{self, SheetLayout};
use crate::pipeline::normalize::{self, FitNormalizer, Normalizer};
use crate::pipeline::resolve::{CardResolver, ScryfallResolver};
use crate::pipeline::write;
use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Compile a deck list file into printable sheets.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `deck_path` — path to the deck list text file
/// * `config`    — compilation configuration
///
/// # Returns
/// `Ok(CompileOutput)` on success. Under the skip policy the output may
/// list dropped cards in `skipped`; under the abort policy any unresolvable
/// card is an error instead.
///
/// # Errors
/// Returns `Err(DeckSheetError)` for fatal failures: unreadable or
/// malformed deck file, resolution/fetch failure under the abort policy,
/// broken cached image, or output I/O failure.
pub async fn compile(
    deck_path: impl AsRef<Path>,
    config: &CompileConfig,
) -> Result<CompileOutput, DeckSheetError> {
    let total_start = Instant::now();
    let deck_path = deck_path.as_ref();
    info!("Compiling deck: {}", deck_path.display());

    // ── Step 1: Read and parse the deck list ─────────────────────────────
    let text = read_deck_file(deck_path).await?;
    let entries = deck::parse_deck(&text)?;
    let unique = deck::unique_names(&entries)
        .into_iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    let total_cards = deck::total_cards(&entries);
    info!(
        "Deck has {} entries, {} unique cards, {} total slots",
        entries.len(),
        unique.len(),
        total_cards
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_compile_start(unique.len(), total_cards);
    }

    // ── Step 2: Build resolver, normalizer, cache ────────────────────────
    let resolver: Arc<dyn CardResolver> = match config.resolver {
        Some(ref r) => Arc::clone(r),
        None => Arc::new(ScryfallResolver::new(
            config.download_timeout_secs,
            &config.user_agent,
        )?),
    };
    let normalizer: Arc<dyn Normalizer> = match config.normalizer {
        Some(ref n) => Arc::clone(n),
        None => Arc::new(FitNormalizer::new(config.card_width, config.card_height)),
    };
    let cache_dir = config.cache_dir.clone().unwrap_or_else(default_cache_dir);
    let cache = ImageCache::open(&cache_dir)?;

    // ── Step 3: Fetch and normalize each unique card, sequentially ──────
    let fetch_start = Instant::now();
    let mut images: HashMap<String, RgbaImage> = HashMap::with_capacity(unique.len());
    let mut skipped: Vec<CardError> = Vec::new();
    let mut cache_hits = 0usize;
    let mut downloads = 0usize;

    for (idx, name) in unique.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_card_start(idx + 1, unique.len(), name);
        }

        let was_cached = cache.path_for(name).exists();
        let fetched = cache.get_or_fetch(&resolver, name).await;

        let path = match fetched {
            Ok(path) => path,
            Err(e) => {
                let card_err = card_error(config.unresolved, name, e)?;
                warn!("Skipping '{}': {}", name, card_err);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_card_skipped(idx + 1, unique.len(), name, &card_err.to_string());
                }
                skipped.push(card_err);
                continue;
            }
        };

        if was_cached {
            cache_hits += 1;
        } else {
            downloads += 1;
        }

        let normalized = normalize::load_and_normalize(&path, normalizer.as_ref())?;
        images.insert(name.clone(), normalized);

        if let Some(ref cb) = config.progress_callback {
            cb.on_card_ready(idx + 1, unique.len(), name, was_cached);
        }
    }
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

    // ── Step 4: Drop entries for skipped cards ───────────────────────────
    let printable = retain_resolved(&entries, &skipped);

    // ── Step 5: Compose sheets ───────────────────────────────────────────
    let output_start = Instant::now();
    let layout = SheetLayout::from_config(config);
    let pages = compose::compose_sheets(&printable, &images, &layout)?;
    if pages.is_empty() {
        warn!("Deck produced no printable cards; nothing written");
    }

    // ── Step 6: Write outputs ────────────────────────────────────────────
    let mut page_paths = Vec::new();
    if config.write_pages && !pages.is_empty() {
        page_paths = write::write_page_images(
            &pages,
            &config.page_prefix,
            config.page_format,
            config.overwrite,
        )?;
    }

    let mut merged_path = None;
    if let Some(ref path) = config.merge_path {
        if pages.is_empty() {
            warn!("Skipping merged PDF '{}': no pages", path.display());
        } else {
            write::write_merged_pdf(&pages, path, config.overwrite)?;
            merged_path = Some(path.clone());
        }
    }
    let output_duration_ms = output_start.elapsed().as_millis() as u64;

    // ── Step 7: Optional cache cleanup ───────────────────────────────────
    if !config.keep_cache {
        info!("Removing cache directory {}", cache_dir.display());
        if let Err(e) = tokio::fs::remove_dir_all(&cache_dir).await {
            warn!("Could not remove cache directory: {}", e);
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_compile_complete(pages.len());
    }

    let stats = CompileStats {
        unique_cards: unique.len(),
        total_cards,
        cache_hits,
        downloads,
        skipped_cards: skipped.len(),
        pages: pages.len(),
        fetch_duration_ms,
        output_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Compiled {} pages ({} cached, {} downloaded) in {}ms",
        stats.pages, stats.cache_hits, stats.downloads, stats.total_duration_ms
    );

    Ok(CompileOutput {
        page_paths,
        merged_path,
        skipped,
        stats,
    })
}

/// Synchronous wrapper around [`compile`].
///
/// Creates a temporary tokio runtime internally.
pub fn compile_sync(
    deck_path: impl AsRef<Path>,
    config: &CompileConfig,
) -> Result<CompileOutput, DeckSheetError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DeckSheetError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(compile(deck_path, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn read_deck_file(path: &Path) -> Result<String, DeckSheetError> {
    tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DeckSheetError::DeckFileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => DeckSheetError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DeckSheetError::Internal(format!("reading '{}': {e}", path.display())),
    })
}

/// Demote a fetch-stage error to a [`CardError`] under the skip policy.
///
/// Only resolution and transport failures are skippable; everything else
/// (cache write failures and the like) stays fatal regardless of policy.
fn card_error(
    policy: UnresolvedPolicy,
    name: &str,
    err: DeckSheetError,
) -> Result<CardError, DeckSheetError> {
    if policy == UnresolvedPolicy::Abort {
        return Err(err);
    }
    match err {
        DeckSheetError::Resolution { detail, .. } => Ok(CardError::Unresolved {
            name: name.to_string(),
            detail,
        }),
        DeckSheetError::Fetch { reason, .. } => Ok(CardError::FetchFailed {
            name: name.to_string(),
            reason,
        }),
        DeckSheetError::FetchTimeout { secs, .. } => Ok(CardError::FetchFailed {
            name: name.to_string(),
            reason: format!("timed out after {secs}s"),
        }),
        other => Err(other),
    }
}

/// Entries whose card made it through fetch and normalization.
fn retain_resolved(entries: &[DeckEntry], skipped: &[CardError]) -> Vec<DeckEntry> {
    if skipped.is_empty() {
        return entries.to_vec();
    }
    let dropped: HashSet<&str> = skipped.iter().map(CardError::card_name).collect();
    entries
        .iter()
        .filter(|e| !dropped.contains(e.name.as_str()))
        .cloned()
        .collect()
}
