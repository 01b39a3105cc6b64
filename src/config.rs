//! Configuration types for deck compilation.
//!
//! All behaviour is controlled through [`CompileConfig`], built via its
//! [`CompileConfigBuilder`]. Keeping every knob in one struct keeps component
//! construction explicit — there is no module-wide default cache directory or
//! other global state; every pipeline stage receives its configuration when
//! the run starts and forgets it when the run ends.

use crate::error::DeckSheetError;
use crate::pipeline::normalize::Normalizer;
use crate::pipeline::resolve::CardResolver;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default card size in pixels: 63×88 mm at 300 DPI.
pub const DEFAULT_CARD_WIDTH: u32 = 745;
/// See [`DEFAULT_CARD_WIDTH`].
pub const DEFAULT_CARD_HEIGHT: u32 = 1040;

/// Configuration for one compilation run.
///
/// Built via [`CompileConfig::builder()`] or [`CompileConfig::default()`].
///
/// # Example
/// ```rust
/// use decksheet::CompileConfig;
///
/// let config = CompileConfig::builder()
///     .page_prefix("proxies-")
///     .merge_path("deck.pdf")
///     .overwrite(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CompileConfig {
    /// Directory holding one cached image per unique card name.
    /// `None` selects the per-user default (`~/.cache/decksheet/cards` on
    /// Linux). Created if absent; never evicted by the library.
    pub cache_dir: Option<PathBuf>,

    /// Filename prefix for per-page output images. Default: `"page"`.
    ///
    /// Pages are written as `<prefix><NN>.<ext>`, 1-indexed and zero-padded,
    /// so a shell glob lists them in print order.
    pub page_prefix: String,

    /// Encoding for per-page output images. Default: [`PageFormat::Png`].
    pub page_format: PageFormat,

    /// Path for the single merged multi-page PDF. `None` (default) writes
    /// per-page images only.
    pub merge_path: Option<PathBuf>,

    /// Whether to write per-page image files. Default: true.
    ///
    /// Turn off (together with a `merge_path`) to produce only the PDF.
    pub write_pages: bool,

    /// Replace existing output files instead of failing. Default: false.
    pub overwrite: bool,

    /// Keep the cache directory after the run. Default: true.
    ///
    /// Cache persistence is the normal mode — a second run of the same deck
    /// makes no network calls at all. Setting this to `false` deletes the
    /// cache directory after a successful run, for callers that point
    /// `cache_dir` at scratch space and want it gone (`--discard-cache` at
    /// the CLI; `-k/--keep-cache` pins the default).
    pub keep_cache: bool,

    /// What to do when a card cannot be resolved or downloaded.
    /// Default: [`UnresolvedPolicy::Abort`].
    pub unresolved: UnresolvedPolicy,

    /// Cards per sheet row. Default: 3.
    pub columns: u32,

    /// Sheet rows per page. Default: 3.
    pub rows: u32,

    /// Normalized card width in pixels. Default: [`DEFAULT_CARD_WIDTH`].
    pub card_width: u32,

    /// Normalized card height in pixels. Default: [`DEFAULT_CARD_HEIGHT`].
    pub card_height: u32,

    /// Whitespace between and around cards, in pixels. Default: 8.
    ///
    /// Matches cutting-guide conventions: a thin white gutter survives
    /// imprecise scissors better than edge-to-edge tiling.
    pub gutter: u32,

    /// HTTP timeout for lookup and image downloads, in seconds. Default: 30.
    ///
    /// This is the only timeout in the pipeline; there are no retries beyond
    /// what the HTTP client does internally.
    pub download_timeout_secs: u64,

    /// User-Agent header sent to the card-data service.
    ///
    /// Scryfall asks API consumers to identify themselves; requests with a
    /// generic agent may be rate-limited.
    pub user_agent: String,

    /// Pre-constructed resolver. `None` (default) builds a
    /// [`crate::pipeline::resolve::ScryfallResolver`] from the fields above.
    /// Inject a mock here in tests.
    pub resolver: Option<Arc<dyn CardResolver>>,

    /// Pre-constructed normalizer. `None` (default) builds a
    /// [`crate::pipeline::normalize::FitNormalizer`] at the configured card
    /// size.
    pub normalizer: Option<Arc<dyn Normalizer>>,

    /// Optional per-card progress callback (progress bars, logging bridges).
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            page_prefix: "page".to_string(),
            page_format: PageFormat::default(),
            merge_path: None,
            write_pages: true,
            overwrite: false,
            keep_cache: true,
            unresolved: UnresolvedPolicy::default(),
            columns: 3,
            rows: 3,
            card_width: DEFAULT_CARD_WIDTH,
            card_height: DEFAULT_CARD_HEIGHT,
            gutter: 8,
            download_timeout_secs: 30,
            user_agent: concat!("decksheet/", env!("CARGO_PKG_VERSION")).to_string(),
            resolver: None,
            normalizer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CompileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileConfig")
            .field("cache_dir", &self.cache_dir)
            .field("page_prefix", &self.page_prefix)
            .field("page_format", &self.page_format)
            .field("merge_path", &self.merge_path)
            .field("write_pages", &self.write_pages)
            .field("overwrite", &self.overwrite)
            .field("keep_cache", &self.keep_cache)
            .field("unresolved", &self.unresolved)
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .field("card_width", &self.card_width)
            .field("card_height", &self.card_height)
            .field("gutter", &self.gutter)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("resolver", &self.resolver.as_ref().map(|_| "<dyn CardResolver>"))
            .field("normalizer", &self.normalizer.as_ref().map(|_| "<dyn Normalizer>"))
            .finish()
    }
}

impl CompileConfig {
    /// Create a new builder for `CompileConfig`.
    pub fn builder() -> CompileConfigBuilder {
        CompileConfigBuilder {
            config: Self::default(),
        }
    }

    /// Number of card slots on one sheet.
    pub fn cards_per_page(&self) -> usize {
        (self.columns as usize) * (self.rows as usize)
    }
}

/// Builder for [`CompileConfig`].
#[derive(Debug)]
pub struct CompileConfigBuilder {
    config: CompileConfig,
}

impl CompileConfigBuilder {
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = Some(dir.into());
        self
    }

    pub fn page_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.page_prefix = prefix.into();
        self
    }

    pub fn page_format(mut self, format: PageFormat) -> Self {
        self.config.page_format = format;
        self
    }

    pub fn merge_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.merge_path = Some(path.into());
        self
    }

    pub fn write_pages(mut self, v: bool) -> Self {
        self.config.write_pages = v;
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.config.overwrite = v;
        self
    }

    pub fn keep_cache(mut self, v: bool) -> Self {
        self.config.keep_cache = v;
        self
    }

    pub fn unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.config.unresolved = policy;
        self
    }

    pub fn grid(mut self, columns: u32, rows: u32) -> Self {
        self.config.columns = columns;
        self.config.rows = rows;
        self
    }

    pub fn card_size(mut self, width: u32, height: u32) -> Self {
        self.config.card_width = width;
        self.config.card_height = height;
        self
    }

    pub fn gutter(mut self, px: u32) -> Self {
        self.config.gutter = px;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn CardResolver>) -> Self {
        self.config.resolver = Some(resolver);
        self
    }

    pub fn normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.config.normalizer = Some(normalizer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CompileConfig, DeckSheetError> {
        let c = &self.config;
        if c.columns == 0 || c.rows == 0 {
            return Err(DeckSheetError::InvalidConfig(format!(
                "Sheet grid must be at least 1×1, got {}×{}",
                c.columns, c.rows
            )));
        }
        if c.card_width < 100 || c.card_height < 100 {
            return Err(DeckSheetError::InvalidConfig(format!(
                "Card size must be at least 100×100 px, got {}×{}",
                c.card_width, c.card_height
            )));
        }
        if c.page_prefix.is_empty() && c.write_pages {
            return Err(DeckSheetError::InvalidConfig(
                "Page prefix must not be empty".into(),
            ));
        }
        if !c.write_pages && c.merge_path.is_none() {
            return Err(DeckSheetError::InvalidConfig(
                "Nothing to write: page output disabled and no merge path set".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Encoding for per-page output images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageFormat {
    /// Lossless; larger files. (default)
    #[default]
    Png,
    /// Smaller files; fine for print at 300 DPI.
    Jpeg,
}

impl PageFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            PageFormat::Png => "png",
            PageFormat::Jpeg => "jpg",
        }
    }
}

/// Which printable face of a card was resolved.
///
/// A closed set rather than ad hoc string checks: double-faced cards carry
/// two images, tokens are a distinct layout, and everything else is a single
/// face. The resolver records the variant on each
/// [`crate::pipeline::resolve::ResolvedCard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardFace {
    /// Ordinary single-faced card.
    Single,
    /// Front face of a double-faced card (the deterministic default).
    DoubleFacedFront,
    /// Back face, selected when the deck list names the back face exactly.
    DoubleFacedBack,
    /// Token layout.
    Token,
}

/// Policy for cards that cannot be resolved or downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnresolvedPolicy {
    /// Abort the whole run with a fatal error. (default)
    #[default]
    Abort,
    /// Warn, drop the card's entries from the sheets, and continue.
    Skip,
}

/// Per-user default cache directory for downloaded card images.
///
/// - **Linux**: `~/.cache/decksheet/cards/`
/// - **macOS**: `~/Library/Caches/decksheet/cards/`
/// - **Windows**: `%LOCALAPPDATA%\decksheet\cards\`
///
/// Falls back to the system temp directory when no per-user cache location
/// can be determined.
pub fn default_cache_dir() -> PathBuf {
    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);
    base.join("decksheet").join("cards")
}
