//! CLI binary for decksheet.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `CompileConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use decksheet::{
    compile, CompileConfig, CompileProgressCallback, PageFormat, ProgressCallback,
    UnresolvedPolicy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-card log
/// lines using [indicatif]. The pipeline is sequential, so cards always
/// complete in order.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Wall-clock start of the card currently being fetched.
    card_start: Mutex<Option<Instant>>,
    /// Count of cards dropped under the skip policy.
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_compile_start` (called once the deck list has been parsed).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_compile_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading deck list…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            card_start: Mutex::new(None),
            skipped: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} cards  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Fetching");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.card_start
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl CompileProgressCallback for CliProgressCallback {
    fn on_compile_start(&self, unique_cards: usize, total_cards: usize) {
        self.activate_bar(unique_cards);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Compiling {total_cards} cards ({unique_cards} unique)…"
            ))
        ));
    }

    fn on_card_start(&self, _index: usize, _total: usize, name: &str) {
        *self.card_start.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(name.to_string());
    }

    fn on_card_ready(&self, index: usize, total: usize, name: &str, cached: bool) {
        let elapsed = self.elapsed_secs();
        let source = if cached { dim("cache") } else { dim("fetch") };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            green("✓"),
            index,
            total,
            name,
            source,
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_card_skipped(&self, index: usize, total: usize, name: &str, error: &str) {
        let elapsed = self.elapsed_secs();
        self.skipped.fetch_add(1, Ordering::SeqCst);

        let msg = truncate_message(error, 60);

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_compile_complete(&self, pages: usize) {
        let skipped = self.skipped.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if skipped == 0 {
            eprintln!(
                "{} {} sheet(s) composed",
                green("✔"),
                bold(&pages.to_string())
            );
        } else {
            eprintln!(
                "{} {} sheet(s) composed  ({} cards skipped)",
                cyan("⚠"),
                bold(&pages.to_string()),
                red(&skipped.to_string()),
            );
        }
    }
}

/// Truncate long error messages to keep log lines tidy.
///
/// Counts characters, not bytes — card names lead every error message and
/// may be multi-byte.
fn truncate_message(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Compile a deck to page01.png, page02.png, …
  decksheet deck.txt

  # Custom page prefix and JPEG pages
  decksheet -p burn-page -f jpeg burn.txt

  # Pages plus a merged multi-page PDF
  decksheet -m deck.pdf deck.txt

  # PDF only, no per-page images
  decksheet -m deck.pdf --merge-only deck.txt

  # Keep going when a card name cannot be resolved
  decksheet --skip-unresolved draft.txt

  # Re-run with a shared cache directory
  decksheet -c ~/.cache/decksheet/cards deck.txt

  # Machine-readable run report
  decksheet --json deck.txt > report.json

DECK LIST FORMAT:
  4 Lightning Bolt        four copies of a card
  1 Gideon, Ally of Zendikar
  SB: 2 Rest in Peace     sideboard entry (printed all the same)
  # lines starting with a hash are comments

ENVIRONMENT VARIABLES:
  DECKSHEET_CACHE_DIR   Override the default card-image cache directory
  DECKSHEET_TIMEOUT     Per-download timeout in seconds

CACHE:
  Card images are cached by name under ~/.cache/decksheet/cards/ and reused
  across runs; a rerun of the same deck touches the network only for cards
  it has not seen before. Delete files there to force a re-download (e.g.
  after a card gets a new printing you prefer).
"#;

/// Compile a deck list into printable card sheets.
#[derive(Parser, Debug)]
#[command(
    name = "decksheet",
    version,
    about = "Compile Magic deck lists into printable card sheets",
    long_about = "Compile a plain-text deck list into printable card sheets: resolves each card \
name against the Scryfall card database, downloads and caches the images, normalizes them to a \
uniform card size, and tiles them onto 3×3 sheets as page images and/or a merged PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Deck list file (`<count> <name>` per line, `SB:` prefix, `#` comments).
    deck_file: PathBuf,

    /// Filename prefix for the per-page images.
    #[arg(short = 'p', long = "prefix", default_value = "page")]
    prefix: String,

    /// Card-image cache directory.
    #[arg(short = 'c', long = "cache", env = "DECKSHEET_CACHE_DIR")]
    cache: Option<PathBuf>,

    /// Page image format.
    #[arg(short = 'f', long = "format", value_enum, default_value = "png")]
    format: FormatArg,

    /// Also merge all sheets into one multi-page PDF at this path.
    #[arg(short = 'm', long = "merge")]
    merge: Option<PathBuf>,

    /// Keep downloaded card images in the cache after the run (default).
    #[arg(short = 'k', long = "keep-cache", conflicts_with = "discard_cache")]
    keep_cache: bool,

    /// Remove the cache directory after a successful run.
    #[arg(long = "discard-cache")]
    discard_cache: bool,

    /// Overwrite existing output files instead of failing.
    #[arg(short = 'o', long = "overwrite")]
    overwrite: bool,

    /// Skip cards that cannot be resolved or downloaded instead of aborting.
    #[arg(long = "skip-unresolved")]
    skip_unresolved: bool,

    /// Write only the merged PDF, no per-page images (requires --merge).
    #[arg(long = "merge-only", requires = "merge")]
    merge_only: bool,

    /// Per-download timeout in seconds.
    #[arg(long = "timeout", env = "DECKSHEET_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Output the structured run report (CompileOutput) as JSON.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for PageFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => PageFormat::Png,
            FormatArg::Jpeg => PageFormat::Jpeg,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn CompileProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run compilation ──────────────────────────────────────────────────
    let output = compile(&cli.deck_file, &config)
        .await
        .context("Compilation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    // Summary (the callback already printed the per-card log).
    if !cli.quiet {
        for path in &output.page_paths {
            eprintln!("   {}", dim(&path.display().to_string()));
        }
        if let Some(ref merged) = output.merged_path {
            eprintln!("   {}", bold(&merged.display().to_string()));
        }
        eprintln!(
            "{}  {} pages  {} cached / {} downloaded  {}ms",
            if output.skipped.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.stats.pages,
            output.stats.cache_hits,
            output.stats.downloads,
            output.stats.total_duration_ms,
        );
        for card in &output.skipped {
            eprintln!("   {} {}", red("skipped:"), card);
        }
    }

    Ok(())
}

/// Map CLI args to `CompileConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<CompileConfig> {
    let mut builder = CompileConfig::builder()
        .page_prefix(cli.prefix.as_str())
        .page_format(cli.format.clone().into())
        .write_pages(!cli.merge_only)
        .overwrite(cli.overwrite)
        .keep_cache(cli.keep_cache || !cli.discard_cache)
        .download_timeout_secs(cli.timeout)
        .unresolved(if cli.skip_unresolved {
            UnresolvedPolicy::Skip
        } else {
            UnresolvedPolicy::Abort
        });

    if let Some(ref dir) = cli.cache {
        builder = builder.cache_dir(dir);
    }
    if let Some(ref path) = cli.merge {
        builder = builder.merge_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
