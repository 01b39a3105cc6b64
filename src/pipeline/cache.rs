//! On-disk image cache keyed by normalized card name.
//!
//! One file per unique card name, no eviction, no locking: content for a
//! given name is assumed stable, so last-writer-wins between uncoordinated
//! runs is harmless. A cache hit is a pure filesystem check — the resolver
//! is never consulted.
//!
//! Files are written atomically (temp file in the cache directory, then
//! rename) so a killed run can never leave a truncated image behind that a
//! later run would mistake for a hit.

use crate::error::DeckSheetError;
use crate::pipeline::resolve::CardResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Handle to one cache directory.
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    /// Open (creating if absent) the cache at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, DeckSheetError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| DeckSheetError::Write {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    /// The directory this cache lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Normalize a card name into a stable, filesystem-safe cache key.
    ///
    /// Lowercase, whitespace runs collapse to a single `-`, everything
    /// outside `[a-z0-9-]` is dropped:
    /// `"Gideon, Ally of Zendikar"` → `"gideon-ally-of-zendikar"`.
    ///
    /// A name with no ASCII-alphanumeric content at all (`"稲妻"`) falls back
    /// to a lowercase hex encoding of its bytes, so every distinct name still
    /// maps to a distinct, non-empty key.
    pub fn key(name: &str) -> String {
        let mut key = String::with_capacity(name.len());
        let mut pending_dash = false;
        for ch in name.trim().chars() {
            if ch.is_whitespace() {
                pending_dash = !key.is_empty();
                continue;
            }
            for lower in ch.to_lowercase() {
                if lower.is_ascii_alphanumeric() || lower == '-' {
                    if pending_dash {
                        key.push('-');
                        pending_dash = false;
                    }
                    key.push(lower);
                }
            }
        }

        if key.is_empty() {
            use std::fmt::Write;
            for b in name.trim().bytes() {
                let _ = write!(key, "{b:02x}");
            }
        }
        key
    }

    /// The path a card image is (or would be) cached at.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(Self::key(name))
    }

    /// Return the cached image path for `name`, downloading on a miss.
    ///
    /// On a hit nothing touches the network. On a miss the name is resolved,
    /// the image downloaded, and the bytes written atomically to the cache
    /// path.
    pub async fn get_or_fetch(
        &self,
        resolver: &Arc<dyn CardResolver>,
        name: &str,
    ) -> Result<PathBuf, DeckSheetError> {
        let path = self.path_for(name);
        if path.exists() {
            debug!("Cache hit: {} → {}", name, path.display());
            return Ok(path);
        }

        info!("Downloading: {}", name);
        let card = resolver.resolve(name).await?;
        debug!("Resolved '{}' ({:?}) → {}", card.name, card.face, card.image_url);
        let bytes = resolver.fetch_image(&card).await?;

        let tmp = path.with_extension("part");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| DeckSheetError::Write {
                path: tmp.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| DeckSheetError::Write {
                path: path.clone(),
                source: e,
            })?;

        debug!("Cached {} bytes at {}", bytes.len(), path.display());
        Ok(path)
    }
}
