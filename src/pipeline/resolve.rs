//! Card resolution: card name → canonical image URL.
//!
//! ## Why a trait?
//!
//! The resolver is the only stage that talks to an external card-data
//! service, so it is the seam tests and alternative backends plug into.
//! Production uses [`ScryfallResolver`]; tests inject mocks via
//! [`crate::config::CompileConfigBuilder::resolver`].
//!
//! ## Determinism
//!
//! Scryfall's `cards/named?exact=` endpoint maps a name to exactly one
//! canonical card (its most recent printing), so repeated runs of the same
//! deck always fetch the same images. Multi-faced cards resolve to the front
//! face unless the deck list names the back face exactly.

use crate::config::CardFace;
use crate::error::DeckSheetError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Scryfall exact-name lookup endpoint.
const NAMED_ENDPOINT: &str = "https://api.scryfall.com/cards/named";

/// A card name resolved to a downloadable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCard {
    /// Canonical card name as the service spells it.
    pub name: String,
    /// URL of the card image at print quality.
    pub image_url: String,
    /// Which face the URL depicts.
    pub face: CardFace,
}

/// Maps card names to image URLs and downloads image bytes.
///
/// Both operations live on one trait because a backend that knows how to
/// find an image also knows how to authenticate/rate-limit its download;
/// splitting them would force the cache to juggle two injected objects.
#[async_trait]
pub trait CardResolver: Send + Sync {
    /// Resolve a card name to its canonical image URL.
    ///
    /// # Errors
    /// [`DeckSheetError::Resolution`] when the service has no card under
    /// this name; [`DeckSheetError::Fetch`]/[`DeckSheetError::FetchTimeout`]
    /// on transport failure.
    async fn resolve(&self, name: &str) -> Result<ResolvedCard, DeckSheetError>;

    /// Download the resolved image bytes.
    ///
    /// # Errors
    /// [`DeckSheetError::Fetch`] on transport failure, non-success HTTP
    /// status, or an empty body.
    async fn fetch_image(&self, card: &ResolvedCard) -> Result<Vec<u8>, DeckSheetError>;
}

// ── Scryfall implementation ──────────────────────────────────────────────

/// Production resolver backed by the Scryfall REST API.
pub struct ScryfallResolver {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl ScryfallResolver {
    /// Build a resolver with the given request timeout and User-Agent.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, DeckSheetError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| DeckSheetError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> DeckSheetError {
        if e.is_timeout() {
            DeckSheetError::FetchTimeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            DeckSheetError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl CardResolver for ScryfallResolver {
    async fn resolve(&self, name: &str) -> Result<ResolvedCard, DeckSheetError> {
        debug!("Looking up '{}' on Scryfall", name);

        let response = self
            .client
            .get(NAMED_ENDPOINT)
            .query(&[("exact", name)])
            .send()
            .await
            .map_err(|e| self.transport_error(NAMED_ENDPOINT, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(NAMED_ENDPOINT, e))?;

        if status == reqwest::StatusCode::NOT_FOUND {
            // Scryfall returns a structured error object with a human-readable
            // `details` field ("No card found with the exact name ...").
            let detail = serde_json::from_slice::<ScryfallError>(&body)
                .map(|e| e.details)
                .unwrap_or_else(|_| "no exact match".to_string());
            return Err(DeckSheetError::Resolution {
                name: name.to_string(),
                detail,
            });
        }
        if !status.is_success() {
            return Err(DeckSheetError::Fetch {
                url: NAMED_ENDPOINT.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let card: ScryfallCard =
            serde_json::from_slice(&body).map_err(|e| DeckSheetError::Fetch {
                url: NAMED_ENDPOINT.to_string(),
                reason: format!("unexpected response body: {e}"),
            })?;

        select_face(&card, name).ok_or_else(|| DeckSheetError::Resolution {
            name: name.to_string(),
            detail: format!("card '{}' has no printable image", card.name),
        })
    }

    async fn fetch_image(&self, card: &ResolvedCard) -> Result<Vec<u8>, DeckSheetError> {
        let response = self
            .client
            .get(&card.image_url)
            .send()
            .await
            .map_err(|e| self.transport_error(&card.image_url, e))?;

        if !response.status().is_success() {
            return Err(DeckSheetError::Fetch {
                url: card.image_url.clone(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&card.image_url, e))?;

        if bytes.is_empty() {
            return Err(DeckSheetError::Fetch {
                url: card.image_url.clone(),
                reason: "empty response body".into(),
            });
        }

        Ok(bytes.to_vec())
    }
}

// ── Face selection ───────────────────────────────────────────────────────

/// Pick the image URL and face variant for a resolved card.
///
/// Rules, in order:
/// 1. Top-level `image_uris` → single face (tokens keep their own variant).
/// 2. Double-faced card whose *back* face name matches the queried name
///    exactly (case-insensitive) → back face.
/// 3. Otherwise the first face — the front — is the deterministic default.
fn select_face(card: &ScryfallCard, queried: &str) -> Option<ResolvedCard> {
    let face_of = |layout: &str| -> CardFace {
        if layout == "token" || layout == "double_faced_token" {
            CardFace::Token
        } else {
            CardFace::Single
        }
    };

    if let Some(url) = card.image_uris.as_ref().and_then(ImageUris::best) {
        return Some(ResolvedCard {
            name: card.name.clone(),
            image_url: url.to_string(),
            face: face_of(&card.layout),
        });
    }

    let faces = card.card_faces.as_deref()?;

    if let Some(back) = faces.get(1) {
        if back.name.eq_ignore_ascii_case(queried) {
            if let Some(url) = back.image_uris.as_ref().and_then(ImageUris::best) {
                return Some(ResolvedCard {
                    name: back.name.clone(),
                    image_url: url.to_string(),
                    face: CardFace::DoubleFacedBack,
                });
            }
        }
    }

    let front = faces.first()?;
    let url = front.image_uris.as_ref().and_then(ImageUris::best)?;
    Some(ResolvedCard {
        name: front.name.clone(),
        image_url: url.to_string(),
        face: CardFace::DoubleFacedFront,
    })
}

// ── Scryfall wire types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ScryfallCard {
    name: String,
    #[serde(default)]
    layout: String,
    image_uris: Option<ImageUris>,
    card_faces: Option<Vec<ScryfallFaceObject>>,
}

#[derive(Debug, Deserialize)]
struct ScryfallFaceObject {
    name: String,
    image_uris: Option<ImageUris>,
}

/// Image URLs by rendition; `png` is border-true print quality, the rest are
/// progressively smaller JPEG fallbacks.
#[derive(Debug, Deserialize)]
struct ImageUris {
    png: Option<String>,
    large: Option<String>,
    normal: Option<String>,
}

impl ImageUris {
    fn best(&self) -> Option<&str> {
        self.png
            .as_deref()
            .or(self.large.as_deref())
            .or(self.normal.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ScryfallError {
    details: String,
}
