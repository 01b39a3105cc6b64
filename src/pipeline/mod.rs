//! Pipeline stages for deck compilation.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (e.g. a different card-data backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! resolve ──▶ cache ──▶ normalize ──▶ compose ──▶ write
//! (Scryfall)  (disk)    (resize+pad)  (grid tile)  (images / PDF)
//! ```
//!
//! 1. [`resolve`]   — card name → canonical image URL; the only stage that
//!    talks to the card-data service
//! 2. [`cache`]     — name-keyed on-disk image store; hits skip the network
//! 3. [`normalize`] — every image to the fixed card size, aspect preserved,
//!    white padding
//! 4. [`compose`]   — expand counts and tile slots onto fixed-grid sheets
//! 5. [`write`]     — per-page image files and/or the merged multi-page PDF

pub mod cache;
pub mod compose;
pub mod normalize;
pub mod resolve;
pub mod write;
