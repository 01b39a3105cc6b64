//! Sheet composition: normalized card images → tiled page images.
//!
//! Each deck entry expands into `count` repeated slots, in deck-file order.
//! Slots fill a fixed grid left-to-right, top-to-bottom; when a page fills,
//! a new one starts. The final page may have empty (white) slots.

use crate::config::CompileConfig;
use crate::deck::DeckEntry;
use crate::error::DeckSheetError;
use image::imageops::overlay;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use tracing::debug;

/// Pixel geometry of one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub columns: u32,
    pub rows: u32,
    pub card_width: u32,
    pub card_height: u32,
    pub gutter: u32,
}

impl SheetLayout {
    pub fn from_config(config: &CompileConfig) -> Self {
        Self {
            columns: config.columns,
            rows: config.rows,
            card_width: config.card_width,
            card_height: config.card_height,
            gutter: config.gutter,
        }
    }

    pub fn cards_per_page(&self) -> usize {
        (self.columns as usize) * (self.rows as usize)
    }

    /// Full page width: cards plus gutters on both sides of every column.
    pub fn page_width(&self) -> u32 {
        self.columns * self.card_width + (self.columns + 1) * self.gutter
    }

    pub fn page_height(&self) -> u32 {
        self.rows * self.card_height + (self.rows + 1) * self.gutter
    }

    /// Top-left pixel of slot `idx` (0-based, row-major) on its page.
    pub fn slot_origin(&self, idx: usize) -> (u32, u32) {
        let col = (idx as u32) % self.columns;
        let row = (idx as u32) / self.columns;
        let x = self.gutter + col * (self.card_width + self.gutter);
        let y = self.gutter + row * (self.card_height + self.gutter);
        (x, y)
    }
}

/// Expand deck entries into the ordered slot sequence.
///
/// `4 Plains` then `3 Gideon` yields seven slots: four `Plains` followed by
/// three `Gideon`, exactly as the deck file orders them.
pub fn expand_slots(entries: &[DeckEntry]) -> Vec<&str> {
    let mut slots = Vec::with_capacity(entries.iter().map(|e| e.count as usize).sum());
    for entry in entries {
        for _ in 0..entry.count {
            slots.push(entry.name.as_str());
        }
    }
    slots
}

/// Tile normalized card images onto pages.
///
/// `images` maps every card name appearing in `entries` to its normalized
/// image; the compile loop guarantees this before composition (skipped cards
/// have already been removed from `entries`).
///
/// # Errors
/// [`DeckSheetError::Internal`] if an entry has no image — a pipeline bug,
/// not a user error.
pub fn compose_sheets(
    entries: &[DeckEntry],
    images: &HashMap<String, RgbaImage>,
    layout: &SheetLayout,
) -> Result<Vec<RgbaImage>, DeckSheetError> {
    let slots = expand_slots(entries);
    if slots.is_empty() {
        return Ok(Vec::new());
    }

    let per_page = layout.cards_per_page();
    let white = Rgba([255, 255, 255, 255]);
    let mut pages = Vec::with_capacity(slots.len().div_ceil(per_page));

    for chunk in slots.chunks(per_page) {
        let mut page = RgbaImage::from_pixel(layout.page_width(), layout.page_height(), white);
        for (idx, name) in chunk.iter().enumerate() {
            let img = images.get(*name).ok_or_else(|| {
                DeckSheetError::Internal(format!("no normalized image for '{name}'"))
            })?;
            let (x, y) = layout.slot_origin(idx);
            overlay(&mut page, img, x as i64, y as i64);
        }
        pages.push(page);
    }

    debug!(
        "Composed {} pages from {} slots ({} per page)",
        pages.len(),
        slots.len(),
        per_page
    );
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_3x3(card: u32, gutter: u32) -> SheetLayout {
        SheetLayout {
            columns: 3,
            rows: 3,
            card_width: card,
            card_height: card,
            gutter,
        }
    }

    fn entry(count: u32, name: &str) -> DeckEntry {
        DeckEntry {
            count,
            name: name.to_string(),
            sideboard: false,
        }
    }

    fn solid(size: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba(rgba))
    }

    #[test]
    fn page_dimensions_include_gutters() {
        let layout = layout_3x3(100, 8);
        assert_eq!(layout.page_width(), 3 * 100 + 4 * 8);
        assert_eq!(layout.page_height(), 3 * 100 + 4 * 8);
        assert_eq!(layout.cards_per_page(), 9);
    }

    #[test]
    fn slot_origins_walk_row_major() {
        let layout = layout_3x3(100, 8);
        assert_eq!(layout.slot_origin(0), (8, 8));
        assert_eq!(layout.slot_origin(1), (116, 8));
        assert_eq!(layout.slot_origin(2), (224, 8));
        assert_eq!(layout.slot_origin(3), (8, 116));
        assert_eq!(layout.slot_origin(8), (224, 224));
    }

    #[test]
    fn expansion_preserves_deck_order() {
        let entries = vec![entry(4, "Plains"), entry(3, "Gideon, Ally of Zendikar")];
        let slots = expand_slots(&entries);
        assert_eq!(slots.len(), 7);
        assert!(slots[..4].iter().all(|n| *n == "Plains"));
        assert!(slots[4..].iter().all(|n| *n == "Gideon, Ally of Zendikar"));
    }

    #[test]
    fn seven_cards_fit_on_one_page_of_nine() {
        let layout = layout_3x3(10, 2);
        let entries = vec![entry(4, "Plains"), entry(3, "Gideon, Ally of Zendikar")];

        let mut images = HashMap::new();
        images.insert("Plains".to_string(), solid(10, [255, 0, 0, 255]));
        images.insert(
            "Gideon, Ally of Zendikar".to_string(),
            solid(10, [0, 0, 255, 255]),
        );

        let pages = compose_sheets(&entries, &images, &layout).unwrap();
        assert_eq!(pages.len(), 1);

        let page = &pages[0];
        // First four slots red, next three blue, last two empty (white).
        for idx in 0..4 {
            let (x, y) = layout.slot_origin(idx);
            assert_eq!(page.get_pixel(x + 5, y + 5), &Rgba([255, 0, 0, 255]));
        }
        for idx in 4..7 {
            let (x, y) = layout.slot_origin(idx);
            assert_eq!(page.get_pixel(x + 5, y + 5), &Rgba([0, 0, 255, 255]));
        }
        for idx in 7..9 {
            let (x, y) = layout.slot_origin(idx);
            assert_eq!(page.get_pixel(x + 5, y + 5), &Rgba([255, 255, 255, 255]));
        }
    }

    #[test]
    fn tenth_card_starts_a_second_page() {
        let layout = layout_3x3(10, 0);
        let entries = vec![entry(9, "Plains"), entry(1, "Island")];

        let mut images = HashMap::new();
        images.insert("Plains".to_string(), solid(10, [255, 0, 0, 255]));
        images.insert("Island".to_string(), solid(10, [0, 0, 255, 255]));

        let pages = compose_sheets(&entries, &images, &layout).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].get_pixel(5, 5), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn empty_deck_composes_no_pages() {
        let layout = layout_3x3(10, 0);
        let pages = compose_sheets(&[], &HashMap::new(), &layout).unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn missing_image_is_an_internal_error() {
        let layout = layout_3x3(10, 0);
        let entries = vec![entry(1, "Plains")];
        let err = compose_sheets(&entries, &HashMap::new(), &layout).unwrap_err();
        assert!(matches!(err, DeckSheetError::Internal(_)));
    }
}
