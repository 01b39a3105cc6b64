//! Deck-list parsing.
//!
//! The input format is one card per line: `<count> <card name>`. Blank lines
//! and `#` comments are skipped. Lines prefixed with `SB:` mark sideboard
//! cards and are otherwise parsed identically. Each line produces its own
//! [`DeckEntry`] — the same name on two lines stays two entries, preserving
//! exactly the order the deck file dictates for the printed sheets.

use crate::error::DeckSheetError;

/// One deck-list line: a positive count and a card name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeckEntry {
    /// How many copies of the card this line requests. Always ≥ 1.
    pub count: u32,
    /// Card name, trimmed, original capitalization preserved.
    pub name: String,
    /// Whether the line carried the `SB:` sideboard prefix.
    pub sideboard: bool,
}

/// Parse a deck list into ordered entries.
///
/// # Errors
/// Returns [`DeckSheetError::Parse`] with a 1-based line number when a
/// non-blank, non-comment line does not start with a positive integer count
/// followed by a name.
///
/// # Example
/// ```rust
/// use decksheet::deck::parse_deck;
///
/// let entries = parse_deck("4 Plains\n# lands above\nSB: 2 Disenchant\n").unwrap();
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[0].count, 4);
/// assert!(entries[1].sideboard);
/// ```
pub fn parse_deck(text: &str) -> Result<Vec<DeckEntry>, DeckSheetError> {
    let mut entries = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (body, sideboard) = match line.strip_prefix("SB:") {
            Some(rest) => (rest.trim_start(), true),
            None => (line, false),
        };

        let (count_str, name) =
            body.split_once(char::is_whitespace)
                .ok_or_else(|| DeckSheetError::Parse {
                    line: line_no,
                    detail: format!("expected `<count> <card name>`, got '{line}'"),
                })?;

        let count: u32 = count_str.parse().map_err(|_| DeckSheetError::Parse {
            line: line_no,
            detail: format!("expected a leading count, got '{count_str}'"),
        })?;

        if count == 0 {
            return Err(DeckSheetError::Parse {
                line: line_no,
                detail: "count must be at least 1".into(),
            });
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(DeckSheetError::Parse {
                line: line_no,
                detail: "missing card name after count".into(),
            });
        }

        entries.push(DeckEntry {
            count,
            name: name.to_string(),
            sideboard,
        });
    }

    Ok(entries)
}

/// Total number of card slots the deck requests (sum of counts).
pub fn total_cards(entries: &[DeckEntry]) -> usize {
    entries.iter().map(|e| e.count as usize).sum()
}

/// Unique card names in first-appearance order.
///
/// Download and normalization run once per unique name; composition re-uses
/// the result per entry.
pub fn unique_names(entries: &[DeckEntry]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    let mut names = Vec::new();
    for entry in entries {
        if seen.insert(entry.name.as_str()) {
            names.push(entry.name.as_str());
        }
    }
    names
}
